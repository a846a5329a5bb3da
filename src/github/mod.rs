pub mod client;
pub mod dto;
pub mod handlers;
pub mod services;

pub use client::{GithubClient, HttpGithubClient};
pub use handlers::GithubController;
