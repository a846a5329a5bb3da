pub mod client;
pub mod dto;
pub mod handlers;
pub mod language;
pub mod prompt;
pub mod services;

pub use client::{CompletionClient, OpenAiClient};
pub use handlers::OpenAiController;
