//! HTTP backend for a documentation generator: user accounts with JWT
//! sessions, GitHub repository browsing and language-model generated docs.

pub mod app;
pub mod auth;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod extract;
pub mod github;
pub mod openai;
pub mod registration;
pub mod response;
pub mod state;
pub mod status;
pub mod users;

#[cfg(test)]
mod testing;
