pub mod dto;
pub mod handlers;
pub mod model;
pub mod repo;
pub mod services;

pub use handlers::UsersController;
