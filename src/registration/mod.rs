pub mod dto;
pub mod handlers;
pub mod services;

pub use handlers::RegistrationController;
