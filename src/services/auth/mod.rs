pub mod factory;
pub mod jwt;
pub mod password;
pub mod service;

pub use factory::build_auth_services;
pub use jwt::TokenService;
pub use service::{AuthError, AuthService, IssuedToken};
