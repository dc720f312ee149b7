mod credential_hasher_argon2;
mod rotation_service_impl;
mod token_factory_jwt;

pub use credential_hasher_argon2::*;
pub use rotation_service_impl::*;
pub use token_factory_jwt::*;
