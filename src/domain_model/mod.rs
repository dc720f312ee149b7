mod credential;
mod user;

pub use credential::*;
pub use user::*;
