mod credential_hasher;
mod credential_store;

pub use credential_hasher::*;
pub use credential_store::*;
