mod account;
mod hash;

pub use account::{AccountId, ACCOUNT_ID_SIZE};
pub use hash::{hash, Hash, HASH_SIZE};
