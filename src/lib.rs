//! Native NFT subsystem for the Keel ledger: token identifier codec,
//! paginated per-owner token directories, and the offer / accept / broker
//! transaction set. Transactions run in three phases (preflight, preclaim,
//! apply) against a caller-supplied [`ledger::LedgerView`]; the caller
//! discards the view whenever application fails.

pub mod account;
pub mod asset;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod nft;
pub mod serializer;
