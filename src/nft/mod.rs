// Native NFT subsystem for the Keel ledger.
//
// Features:
// - 256-bit token identifiers carrying issuer, flags, transfer fee and a
//   ciphered taxon
// - Per-owner token directories: doubly-linked chains of bounded, sorted
//   pages with reserve-accounted page creation
// - Buy and sell offers with destinations and expirations
// - Direct and brokered acceptance with issuer royalties
//
// Module Structure:
// - error: result codes
// - id: token identifier codec
// - types: core data structures (Nft, NftPage, NftOffer)
// - storage: key derivation and canonical encodings
// - pages: the paginated owner directory store
// - operations: the transaction set (mint, burn, offers, accept)

pub mod error;
pub mod id;
pub mod operations;
pub mod pages;
pub mod storage;
pub mod types;

pub use error::{NftError, NftResult};
pub use id::{cipher_taxon, TokenId, TOKEN_ID_SIZE};
pub use operations::{
    execute, AcceptOfferPayload, BurnPayload, CancelOfferPayload, CreateOfferPayload, MintPayload,
    NftTransaction, TxContext,
};
pub use types::*;
