// Ledger key derivation and canonical encodings for NFT objects.
//
// Key space:
// - Directory pages live directly at structural keys: the owner account in
//   the high 160 bits, a 96-bit discriminator in the low bits. A page's key
//   is derived from the token ids it covers, so an owner's pages order the
//   owner's tokens across the global key space.
// - Offers and the sorted-directory roots live at blake3-derived indices
//   under fixed prefixes.

use crate::crypto::{hash, AccountId, Hash, ACCOUNT_ID_SIZE, HASH_SIZE};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

use super::id::TokenId;
use super::types::{Nft, NftOffer, NftPage};

/// Index derivation prefixes
pub mod prefixes {
    /// Offer object index
    pub const OFFER: &[u8] = b"nft:offer:";

    /// Buy-offer directory of a token
    pub const BUY_DIR: &[u8] = b"nft:buys:";

    /// Sell-offer directory of a token
    pub const SELL_DIR: &[u8] = b"nft:sells:";

    /// Outgoing-offer directory of an account
    pub const OWNER_DIR: &[u8] = b"nft:owner-dir:";
}

const PAGE_DISCRIMINATOR_SIZE: usize = HASH_SIZE - ACCOUNT_ID_SIZE;

/// Key of the owner's minimal page: discriminator zero.
pub fn page_min(owner: &AccountId) -> Hash {
    let mut bytes = [0u8; HASH_SIZE];
    bytes[..ACCOUNT_ID_SIZE].copy_from_slice(owner.as_bytes());
    Hash::new(bytes)
}

/// Key of the owner's maximal page: discriminator all ones. The page
/// holding an owner's highest tokens always sits here.
pub fn page_max(owner: &AccountId) -> Hash {
    let mut bytes = [u8::MAX; HASH_SIZE];
    bytes[..ACCOUNT_ID_SIZE].copy_from_slice(owner.as_bytes());
    Hash::new(bytes)
}

/// Structural key of the page range a token id falls into: the owner in the
/// high bits, the id's low 96 bits as the discriminator.
pub fn page_key(owner: &AccountId, id: &TokenId) -> Hash {
    let mut bytes = [0u8; HASH_SIZE];
    bytes[..ACCOUNT_ID_SIZE].copy_from_slice(owner.as_bytes());
    bytes[ACCOUNT_ID_SIZE..].copy_from_slice(&id.low_bits());
    Hash::new(bytes)
}

/// The 96-bit discriminator of a page key, comparable against
/// `TokenId::low_bits`.
pub fn page_discriminator(key: &Hash) -> [u8; PAGE_DISCRIMINATOR_SIZE] {
    let mut bytes = [0u8; PAGE_DISCRIMINATOR_SIZE];
    bytes.copy_from_slice(&key.as_bytes()[ACCOUNT_ID_SIZE..]);
    bytes
}

/// Index of the offer created by `owner` with transaction sequence `seq`.
pub fn offer_index(owner: &AccountId, seq: u32) -> Hash {
    let mut data = Vec::with_capacity(prefixes::OFFER.len() + ACCOUNT_ID_SIZE + 4);
    data.extend_from_slice(prefixes::OFFER);
    data.extend_from_slice(owner.as_bytes());
    data.extend_from_slice(&seq.to_be_bytes());
    hash(&data)
}

/// Root of the directory holding all buy offers for a token.
pub fn buy_offer_directory(id: &TokenId) -> Hash {
    let mut data = Vec::with_capacity(prefixes::BUY_DIR.len() + HASH_SIZE);
    data.extend_from_slice(prefixes::BUY_DIR);
    data.extend_from_slice(id.as_bytes());
    hash(&data)
}

/// Root of the directory holding all sell offers for a token.
pub fn sell_offer_directory(id: &TokenId) -> Hash {
    let mut data = Vec::with_capacity(prefixes::SELL_DIR.len() + HASH_SIZE);
    data.extend_from_slice(prefixes::SELL_DIR);
    data.extend_from_slice(id.as_bytes());
    hash(&data)
}

/// Root of the directory holding an account's outgoing offers.
pub fn owner_directory(owner: &AccountId) -> Hash {
    let mut data = Vec::with_capacity(prefixes::OWNER_DIR.len() + ACCOUNT_ID_SIZE);
    data.extend_from_slice(prefixes::OWNER_DIR);
    data.extend_from_slice(owner.as_bytes());
    hash(&data)
}

// ========================================
// Canonical encodings
// ========================================

impl Serializer for Nft {
    fn write(&self, writer: &mut Writer) {
        self.id.write(writer);
        self.uri.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Nft {
            id: TokenId::read(reader)?,
            uri: Option::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.id.size() + self.uri.size()
    }
}

impl Serializer for NftPage {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(self.tokens.len() as u8);
        for token in &self.tokens {
            token.write(writer);
        }
        self.prev.write(writer);
        self.next.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let len = reader.read_u8()? as usize;
        if len > super::types::MAX_TOKENS_PER_PAGE {
            return Err(ReaderError::InvalidValue);
        }
        let mut tokens = Vec::with_capacity(len);
        for _ in 0..len {
            tokens.push(Nft::read(reader)?);
        }
        Ok(NftPage {
            tokens,
            prev: Option::read(reader)?,
            next: Option::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        1 + self.tokens.iter().map(Serializer::size).sum::<usize>()
            + self.prev.size()
            + self.next.size()
    }
}

impl Serializer for NftOffer {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        self.token_id.write(writer);
        self.amount.write(writer);
        self.flags.write(writer);
        self.destination.write(writer);
        self.expiration.write(writer);
        self.owner_node.write(writer);
        self.offer_node.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(NftOffer {
            owner: AccountId::read(reader)?,
            token_id: TokenId::read(reader)?,
            amount: crate::asset::Amount::read(reader)?,
            flags: u16::read(reader)?,
            destination: Option::read(reader)?,
            expiration: Option::read(reader)?,
            owner_node: u64::read(reader)?,
            offer_node: u64::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size()
            + self.token_id.size()
            + self.amount.size()
            + self.flags.size()
            + self.destination.size()
            + self.expiration.size()
            + self.owner_node.size()
            + self.offer_node.size()
    }
}
