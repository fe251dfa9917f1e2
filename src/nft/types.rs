// Core data structures of the NFT subsystem.

use serde::{Deserialize, Serialize};

use super::error::{NftError, NftResult};
use super::id::TokenId;
use crate::asset::Amount;
use crate::crypto::{AccountId, Hash};

// ========================================
// Protocol Constants
// ========================================

/// Maximum tokens held by one directory page
pub const MAX_TOKENS_PER_PAGE: usize = 32;

/// Maximum token URI length (bytes)
pub const MAX_URI_LENGTH: usize = 256;

/// Maximum transfer fee in units of 1/100,000 (50,000 = 50%)
pub const MAX_TRANSFER_FEE: u16 = 50_000;

/// Denominator of the transfer-fee rate
pub const TRANSFER_FEE_SCALE: u64 = 100_000;

/// Maximum outstanding offers a burn will cascade-delete
pub const MAX_OFFERS_PER_BURN: usize = 500;

/// Maximum offers cancelled by a single batch
pub const MAX_OFFERS_PER_CANCEL: usize = 500;

/// Token and offer flag bits
pub mod flags {
    /// Issuer (or authorized minter) may burn the token regardless of holder
    pub const BURNABLE: u16 = 0x0001;

    /// Offers for the token may only be denominated in the native asset
    pub const ONLY_NATIVE: u16 = 0x0002;

    /// Transfer-fee payments may create the issuer's trust line on demand
    pub const CREATE_TRUST_LINES: u16 = 0x0004;

    /// Token may be traded between non-issuer accounts
    pub const TRANSFERABLE: u16 = 0x0008;

    /// All bits a mint may set
    pub const MINT_MASK: u16 = BURNABLE | ONLY_NATIVE | CREATE_TRUST_LINES | TRANSFERABLE;

    /// Offer flag: the offer sells the token (unset: offers to buy it)
    pub const SELL_TOKEN: u16 = 0x0001;

    /// All bits an offer may set
    pub const CREATE_OFFER_MASK: u16 = SELL_TOKEN;
}

/// Issuer royalty on `amount`, truncating toward zero. The same fixed-point
/// rounding applies to native and issued values; the payment primitive of
/// the view moves the result.
pub fn transfer_fee_cut(amount: &Amount, fee: u16) -> Amount {
    let cut = (amount.value() as u128 * fee as u128) / TRANSFER_FEE_SCALE as u128;
    amount.with_value(cut as u64)
}

// ========================================
// Token
// ========================================

/// A minted token. Issuer, taxon, transfer fee and flags are all recovered
/// from the id; only the optional URI is stored alongside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nft {
    pub id: TokenId,
    pub uri: Option<Vec<u8>>,
}

impl Nft {
    pub fn new(id: TokenId, uri: Option<Vec<u8>>) -> Self {
        Nft { id, uri }
    }

    pub fn validate(&self) -> NftResult<()> {
        if let Some(uri) = &self.uri {
            if uri.is_empty() || uri.len() > MAX_URI_LENGTH {
                return Err(NftError::BadUri);
            }
        }
        Ok(())
    }
}

// ========================================
// Directory Page
// ========================================

/// One page of an owner's token directory: a bounded, sorted slice of the
/// owner's tokens, doubly linked with its neighbors through their page keys.
/// The page's own key is the key it is stored under in the view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftPage {
    pub tokens: Vec<Nft>,
    pub prev: Option<Hash>,
    pub next: Option<Hash>,
}

impl NftPage {
    pub fn is_full(&self) -> bool {
        self.tokens.len() >= MAX_TOKENS_PER_PAGE
    }
}

// ========================================
// Offer
// ========================================

/// An outstanding offer to buy or sell one token.
///
/// `owner_node` and `offer_node` are the pagination cursors returned by the
/// sorted-directory subsystem when the offer was linked into the owner's
/// outgoing-offer directory and the token's buy- or sell-offer directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftOffer {
    pub owner: AccountId,
    pub token_id: TokenId,
    pub amount: Amount,
    pub flags: u16,
    pub destination: Option<AccountId>,
    pub expiration: Option<u64>,
    pub owner_node: u64,
    pub offer_node: u64,
}

impl NftOffer {
    #[inline]
    pub fn is_sell(&self) -> bool {
        self.flags & flags::SELL_TOKEN != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ACCOUNT_ID_SIZE;
    use crate::nft::id::TokenId;

    #[test]
    fn test_uri_bounds() {
        let id = TokenId::compose(0, 0, &AccountId::new([1; ACCOUNT_ID_SIZE]), 0, 0);

        let ok = Nft::new(id.clone(), Some(vec![b'x'; MAX_URI_LENGTH]));
        assert!(ok.validate().is_ok());

        let empty = Nft::new(id.clone(), Some(Vec::new()));
        assert_eq!(empty.validate(), Err(NftError::BadUri));

        let long = Nft::new(id.clone(), Some(vec![b'x'; MAX_URI_LENGTH + 1]));
        assert_eq!(long.validate(), Err(NftError::BadUri));

        let none = Nft::new(id, None);
        assert!(none.validate().is_ok());
    }

    #[test]
    fn test_transfer_fee_cut_truncates() {
        // 50% of 25,000,000 drops
        let cut = transfer_fee_cut(&Amount::native(25_000_000), MAX_TRANSFER_FEE);
        assert_eq!(cut.value(), 12_500_000);

        // 1/100,000 of 99,999 truncates to zero
        let cut = transfer_fee_cut(&Amount::native(99_999), 1);
        assert_eq!(cut.value(), 0);

        // no overflow near u64::MAX
        let cut = transfer_fee_cut(&Amount::native(u64::MAX), MAX_TRANSFER_FEE);
        assert_eq!(cut.value(), u64::MAX / 2);
    }

    #[test]
    fn test_offer_side_flag() {
        let offer = NftOffer {
            owner: AccountId::new([9; ACCOUNT_ID_SIZE]),
            token_id: TokenId::compose(0, 0, &AccountId::new([1; ACCOUNT_ID_SIZE]), 0, 0),
            amount: Amount::native(10),
            flags: flags::SELL_TOKEN,
            destination: None,
            expiration: None,
            owner_node: 0,
            offer_node: 0,
        };
        assert!(offer.is_sell());
        assert!(!NftOffer { flags: 0, ..offer }.is_sell());
    }
}
