// Stateless validation helpers shared by the transaction preflights.

use crate::nft::error::{NftError, NftResult};
use crate::nft::types::{flags, MAX_TRANSFER_FEE, MAX_URI_LENGTH};

/// Only the documented mint flag bits may be set.
pub fn validate_mint_flags(value: u16) -> NftResult<()> {
    if value & !flags::MINT_MASK != 0 {
        return Err(NftError::InvalidFlags);
    }
    Ok(())
}

/// Only the documented offer flag bits may be set.
pub fn validate_offer_flags(value: u16) -> NftResult<()> {
    if value & !flags::CREATE_OFFER_MASK != 0 {
        return Err(NftError::InvalidFlags);
    }
    Ok(())
}

/// Transfer fees are capped at 50%.
pub fn validate_transfer_fee(fee: u16) -> NftResult<()> {
    if fee > MAX_TRANSFER_FEE {
        return Err(NftError::BadTransferFee);
    }
    Ok(())
}

/// A URI, when present, is non-empty and bounded.
pub fn validate_uri(uri: &Option<Vec<u8>>) -> NftResult<()> {
    if let Some(uri) = uri {
        if uri.is_empty() || uri.len() > MAX_URI_LENGTH {
            return Err(NftError::BadUri);
        }
    }
    Ok(())
}

/// An expiration, when present, is non-zero; whether it has already passed
/// is a preclaim question.
pub fn validate_expiration(expiration: Option<u64>) -> NftResult<()> {
    if expiration == Some(0) {
        return Err(NftError::BadExpiration);
    }
    Ok(())
}
