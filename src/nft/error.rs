// NFT subsystem result codes.
//
// The taxonomy mirrors the transaction phases: preflight failures are
// stateless rejections, preclaim failures are read-only rejections, apply
// failures surface from mutation, and Internal marks a consistency
// violation that aborts processing. Callers discard the view on any error;
// no partial mutation ever becomes visible.

use thiserror::Error;

/// NFT operation result type
pub type NftResult<T> = Result<T, NftError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NftError {
    // ========================================
    // Preflight (stateless)
    // ========================================
    #[error("Malformed transaction")]
    Malformed,

    #[error("Invalid flag bits")]
    InvalidFlags,

    #[error("Transfer fee above the permitted maximum")]
    BadTransferFee,

    #[error("URI empty or above the permitted length")]
    BadUri,

    #[error("Invalid amount for this operation")]
    BadAmount,

    #[error("Invalid expiration")]
    BadExpiration,

    // ========================================
    // Preclaim (read-only)
    // ========================================
    #[error("Referenced object does not exist")]
    ObjectNotFound,

    #[error("Issuer account does not exist")]
    NoIssuer,

    #[error("Offer is expired")]
    Expired,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Required trust line is missing")]
    NoTrustLine,

    #[error("Trust line is frozen")]
    Frozen,

    #[error("No permission to perform this operation")]
    NoPermission,

    #[error("Offer is of the wrong type for this operation")]
    OfferTypeMismatch,

    #[error("Buy and sell offers are not compatible")]
    BuySellMismatch,

    #[error("Payment is insufficient")]
    InsufficientPayment,

    #[error("Token is not transferable")]
    NotTransferable,

    #[error("An account cannot accept its own offer")]
    CannotAcceptOwnOffer,

    #[error("Token not found on the given account")]
    NoEntry,

    // ========================================
    // Apply
    // ========================================
    #[error("No suitable directory page for the token")]
    NoSuitablePage,

    #[error("Issuer mint sequence is exhausted")]
    MaxSequenceReached,

    #[error("Balance does not cover the owner reserve")]
    InsufficientReserve,

    #[error("Operation touches too many ledger objects")]
    TooBig,

    // ========================================
    // Internal
    // ========================================
    #[error("Internal consistency violation")]
    Internal,
}
