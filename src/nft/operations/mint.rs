// Token minting.
//
// Minting allocates the issuer's next sequence number, derives the token
// id, and inserts the token into the submitter's directory. The owner
// reserve is only re-checked when the insert created a directory page:
// tokens landing on existing pages never fail on reserve.

use crate::crypto::AccountId;
use crate::ledger::LedgerView;
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

use super::super::error::{NftError, NftResult};
use super::super::id::TokenId;
use super::super::pages;
use super::super::types::Nft;
use super::validation::{validate_mint_flags, validate_transfer_fee, validate_uri};
use super::TxContext;

/// `NFTokenMint` transaction payload.
#[derive(Clone, Debug)]
pub struct MintPayload {
    taxon: u32,
    issuer: Option<AccountId>,
    flags: u16,
    transfer_fee: u16,
    uri: Option<Vec<u8>>,
}

impl MintPayload {
    pub fn new(taxon: u32) -> Self {
        MintPayload {
            taxon,
            issuer: None,
            flags: 0,
            transfer_fee: 0,
            uri: None,
        }
    }

    /// Mint on behalf of `issuer`; the submitter must be the issuer's
    /// authorized minter.
    pub fn with_issuer(mut self, issuer: AccountId) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_transfer_fee(mut self, transfer_fee: u16) -> Self {
        self.transfer_fee = transfer_fee;
        self
    }

    pub fn with_uri(mut self, uri: Vec<u8>) -> Self {
        self.uri = Some(uri);
        self
    }

    #[inline]
    pub fn taxon(&self) -> u32 {
        self.taxon
    }

    #[inline]
    pub fn issuer(&self) -> Option<&AccountId> {
        self.issuer.as_ref()
    }

    #[inline]
    pub fn flags(&self) -> u16 {
        self.flags
    }

    #[inline]
    pub fn transfer_fee(&self) -> u16 {
        self.transfer_fee
    }

    #[inline]
    pub fn uri(&self) -> Option<&Vec<u8>> {
        self.uri.as_ref()
    }
}

impl Serializer for MintPayload {
    fn write(&self, writer: &mut Writer) {
        self.taxon.write(writer);
        self.issuer.write(writer);
        self.flags.write(writer);
        self.transfer_fee.write(writer);
        self.uri.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(MintPayload {
            taxon: u32::read(reader)?,
            issuer: Option::read(reader)?,
            flags: u16::read(reader)?,
            transfer_fee: u16::read(reader)?,
            uri: Option::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.taxon.size()
            + self.issuer.size()
            + self.flags.size()
            + self.transfer_fee.size()
            + self.uri.size()
    }
}

pub fn preflight(ctx: &TxContext, payload: &MintPayload) -> NftResult<()> {
    validate_mint_flags(payload.flags)?;
    validate_transfer_fee(payload.transfer_fee)?;
    validate_uri(&payload.uri)?;

    // An issuer is only named when minting on another account's behalf.
    if payload.issuer.as_ref() == Some(&ctx.caller) {
        return Err(NftError::Malformed);
    }
    Ok(())
}

pub fn preclaim<V: LedgerView + ?Sized>(
    view: &V,
    ctx: &TxContext,
    payload: &MintPayload,
) -> NftResult<()> {
    if let Some(issuer) = &payload.issuer {
        let root = view.get_account(issuer).ok_or(NftError::NoIssuer)?;
        if root.minter.as_ref() != Some(&ctx.caller) {
            return Err(NftError::NoPermission);
        }
    }
    Ok(())
}

pub fn apply<V: LedgerView + ?Sized>(
    view: &mut V,
    ctx: &TxContext,
    payload: &MintPayload,
) -> NftResult<TokenId> {
    let issuer = payload
        .issuer
        .clone()
        .unwrap_or_else(|| ctx.caller.clone());

    // Allocate the issuer's next mint sequence.
    let mut root = view.get_account(&issuer).ok_or(NftError::NoIssuer)?;
    let sequence = root.minted_tokens;
    root.minted_tokens = sequence
        .checked_add(1)
        .ok_or(NftError::MaxSequenceReached)?;
    view.set_account(&issuer, root);

    let id = TokenId::compose(
        payload.flags,
        payload.transfer_fee,
        &issuer,
        payload.taxon,
        sequence,
    );
    let nft = Nft::new(id.clone(), payload.uri.clone());

    let before = view.get_account(&ctx.caller).ok_or(NftError::NoEntry)?;
    let prior_balance = before.balance;
    let owner_count_before = before.owner_count;

    pages::insert_token(view, &ctx.caller, nft, |view: &mut V, account: &AccountId| {
        view.adjust_owner_count(account, 1)
    })?;

    let after = view.get_account(&ctx.caller).ok_or(NftError::Internal)?;
    if after.owner_count > owner_count_before && prior_balance < view.account_reserve(after.owner_count)
    {
        return Err(NftError::InsufficientReserve);
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{account_reserve, BASE_RESERVE};
    use crate::crypto::ACCOUNT_ID_SIZE;
    use crate::ledger::MemoryLedger;
    use crate::nft::types::flags;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; ACCOUNT_ID_SIZE])
    }

    fn ctx(byte: u8) -> TxContext {
        TxContext::new(account(byte))
    }

    #[test]
    fn test_preflight_rejections() {
        let ctx = ctx(1);
        assert_eq!(
            preflight(&ctx, &MintPayload::new(0).with_flags(0x8000)),
            Err(NftError::InvalidFlags)
        );
        assert_eq!(
            preflight(&ctx, &MintPayload::new(0).with_transfer_fee(50_001)),
            Err(NftError::BadTransferFee)
        );
        assert_eq!(
            preflight(&ctx, &MintPayload::new(0).with_uri(Vec::new())),
            Err(NftError::BadUri)
        );
        assert_eq!(
            preflight(&ctx, &MintPayload::new(0).with_issuer(account(1))),
            Err(NftError::Malformed)
        );
        assert!(preflight(
            &ctx,
            &MintPayload::new(7)
                .with_flags(flags::TRANSFERABLE | flags::BURNABLE)
                .with_transfer_fee(100)
                .with_uri(b"ipfs://token".to_vec())
        )
        .is_ok());
    }

    #[test]
    fn test_mint_assigns_monotonic_sequences() {
        let mut view = MemoryLedger::new();
        let ctx = ctx(1);
        view.fund(&ctx.caller, account_reserve(1));

        let a = apply(&mut view, &ctx, &MintPayload::new(7)).unwrap();
        let b = apply(&mut view, &ctx, &MintPayload::new(7)).unwrap();
        assert_eq!(a.sequence(), 0);
        assert_eq!(b.sequence(), 1);
        assert_eq!(a.taxon(), 7);
        assert_eq!(a.issuer(), ctx.caller);
        assert_eq!(view.get_account(&ctx.caller).unwrap().minted_tokens, 2);
        assert!(pages::find_token(&view, &ctx.caller, &a).is_some());
    }

    #[test]
    fn test_authorized_minter_path() {
        let mut view = MemoryLedger::new();
        let minter = ctx(1);
        let issuer = account(2);
        view.fund(&minter.caller, account_reserve(1));
        view.fund(&issuer, 0);

        let payload = MintPayload::new(0).with_issuer(issuer.clone());
        assert_eq!(
            preclaim(&view, &minter, &payload),
            Err(NftError::NoPermission)
        );

        view.set_minter(&issuer, Some(minter.caller.clone()));
        assert!(preclaim(&view, &minter, &payload).is_ok());

        // Tokens mint into the submitter's directory but consume the
        // issuer's sequence and carry the issuer's identity.
        let id = apply(&mut view, &minter, &payload).unwrap();
        assert_eq!(id.issuer(), issuer);
        assert_eq!(view.get_account(&issuer).unwrap().minted_tokens, 1);
        assert!(pages::find_token(&view, &minter.caller, &id).is_some());

        // A missing issuer account fails before any of that.
        let ghost = MintPayload::new(0).with_issuer(account(9));
        assert_eq!(preclaim(&view, &minter, &ghost), Err(NftError::NoIssuer));
    }

    #[test]
    fn test_sequence_exhaustion() {
        let mut view = MemoryLedger::new();
        let ctx = ctx(1);
        view.fund(&ctx.caller, account_reserve(1));
        let mut root = view.get_account(&ctx.caller).unwrap();
        root.minted_tokens = u32::MAX;
        view.set_account(&ctx.caller, root);

        assert_eq!(
            apply(&mut view, &ctx, &MintPayload::new(0)),
            Err(NftError::MaxSequenceReached)
        );
    }

    #[test]
    fn test_reserve_checked_only_on_page_creation() {
        let mut view = MemoryLedger::new();
        let ctx = ctx(1);
        // One drop short of the one-page reserve.
        view.fund(&ctx.caller, account_reserve(1) - 1);

        assert_eq!(
            apply(&mut view, &ctx, &MintPayload::new(0)),
            Err(NftError::InsufficientReserve)
        );

        view.fund(&ctx.caller, account_reserve(1));
        assert!(apply(&mut view, &ctx, &MintPayload::new(0)).is_ok());

        // The page exists now; later mints onto it skip the reserve check
        // even if the balance shrinks.
        let mut root = view.get_account(&ctx.caller).unwrap();
        root.balance = BASE_RESERVE;
        view.set_account(&ctx.caller, root);
        assert!(apply(&mut view, &ctx, &MintPayload::new(0)).is_ok());
    }
}
