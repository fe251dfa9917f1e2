// Offer creation.
//
// A sell offer is placed by the token's current holder; a buy offer names
// the holder explicitly and escrows nothing, so the buyer's funds are only
// checked, not moved. The offer is linked into two sorted directories: the
// token's buy- or sell-offer directory and the submitter's outgoing-offer
// directory. The offer costs the submitter one owner-count unit of
// reserve.

use crate::crypto::{AccountId, Hash};
use crate::asset::Amount;
use crate::ledger::{has_expired, LedgerView};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

use super::super::error::{NftError, NftResult};
use super::super::id::TokenId;
use super::super::pages;
use super::super::storage::{
    buy_offer_directory, offer_index, owner_directory, sell_offer_directory,
};
use super::super::types::{flags, NftOffer};
use super::validation::{validate_expiration, validate_offer_flags};
use super::TxContext;

/// `NFTokenCreateOffer` transaction payload.
#[derive(Clone, Debug)]
pub struct CreateOfferPayload {
    token_id: TokenId,
    amount: Amount,
    flags: u16,
    owner: Option<AccountId>,
    destination: Option<AccountId>,
    expiration: Option<u64>,
}

impl CreateOfferPayload {
    /// An offer to sell a token the submitter holds.
    pub fn sell(token_id: TokenId, amount: Amount) -> Self {
        CreateOfferPayload {
            token_id,
            amount,
            flags: flags::SELL_TOKEN,
            owner: None,
            destination: None,
            expiration: None,
        }
    }

    /// An offer to buy a token currently held by `owner`.
    pub fn buy(token_id: TokenId, amount: Amount, owner: AccountId) -> Self {
        CreateOfferPayload {
            token_id,
            amount,
            flags: 0,
            owner: Some(owner),
            destination: None,
            expiration: None,
        }
    }

    pub fn with_destination(mut self, destination: AccountId) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_expiration(mut self, expiration: u64) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[inline]
    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    #[inline]
    pub fn is_sell(&self) -> bool {
        self.flags & flags::SELL_TOKEN != 0
    }
}

impl Serializer for CreateOfferPayload {
    fn write(&self, writer: &mut Writer) {
        self.token_id.write(writer);
        self.amount.write(writer);
        self.flags.write(writer);
        self.owner.write(writer);
        self.destination.write(writer);
        self.expiration.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(CreateOfferPayload {
            token_id: TokenId::read(reader)?,
            amount: Amount::read(reader)?,
            flags: u16::read(reader)?,
            owner: Option::read(reader)?,
            destination: Option::read(reader)?,
            expiration: Option::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.token_id.size()
            + self.amount.size()
            + self.flags.size()
            + self.owner.size()
            + self.destination.size()
            + self.expiration.size()
    }
}

pub fn preflight(ctx: &TxContext, payload: &CreateOfferPayload) -> NftResult<()> {
    validate_offer_flags(payload.flags)?;
    validate_expiration(payload.expiration)?;

    if payload.token_id.flags() & flags::ONLY_NATIVE != 0 && !payload.amount.is_native() {
        return Err(NftError::BadAmount);
    }

    if payload.is_sell() {
        // The submitter is the holder; naming an owner is meaningless.
        if payload.owner.is_some() {
            return Err(NftError::Malformed);
        }
    } else {
        if payload.amount.is_zero() {
            return Err(NftError::BadAmount);
        }
        // A buy offer names the current holder, who cannot be the buyer.
        match &payload.owner {
            None => return Err(NftError::Malformed),
            Some(owner) if *owner == ctx.caller => return Err(NftError::Malformed),
            Some(_) => {}
        }
        // Only sell offers may be directed at a specific taker.
        if payload.destination.is_some() {
            return Err(NftError::Malformed);
        }
    }

    if payload.destination.as_ref() == Some(&ctx.caller) {
        return Err(NftError::Malformed);
    }

    Ok(())
}

fn check_trust_line<V: LedgerView + ?Sized>(
    view: &V,
    account: &AccountId,
    asset: &Hash,
) -> NftResult<()> {
    match view.get_trust_line(account, asset) {
        None => Err(NftError::NoTrustLine),
        Some(line) if line.frozen => Err(NftError::Frozen),
        Some(_) => Ok(()),
    }
}

pub fn preclaim<V: LedgerView + ?Sized>(
    view: &V,
    ctx: &TxContext,
    payload: &CreateOfferPayload,
) -> NftResult<()> {
    if has_expired(view, payload.expiration) {
        return Err(NftError::Expired);
    }

    if let Some(destination) = &payload.destination {
        if view.get_account(destination).is_none() {
            return Err(NftError::ObjectNotFound);
        }
    }

    // A token without the transferable flag only trades through its issuer
    // side: the issuer, or the issuer's authorized minter.
    let issuer = payload.token_id.issuer();
    if payload.token_id.flags() & flags::TRANSFERABLE == 0 && ctx.caller != issuer {
        let minter = view.get_account(&issuer).and_then(|root| root.minter);
        if minter.as_ref() != Some(&ctx.caller) {
            return Err(NftError::NotTransferable);
        }
    }

    if !payload.amount.is_native() {
        // The buyer pays in an issued asset and must already hold a line.
        if !payload.is_sell() {
            check_trust_line(view, &ctx.caller, payload.amount.asset())?;
        }
        // Royalties flow to the token's issuer; unless the token lets fee
        // payments create the line on demand, it must exist up front.
        if payload.token_id.transfer_fee() > 0
            && payload.token_id.flags() & flags::CREATE_TRUST_LINES == 0
        {
            check_trust_line(view, &issuer, payload.amount.asset())?;
        }
    }

    if payload.is_sell() {
        if pages::find_token(view, &ctx.caller, &payload.token_id).is_none() {
            return Err(NftError::NoEntry);
        }
    } else {
        let owner = payload.owner.as_ref().ok_or(NftError::Malformed)?;
        if pages::find_token(view, owner, &payload.token_id).is_none() {
            return Err(NftError::NoEntry);
        }
        if view.account_holds(&ctx.caller, payload.amount.asset()) < payload.amount.value() {
            return Err(NftError::InsufficientFunds);
        }
    }

    Ok(())
}

pub fn apply<V: LedgerView + ?Sized>(
    view: &mut V,
    ctx: &TxContext,
    payload: &CreateOfferPayload,
) -> NftResult<Hash> {
    let mut root = view.get_account(&ctx.caller).ok_or(NftError::NoEntry)?;

    // The balance held before this transaction must already cover the
    // reserve with the new offer counted in.
    if root.balance < view.account_reserve(root.owner_count.saturating_add(1)) {
        return Err(NftError::InsufficientReserve);
    }

    let sequence = root.sequence;
    root.sequence = sequence.wrapping_add(1);
    view.set_account(&ctx.caller, root);

    let id = offer_index(&ctx.caller, sequence);
    let token_dir = if payload.is_sell() {
        sell_offer_directory(&payload.token_id)
    } else {
        buy_offer_directory(&payload.token_id)
    };
    let offer_node = view.dir_insert(&token_dir, &id);
    let owner_node = view.dir_insert(&owner_directory(&ctx.caller), &id);

    view.set_offer(
        &id,
        NftOffer {
            owner: ctx.caller.clone(),
            token_id: payload.token_id.clone(),
            amount: payload.amount.clone(),
            flags: payload.flags,
            destination: payload.destination.clone(),
            expiration: payload.expiration,
            owner_node,
            offer_node,
        },
    );
    view.adjust_owner_count(&ctx.caller, 1);

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::super::mint::{self, MintPayload};
    use super::*;
    use crate::asset::TrustLine;
    use crate::config::account_reserve;
    use crate::crypto::ACCOUNT_ID_SIZE;
    use crate::ledger::MemoryLedger;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; ACCOUNT_ID_SIZE])
    }

    fn ctx(byte: u8) -> TxContext {
        TxContext::new(account(byte))
    }

    fn gold() -> Hash {
        Hash::new([0xAA; 32])
    }

    fn setup() -> (MemoryLedger, TxContext, TxContext, TokenId) {
        let mut view = MemoryLedger::new();
        let holder = ctx(1);
        let buyer = ctx(2);
        view.fund(&holder.caller, account_reserve(8));
        view.fund(&buyer.caller, account_reserve(8));
        let id = mint::apply(
            &mut view,
            &holder,
            &MintPayload::new(0).with_flags(flags::TRANSFERABLE),
        )
        .unwrap();
        (view, holder, buyer, id)
    }

    #[test]
    fn test_preflight_shapes() {
        let (_, holder, buyer, id) = setup();

        // buy offers: positive amount, explicit foreign owner, no destination
        assert_eq!(
            preflight(
                &buyer,
                &CreateOfferPayload::buy(id.clone(), Amount::native(0), holder.caller.clone())
            ),
            Err(NftError::BadAmount)
        );
        assert_eq!(
            preflight(
                &buyer,
                &CreateOfferPayload::buy(id.clone(), Amount::native(5), buyer.caller.clone())
            ),
            Err(NftError::Malformed)
        );
        assert_eq!(
            preflight(
                &buyer,
                &CreateOfferPayload::buy(id.clone(), Amount::native(5), holder.caller.clone())
                    .with_destination(account(9))
            ),
            Err(NftError::Malformed)
        );

        // sell offers: zero amount fine, owner field forbidden
        assert!(preflight(
            &holder,
            &CreateOfferPayload::sell(id.clone(), Amount::native(0))
        )
        .is_ok());
        let mut with_owner = CreateOfferPayload::sell(id.clone(), Amount::native(5));
        with_owner.owner = Some(account(9));
        assert_eq!(preflight(&holder, &with_owner), Err(NftError::Malformed));

        // destination cannot be the submitter; expiration cannot be zero
        assert_eq!(
            preflight(
                &holder,
                &CreateOfferPayload::sell(id.clone(), Amount::native(5))
                    .with_destination(holder.caller.clone())
            ),
            Err(NftError::Malformed)
        );
        assert_eq!(
            preflight(
                &holder,
                &CreateOfferPayload::sell(id, Amount::native(5)).with_expiration(0)
            ),
            Err(NftError::BadExpiration)
        );
    }

    #[test]
    fn test_only_native_flag() {
        let mut view = MemoryLedger::new();
        let holder = ctx(1);
        view.fund(&holder.caller, account_reserve(4));
        let id = mint::apply(
            &mut view,
            &holder,
            &MintPayload::new(0).with_flags(flags::TRANSFERABLE | flags::ONLY_NATIVE),
        )
        .unwrap();

        assert_eq!(
            preflight(
                &holder,
                &CreateOfferPayload::sell(id.clone(), Amount::new(gold(), 10))
            ),
            Err(NftError::BadAmount)
        );
        assert!(preflight(&holder, &CreateOfferPayload::sell(id, Amount::native(10))).is_ok());
    }

    #[test]
    fn test_sell_requires_holding_and_buy_requires_funds() {
        let (view, holder, buyer, id) = setup();

        // the buyer does not hold the token and cannot sell it
        assert_eq!(
            preclaim(
                &view,
                &buyer,
                &CreateOfferPayload::sell(id.clone(), Amount::native(5))
            ),
            Err(NftError::NoEntry)
        );
        assert!(preclaim(
            &view,
            &holder,
            &CreateOfferPayload::sell(id.clone(), Amount::native(5))
        )
        .is_ok());

        // buy offer against the actual holder, with and without funds
        let huge = view.get_account(&buyer.caller).unwrap().balance + 1;
        assert_eq!(
            preclaim(
                &view,
                &buyer,
                &CreateOfferPayload::buy(id.clone(), Amount::native(huge), holder.caller.clone())
            ),
            Err(NftError::InsufficientFunds)
        );
        assert!(preclaim(
            &view,
            &buyer,
            &CreateOfferPayload::buy(id, Amount::native(5), holder.caller.clone())
        )
        .is_ok());
    }

    #[test]
    fn test_non_transferable_token() {
        let mut view = MemoryLedger::new();
        let issuer = ctx(1);
        let buyer = ctx(2);
        view.fund(&issuer.caller, account_reserve(4));
        view.fund(&buyer.caller, account_reserve(4));
        let id = mint::apply(&mut view, &issuer, &MintPayload::new(0)).unwrap();

        // The issuer may still offer it for sale...
        assert!(preclaim(
            &view,
            &issuer,
            &CreateOfferPayload::sell(id.clone(), Amount::native(5))
        )
        .is_ok());
        // ...but a third party cannot place offers on it.
        assert_eq!(
            preclaim(
                &view,
                &buyer,
                &CreateOfferPayload::buy(id, Amount::native(5), issuer.caller.clone())
            ),
            Err(NftError::NotTransferable)
        );
    }

    #[test]
    fn test_issued_asset_trust_lines() {
        let mut view = MemoryLedger::new();
        let issuer = ctx(1);
        let holder = ctx(2);
        let buyer = ctx(3);
        view.fund(&issuer.caller, account_reserve(4));
        view.fund(&holder.caller, account_reserve(4));
        view.fund(&buyer.caller, account_reserve(4));
        view.set_minter(&issuer.caller, Some(holder.caller.clone()));
        let id = mint::apply(
            &mut view,
            &holder,
            &MintPayload::new(0)
                .with_issuer(issuer.caller.clone())
                .with_flags(flags::TRANSFERABLE)
                .with_transfer_fee(1_000),
        )
        .unwrap();

        let buy = CreateOfferPayload::buy(id.clone(), Amount::new(gold(), 50), holder.caller.clone());

        // no buyer line at all
        assert_eq!(preclaim(&view, &buyer, &buy), Err(NftError::NoTrustLine));

        // buyer line exists but the token's issuer has none and the fee is
        // nonzero without the on-demand flag
        view.set_trust_line(&buyer.caller, &gold(), TrustLine::new(100));
        assert_eq!(preclaim(&view, &buyer, &buy), Err(NftError::NoTrustLine));

        view.set_trust_line(&issuer.caller, &gold(), TrustLine::new(0));
        assert!(preclaim(&view, &buyer, &buy).is_ok());

        // a frozen buyer line blocks the offer
        let mut frozen = TrustLine::new(100);
        frozen.frozen = true;
        view.set_trust_line(&buyer.caller, &gold(), frozen);
        assert_eq!(preclaim(&view, &buyer, &buy), Err(NftError::Frozen));
    }

    #[test]
    fn test_apply_links_offer_and_charges_reserve() {
        let (mut view, holder, _, id) = setup();

        let owner_count_before = view.get_account(&holder.caller).unwrap().owner_count;
        let offer_id = apply(
            &mut view,
            &holder,
            &CreateOfferPayload::sell(id.clone(), Amount::native(5)),
        )
        .unwrap();

        let offer = view.get_offer(&offer_id).unwrap();
        assert!(offer.is_sell());
        assert_eq!(offer.owner, holder.caller);
        assert_eq!(view.dir_len(&sell_offer_directory(&id)), 1);
        assert_eq!(view.dir_len(&owner_directory(&holder.caller)), 1);
        assert_eq!(
            view.get_account(&holder.caller).unwrap().owner_count,
            owner_count_before + 1
        );

        // distinct sequences give distinct offer ids
        let second = apply(
            &mut view,
            &holder,
            &CreateOfferPayload::sell(id, Amount::native(7)),
        )
        .unwrap();
        assert_ne!(second, offer_id);
    }

    #[test]
    fn test_apply_reserve_exhaustion() {
        let (mut view, holder, _, id) = setup();
        let mut root = view.get_account(&holder.caller).unwrap();
        // Exactly at the reserve for current holdings: one more object tips it.
        root.balance = account_reserve(root.owner_count);
        view.set_account(&holder.caller, root);

        assert_eq!(
            apply(
                &mut view,
                &holder,
                &CreateOfferPayload::sell(id, Amount::native(5))
            ),
            Err(NftError::InsufficientReserve)
        );
    }
}
