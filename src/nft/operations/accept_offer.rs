// Offer acceptance and brokerage.
//
// Direct mode consumes a single offer: accepting a sell offer makes the
// submitter the buyer, accepting a buy offer makes the submitter the
// seller. Brokered mode pairs one of each on behalf of their owners and
// lets the submitter keep a fee. Payments follow a fixed order: the
// broker's cut, then the issuer's royalty computed on what remains, then
// the seller. Computing the royalty before removing the broker's cut
// could pay out more than the buyer authorized.

use crate::asset::Amount;
use crate::crypto::{AccountId, Hash};
use crate::ledger::{has_expired, LedgerView};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

use super::super::error::{NftError, NftResult};
use super::super::id::TokenId;
use super::super::pages;
use super::super::types::{transfer_fee_cut, NftOffer};
use super::{delete_offer, TxContext};

/// `NFTokenAcceptOffer` transaction payload.
#[derive(Clone, Debug)]
pub struct AcceptOfferPayload {
    buy_offer: Option<Hash>,
    sell_offer: Option<Hash>,
    broker_fee: Option<Amount>,
}

impl AcceptOfferPayload {
    pub fn new(buy_offer: Option<Hash>, sell_offer: Option<Hash>) -> Self {
        AcceptOfferPayload {
            buy_offer,
            sell_offer,
            broker_fee: None,
        }
    }

    pub fn with_broker_fee(mut self, broker_fee: Amount) -> Self {
        self.broker_fee = Some(broker_fee);
        self
    }

    #[inline]
    pub fn buy_offer(&self) -> Option<&Hash> {
        self.buy_offer.as_ref()
    }

    #[inline]
    pub fn sell_offer(&self) -> Option<&Hash> {
        self.sell_offer.as_ref()
    }

    #[inline]
    pub fn broker_fee(&self) -> Option<&Amount> {
        self.broker_fee.as_ref()
    }
}

impl Serializer for AcceptOfferPayload {
    fn write(&self, writer: &mut Writer) {
        self.buy_offer.write(writer);
        self.sell_offer.write(writer);
        self.broker_fee.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AcceptOfferPayload {
            buy_offer: Option::read(reader)?,
            sell_offer: Option::read(reader)?,
            broker_fee: Option::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.buy_offer.size() + self.sell_offer.size() + self.broker_fee.size()
    }
}

pub fn preflight(payload: &AcceptOfferPayload) -> NftResult<()> {
    if payload.buy_offer.is_none() && payload.sell_offer.is_none() {
        return Err(NftError::Malformed);
    }

    // A broker fee only makes sense in brokered mode, and must be positive.
    if let Some(fee) = &payload.broker_fee {
        if payload.buy_offer.is_none() || payload.sell_offer.is_none() {
            return Err(NftError::Malformed);
        }
        if fee.is_zero() {
            return Err(NftError::Malformed);
        }
    }

    Ok(())
}

fn load_offer<V: LedgerView + ?Sized>(
    view: &V,
    id: Option<&Hash>,
) -> NftResult<Option<NftOffer>> {
    match id {
        None => Ok(None),
        Some(id) => {
            let offer = view.get_offer(id).ok_or(NftError::ObjectNotFound)?;
            if has_expired(view, offer.expiration) {
                return Err(NftError::Expired);
            }
            Ok(Some(offer))
        }
    }
}

pub fn preclaim<V: LedgerView + ?Sized>(
    view: &V,
    ctx: &TxContext,
    payload: &AcceptOfferPayload,
) -> NftResult<()> {
    let bo = load_offer(view, payload.buy_offer.as_ref())?;
    let so = load_offer(view, payload.sell_offer.as_ref())?;

    if let (Some(bo), Some(so)) = (&bo, &so) {
        // Brokered mode: the two offers must describe the same trade.
        if bo.token_id != so.token_id {
            return Err(NftError::BuySellMismatch);
        }
        if bo.amount.asset() != so.amount.asset() {
            return Err(NftError::BuySellMismatch);
        }
        if so.amount.value() > bo.amount.value() {
            return Err(NftError::InsufficientPayment);
        }
        // A directed sell offer may only be brokered to its destination.
        if let Some(destination) = &so.destination {
            if destination != &bo.owner {
                return Err(NftError::BuySellMismatch);
            }
        }
        if let Some(fee) = &payload.broker_fee {
            if fee.asset() != bo.amount.asset() {
                return Err(NftError::BuySellMismatch);
            }
            if fee.value() >= bo.amount.value() {
                return Err(NftError::InsufficientPayment);
            }
            // The seller's asking price must survive the broker's cut.
            if so.amount.value() > bo.amount.value() - fee.value() {
                return Err(NftError::InsufficientPayment);
            }
        }
    }

    if let Some(bo) = &bo {
        if bo.is_sell() {
            return Err(NftError::OfferTypeMismatch);
        }
        if bo.owner == ctx.caller {
            return Err(NftError::CannotAcceptOwnOffer);
        }
        // Direct acceptance: the submitter is handing over the token.
        if so.is_none() && pages::find_token(view, &ctx.caller, &bo.token_id).is_none() {
            return Err(NftError::NoPermission);
        }
        // The buyer must be good for the money in either mode.
        if view.account_holds(&bo.owner, bo.amount.asset()) < bo.amount.value() {
            return Err(NftError::InsufficientFunds);
        }
    }

    if let Some(so) = &so {
        if !so.is_sell() {
            return Err(NftError::OfferTypeMismatch);
        }
        if so.owner == ctx.caller {
            return Err(NftError::CannotAcceptOwnOffer);
        }
        // The seller must still hold what they offered.
        if pages::find_token(view, &so.owner, &so.token_id).is_none() {
            return Err(NftError::NoPermission);
        }
        if bo.is_none() {
            // Direct acceptance: honor the offer's destination and check
            // the submitter's funds, since the submitter is the buyer.
            if let Some(destination) = &so.destination {
                if destination != &ctx.caller {
                    return Err(NftError::NoPermission);
                }
            }
            if view.account_holds(&ctx.caller, so.amount.asset()) < so.amount.value() {
                return Err(NftError::InsufficientFunds);
            }
        }
    }

    Ok(())
}

fn pay<V: LedgerView + ?Sized>(
    view: &mut V,
    from: &AccountId,
    to: &AccountId,
    amount: &Amount,
) -> NftResult<()> {
    if amount.is_zero() {
        return Ok(());
    }
    view.send(from, to, amount)
}

/// Royalty, then the seller, out of `amount`.
fn settle<V: LedgerView + ?Sized>(
    view: &mut V,
    buyer: &AccountId,
    seller: &AccountId,
    token_id: &TokenId,
    amount: Amount,
) -> NftResult<()> {
    if amount.is_zero() {
        return Ok(());
    }
    let mut amount = amount;

    let fee = token_id.transfer_fee();
    if fee != 0 {
        let cut = transfer_fee_cut(&amount, fee);
        let issuer = token_id.issuer();
        // A sale the issuer participates in pays no royalty.
        if !cut.is_zero() && *seller != issuer && *buyer != issuer {
            pay(view, buyer, &issuer, &cut)?;
            amount = amount.with_value(amount.value() - cut.value());
        }
    }

    pay(view, buyer, seller, &amount)
}

/// Move the token between directories. A failure after the removal
/// succeeded is a consistency violation, never a user-visible state.
fn transfer_token<V: LedgerView + ?Sized>(
    view: &mut V,
    seller: &AccountId,
    buyer: &AccountId,
    token_id: &TokenId,
) -> NftResult<()> {
    let Some(nft) = pages::find_token(view, seller, token_id) else {
        log::error!("token {token_id} missing from {seller}'s directory during accept");
        return Err(NftError::Internal);
    };

    pages::remove_token(view, seller, token_id)?;

    if let Err(err) = pages::insert_token(view, buyer, nft, |view: &mut V, account: &AccountId| {
        view.adjust_owner_count(account, 1)
    }) {
        log::error!("token {token_id} removed from {seller} but not insertable for {buyer}: {err}");
        return Err(NftError::Internal);
    }
    Ok(())
}

pub fn apply<V: LedgerView + ?Sized>(
    view: &mut V,
    ctx: &TxContext,
    payload: &AcceptOfferPayload,
) -> NftResult<()> {
    let load = |view: &V, id: &Option<Hash>| -> NftResult<Option<(Hash, NftOffer)>> {
        match id {
            None => Ok(None),
            Some(id) => match view.get_offer(id) {
                Some(offer) => Ok(Some((id.clone(), offer))),
                None => {
                    log::error!("offer {id} disappeared between preclaim and apply");
                    Err(NftError::Internal)
                }
            },
        }
    };
    let bo = load(view, &payload.buy_offer)?;
    let so = load(view, &payload.sell_offer)?;

    // Both offers are consumed before any payment moves.
    if let Some((id, offer)) = &bo {
        delete_offer(view, id, offer)?;
    }
    if let Some((id, offer)) = &so {
        delete_offer(view, id, offer)?;
    }

    match (bo, so) {
        (Some((_, bo)), Some((_, so))) => {
            let buyer = bo.owner.clone();
            let seller = so.owner.clone();
            let mut amount = bo.amount.clone();

            // Broker first; the royalty is computed on the remainder.
            if let Some(fee) = &payload.broker_fee {
                if !fee.is_zero() {
                    pay(view, &buyer, &ctx.caller, fee)?;
                    amount = amount.with_value(amount.value() - fee.value());
                }
            }

            settle(view, &buyer, &seller, &so.token_id, amount)?;
            transfer_token(view, &seller, &buyer, &so.token_id)
        }
        (Some((_, bo)), None) => {
            // The submitter sells into the buy offer.
            let buyer = bo.owner.clone();
            settle(view, &buyer, &ctx.caller, &bo.token_id, bo.amount.clone())?;
            transfer_token(view, &ctx.caller, &buyer, &bo.token_id)
        }
        (None, Some((_, so))) => {
            // The submitter buys from the sell offer.
            let seller = so.owner.clone();
            settle(view, &ctx.caller, &seller, &so.token_id, so.amount.clone())?;
            transfer_token(view, &seller, &ctx.caller, &so.token_id)
        }
        (None, None) => Err(NftError::Internal),
    }
}
