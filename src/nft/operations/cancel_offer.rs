// Batch offer cancellation.
//
// Each listed offer may be cancelled by its owner, by its destination, or
// by anyone once it has expired. Entries that no longer exist are skipped:
// an offer consumed earlier in the same ledger is not an error.

use std::collections::HashSet;

use crate::crypto::Hash;
use crate::ledger::{has_expired, LedgerView};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

use super::super::error::{NftError, NftResult};
use super::super::types::MAX_OFFERS_PER_CANCEL;
use super::{delete_offer, TxContext};

/// `NFTokenCancelOffer` transaction payload.
#[derive(Clone, Debug)]
pub struct CancelOfferPayload {
    offers: Vec<Hash>,
}

impl CancelOfferPayload {
    pub fn new(offers: Vec<Hash>) -> Self {
        CancelOfferPayload { offers }
    }

    #[inline]
    pub fn offers(&self) -> &[Hash] {
        &self.offers
    }
}

impl Serializer for CancelOfferPayload {
    fn write(&self, writer: &mut Writer) {
        writer.write_u16(self.offers.len() as u16);
        for offer in &self.offers {
            offer.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let len = reader.read_u16()? as usize;
        if len > MAX_OFFERS_PER_CANCEL {
            return Err(ReaderError::InvalidValue);
        }
        let mut offers = Vec::with_capacity(len);
        for _ in 0..len {
            offers.push(Hash::read(reader)?);
        }
        Ok(CancelOfferPayload { offers })
    }

    fn size(&self) -> usize {
        2 + self.offers.iter().map(Serializer::size).sum::<usize>()
    }
}

pub fn preflight(payload: &CancelOfferPayload) -> NftResult<()> {
    if payload.offers.is_empty() || payload.offers.len() > MAX_OFFERS_PER_CANCEL {
        return Err(NftError::Malformed);
    }

    let mut seen = HashSet::new();
    for offer in &payload.offers {
        if !seen.insert(offer) {
            return Err(NftError::Malformed);
        }
    }
    Ok(())
}

pub fn preclaim<V: LedgerView + ?Sized>(
    view: &V,
    ctx: &TxContext,
    payload: &CancelOfferPayload,
) -> NftResult<()> {
    for id in &payload.offers {
        let Some(offer) = view.get_offer(id) else {
            continue;
        };
        let permitted = offer.owner == ctx.caller
            || offer.destination.as_ref() == Some(&ctx.caller)
            || has_expired(view, offer.expiration);
        if !permitted {
            return Err(NftError::NoPermission);
        }
    }
    Ok(())
}

pub fn apply<V: LedgerView + ?Sized>(
    view: &mut V,
    _ctx: &TxContext,
    payload: &CancelOfferPayload,
) -> NftResult<()> {
    for id in &payload.offers {
        if let Some(offer) = view.get_offer(id) {
            delete_offer(view, id, &offer)?;
        }
    }
    Ok(())
}
