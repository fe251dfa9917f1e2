// NFT transaction operations.
//
// Every transaction runs in three phases: preflight (stateless shape
// checks), preclaim (read-only inspection of the view) and apply
// (mutation). A failed preflight or preclaim leaves the view untouched; an
// apply failure surfaces to the caller, who discards the view. There are
// no partial results.

pub mod accept_offer;
pub mod burn;
pub mod cancel_offer;
pub mod create_offer;
pub mod mint;
pub mod validation;

pub use accept_offer::AcceptOfferPayload;
pub use burn::BurnPayload;
pub use cancel_offer::CancelOfferPayload;
pub use create_offer::CreateOfferPayload;
pub use mint::MintPayload;

use crate::crypto::{AccountId, Hash};
use crate::ledger::LedgerView;
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

use super::error::{NftError, NftResult};
use super::storage::{buy_offer_directory, owner_directory, sell_offer_directory};
use super::types::NftOffer;

/// Submitter context for one transaction.
pub struct TxContext {
    pub caller: AccountId,
}

impl TxContext {
    pub fn new(caller: AccountId) -> Self {
        TxContext { caller }
    }
}

/// The NFT transaction set.
#[derive(Clone, Debug)]
pub enum NftTransaction {
    Mint(MintPayload),
    Burn(BurnPayload),
    CreateOffer(CreateOfferPayload),
    CancelOffer(CancelOfferPayload),
    AcceptOffer(AcceptOfferPayload),
}

impl NftTransaction {
    fn tag(&self) -> u8 {
        match self {
            NftTransaction::Mint(_) => 0,
            NftTransaction::Burn(_) => 1,
            NftTransaction::CreateOffer(_) => 2,
            NftTransaction::CancelOffer(_) => 3,
            NftTransaction::AcceptOffer(_) => 4,
        }
    }
}

impl Serializer for NftTransaction {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(self.tag());
        match self {
            NftTransaction::Mint(payload) => payload.write(writer),
            NftTransaction::Burn(payload) => payload.write(writer),
            NftTransaction::CreateOffer(payload) => payload.write(writer),
            NftTransaction::CancelOffer(payload) => payload.write(writer),
            NftTransaction::AcceptOffer(payload) => payload.write(writer),
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(match reader.read_u8()? {
            0 => NftTransaction::Mint(MintPayload::read(reader)?),
            1 => NftTransaction::Burn(BurnPayload::read(reader)?),
            2 => NftTransaction::CreateOffer(CreateOfferPayload::read(reader)?),
            3 => NftTransaction::CancelOffer(CancelOfferPayload::read(reader)?),
            4 => NftTransaction::AcceptOffer(AcceptOfferPayload::read(reader)?),
            _ => return Err(ReaderError::InvalidValue),
        })
    }
}

/// Run a transaction through all three phases against the view.
/// On any error the caller must discard the view.
pub fn execute<V: LedgerView + ?Sized>(
    view: &mut V,
    ctx: &TxContext,
    tx: &NftTransaction,
) -> NftResult<()> {
    match tx {
        NftTransaction::Mint(payload) => {
            mint::preflight(ctx, payload)?;
            mint::preclaim(view, ctx, payload)?;
            mint::apply(view, ctx, payload).map(|_| ())
        }
        NftTransaction::Burn(payload) => {
            burn::preclaim(view, ctx, payload)?;
            burn::apply(view, ctx, payload)
        }
        NftTransaction::CreateOffer(payload) => {
            create_offer::preflight(ctx, payload)?;
            create_offer::preclaim(view, ctx, payload)?;
            create_offer::apply(view, ctx, payload).map(|_| ())
        }
        NftTransaction::CancelOffer(payload) => {
            cancel_offer::preflight(payload)?;
            cancel_offer::preclaim(view, ctx, payload)?;
            cancel_offer::apply(view, ctx, payload)
        }
        NftTransaction::AcceptOffer(payload) => {
            accept_offer::preflight(payload)?;
            accept_offer::preclaim(view, ctx, payload)?;
            accept_offer::apply(view, ctx, payload)
        }
    }
}

/// Unlink an offer from its owner directory and its token directory,
/// release the owner's reserve charge and erase the object. Any unlink
/// failure is a consistency violation.
pub(crate) fn delete_offer<V: LedgerView + ?Sized>(
    view: &mut V,
    id: &Hash,
    offer: &NftOffer,
) -> NftResult<()> {
    if !view.dir_remove(&owner_directory(&offer.owner), offer.owner_node, id) {
        log::error!("offer {id} not found in its owner directory");
        return Err(NftError::Internal);
    }
    let token_dir = if offer.is_sell() {
        sell_offer_directory(&offer.token_id)
    } else {
        buy_offer_directory(&offer.token_id)
    };
    if !view.dir_remove(&token_dir, offer.offer_node, id) {
        log::error!("offer {id} not found in its token directory");
        return Err(NftError::Internal);
    }
    view.adjust_owner_count(&offer.owner, -1);
    view.delete_offer(id);
    Ok(())
}

/// Delete every offer reachable from a token offer directory.
pub(crate) fn remove_all_offers<V: LedgerView + ?Sized>(
    view: &mut V,
    dir: &Hash,
) -> NftResult<()> {
    for id in view.dir_entries(dir) {
        let Some(offer) = view.get_offer(&id) else {
            log::error!("offer {id} listed in a directory but absent from the ledger");
            return Err(NftError::Internal);
        };
        delete_offer(view, &id, &offer)?;
    }
    Ok(())
}
