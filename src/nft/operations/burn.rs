// Token burning.
//
// A burn removes the token from its holder's directory and cascade-deletes
// every outstanding offer for it, bounded so a single transaction cannot
// touch an unbounded amount of state.

use crate::crypto::AccountId;
use crate::ledger::LedgerView;
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

use super::super::error::{NftError, NftResult};
use super::super::id::TokenId;
use super::super::pages;
use super::super::storage::{buy_offer_directory, sell_offer_directory};
use super::super::types::{flags, MAX_OFFERS_PER_BURN};
use super::{remove_all_offers, TxContext};

/// `NFTokenBurn` transaction payload.
#[derive(Clone, Debug)]
pub struct BurnPayload {
    token_id: TokenId,
    owner: Option<AccountId>,
}

impl BurnPayload {
    pub fn new(token_id: TokenId) -> Self {
        BurnPayload {
            token_id,
            owner: None,
        }
    }

    /// Burn a token held by `owner` rather than by the submitter.
    pub fn with_owner(mut self, owner: AccountId) -> Self {
        self.owner = Some(owner);
        self
    }

    #[inline]
    pub fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[inline]
    pub fn owner(&self) -> Option<&AccountId> {
        self.owner.as_ref()
    }
}

impl Serializer for BurnPayload {
    fn write(&self, writer: &mut Writer) {
        self.token_id.write(writer);
        self.owner.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(BurnPayload {
            token_id: TokenId::read(reader)?,
            owner: Option::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.token_id.size() + self.owner.size()
    }
}

pub fn preclaim<V: LedgerView + ?Sized>(
    view: &V,
    ctx: &TxContext,
    payload: &BurnPayload,
) -> NftResult<()> {
    let owner = payload
        .owner
        .clone()
        .unwrap_or_else(|| ctx.caller.clone());

    if pages::find_token(view, &owner, &payload.token_id).is_none() {
        return Err(NftError::NoEntry);
    }

    // The holder may always burn. Anyone else needs the token minted
    // burnable and must be the issuer or the issuer's authorized minter.
    if ctx.caller != owner {
        if payload.token_id.flags() & flags::BURNABLE == 0 {
            return Err(NftError::NoPermission);
        }
        let issuer = payload.token_id.issuer();
        if ctx.caller != issuer {
            let minter = view.get_account(&issuer).and_then(|root| root.minter);
            if minter.as_ref() != Some(&ctx.caller) {
                return Err(NftError::NoPermission);
            }
        }
    }

    let outstanding = view.dir_len(&buy_offer_directory(&payload.token_id))
        + view.dir_len(&sell_offer_directory(&payload.token_id));
    if outstanding > MAX_OFFERS_PER_BURN {
        return Err(NftError::TooBig);
    }

    Ok(())
}

pub fn apply<V: LedgerView + ?Sized>(
    view: &mut V,
    ctx: &TxContext,
    payload: &BurnPayload,
) -> NftResult<()> {
    let owner = payload
        .owner
        .clone()
        .unwrap_or_else(|| ctx.caller.clone());

    remove_all_offers(view, &buy_offer_directory(&payload.token_id))?;
    remove_all_offers(view, &sell_offer_directory(&payload.token_id))?;

    pages::remove_token(view, &owner, &payload.token_id)?;

    let issuer = payload.token_id.issuer();
    if let Some(mut root) = view.get_account(&issuer) {
        root.burned_tokens = root.burned_tokens.saturating_add(1);
        view.set_account(&issuer, root);
    }

    Ok(())
}
