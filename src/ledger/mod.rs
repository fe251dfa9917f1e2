// The mutable ledger view a transaction executes against.
//
// A transaction is applied single-threaded against one view; all mutation
// funnels through the explicit operations below, the caller discards the
// view when application fails, and cross-transaction ordering belongs to
// the enclosing consensus engine.

mod memory;

pub use memory::MemoryLedger;

use crate::account::AccountRoot;
use crate::asset::{Amount, TrustLine};
use crate::crypto::{AccountId, Hash};
use crate::nft::error::NftResult;
use crate::nft::types::{NftOffer, NftPage};

/// Abstract view interface for transaction application.
/// Runtime implementations provide concrete storage backends.
pub trait LedgerView {
    // Account operations
    fn get_account(&self, account: &AccountId) -> Option<AccountRoot>;
    fn set_account(&mut self, account: &AccountId, root: AccountRoot);

    /// Reserve required to own `owner_count` ledger objects.
    fn account_reserve(&self, owner_count: u32) -> u64;

    /// Spendable holdings of `account` in `asset`; zero when the backing
    /// trust line is frozen or absent.
    fn account_holds(&self, account: &AccountId, asset: &Hash) -> u64;

    /// Move value between accounts through the payment subsystem.
    fn send(&mut self, from: &AccountId, to: &AccountId, amount: &Amount) -> NftResult<()>;

    // Trust lines (read-only here; `send` moves issued balances)
    fn get_trust_line(&self, account: &AccountId, asset: &Hash) -> Option<TrustLine>;

    // Directory pages
    fn get_page(&self, key: &Hash) -> Option<NftPage>;
    fn set_page(&mut self, key: &Hash, page: NftPage);
    fn delete_page(&mut self, key: &Hash);

    /// Smallest existing page key strictly greater than `after` and
    /// strictly less than `upper`.
    fn next_page_key(&self, after: &Hash, upper: &Hash) -> Option<Hash>;

    // Offer objects
    fn get_offer(&self, id: &Hash) -> Option<NftOffer>;
    fn set_offer(&mut self, id: &Hash, offer: NftOffer);
    fn delete_offer(&mut self, id: &Hash);

    // Sorted directories (owner directories and per-token offer indices).
    // `dir_insert` returns the pagination cursor the entry landed on; the
    // cursor must be handed back to `dir_remove`.
    fn dir_insert(&mut self, dir: &Hash, entry: &Hash) -> u64;
    fn dir_remove(&mut self, dir: &Hash, node: u64, entry: &Hash) -> bool;
    fn dir_len(&self, dir: &Hash) -> usize;
    fn dir_entries(&self, dir: &Hash) -> Vec<Hash>;

    /// Close time of the ledger being built; offers expire against it.
    fn close_time(&self) -> u64;

    /// Move an account's owner count by `delta`, saturating at zero.
    fn adjust_owner_count(&mut self, account: &AccountId, delta: i64) {
        if let Some(mut root) = self.get_account(account) {
            root.owner_count = (root.owner_count as i64).saturating_add(delta).max(0) as u32;
            self.set_account(account, root);
        }
    }
}

/// An offer (or anything else carrying an expiration) has expired once the
/// close time reaches it.
pub fn has_expired<V: LedgerView + ?Sized>(view: &V, expiration: Option<u64>) -> bool {
    match expiration {
        Some(expiration) => expiration <= view.close_time(),
        None => false,
    }
}
