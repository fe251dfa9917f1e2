// In-memory ledger view.
//
// Reference implementation of `LedgerView` backing the test suites and any
// single-node embedding: one map per object kind, a BTreeMap for the page
// space so successor queries are range scans, and insertion-ordered
// directories.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::Excluded;

use indexmap::IndexMap;

use super::LedgerView;
use crate::account::AccountRoot;
use crate::asset::{Amount, TrustLine};
use crate::config;
use crate::crypto::{AccountId, Hash};
use crate::nft::error::{NftError, NftResult};
use crate::nft::types::{NftOffer, NftPage};

#[derive(Default)]
pub struct MemoryLedger {
    accounts: HashMap<AccountId, AccountRoot>,
    trust_lines: HashMap<(AccountId, Hash), TrustLine>,
    pages: BTreeMap<Hash, NftPage>,
    offers: HashMap<Hash, NftOffer>,
    directories: HashMap<Hash, IndexMap<Hash, u64>>,
    close_time: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or reset) an account with the given native balance.
    pub fn fund(&mut self, account: &AccountId, balance: u64) {
        self.accounts
            .insert(account.clone(), AccountRoot::new(balance));
    }

    /// Credit native drops to an existing account.
    pub fn credit(&mut self, account: &AccountId, drops: u64) {
        if let Some(root) = self.accounts.get_mut(account) {
            root.balance += drops;
        }
    }

    pub fn set_minter(&mut self, account: &AccountId, minter: Option<AccountId>) {
        if let Some(root) = self.accounts.get_mut(account) {
            root.minter = minter;
        }
    }

    pub fn set_trust_line(&mut self, account: &AccountId, asset: &Hash, line: TrustLine) {
        self.trust_lines
            .insert((account.clone(), asset.clone()), line);
    }

    pub fn set_close_time(&mut self, close_time: u64) {
        self.close_time = close_time;
    }

    /// Number of directory pages currently held by `owner`.
    pub fn page_count(&self, owner: &AccountId) -> usize {
        let min = crate::nft::storage::page_min(owner);
        let max = crate::nft::storage::page_max(owner);
        self.pages.range(min..=max).count()
    }
}

impl LedgerView for MemoryLedger {
    fn get_account(&self, account: &AccountId) -> Option<AccountRoot> {
        self.accounts.get(account).cloned()
    }

    fn set_account(&mut self, account: &AccountId, root: AccountRoot) {
        self.accounts.insert(account.clone(), root);
    }

    fn account_reserve(&self, owner_count: u32) -> u64 {
        config::account_reserve(owner_count)
    }

    fn account_holds(&self, account: &AccountId, asset: &Hash) -> u64 {
        if *asset == crate::asset::NATIVE_ASSET {
            return self
                .accounts
                .get(account)
                .map(|root| root.balance)
                .unwrap_or(0);
        }
        match self.trust_lines.get(&(account.clone(), asset.clone())) {
            Some(line) if !line.frozen => line.balance,
            _ => 0,
        }
    }

    fn send(&mut self, from: &AccountId, to: &AccountId, amount: &Amount) -> NftResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        if amount.is_native() {
            {
                let root = self.accounts.get_mut(from).ok_or(NftError::NoEntry)?;
                if root.balance < amount.value() {
                    return Err(NftError::InsufficientFunds);
                }
                root.balance -= amount.value();
            }
            let root = self.accounts.get_mut(to).ok_or(NftError::NoEntry)?;
            root.balance += amount.value();
            return Ok(());
        }

        let asset = amount.asset().clone();
        {
            let line = self
                .trust_lines
                .get_mut(&(from.clone(), asset.clone()))
                .ok_or(NftError::NoTrustLine)?;
            if line.frozen {
                return Err(NftError::Frozen);
            }
            if line.balance < amount.value() {
                return Err(NftError::InsufficientFunds);
            }
            line.balance -= amount.value();
        }
        // The receiving line is created on demand; issuance policy is the
        // asset registry's concern, not this view's.
        let line = self
            .trust_lines
            .entry((to.clone(), asset))
            .or_insert_with(|| TrustLine::new(0));
        if line.frozen {
            return Err(NftError::Frozen);
        }
        line.balance += amount.value();
        Ok(())
    }

    fn get_trust_line(&self, account: &AccountId, asset: &Hash) -> Option<TrustLine> {
        self.trust_lines
            .get(&(account.clone(), asset.clone()))
            .cloned()
    }

    fn get_page(&self, key: &Hash) -> Option<NftPage> {
        self.pages.get(key).cloned()
    }

    fn set_page(&mut self, key: &Hash, page: NftPage) {
        self.pages.insert(key.clone(), page);
    }

    fn delete_page(&mut self, key: &Hash) {
        self.pages.remove(key);
    }

    fn next_page_key(&self, after: &Hash, upper: &Hash) -> Option<Hash> {
        if after >= upper {
            return None;
        }
        self.pages
            .range((Excluded(after.clone()), Excluded(upper.clone())))
            .next()
            .map(|(key, _)| key.clone())
    }

    fn get_offer(&self, id: &Hash) -> Option<NftOffer> {
        self.offers.get(id).cloned()
    }

    fn set_offer(&mut self, id: &Hash, offer: NftOffer) {
        self.offers.insert(id.clone(), offer);
    }

    fn delete_offer(&mut self, id: &Hash) {
        self.offers.remove(id);
    }

    fn dir_insert(&mut self, dir: &Hash, entry: &Hash) -> u64 {
        let entries = self.directories.entry(dir.clone()).or_default();
        // One node per 32 entries, mirroring the paged layout of the
        // on-ledger directory structure.
        let node = (entries.len() / 32) as u64;
        entries.insert(entry.clone(), node);
        node
    }

    fn dir_remove(&mut self, dir: &Hash, node: u64, entry: &Hash) -> bool {
        let Some(entries) = self.directories.get_mut(dir) else {
            return false;
        };
        let removed = match entries.get(entry) {
            Some(stored) if *stored == node => entries.shift_remove(entry).is_some(),
            _ => false,
        };
        if entries.is_empty() {
            self.directories.remove(dir);
        }
        removed
    }

    fn dir_len(&self, dir: &Hash) -> usize {
        self.directories.get(dir).map(IndexMap::len).unwrap_or(0)
    }

    fn dir_entries(&self, dir: &Hash) -> Vec<Hash> {
        self.directories
            .get(dir)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn close_time(&self) -> u64 {
        self.close_time
    }
}
