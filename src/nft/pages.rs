// Owner token directories.
//
// An owner's tokens live in a doubly-linked chain of bounded pages keyed
// into the 256-bit ledger key space: owner account in the high bits, a
// 96-bit discriminator in the low bits. A token belongs to the first page
// whose key is strictly greater than `page_key(owner, id)`, except that a
// token may sit exactly at the maximal page's key. Tokens sharing their
// low 96 bits (an equivalence class) always share a page, which constrains
// where a full page may split.

use crate::crypto::{AccountId, Hash};
use crate::ledger::LedgerView;

use super::error::{NftError, NftResult};
use super::id::TokenId;
use super::storage::{page_discriminator, page_key, page_max, page_min};
use super::types::{Nft, NftPage, MAX_TOKENS_PER_PAGE};

/// Key of the page that holds (or would hold) `id` for `owner`.
fn locate_key<V: LedgerView + ?Sized>(view: &V, owner: &AccountId, id: &TokenId) -> Hash {
    let first = page_key(owner, id);
    let last = page_max(owner);
    view.next_page_key(&first, &last.next()).unwrap_or(last)
}

/// The page currently holding `id`'s range, if any.
pub fn locate_page<V: LedgerView + ?Sized>(
    view: &V,
    owner: &AccountId,
    id: &TokenId,
) -> Option<(Hash, NftPage)> {
    let key = locate_key(view, owner, id);
    view.get_page(&key).map(|page| (key, page))
}

/// Look a token up in an owner's directory.
pub fn find_token<V: LedgerView + ?Sized>(
    view: &V,
    owner: &AccountId,
    id: &TokenId,
) -> Option<Nft> {
    let (_, page) = locate_page(view, owner, id)?;
    page.tokens.iter().find(|token| token.id == *id).cloned()
}

/// Find or make room for `id` in the owner's directory, creating or
/// splitting a page as needed. `on_create` runs once per page brought into
/// existence; callers use it to charge the owner's reserve accounting.
fn page_for_token<V, F>(
    view: &mut V,
    owner: &AccountId,
    id: &TokenId,
    on_create: &mut F,
) -> NftResult<Hash>
where
    V: LedgerView + ?Sized,
    F: FnMut(&mut V, &AccountId),
{
    let first = page_key(owner, id);
    let last = page_max(owner);
    let key = view.next_page_key(&first, &last.next()).unwrap_or(last.clone());

    let Some(mut cp) = view.get_page(&key) else {
        // No page covers this range yet: open the maximal page.
        view.set_page(&last, NftPage::default());
        on_create(view, owner);
        return Ok(last);
    };

    if !cp.is_full() {
        return Ok(key);
    }

    // The page is full and must split. Prefer a boundary between
    // equivalence classes past the middle so the class straddling the
    // middle keeps room to grow; if the whole tail is one class, split
    // where that class begins instead.
    let half = MAX_TOKENS_PER_PAGE / 2;
    let cmp = cp.tokens[half - 1].id.low_bits();
    let split = match cp.tokens[half..]
        .iter()
        .position(|token| token.id.low_bits() != cmp)
    {
        Some(offset) => half + offset,
        None => cp
            .tokens
            .iter()
            .position(|token| token.id.low_bits() == cmp)
            .unwrap_or(0),
    };

    // A page holding a single equivalence class cannot split.
    if split == 0 || split == cp.tokens.len() {
        return Err(NftError::NoSuitablePage);
    }

    // The lower half moves to a new page keyed just below the upper half's
    // first class; the current page keeps its key and the upper half.
    let upper = cp.tokens.split_off(split);
    let lower = std::mem::replace(&mut cp.tokens, upper);
    let np_key = page_key(owner, &cp.tokens[0].id);

    let np = NftPage {
        tokens: lower,
        prev: cp.prev.clone(),
        next: Some(key.clone()),
    };

    if let Some(ppm) = &np.prev {
        let Some(mut p3) = view.get_page(ppm) else {
            log::error!("page {key} has a broken previous link pointing to {ppm}");
            return Err(NftError::Internal);
        };
        p3.next = Some(np_key.clone());
        view.set_page(ppm, p3);
    }

    cp.prev = Some(np_key.clone());
    view.set_page(&np_key, np);
    view.set_page(&key, cp);
    on_create(view, owner);

    // The new page's key equals the upper half's first class, so an id
    // landing exactly on it belongs with that class on the upper page:
    // the comparison must be strict.
    Ok(if first < np_key { np_key } else { key })
}

/// Insert a token into the owner's directory, keeping the page sorted by
/// the ids' low bits (stable for equivalent ids).
pub fn insert_token<V, F>(view: &mut V, owner: &AccountId, nft: Nft, mut on_create: F) -> NftResult<()>
where
    V: LedgerView + ?Sized,
    F: FnMut(&mut V, &AccountId),
{
    let key = page_for_token(view, owner, &nft.id, &mut on_create)?;
    let Some(mut page) = view.get_page(&key) else {
        log::error!("page {key} vanished while inserting token {}", nft.id);
        return Err(NftError::Internal);
    };

    let class = nft.id.low_bits();
    let pos = page
        .tokens
        .partition_point(|token| token.id.low_bits() <= class);
    page.tokens.insert(pos, nft);
    view.set_page(&key, page);
    Ok(())
}

/// Validate that a page link points at a live page; a dangling link is a
/// consistency violation, not a user error.
fn linked_key<V: LedgerView + ?Sized>(
    view: &V,
    key: &Hash,
    link: &Option<Hash>,
    field: &str,
) -> NftResult<Option<Hash>> {
    match link {
        None => Ok(None),
        Some(target) => {
            if view.get_page(target).is_none() {
                log::error!("page {key} has a broken {field} link pointing to {target}");
                return Err(NftError::Internal);
            }
            Ok(Some(target.clone()))
        }
    }
}

/// Fold `lo_key`'s page into `hi_key`'s if the combined contents fit,
/// erasing the lower page. The pages must be adjacent in the chain.
fn merge_pages<V: LedgerView + ?Sized>(
    view: &mut V,
    lo_key: &Hash,
    hi_key: &Hash,
) -> NftResult<bool> {
    let (Some(lo), Some(hi)) = (view.get_page(lo_key), view.get_page(hi_key)) else {
        log::error!("merge: page {lo_key} or {hi_key} cannot be located");
        return Err(NftError::Internal);
    };
    if lo_key >= hi_key {
        log::error!("merge: pages {lo_key} and {hi_key} passed in out of order");
        return Err(NftError::Internal);
    }
    if lo.next.as_ref() != Some(hi_key) {
        log::error!("merge: next link of {lo_key} broken");
        return Err(NftError::Internal);
    }
    if hi.prev.as_ref() != Some(lo_key) {
        log::error!("merge: previous link of {hi_key} broken");
        return Err(NftError::Internal);
    }

    if lo.tokens.len() + hi.tokens.len() > MAX_TOKENS_PER_PAGE {
        return Ok(false);
    }

    // Each page is sorted and every class on `lo` sits below `hi`'s range,
    // so concatenation preserves global order.
    let mut tokens = lo.tokens;
    tokens.extend(hi.tokens);

    let mut survivor = NftPage {
        tokens,
        prev: None,
        next: hi.next,
    };

    if let Some(ppm) = lo.prev {
        let Some(mut p0) = view.get_page(&ppm) else {
            log::error!("merge: page {ppm} before {lo_key} cannot be located");
            return Err(NftError::Internal);
        };
        p0.next = Some(hi_key.clone());
        view.set_page(&ppm, p0);
        survivor.prev = Some(ppm);
    }

    view.set_page(hi_key, survivor);
    view.delete_page(lo_key);
    Ok(true)
}

/// Remove a token from the owner's directory, coalescing neighboring pages
/// where possible and releasing the page (and its reserve charge) when it
/// empties. Returns the removed token.
pub fn remove_token<V: LedgerView + ?Sized>(
    view: &mut V,
    owner: &AccountId,
    id: &TokenId,
) -> NftResult<Nft> {
    let Some((key, mut curr)) = locate_page(view, owner, id) else {
        return Err(NftError::NoEntry);
    };
    let Some(pos) = curr.tokens.iter().position(|token| token.id == *id) else {
        return Err(NftError::NoEntry);
    };
    let removed = curr.tokens.remove(pos);

    let prev_key = linked_key(view, &key, &curr.prev, "previous")?;
    let next_key = linked_key(view, &key, &curr.next, "next")?;

    if !curr.tokens.is_empty() {
        // Keep the page and try to consolidate with both neighbors; the
        // attempt may fold three pages into one.
        view.set_page(&key, curr);

        let mut delta: i64 = 0;
        if let Some(prev) = &prev_key {
            if merge_pages(view, prev, &key)? {
                delta -= 1;
            }
        }
        if let Some(next) = &next_key {
            if merge_pages(view, &key, next)? {
                delta -= 1;
            }
        }
        if delta != 0 {
            view.adjust_owner_count(owner, delta);
        }
        return Ok(removed);
    }

    // The page emptied: splice it out of the chain and erase it.
    if let Some(prev) = &prev_key {
        let Some(mut page) = view.get_page(prev) else {
            log::error!("page {prev} cannot be located while unlinking {key}");
            return Err(NftError::Internal);
        };
        page.next = next_key.clone();
        view.set_page(prev, page);
    }
    if let Some(next) = &next_key {
        let Some(mut page) = view.get_page(next) else {
            log::error!("page {next} cannot be located while unlinking {key}");
            return Err(NftError::Internal);
        };
        page.prev = prev_key.clone();
        view.set_page(next, page);
    }
    view.delete_page(&key);

    let mut freed: i64 = 1;
    // Single-token removals should never leave the two new neighbors small
    // enough to merge, but attempt it in case that analysis is wrong.
    if let (Some(prev), Some(next)) = (&prev_key, &next_key) {
        if merge_pages(view, prev, next)? {
            freed += 1;
        }
    }
    view.adjust_owner_count(owner, -freed);
    Ok(removed)
}

/// Walk an owner's page chain and check every structural invariant: sort
/// order, capacity, mutual linkage, key placement and equivalence-class
/// co-residency. Returns the number of pages.
pub fn verify_directory<V: LedgerView + ?Sized>(
    view: &V,
    owner: &AccountId,
) -> Result<usize, String> {
    let min = page_min(owner);
    let max = page_max(owner);

    let mut keys = Vec::new();
    if view.get_page(&min).is_some() {
        keys.push(min.clone());
    }
    let mut cursor = min;
    while let Some(key) = view.next_page_key(&cursor, &max.next()) {
        cursor = key.clone();
        keys.push(key);
    }

    let mut prev_key: Option<Hash> = None;
    let mut prev_class: Option<[u8; 12]> = None;
    for (index, key) in keys.iter().enumerate() {
        let page = view
            .get_page(key)
            .ok_or_else(|| format!("page {key} disappeared mid-walk"))?;

        if page.tokens.is_empty() {
            return Err(format!("page {key} is empty at rest"));
        }
        if page.tokens.len() > MAX_TOKENS_PER_PAGE {
            return Err(format!("page {key} holds {} tokens", page.tokens.len()));
        }
        if page.prev != prev_key {
            return Err(format!("page {key} previous link mismatch"));
        }
        let expected_next = keys.get(index + 1).cloned();
        if page.next != expected_next {
            return Err(format!("page {key} next link mismatch"));
        }

        let discriminator = page_discriminator(key);
        let lower = prev_key.as_ref().map(page_discriminator);
        for window in page.tokens.windows(2) {
            if window[0].id.low_bits() > window[1].id.low_bits() {
                return Err(format!("page {key} tokens out of order"));
            }
            if window[0].id == window[1].id {
                return Err(format!("page {key} holds a duplicate id"));
            }
        }
        for token in &page.tokens {
            let class = token.id.low_bits();
            if class > discriminator {
                return Err(format!("token {} above its page key {key}", token.id));
            }
            // Equality with the previous page's discriminator is the split
            // construction itself: the lower page's key is derived from
            // this page's first token.
            if let Some(lower) = &lower {
                if class < *lower {
                    return Err(format!("token {} below its page range {key}", token.id));
                }
            }
            if let Some(prev_class) = &prev_class {
                if class == *prev_class {
                    return Err(format!("class of {} spans two pages", token.id));
                }
            }
        }

        prev_class = page.tokens.last().map(|token| token.id.low_bits());
        prev_key = Some(key.clone());
    }

    Ok(keys.len())
}
