// End-to-end scenarios for the paginated owner directories: reserve
// accounting at page creation, split behavior under load, and coalescing
// on burn.

use rand::Rng;

use keel_nft::config::{account_reserve, RESERVE_PER_OBJECT};
use keel_nft::crypto::{AccountId, ACCOUNT_ID_SIZE};
use keel_nft::ledger::{LedgerView, MemoryLedger};
use keel_nft::nft::pages::{self, verify_directory};
use keel_nft::nft::storage::{page_key, page_max};
use keel_nft::nft::{
    execute, BurnPayload, MintPayload, Nft, NftError, NftPage, NftTransaction, TokenId, TxContext,
    MAX_TOKENS_PER_PAGE,
};

fn account(byte: u8) -> AccountId {
    AccountId::new([byte; ACCOUNT_ID_SIZE])
}

fn page_sizes(view: &MemoryLedger, owner: &AccountId) -> Vec<usize> {
    let max = page_max(owner);
    let mut sizes = Vec::new();
    let mut cursor = keel_nft::nft::storage::page_min(owner);
    while let Some(key) = view.next_page_key(&cursor, &max.next()) {
        sizes.push(view.get_page(&key).unwrap().tokens.len());
        cursor = key;
    }
    sizes
}

#[test]
fn mint_reserve_boundary() {
    let owner = account(1);
    let ctx = TxContext::new(owner.clone());

    // One drop short of the one-page reserve: the first mint must fail.
    let mut view = MemoryLedger::new();
    view.fund(&owner, account_reserve(1) - 1);
    assert_eq!(
        execute(&mut view, &ctx, &NftTransaction::Mint(MintPayload::new(0))),
        Err(NftError::InsufficientReserve)
    );

    // One more drop and the page is affordable; tokens 2..=32 land on the
    // existing page without any further reserve requirement.
    let mut view = MemoryLedger::new();
    view.fund(&owner, account_reserve(1) - 1);
    view.credit(&owner, 1);
    for _ in 0..MAX_TOKENS_PER_PAGE {
        execute(&mut view, &ctx, &NftTransaction::Mint(MintPayload::new(0))).unwrap();
    }
    assert_eq!(page_sizes(&view, &owner), vec![MAX_TOKENS_PER_PAGE]);

    // The 33rd token needs a second page, and a second page needs more
    // reserve.
    let mut probe = MemoryLedger::new();
    probe.fund(&owner, account_reserve(1));
    for _ in 0..MAX_TOKENS_PER_PAGE {
        execute(&mut probe, &ctx, &NftTransaction::Mint(MintPayload::new(0))).unwrap();
    }
    assert_eq!(
        execute(&mut probe, &ctx, &NftTransaction::Mint(MintPayload::new(0))),
        Err(NftError::InsufficientReserve)
    );

    view.credit(&owner, RESERVE_PER_OBJECT);
    execute(&mut view, &ctx, &NftTransaction::Mint(MintPayload::new(0))).unwrap();
    assert_eq!(verify_directory(&view, &owner), Ok(2));
}

#[test]
fn split_preserves_global_sort() {
    let owner = account(2);
    let ctx = TxContext::new(owner.clone());
    let mut view = MemoryLedger::new();
    view.fund(&owner, account_reserve(10));

    // 33 mints with random transfer fees; the ciphered taxon spreads the
    // ids, and the 33rd forces a split into exactly two pages.
    let mut rng = rand::thread_rng();
    for _ in 0..33 {
        let payload = MintPayload::new(7).with_transfer_fee(rng.gen_range(0..=50_000));
        execute(&mut view, &ctx, &NftTransaction::Mint(payload)).unwrap();
    }

    assert_eq!(verify_directory(&view, &owner), Ok(2));
    let sizes = page_sizes(&view, &owner);
    assert_eq!(sizes.len(), 2);
    assert_eq!(sizes[0] + sizes[1], 33);

    // Global sort across the chain: every token of the first page is below
    // every token of the second under the page mask.
    let max = page_max(&owner);
    let first_key = view
        .next_page_key(&keel_nft::nft::storage::page_min(&owner), &max.next())
        .unwrap();
    let second_key = view.next_page_key(&first_key, &max.next()).unwrap();
    let first_top = view.get_page(&first_key).unwrap().tokens.last().unwrap().id.low_bits();
    let second_bottom = view.get_page(&second_key).unwrap().tokens[0].id.low_bits();
    assert!(first_top < second_bottom);
}

// Craft an id whose page-equivalence class is `class` (the issuer's low
// bytes, taxon and sequence are all class-determined, the flag bytes keep
// ids unique within a class).
fn crafted(issuer: &AccountId, class: u32) -> TokenId {
    let mut bytes = [0u8; 32];
    bytes[4..24].copy_from_slice(issuer.as_bytes());
    bytes[28..32].copy_from_slice(&class.to_be_bytes());
    TokenId::new(bytes)
}

#[test]
fn burning_out_the_middle_page() {
    let owner = account(3);
    let ctx = TxContext::new(owner.clone());
    let mut view = MemoryLedger::new();
    view.fund(&owner, account_reserve(10));

    // Three fully packed pages, keyed the way successive splits would key
    // them: each lower page's key comes from the next page's first token.
    let issuer = account(9);
    let ids: Vec<TokenId> = (1..=96).map(|class| crafted(&issuer, class)).collect();
    let keys = [
        page_key(&owner, &ids[32]),
        page_key(&owner, &ids[64]),
        page_max(&owner),
    ];
    for chunk in 0..3 {
        let page = NftPage {
            tokens: ids[chunk * 32..(chunk + 1) * 32]
                .iter()
                .map(|id| Nft::new(id.clone(), None))
                .collect(),
            prev: chunk.checked_sub(1).map(|i| keys[i].clone()),
            next: keys.get(chunk + 1).cloned(),
        };
        view.set_page(&keys[chunk], page);
    }
    let mut root = view.get_account(&owner).unwrap();
    root.owner_count = 3;
    view.set_account(&owner, root);
    assert_eq!(verify_directory(&view, &owner), Ok(3));

    // Burn every token of the middle page. Two full pages remain and are
    // never merged: 32 + 32 does not fit in one page.
    for id in &ids[32..64] {
        let tx = NftTransaction::Burn(BurnPayload::new(id.clone()));
        execute(&mut view, &ctx, &tx).unwrap();
        verify_directory(&view, &owner).unwrap();
    }

    assert_eq!(page_sizes(&view, &owner), vec![32, 32]);
    assert_eq!(view.get_account(&owner).unwrap().owner_count, 2);

    // The survivors still hold exactly the outer tokens.
    for id in ids[..32].iter().chain(&ids[64..]) {
        assert!(pages::find_token(&view, &owner, id).is_some());
    }
}

#[test]
fn random_mint_burn_walk_keeps_invariants() {
    let owner = account(4);
    let ctx = TxContext::new(owner.clone());
    let mut view = MemoryLedger::new();
    view.fund(&owner, account_reserve(64));

    let mut rng = rand::thread_rng();
    let mut live: Vec<TokenId> = Vec::new();

    for _ in 0..300 {
        let burn = !live.is_empty() && rng.gen_range(0..3) == 0;
        if burn {
            let id = live.swap_remove(rng.gen_range(0..live.len()));
            execute(&mut view, &ctx, &NftTransaction::Burn(BurnPayload::new(id))).unwrap();
        } else {
            let payload = MintPayload::new(rng.gen_range(0..4))
                .with_transfer_fee(rng.gen_range(0..=50_000));
            execute(&mut view, &ctx, &NftTransaction::Mint(payload)).unwrap();
            // The fee and taxon were random; recover the fresh id by its
            // sequence number.
            let root = view.get_account(&owner).unwrap();
            live.push(find_by_sequence(&view, &owner, root.minted_tokens - 1));
        }

        verify_directory(&view, &owner).unwrap();
        let root = view.get_account(&owner).unwrap();
        assert_eq!(root.owner_count as usize, view.page_count(&owner));
        // Outstanding tokens never exceed minted minus burned.
        assert!(live.len() as u32 <= root.minted_tokens - root.burned_tokens);
    }
}

fn find_by_sequence(view: &MemoryLedger, owner: &AccountId, sequence: u32) -> TokenId {
    let max = page_max(owner);
    let mut cursor = keel_nft::nft::storage::page_min(owner);
    while let Some(key) = view.next_page_key(&cursor, &max.next()) {
        for token in view.get_page(&key).unwrap().tokens {
            if token.id.sequence() == sequence {
                return token.id;
            }
        }
        cursor = key;
    }
    panic!("freshly minted sequence {sequence} not found");
}
