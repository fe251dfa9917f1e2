// Protocol constants shared across the subsystem.

// Smallest native unit: 1 KEEL = 100,000,000 drops
pub const COIN_VALUE: u64 = 100_000_000;

// Reserve schedule. Every account must keep the base reserve untouched; each
// owned ledger object (directory page, offer) adds one increment on top.
// The reserve is checked against the balance held *before* the transaction,
// so an object-creating transaction cannot fund its own reserve.
pub const BASE_RESERVE: u64 = 10 * COIN_VALUE;
pub const RESERVE_PER_OBJECT: u64 = 2 * COIN_VALUE;

/// Reserve an account must hold to own `owner_count` ledger objects.
pub const fn account_reserve(owner_count: u32) -> u64 {
    BASE_RESERVE + owner_count as u64 * RESERVE_PER_OBJECT
}
