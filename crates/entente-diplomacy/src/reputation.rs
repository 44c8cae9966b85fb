//! Reputation arithmetic.
//!
//! Reputation is a per-direction integer score in `[-100, 100]`. All
//! adjustments saturate at the bounds.

/// Lowest reputation a nation can hold toward another.
pub const MIN_REPUTATION: i32 = -100;

/// Highest reputation a nation can hold toward another.
pub const MAX_REPUTATION: i32 = 100;

/// Reputation lost by each side when an alliance is broken.
pub const ALLIANCE_BREAK_PENALTY: i32 = 20;

/// Smallest change that is worth announcing.
pub const NOTABLE_REPUTATION_CHANGE: i32 = 10;

/// Clamp a raw value into the reputation range.
pub const fn clamp_reputation(value: i32) -> i32 {
    if value < MIN_REPUTATION {
        MIN_REPUTATION
    } else if value > MAX_REPUTATION {
        MAX_REPUTATION
    } else {
        value
    }
}

/// Apply a signed delta and clamp the result.
pub const fn adjust_reputation(current: i32, delta: i32) -> i32 {
    clamp_reputation(current.saturating_add(delta))
}

/// Whether moving from `old` to `new` should be announced.
pub const fn is_notable_change(old: i32, new: i32) -> bool {
    new.abs_diff(old) >= NOTABLE_REPUTATION_CHANGE.unsigned_abs()
}
