//! Power-of-two sizing for driver texture surfaces.

/// Smallest power of two that is `>= n`.
///
/// Never less than 2, so `0` and `1` both pad to `2`.
///
/// Panics in debug builds for `n > 2^31`; use [`checked_pad_to_pow2`] for
/// sizes that come from outside.
pub fn pad_to_pow2(n: u32) -> u32 {
    n.max(2).next_power_of_two()
}

/// Like [`pad_to_pow2`], but `None` when the result does not fit in a `u32`.
pub fn checked_pad_to_pow2(n: u32) -> Option<u32> {
    n.max(2).checked_next_power_of_two()
}
