/*!
 * Growth Policy
 * Single doubling-with-floor capacity function shared by every growable structure
 */

/// Compute the capacity a structure should grow to.
///
/// Returns `None` when `desired` already fits in `current`, otherwise the new
/// capacity: the larger of `desired` and `current * 2`, with saturating
/// arithmetic so the doubling can never overflow. Callers clamp the result to
/// the maximum length their backing storage can represent.
///
/// Every growable structure in this crate consults this one function; the
/// arithmetic is deliberately not duplicated anywhere else.
#[inline]
#[must_use]
pub fn grow(current: usize, desired: usize) -> Option<usize> {
    if desired <= current {
        return None;
    }
    Some(desired.max(current.saturating_mul(2)))
}
