//! Bounded text helpers

use heapless::String;

/// Append as much of `s` as fits in `buf`
///
/// Stops at the first character that does not fit, so multi-byte characters
/// are never split.
pub fn push_truncated<const N: usize>(buf: &mut String<N>, s: &str) {
    for c in s.chars() {
        if buf.push(c).is_err() {
            break;
        }
    }
}
