//! Bounded text types shared by the transport and the command layer.
//!
//! The SIM800L buffers are fixed: 255-byte message bodies and 32-byte caller
//! identities.  Anything longer is cut at the last UTF-8 boundary that fits.
//! Truncation is silent, never an error.

use core::fmt::Write;

/// Maximum message body length in bytes.
pub const MESSAGE_LEN: usize = 255;
/// Maximum caller identity (phone number) length in bytes.
pub const IDENTITY_LEN: usize = 32;

/// A phone number / caller-ID string.
pub type Identity = heapless::String<IDENTITY_LEN>;
/// An SMS body.
pub type MessageBody = heapless::String<MESSAGE_LEN>;

/// Copy `s` into a bounded string, dropping whatever does not fit.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    push_truncated(&mut out, s);
    out
}

/// Append as much of `s` as fits, stopping on a char boundary.
pub fn push_truncated<const N: usize>(out: &mut heapless::String<N>, s: &str) {
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
}

/// Formatting sink that silently discards overflow instead of failing.
pub struct Truncating<'a, const N: usize>(pub &'a mut heapless::String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        push_truncated(self.0, s);
        Ok(())
    }
}

/// `+` followed by digits, or digits only; 3 to 20 digits.
pub fn is_phone_number(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    (3..=20).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}
