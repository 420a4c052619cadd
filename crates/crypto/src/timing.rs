//! Constant-time comparison of signatures.
//!
//! Token verification compares the recomputed base64url tag against the
//! third token segment here, and event verification compares the recomputed
//! hex signature against the received one.

use subtle::ConstantTimeEq;

/// True when `a` and `b` hold the same bytes.
///
/// A length mismatch returns early, since signature lengths are public
/// (43 base64url chars for a token tag, 64 hex chars for an event). Equal
/// lengths go through `subtle` so the time taken does not depend on where
/// the first differing byte sits.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
