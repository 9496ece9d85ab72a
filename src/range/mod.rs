//! Pairing-based proof that an encrypted integer lies in `[0, u^l)`.
//!
//! A signer publishes weak Boneh–Boyen signatures `A_i = (x+i)^{-1}·B1` on every digit
//! `i < u`; the prover shows each base-`u` digit of its value carries a valid
//! signature without revealing which one.

mod proof;
mod signature;

pub use proof::PublishRangeProof;
pub use signature::PublishSignature;

use crate::error::ProofError;

/// Base-`base` digits of `n`, least significant first, zero padded to at least `len`.
pub fn to_base(mut n: u64, base: u64, len: usize) -> Result<Vec<u64>, ProofError> {
    if base < 2 {
        return Err(ProofError::InvalidInput(format!(
            "digit base must be at least 2, got {base}"
        )));
    }
    let mut digits = Vec::with_capacity(len);
    while n > 0 {
        digits.push(n % base);
        n /= base;
    }
    if digits.len() < len {
        digits.resize(len, 0);
    }
    Ok(digits)
}

/// `u^l`, the exclusive upper bound of the provable range.
pub(crate) fn range_bound(u: u64, l: usize) -> Result<u64, ProofError> {
    u32::try_from(l)
        .ok()
        .and_then(|exp| u.checked_pow(exp))
        .ok_or_else(|| ProofError::InvalidInput(format!("{u}^{l} does not fit in 64 bits")))
}
