//! Verifiable shuffle of encrypted records.
//!
//! Each record is folded into one ElGamal pair with powers of a list-bound tag, and
//! the folded pairs are proven to be a permuted rerandomization of the input.

mod compress;
mod pair_shuffle;
mod published;

pub use compress::{cipher_vector_tag, compress_beta, compress_list, compress_process_response};
pub use pair_shuffle::PairShuffleProof;
pub use published::{shuffle_process_responses, PublishedShufflingProof, ShuffleOutput};

use crate::error::ProofError;

/// Ensure `pi` maps `0..len` onto itself.
pub(crate) fn validate_permutation(pi: &[usize], len: usize) -> Result<(), ProofError> {
    if pi.len() != len {
        return Err(ProofError::LengthMismatch {
            context: "permutation",
            expected: len,
            actual: pi.len(),
        });
    }
    let mut seen = vec![false; len];
    for &target in pi {
        match seen.get_mut(target) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(ProofError::InvalidInput(format!(
                    "{pi:?} is not a permutation of 0..{len}"
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_validation() {
        assert!(validate_permutation(&[2, 0, 1], 3).is_ok());
        assert!(validate_permutation(&[], 0).is_ok());
        assert!(validate_permutation(&[0, 0, 1], 3).is_err());
        assert!(validate_permutation(&[0, 3, 1], 3).is_err());
        assert!(validate_permutation(&[0, 1], 3).unwrap_err().is_configuration());
    }
}
