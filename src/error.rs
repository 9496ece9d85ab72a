use ark_serialize::SerializationError;
use thiserror::Error;

/// Failures raised while building proofs or checking the shape of published artifacts.
///
/// A proof that is well formed but does not check out is *not* an error: verifiers
/// report it as `false`.
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("key sets of {0} do not coincide")]
    KeySetMismatch(&'static str),

    #[error("empty input: {0}")]
    Empty(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl ProofError {
    /// Configuration errors are shape problems detected before any cryptographic work.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ProofError::LengthMismatch { .. }
                | ProofError::KeySetMismatch(_)
                | ProofError::Empty(_)
                | ProofError::InvalidInput(_)
        )
    }
}

/// Reject collections whose lengths differ from the first one.
pub(crate) fn ensure_same_len(
    context: &'static str,
    lengths: &[usize],
) -> Result<usize, ProofError> {
    let expected = lengths.first().copied().unwrap_or_default();
    match lengths.iter().find(|&&len| len != expected) {
        Some(&actual) => Err(ProofError::LengthMismatch {
            context,
            expected,
            actual,
        }),
        None => Ok(expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_len_accepts_matching_lengths() {
        assert_eq!(ensure_same_len("vectors", &[3, 3, 3]).unwrap(), 3);
        assert_eq!(ensure_same_len("vectors", &[]).unwrap(), 0);
    }

    #[test]
    fn same_len_reports_first_mismatch() {
        let err = ensure_same_len("vectors", &[3, 3, 2]).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            ProofError::LengthMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn internal_errors_are_not_configuration_errors() {
        assert!(!ProofError::Internal("boom".into()).is_configuration());
    }
}
