use ark_ec::pairing::Pairing;
use ark_ec::PrimeGroup;
use ark_ff::Field;
use ark_std::rand::Rng;
use ark_std::UniformRand;
use serde::{Deserialize, Serialize};

use crate::error::ProofError;

const LOG_TARGET: &str = "unlynx_proofs::range::signature";

/// Digit certificates issued by one signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishSignature<E: Pairing> {
    /// `y = x·B2`.
    #[serde(with = "crate::crypto_serde::curve")]
    pub public: E::G2,
    /// `A_i = (x+i)^{-1}·B1` for `i` in `0..u`.
    #[serde(with = "crate::crypto_serde::curve_vec")]
    pub signature: Vec<E::G1>,
}

impl<E: Pairing> PublishSignature<E> {
    /// Pick a fresh signing key and sign every digit below `u`. The key is dropped.
    pub fn init<R: Rng + ?Sized>(u: u64, rng: &mut R) -> Result<Self, ProofError> {
        if u < 2 {
            return Err(ProofError::InvalidInput(format!(
                "digit base must be at least 2, got {u}"
            )));
        }
        let x = E::ScalarField::rand(rng);
        let base = E::G1::generator();
        let signature = (0..u)
            .map(|i| {
                (x + E::ScalarField::from(i))
                    .inverse()
                    .map(|inv| base * inv)
                    .ok_or_else(|| ProofError::Internal(format!("signing key collides with digit {i}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(target: LOG_TARGET, u, "digit signatures issued");
        Ok(Self {
            public: E::G2::generator() * x,
            signature,
        })
    }
}
