use ark_ec::CurveGroup;
use serde::{Deserialize, Serialize};

use crate::ciphertext::{add_vectors, CipherVector};
use crate::error::{ensure_same_len, ProofError};

const LOG_TARGET: &str = "unlynx_proofs::proofs::simple_addition";

/// Two ciphervectors and their claimed homomorphic sum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedSimpleAdditionProof<C: CurveGroup> {
    pub c1: CipherVector<C>,
    pub c2: CipherVector<C>,
    pub c1_plus_c2: CipherVector<C>,
}

impl<C: CurveGroup> PublishedSimpleAdditionProof<C> {
    pub fn create(c1: CipherVector<C>, c2: CipherVector<C>) -> Result<Self, ProofError> {
        let c1_plus_c2 = add_vectors(&c1, &c2)?;
        Ok(Self { c1, c2, c1_plus_c2 })
    }

    pub fn validate(&self) -> Result<(), ProofError> {
        ensure_same_len(
            "published simple addition",
            &[self.c1.len(), self.c2.len(), self.c1_plus_c2.len()],
        )
        .map(drop)
    }

    pub fn verify(&self) -> bool {
        if let Err(err) = self.validate() {
            tracing::warn!(target: LOG_TARGET, %err, "rejecting malformed addition proof");
            return false;
        }
        crate::batch::verify_all(
            "simple addition",
            self.c1.iter().zip(&self.c2).zip(&self.c1_plus_c2),
            |((a, b), sum)| *a + *b == *sum,
        )
    }
}
