use ark_ec::CurveGroup;
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use super::check_statement;
use crate::error::ProofError;
use crate::sigma::{Relation, SigmaProof, Statement};

const LOG_TARGET: &str = "unlynx_proofs::proofs::det_tag_addition";
const LABEL: &str = "det-tag-addition";

/// Proof that `c2 = s·G` and that `r = c1 + c2`.
///
/// Only the first half is zero knowledge; the sum is checked in the clear since
/// `c1`, `c2` and `r` are all public.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedDetTagAdditionProof<C: CurveGroup> {
    #[serde(with = "crate::crypto_serde::curve")]
    pub c1: C,
    #[serde(with = "crate::crypto_serde::curve")]
    pub c2: C,
    #[serde(with = "crate::crypto_serde::curve")]
    pub r: C,
    pub proof: SigmaProof<C::ScalarField>,
}

fn statement<C: CurveGroup>(c2: C) -> Result<Statement<C>, ProofError> {
    Statement::new(
        LABEL,
        1,
        Relation::representation(c2, [(0, C::generator())]),
    )
}

impl<C: CurveGroup> PublishedDetTagAdditionProof<C> {
    pub fn create<R: Rng + ?Sized>(
        c1: C,
        tag_secret: C::ScalarField,
        c2: C,
        r: C,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let proof = SigmaProof::prove(&statement(c2)?, &[tag_secret], rng)?;
        Ok(Self { c1, c2, r, proof })
    }

    pub fn verify(&self) -> bool {
        if !check_statement(&self.proof, statement(self.c2)) {
            return false;
        }
        let sum_matches = self.c1 + self.c2 == self.r;
        if !sum_matches {
            tracing::warn!(target: LOG_TARGET, "c1 + c2 does not match the published result");
        }
        sum_matches
    }
}
