use ark_ec::CurveGroup;
use ark_std::rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{check_statement, shape_ok};
use crate::batch::{create_indexed, verify_all};
use crate::ciphertext::{CipherText, CipherVector};
use crate::config::ProverConfig;
use crate::error::{ensure_same_len, ProofError};
use crate::sigma::{Relation, SigmaProof, Statement};

const LOG_TARGET: &str = "unlynx_proofs::proofs::det_tag";
const LABEL: &str = "deterministic-tag";

const TAG_SECRET: usize = 0;
const KEY_SHARE: usize = 1;

/// Proof that `after = (s·K, s·C - k·s·K)` for `before = (K, C)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DeterministicTaggingProof<C: CurveGroup> {
    pub proof: SigmaProof<C::ScalarField>,
    /// `-s·K` of the incoming ciphertext.
    #[serde(with = "crate::crypto_serde::curve")]
    pub ciminus11_si: C,
    /// `s·G`, identical for every element the server tagged in one pass.
    #[serde(with = "crate::crypto_serde::curve")]
    pub sb: C,
}

fn statement<C: CurveGroup>(
    key_share_public: C,
    proof: (&C, &C),
    before: &CipherText<C>,
    after: &CipherText<C>,
) -> Result<Statement<C>, ProofError> {
    let (ciminus11_si, sb) = proof;
    let g = C::generator();
    Statement::new(
        LABEL,
        2,
        Relation::and([
            Relation::representation(after.k, [(TAG_SECRET, before.k)]),
            Relation::representation(key_share_public, [(KEY_SHARE, g)]),
            Relation::representation(
                after.c,
                [(TAG_SECRET, before.c), (KEY_SHARE, *ciminus11_si)],
            ),
            Relation::representation(*sb, [(TAG_SECRET, g)]),
        ]),
    )
}

impl<C: CurveGroup> DeterministicTaggingProof<C> {
    pub fn create<R: Rng + ?Sized>(
        before: &CipherText<C>,
        after: &CipherText<C>,
        key_share: C::ScalarField,
        tag_secret: C::ScalarField,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let ciminus11_si = -(before.k * tag_secret);
        let sb = C::generator() * tag_secret;
        let statement = statement(
            C::generator() * key_share,
            (&ciminus11_si, &sb),
            before,
            after,
        )?;
        let proof = SigmaProof::prove(&statement, &[tag_secret, key_share], rng)?;
        Ok(Self {
            proof,
            ciminus11_si,
            sb,
        })
    }

    pub fn verify(
        &self,
        key_share_public: C,
        before: &CipherText<C>,
        after: &CipherText<C>,
    ) -> bool {
        check_statement(
            &self.proof,
            statement(
                key_share_public,
                (&self.ciminus11_si, &self.sb),
                before,
                after,
            ),
        )
    }
}

/// Deterministic-tagging proofs for one server's pass over a vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedDeterministicTaggingProof<C: CurveGroup> {
    pub proofs: Vec<DeterministicTaggingProof<C>>,
    pub before: CipherVector<C>,
    pub after: CipherVector<C>,
    #[serde(with = "crate::crypto_serde::curve")]
    pub key_share_public: C,
    #[serde(with = "crate::crypto_serde::curve")]
    pub sb: C,
}

impl<C: CurveGroup> PublishedDeterministicTaggingProof<C> {
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(len = before.len()))]
    pub fn create<R: RngCore + ?Sized>(
        config: &ProverConfig,
        before: CipherVector<C>,
        after: CipherVector<C>,
        tag_secret: C::ScalarField,
        key_share: C::ScalarField,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        ensure_same_len("deterministic tagging", &[before.len(), after.len()])?;
        let jobs: Vec<_> = before.iter().zip(&after).collect();
        let proofs = create_indexed(config, &jobs, rng, |(b, a), rng| {
            DeterministicTaggingProof::create(b, a, key_share, tag_secret, rng)
        })?;
        tracing::debug!(target: LOG_TARGET, proofs = proofs.len(), "deterministic tagging proofs created");
        Ok(Self {
            proofs,
            before,
            after,
            key_share_public: C::generator() * key_share,
            sb: C::generator() * tag_secret,
        })
    }

    pub fn validate(&self) -> Result<(), ProofError> {
        ensure_same_len(
            "published deterministic tagging",
            &[self.proofs.len(), self.before.len(), self.after.len()],
        )
        .map(drop)
    }

    /// Every element proof must verify and commit to the batch's `sb`.
    pub fn verify(&self) -> bool {
        shape_ok("deterministic tagging", self.validate())
            && verify_all(
                "deterministic tagging",
                self.proofs.iter().zip(&self.before).zip(&self.after),
                |((proof, before), after)| {
                    proof.sb == self.sb && proof.verify(self.key_share_public, before, after)
                },
            )
    }
}
