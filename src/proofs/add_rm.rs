use std::collections::BTreeMap;

use ark_ec::CurveGroup;
use ark_std::rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{check_statement, shape_ok};
use crate::batch::{create_keyed, verify_keyed};
use crate::ciphertext::CipherText;
use crate::config::ProverConfig;
use crate::error::ProofError;
use crate::sigma::{Relation, SigmaProof, Statement};

const LOG_TARGET: &str = "unlynx_proofs::proofs::add_rm";
const LABEL: &str = "add-rm-server";

const KEY_SHARE: usize = 0;

/// Proof that a server with public share `Krm` added (or removed) `k·K` to `C`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct AddRmProof<C: CurveGroup> {
    pub proof: SigmaProof<C::ScalarField>,
    /// Ephemeral key of the ciphertext before the update.
    #[serde(with = "crate::crypto_serde::curve")]
    pub rb: C,
}

fn statement<C: CurveGroup>(
    krm: C,
    before: &CipherText<C>,
    after: &CipherText<C>,
    to_add: bool,
) -> Result<Statement<C>, ProofError> {
    let delta = if to_add {
        after.c - before.c
    } else {
        before.c - after.c
    };
    Statement::new(
        LABEL,
        1,
        Relation::and([
            Relation::representation(krm, [(KEY_SHARE, C::generator())]),
            Relation::representation(delta, [(KEY_SHARE, before.k)]),
        ]),
    )
}

impl<C: CurveGroup> AddRmProof<C> {
    pub fn create<R: Rng + ?Sized>(
        before: &CipherText<C>,
        after: &CipherText<C>,
        key_share: C::ScalarField,
        to_add: bool,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let krm = C::generator() * key_share;
        let proof = SigmaProof::prove(&statement(krm, before, after, to_add)?, &[key_share], rng)?;
        Ok(Self {
            proof,
            rb: before.k,
        })
    }

    pub fn verify(
        &self,
        krm: C,
        before: &CipherText<C>,
        after: &CipherText<C>,
        to_add: bool,
    ) -> bool {
        if self.rb != before.k {
            tracing::warn!(target: LOG_TARGET, "proof was made for another ephemeral key");
            return false;
        }
        check_statement(&self.proof, statement(krm, before, after, to_add))
    }
}

/// Add/remove proofs over a keyed collection of ciphertexts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedAddRmProof<C: CurveGroup> {
    pub proofs: BTreeMap<String, AddRmProof<C>>,
    pub before: BTreeMap<String, CipherText<C>>,
    pub after: BTreeMap<String, CipherText<C>>,
    #[serde(with = "crate::crypto_serde::curve")]
    pub krm: C,
    pub to_add: bool,
}

fn same_keys<A, B>(lhs: &BTreeMap<String, A>, rhs: &BTreeMap<String, B>) -> bool {
    lhs.len() == rhs.len() && lhs.keys().eq(rhs.keys())
}

impl<C: CurveGroup> PublishedAddRmProof<C> {
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(len = before.len(), to_add = to_add))]
    pub fn create<R: RngCore + ?Sized>(
        config: &ProverConfig,
        before: BTreeMap<String, CipherText<C>>,
        after: BTreeMap<String, CipherText<C>>,
        key_share: C::ScalarField,
        to_add: bool,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        if !same_keys(&before, &after) {
            return Err(ProofError::KeySetMismatch("add/rm before and after maps"));
        }
        let proofs = create_keyed(config, &before, rng, |key, ct, rng| {
            let updated = after
                .get(key)
                .ok_or(ProofError::KeySetMismatch("add/rm before and after maps"))?;
            AddRmProof::create(ct, updated, key_share, to_add, rng)
        })?;
        tracing::debug!(target: LOG_TARGET, proofs = proofs.len(), "add/rm proofs created");
        Ok(Self {
            proofs,
            before,
            after,
            krm: C::generator() * key_share,
            to_add,
        })
    }

    pub fn validate(&self) -> Result<(), ProofError> {
        if same_keys(&self.proofs, &self.before) && same_keys(&self.before, &self.after) {
            Ok(())
        } else {
            Err(ProofError::KeySetMismatch("published add/rm maps"))
        }
    }

    pub fn verify(&self) -> bool {
        shape_ok("add/rm", self.validate())
            && verify_keyed("add/rm", self.proofs.iter(), |key, proof| {
                match (self.before.get(key), self.after.get(key)) {
                    (Some(before), Some(after)) => proof.verify(self.krm, before, after, self.to_add),
                    _ => false,
                }
            })
    }
}
