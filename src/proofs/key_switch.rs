use ark_ec::CurveGroup;
use ark_std::rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{check_statement, shape_ok};
use crate::batch::{create_indexed, verify_all};
use crate::ciphertext::{CipherText, CipherVector};
use crate::config::ProverConfig;
use crate::error::{ensure_same_len, ProofError};
use crate::sigma::{Relation, SigmaProof, Statement};

const LOG_TARGET: &str = "unlynx_proofs::proofs::key_switch";
const LABEL: &str = "key-switch";

const KEY_SHARE: usize = 0;
const FRESH_RANDOMNESS: usize = 1;

/// Proof that `after - before = (r'·G, -k·origin + r'·Q)` for the server's key share `k`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SwitchKeyProof<C: CurveGroup> {
    pub proof: SigmaProof<C::ScalarField>,
    /// Negated ephemeral key of the original ciphertext.
    #[serde(with = "crate::crypto_serde::curve")]
    pub b2: C,
}

fn statement<C: CurveGroup>(
    key_share_public: C,
    target_public_key: C,
    b2: C,
    before: &CipherText<C>,
    after: &CipherText<C>,
) -> Result<Statement<C>, ProofError> {
    let g = C::generator();
    let delta = *after - *before;
    Statement::new(
        LABEL,
        2,
        Relation::and([
            Relation::representation(delta.k, [(FRESH_RANDOMNESS, g)]),
            Relation::representation(key_share_public, [(KEY_SHARE, g)]),
            Relation::representation(
                delta.c,
                [(KEY_SHARE, b2), (FRESH_RANDOMNESS, target_public_key)],
            ),
        ]),
    )
}

impl<C: CurveGroup> SwitchKeyProof<C> {
    pub fn create<R: Rng + ?Sized>(
        before: &CipherText<C>,
        after: &CipherText<C>,
        fresh_randomness: C::ScalarField,
        key_share: C::ScalarField,
        origin_ephemeral_key: C,
        target_public_key: C,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let b2 = -origin_ephemeral_key;
        let key_share_public = C::generator() * key_share;
        let statement = statement(key_share_public, target_public_key, b2, before, after)?;
        let proof = SigmaProof::prove(&statement, &[key_share, fresh_randomness], rng)?;
        Ok(Self { proof, b2 })
    }

    pub fn verify(
        &self,
        key_share_public: C,
        target_public_key: C,
        before: &CipherText<C>,
        after: &CipherText<C>,
    ) -> bool {
        check_statement(
            &self.proof,
            statement(key_share_public, target_public_key, self.b2, before, after),
        )
    }
}

/// Key-switching proofs for a whole vector, with the public keys they were made against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedSwitchKeyProof<C: CurveGroup> {
    pub proofs: Vec<SwitchKeyProof<C>>,
    pub before: CipherVector<C>,
    pub after: CipherVector<C>,
    /// Public key share `k·G` of the proving server.
    #[serde(with = "crate::crypto_serde::curve")]
    pub key_share_public: C,
    /// Key the ciphertexts are switched to.
    #[serde(with = "crate::crypto_serde::curve")]
    pub target_public_key: C,
}

impl<C: CurveGroup> PublishedSwitchKeyProof<C> {
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(len = before.len()))]
    pub fn create<R: RngCore + ?Sized>(
        config: &ProverConfig,
        before: CipherVector<C>,
        after: CipherVector<C>,
        fresh_randomness: &[C::ScalarField],
        key_share: C::ScalarField,
        origin_ephemeral_keys: &[C],
        target_public_key: C,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        ensure_same_len(
            "key switching",
            &[
                before.len(),
                after.len(),
                fresh_randomness.len(),
                origin_ephemeral_keys.len(),
            ],
        )?;
        let jobs: Vec<_> = before
            .iter()
            .zip(&after)
            .zip(fresh_randomness.iter().zip(origin_ephemeral_keys))
            .collect();
        let proofs = create_indexed(config, &jobs, rng, |((b, a), (r, origin)), rng| {
            SwitchKeyProof::create(b, a, **r, key_share, **origin, target_public_key, rng)
        })?;
        tracing::debug!(target: LOG_TARGET, proofs = proofs.len(), "key switching proofs created");
        Ok(Self {
            proofs,
            before,
            after,
            key_share_public: C::generator() * key_share,
            target_public_key,
        })
    }

    pub fn validate(&self) -> Result<(), ProofError> {
        ensure_same_len(
            "published key switching",
            &[self.proofs.len(), self.before.len(), self.after.len()],
        )
        .map(drop)
    }

    pub fn verify(&self) -> bool {
        shape_ok("key switching", self.validate())
            && verify_all(
                "key switching",
                self.proofs.iter().zip(&self.before).zip(&self.after),
                |((proof, before), after)| {
                    proof.verify(self.key_share_public, self.target_public_key, before, after)
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphertext::encrypt_int_vector;
    use crate::test_utils::{keypair, seeded_rng, Curve, Scalar};
    use ark_ec::PrimeGroup;
    use ark_ff::Zero;
    use ark_std::UniformRand;
    use rand::rngs::StdRng;

    struct Fixture {
        share: Scalar,
        target_sk: Scalar,
        target_pk: Curve,
        before: CipherVector<Curve>,
        after: CipherVector<Curve>,
        fresh: Vec<Scalar>,
        origins: Vec<Curve>,
    }

    fn fixture(rng: &mut StdRng, values: &[i64]) -> Fixture {
        let (share, collective) = keypair(rng);
        let (target_sk, target_pk) = keypair(rng);
        let (originals, _) = encrypt_int_vector(collective, values, rng);
        let before: CipherVector<Curve> = originals
            .iter()
            .map(|ct| CipherText::new(Curve::zero(), ct.c))
            .collect();
        let fresh: Vec<Scalar> = values.iter().map(|_| Scalar::rand(rng)).collect();
        let origins: Vec<Curve> = originals.iter().map(|ct| ct.k).collect();
        let after = before
            .iter()
            .zip(&origins)
            .zip(&fresh)
            .map(|((ct, origin), r)| ct.key_switch_step(*origin, share, target_pk, *r))
            .collect();
        Fixture {
            share,
            target_sk,
            target_pk,
            before,
            after,
            fresh,
            origins,
        }
    }

    #[test]
    fn single_proof_verifies_and_rejects_foreign_key() {
        let mut rng = seeded_rng(30);
        let f = fixture(&mut rng, &[5]);
        let proof = SwitchKeyProof::create(
            &f.before[0],
            &f.after[0],
            f.fresh[0],
            f.share,
            f.origins[0],
            f.target_pk,
            &mut rng,
        )
        .unwrap();
        let share_pk = Curve::generator() * f.share;
        assert!(proof.verify(share_pk, f.target_pk, &f.before[0], &f.after[0]));
        assert_eq!(f.after[0].decrypt_int(f.target_sk, 10), Some(5));

        let (_, unrelated) = keypair(&mut rng);
        assert!(!proof.verify(unrelated, f.target_pk, &f.before[0], &f.after[0]));
        assert!(!proof.verify(share_pk, unrelated, &f.before[0], &f.after[0]));
    }

    #[test]
    fn published_vector_verifies_in_both_modes() {
        for config in [
            ProverConfig::default().with_chunk_size(2),
            ProverConfig::sequential(),
        ] {
            let mut rng = seeded_rng(31);
            let f = fixture(&mut rng, &[1, 2, 3, 4, 5]);
            let published = PublishedSwitchKeyProof::create(
                &config,
                f.before,
                f.after,
                &f.fresh,
                f.share,
                &f.origins,
                f.target_pk,
                &mut rng,
            )
            .unwrap();
            assert!(published.verify());
        }
    }

    #[test]
    fn tampered_after_is_rejected() {
        let mut rng = seeded_rng(32);
        let f = fixture(&mut rng, &[7, 8]);
        let mut published = PublishedSwitchKeyProof::create(
            &ProverConfig::default(),
            f.before,
            f.after,
            &f.fresh,
            f.share,
            &f.origins,
            f.target_pk,
            &mut rng,
        )
        .unwrap();
        published.after[1].c += Curve::generator();
        assert!(!published.verify());

        published.after[1].c -= Curve::generator();
        assert!(published.verify());
        published.after[0].k += Curve::generator();
        assert!(!published.verify());
    }

    #[test]
    fn mismatched_lengths_fail_before_proving() {
        let mut rng = seeded_rng(33);
        let f = fixture(&mut rng, &[1, 2]);
        let err = PublishedSwitchKeyProof::create(
            &ProverConfig::default(),
            f.before,
            f.after,
            &f.fresh[..1],
            f.share,
            &f.origins,
            f.target_pk,
            &mut rng,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn truncated_proof_list_is_rejected() {
        let mut rng = seeded_rng(34);
        let f = fixture(&mut rng, &[1, 2]);
        let mut published = PublishedSwitchKeyProof::create(
            &ProverConfig::default(),
            f.before,
            f.after,
            &f.fresh,
            f.share,
            &f.origins,
            f.target_pk,
            &mut rng,
        )
        .unwrap();
        published.proofs.pop();
        assert!(published.validate().is_err());
        assert!(!published.verify());
    }

    #[test]
    fn published_proof_survives_json() {
        let mut rng = seeded_rng(35);
        let f = fixture(&mut rng, &[3]);
        let published = PublishedSwitchKeyProof::create(
            &ProverConfig::sequential(),
            f.before,
            f.after,
            &f.fresh,
            f.share,
            &f.origins,
            f.target_pk,
            &mut rng,
        )
        .unwrap();
        crate::test_utils::serde::assert_round_trip_eq(&published);
        let json = serde_json::to_string(&published).unwrap();
        let restored: PublishedSwitchKeyProof<Curve> = serde_json::from_str(&json).unwrap();
        assert!(restored.verify());
    }
}
