use ark_ec::CurveGroup;
use ark_serialize::CanonicalSerialize;
use ark_std::rand::Rng;
use ark_std::UniformRand;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::compress::{cipher_vector_tag, compress_beta, compress_list};
use super::pair_shuffle::{PairShuffleInstance, PairShuffleProof};
use super::validate_permutation;
use crate::error::{ensure_same_len, ProofError};
use crate::records::ProcessResponse;

const LOG_TARGET: &str = "unlynx_proofs::shuffle";

/// A shuffled list together with the secrets needed to prove it.
#[derive(Clone, Debug)]
pub struct ShuffleOutput<C: CurveGroup> {
    pub shuffled: Vec<ProcessResponse<C>>,
    /// Output `i` is input `pi[i]`.
    pub pi: Vec<usize>,
    /// Per-attribute rerandomizers of each output record.
    pub beta: Vec<Vec<C::ScalarField>>,
}

/// Permute `list` uniformly at random and rerandomize every attribute under `(g, h)`.
pub fn shuffle_process_responses<C: CurveGroup, R: Rng + ?Sized>(
    list: &[ProcessResponse<C>],
    g: C,
    h: C,
    rng: &mut R,
) -> ShuffleOutput<C> {
    let mut pi: Vec<usize> = (0..list.len()).collect();
    pi.shuffle(rng);
    let mut beta = Vec::with_capacity(list.len());
    let mut shuffled = Vec::with_capacity(list.len());
    for &source in &pi {
        let record = &list[source];
        let row: Vec<C::ScalarField> = (0..record.attribute_count())
            .map(|_| C::ScalarField::rand(rng))
            .collect();
        shuffled.push(record.map_attributes(|j, ct| ct.rerandomize(g, h, row[j])));
        beta.push(row);
    }
    ShuffleOutput { shuffled, pi, beta }
}

/// Shuffle proof as published: both lists, the rerandomization bases and the
/// serialized pair-shuffle proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedShufflingProof<C: CurveGroup> {
    pub original_list: Vec<ProcessResponse<C>>,
    pub shuffled_list: Vec<ProcessResponse<C>>,
    #[serde(with = "crate::crypto_serde::curve")]
    pub g: C,
    #[serde(with = "crate::crypto_serde::curve")]
    pub h: C,
    #[serde(with = "crate::crypto_serde::bytes")]
    pub hash_proof: Vec<u8>,
}

fn check_lists<C: CurveGroup>(
    original: &[ProcessResponse<C>],
    shuffled: &[ProcessResponse<C>],
) -> Result<(), ProofError> {
    let first = original.first().ok_or(ProofError::Empty("shuffle input list"))?;
    ensure_same_len("shuffle lists", &[original.len(), shuffled.len()])?;
    // compression flattens the columns, so the column split must be fixed up front
    let layout = first.layout();
    for (i, record) in original.iter().chain(shuffled).enumerate() {
        if record.layout() != layout {
            return Err(ProofError::InvalidInput(format!(
                "record {i} has column layout {:?}, expected {layout:?}",
                record.layout()
            )));
        }
    }
    Ok(())
}

/// Compress both lists with the tag bound to `seed` and the first original record.
fn compressed<C: CurveGroup>(
    original: &[ProcessResponse<C>],
    shuffled: &[ProcessResponse<C>],
    seed: C,
) -> Result<(C::ScalarField, [Vec<C>; 4]), ProofError> {
    let first = original.first().ok_or(ProofError::Empty("shuffle input list"))?;
    let e = cipher_vector_tag(first, seed)?;
    let ((x, y), (xbar, ybar)) = rayon::join(
        || compress_list(original, e),
        || compress_list(shuffled, e),
    );
    Ok((e, [x, y, xbar, ybar]))
}

impl<C: CurveGroup> PublishedShufflingProof<C> {
    /// Prove that `shuffled_list[i]` is `original_list[pi[i]]` rerandomized with `beta[i]`.
    ///
    /// The compression tag is seeded with `h`, so verifiers pass `h` as the seed.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(len = original_list.len()))]
    pub fn create<R: Rng + ?Sized>(
        original_list: Vec<ProcessResponse<C>>,
        shuffled_list: Vec<ProcessResponse<C>>,
        g: C,
        h: C,
        beta: &[Vec<C::ScalarField>],
        pi: &[usize],
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        check_lists(&original_list, &shuffled_list)?;
        validate_permutation(pi, original_list.len())?;
        ensure_same_len("shuffle rerandomizers", &[original_list.len(), beta.len()])?;
        for (i, (row, record)) in beta.iter().zip(&shuffled_list).enumerate() {
            if row.len() != record.attribute_count() {
                return Err(ProofError::InvalidInput(format!(
                    "record {i} has {} attributes but {} rerandomizers",
                    record.attribute_count(),
                    row.len()
                )));
            }
        }

        let (e, [x, y, xbar, ybar]) = compressed(&original_list, &shuffled_list, h)?;
        let beta_compressed = compress_beta(beta, e);
        let instance = PairShuffleInstance {
            g,
            h,
            x: &x,
            y: &y,
            xbar: &xbar,
            ybar: &ybar,
        };
        let proof = PairShuffleProof::prove(&instance, pi, &beta_compressed, rng)?;
        let mut hash_proof = Vec::with_capacity(proof.compressed_size());
        proof.serialize_compressed(&mut hash_proof)?;

        tracing::debug!(target: LOG_TARGET, bytes = hash_proof.len(), "shuffle proof created");
        Ok(Self {
            original_list,
            shuffled_list,
            g,
            h,
            hash_proof,
        })
    }

    pub fn validate(&self) -> Result<(), ProofError> {
        check_lists(&self.original_list, &self.shuffled_list)
    }

    /// Recompute the compression under `seed` and check the pair-shuffle proof.
    pub fn verify(&self, seed: C) -> bool {
        self.check(seed).unwrap_or_else(|err| {
            tracing::warn!(target: LOG_TARGET, %err, "rejecting shuffle proof");
            false
        })
    }

    fn check(&self, seed: C) -> Result<bool, ProofError> {
        self.validate()?;
        let proof = PairShuffleProof::<C>::from_bytes(&self.hash_proof, self.original_list.len())?;
        let (_, [x, y, xbar, ybar]) = compressed(&self.original_list, &self.shuffled_list, seed)?;
        let instance = PairShuffleInstance {
            g: self.g,
            h: self.h,
            x: &x,
            y: &y,
            xbar: &xbar,
            ybar: &ybar,
        };
        Ok(proof.verify(&instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphertext::{encrypt_int_vector, CipherText};
    use crate::test_utils::{keypair, seeded_rng, Curve, Scalar};
    use ark_ec::PrimeGroup;
    use rand::rngs::StdRng;

    fn records(rng: &mut StdRng, pk: Curve, count: usize) -> Vec<ProcessResponse<Curve>> {
        (0..count as i64)
            .map(|i| {
                let (g, _) = encrypt_int_vector(pk, &[i], rng);
                let (a, _) = encrypt_int_vector(pk, &[10 * i, 10 * i + 1], rng);
                let (w, _) = encrypt_int_vector(pk, &[1], rng);
                ProcessResponse::new(g, a, w)
            })
            .collect()
    }

    #[test]
    fn shuffle_is_permuted_rerandomization() {
        let mut rng = seeded_rng(110);
        let (sk, pk) = keypair(&mut rng);
        let list = records(&mut rng, pk, 4);
        let out = shuffle_process_responses(&list, Curve::generator(), pk, &mut rng);
        for (i, record) in out.shuffled.iter().enumerate() {
            let source = out.pi[i] as i64;
            assert_eq!(record.group_by_enc[0].decrypt_int(sk, 10), Some(source));
            assert_ne!(record.group_by_enc[0], list[out.pi[i]].group_by_enc[0]);
        }
    }

    #[test]
    fn published_shuffle_verifies_with_h_as_seed() {
        let mut rng = seeded_rng(111);
        let (_, pk) = keypair(&mut rng);
        let g = Curve::generator();
        let list = records(&mut rng, pk, 5);
        let out = shuffle_process_responses(&list, g, pk, &mut rng);
        let proof = PublishedShufflingProof::create(
            list,
            out.shuffled,
            g,
            pk,
            &out.beta,
            &out.pi,
            &mut rng,
        )
        .unwrap();
        assert!(proof.verify(pk));
        assert!(!proof.verify(g));

        let json = serde_json::to_string(&proof).unwrap();
        let restored: PublishedShufflingProof<Curve> = serde_json::from_str(&json).unwrap();
        assert!(restored.verify(pk));
    }

    #[test]
    fn foreign_list_is_rejected() {
        let mut rng = seeded_rng(112);
        let (_, pk) = keypair(&mut rng);
        let g = Curve::generator();
        let list = records(&mut rng, pk, 3);
        let out = shuffle_process_responses(&list, g, pk, &mut rng);
        let proof =
            PublishedShufflingProof::create(list.clone(), out.shuffled, g, pk, &out.beta, &out.pi, &mut rng)
                .unwrap();

        let mut tampered = proof.clone();
        tampered.shuffled_list[1].aggregating_attributes[0].c += g;
        assert!(!tampered.verify(pk));

        let other = shuffle_process_responses(&list, g, pk, &mut rng);
        let mut swapped = proof.clone();
        swapped.shuffled_list = other.shuffled;
        assert!(!swapped.verify(pk));

        let mut garbage = proof;
        garbage.hash_proof.truncate(10);
        assert!(!garbage.verify(pk));
    }

    #[test]
    fn hostile_proof_bytes_are_rejected_without_decoding() {
        let mut rng = seeded_rng(114);
        let (_, pk) = keypair(&mut rng);
        let g = Curve::generator();
        let list = records(&mut rng, pk, 3);
        let out = shuffle_process_responses(&list, g, pk, &mut rng);
        let proof =
            PublishedShufflingProof::create(list, out.shuffled, g, pk, &out.beta, &out.pi, &mut rng)
                .unwrap();

        let mut huge_prefix = proof.clone();
        huge_prefix.hash_proof[..8].copy_from_slice(&(u64::MAX / 64).to_le_bytes());
        assert!(!huge_prefix.verify(pk));

        let mut padded = proof;
        padded.hash_proof.extend_from_slice(&[0; 32]);
        assert!(!padded.verify(pk));
    }

    #[test]
    fn reshaped_records_are_rejected() {
        let mut rng = seeded_rng(115);
        let (_, pk) = keypair(&mut rng);
        let g = Curve::generator();
        let list = records(&mut rng, pk, 3);
        let out = shuffle_process_responses(&list, g, pk, &mut rng);
        let proof =
            PublishedShufflingProof::create(list, out.shuffled, g, pk, &out.beta, &out.pi, &mut rng)
                .unwrap();
        assert!(proof.validate().is_ok());

        let mut moved = proof.clone();
        let attribute = moved.shuffled_list[0].aggregating_attributes.remove(0);
        moved.shuffled_list[0].group_by_enc.push(attribute);
        assert!(matches!(moved.validate(), Err(ProofError::InvalidInput(_))));
        assert!(!moved.verify(pk));

        let mut padded = proof.clone();
        padded.shuffled_list[1].where_enc.push(CipherText::zero());
        assert!(padded.validate().is_err());
        assert!(!padded.verify(pk));

        let mut ragged = proof;
        ragged.original_list[2].where_enc.clear();
        assert!(!ragged.verify(pk));
    }

    #[test]
    fn shape_errors_surface_before_proving() {
        let mut rng = seeded_rng(113);
        let (_, pk) = keypair(&mut rng);
        let g = Curve::generator();
        let list = records(&mut rng, pk, 3);
        let out = shuffle_process_responses(&list, g, pk, &mut rng);

        let err = PublishedShufflingProof::create(list.clone(), out.shuffled.clone(), g, pk, &out.beta, &[0, 0, 1], &mut rng)
            .unwrap_err();
        assert!(err.is_configuration());

        let mut short_beta = out.beta.clone();
        short_beta[0].pop();
        assert!(PublishedShufflingProof::create(list.clone(), out.shuffled.clone(), g, pk, &short_beta, &out.pi, &mut rng).is_err());

        let wrong_beta: Vec<Vec<Scalar>> = out.beta.iter().map(|row| row.iter().map(|b| *b + b).collect()).collect();
        let err = PublishedShufflingProof::create(list, out.shuffled, g, pk, &wrong_beta, &out.pi, &mut rng)
            .unwrap_err();
        assert!(matches!(err, ProofError::InvalidInput(_)));

        assert!(PublishedShufflingProof::<Curve>::create(vec![], vec![], g, pk, &[], &[], &mut rng).is_err());
    }
}
