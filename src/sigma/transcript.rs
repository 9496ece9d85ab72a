use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use sha3::{Digest, Sha3_512};

use crate::algebra::point_bytes;
use crate::error::ProofError;

const DOMAIN_TAG: &[u8] = b"unlynx-proofs/transcript/v1";

/// Fiat-Shamir transcript over SHA3-512.
///
/// Every message is absorbed as `len(label) || label || len(bytes) || bytes`, so
/// concatenation ambiguities cannot produce colliding transcripts. Each challenge is
/// fed back into the state, which keeps successive challenges independent.
#[derive(Clone)]
pub struct Transcript {
    hasher: Sha3_512,
}

impl Transcript {
    pub fn new(protocol: &[u8]) -> Self {
        let mut transcript = Self {
            hasher: Sha3_512::new(),
        };
        transcript.hasher.update(DOMAIN_TAG);
        transcript.append_message(b"protocol", protocol);
        transcript
    }

    pub fn append_message(&mut self, label: &[u8], bytes: &[u8]) {
        write_prefixed(&mut self.hasher, label);
        write_prefixed(&mut self.hasher, bytes);
    }

    pub fn append_u64(&mut self, label: &[u8], value: u64) {
        self.append_message(label, &value.to_be_bytes());
    }

    pub fn append_point<P: CanonicalSerialize>(
        &mut self,
        label: &[u8],
        point: &P,
    ) -> Result<(), ProofError> {
        let bytes = point_bytes(point)?;
        self.append_message(label, &bytes);
        Ok(())
    }

    pub fn append_points<P: CanonicalSerialize>(
        &mut self,
        label: &[u8],
        points: &[P],
    ) -> Result<(), ProofError> {
        self.append_u64(label, points.len() as u64);
        points
            .iter()
            .try_for_each(|point| self.append_point(label, point))
    }

    pub fn challenge_scalar<F: PrimeField>(&mut self, label: &[u8]) -> F {
        let mut fork = self.hasher.clone();
        write_prefixed(&mut fork, b"challenge");
        write_prefixed(&mut fork, label);
        let digest = fork.finalize();
        self.append_message(b"chain", &digest);
        F::from_le_bytes_mod_order(&digest)
    }

    pub fn challenge_scalars<F: PrimeField>(&mut self, label: &[u8], count: usize) -> Vec<F> {
        (0..count).map(|_| self.challenge_scalar(label)).collect()
    }
}

fn write_prefixed(hasher: &mut Sha3_512, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
