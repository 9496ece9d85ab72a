//! Exponential ElGamal ciphertexts `(K, C) = (r·G, m·G + r·PK)` and the one-server
//! transformation steps whose honesty the proofs in this crate attest to.

use std::ops::{Add, Neg, Sub};

use ark_ec::CurveGroup;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::Rng;
use ark_std::UniformRand;
use serde::{Deserialize, Serialize};

use crate::algebra::int_to_point;
use crate::error::{ensure_same_len, ProofError};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, CanonicalSerialize, CanonicalDeserialize,
)]
#[serde(bound(
    serialize = "C: CanonicalSerialize",
    deserialize = "C: CanonicalDeserialize"
))]
pub struct CipherText<C: CurveGroup> {
    /// Ephemeral key `r·G`.
    #[serde(with = "crate::crypto_serde::curve")]
    pub k: C,
    /// Payload `m·G + r·PK`.
    #[serde(with = "crate::crypto_serde::curve")]
    pub c: C,
}

/// Ordered ciphertexts, index-aligned with record fields.
pub type CipherVector<C> = Vec<CipherText<C>>;

impl<C: CurveGroup> CipherText<C> {
    pub fn new(k: C, c: C) -> Self {
        Self { k, c }
    }

    /// The neutral ciphertext `(0, 0)`.
    pub fn zero() -> Self {
        Self::new(C::zero(), C::zero())
    }

    pub fn encrypt_point(public_key: C, message: C, randomness: C::ScalarField) -> Self {
        Self::new(C::generator() * randomness, message + public_key * randomness)
    }

    pub fn encrypt(public_key: C, message: C::ScalarField, randomness: C::ScalarField) -> Self {
        Self::encrypt_point(public_key, C::generator() * message, randomness)
    }

    /// Encrypt a small integer with fresh randomness, returning the randomness too.
    pub fn encrypt_int<R: Rng + ?Sized>(
        public_key: C,
        value: i64,
        rng: &mut R,
    ) -> (Self, C::ScalarField) {
        let randomness = C::ScalarField::rand(rng);
        (
            Self::encrypt_point(public_key, int_to_point::<C>(value), randomness),
            randomness,
        )
    }

    /// Add an encryption of zero under `(base, public_key)`.
    pub fn rerandomize(&self, base: C, public_key: C, randomness: C::ScalarField) -> Self {
        Self::new(self.k + base * randomness, self.c + public_key * randomness)
    }

    /// Returns `m·G`.
    pub fn decrypt_point(&self, secret_key: C::ScalarField) -> C {
        self.c - self.k * secret_key
    }

    /// Recover a plaintext in `[-bound, bound]` by exhaustive search.
    pub fn decrypt_int(&self, secret_key: C::ScalarField, bound: u64) -> Option<i64> {
        let target = self.decrypt_point(secret_key);
        if target.is_zero() {
            return Some(0);
        }
        let generator = C::generator();
        let mut positive = C::zero();
        for step in 1..=bound {
            positive += generator;
            if positive == target {
                return i64::try_from(step).ok();
            }
            if -positive == target {
                return i64::try_from(step).ok().map(|v| -v);
            }
        }
        None
    }

    /// One server's key-switching contribution.
    ///
    /// `self` is the running accumulator, `origin_ephemeral_key` the `K` of the original
    /// ciphertext; the result adds `r'·G` to `K` and `-k·origin + r'·Q` to `C`.
    pub fn key_switch_step(
        &self,
        origin_ephemeral_key: C,
        key_share: C::ScalarField,
        target_public_key: C,
        fresh_randomness: C::ScalarField,
    ) -> Self {
        Self::new(
            self.k + C::generator() * fresh_randomness,
            self.c - origin_ephemeral_key * key_share + target_public_key * fresh_randomness,
        )
    }

    /// Adjust a ciphertext when a server with `key_share` joins (`to_add`) or leaves the
    /// collective key: `C ± k·K`.
    pub fn add_rm_server_step(&self, key_share: C::ScalarField, to_add: bool) -> Self {
        let delta = self.k * key_share;
        let c = if to_add { self.c + delta } else { self.c - delta };
        Self::new(self.k, c)
    }

    /// One server's deterministic-tagging contribution: `(s·K, s·C - k·s·K)`.
    pub fn deterministic_tag_step(
        &self,
        tag_secret: C::ScalarField,
        key_share: C::ScalarField,
    ) -> Self {
        let blinded = self.k * tag_secret;
        Self::new(blinded, self.c * tag_secret - blinded * key_share)
    }
}

impl<C: CurveGroup> Add for CipherText<C> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.k + rhs.k, self.c + rhs.c)
    }
}

impl<C: CurveGroup> Sub for CipherText<C> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.k - rhs.k, self.c - rhs.c)
    }
}

impl<C: CurveGroup> Neg for CipherText<C> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.k, -self.c)
    }
}

pub fn encrypt_int_vector<C, R>(
    public_key: C,
    values: &[i64],
    rng: &mut R,
) -> (CipherVector<C>, Vec<C::ScalarField>)
where
    C: CurveGroup,
    R: Rng + ?Sized,
{
    values
        .iter()
        .map(|&value| CipherText::encrypt_int(public_key, value, &mut *rng))
        .unzip()
}

/// Component-wise homomorphic addition of two vectors of equal length.
pub fn add_vectors<C: CurveGroup>(
    lhs: &[CipherText<C>],
    rhs: &[CipherText<C>],
) -> Result<CipherVector<C>, ProofError> {
    ensure_same_len("cipher vector addition", &[lhs.len(), rhs.len()])?;
    Ok(lhs.iter().zip(rhs).map(|(a, b)| *a + *b).collect())
}
