use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::PrimeGroup;
use ark_ff::{One, Zero};
use ark_std::rand::Rng;
use ark_std::UniformRand;
use serde::{Deserialize, Serialize};

use super::{range_bound, to_base, PublishSignature};
use crate::algebra::{hash_to_scalar, point_bytes};
use crate::ciphertext::CipherText;
use crate::error::ProofError;

const LOG_TARGET: &str = "unlynx_proofs::range";
const CHALLENGE_DOMAIN: &[u8] = b"range-proof/challenge";

/// What a data provider sends with an encrypted value in `[0, u^l)`.
///
/// The ciphertext lives in `G2`; `V` are blinded digit certificates in `G1` and `a`
/// the per-digit pairing commitments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishRangeProof<E: Pairing> {
    pub cipher: CipherText<E::G2>,
    #[serde(with = "crate::crypto_serde::field")]
    pub challenge: E::ScalarField,
    #[serde(with = "crate::crypto_serde::curve_vec")]
    pub v: Vec<E::G1>,
    #[serde(with = "crate::crypto_serde::field_vec")]
    pub zv: Vec<E::ScalarField>,
    #[serde(with = "crate::crypto_serde::field_vec")]
    pub zphi: Vec<E::ScalarField>,
    #[serde(with = "crate::crypto_serde::field")]
    pub zr: E::ScalarField,
    #[serde(with = "crate::crypto_serde::curve")]
    pub d: E::G2,
    #[serde(with = "crate::crypto_serde::curve_vec")]
    pub a: Vec<PairingOutput<E>>,
}

/// `c = H(B2, C, y)`.
fn challenge<E: Pairing>(commit: &E::G2, signer: &E::G2) -> Result<E::ScalarField, ProofError> {
    let base = point_bytes(&E::G2::generator())?;
    let commit = point_bytes(commit)?;
    let signer = point_bytes(signer)?;
    Ok(hash_to_scalar(CHALLENGE_DOMAIN, &[base.as_slice(), commit.as_slice(), signer.as_slice()]))
}

impl<E: Pairing> PublishRangeProof<E> {
    /// Encrypt `secret` under `ca_pub` and prove it lies in `[0, u^l)` using `sig`.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(u = u, l = l))]
    pub fn create<R: Rng + ?Sized>(
        sig: &PublishSignature<E>,
        u: u64,
        l: usize,
        secret: u64,
        ca_pub: E::G2,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        if l == 0 {
            return Err(ProofError::Empty("range proof digits"));
        }
        if sig.signature.len() as u64 != u {
            return Err(ProofError::LengthMismatch {
                context: "digit signatures",
                expected: usize::try_from(u).unwrap_or(usize::MAX),
                actual: sig.signature.len(),
            });
        }
        let bound = range_bound(u, l)?;
        if secret >= bound {
            return Err(ProofError::InvalidInput(format!(
                "secret {secret} outside [0, {u}^{l})"
            )));
        }
        let digits = to_base(secret, u, l)?;

        let b1 = E::G1::generator();
        let b2 = E::G2::generator();
        let r = E::ScalarField::rand(rng);
        let cipher = CipherText::encrypt(ca_pub, E::ScalarField::from(secret), r);
        let c = challenge::<E>(&cipher.c, &sig.public)?;

        let mut v = Vec::with_capacity(l);
        let mut a = Vec::with_capacity(l);
        let mut zphi = Vec::with_capacity(l);
        let mut zv = Vec::with_capacity(l);
        let mut d = E::G2::zero();
        let mut m_sum = E::ScalarField::zero();
        let mut weight = E::ScalarField::one();
        let radix = E::ScalarField::from(u);

        for &digit in &digits {
            let certificate = usize::try_from(digit)
                .ok()
                .and_then(|index| sig.signature.get(index))
                .ok_or_else(|| ProofError::Internal(format!("no certificate for digit {digit}")))?;
            let blind = E::ScalarField::rand(rng);
            let blinded = *certificate * blind;

            let s = E::ScalarField::rand(rng);
            let t = E::ScalarField::rand(rng);
            let m = E::ScalarField::rand(rng);
            m_sum += m;
            d += b2 * (weight * s) + ca_pub * m;

            a.push(E::multi_pairing([blinded, b1], [b2 * (-s), b2 * t]));
            zphi.push(s - E::ScalarField::from(digit) * c);
            zv.push(t - blind * c);
            v.push(blinded);
            weight *= radix;
        }

        tracing::debug!(target: LOG_TARGET, digits = l, "range proof created");
        Ok(Self {
            cipher,
            challenge: c,
            v,
            zv,
            zphi,
            zr: m_sum - r * c,
            d,
            a,
        })
    }

    /// Check the proof against signer key `y` and the encryption key `ca_pub`.
    pub fn verify(&self, u: u64, l: usize, y: E::G2, ca_pub: E::G2) -> bool {
        self.check(u, l, y, ca_pub).unwrap_or_else(|err| {
            tracing::warn!(target: LOG_TARGET, %err, "range proof verification aborted");
            false
        })
    }

    fn check(&self, u: u64, l: usize, y: E::G2, ca_pub: E::G2) -> Result<bool, ProofError> {
        let declared = self.zphi.len() + self.zv.len() + self.a.len() + self.v.len();
        if l.checked_mul(4) != Some(declared) {
            tracing::warn!(target: LOG_TARGET, l, declared, "range proof arrays do not match l");
            return Ok(false);
        }
        if challenge::<E>(&self.cipher.c, &y)? != self.challenge {
            tracing::warn!(target: LOG_TARGET, "range proof challenge mismatch");
            return Ok(false);
        }

        let b1 = E::G1::generator();
        let b2 = E::G2::generator();
        let c = self.challenge;
        let y_c = y * c;
        let radix = E::ScalarField::from(u);
        let mut weight = E::ScalarField::one();
        let mut dp = self.cipher.c * c + ca_pub * self.zr;

        for (j, zphi) in self.zphi.iter().enumerate() {
            dp += b2 * (weight * zphi);
            weight *= radix;

            let (Some(v), Some(zv), Some(a)) = (self.v.get(j), self.zv.get(j), self.a.get(j)) else {
                return Ok(false);
            };
            let ap = E::multi_pairing([*v, *v, b1], [y_c, b2 * (-*zphi), b2 * zv]);
            if ap != *a {
                tracing::warn!(target: LOG_TARGET, digit = j, "digit commitment mismatch");
                return Ok(false);
            }
        }

        if dp != self.d {
            tracing::warn!(target: LOG_TARGET, "range commitment D mismatch");
            return Ok(false);
        }
        Ok(true)
    }
}
