//! Terelius–Wikström proof of a shuffle of ElGamal pairs.
//!
//! Statement: `xbar_i = x_{π(i)} + β_i·h` and `ybar_i = y_{π(i)} + β_i·g` for a secret
//! permutation `π` and secret `β`. The prover commits to `π` column-wise against
//! independent generators, receives challenges `u`, proves a commitment chain to
//! `Π u_{π(i)}`, and closes with one generalized Schnorr proof that ties the permuted
//! challenges to both the commitment and the ciphertexts.

use ark_ec::CurveGroup;
use ark_ff::{One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::Rng;
use ark_std::UniformRand;

use super::validate_permutation;
use crate::algebra::derive_generators;
use crate::error::{ensure_same_len, ProofError};
use crate::sigma::{Relation, SigmaProof, Statement, Transcript};

const LOG_TARGET: &str = "unlynx_proofs::shuffle::pair_shuffle";
const PROTOCOL: &[u8] = b"pair-shuffle";
const GENERATOR_DOMAIN: &[u8] = b"pair-shuffle/generators";
const LABEL: &str = "pair-shuffle";

// witness layout of the closing sigma proof
const R_BAR: usize = 0;
const R_HAT: usize = 1;
const R_TILDE: usize = 2;
const R_PRIME: usize = 3;
const CHAIN_START: usize = 4;

// ark-serialize writes vector lengths as u64
const LEN_PREFIX: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PairShuffleProof<C: CurveGroup> {
    /// Permutation commitments `c_{π(i)} = r_{π(i)}·G + h_i`.
    pub commitments: Vec<C>,
    /// Chain `ĉ_i = r̂_i·G + u_{π(i)}·ĉ_{i-1}` starting from `ĉ_{-1} = h_0`.
    pub chain: Vec<C>,
    pub sigma: SigmaProof<C::ScalarField>,
}

struct Generators<C> {
    h0: C,
    hs: Vec<C>,
}

impl<C: CurveGroup> Generators<C> {
    fn new(n: usize) -> Self {
        let mut all = derive_generators::<C>(GENERATOR_DOMAIN, n + 1);
        let hs = all.split_off(1);
        Self { h0: all[0], hs }
    }
}

/// Public inputs of the shuffle.
#[derive(Clone, Copy)]
pub(crate) struct PairShuffleInstance<'a, C> {
    pub g: C,
    pub h: C,
    pub x: &'a [C],
    pub y: &'a [C],
    pub xbar: &'a [C],
    pub ybar: &'a [C],
}

impl<'a, C: CurveGroup> PairShuffleInstance<'a, C> {
    fn len(&self) -> Result<usize, ProofError> {
        let n = ensure_same_len(
            "pair shuffle",
            &[self.x.len(), self.y.len(), self.xbar.len(), self.ybar.len()],
        )?;
        if n == 0 {
            return Err(ProofError::Empty("pair shuffle"));
        }
        Ok(n)
    }

    /// Transcript after the permutation commitments, and the challenges `u` it yields.
    fn challenges(&self, commitments: &[C]) -> Result<(Transcript, Vec<C::ScalarField>), ProofError> {
        let mut transcript = Transcript::new(PROTOCOL);
        transcript.append_point(b"g", &self.g)?;
        transcript.append_point(b"h", &self.h)?;
        transcript.append_points(b"x", self.x)?;
        transcript.append_points(b"y", self.y)?;
        transcript.append_points(b"xbar", self.xbar)?;
        transcript.append_points(b"ybar", self.ybar)?;
        transcript.append_points(b"commitments", commitments)?;
        let u = transcript.challenge_scalars(b"u", self.x.len());
        Ok((transcript, u))
    }

    fn statement(
        &self,
        generators: &Generators<C>,
        commitments: &[C],
        chain: &[C],
        u: &[C::ScalarField],
    ) -> Result<Statement<C>, ProofError> {
        let n = u.len();
        let base = C::generator();
        let u_prime = |i: usize| CHAIN_START + n + i;

        let sum_commitments: C = commitments.iter().sum();
        let sum_hs: C = generators.hs.iter().sum();
        let product_u: C::ScalarField = u.iter().product();
        let last_chain = chain.last().copied().ok_or(ProofError::Empty("shuffle chain"))?;
        let weighted = |points: &[C]| -> C { points.iter().zip(u).map(|(p, w)| *p * w).sum() };

        let mut relations = vec![
            Relation::representation(sum_commitments - sum_hs, [(R_BAR, base)]),
            Relation::representation(last_chain - generators.h0 * product_u, [(R_HAT, base)]),
            Relation::representation(
                weighted(commitments),
                std::iter::once((R_TILDE, base))
                    .chain(generators.hs.iter().enumerate().map(|(i, h)| (u_prime(i), *h))),
            ),
            Relation::representation(
                weighted(self.x),
                std::iter::once((R_PRIME, -self.h))
                    .chain(self.xbar.iter().enumerate().map(|(i, p)| (u_prime(i), *p))),
            ),
            Relation::representation(
                weighted(self.y),
                std::iter::once((R_PRIME, -self.g))
                    .chain(self.ybar.iter().enumerate().map(|(i, p)| (u_prime(i), *p))),
            ),
        ];
        let mut previous = generators.h0;
        for (i, link) in chain.iter().enumerate() {
            relations.push(Relation::representation(
                *link,
                [(CHAIN_START + i, base), (u_prime(i), previous)],
            ));
            previous = *link;
        }
        Statement::new(LABEL, CHAIN_START + 2 * n, Relation::and(relations))
    }
}

impl<C: CurveGroup> PairShuffleProof<C> {
    /// `pi[i]` is the input index that landed at output `i`, rerandomized with `beta[i]`.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(n = instance.x.len()))]
    pub(crate) fn prove<R: Rng + ?Sized>(
        instance: &PairShuffleInstance<'_, C>,
        pi: &[usize],
        beta: &[C::ScalarField],
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let n = instance.len()?;
        validate_permutation(pi, n)?;
        ensure_same_len("shuffle rerandomizers", &[n, beta.len()])?;

        let base = C::generator();
        let generators = Generators::<C>::new(n);

        let r: Vec<C::ScalarField> = (0..n).map(|_| C::ScalarField::rand(rng)).collect();
        let mut commitments = vec![C::zero(); n];
        for (i, &source) in pi.iter().enumerate() {
            commitments[source] = base * r[source] + generators.hs[i];
        }

        let (mut transcript, u) = instance.challenges(&commitments)?;
        let u_prime: Vec<C::ScalarField> = pi.iter().map(|&source| u[source]).collect();

        let r_hat: Vec<C::ScalarField> = (0..n).map(|_| C::ScalarField::rand(rng)).collect();
        let mut chain = Vec::with_capacity(n);
        let mut previous = generators.h0;
        for (rh, up) in r_hat.iter().zip(&u_prime) {
            previous = base * rh + previous * up;
            chain.push(previous);
        }
        transcript.append_points(b"chain", &chain)?;

        // v_i = Π_{k>i} u'_k folds the chain randomness into one exponent.
        let mut v = C::ScalarField::one();
        let mut chain_randomness = C::ScalarField::zero();
        for (rh, up) in r_hat.iter().zip(&u_prime).rev() {
            chain_randomness += *rh * v;
            v *= up;
        }

        let mut witnesses: Vec<C::ScalarField> = Vec::with_capacity(CHAIN_START + 2 * n);
        witnesses.push(r.iter().sum());
        witnesses.push(chain_randomness);
        witnesses.push(r.iter().zip(&u).map(|(rj, uj)| *rj * uj).sum());
        witnesses.push(beta.iter().zip(&u_prime).map(|(b, up)| *b * up).sum());
        witnesses.extend_from_slice(&r_hat);
        witnesses.extend_from_slice(&u_prime);

        let statement = instance.statement(&generators, &commitments, &chain, &u)?;
        let sigma = SigmaProof::prove_in(transcript, &statement, &witnesses, rng)?;
        tracing::debug!(target: LOG_TARGET, n, "pair shuffle proof created");
        Ok(Self {
            commitments,
            chain,
            sigma,
        })
    }

    /// Size of the compressed encoding of a proof over `n` pairs.
    pub(crate) fn encoded_len(n: usize) -> usize {
        let point = C::zero().compressed_size();
        let scalar = C::ScalarField::zero().compressed_size();
        3 * LEN_PREFIX + 2 * n * point + (1 + CHAIN_START + 2 * n) * scalar
    }

    /// Decode a proof over `n` pairs.
    ///
    /// The total size and every vector length prefix are checked before decoding,
    /// so untrusted bytes never drive an allocation.
    pub(crate) fn from_bytes(bytes: &[u8], n: usize) -> Result<Self, ProofError> {
        let expected = Self::encoded_len(n);
        if bytes.len() != expected {
            return Err(ProofError::LengthMismatch {
                context: "shuffle proof bytes",
                expected,
                actual: bytes.len(),
            });
        }
        let point = C::zero().compressed_size();
        let scalar = C::ScalarField::zero().compressed_size();
        // (offset of a vector length prefix, length it must declare)
        let prefixes = [
            (0, n),
            (LEN_PREFIX + n * point, n),
            (2 * LEN_PREFIX + 2 * n * point + scalar, CHAIN_START + 2 * n),
        ];
        for (offset, len) in prefixes {
            let prefix = bytes
                .get(offset..offset + LEN_PREFIX)
                .ok_or(ProofError::Empty("shuffle proof length prefix"))?;
            let declared = u64::deserialize_compressed(prefix)?;
            if declared != len as u64 {
                return Err(ProofError::LengthMismatch {
                    context: "shuffle proof vector",
                    expected: len,
                    actual: usize::try_from(declared).unwrap_or(usize::MAX),
                });
            }
        }
        Ok(Self::deserialize_compressed(bytes)?)
    }

    pub(crate) fn verify(&self, instance: &PairShuffleInstance<'_, C>) -> bool {
        self.check(instance).unwrap_or_else(|err| {
            tracing::warn!(target: LOG_TARGET, %err, "pair shuffle verification aborted");
            false
        })
    }

    fn check(&self, instance: &PairShuffleInstance<'_, C>) -> Result<bool, ProofError> {
        let n = instance.len()?;
        if self.commitments.len() != n || self.chain.len() != n {
            return Ok(false);
        }
        let generators = Generators::<C>::new(n);
        let (mut transcript, u) = instance.challenges(&self.commitments)?;
        transcript.append_points(b"chain", &self.chain)?;
        let statement = instance.statement(&generators, &self.commitments, &self.chain, &u)?;
        Ok(self.sigma.verify_in(transcript, &statement))
    }
}
