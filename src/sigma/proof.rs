use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Statement, Transcript};
use crate::error::ProofError;

const LOG_TARGET: &str = "unlynx_proofs::sigma";
const PROTOCOL: &[u8] = b"generalized-schnorr";

/// Non-interactive generalized Schnorr proof.
///
/// Commitments are not stored; the verifier rebuilds them as
/// `T = Σ z_i·base_i + c·target` and checks that they hash back to `challenge`.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, CanonicalSerialize, CanonicalDeserialize,
)]
#[serde(bound = "")]
pub struct SigmaProof<F: PrimeField> {
    #[serde(with = "crate::crypto_serde::field")]
    pub challenge: F,
    /// `z_i = blinding_i - c·witness_i`, one per witness.
    #[serde(with = "crate::crypto_serde::field_vec")]
    pub responses: Vec<F>,
}

impl<F: PrimeField> SigmaProof<F> {
    pub fn prove<C, R>(
        statement: &Statement<C>,
        witnesses: &[F],
        rng: &mut R,
    ) -> Result<Self, ProofError>
    where
        C: CurveGroup<ScalarField = F>,
        R: Rng + ?Sized,
    {
        Self::prove_in(Transcript::new(PROTOCOL), statement, witnesses, rng)
    }

    /// Prove inside a transcript that already carries protocol context, such as
    /// values a statement was derived from.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(label = statement.label))]
    pub fn prove_in<C, R>(
        transcript: Transcript,
        statement: &Statement<C>,
        witnesses: &[F],
        rng: &mut R,
    ) -> Result<Self, ProofError>
    where
        C: CurveGroup<ScalarField = F>,
        R: Rng + ?Sized,
    {
        if witnesses.len() != statement.num_witnesses {
            return Err(ProofError::LengthMismatch {
                context: "sigma witnesses",
                expected: statement.num_witnesses,
                actual: witnesses.len(),
            });
        }
        if !statement.relation.holds(witnesses) {
            return Err(ProofError::InvalidInput(format!(
                "witnesses do not satisfy {}",
                statement.label
            )));
        }

        let blindings: Vec<F> = (0..witnesses.len()).map(|_| F::rand(rng)).collect();
        let commitments: Vec<C> = statement
            .relation
            .atoms()
            .into_iter()
            .map(|(_, terms)| {
                terms
                    .iter()
                    .map(|term| term.base * blindings[term.witness])
                    .sum()
            })
            .collect();

        let challenge = fiat_shamir(transcript, statement, &commitments)?;
        let responses = blindings
            .iter()
            .zip(witnesses)
            .map(|(blinding, witness)| *blinding - challenge * witness)
            .collect();

        tracing::debug!(target: LOG_TARGET, atoms = commitments.len(), "sigma proof created");
        Ok(Self {
            challenge,
            responses,
        })
    }

    pub fn verify<C>(&self, statement: &Statement<C>) -> bool
    where
        C: CurveGroup<ScalarField = F>,
    {
        self.verify_in(Transcript::new(PROTOCOL), statement)
    }

    /// Counterpart of [`SigmaProof::prove_in`]; `transcript` must be in the prover's state.
    pub fn verify_in<C>(&self, transcript: Transcript, statement: &Statement<C>) -> bool
    where
        C: CurveGroup<ScalarField = F>,
    {
        self.check(transcript, statement).unwrap_or_else(|err| {
            tracing::warn!(target: LOG_TARGET, label = statement.label, %err, "sigma verification aborted");
            false
        })
    }

    fn check<C>(&self, transcript: Transcript, statement: &Statement<C>) -> Result<bool, ProofError>
    where
        C: CurveGroup<ScalarField = F>,
    {
        if self.responses.len() != statement.num_witnesses {
            return Ok(false);
        }
        let mut commitments = Vec::new();
        for (target, terms) in statement.relation.atoms() {
            let mut commitment = *target * self.challenge;
            for term in terms {
                match self.responses.get(term.witness) {
                    Some(response) => commitment += term.base * response,
                    None => return Ok(false),
                }
            }
            commitments.push(commitment);
        }
        Ok(fiat_shamir(transcript, statement, &commitments)? == self.challenge)
    }
}

fn fiat_shamir<C: CurveGroup>(
    mut transcript: Transcript,
    statement: &Statement<C>,
    commitments: &[C],
) -> Result<C::ScalarField, ProofError> {
    statement.absorb(&mut transcript)?;
    transcript.append_points(b"commitment", commitments)?;
    Ok(transcript.challenge_scalar(b"challenge"))
}
