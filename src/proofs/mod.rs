//! Proofs that one server transformed encrypted records honestly.
//!
//! Key switching, add/remove server, deterministic tagging and det-tag addition are
//! zero-knowledge sigma proofs. Aggregation and simple addition are public audits
//! that recompute the claimed result from the declared inputs.

mod add_rm;
mod aggregation;
mod det_tag;
mod det_tag_addition;
mod key_switch;
mod simple_addition;

pub use add_rm::{AddRmProof, PublishedAddRmProof};
pub use aggregation::{PublishedAggregationProof, PublishedCollectiveAggregationProof};
pub use det_tag::{DeterministicTaggingProof, PublishedDeterministicTaggingProof};
pub use det_tag_addition::PublishedDetTagAdditionProof;
pub use key_switch::{PublishedSwitchKeyProof, SwitchKeyProof};
pub use simple_addition::PublishedSimpleAdditionProof;

use ark_ec::CurveGroup;

use crate::error::ProofError;
use crate::sigma::{SigmaProof, Statement};

const LOG_TARGET: &str = "unlynx_proofs::proofs";

/// Verify `proof` against a statement that may have failed to build.
fn check_statement<C: CurveGroup>(
    proof: &SigmaProof<C::ScalarField>,
    statement: Result<Statement<C>, ProofError>,
) -> bool {
    match statement {
        Ok(statement) => proof.verify(&statement),
        Err(err) => {
            tracing::warn!(target: LOG_TARGET, %err, "could not build statement");
            false
        }
    }
}

/// Log and swallow a shape error on the verifier path.
fn shape_ok(context: &'static str, shape: Result<(), ProofError>) -> bool {
    match shape {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(target: LOG_TARGET, context, %err, "rejecting malformed published proof");
            false
        }
    }
}
