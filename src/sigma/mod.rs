//! Generalized Schnorr proofs for conjunctions of discrete-log representations,
//! made non-interactive with a SHA3 transcript.

mod proof;
mod relation;
mod transcript;

pub use proof::SigmaProof;
pub use relation::{Relation, Statement, Term};
pub use transcript::Transcript;
