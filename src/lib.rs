pub mod algebra;
pub mod batch;
pub mod ciphertext;
pub mod config;
pub mod crypto_serde;
pub mod error;
pub mod logging;
pub mod proofs;
pub mod range;
pub mod records;
pub mod shuffle;
pub mod sigma;

#[cfg(test)]
pub mod test_utils;

pub use ciphertext::{CipherText, CipherVector};
pub use config::ProverConfig;
pub use error::ProofError;
pub use proofs::*;
pub use range::{PublishRangeProof, PublishSignature};
pub use records::{FilteredResponse, FilteredResponseDet, GroupingKey, ProcessResponse};
pub use shuffle::PublishedShufflingProof;
