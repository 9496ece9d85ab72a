//! Fixtures shared by the unit tests.

use ark_bn254::{Fr, G1Projective};
use ark_ec::PrimeGroup;
use ark_std::UniformRand;
use rand::{rngs::StdRng, SeedableRng};

pub type Curve = G1Projective;
pub type Scalar = Fr;

/// Deterministic RNG so failures are reproducible.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Returns `(secret, secret·G)`.
pub fn keypair(rng: &mut StdRng) -> (Scalar, Curve) {
    let secret = Scalar::rand(rng);
    (secret, Curve::generator() * secret)
}

/// Helpers shared across test modules.
pub mod serde {
    use std::fmt::Debug;

    /// Assert that a value survives a serde_json round-trip using structural equality.
    pub fn assert_round_trip_eq<T>(value: &T)
    where
        T: ::serde::Serialize + ::serde::de::DeserializeOwned + PartialEq + Debug,
    {
        let json = serde_json::to_string(value)
            .expect("serialization should succeed during round-trip testing");
        let restored: T = serde_json::from_str(&json)
            .expect("deserialization should succeed during round-trip testing");
        assert_eq!(restored, *value, "serde_json round-trip altered the value");
    }
}
