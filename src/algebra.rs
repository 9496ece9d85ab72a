//! Thin helpers over the arkworks group and pairing traits that every proof relies on:
//! hashing into scalars, deriving independent generators and canonical point bytes.

use ark_ec::{AffineRepr, CurveGroup, PrimeGroup};
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use sha3::{Digest, Sha3_512};

use crate::error::ProofError;

const DOMAIN_TAG: &[u8] = b"unlynx-proofs/v1";

/// Compressed canonical encoding of a group element (or any arkworks value).
pub fn point_bytes<P: CanonicalSerialize>(point: &P) -> Result<Vec<u8>, ProofError> {
    let mut bytes = Vec::with_capacity(point.compressed_size());
    point.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

/// Hash length-prefixed byte strings under `domain` into a scalar.
pub fn hash_to_scalar<F: PrimeField>(domain: &[u8], parts: &[&[u8]]) -> F {
    let mut hasher = Sha3_512::new();
    hasher.update(DOMAIN_TAG);
    write_bytes(&mut hasher, domain);
    for part in parts {
        write_bytes(&mut hasher, part);
    }
    F::from_le_bytes_mod_order(&hasher.finalize())
}

fn write_bytes(hasher: &mut Sha3_512, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Encode a signed integer as `v·G`.
pub fn int_to_point<C: CurveGroup>(value: i64) -> C {
    let magnitude = C::generator() * C::ScalarField::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Derive `count` group elements whose discrete logs relative to each other are unknown.
///
/// Each element is found by try-and-increment: SHAKE256 output is interpreted as a
/// compressed point, the cofactor is cleared and the identity is rejected.
pub fn derive_generators<C: CurveGroup>(domain: &[u8], count: usize) -> Vec<C> {
    (0..count)
        .map(|index| derive_generator(domain, index as u64))
        .collect()
}

fn derive_generator<C: CurveGroup>(domain: &[u8], index: u64) -> C {
    use sha3::digest::{ExtendableOutput, Update, XofReader};
    use sha3::Shake256;

    let size = C::Affine::generator().compressed_size();
    let mut buffer = vec![0u8; size];
    let mut counter: u64 = 0;
    loop {
        let mut xof = Shake256::default();
        Update::update(&mut xof, DOMAIN_TAG);
        Update::update(&mut xof, &(domain.len() as u64).to_be_bytes());
        Update::update(&mut xof, domain);
        Update::update(&mut xof, &index.to_be_bytes());
        Update::update(&mut xof, &counter.to_be_bytes());
        xof.finalize_xof().read(&mut buffer);

        if let Some(candidate) = C::Affine::from_random_bytes(&buffer) {
            let point = candidate.clear_cofactor().into_group();
            if !point.is_zero() {
                return point;
            }
        }
        counter += 1;
    }
}

/// Horner evaluation `Σ weight^j · points[j]` with ascending powers starting at `weight^0`.
pub fn horner_points<'a, C, I>(points: I, weight: C::ScalarField) -> C
where
    C: PrimeGroup + 'a,
    I: DoubleEndedIterator<Item = &'a C>,
{
    points
        .rev()
        .fold(C::zero(), |acc, point| acc * weight + point)
}

/// Scalar counterpart of [`horner_points`].
pub fn horner_scalars<'a, F, I>(scalars: I, weight: F) -> F
where
    F: PrimeField,
    I: DoubleEndedIterator<Item = &'a F>,
{
    scalars.rev().fold(F::zero(), |acc, scalar| acc * weight + scalar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Curve, Scalar};
    use ark_ff::{Field, Zero};

    #[test]
    fn hash_to_scalar_is_domain_separated() {
        let a: Scalar = hash_to_scalar(b"one", &[b"payload".as_slice()]);
        let b: Scalar = hash_to_scalar(b"two", &[b"payload".as_slice()]);
        let again: Scalar = hash_to_scalar(b"one", &[b"payload".as_slice()]);
        assert_eq!(a, again);
        assert_ne!(a, b);
        // length prefixes keep part boundaries significant
        let split: Scalar = hash_to_scalar(b"one", &[b"pay".as_slice(), b"load".as_slice()]);
        assert_ne!(a, split);
    }

    #[test]
    fn generators_are_distinct_and_deterministic() {
        let gens = derive_generators::<Curve>(b"test", 4);
        let again = derive_generators::<Curve>(b"test", 4);
        assert_eq!(gens, again);
        for (i, a) in gens.iter().enumerate() {
            assert!(!a.is_zero());
            assert_ne!(*a, Curve::generator());
            for b in gens.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn generators_work_on_g2() {
        let gens = derive_generators::<ark_bn254::G2Projective>(b"g2", 2);
        assert_ne!(gens[0], gens[1]);
        assert!(gens[0].into_affine().is_in_correct_subgroup_assuming_on_curve());
    }

    #[test]
    fn int_to_point_handles_sign() {
        let g = Curve::generator();
        assert_eq!(int_to_point::<Curve>(5), g * Scalar::from(5u64));
        assert_eq!(int_to_point::<Curve>(-5) + int_to_point::<Curve>(5), Curve::zero());
        assert!(int_to_point::<Curve>(0).is_zero());
    }

    #[test]
    fn horner_matches_explicit_powers() {
        let g = Curve::generator();
        let points = [g, g * Scalar::from(2u64), g * Scalar::from(3u64)];
        let e = Scalar::from(10u64);
        let expected = points[0] + points[1] * e + points[2] * e.square();
        assert_eq!(horner_points(points.iter(), e), expected);

        let scalars = [Scalar::from(1u64), Scalar::from(2u64), Scalar::from(3u64)];
        assert_eq!(horner_scalars(scalars.iter(), e), Scalar::from(321u64));
    }
}
