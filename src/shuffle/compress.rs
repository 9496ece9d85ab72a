use ark_ec::CurveGroup;
use ark_ff::PrimeField;

use crate::algebra::{hash_to_scalar, horner_points, horner_scalars, point_bytes};
use crate::error::ProofError;
use crate::records::ProcessResponse;

const TAG_DOMAIN: &[u8] = b"shuffle/compression-tag";

/// Compression weight `e = H(seed, K_1, C_1, ..., K_n, C_n)` over one record.
pub fn cipher_vector_tag<C: CurveGroup>(
    record: &ProcessResponse<C>,
    seed: C,
) -> Result<C::ScalarField, ProofError> {
    let mut parts = vec![point_bytes(&seed)?];
    for ct in record.attributes() {
        parts.push(point_bytes(&ct.k)?);
        parts.push(point_bytes(&ct.c)?);
    }
    let slices: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
    Ok(hash_to_scalar(TAG_DOMAIN, &slices))
}

/// Fold a record into `(Σ e^j·C_j, Σ e^j·K_j)`.
pub fn compress_process_response<C: CurveGroup>(
    record: &ProcessResponse<C>,
    e: C::ScalarField,
) -> (C, C) {
    (
        horner_points(record.attributes().map(|ct| &ct.c), e),
        horner_points(record.attributes().map(|ct| &ct.k), e),
    )
}

pub fn compress_list<C: CurveGroup>(
    list: &[ProcessResponse<C>],
    e: C::ScalarField,
) -> (Vec<C>, Vec<C>) {
    list.iter()
        .map(|record| compress_process_response(record, e))
        .unzip()
}

/// Fold each record's per-attribute rerandomizers with the same weights.
pub fn compress_beta<F: PrimeField>(beta: &[Vec<F>], e: F) -> Vec<F> {
    beta.iter().map(|row| horner_scalars(row.iter(), e)).collect()
}
