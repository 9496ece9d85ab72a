//! Encrypted records exchanged between servers and the grouping key used to bucket them.

use std::collections::BTreeMap;
use std::fmt;

use ark_ec::CurveGroup;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

use crate::algebra::point_bytes;
use crate::ciphertext::{add_vectors, CipherText, CipherVector};
use crate::error::ProofError;

/// A full record as it travels through the shuffle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: CanonicalSerialize",
    deserialize = "C: CanonicalDeserialize"
))]
pub struct ProcessResponse<C: CurveGroup> {
    pub group_by_enc: CipherVector<C>,
    pub aggregating_attributes: CipherVector<C>,
    pub where_enc: CipherVector<C>,
}

impl<C: CurveGroup> ProcessResponse<C> {
    pub fn new(
        group_by_enc: CipherVector<C>,
        aggregating_attributes: CipherVector<C>,
        where_enc: CipherVector<C>,
    ) -> Self {
        Self {
            group_by_enc,
            aggregating_attributes,
            where_enc,
        }
    }

    /// Attributes in compression order: group-by, aggregating, where.
    pub fn attributes(&self) -> impl DoubleEndedIterator<Item = &CipherText<C>> + '_ {
        self.group_by_enc
            .iter()
            .chain(self.aggregating_attributes.iter())
            .chain(self.where_enc.iter())
    }

    /// Column lengths `(group-by, aggregating, where)`.
    pub fn layout(&self) -> (usize, usize, usize) {
        (
            self.group_by_enc.len(),
            self.aggregating_attributes.len(),
            self.where_enc.len(),
        )
    }

    pub fn attribute_count(&self) -> usize {
        self.group_by_enc.len() + self.aggregating_attributes.len() + self.where_enc.len()
    }

    /// Apply `f` to every attribute, keeping the record layout.
    pub fn map_attributes(&self, mut f: impl FnMut(usize, &CipherText<C>) -> CipherText<C>) -> Self {
        let mut index = 0;
        let mut map_vec = |vector: &CipherVector<C>| -> CipherVector<C> {
            vector
                .iter()
                .map(|ct| {
                    let mapped = f(index, ct);
                    index += 1;
                    mapped
                })
                .collect()
        };
        let group_by_enc = map_vec(&self.group_by_enc);
        let aggregating_attributes = map_vec(&self.aggregating_attributes);
        let where_enc = map_vec(&self.where_enc);
        Self::new(group_by_enc, aggregating_attributes, where_enc)
    }
}

/// A record after filtering, ready for aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: CanonicalSerialize",
    deserialize = "C: CanonicalDeserialize"
))]
pub struct FilteredResponse<C: CurveGroup> {
    pub group_by_enc: CipherVector<C>,
    pub aggregating_attributes: CipherVector<C>,
}

impl<C: CurveGroup> FilteredResponse<C> {
    pub fn new(group_by_enc: CipherVector<C>, aggregating_attributes: CipherVector<C>) -> Self {
        Self {
            group_by_enc,
            aggregating_attributes,
        }
    }

    /// Field-by-field point equality.
    pub fn same_ciphertexts(&self, other: &Self) -> bool {
        fn same<C: CurveGroup>(a: &[CipherText<C>], b: &[CipherText<C>]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.k == y.k && x.c == y.c)
        }
        same(&self.group_by_enc, &other.group_by_enc)
            && same(&self.aggregating_attributes, &other.aggregating_attributes)
    }
}

/// A filtered record paired with the grouping key derived from its deterministic tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: CanonicalSerialize",
    deserialize = "C: CanonicalDeserialize"
))]
pub struct FilteredResponseDet<C: CurveGroup> {
    pub det_tag_group_by: GroupingKey,
    pub fr: FilteredResponse<C>,
}

/// Canonical identifier of a group: hex of the compressed deterministic tags, comma separated.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupingKey(pub String);

impl GroupingKey {
    pub fn from_tags<C: CurveGroup>(tags: &[C]) -> Result<Self, ProofError> {
        let parts = tags
            .iter()
            .map(|tag| point_bytes(tag).map(hex::encode))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(parts.join(",")))
    }
}

impl fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupingKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Insert `fr` under `key`, or fold its aggregating attributes into the existing entry.
pub fn add_in_map<C: CurveGroup>(
    map: &mut BTreeMap<GroupingKey, FilteredResponse<C>>,
    key: GroupingKey,
    fr: &FilteredResponse<C>,
) -> Result<(), ProofError> {
    match map.get_mut(&key) {
        Some(existing) => {
            existing.aggregating_attributes =
                add_vectors(&existing.aggregating_attributes, &fr.aggregating_attributes)?;
        }
        None => {
            map.insert(key, fr.clone());
        }
    }
    Ok(())
}
