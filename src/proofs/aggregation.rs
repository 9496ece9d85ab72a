use std::collections::BTreeMap;

use ark_ec::CurveGroup;
use serde::{Deserialize, Serialize};

use crate::records::{add_in_map, FilteredResponse, FilteredResponseDet, GroupingKey};

const LOG_TARGET: &str = "unlynx_proofs::proofs::aggregation";

type Grouped<C> = BTreeMap<GroupingKey, FilteredResponse<C>>;

/// A server's local grouping: the tagged responses it received and the per-group sums it claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedAggregationProof<C: CurveGroup> {
    pub filtered_responses: Vec<FilteredResponseDet<C>>,
    pub aggregation_results: Grouped<C>,
}

/// Merge of a child's grouped results and locally tagged responses into the claimed result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PublishedCollectiveAggregationProof<C: CurveGroup> {
    pub aggregation1: Grouped<C>,
    pub aggregation2: Vec<FilteredResponseDet<C>>,
    pub aggregation_results: Grouped<C>,
}

impl<C: CurveGroup> PublishedAggregationProof<C> {
    pub fn create(
        filtered_responses: Vec<FilteredResponseDet<C>>,
        aggregation_results: Grouped<C>,
    ) -> Self {
        Self {
            filtered_responses,
            aggregation_results,
        }
    }

    pub fn verify(&self) -> bool {
        regroup(std::iter::empty(), &self.filtered_responses)
            .is_some_and(|expected| groups_match(&expected, &self.aggregation_results))
    }
}

impl<C: CurveGroup> PublishedCollectiveAggregationProof<C> {
    pub fn create(
        aggregation1: Grouped<C>,
        aggregation2: Vec<FilteredResponseDet<C>>,
        aggregation_results: Grouped<C>,
    ) -> Self {
        Self {
            aggregation1,
            aggregation2,
            aggregation_results,
        }
    }

    pub fn verify(&self) -> bool {
        regroup(self.aggregation1.iter(), &self.aggregation2)
            .is_some_and(|expected| groups_match(&expected, &self.aggregation_results))
    }
}

/// Rebuild the grouped map from already-grouped entries followed by tagged responses.
fn regroup<'a, C: CurveGroup>(
    grouped: impl Iterator<Item = (&'a GroupingKey, &'a FilteredResponse<C>)>,
    responses: &'a [FilteredResponseDet<C>],
) -> Option<Grouped<C>> {
    let mut map = BTreeMap::new();
    let entries = grouped.chain(responses.iter().map(|r| (&r.det_tag_group_by, &r.fr)));
    for (key, fr) in entries {
        if let Err(err) = add_in_map(&mut map, key.clone(), fr) {
            tracing::warn!(target: LOG_TARGET, %key, %err, "inconsistent aggregating attributes");
            return None;
        }
    }
    Some(map)
}

fn groups_match<C: CurveGroup>(expected: &Grouped<C>, claimed: &Grouped<C>) -> bool {
    if expected.len() != claimed.len() {
        tracing::warn!(
            target: LOG_TARGET,
            expected = expected.len(),
            claimed = claimed.len(),
            "group count differs"
        );
        return false;
    }
    expected.iter().all(|(key, fr)| match claimed.get(key) {
        Some(other) if fr.same_ciphertexts(other) => true,
        Some(_) => {
            tracing::warn!(target: LOG_TARGET, %key, "group sum differs");
            false
        }
        None => {
            tracing::warn!(target: LOG_TARGET, %key, "group missing from claimed result");
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphertext::encrypt_int_vector;
    use crate::test_utils::{keypair, seeded_rng, Curve};
    use ark_ec::PrimeGroup;
    use rand::rngs::StdRng;

    fn response(rng: &mut StdRng, pk: Curve, key: &str, values: &[i64]) -> FilteredResponseDet<Curve> {
        let (group_by_enc, _) = encrypt_int_vector(pk, &[0], rng);
        let (aggregating, _) = encrypt_int_vector(pk, values, rng);
        FilteredResponseDet {
            det_tag_group_by: key.into(),
            fr: FilteredResponse::new(group_by_enc, aggregating),
        }
    }

    fn aggregate(responses: &[FilteredResponseDet<Curve>]) -> Grouped<Curve> {
        let mut map = BTreeMap::new();
        for r in responses {
            add_in_map(&mut map, r.det_tag_group_by.clone(), &r.fr).unwrap();
        }
        map
    }

    #[test]
    fn honest_aggregation_verifies() {
        let mut rng = seeded_rng(70);
        let (sk, pk) = keypair(&mut rng);
        let responses = vec![
            response(&mut rng, pk, "a", &[1, 2]),
            response(&mut rng, pk, "b", &[3, 4]),
            response(&mut rng, pk, "a", &[5, 6]),
        ];
        let results = aggregate(&responses);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[&GroupingKey::from("a")].aggregating_attributes[1].decrypt_int(sk, 20),
            Some(8)
        );

        let proof = PublishedAggregationProof::create(responses, results);
        assert!(proof.verify());
        crate::test_utils::serde::assert_round_trip_eq(&proof);
    }

    #[test]
    fn altered_or_missing_groups_fail() {
        let mut rng = seeded_rng(71);
        let (_, pk) = keypair(&mut rng);
        let responses = vec![
            response(&mut rng, pk, "a", &[1]),
            response(&mut rng, pk, "b", &[2]),
        ];
        let results = aggregate(&responses);

        let mut altered = results.clone();
        if let Some(fr) = altered.get_mut(&GroupingKey::from("b")) {
            fr.aggregating_attributes[0].c += Curve::generator();
        }
        assert!(!PublishedAggregationProof::create(responses.clone(), altered).verify());

        let mut missing = results.clone();
        missing.remove(&GroupingKey::from("a"));
        assert!(!PublishedAggregationProof::create(responses.clone(), missing).verify());

        let mut renamed = results;
        if let Some(fr) = renamed.remove(&GroupingKey::from("a")) {
            renamed.insert(GroupingKey::from("c"), fr);
        }
        assert!(!PublishedAggregationProof::create(responses, renamed).verify());
    }

    #[test]
    fn collective_aggregation_merges_both_sources() {
        let mut rng = seeded_rng(72);
        let (sk, pk) = keypair(&mut rng);
        let child = aggregate(&[
            response(&mut rng, pk, "a", &[1]),
            response(&mut rng, pk, "b", &[2]),
        ]);
        let local = vec![
            response(&mut rng, pk, "a", &[10]),
            response(&mut rng, pk, "c", &[20]),
        ];

        let mut results = child.clone();
        for r in &local {
            add_in_map(&mut results, r.det_tag_group_by.clone(), &r.fr).unwrap();
        }
        assert_eq!(
            results[&GroupingKey::from("a")].aggregating_attributes[0].decrypt_int(sk, 20),
            Some(11)
        );

        let proof = PublishedCollectiveAggregationProof::create(child.clone(), local.clone(), results.clone());
        assert!(proof.verify());

        let mut extra = results;
        extra.insert(GroupingKey::from("d"), local[0].fr.clone());
        assert!(!PublishedCollectiveAggregationProof::create(child, local, extra).verify());
    }

    #[test]
    fn ragged_responses_are_rejected() {
        let mut rng = seeded_rng(73);
        let (_, pk) = keypair(&mut rng);
        let responses = vec![
            response(&mut rng, pk, "a", &[1, 2]),
            response(&mut rng, pk, "a", &[3]),
        ];
        let claimed = aggregate(&responses[..1]);
        assert!(!PublishedAggregationProof::create(responses, claimed).verify());
    }
}
