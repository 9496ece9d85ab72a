//! Fan-out helpers applying a per-element prover across vectors and keyed maps,
//! and short-circuiting verification loops.
//!
//! Every chunk (or key) gets its own `StdRng` seeded from the caller's RNG before any
//! work starts, so the sequential and parallel paths produce identical proofs.

use std::collections::BTreeMap;
use std::fmt::Display;

use ark_std::rand::RngCore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::ProverConfig;
use crate::error::ProofError;

const LOG_TARGET: &str = "unlynx_proofs::batch";

type Seed = <StdRng as SeedableRng>::Seed;

fn draw_seeds<R: RngCore + ?Sized>(rng: &mut R, count: usize) -> Vec<Seed> {
    (0..count)
        .map(|_| {
            let mut seed = Seed::default();
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect()
}

/// Run `prove` on every element, preserving order.
#[tracing::instrument(target = LOG_TARGET, skip_all, fields(len = items.len(), parallel = config.parallelize))]
pub fn create_indexed<T, P, R, F>(
    config: &ProverConfig,
    items: &[T],
    rng: &mut R,
    prove: F,
) -> Result<Vec<P>, ProofError>
where
    T: Sync,
    P: Send,
    R: RngCore + ?Sized,
    F: Fn(&T, &mut StdRng) -> Result<P, ProofError> + Sync,
{
    config.validate()?;
    let chunk_count = items.len().div_ceil(config.chunk_size);
    let seeds = draw_seeds(rng, chunk_count);

    let run_chunk = |(chunk, seed): (&[T], &Seed)| -> Result<Vec<P>, ProofError> {
        let mut chunk_rng = StdRng::from_seed(*seed);
        chunk.iter().map(|item| prove(item, &mut chunk_rng)).collect()
    };

    let chunks: Vec<Vec<P>> = if config.parallelize {
        items
            .par_chunks(config.chunk_size)
            .zip(seeds.par_iter())
            .map(run_chunk)
            .collect::<Result<_, _>>()?
    } else {
        items
            .chunks(config.chunk_size)
            .zip(seeds.iter())
            .map(run_chunk)
            .collect::<Result<_, _>>()?
    };
    Ok(chunks.into_iter().flatten().collect())
}

/// Run `prove` once per key; each key is an independent task whose result is merged
/// by the collector.
#[tracing::instrument(target = LOG_TARGET, skip_all, fields(len = items.len(), parallel = config.parallelize))]
pub fn create_keyed<K, T, P, R, F>(
    config: &ProverConfig,
    items: &BTreeMap<K, T>,
    rng: &mut R,
    prove: F,
) -> Result<BTreeMap<K, P>, ProofError>
where
    K: Ord + Clone + Send + Sync,
    T: Sync,
    P: Send,
    R: RngCore + ?Sized,
    F: Fn(&K, &T, &mut StdRng) -> Result<P, ProofError> + Sync,
{
    config.validate()?;
    let jobs: Vec<(&K, &T, Seed)> = items
        .iter()
        .zip(draw_seeds(rng, items.len()))
        .map(|((key, item), seed)| (key, item, seed))
        .collect();

    let run = |(key, item, seed): (&K, &T, Seed)| -> Result<(K, P), ProofError> {
        let mut key_rng = StdRng::from_seed(seed);
        Ok((key.clone(), prove(key, item, &mut key_rng)?))
    };

    if config.parallelize {
        jobs.into_par_iter().map(run).collect()
    } else {
        jobs.into_iter().map(run).collect()
    }
}

/// Check elements in order, stopping at the first one that fails.
pub fn verify_all<T>(
    context: &'static str,
    items: impl IntoIterator<Item = T>,
    mut check: impl FnMut(T) -> bool,
) -> bool {
    for (index, item) in items.into_iter().enumerate() {
        if !check(item) {
            tracing::warn!(target: LOG_TARGET, context, index, "element failed verification");
            return false;
        }
    }
    true
}

/// Keyed variant of [`verify_all`].
pub fn verify_keyed<'a, K, T>(
    context: &'static str,
    items: impl IntoIterator<Item = (&'a K, T)>,
    mut check: impl FnMut(&'a K, T) -> bool,
) -> bool
where
    K: Display + 'a,
{
    for (key, item) in items {
        if !check(key, item) {
            tracing::warn!(target: LOG_TARGET, context, %key, "entry failed verification");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::seeded_rng;
    use rand::Rng;

    fn noisy(item: &u64, rng: &mut StdRng) -> Result<(u64, u64), ProofError> {
        Ok((*item, rng.gen()))
    }

    #[test]
    fn indexed_paths_agree_and_keep_order() {
        let items: Vec<u64> = (0..23).collect();
        let parallel = ProverConfig::default().with_chunk_size(4);
        let sequential = ProverConfig::sequential().with_chunk_size(4);

        let a = create_indexed(&parallel, &items, &mut seeded_rng(1), noisy).unwrap();
        let b = create_indexed(&sequential, &items, &mut seeded_rng(1), noisy).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.iter().map(|(i, _)| *i).collect::<Vec<_>>(), items);
    }

    #[test]
    fn indexed_propagates_first_error() {
        let items: Vec<u64> = (0..10).collect();
        let config = ProverConfig::default().with_chunk_size(3);
        let result = create_indexed(&config, &items, &mut seeded_rng(2), |item, _| {
            if *item == 7 {
                Err(ProofError::Internal("seven".into()))
            } else {
                Ok(*item)
            }
        });
        assert!(matches!(result, Err(ProofError::Internal(_))));
    }

    #[test]
    fn indexed_rejects_zero_chunk() {
        let config = ProverConfig::default().with_chunk_size(0);
        assert!(create_indexed(&config, &[1u64], &mut seeded_rng(3), noisy).is_err());
    }

    #[test]
    fn keyed_paths_agree() {
        let items: BTreeMap<String, u64> = (0..9).map(|i| (format!("k{i}"), i)).collect();
        let prove = |_: &String, item: &u64, rng: &mut StdRng| noisy(item, rng);
        let a = create_keyed(&ProverConfig::default(), &items, &mut seeded_rng(4), prove).unwrap();
        let b = create_keyed(&ProverConfig::sequential(), &items, &mut seeded_rng(4), prove).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.keys().collect::<Vec<_>>(), items.keys().collect::<Vec<_>>());
    }

    #[test]
    fn verification_short_circuits() {
        let mut seen = Vec::new();
        let ok = verify_all("numbers", [1, 2, 3, 4], |n| {
            seen.push(n);
            n != 2
        });
        assert!(!ok);
        assert_eq!(seen, vec![1, 2]);
        assert!(verify_all("empty", Vec::<u8>::new(), |_| false));

        let map: BTreeMap<String, u8> = [("a".to_string(), 1), ("b".to_string(), 0)].into();
        assert!(!verify_keyed("map", map.iter(), |_, v| *v == 1));
    }
}
