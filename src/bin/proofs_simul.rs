use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{anyhow, ensure, Context, Result};
use ark_bn254::{Bn254, Fr as Scalar, G1Projective as Curve, G2Projective};
use ark_ec::PrimeGroup;
use ark_ff::Zero;
use ark_std::UniformRand;
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

use unlynx_proofs::ciphertext::encrypt_int_vector;
use unlynx_proofs::logging::init_tracing;
use unlynx_proofs::records::add_in_map;
use unlynx_proofs::shuffle::shuffle_process_responses;
use unlynx_proofs::{
    CipherText, CipherVector, FilteredResponse, FilteredResponseDet, GroupingKey, ProcessResponse,
    ProverConfig, PublishRangeProof, PublishSignature, PublishedAggregationProof,
    PublishedDeterministicTaggingProof, PublishedShufflingProof, PublishedSwitchKeyProof,
};

const LOG_TARGET: &str = "bin::proofs_simul";

#[derive(Debug, Parser)]
#[command(name = "proofs_simul")]
#[command(about = "Run shuffle, tagging, aggregation, key switching and range proofs over random records", long_about = None)]
struct Args {
    /// Number of encrypted records
    #[arg(long, env = "SIMUL_RESPONSES", default_value_t = 10)]
    responses: usize,

    /// Aggregating attributes per record
    #[arg(long, env = "SIMUL_AGGR_ATTRIBUTES", default_value_t = 2)]
    attributes: usize,

    /// Distinct group-by values the records are spread over
    #[arg(long, env = "SIMUL_GROUPS", default_value_t = 3)]
    groups: i64,

    /// Servers holding a share of the collective key
    #[arg(long, env = "SIMUL_SERVERS", default_value_t = 3)]
    servers: usize,

    /// Range proof digit base
    #[arg(long, default_value_t = 16)]
    range_base: u64,

    /// Range proof digit count
    #[arg(long, default_value_t = 4)]
    range_digits: usize,

    /// Optional RNG seed for reproducible runs
    #[arg(long, env = "SIMUL_RNG_SEED")]
    rng_seed: Option<u64>,

    /// Force single-threaded proof creation
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Override the per-worker chunk size
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Toggle structured (JSON) logs
    #[arg(long, env = "SIMUL_LOG_JSON", default_value_t = false)]
    json: bool,
}

struct Server {
    key_share: Scalar,
    tag_secret: Scalar,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json).map_err(|err| anyhow!(err))?;
    ensure!(args.responses > 0, "at least one record is required");
    ensure!(args.servers > 0, "at least one server is required");
    ensure!(args.groups > 0, "at least one group is required");

    let mut config = ProverConfig::from_env().context("invalid prover configuration")?;
    if args.sequential {
        config.parallelize = false;
    }
    if let Some(chunk_size) = args.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    config.validate()?;

    let mut rng = args
        .rng_seed
        .map(StdRng::seed_from_u64)
        .unwrap_or_else(StdRng::from_entropy);

    let servers: Vec<Server> = (0..args.servers)
        .map(|_| Server {
            key_share: Scalar::rand(&mut rng),
            tag_secret: Scalar::rand(&mut rng),
        })
        .collect();
    let collective = servers
        .iter()
        .fold(Curve::zero(), |acc, s| acc + Curve::generator() * s.key_share);
    info!(target: LOG_TARGET, servers = servers.len(), ?config, "collective key ready");

    let records = random_records(&args, collective, &mut rng);
    let shuffled = run_shuffle(records, collective, &mut rng)?;
    let tags = run_tagging(&config, &servers, &shuffled, &mut rng)?;
    let grouped = run_aggregation(&shuffled, &tags)?;
    run_key_switch(&config, &servers, &grouped, &mut rng)?;
    run_range(&args, &mut rng)?;

    info!(target: LOG_TARGET, "all proofs verified");
    Ok(())
}

fn random_records(args: &Args, key: Curve, rng: &mut StdRng) -> Vec<ProcessResponse<Curve>> {
    (0..args.responses)
        .map(|_| {
            let group = rng.gen_range(0..args.groups);
            let values: Vec<i64> = (0..args.attributes).map(|_| rng.gen_range(0..10)).collect();
            let (group_by_enc, _) = encrypt_int_vector(key, &[group], rng);
            let (aggregating, _) = encrypt_int_vector(key, &values, rng);
            let (where_enc, _) = encrypt_int_vector(key, &[1], rng);
            ProcessResponse::new(group_by_enc, aggregating, where_enc)
        })
        .collect()
}

fn run_shuffle(
    records: Vec<ProcessResponse<Curve>>,
    key: Curve,
    rng: &mut StdRng,
) -> Result<Vec<ProcessResponse<Curve>>> {
    let g = Curve::generator();
    let started = Instant::now();
    let out = shuffle_process_responses(&records, g, key, rng);
    let proof = PublishedShufflingProof::create(records, out.shuffled, g, key, &out.beta, &out.pi, rng)?;
    let created = started.elapsed();
    ensure!(proof.verify(key), "shuffle proof rejected");
    info!(
        target: LOG_TARGET,
        create_ms = created.as_millis() as u64,
        verify_ms = (started.elapsed() - created).as_millis() as u64,
        bytes = proof.hash_proof.len(),
        "shuffle"
    );
    Ok(proof.shuffled_list)
}

/// Every server tags the group-by ciphertexts in turn; returns the final tags per record.
fn run_tagging(
    config: &ProverConfig,
    servers: &[Server],
    records: &[ProcessResponse<Curve>],
    rng: &mut StdRng,
) -> Result<Vec<Vec<Curve>>> {
    let widths: Vec<usize> = records.iter().map(|r| r.group_by_enc.len()).collect();
    let mut current: CipherVector<Curve> = records
        .iter()
        .flat_map(|r| r.group_by_enc.iter().copied())
        .collect();

    for (index, server) in servers.iter().enumerate() {
        let started = Instant::now();
        let next: CipherVector<Curve> = current
            .iter()
            .map(|ct| ct.deterministic_tag_step(server.tag_secret, server.key_share))
            .collect();
        let proof = PublishedDeterministicTaggingProof::create(
            config,
            current,
            next,
            server.tag_secret,
            server.key_share,
            rng,
        )?;
        let created = started.elapsed();
        ensure!(proof.verify(), "tagging proof of server {index} rejected");
        info!(
            target: LOG_TARGET,
            server = index,
            create_ms = created.as_millis() as u64,
            verify_ms = (started.elapsed() - created).as_millis() as u64,
            "deterministic tagging"
        );
        current = proof.after;
    }

    let mut tags = current.into_iter().map(|ct| ct.c);
    Ok(widths
        .into_iter()
        .map(|width| tags.by_ref().take(width).collect())
        .collect())
}

fn run_aggregation(
    records: &[ProcessResponse<Curve>],
    tags: &[Vec<Curve>],
) -> Result<BTreeMap<GroupingKey, FilteredResponse<Curve>>> {
    let started = Instant::now();
    let responses = records
        .iter()
        .zip(tags)
        .map(|(record, tag)| {
            Ok(FilteredResponseDet {
                det_tag_group_by: GroupingKey::from_tags(tag.as_slice())?,
                fr: FilteredResponse::new(
                    record.group_by_enc.clone(),
                    record.aggregating_attributes.clone(),
                ),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut grouped = BTreeMap::new();
    for response in &responses {
        add_in_map(&mut grouped, response.det_tag_group_by.clone(), &response.fr)?;
    }
    let proof = PublishedAggregationProof::create(responses, grouped);
    ensure!(proof.verify(), "aggregation proof rejected");
    info!(
        target: LOG_TARGET,
        groups = proof.aggregation_results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "aggregation"
    );
    Ok(proof.aggregation_results)
}

/// Switch the aggregated results from the collective key to a fresh client key.
fn run_key_switch(
    config: &ProverConfig,
    servers: &[Server],
    grouped: &BTreeMap<GroupingKey, FilteredResponse<Curve>>,
    rng: &mut StdRng,
) -> Result<()> {
    let client_secret = Scalar::rand(rng);
    let client_key = Curve::generator() * client_secret;
    let originals: CipherVector<Curve> = grouped
        .values()
        .flat_map(|fr| fr.aggregating_attributes.iter().copied())
        .collect();
    let origins: Vec<Curve> = originals.iter().map(|ct| ct.k).collect();
    let mut current: CipherVector<Curve> = originals
        .iter()
        .map(|ct| CipherText::new(Curve::zero(), ct.c))
        .collect();

    for (index, server) in servers.iter().enumerate() {
        let started = Instant::now();
        let fresh: Vec<Scalar> = current.iter().map(|_| Scalar::rand(rng)).collect();
        let next: CipherVector<Curve> = current
            .iter()
            .zip(&origins)
            .zip(&fresh)
            .map(|((ct, origin), r)| ct.key_switch_step(*origin, server.key_share, client_key, *r))
            .collect();
        let proof = PublishedSwitchKeyProof::create(
            config,
            current,
            next,
            &fresh,
            server.key_share,
            &origins,
            client_key,
            rng,
        )?;
        let created = started.elapsed();
        ensure!(proof.verify(), "key switching proof of server {index} rejected");
        info!(
            target: LOG_TARGET,
            server = index,
            create_ms = created.as_millis() as u64,
            verify_ms = (started.elapsed() - created).as_millis() as u64,
            "key switching"
        );
        current = proof.after;
    }

    let totals: Vec<Option<i64>> = current
        .iter()
        .map(|ct| ct.decrypt_int(client_secret, 10_000))
        .collect();
    info!(target: LOG_TARGET, ?totals, "client decrypted aggregates");
    Ok(())
}

fn run_range(args: &Args, rng: &mut StdRng) -> Result<()> {
    let started = Instant::now();
    let sig = PublishSignature::<Bn254>::init(args.range_base, rng)?;
    let ca_pub = G2Projective::generator() * Scalar::rand(rng);
    let bound = u32::try_from(args.range_digits)
        .ok()
        .and_then(|l| args.range_base.checked_pow(l))
        .context("range bound overflows")?;
    let secret = rng.gen_range(0..bound);
    let proof = PublishRangeProof::create(&sig, args.range_base, args.range_digits, secret, ca_pub, rng)?;
    let created = started.elapsed();
    ensure!(
        proof.verify(args.range_base, args.range_digits, sig.public, ca_pub),
        "range proof rejected"
    );
    info!(
        target: LOG_TARGET,
        create_ms = created.as_millis() as u64,
        verify_ms = (started.elapsed() - created).as_millis() as u64,
        "range proof"
    );
    Ok(())
}
