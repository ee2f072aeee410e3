use anyhow::{bail, Context};
use std::time::Instant;

use ht_types::{Algorithm, Function};
use ht_tuner::{
    select_and_cleanup, SearchDriver, SelectionPolicy, TpeSampler, TrialEvaluator, WorkerConfig,
};

const DEFAULT_TIMES: u32 = 500;
const DEFAULT_MAX_EVALUATIONS: usize = 350;
const DEFAULT_SEED: u64 = 1;

struct CliArgs {
    algorithm: Algorithm,
    function: Function,
    times: u32,
    max_evaluations: usize,
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut positional: Vec<&String> = Vec::new();
    let mut times = DEFAULT_TIMES;
    let mut max_evaluations = DEFAULT_MAX_EVALUATIONS;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--times" => {
                let value = iter.next().context("--times requires a value")?;
                times = value.parse().context("--times must be an integer")?;
            }
            "--max-evaluations" => {
                let value = iter.next().context("--max-evaluations requires a value")?;
                max_evaluations = value
                    .parse()
                    .context("--max-evaluations must be an integer")?;
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        bail!("usage: hypertune <algorithm> <function> [--times N] [--max-evaluations N]");
    }

    Ok(CliArgs {
        algorithm: positional[0].parse()?,
        function: positional[1].parse()?,
        times,
        max_evaluations,
    })
}

fn seed_from_env() -> u64 {
    std::env::var("HYPERTUNE_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let start = Instant::now();
    let evaluator = TrialEvaluator::new(WorkerConfig::from_env());
    let mut driver = SearchDriver::new(evaluator, TpeSampler::new(seed_from_env()));

    let cancel = driver.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let archive = driver
        .search(cli.algorithm, cli.function, cli.times, cli.max_evaluations)
        .await?;
    let winner = select_and_cleanup(&archive, &SelectionPolicy::default())?;

    // The winning artifact path is the run's sole stdout output.
    println!("{}", winner.display());
    tracing::info!(
        elapsed_seconds = start.elapsed().as_secs_f64(),
        "run finished"
    );
    Ok(())
}
