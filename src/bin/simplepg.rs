//! Train a linear policy with vanilla or natural policy gradient
//!
//! # Usage
//!
//! ```bash
//! simplepg Point-v0 --n-itrs 50
//! simplepg CartPole-v0 --natural --save cartpole.json
//! simplepg CartPole-v0 --config pg.json --json > progress.jsonl
//! ```

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use simplepg::{
    env::{cartpole, check_env_id, point, Environment},
    policy::{CategoricalSoftmax, GaussianLinear, Policy, PolicyWeights},
    train::pg::{PgConfig, PgTrainer},
};
use tracing_subscriber::EnvFilter;

/// Seed of the environment RNG; worker `i` uses `ENV_SEED + i`
const ENV_SEED: u64 = 42;

#[derive(Parser, Debug)]
#[command(name = "simplepg", version, about = "Policy-gradient training of linear policies")]
struct Cli {
    /// Environment identifier (Point-v0 or CartPole-v0)
    #[arg(default_value = point::ID)]
    env_id: String,

    /// JSON file with base hyperparameters; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum timesteps collected per iteration
    #[arg(long)]
    batch_size: Option<usize>,

    /// Discount factor
    #[arg(long)]
    discount: Option<f64>,

    /// Step length of the vanilla update
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Number of training iterations
    #[arg(long)]
    n_itrs: Option<usize>,

    /// Render the first episode of every batch
    #[arg(long)]
    render: bool,

    /// Subtract the per-timestep mean return
    #[arg(long, action = clap::ArgAction::Set)]
    use_baseline: Option<bool>,

    /// Use natural-gradient updates
    #[arg(long)]
    natural: bool,

    /// Target KL of the natural-gradient step
    #[arg(long)]
    natural_step_size: Option<f64>,

    /// Regularisation added to the Fisher diagonal
    #[arg(long)]
    fisher_reg: Option<f64>,

    /// Seed of the training RNG
    #[arg(long)]
    seed: Option<u64>,

    /// Parallel rollout workers
    #[arg(long)]
    num_workers: Option<usize>,

    /// Start from weights saved with --save
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the trained weights to this JSON file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print per-iteration statistics as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn pg_config(&self) -> Result<PgConfig> {
        let mut config = match &self.config {
            Some(path) => PgConfig::load_json(path)?,
            None => PgConfig::default(),
        };

        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.discount {
            config.discount = v;
        }
        if let Some(v) = self.learning_rate {
            config.learning_rate = v;
        }
        if let Some(v) = self.n_itrs {
            config.n_itrs = v;
        }
        if let Some(v) = self.use_baseline {
            config.use_baseline = v;
        }
        if let Some(v) = self.natural_step_size {
            config.natural_step_size = v;
        }
        if let Some(v) = self.fisher_reg {
            config.fisher_reg = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.num_workers {
            config.num_workers = v;
        }
        config.render |= self.render;
        config.natural |= self.natural;

        config.validate()?;
        Ok(config)
    }
}

fn run<P, E, F>(cli: &Cli, config: PgConfig, policy: P, env_fn: F) -> Result<()>
where
    P: Policy + Sync,
    E: Environment<Action = P::Action> + Send,
    F: Fn(usize) -> E,
{
    let mut trainer = if config.num_workers > 1 {
        PgTrainer::with_workers(config, policy, env_fn)?
    } else {
        PgTrainer::new(config, policy, env_fn(0))?
    };

    if let Some(path) = &cli.load {
        let weights = PolicyWeights::load_json(path)?;
        if weights.env_id != cli.env_id {
            bail!(
                "weights in {} were trained on {}, not {}",
                path.display(),
                weights.env_id,
                cli.env_id
            );
        }
        tracing::info!(path = %path.display(), "starting from saved weights");
        trainer = trainer.with_theta(weights.to_theta()?);
    }

    trainer.train_until(|stats| {
        if cli.json {
            match serde_json::to_string(stats) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::warn!(%err, "failed to serialise iteration stats"),
            }
        }
        false
    })?;

    let summary = trainer.summary();
    tracing::info!(
        iterations = summary.iterations,
        total_timesteps = summary.total_timesteps,
        best_average_return = summary.best_average_return,
        final_average_return = summary.final_average_return,
        "training finished"
    );

    if let Some(path) = &cli.save {
        trainer.weights(&cli.env_id).save_json(path)?;
        tracing::info!(path = %path.display(), "weights saved");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the `--json` lines
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    check_env_id(&cli.env_id)?;
    let config = cli.pg_config()?;
    tracing::info!(env = %cli.env_id, ?config, "starting policy-gradient training");

    match cli.env_id.as_str() {
        point::ID => run(&cli, config, GaussianLinear, |i| point::Point::new(ENV_SEED + i as u64)),
        cartpole::ID => {
            run(&cli, config, CategoricalSoftmax, |i| cartpole::CartPole::new(ENV_SEED + i as u64))
        }
        other => bail!("no policy registered for {other}"),
    }
}
