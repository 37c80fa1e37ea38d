use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use embedding_eval::{
    data::{self, statistics},
    interchange, Axis, CandleProvider, Sweep, SweepConfig,
};

/// Compare embedding strategies on a labelled corpus.
#[derive(Parser, Debug)]
#[command(name = "embedding-eval")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every strategy and write the leaderboard
    Sweep {
        /// Corpus root; each file's parent folder is its label
        corpus: PathBuf,

        /// TOML sweep configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Learning rates to sweep (repeatable)
        #[arg(long)]
        alpha: Vec<f64>,

        /// Context windows to sweep (repeatable)
        #[arg(long)]
        window: Vec<usize>,

        /// Negative sample counts to sweep (repeatable)
        #[arg(long)]
        negative: Vec<usize>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,

        /// Directory holding pretrained encoder folders
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Strip accents while tokenizing
        #[arg(long)]
        deaccent: bool,
    },

    /// Term frequencies and vocabulary growth of a text collection
    Stats {
        #[arg(default_value = "arXiv_processed")]
        directory: PathBuf,

        #[arg(short, long, default_value = "Text Statistics")]
        output: PathBuf,
    },

    /// Sort an embedding file by id, in place
    SortEmbeddings { path: PathBuf },
}

fn axis<T: Clone>(values: Vec<T>, current: Axis<T>) -> Axis<T> {
    match values.len() {
        0 => current,
        1 => Axis::One(values[0].clone()),
        _ => Axis::Many(values),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("embedding_eval=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Sweep {
            corpus,
            config,
            alpha,
            window,
            negative,
            output,
            seed,
            models_dir,
            deaccent,
        } => {
            let mut cfg = match &config {
                Some(path) => SweepConfig::from_file(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => SweepConfig::default(),
            };
            cfg.alpha = axis(alpha, cfg.alpha);
            cfg.window = axis(window, cfg.window);
            cfg.negative = axis(negative, cfg.negative);
            if let Some(output) = output {
                cfg.output = output;
            }
            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            if let Some(models_dir) = models_dir {
                cfg.models_dir = models_dir;
            }

            let (docs, labels) = data::load_corpus_with(&corpus, deaccent);
            if docs.is_empty() {
                bail!("no documents found under {}", corpus.display());
            }
            let provider = Arc::new(CandleProvider::new(cfg.models_dir.clone()));
            let board = Sweep::new(cfg, provider).run(&docs, &labels)?;
            for (rank, (name, e)) in board.ranked().into_iter().enumerate() {
                info!(rank = rank + 1, model = name, accuracy = e.accuracy, mcc = e.mcc, "leaderboard");
            }
        }
        Command::Stats { directory, output } => {
            if let Some(dir) = statistics::run(&directory, &output)? {
                info!(path = %dir.display(), "text statistics written");
            }
        }
        Command::SortEmbeddings { path } => {
            interchange::sort_vectors_file(&path).with_context(|| format!("sorting {}", path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sweep_axes_repeat() {
        let cli = Cli::parse_from([
            "embedding-eval", "sweep", "corpus", "--alpha", "0.01", "--alpha", "0.02", "--window", "3",
        ]);
        match cli.command {
            Command::Sweep { corpus, alpha, window, negative, .. } => {
                assert_eq!(corpus, PathBuf::from("corpus"));
                assert_eq!(alpha, vec![0.01, 0.02]);
                assert_eq!(axis(window, Axis::One(5)), Axis::One(3));
                assert_eq!(axis(negative, Axis::One(5)), Axis::One(5));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stats_defaults() {
        let cli = Cli::parse_from(["embedding-eval", "stats"]);
        match cli.command {
            Command::Stats { directory, output } => {
                assert_eq!(directory, PathBuf::from("arXiv_processed"));
                assert_eq!(output, PathBuf::from("Text Statistics"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
