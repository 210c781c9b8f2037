mod assign;
mod checkpoint;
mod config;
mod dialogue;
mod evaluators;
mod extractor;
mod heuristic;
mod llm;
mod model;
mod pacer;
mod pipeline;
mod report;
mod scorer;
mod selector;
mod store;
mod tts;
mod voices;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use config::Config;
use pipeline::{RunOptions, Strategy};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Full five-judge audit over the character x voice grid.
    JudgePanel,
    /// Keyword-table assignment, no service calls for judging.
    Heuristic,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::JudgePanel => Strategy::JudgePanel,
            StrategyArg::Heuristic => Strategy::Heuristic,
        }
    }
}

/// Audit character voice assignments against the prebuilt voice catalog.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file path.
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// Audit only the first 5 characters.
    #[arg(short, long)]
    test: bool,

    /// Cap the number of characters audited.
    #[arg(long)]
    limit: Option<usize>,

    /// Assignment strategy for the final phase.
    #[arg(long, value_enum, default_value_t = StrategyArg::JudgePanel)]
    strategy: StrategyArg,

    /// Skip TTS rendering and evaluate text-only.
    #[arg(long)]
    skip_tts: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!(
                "Please ensure '{}' exists with valid LLM settings.",
                args.config.display()
            );
            return Err(e);
        }
    };

    let limit = if args.test { Some(5) } else { args.limit };
    let options = RunOptions {
        limit,
        skip_tts: args.skip_tts,
        strategy: args.strategy.into(),
    };

    pipeline::run(&config, &options).await
}
