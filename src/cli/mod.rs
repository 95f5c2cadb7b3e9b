// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`  — train or resume a model, then evaluate it
//   2. `eval`   — score the newest checkpoint on dev or test
//   3. `search` — grid search over lr × keep × l2
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, SearchArgs, TrainArgs};

use crate::application::config::TrainConfig;

#[derive(Parser, Debug)]
#[command(
    name = "nli-trainer",
    version,
    about = "Train and grid-search an LSTM premise/hypothesis classifier for natural language inference."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Eval(args)   => run_eval(args),
            Commands::Search(args) => run_search(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let paths  = args.paths.resolve();
    let limits = args.limits.into();
    let cfg: TrainConfig = args.hyper.into();

    tracing::info!("Training on '{}', checkpoints in '{}'", paths.data_dir.display(), paths.train_dir.display());
    let m = TrainUseCase::new(cfg, paths, limits).execute()?;

    println!("Training complete after {} iterations.", m.iterations);
    println!("  train accuracy: {:.4}   train loss: {:.4}", m.train_accuracy, m.train_loss);
    println!("  eval accuracy:  {:.4}   eval loss:  {:.4}", m.eval_accuracy, m.eval_loss);
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    let paths  = args.paths.resolve();
    let limits = args.limits.into();
    let report = EvalUseCase::new(paths, limits, args.batch_size).execute()?;

    println!("accuracy: {:.4}   loss: {:.4}", report.accuracy, report.loss);
    println!("{}", report.confusion);
    Ok(())
}

fn run_search(args: SearchArgs) -> Result<()> {
    use crate::application::search_use_case::SearchUseCase;

    let grid = args.grid();
    let SearchArgs { hyper, paths, limits, results_file, .. } = args;
    let paths = paths.resolve();
    let base: TrainConfig = hyper.into();

    let summary = SearchUseCase::new(base, paths, limits.into(), grid, results_file).execute()?;

    println!(
        "Search finished: {} trained, {} already recorded, {} failed.",
        summary.completed, summary.skipped, summary.failed
    );
    if let Some(best) = summary.best {
        println!(
            "Best eval accuracy {:.4} at {} (train accuracy {:.4})",
            best.metrics.eval_accuracy, best.key, best.metrics.train_accuracy
        );
    }
    Ok(())
}
