//! Trains the logistic and tree pipelines from the churn CSV and writes
//! models plus evaluation artifacts.

use std::path::PathBuf;

use churnkit::config::Settings;
use churnkit::logging;
use churnkit::training::run_training;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let mut settings = Settings::load(options.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(dataset) = options.dataset {
        settings.paths.dataset = dataset;
    }
    if let Some(models_dir) = options.models_dir {
        settings.paths.models_dir = models_dir;
    }
    if let Some(artifacts_dir) = options.artifacts_dir {
        settings.paths.artifacts_dir = artifacts_dir;
    }
    if let Some(seed) = options.seed {
        settings.training.seed = seed;
        settings.training.logistic.seed = seed;
    }
    settings.validate().map_err(|err| err.to_string())?;

    if let Err(err) = logging::init("train", settings.logging.dir.as_deref()) {
        eprintln!("Logging to file disabled: {err}");
        logging::init_stdout_only();
    }

    let report = run_training(&settings).map_err(|err| err.to_string())?;

    println!(
        "rows: {}  train: {}  test: {}",
        report.rows, report.train_rows, report.test_rows
    );
    println!(
        "columns: {} numeric, {} categorical -> {} features",
        report.schema.numeric_cols.len(),
        report.schema.cat_cols.len(),
        report.schema.feature_names.len()
    );
    for eval in &report.evaluations {
        println!(
            "{:<20} accuracy={:.4}  f1={:.4}  auc={:.4}",
            eval.kind.display_name(),
            eval.accuracy,
            eval.f1,
            eval.auc
        );
        println!(
            "  confusion (rows=true, cols=pred): [[{}, {}], [{}, {}]]",
            eval.confusion.get(0, 0),
            eval.confusion.get(0, 1),
            eval.confusion.get(1, 0),
            eval.confusion.get(1, 1)
        );
    }
    println!("top features:");
    for (name, value) in report.top_features.iter().take(5) {
        println!("  {name:<40} {value:.4}");
    }
    println!("models written to {}", report.models_dir.display());
    println!("artifacts written to {}", report.artifacts_dir.display());
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    dataset: Option<PathBuf>,
    models_dir: Option<PathBuf>,
    artifacts_dir: Option<PathBuf>,
    seed: Option<u64>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "--config" | "--dataset" | "--models-dir" | "--artifacts-dir" | "--seed" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| format!("{flag} requires a value"))?;
                match flag {
                    "--config" => options.config = Some(PathBuf::from(value)),
                    "--dataset" => options.dataset = Some(PathBuf::from(value)),
                    "--models-dir" => options.models_dir = Some(PathBuf::from(value)),
                    "--artifacts-dir" => options.artifacts_dir = Some(PathBuf::from(value)),
                    _ => {
                        options.seed = Some(
                            value
                                .parse::<u64>()
                                .map_err(|_| format!("Invalid --seed value: {value}"))?,
                        )
                    }
                }
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "churnkit-train",
        "",
        "Trains logistic regression and decision tree churn pipelines from a CSV export.",
        "",
        "Usage:",
        "  churnkit-train [--config <file>] [options]",
        "",
        "Options:",
        "  --config <file>         TOML settings (default: ./churnkit.toml when present).",
        "  --dataset <file>        Input CSV (default: data/Telco-Customer-Churn.csv).",
        "  --models-dir <dir>      Pipeline and schema output (default: models).",
        "  --artifacts-dir <dir>   Plots and reports output (default: artifacts).",
        "  --seed <u64>            Split and training seed (default: 42).",
        "  -h, --help              Show this help.",
    ]
    .join("\n")
}
