//! Solver-Trace Dataset Build Tool
//!
//! Configuration-driven tool that turns MIP/CP/ALNS checkpoint logs into
//! NumPy training arrays.
//!
//! ## Output Format
//!
//! - **Features**: `X_{stem}.npy` - Shape `[N_examples, H × 3]`
//! - **Targets**: `y_{stem}.npy` - Shape `[N_examples]` (labels) or `[N_examples, 3]`
//! - **Metadata**: `{stem}_metadata.json` - configuration, shapes, timestamp
//!
//! # Usage
//!
//! ```bash
//! # From TOML config
//! cargo run --release --bin build_dataset -- --config configs/best_solver.toml
//!
//! # Generate sample config
//! cargo run --release --bin build_dataset -- --generate-config best_solver.toml
//!
//! # Direct flags, logs named rawdata_{MODEL}_t5_T300.csv in ./logs
//! cargo run --release --bin build_dataset -- --logs logs --interval 5 --budget 300 --horizon 3
//!
//! # Switching dataset, 20 s between switches
//! cargo run --release --bin build_dataset -- --logs logs --variant switching_improvement \
//!     --switch-interval 20
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{arg, value_parser, ArgAction, ArgMatches, Command};
use solver_trace_features::export::ExportedFiles;
use solver_trace_features::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("build_dataset")
        .about("Build solver-selection training arrays from checkpoint logs")
        .arg(arg!(-c --config <FILE> "Load the full configuration from a TOML file"))
        .arg(arg!(--"generate-config" <PATH> "Write a sample TOML configuration and exit"))
        .arg(
            arg!(--variant <KIND> "Dataset to build")
                .value_parser(["best_solver", "improvement", "switching_improvement"])
                .default_value("best_solver"),
        )
        .arg(
            arg!(--interval <SECONDS> "Checkpoint interval Δt")
                .value_parser(value_parser!(f64))
                .default_value("5"),
        )
        .arg(
            arg!(--budget <SECONDS> "Time budget T per instance")
                .value_parser(value_parser!(f64))
                .default_value("300"),
        )
        .arg(
            arg!(--horizon <FRAMES> "Frames per window H")
                .value_parser(value_parser!(usize))
                .default_value("3"),
        )
        .arg(
            arg!(--stride <N> "Keep every N-th frame (best_solver only)")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            arg!(--"switch-interval" <SECONDS> "Seconds between switches (switching_improvement)")
                .value_parser(value_parser!(f64)),
        )
        .arg(arg!(--logs <DIR> "Directory holding logs with the default file names").default_value("."))
        .arg(arg!(--mip <FILE> "MIP checkpoint log"))
        .arg(arg!(--cp <FILE> "CP checkpoint log"))
        .arg(arg!(--alns <FILE> "ALNS checkpoint log"))
        .arg(arg!(--interleaved <FILE> "Interleaved round-robin log"))
        .arg(arg!(-o --output <DIR> "Output directory").default_value("."))
        .arg(
            arg!(--skip <ID> "Exclude an instance (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            arg!(--"no-default-skip" "Do not exclude the default skip list")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let matches = cli().get_matches();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        return match generate_sample_config(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("failed to write sample config: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => DatasetConfig::load_toml(path)?,
        None => config_from_flags(matches)?,
    };

    let pipeline = DatasetPipeline::from_config(config)?;
    let (output, files) = pipeline.run_and_export()?;
    print_summary(&output.summary, &files);
    Ok(())
}

fn config_from_flags(matches: &ArgMatches) -> Result<DatasetConfig> {
    let interval = *matches.get_one::<f64>("interval").unwrap_or(&5.0);
    let budget = *matches.get_one::<f64>("budget").unwrap_or(&300.0);

    let variant = match matches.get_one::<String>("variant").map(String::as_str) {
        Some("improvement") => DatasetVariant::Improvement,
        Some("switching_improvement") => {
            let switch_interval = matches
                .get_one::<f64>("switch-interval")
                .copied()
                .ok_or_else(|| {
                    DatasetError::InvalidConfig(
                        "--switch-interval is required for switching_improvement".to_string(),
                    )
                })?;
            DatasetVariant::SwitchingImprovement { switch_interval }
        }
        _ => DatasetVariant::BestSolver,
    };

    let logs = matches
        .get_one::<String>("logs")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let per_solver = [
        matches.get_one::<String>("mip"),
        matches.get_one::<String>("cp"),
        matches.get_one::<String>("alns"),
    ];

    let source = if let Some(path) = matches.get_one::<String>("interleaved") {
        LogSource::Interleaved {
            path: PathBuf::from(path),
        }
    } else if let [Some(mip), Some(cp), Some(alns)] = per_solver {
        LogSource::PerSolver {
            mip: PathBuf::from(mip),
            cp: PathBuf::from(cp),
            alns: PathBuf::from(alns),
        }
    } else if per_solver.iter().any(Option::is_some) {
        return Err(DatasetError::InvalidConfig(
            "--mip, --cp and --alns must be given together".to_string(),
        ));
    } else if variant == DatasetVariant::Improvement {
        LogSource::interleaved_in(&logs, interval, budget)
    } else {
        LogSource::per_solver_in(&logs, interval, budget)
    };

    let mut config = DatasetConfig::default()
        .with_checkpoint_interval(interval)
        .with_total_budget(budget)
        .with_time_horizon(*matches.get_one::<usize>("horizon").unwrap_or(&3))
        .with_stride(*matches.get_one::<usize>("stride").unwrap_or(&1))
        .with_variant(variant)
        .with_source(source);

    if let Some(dir) = matches.get_one::<String>("output") {
        config = config.with_output_dir(dir);
    }

    let extra: Vec<String> = matches
        .get_many::<String>("skip")
        .map(|ids| ids.cloned().collect())
        .unwrap_or_default();
    if matches.get_flag("no-default-skip") {
        config = config.with_skip_list(extra);
    } else {
        config.skip_list.extend(extra);
    }

    Ok(config)
}

fn generate_sample_config(path: &str) -> Result<()> {
    let sample = DatasetConfig::default()
        .with_source(LogSource::per_solver_in("logs", 5.0, 300.0))
        .with_output_dir("datasets")
        .with_metadata(ExperimentMetadata {
            name: "Best-solver classification".to_string(),
            description: Some("MIP vs CP vs ALNS, 5 s checkpoints, 300 s budget".to_string()),
            tags: Some(vec!["tsp".to_string(), "best_solver".to_string()]),
        });
    sample.save_toml(path)?;
    println!("✅ Sample configuration written to {path}");
    Ok(())
}

fn print_summary(summary: &RunSummary, files: &ExportedFiles) {
    let counts = summary.skip_counts();

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("Dataset Build Complete");
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Variant:            {}", files.info.variant);
    println!("  Instances total:    {}", summary.instances_total());
    println!("  Instances used:     {}", summary.instances_processed);
    println!("  Skipped (list):     {}", counts.skip_list);
    println!("  Skipped (truncated): {}", counts.truncated);
    println!("  Skipped (short):    {}", counts.insufficient_history);
    println!("  Frames:             {}", summary.frames);
    println!("  Examples:           {}", summary.examples);
    if let Some(stats) = &summary.label_stats {
        let balance = stats.class_balance();
        println!(
            "  Labels:             MIP {} ({:.1}%)  CP {} ({:.1}%)  ALNS {} ({:.1}%)",
            stats.counts[0],
            balance[0] * 100.0,
            stats.counts[1],
            balance[1] * 100.0,
            stats.counts[2],
            balance[2] * 100.0
        );
    }
    println!("  Features:           {} {:?}", files.features.display(), files.info.features_shape);
    println!("  Targets:            {} {:?}", files.targets.display(), files.info.targets_shape);
    println!("  Metadata:           {}", files.metadata.display());
    println!("═══════════════════════════════════════════════════════════════");

    for skipped in &summary.skipped {
        if !matches!(skipped.reason, SkipReason::SkipList) {
            println!("  ⚠️  {}: {}", skipped.instance_id, skipped.reason.name());
        }
    }
}
