//! Playable CLI - Bridge interface for the routing layer
//!
//! Commands: defaults, validate, randomize, build, runs, run, assets,
//! placeholders, replace-asset
//! Outputs JSON to stdout
//! Returns 2 on validation failure

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use playable_core::logging::setup_logging;
use playable_core::{CoreError, Pipeline, ProjectLayout, RawBuild, Section};

#[derive(Parser)]
#[command(name = "playable-cli")]
#[command(about = "Playable CLI - solitaire playable configuration engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root holding defaults/, runs/ and static/
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Debug-level logs, mirrored to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the validated default configs
    Defaults,

    /// Validate one config section
    Validate {
        /// mechanics, levels or visual
        #[arg(short, long)]
        section: Section,

        /// Inline JSON payload
        #[arg(short, long, conflicts_with = "file")]
        payload: Option<String>,

        /// Read the JSON payload from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Produce a seeded variant of one config section
    Randomize {
        #[arg(short, long)]
        section: Section,

        #[arg(short, long, conflicts_with = "file")]
        payload: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Variation amount in [0, 1]
        #[arg(long, default_value_t = 0.3)]
        variation: f64,

        /// Seed; drawn at random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Build a run from {mechanics, levels, visual, seed?, applied?}
    Build {
        #[arg(short, long, conflicts_with = "file")]
        payload: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List runs, most recent first
    Runs,

    /// Show the stored configs of one run
    Run {
        run_id: String,
    },

    /// List asset slots and their current files
    Assets,

    /// Create placeholder images for empty slots
    Placeholders,

    /// Replace a slot's image; the previous file goes to history
    ReplaceAsset {
        /// Slot name, e.g. card_back
        #[arg(short, long)]
        slot: String,

        /// Image file in any supported raster format
        #[arg(short, long)]
        image: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let layout = ProjectLayout::new(&cli.root);

    let _guard = match setup_logging(&layout.logs_dir, "playable", cli.verbose, cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("logging disabled: {}", e);
            None
        }
    };

    let pipeline = Pipeline::new(layout);
    match run(&pipeline, cli.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "command failed");
            print_json(&json!({ "success": false, "error": format!("{:#}", e) }));
            ExitCode::FAILURE
        }
    }
}

fn run(pipeline: &Pipeline, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Defaults => respond(pipeline.load_defaults(), |defaults| json!(defaults)),

        Commands::Validate { section, payload, file } => {
            let raw = read_payload(payload, file.as_deref())?;
            match pipeline.validate(section, &raw) {
                Ok(config) => {
                    print_json(&json!({ "valid": true, "section": section, "config": config }));
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => failure(e),
            }
        }

        Commands::Randomize {
            section,
            payload,
            file,
            variation,
            seed,
        } => {
            let raw = read_payload(payload, file.as_deref())?;
            respond(pipeline.randomize(section, &raw, variation, seed), |r| json!(r))
        }

        Commands::Build { payload, file } => {
            let raw = read_payload(payload, file.as_deref())?;
            let request: RawBuild =
                serde_json::from_value(raw).context("Invalid build payload")?;
            respond(pipeline.build(&request), |handle| {
                json!({ "success": true, "run": handle })
            })
        }

        Commands::Runs => respond(pipeline.list_runs(), |runs| json!(runs)),

        Commands::Run { run_id } => respond(pipeline.get_run(&run_id), |contents| {
            json!({ "run_id": run_id, "configs": contents })
        }),

        Commands::Assets => respond(pipeline.list_assets(), |assets| json!(assets)),

        Commands::Placeholders => {
            pipeline.layout().ensure_dirs()?;
            respond(pipeline.ensure_placeholders(), |created| json!({ "created": created }))
        }

        Commands::ReplaceAsset { slot, image } => {
            let bytes = fs::read(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            respond(pipeline.write_asset(&slot, &bytes), |written| {
                json!({ "success": true, "asset": written })
            })
        }
    }
}

fn read_payload(payload: Option<String>, file: Option<&Path>) -> Result<Value> {
    let text = match (payload, file) {
        (Some(p), _) => p,
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload {}", path.display()))?,
        (None, None) => bail!("either --payload or --file is required"),
    };
    serde_json::from_str(&text).context("Invalid payload")
}

fn respond<T>(result: Result<T, CoreError>, render: impl FnOnce(T) -> Value) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            print_json(&render(value));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => failure(e),
    }
}

/// Caller errors are reported as JSON; everything else propagates.
fn failure(error: CoreError) -> Result<ExitCode> {
    match error {
        CoreError::Validation(e) => {
            print_json(&json!({ "valid": false, "section": e.section, "errors": e.violations }));
            Ok(ExitCode::from(2))
        }
        e if e.is_recoverable() => {
            print_json(&json!({ "success": false, "error": e.to_string() }));
            Ok(ExitCode::FAILURE)
        }
        e => Err(e.into()),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to encode output: {}", e),
    }
}
