mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use facecheck_core::report::summary_line;
use facecheck_core::{
    load_image, save_image, FaceReport, Pipeline, PipelineOptions, PipelineOutcome, ScrfdDetector,
    SkippedFace,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

#[derive(Parser)]
#[command(
    name = "facecheck",
    version,
    about = "Assess face image quality and apply guarded enhancement"
)]
struct Cli {
    /// Image to analyze; prompts on stdin when omitted
    path: Option<PathBuf>,

    /// Print the per-face report as JSON
    #[arg(long)]
    json: bool,

    /// Analyze and report only; never modify faces
    #[arg(long)]
    no_enhance: bool,

    /// Where to write the composite image
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a Path,
    output: Option<&'a Path>,
    faces: &'a [FaceReport],
    skipped: &'a [SkippedFace],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if cli.no_enhance {
        config.enhance = false;
    }
    tracing::debug!(?config, "configuration loaded");

    let path = match cli.path {
        Some(path) => path,
        None => match prompt_for_path()? {
            Some(path) => path,
            None => {
                println!("Operation cancelled: no file selected.");
                return Ok(());
            }
        },
    };

    if !has_supported_extension(&path) {
        tracing::warn!(
            path = %path.display(),
            "unrecognized image extension; attempting to decode anyway"
        );
    }

    let image = load_image(&path)?;

    let model_path = config.scrfd_model_path();
    let detector = ScrfdDetector::load(&model_path)
        .with_context(|| format!("failed to load face detector from {}", model_path.display()))?
        .with_confidence_threshold(config.min_confidence);

    let options = PipelineOptions {
        padding_ratio: config.padding_ratio,
        enhance: config.enhance,
    };
    let mut pipeline = Pipeline::new(detector, options);
    let outcome = pipeline
        .run(&image)
        .with_context(|| format!("failed to analyze {}", path.display()))?;

    match outcome {
        PipelineOutcome::NoFaces => {
            if cli.json {
                print_json(&JsonReport {
                    source: &path,
                    output: None,
                    faces: &[],
                    skipped: &[],
                })?;
            } else {
                println!("No faces detected in the selected image.");
            }
        }
        PipelineOutcome::Processed {
            faces,
            skipped,
            composite,
        } => {
            save_image(&composite, &config.output_path)?;

            if cli.json {
                print_json(&JsonReport {
                    source: &path,
                    output: Some(&config.output_path),
                    faces: &faces,
                    skipped: &skipped,
                })?;
            } else {
                for face in &faces {
                    println!("{face}");
                }
                for skip in &skipped {
                    println!("{skip}");
                }
                println!("{}", summary_line(&faces, &skipped));
                println!("Result saved to {}", config.output_path.display());
            }
        }
    }

    Ok(())
}

fn print_json(report: &JsonReport<'_>) -> Result<()> {
    let text = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{text}");
    Ok(())
}

/// Ask for an image path on stdin. `None` means the user cancelled.
fn prompt_for_path() -> Result<Option<PathBuf>> {
    print!("Image to analyze: ");
    std::io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(parse_selection(if read == 0 { None } else { Some(&line) }))
}

/// Interpret one prompt answer. EOF and blank answers cancel; quotes left by
/// drag-and-drop into a terminal are stripped.
fn parse_selection(answer: Option<&str>) -> Option<PathBuf> {
    let trimmed = answer?.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed)
        .trim();
    if unquoted.is_empty() {
        None
    } else {
        Some(PathBuf::from(unquoted))
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
