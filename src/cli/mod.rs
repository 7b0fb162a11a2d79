//! # CLI Module
//!
//! Command-line interface for the entity matcher.
//!
//! ## Usage
//! ```bash
//! # Match every entity across the default folder
//! entity-match run --detector yolov8m.onnx --encoder clip-vit-base-patch16-vision.onnx
//!
//! # Five matches per entity, written elsewhere
//! entity-match run ~/Photos --top-k 5 --output ~/matches
//!
//! # JSON output
//! entity-match run ~/Photos --format json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use entity_match::core::annotate::BoxScope;
use entity_match::core::detector::{coco_labels, load_labels, DetectorConfig, YoloDetector};
use entity_match::core::embedder::{ClipEncoder, EncoderConfig};
use entity_match::core::grouping::GroupingMode;
use entity_match::core::pipeline::{Pipeline, PipelineResult};
use entity_match::error::Result;
use entity_match::events::{DetectEvent, Event, EventChannel, PipelineEvent, RankEvent, ScanEvent};
use entity_match::EntityMatchError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;

/// Entity Match - Find the photos that share an object and look alike
#[derive(Parser, Debug)]
#[command(name = "entity-match")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect, group and rank the images in a folder
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Folder of JPEG images
    #[arg(default_value = "All_Images")]
    images_dir: PathBuf,

    /// YOLOv8 ONNX model
    #[arg(long, default_value = "yolov8m.onnx")]
    detector: PathBuf,

    /// CLIP vision ONNX model
    #[arg(long, default_value = "clip-vit-base-patch16-vision.onnx")]
    encoder: PathBuf,

    /// Newline-separated class names (defaults to COCO)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Output root (defaults to the images folder)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum detection confidence (0-1)
    #[arg(long, default_value = "0.5")]
    confidence: f32,

    /// IoU above which overlapping boxes of one class are merged
    #[arg(long, default_value = "0.7")]
    iou: f32,

    /// Matches saved per entity
    #[arg(short = 'k', long, default_value = "3")]
    top_k: usize,

    /// When images join an entity group
    #[arg(long, default_value = "complete")]
    grouping: Grouping,

    /// Which boxes the drawn rectangle encloses
    #[arg(long, default_value = "all-images")]
    box_scope: Scope,

    /// Also save every image with its raw detections drawn
    #[arg(long)]
    save_detections: bool,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Grouping {
    /// Every image sharing the label (default)
    Complete,
    /// Only images processed at or before the reference
    Incremental,
}

impl From<Grouping> for GroupingMode {
    fn from(grouping: Grouping) -> Self {
        match grouping {
            Grouping::Complete => GroupingMode::Complete,
            Grouping::Incremental => GroupingMode::Incremental,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scope {
    /// Boxes of the label across all images (default)
    AllImages,
    /// Boxes found in the matched image only
    CandidateOnly,
}

impl From<Scope> for BoxScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::AllImages => BoxScope::AllImages,
            Scope::CandidateOnly => BoxScope::CandidateOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (written files only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_matcher(args),
    }
}

fn run_matcher(args: RunArgs) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(args.format, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Entity Match").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Models load before any work so a bad path aborts immediately
    let labels = match args.labels {
        Some(ref path) => load_labels(path)?,
        None => coco_labels(),
    };
    let detector = YoloDetector::load(
        &args.detector,
        DetectorConfig {
            confidence_threshold: args.confidence,
            iou_threshold: args.iou,
            labels,
            ..Default::default()
        },
    )?;
    let encoder = ClipEncoder::load(&args.encoder, EncoderConfig::default())?;

    let mut pipeline = Pipeline::builder()
        .paths(vec![args.images_dir.clone()])
        .output_dir(args.output.clone())
        .detector(Box::new(detector))
        .embedder(Box::new(encoder))
        .top_k(args.top_k)
        .min_confidence(args.confidence)
        .grouping(args.grouping.into())
        .box_scope(args.box_scope.into())
        .save_detections(args.save_detections)
        .include_hidden(args.include_hidden)
        .build()?;

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    let progress = if pretty {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| EntityMatchError::Config(e.to_string()))?
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Completed { total_images }) => {
                    pb.set_length(total_images as u64);
                }
                Event::Detect(DetectEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(format!(
                            "{} ({} objects)",
                            p.current_path.file_name().unwrap_or_default().to_string_lossy(),
                            p.detections
                        ));
                    }
                }
                Event::Rank(RankEvent::Started { total_references }) => {
                    pb.set_length(total_references as u64);
                    pb.set_position(0);
                }
                Event::Rank(RankEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(format!(
                            "{} (cache: {})",
                            p.current_path.file_name().unwrap_or_default().to_string_lossy(),
                            p.cache_hits
                        ));
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;

    match args.format {
        OutputFormat::Pretty => print_pretty_results(&term, &result, args.verbose),
        OutputFormat::Json => print_json_results(&result)?,
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Matching Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images scanned in {:.1}s",
        style(result.total_images).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} images with detections processed",
        style(result.processed_images).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} entity groups, {} files written",
        style(result.entity_groups()).cyan(),
        style(result.files_written).cyan()
    ))
    .ok();

    if result.cache_hits > 0 {
        term.write_line(&format!("  {} cache hits", style(result.cache_hits).dim()))
            .ok();
    }

    if !result.errors.is_empty() {
        term.write_line(&format!(
            "  {} non-fatal errors",
            style(result.errors.len()).yellow()
        ))
        .ok();
    }

    term.write_line("").ok();

    if result.entity_groups() == 0 {
        term.write_line(&format!(
            "  {} No entity appears in more than one image",
            style("○").dim()
        ))
        .ok();
    } else {
        term.write_line(&format!("{}", style("Matches:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for reference in result.references.iter().filter(|r| !r.entities.is_empty()) {
            term.write_line(&format!(
                "  {}",
                style(display_path(&reference.image)).bold()
            ))
            .ok();

            for entity in &reference.entities {
                term.write_line(&format!(
                    "    {} {} ({} candidates)",
                    style("▸").green(),
                    style(&entity.entity).yellow(),
                    entity.candidates - 1
                ))
                .ok();

                for matched in &entity.matches {
                    term.write_line(&format!(
                        "      {} {} {}",
                        style(format!("#{}", matched.rank)).dim(),
                        display_path(&matched.image),
                        style(format!("{:.3}", matched.score)).cyan()
                    ))
                    .ok();
                }
            }

            term.write_line("").ok();
        }
    }

    if verbose {
        for error in &result.errors {
            term.write_line(&format!("  {} {}", style("!").yellow(), error))
                .ok();
        }
    }
}

fn print_json_results(result: &PipelineResult) -> Result<()> {
    let output = serde_json::to_string_pretty(result)
        .map_err(|e| EntityMatchError::Config(format!("could not serialize results: {}", e)))?;
    println!("{}", output);
    Ok(())
}

fn print_minimal_results(result: &PipelineResult) {
    for reference in &result.references {
        for entity in &reference.entities {
            for matched in &entity.matches {
                println!("{}", matched.output.display());
            }
        }
    }
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    let home = dirs::home_dir().unwrap_or_default();
    match path.strip_prefix(&home) {
        Ok(relative) if !home.as_os_str().is_empty() => format!("~/{}", relative.display()),
        _ => path.display().to_string(),
    }
}
