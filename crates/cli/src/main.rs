use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use env_logger::Env;

use proctor_core::detection::domain::confidence_policy::ConfidencePolicy;
use proctor_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CANDIDATE_CONFIDENCE,
};
use proctor_core::pipeline::detect_faces_use_case::DetectFacesUseCase;
use proctor_core::shared::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_STORE_PATH, IMAGE_EXTENSIONS, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};
use proctor_core::shared::model_resolver;
use proctor_core::violation::domain::violation_logger::ViolationLogger;
use proctor_core::violation::domain::violation_store::{shared_store, ViolationStore};
use proctor_core::violation::infrastructure::sqlite_violation_store::SqliteViolationStore;

/// Face-count proctoring checks from the command line.
#[derive(Parser)]
#[command(name = "proctor", version)]
struct Cli {
    /// SQLite file holding violation records.
    #[arg(long, global = true, env = "PROCTOR_STORE", default_value = DEFAULT_STORE_PATH)]
    store: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count faces in an image and record a violation if there is more than one.
    Detect {
        /// Image file (jpg, png, bmp, tiff, webp).
        image: PathBuf,

        /// Face model weights. Resolved from the cache or downloaded when unset.
        #[arg(long, env = "PROCTOR_MODEL")]
        model: Option<PathBuf>,

        /// Minimum confidence (exclusive) for a detection to count as a face.
        #[arg(long, env = "PROCTOR_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
        confidence: f64,
    },
    /// Print recorded violations, newest first.
    Violations {
        /// Show at most this many records.
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Detect {
            image,
            model,
            confidence,
        } => run_detect(&cli.store, &image, model.as_deref(), confidence),
        Command::Violations { limit } => run_list(&cli.store, limit),
    }
}

fn run_detect(
    store_path: &str,
    image: &Path,
    model: Option<&Path>,
    confidence: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_image(image)?;
    let policy = ConfidencePolicy::new(confidence)?;

    let model_path = model_resolver::resolve(
        model,
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        Some(Box::new(model_resolver::report_download_progress)),
    )?;
    let detector = OnnxYoloDetector::new(&model_path, DEFAULT_CANDIDATE_CONFIDENCE)?;
    let store = shared_store(SqliteViolationStore::open(store_path)?);

    let mut use_case =
        DetectFacesUseCase::new(Box::new(detector), ViolationLogger::new(store), policy);
    let bytes = std::fs::read(image)?;
    let outcome = use_case.execute(&bytes)?;

    if outcome.is_violation() {
        log::info!("Violation recorded in {store_path}");
    }
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}

fn run_list(store_path: &str, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SqliteViolationStore::open(store_path)?;
    let violations = store.list_recent(limit)?;
    println!("{}", serde_json::to_string_pretty(&violations)?);
    Ok(())
}

fn validate_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("Image file not found: {}", path.display()).into());
    }
    if !is_image(path) {
        return Err(format!(
            "Unsupported image type: {} (expected one of {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
