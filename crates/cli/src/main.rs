use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use handsign_core::pipeline::pipeline_logger::LogPipelineLogger;
use handsign_core::pipeline::recognize_sequence_use_case::{
    RecognitionReport, RecognizeSequenceUseCase,
};
use handsign_core::recognition::domain::gesture_detector::GestureDetector;
use handsign_core::recognition::infrastructure::model_resolver::ModelSource;
use handsign_core::recognition::infrastructure::onnx_model_provider::{
    ExtractorSource, OnnxModelProvider,
};
use handsign_core::session::recognition_session::RecognitionSession;
use handsign_core::shared::clock::ManualClock;
use handsign_core::shared::config::{ConfigError, RecognitionConfig};
use handsign_core::shared::constants::{
    DEFAULT_CAPTURE_FPS, GESTURE_CLASSIFIER_MODEL_NAME, HAND_LANDMARK_MODEL_NAME,
};
use handsign_core::shared::video_metadata::VideoMetadata;
use handsign_core::video::domain::video_reader::VideoReader;
use handsign_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;
use handsign_core::video::infrastructure::recording_frame_reader::RecordingFrameReader;

/// Offline hand-sign recognition over captured frames or landmark recordings.
#[derive(Parser)]
#[command(name = "handsign", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gesture classifier model (.onnx). Defaults to the model cache.
    #[arg(long, global = true)]
    classifier: Option<PathBuf>,

    /// Download URL for the classifier when it is not cached.
    #[arg(long, global = true)]
    classifier_url: Option<String>,

    /// JSON config file. Defaults to the user config, if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the report as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize gestures in a directory of frames, ordered by file name.
    Images {
        /// Directory of captured frames.
        dir: PathBuf,

        /// Capture rate of the frames.
        #[arg(long, default_value_t = DEFAULT_CAPTURE_FPS)]
        fps: f64,

        /// Hand landmark model (.onnx). Defaults to the model cache.
        #[arg(long)]
        landmark_model: Option<PathBuf>,

        /// Download URL for the landmark model when it is not cached.
        #[arg(long)]
        landmark_model_url: Option<String>,
    },
    /// Replay a landmark recording (JSON) through the classifier.
    Replay {
        /// Recording file.
        recording: PathBuf,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = load_config(cli.config.as_deref())?;

    let (reader, metadata, extractor) = open_source(&cli.command)?;
    let classifier = ModelSource {
        path: cli.classifier.clone(),
        url: cli.classifier_url.clone(),
        ..ModelSource::named(GESTURE_CLASSIFIER_MODEL_NAME)
    };
    let provider = OnnxModelProvider::new(extractor, classifier, config.detector.window_size);

    let clock = Arc::new(ManualClock::new());
    let detector = GestureDetector::new(Box::new(provider), config.detector.clone(), clock.clone())?;
    let session = Arc::new(RecognitionSession::new(
        detector,
        &config.session,
        clock.clone(),
    )?);

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rRecognizing frame {current}/{total}");
        true
    });
    let mut use_case = RecognizeSequenceUseCase::new(
        reader,
        session.clone(),
        clock,
        Box::new(LogPipelineLogger::default()),
        Some(progress),
    );
    let report = use_case.execute(&metadata);
    eprintln!();
    session.shutdown();
    let report = report?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn open_source(
    command: &Command,
) -> Result<(Box<dyn VideoReader>, VideoMetadata, ExtractorSource), Box<dyn std::error::Error>> {
    match command {
        Command::Images {
            dir,
            fps,
            landmark_model,
            landmark_model_url,
        } => {
            let mut reader = ImageSequenceReader::new(*fps);
            let metadata = reader.open(dir)?;
            log::info!(
                "{} frames of {}x{} from {}",
                metadata.total_frames,
                metadata.width,
                metadata.height,
                dir.display()
            );
            let source = ModelSource {
                path: landmark_model.clone(),
                url: landmark_model_url.clone(),
                ..ModelSource::named(HAND_LANDMARK_MODEL_NAME)
            };
            let reader: Box<dyn VideoReader> = Box::new(reader);
            Ok((reader, metadata, ExtractorSource::Model(source)))
        }
        Command::Replay { recording } => {
            let mut reader = RecordingFrameReader::new();
            let metadata = reader.open(recording)?;
            let landmarks = reader.recording().ok_or("recording was not loaded")?;
            let reader: Box<dyn VideoReader> = Box::new(reader);
            Ok((reader, metadata, ExtractorSource::Replay(landmarks)))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RecognitionConfig, ConfigError> {
    match path {
        Some(path) => RecognitionConfig::load_from(path),
        None => Ok(RecognitionConfig::load_or_default()),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Images {
            dir,
            fps,
            landmark_model,
            ..
        } => {
            if !dir.is_dir() {
                return Err(format!("Frame directory not found: {}", dir.display()).into());
            }
            if !(*fps > 0.0 && fps.is_finite()) {
                return Err(format!("FPS must be a positive number, got {fps}").into());
            }
            if let Some(path) = landmark_model {
                require_file(path, "Landmark model")?;
            }
        }
        Command::Replay { recording } => require_file(recording, "Recording")?,
    }
    if let Some(path) = &cli.classifier {
        require_file(path, "Classifier model")?;
    }
    if let Some(path) = &cli.config {
        require_file(path, "Config file")?;
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("{what} not found: {}", path.display()).into())
    }
}

fn print_report(report: &RecognitionReport) {
    println!(
        "Recognized {} gesture(s) in {} frames ({} processed, {} skipped)",
        report.history.len(),
        report.total_frames,
        report.processed_frames,
        report.skipped_frames
    );
    for prediction in &report.history {
        println!(
            "  {:7.2}s  {:<10} {:3.0}%",
            prediction.timestamp.as_secs_f64(),
            prediction.gesture.label(),
            prediction.confidence * 100.0
        );
    }
}
