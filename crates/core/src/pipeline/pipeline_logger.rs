use std::collections::BTreeMap;
use std::time::Instant;

use crate::recognition::domain::gesture::Prediction;
use crate::session::session_state::{FrameDisposition, SkipReason};

/// Observer for recognition runs.
///
/// Use cases report through this trait so the CLI, tests and any future
/// front end can watch a run without changing its orchestration.
pub trait PipelineLogger: Send {
    /// Report frame-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record what the session did with one frame and how long it took.
    fn frame(&mut self, index: usize, disposition: FrameDisposition, elapsed_ms: f64);

    /// A prediction was admitted to the history.
    fn prediction(&mut self, prediction: &Prediction);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn frame(&mut self, _index: usize, _disposition: FrameDisposition, _elapsed_ms: f64) {}
    fn prediction(&mut self, _prediction: &Prediction) {}
    fn info(&mut self, _message: &str) {}
}

/// Forwards events to the `log` crate and keeps per-disposition counts and
/// processing times for the closing summary.
///
/// Progress lines are throttled to every `throttle_frames` frames.
pub struct LogPipelineLogger {
    throttle_frames: usize,
    start_time: Instant,
    processed_ms: Vec<f64>,
    skipped: BTreeMap<&'static str, usize>,
    predictions: usize,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            start_time: Instant::now(),
            processed_ms: Vec::new(),
            skipped: BTreeMap::new(),
            predictions: 0,
        }
    }

    pub fn processed(&self) -> usize {
        self.processed_ms.len()
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(skip_label(reason)).copied().unwrap_or(0)
    }

    /// Returns the formatted summary, or `None` if no frame was seen.
    pub fn summary_string(&self) -> Option<String> {
        let skipped: usize = self.skipped.values().sum();
        let frames = self.processed() + skipped;
        if frames == 0 {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Recognition summary ({frames} frames, {elapsed_s:.1}s total):"
        )];

        if !self.processed_ms.is_empty() {
            let total_ms: f64 = self.processed_ms.iter().sum();
            let avg_ms = total_ms / self.processed_ms.len() as f64;
            let max_ms = self.processed_ms.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  processed   : {:5}  avg {avg_ms:6.1}ms  max {max_ms:6.1}ms",
                self.processed()
            ));
        }
        for (reason, count) in &self.skipped {
            lines.push(format!("  skipped {reason:<16}: {count:5}"));
        }
        lines.push(format!("  predictions : {:5}", self.predictions));

        Some(lines.join("\n"))
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Recognizing: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn frame(&mut self, index: usize, disposition: FrameDisposition, elapsed_ms: f64) {
        match disposition {
            FrameDisposition::Processed => self.processed_ms.push(elapsed_ms),
            FrameDisposition::Skipped(reason) => {
                log::trace!("Frame {index} skipped: {reason:?}");
                *self.skipped.entry(skip_label(reason)).or_default() += 1;
            }
        }
    }

    fn prediction(&mut self, prediction: &Prediction) {
        self.predictions += 1;
        log::info!(
            "{} ({:.0}%) at {:.2}s",
            prediction.gesture,
            prediction.confidence * 100.0,
            prediction.timestamp.as_secs_f64()
        );
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Inactive => "inactive",
        SkipReason::ModelNotReady => "model_not_ready",
        SkipReason::Busy => "busy",
    }
}
