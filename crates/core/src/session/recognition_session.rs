use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::recognition::domain::confidence_smoother::{ConfidenceSmoother, DisplayedPrediction};
use crate::recognition::domain::gesture::Prediction;
use crate::recognition::domain::gesture_detector::GestureDetector;
use crate::recognition::domain::prediction_history::{PredictionHistory, Rejection};
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::session::session_state::{FrameDisposition, SessionState, SkipReason};
use crate::shared::busy_flag::BusyFlag;
use crate::shared::clock::Clock;
use crate::shared::config::SessionConfig;
use crate::shared::frame::Frame;

struct Inner {
    active: bool,
    model_ready: bool,
    load_progress: u8,
    displayed: DisplayedPrediction,
    history: PredictionHistory,
}

/// Owns a detector and turns its per-frame results into display state and
/// a de-duplicated history.
///
/// All methods take `&self`; share the session across the capture and UI
/// threads with `Arc`. Frames arriving while another frame is being
/// processed are dropped.
pub struct RecognitionSession {
    detector: GestureDetector,
    smoother: ConfidenceSmoother,
    clock: Arc<dyn Clock>,
    processing: BusyFlag,
    inner: Mutex<Inner>,
}

impl RecognitionSession {
    /// Fails when the smoothing thresholds are out of order or the history
    /// capacity is zero.
    pub fn new(
        detector: GestureDetector,
        config: &SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, &'static str> {
        let thresholds = [
            config.display_threshold,
            config.history_threshold,
            config.clear_threshold,
        ];
        if !thresholds.iter().all(|t| (0.0..=1.0).contains(t)) {
            return Err("thresholds must be between 0.0 and 1.0");
        }
        if config.display_threshold >= config.history_threshold {
            return Err("display_threshold must be below history_threshold");
        }
        if config.clear_threshold > config.display_threshold {
            return Err("clear_threshold must not exceed display_threshold");
        }
        if !(config.decay_step > 0.0 && config.decay_step <= 1.0) {
            return Err("decay_step must be in (0.0, 1.0]");
        }
        let history = PredictionHistory::from_config(config)?;

        Ok(Self {
            detector,
            smoother: ConfidenceSmoother::from_config(config),
            clock,
            processing: BusyFlag::new(),
            inner: Mutex::new(Inner {
                active: false,
                model_ready: false,
                load_progress: 0,
                displayed: DisplayedPrediction::default(),
                history,
            }),
        })
    }

    /// Loads the detector's models, mirroring progress into the state.
    ///
    /// A failed load leaves the session unusable for detection until a
    /// later `load` succeeds.
    pub fn load(&self) -> Result<(), RecognitionError> {
        let result = self.detector.initialize(&|p| {
            self.lock().load_progress = p;
        });

        let mut inner = self.lock();
        match result {
            Ok(()) => {
                inner.model_ready = true;
                inner.load_progress = 100;
                Ok(())
            }
            Err(e) => {
                log::error!("Model load failed: {e}");
                inner.model_ready = false;
                Err(e)
            }
        }
    }

    /// Returns `false` without activating if the model is not loaded.
    pub fn start(&self) -> bool {
        let mut inner = self.lock();
        if !inner.model_ready {
            log::warn!("Cannot start recognition: model not loaded");
            return false;
        }
        inner.active = true;
        log::info!("Recognition started");
        true
    }

    /// Deactivates and resets the displayed prediction. History is kept.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.active = false;
        inner.displayed.reset();
        log::info!("Recognition stopped");
    }

    pub fn process_frame(&self, frame: &Frame) -> FrameDisposition {
        {
            let inner = self.lock();
            if !inner.active {
                return FrameDisposition::Skipped(SkipReason::Inactive);
            }
            if !inner.model_ready {
                return FrameDisposition::Skipped(SkipReason::ModelNotReady);
            }
        }
        let Some(_processing) = self.processing.try_acquire() else {
            log::trace!("Session busy, dropping frame {}", frame.index());
            return FrameDisposition::Skipped(SkipReason::Busy);
        };

        let captured_at = self.clock.now();
        let result = self.detector.detect_gesture(frame);

        let mut guard = self.lock();
        let inner = &mut *guard;
        // stop() while detecting: the result belongs to a finished run
        if !inner.active {
            return FrameDisposition::Processed;
        }

        if let Some(shown) = self.smoother.apply(&mut inner.displayed, result) {
            let prediction = Prediction {
                gesture: shown.gesture,
                confidence: shown.confidence,
                timestamp: captured_at,
            };
            match inner.history.offer(prediction) {
                Ok(()) => log::info!(
                    "Recognized \"{}\" ({:.0}%)",
                    prediction.gesture,
                    prediction.confidence * 100.0
                ),
                Err(Rejection::Duplicate) => {
                    log::trace!("Repeat of \"{}\" not recorded", prediction.gesture)
                }
                Err(Rejection::BelowThreshold) => {}
            }
        }
        FrameDisposition::Processed
    }

    /// Empties the history. The displayed prediction is untouched.
    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    pub fn snapshot(&self) -> SessionState {
        let inner = self.lock();
        SessionState {
            active: inner.active,
            label: inner.displayed.gesture,
            confidence: inner.displayed.confidence,
            history: inner.history.to_vec(),
            model_ready: inner.model_ready,
            load_progress: inner.load_progress,
        }
    }

    /// Releases the detector's models. Idempotent; also run on drop.
    pub fn shutdown(&self) {
        self.detector.dispose();
        let mut inner = self.lock();
        inner.active = false;
        inner.model_ready = false;
        inner.displayed.reset();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
