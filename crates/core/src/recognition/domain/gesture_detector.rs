use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use crate::recognition::domain::gesture::{ClassificationResult, Gesture};
use crate::recognition::domain::landmark_extractor::LandmarkExtractor;
use crate::recognition::domain::landmark_window::LandmarkWindow;
use crate::recognition::domain::model_provider::{GestureModelProvider, LoadProgress};
use crate::recognition::domain::recognition_error::{
    DetectionError, ModelComponent, RecognitionError,
};
use crate::recognition::domain::sequence_classifier::SequenceClassifier;
use crate::shared::busy_flag::BusyFlag;
use crate::shared::clock::Clock;
use crate::shared::config::DetectorConfig;
use crate::shared::frame::Frame;

struct LoadedModels {
    extractor: Box<dyn LandmarkExtractor>,
    classifier: Box<dyn SequenceClassifier>,
}

struct DetectorState {
    provider: Option<Box<dyn GestureModelProvider>>,
    models: Option<LoadedModels>,
    window: LandmarkWindow,
    last_run: Option<Duration>,
    disposed: bool,
}

/// Turns frames into gesture results, keeping a landmark window across calls.
///
/// A call does real work only when no other detection is in flight, the
/// models are loaded and `throttle` has elapsed since the last call that did
/// work. Everything else returns `None` immediately; frames are dropped,
/// never queued.
///
/// The classifier runs once the window holds `min_fill` frames; until it is
/// full the input is left-padded with zero rows.
///
/// `is_ready` and `window_len` read atomic mirrors of the state and never
/// contend with a detection call for the state lock.
pub struct GestureDetector {
    config: DetectorConfig,
    clock: Arc<dyn Clock>,
    busy: BusyFlag,
    ready: AtomicBool,
    window_fill: AtomicUsize,
    state: Mutex<DetectorState>,
}

impl GestureDetector {
    pub fn new(
        provider: Box<dyn GestureModelProvider>,
        config: DetectorConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, &'static str> {
        if config.min_fill < 1 || config.min_fill > config.window_size {
            return Err("min_fill must be between 1 and window_size");
        }
        let window = LandmarkWindow::new(config.window_size)?;
        Ok(Self {
            config,
            clock,
            busy: BusyFlag::new(),
            ready: AtomicBool::new(false),
            window_fill: AtomicUsize::new(0),
            state: Mutex::new(DetectorState {
                provider: Some(provider),
                models: None,
                window,
                last_run: None,
                disposed: false,
            }),
        })
    }

    /// Loads the landmark extractor, then the classifier.
    ///
    /// Progress covers both loads: 0..=50 for the extractor, 50..=100 for
    /// the classifier. Once loaded, further calls return `Ok` without
    /// reloading.
    pub fn initialize(&self, progress: LoadProgress<'_>) -> Result<(), RecognitionError> {
        let mut state = self.lock_state();
        if state.disposed {
            return Err(RecognitionError::Disposed);
        }
        if state.models.is_some() {
            return Ok(());
        }
        let provider = state.provider.as_mut().ok_or(RecognitionError::Disposed)?;

        progress(0);
        let extractor = provider
            .load_extractor(&|p| progress(p.min(100) / 2))
            .map_err(|e| RecognitionError::Initialization {
                component: ModelComponent::LandmarkExtractor,
                source: e,
            })?;
        let classifier = provider
            .load_classifier(&|p| progress(50 + p.min(100) / 2))
            .map_err(|e| RecognitionError::Initialization {
                component: ModelComponent::SequenceClassifier,
                source: e,
            })?;
        progress(100);

        state.models = Some(LoadedModels {
            extractor,
            classifier,
        });
        self.ready.store(true, Ordering::Release);
        log::info!(
            "Gesture detector ready (window {}, min fill {}, throttle {}ms)",
            self.config.window_size,
            self.config.min_fill,
            self.config.throttle_ms
        );
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn window_len(&self) -> usize {
        self.window_fill.load(Ordering::Acquire)
    }

    /// Runs one detection step. Never fails: per-frame errors are logged
    /// and reported as `None`.
    pub fn detect_gesture(&self, frame: &Frame) -> Option<ClassificationResult> {
        let Some(_busy) = self.busy.try_acquire() else {
            log::trace!("Detector busy, dropping frame {}", frame.index());
            return None;
        };
        let mut guard = match self.state.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            // initialize() or dispose() in progress
            Err(TryLockError::WouldBlock) => return None,
        };
        let state = &mut *guard;

        let Some(models) = state.models.as_mut() else {
            log::trace!("Detector not ready, dropping frame {}", frame.index());
            return None;
        };

        let now = self.clock.now();
        if let Some(last) = state.last_run {
            if now.saturating_sub(last) < self.config.throttle() {
                log::trace!("Throttled frame {}", frame.index());
                return None;
            }
        }
        state.last_run = Some(now);

        let result = run_models(models, &mut state.window, frame, &self.config);
        self.window_fill.store(state.window.len(), Ordering::Release);
        match result {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Detection failed on frame {}: {e}", frame.index());
                None
            }
        }
    }

    /// Releases the models and clears the window. Safe to call repeatedly
    /// and before `initialize`.
    pub fn dispose(&self) {
        let mut state = self.lock_state();
        if state.disposed {
            return;
        }
        state.models = None;
        state.provider = None;
        state.window.clear();
        state.last_run = None;
        state.disposed = true;
        self.ready.store(false, Ordering::Release);
        self.window_fill.store(0, Ordering::Release);
        log::info!("Gesture detector disposed");
    }

    fn lock_state(&self) -> MutexGuard<'_, DetectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_models(
    models: &mut LoadedModels,
    window: &mut LandmarkWindow,
    frame: &Frame,
    config: &DetectorConfig,
) -> Result<Option<ClassificationResult>, DetectionError> {
    let Some(landmarks) = models
        .extractor
        .extract(frame)
        .map_err(DetectionError::Extraction)?
    else {
        log::trace!("No hand in frame {}", frame.index());
        return Ok(None);
    };
    window.push(landmarks);

    if window.len() < config.min_fill {
        return Ok(None);
    }

    let input = window.to_padded_input();
    let scores = models
        .classifier
        .classify(input.view())
        .map_err(DetectionError::Classification)?;
    if scores.len() != Gesture::ALL.len() {
        return Err(DetectionError::OutputShape {
            expected: Gesture::ALL.len(),
            actual: scores.len(),
        });
    }

    let Some(top) = ClassificationResult::from_scores(&scores) else {
        return Ok(None);
    };
    log::debug!(
        "Frame {}: {} ({:.2})",
        frame.index(),
        top.gesture,
        top.confidence
    );
    if top.confidence > config.acceptance_threshold {
        Ok(Some(top))
    } else {
        Ok(None)
    }
}
