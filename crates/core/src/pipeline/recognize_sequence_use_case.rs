use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::domain::gesture::Prediction;
use crate::session::recognition_session::RecognitionSession;
use crate::session::session_state::{FrameDisposition, SessionState};
use crate::shared::clock::ManualClock;
use crate::shared::constants::DEFAULT_CAPTURE_FPS;
use crate::shared::video_metadata::{frame_time_at, VideoMetadata};
use crate::video::domain::video_reader::VideoReader;

/// Outcome of a recognition run over a recorded sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionReport {
    pub total_frames: usize,
    pub processed_frames: usize,
    pub skipped_frames: usize,
    /// Oldest first.
    pub history: Vec<Prediction>,
    pub final_state: SessionState,
}

/// Replays recorded frames through a session as if they were captured live.
///
/// The session must share `clock`; before each frame the clock is moved to
/// that frame's capture time (`index / fps`), so throttling and history
/// de-duplication follow the recording's timeline rather than wall time.
pub struct RecognizeSequenceUseCase {
    reader: Box<dyn VideoReader>,
    session: Arc<RecognitionSession>,
    clock: Arc<ManualClock>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
}

impl RecognizeSequenceUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        session: Arc<RecognitionSession>,
        clock: Arc<ManualClock>,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> Self {
        Self {
            reader,
            session,
            clock,
            logger,
            on_progress,
        }
    }

    /// Loads models if needed, starts the session and feeds every frame.
    ///
    /// Frame read errors abort the run. A progress callback returning
    /// `false` cancels it.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
    ) -> Result<RecognitionReport, Box<dyn std::error::Error>> {
        let fps = if metadata.has_known_rate() {
            metadata.fps
        } else {
            DEFAULT_CAPTURE_FPS
        };
        let total = metadata.total_frames;

        if !self.session.snapshot().model_ready {
            self.logger.info("Loading models");
            self.session.load()?;
        }
        if !self.session.start() {
            return Err("session could not start".into());
        }
        self.logger.info(&format!(
            "Recognizing {total} frames at {fps:.1} fps"
        ));

        let mut processed = 0;
        let mut skipped = 0;
        let mut cancelled = false;
        let mut last_recorded = self.session.snapshot().history.last().copied();

        for frame in self.reader.frames() {
            let frame = frame?;
            self.clock.set(frame_time_at(frame.index(), fps));

            let started = Instant::now();
            let disposition = self.session.process_frame(&frame);
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            self.logger.frame(frame.index(), disposition, elapsed_ms);
            match disposition {
                FrameDisposition::Processed => processed += 1,
                FrameDisposition::Skipped(_) => skipped += 1,
            }

            let latest = self.session.snapshot().history.last().copied();
            if latest != last_recorded {
                if let Some(prediction) = &latest {
                    self.logger.prediction(prediction);
                }
                last_recorded = latest;
            }

            let current = frame.index() + 1;
            self.logger.progress(current, total);
            if let Some(ref callback) = self.on_progress {
                if !callback(current, total) {
                    cancelled = true;
                    break;
                }
            }
        }

        self.reader.close();
        if cancelled {
            self.session.stop();
            return Err("Cancelled".into());
        }
        let final_state = self.session.snapshot();
        self.session.stop();
        self.logger.summary();

        Ok(RecognitionReport {
            total_frames: processed + skipped,
            processed_frames: processed,
            skipped_frames: skipped,
            history: final_state.history.clone(),
            final_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::recognition::domain::gesture::Gesture;
    use crate::recognition::domain::gesture_detector::GestureDetector;
    use crate::recognition::domain::recognition_error::ModelComponent;
    use crate::session::session_state::SkipReason;
    use crate::shared::config::{DetectorConfig, SessionConfig};
    use crate::shared::frame::Frame;
    use crate::test_support::{FakeProvider, Probe, Step};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeReader {
        count: usize,
    }

    impl VideoReader for FakeReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(metadata(self.count, 10.0))
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new((0..self.count).map(|i| Ok::<_, Box<dyn std::error::Error>>(Frame::blank(i))))
        }

        fn close(&mut self) {}
    }

    struct FailingReader;

    impl VideoReader for FailingReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(metadata(3, 10.0))
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let frames: Vec<Result<Frame, Box<dyn std::error::Error>>> =
                vec![Ok(Frame::blank(0)), Err("truncated capture".into())];
            Box::new(frames.into_iter())
        }

        fn close(&mut self) {}
    }

    /// Records what the use case reports.
    #[derive(Clone, Default)]
    struct RecordingLogger {
        predictions: Arc<Mutex<Vec<Prediction>>>,
        frames: Arc<Mutex<Vec<FrameDisposition>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, _current: usize, _total: usize) {}
        fn frame(&mut self, _index: usize, disposition: FrameDisposition, _elapsed_ms: f64) {
            self.frames.lock().unwrap().push(disposition);
        }
        fn prediction(&mut self, prediction: &Prediction) {
            self.predictions.lock().unwrap().push(*prediction);
        }
        fn info(&mut self, _message: &str) {}
    }

    fn metadata(total_frames: usize, fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 0,
            height: 0,
            fps,
            total_frames,
            source_path: None,
        }
    }

    fn session(
        provider: FakeProvider,
        config: DetectorConfig,
        clock: Arc<ManualClock>,
    ) -> Arc<RecognitionSession> {
        let detector = GestureDetector::new(Box::new(provider), config, clock.clone()).unwrap();
        Arc::new(RecognitionSession::new(detector, &SessionConfig::default(), clock).unwrap())
    }

    fn use_case(
        reader: Box<dyn VideoReader>,
        provider: FakeProvider,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> RecognizeSequenceUseCase {
        let config = DetectorConfig {
            min_fill: 3,
            ..DetectorConfig::default()
        };
        use_case_with(reader, provider, config, logger, on_progress)
    }

    fn use_case_with(
        reader: Box<dyn VideoReader>,
        provider: FakeProvider,
        config: DetectorConfig,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> RecognizeSequenceUseCase {
        let clock = Arc::new(ManualClock::new());
        RecognizeSequenceUseCase::new(
            reader,
            session(provider, config, clock.clone()),
            clock,
            logger,
            on_progress,
        )
    }

    #[test]
    fn test_follows_recording_timeline() {
        // 10 fps: one frame every 100ms, throttle 200ms lets every other
        // frame through. 24 frames span 2.3s; the dedup window is 2s.
        let probe = Probe::new(Gesture::Hello, 0.9);
        let logger = RecordingLogger::default();
        let mut uc = use_case(
            Box::new(FakeReader { count: 24 }),
            FakeProvider::always_hand(probe.clone()),
            Box::new(logger.clone()),
            None,
        );

        let report = uc.execute(&metadata(24, 10.0)).unwrap();

        assert_eq!(report.total_frames, 24);
        assert_eq!(report.processed_frames, 24);
        assert_eq!(report.skipped_frames, 0);
        // frames 0, 2, 4, ... 22 pass the throttle
        assert_eq!(probe.extract_calls(), 12);
        // window reaches min_fill at frame 4
        let timestamps: Vec<u128> = report.history.iter().map(|p| p.timestamp.as_millis()).collect();
        assert_eq!(timestamps, vec![400]);
        assert_eq!(report.final_state.label, Some(Gesture::Hello));
        assert!(report.final_state.active);
        assert_eq!(*logger.predictions.lock().unwrap(), report.history);
    }

    #[test]
    fn test_dedup_window_follows_timeline() {
        let probe = Probe::new(Gesture::Hello, 0.9);
        let mut uc = use_case(
            Box::new(FakeReader { count: 30 }),
            FakeProvider::always_hand(probe),
            Box::new(NullPipelineLogger),
            None,
        );

        let report = uc.execute(&metadata(30, 10.0)).unwrap();

        let timestamps: Vec<u128> = report.history.iter().map(|p| p.timestamp.as_millis()).collect();
        assert_eq!(timestamps, vec![400, 2400]);
    }

    #[test]
    fn test_model_load_failure_aborts() {
        let mut uc = use_case(
            Box::new(FakeReader { count: 5 }),
            FakeProvider::always_hand(Probe::default())
                .failing_load(ModelComponent::SequenceClassifier),
            Box::new(NullPipelineLogger),
            None,
        );

        let err = uc.execute(&metadata(5, 10.0)).unwrap_err();
        assert!(err.to_string().contains("classifier"));
    }

    #[test]
    fn test_cancellation_stops_early() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let mut uc = use_case(
            Box::new(FakeReader { count: 50 }),
            FakeProvider::always_hand(Probe::new(Gesture::Hello, 0.9)),
            Box::new(NullPipelineLogger),
            Some(Box::new(move |current, _total| {
                counter.store(current, Ordering::SeqCst);
                current < 5
            })),
        );

        let err = uc.execute(&metadata(50, 10.0)).unwrap_err();
        assert_eq!(err.to_string(), "Cancelled");
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_read_error_aborts() {
        let mut uc = use_case(
            Box::new(FailingReader),
            FakeProvider::always_hand(Probe::default()),
            Box::new(NullPipelineLogger),
            None,
        );

        let err = uc.execute(&metadata(3, 10.0)).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_no_hands_means_empty_history() {
        let probe = Probe::new(Gesture::ThankYou, 0.9);
        let logger = RecordingLogger::default();
        let mut uc = use_case(
            Box::new(FakeReader { count: 12 }),
            FakeProvider::new(vec![Step::NoHand], probe.clone()),
            Box::new(logger.clone()),
            None,
        );

        let report = uc.execute(&metadata(12, 10.0)).unwrap();

        assert!(report.history.is_empty());
        assert_eq!(report.final_state.label, None);
        assert_eq!(probe.classify_calls(), 0);
        assert!(logger.predictions.lock().unwrap().is_empty());
        assert!(logger
            .frames
            .lock()
            .unwrap()
            .iter()
            .all(|d| *d != FrameDisposition::Skipped(SkipReason::Busy)));
    }

    #[test]
    fn test_unknown_fps_uses_default_cadence() {
        let probe = Probe::new(Gesture::Hello, 0.9);
        let mut uc = use_case(
            Box::new(FakeReader { count: 31 }),
            FakeProvider::always_hand(probe),
            Box::new(NullPipelineLogger),
            None,
        );

        let report = uc.execute(&metadata(31, 0.0)).unwrap();

        // 1/30s per frame: the throttle admits frames 0, 6 and 12
        let timestamps: Vec<u128> = report.history.iter().map(|p| p.timestamp.as_millis()).collect();
        assert_eq!(timestamps, vec![400]);
    }

    #[test]
    fn test_throttle_admits_frame_exactly_one_interval_later_at_30_fps() {
        let probe = Probe::new(Gesture::Hello, 0.9);
        let mut uc = use_case(
            Box::new(FakeReader { count: 7 }),
            FakeProvider::always_hand(probe.clone()),
            Box::new(NullPipelineLogger),
            None,
        );

        uc.execute(&metadata(7, 30.0)).unwrap();

        // frame 6 is captured exactly 200ms after frame 0
        assert_eq!(probe.extract_calls(), 2);
    }

    #[test]
    fn test_history_admits_repeat_exactly_dedup_window_later_at_30_fps() {
        let config = DetectorConfig {
            min_fill: 1,
            throttle_ms: 0,
            ..DetectorConfig::default()
        };
        let mut uc = use_case_with(
            Box::new(FakeReader { count: 61 }),
            FakeProvider::always_hand(Probe::new(Gesture::Hello, 0.9)),
            config,
            Box::new(NullPipelineLogger),
            None,
        );

        let report = uc.execute(&metadata(61, 30.0)).unwrap();

        let timestamps: Vec<Duration> = report.history.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![Duration::ZERO, Duration::from_secs(2)]);
    }
}
