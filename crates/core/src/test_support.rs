//! Fakes for the model seams, shared by detector, session and pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};
use ndarray::{Array2, ArrayView2};

use crate::recognition::domain::gesture::Gesture;
use crate::recognition::domain::landmark_extractor::LandmarkExtractor;
use crate::recognition::domain::landmarks::LandmarkFrame;
use crate::recognition::domain::model_provider::{GestureModelProvider, LoadProgress};
use crate::recognition::domain::recognition_error::{BoxError, ModelComponent};
use crate::recognition::domain::sequence_classifier::SequenceClassifier;
use crate::shared::constants::LANDMARK_COUNT;
use crate::shared::frame::Frame;

/// What the fake extractor does on a given call.
#[derive(Clone, Copy, Debug)]
pub enum Step {
    Hand,
    NoHand,
    Fail,
}

/// Shared observation point into fakes handed over to a detector.
#[derive(Clone, Default)]
pub struct Probe {
    pub extract_calls: Arc<AtomicUsize>,
    pub classify_calls: Arc<AtomicUsize>,
    pub loads: Arc<AtomicUsize>,
    pub scores: Arc<Mutex<Vec<f32>>>,
    pub inputs: Arc<Mutex<Vec<Array2<f32>>>>,
}

impl Probe {
    pub fn new(gesture: Gesture, confidence: f32) -> Self {
        let probe = Self::default();
        probe.set_scores(gesture, confidence);
        probe
    }

    pub fn set_scores(&self, gesture: Gesture, confidence: f32) {
        *self.scores.lock().unwrap() = scores_for(gesture, confidence);
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<Array2<f32>> {
        self.inputs.lock().unwrap().last().cloned()
    }
}

/// Scores with `confidence` on `gesture` and zero elsewhere.
pub fn scores_for(gesture: Gesture, confidence: f32) -> Vec<f32> {
    Gesture::ALL
        .iter()
        .map(|g| if *g == gesture { confidence } else { 0.0 })
        .collect()
}

pub fn hand(value: f32) -> LandmarkFrame {
    LandmarkFrame::from_pairs(&vec![[value, value]; LANDMARK_COUNT]).unwrap()
}

pub fn frame(index: usize) -> Frame {
    Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, index)
}

pub struct FakeExtractor {
    steps: Vec<Step>,
    probe: Probe,
}

impl LandmarkExtractor for FakeExtractor {
    fn extract(&mut self, frame: &Frame) -> Result<Option<LandmarkFrame>, BoxError> {
        let call = self.probe.extract_calls.fetch_add(1, Ordering::SeqCst);
        match self.steps[call % self.steps.len()] {
            Step::Hand => Ok(Some(hand((frame.index() % 100) as f32 / 100.0))),
            Step::NoHand => Ok(None),
            Step::Fail => Err("extractor exploded".into()),
        }
    }
}

pub struct FakeClassifier {
    probe: Probe,
    fail: bool,
}

impl SequenceClassifier for FakeClassifier {
    fn classify(&mut self, sequence: ArrayView2<'_, f32>) -> Result<Vec<f32>, BoxError> {
        self.probe.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.inputs.lock().unwrap().push(sequence.to_owned());
        if self.fail {
            return Err("classifier exploded".into());
        }
        Ok(self.probe.scores.lock().unwrap().clone())
    }
}

/// Blocks inside `classify` until released, to hold a detection in flight.
pub struct GateClassifier {
    entered: Sender<()>,
    release: Receiver<()>,
    scores: Vec<f32>,
}

impl GateClassifier {
    /// Returns the classifier plus `(entered, release)` channel ends.
    pub fn new(scores: Vec<f32>) -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let classifier = Self {
            entered: entered_tx,
            release: release_rx,
            scores,
        };
        (classifier, entered_rx, release_tx)
    }
}

impl SequenceClassifier for GateClassifier {
    fn classify(&mut self, _sequence: ArrayView2<'_, f32>) -> Result<Vec<f32>, BoxError> {
        let _ = self.entered.send(());
        self.release.recv()?;
        Ok(self.scores.clone())
    }
}

pub struct FakeProvider {
    steps: Vec<Step>,
    probe: Probe,
    fail: Option<ModelComponent>,
    failing_classifier: bool,
    classifier: Option<Box<dyn SequenceClassifier>>,
}

impl FakeProvider {
    pub fn new(steps: Vec<Step>, probe: Probe) -> Self {
        Self {
            steps,
            probe,
            fail: None,
            failing_classifier: false,
            classifier: None,
        }
    }

    pub fn always_hand(probe: Probe) -> Self {
        Self::new(vec![Step::Hand], probe)
    }

    /// Loading `component` fails.
    pub fn failing_load(mut self, component: ModelComponent) -> Self {
        self.fail = Some(component);
        self
    }

    /// Loads fine, but every `classify` call errors.
    pub fn failing_classifier(mut self) -> Self {
        self.failing_classifier = true;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn SequenceClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }
}

impl GestureModelProvider for FakeProvider {
    fn load_extractor(
        &mut self,
        progress: LoadProgress<'_>,
    ) -> Result<Box<dyn LandmarkExtractor>, BoxError> {
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail == Some(ModelComponent::LandmarkExtractor) {
            return Err("extractor model missing".into());
        }
        progress(100);
        Ok(Box::new(FakeExtractor {
            steps: self.steps.clone(),
            probe: self.probe.clone(),
        }))
    }

    fn load_classifier(
        &mut self,
        progress: LoadProgress<'_>,
    ) -> Result<Box<dyn SequenceClassifier>, BoxError> {
        if self.fail == Some(ModelComponent::SequenceClassifier) {
            return Err("classifier model missing".into());
        }
        progress(100);
        if let Some(classifier) = self.classifier.take() {
            return Ok(classifier);
        }
        Ok(Box::new(FakeClassifier {
            probe: self.probe.clone(),
            fail: self.failing_classifier,
        }))
    }
}
