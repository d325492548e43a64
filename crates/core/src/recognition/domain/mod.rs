pub mod confidence_smoother;
pub mod gesture;
pub mod gesture_detector;
pub mod landmark_extractor;
pub mod landmark_window;
pub mod landmarks;
pub mod model_provider;
pub mod prediction_history;
pub mod recognition_error;
pub mod sequence_classifier;
