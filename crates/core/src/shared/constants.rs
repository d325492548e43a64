pub const HAND_LANDMARK_MODEL_NAME: &str = "hand_landmark.onnx";
pub const GESTURE_CLASSIFIER_MODEL_NAME: &str = "sign_lstm.onnx";

/// Application directory name under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "handsign";

/// Tracked points per hand pose.
pub const LANDMARK_COUNT: usize = 21;

/// Classifier features per frame: (x, y) for every landmark.
pub const FEATURES_PER_FRAME: usize = LANDMARK_COUNT * 2;

/// Capture cadence assumed for image sequences without timing information.
pub const DEFAULT_CAPTURE_FPS: f64 = 30.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
