pub mod execution_provider;
pub mod model_resolver;
pub mod onnx_hand_landmark_extractor;
pub mod onnx_model_provider;
pub mod onnx_sequence_classifier;
pub mod replay_landmark_extractor;
