pub mod pipeline_logger;
pub mod recognize_sequence_use_case;
