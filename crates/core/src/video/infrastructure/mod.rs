pub mod image_sequence_reader;
pub mod recording_frame_reader;
