pub mod frame_worker;
pub mod recognition_session;
pub mod session_state;
