use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};

use crate::session::recognition_session::RecognitionSession;
use crate::session::session_state::FrameDisposition;
use crate::shared::frame::Frame;

/// Counters reported when a worker is joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub processed: usize,
    pub skipped: usize,
}

/// Runs a session on its own thread, fed by a capture loop.
///
/// The channel has no capacity: `submit` hands a frame over only if the
/// worker is idle and waiting. A frame offered while the worker is busy is
/// dropped, so the worker always processes the newest frame it can accept.
pub struct FrameWorker {
    sender: Option<Sender<Frame>>,
    handle: Option<JoinHandle<WorkerStats>>,
}

impl FrameWorker {
    pub fn spawn(session: Arc<RecognitionSession>) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded::<Frame>(0);
        let handle = std::thread::spawn(move || {
            let mut stats = WorkerStats::default();
            for frame in receiver {
                match session.process_frame(&frame) {
                    FrameDisposition::Processed => stats.processed += 1,
                    FrameDisposition::Skipped(reason) => {
                        log::trace!("Worker skipped frame {}: {reason:?}", frame.index());
                        stats.skipped += 1;
                    }
                }
            }
            stats
        });
        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Returns `false` if the frame was dropped.
    pub fn submit(&self, frame: Frame) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Frame worker has stopped");
                false
            }
        }
    }

    /// Stops accepting frames and waits for the in-flight frame to finish.
    pub fn join(mut self) -> WorkerStats {
        self.finish()
    }

    fn finish(&mut self) -> WorkerStats {
        self.sender = None;
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                log::error!("Frame worker panicked");
                WorkerStats::default()
            }
            None => WorkerStats::default(),
        }
    }
}

impl Drop for FrameWorker {
    fn drop(&mut self) {
        self.finish();
    }
}
