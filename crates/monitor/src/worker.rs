use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use proctor_core::annotation::domain::frame_annotator::FrameAnnotator;
use proctor_core::detection::domain::face_detector::FaceDetector;
use proctor_core::pipeline::capture_loop_use_case::{CaptureLoopUseCase, CaptureSummary};
use proctor_core::shared::frame::Frame;
use proctor_core::video::domain::frame_source::FrameSource;

#[derive(Debug)]
pub enum WorkerEvent {
    Stopped(CaptureSummary),
    Failed(String),
}

/// The window's side of a running capture worker.
#[derive(Clone)]
pub struct MonitorHandle {
    /// Latest annotated frame. Holds at most one.
    pub frames: Receiver<Frame>,
    /// Sent once, when the loop ends.
    pub events: Receiver<WorkerEvent>,
    /// Set to stop the loop before its next capture.
    pub quit: Arc<AtomicBool>,
}

impl MonitorHandle {
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::Relaxed);
    }
}

/// Runs the capture loop on its own thread.
pub fn spawn(
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    annotator: Box<dyn FrameAnnotator>,
) -> MonitorHandle {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(1);
    let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();
    let quit = Arc::new(AtomicBool::new(false));

    let mut use_case = CaptureLoopUseCase::new(source, detector, annotator, Some(quit.clone()));
    let stale = frame_rx.clone();

    thread::spawn(move || {
        let result = use_case.run(|frame| {
            publish_latest(&frame_tx, &stale, frame);
            true
        });
        let event = match result {
            Ok(summary) => WorkerEvent::Stopped(summary),
            Err(e) => {
                log::error!("Capture stopped: {e}");
                WorkerEvent::Failed(e.to_string())
            }
        };
        let _ = event_tx.send(event);
    });

    MonitorHandle {
        frames: frame_rx,
        events: event_rx,
        quit,
    }
}

/// Publishes `frame`, evicting an unconsumed older frame if the slot is taken.
fn publish_latest(tx: &Sender<Frame>, stale: &Receiver<Frame>, frame: Frame) {
    match tx.try_send(frame) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(frame)) => {
            let _ = stale.try_recv();
            let _ = tx.try_send(frame);
        }
    }
}
