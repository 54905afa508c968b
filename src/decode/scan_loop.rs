// SPDX-License-Identifier: GPL-3.0-only

//! Continuous decode loop
//!
//! Runs on its own OS thread and owns the camera stream for as long as it
//! runs. Every frame is shown on the video surface and handed to the
//! decoder. The first code found stops the stream and is sent back through
//! a oneshot channel; the thread then exits. A stream that ends on its own
//! or keeps failing is reported through the same channel as a lost camera.

use super::{BarcodeDecoder, LumaImage};
use crate::backends::camera::{BackendError, CameraStream};
use crate::capture::surface::VideoSurface;
use crate::constants::timing;
use crate::errors::DeviceError;
use futures::channel::oneshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// What the decode loop reports: a code, or the camera failing first
pub type ScanOutcome = Result<String, DeviceError>;

/// Decode loop configuration
#[derive(Clone)]
pub struct DecodeLoop {
    decoder: Arc<dyn BarcodeDecoder>,
    max_dimension: u32,
}

impl DecodeLoop {
    pub fn new(decoder: Arc<dyn BarcodeDecoder>, max_dimension: u32) -> Self {
        Self {
            decoder,
            max_dimension,
        }
    }

    /// Start decoding frames from `stream` on a new thread
    pub fn spawn(self, stream: Box<dyn CameraStream>, surface: VideoSurface) -> DecodeLoopHandle {
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = oneshot::channel();

        let thread_running = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("barcode-decode".to_string())
            .spawn(move || self.run(stream, surface, thread_running, tx));

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                // The stream moved into the closure and was dropped with it
                warn!(error = %e, "Failed to spawn decode thread");
                running.store(false, Ordering::SeqCst);
                None
            }
        };

        DecodeLoopHandle {
            running,
            thread,
            code: Some(rx),
        }
    }

    fn run(
        self,
        mut stream: Box<dyn CameraStream>,
        surface: VideoSurface,
        running: Arc<AtomicBool>,
        tx: oneshot::Sender<ScanOutcome>,
    ) {
        info!(device = %stream.device(), decoder = self.decoder.name(), "Decode loop started");
        let mut frame_count: u64 = 0;
        let mut failed_reads: u32 = 0;

        let lost = loop {
            if !running.load(Ordering::SeqCst) {
                break None;
            }

            let frame = match stream.next_frame() {
                Ok(frame) => {
                    failed_reads = 0;
                    frame
                }
                Err(BackendError::StreamStopped) => {
                    break Some("stream stopped without a code".to_string());
                }
                Err(e) => {
                    failed_reads += 1;
                    if failed_reads == 1 {
                        warn!(error = %e, "Failed to read frame");
                    } else {
                        trace!(error = %e, failed_reads, "Failed to read frame");
                    }
                    if !stream.is_active() || failed_reads >= timing::MAX_CONSECUTIVE_FRAME_ERRORS {
                        break Some(e.to_string());
                    }
                    std::thread::sleep(timing::FRAME_RETRY_DELAY);
                    continue;
                }
            };

            frame_count += 1;
            if frame_count % timing::FRAME_LOG_INTERVAL == 0 {
                trace!(frame_count, "Decode loop alive");
            }

            surface.publish(frame.clone());

            let result = LumaImage::from_frame(&frame, self.max_dimension)
                .and_then(|luma| self.decoder.decode(&luma));

            match result {
                Ok(code) => {
                    // Release the camera before anyone acts on the code
                    stream.stop();
                    running.store(false, Ordering::SeqCst);
                    info!(frame_count, "Barcode decoded");
                    if tx.send(Ok(code)).is_err() {
                        debug!("Decoded barcode has no receiver");
                    }
                    return;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(error = %e, "Barcode decode error"),
            }
        };

        stream.stop();

        // A stop request wins over a failure noticed on the way out
        match lost {
            Some(cause) if running.swap(false, Ordering::SeqCst) => {
                error!(frame_count, error = %cause, "Camera lost during scan");
                if tx.send(Err(DeviceError::StreamLost(cause))).is_err() {
                    debug!("Camera loss has no receiver");
                }
            }
            _ => debug!(frame_count, "Decode loop stopped without a code"),
        }
    }
}

/// Control handle for a running decode loop
///
/// Dropping the handle stops the loop and waits for the thread.
pub struct DecodeLoopHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    code: Option<oneshot::Receiver<ScanOutcome>>,
}

impl DecodeLoopHandle {
    /// Check if the loop is still reading frames
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Take the receiver for the scan outcome
    ///
    /// Resolves to `Err(Canceled)` when the loop was stopped before it found
    /// a code or lost the camera.
    pub fn take_code_receiver(&mut self) -> Option<oneshot::Receiver<ScanOutcome>> {
        self.code.take()
    }

    /// Stop the loop and join its thread
    ///
    /// Safe to call repeatedly. Returns `true` only for the call that
    /// actually joined the thread.
    pub fn stop(&mut self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        match self.thread.take() {
            Some(thread) => {
                if thread.join().is_err() {
                    warn!("Decode thread panicked");
                }
                true
            }
            None => false,
        }
    }
}

impl Drop for DecodeLoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{BackendResult, CameraDevice, CameraFrame, PixelFormat};
    use crate::errors::DecodeError;
    use std::sync::atomic::AtomicUsize;

    struct CountingStream {
        device: CameraDevice,
        active: bool,
        stops: Arc<AtomicUsize>,
    }

    impl CameraStream for CountingStream {
        fn device(&self) -> &CameraDevice {
            &self.device
        }

        fn next_frame(&mut self) -> BackendResult<CameraFrame> {
            if !self.active {
                return Err(BackendError::StreamStopped);
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
            Ok(CameraFrame::packed(4, 4, PixelFormat::Gray8, vec![0; 16]))
        }

        fn stop(&mut self) {
            self.active = false;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    /// Reports a code on the nth frame
    struct NthFrameDecoder {
        calls: AtomicUsize,
        nth: usize,
    }

    impl BarcodeDecoder for NthFrameDecoder {
        fn decode(&self, _image: &LumaImage) -> Result<String, DecodeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.nth {
                Ok("0123456789012".to_string())
            } else if call % 2 == 0 {
                Err(DecodeError::Checksum("ean13".to_string()))
            } else {
                Err(DecodeError::NotFound)
            }
        }
    }

    fn stream(stops: &Arc<AtomicUsize>) -> Box<dyn CameraStream> {
        Box::new(CountingStream {
            device: CameraDevice::new("/dev/video0", "Back Camera"),
            active: true,
            stops: Arc::clone(stops),
        })
    }

    #[test]
    fn test_code_stops_stream_once() {
        let stops = Arc::new(AtomicUsize::new(0));
        let decoder = Arc::new(NthFrameDecoder {
            calls: AtomicUsize::new(0),
            nth: 5,
        });
        let surface = VideoSurface::new();
        surface.attach(&CameraDevice::new("/dev/video0", "Back Camera"));

        let mut handle = DecodeLoop::new(decoder, 640).spawn(stream(&stops), surface.clone());
        let rx = handle.take_code_receiver().unwrap();
        let outcome = futures::executor::block_on(rx).unwrap();

        assert_eq!(outcome, Ok("0123456789012".to_string()));
        assert!(handle.stop());
        assert!(!handle.stop());
        assert!(!handle.is_running());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(surface.frames_published() >= 5);
    }

    #[test]
    fn test_stop_without_code_cancels_receiver() {
        let stops = Arc::new(AtomicUsize::new(0));
        let decoder = Arc::new(NthFrameDecoder {
            calls: AtomicUsize::new(0),
            nth: usize::MAX,
        });

        let mut handle = DecodeLoop::new(decoder, 640).spawn(stream(&stops), VideoSurface::new());
        let rx = handle.take_code_receiver().unwrap();
        handle.stop();

        assert!(futures::executor::block_on(rx).is_err());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    /// Delivers a few frames, then fails every read while claiming to be live
    struct DyingStream {
        device: CameraDevice,
        frames_left: usize,
        failure: BackendError,
        reads: Arc<AtomicUsize>,
    }

    impl CameraStream for DyingStream {
        fn device(&self) -> &CameraDevice {
            &self.device
        }

        fn next_frame(&mut self) -> BackendResult<CameraFrame> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.frames_left == 0 {
                return Err(self.failure.clone());
            }
            self.frames_left -= 1;
            Ok(CameraFrame::packed(4, 4, PixelFormat::Gray8, vec![0; 16]))
        }

        fn stop(&mut self) {}

        fn is_active(&self) -> bool {
            true
        }
    }

    fn run_dying(failure: BackendError) -> (ScanOutcome, usize) {
        let reads = Arc::new(AtomicUsize::new(0));
        let decoder = Arc::new(NthFrameDecoder {
            calls: AtomicUsize::new(0),
            nth: usize::MAX,
        });
        let stream = Box::new(DyingStream {
            device: CameraDevice::new("/dev/video0", "Back Camera"),
            frames_left: 2,
            failure,
            reads: Arc::clone(&reads),
        });

        let mut handle = DecodeLoop::new(decoder, 640).spawn(stream, VideoSurface::new());
        let rx = handle.take_code_receiver().unwrap();
        let outcome = futures::executor::block_on(rx).unwrap();
        assert!(!handle.is_running());
        handle.stop();
        (outcome, reads.load(Ordering::SeqCst))
    }

    #[test]
    fn test_stream_ending_reports_lost_camera() {
        let (outcome, reads) = run_dying(BackendError::StreamStopped);
        assert!(matches!(outcome, Err(DeviceError::StreamLost(_))));
        assert_eq!(reads, 3);
    }

    #[test]
    fn test_repeated_read_errors_give_up() {
        let (outcome, reads) = run_dying(BackendError::IoError("unplugged".into()));
        assert!(matches!(outcome, Err(DeviceError::StreamLost(_))));
        assert_eq!(reads, 2 + timing::MAX_CONSECUTIVE_FRAME_ERRORS as usize);
    }
}
