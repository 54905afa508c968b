// SPDX-License-Identifier: GPL-3.0-only

//! Capture sessions and their reclamation
//!
//! A [`CaptureSession`] owns the camera for one capture. Releasing it stops
//! the stream, stops and joins the decode loop, and detaches the video
//! surface. Release is idempotent and also runs on drop.
//!
//! [`SessionSlot`] holds the one session a workflow may have and hands out
//! generations so an acquisition that finishes after the user already
//! dismissed the workflow is released instead of installed. Its async
//! methods release on the blocking pool, since joining the decode thread
//! can take up to a frame interval.
//! [`SubmissionSlot`] does the same for in-flight server requests.

use super::CaptureResult;
use super::surface::VideoSurface;
use crate::backends::camera::CameraStream;
use crate::decode::{DecodeLoop, DecodeLoopHandle, ScanOutcome};
use crate::render::{ResultPanel, ResultView};
use futures::channel::oneshot;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::AbortHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Media resources of one capture
pub struct CaptureSession {
    generation: u64,
    id: Uuid,
    surface: VideoSurface,
    stream: Option<Box<dyn CameraStream>>,
    reader: Option<DecodeLoopHandle>,
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("generation", &self.generation)
            .field("id", &self.id)
            .field("stream", &self.stream.is_some())
            .field("reader", &self.reader.is_some())
            .finish()
    }
}

impl CaptureSession {
    pub fn new(generation: u64, surface: VideoSurface) -> Self {
        Self {
            generation,
            id: Uuid::new_v4(),
            surface,
            stream: None,
            reader: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Take ownership of a stream and show it on the surface
    pub fn attach_stream(&mut self, stream: Box<dyn CameraStream>) {
        self.surface.attach(stream.device());
        if let Some(mut old) = self.stream.replace(stream) {
            old.stop();
        }
        debug!(session = %self.id, "Stream attached");
    }

    /// Hand the stream to a decode loop
    ///
    /// Returns the receiver for the scan outcome, or `None` without a stream.
    pub fn start_decoding(
        &mut self,
        decode_loop: DecodeLoop,
    ) -> Option<oneshot::Receiver<ScanOutcome>> {
        let stream = self.stream.take()?;
        let mut reader = decode_loop.spawn(stream, self.surface.clone());
        let receiver = reader.take_code_receiver();
        self.reader = Some(reader);
        receiver
    }

    /// Remove the stream for a one-off capture
    pub fn take_stream(&mut self) -> Option<Box<dyn CameraStream>> {
        self.stream.take()
    }

    pub fn surface(&self) -> &VideoSurface {
        &self.surface
    }

    /// Check if the session still holds a live stream or a running reader
    pub fn is_active(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_active())
            || self.reader.as_ref().is_some_and(|r| r.is_running())
    }

    /// Stop every track, stop the reader, and detach the surface
    ///
    /// Returns `true` if anything was still held.
    pub fn release(&mut self) -> bool {
        let mut released = false;

        if let Some(mut reader) = self.reader.take() {
            reader.stop();
            released = true;
        }
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            released = true;
        }
        self.surface.detach();

        if released {
            info!(session = %self.id, generation = self.generation, "Capture session released");
        }
        released
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    session: Option<CaptureSession>,
}

/// The single session a workflow may hold
#[derive(Debug, Clone, Default)]
pub struct SessionSlot {
    state: Arc<Mutex<SlotState>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Tear down any current session and reserve a new generation
    pub async fn begin(&self) -> u64 {
        let (generation, old) = {
            let mut state = self.lock();
            state.generation += 1;
            (state.generation, state.session.take())
        };
        release_off_runtime(old).await;
        generation
    }

    /// Install a session if its generation is still current
    ///
    /// A stale session is released and `false` returned.
    pub async fn install(&self, session: CaptureSession) -> bool {
        let (installed, discarded) = {
            let mut state = self.lock();
            if session.generation() != state.generation {
                debug!(
                    session = session.generation(),
                    current = state.generation,
                    "Discarding superseded session"
                );
                (false, Some(session))
            } else {
                (true, state.session.replace(session))
            }
        };
        release_off_runtime(discarded).await;
        installed
    }

    /// Run `f` on the current session
    pub fn with<R>(&self, f: impl FnOnce(&mut CaptureSession) -> R) -> Option<R> {
        self.lock().session.as_mut().map(f)
    }

    fn take(&self) -> Option<CaptureSession> {
        let mut state = self.lock();
        state.generation += 1;
        state.session.take()
    }

    /// Release the current session and invalidate pending acquisitions
    ///
    /// Blocks until the decode thread has exited. Safe to call any number of
    /// times.
    pub fn release(&self) -> bool {
        self.take().is_some_and(|mut session| session.release())
    }

    /// [`release`](Self::release) without blocking the async runtime
    pub async fn release_async(&self) -> bool {
        release_off_runtime(self.take()).await
    }

    pub fn is_active(&self) -> bool {
        self.lock().session.as_ref().is_some_and(|s| s.is_active())
    }

    pub fn has_session(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

async fn release_off_runtime(session: Option<CaptureSession>) -> bool {
    let Some(mut session) = session else {
        return false;
    };
    match tokio::task::spawn_blocking(move || session.release()).await {
        Ok(released) => released,
        Err(e) => {
            error!(error = %e, "Session release task failed");
            false
        }
    }
}

/// The single server request a workflow may have in flight
#[derive(Debug, Clone, Default)]
pub struct SubmissionSlot {
    current: Arc<Mutex<Option<AbortHandle>>>,
}

impl SubmissionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&self, handle: AbortHandle) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.replace(handle) {
            previous.abort();
        }
    }

    /// Abort the in-flight request, if any
    pub fn cancel(&self) -> bool {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match current.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Run one submission
    ///
    /// Shows `loading`, aborts any earlier submission, and presents the
    /// rendered result unless something newer was shown meanwhile. Returns
    /// `None` if this submission was itself aborted.
    pub async fn run<T, F, R>(
        &self,
        panel: &ResultPanel,
        loading: ResultView,
        request: F,
        render: R,
    ) -> Option<CaptureResult<T>>
    where
        T: Send + 'static,
        F: Future<Output = CaptureResult<T>> + Send + 'static,
        R: Fn(&CaptureResult<T>) -> ResultView + Send + 'static,
    {
        let ticket = panel.begin();
        panel.present(ticket, loading);

        let task_panel = panel.clone();
        let task = tokio::spawn(async move {
            let result = request.await;
            task_panel.present(ticket, render(&result));
            result
        });
        self.replace(task.abort_handle());

        match task.await {
            Ok(result) => Some(result),
            Err(e) if e.is_cancelled() => {
                debug!(ticket = ticket.value(), "Submission superseded");
                None
            }
            Err(e) => {
                error!(error = %e, "Submission task failed");
                None
            }
        }
    }
}
