// SPDX-License-Identifier: GPL-3.0-only

//! Food recognition workflow
//!
//! Opens the camera for a preview, snapshots one frame on request, uploads
//! it as JPEG and shows what the server thinks the food is. After too many
//! captures in a row the user is pointed at manual search.

use super::acquirer::DeviceAcquirer;
use super::handoff::{Handoff, HandoffAction, HandoffTarget};
use super::session::{CaptureSession, SessionSlot, SubmissionSlot};
use super::surface::VideoSurface;
use super::CaptureResult;
use crate::client::{FoodApi, FoodSearchHit, RecognitionGuess};
use crate::constants::messages;
use crate::errors::{DeviceError, ValidationError, validate_manual_search};
use crate::pipelines::photo::PhotoPipeline;
use crate::render::{ResultPanel, ResultView};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{error, info, warn};

/// Food image capture-and-handoff workflow
pub struct FoodRecognizer {
    acquirer: DeviceAcquirer,
    pipeline: PhotoPipeline,
    api: Arc<dyn FoodApi>,
    handoff: Handoff,
    panel: ResultPanel,
    surface: VideoSurface,
    session: SessionSlot,
    submission: SubmissionSlot,
    max_attempts: u32,
    attempts: AtomicU32,
    snapshot_dir: Option<PathBuf>,
}

impl FoodRecognizer {
    pub fn new(
        acquirer: DeviceAcquirer,
        pipeline: PhotoPipeline,
        api: Arc<dyn FoodApi>,
        handoff: Handoff,
        max_attempts: u32,
    ) -> Self {
        Self {
            acquirer,
            pipeline,
            api,
            handoff,
            panel: ResultPanel::new(),
            surface: VideoSurface::new(),
            session: SessionSlot::new(),
            submission: SubmissionSlot::new(),
            max_attempts: max_attempts.max(1),
            attempts: AtomicU32::new(0),
            snapshot_dir: None,
        }
    }

    /// Also keep every uploaded snapshot in this directory
    pub fn with_snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    pub fn panel(&self) -> &ResultPanel {
        &self.panel
    }

    pub fn surface(&self) -> &VideoSurface {
        &self.surface
    }

    pub fn handoff(&self) -> Handoff {
        self.handoff
    }

    /// Captures made since the counter was last reset
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Open the camera for a new capture
    pub async fn start(&self) -> Result<(), DeviceError> {
        let generation = self.session.begin().await;
        self.submission.cancel();

        if !self.acquirer.is_supported() {
            info!("Camera not supported, offering manual food search");
            self.panel.show(ResultView::ManualFoodSearch);
            return Err(DeviceError::Unsupported);
        }

        self.panel.clear();

        let stream = match self.acquirer.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                let result = CaptureResult::<RecognitionGuess>::DeviceError(
                    e.user_message(messages::CAMERA_INIT_FAILED),
                );
                self.panel.show(ResultView::for_recognition(&result));
                return Err(e);
            }
        };

        let mut session = CaptureSession::new(generation, self.surface.clone());
        info!(session = %session.id(), device = %stream.device(), "Food recognition camera started");
        session.attach_stream(stream);
        self.session.install(session).await;
        Ok(())
    }

    /// Snapshot the preview and ask the server what it shows
    ///
    /// The stream is stopped as soon as the frame is taken. Returns `None`
    /// if the request was superseded.
    pub async fn capture(&self) -> Option<CaptureResult<RecognitionGuess>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > self.max_attempts {
            warn!(attempt, max = self.max_attempts, "Recognition attempts exhausted");
            self.attempts.store(0, Ordering::SeqCst);
            self.session.release_async().await;
            self.panel
                .show(ResultView::recognition_error(messages::ATTEMPTS_EXHAUSTED));
            return Some(CaptureResult::ServerError(
                messages::ATTEMPTS_EXHAUSTED.to_string(),
            ));
        }

        let Some(stream) = self.session.with(|s| s.take_stream()).flatten() else {
            return Some(self.capture_failed("No active camera stream"));
        };

        self.panel.show(ResultView::loading(messages::ANALYZING_IMAGE));
        let encoded = self
            .pipeline
            .capture_and_encode(stream, self.surface.clone())
            .await;
        self.session.release_async().await;

        let encoded = match encoded {
            Ok(encoded) => encoded,
            Err(e) => return Some(self.capture_failed(&e)),
        };

        if let Some(dir) = &self.snapshot_dir {
            match self.pipeline.encoder().save(&encoded, dir.clone()).await {
                Ok(path) => info!(path = %path.display(), "Snapshot kept"),
                Err(e) => warn!(error = %e, "Failed to keep snapshot"),
            }
        }

        let api = Arc::clone(&self.api);
        let result = self
            .submission
            .run(
                &self.panel,
                ResultView::loading(messages::ANALYZING_IMAGE),
                async move {
                    match api.recognize_food(encoded.data).await {
                        Ok(guess) if guess.recognized.trim().is_empty() => CaptureResult::NotFound,
                        response => CaptureResult::from_response(response),
                    }
                },
                ResultView::for_recognition,
            )
            .await;

        if matches!(result, Some(CaptureResult::Found(_))) {
            self.attempts.store(0, Ordering::SeqCst);
        }
        result
    }

    fn capture_failed(&self, cause: &str) -> CaptureResult<RecognitionGuess> {
        error!(error = cause, "Capture error");
        self.session.release();
        let result = CaptureResult::DeviceError(messages::CAPTURE_FAILED.to_string());
        self.panel.show(ResultView::for_recognition(&result));
        result
    }

    /// Show the manual search fragment
    pub async fn show_manual_search(&self) {
        self.session.release_async().await;
        self.panel.show(ResultView::ManualFoodSearch);
    }

    /// Show recognition tips
    pub fn show_tips(&self) {
        self.panel.show(ResultView::Tips);
    }

    /// Hand a typed-in food name to the food log search
    pub async fn search_manual(
        &self,
        input: &str,
        target: &dyn HandoffTarget,
    ) -> Result<HandoffAction, ValidationError> {
        match validate_manual_search(input) {
            Ok(query) => Ok(self.search_for_food(query, target).await),
            Err(e) => {
                self.panel.show(ResultView::recognition_error(&e.to_string()));
                Err(e)
            }
        }
    }

    /// Close recognition and hand a food name to the food log search
    pub async fn search_for_food(&self, query: &str, target: &dyn HandoffTarget) -> HandoffAction {
        self.close().await;
        let action = self.handoff.search(query);
        self.handoff.perform(&action, target).await;
        action
    }

    /// Release the camera
    pub fn stop(&self) {
        self.session.release();
    }

    /// Close recognition: release the camera and abandon any upload
    pub fn dismiss(&self) {
        self.stop();
        self.submission.cancel();
    }

    /// [`dismiss`](Self::dismiss) without blocking the async runtime
    pub async fn close(&self) {
        self.session.release_async().await;
        self.submission.cancel();
    }
}

impl Drop for FoodRecognizer {
    fn drop(&mut self) {
        self.dismiss();
    }
}

/// Run a food log search; an empty list is "not found"
pub async fn search_foods(api: &dyn FoodApi, query: &str) -> CaptureResult<Vec<FoodSearchHit>> {
    match api.search_food(query).await {
        Ok(hits) if hits.is_empty() => CaptureResult::NotFound,
        response => CaptureResult::from_response(response),
    }
}
