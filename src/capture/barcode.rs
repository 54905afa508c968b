// SPDX-License-Identifier: GPL-3.0-only

//! Barcode scanner workflow
//!
//! Opens the rear camera, decodes continuously until a code is read, looks
//! the code up on the server and shows the product. Codes can also be typed
//! in when there is no camera.

use super::acquirer::DeviceAcquirer;
use super::handoff::{Handoff, HandoffAction, HandoffTarget};
use super::session::{CaptureSession, SessionSlot, SubmissionSlot};
use super::surface::VideoSurface;
use super::CaptureResult;
use crate::client::{FoodApi, ProductMatch};
use crate::constants::messages;
use crate::decode::{BarcodeDecoder, DecodeLoop, ScanOutcome};
use crate::errors::{DeviceError, ValidationError, validate_manual_barcode};
use crate::render::{ResultPanel, ResultView};
use futures::channel::oneshot;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Barcode capture-and-handoff workflow
pub struct BarcodeScanner {
    acquirer: DeviceAcquirer,
    decode_loop: DecodeLoop,
    api: Arc<dyn FoodApi>,
    handoff: Handoff,
    panel: ResultPanel,
    surface: VideoSurface,
    session: SessionSlot,
    submission: SubmissionSlot,
    pending_code: Mutex<Option<oneshot::Receiver<ScanOutcome>>>,
}

impl BarcodeScanner {
    pub fn new(
        acquirer: DeviceAcquirer,
        decoder: Arc<dyn BarcodeDecoder>,
        max_dimension: u32,
        api: Arc<dyn FoodApi>,
        handoff: Handoff,
    ) -> Self {
        Self {
            acquirer,
            decode_loop: DecodeLoop::new(decoder, max_dimension),
            api,
            handoff,
            panel: ResultPanel::new(),
            surface: VideoSurface::new(),
            session: SessionSlot::new(),
            submission: SubmissionSlot::new(),
            pending_code: Mutex::new(None),
        }
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

    /// Check if the camera is held
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Open the camera and start decoding
    ///
    /// Any earlier session is torn down first. Without camera support the
    /// manual entry fragment is shown instead.
    pub async fn start(&self) -> Result<(), DeviceError> {
        let generation = self.session.begin().await;
        self.submission.cancel();
        self.set_pending(None);

        if !self.acquirer.is_supported() {
            info!("Camera not supported, offering manual barcode entry");
            self.panel.show(ResultView::ManualBarcodeEntry);
            return Err(DeviceError::Unsupported);
        }

        self.panel.clear();

        let stream = match self.acquirer.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                let result = CaptureResult::<ProductMatch>::DeviceError(
                    e.user_message(messages::SCANNER_INIT_FAILED),
                );
                self.panel.show(ResultView::for_product(&result));
                return Err(e);
            }
        };

        let mut session = CaptureSession::new(generation, self.surface.clone());
        info!(session = %session.id(), device = %stream.device(), "Barcode scanner started");
        session.attach_stream(stream);
        let receiver = session.start_decoding(self.decode_loop.clone());

        if self.session.install(session).await {
            self.set_pending(receiver);
        }
        Ok(())
    }

    fn set_pending(&self, receiver: Option<oneshot::Receiver<ScanOutcome>>) {
        if let Ok(mut pending) = self.pending_code.lock() {
            *pending = receiver;
        }
    }

    /// Wait for the decode loop to read a code
    ///
    /// Returns `None` if the scanner was stopped first. If the camera is
    /// lost instead, the session is released and the device error fragment
    /// shown before the error is returned.
    pub async fn wait_for_code(&self) -> Option<Result<String, DeviceError>> {
        let receiver = self.pending_code.lock().ok()?.take()?;
        match receiver.await {
            Ok(Ok(code)) => Some(Ok(code)),
            Ok(Err(e)) => {
                warn!(error = ?e, "Camera lost while scanning");
                self.release().await;
                let result = CaptureResult::<ProductMatch>::DeviceError(
                    e.user_message(messages::SCANNER_INIT_FAILED),
                );
                self.panel.show(ResultView::for_product(&result));
                Some(Err(e))
            }
            Err(_) => {
                debug!("Decode loop ended without a code");
                None
            }
        }
    }

    /// Wait for a code and look it up
    pub async fn scan(&self) -> Option<CaptureResult<ProductMatch>> {
        match self.wait_for_code().await? {
            Ok(code) => self.handle_barcode(&code).await,
            Err(e) => Some(CaptureResult::DeviceError(
                e.user_message(messages::SCANNER_INIT_FAILED),
            )),
        }
    }

    /// Look up a code read by the decoder or typed in
    ///
    /// The camera is released before the request goes out.
    pub async fn handle_barcode(&self, code: &str) -> Option<CaptureResult<ProductMatch>> {
        info!(barcode = code, "Barcode detected");
        self.release().await;

        let api = Arc::clone(&self.api);
        let barcode = code.to_string();
        self.submission
            .run(
                &self.panel,
                ResultView::looking_up(code),
                async move { CaptureResult::from_response(api.lookup_barcode(&barcode).await) },
                ResultView::for_product,
            )
            .await
    }

    /// Show the manual entry fragment
    pub async fn show_manual_entry(&self) {
        self.release().await;
        self.panel.show(ResultView::ManualBarcodeEntry);
    }

    /// Look up a typed-in code
    ///
    /// Codes shorter than the minimum are rejected without a request.
    pub async fn lookup_manual(
        &self,
        input: &str,
    ) -> Result<Option<CaptureResult<ProductMatch>>, ValidationError> {
        let code = match validate_manual_barcode(input) {
            Ok(code) => code,
            Err(e) => {
                self.panel.show(ResultView::barcode_error(&e.to_string()));
                return Err(e);
            }
        };
        Ok(self.handle_barcode(code).await)
    }

    async fn release(&self) {
        self.set_pending(None);
        self.session.release_async().await;
    }

    /// Stop decoding and release the camera
    ///
    /// Blocks until the decode thread exits; async callers use [`close`].
    ///
    /// [`close`]: Self::close
    pub fn stop(&self) {
        self.set_pending(None);
        self.session.release();
    }

    /// Close the scanner: release the camera and abandon any lookup
    ///
    /// Blocking like [`stop`](Self::stop), for signal handlers and drop.
    pub fn dismiss(&self) {
        self.stop();
        if self.submission.cancel() {
            debug!("Abandoned in-flight barcode lookup");
        }
    }

    /// [`dismiss`](Self::dismiss) without blocking the async runtime
    pub async fn close(&self) {
        self.release().await;
        if self.submission.cancel() {
            debug!("Abandoned in-flight barcode lookup");
        }
    }

    /// Close the scanner and hand a product to the food log
    pub async fn add_scanned_food(
        &self,
        food_id: i64,
        food_name: &str,
        target: &dyn HandoffTarget,
    ) -> HandoffAction {
        self.close().await;
        let action = self.handoff.add_food(food_id, food_name);
        self.handoff.perform(&action, target).await;
        action
    }
}

impl Drop for BarcodeScanner {
    fn drop(&mut self) {
        self.dismiss();
    }
}
