// SPDX-License-Identifier: MPL-2.0

//! Fakes shared by the workflow integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use nutricam::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendType, CameraDevice, CameraFrame,
    CameraStream, PixelFormat, StreamConstraints,
};
use nutricam::capture::HandoffTarget;
use nutricam::client::{FoodApi, FoodSearchHit, ProductMatch, RecognitionGuess};
use nutricam::decode::{BarcodeDecoder, LumaImage};
use nutricam::errors::{DecodeError, ServerError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counters observed by the tests
#[derive(Debug, Default)]
pub struct StreamTally {
    pub opened: AtomicUsize,
    pub stops: AtomicUsize,
    pub frames: AtomicUsize,
    pub live: AtomicBool,
}

impl StreamTally {
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Camera backend with scripted behavior
pub struct FakeBackend {
    pub available: bool,
    pub devices: Vec<CameraDevice>,
    pub open_error: Option<BackendError>,
    pub enumerate_error: Option<BackendError>,
    /// Frames delivered before every read fails with the given error
    pub dies_after: Option<(usize, BackendError)>,
    pub tally: Arc<StreamTally>,
    pub opened_device: Mutex<Option<CameraDevice>>,
}

impl FakeBackend {
    pub fn with_devices(devices: Vec<CameraDevice>) -> Self {
        Self {
            available: true,
            devices,
            open_error: None,
            enumerate_error: None,
            dies_after: None,
            tally: Arc::new(StreamTally::default()),
            opened_device: Mutex::new(None),
        }
    }

    pub fn working() -> Self {
        Self::with_devices(vec![
            CameraDevice::new("/dev/video0", "Integrated Webcam"),
            CameraDevice::new("/dev/video2", "Back Camera"),
        ])
    }

    pub fn denied() -> Self {
        Self {
            open_error: Some(BackendError::PermissionDenied("/dev/video0".into())),
            ..Self::working()
        }
    }

    pub fn unsupported() -> Self {
        Self {
            available: false,
            devices: Vec::new(),
            ..Self::working()
        }
    }

    pub fn dying(frames: usize, error: BackendError) -> Self {
        Self {
            dies_after: Some((frames, error)),
            ..Self::working()
        }
    }

    pub fn broken_enumeration() -> Self {
        Self {
            enumerate_error: Some(BackendError::IoError("udev unavailable".into())),
            ..Self::working()
        }
    }

    pub fn opened_device(&self) -> Option<CameraDevice> {
        self.opened_device.lock().unwrap().clone()
    }
}

impl CameraBackend for FakeBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn enumerate_cameras(&self) -> BackendResult<Vec<CameraDevice>> {
        if let Some(err) = &self.enumerate_error {
            return Err(err.clone());
        }
        Ok(self.devices.clone())
    }

    fn open(
        &self,
        device: &CameraDevice,
        _constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn CameraStream>> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        *self.opened_device.lock().unwrap() = Some(device.clone());
        self.tally.opened.fetch_add(1, Ordering::SeqCst);
        self.tally.live.store(true, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            device: device.clone(),
            active: true,
            dies_after: self.dies_after.clone(),
            tally: Arc::clone(&self.tally),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

pub struct FakeStream {
    device: CameraDevice,
    active: bool,
    dies_after: Option<(usize, BackendError)>,
    tally: Arc<StreamTally>,
}

impl CameraStream for FakeStream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn next_frame(&mut self) -> BackendResult<CameraFrame> {
        if !self.active {
            return Err(BackendError::StreamStopped);
        }
        std::thread::sleep(Duration::from_millis(2));
        if let Some((frames_left, error)) = &mut self.dies_after {
            if *frames_left == 0 {
                return Err(error.clone());
            }
            *frames_left -= 1;
        }
        self.tally.frames.fetch_add(1, Ordering::SeqCst);
        Ok(CameraFrame::packed(
            16,
            8,
            PixelFormat::RGBA,
            vec![180; 16 * 8 * 4],
        ))
    }

    fn stop(&mut self) {
        if self.active {
            self.tally.stops.fetch_add(1, Ordering::SeqCst);
            self.tally.live.store(false, Ordering::SeqCst);
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Decoder that reads a code after a number of empty frames
pub struct ScriptedDecoder {
    code: Option<String>,
    after: usize,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    pub fn code_after(code: &str, after: usize) -> Self {
        Self {
            code: Some(code.to_string()),
            after,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn never() -> Self {
        Self {
            code: None,
            after: 0,
            calls: AtomicUsize::new(0),
        }
    }
}

impl BarcodeDecoder for ScriptedDecoder {
    fn decode(&self, _image: &LumaImage) -> Result<String, DecodeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.code {
            Some(code) if call >= self.after => Ok(code.clone()),
            _ => Err(DecodeError::NotFound),
        }
    }
}

/// In-memory nutrition server
#[derive(Default)]
pub struct FakeApi {
    pub product: Mutex<Option<Result<ProductMatch, ServerError>>>,
    pub recognitions: Mutex<Vec<Result<RecognitionGuess, ServerError>>>,
    pub search: Mutex<Option<Result<Vec<FoodSearchHit>, ServerError>>>,
    pub barcode_requests: Mutex<Vec<String>>,
    pub image_uploads: Mutex<Vec<Vec<u8>>>,
    pub search_requests: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
    /// Stream state seen when each request arrived
    pub stream_live_at_request: Mutex<Vec<bool>>,
    pub tally: Option<Arc<StreamTally>>,
}

impl FakeApi {
    pub fn with_product(product: Result<ProductMatch, ServerError>) -> Self {
        Self {
            product: Mutex::new(Some(product)),
            ..Self::default()
        }
    }

    pub fn with_recognitions(results: Vec<Result<RecognitionGuess, ServerError>>) -> Self {
        Self {
            recognitions: Mutex::new(results),
            ..Self::default()
        }
    }

    pub fn watching(mut self, tally: &Arc<StreamTally>) -> Self {
        self.tally = Some(Arc::clone(tally));
        self
    }

    pub fn barcode_requests(&self) -> Vec<String> {
        self.barcode_requests.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.image_uploads.lock().unwrap().len()
    }

    fn record_stream_state(&self) {
        if let Some(tally) = &self.tally {
            self.stream_live_at_request
                .lock()
                .unwrap()
                .push(tally.is_live());
        }
    }
}

#[async_trait]
impl FoodApi for FakeApi {
    async fn lookup_barcode(&self, barcode: &str) -> Result<ProductMatch, ServerError> {
        self.record_stream_state();
        self.barcode_requests
            .lock()
            .unwrap()
            .push(barcode.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.product
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ServerError::Application("Product not found".into())))
    }

    async fn recognize_food(&self, jpeg: Vec<u8>) -> Result<RecognitionGuess, ServerError> {
        self.record_stream_state();
        self.image_uploads.lock().unwrap().push(jpeg);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut queue = self.recognitions.lock().unwrap();
        if queue.is_empty() {
            Err(ServerError::Application("Could not recognize food".into()))
        } else {
            queue.remove(0)
        }
    }

    async fn search_food(&self, query: &str) -> Result<Vec<FoodSearchHit>, ServerError> {
        self.search_requests.lock().unwrap().push(query.to_string());
        self.search
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Host that records what it was asked to do
#[derive(Default)]
pub struct RecordingHost {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HandoffTarget for RecordingHost {
    fn close_capture(&self) {
        self.calls.lock().unwrap().push("close".to_string());
    }

    async fn prefill_food_log(&self, food_id: i64, food_name: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("prefill {} {}", food_id, food_name));
    }

    async fn search_food_log(&self, query: &str) {
        self.calls.lock().unwrap().push(format!("search {}", query));
    }

    async fn navigate(&self, url: &str) {
        self.calls.lock().unwrap().push(format!("navigate {}", url));
    }
}

pub fn oat_milk() -> ProductMatch {
    ProductMatch {
        id: 7,
        name: "Oat Milk".to_string(),
        brand: None,
        calories_per_100g: Some(45.0),
        protein_per_100g: Some(1.0),
        carbs_per_100g: None,
        fat_per_100g: None,
    }
}
