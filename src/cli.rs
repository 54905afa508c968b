// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! The terminal is the host of the capture workflows: it prints the result
//! panel, asks which action to take, and performs handoffs by opening the
//! food log in a browser or running the food log search itself.

use async_trait::async_trait;
use nutricam::backends::camera::{CameraBackendType, get_backend_for_type};
use nutricam::capture::recognition::search_foods;
use nutricam::capture::{
    BarcodeScanner, CaptureResult, DeviceAcquirer, FoodRecognizer, Handoff, HandoffMode,
    HandoffTarget,
};
use nutricam::client::{FoodApi, HttpFoodApi};
use nutricam::config::Config;
use nutricam::decode::MultiFormatReader;
use nutricam::errors::{DeviceError, validate_manual_search};
use nutricam::pipelines::photo::PhotoPipeline;
use nutricam::render::{Action, ResultView};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load configuration and apply command-line overrides
pub fn load_config(
    path: Option<&Path>,
    server: Option<String>,
    handoff: Option<HandoffMode>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(server) = server {
        config.server_url = server;
    }
    if let Some(handoff) = handoff {
        config.handoff_mode = handoff;
    }
    Ok(config)
}

fn build_api(config: &Config) -> Result<Arc<dyn FoodApi>, Box<dyn std::error::Error>> {
    Ok(Arc::new(HttpFoodApi::new(
        &config.server_url,
        config.request_timeout(),
    )?))
}

fn build_acquirer(config: &Config, camera: Option<usize>, image: Option<PathBuf>) -> DeviceAcquirer {
    let backend_type = match image {
        Some(path) => CameraBackendType::StillImage(path),
        None => config.backend.clone(),
    };
    DeviceAcquirer::new(get_backend_for_type(&backend_type), config.stream_constraints())
        .with_device_index(camera)
}

/// Terminal side of a handoff
struct TerminalHost {
    api: Arc<dyn FoodApi>,
    server_url: String,
}

#[async_trait]
impl HandoffTarget for TerminalHost {
    async fn prefill_food_log(&self, food_id: i64, food_name: &str) {
        println!("Food log entry: {} (id {})", food_name, food_id);
    }

    async fn search_food_log(&self, query: &str) {
        let result = search_foods(self.api.as_ref(), query).await;
        println!("{}", ResultView::for_search(query, &result));
    }

    async fn navigate(&self, url: &str) {
        let full = format!("{}{}", self.server_url.trim_end_matches('/'), url);
        println!("Opening {}", full);
        if let Err(e) = open::that(&full) {
            warn!(error = %e, url = %full, "Failed to open browser");
            println!("Could not open a browser; visit the URL above.");
        }
    }
}

/// Read one line from stdin
async fn prompt(question: &str) -> Option<String> {
    println!("{}", question);
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    })
    .await
    .ok()
    .flatten()
}

fn confirmed(answer: Option<String>) -> bool {
    answer.is_some_and(|a| matches!(a.to_lowercase().as_str(), "y" | "yes"))
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> CliResult {
    let acquirer = build_acquirer(config, None, None);
    if !acquirer.is_supported() {
        println!("No cameras found.");
        return Ok(());
    }

    let devices = acquirer.devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let selected = DeviceAcquirer::select_device(&devices, config.facing).map(|d| d.id.clone());
    println!("Available cameras:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        let marker = if selected.as_deref() == Some(device.id.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!("  [{}] {}{}", index, device.label, marker);
        println!("      {}", device.id);
    }

    Ok(())
}

/// Scan a barcode and offer to add the product to the food log
pub async fn scan_barcode(config: &Config, camera: Option<usize>, image: Option<PathBuf>) -> CliResult {
    let api = build_api(config)?;
    let reader = MultiFormatReader::new(&config.barcode_formats, config.decode_max_dimension)?;
    let scanner = Arc::new(BarcodeScanner::new(
        build_acquirer(config, camera, image),
        Arc::new(reader),
        config.decode_max_dimension,
        Arc::clone(&api),
        Handoff::new(config.handoff_mode),
    ));

    let ctrlc_scanner = Arc::clone(&scanner);
    ctrlc::set_handler(move || ctrlc_scanner.dismiss())?;

    match scanner.start().await {
        Ok(()) => {}
        Err(DeviceError::Unsupported) => {
            println!("{}", scanner.panel().current());
            println!("Use 'nutricam lookup <BARCODE>' to enter a barcode by hand.");
            return Ok(());
        }
        Err(_) => {
            println!("{}", scanner.panel().current());
            return manual_entry_prompt(&scanner, config, api).await;
        }
    }

    println!("Point the camera at a barcode. Press Ctrl+C to cancel.");
    let Some(result) = scanner.scan().await else {
        println!("Scan cancelled.");
        return Ok(());
    };

    if matches!(result, CaptureResult::DeviceError(_)) {
        println!("{}", scanner.panel().current());
        return manual_entry_prompt(&scanner, config, api).await;
    }
    offer_product_handoff(&scanner, result, config, api).await;
    Ok(())
}

async fn manual_entry_prompt(
    scanner: &BarcodeScanner,
    config: &Config,
    api: Arc<dyn FoodApi>,
) -> CliResult {
    let answer = prompt("[e] Enter Manually  [q] Quit").await.unwrap_or_default();
    if !matches!(answer.as_str(), "e" | "E") {
        return Ok(());
    }

    scanner.show_manual_entry().await;
    loop {
        let Some(input) = prompt(&scanner.panel().current().to_string()).await else {
            return Ok(());
        };
        if input.is_empty() {
            return Ok(());
        }
        match scanner.lookup_manual(&input).await {
            Ok(Some(result)) => {
                offer_product_handoff(scanner, result, config, Arc::clone(&api)).await;
                return Ok(());
            }
            Ok(None) => return Ok(()),
            Err(_) => println!("{}", scanner.panel().current()),
        }
    }
}

/// Look up a barcode entered by hand
pub async fn lookup_barcode(config: &Config, barcode: &str) -> CliResult {
    let api = build_api(config)?;
    let reader = MultiFormatReader::new(&config.barcode_formats, config.decode_max_dimension)?;
    let scanner = BarcodeScanner::new(
        build_acquirer(config, None, None),
        Arc::new(reader),
        config.decode_max_dimension,
        Arc::clone(&api),
        Handoff::new(config.handoff_mode),
    );

    match scanner.lookup_manual(barcode).await {
        Ok(Some(result)) => offer_product_handoff(&scanner, result, config, api).await,
        Ok(None) => {}
        Err(_) => println!("{}", scanner.panel().current()),
    }
    Ok(())
}

async fn offer_product_handoff(
    scanner: &BarcodeScanner,
    result: CaptureResult<nutricam::client::ProductMatch>,
    config: &Config,
    api: Arc<dyn FoodApi>,
) {
    println!("{}", scanner.panel().current());

    let CaptureResult::Found(product) = result else {
        return;
    };
    if !confirmed(prompt("Add to food log? [y/N]").await) {
        return;
    }

    let host = TerminalHost {
        api,
        server_url: config.server_url.clone(),
    };
    scanner
        .add_scanned_food(product.id, &product.name, &host)
        .await;
}

/// Photograph food, show what the server recognized, and hand off a search
pub async fn recognize_food(
    config: &Config,
    camera: Option<usize>,
    image: Option<PathBuf>,
    save_dir: Option<PathBuf>,
) -> CliResult {
    let api = build_api(config)?;
    let recognizer = Arc::new(
        FoodRecognizer::new(
            build_acquirer(config, camera, image),
            PhotoPipeline::new(config.photo_encoder()),
            Arc::clone(&api),
            Handoff::new(config.handoff_mode),
            config.max_recognition_attempts,
        )
        .with_snapshot_dir(save_dir),
    );
    let host = TerminalHost {
        api,
        server_url: config.server_url.clone(),
    };

    let ctrlc_recognizer = Arc::clone(&recognizer);
    ctrlc::set_handler(move || ctrlc_recognizer.dismiss())?;

    loop {
        if recognizer.start().await.is_err() {
            println!("{}", recognizer.panel().current());
            return manual_search_prompt(&recognizer, &host).await;
        }

        if prompt("Press Enter to take the photo.").await.is_none() {
            recognizer.close().await;
            return Ok(());
        }

        let Some(result) = recognizer.capture().await else {
            return Ok(());
        };
        let view = recognizer.panel().current();
        println!("{}", view);

        match result {
            CaptureResult::Found(_) => {
                let queries: Vec<String> = view
                    .actions()
                    .into_iter()
                    .filter_map(|action| match action {
                        Action::SearchFor { query } => Some(query.clone()),
                        _ => None,
                    })
                    .collect();
                for (index, query) in queries.iter().enumerate() {
                    println!("  [{}] {}", index + 1, query);
                }

                let choice = prompt("Search for which food? (number, empty to take another photo)")
                    .await
                    .unwrap_or_default();
                match choice.parse::<usize>().ok().and_then(|n| queries.get(n.wrapping_sub(1))) {
                    Some(query) => {
                        recognizer.search_for_food(query, &host).await;
                        return Ok(());
                    }
                    None if choice.is_empty() => continue,
                    None => return Ok(()),
                }
            }
            _ => {
                let answer = prompt("[t] Try Again  [s] Search Manually  [q] Quit")
                    .await
                    .unwrap_or_default();
                match answer.as_str() {
                    "t" | "T" => continue,
                    "s" | "S" => return manual_search_prompt(&recognizer, &host).await,
                    _ => return Ok(()),
                }
            }
        }
    }
}

async fn manual_search_prompt(recognizer: &FoodRecognizer, host: &TerminalHost) -> CliResult {
    recognizer.show_manual_search().await;
    loop {
        let Some(input) = prompt(&recognizer.panel().current().to_string()).await else {
            return Ok(());
        };
        if input.is_empty() {
            return Ok(());
        }
        match recognizer.search_manual(&input, host).await {
            Ok(action) => {
                info!(?action, "Manual search handed off");
                return Ok(());
            }
            Err(e) => println!("{}", e),
        }
    }
}

/// Search foods by name and offer to add one to the food log
pub async fn search_food(config: &Config, query: &str) -> CliResult {
    let query = match validate_manual_search(query) {
        Ok(query) => query,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let api = build_api(config)?;
    let result = search_foods(api.as_ref(), query).await;
    let view = ResultView::for_search(query, &result);
    println!("{}", view);

    let CaptureResult::Found(hits) = result else {
        return Ok(());
    };
    let choice = prompt("Add which food to the log? (number, empty to skip)")
        .await
        .unwrap_or_default();
    let Some(hit) = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| hits.get(n.wrapping_sub(1)))
    else {
        return Ok(());
    };

    let handoff = Handoff::new(config.handoff_mode);
    let host = TerminalHost {
        api,
        server_url: config.server_url.clone(),
    };
    let action = handoff.add_food(hit.id, &hit.name);
    handoff.perform(&action, &host).await;
    Ok(())
}

/// Print recognition tips
pub fn show_tips() -> CliResult {
    println!("{}", ResultView::Tips);
    Ok(())
}
