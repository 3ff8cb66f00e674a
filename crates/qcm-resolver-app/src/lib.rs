#![warn(missing_docs)]
//! # qcm-resolver-app
//!
//! ## Purpose
//! Orchestrates state, API calls, capture, and crop for the QCM resolver
//! client.
//!
//! ## Responsibilities
//! - Translate typed UI events into state mutations and API calls.
//! - Own the capture session and pump its events into the solve flow.
//! - Enforce the context-selection gate for every submission path.
//! - Parse environment configuration and expose the app version.
//!
//! ## Data flow
//! Shell dispatches [`UiEvent`] values -> [`App::handle_event`] mutates the
//! [`StateStore`] and calls the backend -> subscribers re-render. The
//! capture session runs independently; [`App::pump_capture_events`] drains
//! its signals and submits the latest capture through the same solve path
//! as manual uploads.
//!
//! ## Ownership and lifetimes
//! [`App`] is constructed explicitly with its store, client, controller,
//! and screen source; there are no ambient globals.
//!
//! ## Error model
//! Construction and configuration failures return [`AppError`]. Flow
//! failures never propagate: they are terminal for the current operation
//! only and land in the store as localized messages, so the user can always
//! retry.
//!
//! ## Security and privacy notes
//! Captured stills pass through submission flows but are never logged;
//! log lines carry document names and status detail only.

use std::sync::Arc;

use qcm_resolver_api::{ApiClient, ApiError, HttpTransport};
use qcm_resolver_capture::{
    acquire_still, probe_still_strategy, CaptureConfig, CaptureController, CaptureError,
    ScreenSource, SessionEvent, StillStrategy, DEFAULT_CAPTURE_INTERVAL_MS,
};
use qcm_resolver_core::{has_pdf_extension, image_mime_for_file_name, CapturedFile};
use qcm_resolver_crop::{CropError, CropSession};
use qcm_resolver_detect::DetectorConfig;
use qcm_resolver_i18n::{translate, translate_with, Language, MessageKey};
use qcm_resolver_ui::{AppState, DocumentOpStatus, StateStore};
use thiserror::Error;

/// Build-time application version loaded from the root `VERSION` file.
pub const APP_VERSION: &str = env!("QCM_RESOLVER_VERSION");

/// Env var naming the backend base URL.
pub const ENV_API_BASE: &str = "QCM_RESOLVER_API_BASE";

/// Env var overriding the live sampling interval, in milliseconds.
pub const ENV_CAPTURE_INTERVAL_MS: &str = "QCM_RESOLVER_CAPTURE_INTERVAL_MS";

/// Backend base URL used when the env var is unset.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Rejection text mirrored from the backend's upload policy, interpolated
/// into the localized error template for pre-flight rejections.
const PDF_TYPE_REJECTION: &str = "PDF file type not allowed.";

/// Returns the app version sourced from the root `VERSION` file.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Environment-derived configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL.
    pub api_base: String,
    /// Live sampling cadence in milliseconds.
    pub capture_interval_ms: u64,
}

impl AppConfig {
    /// Reads configuration from the environment, applying defaults.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the interval override is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, AppError> {
        let api_base =
            std::env::var(ENV_API_BASE).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let capture_interval_ms = match std::env::var(ENV_CAPTURE_INTERVAL_MS) {
            Err(_) => DEFAULT_CAPTURE_INTERVAL_MS,
            Ok(raw) => {
                let parsed = raw.trim().parse::<u64>().map_err(|_| {
                    AppError::Config(format!(
                        "{ENV_CAPTURE_INTERVAL_MS} must be a positive integer, got '{raw}'"
                    ))
                })?;
                if parsed == 0 {
                    return Err(AppError::Config(format!(
                        "{ENV_CAPTURE_INTERVAL_MS} must be greater than zero"
                    )));
                }
                parsed
            }
        };

        Ok(Self {
            api_base,
            capture_interval_ms,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            capture_interval_ms: DEFAULT_CAPTURE_INTERVAL_MS,
        }
    }
}

/// Typed event bus between the shell and the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The user picked a display language.
    LanguageSelected(Language),
    /// The user dropped or picked a reference document.
    DocumentFileSelected {
        /// File name as presented by the picker.
        name: String,
        /// Raw file bytes.
        bytes: Vec<u8>,
    },
    /// The user clicked a document row to (de)select it as context.
    DocumentSelectionToggled {
        /// Id of the clicked document.
        id: String,
    },
    /// The user confirmed deletion of a document.
    DocumentDeleteRequested {
        /// Id of the document to delete.
        id: String,
    },
    /// The user submitted a question image (drop, pick, or crop confirm).
    QcmFileSelected(CapturedFile),
    /// The user started live capture.
    LiveCaptureStartRequested,
    /// The user stopped live capture.
    LiveCaptureStopRequested,
    /// The user asked to start over.
    ResetRequested,
}

/// Builds a submittable artifact from a picked image file.
///
/// Returns `None` when the file name does not carry an accepted image
/// extension; the shell keeps the drop zone open in that case.
pub fn qcm_file_from_upload(name: &str, bytes: Vec<u8>) -> Option<CapturedFile> {
    let mime = image_mime_for_file_name(name)?;
    CapturedFile::new(name, mime, bytes).ok()
}

/// Top-level controller owning every subsystem of the client.
pub struct App {
    store: StateStore,
    api: ApiClient,
    capture: CaptureController,
    source: Arc<dyn ScreenSource>,
    still_strategy: StillStrategy,
    capture_config: CaptureConfig,
}

impl App {
    /// Wires the controller from explicit collaborators.
    ///
    /// The still-acquisition strategy is probed here, exactly once; no flow
    /// checks capture capability again afterwards.
    ///
    /// # Errors
    /// Returns [`AppError::Api`] for an invalid base URL and
    /// [`AppError::Capture`] for an invalid sampling interval.
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn HttpTransport>,
        source: Arc<dyn ScreenSource>,
    ) -> Result<Self, AppError> {
        let api = ApiClient::new(config.api_base.clone(), transport)?;
        let capture_config = CaptureConfig::new(config.capture_interval_ms)?;
        let still_strategy = probe_still_strategy(source.as_ref());

        log_stage(
            "bootstrap",
            "wired",
            &format!(
                "version={} api_base={} interval_ms={} still_strategy={still_strategy:?}",
                app_version(),
                api.base_url(),
                capture_config.interval_ms
            ),
        );

        Ok(Self {
            store: StateStore::new(),
            api,
            capture: CaptureController::new(),
            source,
            still_strategy,
            capture_config,
        })
    }

    /// Returns the current state snapshot.
    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    /// Returns the store, e.g. to subscribe render listeners.
    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// Returns the strategy resolved at construction.
    pub fn still_strategy(&self) -> StillStrategy {
        self.still_strategy
    }

    /// Loads the initial document list.
    ///
    /// A load failure leaves the list empty and records a localized status
    /// line; the app stays usable.
    pub fn init(&mut self) {
        self.refresh_documents();
    }

    /// Applies one UI event to the controller.
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::LanguageSelected(language) => {
                log_stage("ui", "language_selected", language.code());
                self.store.set_language(language);
            }
            UiEvent::DocumentFileSelected {
                name,
                bytes,
            } => self.upload_document(name, bytes),
            UiEvent::DocumentSelectionToggled {
                id,
            } => self.store.toggle_context(&id),
            UiEvent::DocumentDeleteRequested {
                id,
            } => self.delete_document(&id),
            UiEvent::QcmFileSelected(file) => self.solve(file),
            UiEvent::LiveCaptureStartRequested => self.start_live_capture(),
            UiEvent::LiveCaptureStopRequested => self.stop_live_capture(),
            UiEvent::ResetRequested => {
                log_stage("ui", "reset", "returning to form");
                self.store.reset_qcm();
            }
        }
    }

    /// Drains pending capture-session events.
    ///
    /// A detected change submits the latest capture through the regular
    /// solve flow; once that attempt completes, success or failure, the
    /// detector is re-armed. The session never re-arms itself.
    pub fn pump_capture_events(&mut self) {
        while let Some(event) = self.capture.poll_event() {
            match event {
                SessionEvent::ChangeDetected => {
                    log_stage("capture", "change_detected", "submitting latest capture");
                    if let Some(file) = self.capture.latest_capture() {
                        self.solve(file);
                    }
                    self.capture.reset_detector();
                }
                SessionEvent::TickSkipped {
                    detail,
                } => {
                    log_stage_error("capture", "tick_skipped", &detail);
                }
            }
        }
    }

    /// Acquires a still via the probed strategy and opens a crop session
    /// over it.
    ///
    /// # Errors
    /// Returns [`AppError::Capture`] when acquisition fails (the error is
    /// also surfaced in the store as a localized message) and
    /// [`AppError::Crop`] for degenerate display geometry.
    pub fn begin_crop(
        &mut self,
        displayed_width: u32,
        displayed_height: u32,
    ) -> Result<CropSession, AppError> {
        match acquire_still(self.source.as_ref(), self.still_strategy) {
            Ok(frame) => {
                log_stage(
                    "crop",
                    "still_acquired",
                    &format!("{}x{}", frame.width, frame.height),
                );
                Ok(CropSession::new(frame, displayed_width, displayed_height)?)
            }
            Err(error) => {
                self.surface_capture_error(&error);
                Err(AppError::Capture(error))
            }
        }
    }

    fn refresh_documents(&mut self) {
        match self.api.list_documents() {
            Ok(documents) => {
                log_stage("documents", "refreshed", &format!("count={}", documents.len()));
                self.store.set_documents(documents);
            }
            Err(error) => {
                log_stage_error("documents", "refresh_failed", &error.to_string());
                let language = self.language();
                self.store.set_documents(Vec::new());
                self.store.set_document_status(Some(DocumentOpStatus::Failed {
                    message: translate(language, MessageKey::LoadingError).to_string(),
                }));
            }
        }
    }

    fn upload_document(&mut self, name: String, bytes: Vec<u8>) {
        let language = self.language();
        if !has_pdf_extension(&name) {
            log_stage_error("documents", "upload_rejected", &format!("name={name}"));
            self.store.set_document_status(Some(DocumentOpStatus::Failed {
                message: translate_with(
                    language,
                    MessageKey::PdfError,
                    &[("errorMessage", PDF_TYPE_REJECTION)],
                ),
            }));
            return;
        }

        self.store
            .set_document_status(Some(DocumentOpStatus::Processing));
        log_stage("documents", "upload_started", &format!("name={name}"));

        match self.api.upload_document(&name, &bytes) {
            Ok(()) => {
                log_stage("documents", "upload_succeeded", &format!("name={name}"));
                self.store.set_document_status(Some(DocumentOpStatus::Added {
                    file_name: name,
                }));
                self.refresh_documents();
            }
            Err(error) => {
                log_stage_error("documents", "upload_failed", &error.to_string());
                let detail = self.failure_message(&error);
                self.store.set_document_status(Some(DocumentOpStatus::Failed {
                    message: translate_with(
                        language,
                        MessageKey::PdfError,
                        &[("errorMessage", &detail)],
                    ),
                }));
            }
        }
    }

    fn delete_document(&mut self, id: &str) {
        match self.api.delete_document(id) {
            Ok(()) => {
                log_stage("documents", "deleted", &format!("id={id}"));
                self.store.remove_context(id);
                self.refresh_documents();
            }
            Err(error) => {
                log_stage_error("documents", "delete_failed", &error.to_string());
                let language = self.language();
                self.store.set_document_status(Some(DocumentOpStatus::Failed {
                    message: translate(language, MessageKey::AlertError).to_string(),
                }));
            }
        }
    }

    fn solve(&mut self, file: CapturedFile) {
        let language = self.language();
        let context_ids = self.store.state().selected_context_ids.clone();
        if context_ids.is_empty() {
            log_stage("solve", "blocked", "no context document selected");
            self.store.flag_context_warning(true);
            return;
        }

        self.store
            .set_mode_loading(translate(language, MessageKey::SolvingQcm));
        log_stage(
            "solve",
            "submitted",
            &format!("file={} context_count={}", file.name, context_ids.len()),
        );

        match self.api.solve_qcm(&file, &context_ids) {
            Ok(result) => {
                log_stage("solve", "answered", "result received");
                self.store.set_mode_success(result);
            }
            Err(error) => {
                log_stage_error("solve", "failed", &error.to_string());
                let message = self.failure_message(&error);
                self.store.set_mode_error(message);
            }
        }
    }

    fn start_live_capture(&mut self) {
        if self.store.state().selected_context_ids.is_empty() {
            log_stage("capture", "start_blocked", "no context document selected");
            self.store.flag_context_warning(true);
            return;
        }
        if self.capture.is_active() {
            // Running session stays authoritative.
            log_stage("capture", "start_ignored", "session already active");
            return;
        }

        match self.capture.start(
            self.source.as_ref(),
            self.capture_config,
            DetectorConfig::default(),
        ) {
            Ok(()) => {
                log_stage(
                    "capture",
                    "started",
                    &format!("interval_ms={}", self.capture_config.interval_ms),
                );
                self.store.set_capturing(true);
            }
            Err(error) => {
                log_stage_error("capture", "start_failed", &error.to_string());
                self.surface_capture_error(&error);
            }
        }
    }

    fn stop_live_capture(&mut self) {
        let was_active = self.capture.is_active();
        self.capture.stop();
        if was_active {
            log_stage("capture", "stopped", "session resources released");
        }
        self.store.set_capturing(false);
    }

    fn surface_capture_error(&mut self, error: &CaptureError) {
        let language = self.language();
        let message = match error {
            CaptureError::PermissionDenied => {
                translate(language, MessageKey::CapturePermissionDenied).to_string()
            }
            other => translate_with(
                language,
                MessageKey::CaptureErrorWithMessage,
                &[("message", &other.to_string())],
            ),
        };
        self.store.set_mode_error(message);
    }

    fn failure_message(&self, error: &ApiError) -> String {
        match error {
            ApiError::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Server {
                detail: None,
                ..
            } => translate(self.store.state().language, MessageKey::Error).to_string(),
            other => other.to_string(),
        }
    }

    fn language(&self) -> Language {
        self.store.state().language
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.capture.stop();
    }
}

fn log_stage(stage: &str, action: &str, detail: &str) {
    log::info!("{stage} | {action} | {detail}");
}

fn log_stage_error(stage: &str, action: &str, detail: &str) {
    log::error!("{stage} | {action} | {detail}");
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Environment configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// API client error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    /// Capture subsystem error.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Crop subsystem error.
    #[error("crop error: {0}")]
    Crop(#[from] CropError),
}
