#![warn(missing_docs)]
//! # qcm-resolver-capture
//!
//! ## Purpose
//! Provides screen still and stream acquisition plus the live capture
//! session that watches the screen for question changes.
//!
//! ## Responsibilities
//! - Define a backend-agnostic screen source trait.
//! - Expose real screen capture on supported platforms.
//! - Expose deterministic synthetic capture for CI and unit tests.
//! - Resolve the still-acquisition strategy once at startup.
//! - Run the sampling session: ticker, frame grabs, change detection, and
//!   the latest-capture slot.
//!
//! ## Data flow
//! The app requests a stream from a [`ScreenSource`] through
//! [`CaptureController::start`]; a worker thread samples it at the
//! configured cadence, keeps the newest encoded still, and reports
//! [`SessionEvent::ChangeDetected`] when the detector fires. The app then
//! takes [`CaptureController::latest_capture`] and, once it finished
//! processing, re-arms via [`CaptureController::reset_detector`].
//!
//! ## Ownership and lifetimes
//! The raw stream is owned exclusively by the session worker; no other
//! component ever holds it. Dropping the worker releases the stream.
//!
//! ## Error model
//! Permission refusals, backend failures, invalid intervals, and double
//! starts are reported as [`CaptureError`] values. Failed grabs inside a
//! running session skip the tick and surface as
//! [`SessionEvent::TickSkipped`] without tearing the session down.
//!
//! ## Security and privacy notes
//! Stills can contain anything on screen. They stay in memory, are never
//! logged, and are discarded when the session stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use qcm_resolver_core::{encode_png, CapturedFile, FrameSnapshot, LIVE_CAPTURE_FILE_NAME};
use qcm_resolver_detect::{DetectorConfig, FrameChangeDetector, Verdict};
use thiserror::Error;

/// Default sampling cadence of a live session.
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 1_000;

/// Live-session sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Milliseconds between samples.
    pub interval_ms: u64,
}

impl CaptureConfig {
    /// Creates validated sampling configuration.
    ///
    /// # Errors
    /// Returns [`CaptureError::InvalidInterval`] when `interval_ms == 0`.
    pub fn new(interval_ms: u64) -> Result<Self, CaptureError> {
        if interval_ms == 0 {
            return Err(CaptureError::InvalidInterval);
        }
        Ok(Self { interval_ms })
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_CAPTURE_INTERVAL_MS,
        }
    }
}

/// An acquired live stream of screen frames.
pub trait FrameStream: Send {
    /// Samples the current screen content.
    ///
    /// # Errors
    /// Returns [`CaptureError::Backend`] when the sample cannot be taken.
    fn next_frame(&mut self) -> Result<FrameSnapshot, CaptureError>;
}

/// Trait implemented by concrete screen providers.
///
/// Acquisition is the permission point: both [`request_stream`] and
/// [`grab_frame`] prompt the platform for screen access and fail with
/// [`CaptureError::PermissionDenied`] when the user refuses.
///
/// [`request_stream`]: ScreenSource::request_stream
/// [`grab_frame`]: ScreenSource::grab_frame
pub trait ScreenSource: Send + Sync {
    /// Acquires a live stream of the screen.
    ///
    /// # Errors
    /// Returns [`CaptureError::PermissionDenied`] when the user refuses and
    /// [`CaptureError::Backend`] on other acquisition failures.
    fn request_stream(&self) -> Result<Box<dyn FrameStream>, CaptureError>;

    /// Reports whether this source supports one-shot frame grabs.
    fn supports_frame_grab(&self) -> bool;

    /// Grabs one still, acquiring and releasing screen access internally.
    ///
    /// # Errors
    /// Returns [`CaptureError::PermissionDenied`] when the user refuses and
    /// [`CaptureError::Backend`] when the source does not support grabs or
    /// the grab fails.
    fn grab_frame(&self) -> Result<FrameSnapshot, CaptureError>;
}

/// How a single still is acquired for the crop flow.
///
/// Resolved exactly once at startup via [`probe_still_strategy`]; callers
/// never branch on capability at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillStrategy {
    /// One-shot grab offered by the source.
    FrameGrab,
    /// Open a stream, take its first frame, release the stream.
    StreamSample,
}

/// Resolves the still-acquisition strategy for a source.
pub fn probe_still_strategy(source: &dyn ScreenSource) -> StillStrategy {
    if source.supports_frame_grab() {
        StillStrategy::FrameGrab
    } else {
        StillStrategy::StreamSample
    }
}

/// Acquires one still using the resolved strategy.
///
/// # Errors
/// Returns [`CaptureError::PermissionDenied`] when the user refuses screen
/// access and [`CaptureError::Backend`] on acquisition failures.
pub fn acquire_still(
    source: &dyn ScreenSource,
    strategy: StillStrategy,
) -> Result<FrameSnapshot, CaptureError> {
    match strategy {
        StillStrategy::FrameGrab => source.grab_frame(),
        StillStrategy::StreamSample => {
            let mut stream = source.request_stream()?;
            let frame = stream.next_frame()?;
            // Stream dropped immediately: access is released after one frame.
            Ok(frame)
        }
    }
}

/// Real screen source for supported desktop targets.
///
/// # Notes
/// Screen handles are reacquired for every grab and sample, so display
/// changes between calls are tolerated.
#[derive(Debug, Clone)]
pub struct RealScreenSource {
    #[cfg(windows)]
    screen_index: usize,
}

impl RealScreenSource {
    /// Discovers the primary screen and creates a real source.
    ///
    /// # Errors
    /// Returns [`CaptureError::Backend`] when enumeration fails, no screen
    /// is available, or the platform is unsupported.
    pub fn discover() -> Result<Self, CaptureError> {
        #[cfg(windows)]
        {
            use screenshots::Screen;

            let screens = Screen::all().map_err(|error| {
                CaptureError::Backend(format!("screen enumeration failed: {error}"))
            })?;
            if screens.is_empty() {
                return Err(CaptureError::Backend(
                    "no screens were reported by the OS".to_string(),
                ));
            }

            Ok(Self { screen_index: 0 })
        }

        #[cfg(not(windows))]
        {
            Err(CaptureError::Backend(
                "real screen source is currently implemented for Windows only".to_string(),
            ))
        }
    }

    #[cfg(windows)]
    fn capture_once(screen_index: usize) -> Result<FrameSnapshot, CaptureError> {
        use screenshots::Screen;

        let screens = Screen::all()
            .map_err(|error| CaptureError::Backend(format!("screen refresh failed: {error}")))?;
        let screen = screens.get(screen_index).ok_or_else(|| {
            CaptureError::Backend(format!("screen index {screen_index} is not available anymore"))
        })?;

        let captured = screen
            .capture()
            .map_err(|error| CaptureError::Backend(format!("screen capture failed: {error}")))?;
        let width = captured.width();
        let height = captured.height();
        let rgba = captured.into_raw();

        FrameSnapshot::new(width, height, rgba)
            .map_err(|error| CaptureError::Backend(error.to_string()))
    }
}

impl ScreenSource for RealScreenSource {
    fn request_stream(&self) -> Result<Box<dyn FrameStream>, CaptureError> {
        #[cfg(windows)]
        {
            // Probe once so acquisition failures surface at start, not on
            // the first tick.
            let _ = Self::capture_once(self.screen_index)?;
            Ok(Box::new(RealFrameStream {
                screen_index: self.screen_index,
            }))
        }

        #[cfg(not(windows))]
        {
            Err(CaptureError::Backend(
                "real screen source is currently implemented for Windows only".to_string(),
            ))
        }
    }

    fn supports_frame_grab(&self) -> bool {
        cfg!(windows)
    }

    fn grab_frame(&self) -> Result<FrameSnapshot, CaptureError> {
        #[cfg(windows)]
        {
            Self::capture_once(self.screen_index)
        }

        #[cfg(not(windows))]
        {
            Err(CaptureError::Backend(
                "real screen source is currently implemented for Windows only".to_string(),
            ))
        }
    }
}

#[cfg(windows)]
struct RealFrameStream {
    screen_index: usize,
}

#[cfg(windows)]
impl FrameStream for RealFrameStream {
    fn next_frame(&mut self) -> Result<FrameSnapshot, CaptureError> {
        RealScreenSource::capture_once(self.screen_index)
    }
}

/// Deterministic synthetic source for tests and CI.
///
/// Serves a scripted frame sequence; when the script runs out the last
/// frame repeats forever. Grabs and stream samples advance the same cursor.
#[derive(Debug)]
pub struct SyntheticScreenSource {
    frames: Arc<Vec<FrameSnapshot>>,
    cursor: Arc<Mutex<usize>>,
    deny_permission: bool,
    frame_grab_supported: bool,
}

impl SyntheticScreenSource {
    /// Creates a source serving one uniform 4x4 frame.
    pub fn new() -> Self {
        let frame = FrameSnapshot {
            width: 4,
            height: 4,
            rgba: vec![128; 4 * 4 * 4],
        };
        Self::with_frames(vec![frame])
    }

    /// Creates a source serving the given script.
    ///
    /// An empty script falls back to the default single frame.
    pub fn with_frames(frames: Vec<FrameSnapshot>) -> Self {
        if frames.is_empty() {
            return Self::new();
        }

        Self {
            frames: Arc::new(frames),
            cursor: Arc::new(Mutex::new(0)),
            deny_permission: false,
            frame_grab_supported: true,
        }
    }

    /// Makes every acquisition fail as a permission refusal.
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Removes one-shot grab capability, forcing the stream-sample strategy.
    pub fn without_frame_grab(mut self) -> Self {
        self.frame_grab_supported = false;
        self
    }

    fn next_scripted(&self) -> Result<FrameSnapshot, CaptureError> {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| CaptureError::Backend("synthetic cursor lock poisoned".to_string()))?;
        let frame = self.frames[(*cursor).min(self.frames.len() - 1)].clone();
        *cursor = cursor.saturating_add(1);
        Ok(frame)
    }
}

impl Default for SyntheticScreenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenSource for SyntheticScreenSource {
    fn request_stream(&self) -> Result<Box<dyn FrameStream>, CaptureError> {
        if self.deny_permission {
            return Err(CaptureError::PermissionDenied);
        }

        Ok(Box::new(SyntheticFrameStream {
            frames: Arc::clone(&self.frames),
            cursor: Arc::clone(&self.cursor),
        }))
    }

    fn supports_frame_grab(&self) -> bool {
        self.frame_grab_supported
    }

    fn grab_frame(&self) -> Result<FrameSnapshot, CaptureError> {
        if self.deny_permission {
            return Err(CaptureError::PermissionDenied);
        }
        if !self.frame_grab_supported {
            return Err(CaptureError::Backend(
                "frame grab is not supported by this source".to_string(),
            ));
        }

        self.next_scripted()
    }
}

struct SyntheticFrameStream {
    frames: Arc<Vec<FrameSnapshot>>,
    cursor: Arc<Mutex<usize>>,
}

impl FrameStream for SyntheticFrameStream {
    fn next_frame(&mut self) -> Result<FrameSnapshot, CaptureError> {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| CaptureError::Backend("synthetic cursor lock poisoned".to_string()))?;
        let frame = self.frames[(*cursor).min(self.frames.len() - 1)].clone();
        *cursor = cursor.saturating_add(1);
        Ok(frame)
    }
}

/// Event reported by a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The detector flagged a significant change; the consumer should take
    /// the latest capture and submit it.
    ChangeDetected,
    /// A tick could not produce a frame; the session continues.
    TickSkipped {
        /// Backend failure text.
        detail: String,
    },
}

enum SessionCommand {
    Tick,
    ResetDetector,
    Shutdown,
}

struct TickerSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

struct SessionRuntime {
    active: Arc<AtomicBool>,
    signal: Arc<TickerSignal>,
    command_tx: Sender<SessionCommand>,
    event_rx: Receiver<SessionEvent>,
    latest: Arc<Mutex<Option<CapturedFile>>>,
    ticker_join: JoinHandle<()>,
    worker_join: JoinHandle<()>,
}

/// Owns the live capture session lifecycle.
///
/// At most one session runs at a time; starting while active is rejected
/// with [`CaptureError::AlreadyActive`] and the running session stays
/// authoritative.
#[derive(Default)]
pub struct CaptureController {
    session: Option<SessionRuntime>,
}

impl CaptureController {
    /// Creates a controller with no running session.
    pub fn new() -> Self {
        Self { session: None }
    }

    /// Returns `true` while a session is running.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a live session over `source`.
    ///
    /// Stream acquisition happens first: when the user refuses, no threads
    /// or buffers are allocated and the error is returned as-is.
    ///
    /// # Errors
    /// Returns [`CaptureError::AlreadyActive`] when a session is running,
    /// [`CaptureError::PermissionDenied`] when acquisition is refused, and
    /// [`CaptureError::Backend`] on other failures.
    pub fn start(
        &mut self,
        source: &dyn ScreenSource,
        config: CaptureConfig,
        detector_config: DetectorConfig,
    ) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyActive);
        }

        let stream = source.request_stream()?;

        let active = Arc::new(AtomicBool::new(true));
        let latest: Arc<Mutex<Option<CapturedFile>>> = Arc::new(Mutex::new(None));
        let signal = Arc::new(TickerSignal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let (command_tx, command_rx) = mpsc::channel::<SessionCommand>();
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>();

        let worker_active = Arc::clone(&active);
        let worker_latest = Arc::clone(&latest);
        let worker_join = std::thread::Builder::new()
            .name("qcm-capture-worker".to_string())
            .spawn(move || {
                run_session_worker(
                    stream,
                    detector_config,
                    command_rx,
                    event_tx,
                    worker_active,
                    worker_latest,
                );
            })
            .map_err(|error| {
                CaptureError::Backend(format!("failed to spawn capture worker thread: {error}"))
            })?;

        let ticker_signal = Arc::clone(&signal);
        let ticker_tx = command_tx.clone();
        let interval = Duration::from_millis(config.interval_ms);
        let ticker_join = match std::thread::Builder::new()
            .name("qcm-capture-ticker".to_string())
            .spawn(move || run_session_ticker(ticker_signal, ticker_tx, interval))
        {
            Ok(handle) => handle,
            Err(error) => {
                let _ = command_tx.send(SessionCommand::Shutdown);
                let _ = worker_join.join();
                return Err(CaptureError::Backend(format!(
                    "failed to spawn capture ticker thread: {error}"
                )));
            }
        };

        self.session = Some(SessionRuntime {
            active,
            signal,
            command_tx,
            event_rx,
            latest,
            ticker_join,
            worker_join,
        });

        Ok(())
    }

    /// Returns the newest encoded still of the running session, if any.
    pub fn latest_capture(&self) -> Option<CapturedFile> {
        let session = self.session.as_ref()?;
        session.latest.lock().ok()?.clone()
    }

    /// Acknowledges a detected change and re-arms the detector.
    pub fn reset_detector(&self) {
        if let Some(session) = &self.session {
            let _ = session.command_tx.send(SessionCommand::ResetDetector);
        }
    }

    /// Drains one pending session event, without blocking.
    pub fn poll_event(&self) -> Option<SessionEvent> {
        let session = self.session.as_ref()?;
        session.event_rx.try_recv().ok()
    }

    /// Stops the running session.
    ///
    /// Idempotent and safe to call when nothing was started. Deactivation
    /// happens before the threads are joined, so ticks already queued are
    /// discarded and no change signals fire after this returns. The latest
    /// capture and the detector state are gone afterwards.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        // Deactivate first: queued ticks become no-ops.
        session.active.store(false, Ordering::SeqCst);
        if let Ok(mut stopped) = session.signal.stopped.lock() {
            *stopped = true;
        }
        session.signal.wake.notify_all();
        let _ = session.command_tx.send(SessionCommand::Shutdown);

        let _ = session.ticker_join.join();
        let _ = session.worker_join.join();

        if let Ok(mut slot) = session.latest.lock() {
            *slot = None;
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_session_ticker(
    signal: Arc<TickerSignal>,
    command_tx: Sender<SessionCommand>,
    interval: Duration,
) {
    loop {
        let guard = match signal.stopped.lock() {
            Ok(guard) => guard,
            Err(_) => break,
        };
        let (guard, timeout) = match signal.wake.wait_timeout(guard, interval) {
            Ok(pair) => pair,
            Err(_) => break,
        };
        let stopped = *guard;
        drop(guard);

        if stopped {
            break;
        }
        if timeout.timed_out() && command_tx.send(SessionCommand::Tick).is_err() {
            break;
        }
    }
}

fn run_session_worker(
    mut stream: Box<dyn FrameStream>,
    detector_config: DetectorConfig,
    command_rx: Receiver<SessionCommand>,
    event_tx: Sender<SessionEvent>,
    active: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<CapturedFile>>>,
) {
    let mut detector = FrameChangeDetector::new(detector_config);

    while let Ok(command) = command_rx.recv() {
        match command {
            SessionCommand::Tick => {
                if !active.load(Ordering::SeqCst) {
                    continue;
                }

                let snapshot = match stream.next_frame() {
                    Ok(snapshot) => snapshot,
                    Err(error) => {
                        let _ = event_tx.send(SessionEvent::TickSkipped {
                            detail: error.to_string(),
                        });
                        continue;
                    }
                };

                let encoded = match encode_png(&snapshot, LIVE_CAPTURE_FILE_NAME) {
                    Ok(encoded) => encoded,
                    Err(error) => {
                        let _ = event_tx.send(SessionEvent::TickSkipped {
                            detail: error.to_string(),
                        });
                        continue;
                    }
                };
                if let Ok(mut slot) = latest.lock() {
                    // Only the newest still is retained.
                    *slot = Some(encoded);
                }

                if detector.observe(snapshot) == Verdict::Changed {
                    let _ = event_tx.send(SessionEvent::ChangeDetected);
                }
            }
            SessionCommand::ResetDetector => detector.reset(),
            SessionCommand::Shutdown => break,
        }
    }
    // Worker exit drops the stream: screen access is released here.
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user refused screen access.
    #[error("screen capture permission was denied")]
    PermissionDenied,
    /// A session is already running.
    #[error("a capture session is already active")]
    AlreadyActive,
    /// Sampling interval must be positive.
    #[error("invalid capture interval: must be greater than zero")]
    InvalidInterval,
    /// Backend runtime failure.
    #[error("capture backend failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for synthetic source scripting and strategy probing.

    use super::*;

    fn frame(value: u8) -> FrameSnapshot {
        FrameSnapshot::new(2, 2, vec![value; 2 * 2 * 4]).expect("valid frame")
    }

    #[test]
    fn synthetic_source_serves_script_then_repeats_last() {
        let source = SyntheticScreenSource::with_frames(vec![frame(1), frame(2)]);
        assert_eq!(source.grab_frame().expect("grab").rgba[0], 1);
        assert_eq!(source.grab_frame().expect("grab").rgba[0], 2);
        assert_eq!(source.grab_frame().expect("grab").rgba[0], 2);
    }

    #[test]
    fn synthetic_stream_shares_the_script_cursor() {
        let source = SyntheticScreenSource::with_frames(vec![frame(1), frame(2), frame(3)]);
        assert_eq!(source.grab_frame().expect("grab").rgba[0], 1);

        let mut stream = source.request_stream().expect("stream");
        assert_eq!(stream.next_frame().expect("frame").rgba[0], 2);
        assert_eq!(stream.next_frame().expect("frame").rgba[0], 3);
    }

    #[test]
    fn denied_source_refuses_both_acquisition_paths() {
        let source = SyntheticScreenSource::new().deny_permission();
        assert!(matches!(
            source.request_stream().err(),
            Some(CaptureError::PermissionDenied)
        ));
        assert!(matches!(
            source.grab_frame(),
            Err(CaptureError::PermissionDenied)
        ));
    }

    #[test]
    fn probe_prefers_frame_grab_when_supported() {
        let grabbing = SyntheticScreenSource::new();
        assert_eq!(probe_still_strategy(&grabbing), StillStrategy::FrameGrab);

        let sampling = SyntheticScreenSource::new().without_frame_grab();
        assert_eq!(probe_still_strategy(&sampling), StillStrategy::StreamSample);
    }

    #[test]
    fn capture_config_rejects_zero_interval() {
        assert!(matches!(
            CaptureConfig::new(0),
            Err(CaptureError::InvalidInterval)
        ));
        assert_eq!(CaptureConfig::default().interval_ms, 1_000);
    }
}
