//! Integration tests for capture lifecycle log lines.

mod common;

use std::sync::Mutex;

use common::{app_with, one_document_listing};
use log::{LevelFilter, Metadata, Record};
use qcm_resolver_app::UiEvent;
use qcm_resolver_capture::SyntheticScreenSource;

static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());

struct RecordingLogger;

impl log::Log for RecordingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        LINES
            .lock()
            .expect("log lock should work")
            .push(record.args().to_string());
    }

    fn flush(&self) {}
}

static LOGGER: RecordingLogger = RecordingLogger;

fn stopped_lines() -> usize {
    LINES
        .lock()
        .expect("log lock should work")
        .iter()
        .filter(|line| line.contains("capture | stopped"))
        .count()
}

#[test]
fn capture_logging_tests_stop_line_only_follows_a_running_session() {
    log::set_logger(&LOGGER).expect("logger should install once");
    log::set_max_level(LevelFilter::Info);

    let (mut app, _transport) = app_with(
        vec![one_document_listing()],
        SyntheticScreenSource::new(),
        1_000,
    );

    // Stopping without a session leaves no stop line behind.
    app.handle_event(UiEvent::LiveCaptureStopRequested);
    assert_eq!(stopped_lines(), 0);

    app.handle_event(UiEvent::DocumentSelectionToggled {
        id: "1".to_string(),
    });
    app.handle_event(UiEvent::LiveCaptureStartRequested);
    app.handle_event(UiEvent::LiveCaptureStopRequested);
    assert_eq!(stopped_lines(), 1);
}
