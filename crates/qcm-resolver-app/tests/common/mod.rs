//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use qcm_resolver_api::{ApiError, HttpRequest, HttpResponse, HttpTransport};
use qcm_resolver_app::{App, AppConfig};
use qcm_resolver_capture::SyntheticScreenSource;
use qcm_resolver_core::FrameSnapshot;

/// Replays a scripted response queue and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<Vec<HttpResponse>>,
}

impl ScriptedTransport {
    #[allow(dead_code)]
    pub fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        })
    }

    #[allow(dead_code)]
    pub fn push_response(&self, response: HttpResponse) {
        self.responses
            .lock()
            .expect("response lock should work")
            .push(response);
    }

    #[allow(dead_code)]
    pub fn recorded(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request lock should work")
            .clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());
        let mut responses = self.responses.lock().expect("response lock should work");
        if responses.is_empty() {
            return Err(ApiError::Transport(
                "scripted responses exhausted".to_string(),
            ));
        }
        Ok(responses.remove(0))
    }
}

/// 200 response with a JSON body.
#[allow(dead_code)]
pub fn ok_json(body: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.as_bytes().to_vec(),
    }
}

/// Response for one listed document `{id:"1",name:"a.pdf"}`.
#[allow(dead_code)]
pub fn one_document_listing() -> HttpResponse {
    ok_json(r#"[{"id":"1","name":"a.pdf"}]"#)
}

/// Canonical successful solve body.
#[allow(dead_code)]
pub fn solve_response() -> HttpResponse {
    ok_json(r#"{"extracted_question":"Q?","answer":"A","retrieved_context":"C"}"#)
}

/// Uniform RGBA frame fixture.
#[allow(dead_code)]
pub fn uniform_frame(size: u32, value: u8) -> FrameSnapshot {
    FrameSnapshot::new(size, size, vec![value; (size * size * 4) as usize])
        .expect("frame fixture should be valid")
}

/// Builds an app over a scripted transport and a synthetic screen.
///
/// The scripted responses start with the initial document-list load, so the
/// first queue entry should normally be a listing.
#[allow(dead_code)]
pub fn app_with(
    responses: Vec<HttpResponse>,
    source: SyntheticScreenSource,
    capture_interval_ms: u64,
) -> (App, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new(responses);
    let config = AppConfig {
        api_base: "http://127.0.0.1:8000".to_string(),
        capture_interval_ms,
    };
    let mut app = App::new(&config, transport.clone(), Arc::new(source))
        .expect("app fixture should build");
    app.init();
    (app, transport)
}
