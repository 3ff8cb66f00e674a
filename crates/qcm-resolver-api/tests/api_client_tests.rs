//! Integration tests for the typed API client over a mock transport.

use std::sync::{Arc, Mutex};

use qcm_resolver_api::{ApiClient, ApiError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use qcm_resolver_core::CapturedFile;

/// Records every executed request and replays a scripted response queue.
#[derive(Default)]
struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<Vec<HttpResponse>>,
}

impl ScriptedTransport {
    fn respond_with(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        })
    }

    fn recorded(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request lock should work").clone()
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
            return Err(ApiError::Transport("scripted responses exhausted".to_string()));
        }
        Ok(responses.remove(0))
    }
}

fn ok_json(body: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.as_bytes().to_vec(),
    }
}

#[test]
fn api_client_tests_list_documents_gets_the_documents_path() {
    let transport = ScriptedTransport::respond_with(vec![ok_json(
        r#"[{"id":"1","name":"a.pdf"},{"id":"2","name":"b.pdf"}]"#,
    )]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    let documents = client.list_documents().expect("list should succeed");
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id, "1");

    let requests = transport.recorded();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].url, "http://127.0.0.1:8000/api/documents");
    assert!(requests[0].body.is_empty());
}

#[test]
fn api_client_tests_base_url_path_prefix_is_preserved() {
    let transport = ScriptedTransport::respond_with(vec![
        ok_json("[]"),
        HttpResponse {
            status: 204,
            body: Vec::new(),
        },
    ]);
    let client = ApiClient::new("http://127.0.0.1:8000/qcm", transport.clone())
        .expect("client should build");

    client.list_documents().expect("list should succeed");
    client.delete_document("doc-7").expect("delete should succeed");

    let requests = transport.recorded();
    assert_eq!(requests[0].url, "http://127.0.0.1:8000/qcm/api/documents");
    assert_eq!(
        requests[1].url,
        "http://127.0.0.1:8000/qcm/api/documents/doc-7"
    );
}

#[test]
fn api_client_tests_trailing_slash_on_the_base_adds_no_empty_segment() {
    let transport = ScriptedTransport::respond_with(vec![ok_json("[]")]);
    let client = ApiClient::new("http://127.0.0.1:8000/", transport.clone())
        .expect("client should build");

    client.list_documents().expect("list should succeed");

    let requests = transport.recorded();
    assert_eq!(requests[0].url, "http://127.0.0.1:8000/api/documents");
}

#[test]
fn api_client_tests_upload_posts_multipart_with_file_field() {
    let transport = ScriptedTransport::respond_with(vec![ok_json(r#"{"status":"ok"}"#)]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    client
        .upload_document("course.pdf", b"%PDF-1.7")
        .expect("upload should succeed");

    let requests = transport.recorded();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, "http://127.0.0.1:8000/api/process-document");

    let content_type = &requests[0]
        .headers
        .iter()
        .find(|(name, _)| name == "Content-Type")
        .expect("content type should be set")
        .1;
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\"; filename=\"course.pdf\""));
    assert!(body.contains("Content-Type: application/pdf"));
    assert!(body.contains("%PDF-1.7"));
}

#[test]
fn api_client_tests_delete_targets_the_document_id_segment() {
    let transport = ScriptedTransport::respond_with(vec![HttpResponse {
        status: 204,
        body: Vec::new(),
    }]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    client.delete_document("doc-7").expect("delete should succeed");

    let requests = transport.recorded();
    assert_eq!(requests[0].method, HttpMethod::Delete);
    assert_eq!(requests[0].url, "http://127.0.0.1:8000/api/documents/doc-7");
}

#[test]
fn api_client_tests_delete_percent_encodes_unsafe_ids() {
    let transport = ScriptedTransport::respond_with(vec![HttpResponse {
        status: 200,
        body: Vec::new(),
    }]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    client
        .delete_document("weird id/1")
        .expect("delete should succeed");

    let requests = transport.recorded();
    assert_eq!(
        requests[0].url,
        "http://127.0.0.1:8000/api/documents/weird%20id%2F1"
    );
}

#[test]
fn api_client_tests_solve_sends_file_and_json_encoded_context_ids() {
    let transport = ScriptedTransport::respond_with(vec![ok_json(
        r#"{"extracted_question":"Q?","answer":"A","retrieved_context":"C"}"#,
    )]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    let file = CapturedFile::new("capture.png", "image/png", b"PNG".to_vec())
        .expect("artifact should build");
    let result = client
        .solve_qcm(&file, &["1".to_string(), "2".to_string()])
        .expect("solve should succeed");
    assert_eq!(result.answer, "A");

    let requests = transport.recorded();
    assert_eq!(requests[0].url, "http://127.0.0.1:8000/api/solve-qcm");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\"; filename=\"capture.png\""));
    assert!(body.contains("name=\"context_ids\""));
    assert!(body.contains(r#"["1","2"]"#));
}

#[test]
fn api_client_tests_non_2xx_carries_the_server_detail() {
    let transport = ScriptedTransport::respond_with(vec![HttpResponse {
        status: 422,
        body: br#"{"detail":"PDF file type not allowed."}"#.to_vec(),
    }]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    let error = client
        .upload_document("notes.txt", b"plain")
        .expect_err("upload should be rejected");
    match error {
        ApiError::Server {
            status,
            detail,
        } => {
            assert_eq!(status, 422);
            assert_eq!(detail.as_deref(), Some("PDF file type not allowed."));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn api_client_tests_missing_detail_falls_back_to_none() {
    let transport = ScriptedTransport::respond_with(vec![HttpResponse {
        status: 502,
        body: b"<html>Bad Gateway</html>".to_vec(),
    }]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    let error = client.list_documents().expect_err("list should fail");
    assert!(matches!(
        error,
        ApiError::Server {
            status: 502,
            detail: None
        }
    ));
}

#[test]
fn api_client_tests_failures_are_never_retried() {
    let transport = ScriptedTransport::respond_with(vec![HttpResponse {
        status: 500,
        body: Vec::new(),
    }]);
    let client =
        ApiClient::new("http://127.0.0.1:8000", transport.clone()).expect("client should build");

    let _ = client.list_documents().expect_err("list should fail");
    assert_eq!(transport.recorded().len(), 1, "exactly one attempt per call");
}
