#![warn(missing_docs)]
//! # qcm-resolver-api
//!
//! ## Purpose
//! Implements the typed client for the four backend operations: list,
//! upload, delete, and solve.
//!
//! ## Responsibilities
//! - Validate the configured base URL once at construction.
//! - Encode multipart request bodies deterministically.
//! - Execute requests through an injectable transport abstraction.
//! - Map non-2xx responses to server errors carrying the backend detail.
//!
//! ## Data flow
//! App flows call [`ApiClient`] operations -> requests are built as owned
//! byte bodies -> [`HttpTransport`] executes them -> response bytes are
//! parsed through `qcm-resolver-contract` into typed values.
//!
//! ## Ownership and lifetimes
//! Requests and responses carry owned byte buffers so transports never
//! borrow from client internals across the call boundary.
//!
//! ## Error model
//! Invalid configuration, transport failures, server rejections, and decode
//! failures are surfaced as [`ApiError`]. No operation retries on its own;
//! every retry is a new user-initiated call.
//!
//! ## Security and privacy notes
//! Uploaded file bytes pass through this crate but are never logged or
//! persisted. The base URL may be plain HTTP for local backends.

use std::sync::Arc;

use qcm_resolver_contract::{
    parse_document_list, parse_error_detail, parse_solve_result, ContractError, DocumentRef,
    SolveResult,
};
use qcm_resolver_core::CapturedFile;
use rand::distr::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use url::Url;

/// Path of the document list operation.
pub const DOCUMENTS_PATH: &str = "/api/documents";

/// Path of the document upload operation.
pub const PROCESS_DOCUMENT_PATH: &str = "/api/process-document";

/// Path of the solve operation.
pub const SOLVE_QCM_PATH: &str = "/api/solve-qcm";

/// HTTP method of a prepared request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// DELETE request.
    Delete,
}

impl HttpMethod {
    /// Returns the wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// One fully prepared request handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Encoded request body; empty for bodiless requests.
    pub body: Vec<u8>,
}

/// Raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract transport executing prepared requests.
pub trait HttpTransport: Send + Sync {
    /// Executes one request and returns the raw response.
    ///
    /// # Errors
    /// Returns [`ApiError::Transport`] when the request cannot be delivered.
    /// Non-2xx statuses are not transport errors; they come back as regular
    /// responses for the client to classify.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Deterministic `multipart/form-data` body builder.
///
/// Part order follows insertion order, so tests can assert exact bytes by
/// injecting a fixed boundary through [`MultipartBody::with_boundary`].
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    /// Creates a builder with a random boundary.
    pub fn new() -> Self {
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        Self::with_boundary(format!("qcm-resolver-{suffix}"))
    }

    /// Creates a builder with a caller-chosen boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            bytes: Vec::new(),
        }
    }

    /// Appends a plain text field.
    pub fn add_text(&mut self, name: &str, value: &str) {
        self.open_part();
        self.bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.extend_from_slice(b"\r\n");
    }

    /// Appends a file field with filename and content type.
    pub fn add_file(&mut self, name: &str, file_name: &str, mime: &str, bytes: &[u8]) {
        self.open_part();
        self.bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(bytes);
        self.bytes.extend_from_slice(b"\r\n");
    }

    /// Returns the `Content-Type` header value for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Closes the body and returns the encoded bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.bytes
    }

    fn open_part(&mut self) {
        self.bytes
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed client for the QCM resolver backend.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Creates a validated client.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidBaseUrl`] when `base_url` does not parse or
    /// uses a scheme other than `http`/`https`.
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let base = Url::parse(&base_url)
            .map_err(|error| ApiError::InvalidBaseUrl(format!("invalid base url: {error}")))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ApiError::InvalidBaseUrl(format!(
                "unsupported scheme '{}': expected http or https",
                base.scheme()
            )));
        }

        Ok(Self {
            base,
            transport,
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Lists the reference documents known to the backend.
    ///
    /// # Errors
    /// Returns [`ApiError::Server`] for non-2xx responses and
    /// [`ApiError::Decode`] for malformed bodies.
    pub fn list_documents(&self) -> Result<Vec<DocumentRef>, ApiError> {
        let response = self.transport.execute(&HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(DOCUMENTS_PATH)?,
            headers: Vec::new(),
            body: Vec::new(),
        })?;
        let body = self.expect_success(response)?;
        Ok(parse_document_list(&body)?)
    }

    /// Uploads one reference document for ingestion.
    ///
    /// # Errors
    /// Returns [`ApiError::Server`] for non-2xx responses.
    pub fn upload_document(&self, file_name: &str, bytes: &[u8]) -> Result<(), ApiError> {
        let mut multipart = MultipartBody::new();
        multipart.add_file("file", file_name, qcm_resolver_core::PDF_MIME, bytes);

        let content_type = multipart.content_type();
        let response = self.transport.execute(&HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(PROCESS_DOCUMENT_PATH)?,
            headers: vec![("Content-Type".to_string(), content_type)],
            body: multipart.finish(),
        })?;
        self.expect_success(response)?;
        Ok(())
    }

    /// Deletes one reference document by id.
    ///
    /// # Errors
    /// Returns [`ApiError::Server`] for non-2xx responses.
    pub fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        let mut url = self.endpoint_url(DOCUMENTS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl("base url cannot carry paths".to_string()))?
            .push(id);

        let response = self.transport.execute(&HttpRequest {
            method: HttpMethod::Delete,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        })?;
        self.expect_success(response)?;
        Ok(())
    }

    /// Submits one question screenshot together with the selected context
    /// document ids.
    ///
    /// The `context_ids` field carries the ids as one JSON-encoded array
    /// string, exactly as the backend expects.
    ///
    /// # Errors
    /// Returns [`ApiError::Server`] for non-2xx responses and
    /// [`ApiError::Decode`] for malformed solve bodies.
    pub fn solve_qcm(
        &self,
        file: &CapturedFile,
        context_ids: &[String],
    ) -> Result<SolveResult, ApiError> {
        let ids_json = serde_json::to_string(context_ids)
            .map_err(|error| ApiError::Transport(format!("context id encoding failed: {error}")))?;

        let mut multipart = MultipartBody::new();
        multipart.add_file("file", &file.name, &file.mime, &file.bytes);
        multipart.add_text("context_ids", &ids_json);

        let content_type = multipart.content_type();
        let response = self.transport.execute(&HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(SOLVE_QCM_PATH)?,
            headers: vec![("Content-Type".to_string(), content_type)],
            body: multipart.finish(),
        })?;
        let body = self.expect_success(response)?;
        Ok(parse_solve_result(&body)?)
    }

    fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        self.endpoint_url(path).map(Url::into)
    }

    // Appends the operation path to the base segment by segment, so a base
    // carrying a path prefix (e.g. behind a reverse proxy) keeps it.
    fn endpoint_url(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl("base url cannot carry paths".to_string()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    fn expect_success(&self, response: HttpResponse) -> Result<Vec<u8>, ApiError> {
        if response.is_success() {
            return Ok(response.body);
        }

        Err(ApiError::Server {
            status: response.status,
            detail: parse_error_detail(&response.body),
        })
    }
}

/// Real blocking transport over `reqwest`.
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Creates a transport with default client settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|error| ApiError::Transport(error.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            body,
        })
    }
}

/// API client error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL failed validation.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    /// Request could not be delivered.
    #[error("api transport failure: {0}")]
    Transport(String),
    /// Backend rejected the request with a non-2xx status.
    #[error("server rejected request with status {status}")]
    Server {
        /// HTTP status code of the rejection.
        status: u16,
        /// Backend `detail` message, when present and non-blank.
        detail: Option<String>,
    },
    /// Response body violated the wire contract.
    #[error(transparent)]
    Decode(#[from] ContractError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for client construction and URL building.

    use super::*;

    struct UnreachableTransport;

    impl HttpTransport for UnreachableTransport {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            panic!("transport must not be used in these tests");
        }
    }

    #[test]
    fn accepts_http_and_https_base_urls() {
        assert!(ApiClient::new("http://127.0.0.1:8000", Arc::new(UnreachableTransport)).is_ok());
        assert!(ApiClient::new("https://qcm.example.test", Arc::new(UnreachableTransport)).is_ok());
    }

    #[test]
    fn rejects_malformed_and_non_http_base_urls() {
        assert!(matches!(
            ApiClient::new("not a url", Arc::new(UnreachableTransport)),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("ftp://qcm.example.test", Arc::new(UnreachableTransport)),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn success_statuses_cover_the_whole_2xx_range() {
        let ok = HttpResponse {
            status: 204,
            body: Vec::new(),
        };
        assert!(ok.is_success());

        let rejected = HttpResponse {
            status: 422,
            body: Vec::new(),
        };
        assert!(!rejected.is_success());
    }
}
