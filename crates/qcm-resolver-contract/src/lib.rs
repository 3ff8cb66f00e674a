#![warn(missing_docs)]
//! # qcm-resolver-contract
//!
//! ## Purpose
//! Defines the backend wire schema and client-side parsing helpers.
//!
//! ## Responsibilities
//! - Parse document-list, solve-result, and error-detail payloads.
//! - Enforce the contract invariants the rest of the client relies on.
//! - Tolerate extra server fields for forward compatibility.
//!
//! ## Data flow
//! Raw response bytes -> [`parse_document_list`] / [`parse_solve_result`] /
//! [`parse_error_detail`] -> typed values consumed by the API client and the
//! state store.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers.
//!
//! ## Error model
//! Invalid JSON or blank mandatory fields return [`ContractError`]. Error
//! detail extraction never fails; a missing or malformed detail yields `None`
//! and the caller falls back to a generic message.
//!
//! ## Security and privacy notes
//! This crate processes only document metadata and solver outputs; it does
//! not touch uploaded file bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One reference document known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Stable document identifier used for selection and deletion.
    pub id: String,
    /// Display name, normally the uploaded file name.
    pub name: String,
}

/// Parsed solver response for one submitted screenshot.
///
/// The server sends additional diagnostic fields (extraction options,
/// per-stage timings); they are ignored here because no client surface
/// renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    /// Question text recovered from the screenshot.
    pub extracted_question: String,
    /// Answer proposed by the solver.
    pub answer: String,
    /// Context passage(s) the answer was grounded on.
    pub retrieved_context: String,
}

/// Error body carried by non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable failure description.
    pub detail: String,
}

/// Parses raw JSON into the validated document list.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON.
/// Returns [`ContractError::InvalidContract`] when a document entry carries a
/// blank id; such an entry could never be selected or deleted.
pub fn parse_document_list(raw: &[u8]) -> Result<Vec<DocumentRef>, ContractError> {
    let parsed: Vec<DocumentRef> = serde_json::from_slice(raw).map_err(ContractError::Decode)?;

    for (index, document) in parsed.iter().enumerate() {
        if document.id.trim().is_empty() {
            return Err(ContractError::InvalidContract(format!(
                "document entry {index} has a blank id"
            )));
        }
    }

    Ok(parsed)
}

/// Parses raw JSON into a validated solve result.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON or missing mandatory
/// fields.
pub fn parse_solve_result(raw: &[u8]) -> Result<SolveResult, ContractError> {
    serde_json::from_slice(raw).map_err(ContractError::Decode)
}

/// Extracts the `detail` message from a non-2xx response body.
///
/// A body that is not JSON, lacks the field, or carries a blank detail yields
/// `None`; the caller substitutes its own generic message.
pub fn parse_error_detail(raw: &[u8]) -> Option<String> {
    let parsed: ErrorDetail = serde_json::from_slice(raw).ok()?;
    if parsed.detail.trim().is_empty() {
        return None;
    }
    Some(parsed.detail)
}

/// Wire contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("response contract violation: {0}")]
    InvalidContract(String),
}
