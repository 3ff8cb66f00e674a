#![warn(missing_docs)]
//! # qcm-resolver-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `qcm-resolver` workspace.
//!
//! ## Responsibilities
//! - Represent rasterized frame snapshots sampled from a live screen source.
//! - Represent encoded image artifacts ready for upload.
//! - Encode snapshots to PNG artifacts.
//! - Enforce the file-name policies accepted by the backend.
//!
//! ## Data flow
//! Capture and crop code emit [`FrameSnapshot`] values, which are encoded
//! into [`CapturedFile`] artifacts and handed to the API client for upload.
//!
//! ## Ownership and lifetimes
//! Snapshots and artifacts own their backing buffers (`Vec<u8>`) so no pixel
//! memory is borrowed across pipeline stages or worker threads.
//!
//! ## Error model
//! Validation failures (shape mismatch, geometry overflow, empty file name)
//! and PNG encoding failures return [`CoreError`] variants.
//!
//! ## Security and privacy notes
//! Snapshots can contain anything visible on the user's screen. This crate
//! never logs pixel bytes and never writes them to disk; artifacts live in
//! memory until the caller uploads or discards them.
//!
//! ## Example
//! ```rust
//! use qcm_resolver_core::{encode_png, FrameSnapshot, LIVE_CAPTURE_FILE_NAME};
//!
//! let snapshot = FrameSnapshot::new(2, 2, vec![0; 16]).unwrap();
//! let artifact = encode_png(&snapshot, LIVE_CAPTURE_FILE_NAME).unwrap();
//! assert_eq!(artifact.name, "capture.png");
//! assert_eq!(artifact.mime, "image/png");
//! ```

use thiserror::Error;

/// File name given to stills grabbed during a live capture session.
pub const LIVE_CAPTURE_FILE_NAME: &str = "capture.png";

/// File name given to manually cropped screenshots.
pub const CROP_FILE_NAME: &str = "screenshot.png";

/// MIME type of PNG artifacts.
pub const PNG_MIME: &str = "image/png";

/// MIME type of reference documents.
pub const PDF_MIME: &str = "application/pdf";

/// One rasterized still sampled from a live source.
///
/// Snapshots are ephemeral: they are held only long enough to compare against
/// the next snapshot or to crop a region from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw RGBA pixel buffer (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
}

impl FrameSnapshot {
    /// Constructs a validated snapshot.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFrameShape`] when the pixel buffer length
    /// is not exactly `width * height * 4`, and
    /// [`CoreError::GeometryOverflow`] when the dimensions do not fit in
    /// addressable memory.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CoreError> {
        let expected_len = required_rgba_len(width, height)?;
        if rgba.len() != expected_len {
            return Err(CoreError::InvalidFrameShape {
                expected: expected_len,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Returns the number of pixels in the snapshot.
    pub fn pixel_count(&self) -> usize {
        // Validated at construction; cannot overflow here.
        (self.width as usize) * (self.height as usize)
    }
}

/// An encoded image file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFile {
    /// File name presented to the backend (multipart filename).
    pub name: String,
    /// MIME type of `bytes`.
    pub mime: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl CapturedFile {
    /// Constructs a validated artifact.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyFileName`] when `name` is blank.
    pub fn new(
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::EmptyFileName);
        }

        Ok(Self {
            name,
            mime: mime.into(),
            bytes,
        })
    }
}

/// Encodes a snapshot into a PNG artifact with the given file name.
///
/// # Errors
/// Returns [`CoreError::EmptyFileName`] when `file_name` is blank and
/// [`CoreError::PngEncode`] when PNG encoding fails.
pub fn encode_png(snapshot: &FrameSnapshot, file_name: &str) -> Result<CapturedFile, CoreError> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
    image::ImageEncoder::write_image(
        encoder,
        &snapshot.rgba,
        snapshot.width,
        snapshot.height,
        image::ExtendedColorType::Rgba8,
    )?;

    CapturedFile::new(file_name, PNG_MIME, bytes)
}

/// Returns `true` when `file_name` carries a reference-document extension.
///
/// # Semantics
/// Matches the backend's upload policy: the extension check is
/// case-insensitive and a name without an extension is rejected.
pub fn has_pdf_extension(file_name: &str) -> bool {
    matches!(extension_of(file_name), Some(ext) if ext == "pdf")
}

/// Returns `true` when `file_name` carries an accepted image extension.
pub fn has_image_extension(file_name: &str) -> bool {
    image_mime_for_file_name(file_name).is_some()
}

/// Maps an accepted image file name to its MIME type.
pub fn image_mime_for_file_name(file_name: &str) -> Option<&'static str> {
    match extension_of(file_name)?.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (stem, extension) = trimmed.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

/// Error type for data-model validation and encoding failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Frame buffer shape does not match declared geometry.
    #[error("invalid frame shape: expected {expected} bytes, got {actual}")]
    InvalidFrameShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Frame dimensions do not fit in addressable memory.
    #[error("frame geometry overflow: {0}")]
    GeometryOverflow(String),
    /// Captured files must carry a non-empty name.
    #[error("captured file name is empty")]
    EmptyFileName,
    /// PNG encoding failed.
    #[error("png encoding failure: {0}")]
    PngEncode(#[from] image::ImageError),
}

fn required_rgba_len(width: u32, height: u32) -> Result<usize, CoreError> {
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| CoreError::GeometryOverflow("frame dimensions overflow".to_string()))?;

    pixels
        .checked_mul(4)
        .ok_or_else(|| CoreError::GeometryOverflow("rgba length overflow".to_string()))
}
