#![warn(missing_docs)]
//! # qcm-resolver-crop
//!
//! ## Purpose
//! Lets the user cut a question region out of a captured still through a
//! drag-selection overlay.
//!
//! ## Responsibilities
//! - Track the drag-selection rectangle from pointer events.
//! - Rasterize the dimming overlay shown on top of the displayed still.
//! - Validate the minimum selection size and extract the selected region at
//!   native resolution as a PNG artifact.
//!
//! ## Data flow
//! A still acquired by the capture layer enters a [`CropSession`] together
//! with the size at which the shell displays it. Pointer events update the
//! selection; [`CropSession::confirm`] emits a `screenshot.png` artifact for
//! the submission flow.
//!
//! ## Ownership and lifetimes
//! The session owns the native still for its whole lifetime. Dropping the
//! session (or calling [`CropSession::cancel`]) discards still and selection;
//! a successful confirm hands an independent artifact to the caller.
//!
//! ## Error model
//! Construction rejects degenerate geometry; confirmation rejects selections
//! under the minimum size with [`CropError::SelectionTooSmall`], after which
//! the session remains usable so the user can retry.
//!
//! ## Security and privacy notes
//! Only the confirmed sub-region leaves this crate; the full still never
//! does.

use qcm_resolver_core::{encode_png, CapturedFile, CoreError, FrameSnapshot, CROP_FILE_NAME};
use thiserror::Error;

/// Minimum selection width and height, in display pixels.
pub const MIN_SELECTION_DISPLAY_PX: f32 = 10.0;

/// Overlay dim color (50 % black).
const DIM_RGBA: [u8; 4] = [0, 0, 0, 128];

/// Overlay border color.
const BORDER_RGBA: [u8; 4] = [255, 0, 0, 255];

/// Border thickness in display pixels.
const BORDER_THICKNESS: u32 = 2;

/// Pointer gesture phase.
///
/// Mouse and touch input both map onto this one event type; the crate makes
/// no distinction between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Button or finger down: a new selection starts here.
    Down,
    /// Drag to the opposite corner of the selection.
    Move,
    /// Button or finger up: the drag ends, the selection stays.
    Up,
}

/// One pointer event in displayed-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Gesture phase.
    pub kind: PointerKind,
    /// Horizontal position, display pixels.
    pub x: f32,
    /// Vertical position, display pixels.
    pub y: f32,
}

/// Normalized selection rectangle in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width (non-negative).
    pub width: f32,
    /// Height (non-negative).
    pub height: f32,
}

/// Rasterized overlay shown on top of the displayed still.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayImage {
    /// Overlay width, display pixels.
    pub width: u32,
    /// Overlay height, display pixels.
    pub height: u32,
    /// RGBA bytes; fully transparent until a selection exists.
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct RawSelection {
    start_x: f32,
    start_y: f32,
    end_x: f32,
    end_y: f32,
}

/// Interactive crop over one captured still.
#[derive(Debug)]
pub struct CropSession {
    frame: FrameSnapshot,
    displayed_width: u32,
    displayed_height: u32,
    dragging: bool,
    selection: Option<RawSelection>,
}

impl CropSession {
    /// Starts a crop session over `frame`, displayed at the given size.
    ///
    /// # Errors
    /// Returns [`CropError::EmptyFrame`] when the still has no pixels and
    /// [`CropError::InvalidDisplayGeometry`] when either displayed dimension
    /// is zero.
    pub fn new(
        frame: FrameSnapshot,
        displayed_width: u32,
        displayed_height: u32,
    ) -> Result<Self, CropError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(CropError::EmptyFrame);
        }
        if displayed_width == 0 || displayed_height == 0 {
            return Err(CropError::InvalidDisplayGeometry {
                width: displayed_width,
                height: displayed_height,
            });
        }

        Ok(Self {
            frame,
            displayed_width,
            displayed_height,
            dragging: false,
            selection: None,
        })
    }

    /// Applies one pointer event to the selection state machine.
    ///
    /// # Semantics
    /// - `Down` begins a fresh selection at the pointer position.
    /// - `Move` while dragging relocates the opposite corner; moves without a
    ///   preceding `Down` are ignored.
    /// - `Up` ends the drag and keeps the selection.
    ///
    /// Coordinates are clamped to the displayed image bounds.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let x = event.x.clamp(0.0, self.displayed_width as f32);
        let y = event.y.clamp(0.0, self.displayed_height as f32);

        match event.kind {
            PointerKind::Down => {
                self.dragging = true;
                self.selection = Some(RawSelection {
                    start_x: x,
                    start_y: y,
                    end_x: x,
                    end_y: y,
                });
            }
            PointerKind::Move => {
                if !self.dragging {
                    return;
                }
                if let Some(selection) = &mut self.selection {
                    selection.end_x = x;
                    selection.end_y = y;
                }
            }
            PointerKind::Up => {
                self.dragging = false;
            }
        }
    }

    /// Returns the normalized selection, regardless of drag direction.
    pub fn selection(&self) -> Option<SelectionRect> {
        self.selection.map(|raw| SelectionRect {
            x: raw.start_x.min(raw.end_x),
            y: raw.start_y.min(raw.end_y),
            width: (raw.end_x - raw.start_x).abs(),
            height: (raw.end_y - raw.start_y).abs(),
        })
    }

    /// Rasterizes the overlay at displayed size: a 50 % black dim with a
    /// clear window over the selection and a 2-pixel border just inside it.
    ///
    /// Without a selection the overlay is fully transparent.
    pub fn overlay(&self) -> OverlayImage {
        let width = self.displayed_width;
        let height = self.displayed_height;
        let mut rgba = vec![0u8; (width as usize) * (height as usize) * 4];

        let Some(selection) = self.selection() else {
            return OverlayImage {
                width,
                height,
                rgba,
            };
        };

        for pixel in rgba.chunks_exact_mut(4) {
            pixel.copy_from_slice(&DIM_RGBA);
        }

        let window = display_rect_to_px(selection, width, height);
        if window.width == 0 || window.height == 0 {
            return OverlayImage {
                width,
                height,
                rgba,
            };
        }

        // Clear the selection window row by row.
        for row in window.y..window.y + window.height {
            let offset = ((row as usize) * (width as usize) + window.x as usize) * 4;
            let row_len = (window.width as usize) * 4;
            rgba[offset..offset + row_len].fill(0);
        }

        paint_border(&mut rgba, width, window);

        OverlayImage {
            width,
            height,
            rgba,
        }
    }

    /// Extracts the selected region at native resolution as a
    /// `screenshot.png` artifact.
    ///
    /// The selection is rescaled per axis by `native / displayed`, rounded to
    /// the nearest pixel, and clamped to the still's bounds. On success the
    /// caller is expected to drop the session; on
    /// [`CropError::SelectionTooSmall`] the session stays usable so the user
    /// can drag a larger selection and retry.
    ///
    /// # Errors
    /// Returns [`CropError::SelectionTooSmall`] when the selection is
    /// narrower or shorter than [`MIN_SELECTION_DISPLAY_PX`] display pixels
    /// (or when nothing was selected), and [`CropError::Artifact`] when PNG
    /// encoding fails.
    pub fn confirm(&self) -> Result<CapturedFile, CropError> {
        let selection = self.selection().ok_or(CropError::SelectionTooSmall)?;
        if selection.width < MIN_SELECTION_DISPLAY_PX
            || selection.height < MIN_SELECTION_DISPLAY_PX
        {
            return Err(CropError::SelectionTooSmall);
        }

        let scale_x = self.frame.width as f32 / self.displayed_width as f32;
        let scale_y = self.frame.height as f32 / self.displayed_height as f32;

        let x = ((selection.x * scale_x).round() as u32).min(self.frame.width - 1);
        let y = ((selection.y * scale_y).round() as u32).min(self.frame.height - 1);
        let width = ((selection.width * scale_x).round() as u32)
            .max(1)
            .min(self.frame.width - x);
        let height = ((selection.height * scale_y).round() as u32)
            .max(1)
            .min(self.frame.height - y);

        let mut region = vec![0u8; (width as usize) * (height as usize) * 4];
        let row_len = (width as usize) * 4;
        for row in 0..height as usize {
            let src_row = y as usize + row;
            let src_offset = (src_row * (self.frame.width as usize) + x as usize) * 4;
            let dst_offset = row * row_len;
            region[dst_offset..dst_offset + row_len]
                .copy_from_slice(&self.frame.rgba[src_offset..src_offset + row_len]);
        }

        let snapshot = FrameSnapshot::new(width, height, region)?;
        Ok(encode_png(&snapshot, CROP_FILE_NAME)?)
    }

    /// Discards the selection and the underlying still.
    pub fn cancel(self) {}

    /// Returns `true` while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

#[derive(Debug, Clone, Copy)]
struct PxRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

fn display_rect_to_px(rect: SelectionRect, max_width: u32, max_height: u32) -> PxRect {
    let x = (rect.x.round() as u32).min(max_width);
    let y = (rect.y.round() as u32).min(max_height);
    let width = (rect.width.round() as u32).min(max_width - x);
    let height = (rect.height.round() as u32).min(max_height - y);
    PxRect {
        x,
        y,
        width,
        height,
    }
}

fn paint_border(rgba: &mut [u8], image_width: u32, window: PxRect) {
    let thickness = BORDER_THICKNESS.min(window.width).min(window.height);

    let mut paint_row_span = |row: u32, from: u32, to: u32| {
        let offset = ((row as usize) * (image_width as usize) + from as usize) * 4;
        let span_len = ((to - from) as usize) * 4;
        for pixel in rgba[offset..offset + span_len].chunks_exact_mut(4) {
            pixel.copy_from_slice(&BORDER_RGBA);
        }
    };

    for row in window.y..window.y + window.height {
        let from_top = row - window.y;
        let from_bottom = window.y + window.height - 1 - row;
        if from_top < thickness || from_bottom < thickness {
            // Top and bottom bands run the full window width.
            paint_row_span(row, window.x, window.x + window.width);
        } else {
            // Side bands.
            paint_row_span(row, window.x, window.x + thickness);
            paint_row_span(row, window.x + window.width - thickness, window.x + window.width);
        }
    }
}

/// Crop layer error type.
#[derive(Debug, Error)]
pub enum CropError {
    /// The still has no pixels to crop.
    #[error("captured still is empty")]
    EmptyFrame,
    /// Displayed dimensions must both be positive.
    #[error("invalid display geometry: {width}x{height}")]
    InvalidDisplayGeometry {
        /// Displayed width.
        width: u32,
        /// Displayed height.
        height: u32,
    },
    /// Selection is below the minimum confirmable size.
    #[error("selection is too small")]
    SelectionTooSmall,
    /// Artifact construction failed.
    #[error(transparent)]
    Artifact(#[from] CoreError),
}
