#![warn(missing_docs)]
//! # qcm-resolver-detect
//!
//! ## Purpose
//! Detects visually significant changes between consecutive frame snapshots
//! of a live capture session.
//!
//! ## Responsibilities
//! - Compare consecutive snapshots pixel by pixel.
//! - Signal a change when enough pixels moved beyond the channel tolerance.
//! - Gate further signals behind an acknowledgment latch so one on-screen
//!   change produces exactly one submission.
//!
//! ## Data flow
//! The capture session feeds every sampled snapshot into
//! [`FrameChangeDetector::observe`]; a [`Verdict::Changed`] result tells the
//! session to hand the latest capture to the consumer, which acknowledges
//! with [`FrameChangeDetector::reset`] once its processing attempt finished.
//!
//! ## Ownership and lifetimes
//! The detector owns the previously observed snapshot; callers hand
//! snapshots over by value and never share pixel buffers with it.
//!
//! ## Error model
//! Observation is total. Only configuration construction can fail, with
//! [`DetectError`].
//!
//! ## Security and privacy notes
//! Pixel contents are compared, never logged or persisted.
//!
//! ## Example
//! ```rust
//! use qcm_resolver_core::FrameSnapshot;
//! use qcm_resolver_detect::{DetectorConfig, FrameChangeDetector, Verdict};
//!
//! let mut detector = FrameChangeDetector::new(DetectorConfig::default());
//! let first = FrameSnapshot::new(2, 2, vec![0; 16]).unwrap();
//! assert_eq!(detector.observe(first), Verdict::Changed);
//! ```

use qcm_resolver_core::FrameSnapshot;
use thiserror::Error;

/// Per-channel delta a pixel must exceed to count as different.
pub const DEFAULT_CHANNEL_TOLERANCE: u8 = 10;

/// Share of differing pixels, in permille, a frame must exceed to signal.
pub const DEFAULT_CHANGE_PERMILLE: u16 = 20;

/// Detector thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// A pixel counts as different when any of its R/G/B channels differs by
    /// strictly more than this value. Alpha is ignored.
    pub channel_tolerance: u8,
    /// A frame signals a change when strictly more than this permille of its
    /// pixels count as different.
    pub change_permille: u16,
}

impl DetectorConfig {
    /// Creates validated detector thresholds.
    ///
    /// # Errors
    /// Returns [`DetectError::InvalidChangeRatio`] when `change_permille`
    /// exceeds 1000.
    pub fn new(channel_tolerance: u8, change_permille: u16) -> Result<Self, DetectError> {
        if change_permille > 1_000 {
            return Err(DetectError::InvalidChangeRatio(change_permille));
        }

        Ok(Self {
            channel_tolerance,
            change_permille,
        })
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            channel_tolerance: DEFAULT_CHANNEL_TOLERANCE,
            change_permille: DEFAULT_CHANGE_PERMILLE,
        }
    }
}

/// Outcome of observing one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A significant change was detected; the consumer should act.
    Changed,
    /// Nothing to act on.
    Quiet,
}

/// Stateful change detector for one capture session.
#[derive(Debug)]
pub struct FrameChangeDetector {
    config: DetectorConfig,
    previous: Option<FrameSnapshot>,
    pending: bool,
}

impl FrameChangeDetector {
    /// Creates a detector with no observed frame.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            previous: None,
            pending: false,
        }
    }

    /// Observes the next sampled snapshot and reports whether it constitutes
    /// a significant change.
    ///
    /// # Semantics
    /// - The first snapshot after construction or [`clear`](Self::clear)
    ///   always signals [`Verdict::Changed`].
    /// - While a change is pending acknowledgment, no comparison happens and
    ///   the verdict is [`Verdict::Quiet`].
    /// - A snapshot whose dimensions differ from the previous one is quiet.
    /// - Otherwise the snapshot signals when strictly more than the
    ///   configured permille of pixels moved beyond the channel tolerance.
    ///
    /// In every case the observed snapshot becomes the comparison baseline
    /// for the next call, so after an acknowledgment the detector compares
    /// against the latest screen content rather than the frame that
    /// triggered the signal.
    pub fn observe(&mut self, snapshot: FrameSnapshot) -> Verdict {
        let verdict = self.classify(&snapshot);
        self.previous = Some(snapshot);
        verdict
    }

    /// Acknowledges the pending change and re-arms the detector.
    pub fn reset(&mut self) {
        self.pending = false;
    }

    /// Drops all session state: the comparison baseline and the latch.
    pub fn clear(&mut self) {
        self.previous = None;
        self.pending = false;
    }

    /// Returns `true` while a signaled change awaits acknowledgment.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    fn classify(&mut self, current: &FrameSnapshot) -> Verdict {
        if self.pending {
            return Verdict::Quiet;
        }

        let Some(previous) = &self.previous else {
            // Cold start: the first visible content is itself the change.
            self.pending = true;
            return Verdict::Changed;
        };

        if previous.width != current.width || previous.height != current.height {
            return Verdict::Quiet;
        }

        if exceeds_threshold(self.config, previous, current) {
            self.pending = true;
            return Verdict::Changed;
        }

        Verdict::Quiet
    }
}

fn exceeds_threshold(
    config: DetectorConfig,
    previous: &FrameSnapshot,
    current: &FrameSnapshot,
) -> bool {
    let tolerance = config.channel_tolerance;
    let mut diff_pixels: u64 = 0;

    for (before, after) in previous
        .rgba
        .chunks_exact(4)
        .zip(current.rgba.chunks_exact(4))
    {
        // R/G/B only; alpha deltas never mark a pixel as different.
        if before[0].abs_diff(after[0]) > tolerance
            || before[1].abs_diff(after[1]) > tolerance
            || before[2].abs_diff(after[2]) > tolerance
        {
            diff_pixels += 1;
        }
    }

    let total_pixels = current.pixel_count() as u64;
    diff_pixels * 1_000 > total_pixels * u64::from(config.change_permille)
}

/// Detector configuration error type.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Change ratio cannot exceed the whole frame.
    #[error("invalid change ratio: {0} permille exceeds 1000")]
    InvalidChangeRatio(u16),
}

#[cfg(test)]
mod tests {
    //! Unit tests for detector configuration and latch state.

    use super::*;

    #[test]
    fn config_rejects_ratio_above_whole_frame() {
        assert!(matches!(
            DetectorConfig::new(10, 1_001),
            Err(DetectError::InvalidChangeRatio(1_001))
        ));
    }

    #[test]
    fn config_defaults_match_documented_constants() {
        let config = DetectorConfig::default();
        assert_eq!(config.channel_tolerance, DEFAULT_CHANNEL_TOLERANCE);
        assert_eq!(config.change_permille, DEFAULT_CHANGE_PERMILLE);
    }

    #[test]
    fn first_snapshot_signals_and_latches() {
        let mut detector = FrameChangeDetector::new(DetectorConfig::default());
        let frame = FrameSnapshot::new(1, 1, vec![0, 0, 0, 255]).expect("valid frame");
        assert_eq!(detector.observe(frame), Verdict::Changed);
        assert!(detector.is_pending());
    }

    #[test]
    fn clear_restores_cold_start_behavior() {
        let mut detector = FrameChangeDetector::new(DetectorConfig::default());
        let frame = FrameSnapshot::new(1, 1, vec![0, 0, 0, 255]).expect("valid frame");
        assert_eq!(detector.observe(frame.clone()), Verdict::Changed);
        detector.clear();
        assert!(!detector.is_pending());
        assert_eq!(detector.observe(frame), Verdict::Changed);
    }
}
