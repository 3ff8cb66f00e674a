//! Benchmark smoke test for the deterministic detect/encode loop.

use std::time::Instant;

use qcm_resolver_core::{encode_png, FrameSnapshot, LIVE_CAPTURE_FILE_NAME};
use qcm_resolver_detect::{DetectorConfig, FrameChangeDetector, Verdict};

fn frame(value: u8) -> FrameSnapshot {
    FrameSnapshot::new(64, 64, vec![value; 64 * 64 * 4]).expect("frame should be valid")
}

#[test]
fn benchmark_detect_encode_smoke_prints_latency() {
    let mut detector = FrameChangeDetector::new(DetectorConfig::default());

    let start = Instant::now();
    let mut changes = 0usize;
    let mut encoded_bytes = 0usize;

    for round in 0..100_u32 {
        // Alternate quiet and changed frames so both detector paths run.
        let value = if round % 2 == 0 { 40 } else { 220 };
        let snapshot = frame(value);
        if detector.observe(snapshot.clone()) == Verdict::Changed {
            changes += 1;
            let artifact = encode_png(&snapshot, LIVE_CAPTURE_FILE_NAME)
                .expect("png encode should succeed");
            encoded_bytes += artifact.bytes.len();
            detector.reset();
        }
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_detect_encode_elapsed_ms={elapsed_ms}");
    println!("benchmark_change_count={changes}");
    println!("benchmark_encoded_bytes={encoded_bytes}");

    // This is a lightweight guardrail; strict NFR checks are environment-specific.
    assert!(
        elapsed_ms < 5_000,
        "detect/encode smoke benchmark should stay bounded"
    );
}
