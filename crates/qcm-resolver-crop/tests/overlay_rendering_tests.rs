//! Tests overlay rasterization: dim layer, clear window, border band.

use qcm_resolver_core::FrameSnapshot;
use qcm_resolver_crop::{CropSession, OverlayImage, PointerEvent, PointerKind};

fn session_100x100() -> CropSession {
    let frame = FrameSnapshot::new(100, 100, vec![0; 100 * 100 * 4]).expect("valid frame");
    CropSession::new(frame, 100, 100).expect("valid session")
}

fn pixel(overlay: &OverlayImage, x: u32, y: u32) -> [u8; 4] {
    let offset = ((y as usize) * (overlay.width as usize) + x as usize) * 4;
    let mut px = [0u8; 4];
    px.copy_from_slice(&overlay.rgba[offset..offset + 4]);
    px
}

const DIM: [u8; 4] = [0, 0, 0, 128];
const CLEAR: [u8; 4] = [0, 0, 0, 0];
const BORDER: [u8; 4] = [255, 0, 0, 255];

#[test]
fn overlay_rendering_tests_transparent_without_selection() {
    let session = session_100x100();
    let overlay = session.overlay();
    assert_eq!(overlay.width, 100);
    assert_eq!(overlay.height, 100);
    assert!(overlay.rgba.iter().all(|byte| *byte == 0));
}

#[test]
fn overlay_rendering_tests_dims_outside_and_clears_inside() {
    let mut session = session_100x100();
    session.handle_pointer(PointerEvent {
        kind: PointerKind::Down,
        x: 10.0,
        y: 10.0,
    });
    session.handle_pointer(PointerEvent {
        kind: PointerKind::Move,
        x: 30.0,
        y: 30.0,
    });

    let overlay = session.overlay();

    // Outside the selection: dimmed.
    assert_eq!(pixel(&overlay, 5, 5), DIM);
    assert_eq!(pixel(&overlay, 30, 30), DIM);
    assert_eq!(pixel(&overlay, 99, 99), DIM);

    // Selection edge band: 2 px border inside the window.
    assert_eq!(pixel(&overlay, 10, 10), BORDER);
    assert_eq!(pixel(&overlay, 11, 20), BORDER);
    assert_eq!(pixel(&overlay, 20, 28), BORDER);
    assert_eq!(pixel(&overlay, 29, 29), BORDER);

    // Window interior: fully transparent.
    assert_eq!(pixel(&overlay, 20, 20), CLEAR);
    assert_eq!(pixel(&overlay, 12, 12), CLEAR);
    assert_eq!(pixel(&overlay, 27, 27), CLEAR);
}

#[test]
fn overlay_rendering_tests_degenerate_selection_only_dims() {
    let mut session = session_100x100();
    session.handle_pointer(PointerEvent {
        kind: PointerKind::Down,
        x: 40.0,
        y: 40.0,
    });

    // No move yet: the selection exists but covers no pixels.
    let overlay = session.overlay();
    assert_eq!(pixel(&overlay, 40, 40), DIM);
    assert_eq!(pixel(&overlay, 0, 0), DIM);
}
