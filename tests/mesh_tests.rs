// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for depth decoding and triangulation

use tactile_picture::constants::INVALID_DEPTH;
use tactile_picture::{DepthDecoder, Mesh, Raster};

/// Raster whose samples encode `valid` as a mid depth and anything else as zero
fn mask_raster(width: u32, height: u32, valid: impl Fn(u32, u32) -> bool) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        if valid(x, y) {
            [128, 64, 32, 255]
        } else {
            [0, 0, 0, 255]
        }
    })
}

#[test]
fn test_decoder_range_and_purity() {
    let decoder = DepthDecoder::default();
    for c0 in (0..=255u16).step_by(15) {
        for c1 in (0..=255u16).step_by(51) {
            for c2 in [0u8, 1, 127, 255] {
                let channels = [c0 as u8, c1 as u8, c2];
                let depth = decoder.decode(channels);
                assert_eq!(depth, decoder.decode(channels));
                assert!(
                    depth == INVALID_DEPTH || (depth > 0.1 && depth < 1.01),
                    "{:?} decoded to {}",
                    channels,
                    depth
                );
            }
        }
    }
}

#[test]
fn test_two_by_two_all_valid() {
    let raster = mask_raster(2, 2, |_, _| true);
    let mesh = Mesh::build(&raster, &DepthDecoder::default(), 1.0, 1.0);
    assert_eq!(mesh.positions().len(), 9);
    assert_eq!(mesh.indices(), &[1, 0, 4, 0, 3, 4]);
}

#[test]
fn test_two_by_two_top_left_invalid() {
    let raster = mask_raster(2, 2, |x, y| (x, y) != (0, 0));
    let mesh = Mesh::build(&raster, &DepthDecoder::default(), 1.0, 1.0);
    assert!(mesh.indices().is_empty());
}

#[test]
fn test_all_invalid_raster() {
    let raster = mask_raster(16, 12, |_, _| false);
    let mesh = Mesh::build(&raster, &DepthDecoder::default(), 0.025, 1.0);
    assert_eq!(mesh.triangle_count(), 0);
    assert!(mesh.positions().iter().all(|p| p[2] == INVALID_DEPTH));
    assert!(mesh.bounds().is_some());
}

#[test]
fn test_triangles_only_over_valid_samples() {
    // A hole in the middle of an otherwise valid raster
    let (w, h) = (10u32, 8u32);
    let raster = mask_raster(w, h, |x, y| !(4..6).contains(&x) || !(3..5).contains(&y));
    let decoder = DepthDecoder::default();
    let mesh = Mesh::build(&raster, &decoder, 1.0, 1.0);

    assert!(mesh.triangle_count() > 0);
    assert!(mesh.indices().len() <= 6 * (w * h) as usize);

    let vertex_count = mesh.positions().len() as u32;
    assert!(mesh.indices().iter().all(|&i| i < vertex_count));

    let full = Mesh::build(&mask_raster(w, h, |_, _| true), &decoder, 1.0, 1.0);
    assert!(mesh.triangle_count() < full.triangle_count());
}

#[test]
fn test_threshold_follows_decoder() {
    // 0.2 decodes valid at the default threshold but not at 0.25
    let raster = Raster::from_fn(3, 3, |_, _| [51, 0, 0, 255]);
    let lenient = Mesh::build(&raster, &DepthDecoder::new(0.1), 1.0, 1.0);
    let strict = Mesh::build(&raster, &DepthDecoder::new(0.25), 1.0, 1.0);
    assert!(lenient.triangle_count() > 0);
    assert_eq!(strict.triangle_count(), 0);
}
