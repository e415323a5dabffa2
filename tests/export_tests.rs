// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for STL export

use tactile_picture::{Config, Mesh, Raster, SceneState, SolidModelWriter, StlExporter, export_mesh, save_export};

fn relief_scene() -> SceneState {
    let depth = Raster::from_fn(9, 7, |x, y| {
        if x == 4 && y == 3 {
            [0, 0, 0, 255]
        } else {
            [60 + (x * 17) as u8, (y * 31) as u8, 5, 255]
        }
    });
    let color = Raster::from_fn(9, 7, |_, _| [255, 255, 255, 255]);
    SceneState::new(depth, color, &Config::default()).unwrap()
}

fn parse_ascii_vertices(text: &str) -> Vec<[f32; 3]> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("vertex "))
        .map(|rest| {
            let v: Vec<f32> = rest.split_whitespace().map(|n| n.parse().unwrap()).collect();
            [v[0], v[1], v[2]]
        })
        .collect()
}

fn parse_binary_vertices(bytes: &[u8]) -> Vec<[f32; 3]> {
    let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap()) as usize;
    let read = |offset: usize| f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());

    let mut vertices = Vec::with_capacity(count * 3);
    for facet in 0..count {
        let base = 84 + facet * 50 + 12;
        for corner in 0..3 {
            let at = base + corner * 12;
            vertices.push([read(at), read(at + 4), read(at + 8)]);
        }
    }
    vertices
}

fn expected_vertices(mesh: &Mesh) -> Vec<[f32; 3]> {
    mesh.triangles().flatten().collect()
}

#[test]
fn test_ascii_export_round_trip() {
    let scene = relief_scene();
    let mesh = scene.mesh();
    assert!(mesh.triangle_count() > 0);

    let text = String::from_utf8(export_mesh(mesh, &StlExporter::ascii())).unwrap();
    assert!(text.starts_with("solid exported\n"));
    assert!(text.ends_with("endsolid exported\n"));
    assert_eq!(text.matches("facet normal").count(), mesh.triangle_count());

    assert_eq!(parse_ascii_vertices(&text), expected_vertices(mesh));
}

#[test]
fn test_binary_export_round_trip() {
    let scene = relief_scene();
    let mesh = scene.mesh();

    let bytes = export_mesh(mesh, &StlExporter::binary());
    assert_eq!(bytes.len(), 84 + 50 * mesh.triangle_count());
    assert_eq!(parse_binary_vertices(&bytes), expected_vertices(mesh));
}

#[test]
fn test_export_excludes_background() {
    let scene = relief_scene();
    let bytes = StlExporter::binary().serialize(scene.mesh().positions(), scene.mesh().indices());
    let plane_triangles = scene.background().geometry().indices.len() / 3;
    let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap()) as usize;
    assert_eq!(count, scene.mesh().triangle_count());
    assert_ne!(count, scene.mesh().triangle_count() + plane_triangles);
}

#[test]
fn test_save_export_writes_file() {
    let dir = std::env::temp_dir().join(format!("tactile-picture-export-{}", std::process::id()));
    let path = dir.join("picture3D.stl");

    let scene = relief_scene();
    let written = save_export(scene.mesh(), &StlExporter::ascii(), &path).unwrap();
    assert_eq!(written, path);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(parse_ascii_vertices(&text).len(), scene.mesh().triangle_count() * 3);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_export_of_empty_mesh() {
    let depth = Raster::from_fn(4, 4, |_, _| [0, 0, 0, 255]);
    let color = depth.clone();
    let scene = SceneState::new(depth, color, &Config::default()).unwrap();

    let text = String::from_utf8(export_mesh(scene.mesh(), &StlExporter::ascii())).unwrap();
    assert_eq!(text, "solid exported\nendsolid exported\n");
}
