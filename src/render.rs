//! PNG preview of a terrain.
//!
//! Each pixel takes the color of the nearest mesh node. Rendering only reads
//! the mesh and fields.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use rayon::prelude::*;

use crate::fields::FieldSet;
use crate::geometry::Vec2;
use crate::mesh::Mesh;

const BACKGROUND: [u8; 3] = [5, 5, 15];
const DEEP_WATER: [u8; 3] = [20, 40, 110];
const SHALLOW_WATER: [u8; 3] = [70, 130, 190];
const BEDROCK: [u8; 3] = [120, 110, 100];
const SEDIMENT: [u8; 3] = [190, 170, 120];
const FOREST: [u8; 3] = [40, 110, 45];
const SNOW: [u8; 3] = [240, 240, 245];

/// Rasterize `mesh` into an image `width_px` wide, keeping the mesh's
/// aspect ratio. `sea_level` only affects how water is tinted.
pub fn render_preview(mesh: &Mesh, fields: &FieldSet, sea_level: f32, width_px: u32) -> RgbImage {
    let width_px = width_px.max(1);
    let (min, max) = mesh.bounds();
    let extent = max - min;
    let scale = extent.x.max(1e-6) / width_px as f32;
    let height_px = ((extent.y / scale).ceil() as u32).max(1);
    let reach = mesh.spacing() * 2.0;

    let rows: Vec<Vec<[u8; 3]>> = (0..height_px)
        .into_par_iter()
        .map(|y| {
            (0..width_px)
                .map(|x| {
                    let pos = min + Vec2::new((x as f32 + 0.5) * scale, (y as f32 + 0.5) * scale);
                    match mesh.nearest_node(pos, reach) {
                        Some(node) => node_color(fields, node, sea_level),
                        None => BACKGROUND,
                    }
                })
                .collect()
        })
        .collect();

    let mut img: RgbImage = ImageBuffer::new(width_px, height_px);
    for (y, row) in rows.iter().enumerate() {
        for (x, color) in row.iter().enumerate() {
            img.put_pixel(x as u32, y as u32, Rgb(*color));
        }
    }
    img
}

/// Render and write a PNG to `path`.
pub fn export_preview(
    mesh: &Mesh,
    fields: &FieldSet,
    sea_level: f32,
    width_px: u32,
    path: &Path,
) -> Result<(), image::ImageError> {
    render_preview(mesh, fields, sea_level, width_px).save(path)
}

/// Color of one node: water over ground, snow over vegetation over
/// sediment over rock, then darkened toward low elevations.
pub fn node_color(fields: &FieldSet, node: usize, sea_level: f32) -> [u8; 3] {
    let rock = fields.rock_elevation(node);
    let depth = fields.water[node];

    if depth > 0.01 {
        let below_sea = (sea_level - rock).max(0.0);
        let t = (depth.max(below_sea) * 4.0).min(1.0);
        return lerp_color(SHALLOW_WATER, DEEP_WATER, t);
    }

    let sediment = (fields.soft[node] * 20.0).min(1.0);
    let mut color = lerp_color(BEDROCK, SEDIMENT, sediment);
    color = lerp_color(color, FOREST, fields.vegetation[node]);
    color = lerp_color(color, SNOW, (fields.snow[node] * 50.0).min(1.0));

    let shade = 0.6 + 0.4 * (rock / (sea_level.abs() + 1.0)).clamp(0.0, 1.0);
    [
        (color[0] as f32 * shade).clamp(0.0, 255.0) as u8,
        (color[1] as f32 * shade).clamp(0.0, 255.0) as u8,
        (color[2] as f32 * shade).clamp(0.0, 255.0) as u8,
    ]
}

fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (Mesh, FieldSet) {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 10.0),
        ];
        let mesh = Mesh::from_points(points).expect("mesh");
        let mut fields = FieldSet::with_hard(vec![1.0, 1.0, 1.0, 1.0]);
        fields.water[3] = 0.5;
        (mesh, fields)
    }

    #[test]
    fn test_preview_size_follows_mesh_aspect() {
        let (mesh, fields) = square();
        let img = render_preview(&mesh, &fields, 0.3, 32);
        assert_eq!(img.width(), 32);
        assert_eq!(img.height(), 32);
    }

    #[test]
    fn test_pixels_take_nearest_node_color() {
        let (mesh, fields) = square();
        let img = render_preview(&mesh, &fields, 0.3, 20);

        assert_eq!(img.get_pixel(0, 0).0, node_color(&fields, 0, 0.3));
        assert_eq!(img.get_pixel(19, 19).0, node_color(&fields, 3, 0.3));
        assert_ne!(img.get_pixel(0, 0).0, img.get_pixel(19, 19).0);
    }

    #[test]
    fn test_node_colors() {
        let mut fields = FieldSet::with_hard(vec![0.0, 1.0, 1.0]);
        fields.water[0] = 1.0;
        fields.snow[2] = 1.0;

        let water = node_color(&fields, 0, 0.3);
        assert!(water[2] > water[0], "water should be blue: {:?}", water);
        assert_eq!(lerp_color(BEDROCK, SNOW, 1.0), SNOW);
        let snow = node_color(&fields, 2, 0.3);
        assert!(snow[0] > node_color(&fields, 1, 0.3)[0]);
    }
}
