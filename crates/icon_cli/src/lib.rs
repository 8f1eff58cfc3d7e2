use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

pub const DEFAULT_SIZES: [u32; 2] = [192, 512];

const GLOW_CENTER: [u8; 3] = [26, 0, 42];
const BACKGROUND: [u8; 3] = [0, 0, 0];
const RING_CYAN: [u8; 3] = [0, 255, 255];
const MARK_MAGENTA: [u8; 3] = [255, 0, 255];

const RING_RADIUS_FRACTION: f32 = 0.45;
const RING_WIDTH_FRACTION: f32 = 0.04;
const MARK_HEIGHT_FRACTION: f32 = 0.5;

const MARK_GLYPH_WIDTH: i32 = 5;
const MARK_GLYPH_HEIGHT: i32 = 7;
const MARK_GLYPH_GAP: i32 = 1;

const K_ROWS: [u8; 7] = [
    0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001,
];
const R_ROWS: [u8; 7] = [
    0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001,
];

#[derive(Debug, Error)]
pub enum IconError {
    #[error("icon size must be nonzero")]
    ZeroSize,
    #[error("failed to create output dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write icon {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Rasterizes one square launcher icon: a dark violet glow fading to
/// black, a cyan ring, and a blocky magenta "KR" mark in the middle.
pub fn render_icon(size: u32) -> RgbaImage {
    let mut icon = RgbaImage::new(size, size);
    let half_extent = size as f32 * 0.5;
    let ring_radius = size as f32 * RING_RADIUS_FRACTION;
    let ring_half_width = size as f32 * RING_WIDTH_FRACTION * 0.5;

    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - half_extent;
            let dy = y as f32 + 0.5 - half_extent;
            let dist = (dx * dx + dy * dy).sqrt();

            let mut color = glow_color(dist, half_extent);
            let coverage = ring_coverage(dist, ring_radius, ring_half_width);
            if coverage > 0.0 {
                color = mix(color, RING_CYAN, coverage);
            }
            icon.put_pixel(x, y, Rgba([color[0], color[1], color[2], 255]));
        }
    }

    draw_mark(&mut icon, size);
    icon
}

pub fn icon_file_name(size: u32) -> String {
    format!("pwa-{size}x{size}.png")
}

/// Renders every requested size into `out_dir`, creating it if needed.
/// Returns the written paths in request order.
pub fn write_icons(out_dir: &Path, sizes: &[u32]) -> Result<Vec<PathBuf>, IconError> {
    fs::create_dir_all(out_dir).map_err(|source| IconError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(sizes.len());
    for &size in sizes {
        if size == 0 {
            return Err(IconError::ZeroSize);
        }
        let path = out_dir.join(icon_file_name(size));
        render_icon(size)
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| IconError::Write {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }
    Ok(written)
}

fn glow_color(dist: f32, half_extent: f32) -> [u8; 3] {
    let t = (dist / half_extent).clamp(0.0, 1.0);
    mix(GLOW_CENTER, BACKGROUND, t)
}

/// Single-pixel soft edge on the ring band so the stroke does not alias.
fn ring_coverage(dist: f32, ring_radius: f32, ring_half_width: f32) -> f32 {
    (ring_half_width + 0.5 - (dist - ring_radius).abs()).clamp(0.0, 1.0)
}

fn mix(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let lerp = |from: u8, to: u8| -> u8 {
        (from as f32 + (to as f32 - from as f32) * t).round() as u8
    };
    [lerp(a[0], b[0]), lerp(a[1], b[1]), lerp(a[2], b[2])]
}

fn draw_mark(icon: &mut RgbaImage, size: u32) {
    let pixel_scale = (((size as f32 * MARK_HEIGHT_FRACTION) / MARK_GLYPH_HEIGHT as f32).round()
        as i32)
        .max(1);
    let advance = (MARK_GLYPH_WIDTH + MARK_GLYPH_GAP) * pixel_scale;
    let mark_width = advance + MARK_GLYPH_WIDTH * pixel_scale;
    let mark_height = MARK_GLYPH_HEIGHT * pixel_scale;
    let left = (size as i32 - mark_width) / 2;
    let top = (size as i32 - mark_height) / 2;

    draw_glyph(icon, &K_ROWS, left, top, pixel_scale);
    draw_glyph(icon, &R_ROWS, left + advance, top, pixel_scale);
}

fn draw_glyph(icon: &mut RgbaImage, rows: &[u8; 7], left: i32, top: i32, pixel_scale: i32) {
    let (width, height) = icon.dimensions();
    for (row_index, row_bits) in rows.iter().enumerate() {
        for col in 0..MARK_GLYPH_WIDTH {
            if row_bits & (1 << (MARK_GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            for sub_y in 0..pixel_scale {
                for sub_x in 0..pixel_scale {
                    let x = left + col * pixel_scale + sub_x;
                    let y = top + row_index as i32 * pixel_scale + sub_y;
                    if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                        icon.put_pixel(
                            x as u32,
                            y as u32,
                            Rgba([MARK_MAGENTA[0], MARK_MAGENTA[1], MARK_MAGENTA[2], 255]),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glow_fades_from_violet_center_to_black_edge() {
        assert_eq!(glow_color(0.0, 96.0), GLOW_CENTER);
        assert_eq!(glow_color(96.0, 96.0), BACKGROUND);
        assert_eq!(glow_color(200.0, 96.0), BACKGROUND);

        let mid = glow_color(48.0, 96.0);
        assert!(mid[0] < GLOW_CENTER[0] && mid[0] > BACKGROUND[0]);
        assert!(mid[2] < GLOW_CENTER[2] && mid[2] > BACKGROUND[2]);
    }

    #[test]
    fn ring_coverage_peaks_on_the_stroke_and_vanishes_off_it() {
        let radius = 28.8;
        let half_width = 1.28;

        assert_eq!(ring_coverage(radius, radius, half_width), 1.0);
        assert_eq!(ring_coverage(radius + half_width + 1.0, radius, half_width), 0.0);
        assert_eq!(ring_coverage(radius - half_width - 1.0, radius, half_width), 0.0);
    }

    #[test]
    fn rendered_icon_has_ring_mark_and_dark_corners() {
        let size = 64u32;
        let icon = render_icon(size);

        let on_ring = icon.get_pixel(60, 32);
        assert_eq!(on_ring.0, [0, 255, 255, 255]);

        let corner = icon.get_pixel(0, 0);
        assert_eq!(corner.0, [0, 0, 0, 255]);

        let magenta_pixels = icon
            .pixels()
            .filter(|px| px.0 == [255, 0, 255, 255])
            .count();
        assert!(magenta_pixels > 50, "mark missing: {magenta_pixels} px");
    }

    #[test]
    fn tiny_icon_renders_without_panicking() {
        let icon = render_icon(4);
        assert_eq!(icon.dimensions(), (4, 4));
    }

    #[test]
    fn icon_file_name_matches_the_manifest_convention() {
        assert_eq!(icon_file_name(192), "pwa-192x192.png");
        assert_eq!(icon_file_name(512), "pwa-512x512.png");
    }

    #[test]
    fn icons_land_on_disk_with_the_expected_names() {
        let dir = tempfile::tempdir().expect("tempdir");

        let written = write_icons(dir.path(), &[16, 32]).expect("write icons");

        assert_eq!(
            written,
            vec![
                dir.path().join("pwa-16x16.png"),
                dir.path().join("pwa-32x32.png"),
            ]
        );
        for path in &written {
            let metadata = fs::metadata(path).expect("icon metadata");
            assert!(metadata.len() > 0);
        }
    }

    #[test]
    fn zero_size_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = write_icons(dir.path(), &[192, 0]).expect_err("must fail");
        let message = error.to_string();
        assert!(message.contains("nonzero"), "unexpected error: {message}");
    }
}
