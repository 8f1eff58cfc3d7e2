use std::sync::Arc;

use glam::Vec3;
use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::effects::{apply_effects, EffectsConfig};
use super::projection::{project, Camera, ProjectedPoint, Viewport};
use crate::app::ElementSet;

const CLEAR_COLOR_NIGHT_SKY: [u8; 4] = [5, 0, 16, 255];

/// Owns the window surface and the supersampled RGBA frame buffer. The
/// buffer is sized at the surface dimensions times the active pixel ratio,
/// so lowering the ratio shrinks every per-pixel pass in one place.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    surface_width: u32,
    surface_height: u32,
    pixel_ratio: f32,
    viewport: Viewport,
    camera: Camera,
}

impl Renderer {
    pub fn new(window: Arc<Window>, camera: Camera, pixel_ratio: f32) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixel_ratio = clamped_pixel_ratio(pixel_ratio);
        let (buffer_width, buffer_height) =
            scaled_buffer_dimensions(size.width, size.height, pixel_ratio);
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            size.width,
            size.height,
            buffer_width,
            buffer_height,
        )?;
        Ok(Self {
            window,
            pixels,
            surface_width: size.width,
            surface_height: size.height,
            pixel_ratio,
            viewport: Viewport {
                width: buffer_width,
                height: buffer_height,
            },
            camera,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.surface_width = width;
        self.surface_height = height;
        self.rebuild_pixels()
    }

    /// Applies a new supersampling ratio. A no-op when the ratio is
    /// unchanged, so the loop may call this every quality transition.
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) -> Result<(), Error> {
        let pixel_ratio = clamped_pixel_ratio(pixel_ratio);
        if (pixel_ratio - self.pixel_ratio).abs() < f32::EPSILON {
            return Ok(());
        }
        self.pixel_ratio = pixel_ratio;
        self.rebuild_pixels()
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn rebuild_pixels(&mut self) -> Result<(), Error> {
        let (buffer_width, buffer_height) =
            scaled_buffer_dimensions(self.surface_width, self.surface_height, self.pixel_ratio);
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            self.surface_width,
            self.surface_height,
            buffer_width,
            buffer_height,
        )?;
        self.viewport = Viewport {
            width: buffer_width,
            height: buffer_height,
        };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        surface_width: u32,
        surface_height: u32,
        buffer_width: u32,
        buffer_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(buffer_width, buffer_height, surface)
    }

    pub(crate) fn render_frame(
        &mut self,
        elements: &ElementSet,
        effects: &EffectsConfig,
        degraded: bool,
        constrained: bool,
        grain_seed: u32,
    ) -> Result<(), Error> {
        let width = self.viewport.width;
        let height = self.viewport.height;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let camera = self.camera;

        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR_NIGHT_SKY);
        }
        let mut canvas = Canvas::new(frame, width, height, camera);
        elements.draw_all(&mut canvas);

        apply_effects(
            self.pixels.frame_mut(),
            width,
            height,
            effects,
            degraded,
            constrained,
            grain_seed,
        );

        // The overlay layer draws after the effect chain so glyphs stay crisp.
        let mut overlay_canvas = Canvas::new(self.pixels.frame_mut(), width, height, camera);
        elements.draw_overlay_all(&mut overlay_canvas);

        self.pixels.render()
    }
}

/// Per-frame drawing surface handed to every element. Wraps the raw RGBA
/// frame, so tests can draw into a plain buffer without a window.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    camera: Camera,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32, camera: Camera) -> Self {
        Self {
            frame,
            width,
            height,
            camera,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn project(&self, world: Vec3) -> Option<ProjectedPoint> {
        project(
            world,
            &self.camera,
            Viewport {
                width: self.width,
                height: self.height,
            },
        )
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        blend_pixel_rgba_clipped(self.frame, self.width as usize, x, y, color);
    }

    pub fn draw_vertical_span(
        &mut self,
        x: i32,
        y_top: i32,
        y_bottom: i32,
        thickness: i32,
        color: [u8; 4],
    ) {
        draw_vertical_span_blended(
            self.frame,
            self.width,
            self.height,
            x,
            y_top,
            y_bottom,
            thickness,
            color,
        );
    }

    pub fn draw_disc(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        draw_disc_blended(self.frame, self.width, self.height, cx, cy, radius, color);
    }

    pub fn draw_soft_disc(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        draw_soft_disc_blended(self.frame, self.width, self.height, cx, cy, radius, color);
    }

    pub fn draw_bitmap_glyph(
        &mut self,
        rows: &[u8],
        glyph_width: i32,
        left: i32,
        top: i32,
        pixel_scale: i32,
        color: [u8; 4],
    ) {
        draw_bitmap_glyph_blended(
            self.frame,
            self.width,
            self.height,
            rows,
            glyph_width,
            left,
            top,
            pixel_scale,
            color,
        );
    }
}

fn clamped_pixel_ratio(pixel_ratio: f32) -> f32 {
    if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    }
}

fn scaled_buffer_dimensions(width: u32, height: u32, pixel_ratio: f32) -> (u32, u32) {
    let ratio = clamped_pixel_ratio(pixel_ratio);
    let buffer_width = (width as f32 * ratio).round().max(1.0) as u32;
    let buffer_height = (height as f32 * ratio).round().max(1.0) as u32;
    (buffer_width, buffer_height)
}

fn blend_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    let alpha = color[3] as u32;
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        frame[byte_offset..end].copy_from_slice(&color);
        return;
    }
    let inverse = 255 - alpha;
    for channel in 0..3 {
        let src = color[channel] as u32;
        let dst = frame[byte_offset + channel] as u32;
        frame[byte_offset + channel] = ((src * alpha + dst * inverse + 127) / 255) as u8;
    }
    frame[byte_offset + 3] = 255;
}

#[allow(clippy::too_many_arguments)]
fn draw_vertical_span_blended(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y_top: i32,
    y_bottom: i32,
    thickness: i32,
    color: [u8; 4],
) {
    if width == 0 || height == 0 || thickness <= 0 {
        return;
    }
    let left = x - (thickness - 1) / 2;
    for column in left..left + thickness {
        for y in y_top..=y_bottom {
            blend_pixel_rgba_clipped(frame, width as usize, column, y, color);
        }
    }
}

fn draw_disc_blended(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    radius: i32,
    color: [u8; 4],
) {
    if width == 0 || height == 0 || radius < 0 {
        return;
    }
    let radius_sq = radius * radius;
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            let dx = x - cx;
            let dy = y - cy;
            if dx * dx + dy * dy > radius_sq {
                continue;
            }
            blend_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

/// Disc whose alpha falls off quadratically toward the rim. Used for glow
/// cores that the bloom pass then spreads.
fn draw_soft_disc_blended(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    radius: i32,
    color: [u8; 4],
) {
    if width == 0 || height == 0 || radius <= 0 {
        return;
    }
    let radius_sq = (radius * radius) as f32;
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            let dx = (x - cx) as f32;
            let dy = (y - cy) as f32;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq > radius_sq {
                continue;
            }
            let falloff = 1.0 - dist_sq / radius_sq;
            let alpha = (color[3] as f32 * falloff).round() as u8;
            if alpha == 0 {
                continue;
            }
            let faded = [color[0], color[1], color[2], alpha];
            blend_pixel_rgba_clipped(frame, width as usize, x, y, faded);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_bitmap_glyph_blended(
    frame: &mut [u8],
    width: u32,
    height: u32,
    rows: &[u8],
    glyph_width: i32,
    left: i32,
    top: i32,
    pixel_scale: i32,
    color: [u8; 4],
) {
    if width == 0 || height == 0 || !(1..=8).contains(&glyph_width) || pixel_scale <= 0 {
        return;
    }
    for (row_index, row_bits) in rows.iter().enumerate() {
        let row_top = top + row_index as i32 * pixel_scale;
        for col in 0..glyph_width {
            if row_bits & (1 << (glyph_width - 1 - col)) == 0 {
                continue;
            }
            let cell_left = left + col * pixel_scale;
            for sy in 0..pixel_scale {
                for sx in 0..pixel_scale {
                    blend_pixel_rgba_clipped(
                        frame,
                        width as usize,
                        cell_left + sx,
                        row_top + sy,
                        color,
                    );
                }
            }
        }
    }
}
