use serde::{Deserialize, Serialize};

const BLOOM_RADIUS_TO_PX: f32 = 16.0;
const MAX_BLUR_RADIUS_PX: i32 = 12;
const GRAIN_SEED_CYCLE: u32 = 4096;

/// Tunable settings for the whole post chain. Every field has a shipped
/// default, so a config file only names the knobs it wants to move.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub bloom: BloomSettings,
    pub vignette: VignetteSettings,
    pub chromatic_aberration: ChromaticAberrationSettings,
    pub noise: NoiseSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Pixels brighter than this (0..1 luminance) feed the glow.
    pub luminance_threshold: f32,
    pub intensity: f32,
    /// Intensity used instead while degraded quality is engaged.
    pub degraded_intensity: f32,
    pub radius: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            luminance_threshold: 0.8,
            intensity: 0.6,
            degraded_intensity: 0.3,
            radius: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VignetteSettings {
    /// Normalized distance from center where darkening starts.
    pub offset: f32,
    pub darkness: f32,
}

impl Default for VignetteSettings {
    fn default() -> Self {
        Self {
            offset: 0.1,
            darkness: 1.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChromaticAberrationSettings {
    /// Channel shift as a fraction of the frame extent.
    pub offset: f32,
}

impl Default for ChromaticAberrationSettings {
    fn default() -> Self {
        Self { offset: 0.001 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub opacity: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self { opacity: 0.02 }
    }
}

/// Runs the post passes in place, in a fixed order: bloom, vignette,
/// chromatic aberration, grain. The two costliest passes drop out under
/// reduced quality: chromatic aberration when degraded or on a constrained
/// profile, grain when degraded.
pub(crate) fn apply_effects(
    frame: &mut [u8],
    width: u32,
    height: u32,
    config: &EffectsConfig,
    degraded: bool,
    constrained: bool,
    grain_seed: u32,
) {
    let expected_len = width as usize * height as usize * 4;
    if width == 0 || height == 0 || frame.len() < expected_len {
        return;
    }
    apply_bloom(frame, width, height, &config.bloom, degraded);
    apply_vignette(frame, width, height, &config.vignette);
    if !degraded && !constrained {
        apply_chromatic_aberration(frame, width, height, &config.chromatic_aberration);
    }
    if !degraded {
        apply_noise(frame, width, height, &config.noise, grain_seed);
    }
}

fn apply_bloom(frame: &mut [u8], width: u32, height: u32, settings: &BloomSettings, degraded: bool) {
    let intensity = if degraded {
        settings.degraded_intensity
    } else {
        settings.intensity
    };
    if intensity <= 0.0 {
        return;
    }
    let radius = blur_radius_px(settings.radius);
    if radius == 0 {
        return;
    }

    let pixel_count = width as usize * height as usize;
    let mut bright = vec![0f32; pixel_count * 3];
    for (index, pixel) in frame.chunks_exact(4).take(pixel_count).enumerate() {
        if luminance(pixel[0], pixel[1], pixel[2]) <= settings.luminance_threshold {
            continue;
        }
        bright[index * 3] = pixel[0] as f32;
        bright[index * 3 + 1] = pixel[1] as f32;
        bright[index * 3 + 2] = pixel[2] as f32;
    }
    let blurred = box_blur_rgb(&bright, width, height, radius);
    for (index, pixel) in frame.chunks_exact_mut(4).take(pixel_count).enumerate() {
        for channel in 0..3 {
            let lifted = pixel[channel] as f32 + blurred[index * 3 + channel] * intensity;
            pixel[channel] = lifted.min(255.0) as u8;
        }
    }
}

fn luminance(r: u8, g: u8, b: u8) -> f32 {
    (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0
}

fn blur_radius_px(radius: f32) -> i32 {
    if !radius.is_finite() || radius <= 0.0 {
        return 0;
    }
    ((radius * BLOOM_RADIUS_TO_PX).round() as i32).clamp(1, MAX_BLUR_RADIUS_PX)
}

/// Separable box blur with clamped edges, run as a sliding window so cost
/// stays flat in the radius.
fn box_blur_rgb(source: &[f32], width: u32, height: u32, radius: i32) -> Vec<f32> {
    let width_i = width as i32;
    let height_i = height as i32;
    let window = (radius * 2 + 1) as f32;

    let mut rows_blurred = vec![0f32; source.len()];
    for y in 0..height_i {
        let row_base = y as usize * width as usize;
        let mut sum = [0f32; 3];
        for dx in -radius..=radius {
            let sample_x = dx.clamp(0, width_i - 1) as usize;
            let offset = (row_base + sample_x) * 3;
            for channel in 0..3 {
                sum[channel] += source[offset + channel];
            }
        }
        for x in 0..width_i {
            let dest_offset = (row_base + x as usize) * 3;
            for channel in 0..3 {
                rows_blurred[dest_offset + channel] = sum[channel] / window;
            }
            let remove_x = (x - radius).clamp(0, width_i - 1) as usize;
            let add_x = (x + radius + 1).clamp(0, width_i - 1) as usize;
            let remove_offset = (row_base + remove_x) * 3;
            let add_offset = (row_base + add_x) * 3;
            for channel in 0..3 {
                sum[channel] += source[add_offset + channel] - source[remove_offset + channel];
            }
        }
    }

    let mut blurred = vec![0f32; source.len()];
    for x in 0..width_i {
        let mut sum = [0f32; 3];
        for dy in -radius..=radius {
            let sample_y = dy.clamp(0, height_i - 1) as usize;
            let offset = (sample_y * width as usize + x as usize) * 3;
            for channel in 0..3 {
                sum[channel] += rows_blurred[offset + channel];
            }
        }
        for y in 0..height_i {
            let dest_offset = (y as usize * width as usize + x as usize) * 3;
            for channel in 0..3 {
                blurred[dest_offset + channel] = sum[channel] / window;
            }
            let remove_y = (y - radius).clamp(0, height_i - 1) as usize;
            let add_y = (y + radius + 1).clamp(0, height_i - 1) as usize;
            let remove_offset = (remove_y * width as usize + x as usize) * 3;
            let add_offset = (add_y * width as usize + x as usize) * 3;
            for channel in 0..3 {
                sum[channel] +=
                    rows_blurred[add_offset + channel] - rows_blurred[remove_offset + channel];
            }
        }
    }
    blurred
}

fn apply_vignette(frame: &mut [u8], width: u32, height: u32, settings: &VignetteSettings) {
    if settings.darkness <= 0.0 {
        return;
    }
    let half_width = width as f32 * 0.5;
    let half_height = height as f32 * 0.5;
    for y in 0..height as usize {
        let norm_y = (y as f32 + 0.5 - half_height) / height as f32;
        for x in 0..width as usize {
            let norm_x = (x as f32 + 0.5 - half_width) / width as f32;
            let dist = (norm_x * norm_x + norm_y * norm_y).sqrt();
            let falloff =
                (1.0 - settings.darkness * (dist - settings.offset).max(0.0)).clamp(0.0, 1.0);
            if falloff >= 1.0 {
                continue;
            }
            let offset = (y * width as usize + x) * 4;
            for channel in 0..3 {
                frame[offset + channel] = (frame[offset + channel] as f32 * falloff) as u8;
            }
        }
    }
}

fn apply_chromatic_aberration(
    frame: &mut [u8],
    width: u32,
    height: u32,
    settings: &ChromaticAberrationSettings,
) {
    let shift_x = channel_shift_px(settings.offset, width);
    let shift_y = channel_shift_px(settings.offset, height);
    if shift_x == 0 && shift_y == 0 {
        return;
    }
    let pixel_count = width as usize * height as usize;
    let source = frame[..pixel_count * 4].to_vec();
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let offset = (y as usize * width as usize + x as usize) * 4;
            frame[offset] = sample_channel(&source, width, height, x - shift_x, y - shift_y, 0);
            frame[offset + 2] = sample_channel(&source, width, height, x + shift_x, y + shift_y, 2);
        }
    }
}

fn channel_shift_px(offset: f32, extent: u32) -> i32 {
    if !offset.is_finite() || offset <= 0.0 {
        return 0;
    }
    ((offset * extent as f32).round() as i32).max(1)
}

fn sample_channel(source: &[u8], width: u32, height: u32, x: i32, y: i32, channel: usize) -> u8 {
    let x = x.clamp(0, width as i32 - 1) as usize;
    let y = y.clamp(0, height as i32 - 1) as usize;
    source[(y * width as usize + x) * 4 + channel]
}

fn apply_noise(frame: &mut [u8], width: u32, height: u32, settings: &NoiseSettings, seed: u32) {
    if settings.opacity <= 0.0 {
        return;
    }
    let amplitude = settings.opacity.clamp(0.0, 1.0) * 255.0;
    // Cycle the seed so the f32 mix below keeps full precision on long uptimes.
    let seed = (seed % GRAIN_SEED_CYCLE) as f32;
    for y in 0..height as usize {
        for x in 0..width as usize {
            let grain = (grain_hash01(x as f32, y as f32, seed) - 0.5) * 2.0 * amplitude;
            let offset = (y * width as usize + x) * 4;
            for channel in 0..3 {
                let lifted = frame[offset + channel] as f32 + grain;
                frame[offset + channel] = lifted.clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn grain_hash01(x: f32, y: f32, seed: f32) -> f32 {
    let mixed = x * 12.9898 + y * 78.233 + seed * 37.719;
    (mixed.sin() * 43758.5453).fract().abs()
}
