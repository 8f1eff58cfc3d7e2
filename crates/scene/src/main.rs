use std::env;
use std::f32::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backdrop::{
    clock_text_width_px, draw_clock_text, draw_hangul_text, hangul_text_width_px, run_app, Canvas,
    EffectsConfig, Element, ElementSet, LoopConfig, PerfMonitorConfig, PixelRatioRange, RateGate,
    TickContext, DIGIT_GLYPH_HEIGHT, HANGUL_GLYPH_SIZE,
};
use chrono::{Local, Timelike};
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV_VAR: &str = "BACKDROP_CONFIG";

const KOREAN_WORDS: [&str; 6] = ["사랑", "꿈", "빛", "밤", "하늘", "영원"];

const RAIN_SPREAD: f32 = 50.0;
const RAIN_DEPTH_SPREAD: f32 = 30.0;
const RAIN_DEPTH_NEAREST: f32 = 5.0;
const RAIN_SPEED_BASE: f32 = 0.1;
const RAIN_SPEED_SPREAD: f32 = 0.2;
const RAIN_LENGTH_BASE: f32 = 2.0;
const RAIN_LENGTH_SPREAD: f32 = 5.0;
const RAIN_WRAP_Y: f32 = 25.0;
const RAIN_THICKNESS_WORLD: f32 = 0.02;

const WORD_SPREAD: f32 = 60.0;
const WORD_DEPTH_Z: f32 = -20.0;
const WORD_SPEED_BASE: f32 = 0.02;
const WORD_SPEED_SPREAD: f32 = 0.05;
const WORD_WRAP_Y: f32 = 30.0;
const WORD_GLYPH_HEIGHT_WORLD: f32 = 0.6;

const KNOT_RADIUS: f32 = 1.5;
const KNOT_TUBE: f32 = 0.4;
const KNOT_SAMPLES: u32 = 128;
const KNOT_WINDINGS: f32 = 2.0;
const KNOT_TWISTS: f32 = 3.0;
const KNOT_SPIN_X: f32 = 0.2;
const KNOT_SPIN_Y: f32 = 0.3;
const CORE_RADIUS: f32 = 0.5;
const CORE_ORBIT_RADIUS: f32 = 0.5;
const CORE_ORBIT_RATE: f32 = 1.5;
const FLOAT_RATE: f32 = 0.5;
const FLOAT_TILT: f32 = 0.0625;
const FLOAT_BOB: f32 = 0.05;

const CLOCK_ANCHOR: Vec3 = Vec3::new(0.0, 4.0, 0.0);
const CLOCK_REFRESH_HZ: f32 = 1.0;

const RAIN_WHITE: [u8; 4] = [255, 255, 255, 77];
const WORD_WHITE: [u8; 4] = [255, 255, 255, 102];
const WORD_BLUR_WHITE: [u8; 4] = [255, 255, 255, 38];
const WORD_HALO_MAGENTA: [u8; 4] = [255, 0, 255, 46];
const GLASS_ALPHA: u8 = 26;
const CORE_HALO_MAGENTA: [u8; 4] = [255, 0, 255, 150];
const CORE_WHITE_HOT: [u8; 4] = [255, 255, 255, 255];
const CLOCK_WHITE: [u8; 4] = [255, 255, 255, 102];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
struct SceneConfig {
    window_title: String,
    window_width: u32,
    window_height: u32,
    idle_window_secs: u64,
    pixel_ratio_min: f32,
    pixel_ratio_max: f32,
    constrained_profile: bool,
    rain_count: u32,
    word_count: u32,
    words: Vec<String>,
    element_rate_cap_hz: f32,
    perf: PerfSection,
    effects: EffectsConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window_title: "Korean Cyberpunk".to_string(),
            window_width: 1280,
            window_height: 720,
            idle_window_secs: 30,
            pixel_ratio_min: 1.0,
            pixel_ratio_max: 1.5,
            constrained_profile: false,
            rain_count: 100,
            word_count: 15,
            words: KOREAN_WORDS.iter().map(|word| word.to_string()).collect(),
            element_rate_cap_hz: 30.0,
            perf: PerfSection::default(),
            effects: EffectsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
struct PerfSection {
    lower_fps: f32,
    upper_fps: f32,
    flipflop_limit: u32,
}

impl Default for PerfSection {
    fn default() -> Self {
        Self {
            lower_fps: 50.0,
            upper_fps: 90.0,
            flipflop_limit: 3,
        }
    }
}

#[derive(Debug, Error)]
enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config at {json_path}: {source}")]
    Parse {
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Thin vertical streak rising through the scene. All streaks keep their
/// seeded x/z column and wrap back to the bottom after leaving the top.
struct RainStreak {
    position: Vec3,
    speed: f32,
    length: f32,
    gate: RateGate,
}

impl RainStreak {
    fn new(index: u32, cap_hz: f32) -> Self {
        Self {
            position: Vec3::new(
                (hash01(index, 0) - 0.5) * RAIN_SPREAD,
                (hash01(index, 1) - 0.5) * RAIN_SPREAD,
                hash01(index, 2) * RAIN_DEPTH_SPREAD + RAIN_DEPTH_NEAREST - RAIN_DEPTH_SPREAD,
            ),
            speed: RAIN_SPEED_BASE + hash01(index, 3) * RAIN_SPEED_SPREAD,
            length: RAIN_LENGTH_BASE + hash01(index, 4) * RAIN_LENGTH_SPREAD,
            gate: RateGate::with_cap_hz(cap_hz),
        }
    }
}

impl Element for RainStreak {
    fn advance(&mut self, ctx: &TickContext) -> bool {
        if !self.gate.admit(ctx.elapsed) {
            return false;
        }
        self.position.y += self.speed;
        if self.position.y > RAIN_WRAP_Y {
            self.position.y = -RAIN_WRAP_Y;
        }
        true
    }

    fn draw(&self, canvas: &mut Canvas<'_>) {
        let half = Vec3::new(0.0, self.length * 0.5, 0.0);
        if let (Some(top), Some(bottom)) = (
            canvas.project(self.position + half),
            canvas.project(self.position - half),
        ) {
            let thickness = (RAIN_THICKNESS_WORLD * top.scale).round().max(1.0) as i32;
            canvas.draw_vertical_span(
                top.x.round() as i32,
                top.y.round() as i32,
                bottom.y.round() as i32,
                thickness,
                RAIN_WHITE,
            );
        }
    }
}

/// One of the Korean words drifting down the far plane. Rendered on the
/// overlay layer with its own halo so it keeps the neon look without
/// passing through the effect chain.
struct FallingWord {
    position: Vec3,
    speed: f32,
    word: String,
    gate: RateGate,
}

impl FallingWord {
    fn new(index: u32, cap_hz: f32, words: &[String]) -> Self {
        Self {
            position: Vec3::new(
                (hash01(index, 8) - 0.5) * WORD_SPREAD,
                (hash01(index, 9) - 0.5) * WORD_SPREAD,
                WORD_DEPTH_Z,
            ),
            speed: WORD_SPEED_BASE + hash01(index, 10) * WORD_SPEED_SPREAD,
            word: pick_word(index, words),
            gate: RateGate::with_cap_hz(cap_hz),
        }
    }
}

impl Element for FallingWord {
    fn advance(&mut self, ctx: &TickContext) -> bool {
        if !self.gate.admit(ctx.elapsed) {
            return false;
        }
        self.position.y -= self.speed;
        if self.position.y < -WORD_WRAP_Y {
            self.position.y = WORD_WRAP_Y;
        }
        true
    }

    fn draw(&self, _canvas: &mut Canvas<'_>) {}

    fn draw_overlay(&self, canvas: &mut Canvas<'_>) {
        if self.word.is_empty() {
            return;
        }
        if let Some(projected) = canvas.project(self.position) {
            let pixel_scale = ((projected.scale * WORD_GLYPH_HEIGHT_WORLD)
                / HANGUL_GLYPH_SIZE as f32)
                .round()
                .max(1.0) as i32;
            let width = hangul_text_width_px(&self.word, pixel_scale);
            let cx = projected.x.round() as i32;
            let cy = projected.y.round() as i32;
            let left = cx - width / 2;
            let top = cy - (HANGUL_GLYPH_SIZE * pixel_scale) / 2;

            canvas.draw_soft_disc(cx, cy, width / 2 + 2 * pixel_scale, WORD_HALO_MAGENTA);
            draw_hangul_text(
                canvas,
                &self.word,
                left + pixel_scale,
                top + pixel_scale,
                pixel_scale,
                WORD_BLUR_WHITE,
            );
            draw_hangul_text(canvas, &self.word, left, top, pixel_scale, WORD_WHITE);
        }
    }
}

/// Centerpiece: a slowly tumbling torus knot sampled along its center
/// curve, with a bright core orbiting inside it. The whole group drifts
/// on a gentle float wobble.
struct GlassKnot {
    base_points: Vec<Vec3>,
    animation_time: f32,
    gate: RateGate,
}

impl GlassKnot {
    fn new(cap_hz: f32) -> Self {
        let base_points = (0..KNOT_SAMPLES)
            .map(|i| torus_knot_point(i as f32 / KNOT_SAMPLES as f32 * KNOT_WINDINGS * TAU))
            .collect();
        Self {
            base_points,
            animation_time: 0.0,
            gate: RateGate::with_cap_hz(cap_hz),
        }
    }
}

impl Element for GlassKnot {
    fn advance(&mut self, ctx: &TickContext) -> bool {
        if !self.gate.admit(ctx.elapsed) {
            return false;
        }
        self.animation_time = ctx.elapsed;
        true
    }

    fn draw(&self, canvas: &mut Canvas<'_>) {
        let t = self.animation_time;
        let drift = Mat3::from_rotation_y((t * FLOAT_RATE).sin() * FLOAT_TILT)
            * Mat3::from_rotation_x((t * FLOAT_RATE).cos() * FLOAT_TILT);
        let bob = Vec3::new(0.0, (t * FLOAT_RATE).sin() * FLOAT_BOB, 0.0);
        let spin =
            Mat3::from_rotation_y(t * KNOT_SPIN_Y) * Mat3::from_rotation_x(t * KNOT_SPIN_X);

        for base in &self.base_points {
            let world = drift * (spin * *base) + bob;
            if let Some(projected) = canvas.project(world) {
                let radius = ((KNOT_TUBE * projected.scale).round() as i32).max(1);
                canvas.draw_disc(
                    projected.x.round() as i32,
                    projected.y.round() as i32,
                    radius,
                    side_lit_glass(world.x),
                );
            }
        }

        // The core is a sibling of the knot, so only the float drift moves it.
        let orbit = t * CORE_ORBIT_RATE;
        let core_world = drift
            * Vec3::new(
                orbit.sin() * CORE_ORBIT_RADIUS,
                orbit.cos() * CORE_ORBIT_RADIUS,
                0.0,
            )
            + bob;
        if let Some(projected) = canvas.project(core_world) {
            let cx = projected.x.round() as i32;
            let cy = projected.y.round() as i32;
            let halo = ((CORE_RADIUS * projected.scale * 1.8).round() as i32).max(2);
            let hot = ((CORE_RADIUS * projected.scale * 0.6).round() as i32).max(1);
            canvas.draw_soft_disc(cx, cy, halo, CORE_HALO_MAGENTA);
            canvas.draw_disc(cx, cy, hot, CORE_WHITE_HOT);
        }
    }
}

/// Wall-clock readout floating above the knot, refreshed once per second
/// and drawn on the overlay layer so the digits stay crisp.
struct ClockOverlay {
    text: String,
    gate: RateGate,
}

impl ClockOverlay {
    fn new() -> Self {
        Self {
            text: String::new(),
            gate: RateGate::with_cap_hz(CLOCK_REFRESH_HZ),
        }
    }
}

impl Element for ClockOverlay {
    fn advance(&mut self, ctx: &TickContext) -> bool {
        if !self.gate.admit(ctx.elapsed) {
            return false;
        }
        let now = Local::now();
        self.text = format_clock(now.hour(), now.minute());
        true
    }

    fn draw(&self, _canvas: &mut Canvas<'_>) {}

    fn draw_overlay(&self, canvas: &mut Canvas<'_>) {
        if self.text.is_empty() {
            return;
        }
        if let Some(projected) = canvas.project(CLOCK_ANCHOR) {
            let pixel_scale = (canvas.height() as i32 / 60).max(4);
            let width = clock_text_width_px(&self.text, pixel_scale);
            let left = projected.x.round() as i32 - width / 2;
            let top = projected.y.round() as i32 - (DIGIT_GLYPH_HEIGHT * pixel_scale) / 2;
            draw_clock_text(canvas, &self.text, left, top, pixel_scale, CLOCK_WHITE);
        }
    }
}

fn build_elements(config: &SceneConfig) -> ElementSet {
    let cap_hz = if config.constrained_profile {
        config.element_rate_cap_hz
    } else {
        0.0
    };

    let mut elements = ElementSet::new();
    for index in 0..config.rain_count {
        elements.push(Box::new(RainStreak::new(index, cap_hz)));
    }
    if !config.words.is_empty() {
        for index in 0..config.word_count {
            elements.push(Box::new(FallingWord::new(index, cap_hz, &config.words)));
        }
    }
    elements.push(Box::new(GlassKnot::new(cap_hz)));
    elements.push(Box::new(ClockOverlay::new()));
    elements
}

/// Layout seeding without an RNG: a small integer mix keyed by element
/// index and parameter lane, mapped into [0, 1).
fn hash01(index: u32, lane: u32) -> f32 {
    let mut x = index.wrapping_mul(0x9E37_79B9) ^ lane.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    (x >> 8) as f32 / 16_777_216.0
}

fn pick_word(index: u32, words: &[String]) -> String {
    if words.is_empty() {
        return String::new();
    }
    let pick = (hash01(index, 11) * words.len() as f32) as usize;
    words[pick.min(words.len() - 1)].clone()
}

/// Center curve of a (2, 3) torus knot, matching the classic
/// parametrization where `u` runs over the knot's full winding range.
fn torus_knot_point(u: f32) -> Vec3 {
    let twist = KNOT_TWISTS / KNOT_WINDINGS * u;
    let ring = 2.0 + twist.cos();
    Vec3::new(
        KNOT_RADIUS * ring * 0.5 * u.cos(),
        KNOT_RADIUS * ring * 0.5 * u.sin(),
        KNOT_RADIUS * twist.sin() * 0.5,
    )
}

/// Glass tint for the knot tube: the magenta key light sits on +x and
/// the cyan one on -x, so samples lean toward the nearer light.
fn side_lit_glass(world_x: f32) -> [u8; 4] {
    let side = (world_x / 3.0).clamp(-1.0, 1.0);
    let toward_magenta = side.max(0.0);
    let toward_cyan = (-side).max(0.0);
    [
        (255.0 - toward_cyan * 110.0) as u8,
        (255.0 - toward_magenta * 110.0) as u8,
        255,
        GLASS_ALPHA,
    ]
}

fn format_clock(hour: u32, minute: u32) -> String {
    format!("{hour:02}:{minute:02}")
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Some(value) = env::var(CONFIG_ENV_VAR).ok().filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(value));
    }
    env::args().nth(1).map(PathBuf::from)
}

fn load_config(path: &Path) -> Result<SceneConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_json(&raw)
}

fn parse_config_json(raw: &str) -> Result<SceneConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, SceneConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let json_path = match error.path().to_string() {
                path if path.is_empty() || path == "." => "config root".to_string(),
                path => path,
            };
            Err(ConfigError::Parse {
                json_path,
                source: error.into_inner(),
            })
        }
    }
}

fn main() {
    init_tracing();
    info!("=== Backdrop Startup ===");

    let scene_config = match resolve_config_path() {
        Some(path) => match load_config(&path) {
            Ok(config) => {
                info!(path = %path.display(), "config_loaded");
                config
            }
            Err(error) => {
                error!(error = %error, path = %path.display(), "config_load_failed");
                std::process::exit(1);
            }
        },
        None => SceneConfig::default(),
    };

    let elements = build_elements(&scene_config);
    let config = LoopConfig {
        window_title: scene_config.window_title.clone(),
        window_width: scene_config.window_width,
        window_height: scene_config.window_height,
        idle_window: Duration::from_secs(scene_config.idle_window_secs),
        pixel_ratio_range: PixelRatioRange {
            min: scene_config.pixel_ratio_min,
            max: scene_config.pixel_ratio_max,
        },
        constrained_profile: scene_config.constrained_profile,
        perf: PerfMonitorConfig {
            lower_fps: scene_config.perf.lower_fps,
            upper_fps: scene_config.perf.upper_fps,
            flipflop_limit: scene_config.perf.flipflop_limit,
            ..PerfMonitorConfig::default()
        },
        effects: scene_config.effects,
        ..LoopConfig::default()
    };

    if let Err(err) = run_app(config, elements) {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop::Camera;

    fn test_canvas(buffer: &mut Vec<u8>, width: u32, height: u32) -> Canvas<'_> {
        buffer.resize((width * height * 4) as usize, 0);
        Canvas::new(buffer, width, height, Camera::default())
    }

    fn lit_pixel_count(buffer: &[u8]) -> usize {
        buffer.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    #[test]
    fn hash01_is_deterministic_and_in_unit_range() {
        for index in 0..1000 {
            let a = hash01(index, 3);
            let b = hash01(index, 3);
            assert_eq!(a, b);
            assert!((0.0..1.0).contains(&a), "out of range at index {index}: {a}");
        }
    }

    #[test]
    fn hash01_lanes_decorrelate() {
        let same_lane_hits = (0..100)
            .filter(|&index| hash01(index, 0) == hash01(index, 1))
            .count();
        assert_eq!(same_lane_hits, 0);
    }

    #[test]
    fn rain_streak_rises_and_wraps() {
        let mut streak = RainStreak::new(7, 0.0);
        streak.position.y = RAIN_WRAP_Y - streak.speed * 0.5;

        let ctx = TickContext {
            elapsed: 0.0,
            frame_dt: 1.0 / 60.0,
            low_performance: false,
        };
        assert!(streak.advance(&ctx));
        assert_eq!(streak.position.y, -RAIN_WRAP_Y);
    }

    #[test]
    fn rain_streak_seeds_inside_the_layout_volume() {
        for index in 0..100 {
            let streak = RainStreak::new(index, 0.0);
            assert!(streak.position.x.abs() <= RAIN_SPREAD * 0.5);
            assert!(streak.position.y.abs() <= RAIN_SPREAD * 0.5);
            assert!(streak.position.z >= RAIN_DEPTH_NEAREST - RAIN_DEPTH_SPREAD);
            assert!(streak.position.z <= RAIN_DEPTH_NEAREST);
            assert!(streak.speed >= RAIN_SPEED_BASE);
            assert!(streak.speed <= RAIN_SPEED_BASE + RAIN_SPEED_SPREAD);
        }
    }

    #[test]
    fn falling_word_descends_and_wraps() {
        let words = SceneConfig::default().words;
        let mut word = FallingWord::new(3, 0.0, &words);
        word.position.y = -WORD_WRAP_Y + word.speed * 0.5;

        let ctx = TickContext {
            elapsed: 0.0,
            frame_dt: 1.0 / 60.0,
            low_performance: false,
        };
        assert!(word.advance(&ctx));
        assert_eq!(word.position.y, WORD_WRAP_Y);
    }

    #[test]
    fn word_choice_is_stable_per_index() {
        let words = SceneConfig::default().words;
        for index in 0..50 {
            let first = FallingWord::new(index, 0.0, &words);
            let second = FallingWord::new(index, 0.0, &words);
            assert_eq!(first.word, second.word);
            assert!(KOREAN_WORDS.contains(&first.word.as_str()));
        }
    }

    #[test]
    fn rate_cap_skips_fast_repeat_ticks() {
        let mut streak = RainStreak::new(0, 30.0);
        let tick = |elapsed| TickContext {
            elapsed,
            frame_dt: 1.0 / 120.0,
            low_performance: false,
        };

        assert!(streak.advance(&tick(0.0)));
        assert!(!streak.advance(&tick(0.01)));
        assert!(!streak.advance(&tick(0.02)));
        assert!(streak.advance(&tick(0.04)));
    }

    #[test]
    fn torus_knot_curve_starts_on_the_outer_ring() {
        let start = torus_knot_point(0.0);
        assert!((start.x - KNOT_RADIUS * 1.5).abs() < 1e-5);
        assert!(start.y.abs() < 1e-5);
        assert!(start.z.abs() < 1e-5);
    }

    #[test]
    fn torus_knot_samples_stay_bounded() {
        let knot = GlassKnot::new(0.0);
        assert_eq!(knot.base_points.len(), KNOT_SAMPLES as usize);
        for point in &knot.base_points {
            assert!(point.x.abs() <= KNOT_RADIUS * 1.5 + 1e-4);
            assert!(point.y.abs() <= KNOT_RADIUS * 1.5 + 1e-4);
            assert!(point.z.abs() <= KNOT_RADIUS * 0.5 + 1e-4);
        }
    }

    #[test]
    fn side_lit_glass_tints_toward_the_key_lights() {
        let magenta_side = side_lit_glass(3.0);
        let cyan_side = side_lit_glass(-3.0);
        let center = side_lit_glass(0.0);

        assert!(magenta_side[1] < center[1]);
        assert_eq!(magenta_side[0], 255);
        assert!(cyan_side[0] < center[0]);
        assert_eq!(cyan_side[1], 255);
        assert_eq!(center, [255, 255, 255, GLASS_ALPHA]);
    }

    #[test]
    fn format_clock_pads_single_digits() {
        assert_eq!(format_clock(7, 5), "07:05");
        assert_eq!(format_clock(23, 59), "23:59");
        assert_eq!(format_clock(0, 0), "00:00");
    }

    #[test]
    fn rain_streak_draws_into_the_frame() {
        let mut streak = RainStreak::new(0, 0.0);
        streak.position = Vec3::new(0.0, 0.0, 0.0);

        let mut buffer = Vec::new();
        let mut canvas = test_canvas(&mut buffer, 160, 90);
        streak.draw(&mut canvas);

        assert!(lit_pixel_count(&buffer) > 0);
    }

    #[test]
    fn glass_knot_draws_a_visible_body() {
        let knot = GlassKnot::new(0.0);

        let mut buffer = Vec::new();
        let mut canvas = test_canvas(&mut buffer, 160, 90);
        knot.draw(&mut canvas);

        assert!(lit_pixel_count(&buffer) > 100);
    }

    #[test]
    fn clock_overlay_draws_only_after_a_refresh() {
        let mut clock = ClockOverlay::new();

        let mut buffer = Vec::new();
        let mut canvas = test_canvas(&mut buffer, 320, 180);
        clock.draw_overlay(&mut canvas);
        assert_eq!(lit_pixel_count(&buffer), 0);

        clock.text = "12:34".to_string();
        let mut canvas = test_canvas(&mut buffer, 320, 180);
        clock.draw_overlay(&mut canvas);
        assert!(lit_pixel_count(&buffer) > 20);
    }

    #[test]
    fn falling_word_overlay_draws_glyphs_and_halo() {
        let words = SceneConfig::default().words;
        let mut word = FallingWord::new(1, 0.0, &words);
        word.position = Vec3::new(0.0, 0.0, WORD_DEPTH_Z);

        let mut buffer = Vec::new();
        let mut canvas = test_canvas(&mut buffer, 320, 180);
        word.draw_overlay(&mut canvas);

        assert!(lit_pixel_count(&buffer) > 50);
    }

    #[test]
    fn build_elements_counts_match_config() {
        let config = SceneConfig::default();
        let elements = build_elements(&config);
        // rain + words + knot + clock
        assert_eq!(
            elements.len(),
            (config.rain_count + config.word_count) as usize + 2
        );
    }

    #[test]
    fn build_elements_skips_words_when_the_list_is_empty() {
        let config = SceneConfig {
            words: Vec::new(),
            ..SceneConfig::default()
        };
        let elements = build_elements(&config);
        assert_eq!(elements.len(), config.rain_count as usize + 2);
    }

    #[test]
    fn custom_word_list_replaces_the_default_one() {
        let words = vec!["서울".to_string(), "네온".to_string()];
        for index in 0..20 {
            let word = FallingWord::new(index, 0.0, &words);
            assert!(words.contains(&word.word));
        }
    }

    #[test]
    fn default_config_matches_the_shipped_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.rain_count, 100);
        assert_eq!(config.word_count, 15);
        assert_eq!(config.idle_window_secs, 30);
        assert_eq!(config.pixel_ratio_min, 1.0);
        assert_eq!(config.pixel_ratio_max, 1.5);
        assert!(!config.constrained_profile);
        assert_eq!(config.element_rate_cap_hz, 30.0);
        assert_eq!(config.perf.flipflop_limit, 3);
    }

    #[test]
    fn partial_config_json_keeps_defaults_for_the_rest() {
        let config = parse_config_json(r#"{"rain_count": 5, "constrained_profile": true}"#)
            .expect("parse");
        assert_eq!(config.rain_count, 5);
        assert!(config.constrained_profile);
        assert_eq!(config.word_count, 15);
        assert_eq!(config.perf.lower_fps, 50.0);
    }

    #[test]
    fn config_parse_error_names_the_field_path() {
        let error = parse_config_json(r#"{"effects": {"bloom": {"intensity": "high"}}}"#)
            .expect_err("must fail");
        let message = error.to_string();
        assert!(
            message.contains("effects.bloom.intensity"),
            "unexpected error: {message}"
        );
    }

    #[test]
    fn config_parse_error_at_the_root_reads_cleanly() {
        let error = parse_config_json("not json").expect_err("must fail");
        let message = error.to_string();
        assert!(message.contains("config root"), "unexpected error: {message}");
    }

    #[test]
    fn load_config_reads_a_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("backdrop.json");
        fs::write(&path, r#"{"window_title": "Test Backdrop"}"#).expect("write config");

        let config = load_config(&path).expect("load");
        assert_eq!(config.window_title, "Test Backdrop");
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");

        let error = load_config(&path).expect_err("must fail");
        let message = error.to_string();
        assert!(
            message.contains("failed to read config"),
            "unexpected error: {message}"
        );
    }
}
