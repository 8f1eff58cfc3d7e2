//! Runtime core for the ambient backdrop: the activity controller that
//! pauses and resumes the scene, the software renderer with its effects
//! chain, and the winit event loop that ties them together.

mod activity;
mod elements;
mod input;
mod loop_runner;
mod metrics;
mod perf_monitor;
mod rendering;
mod tools;

pub use activity::{ActivityConfig, ActivityController, Frameloop, PixelRatioRange};
pub use elements::{Element, ElementSet, RateGate, TickContext};
pub use input::{
    ActivityEvent, ListenerId, ListenerOptions, ListenersHandle, WINDOW_LISTENER_OPTIONS,
};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use perf_monitor::{PerfMonitor, PerfMonitorConfig, PerfVerdict};
pub use rendering::{
    project, BloomSettings, Camera, Canvas, ChromaticAberrationSettings, EffectsConfig,
    NoiseSettings, ProjectedPoint, Renderer, Viewport, VignetteSettings,
};
pub use tools::{
    clock_text_width_px, draw_clock_text, draw_hangul_text, hangul_text_width_px,
    DIGIT_GLYPH_HEIGHT, DIGIT_GLYPH_WIDTH, HANGUL_GLYPH_SIZE,
};
