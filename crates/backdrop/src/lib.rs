//! Backdrop is a small runtime for ambient animated scenes rendered into a
//! window-sized pixel buffer. It owns the event loop, an activity controller
//! that idles the scene when input stops, an adaptive-resolution software
//! renderer with a post-effects chain, and the traits scene crates implement
//! to plug their animated elements in.

pub mod app;

pub use app::{
    clock_text_width_px, draw_clock_text, draw_hangul_text, hangul_text_width_px, project, run_app,
    run_app_with_metrics, ActivityConfig, ActivityController, ActivityEvent, AppError,
    BloomSettings, Camera, Canvas, ChromaticAberrationSettings, EffectsConfig, Element, ElementSet,
    Frameloop, ListenerId, ListenerOptions, ListenersHandle, LoopConfig, LoopMetricsSnapshot,
    MetricsHandle, NoiseSettings, PerfMonitor, PerfMonitorConfig, PerfVerdict, PixelRatioRange,
    ProjectedPoint, RateGate, Renderer, TickContext, Viewport, VignetteSettings,
    DIGIT_GLYPH_HEIGHT, DIGIT_GLYPH_WIDTH, HANGUL_GLYPH_SIZE, SLOW_FRAME_ENV_VAR,
    WINDOW_LISTENER_OPTIONS,
};
