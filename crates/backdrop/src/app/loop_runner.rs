use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::activity::DEFAULT_IDLE_WINDOW;
use super::input::{touch_activity, ActivityEvent, PointerButtonState};
use super::metrics::MetricsAccumulator;
use super::perf_monitor::{PerfMonitor, PerfMonitorConfig, PerfVerdict};
use super::{
    ActivityConfig, ActivityController, Camera, EffectsConfig, ElementSet, Frameloop,
    ListenersHandle, MetricsHandle, PixelRatioRange, Renderer, TickContext,
};

pub const SLOW_FRAME_ENV_VAR: &str = "BACKDROP_SLOW_FRAME_MS";

const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub idle_window: Duration,
    pub pixel_ratio_range: PixelRatioRange,
    /// Treat the host as a constrained device: the chromatic pass stays off
    /// and the scene may cap its own element update rates.
    pub constrained_profile: bool,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub perf: PerfMonitorConfig,
    pub effects: EffectsConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Backdrop".to_string(),
            window_width: 1280,
            window_height: 720,
            idle_window: DEFAULT_IDLE_WINDOW,
            pixel_ratio_range: PixelRatioRange::default(),
            constrained_profile: false,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            perf: PerfMonitorConfig::default(),
            effects: EffectsConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, elements: ElementSet) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, elements, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut elements: ElementSet,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );

    let idle_window = normalize_non_zero_duration(config.idle_window, DEFAULT_IDLE_WINDOW);
    let listeners = ListenersHandle::default();
    let mut controller = ActivityController::new(
        ActivityConfig {
            idle_window,
            pixel_ratio_range: config.pixel_ratio_range,
        },
        &listeners,
        Instant::now(),
    );
    let mut renderer = Renderer::new(
        Arc::clone(&window),
        Camera::default(),
        controller.pixel_ratio(),
    )
    .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, DEFAULT_MAX_FRAME_DELTA);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let mut perf_monitor = PerfMonitor::new(config.perf);
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut pointer_buttons = PointerButtonState::default();

    info!(
        element_count = elements.len(),
        idle_window_ms = idle_window.as_millis() as u64,
        pixel_ratio_min = controller.pixel_ratio_range().min,
        pixel_ratio_max = controller.pixel_ratio_range().max,
        constrained_profile = config.constrained_profile,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        "loop_config"
    );

    let constrained_profile = config.constrained_profile;
    let effects = config.effects;
    let start_instant = Instant::now();
    let mut last_frame_instant = Instant::now();
    let mut grain_seed = 0u32;
    let window_for_loop = Arc::clone(&window);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                        // Repaint even while idle so the resized surface is not stale.
                        window_for_loop.request_redraw();
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                        window_for_loop.request_redraw();
                    }
                    WindowEvent::CursorMoved { .. } => {
                        note_activity(
                            ActivityEvent::PointerMove,
                            &listeners,
                            &mut controller,
                            &mut metrics_accumulator,
                            &window_for_loop,
                        );
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if let Some(kind) = pointer_buttons.observe(button, state) {
                            note_activity(
                                kind,
                                &listeners,
                                &mut controller,
                                &mut metrics_accumulator,
                                &window_for_loop,
                            );
                        }
                    }
                    WindowEvent::Touch(touch) => {
                        if let Some(kind) = touch_activity(touch.phase) {
                            note_activity(
                                kind,
                                &listeners,
                                &mut controller,
                                &mut metrics_accumulator,
                                &window_for_loop,
                            );
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if escape_pressed(event.physical_key, event.state) {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if slow_frame_delay > Duration::ZERO {
                            // Explicit debug perturbation only; not a frame cap.
                            thread::sleep(slow_frame_delay);
                        }

                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;
                        let frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                        // Elements only animate while the scene is active; an
                        // expose redraw during idle re-presents the frozen state.
                        let admitted = if controller.is_active() {
                            let ctx = TickContext {
                                elapsed: now
                                    .saturating_duration_since(start_instant)
                                    .as_secs_f32(),
                                frame_dt: frame_dt.as_secs_f32(),
                                low_performance: controller.low_performance(),
                            };
                            elements.advance_all(&ctx)
                        } else {
                            0
                        };

                        if let Err(error) = renderer.render_frame(
                            &elements,
                            &effects,
                            controller.low_performance(),
                            constrained_profile,
                            grain_seed,
                        ) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        grain_seed = grain_seed.wrapping_add(1);

                        if controller.is_active() {
                            if let Some(verdict) = perf_monitor.record_frame(now) {
                                match verdict {
                                    PerfVerdict::Decline => controller.on_performance_decline(),
                                    PerfVerdict::Incline => controller.on_performance_improve(),
                                    PerfVerdict::Fallback => controller.on_performance_fallback(),
                                }
                                if let Err(error) =
                                    renderer.set_pixel_ratio(controller.pixel_ratio())
                                {
                                    warn!(error = %error, "renderer_rescale_failed");
                                    window_target.exit();
                                }
                            }

                            metrics_accumulator.record_frame(raw_frame_dt);
                            metrics_accumulator.record_updates(admitted);
                            if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                                metrics_handle.publish(snapshot);
                                info!(
                                    fps = snapshot.fps,
                                    ups = snapshot.ups,
                                    frame_time_ms = snapshot.frame_time_ms,
                                    degraded = controller.low_performance(),
                                    pixel_ratio = renderer.pixel_ratio(),
                                    "loop_metrics"
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                if controller.poll_idle(now) {
                    perf_monitor.note_idle();
                    metrics_accumulator.restart(now);
                }
                match controller.frameloop() {
                    Frameloop::Always => {
                        window_target.set_control_flow(ControlFlow::Poll);
                        window_for_loop.request_redraw();
                    }
                    Frameloop::Demand => {
                        window_target.set_control_flow(ControlFlow::Wait);
                    }
                }
            }
            Event::LoopExiting => {
                controller.teardown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Feeds one qualifying input event through the activity path. A wake out
/// of idle forces the single catch-up redraw itself; the resumed frameloop
/// then keeps redraws flowing.
fn note_activity(
    kind: ActivityEvent,
    listeners: &ListenersHandle,
    controller: &mut ActivityController,
    metrics_accumulator: &mut MetricsAccumulator,
    window: &Window,
) {
    if !listeners.is_attached(kind) {
        return;
    }
    let now = Instant::now();
    if controller.record_activity(now) {
        metrics_accumulator.restart(now);
        window.request_redraw();
    }
}

fn escape_pressed(key: PhysicalKey, state: ElementState) -> bool {
    matches!(key, PhysicalKey::Code(KeyCode::Escape)) && state == ElementState::Pressed
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}
