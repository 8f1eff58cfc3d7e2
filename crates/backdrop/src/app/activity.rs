use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::input::{ActivityEvent, ListenerId, ListenersHandle, WINDOW_LISTENER_OPTIONS};

pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_secs(30);
pub const DEFAULT_PIXEL_RATIO_RANGE: PixelRatioRange = PixelRatioRange { min: 1.0, max: 1.5 };

/// Whether the renderer redraws every event-loop turn or only on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frameloop {
    Always,
    Demand,
}

/// Resolution scaling bounds handed to the renderer. The renderer picks the
/// maximum in normal operation and the minimum in degraded-quality mode.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PixelRatioRange {
    pub min: f32,
    pub max: f32,
}

impl Default for PixelRatioRange {
    fn default() -> Self {
        DEFAULT_PIXEL_RATIO_RANGE
    }
}

#[derive(Debug, Clone)]
pub struct ActivityConfig {
    pub idle_window: Duration,
    pub pixel_ratio_range: PixelRatioRange,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            idle_window: DEFAULT_IDLE_WINDOW,
            pixel_ratio_range: DEFAULT_PIXEL_RATIO_RANGE,
        }
    }
}

/// Owns the render-activity state: whether the scene runs at full framerate,
/// whether degraded-quality mode is engaged, and the pending idle deadline.
///
/// Input events and performance verdicts feed in through the methods below;
/// everything else only reads the resulting flags. Activity never touches
/// `low_performance`, and performance verdicts never touch `is_active` or
/// the idle deadline.
#[derive(Debug)]
pub struct ActivityController {
    is_active: bool,
    low_performance: bool,
    pixel_ratio_range: PixelRatioRange,
    idle_window: Duration,
    idle_deadline: Option<Instant>,
    listeners: ListenersHandle,
    listener_ids: Vec<ListenerId>,
}

impl ActivityController {
    /// Attaches the qualifying-event listeners and starts active with the
    /// idle countdown armed, as if the mount itself were the first activity.
    pub fn new(config: ActivityConfig, listeners: &ListenersHandle, now: Instant) -> Self {
        let listener_ids = ActivityEvent::ALL
            .iter()
            .map(|kind| listeners.attach(*kind, WINDOW_LISTENER_OPTIONS))
            .collect();

        Self {
            is_active: true,
            low_performance: false,
            pixel_ratio_range: config.pixel_ratio_range,
            idle_window: config.idle_window,
            idle_deadline: Some(now + config.idle_window),
            listeners: listeners.clone(),
            listener_ids,
        }
    }

    /// Records one qualifying input event. Idempotent; safe to call many
    /// times per second. Always re-arms the idle countdown to a full window.
    ///
    /// Returns `true` when this event woke the scene from idle, in which
    /// case the caller must issue one forced redraw immediately so the
    /// resumed frame is not stale. While already active it returns `false`;
    /// no redraw beyond the continuous frameloop is needed.
    #[must_use]
    pub fn record_activity(&mut self, now: Instant) -> bool {
        if self.listener_ids.is_empty() {
            // Torn down; a late event must not reanimate the scene.
            debug!("activity_after_teardown_ignored");
            return false;
        }

        let woke_from_idle = !self.is_active;
        self.is_active = true;
        self.idle_deadline = Some(now + self.idle_window);
        if woke_from_idle {
            info!("scene_resumed");
        }
        woke_from_idle
    }

    /// Deadline check, called once per event-loop turn. Returns `true` at
    /// the turn where the quiet interval elapsed and the scene went idle.
    pub fn poll_idle(&mut self, now: Instant) -> bool {
        match self.idle_deadline {
            Some(deadline) if now >= deadline => {
                self.idle_deadline = None;
                self.is_active = false;
                info!(
                    idle_window_ms = self.idle_window.as_millis() as u64,
                    "scene_idle"
                );
                true
            }
            _ => false,
        }
    }

    pub fn on_performance_decline(&mut self) {
        if !self.low_performance {
            info!(verdict = "decline", "degraded_quality_engaged");
        }
        self.low_performance = true;
    }

    pub fn on_performance_improve(&mut self) {
        if self.low_performance {
            info!(verdict = "incline", "degraded_quality_cleared");
        }
        self.low_performance = false;
    }

    /// The monitor reports the renderer is pinned at its lowest tier.
    /// Treated the same as a decline.
    pub fn on_performance_fallback(&mut self) {
        if !self.low_performance {
            info!(verdict = "fallback", "degraded_quality_engaged");
        }
        self.low_performance = true;
    }

    pub fn frameloop(&self) -> Frameloop {
        if self.is_active {
            Frameloop::Always
        } else {
            Frameloop::Demand
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn low_performance(&self) -> bool {
        self.low_performance
    }

    pub fn pixel_ratio_range(&self) -> PixelRatioRange {
        self.pixel_ratio_range
    }

    /// The ratio the renderer should use right now, picked from the range.
    pub fn pixel_ratio(&self) -> f32 {
        if self.low_performance {
            self.pixel_ratio_range.min
        } else {
            self.pixel_ratio_range.max
        }
    }

    pub fn idle_deadline_pending(&self) -> bool {
        self.idle_deadline.is_some()
    }

    /// Cancels the pending deadline and detaches all listeners. Idempotent.
    pub fn teardown(&mut self) {
        self.idle_deadline = None;
        self.release_listeners();
    }

    fn release_listeners(&mut self) {
        for id in self.listener_ids.drain(..) {
            self.listeners.detach(id, WINDOW_LISTENER_OPTIONS);
        }
    }
}

impl Drop for ActivityController {
    fn drop(&mut self) {
        if !self.listener_ids.is_empty() {
            warn!("activity_controller_dropped_without_teardown");
            self.idle_deadline = None;
            self.release_listeners();
        }
    }
}
