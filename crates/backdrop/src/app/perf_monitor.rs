use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_LOWER_FPS: f32 = 50.0;
pub const DEFAULT_UPPER_FPS: f32 = 90.0;
pub const DEFAULT_EVAL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_FLIPFLOP_LIMIT: u32 = 3;

/// Coarse frame-rate trend signal. Consumers react to the verdict, never to
/// raw FPS numbers; the thresholds live entirely in this monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfVerdict {
    Decline,
    Incline,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct PerfMonitorConfig {
    pub lower_fps: f32,
    pub upper_fps: f32,
    pub eval_interval: Duration,
    pub flipflop_limit: u32,
}

impl Default for PerfMonitorConfig {
    fn default() -> Self {
        Self {
            lower_fps: DEFAULT_LOWER_FPS,
            upper_fps: DEFAULT_UPPER_FPS,
            eval_interval: DEFAULT_EVAL_INTERVAL,
            flipflop_limit: DEFAULT_FLIPFLOP_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Stable,
    Declined,
}

/// Samples rendered-frame cadence over fixed intervals and emits verdicts
/// when the measured rate crosses the configured bounds. The band between
/// the bounds is hysteresis: no verdict fires inside it.
///
/// Oscillation between the tiers counts flip-flops; past the limit the
/// monitor emits one `Fallback` and locks, pinning the floor tier.
#[derive(Debug)]
pub struct PerfMonitor {
    config: PerfMonitorConfig,
    interval_start: Option<Instant>,
    frames: u32,
    tier: Tier,
    flips: u32,
    locked: bool,
}

impl PerfMonitor {
    pub fn new(config: PerfMonitorConfig) -> Self {
        Self {
            config,
            interval_start: None,
            frames: 0,
            tier: Tier::Stable,
            flips: 0,
            locked: false,
        }
    }

    /// Records one rendered frame. The first frame after construction or
    /// after `note_idle` only anchors the measurement interval; verdicts
    /// can fire once a full interval of frames has accumulated.
    pub fn record_frame(&mut self, now: Instant) -> Option<PerfVerdict> {
        if self.locked {
            return None;
        }

        let Some(start) = self.interval_start else {
            self.interval_start = Some(now);
            self.frames = 0;
            return None;
        };

        self.frames = self.frames.saturating_add(1);
        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.config.eval_interval {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32().max(f32::EPSILON);
        self.interval_start = Some(now);
        self.frames = 0;
        self.evaluate(fps)
    }

    /// Discards the partial interval. Called when the scene goes idle so
    /// the redraw gap is not misread as a frame-rate collapse on resume.
    pub fn note_idle(&mut self) {
        self.interval_start = None;
        self.frames = 0;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn evaluate(&mut self, fps: f32) -> Option<PerfVerdict> {
        match self.tier {
            Tier::Stable if fps < self.config.lower_fps => {
                self.flips = self.flips.saturating_add(1);
                if self.flips > self.config.flipflop_limit {
                    self.locked = true;
                    debug!(fps, flips = self.flips, "perf_monitor_fallback_locked");
                    return Some(PerfVerdict::Fallback);
                }
                self.tier = Tier::Declined;
                debug!(fps, "perf_monitor_decline");
                Some(PerfVerdict::Decline)
            }
            Tier::Declined if fps > self.config.upper_fps => {
                self.flips = self.flips.saturating_add(1);
                if self.flips > self.config.flipflop_limit {
                    self.locked = true;
                    debug!(fps, flips = self.flips, "perf_monitor_fallback_locked");
                    return Some(PerfVerdict::Fallback);
                }
                self.tier = Tier::Stable;
                debug!(fps, "perf_monitor_incline");
                Some(PerfVerdict::Incline)
            }
            _ => None,
        }
    }
}

impl Default for PerfMonitor {
    fn default() -> Self {
        Self::new(PerfMonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds `frames` evenly spaced frames and collects every verdict.
    fn drive(
        monitor: &mut PerfMonitor,
        start: Instant,
        frame_dt: Duration,
        frames: u32,
    ) -> (Vec<PerfVerdict>, Instant) {
        let mut verdicts = Vec::new();
        let mut now = start;
        for _ in 0..frames {
            now += frame_dt;
            if let Some(verdict) = monitor.record_frame(now) {
                verdicts.push(verdict);
            }
        }
        (verdicts, now)
    }

    fn frame_dt_for_fps(fps: f64) -> Duration {
        Duration::from_secs_f64(1.0 / fps)
    }

    #[test]
    fn steady_frame_rate_inside_band_emits_nothing() {
        let mut monitor = PerfMonitor::default();
        let (verdicts, _) = drive(
            &mut monitor,
            Instant::now(),
            frame_dt_for_fps(60.0),
            240,
        );
        assert!(verdicts.is_empty());
    }

    #[test]
    fn frame_rate_below_lower_bound_declines_once() {
        let mut monitor = PerfMonitor::default();
        let (verdicts, _) = drive(
            &mut monitor,
            Instant::now(),
            frame_dt_for_fps(30.0),
            120,
        );
        assert_eq!(verdicts, vec![PerfVerdict::Decline]);
    }

    #[test]
    fn recovery_above_upper_bound_inclines() {
        let mut monitor = PerfMonitor::default();
        let base = Instant::now();

        let (slow, reached) = drive(&mut monitor, base, frame_dt_for_fps(30.0), 40);
        assert_eq!(slow, vec![PerfVerdict::Decline]);

        let (fast, _) = drive(&mut monitor, reached, frame_dt_for_fps(120.0), 240);
        assert_eq!(fast, vec![PerfVerdict::Incline]);
    }

    #[test]
    fn recovery_into_the_hysteresis_band_stays_declined() {
        let mut monitor = PerfMonitor::default();
        let base = Instant::now();

        let (slow, reached) = drive(&mut monitor, base, frame_dt_for_fps(30.0), 40);
        assert_eq!(slow, vec![PerfVerdict::Decline]);

        // 60 fps is above the lower bound but below the upper bound.
        let (mid, _) = drive(&mut monitor, reached, frame_dt_for_fps(60.0), 240);
        assert!(mid.is_empty());
    }

    #[test]
    fn no_verdict_before_a_full_interval() {
        let mut monitor = PerfMonitor::default();
        // Half a second of terrible frames: still anchoring the interval.
        let (verdicts, _) = drive(&mut monitor, Instant::now(), frame_dt_for_fps(10.0), 5);
        assert!(verdicts.is_empty());
    }

    #[test]
    fn oscillation_past_the_limit_falls_back_once_then_locks() {
        let mut monitor = PerfMonitor::default();
        let mut now = Instant::now();
        let mut verdicts = Vec::new();

        for _ in 0..6 {
            let (slow, reached) = drive(&mut monitor, now, frame_dt_for_fps(30.0), 40);
            verdicts.extend(slow);
            let (fast, reached) = drive(&mut monitor, reached, frame_dt_for_fps(120.0), 150);
            verdicts.extend(fast);
            now = reached;
        }

        assert_eq!(
            verdicts,
            vec![
                PerfVerdict::Decline,
                PerfVerdict::Incline,
                PerfVerdict::Decline,
                PerfVerdict::Fallback,
            ]
        );
        assert!(monitor.is_locked());
    }

    #[test]
    fn locked_monitor_stays_silent() {
        let mut config = PerfMonitorConfig::default();
        config.flipflop_limit = 0;
        let mut monitor = PerfMonitor::new(config);
        let base = Instant::now();

        let (verdicts, reached) = drive(&mut monitor, base, frame_dt_for_fps(30.0), 40);
        assert_eq!(verdicts, vec![PerfVerdict::Fallback]);

        let (after, _) = drive(&mut monitor, reached, frame_dt_for_fps(120.0), 300);
        assert!(after.is_empty());
    }

    #[test]
    fn idle_gap_is_not_misread_as_a_collapse() {
        let mut monitor = PerfMonitor::default();
        let base = Instant::now();

        let (verdicts, reached) = drive(&mut monitor, base, frame_dt_for_fps(60.0), 30);
        assert!(verdicts.is_empty());

        monitor.note_idle();

        // Resume half a minute later at a healthy rate. Without the reset,
        // the 30 s gap would read as fps near zero.
        let resumed = reached + Duration::from_secs(30);
        let (after, _) = drive(&mut monitor, resumed, frame_dt_for_fps(60.0), 120);
        assert!(after.is_empty());
    }
}
