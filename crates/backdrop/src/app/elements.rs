use super::rendering::Canvas;

/// Per-tick inputs supplied to every animated element.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    /// Seconds since the scene mounted. Keeps running while idle, so
    /// elapsed-driven animation resumes at the current phase after a wake.
    pub elapsed: f32,
    /// Clamped seconds since the previous rendered frame.
    pub frame_dt: f32,
    /// Advisory degraded-quality flag; elements pick cheaper paths.
    pub low_performance: bool,
}

/// One animated decorative element. The loop pulls `advance` once per tick
/// through the scheduling shim; the element owns its position math and its
/// own rate gate, and draws itself with the canvas primitives.
pub trait Element {
    /// Advances the animation by one tick. Returns whether the update was
    /// admitted (a rate-gated element may skip early invocations).
    fn advance(&mut self, ctx: &TickContext) -> bool;

    /// Draws into the scene layer, before the effect chain runs.
    fn draw(&self, canvas: &mut Canvas<'_>);

    /// Draws into the overlay layer, after the effect chain. Most elements
    /// have no overlay presence.
    fn draw_overlay(&self, _canvas: &mut Canvas<'_>) {}
}

/// Thin scheduling shim: walks the mounted elements once per tick and
/// totals the admitted updates for the loop's metrics.
#[derive(Default)]
pub struct ElementSet {
    elements: Vec<Box<dyn Element>>,
}

impl ElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Box<dyn Element>) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn advance_all(&mut self, ctx: &TickContext) -> u32 {
        let mut admitted = 0u32;
        for element in &mut self.elements {
            if element.advance(ctx) {
                admitted = admitted.saturating_add(1);
            }
        }
        admitted
    }

    pub fn draw_all(&self, canvas: &mut Canvas<'_>) {
        for element in &self.elements {
            element.draw(canvas);
        }
    }

    pub fn draw_overlay_all(&self, canvas: &mut Canvas<'_>) {
        for element in &self.elements {
            element.draw_overlay(canvas);
        }
    }
}

/// Per-element self-throttle: admits an update only when enough supplied
/// elapsed time has passed since the last admitted one. A zero cap admits
/// everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateGate {
    min_interval: f32,
    last_admitted: Option<f32>,
}

impl RateGate {
    pub fn uncapped() -> Self {
        Self::default()
    }

    pub fn with_cap_hz(cap_hz: f32) -> Self {
        let min_interval = if cap_hz > 0.0 { 1.0 / cap_hz } else { 0.0 };
        Self {
            min_interval,
            last_admitted: None,
        }
    }

    pub fn admit(&mut self, elapsed: f32) -> bool {
        if self.min_interval <= 0.0 {
            return true;
        }
        match self.last_admitted {
            Some(last) if elapsed - last < self.min_interval => false,
            _ => {
                self.last_admitted = Some(elapsed);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingElement {
        gate: RateGate,
        advances: u32,
    }

    impl CountingElement {
        fn new(gate: RateGate) -> Self {
            Self { gate, advances: 0 }
        }
    }

    impl Element for CountingElement {
        fn advance(&mut self, ctx: &TickContext) -> bool {
            if !self.gate.admit(ctx.elapsed) {
                return false;
            }
            self.advances += 1;
            true
        }

        fn draw(&self, _canvas: &mut Canvas<'_>) {}
    }

    fn tick(elapsed: f32) -> TickContext {
        TickContext {
            elapsed,
            frame_dt: 1.0 / 60.0,
            low_performance: false,
        }
    }

    #[test]
    fn uncapped_gate_admits_every_update() {
        let mut gate = RateGate::uncapped();
        for step in 0..10 {
            assert!(gate.admit(step as f32 * 0.001));
        }
    }

    #[test]
    fn capped_gate_skips_early_invocations() {
        let mut gate = RateGate::with_cap_hz(30.0);

        assert!(gate.admit(0.0));
        assert!(!gate.admit(0.010));
        assert!(!gate.admit(0.032));
        assert!(gate.admit(0.034));
        assert!(!gate.admit(0.050));
    }

    #[test]
    fn thirty_hz_cap_admits_at_most_thirty_one_updates_per_second() {
        let mut gate = RateGate::with_cap_hz(30.0);
        let mut admitted = 0u32;

        // 240 invocations over one second, as a 240 Hz display would issue.
        for step in 0..240 {
            if gate.admit(step as f32 / 240.0) {
                admitted += 1;
            }
        }
        assert!(admitted <= 31, "admitted {admitted}");
        assert!(admitted >= 29, "admitted {admitted}");
    }

    #[test]
    fn zero_cap_hz_means_uncapped() {
        let mut gate = RateGate::with_cap_hz(0.0);
        assert!(gate.admit(0.0));
        assert!(gate.admit(0.0001));
    }

    #[test]
    fn element_set_totals_admitted_updates() {
        let mut set = ElementSet::new();
        set.push(Box::new(CountingElement::new(RateGate::uncapped())));
        set.push(Box::new(CountingElement::new(RateGate::with_cap_hz(30.0))));

        let first = set.advance_all(&tick(0.0));
        let second = set.advance_all(&tick(0.005));

        // Both admit on the first tick; only the uncapped element admits
        // 5 ms later.
        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_set_advances_nothing() {
        let mut set = ElementSet::new();
        assert!(set.is_empty());
        assert_eq!(set.advance_all(&tick(0.0)), 0);
    }
}
