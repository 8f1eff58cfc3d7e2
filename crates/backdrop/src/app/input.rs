use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::warn;
use winit::event::{ElementState, MouseButton, TouchPhase};

static LISTENER_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_listener_lock_poison_once(operation: &'static str) {
    if LISTENER_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "listener lock poisoned; recovered inner value");
    }
}

/// A user gesture that counts as activity, observed anywhere in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityEvent {
    PointerMove,
    PointerDown,
    TouchStart,
}

impl ActivityEvent {
    pub const ALL: [ActivityEvent; 3] = [
        ActivityEvent::PointerMove,
        ActivityEvent::PointerDown,
        ActivityEvent::TouchStart,
    ];
}

/// Attach-time options that must match at detach time, mirroring the
/// capture/passive pair window-level listeners are registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
}

/// Window-wide listeners observe events regardless of which surface region
/// is under the pointer, and never consume them.
pub const WINDOW_LISTENER_OPTIONS: ListenerOptions = ListenerOptions {
    capture: true,
    passive: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy)]
struct ListenerEntry {
    id: ListenerId,
    kind: ActivityEvent,
    options: ListenerOptions,
}

#[derive(Debug, Default)]
struct ListenerSet {
    next_id: u64,
    entries: Vec<ListenerEntry>,
}

impl ListenerSet {
    fn attach(&mut self, kind: ActivityEvent, options: ListenerOptions) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(ListenerEntry { id, kind, options });
        id
    }

    fn detach(&mut self, id: ListenerId, options: ListenerOptions) -> bool {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        if self.entries[index].options.capture != options.capture {
            warn!(listener_id = id.0, "listener_detach_capture_mismatch");
            return false;
        }
        self.entries.swap_remove(index);
        true
    }

    fn is_attached(&self, kind: ActivityEvent) -> bool {
        self.entries.iter().any(|entry| entry.kind == kind)
    }
}

/// Shared registry of attached activity listeners. The controller attaches
/// its listeners at construction and detaches them at teardown; the live
/// count is observable so leak checks can assert zero after unmount.
#[derive(Clone, Debug)]
pub struct ListenersHandle {
    inner: Arc<RwLock<ListenerSet>>,
}

impl Default for ListenersHandle {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ListenerSet::default())),
        }
    }
}

impl ListenersHandle {
    pub fn attach(&self, kind: ActivityEvent, options: ListenerOptions) -> ListenerId {
        match self.inner.write() {
            Ok(mut guard) => guard.attach(kind, options),
            Err(poisoned) => {
                warn_listener_lock_poison_once("attach");
                poisoned.into_inner().attach(kind, options)
            }
        }
    }

    pub fn detach(&self, id: ListenerId, options: ListenerOptions) -> bool {
        match self.inner.write() {
            Ok(mut guard) => guard.detach(id, options),
            Err(poisoned) => {
                warn_listener_lock_poison_once("detach");
                poisoned.into_inner().detach(id, options)
            }
        }
    }

    pub fn is_attached(&self, kind: ActivityEvent) -> bool {
        match self.inner.read() {
            Ok(guard) => guard.is_attached(kind),
            Err(poisoned) => {
                warn_listener_lock_poison_once("is_attached");
                poisoned.into_inner().is_attached(kind)
            }
        }
    }

    pub fn active_count(&self) -> usize {
        match self.inner.read() {
            Ok(guard) => guard.entries.len(),
            Err(poisoned) => {
                warn_listener_lock_poison_once("active_count");
                poisoned.into_inner().entries.len()
            }
        }
    }
}

/// Maps a mouse-button transition to its qualifying activity event, if any.
/// Any button press counts; releases and auto-repeats do not.
pub(crate) fn pointer_down_activity(
    state: ElementState,
    was_down: bool,
) -> Option<ActivityEvent> {
    if state == ElementState::Pressed && !was_down {
        Some(ActivityEvent::PointerDown)
    } else {
        None
    }
}

/// Maps a touch phase to its qualifying activity event, if any. Only the
/// initial contact qualifies.
pub(crate) fn touch_activity(phase: TouchPhase) -> Option<ActivityEvent> {
    if phase == TouchPhase::Started {
        Some(ActivityEvent::TouchStart)
    } else {
        None
    }
}

/// Tracks per-button held state so repeated press events while a button is
/// already down do not requalify as fresh pointer-down activity.
#[derive(Debug, Default)]
pub(crate) struct PointerButtonState {
    left_is_down: bool,
    right_is_down: bool,
    middle_is_down: bool,
}

impl PointerButtonState {
    pub(crate) fn observe(
        &mut self,
        button: MouseButton,
        state: ElementState,
    ) -> Option<ActivityEvent> {
        let was_down = match button {
            MouseButton::Left => &mut self.left_is_down,
            MouseButton::Right => &mut self.right_is_down,
            MouseButton::Middle => &mut self.middle_is_down,
            _ => return pointer_down_activity(state, false),
        };
        let event = pointer_down_activity(state, *was_down);
        *was_down = state == ElementState::Pressed;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_then_detach_leaves_no_listeners() {
        let handle = ListenersHandle::default();
        let id = handle.attach(ActivityEvent::PointerMove, WINDOW_LISTENER_OPTIONS);

        assert_eq!(handle.active_count(), 1);
        assert!(handle.detach(id, WINDOW_LISTENER_OPTIONS));
        assert_eq!(handle.active_count(), 0);
    }

    #[test]
    fn detach_with_mismatched_capture_leaves_listener_attached() {
        let handle = ListenersHandle::default();
        let id = handle.attach(ActivityEvent::PointerDown, WINDOW_LISTENER_OPTIONS);

        let mismatched = ListenerOptions {
            capture: false,
            passive: true,
        };
        assert!(!handle.detach(id, mismatched));
        assert_eq!(handle.active_count(), 1);
    }

    #[test]
    fn detach_unknown_id_is_a_no_op() {
        let handle = ListenersHandle::default();
        let id = handle.attach(ActivityEvent::TouchStart, WINDOW_LISTENER_OPTIONS);
        assert!(handle.detach(id, WINDOW_LISTENER_OPTIONS));

        assert!(!handle.detach(id, WINDOW_LISTENER_OPTIONS));
        assert_eq!(handle.active_count(), 0);
    }

    #[test]
    fn is_attached_tracks_kinds_independently() {
        let handle = ListenersHandle::default();
        let id = handle.attach(ActivityEvent::PointerMove, WINDOW_LISTENER_OPTIONS);

        assert!(handle.is_attached(ActivityEvent::PointerMove));
        assert!(!handle.is_attached(ActivityEvent::PointerDown));

        handle.detach(id, WINDOW_LISTENER_OPTIONS);
        assert!(!handle.is_attached(ActivityEvent::PointerMove));
    }

    #[test]
    fn press_edge_maps_to_pointer_down() {
        let event = pointer_down_activity(ElementState::Pressed, false);
        assert_eq!(event, Some(ActivityEvent::PointerDown));
    }

    #[test]
    fn held_button_does_not_requalify() {
        let event = pointer_down_activity(ElementState::Pressed, true);
        assert_eq!(event, None);
    }

    #[test]
    fn button_release_is_not_activity() {
        let event = pointer_down_activity(ElementState::Released, true);
        assert_eq!(event, None);
    }

    #[test]
    fn button_state_tracks_press_edges_per_button() {
        let mut buttons = PointerButtonState::default();

        let first = buttons.observe(MouseButton::Left, ElementState::Pressed);
        let repeat = buttons.observe(MouseButton::Left, ElementState::Pressed);
        let other = buttons.observe(MouseButton::Right, ElementState::Pressed);
        buttons.observe(MouseButton::Left, ElementState::Released);
        let again = buttons.observe(MouseButton::Left, ElementState::Pressed);

        assert_eq!(first, Some(ActivityEvent::PointerDown));
        assert_eq!(repeat, None);
        assert_eq!(other, Some(ActivityEvent::PointerDown));
        assert_eq!(again, Some(ActivityEvent::PointerDown));
    }

    #[test]
    fn only_touch_start_phase_qualifies() {
        assert_eq!(
            touch_activity(TouchPhase::Started),
            Some(ActivityEvent::TouchStart)
        );
        assert_eq!(touch_activity(TouchPhase::Moved), None);
        assert_eq!(touch_activity(TouchPhase::Ended), None);
        assert_eq!(touch_activity(TouchPhase::Cancelled), None);
    }
}
