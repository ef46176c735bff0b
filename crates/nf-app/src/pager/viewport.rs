use tracing::trace;

/// Signals from whatever renders the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    /// The feed view is displayed again.
    Shown,
    /// The feed view is no longer displayed.
    Hidden,
    /// The end-of-list sentinel moved; `distance_px` is how far it sits
    /// outside the visible area (0 when visible).
    Sentinel { distance_px: u32 },
}

/// Stand-in for the browser's intersection observer on the sentinel.
///
/// Attached only while the view is shown and the pager is neither loading
/// nor ended. Fires once when the sentinel comes within the margin, then
/// disconnects until the next [`ProximityObserver::sync`]. Attaching while the
/// sentinel is already in range fires right away, like `observe()` does.
#[derive(Debug, Clone)]
pub struct ProximityObserver {
    margin_px: u32,
    visible: bool,
    attached: bool,
    in_range: bool,
}

impl ProximityObserver {
    pub fn new(margin_px: u32) -> Self {
        Self {
            margin_px,
            visible: true,
            attached: false,
            in_range: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Feed one event in. Returns `true` when a load should be triggered.
    ///
    /// While `cooling_down`, an in-range sentinel is noted but does not fire
    /// and the observer stays attached.
    pub fn handle(&mut self, event: ViewportEvent, cooling_down: bool) -> bool {
        match event {
            ViewportEvent::Shown => {
                self.visible = true;
                false
            }
            ViewportEvent::Hidden => {
                self.visible = false;
                self.disconnect();
                false
            }
            ViewportEvent::Sentinel { distance_px } => {
                self.in_range = distance_px <= self.margin_px;
                self.fire_if_ready(cooling_down)
            }
        }
    }

    /// Re-establish observation after the pager's loading/end state changed.
    /// Returns `true` if attaching fired immediately.
    pub fn sync(&mut self, loading: bool, at_end: bool, cooling_down: bool) -> bool {
        let wanted = self.visible && !loading && !at_end;
        if !wanted {
            self.disconnect();
            return false;
        }
        if self.attached {
            return false;
        }

        trace!("proximity observer attached");
        self.attached = true;
        self.fire_if_ready(cooling_down)
    }

    fn fire_if_ready(&mut self, cooling_down: bool) -> bool {
        if !self.attached || !self.in_range || cooling_down {
            return false;
        }
        self.disconnect();
        true
    }

    fn disconnect(&mut self) {
        if self.attached {
            trace!("proximity observer disconnected");
        }
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEAR: ViewportEvent = ViewportEvent::Sentinel { distance_px: 120 };
    const FAR: ViewportEvent = ViewportEvent::Sentinel { distance_px: 900 };

    #[test]
    fn test_fires_once_within_margin() {
        let mut obs = ProximityObserver::new(300);
        assert!(!obs.sync(false, false, false));
        assert!(obs.is_attached());

        assert!(!obs.handle(FAR, false));
        assert!(obs.handle(NEAR, false));
        assert!(!obs.is_attached());
        assert!(!obs.handle(NEAR, false));
    }

    #[test]
    fn test_detached_while_loading_or_ended() {
        let mut obs = ProximityObserver::new(300);
        obs.sync(true, false, false);
        assert!(!obs.handle(NEAR, false));

        obs.sync(false, true, false);
        assert!(!obs.is_attached());
        assert!(!obs.handle(NEAR, false));
    }

    #[test]
    fn test_reattach_in_range_fires_immediately() {
        let mut obs = ProximityObserver::new(300);
        obs.sync(false, false, false);
        assert!(obs.handle(NEAR, false));

        // load ran, came back; sentinel still close
        obs.sync(true, false, false);
        assert!(obs.sync(false, false, false));
    }

    #[test]
    fn test_cooldown_holds_fire_but_stays_attached() {
        let mut obs = ProximityObserver::new(300);
        obs.sync(false, false, true);
        assert!(!obs.handle(NEAR, true));
        assert!(obs.is_attached());
        assert!(obs.handle(NEAR, false));
    }

    #[test]
    fn test_hidden_view_tears_down() {
        let mut obs = ProximityObserver::new(300);
        obs.sync(false, false, false);
        obs.handle(ViewportEvent::Hidden, false);
        assert!(!obs.is_attached());
        assert!(!obs.sync(false, false, false));
        assert!(!obs.handle(NEAR, false));

        obs.handle(ViewportEvent::Shown, false);
        assert!(obs.sync(false, false, false));
    }

    #[test]
    fn test_margin_is_inclusive() {
        let mut obs = ProximityObserver::new(300);
        obs.sync(false, false, false);
        assert!(obs.handle(ViewportEvent::Sentinel { distance_px: 300 }, false));
    }
}
