// Maps tracker signals onto overlay surfaces and handles the out-of-band
// commands: manual toggle, hide-all, and display-topology changes.
//
// The coordinator is generic over the surface host and queries topology
// through the `Screens` trait, so all of its decisions are unit-tested
// against fakes; production wires in the Win32 implementations.

use crate::config::AppConfig;
use crate::screens::{is_fullscreen_rect, monitor_at, Monitor, Rect, Screens};
use crate::tracker::{InactivityTracker, Signal};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Owner of the actual overlay windows. Calls are fire-and-forget: the Win32
/// implementation enqueues a command and returns without waiting for the UI
/// thread to apply it.
pub trait SurfaceHost {
    fn show(&mut self, index: usize, bounds: Rect);
    fn hide(&mut self, index: usize);
}

pub struct OverlayCoordinator<H: SurfaceHost> {
    host: H,
    tracker: InactivityTracker,
    /// Monitor indices with a live overlay mapping.
    covered: BTreeSet<usize>,
}

impl<H: SurfaceHost> OverlayCoordinator<H> {
    pub fn new(host: H, timeout: Duration) -> Self {
        Self {
            host,
            tracker: InactivityTracker::new(timeout),
            covered: BTreeSet::new(),
        }
    }

    pub fn configure(&mut self, targets: &BTreeSet<usize>, timeout: Duration, now: Instant) {
        self.tracker.configure(targets, timeout, now);
    }

    pub fn start(&mut self, now: Instant) {
        self.tracker.start(now);
        // Overlays raised while monitoring was paused (manual toggle) must
        // stay known to the restarted tracker, or pointer return on a
        // covered monitor never produces an uncover.
        for &i in &self.covered {
            self.tracker.mark_active(i);
        }
    }

    /// Pause monitoring. No tick after this call has any effect.
    pub fn stop(&mut self) {
        self.tracker.stop();
    }

    pub fn is_covering(&self) -> bool {
        !self.covered.is_empty()
    }

    /// One poll step: snapshot the pointer once, advance every tracked
    /// monitor's timer, and apply the resulting transitions.
    pub fn tick<S: Screens>(&mut self, screens: &S, now: Instant) {
        if !self.tracker.is_running() {
            return;
        }
        let monitors = screens.monitors();
        let pointer = screens
            .cursor_pos()
            .and_then(|(x, y)| monitor_at(&monitors, x, y));

        for signal in self.tracker.tick(now, pointer) {
            match signal {
                Signal::Inactivity(i) => self.on_inactivity(screens, &monitors, i),
                Signal::Activity(i) => self.on_activity(i),
            }
        }
    }

    /// Panic-button flip. Anything showing → hide everything and restart the
    /// timers; nothing showing → cover every target immediately, bypassing
    /// the timeout.
    pub fn toggle_now<S: Screens>(
        &mut self,
        screens: &S,
        targets: &BTreeSet<usize>,
        now: Instant,
    ) {
        if self.is_covering() {
            info!("manual toggle: uncovering all monitors");
            self.hide_all();
            self.tracker.reset(now);
            return;
        }

        info!("manual toggle: covering {targets:?}");
        let monitors = screens.monitors();
        for &i in targets {
            self.on_inactivity(screens, &monitors, i);
            // Even when activation was suppressed, the tracker treats the
            // monitor as covered so pointer return transitions uniformly.
            self.tracker.mark_active(i);
        }
    }

    /// Unconditionally hide and release every live overlay.
    pub fn hide_all(&mut self) {
        let covered = std::mem::take(&mut self.covered);
        for i in covered {
            self.host.hide(i);
        }
    }

    /// Re-validate the configured targets against the live topology:
    /// valid = configured ∩ present − {primary}. Returns true when the
    /// config was corrected and needs persisting.
    pub fn on_topology_changed<S: Screens>(
        &mut self,
        screens: &S,
        cfg: &mut AppConfig,
        now: Instant,
    ) -> bool {
        let monitors = screens.monitors();
        let present: BTreeSet<usize> = monitors.iter().map(|m| m.index).collect();
        let primary = monitors.iter().find(|m| m.primary).map(|m| m.index);

        let changed = crate::config::sanitize_targets(cfg, primary, &present);
        let valid = cfg.target_screen_indices.clone();

        if valid != self.tracker.tracked_indices() {
            info!("topology changed, tracking {valid:?}");
            self.tracker.configure(
                &valid,
                Duration::from_secs(cfg.inactivity_timeout_seconds),
                now,
            );
        }

        // Drop overlays whose monitor is gone; re-pin the rest to their
        // (possibly moved) bounds.
        for i in self.covered.clone() {
            match monitors.iter().find(|m| m.index == i && valid.contains(&i)) {
                Some(m) => self.host.show(i, m.bounds),
                None => {
                    self.covered.remove(&i);
                    self.host.hide(i);
                }
            }
        }

        changed
    }

    fn on_inactivity<S: Screens>(&mut self, screens: &S, monitors: &[Monitor], index: usize) {
        if self.covered.contains(&index) {
            return;
        }
        let Some(monitor) = monitors.iter().find(|m| m.index == index) else {
            // Configured but unplugged; pruned on the next topology event.
            debug!("monitor {index} not present, skipping activation");
            return;
        };
        // Queried at signal time, never cached: fullscreen apps come and go
        // faster than topology events.
        if is_fullscreen_rect(screens.foreground_rect(), &monitor.bounds) {
            info!("monitor {index} occupied by a fullscreen window, suppressing overlay");
            return;
        }
        debug!("covering monitor {index}");
        self.host.show(index, monitor.bounds);
        self.covered.insert(index);
    }

    fn on_activity(&mut self, index: usize) {
        if self.covered.remove(&index) {
            debug!("uncovering monitor {index}");
            self.host.hide(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct FakeScreens {
        monitors: Vec<Monitor>,
        cursor: Option<(i32, i32)>,
        foreground: Option<Rect>,
    }

    impl FakeScreens {
        fn dual() -> Self {
            Self {
                monitors: vec![
                    Monitor { index: 0, bounds: Rect::new(0, 0, 1920, 1080), primary: true },
                    Monitor { index: 1, bounds: Rect::new(1920, 0, 3840, 1080), primary: false },
                    Monitor { index: 2, bounds: Rect::new(3840, 0, 5760, 1080), primary: false },
                ],
                cursor: Some((100, 100)),
                foreground: None,
            }
        }

        fn on_monitor(&mut self, index: usize) {
            let b = self.monitors.iter().find(|m| m.index == index).unwrap().bounds;
            self.cursor = Some((b.left + 10, b.top + 10));
        }
    }

    impl Screens for FakeScreens {
        fn monitors(&self) -> Vec<Monitor> {
            self.monitors.clone()
        }
        fn cursor_pos(&self) -> Option<(i32, i32)> {
            self.cursor
        }
        fn foreground_rect(&self) -> Option<Rect> {
            self.foreground
        }
    }

    #[derive(Default)]
    struct HostLog {
        shown: BTreeSet<usize>,
        events: Vec<(&'static str, usize)>,
    }

    #[derive(Clone, Default)]
    struct FakeHost(Rc<RefCell<HostLog>>);

    impl SurfaceHost for FakeHost {
        fn show(&mut self, index: usize, _bounds: Rect) {
            let mut log = self.0.borrow_mut();
            log.shown.insert(index);
            log.events.push(("show", index));
        }
        fn hide(&mut self, index: usize) {
            let mut log = self.0.borrow_mut();
            log.shown.remove(&index);
            log.events.push(("hide", index));
        }
    }

    fn setup(targets: &[usize]) -> (OverlayCoordinator<FakeHost>, FakeHost, Instant) {
        let host = FakeHost::default();
        let mut c = OverlayCoordinator::new(host.clone(), TIMEOUT);
        let now = Instant::now();
        c.configure(&targets.iter().copied().collect(), TIMEOUT, now);
        c.start(now);
        (c, host, now)
    }

    #[test]
    fn idle_monitor_gets_covered_and_uncovered() {
        let (mut c, host, now) = setup(&[1]);
        let mut screens = FakeScreens::dual();
        screens.on_monitor(0);

        c.tick(&screens, now + Duration::from_secs(1));
        assert!(host.0.borrow().shown.is_empty());

        c.tick(&screens, now + Duration::from_secs(5));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1]));

        screens.on_monitor(1);
        c.tick(&screens, now + Duration::from_secs(6));
        assert!(host.0.borrow().shown.is_empty());
    }

    #[test]
    fn fullscreen_occupied_monitor_is_suppressed() {
        let (mut c, host, now) = setup(&[1, 2]);
        let mut screens = FakeScreens::dual();
        screens.on_monitor(0);
        // Fullscreen video on monitor 1, nothing on monitor 2.
        screens.foreground = Some(Rect::new(1920, 0, 3840, 1080));

        c.tick(&screens, now + Duration::from_secs(6));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([2]));
    }

    #[test]
    fn toggle_now_covers_all_targets_immediately() {
        let (mut c, host, now) = setup(&[1, 2]);
        let screens = FakeScreens::dual();

        c.toggle_now(&screens, &BTreeSet::from([1, 2]), now);
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1, 2]));
    }

    #[test]
    fn toggle_now_is_a_global_flip() {
        let (mut c, host, now) = setup(&[1, 2]);
        let mut screens = FakeScreens::dual();
        screens.on_monitor(0);

        // Only monitor 1 covered by the timer.
        screens.on_monitor(2);
        c.tick(&screens, now + Duration::from_secs(6));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1]));

        // Anything showing means the toggle hides everything.
        c.toggle_now(&screens, &BTreeSet::from([1, 2]), now + Duration::from_secs(7));
        assert!(host.0.borrow().shown.is_empty());

        // Full reset: timers restart, so nothing re-fires until a fresh
        // timeout elapses.
        c.tick(&screens, now + Duration::from_secs(11));
        assert!(host.0.borrow().shown.is_empty());
        c.tick(&screens, now + Duration::from_secs(12));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1]));
    }

    #[test]
    fn manual_cover_while_paused_still_uncovers_on_pointer_return() {
        let (mut c, host, now) = setup(&[1, 2]);
        let mut screens = FakeScreens::dual();
        screens.on_monitor(0);

        // Settings open: monitoring paused, then the tray toggle fires.
        c.stop();
        c.toggle_now(&screens, &BTreeSet::from([1, 2]), now);
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1, 2]));

        // Settings closed: monitoring resumes with the overlays still up.
        c.start(now + Duration::from_secs(1));
        screens.on_monitor(1);
        c.tick(&screens, now + Duration::from_secs(2));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([2]));

        // And the uncovered monitor re-fires after a fresh timeout.
        screens.on_monitor(0);
        c.tick(&screens, now + Duration::from_secs(8));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1, 2]));
    }

    #[test]
    fn pointer_return_after_manual_cover_uncovers_that_monitor_only() {
        let (mut c, host, now) = setup(&[1, 2]);
        let mut screens = FakeScreens::dual();

        c.toggle_now(&screens, &BTreeSet::from([1, 2]), now);
        screens.on_monitor(2);
        c.tick(&screens, now + Duration::from_secs(1));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1]));
    }

    #[test]
    fn unplugging_a_covered_monitor_prunes_it() {
        let (mut c, host, now) = setup(&[1, 2]);
        let mut screens = FakeScreens::dual();
        screens.on_monitor(0);
        c.tick(&screens, now + Duration::from_secs(6));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1, 2]));

        // Monitor 2 goes away.
        screens.monitors.truncate(2);
        let mut cfg = AppConfig {
            target_screen_indices: BTreeSet::from([1, 2]),
            ..AppConfig::default()
        };
        let changed = c.on_topology_changed(&screens, &mut cfg, now + Duration::from_secs(7));
        assert!(changed);
        assert_eq!(cfg.target_screen_indices, BTreeSet::from([1]));
        assert_eq!(host.0.borrow().shown, BTreeSet::from([1]));

        // Monitor 1's independent state is untouched: pointer return still
        // uncovers it.
        screens.on_monitor(1);
        c.tick(&screens, now + Duration::from_secs(8));
        assert!(host.0.borrow().shown.is_empty());
    }

    #[test]
    fn topology_change_prunes_a_target_that_became_primary() {
        let (mut c, _host, now) = setup(&[1]);
        let mut screens = FakeScreens::dual();
        screens.monitors[0].primary = false;
        screens.monitors[1].primary = true;

        let mut cfg = AppConfig {
            target_screen_indices: BTreeSet::from([1]),
            ..AppConfig::default()
        };
        let changed = c.on_topology_changed(&screens, &mut cfg, now);
        assert!(changed);
        assert!(cfg.target_screen_indices.is_empty());
    }

    #[test]
    fn unchanged_topology_reports_no_change() {
        let (mut c, _host, now) = setup(&[1, 2]);
        let screens = FakeScreens::dual();
        let mut cfg = AppConfig {
            target_screen_indices: BTreeSet::from([1, 2]),
            ..AppConfig::default()
        };
        assert!(!c.on_topology_changed(&screens, &mut cfg, now));
        assert_eq!(cfg.target_screen_indices, BTreeSet::from([1, 2]));
    }

    #[test]
    fn activation_is_idempotent_per_monitor() {
        let (mut c, host, now) = setup(&[1]);
        let mut screens = FakeScreens::dual();
        screens.on_monitor(0);

        c.tick(&screens, now + Duration::from_secs(6));
        c.toggle_now(&screens, &BTreeSet::from([1]), now + Duration::from_secs(7));
        // Covered already, so the toggle took the hide branch; exactly one
        // show happened for monitor 1.
        let shows = host
            .0
            .borrow()
            .events
            .iter()
            .filter(|e| *e == &("show", 1))
            .count();
        assert_eq!(shows, 1);
    }

    #[test]
    fn hide_all_releases_everything_unconditionally() {
        let (mut c, host, now) = setup(&[1, 2]);
        let screens = FakeScreens::dual();
        c.toggle_now(&screens, &BTreeSet::from([1, 2]), now);
        assert!(c.is_covering());

        c.hide_all();
        assert!(!c.is_covering());
        assert!(host.0.borrow().shown.is_empty());
        // Safe to repeat.
        c.hide_all();
    }
}
