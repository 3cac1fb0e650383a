//! Mount, run and teardown bookkeeping.
//!
//! The render loop checks a [`StopSignal`] before every frame. Teardown only
//! happens once the loop has stopped, and running it again is a no-op.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cloneable request to stop the render loop.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Mounting,
    Running,
    Stopping,
    Disposed,
}

#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
    signal: StopSignal,
}

impl Lifecycle {
    pub fn new(signal: StopSignal) -> Self {
        Self {
            phase: Phase::Mounting,
            signal,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn signal(&self) -> &StopSignal {
        &self.signal
    }

    pub fn mark_running(&mut self) {
        if self.phase == Phase::Mounting {
            self.phase = Phase::Running;
        }
    }

    /// Whether the next frame may render. A pending stop moves to `Stopping`.
    pub fn should_render(&mut self) -> bool {
        if self.signal.is_stopped() && self.phase != Phase::Disposed {
            self.phase = Phase::Stopping;
        }
        self.phase == Phase::Running
    }

    /// Whether the loop should exit: a stop was requested or teardown ran.
    /// A scene still mounting only skips frames.
    pub fn is_stopping(&self) -> bool {
        self.signal.is_stopped() || matches!(self.phase, Phase::Stopping | Phase::Disposed)
    }

    /// Ask the loop to stop after the current frame.
    pub fn request_stop(&mut self) {
        self.signal.stop();
        if self.phase != Phase::Disposed {
            self.phase = Phase::Stopping;
        }
    }

    /// Enter `Disposed`. Returns `false` when teardown already happened, so the
    /// caller can skip it.
    pub fn teardown(&mut self) -> bool {
        if self.phase == Phase::Disposed {
            return false;
        }
        self.signal.stop();
        self.phase = Phase::Disposed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_only_while_running() {
        let mut lifecycle = Lifecycle::new(StopSignal::new());
        assert!(!lifecycle.should_render());
        lifecycle.mark_running();
        assert!(lifecycle.should_render());
        assert!(!lifecycle.is_stopping());
    }

    #[test]
    fn frames_before_setup_do_not_stop_the_loop() {
        let mut lifecycle = Lifecycle::new(StopSignal::new());
        assert!(!lifecycle.should_render());
        assert!(!lifecycle.is_stopping());
        assert_eq!(lifecycle.phase(), Phase::Mounting);
    }

    #[test]
    fn stop_during_mount_exits() {
        let signal = StopSignal::new();
        let mut lifecycle = Lifecycle::new(signal.clone());
        signal.stop();
        assert!(!lifecycle.should_render());
        assert!(lifecycle.is_stopping());
        assert_eq!(lifecycle.phase(), Phase::Stopping);
    }

    #[test]
    fn stop_from_another_handle_halts_the_loop() {
        let signal = StopSignal::new();
        let mut lifecycle = Lifecycle::new(signal.clone());
        lifecycle.mark_running();
        signal.stop();
        assert!(!lifecycle.should_render());
        assert_eq!(lifecycle.phase(), Phase::Stopping);
        assert!(lifecycle.is_stopping());
    }

    #[test]
    fn teardown_runs_once() {
        let mut lifecycle = Lifecycle::new(StopSignal::new());
        lifecycle.mark_running();
        assert!(lifecycle.teardown());
        assert!(!lifecycle.teardown());
        assert_eq!(lifecycle.phase(), Phase::Disposed);
        assert!(lifecycle.signal().is_stopped());
    }

    #[test]
    fn teardown_during_mount_is_allowed() {
        let mut lifecycle = Lifecycle::new(StopSignal::new());
        assert!(lifecycle.teardown());
        lifecycle.mark_running();
        assert_eq!(lifecycle.phase(), Phase::Disposed);
        assert!(!lifecycle.should_render());
    }
}
