// src/connectivity.rs

//! Network reachability seam.
//!
//! The cache and crawler only need two things: a synchronous "are we
//! online right now" answer, and a channel that fires when that answer
//! changes. The trait keeps platform-specific network monitoring out of
//! this crate.

use tokio::sync::watch;

/// Observable online/offline state.
pub trait Connectivity: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Receiver that yields the current state and every change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Connectivity driven by an external monitor through a watch channel.
pub struct WatchConnectivity {
    sender: watch::Sender<bool>,
}

impl WatchConnectivity {
    pub fn new(initial: bool) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Report a state change. No-op when the state is unchanged, so
    /// subscribers only wake on real transitions.
    pub fn set_connected(&self, connected: bool) {
        self.sender.send_if_modified(|state| {
            let changed = *state != connected;
            *state = connected;
            changed
        });
    }
}

impl Connectivity for WatchConnectivity {
    fn is_connected(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Trivial implementation for environments without a network monitor.
pub struct AlwaysOnline {
    sender: watch::Sender<bool>,
}

impl AlwaysOnline {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(true);
        Self { sender }
    }
}

impl Default for AlwaysOnline {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity for AlwaysOnline {
    fn is_connected(&self) -> bool {
        true
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transitions_reach_subscribers() {
        let conn = WatchConnectivity::new(true);
        let mut rx = conn.subscribe();
        assert!(conn.is_connected());

        conn.set_connected(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn unchanged_state_does_not_wake() {
        let conn = WatchConnectivity::new(true);
        let mut rx = conn.subscribe();
        rx.mark_unchanged();

        conn.set_connected(true);
        assert!(!rx.has_changed().unwrap());
    }
}
