//! Page-level resources an overlay may take over: scrolling and key input.
//!
//! Both are handed out as guards; dropping the guard gives the resource back,
//! so every way an overlay can go away releases exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct SurfaceState {
    scroll_locks: AtomicUsize,
    scroll_restores: AtomicUsize,
    key_listeners: AtomicUsize,
}

#[derive(Clone, Debug, Default)]
pub struct PageSurface {
    state: Arc<SurfaceState>,
}

impl PageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_scroll(&self) -> ScrollLock {
        self.state.scroll_locks.fetch_add(1, Ordering::SeqCst);
        tracing::trace!("Page scroll suppressed");
        ScrollLock {
            state: self.state.clone(),
        }
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.state.scroll_locks.load(Ordering::SeqCst) > 0
    }

    /// How many times scrolling was handed back
    #[cfg(test)]
    pub fn scroll_restores(&self) -> usize {
        self.state.scroll_restores.load(Ordering::SeqCst)
    }

    pub fn attach_key_listener(&self) -> KeyListener {
        self.state.key_listeners.fetch_add(1, Ordering::SeqCst);
        KeyListener {
            state: self.state.clone(),
        }
    }

    pub fn key_listener_count(&self) -> usize {
        self.state.key_listeners.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ScrollLock {
    state: Arc<SurfaceState>,
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.state.scroll_locks.fetch_sub(1, Ordering::SeqCst);
        self.state.scroll_restores.fetch_add(1, Ordering::SeqCst);
        tracing::trace!("Page scroll restored");
    }
}

#[derive(Debug)]
pub struct KeyListener {
    state: Arc<SurfaceState>,
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.state.key_listeners.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_release_on_drop() {
        let surface = PageSurface::new();
        let lock = surface.lock_scroll();
        let keys = surface.attach_key_listener();
        assert!(surface.is_scroll_locked());
        assert_eq!(surface.key_listener_count(), 1);

        drop(lock);
        drop(keys);
        assert!(!surface.is_scroll_locked());
        assert_eq!(surface.scroll_restores(), 1);
        assert_eq!(surface.key_listener_count(), 0);
    }
}
