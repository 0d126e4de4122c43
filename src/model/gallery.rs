//! Modal gallery overlay: current position, navigation and neighbor preloading

use std::collections::HashSet;

use crossterm::event::KeyCode;
use tokio::task::JoinHandle;

use super::media::{ImageUrlBuilder, MediaReference};
use super::surface::{KeyListener, PageSurface, ScrollLock};

const PRELOAD_WIDTH: u32 = 1200;
const PRELOAD_QUALITY: u8 = 90;

/// Where a pointer click landed while the overlay is open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Backdrop,
    Image,
    Previous,
    Next,
    CloseControl,
}

/// What the overlay draws for the current image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryView {
    pub url: Option<String>,
    pub alt: String,
    pub counter: Option<String>,
}

struct GallerySession {
    images: Vec<MediaReference>,
    current_index: usize,
    preloaded: HashSet<String>,
    preload_tasks: Vec<JoinHandle<()>>,
    // Held for their Drop: scroll and key input return to the page
    _scroll_lock: ScrollLock,
    _key_listener: KeyListener,
}

impl Drop for GallerySession {
    fn drop(&mut self) {
        for task in self.preload_tasks.drain(..) {
            task.abort();
        }
    }
}

pub struct Gallery {
    surface: PageSurface,
    builder: ImageUrlBuilder,
    session: Option<GallerySession>,
}

impl Gallery {
    pub fn new(surface: PageSurface, builder: ImageUrlBuilder) -> Self {
        Self {
            surface,
            builder,
            session: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    #[cfg(test)]
    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.current_index)
    }

    fn display_url(&self, reference: &MediaReference) -> Option<String> {
        let reference = reference.clone().width(PRELOAD_WIDTH).quality(PRELOAD_QUALITY);
        self.builder.url(&reference).ok()
    }

    /// Opens a session; returns the URLs to preload. Empty input or an
    /// out-of-range start index leaves the gallery untouched.
    pub fn open(&mut self, images: Vec<MediaReference>, start_index: i64) -> Vec<String> {
        let valid = usize::try_from(start_index)
            .ok()
            .filter(|&index| index < images.len());
        let Some(current_index) = valid else {
            tracing::debug!(len = images.len(), start_index, "Ignoring invalid gallery open");
            return Vec::new();
        };

        // Release the previous session's guards before taking new ones
        self.session = None;
        tracing::debug!(len = images.len(), current_index, "Gallery opened");
        self.session = Some(GallerySession {
            images,
            current_index,
            preloaded: HashSet::new(),
            preload_tasks: Vec::new(),
            _scroll_lock: self.surface.lock_scroll(),
            _key_listener: self.surface.attach_key_listener(),
        });
        self.neighbors_to_preload()
    }

    pub fn next(&mut self) -> Vec<String> {
        self.step(1)
    }

    pub fn previous(&mut self) -> Vec<String> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Vec<String> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let len = session.images.len() as isize;
        session.current_index = (session.current_index as isize + delta).rem_euclid(len) as usize;
        self.neighbors_to_preload()
    }

    /// Neighbor URLs of the current index not yet preloaded in this session
    fn neighbors_to_preload(&mut self) -> Vec<String> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let len = session.images.len();
        if len < 2 {
            return Vec::new();
        }
        let next = (session.current_index + 1) % len;
        let prev = (session.current_index + len - 1) % len;
        let mut indices = vec![next];
        if prev != next {
            indices.push(prev);
        }

        let candidates: Vec<String> = indices
            .into_iter()
            .filter_map(|i| self.display_url(&session.images[i]))
            .collect();

        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        candidates
            .into_iter()
            .filter(|url| session.preloaded.insert(url.clone()))
            .collect()
    }

    /// Keeps a spawned preload tied to the session; it is aborted on close
    pub fn track_preload(&mut self, task: JoinHandle<()>) {
        match self.session.as_mut() {
            Some(session) => {
                session.preload_tasks.retain(|t| !t.is_finished());
                session.preload_tasks.push(task);
            }
            None => task.abort(),
        }
    }

    pub fn close(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("Gallery closed");
        }
    }

    /// Returns whether the gallery consumed the key, plus any URLs to preload
    pub fn handle_key(&mut self, code: KeyCode) -> (bool, Vec<String>) {
        if !self.is_open() || self.surface.key_listener_count() == 0 {
            return (false, Vec::new());
        }
        match code {
            KeyCode::Esc => {
                self.close();
                (true, Vec::new())
            }
            KeyCode::Left => (true, self.previous()),
            KeyCode::Right => (true, self.next()),
            _ => (false, Vec::new()),
        }
    }

    pub fn click(&mut self, target: ClickTarget) -> Vec<String> {
        match target {
            ClickTarget::Backdrop | ClickTarget::CloseControl => {
                self.close();
                Vec::new()
            }
            ClickTarget::Previous => self.previous(),
            ClickTarget::Next => self.next(),
            ClickTarget::Image => Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&MediaReference> {
        let session = self.session.as_ref()?;
        session.images.get(session.current_index)
    }

    pub fn view(&self) -> Option<GalleryView> {
        let current = self.current()?;
        Some(GalleryView {
            url: self.display_url(current),
            alt: current.alt.clone().unwrap_or_else(|| "Gallery image".to_string()),
            counter: self.counter(),
        })
    }

    /// "2 / 5" position label; `None` for a single image
    pub fn counter(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        (session.images.len() > 1)
            .then(|| format!("{} / {}", session.current_index + 1, session.images.len()))
    }
}
