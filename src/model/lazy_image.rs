//! Viewport-triggered image loading
//!
//! Each mounted image starts `Pending` (or `Requested` when it is above the
//! fold) and is requested once it comes within the trigger margin of the
//! viewport. The watch is one-shot: scrolling away and back never re-requests.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::sanity_client::FetchError;

const FADE_DURATION: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

/// Axis-aligned box in pixels, in page coordinates
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Bounds {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self { top, left, width, height }
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }

    fn right(&self) -> f32 {
        self.left + self.width
    }

    fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    fn expand(&self, margin: f32) -> Self {
        Self {
            top: self.top - margin,
            left: self.left - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    fn intersection_area(&self, other: &Bounds) -> f32 {
        let w = self.right().min(other.right()) - self.left.max(other.left);
        let h = self.bottom().min(other.bottom()) - self.top.max(other.top);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }
}

/// Trigger rule: intersect the viewport grown by `root_margin` with at least
/// `threshold` of the element's own area
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportWatch {
    pub root_margin: f32,
    pub threshold: f32,
}

impl Default for ViewportWatch {
    fn default() -> Self {
        Self {
            root_margin: 50.0,
            threshold: 0.1,
        }
    }
}

impl ViewportWatch {
    pub fn triggers(&self, element: Bounds, viewport: Bounds) -> bool {
        let root = viewport.expand(self.root_margin);
        let area = element.area();
        if area == 0.0 {
            // Unsized elements count as visible once their origin is inside
            return element.top >= root.top
                && element.top <= root.bottom()
                && element.left >= root.left
                && element.left <= root.right();
        }
        element.intersection_area(&root) / area >= self.threshold
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageLoadState {
    Pending,
    Requested,
    Loaded,
    Error,
}

/// A load the caller has to start; the outcome comes back via `complete`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: ImageId,
    pub url: String,
}

/// What to draw for an image right now
#[derive(Clone, Debug, PartialEq)]
pub enum Visual {
    /// Reserved box of the target size while the image is not ready
    Placeholder { width: u16, height: u16 },
    /// `opacity` ramps from 0 to 1 over the fade-in
    Image { src: String, alt: String, opacity: f32 },
    Unavailable { width: u16, height: u16 },
}

#[derive(Clone, Debug)]
pub struct LazyImage {
    id: ImageId,
    src: Option<String>,
    alt: String,
    width: u16,
    height: u16,
    state: ImageLoadState,
    watch: Option<ViewportWatch>,
    loaded_at: Option<Instant>,
}

impl LazyImage {
    fn mount(
        id: ImageId,
        src: Option<String>,
        alt: String,
        size: (u16, u16),
        priority: bool,
    ) -> (Self, Option<LoadRequest>) {
        let mut image = Self {
            id,
            src,
            alt,
            width: size.0,
            height: size.1,
            state: ImageLoadState::Pending,
            watch: None,
            loaded_at: None,
        };
        let request = if priority {
            image.request()
        } else {
            image.watch = Some(ViewportWatch::default());
            None
        };
        (image, request)
    }

    pub fn state(&self) -> ImageLoadState {
        self.state
    }

    fn request(&mut self) -> Option<LoadRequest> {
        self.watch = None;
        match &self.src {
            Some(url) => {
                self.state = ImageLoadState::Requested;
                Some(LoadRequest {
                    id: self.id,
                    url: url.clone(),
                })
            }
            None => {
                tracing::debug!(id = self.id.0, "Image has no resolvable source");
                self.state = ImageLoadState::Error;
                None
            }
        }
    }

    /// Feed the current geometry; returns a request the first time it triggers
    pub fn observe(&mut self, element: Bounds, viewport: Bounds) -> Option<LoadRequest> {
        let watch = self.watch?;
        if self.state != ImageLoadState::Pending || !watch.triggers(element, viewport) {
            return None;
        }
        self.request()
    }

    /// Returns whether the state changed
    pub fn complete(&mut self, result: Result<(), FetchError>) -> bool {
        if self.state != ImageLoadState::Requested {
            return false;
        }
        match result {
            Ok(()) => {
                self.state = ImageLoadState::Loaded;
                self.loaded_at = Some(Instant::now());
            }
            Err(e) => {
                tracing::debug!(id = self.id.0, error = %e, "Image failed to load");
                self.state = ImageLoadState::Error;
            }
        }
        true
    }

    /// Back to `Pending` with a fresh watch; the only way out of `Error`
    pub fn reset(&mut self) {
        self.state = ImageLoadState::Pending;
        self.watch = Some(ViewportWatch::default());
        self.loaded_at = None;
    }

    pub fn visual(&self) -> Visual {
        match (self.state, self.src.as_deref()) {
            (ImageLoadState::Loaded, Some(src)) => {
                let opacity = self
                    .loaded_at
                    .map(|at| (at.elapsed().as_secs_f32() / FADE_DURATION.as_secs_f32()).min(1.0))
                    .unwrap_or(1.0);
                Visual::Image {
                    src: src.to_string(),
                    alt: self.alt.clone(),
                    opacity,
                }
            }
            (ImageLoadState::Error, _) | (ImageLoadState::Loaded, None) => Visual::Unavailable {
                width: self.width,
                height: self.height,
            },
            _ => Visual::Placeholder {
                width: self.width,
                height: self.height,
            },
        }
    }
}

/// All lazy images mounted on the current page
#[derive(Clone, Debug, Default)]
pub struct ImageRegistry {
    images: HashMap<ImageId, LazyImage>,
    next_id: u64,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(
        &mut self,
        src: Option<String>,
        alt: String,
        size: (u16, u16),
        priority: bool,
    ) -> (ImageId, Option<LoadRequest>) {
        let id = ImageId(self.next_id);
        self.next_id += 1;
        let (image, request) = LazyImage::mount(id, src, alt, size, priority);
        self.images.insert(id, image);
        (id, request)
    }

    pub fn unmount(&mut self, id: ImageId) {
        self.images.remove(&id);
    }

    pub fn get(&self, id: ImageId) -> Option<&LazyImage> {
        self.images.get(&id)
    }

    pub fn observe(&mut self, layout: &[(ImageId, Bounds)], viewport: Bounds) -> Vec<LoadRequest> {
        layout
            .iter()
            .filter_map(|(id, bounds)| self.images.get_mut(id)?.observe(*bounds, viewport))
            .collect()
    }

    /// Completion for an image that was unmounted meanwhile is dropped
    pub fn complete(&mut self, id: ImageId, result: Result<(), FetchError>) -> bool {
        match self.images.get_mut(&id) {
            Some(image) => image.complete(result),
            None => {
                tracing::trace!(id = id.0, "Load finished for unmounted image");
                false
            }
        }
    }

    pub fn reset(&mut self, id: ImageId) {
        if let Some(image) = self.images.get_mut(&id) {
            image.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT_HEIGHT: f32 = 800.0;

    fn viewport(scroll_top: f32) -> Bounds {
        Bounds::new(scroll_top, 0.0, 1280.0, VIEWPORT_HEIGHT)
    }

    fn element(top: f32) -> Bounds {
        Bounds::new(top, 100.0, 600.0, 400.0)
    }

    fn mount_lazy(registry: &mut ImageRegistry) -> ImageId {
        let (id, request) =
            registry.mount(Some("https://cdn/x.jpg".into()), "x".into(), (600, 400), false);
        assert!(request.is_none());
        id
    }

    #[test]
    fn off_screen_image_stays_pending() {
        let mut registry = ImageRegistry::new();
        let id = mount_lazy(&mut registry);
        let requests = registry.observe(&[(id, element(2000.0))], viewport(0.0));
        assert!(requests.is_empty());
        assert_eq!(registry.get(id).unwrap().state(), ImageLoadState::Pending);
    }

    #[test]
    fn margin_and_threshold_decide_the_trigger() {
        let watch = ViewportWatch::default();
        // 30px below the fold: 20px of its 400px height lies inside the margin (5%)
        assert!(!watch.triggers(element(VIEWPORT_HEIGHT + 30.0), viewport(0.0)));
        // 10px below: 40px inside the margin, exactly 10%
        assert!(watch.triggers(element(VIEWPORT_HEIGHT + 10.0), viewport(0.0)));
        // Fully visible
        assert!(watch.triggers(element(100.0), viewport(0.0)));
        // Scrolled past it
        assert!(!watch.triggers(element(100.0), viewport(2000.0)));
    }

    #[test]
    fn scroll_into_view_requests_once_then_settles() {
        let mut registry = ImageRegistry::new();
        let id = mount_lazy(&mut registry);
        let layout = [(id, element(1200.0))];

        assert!(registry.observe(&layout, viewport(0.0)).is_empty());
        let requests = registry.observe(&layout, viewport(500.0));
        assert_eq!(requests, vec![LoadRequest { id, url: "https://cdn/x.jpg".into() }]);
        assert_eq!(registry.get(id).unwrap().state(), ImageLoadState::Requested);

        assert!(registry.complete(id, Ok(())));
        assert_eq!(registry.get(id).unwrap().state(), ImageLoadState::Loaded);

        // Scroll away and back: no new request
        assert!(registry.observe(&layout, viewport(5000.0)).is_empty());
        assert!(registry.observe(&layout, viewport(500.0)).is_empty());
    }

    #[test]
    fn failed_load_shows_unavailable_and_never_retries() {
        let mut registry = ImageRegistry::new();
        let id = mount_lazy(&mut registry);
        let layout = [(id, element(0.0))];
        assert_eq!(registry.observe(&layout, viewport(0.0)).len(), 1);

        let missing = FetchError::Status { status: 404, body: String::new() };
        assert!(registry.complete(id, Err(missing)));
        let image = registry.get(id).unwrap();
        assert_eq!(image.state(), ImageLoadState::Error);
        assert_eq!(image.visual(), Visual::Unavailable { width: 600, height: 400 });

        assert!(registry.observe(&layout, viewport(0.0)).is_empty());
        assert!(!registry.complete(id, Ok(())));
        assert_eq!(registry.get(id).unwrap().state(), ImageLoadState::Error);

        registry.reset(id);
        assert_eq!(registry.get(id).unwrap().state(), ImageLoadState::Pending);
        assert_eq!(registry.observe(&layout, viewport(0.0)).len(), 1);
    }

    #[test]
    fn priority_image_requests_on_mount() {
        let mut registry = ImageRegistry::new();
        let (id, request) =
            registry.mount(Some("https://cdn/hero.jpg".into()), "hero".into(), (600, 600), true);
        assert_eq!(request.map(|r| r.id), Some(id));
        let image = registry.get(id).unwrap();
        assert_eq!(image.state(), ImageLoadState::Requested);
        assert_eq!(image.visual(), Visual::Placeholder { width: 600, height: 600 });
    }

    #[test]
    fn unresolvable_source_goes_straight_to_error() {
        let mut registry = ImageRegistry::new();
        let (id, request) = registry.mount(None, "cover".into(), (400, 400), true);
        assert!(request.is_none());
        assert_eq!(registry.get(id).unwrap().state(), ImageLoadState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn loaded_image_fades_in() {
        let mut registry = ImageRegistry::new();
        let (id, _) = registry.mount(Some("https://cdn/a.jpg".into()), "a".into(), (10, 10), true);
        registry.complete(id, Ok(()));
        match registry.get(id).unwrap().visual() {
            Visual::Image { opacity, .. } => assert_eq!(opacity, 0.0),
            other => panic!("unexpected visual {:?}", other),
        }
        tokio::time::advance(Duration::from_millis(600)).await;
        match registry.get(id).unwrap().visual() {
            Visual::Image { src, opacity, .. } => {
                assert_eq!(src, "https://cdn/a.jpg");
                assert_eq!(opacity, 1.0);
            }
            other => panic!("unexpected visual {:?}", other),
        }
    }

    #[test]
    fn completion_after_unmount_is_a_no_op() {
        let mut registry = ImageRegistry::new();
        let (id, _) = registry.mount(Some("https://cdn/a.jpg".into()), "a".into(), (10, 10), true);
        registry.unmount(id);
        assert!(!registry.complete(id, Ok(())));
        assert!(registry.get(id).is_none());
    }
}
