use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use super::gesture::{self, Bounds, GestureController, GestureEvent, Handled, Navigation, ViewerState};
use super::pan::{clamp_pan, Size};
use super::preload::{spawn_preload, ImageSource};
use super::task::{Generation, Outcome, Ticket};
use crate::gallery::{Album, Photo};

/// One open lightbox over a list of photos.
///
/// Everything here is discarded on [`close`](PhotoViewer::close); async
/// results that arrive afterwards carry a stale [`Ticket`].
pub struct PhotoViewer {
    photos: Vec<Photo>,
    state: ViewerState,
    gestures: GestureController,
    viewport: Size,
    /// Unscaled size of the current image, once it has rendered.
    base_size: Option<Size>,
    loaded: HashSet<String>,
    loading: bool,
    generation: Generation,
}

impl PhotoViewer {
    pub fn new(viewport: Size) -> Self {
        Self {
            photos: Vec::new(),
            state: ViewerState::default(),
            gestures: GestureController::new(),
            viewport,
            base_size: None,
            loaded: HashSet::new(),
            loading: false,
            generation: Generation::new(),
        }
    }

    /// Open on `photos[start]` (wrapped). Returns `false` and stays closed
    /// when there is nothing to show.
    pub fn open(&mut self, photos: &[Photo], start: usize) -> bool {
        if photos.is_empty() {
            return false;
        }
        self.generation.bump();
        self.loaded.clear();
        self.photos = photos.to_vec();
        self.show(start % self.photos.len());
        true
    }

    pub fn open_album(&mut self, album: &Album) -> bool {
        self.open(&album.photos, 0)
    }

    pub fn close(&mut self) {
        self.generation.bump();
        self.photos.clear();
        self.state = ViewerState::default();
        self.gestures.reset();
        self.base_size = None;
        self.loaded.clear();
        self.loading = false;
    }

    pub fn is_open(&self) -> bool {
        !self.photos.is_empty()
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn current(&self) -> Option<&Photo> {
        self.photos.get(self.state.photo_index)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn handle(&mut self, event: &GestureEvent, at: Instant) -> Handled {
        if !self.is_open() {
            return Handled::default();
        }

        let bounds = Bounds {
            base: self.base_size,
            viewport: self.viewport,
        };
        let handled = self.gestures.handle(&mut self.state, event, at, bounds);

        match handled.navigate {
            Some(Navigation::Next) => self.next(),
            Some(Navigation::Previous) => self.prev(),
            None => {}
        }
        handled
    }

    pub fn next(&mut self) {
        if self.is_open() {
            self.show((self.state.photo_index + 1) % self.photos.len());
        }
    }

    pub fn prev(&mut self) {
        if self.is_open() {
            let len = self.photos.len();
            self.show((self.state.photo_index + len - 1) % len);
        }
    }

    pub fn toggle_zoom(&mut self) {
        if self.is_open() {
            gesture::toggle_zoom(&mut self.state);
        }
    }

    /// Image `src` rendered at `rendered` (its on-screen size at the
    /// current zoom). Ignored unless `src` is the photo on screen.
    pub fn image_loaded(&mut self, src: &str, rendered: Size) {
        if !self.is_current(src) {
            tracing::debug!(src, "Ignoring load event for a photo no longer shown");
            return;
        }
        self.loaded.insert(src.to_string());
        self.loading = false;
        self.remeasure(rendered);
    }

    pub fn image_failed(&mut self, src: &str) {
        if !self.is_current(src) {
            return;
        }
        tracing::warn!(src, "Image failed to load");
        self.loading = false;
    }

    fn is_current(&self, src: &str) -> bool {
        self.current().is_some_and(|photo| photo.src == src)
    }

    /// Viewport changed; `rendered` is the image's new on-screen size when
    /// the host could measure it.
    pub fn resize(&mut self, viewport: Size, rendered: Option<Size>) {
        self.viewport = viewport;
        match rendered {
            Some(rendered) => self.remeasure(rendered),
            None => self.reclamp(),
        }
    }

    pub fn ticket(&self) -> Ticket {
        self.generation.ticket()
    }

    /// Fetch every photo not yet shown in the background. Nothing is
    /// awaited here; feed the result back through
    /// [`accept_preloaded`](PhotoViewer::accept_preloaded).
    pub fn preload(
        &self,
        source: Arc<dyn ImageSource>,
    ) -> Option<JoinHandle<Outcome<Vec<String>>>> {
        let pending: Vec<String> = self
            .photos
            .iter()
            .map(|p| p.src.clone())
            .filter(|src| !self.loaded.contains(src))
            .collect();
        if pending.is_empty() {
            return None;
        }
        Some(spawn_preload(source, pending, self.ticket()))
    }

    pub fn accept_preloaded(&mut self, outcome: Outcome<Vec<String>>) {
        if let Some(sources) = outcome.completed() {
            self.loaded.extend(sources);
            let current_loaded = self
                .current()
                .is_some_and(|photo| self.loaded.contains(&photo.src));
            if current_loaded {
                self.loading = false;
            }
        }
    }

    fn show(&mut self, index: usize) {
        self.state.photo_index = index;
        self.state.reset_zoom();
        self.gestures.reset();
        self.base_size = None;
        self.loading = self
            .current()
            .is_some_and(|photo| !self.loaded.contains(&photo.src));
    }

    fn remeasure(&mut self, rendered: Size) {
        self.base_size = Some(rendered.unscaled(self.state.zoom));
        self.reclamp();
    }

    fn reclamp(&mut self) {
        if let Some(base) = self.base_size {
            self.state.pan = clamp_pan(self.state.pan, self.state.zoom, base, self.viewport);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::pan::Vec2;
    use crate::client::ClientError;
    use async_trait::async_trait;
    use bytes::Bytes;

    fn src(i: usize) -> String {
        format!("https://cdn.test/home/{i}.jpg")
    }

    fn photos(n: usize) -> Vec<Photo> {
        (0..n)
            .map(|i| Photo {
                src: src(i),
                alt: format!("{i}.jpg"),
                path: format!("home/{i}.jpg"),
            })
            .collect()
    }

    fn viewer() -> PhotoViewer {
        PhotoViewer::new(Size::new(800.0, 600.0))
    }

    fn swipe(viewer: &mut PhotoViewer, dx: f64) {
        let now = Instant::now();
        let start = Vec2::new(400.0, 300.0);
        let end = Vec2::new(400.0 + dx, 300.0);
        viewer.handle(&GestureEvent::TouchStart { touches: vec![start] }, now);
        viewer.handle(&GestureEvent::TouchMove { touches: vec![end] }, now);
        viewer.handle(
            &GestureEvent::TouchEnd {
                touches: vec![],
                changed: end,
            },
            now,
        );
    }

    #[test]
    fn left_swipe_advances_with_wraparound() {
        let n = 4;
        for i in 0..n {
            let mut viewer = viewer();
            viewer.open(&photos(n), i);
            swipe(&mut viewer, -80.0);
            assert_eq!(viewer.state().photo_index, (i + 1) % n);
            assert_eq!(viewer.state().zoom, 1.0);
        }
    }

    #[test]
    fn right_swipe_goes_back_with_wraparound() {
        let n = 4;
        for i in 0..n {
            let mut viewer = viewer();
            viewer.open(&photos(n), i);
            swipe(&mut viewer, 80.0);
            assert_eq!(viewer.state().photo_index, (i + n - 1) % n);
        }
    }

    #[test]
    fn navigation_resets_zoom_and_pan() {
        let mut viewer = viewer();
        viewer.open(&photos(3), 0);
        viewer.image_loaded(&src(0), Size::new(800.0, 600.0));
        viewer.toggle_zoom();
        viewer.handle(
            &GestureEvent::PointerDown {
                position: Vec2::ZERO,
            },
            Instant::now(),
        );
        viewer.handle(
            &GestureEvent::PointerMove {
                position: Vec2::new(100.0, 100.0),
            },
            Instant::now(),
        );
        assert_eq!(viewer.state().pan, Vec2::new(100.0, 100.0));

        viewer.next();
        assert_eq!(viewer.state().photo_index, 1);
        assert_eq!(viewer.state().zoom, 1.0);
        assert_eq!(viewer.state().pan, Vec2::ZERO);
        assert!(viewer.is_loading());
    }

    #[test]
    fn loaded_images_do_not_show_the_spinner_again() {
        let mut viewer = viewer();
        viewer.open(&photos(2), 0);
        assert!(viewer.is_loading());

        viewer.image_loaded(&src(0), Size::new(800.0, 600.0));
        viewer.next();
        viewer.image_failed(&src(1));
        viewer.prev();
        assert!(!viewer.is_loading());
    }

    #[test]
    fn late_events_for_a_previous_photo_are_ignored() {
        let mut viewer = viewer();
        viewer.open(&photos(3), 0);
        viewer.next();
        assert!(viewer.is_loading());

        viewer.image_loaded(&src(0), Size::new(100.0, 100.0));
        assert!(viewer.is_loading());
        viewer.image_failed(&src(0));
        assert!(viewer.is_loading());

        // A 100x100 base would pin the pan to zero; photo 1 has no size yet,
        // so the drag goes through unclamped.
        viewer.toggle_zoom();
        viewer.handle(
            &GestureEvent::PointerDown {
                position: Vec2::ZERO,
            },
            Instant::now(),
        );
        viewer.handle(
            &GestureEvent::PointerMove {
                position: Vec2::new(390.0, 0.0),
            },
            Instant::now(),
        );
        assert_eq!(viewer.state().pan.x, 390.0);

        // Photo 1 was never marked loaded.
        viewer.prev();
        viewer.next();
        assert!(viewer.is_loading());
        viewer.image_loaded(&src(1), Size::new(800.0, 600.0));
        assert!(!viewer.is_loading());
    }

    #[test]
    fn resize_reclamps_the_pan() {
        let mut viewer = viewer();
        viewer.open(&photos(1), 0);
        viewer.toggle_zoom();
        // Measured while zoomed: the unscaled image is 800x600.
        viewer.image_loaded(&src(0), Size::new(1600.0, 1200.0));
        viewer.handle(
            &GestureEvent::PointerDown {
                position: Vec2::ZERO,
            },
            Instant::now(),
        );
        viewer.handle(
            &GestureEvent::PointerMove {
                position: Vec2::new(390.0, 0.0),
            },
            Instant::now(),
        );
        assert_eq!(viewer.state().pan.x, 390.0);

        // A wider viewport leaves less overflow: (1600 - 1200) / 2 = 200
        viewer.resize(Size::new(1200.0, 600.0), None);
        assert_eq!(viewer.state().pan.x, 200.0);
    }

    #[test]
    fn empty_album_does_not_open() {
        let mut viewer = viewer();
        assert!(!viewer.open(&[], 0));
        assert!(!viewer.is_open());
        let handled = viewer.handle(&GestureEvent::Click, Instant::now());
        assert!(!handled.prevent_default);
    }

    #[test]
    fn close_discards_state_and_stales_tickets() {
        let mut viewer = viewer();
        viewer.open(&photos(3), 2);
        let ticket = viewer.ticket();

        viewer.close();
        assert!(!viewer.is_open());
        assert!(!ticket.is_current());
        assert_eq!(*viewer.state(), ViewerState::default());
    }

    struct FlakySource;

    #[async_trait]
    impl ImageSource for FlakySource {
        async fn fetch_image(&self, src: &str) -> Result<Bytes, ClientError> {
            if src.ends_with("1.jpg") {
                Err(ClientError::Upstream {
                    status: 404,
                    error: "Not found".into(),
                    details: None,
                })
            } else {
                Ok(Bytes::from_static(b"img"))
            }
        }
    }

    #[tokio::test]
    async fn preload_swallows_failures_and_marks_the_rest() {
        let mut viewer = viewer();
        viewer.open(&photos(3), 0);

        let handle = viewer.preload(Arc::new(FlakySource)).unwrap();
        let outcome = handle.await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Completed(vec![
                "https://cdn.test/home/0.jpg".to_string(),
                "https://cdn.test/home/2.jpg".to_string(),
            ])
        );

        viewer.accept_preloaded(outcome);
        assert!(!viewer.is_loading());
        viewer.next();
        assert!(viewer.is_loading());
        viewer.next();
        assert!(!viewer.is_loading());
    }

    #[tokio::test]
    async fn reopening_supersedes_the_previous_preload() {
        let mut viewer = viewer();
        viewer.open(&photos(3), 0);
        let handle = viewer.preload(Arc::new(FlakySource)).unwrap();

        viewer.open(&photos(3), 2);
        let outcome = handle.await.unwrap();
        assert_eq!(outcome, Outcome::Superseded);

        viewer.accept_preloaded(outcome);
        assert!(viewer.is_loading());
    }

    #[tokio::test]
    async fn preload_after_close_is_superseded() {
        let mut viewer = viewer();
        viewer.open(&photos(2), 0);
        let handle = viewer.preload(Arc::new(FlakySource)).unwrap();
        viewer.close();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, Outcome::Superseded);
        viewer.accept_preloaded(outcome);
        assert!(!viewer.is_loading());
    }
}
