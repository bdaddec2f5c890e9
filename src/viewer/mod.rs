//! Photo-viewer interaction core: gestures, pan bounds, slide rotation and
//! the per-session state tying them together.

pub mod gesture;
pub mod pan;
mod preload;
mod session;
pub mod slides;
mod task;

pub use gesture::{
    Bounds, GestureController, GestureEvent, GesturePhase, Handled, Navigation, ViewerState,
};
pub use pan::{clamp_pan, Size, Vec2, MAX_ZOOM, MIN_ZOOM};
pub use preload::{spawn_preload, ImageSource};
pub use session::PhotoViewer;
pub use slides::{Slide, SlideAdvancer, SLIDE_INTERVAL};
pub use task::{Generation, Outcome, Ticket};
