//! Public photo listing: turns bucket keys into home photos and albums.
//!
//! Store layout is `home/<file>` and `albuns/<album title>/<file>`.

mod collate;
pub mod models;
mod resolver;
mod slug;

pub use collate::locale_cmp;
pub use models::{Album, Photo, SiteListing};
pub use resolver::{file_name, is_image, ObjectPathResolver};
pub use slug::to_album_id;
