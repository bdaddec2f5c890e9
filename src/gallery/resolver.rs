use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::collate::locale_cmp;
use super::models::{Album, Photo, SiteListing};
use super::slug::to_album_id;
use crate::config::{LayoutConfig, StorageConfig};

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "avif"];

/// Maps flat object-store keys onto the home photo / album model.
#[derive(Debug, Clone)]
pub struct ObjectPathResolver {
    home_prefix: String,
    albums_prefix: String,
    public_base_url: String,
}

impl ObjectPathResolver {
    pub fn new(layout: &LayoutConfig, storage: &StorageConfig) -> Self {
        Self {
            home_prefix: format!("{}/", layout.home_root),
            albums_prefix: format!("{}/", layout.albums_root),
            public_base_url: storage.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public URL of an object: every segment URI-encoded, then prefixed.
    pub fn public_url(&self, path: &str) -> String {
        let encoded = path
            .split('/')
            .map(|segment| utf8_percent_encode(segment, URI_COMPONENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{encoded}", self.public_base_url)
    }

    /// Build a fresh listing from a full set of keys.
    ///
    /// Albums whose titles share a slug are merged under the first title seen.
    /// Titles with no ASCII letters or digits all share the empty id.
    pub fn resolve<'a, I>(&self, keys: I) -> SiteListing
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut home_photos = Vec::new();
        let mut albums: Vec<Album> = Vec::new();
        let mut album_index: HashMap<String, usize> = HashMap::new();

        for path in keys {
            if !is_image(path) {
                continue;
            }

            if path.starts_with(&self.home_prefix) {
                home_photos.push(self.photo(path));
                continue;
            }

            let Some(rest) = path.strip_prefix(&self.albums_prefix) else {
                continue;
            };
            let Some((title, file)) = rest.split_once('/') else {
                continue;
            };
            if title.is_empty() || file.is_empty() {
                continue;
            }

            let id = to_album_id(title);
            let slot = *album_index.entry(id.clone()).or_insert_with(|| {
                albums.push(Album {
                    id,
                    title: title.to_string(),
                    cover: String::new(),
                    photos: Vec::new(),
                });
                albums.len() - 1
            });
            albums[slot].photos.push(self.photo(path));
        }

        home_photos.sort_by(|a, b| locale_cmp(&a.path, &b.path));

        for album in &mut albums {
            album.photos.sort_by(|a, b| locale_cmp(&a.path, &b.path));
            album.cover = album
                .photos
                .first()
                .map(|p| p.src.clone())
                .unwrap_or_default();
        }
        albums.sort_by(|a, b| locale_cmp(&a.title, &b.title));

        SiteListing {
            home_photos,
            albums,
            ..Default::default()
        }
    }

    fn photo(&self, path: &str) -> Photo {
        Photo {
            src: self.public_url(path),
            alt: file_name(path).to_string(),
            path: path.to_string(),
        }
    }
}

pub fn is_image(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        None => false,
    }
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
