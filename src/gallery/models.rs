use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub src: String,
    pub alt: String,
    /// Full object path the photo was listed from
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub cover: String,
    pub photos: Vec<Photo>,
}

/// Payload of the public listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteListing {
    pub home_photos: Vec<Photo>,
    pub albums: Vec<Album>,
    // Always null; the front end still reads these keys.
    pub logo_url: Option<String>,
    pub sobre_url: Option<String>,
    pub about_photo_url: Option<String>,
}
