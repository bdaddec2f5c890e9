use axum::http::HeaderMap;
use percent_encoding::percent_decode_str;

/// Best-effort visitor location from reverse-proxy headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitorLocation {
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

const CITY_HEADERS: &[&str] = &["cf-ipcity", "x-vercel-ip-city", "x-appengine-city"];
const REGION_HEADERS: &[&str] = &[
    "cf-region-code",
    "cf-region",
    "x-vercel-ip-country-region",
    "x-appengine-region",
];
const COUNTRY_HEADERS: &[&str] = &["cf-ipcountry", "x-vercel-ip-country", "x-appengine-country"];

impl VisitorLocation {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = header(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .or_else(|| first_of(headers, &["cf-connecting-ip", "x-real-ip"]));

        Self {
            ip,
            city: first_of(headers, CITY_HEADERS),
            region: first_of(headers, REGION_HEADERS),
            // "XX" is Cloudflare's unknown-country marker
            country: first_of(headers, COUNTRY_HEADERS).filter(|c| c != "XX"),
        }
    }

    /// "City, Region, Country" with missing parts left out.
    pub fn describe(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn first_of(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| header(headers, name))
        .map(|v| percent_decode_str(v.trim()).decode_utf8_lossy().into_owned())
        .find(|v| !v.is_empty())
}
