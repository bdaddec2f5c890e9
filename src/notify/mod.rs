//! Operator notifications: a chat message per site visit.

mod geo;
mod telegram;

pub use geo::VisitorLocation;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Messaging provider returned {status}: {details}")]
    Upstream { status: u16, details: String },
    #[error("Messaging provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Visitor-supplied text followed by whatever the proxy told us about them.
pub fn format_message(text: &str, location: &VisitorLocation) -> String {
    let mut message = text.trim().to_string();

    if let Some(ref ip) = location.ip {
        message.push_str(&format!("\n\nIP: {ip}"));
    }
    if let Some(place) = location.describe() {
        if location.ip.is_none() {
            message.push('\n');
        }
        message.push_str(&format!("\nLocal: {place}"));
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_without_location_is_the_text() {
        let message = format_message(" Nova visita ", &VisitorLocation::default());
        assert_eq!(message, "Nova visita");
    }

    #[test]
    fn message_appends_ip_and_place() {
        let location = VisitorLocation {
            ip: Some("203.0.113.7".to_string()),
            city: Some("Recife".to_string()),
            region: Some("PE".to_string()),
            country: Some("BR".to_string()),
        };
        assert_eq!(
            format_message("Nova visita", &location),
            "Nova visita\n\nIP: 203.0.113.7\nLocal: Recife, PE, BR"
        );
    }

    #[test]
    fn message_with_place_but_no_ip() {
        let location = VisitorLocation {
            country: Some("PT".to_string()),
            ..Default::default()
        };
        assert_eq!(format_message("oi", &location), "oi\n\nLocal: PT");
    }
}
