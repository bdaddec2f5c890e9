use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::task::JoinHandle;

use super::task::{Outcome, Ticket};
use crate::client::ClientError;

/// Something that can fetch image bytes by public URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image(&self, src: &str) -> Result<Bytes, ClientError>;
}

/// Warm the cache for `sources` in order, stopping early once `ticket` goes
/// stale. Failures are logged and skipped. Resolves to the sources that
/// loaded.
pub fn spawn_preload(
    source: Arc<dyn ImageSource>,
    sources: Vec<String>,
    ticket: Ticket,
) -> JoinHandle<Outcome<Vec<String>>> {
    tokio::spawn(async move {
        let mut loaded = Vec::with_capacity(sources.len());
        for src in sources {
            if !ticket.is_current() {
                return Outcome::Superseded;
            }
            match source.fetch_image(&src).await {
                Ok(_) => loaded.push(src),
                Err(e) => tracing::warn!(src = %src, error = %e, "Preload failed"),
            }
        }
        ticket.run(async { loaded }).await
    })
}
