//! Candidate file selection
//!
//! Filters a remote directory listing down to the files one feed should
//! ingest: names the feed's filename predicate accepts, minus names the
//! processed-file registry has already recorded. Registry lookups run
//! concurrently with bounded fan-out; the stream preserves listing order so
//! files are processed oldest-first when the remote sorts them that way.

use crate::parser::{FileMeta, SettlementParser};
use crate::ports::{ProcessedFileRegistry, RemoteFile};
use futures::{stream, StreamExt};
use std::sync::Arc;
use tracing::warn;

/// Select the files a feed should ingest from a directory listing
///
/// A registry lookup failure drops that candidate only: the file stays
/// unmarked and will be retried on the next sweep.
pub async fn select_files(
    listing: Vec<RemoteFile>,
    parser: SettlementParser,
    registry: Arc<dyn ProcessedFileRegistry>,
    fan_out: usize,
) -> Vec<FileMeta> {
    let candidates = listing
        .into_iter()
        .filter(|file| parser.file_filter(&file.name));

    stream::iter(candidates)
        .map(|file| {
            let registry = Arc::clone(&registry);
            async move {
                match registry.is_unprocessed(&file.name).await {
                    Ok(true) => Some(file.name),
                    Ok(false) => None,
                    Err(error) => {
                        warn!(file = %file.name, %error, "registry lookup failed; skipping file");
                        None
                    }
                }
            }
        })
        .buffered(fan_out.max(1))
        .filter_map(|name| async move {
            name.map(|name| {
                let gateway = parser.gateway_for(&name);
                FileMeta::new(name, gateway)
            })
        })
        .collect()
        .await
}
