// ── File-download helpers ──
//
// Export replies arrive as binary blobs with an optional
// `content-disposition` header naming the file. The behavior layer
// extracts the name (or synthesizes a timestamped one) and hands the
// bytes to an injected `FileSaver`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    // `attachment; filename="report.xls"` or `...; filename=report.xls`.
    // The RFC 5987 `filename*=charset''value` form is deliberately not
    // matched: its value needs charset decoding before it is a name.
    Regex::new(r#"filename="?([^";]+)"?"#).expect("filename pattern is valid")
});

/// Extract the filename from a `content-disposition` header value.
pub fn disposition_filename(disposition: &str) -> Option<String> {
    FILENAME
        .captures(disposition)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|name| !name.is_empty())
}

/// Name for a download with no usable `content-disposition`:
/// the current timestamp with an `.xls` extension.
pub fn fallback_filename() -> String {
    format!("{}.xls", chrono::Utc::now().timestamp_millis())
}

/// Resolve the saved filename from an optional header value.
pub fn saved_filename(disposition: Option<&str>) -> String {
    disposition
        .and_then(disposition_filename)
        .unwrap_or_else(fallback_filename)
}

/// Host-environment file-save collaborator. Fire-and-forget: the
/// behavior layer never observes the outcome.
pub trait FileSaver: Send + Sync {
    fn save(&self, bytes: &[u8], filename: &str);
}

/// Default saver: logs and discards. Hosts inject their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSaver;

impl FileSaver for DiscardSaver {
    fn save(&self, bytes: &[u8], filename: &str) {
        debug!(filename, size = bytes.len(), "discarding download (no file saver installed)");
    }
}
