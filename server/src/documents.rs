//! Mirror of the client's open buffers.
//!
//! Every mutation produces a fresh immutable snapshot; in-flight requests
//! keep the snapshot they started with. The manager is the sole writer of
//! per-URL state and is driven from the dispatcher's logical thread.

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use swiftls_protocol::types::ContentChange;

use crate::textpos::LineTable;

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("document already open: {0}")]
    AlreadyOpen(Url),
    #[error("unknown document: {0}")]
    UnknownDocument(Url),
    #[error("change range {line}:{character} not derivable from the current text")]
    InvalidRange { line: u32, character: u32 },
}

struct SnapshotInner {
    url: Url,
    language: String,
    version: i32,
    table: LineTable,
}

/// Immutable captured state of a document at a version. Cheap to clone.
#[derive(Clone)]
pub struct DocumentSnapshot {
    inner: Arc<SnapshotInner>,
}

impl DocumentSnapshot {
    fn new(url: Url, language: String, version: i32, text: Arc<str>) -> Self {
        Self {
            inner: Arc::new(SnapshotInner {
                url,
                language,
                version,
                table: LineTable::new(text),
            }),
        }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.inner.language
    }

    #[must_use]
    pub fn version(&self) -> i32 {
        self.inner.version
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.inner.table.text()
    }

    #[must_use]
    pub fn line_table(&self) -> &LineTable {
        &self.inner.table
    }

    /// Byte offsets of a change against this snapshot: `(start, len)` for
    /// a ranged replacement, `(0, full len)` for a whole-buffer one.
    pub fn change_span(&self, change: &ContentChange) -> Result<(usize, usize), EditError> {
        match change.range {
            Some(range) => {
                let table = self.line_table();
                let start = table
                    .utf8_offset(range.start.line, range.start.character)
                    .ok_or(EditError::InvalidRange {
                        line: range.start.line,
                        character: range.start.character,
                    })?;
                let end = table
                    .utf8_offset(range.end.line, range.end.character)
                    .ok_or(EditError::InvalidRange {
                        line: range.end.line,
                        character: range.end.character,
                    })?;
                if end < start {
                    return Err(EditError::InvalidRange {
                        line: range.end.line,
                        character: range.end.character,
                    });
                }
                Ok((start, end - start))
            }
            None => Ok((0, self.text().len())),
        }
    }
}

impl std::fmt::Debug for DocumentSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSnapshot")
            .field("url", &self.inner.url.as_str())
            .field("version", &self.inner.version)
            .finish_non_exhaustive()
    }
}

/// Open documents, keyed by URL, each at its latest snapshot.
#[derive(Default)]
pub struct DocumentManager {
    open: HashMap<Url, DocumentSnapshot>,
}

impl DocumentManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        url: Url,
        language: String,
        version: i32,
        text: String,
    ) -> Result<DocumentSnapshot, EditError> {
        if self.open.contains_key(&url) {
            return Err(EditError::AlreadyOpen(url));
        }
        let snapshot = DocumentSnapshot::new(url.clone(), language, version, Arc::from(text));
        self.open.insert(url, snapshot.clone());
        Ok(snapshot)
    }

    /// Remove a document; unknown URLs are ignored. The removed snapshot
    /// is handed back so the caller can release the analyzer session.
    pub fn close(&mut self, url: &Url) -> Option<DocumentSnapshot> {
        self.open.remove(url)
    }

    #[must_use]
    pub fn latest_snapshot(&self, url: &Url) -> Option<DocumentSnapshot> {
        self.open.get(url).cloned()
    }

    #[must_use]
    pub fn open_urls(&self) -> Vec<Url> {
        self.open.keys().cloned().collect()
    }

    /// Apply a didChange batch in client-supplied order.
    ///
    /// `on_each` runs before each individual change with the pre-change
    /// snapshot, so the caller can mirror the mutation to the analyzer in
    /// the same order. A change whose offsets are not derivable aborts
    /// the sequence: already-applied changes stay, the rest are dropped.
    pub fn edit(
        &mut self,
        url: &Url,
        version: i32,
        changes: &[ContentChange],
        mut on_each: impl FnMut(&DocumentSnapshot, &ContentChange),
    ) -> Result<DocumentSnapshot, EditError> {
        let mut current = self
            .open
            .get(url)
            .cloned()
            .ok_or_else(|| EditError::UnknownDocument(url.clone()))?;

        for change in changes {
            on_each(&current, change);
            let (start, len) = match current.change_span(change) {
                Ok(span) => span,
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "aborting edit sequence");
                    self.open.insert(url.clone(), current);
                    return Err(e);
                }
            };
            let old = current.text();
            let mut text = String::with_capacity(old.len() - len + change.text.len());
            text.push_str(&old[..start]);
            text.push_str(&change.text);
            text.push_str(&old[start + len..]);
            // Intermediate snapshots keep the pre-edit version; only the
            // final snapshot adopts the notification's version.
            current = DocumentSnapshot::new(
                url.clone(),
                current.language().to_string(),
                current.version(),
                Arc::from(text),
            );
        }

        let final_snapshot = DocumentSnapshot::new(
            url.clone(),
            current.language().to_string(),
            version,
            current.line_table().text().clone(),
        );
        self.open.insert(url.clone(), final_snapshot.clone());
        Ok(final_snapshot)
    }
}
