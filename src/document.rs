//! Open-document state: text, identity, and the monotonic edit version the
//! result cache keys its invalidation on.

use ropey::Rope;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};
use tracing::warn;

pub fn position_to_offset(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    let character = position.character as usize;
    text.line_to_char(line) + character
}

#[derive(Debug)]
pub struct DocumentState {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
}

impl DocumentState {
    /// Applies a batch of content changes at the given version. Changes at
    /// or below the current version are dropped: the cache invalidation
    /// contract only needs the version to move forward.
    pub fn apply(&mut self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) {
        if version <= self.version {
            warn!(
                "Ignoring changes at version {} (document already at {})",
                version, self.version
            );
            return;
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_offset(&range.start, &self.text);
                let end = position_to_offset(&range.end, &self.text);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
    }
}

/// An open document. Shared across resolution requests; all access goes
/// through the read-write lock.
#[derive(Debug)]
pub struct Document {
    pub state: RwLock<DocumentState>,
}

impl Document {
    pub fn new(uri: Url, text: &str, version: i32) -> Self {
        Document {
            state: RwLock::new(DocumentState {
                uri,
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    pub async fn apply(&self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) {
        self.state.write().await.apply(changes, version);
    }

    /// Pins the current text and version for one resolution request. Rope
    /// clones are O(1), so this is cheap.
    pub async fn snapshot(&self) -> DocumentSnapshot {
        let state = self.state.read().await;
        DocumentSnapshot {
            uri: state.uri.clone(),
            text: state.text.clone(),
            version: state.version,
        }
    }
}

/// Immutable view of a document at one version. The scanner walks this so a
/// resolution request never observes a half-applied edit.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
}

impl DocumentSnapshot {
    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    /// Number of characters on a line, excluding the line break.
    pub fn line_len(&self, line: u32) -> usize {
        let line = line as usize;
        if line >= self.text.len_lines() {
            return 0;
        }
        let slice = self.text.line(line);
        let mut len = slice.len_chars();
        let mut chars = slice.chars_at(len);
        while let Some(c) = chars.prev() {
            if c == '\n' || c == '\r' {
                len -= 1;
            } else {
                break;
            }
        }
        len
    }

    pub fn line_text(&self, line: u32) -> String {
        let line = line as usize;
        if line >= self.text.len_lines() {
            return String::new();
        }
        self.text.line(line).to_string()
    }

    pub fn char_at(&self, line: u32, character: u32) -> Option<char> {
        if (character as usize) >= self.line_len(line) {
            return None;
        }
        let offset = self.text.line_to_char(line as usize) + character as usize;
        Some(self.text.char(offset))
    }

    pub fn is_blank_line(&self, line: u32) -> bool {
        self.line_text(line).chars().all(|c| c.is_whitespace())
    }

    /// Index of the first non-whitespace character on a line, if any.
    pub fn first_non_whitespace(&self, line: u32) -> Option<usize> {
        self.line_text(line)
            .chars()
            .position(|c| !c.is_whitespace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn doc(text: &str) -> Document {
        Document::new(Url::parse("file:///test.c").unwrap(), text, 0)
    }

    #[tokio::test]
    async fn apply_full_change_bumps_version() {
        let d = doc("int x;");
        d.apply(
            vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "int y;".to_string(),
            }],
            1,
        )
        .await;
        assert_eq!(d.text().await, "int y;");
        assert_eq!(d.version().await, 1);
    }

    #[tokio::test]
    async fn apply_incremental_change() {
        let d = doc("int sum = 0;");
        d.apply(
            vec![TextDocumentContentChangeEvent {
                range: Some(Range {
                    start: Position { line: 0, character: 4 },
                    end: Position { line: 0, character: 7 },
                }),
                range_length: None,
                text: "total".to_string(),
            }],
            1,
        )
        .await;
        assert_eq!(d.text().await, "int total = 0;");
    }

    #[tokio::test]
    async fn stale_version_is_dropped() {
        let d = doc("a");
        d.apply(
            vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "b".to_string(),
            }],
            2,
        )
        .await;
        d.apply(
            vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "c".to_string(),
            }],
            1,
        )
        .await;
        assert_eq!(d.text().await, "b");
        assert_eq!(d.version().await, 2);
    }

    #[tokio::test]
    async fn snapshot_accessors() {
        let d = doc("int main() {\n    // setup\n\n    return 0;\n}\n");
        let snap = d.snapshot().await;
        assert_eq!(snap.line_len(0), 12);
        assert_eq!(snap.char_at(0, 0), Some('i'));
        assert_eq!(snap.char_at(0, 12), None);
        assert!(snap.is_blank_line(2));
        assert_eq!(snap.first_non_whitespace(1), Some(4));
        assert_eq!(snap.first_non_whitespace(3), Some(4));
    }

    #[tokio::test]
    async fn snapshot_is_pinned_across_edits() {
        let d = doc("old");
        let snap = d.snapshot().await;
        d.apply(
            vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "new".to_string(),
            }],
            1,
        )
        .await;
        assert_eq!(snap.text.to_string(), "old");
        assert_eq!(snap.version, 0);
        assert_eq!(d.version().await, 1);
    }
}
