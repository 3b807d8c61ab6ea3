//! Backward position scanner.
//!
//! Walks a document snapshot leftward from a position, yielding the next
//! character that could plausibly anchor a point query. Trivia is skipped:
//! blank lines, single-line comments, preprocessor directives, whitespace,
//! and statement terminators never anchor a query. Crossing line 0 is a
//! terminal condition, not an error; the resolver answers it with the
//! whole-document root.

use tower_lsp::lsp_types::Position;

use crate::document::DocumentSnapshot;

/// Outcome of one scan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    /// Next candidate query anchor.
    At(Position),
    /// The scan crossed the start of the document.
    TopOfFile,
}

/// Characters that never anchor a query.
pub fn is_skippable_char(c: char) -> bool {
    c.is_whitespace() || c == ';'
}

/// Lines the scanner steps over without querying: blank lines, `//`
/// comments, and `#` preprocessor directives.
pub fn is_skippable_line(snapshot: &DocumentSnapshot, line: u32) -> bool {
    if snapshot.is_blank_line(line) {
        return true;
    }
    let text = snapshot.line_text(line);
    let trimmed = text.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with('#')
}

/// A restartable backward scan. The resolver may reposition the cursor
/// after a failed candidate (rewinding to the candidate node's range
/// start), so the cursor is plain mutable state rather than an iterator.
#[derive(Debug, Clone, Copy)]
pub struct ScanCursor {
    pub line: u32,
    pub character: u32,
}

impl ScanCursor {
    /// Starts a scan just before `position`.
    pub fn starting_at(position: Position) -> Self {
        ScanCursor {
            line: position.line,
            character: position.character,
        }
    }

    /// Moves the cursor to an earlier position, e.g. the start of a node
    /// that was queried and rejected.
    pub fn rewind_to(&mut self, position: Position) {
        if (position.line, position.character) < (self.line, self.character) {
            self.line = position.line;
            self.character = position.character;
        }
    }

    /// Advances to the next candidate anchor strictly left of the current
    /// position. On return the cursor sits on the candidate, so repeated
    /// calls make strict progress toward the start of the document.
    pub fn advance(&mut self, snapshot: &DocumentSnapshot) -> ScanStep {
        loop {
            if is_skippable_line(snapshot, self.line) {
                if !self.to_previous_line_end(snapshot) {
                    return ScanStep::TopOfFile;
                }
                continue;
            }
            // Clamp positions that landed past the end of a line.
            let line_len = snapshot.line_len(self.line) as u32;
            if self.character > line_len {
                self.character = line_len;
            }
            if self.character == 0 {
                if !self.to_previous_line_end(snapshot) {
                    return ScanStep::TopOfFile;
                }
                continue;
            }
            match snapshot.char_at(self.line, self.character - 1) {
                Some(c) if is_skippable_char(c) => {
                    self.character -= 1;
                }
                Some(_) => {
                    self.character -= 1;
                    return ScanStep::At(Position {
                        line: self.line,
                        character: self.character,
                    });
                }
                None => {
                    // Past the end of the line; step onto it.
                    self.character -= 1;
                }
            }
        }
    }

    fn to_previous_line_end(&mut self, snapshot: &DocumentSnapshot) -> bool {
        if self.line == 0 {
            return false;
        }
        self.line -= 1;
        self.character = snapshot.line_len(self.line) as u32;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use indoc::indoc;
    use tower_lsp::lsp_types::Url;

    async fn snapshot(text: &str) -> DocumentSnapshot {
        Document::new(Url::parse("file:///scan.c").unwrap(), text, 0)
            .snapshot()
            .await
    }

    fn pos(line: u32, character: u32) -> Position {
        Position { line, character }
    }

    /// Collects every candidate until the scan hits the top of the file.
    fn trace(snapshot: &DocumentSnapshot, from: Position) -> Vec<Position> {
        let mut cursor = ScanCursor::starting_at(from);
        let mut out = Vec::new();
        loop {
            match cursor.advance(snapshot) {
                ScanStep::At(p) => out.push(p),
                ScanStep::TopOfFile => return out,
            }
        }
    }

    #[tokio::test]
    async fn steps_over_whitespace_and_terminators() {
        let snap = snapshot("int x;  y\n").await;
        let mut cursor = ScanCursor::starting_at(pos(0, 8));
        // Left of column 8: two spaces and a ';' are skipped; 'x' anchors.
        assert_eq!(cursor.advance(&snap), ScanStep::At(pos(0, 4)));
        assert_eq!(cursor.advance(&snap), ScanStep::At(pos(0, 2)));
    }

    #[tokio::test]
    async fn skips_comment_lines_to_previous_line_end() {
        let snap = snapshot(indoc! {"
            int a = 1;
            // a comment about a
            int b = 2;
        "})
        .await;
        let candidates = trace(&snap, pos(1, 10));
        // No candidate may sit on the comment line.
        assert!(candidates.iter().all(|p| p.line != 1));
        assert_eq!(candidates[0], pos(0, 8));
    }

    #[tokio::test]
    async fn skips_preprocessor_and_blank_lines() {
        let snap = snapshot(indoc! {"
            int a;
            #define N 10

            int b;
        "})
        .await;
        let candidates = trace(&snap, pos(3, 0));
        assert!(candidates.iter().all(|p| p.line == 0));
    }

    #[tokio::test]
    async fn crossing_line_zero_terminates() {
        let snap = snapshot("int a;\n").await;
        let mut cursor = ScanCursor::starting_at(pos(0, 0));
        assert_eq!(cursor.advance(&snap), ScanStep::TopOfFile);
    }

    #[tokio::test]
    async fn scan_from_comment_only_file_terminates() {
        let snap = snapshot("// nothing here\n").await;
        let mut cursor = ScanCursor::starting_at(pos(0, 10));
        assert_eq!(cursor.advance(&snap), ScanStep::TopOfFile);
    }

    #[tokio::test]
    async fn rewind_only_moves_left() {
        let snap = snapshot("abc def\n").await;
        let mut cursor = ScanCursor::starting_at(pos(0, 7));
        assert_eq!(cursor.advance(&snap), ScanStep::At(pos(0, 6)));
        cursor.rewind_to(pos(0, 4));
        assert_eq!(cursor.advance(&snap), ScanStep::At(pos(0, 2)));
        // Rewinding forward is ignored.
        cursor.rewind_to(pos(0, 7));
        assert_eq!(cursor.advance(&snap), ScanStep::At(pos(0, 1)));
    }

    #[tokio::test]
    async fn candidates_strictly_decrease() {
        let snap = snapshot(indoc! {"
            void f() {
                g();
            }
        "})
        .await;
        let candidates = trace(&snap, pos(2, 1));
        for pair in candidates.windows(2) {
            assert!(
                (pair[1].line, pair[1].character) < (pair[0].line, pair[0].character),
                "scan must make progress: {:?} then {:?}",
                pair[0],
                pair[1]
            );
        }
    }
}
