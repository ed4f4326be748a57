use crate::parser::span::Span;

/// Offsets of line starts, built once per parsed source so node positions
/// can be turned into line numbers without rescanning the text.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        for (i, &b) in source.iter().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Returns (line, column) for a given byte offset.
    /// Both line and column are 0-based.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        if offset > self.len {
            let last_line = self.line_starts.len() - 1;
            let last_start = self.line_starts[last_line];
            return (last_line, self.len.saturating_sub(last_start));
        }

        match self.line_starts.binary_search(&offset) {
            Ok(line) => (line, 0),
            Err(insert_idx) => {
                let line = insert_idx - 1;
                (line, offset - self.line_starts[line])
            }
        }
    }

    /// 1-based line number of an offset, the way PHP reports `__LINE__`.
    pub fn line(&self, offset: usize) -> usize {
        self.line_col(offset).0 + 1
    }

    pub fn start_line(&self, span: Span) -> usize {
        self.line(span.start)
    }

    pub fn end_line(&self, span: Span) -> usize {
        self.line(span.end.saturating_sub(1).max(span.start))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
