use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo<'src> {
    pub line: usize,
    pub column: usize,
    pub line_text: &'src [u8],
}

/// Byte range into the source text a node was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end.max(self.end))
    }

    pub fn line_info<'src>(&self, source: &'src [u8]) -> Option<LineInfo<'src>> {
        if self.start > self.end || self.end > source.len() {
            return None;
        }

        let line = source[..self.start].iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = source[..self.start]
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let column = self.start - line_start + 1;

        let line_end = source[self.start..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|pos| self.start + pos)
            .unwrap_or(source.len());

        Some(LineInfo {
            line,
            column,
            line_text: &source[line_start..line_end],
        })
    }

    /// Slice the source, clamping out-of-range spans to an empty slice.
    pub fn as_str<'src>(&self, source: &'src [u8]) -> &'src [u8] {
        source.get(self.start..self.end).unwrap_or_default()
    }
}
