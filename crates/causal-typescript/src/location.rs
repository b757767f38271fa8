use swc_common::{BytePos, Span};

/// Converter from swc byte positions to line and column numbers.
///
/// swc positions are global to the `SourceMap` that produced them; `base` is
/// the start position of this file inside that map.
pub struct LocationConverter {
    source: String,
    base: u32,
    line_starts: Vec<usize>,
}

impl LocationConverter {
    /// Creates a converter for a file starting at position zero
    pub fn new(source: String) -> Self {
        Self::with_base(source, 0)
    }

    /// Creates a converter for a file whose first byte sits at `base` in the source map
    pub fn with_base(source: String, base: u32) -> Self {
        let line_starts = Self::calculate_line_starts(&source);
        Self {
            source,
            base,
            line_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Converts a file-relative byte offset to line and column number (1-based)
    pub fn byte_offset_to_location(&self, offset: usize) -> (usize, usize) {
        if offset > self.source.len() {
            let last_line = self.line_starts.len().max(1);
            let last_col = self
                .source
                .len()
                .saturating_sub(*self.line_starts.last().unwrap_or(&0))
                .max(1);
            return (last_line, last_col);
        }

        let (line, line_start_pos) = match self.line_starts.binary_search(&offset) {
            Ok(idx) => (idx + 1, self.line_starts[idx]),
            Err(idx) => {
                let line_start = if idx == 0 { 0 } else { self.line_starts[idx - 1] };
                (idx.max(1), line_start)
            }
        };

        let column = offset.saturating_sub(line_start_pos) + 1;
        (line, column)
    }

    /// File-relative offset of a source-map position
    pub fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.base) as usize
    }

    /// 1-based line of a source-map position
    pub fn line(&self, pos: BytePos) -> usize {
        self.byte_offset_to_location(self.offset(pos)).0
    }

    /// Source text covered by `span`, empty when the span falls outside the file
    pub fn text(&self, span: Span) -> &str {
        let lo = self.offset(span.lo);
        let hi = self.offset(span.hi);
        self.source.get(lo..hi).unwrap_or("")
    }

    fn calculate_line_starts(source: &str) -> Vec<usize> {
        let mut line_starts = vec![0];
        for (pos, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(pos + 1);
            }
        }
        line_starts
    }
}
