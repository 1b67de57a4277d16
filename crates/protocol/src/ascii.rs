//! Streaming LF/CRLF line-ending conversion for `TYPE A` transfers.
//!
//! [`AsciiConverter`] sits between a byte source and a byte sink. It never
//! looks ahead past what it has already been given: a chunk ending mid-line
//! is buffered and completed by the next call, so a logical line is never
//! split across the terminator itself and a file with no terminator at all
//! passes through byte-for-byte.

/// Direction of the line-ending rewrite.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AsciiMode {
    /// Uploads into the server: normalize to CRLF.
    ToCrlf,
    /// Downloads to the client: normalize to LF.
    ToLf,
}

/// Incremental LF/CRLF converter. Feed it chunks via [`Self::convert`] in
/// order, then call [`Self::finish`] once the source is exhausted to flush
/// a final unterminated line.
#[derive(Debug)]
pub struct AsciiConverter {
    mode: AsciiMode,
    pending: Vec<u8>,
}

impl AsciiConverter {
    /// Creates a converter in the given direction with empty carry state.
    #[must_use]
    pub fn new(mode: AsciiMode) -> Self {
        Self {
            mode,
            pending: Vec::new(),
        }
    }

    fn terminator(&self) -> &'static [u8] {
        match self.mode {
            AsciiMode::ToCrlf => b"\r\n",
            AsciiMode::ToLf => b"\n",
        }
    }

    /// Converts `input`, appending rewritten bytes to `output`. Any
    /// trailing bytes that don't yet form a complete line are retained
    /// internally and prefixed to the next call's input.
    pub fn convert(&mut self, input: &[u8], output: &mut Vec<u8>) {
        self.pending.extend_from_slice(input);

        let mut start = 0;
        while let Some(rel_pos) = memchr::memchr(b'\n', &self.pending[start..]) {
            let nl_pos = start + rel_pos;
            let line_end = if nl_pos > start && self.pending[nl_pos - 1] == b'\r' {
                nl_pos - 1
            } else {
                nl_pos
            };
            output.extend_from_slice(&self.pending[start..line_end]);
            output.extend_from_slice(self.terminator());
            start = nl_pos + 1;
        }

        self.pending.drain(..start);
    }

    /// Flushes any buffered, unterminated final line to `output` unchanged
    /// (a file lacking a terminator passes through as-is).
    pub fn finish(mut self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.pending);
        self.pending.clear();
    }
}

/// Converts a full in-memory buffer in one call; a convenience wrapper
/// around [`AsciiConverter`] for callers that already have the whole file.
#[must_use]
pub fn convert_all(mode: AsciiMode, input: &[u8]) -> Vec<u8> {
    let mut converter = AsciiConverter::new(mode);
    let mut output = Vec::with_capacity(input.len());
    converter.convert(input, &mut output);
    converter.finish(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lf_to_crlf_rewrites_each_line() {
        let out = convert_all(AsciiMode::ToCrlf, b"one\ntwo\nthree");
        assert_eq!(out, b"one\r\ntwo\r\nthree");
    }

    #[test]
    fn crlf_to_lf_rewrites_each_line() {
        let out = convert_all(AsciiMode::ToLf, b"one\r\ntwo\r\nthree");
        assert_eq!(out, b"one\ntwo\nthree");
    }

    #[test]
    fn crlf_source_is_not_doubled_when_converting_to_crlf() {
        let out = convert_all(AsciiMode::ToCrlf, b"one\r\ntwo\r\n");
        assert_eq!(out, b"one\r\ntwo\r\n");
    }

    #[test]
    fn file_without_terminator_passes_through() {
        let out = convert_all(AsciiMode::ToCrlf, b"no terminator here");
        assert_eq!(out, b"no terminator here");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(convert_all(AsciiMode::ToCrlf, b""), b"");
    }

    #[test]
    fn chunked_feed_matches_single_shot() {
        let whole = b"alpha\nbeta\ngamma\ndelta";
        let mut chunked = Vec::new();
        let mut converter = AsciiConverter::new(AsciiMode::ToCrlf);
        for chunk in whole.chunks(3) {
            converter.convert(chunk, &mut chunked);
        }
        converter.finish(&mut chunked);

        assert_eq!(chunked, convert_all(AsciiMode::ToCrlf, whole));
    }

    #[test]
    fn terminator_split_across_chunks_is_not_doubled() {
        let mut output = Vec::new();
        let mut converter = AsciiConverter::new(AsciiMode::ToLf);
        converter.convert(b"line1\r", &mut output);
        converter.convert(b"\nline2\r\n", &mut output);
        converter.finish(&mut output);
        assert_eq!(output, b"line1\nline2\n");
    }
}
