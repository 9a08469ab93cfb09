//! Cuts complete sentences out of the accumulated text.
//!
//! A frame is `$`, a body without `$`, `*` and two hex digits. A `\r` and/or `\n` directly
//! after the checksum belong to the frame when consuming, but are not part of the yielded
//! text. Only the shape of the checksum is checked here; the decoder verifies the value.
use core::ops::Range;

use super::Accumulator;

/// Location of one frame in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The sentence, `$` up to and including the checksum digits.
    pub frame: Range<usize>,
    /// End of the frame including the optional line terminator.
    pub end: usize,
}

/// One complete sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a>(&'a str);

impl<'a> Frame<'a> {
    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// The two checksum digits as sent.
    pub fn checksum(&self) -> Option<u8> {
        let (_, hex) = self.0.rsplit_once('*')?;
        u8::from_str_radix(hex, 16).ok()
    }

    /// XOR of everything between `$` and `*`.
    pub fn calculated_checksum(&self) -> u8 {
        let body = &self.0[1..self.0.len() - 3];
        body.bytes().fold(0, |c, b| c ^ b)
    }

    pub fn checksum_matches(&self) -> bool {
        self.checksum() == Some(self.calculated_checksum())
    }
}

/// Frames extracted in one pass. Owns the consumed text, frames borrow from it.
#[derive(Debug, Default)]
pub struct Frames {
    text: String,
    spans: Vec<Range<usize>>,
}

impl Frames {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Frame<'_>> {
        self.spans.get(i).map(|s| Frame(&self.text[s.clone()]))
    }

    pub fn iter(&self) -> impl Iterator<Item = Frame<'_>> + '_ {
        self.spans.iter().map(move |s| Frame(&self.text[s.clone()]))
    }

    /// Everything that was removed from the buffer, including garbage between frames.
    pub fn consumed(&self) -> &str {
        &self.text
    }
}

fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

/// Find all non-overlapping frames in `text`, left to right.
///
/// The body is greedy: the frame closes at the rightmost `*HH` before the next `$`.
pub fn scan(text: &str) -> Vec<Span> {
    let b = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = match b.iter().position(|&c| c == b'$') {
        Some(s) => s,
        None => return spans,
    };

    loop {
        let next = b[start + 1..]
            .iter()
            .position(|&c| c == b'$')
            .map(|p| p + start + 1);
        let run = next.unwrap_or(b.len());

        // rightmost '*' with two hex digits that fits in [start + 1, run)
        let star = (start + 1..run.saturating_sub(2))
            .rev()
            .find(|&i| b[i] == b'*' && is_hex(b[i + 1]) && is_hex(b[i + 2]));

        if let Some(star) = star {
            let frame = start..star + 3;
            let mut end = frame.end;
            if b.get(end) == Some(&b'\r') {
                end += 1;
            }
            if b.get(end) == Some(&b'\n') {
                end += 1;
            }

            spans.push(Span { frame, end });
        }

        match next {
            Some(n) => start = n,
            None => break,
        }
    }

    spans
}

/// Take every complete frame out of the accumulator, leaving only the unconsumed tail.
///
/// With no frames the buffer is left as is.
pub fn extract(acc: &mut Accumulator) -> Frames {
    let spans = scan(acc.as_str());

    let end = match spans.last() {
        Some(s) => s.end,
        None => return Frames::default(),
    };

    let text = acc.take_front(end);

    Frames {
        text,
        spans: spans.into_iter().map(|s| s.frame).collect(),
    }
}
