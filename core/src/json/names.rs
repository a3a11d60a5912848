//! Caps how much of a top-level member name reaches the parser.
//!
//! The parser hands out a member name only once it holds all of it. In the
//! top-level object a name matters only if it equals a tracked field, so
//! after `limit` raw bytes (cut on a character boundary) the rest of the name
//! is validated here and dropped. The parser then sees a prefix that is
//! still too long to equal any tracked field.
//!
//! Dropped bytes shift every later parser position. `SourceMap` records the
//! gaps so that errors can be reported at stream offsets.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::rc::Rc;

use thiserror::Error;

use crate::constants::MIN_NAME_PREFIX;

/// Raw bytes a single decoded byte may take at most (`\u0061` for `a`).
const MAX_ESCAPE_EXPANSION: usize = 6;

/// Raw name bytes kept when the longest tracked field is `longest` bytes.
/// Any prefix at least this long decodes to more than `longest` bytes.
pub fn name_limit(longest: usize) -> usize {
    (MAX_ESCAPE_EXPANSION * (longest + 1)).max(MIN_NAME_PREFIX)
}

/// Malformed content in the dropped part of a member name. Travels to the
/// parser inside an `io::Error` of kind `InvalidData`.
#[derive(Debug, Error)]
#[error("{message} in member name")]
pub struct NameSyntaxError {
    /// Parser position at which the bad byte would have appeared.
    pub position: u64,
    pub message: &'static str,
}

impl NameSyntaxError {
    pub fn find(error: &io::Error) -> Option<&NameSyntaxError> {
        error.get_ref()?.downcast_ref::<NameSyntaxError>()
    }
}

#[derive(Debug, Default)]
pub struct SourceMap {
    consumed: u64,
    eof: bool,
    /// Bytes of gaps that lie before every position still reportable.
    settled: u64,
    /// `(parser position, bytes dropped just before it)`, oldest first.
    gaps: VecDeque<(u64, u64)>,
    /// Gap of the name currently being dropped.
    open: Option<(u64, u64)>,
}

impl SourceMap {
    /// Bytes taken from the underlying stream so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Whether the underlying stream has reported end of input.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    pub fn has_gaps(&self) -> bool {
        !self.gaps.is_empty()
    }

    pub fn source_offset(&self, position: u64) -> u64 {
        let pending: u64 = self
            .gaps
            .iter()
            .chain(self.open.iter())
            .take_while(|(at, _)| *at <= position)
            .map(|(_, n)| n)
            .sum();
        position + self.settled + pending
    }

    /// Nothing before `position` will be reported again.
    pub fn settle(&mut self, position: u64) {
        while let Some(&(at, n)) = self.gaps.front() {
            if at > position {
                break;
            }
            self.settled += n;
            self.gaps.pop_front();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Escape {
    #[default]
    None,
    Backslash,
    Hex { left: u8, code: u16 },
}

enum Scan {
    Content,
    End,
}

/// String content checker: escapes, surrogate pairs, UTF-8 sequences.
#[derive(Debug, Clone, Copy, Default)]
struct NameScan {
    escape: Escape,
    high_surrogate: bool,
    utf8: [u8; 4],
    have: u8,
    need: u8,
}

impl NameScan {
    /// Between two complete characters.
    fn at_boundary(&self) -> bool {
        self.escape == Escape::None && self.need == 0 && !self.high_surrogate
    }

    fn push(&mut self, b: u8) -> Result<Scan, &'static str> {
        match self.escape {
            Escape::Backslash => {
                self.escape = match b {
                    b'u' => Escape::Hex { left: 4, code: 0 },
                    b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' if self.high_surrogate => {
                        return Err("unpaired surrogate escape")
                    }
                    b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => Escape::None,
                    _ => return Err("invalid escape sequence"),
                };
            }
            Escape::Hex { left, code } => {
                let digit = (b as char).to_digit(16).ok_or("invalid \\u escape")?;
                let code = code << 4 | digit as u16;
                if left > 1 {
                    self.escape = Escape::Hex { left: left - 1, code };
                } else {
                    self.escape = Escape::None;
                    self.code_unit(code)?;
                }
            }
            Escape::None if self.need > 0 => {
                if b & 0xc0 != 0x80 {
                    return Err("invalid UTF-8");
                }
                self.utf8[self.have as usize] = b;
                self.have += 1;
                if self.have == self.need {
                    std::str::from_utf8(&self.utf8[..self.need as usize]).map_err(|_| "invalid UTF-8")?;
                    self.have = 0;
                    self.need = 0;
                }
            }
            Escape::None => {
                if self.high_surrogate && b != b'\\' {
                    return Err("unpaired surrogate escape");
                }
                match b {
                    b'"' => return Ok(Scan::End),
                    b'\\' => self.escape = Escape::Backslash,
                    0x00..=0x1f => return Err("unescaped control character"),
                    0x20..=0x7f => {}
                    _ => {
                        self.need = match b {
                            0xc2..=0xdf => 2,
                            0xe0..=0xef => 3,
                            0xf0..=0xf4 => 4,
                            _ => return Err("invalid UTF-8"),
                        };
                        self.utf8[0] = b;
                        self.have = 1;
                    }
                }
            }
        }
        Ok(Scan::Content)
    }

    fn code_unit(&mut self, unit: u16) -> Result<(), &'static str> {
        match unit {
            0xd800..=0xdbff if !self.high_surrogate => self.high_surrogate = true,
            0xdc00..=0xdfff if self.high_surrogate => self.high_surrogate = false,
            0xd800..=0xdfff => return Err("unpaired surrogate escape"),
            _ if self.high_surrogate => return Err("unpaired surrogate escape"),
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Lex {
    Structure,
    /// Any string other than a top-level member name.
    Text { escaped: bool },
    /// Top-level member name, `kept` content bytes forwarded.
    Name { scan: NameScan, kept: usize },
    /// Rest of an over-long top-level member name.
    Dropping { scan: NameScan, at: u64, dropped: u64 },
}

/// `Read` adapter placed between the stream and the parser.
pub struct NameLimit<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
    limit: usize,
    lex: Lex,
    depth: usize,
    started: bool,
    top_object: bool,
    expect_name: bool,
    consumed: u64,
    emitted: u64,
    eof: bool,
    map: Rc<RefCell<SourceMap>>,
}

impl<R: Read> NameLimit<R> {
    pub fn new(inner: R, read_buffer: usize, limit: usize, map: Rc<RefCell<SourceMap>>) -> Self {
        Self {
            inner,
            buf: vec![0u8; read_buffer.max(1)].into_boxed_slice(),
            pos: 0,
            len: 0,
            limit,
            lex: Lex::Structure,
            depth: 0,
            started: false,
            top_object: false,
            expect_name: false,
            consumed: 0,
            emitted: 0,
            eof: false,
            map,
        }
    }

    fn fill(&mut self, out: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos == self.len {
                let n = self.inner.read(&mut self.buf)?;
                if n == 0 {
                    self.eof = true;
                    return Ok(0);
                }
                self.pos = 0;
                self.len = n;
            }

            let mut written = 0;
            while self.pos < self.len && written < out.len() {
                let b = self.buf[self.pos];
                match self.step(b) {
                    Ok(true) => {
                        out[written] = b;
                        written += 1;
                        self.emitted += 1;
                    }
                    Ok(false) => {}
                    // hand over what is good; the bad byte fails the next read
                    Err(_) if written > 0 => return Ok(written),
                    Err(e) => return Err(e),
                }
                self.pos += 1;
                self.consumed += 1;
            }
            if written > 0 {
                return Ok(written);
            }
        }
    }

    /// Advance the lexer by one byte; `false` drops the byte.
    fn step(&mut self, b: u8) -> io::Result<bool> {
        match self.lex {
            Lex::Structure => {
                self.structure(b);
                Ok(true)
            }
            Lex::Text { escaped } => {
                self.lex = match (escaped, b) {
                    (true, _) => Lex::Text { escaped: false },
                    (false, b'\\') => Lex::Text { escaped: true },
                    (false, b'"') => Lex::Structure,
                    _ => Lex::Text { escaped: false },
                };
                Ok(true)
            }
            Lex::Name { mut scan, kept } => {
                if kept >= self.limit && scan.at_boundary() && b != b'"' {
                    self.lex = Lex::Dropping { scan, at: self.emitted, dropped: 0 };
                    return self.step(b);
                }
                self.lex = match scan.push(b) {
                    Ok(Scan::Content) => Lex::Name { scan, kept: kept + 1 },
                    Ok(Scan::End) => Lex::Structure,
                    // the parser reports it
                    Err(_) => Lex::Text { escaped: false },
                };
                Ok(true)
            }
            Lex::Dropping { mut scan, at, dropped } => match scan.push(b) {
                Ok(Scan::Content) => {
                    self.lex = Lex::Dropping { scan, at, dropped: dropped + 1 };
                    Ok(false)
                }
                Ok(Scan::End) => {
                    self.map.borrow_mut().gaps.push_back((at, dropped));
                    self.lex = Lex::Structure;
                    Ok(true)
                }
                Err(message) => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    NameSyntaxError { position: self.emitted, message },
                )),
            },
        }
    }

    fn structure(&mut self, b: u8) {
        match b {
            b'{' | b'[' => {
                if self.depth == 0 && !self.started {
                    self.started = true;
                    self.top_object = b == b'{';
                }
                self.depth += 1;
                self.expect_name = self.depth == 1 && self.top_object;
            }
            b'}' | b']' => {
                self.depth = self.depth.saturating_sub(1);
                self.expect_name = false;
            }
            b',' => self.expect_name = self.depth == 1 && self.top_object,
            b'"' => {
                self.lex = if self.expect_name {
                    Lex::Name { scan: NameScan::default(), kept: 0 }
                } else {
                    Lex::Text { escaped: false }
                };
                self.expect_name = false;
            }
            b' ' | b'\t' | b'\n' | b'\r' => {}
            _ => self.expect_name = false,
        }
    }

    fn sync(&self) {
        let mut map = self.map.borrow_mut();
        map.consumed = self.consumed;
        map.eof = self.eof;
        map.open = match self.lex {
            Lex::Dropping { at, dropped, .. } => Some((at, dropped)),
            _ => None,
        };
    }
}

impl<R: Read> Read for NameLimit<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let result = self.fill(out);
        self.sync();
        result
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn limited(doc: &[u8], limit: usize) -> (io::Result<Vec<u8>>, Rc<RefCell<SourceMap>>) {
        let map = Rc::new(RefCell::new(SourceMap::default()));
        let mut out = Vec::new();
        let result = NameLimit::new(doc, 7, limit, Rc::clone(&map)).read_to_end(&mut out).map(|_| out);
        (result, map)
    }

    fn only_key(doc: &[u8]) -> String {
        let value: Value = serde_json::from_slice(doc).unwrap();
        value.as_object().unwrap().keys().next().unwrap().clone()
    }

    #[test]
    fn floor_applies_to_short_fields() {
        assert_eq!(name_limit(6), MIN_NAME_PREFIX);
        assert_eq!(name_limit(100), 606);
    }

    #[test]
    fn short_names_pass_through() {
        let doc = br#"{"name":["a"],"other":{"deep":"x"}}"#;
        let (out, map) = limited(doc, 8);
        assert_eq!(out.unwrap(), doc.to_vec());
        assert_eq!(map.borrow().consumed(), doc.len() as u64);
        assert!(map.borrow().at_eof());
    }

    #[test]
    fn long_top_level_name_is_cut() {
        let doc = format!(r#"{{"{}":1,"name":[]}}"#, "k".repeat(100));
        let (out, map) = limited(doc.as_bytes(), 10);
        assert_eq!(out.unwrap(), br#"{"kkkkkkkkkk":1,"name":[]}"#.to_vec());

        let map = map.borrow();
        assert_eq!(map.consumed(), doc.len() as u64);
        // closing quote and everything after it shift by the dropped bytes
        assert_eq!(map.source_offset(11), 11);
        assert_eq!(map.source_offset(12), 102);
        assert_eq!(map.source_offset(15), 105);
    }

    #[test]
    fn nested_names_and_values_are_untouched() {
        let long = "v".repeat(100);
        let doc = format!(r#"{{"a":{{"{long}":"{long}"}},"b":["{long}"],"c":"{long}"}}"#);
        let (out, _) = limited(doc.as_bytes(), 4);
        assert_eq!(out.unwrap(), doc.as_bytes());

        let doc = format!(r#"["{long}",{{"{long}":1}}]"#);
        let (out, _) = limited(doc.as_bytes(), 4);
        assert_eq!(out.unwrap(), doc.as_bytes());
    }

    #[test]
    fn cut_lands_between_escapes() {
        let key = "\\u00e9".repeat(20);
        let doc = format!(r#"{{"{key}":1}}"#);
        let (out, _) = limited(doc.as_bytes(), 9);
        assert_eq!(only_key(&out.unwrap()), "éé");

        let key = "\\ud83d\\ude00".repeat(3);
        let doc = format!(r#"{{"{key}":1}}"#);
        let (out, _) = limited(doc.as_bytes(), 8);
        assert_eq!(only_key(&out.unwrap()), "😀");
    }

    #[test]
    fn cut_lands_between_utf8_sequences() {
        let key = "é".repeat(50);
        let doc = format!(r#"{{"{key}":1}}"#);
        let (out, _) = limited(doc.as_bytes(), 5);
        assert_eq!(only_key(&out.unwrap()), "ééé");
    }

    #[test]
    fn bad_escape_in_dropped_part_is_reported_at_its_offset() {
        let doc = format!(r#"{{"{}\x":1}}"#, "k".repeat(20));
        let (out, map) = limited(doc.as_bytes(), 4);
        let err = out.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let name_err = NameSyntaxError::find(&err).unwrap();
        assert_eq!(name_err.message, "invalid escape sequence");
        assert_eq!(map.borrow().source_offset(name_err.position), doc.find('x').unwrap() as u64);
    }

    #[test]
    fn truncation_inside_dropped_name_maps_to_end_of_input() {
        let doc = format!(r#"{{"{}"#, "k".repeat(50));
        let (out, map) = limited(doc.as_bytes(), 4);
        let out = out.unwrap();
        assert_eq!(out, br#"{"kkkk"#.to_vec());
        assert_eq!(map.borrow().source_offset(out.len() as u64), doc.len() as u64);
    }

    #[test]
    fn settled_gaps_still_count() {
        let mut map = SourceMap::default();
        map.gaps.push_back((5, 10));
        map.gaps.push_back((20, 3));
        map.settle(6);
        assert_eq!(map.gaps.len(), 1);
        assert_eq!(map.source_offset(7), 17);
        assert_eq!(map.source_offset(20), 33);
    }
}
