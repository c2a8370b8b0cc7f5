//! The streaming token parser (C4): walks the live document byte by byte,
//! yielding one token per call. It never builds a tree and never allocates —
//! callers that need structure (the path resolver, the update engine) drive it
//! themselves and keep only the state they need.

use crate::device::PageDevice;

/// The kind of value a [`Token`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A `{ ... }` object. `start`/`end` span the braces themselves.
    Object,
    /// A `[ ... ]` array. `start`/`end` span the brackets themselves.
    Array,
    /// A quoted string. `start`/`end` span the content, excluding the quotes.
    String,
    /// A bare numeric literal. `start`/`end` span the digits.
    Primitive,
    /// `true` or `false`. `start`/`end` span the literal.
    Bool,
    /// Structural noise (`,`, a stray `}`/`]`, or anything unrecognized) with no
    /// payload of its own.
    Undefined,
    /// The parser has reached the end of the live region.
    End,
}

/// One token yielded by the parser: its kind and the inclusive byte range of its
/// payload, as offsets from the store's start.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The kind of value this token represents.
    pub kind: TokenKind,
    /// Offset of the first byte of the payload.
    pub start: u32,
    /// Offset of the last byte of the payload (inclusive).
    pub end: u32,
}

/// Whether the parser has consumed the root object's opening brace yet. Replaces
/// the boolean "first call" latch with a named state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ParserState {
    AtRoot,
    Descended,
}

/// A single-pass, stateful parser over the live bytes of a document.
///
/// Constructing a parser does not touch flash; call [`TokenParser::init`] once
/// before the first [`TokenParser::next`].
pub struct TokenParser<'a, D: PageDevice> {
    device: &'a D,
    pos: u32,
    /// Upper bound of the live region, set once the root object's terminator is
    /// located. Until then it is the whole window, so the initial scan for `/`
    /// has somewhere to stop.
    end: u32,
    /// End of the innermost Object/Array token produced so far; bounds how far a
    /// Primitive scan is allowed to run before giving up on finding a `,`.
    container_end: u32,
    level: i32,
    state: ParserState,
}

impl<'a, D: PageDevice> TokenParser<'a, D> {
    /// Create a parser over `device`'s live region, `region_len` bytes long.
    pub fn new(device: &'a D, region_len: u32) -> TokenParser<'a, D> {
        TokenParser {
            device,
            pos: 0,
            end: region_len,
            container_end: region_len,
            level: -1,
            state: ParserState::AtRoot,
        }
    }

    fn byte(&self, at: u32) -> u8 {
        self.device.read_byte(at)
    }

    /// Yield the next token. Once [`TokenKind::End`] is returned, further calls
    /// keep returning it.
    pub fn next(&mut self) -> Token {
        if self.pos >= self.end {
            let at = self.pos.saturating_sub(1);
            return Token {
                kind: TokenKind::End,
                start: at,
                end: self.pos,
            };
        }

        match self.byte(self.pos) {
            b'{' => self.object(),
            b'[' => self.array(),
            b'"' => self.string(),
            b't' => self.bool_literal(4),
            b'f' => self.bool_literal(5),
            b'0'..=b'9' => self.primitive(),
            b'}' | b']' | b',' => {
                self.pos += 1;
                Token {
                    kind: TokenKind::Undefined,
                    start: self.pos - 1,
                    end: self.pos - 1,
                }
            }
            _ => Token {
                kind: TokenKind::Undefined,
                start: self.pos,
                end: self.pos,
            },
        }
    }

    fn object(&mut self) -> Token {
        if self.state == ParserState::AtRoot {
            let start = self.pos;
            self.pos += 1;
            while self.byte(self.pos) != b'/' {
                let c = self.byte(self.pos);
                if c == b'{' || c == b'[' {
                    self.level += 1;
                } else if (c == b'}' || c == b']') && self.level != -1 {
                    self.level -= 1;
                }
                self.pos += 1;
            }
            self.end = self.pos - 1;
            self.pos = self.end;
            self.state = ParserState::Descended;
            let tok = Token {
                kind: TokenKind::Object,
                start,
                end: self.pos,
            };
            self.container_end = tok.end;
            self.pos = 1;
            tok
        } else {
            self.bracketed(TokenKind::Object)
        }
    }

    fn array(&mut self) -> Token {
        self.bracketed(TokenKind::Array)
    }

    /// Shared bracket-balancing walk for a non-root `{` or any `[`.
    fn bracketed(&mut self, kind: TokenKind) -> Token {
        self.level += 1;
        let start = self.pos;
        let in_level = self.level - 1;
        self.pos += 1;
        loop {
            if self.pos >= self.end {
                break;
            }
            let c = self.byte(self.pos);
            if c == b'{' || c == b'[' {
                self.level += 1;
            } else if (c == b'}' || c == b']') && self.level != in_level {
                self.level -= 1;
            } else if self.level == in_level {
                break;
            }
            self.pos += 1;
        }
        let tok_end = self.pos - 1;
        self.pos = start + 1;
        let tok = Token {
            kind,
            start,
            end: tok_end,
        };
        self.container_end = tok.end;
        tok
    }

    fn string(&mut self) -> Token {
        self.pos += 1;
        let start = self.pos;
        while self.pos < self.end && self.byte(self.pos) != b'"' {
            self.pos += 1;
        }
        let end = self.pos.saturating_sub(1);
        self.pos += 1;

        if self.pos < self.end {
            let next = self.byte(self.pos);
            if next == b':' || next == b',' || next == b']' || next == b'}' {
                while self.pos < self.end && self.byte(self.pos) != b'"' {
                    let c = self.byte(self.pos);
                    if matches!(c, b'f' | b't' | b'0'..=b'9' | b'[' | b'{') {
                        break;
                    }
                    self.pos += 1;
                }
            }
        }

        Token {
            kind: TokenKind::String,
            start,
            end,
        }
    }

    fn bool_literal(&mut self, span: u32) -> Token {
        let start = self.pos;
        self.pos += span;
        Token {
            kind: TokenKind::Bool,
            start,
            end: start + span - 1,
        }
    }

    fn primitive(&mut self) -> Token {
        let start = self.pos;
        let bound = self.end.min(self.container_end);
        while self.pos < bound && self.byte(self.pos) != b',' {
            self.pos += 1;
        }
        if self.pos >= bound || self.byte(self.pos) != b',' {
            let mut back = self.pos;
            while back != start {
                back -= 1;
                if self.byte(back).is_ascii_digit() {
                    break;
                }
            }
            let end = back;
            self.pos = end + 1;
            Token {
                kind: TokenKind::Primitive,
                start,
                end,
            }
        } else {
            let end = self.pos - 1;
            Token {
                kind: TokenKind::Primitive,
                start,
                end,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::VecDevice;
    use pretty_assertions::assert_eq;

    fn parser_over(json: &str) -> VecDevice {
        let mut bytes = json.as_bytes().to_vec();
        bytes.push(b'/');
        bytes.resize(1024, 0xFF);
        VecDevice::preloaded(bytes, 256)
    }

    #[test]
    fn root_object_token_spans_whole_document() {
        let device = parser_over(r#"{"a":1}"#);
        let mut parser = TokenParser::new(&device, 1024);
        let tok = parser.next();
        assert_eq!(tok.kind, TokenKind::Object);
        assert_eq!(tok.start, 0);
        assert_eq!(tok.end, 6);
    }

    #[test]
    fn string_key_then_primitive_value() {
        let device = parser_over(r#"{"a":1}"#);
        let mut parser = TokenParser::new(&device, 1024);
        parser.next(); // root object
        let key = parser.next();
        assert_eq!(key.kind, TokenKind::String);
        assert_eq!(&device_slice(&device, key.start, key.end), b"a");
        let val = parser.next();
        assert_eq!(val.kind, TokenKind::Primitive);
        assert_eq!(&device_slice(&device, val.start, val.end), b"1");
    }

    #[test]
    fn nested_object_recursion() {
        let device = parser_over(r#"{"u":{"Jack":{"Age":28}}}"#);
        let mut parser = TokenParser::new(&device, 1024);
        parser.next(); // root
        let k1 = parser.next();
        assert_eq!(&device_slice(&device, k1.start, k1.end), b"u");
        let v1 = parser.next();
        assert_eq!(v1.kind, TokenKind::Object);
        let k2 = parser.next();
        assert_eq!(&device_slice(&device, k2.start, k2.end), b"Jack");
        let v2 = parser.next();
        assert_eq!(v2.kind, TokenKind::Object);
        let k3 = parser.next();
        assert_eq!(&device_slice(&device, k3.start, k3.end), b"Age");
        let v3 = parser.next();
        assert_eq!(v3.kind, TokenKind::Primitive);
        assert_eq!(&device_slice(&device, v3.start, v3.end), b"28");
    }

    #[test]
    fn array_token_balances_nested_brackets() {
        let device = parser_over(r#"{"a":[1,[2,3],4]}"#);
        let mut parser = TokenParser::new(&device, 1024);
        parser.next();
        parser.next(); // key "a"
        let arr = parser.next();
        assert_eq!(arr.kind, TokenKind::Array);
        assert_eq!(&device_slice(&device, arr.start, arr.end), b"[1,[2,3],4]");
    }

    #[test]
    fn bool_literals_span_exactly_their_text() {
        let device = parser_over(r#"{"a":true,"b":false}"#);
        let mut parser = TokenParser::new(&device, 1024);
        parser.next();
        parser.next();
        let t = parser.next();
        assert_eq!(t.kind, TokenKind::Bool);
        assert_eq!(&device_slice(&device, t.start, t.end), b"true");
        parser.next();
        let f = parser.next();
        assert_eq!(f.kind, TokenKind::Bool);
        assert_eq!(&device_slice(&device, f.start, f.end), b"false");
    }

    fn device_slice(device: &VecDevice, start: u32, end: u32) -> Vec<u8> {
        let mut buf = vec![0u8; (end - start + 1) as usize];
        device.read(start, &mut buf);
        buf
    }
}
