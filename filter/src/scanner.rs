//! Filter tokenizer.
//!
//! The meaning of a character depends on the token before it: `&` is the
//! AND operator right after `(` but plain text inside a value, whitespace
//! is only a token of its own between filters.  Anything that fits no rule
//! becomes an `Error` token running up to the next parenthesis, so the
//! token texts always concatenate back to the input.

use crate::token::{FilterToken, FilterTokenKind};

use FilterTokenKind::*;

pub fn tokenize(text: &str) -> Vec<FilterToken> {
    let mut scanner = Scanner {
        src: text,
        bytes: text.as_bytes(),
        pos: 0,
        last: None,
        tokens: Vec::new(),
    };
    while scanner.pos < scanner.bytes.len() {
        scanner.next_token();
    }
    scanner
        .tokens
        .push(FilterToken::new(Eof, "", text.len()));
    tracing::trace!(tokens = scanner.tokens.len(), "filter tokenized");
    scanner.tokens
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    last: Option<FilterTokenKind>,
    tokens: Vec<FilterToken>,
}

fn is_name_char(c: u8) -> bool {
    !matches!(c, b':' | b'=' | b'<' | b'>' | b'~' | b'(' | b')') && !c.is_ascii_whitespace()
}

impl Scanner<'_> {
    fn at(&self, p: usize) -> Option<u8> {
        self.bytes.get(p).copied()
    }

    fn emit(&mut self, kind: FilterTokenKind, end: usize) {
        let text = &self.src[self.pos..end];
        self.tokens.push(FilterToken::new(kind, text, self.pos));
        self.pos = end;
        if kind != Whitespace {
            self.last = Some(kind);
        }
    }

    fn run_end(&self, from: usize, pred: impl Fn(u8) -> bool) -> usize {
        let mut p = from;
        while self.at(p).is_some_and(&pred) {
            p += 1;
        }
        p
    }

    /// Whitespace separates filters: at the start, after a parenthesis and
    /// after a logical operator.
    fn whitespace_allowed(&self) -> bool {
        matches!(self.last, None | Some(LPar) | Some(RPar) | Some(And) | Some(Or) | Some(Not))
    }

    fn in_value(&self) -> bool {
        matches!(
            self.last,
            Some(Equal | Aprox | Greater | Less | ExtensibleEqual | Value | Asterisk)
        )
    }

    fn next_token(&mut self) {
        let p = self.pos;
        let Some(c) = self.at(p) else {
            return;
        };

        if c.is_ascii_whitespace() && self.whitespace_allowed() {
            let end = self.run_end(p, |c| c.is_ascii_whitespace());
            return self.emit(Whitespace, end);
        }
        match c {
            b'(' => return self.emit(LPar, p + 1),
            b')' => return self.emit(RPar, p + 1),
            _ => {}
        }
        if self.in_value() {
            if c == b'*' {
                return self.emit(Asterisk, p + 1);
            }
            let end = self.run_end(p, |c| !matches!(c, b'*' | b'(' | b')'));
            return self.emit(Value, end);
        }
        if self.last == Some(LPar) {
            match c {
                b'&' => return self.emit(And, p + 1),
                b'|' => return self.emit(Or, p + 1),
                b'!' => return self.emit(Not, p + 1),
                _ => {}
            }
            let end = self.run_end(p, is_name_char);
            if end > p {
                return self.emit(Attribute, end);
            }
        }
        if self.last == Some(Attribute) {
            let next = self.at(p + 1);
            match (c, next) {
                (b'=', Some(b'*')) if matches!(self.at(p + 2), None | Some(b')')) => {
                    return self.emit(Present, p + 2);
                }
                (b'=', _) => return self.emit(Equal, p + 1),
                (b'~', Some(b'=')) => return self.emit(Aprox, p + 2),
                (b'>', Some(b'=')) => return self.emit(Greater, p + 2),
                (b'<', Some(b'=')) => return self.emit(Less, p + 2),
                _ => {}
            }
        }
        if c == b':' && self.scan_extensible() {
            return;
        }
        let end = self.run_end(p, |c| c != b'(' && c != b')');
        self.emit(Error, end.max(p + 1));
    }

    /// `:dn`, `:rule` or `:=` after `(`, an attribute or an earlier part of
    /// the extensible match.
    fn scan_extensible(&mut self) -> bool {
        let p = self.pos;
        let after_attr = matches!(self.last, Some(Attribute | DnAttr | MatchingRule));
        if after_attr && self.at(p + 1) == Some(b'=') {
            self.emit(ExtensibleEqual, p + 2);
            return true;
        }
        if matches!(self.last, Some(LPar | Attribute)) {
            let dn = self.bytes.get(p + 1..p + 3);
            if dn.is_some_and(|d| d.eq_ignore_ascii_case(b"dn"))
                && matches!(self.at(p + 3), None | Some(b':'))
            {
                self.emit(DnAttr, p + 3);
                return true;
            }
        }
        if matches!(self.last, Some(LPar | Attribute | DnAttr)) {
            let end = self.run_end(p + 1, is_name_char);
            if end > p + 1 {
                self.emit(MatchingRule, end);
                return true;
            }
        }
        false
    }
}
