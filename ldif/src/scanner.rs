//! LDIF tokenizer.
//!
//! Lexes RFC 2849 text into a flat token stream.  Folding (a line break
//! followed by exactly one space or tab) is skipped transparently at every
//! position, so a fold may sit anywhere inside a keyword, attribute name or
//! value.  A fold that falls between two tokens is carried at the start of
//! the second one; tokens therefore cover the input without gaps.
//!
//! The scanner never fails: text it cannot classify becomes an `Unknown`
//! token running to the end of the logical line.

use crate::token::{fold_at, ChangeType, LdifToken, LdifTokenKind, ModOp, ValueType};

/// Tokenize `text`.  The last token is always `Eof` at `text.len()`.
pub fn tokenize(text: &str) -> Vec<LdifToken> {
    let mut scanner = Scanner::new(text);
    scanner.run();
    tracing::trace!(tokens = scanner.tokens.len(), "ldif tokenized");
    scanner.tokens
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<LdifToken>,
    /// Change type of the record being scanned; decides whether `add:`,
    /// `delete:`, `replace:` and the moddn keywords are special.
    change: Option<ChangeType>,
}

fn is_attr_start(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

fn is_attr_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'.' || c == b';' || c == b'-'
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            change: None,
        }
    }

    // -- cursor helpers -----------------------------------------------------

    fn skip_folds(&self, mut p: usize) -> usize {
        while let Some(n) = fold_at(self.bytes, p) {
            p += n;
        }
        p
    }

    /// Next logical byte, looking through fold markers.
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.skip_folds(self.pos)).copied()
    }

    fn bump(&mut self) {
        self.pos = self.skip_folds(self.pos) + 1;
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n') | Some(b'\r'))
    }

    fn bump_while(&mut self, pred: impl Fn(u8) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    /// Match `word` (ASCII, case-insensitive) starting at logical position
    /// `from`.  Returns the position after the word.
    fn match_word(&self, from: usize, word: &[u8]) -> Option<usize> {
        let mut p = from;
        for &w in word {
            p = self.skip_folds(p);
            match self.bytes.get(p) {
                Some(b) if b.eq_ignore_ascii_case(&w) => p += 1,
                _ => return None,
            }
        }
        Some(p)
    }

    fn emit(&mut self, kind: LdifTokenKind, start: usize) {
        if self.pos > start {
            self.tokens
                .push(LdifToken::new(kind, &self.src[start..self.pos], start));
        }
    }

    // -- line level ---------------------------------------------------------

    fn run(&mut self) {
        while self.peek().is_some() {
            self.scan_line();
        }
        // Trailing fold markers with nothing after them.
        let start = self.pos;
        self.pos = self.bytes.len();
        self.emit(LdifTokenKind::Unknown, start);
        let len = self.bytes.len();
        self.tokens.push(LdifToken::new(LdifTokenKind::Eof, "", len));
    }

    fn scan_line(&mut self) {
        let start = self.pos;
        match self.peek() {
            Some(b'\n') | Some(b'\r') => {
                // Blank line: end of record.
                self.change = None;
            }
            Some(b'#') => {
                self.rest_of_line(LdifTokenKind::Comment);
            }
            Some(b'-') if self.dash_line() => {
                self.bump();
                self.emit(LdifTokenKind::ModSep, start);
                self.rest_of_line(LdifTokenKind::Unknown);
            }
            Some(c) if is_attr_start(c) => self.scan_spec_line(),
            _ => self.rest_of_line(LdifTokenKind::Unknown),
        }
        self.scan_sep();
    }

    fn dash_line(&self) -> bool {
        let p = self.skip_folds(self.pos) + 1;
        matches!(
            self.bytes.get(self.skip_folds(p)),
            None | Some(b'\n') | Some(b'\r')
        )
    }

    fn scan_sep(&mut self) {
        let start = self.pos;
        match self.peek() {
            Some(b'\r') => {
                self.bump();
                if self.bytes.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
            }
            Some(b'\n') => self.bump(),
            _ => return,
        }
        self.emit(LdifTokenKind::Sep, start);
    }

    fn rest_of_line(&mut self, kind: LdifTokenKind) {
        let start = self.pos;
        while !self.at_line_end() {
            self.bump();
        }
        self.emit(kind, start);
    }

    fn spec_kind(&self, name: &str) -> LdifTokenKind {
        let is = |kw: &str| name.eq_ignore_ascii_case(kw);
        if is("version") {
            LdifTokenKind::VersionSpec
        } else if is("dn") {
            LdifTokenKind::DnSpec
        } else if is("control") {
            LdifTokenKind::ControlSpec
        } else if is("changetype") {
            LdifTokenKind::ChangeTypeSpec
        } else if self.change == Some(ChangeType::ModDn) && is("newrdn") {
            LdifTokenKind::NewRdnSpec
        } else if self.change == Some(ChangeType::ModDn) && is("deleteoldrdn") {
            LdifTokenKind::DeleteOldRdnSpec
        } else if self.change == Some(ChangeType::ModDn) && is("newsuperior") {
            LdifTokenKind::NewSuperiorSpec
        } else if self.change == Some(ChangeType::Modify) {
            match ModOp::parse(&name.to_ascii_lowercase()) {
                Some(op) => LdifTokenKind::ModSpec(op),
                None => LdifTokenKind::Attribute,
            }
        } else {
            LdifTokenKind::Attribute
        }
    }

    /// `name: value` style lines.
    fn scan_spec_line(&mut self) {
        let start = self.pos;
        self.bump_while(is_attr_char);
        let name = crate::token::unfold(&self.src[start..self.pos]).into_owned();
        let kind = self.spec_kind(&name);
        if kind == LdifTokenKind::DnSpec {
            self.change = None;
        }
        self.emit(kind, start);

        let Some(value_type) = self.scan_value_type() else {
            self.rest_of_line(LdifTokenKind::Unknown);
            return;
        };

        match kind {
            LdifTokenKind::VersionSpec => {
                self.scan_run(LdifTokenKind::Number, |c| c.is_ascii_digit());
            }
            LdifTokenKind::ControlSpec => self.scan_control(),
            LdifTokenKind::ChangeTypeSpec if value_type == ValueType::Safe => {
                self.scan_change_type();
            }
            LdifTokenKind::ModSpec(_) => {
                if self.peek().is_some_and(is_attr_start) {
                    self.scan_run(LdifTokenKind::Attribute, is_attr_char);
                }
            }
            _ => {
                self.rest_of_line(LdifTokenKind::Value);
                return;
            }
        }
        self.rest_of_line(LdifTokenKind::Unknown);
    }

    fn scan_run(&mut self, kind: LdifTokenKind, pred: impl Fn(u8) -> bool) {
        let start = self.pos;
        self.bump_while(pred);
        self.emit(kind, start);
    }

    /// `:`, `::` or `:<`, plus the FILL spaces after it.
    fn scan_value_type(&mut self) -> Option<ValueType> {
        if self.peek() != Some(b':') {
            return None;
        }
        let start = self.pos;
        self.bump();
        let value_type = match self.peek() {
            Some(b':') => {
                self.bump();
                ValueType::Base64
            }
            Some(b'<') => {
                self.bump();
                ValueType::Url
            }
            _ => ValueType::Safe,
        };
        self.bump_while(|c| c == b' ');
        self.emit(LdifTokenKind::ValueType(value_type), start);
        Some(value_type)
    }

    fn scan_change_type(&mut self) {
        let start = self.pos;
        while !self.at_line_end() {
            self.bump();
        }
        let keyword = crate::token::unfold(&self.src[start..self.pos]);
        match ChangeType::parse(&keyword) {
            Some(change) => {
                self.change = Some(change);
                self.emit(LdifTokenKind::ChangeType(change), start);
            }
            None => self.emit(LdifTokenKind::Value, start),
        }
    }

    /// `control: oid [criticality] [value-spec]`
    fn scan_control(&mut self) {
        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return;
        }
        self.scan_run(LdifTokenKind::Oid, |c| c.is_ascii_digit() || c == b'.');

        let mut p = self.pos;
        loop {
            let q = self.skip_folds(p);
            if self.bytes.get(q) == Some(&b' ') {
                p = q + 1;
            } else {
                break;
            }
        }
        if p > self.pos {
            for (word, critical) in [(&b"true"[..], true), (&b"false"[..], false)] {
                if let Some(end) = self.match_word(p, word) {
                    let next = self.bytes.get(self.skip_folds(end)).copied();
                    if matches!(next, None | Some(b'\n') | Some(b'\r') | Some(b':')) {
                        let start = self.pos;
                        self.pos = end;
                        self.emit(LdifTokenKind::Criticality(critical), start);
                        break;
                    }
                }
            }
        }

        if self.scan_value_type().is_some() {
            self.rest_of_line(LdifTokenKind::Value);
        }
    }
}
