//! Filter tokens.  Offsets are byte offsets into the filter text.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterTokenKind {
    LPar,
    RPar,
    And,
    Or,
    Not,
    Attribute,
    /// `=`, both for equality and substring matches.
    Equal,
    /// `~=`
    Aprox,
    /// `>=`
    Greater,
    /// `<=`
    Less,
    /// `=*` when nothing but the closing paren follows.
    Present,
    Value,
    /// A single `*` inside a value.
    Asterisk,
    /// `:dn` of an extensible match.
    DnAttr,
    /// `:oid` naming the matching rule of an extensible match.
    MatchingRule,
    /// `:=` of an extensible match.
    ExtensibleEqual,
    Whitespace,
    Error,
    Eof,
}

impl FilterTokenKind {
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            FilterTokenKind::Equal
                | FilterTokenKind::Aprox
                | FilterTokenKind::Greater
                | FilterTokenKind::Less
                | FilterTokenKind::Present
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken {
    pub kind: FilterTokenKind,
    pub text: String,
    pub offset: usize,
}

impl FilterToken {
    pub fn new(kind: FilterTokenKind, text: impl Into<String>, offset: usize) -> FilterToken {
        FilterToken {
            kind,
            text: text.into(),
            offset,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}
