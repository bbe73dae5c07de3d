//! LDIF tokens.
//!
//! A token's `text` is the raw source slice it was lexed from, fold markers
//! included, so concatenating every token of a run gives back the input.
//! [`LdifToken::value`] is the logical (unfolded) text.

use std::borrow::Cow;

/// Change type keyword after `changetype:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Add,
    Delete,
    Modify,
    /// `moddn` and `modrdn` both map here.
    ModDn,
}

impl ChangeType {
    pub fn parse(keyword: &str) -> Option<ChangeType> {
        match keyword {
            "add" => Some(ChangeType::Add),
            "delete" => Some(ChangeType::Delete),
            "modify" => Some(ChangeType::Modify),
            "moddn" | "modrdn" => Some(ChangeType::ModDn),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Add => "add",
            ChangeType::Delete => "delete",
            ChangeType::Modify => "modify",
            ChangeType::ModDn => "moddn",
        }
    }
}

/// Modification operation of a mod-spec (`add:`, `delete:`, `replace:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModOp {
    Add,
    Delete,
    Replace,
}

impl ModOp {
    pub fn parse(keyword: &str) -> Option<ModOp> {
        match keyword {
            "add" => Some(ModOp::Add),
            "delete" => Some(ModOp::Delete),
            "replace" => Some(ModOp::Replace),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModOp::Add => "add",
            ModOp::Delete => "delete",
            ModOp::Replace => "replace",
        }
    }
}

/// How the value after the colon is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `:` followed by a SAFE-STRING.
    Safe,
    /// `::` followed by base64.
    Base64,
    /// `:<` followed by a URL.
    Url,
}

impl ValueType {
    pub fn marker(self) -> &'static str {
        match self {
            ValueType::Safe => ":",
            ValueType::Base64 => "::",
            ValueType::Url => ":<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LdifTokenKind {
    Comment,
    /// Line separator: `\n`, `\r\n` or a lone `\r`.
    Sep,
    VersionSpec,
    DnSpec,
    ControlSpec,
    ChangeTypeSpec,
    NewRdnSpec,
    DeleteOldRdnSpec,
    NewSuperiorSpec,
    ModSpec(ModOp),
    /// The `-` line closing a mod-spec.
    ModSep,
    Attribute,
    /// Colon marker plus any spaces that follow it.
    ValueType(ValueType),
    Value,
    Number,
    Oid,
    /// Control criticality, leading spaces included.
    Criticality(bool),
    ChangeType(ChangeType),
    Unknown,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdifToken {
    pub kind: LdifTokenKind,
    pub text: String,
    pub offset: usize,
}

impl LdifToken {
    pub fn new(kind: LdifTokenKind, text: impl Into<String>, offset: usize) -> LdifToken {
        LdifToken {
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

    /// Offset one past the last source byte of this token.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// The token text with fold markers removed.
    pub fn value(&self) -> Cow<'_, str> {
        unfold(&self.text)
    }
}

/// Is there a fold marker (line break + one space or tab) at `pos`?
/// Returns the marker's length.
pub(crate) fn fold_at(bytes: &[u8], pos: usize) -> Option<usize> {
    let brk = match bytes.get(pos) {
        Some(b'\r') if bytes.get(pos + 1) == Some(&b'\n') => 2,
        Some(b'\n') => 1,
        _ => return None,
    };
    match bytes.get(pos + brk) {
        Some(b' ') | Some(b'\t') => Some(brk + 1),
        _ => None,
    }
}

/// Remove every fold marker from `raw`.
pub fn unfold(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    if !bytes.iter().any(|&b| b == b'\n' || b == b'\r') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(n) = fold_at(bytes, i) {
            out.push_str(&raw[start..i]);
            i += n;
            start = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&raw[start..]);
    Cow::Owned(out)
}
