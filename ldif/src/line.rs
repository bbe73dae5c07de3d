//! LDIF lines.
//!
//! A line owns the tokens it was built from (its separator included), so
//! the raw text of a parsed file can always be recovered.  Lines are never
//! rejected: anything that does not satisfy its grammar still becomes a
//! line, and `invalid_cause` says what is wrong with it.

use std::borrow::Cow;

use crate::base64::{encode_base64, must_encode, read_base64};
use crate::error::{LdifError, Result};
use crate::token::{ChangeType, LdifToken, LdifTokenKind, ModOp, ValueType};

/// `key: value` lines: version, dn, attribute values, changetype, mod-spec
/// headers and the moddn lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLine {
    key: LdifToken,
    value_type: Option<LdifToken>,
    value: Option<LdifToken>,
    /// Tokens after the value that do not fit the line's grammar.
    rest: Vec<LdifToken>,
    newline: Option<LdifToken>,
}

/// `control: oid [criticality] [value-spec]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLine {
    key: LdifToken,
    value_type: Option<LdifToken>,
    oid: Option<LdifToken>,
    criticality: Option<LdifToken>,
    control_value_type: Option<LdifToken>,
    control_value: Option<LdifToken>,
    rest: Vec<LdifToken>,
    newline: Option<LdifToken>,
}

/// Comment, separator, `-` and unrecognised lines: a run of tokens with no
/// inner structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    tokens: Vec<LdifToken>,
    newline: Option<LdifToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdifLine {
    Version(ValueLine),
    Comment(RawLine),
    Dn(ValueLine),
    AttrVal(ValueLine),
    Control(ControlLine),
    ChangeType(ValueLine),
    ModSpec(ValueLine),
    /// The `-` closing a mod-spec.
    ModSpecSep(RawLine),
    NewRdn(ValueLine),
    DeleteOldRdn(ValueLine),
    NewSuperior(ValueLine),
    /// Blank line.
    Separator(RawLine),
    Unknown(RawLine),
}

// ---------------------------------------------------------------------------
// Splitting and construction from tokens
// ---------------------------------------------------------------------------

/// Group a token stream into per-line slices.  Each slice ends with its
/// `Sep` token if it has one; the `Eof` token is dropped.
pub fn split_lines(tokens: &[LdifToken]) -> Vec<&[LdifToken]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        match t.kind {
            LdifTokenKind::Sep => {
                lines.push(&tokens[start..=i]);
                start = i + 1;
            }
            LdifTokenKind::Eof => {
                if i > start {
                    lines.push(&tokens[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        lines.push(&tokens[start..]);
    }
    lines
}

/// Build the most specific line for one line's tokens.
pub fn parse_line(tokens: &[LdifToken]) -> LdifLine {
    let (body, newline) = match tokens.split_last() {
        Some((last, body)) if last.kind == LdifTokenKind::Sep => (body, Some(last.clone())),
        _ => (tokens, None),
    };
    let raw = |newline: Option<LdifToken>| RawLine {
        tokens: body.to_vec(),
        newline,
    };

    let Some((first, tail)) = body.split_first() else {
        return LdifLine::Separator(raw(newline));
    };
    let value_line = |newline| ValueLine::from_tokens(first, tail, newline);
    match first.kind {
        LdifTokenKind::Comment => LdifLine::Comment(raw(newline)),
        LdifTokenKind::ModSep => LdifLine::ModSpecSep(raw(newline)),
        LdifTokenKind::VersionSpec => LdifLine::Version(value_line(newline)),
        LdifTokenKind::DnSpec => LdifLine::Dn(value_line(newline)),
        LdifTokenKind::Attribute => LdifLine::AttrVal(value_line(newline)),
        LdifTokenKind::ChangeTypeSpec => LdifLine::ChangeType(value_line(newline)),
        LdifTokenKind::ModSpec(_) => LdifLine::ModSpec(value_line(newline)),
        LdifTokenKind::NewRdnSpec => LdifLine::NewRdn(value_line(newline)),
        LdifTokenKind::DeleteOldRdnSpec => LdifLine::DeleteOldRdn(value_line(newline)),
        LdifTokenKind::NewSuperiorSpec => LdifLine::NewSuperior(value_line(newline)),
        LdifTokenKind::ControlSpec => {
            LdifLine::Control(ControlLine::from_tokens(first, tail, newline))
        }
        _ => LdifLine::Unknown(raw(newline)),
    }
}

/// Takes the next token if `accept` likes its kind.
fn take_if(
    it: &mut std::iter::Peekable<std::slice::Iter<'_, LdifToken>>,
    accept: impl Fn(LdifTokenKind) -> bool,
) -> Option<LdifToken> {
    it.next_if(|t| accept(t.kind)).cloned()
}

fn is_value_type(kind: LdifTokenKind) -> bool {
    matches!(kind, LdifTokenKind::ValueType(_))
}

impl ValueLine {
    fn from_tokens(key: &LdifToken, tail: &[LdifToken], newline: Option<LdifToken>) -> ValueLine {
        let mut it = tail.iter().peekable();
        let value_type = take_if(&mut it, is_value_type);
        let value = if value_type.is_some() {
            take_if(&mut it, |k| {
                matches!(
                    k,
                    LdifTokenKind::Value
                        | LdifTokenKind::Number
                        | LdifTokenKind::ChangeType(_)
                        | LdifTokenKind::Attribute
                )
            })
        } else {
            None
        };
        ValueLine {
            key: key.clone(),
            value_type,
            value,
            rest: it.cloned().collect(),
            newline,
        }
    }

    pub fn key_token(&self) -> &LdifToken {
        &self.key
    }

    /// Unfolded key, e.g. `cn`, `dn`, `add`.
    pub fn key(&self) -> Cow<'_, str> {
        self.key.value()
    }

    pub fn value_type_token(&self) -> Option<&LdifToken> {
        self.value_type.as_ref()
    }

    pub fn value_token(&self) -> Option<&LdifToken> {
        self.value.as_ref()
    }

    pub fn value_type(&self) -> Option<ValueType> {
        match self.value_type.as_ref()?.kind {
            LdifTokenKind::ValueType(vt) => Some(vt),
            _ => None,
        }
    }

    /// The value exactly as written (unfolded): base64 text for `::`
    /// values, the URL for `:<` values.
    pub fn raw_value(&self) -> Cow<'_, str> {
        match &self.value {
            Some(t) => t.value(),
            None => Cow::Borrowed(""),
        }
    }

    /// Decoded value bytes.  None when a base64 value does not decode.
    pub fn value_bytes(&self) -> Option<Vec<u8>> {
        match self.value_type() {
            Some(ValueType::Base64) => read_base64(&self.raw_value()),
            _ => Some(self.raw_value().into_owned().into_bytes()),
        }
    }

    /// Decoded value as text, lossy for binary values.
    pub fn value_string(&self) -> String {
        match self.value_bytes() {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => self.raw_value().into_owned(),
        }
    }

    /// Value bytes with `:<` URL values loaded.  Only `file://` URLs are
    /// supported.
    pub fn resolve_value(&self) -> Result<Vec<u8>> {
        match self.value_type() {
            Some(ValueType::Url) => {
                let url = self.raw_value();
                let Some(path) = url.strip_prefix("file://") else {
                    return Err(LdifError::UnsupportedUrl(url.into_owned()));
                };
                Ok(std::fs::read(path)?)
            }
            _ => self.value_bytes().ok_or(LdifError::Base64Decode),
        }
    }

    pub fn rest(&self) -> &[LdifToken] {
        &self.rest
    }

    fn tokens(&self) -> Vec<&LdifToken> {
        let mut v = vec![&self.key];
        v.extend(self.value_type.iter());
        v.extend(self.value.iter());
        v.extend(self.rest.iter());
        v.extend(self.newline.iter());
        v
    }

    /// Problems shared by every value line.
    fn common_cause(&self) -> Option<String> {
        if self.value_type.is_none() {
            return Some("Colon missing".to_string());
        }
        if let Some(cause) = unexpected(&self.rest) {
            return Some(cause);
        }
        if self.value_type() == Some(ValueType::Base64) && self.value_bytes().is_none() {
            return Some("Invalid Base64 value".to_string());
        }
        None
    }
}

fn unexpected(rest: &[LdifToken]) -> Option<String> {
    if rest.is_empty() {
        return None;
    }
    let text: String = rest.iter().map(|t| t.value()).collect();
    Some(format!("Unexpected text '{}'", text))
}

impl ControlLine {
    fn from_tokens(key: &LdifToken, tail: &[LdifToken], newline: Option<LdifToken>) -> ControlLine {
        let mut it = tail.iter().peekable();
        let value_type = take_if(&mut it, is_value_type);
        let oid = take_if(&mut it, |k| k == LdifTokenKind::Oid);
        let criticality = take_if(&mut it, |k| matches!(k, LdifTokenKind::Criticality(_)));
        let control_value_type = take_if(&mut it, is_value_type);
        let control_value = if control_value_type.is_some() {
            take_if(&mut it, |k| k == LdifTokenKind::Value)
        } else {
            None
        };
        ControlLine {
            key: key.clone(),
            value_type,
            oid,
            criticality,
            control_value_type,
            control_value,
            rest: it.cloned().collect(),
            newline,
        }
    }

    pub fn oid(&self) -> Option<Cow<'_, str>> {
        self.oid.as_ref().map(|t| t.value())
    }

    pub fn criticality(&self) -> Option<bool> {
        match self.criticality.as_ref()?.kind {
            LdifTokenKind::Criticality(c) => Some(c),
            _ => None,
        }
    }

    pub fn control_value_type(&self) -> Option<ValueType> {
        match self.control_value_type.as_ref()?.kind {
            LdifTokenKind::ValueType(vt) => Some(vt),
            _ => None,
        }
    }

    pub fn raw_control_value(&self) -> Option<Cow<'_, str>> {
        self.control_value_type.as_ref()?;
        Some(match &self.control_value {
            Some(t) => t.value(),
            None => Cow::Borrowed(""),
        })
    }

    /// Decoded control value, if the line has one.
    pub fn control_value_bytes(&self) -> Option<Vec<u8>> {
        let raw = self.raw_control_value()?;
        match self.control_value_type() {
            Some(ValueType::Base64) => read_base64(&raw),
            _ => Some(raw.into_owned().into_bytes()),
        }
    }

    fn tokens(&self) -> Vec<&LdifToken> {
        let mut v = vec![&self.key];
        v.extend(self.value_type.iter());
        v.extend(self.oid.iter());
        v.extend(self.criticality.iter());
        v.extend(self.control_value_type.iter());
        v.extend(self.control_value.iter());
        v.extend(self.rest.iter());
        v.extend(self.newline.iter());
        v
    }

    fn invalid_cause(&self) -> Option<String> {
        if self.value_type.is_none() {
            return Some("Colon missing".to_string());
        }
        if self.oid.is_none() {
            return Some("Missing control OID".to_string());
        }
        if let Some(cause) = unexpected(&self.rest) {
            return Some(cause);
        }
        if self.control_value_type() == Some(ValueType::Base64)
            && self.control_value_bytes().is_none()
        {
            return Some("Invalid Base64 value".to_string());
        }
        None
    }
}

impl RawLine {
    pub fn body(&self) -> &[LdifToken] {
        &self.tokens
    }

    /// Unfolded text of the line without its separator.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.value()).collect()
    }

    fn tokens(&self) -> Vec<&LdifToken> {
        self.tokens.iter().chain(self.newline.iter()).collect()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl LdifLine {
    /// Every token of the line in source order, separator included.
    pub fn tokens(&self) -> Vec<&LdifToken> {
        match self {
            LdifLine::Version(l)
            | LdifLine::Dn(l)
            | LdifLine::AttrVal(l)
            | LdifLine::ChangeType(l)
            | LdifLine::ModSpec(l)
            | LdifLine::NewRdn(l)
            | LdifLine::DeleteOldRdn(l)
            | LdifLine::NewSuperior(l) => l.tokens(),
            LdifLine::Control(l) => l.tokens(),
            LdifLine::Comment(l)
            | LdifLine::ModSpecSep(l)
            | LdifLine::Separator(l)
            | LdifLine::Unknown(l) => l.tokens(),
        }
    }

    pub fn value_line(&self) -> Option<&ValueLine> {
        match self {
            LdifLine::Version(l)
            | LdifLine::Dn(l)
            | LdifLine::AttrVal(l)
            | LdifLine::ChangeType(l)
            | LdifLine::ModSpec(l)
            | LdifLine::NewRdn(l)
            | LdifLine::DeleteOldRdn(l)
            | LdifLine::NewSuperior(l) => Some(l),
            _ => None,
        }
    }

    pub fn newline(&self) -> Option<&LdifToken> {
        match self {
            LdifLine::Version(l)
            | LdifLine::Dn(l)
            | LdifLine::AttrVal(l)
            | LdifLine::ChangeType(l)
            | LdifLine::ModSpec(l)
            | LdifLine::NewRdn(l)
            | LdifLine::DeleteOldRdn(l)
            | LdifLine::NewSuperior(l) => l.newline.as_ref(),
            LdifLine::Control(l) => l.newline.as_ref(),
            LdifLine::Comment(l)
            | LdifLine::ModSpecSep(l)
            | LdifLine::Separator(l)
            | LdifLine::Unknown(l) => l.newline.as_ref(),
        }
    }

    pub fn offset(&self) -> usize {
        self.tokens().first().map_or(0, |t| t.offset)
    }

    /// Offset one past the line's last byte (separator included).
    pub fn end(&self) -> usize {
        self.tokens().last().map_or(0, |t| t.end())
    }

    pub fn len(&self) -> usize {
        self.end() - self.offset()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offset() <= offset && offset < self.end()
    }

    /// The line's source text, folds and separator included.
    pub fn to_raw_string(&self) -> String {
        self.tokens().into_iter().map(|t| t.text.as_str()).collect()
    }

    /// Short name of the line kind, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            LdifLine::Version(_) => "version",
            LdifLine::Comment(_) => "comment",
            LdifLine::Dn(_) => "dn",
            LdifLine::AttrVal(_) => "attribute value",
            LdifLine::Control(_) => "control",
            LdifLine::ChangeType(_) => "changetype",
            LdifLine::ModSpec(_) => "modification",
            LdifLine::ModSpecSep(_) => "'-'",
            LdifLine::NewRdn(_) => "newrdn",
            LdifLine::DeleteOldRdn(_) => "deleteoldrdn",
            LdifLine::NewSuperior(_) => "newsuperior",
            LdifLine::Separator(_) => "blank",
            LdifLine::Unknown(_) => "unrecognized",
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, LdifLine::Comment(_))
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, LdifLine::Separator(_))
    }

    /// Change type named by a valid `changetype:` line.
    pub fn change_type(&self) -> Option<ChangeType> {
        match self {
            LdifLine::ChangeType(l) => match l.value.as_ref()?.kind {
                LdifTokenKind::ChangeType(c) => Some(c),
                _ => None,
            },
            _ => None,
        }
    }

    /// Operation of a mod-spec header line.
    pub fn mod_op(&self) -> Option<ModOp> {
        match self {
            LdifLine::ModSpec(l) => match l.key.kind {
                LdifTokenKind::ModSpec(op) => Some(op),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_cause().is_none()
    }

    pub fn invalid_cause(&self) -> Option<String> {
        match self {
            LdifLine::Comment(_) | LdifLine::Separator(_) => None,
            LdifLine::ModSpecSep(l) => unexpected(&l.tokens[1..]),
            LdifLine::Unknown(l) => Some(format!("Unrecognized line '{}'", l.text())),
            LdifLine::Control(l) => l.invalid_cause(),
            LdifLine::AttrVal(l) | LdifLine::NewSuperior(l) => l.common_cause(),
            LdifLine::Dn(l) => l.common_cause().or_else(|| {
                if l.value_type() == Some(ValueType::Url) {
                    Some("DN must not be a URL".to_string())
                } else if l.raw_value().is_empty() {
                    Some("Missing DN".to_string())
                } else if l.value_bytes().is_some_and(|b| std::str::from_utf8(&b).is_err()) {
                    Some("DN is not valid UTF-8".to_string())
                } else {
                    None
                }
            }),
            LdifLine::Version(l) => l.common_cause().or_else(|| match &l.value {
                None => Some("Missing version number".to_string()),
                Some(v) if v.value() != "1" => {
                    Some(format!("Unsupported LDIF version '{}'", v.value()))
                }
                Some(_) => None,
            }),
            LdifLine::ChangeType(l) => l.common_cause().or_else(|| match &l.value {
                None => Some("Missing change type".to_string()),
                Some(v) if v.kind == LdifTokenKind::Value => {
                    Some(format!("Unknown change type '{}'", v.value()))
                }
                Some(_) => None,
            }),
            LdifLine::ModSpec(l) => l.common_cause().or_else(|| {
                l.value
                    .is_none()
                    .then(|| "Missing attribute description".to_string())
            }),
            LdifLine::NewRdn(l) => l.common_cause().or_else(|| {
                l.raw_value()
                    .is_empty()
                    .then(|| "Missing new RDN".to_string())
            }),
            LdifLine::DeleteOldRdn(l) => l.common_cause().or_else(|| {
                let v = l.raw_value();
                (v != "0" && v != "1").then(|| "deleteoldrdn must be 0 or 1".to_string())
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Programmatic construction
// ---------------------------------------------------------------------------

/// Lays out tokens for a detached line starting at offset 0.
struct LineBuilder {
    tokens: Vec<LdifToken>,
    offset: usize,
}

impl LineBuilder {
    fn new() -> Self {
        LineBuilder {
            tokens: Vec::new(),
            offset: 0,
        }
    }

    fn push(mut self, kind: LdifTokenKind, text: &str) -> Self {
        if !text.is_empty() {
            self.tokens.push(LdifToken::new(kind, text, self.offset));
            self.offset += text.len();
        }
        self
    }

    /// `: value` or `:: base64`, chosen by the SAFE-STRING rule.
    fn value(self, kind: LdifTokenKind, value: &[u8]) -> Self {
        if must_encode(value) {
            self.push(LdifTokenKind::ValueType(ValueType::Base64), ":: ")
                .push(kind, &encode_base64(value))
        } else {
            let text = String::from_utf8_lossy(value);
            let marker = if text.is_empty() { ":" } else { ": " };
            self.push(LdifTokenKind::ValueType(ValueType::Safe), marker)
                .push(kind, &text)
        }
    }

    fn finish(self) -> LdifLine {
        let b = self.push(LdifTokenKind::Sep, "\n");
        parse_line(&b.tokens)
    }
}

impl LdifLine {
    pub fn version() -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::VersionSpec, "version")
            .push(LdifTokenKind::ValueType(ValueType::Safe), ": ")
            .push(LdifTokenKind::Number, "1")
            .finish()
    }

    pub fn dn(dn: &str) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::DnSpec, "dn")
            .value(LdifTokenKind::Value, dn.as_bytes())
            .finish()
    }

    /// An attribute value line; the value is base64-encoded when it is not a
    /// SAFE-STRING.
    pub fn attr_val(attribute: &str, value: &[u8]) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::Attribute, attribute)
            .value(LdifTokenKind::Value, value)
            .finish()
    }

    /// A comment line; `text` is what follows the `#`.
    pub fn comment(text: &str) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::Comment, &format!("#{}", text))
            .finish()
    }

    pub fn separator() -> LdifLine {
        LineBuilder::new().finish()
    }

    pub fn changetype_line(change: ChangeType) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::ChangeTypeSpec, "changetype")
            .push(LdifTokenKind::ValueType(ValueType::Safe), ": ")
            .push(LdifTokenKind::ChangeType(change), change.as_str())
            .finish()
    }

    pub fn mod_spec(op: ModOp, attribute: &str) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::ModSpec(op), op.as_str())
            .push(LdifTokenKind::ValueType(ValueType::Safe), ": ")
            .push(LdifTokenKind::Attribute, attribute)
            .finish()
    }

    pub fn mod_spec_sep() -> LdifLine {
        LineBuilder::new().push(LdifTokenKind::ModSep, "-").finish()
    }

    pub fn new_rdn(rdn: &str) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::NewRdnSpec, "newrdn")
            .value(LdifTokenKind::Value, rdn.as_bytes())
            .finish()
    }

    pub fn delete_old_rdn(delete: bool) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::DeleteOldRdnSpec, "deleteoldrdn")
            .push(LdifTokenKind::ValueType(ValueType::Safe), ": ")
            .push(LdifTokenKind::Value, if delete { "1" } else { "0" })
            .finish()
    }

    pub fn new_superior(dn: &str) -> LdifLine {
        LineBuilder::new()
            .push(LdifTokenKind::NewSuperiorSpec, "newsuperior")
            .value(LdifTokenKind::Value, dn.as_bytes())
            .finish()
    }

    pub fn control(oid: &str, criticality: Option<bool>, value: Option<&[u8]>) -> LdifLine {
        let mut b = LineBuilder::new()
            .push(LdifTokenKind::ControlSpec, "control")
            .push(LdifTokenKind::ValueType(ValueType::Safe), ": ")
            .push(LdifTokenKind::Oid, oid);
        if let Some(critical) = criticality {
            let text = if critical { " true" } else { " false" };
            b = b.push(LdifTokenKind::Criticality(critical), text);
        }
        if let Some(value) = value {
            b = b.value(LdifTokenKind::Value, value);
        }
        b.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::tokenize;

    fn lines(text: &str) -> Vec<LdifLine> {
        let tokens = tokenize(text);
        split_lines(&tokens).into_iter().map(parse_line).collect()
    }

    fn line(text: &str) -> LdifLine {
        lines(text).remove(0)
    }

    // ── Group 1: splitting ──────────────────────────────────────────────

    #[test]
    fn split_keeps_separators() {
        let tokens = tokenize("dn: cn=a\n\ncn: a");
        let split = split_lines(&tokens);
        assert_eq!(split.len(), 3);
        assert_eq!(split[1].len(), 1);
        assert_eq!(split[2].last().unwrap().kind, LdifTokenKind::Value);
    }

    #[test]
    fn split_empty_input() {
        assert!(split_lines(&tokenize("")).is_empty());
    }

    // ── Group 2: variants ───────────────────────────────────────────────

    #[test]
    fn dn_line() {
        let l = line("dn: cn=foo,ou=system\n");
        let LdifLine::Dn(v) = &l else {
            panic!("expected dn line, got {:?}", l);
        };
        assert_eq!(v.value_string(), "cn=foo,ou=system");
        assert!(l.is_valid());
    }

    #[test]
    fn base64_dn_line() {
        let l = line("dn:: Y249Zm9v\n");
        assert_eq!(l.value_line().unwrap().value_string(), "cn=foo");
        assert!(l.is_valid());
    }

    #[test]
    fn attr_val_line() {
        let l = line("cn: foo\n");
        assert!(matches!(l, LdifLine::AttrVal(_)));
        assert_eq!(l.value_line().unwrap().key(), "cn");
    }

    #[test]
    fn comment_and_separator() {
        let ls = lines("# hi\n\n");
        assert!(ls[0].is_comment());
        assert!(ls[1].is_separator());
        assert!(ls.iter().all(|l| l.is_valid()));
    }

    #[test]
    fn change_type_line() {
        let ls = lines("dn: cn=a\nchangetype: delete\n");
        assert_eq!(ls[1].change_type(), Some(ChangeType::Delete));
    }

    #[test]
    fn mod_spec_line() {
        let ls = lines("dn: cn=a\nchangetype: modify\nreplace: sn\n");
        assert_eq!(ls[2].mod_op(), Some(ModOp::Replace));
        assert_eq!(ls[2].value_line().unwrap().raw_value(), "sn");
        assert!(ls[2].is_valid());
    }

    #[test]
    fn control_line() {
        let l = line("control: 1.2.3.4 false: abc\n");
        let LdifLine::Control(c) = &l else {
            panic!("expected control line");
        };
        assert_eq!(c.oid().unwrap(), "1.2.3.4");
        assert_eq!(c.criticality(), Some(false));
        assert_eq!(c.control_value_bytes().unwrap(), b"abc");
        assert!(l.is_valid());
    }

    // ── Group 3: invalid causes ─────────────────────────────────────────

    #[test]
    fn colon_missing() {
        let l = line("cn foo\n");
        assert_eq!(l.invalid_cause().as_deref(), Some("Colon missing"));
    }

    #[test]
    fn empty_dn_is_missing() {
        assert_eq!(line("dn:\n").invalid_cause().as_deref(), Some("Missing DN"));
    }

    #[test]
    fn bad_base64() {
        assert_eq!(
            line("cn:: !!!\n").invalid_cause().as_deref(),
            Some("Invalid Base64 value")
        );
    }

    #[test]
    fn bad_version() {
        assert_eq!(
            line("version: 2\n").invalid_cause().as_deref(),
            Some("Unsupported LDIF version '2'")
        );
    }

    #[test]
    fn unknown_change_type() {
        let ls = lines("dn: cn=a\nchangetype: bogus\n");
        assert_eq!(
            ls[1].invalid_cause().as_deref(),
            Some("Unknown change type 'bogus'")
        );
    }

    #[test]
    fn unknown_line() {
        let l = line("::: nope\n");
        assert!(matches!(l, LdifLine::Unknown(_)));
        assert_eq!(l.invalid_cause().as_deref(), Some("Unrecognized line '::: nope'"));
    }

    #[test]
    fn delete_old_rdn_values() {
        let ls = lines("dn: cn=a\nchangetype: modrdn\nnewrdn: cn=b\ndeleteoldrdn: 2\n");
        assert!(ls[2].is_valid());
        assert_eq!(
            ls[3].invalid_cause().as_deref(),
            Some("deleteoldrdn must be 0 or 1")
        );
    }

    // ── Group 4: raw text and offsets ───────────────────────────────────

    #[test]
    fn raw_string_is_source() {
        let text = "dn: cn=a\ndescription: long\n  value\n";
        let ls = lines(text);
        let joined: String = ls.iter().map(|l| l.to_raw_string()).collect();
        assert_eq!(joined, text);
        assert_eq!(ls[1].offset(), 9);
        assert_eq!(ls[1].end(), text.len());
        assert_eq!(ls[1].value_line().unwrap().value_string(), "long value");
    }

    // ── Group 5: construction ───────────────────────────────────────────

    #[test]
    fn attr_val_plain() {
        let l = LdifLine::attr_val("cn", b"foo");
        assert_eq!(l.to_raw_string(), "cn: foo\n");
        assert!(l.is_valid());
    }

    #[test]
    fn attr_val_non_ascii_is_base64() {
        let l = LdifLine::attr_val("sn", "\u{e4}\u{f6}\u{fc}".as_bytes());
        assert_eq!(l.to_raw_string(), "sn:: w6TDtsO8\n");
        assert_eq!(
            l.value_line().unwrap().value_bytes().unwrap(),
            "\u{e4}\u{f6}\u{fc}".as_bytes()
        );
    }

    #[test]
    fn attr_val_inner_double_colon_is_plain() {
        let l = LdifLine::attr_val("description", b"a::b");
        assert_eq!(l.to_raw_string(), "description: a::b\n");
    }

    #[test]
    fn attr_val_empty() {
        assert_eq!(LdifLine::attr_val("description", b"").to_raw_string(), "description:\n");
    }

    #[test]
    fn built_mod_spec_is_recognised() {
        let l = LdifLine::mod_spec(ModOp::Delete, "mail");
        assert_eq!(l.mod_op(), Some(ModOp::Delete));
        assert_eq!(l.to_raw_string(), "delete: mail\n");
    }

    #[test]
    fn built_changetype_is_recognised() {
        let l = LdifLine::changetype_line(ChangeType::ModDn);
        assert!(matches!(l, LdifLine::ChangeType(_)));
        assert_eq!(l.change_type(), Some(ChangeType::ModDn));
        assert_eq!(l.to_raw_string(), "changetype: moddn\n");
    }

    #[test]
    fn built_control() {
        let l = LdifLine::control("1.2.3", Some(true), Some(b"x"));
        assert_eq!(l.to_raw_string(), "control: 1.2.3 true: x\n");
        assert!(l.is_valid());
    }

    // ── Group 6: URL values ─────────────────────────────────────────────

    #[test]
    fn resolve_file_url() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, b"\x00\x01binary").unwrap();
        let text = format!("jpegPhoto:< file://{}\n", f.path().display());
        let l = line(&text);
        let v = l.value_line().unwrap();
        assert_eq!(v.value_type(), Some(ValueType::Url));
        assert_eq!(v.resolve_value().unwrap(), b"\x00\x01binary");
    }

    #[test]
    fn resolve_unknown_scheme() {
        let l = line("jpegPhoto:< http://example.com/a.jpg\n");
        assert!(matches!(
            l.value_line().unwrap().resolve_value(),
            Err(LdifError::UnsupportedUrl(_))
        ));
    }
}
