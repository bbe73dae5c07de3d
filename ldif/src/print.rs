//! LDIF output formatting.
//!
//! Renders the line/record/file model back to text under a fixed set of
//! [`LdifFormatParameters`].  Base64 and URL values are written the way
//! they were parsed.  A plain value that is not a SAFE-STRING (leading `:`
//! or `<`, non-ASCII bytes, trailing space) is written as base64, so the
//! marker and the value cannot run together into a different value type.
//! Formatting a model that contains invalid lines is best effort: such
//! lines are written as their unfolded source text.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::base64::{encode_base64, must_encode};
use crate::error::{LdifError, Result};
use crate::line::{ControlLine, LdifLine, ValueLine};
use crate::token::ValueType;
use crate::parseldif::LdifFile;
use crate::record::LdifRecord;

pub const DEFAULT_LINE_WIDTH: usize = 78;

/// Formatting options.  Deserializes from camelCase keys; missing keys take
/// the defaults (`true`, `78`, `"\n"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdifFormatParameters {
    pub space_after_colon: bool,
    pub line_width: usize,
    pub line_separator: String,
}

impl Default for LdifFormatParameters {
    fn default() -> Self {
        LdifFormatParameters {
            space_after_colon: true,
            line_width: DEFAULT_LINE_WIDTH,
            line_separator: "\n".to_string(),
        }
    }
}

impl LdifFormatParameters {
    pub fn new(space_after_colon: bool, line_width: usize, line_separator: &str) -> Result<Self> {
        let params = LdifFormatParameters {
            space_after_colon,
            line_width,
            line_separator: line_separator.to_string(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Check values that came in through deserialization.
    pub fn validate(&self) -> Result<()> {
        if self.line_width == 0 {
            return Err(LdifError::InvalidLineWidth);
        }
        if self.line_separator != "\n" && self.line_separator != "\r\n" {
            return Err(LdifError::InvalidLineSeparator(self.line_separator.clone()));
        }
        Ok(())
    }

    fn space(&self, value: &str) -> &'static str {
        if self.space_after_colon && !value.is_empty() {
            " "
        } else {
            ""
        }
    }
}

// ---------------------------------------------------------------------------
// Folding
// ---------------------------------------------------------------------------

/// Fold a logical line: the first physical line holds `width` characters,
/// every continuation line a single space plus `width - 1` characters.
pub fn fold_line(logical: &str, width: usize, separator: &str) -> String {
    let width = width.max(1);
    let chars: Vec<char> = logical.chars().collect();
    if chars.len() <= width {
        return logical.to_string();
    }
    let mut out: String = chars[..width].iter().collect();
    for chunk in chars[width..].chunks((width - 1).max(1)) {
        out.push_str(separator);
        out.push(' ');
        out.extend(chunk);
    }
    out
}

// ---------------------------------------------------------------------------
// Line rendering
// ---------------------------------------------------------------------------

/// Marker, optional space and value.
fn push_value_spec(s: &mut String, vt: ValueType, value: &str, params: &LdifFormatParameters) {
    if vt == ValueType::Safe && must_encode(value.as_bytes()) {
        let encoded = encode_base64(value.as_bytes());
        s.push_str(ValueType::Base64.marker());
        s.push_str(params.space(&encoded));
        s.push_str(&encoded);
    } else {
        s.push_str(vt.marker());
        s.push_str(params.space(value));
        s.push_str(value);
    }
}

fn logical_value_line(l: &ValueLine, params: &LdifFormatParameters) -> String {
    let mut s = l.key().into_owned();
    if let Some(vt) = l.value_type() {
        push_value_spec(&mut s, vt, &l.raw_value(), params);
    }
    s
}

fn logical_control_line(l: &ControlLine, params: &LdifFormatParameters) -> String {
    let oid = l.oid().unwrap_or_default();
    let mut s = format!("control:{}{}", params.space(&oid), oid);
    if let Some(critical) = l.criticality() {
        s.push_str(if critical { " true" } else { " false" });
    }
    if let (Some(vt), Some(value)) = (l.control_value_type(), l.raw_control_value()) {
        push_value_spec(&mut s, vt, &value, params);
    }
    s
}

/// Source text of the line without folds or separator.
fn unfolded_source(line: &LdifLine) -> String {
    let newline = line.newline();
    line.tokens()
        .into_iter()
        .filter(|t| Some(*t) != newline)
        .map(|t| t.value())
        .collect()
}

pub fn format_line(line: &LdifLine, params: &LdifFormatParameters) -> String {
    let body = match line {
        LdifLine::Separator(_) => String::new(),
        _ if !line.is_valid() => unfolded_source(line),
        LdifLine::ModSpecSep(_) => "-".to_string(),
        LdifLine::Comment(c) => fold_line(&c.text(), params.line_width, &params.line_separator),
        LdifLine::Control(c) => fold_line(
            &logical_control_line(c, params),
            params.line_width,
            &params.line_separator,
        ),
        LdifLine::Unknown(_) => unfolded_source(line),
        LdifLine::Version(l)
        | LdifLine::Dn(l)
        | LdifLine::AttrVal(l)
        | LdifLine::ChangeType(l)
        | LdifLine::ModSpec(l)
        | LdifLine::NewRdn(l)
        | LdifLine::DeleteOldRdn(l)
        | LdifLine::NewSuperior(l) => fold_line(
            &logical_value_line(l, params),
            params.line_width,
            &params.line_separator,
        ),
    };
    let mut out = body;
    if line.newline().is_some() {
        out.push_str(&params.line_separator);
    }
    trace!("formatted {} line: {:?}", line.name(), out);
    out
}

pub fn format_record(record: &LdifRecord, params: &LdifFormatParameters) -> String {
    record
        .lines()
        .iter()
        .map(|l| format_line(l, params))
        .collect()
}

pub fn format_file(file: &LdifFile, params: &LdifFormatParameters) -> String {
    let out: String = file.lines().map(|l| format_line(l, params)).collect();
    debug!(
        "formatted LDIF: {} records, width {}, {} bytes",
        file.record_count(),
        params.line_width,
        out.len()
    );
    out
}
