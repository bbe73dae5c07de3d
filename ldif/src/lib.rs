//! LDIF (RFC 2849) text engine for a directory editor: a lossless
//! tokenizer, a line/record/file model that keeps malformed input
//! inspectable, and a formatter.

mod base64;
pub mod error;
pub mod line;
pub mod parseldif;
pub mod print;
pub mod record;
pub mod scanner;
pub mod token;

pub use crate::base64::must_encode;
pub use error::{LdifError, Result};
pub use line::{parse_line, split_lines, ControlLine, LdifLine, RawLine, ValueLine};
pub use parseldif::{parse_file, LdifContainer, LdifFile};
pub use print::{fold_line, format_file, format_line, format_record, LdifFormatParameters};
pub use record::{parse_record, LdifRecord, ModSpec, RecordKind};
pub use scanner::tokenize;
pub use token::{unfold, ChangeType, LdifToken, LdifTokenKind, ModOp, ValueType};
