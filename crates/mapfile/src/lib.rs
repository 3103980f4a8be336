//! Reader for Postfix lookup-table and aliases(5) style text files
//!
//! Administrators keep mail routing tables as plain text. Three conventions
//! are in common use and this crate reads all of them:
//!
//! - [`Syntax::Simple`]: `KEY WHITESPACE REST`, one record per physical line.
//! - [`Syntax::Postfix`]: `KEY WHITESPACE value, value, ...`, with folding.
//! - [`Syntax::Aliases`]: `KEY: value, value, ...`, with folding.
//!
//! In every syntax a `#` starts a comment that runs to the end of the line,
//! blank lines are ignored, and a record must start in column 0. Folded
//! syntaxes continue a record on any following line that starts with
//! whitespace.
//!
//! # Example
//!
//! ```
//! use mapfile::{read, Record, Syntax};
//!
//! let input = "postmaster: root,\n    hostmaster # the on-call\n";
//! let mut records: Vec<Record> = Vec::new();
//! read(input.as_bytes(), Syntax::Aliases, |record| {
//!     records.push(record);
//!     Ok::<_, std::convert::Infallible>(())
//! })?;
//!
//! assert_eq!(records[0].key, "postmaster");
//! assert_eq!(records[0].values, vec!["root", "hostmaster"]);
//! # Ok::<(), mapfile::Error<std::convert::Infallible>>(())
//! ```

use std::fmt;
use std::io::BufRead;
use thiserror::Error;

/// Errors produced while reading a map file
///
/// `E` is the error type of the worker that consumes records.
#[derive(Error, Debug)]
pub enum Error<E> {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("nothing found to import")]
    Empty,

    #[error("line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: E,
    },
}

impl<E> Error<E> {
    /// Line number the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Syntax { line, .. } | Error::Record { line, .. } => Some(*line),
            Error::Io(_) | Error::Empty => None,
        }
    }
}

fn malformed<E>(line: usize, message: impl Into<String>) -> Error<E> {
    Error::Syntax {
        line,
        message: message.into(),
    }
}

/// Text syntax of a map file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// `KEY REST`; the rest of the line is a single value
    Simple,
    /// `KEY v1, v2, ...`; continuation lines start with whitespace
    Postfix,
    /// `KEY: v1, v2, ...`; continuation lines start with whitespace
    Aliases,
}

impl Syntax {
    /// Whether records may be folded over several physical lines
    pub fn folds(self) -> bool {
        !matches!(self, Syntax::Simple)
    }

    /// Render a record in this syntax
    ///
    /// This is the inverse of [`read`] for records without comments.
    pub fn format<S: AsRef<str>>(self, key: &str, values: &[S]) -> String {
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        match self {
            Syntax::Simple | Syntax::Postfix if joined.is_empty() => key.to_string(),
            Syntax::Simple | Syntax::Postfix => format!("{} {}", key, joined),
            Syntax::Aliases => format!("{}: {}", key, joined),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Simple => write!(f, "simple"),
            Syntax::Postfix => write!(f, "postfix"),
            Syntax::Aliases => write!(f, "aliases"),
        }
    }
}

/// One logical record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Line number of the first physical line of the record
    pub line: usize,
    /// The key, in its original case
    pub key: String,
    /// Trimmed, non-empty values. For [`Syntax::Simple`] there is exactly one.
    pub values: Vec<String>,
}

impl Record {
    /// The single value of a [`Syntax::Simple`] record, or the values joined
    /// with a space for the folded syntaxes
    pub fn rest(&self) -> String {
        self.values.join(" ")
    }
}

/// Read every record from `input`, handing each one to `worker`
///
/// Stops at the first syntax or worker error. A worker error is returned as
/// [`Error::Record`] tagged with the record's first line number. If the input
/// holds no records at all, [`Error::Empty`] is returned.
///
/// On success returns the number of records delivered.
pub fn read<R, E, F>(input: R, syntax: Syntax, mut worker: F) -> Result<usize, Error<E>>
where
    R: BufRead,
    F: FnMut(Record) -> Result<(), E>,
{
    let mut pending: Option<(usize, String)> = None;
    let mut delivered = 0;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let text = strip_comment(&line);

        if text.trim().is_empty() {
            continue;
        }

        if text.starts_with(char::is_whitespace) {
            match pending.as_mut() {
                Some((_, logical)) if syntax.folds() => {
                    logical.push(' ');
                    logical.push_str(text.trim());
                }
                _ => return Err(malformed(number, "Indented but not a continuation")),
            }
            continue;
        }

        if let Some((start, logical)) = pending.replace((number, text.trim_end().to_string())) {
            deliver(syntax, start, &logical, &mut worker)?;
            delivered += 1;
        }
    }

    if let Some((start, logical)) = pending.take() {
        deliver(syntax, start, &logical, &mut worker)?;
        delivered += 1;
    }

    if delivered == 0 {
        return Err(Error::Empty);
    }
    Ok(delivered)
}

fn deliver<E, F>(syntax: Syntax, line: usize, text: &str, worker: &mut F) -> Result<(), Error<E>>
where
    F: FnMut(Record) -> Result<(), E>,
{
    let record = parse_record(syntax, line, text)?;
    worker(record).map_err(|source| Error::Record { line, source })
}

/// Split one logical line into a record
fn parse_record<E>(syntax: Syntax, line: usize, text: &str) -> Result<Record, Error<E>> {
    let text = text.trim();

    match syntax {
        Syntax::Simple => {
            let (key, rest) = split_key(text);
            if rest.is_empty() {
                return Err(malformed(line, format!("only one token: '{}'", key)));
            }
            Ok(Record {
                line,
                key: key.to_string(),
                values: vec![rest.to_string()],
            })
        }
        Syntax::Postfix => {
            let (key, rest) = split_key(text);
            Ok(Record {
                line,
                key: key.to_string(),
                values: split_values(rest),
            })
        }
        Syntax::Aliases => {
            let (key, rest) = text
                .split_once(':')
                .ok_or_else(|| malformed(line, format!("missing ':' after key: '{}'", text)))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed(line, "missing key before ':'"));
            }
            if key.contains(char::is_whitespace) {
                return Err(malformed(line, format!("key contains whitespace: '{}'", key)));
            }
            let values = split_values(rest);
            if values.is_empty() {
                return Err(malformed(line, format!("no values for '{}'", key)));
            }
            Ok(Record {
                line,
                key: key.to_string(),
                values,
            })
        }
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn split_key(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((key, rest)) => (key, rest.trim()),
        None => (text, ""),
    }
}

fn split_values(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}
