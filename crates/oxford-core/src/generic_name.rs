//! Parsed form of natural type names with static argument lists.
//!
//! A name is a sequence of pieces: plain text runs and bracketed argument
//! lists. `pkg/Box⟦T,n=U⟧$Impl` parses to
//! `[Text("pkg/Box"), Args([T, n=U]), Text("$Impl")]`. Arguments are
//! themselves names, so nesting is unbounded.
//!
//! Parsing followed by printing reproduces the input exactly.
//!
//! # Examples
//!
//! ```
//! use oxford_core::GenericName;
//!
//! let name = GenericName::parse("Arrow⟦Box⟦Int⟧,String⟧").unwrap();
//! assert_eq!(name.stem(), Some("Arrow"));
//! assert_eq!(name.args().map(|a| a.len()), Some(2));
//! assert_eq!(name.to_string(), "Arrow⟦Box⟦Int⟧,String⟧");
//! ```

use std::fmt;

use crate::error::{NamingError, NamingResult};
use crate::naming::{
    ARG_SEPARATOR, EMPTY_ARGS, LABEL_MARKER, LEFT_OXFORD, PATH_SEPARATOR, RIGHT_OXFORD,
};

/// Stem of function types.
pub const ARROW: &str = "Arrow";

/// Stem of the abstract base class every closure extends.
pub const ABSTRACT_ARROW: &str = "AbstractArrow";

/// Stem of tuple types.
pub const TUPLE: &str = "Tuple";

/// One static argument, optionally labeled (`label=value`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arg {
    pub label: Option<String>,
    pub value: GenericName,
}

impl Arg {
    /// An unlabeled argument.
    pub fn new(value: GenericName) -> Self {
        Self { label: None, value }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{label}{LABEL_MARKER}")?;
        }
        write!(f, "{}", self.value)
    }
}

/// A run of plain text or a bracketed argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Piece {
    Text(String),
    Args(Vec<Arg>),
}

/// A natural type name split into text and argument lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GenericName {
    pieces: Vec<Piece>,
}

impl GenericName {
    /// Parse a natural name.
    ///
    /// Fails on unbalanced brackets and on labels that are not plain text.
    pub fn parse(name: &str) -> NamingResult<Self> {
        let mut parser = Parser {
            source: name,
            chars: name.char_indices().peekable(),
        };
        parser.parse_top()
    }

    /// A name consisting of plain text only.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            pieces: vec![Piece::Text(text)],
        }
    }

    /// `stem⟦args⟧`.
    pub fn with_args(stem: &str, args: Vec<Arg>) -> Self {
        let mut pieces = Vec::with_capacity(2);
        if !stem.is_empty() {
            pieces.push(Piece::Text(stem.to_string()));
        }
        pieces.push(Piece::Args(args));
        Self { pieces }
    }

    /// Build from raw pieces.
    pub fn from_pieces(pieces: Vec<Piece>) -> Self {
        Self { pieces }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn into_pieces(self) -> Vec<Piece> {
        self.pieces
    }

    /// The text if this name has no argument lists at all.
    pub fn as_plain(&self) -> Option<&str> {
        match self.pieces.as_slice() {
            [] => Some(""),
            [Piece::Text(text)] => Some(text),
            _ => None,
        }
    }

    /// `true` if any argument list appears at the top level.
    pub fn is_generic(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::Args(_)))
    }

    /// Text before the first argument list, when the name is generic.
    pub fn stem(&self) -> Option<&str> {
        match self.pieces.as_slice() {
            [Piece::Text(text), Piece::Args(_), ..] => Some(text),
            [Piece::Args(_), ..] => Some(""),
            _ => None,
        }
    }

    /// The last path segment of the stem.
    pub fn simple_stem(&self) -> Option<&str> {
        self.stem()
            .map(|stem| stem.rsplit(PATH_SEPARATOR).next().unwrap_or(stem))
    }

    /// The first argument list.
    pub fn args(&self) -> Option<&[Arg]> {
        self.pieces.iter().find_map(|p| match p {
            Piece::Args(args) => Some(args.as_slice()),
            Piece::Text(_) => None,
        })
    }

    /// Everything after the first argument list, printed.
    pub fn suffix(&self) -> String {
        let mut out = String::new();
        let after = self.pieces.iter().skip_while(|p| !matches!(p, Piece::Args(_))).skip(1);
        for piece in after {
            write_piece(&mut out, piece);
        }
        out
    }

    /// Replace the first argument list with `⟦⟧`.
    ///
    /// `Box⟦Int⟧$Impl` becomes `Box⟦⟧$Impl`, the name under which the
    /// template's resources are stored.
    pub fn canonical_template_name(&self) -> Option<String> {
        let stem = self.stem()?;
        Some(format!("{stem}{EMPTY_ARGS}{}", self.suffix()))
    }

    /// The first argument list printed as bare strings, labels included.
    pub fn extract_parameters(&self) -> Vec<String> {
        self.args()
            .map(|args| args.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Same pieces with the first argument list replaced.
    pub fn replace_args(&self, args: Vec<Arg>) -> Self {
        let mut replaced = false;
        let pieces = self
            .pieces
            .iter()
            .map(|p| match p {
                Piece::Args(_) if !replaced => {
                    replaced = true;
                    Piece::Args(args.clone())
                }
                other => other.clone(),
            })
            .collect();
        Self { pieces }
    }

    /// `true` for `Arrow⟦…⟧` with nothing after the list.
    pub fn is_arrow(&self) -> bool {
        self.has_shape(ARROW)
    }

    /// `true` for `AbstractArrow⟦…⟧` with nothing after the list.
    pub fn is_abstract_arrow(&self) -> bool {
        self.has_shape(ABSTRACT_ARROW)
    }

    /// `true` for `Tuple⟦…⟧` with nothing after the list.
    pub fn is_tuple(&self) -> bool {
        self.has_shape(TUPLE)
    }

    fn has_shape(&self, stem: &str) -> bool {
        matches!(self.pieces.as_slice(), [Piece::Text(text), Piece::Args(_)] if text == stem)
    }

    /// Split an arrow's arguments into domain and range.
    pub fn split_arrow(&self) -> Option<(&[Arg], &Arg)> {
        if !(self.is_arrow() || self.is_abstract_arrow()) {
            return None;
        }
        self.args()?.split_last().map(|(last, rest)| (rest, last))
    }
}

impl fmt::Display for GenericName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for piece in &self.pieces {
            write_piece(&mut out, piece);
        }
        f.write_str(&out)
    }
}

fn write_piece(out: &mut String, piece: &Piece) {
    match piece {
        Piece::Text(text) => out.push_str(text),
        Piece::Args(args) => {
            out.push(LEFT_OXFORD);
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(ARG_SEPARATOR);
                }
                out.push_str(&arg.to_string());
            }
            out.push(RIGHT_OXFORD);
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn unbalanced(&self, offset: usize) -> NamingError {
        NamingError::UnbalancedBrackets {
            name: self.source.to_string(),
            offset,
        }
    }

    fn parse_top(&mut self) -> NamingResult<GenericName> {
        let name = self.parse_name(false, false)?;
        if let Some(&(offset, _)) = self.chars.peek() {
            return Err(self.unbalanced(offset));
        }
        Ok(name)
    }

    /// Parse pieces until end of input or, when `nested`, a `,` or `⟧`.
    /// With `stop_at_label` a `=` also ends the name.
    fn parse_name(&mut self, nested: bool, stop_at_label: bool) -> NamingResult<GenericName> {
        let mut pieces = Vec::new();
        let mut text = String::new();
        while let Some(&(offset, ch)) = self.chars.peek() {
            match ch {
                LEFT_OXFORD => {
                    self.chars.next();
                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }
                    pieces.push(Piece::Args(self.parse_args(offset)?));
                }
                RIGHT_OXFORD if !nested => return Err(self.unbalanced(offset)),
                RIGHT_OXFORD | ARG_SEPARATOR if nested => break,
                LABEL_MARKER if stop_at_label => break,
                _ => {
                    self.chars.next();
                    text.push(ch);
                }
            }
        }
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }
        Ok(GenericName { pieces })
    }

    /// Parse arguments after a consumed `⟦` that sits at `open`.
    fn parse_args(&mut self, open: usize) -> NamingResult<Vec<Arg>> {
        let mut args = Vec::new();
        if matches!(self.chars.peek(), Some(&(_, RIGHT_OXFORD))) {
            self.chars.next();
            return Ok(args);
        }
        loop {
            args.push(self.parse_arg()?);
            match self.chars.next() {
                Some((_, ARG_SEPARATOR)) => continue,
                Some((_, RIGHT_OXFORD)) => return Ok(args),
                _ => return Err(self.unbalanced(open)),
            }
        }
    }

    fn parse_arg(&mut self) -> NamingResult<Arg> {
        let head = self.parse_name(true, true)?;
        if !matches!(self.chars.peek(), Some(&(_, LABEL_MARKER))) {
            return Ok(Arg::new(head));
        }
        self.chars.next();
        let label = head.as_plain().map(str::to_string).ok_or_else(|| NamingError::MalformedLabel {
            name: self.source.to_string(),
        })?;
        let value = self.parse_name(true, false)?;
        Ok(Arg {
            label: Some(label),
            value,
        })
    }
}
