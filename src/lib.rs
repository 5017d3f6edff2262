/*!
A lazy, non-validating pull tokenizer for [XML 1.0](https://www.w3.org/TR/xml/).

The root point of the documentation is [`Tokenizer`].

Each call to [`Tokenizer::next`] advances past exactly one lexical unit and
returns its [`Event`] kind. Nothing else is materialized: tag names,
attributes and unescaped text are computed only when the matching accessor
is called, and only for the current event.

```
use xmlpull::{Event, Tokenizer};

let mut p = Tokenizer::new("<e a='1'>text &amp; more</e>");
assert_eq!(p.next(), Event::StartTag);
assert_eq!(p.tag_name(), Some("e"));
assert_eq!(p.attributes().unwrap().unwrap()["a"], "1");
assert_eq!(p.next(), Event::Text);
assert_eq!(p.text().unwrap().unwrap(), "text & more");
assert_eq!(p.next(), Event::EndTag);
assert_eq!(p.next(), Event::Eof);
```

The tokenizer does not check well-formedness, does not interpret DTDs and
does not resolve namespaces. Building a tree on top of the events is up
to the caller.
*/

#![doc(html_root_url = "https://docs.rs/xmlpull/0.1.0")]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::error;
use std::fmt;

mod entities;
mod tokenizer;


pub use crate::tokenizer::{Attributes, Event, Tokenizer};


/// Position in text.
///
/// Position indicates a row/line and a column in the original text.
/// Starting from 1:1.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub struct TextPos {
    pub row: u32,
    pub col: u32,
}

impl TextPos {
    /// Constructs a new `TextPos`.
    pub fn new(row: u32, col: u32) -> TextPos {
        TextPos { row, col }
    }
}

impl fmt::Display for TextPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}


/// A tokenizing error.
///
/// Every variant carries the absolute byte offset at which the problem
/// was detected. Use [`Tokenizer::text_pos_at`] or
/// [`Tokenizer::error_message`] to turn it into a line and a column.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// The input ended while a terminator was still being looked for.
    #[allow(missing_docs)]
    UnexpectedEndOfStream { expected: &'static str, pos: usize },

    /// A `<!` sequence that is neither a comment, a CDATA section
    /// nor a doctype declaration.
    #[allow(missing_docs)]
    UnknownMarkup { found: String, pos: usize },

    /// An entity reference that is unterminated, malformed or unknown.
    ///
    /// Reported lazily, only when text or attributes are requested
    /// in resolved mode.
    #[allow(missing_docs)]
    InvalidEntity { reference: String, pos: usize },
}

impl Error {
    /// Returns the absolute byte offset of the error in the input.
    pub fn pos(&self) -> usize {
        match *self {
            Error::UnexpectedEndOfStream { pos, .. } => pos,
            Error::UnknownMarkup { pos, .. } => pos,
            Error::InvalidEntity { pos, .. } => pos,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnexpectedEndOfStream { expected, .. } => {
                write!(f, "unexpected end of stream while looking for {}", expected)
            }
            Error::UnknownMarkup { ref found, .. } => {
                write!(f, "unknown markup '{}'", found)
            }
            Error::InvalidEntity { ref reference, .. } => {
                write!(f, "malformed or unknown entity reference '{}'", reference)
            }
        }
    }
}

impl error::Error for Error {}
