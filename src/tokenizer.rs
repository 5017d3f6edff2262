use std::borrow::Cow;
use std::cmp;
use std::collections::HashMap;
use std::ops::Range;

use log::{debug, trace};
use memchr::{memchr, memchr2, memmem};

use crate::entities::EntityCache;
use crate::{Error, TextPos};

type Result<T> = std::result::Result<T, Error>;

trait XmlByteExt {
    /// Checks if byte is a space.
    ///
    /// `[ \r\n\t]`
    fn is_xml_space(&self) -> bool;

    /// Checks if byte ends a tag, doctype or PI target name.
    ///
    /// `[ \r\n\t/>?[]`
    fn is_name_end(&self) -> bool;
}

impl XmlByteExt for u8 {
    #[inline]
    fn is_xml_space(&self) -> bool {
        matches!(*self, b' ' | b'\t' | b'\n' | b'\r')
    }

    #[inline]
    fn is_name_end(&self) -> bool {
        self.is_xml_space() || matches!(*self, b'/' | b'>' | b'?' | b'[')
    }
}

/// Attributes of a start tag, keyed by name.
///
/// A later duplicate overwrites an earlier one.
pub type Attributes<'input> = HashMap<&'input str, Cow<'input, str>>;

/// A kind of lexical unit produced by [`Tokenizer::next`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Event {
    /// Character data between markup.
    Text,
    /// `<name ...>`
    StartTag,
    /// `<name .../>`
    SingleTag,
    /// `</name>`
    EndTag,
    /// `<!--text-->`
    Comment,
    /// `<![CDATA[text]]>`
    Cdata,
    /// `<!DOCTYPE name ...>`, including an internal subset.
    Doctype,
    /// `<?target content?>`
    ProcessingInstruction,
    /// End of input. Terminal.
    Eof,
    /// A structural error, see [`Tokenizer::error`]. Terminal.
    Error,
}

/// Offsets describing the current event.
///
/// Only valid until the next `Tokenizer::next` call.
#[derive(Clone, Default)]
struct Markers {
    start: usize,
    name: Range<usize>,
    body: Range<usize>,
    tag_end: usize,
    escaped: bool,
}

impl Markers {
    fn new(start: usize) -> Self {
        Markers {
            start,
            name: start..start,
            body: start..start,
            tag_end: start,
            escaped: false,
        }
    }
}

/// A pull tokenizer over an in-memory XML text.
///
/// Call [`next`](Tokenizer::next) to advance to the next event, then
/// query only the details you need. Accessors return `None` when they
/// do not apply to the current event.
///
/// Once [`Event::Eof`] or [`Event::Error`] is returned, every following
/// `next` call returns the same event again.
///
/// # Examples
///
/// ```
/// use xmlpull::{Event, Tokenizer};
///
/// let mut p = Tokenizer::new("<svg:rect width='10'/>");
/// assert_eq!(p.next(), Event::SingleTag);
/// assert_eq!(p.prefix(), Some("svg"));
/// assert_eq!(p.local_name(), Some("rect"));
/// assert_eq!(p.next(), Event::Eof);
/// ```
pub struct Tokenizer<'input> {
    stream: Stream<'input>,
    event: Option<Event>,
    markers: Markers,
    error: Option<Error>,
    names: HashMap<&'input str, (&'input str, &'input str)>,
    entities: EntityCache<'input>,
}

impl<'input> From<&'input str> for Tokenizer<'input> {
    #[inline]
    fn from(text: &'input str) -> Self {
        Tokenizer::new(text)
    }
}

impl<'input> Tokenizer<'input> {
    /// Creates a new tokenizer over `text`.
    ///
    /// A leading byte order mark is skipped.
    pub fn new(text: &'input str) -> Self {
        let mut stream = Stream::new(text);
        if text.starts_with('\u{FEFF}') {
            stream.advance('\u{FEFF}'.len_utf8());
        }

        Tokenizer {
            stream,
            event: None,
            markers: Markers::default(),
            error: None,
            names: HashMap::new(),
            entities: EntityCache::new(),
        }
    }

    /// Advances past exactly one lexical unit and returns its kind.
    ///
    /// Invalidates everything the accessors returned for the previous event.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Event {
        if let Some(event @ (Event::Eof | Event::Error)) = self.event {
            return event;
        }

        let start = self.stream.pos();
        self.markers = Markers::new(start);
        self.error = None;

        let event = match self.scan() {
            Ok(event) => {
                trace!("{:?} at {:?}", event, start..self.stream.pos());
                event
            }
            Err(e) => {
                debug!("{} at byte {}", e, e.pos());
                self.error = Some(e);
                Event::Error
            }
        };

        self.event = Some(event);
        event
    }

    /// Returns the event produced by the last [`next`](Tokenizer::next) call.
    pub fn event(&self) -> Option<Event> {
        self.event
    }

    /// Returns the current cursor position in bytes.
    pub fn pos(&self) -> usize {
        self.stream.pos()
    }

    /// Returns the byte range of the current event in the input.
    ///
    /// `None` before the first event and after an error.
    pub fn range(&self) -> Option<Range<usize>> {
        match self.event? {
            Event::Error => None,
            _ => Some(self.markers.start..self.stream.pos()),
        }
    }

    /// Returns the name of a start, single, end tag or a doctype.
    pub fn tag_name(&self) -> Option<&'input str> {
        match self.event? {
            Event::StartTag | Event::SingleTag | Event::EndTag | Event::Doctype => {
                Some(self.stream.slice(self.markers.name.clone()))
            }
            _ => None,
        }
    }

    /// Returns the part of the tag name after the last `:`.
    ///
    /// The whole name when there is no `:`.
    pub fn local_name(&mut self) -> Option<&'input str> {
        self.name_parts().map(|(_, local)| local)
    }

    /// Returns the part of the tag name before the first `:`.
    ///
    /// An empty string when there is no `:`.
    pub fn prefix(&mut self) -> Option<&'input str> {
        self.name_parts().map(|(prefix, _)| prefix)
    }

    fn name_parts(&mut self) -> Option<(&'input str, &'input str)> {
        let name = self.tag_name()?;
        let parts = *self.names.entry(name).or_insert_with(|| split_qname(name));
        Some(parts)
    }

    /// Returns the target of a processing instruction.
    pub fn pi_target(&self) -> Option<&'input str> {
        match self.event? {
            Event::ProcessingInstruction => Some(self.stream.slice(self.markers.name.clone())),
            _ => None,
        }
    }

    /// Returns the content of the current event verbatim.
    ///
    /// Applies to text, CDATA, comments, doctypes and processing
    /// instructions. For a doctype this is everything after the name
    /// up to the closing `>`.
    pub fn raw_text(&self) -> Option<&'input str> {
        match self.event? {
            Event::Text
            | Event::Cdata
            | Event::Comment
            | Event::Doctype
            | Event::ProcessingInstruction => Some(self.stream.slice(self.markers.body.clone())),
            _ => None,
        }
    }

    /// Returns the content of the current event with entity references resolved.
    ///
    /// Only text events are resolved; everything else is returned as is.
    /// A resolution failure is returned and also recorded as the last
    /// [`error`](Tokenizer::error), but does not change the current event.
    pub fn text(&mut self) -> Result<Option<Cow<'input, str>>> {
        let text = match self.raw_text() {
            Some(text) => text,
            None => return Ok(None),
        };

        if !self.markers.escaped {
            return Ok(Some(Cow::Borrowed(text)));
        }

        match self.entities.resolve(text, self.markers.body.start) {
            Ok(text) => Ok(Some(text)),
            Err(e) => Err(self.record(e)),
        }
    }

    /// Returns the attributes of a start or single tag with entity
    /// references in values resolved.
    ///
    /// On failure nothing collected so far is returned, and the error is
    /// also recorded as the last [`error`](Tokenizer::error).
    pub fn attributes(&mut self) -> Result<Option<Attributes<'input>>> {
        self.collect_attributes(false)
    }

    /// Like [`attributes`](Tokenizer::attributes), but values are returned verbatim.
    pub fn raw_attributes(&mut self) -> Result<Option<Attributes<'input>>> {
        self.collect_attributes(true)
    }

    fn collect_attributes(&mut self, raw: bool) -> Result<Option<Attributes<'input>>> {
        match self.event {
            Some(Event::StartTag) | Some(Event::SingleTag) => {}
            _ => return Ok(None),
        }

        let mut attrs = Attributes::new();

        // The shortest possible attribute is `x=""`, plus a leading space.
        let name_end = self.markers.name.end;
        if self.markers.tag_end.saturating_sub(name_end) < 5 {
            return Ok(Some(attrs));
        }

        // Rescan the tag interior on a substream, so the cursor
        // stays right after the tag.
        let mut s = self.stream.clone();
        s.jump_to(name_end);
        match self.scan_attributes(&mut s, raw, &mut attrs) {
            Ok(()) => Ok(Some(attrs)),
            Err(e) => Err(self.record(e)),
        }
    }

    fn scan_attributes(
        &mut self,
        s: &mut Stream<'input>,
        raw: bool,
        attrs: &mut Attributes<'input>,
    ) -> Result<()> {
        loop {
            let name_start = s.pos();
            let eq = match s.find_byte2_from(name_start, b'=', b'>') {
                Some(idx) if s.byte(idx) == b'=' => idx,
                _ => return Ok(()),
            };

            let err = Error::UnexpectedEndOfStream {
                expected: "attribute delimiters",
                pos: eq,
            };

            let open = s.find_byte2_from(eq + 1, b'"', b'\'').ok_or_else(|| err.clone())?;
            let close = s.find_byte_from(open + 1, s.byte(open)).ok_or(err)?;

            let name = s.slice(name_start..eq).trim();
            let value = s.slice(open + 1..close);
            let value = if raw {
                Cow::Borrowed(value)
            } else {
                self.entities.resolve(value, open + 1)?
            };

            attrs.insert(name, value);
            s.jump_to(close + 1);
        }
    }

    /// Returns the last error.
    ///
    /// Set when [`next`](Tokenizer::next) returned [`Event::Error`] or when
    /// a lazy accessor failed for the current event.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns the last error as a message with a `line:column` position.
    ///
    /// **Note:** this operation is expensive.
    pub fn error_message(&self) -> Option<String> {
        let e = self.error.as_ref()?;
        Some(format!("{} at {}", e, self.text_pos_at(e.pos())))
    }

    /// Calculates `TextPos` in the original text from position in bytes.
    ///
    /// **Note:** this operation is expensive.
    ///
    /// # Examples
    ///
    /// ```
    /// let p = xmlpull::Tokenizer::new("\
    /// <!-- comment -->
    /// <e/>"
    /// );
    ///
    /// assert_eq!(p.text_pos_at(10), xmlpull::TextPos::new(1, 11));
    /// assert_eq!(p.text_pos_at(18), xmlpull::TextPos::new(2, 2));
    /// ```
    pub fn text_pos_at(&self, pos: usize) -> TextPos {
        self.stream.gen_text_pos_from(pos)
    }

    fn record(&mut self, e: Error) -> Error {
        debug!("{} at byte {}", e, e.pos());
        self.error = Some(e.clone());
        e
    }

    fn scan(&mut self) -> Result<Event> {
        let start = self.stream.pos();
        match self.stream.curr_byte() {
            None => Ok(Event::Eof),
            Some(b'<') => match self.stream.peek(1) {
                Some(b'/') => self.scan_end_tag(),
                Some(b'?') => {
                    self.scan_pi()?;
                    Ok(Event::ProcessingInstruction)
                }
                Some(b'!') => match self.stream.peek(2) {
                    Some(b'-') => {
                        self.scan_until(4, "-->")?;
                        Ok(Event::Comment)
                    }
                    Some(b'[') => {
                        self.scan_until(9, "]]>")?;
                        Ok(Event::Cdata)
                    }
                    Some(b'D') => self.scan_doctype(),
                    _ => Err(Error::UnknownMarkup {
                        found: self.stream.chars_ahead(3),
                        pos: start,
                    }),
                },
                _ => self.scan_start_tag(),
            },
            Some(_) => Ok(self.scan_text()),
        }
    }

    // Everything up to the next `<`. Trailing text without one is
    // not an event, but the end of input.
    fn scan_text(&mut self) -> Event {
        let start = self.stream.pos();
        match self.stream.find_byte_from(start, b'<') {
            Some(end) => {
                self.markers.body = start..end;
                self.markers.escaped = true;
                self.stream.jump_to(end);
                Event::Text
            }
            None => {
                self.stream.jump_to(self.stream.end());
                Event::Eof
            }
        }
    }

    // Comments and CDATA: skip the opening delimiter, stop at the terminator.
    fn scan_until(&mut self, skip: usize, terminator: &'static str) -> Result<()> {
        let start = self.stream.pos();
        let body_start = self.stream.ceil_char_boundary(start + skip);
        let end = self
            .stream
            .find_str_from(body_start, terminator)
            .ok_or(Error::UnexpectedEndOfStream { expected: terminator, pos: start })?;

        self.markers.body = body_start..end;
        self.markers.tag_end = end + terminator.len() - 1;
        self.stream.jump_to(end + terminator.len());
        Ok(())
    }

    // '<' Name ... '>' | '<' Name ... '/>'
    fn scan_start_tag(&mut self) -> Result<Event> {
        let start = self.stream.pos();
        let name_end = self.stream.find_name_end(start + 1);
        let gt = self
            .stream
            .find_byte_from(name_end, b'>')
            .ok_or(Error::UnexpectedEndOfStream { expected: ">", pos: start })?;

        self.markers.name = start + 1..name_end;
        self.markers.tag_end = gt;
        self.markers.escaped = true;
        self.stream.jump_to(gt + 1);

        if self.stream.byte(gt - 1) == b'/' {
            Ok(Event::SingleTag)
        } else {
            Ok(Event::StartTag)
        }
    }

    // '</' Name S? '>'
    fn scan_end_tag(&mut self) -> Result<Event> {
        let start = self.stream.pos();
        let name_start = start + 2;
        let gt = self
            .stream
            .find_byte_from(name_start, b'>')
            .ok_or(Error::UnexpectedEndOfStream { expected: ">", pos: start })?;

        let name = self.stream.slice(name_start..gt).trim_end();
        self.markers.name = name_start..name_start + name.len();
        self.markers.tag_end = gt;
        self.stream.jump_to(gt + 1);
        Ok(Event::EndTag)
    }

    // '<?' Target S? Content '?>'
    //
    // Starts at the cursor, so a doctype can reuse it for nested instructions.
    fn scan_pi(&mut self) -> Result<()> {
        let start = self.stream.pos();
        let target_end = self.stream.find_name_end(start + 2);
        let close = self
            .stream
            .find_str_from(target_end, "?>")
            .ok_or(Error::UnexpectedEndOfStream { expected: "?>", pos: start })?;

        // `close >= target_end`, so the content start is always in bounds.
        let body_start = target_end + 1;
        let body_end = cmp::max(close, body_start);

        self.markers.name = start + 2..target_end;
        self.markers.body = body_start..body_end;
        self.markers.tag_end = close + 1;
        self.markers.escaped = false;
        self.stream.jump_to(close + 2);
        Ok(())
    }

    // '<!DOCTYPE ' Name ... '>'
    //
    // The internal subset is skipped by counting angle brackets.
    // Nested processing instructions are consumed whole, since their
    // content may hold unbalanced brackets.
    fn scan_doctype(&mut self) -> Result<Event> {
        let start = self.stream.pos();
        let name_start = self.stream.ceil_char_boundary(start + "<!DOCTYPE ".len());
        let name_end = self.stream.find_name_end(name_start);
        self.stream.jump_to(name_end);

        let mut depth = 1;
        let gt = loop {
            let idx = self
                .stream
                .find_byte2_from(self.stream.pos(), b'<', b'>')
                .ok_or(Error::UnexpectedEndOfStream { expected: "doctype end", pos: start })?;
            self.stream.jump_to(idx);

            if self.stream.byte(idx) == b'>' {
                depth -= 1;
                if depth == 0 {
                    break idx;
                }
            } else if self.stream.peek(1) == Some(b'?') {
                self.scan_pi()?;
                continue;
            } else {
                depth += 1;
            }

            self.stream.advance(1);
        };

        // `scan_pi` reuses the same markers.
        self.markers.name = name_start..name_end;
        self.markers.body = name_end..gt;
        self.markers.tag_end = gt;
        self.markers.escaped = false;
        self.stream.jump_to(gt + 1);
        Ok(Event::Doctype)
    }
}

// Prefix ends at the first `:`, local name starts after the last one.
fn split_qname(name: &str) -> (&str, &str) {
    let prefix = match name.find(':') {
        Some(idx) => &name[..idx],
        None => &name[..0],
    };

    let local = match name.rfind(':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    };

    (prefix, local)
}

#[derive(Clone)]
pub(crate) struct Stream<'input> {
    pos: usize,
    text: &'input str,
}

impl<'input> Stream<'input> {
    #[inline]
    pub fn new(text: &'input str) -> Self {
        Stream { pos: 0, text }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn curr_byte(&self) -> Option<u8> {
        self.peek(0)
    }

    /// Returns the byte `n` bytes after the cursor.
    #[inline]
    pub fn peek(&self, n: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + n).copied()
    }

    /// Returns the byte at the absolute position `pos`.
    ///
    /// Only for positions returned by the `find_*` methods.
    #[inline]
    pub fn byte(&self, pos: usize) -> u8 {
        self.text.as_bytes()[pos]
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.end());
        self.pos += n;
    }

    #[inline]
    pub fn jump_to(&mut self, pos: usize) {
        debug_assert!(pos <= self.end());
        self.pos = pos;
    }

    #[inline]
    pub fn slice(&self, range: Range<usize>) -> &'input str {
        &self.text[range]
    }

    #[inline]
    fn tail(&self, from: usize) -> &'input [u8] {
        let from = cmp::min(from, self.end());
        &self.text.as_bytes()[from..]
    }

    pub fn find_byte_from(&self, from: usize, c: u8) -> Option<usize> {
        memchr(c, self.tail(from)).map(|idx| from + idx)
    }

    pub fn find_byte2_from(&self, from: usize, c1: u8, c2: u8) -> Option<usize> {
        memchr2(c1, c2, self.tail(from)).map(|idx| from + idx)
    }

    pub fn find_str_from(&self, from: usize, needle: &str) -> Option<usize> {
        memmem::find(self.tail(from), needle.as_bytes()).map(|idx| from + idx)
    }

    /// Returns the position of the first name terminator at or after
    /// `from`, or the end of the input.
    pub fn find_name_end(&self, from: usize) -> usize {
        let from = cmp::min(from, self.end());
        match self.tail(from).iter().position(|c| c.is_name_end()) {
            Some(idx) => from + idx,
            None => self.end(),
        }
    }

    /// Rounds `pos` up to the nearest char boundary, clamped to the input end.
    pub fn ceil_char_boundary(&self, pos: usize) -> usize {
        let mut pos = cmp::min(pos, self.end());
        while !self.text.is_char_boundary(pos) {
            pos += 1;
        }

        pos
    }

    /// Returns up to `n` chars starting at the cursor.
    pub fn chars_ahead(&self, n: usize) -> String {
        self.text[self.pos..].chars().take(n).collect()
    }

    /// Calculates an absolute position at `pos`.
    ///
    /// This operation is very expensive. Use only for errors.
    #[inline(never)]
    pub fn gen_text_pos_from(&self, pos: usize) -> TextPos {
        let mut end = cmp::min(pos, self.end());
        while !self.text.is_char_boundary(end) {
            end -= 1;
        }

        let row = Self::calc_curr_row(self.text, end);
        let col = Self::calc_curr_col(self.text, end);
        TextPos::new(row, col)
    }

    fn calc_curr_row(text: &str, end: usize) -> u32 {
        let mut row = 1;
        for c in &text.as_bytes()[..end] {
            if *c == b'\n' {
                row += 1;
            }
        }

        row
    }

    fn calc_curr_col(text: &str, end: usize) -> u32 {
        let mut col = 1;
        for c in text[..end].chars().rev() {
            if c == '\n' {
                break;
            } else {
                col += 1;
            }
        }

        col
    }
}
