use std::borrow::Cow;
use std::collections::HashMap;

use memchr::memchr;

use crate::Error;

type Result<T> = std::result::Result<T, Error>;

/// Resolved entity references, keyed by the text between `&` and `;`.
///
/// Starts with the five predefined XML entities and learns character
/// references as they are resolved. Entries are never evicted.
pub struct EntityCache<'input> {
    map: HashMap<&'input str, char>,
}

impl<'input> EntityCache<'input> {
    pub fn new() -> Self {
        let mut map = HashMap::new();
        map.insert("lt", '<');
        map.insert("gt", '>');
        map.insert("amp", '&');
        map.insert("quot", '"');
        map.insert("apos", '\'');
        EntityCache { map }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Replaces every entity reference in `text` with its character.
    ///
    /// `base` is the absolute offset of `text` in the input and is used
    /// for error positions only. Returns a borrowed string when `text`
    /// contains no `&`.
    pub fn resolve(&mut self, text: &'input str, base: usize) -> Result<Cow<'input, str>> {
        let bytes = text.as_bytes();
        let mut amp = match memchr(b'&', bytes) {
            Some(idx) => idx,
            None => return Ok(Cow::Borrowed(text)),
        };

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        loop {
            out.push_str(&text[last..amp]);

            let semi = match memchr(b';', &bytes[amp + 1..]) {
                Some(idx) => amp + 1 + idx,
                None => {
                    return Err(Error::InvalidEntity {
                        reference: text[amp..].to_string(),
                        pos: base + amp,
                    });
                }
            };

            let reference = &text[amp + 1..semi];
            match self.lookup(reference) {
                Some(c) => out.push(c),
                None => {
                    return Err(Error::InvalidEntity {
                        reference: text[amp..semi + 1].to_string(),
                        pos: base + amp,
                    });
                }
            }

            last = semi + 1;
            amp = match memchr(b'&', &bytes[last..]) {
                Some(idx) => last + idx,
                None => break,
            };
        }

        out.push_str(&text[last..]);
        Ok(Cow::Owned(out))
    }

    fn lookup(&mut self, reference: &'input str) -> Option<char> {
        if let Some(c) = self.map.get(reference) {
            return Some(*c);
        }

        let c = parse_char_reference(reference)?;
        self.map.insert(reference, c);
        Some(c)
    }
}

// CharRef ::= '&#' [0-9]+ ';' | '&#x' [0-9a-fA-F]+ ';'
fn parse_char_reference(reference: &str) -> Option<char> {
    let body = reference.strip_prefix('#')?;
    let (digits, radix) = match body.strip_prefix('x') {
        Some(hex) => (hex, 16),
        None => (body, 10),
    };

    if digits.is_empty() || !digits.bytes().all(|c| (c as char).is_digit(radix)) {
        return None;
    }

    let n = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(n)
}
