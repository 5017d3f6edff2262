#[macro_use]
extern crate afl;
extern crate xmlpull;

use std::str;

use xmlpull::{Event, Tokenizer};

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(text) = str::from_utf8(data) {
            let mut p = Tokenizer::new(text);
            // Every event consumes at least one byte, so this always terminates.
            for _ in 0..=text.len() {
                match p.next() {
                    Event::Eof => break,
                    Event::Error => {
                        let _ = p.error_message();
                        break;
                    }
                    _ => {}
                }

                let _ = p.tag_name();
                let _ = p.prefix();
                let _ = p.local_name();
                let _ = p.pi_target();
                let _ = p.text();
                let _ = p.attributes();
                let _ = p.raw_attributes();
                let _ = p.range();
            }
        }
    });
}
