use std::env;
use std::fs;
use std::process;

use xmlpull::{Event, Tokenizer};

fn main() {
    let args: Vec<_> = env::args().collect();

    if args.len() != 2 {
        println!("Usage:\n\tcargo run --example events -- input.xml");
        process::exit(1);
    }

    let text = match fs::read_to_string(&args[1]) {
        Ok(v) => v,
        Err(e) => {
            println!("Error: {}.", e);
            process::exit(1);
        }
    };

    let mut p = Tokenizer::new(&text);
    loop {
        let event = p.next();
        match event {
            Event::StartTag | Event::SingleTag => {
                let name = p.tag_name().unwrap_or("");
                match p.attributes() {
                    Ok(Some(attrs)) if !attrs.is_empty() => {
                        let mut attrs: Vec<_> = attrs.into_iter().collect();
                        attrs.sort();
                        println!("{:?}({}) {:?}", event, name, attrs);
                    }
                    Ok(_) => println!("{:?}({})", event, name),
                    Err(e) => println!("{:?}({}) <{}>", event, name, e),
                }
            }
            Event::EndTag | Event::Doctype => {
                println!("{:?}({})", event, p.tag_name().unwrap_or(""));
            }
            Event::ProcessingInstruction => {
                println!("{:?}({}) {:?}", event, p.pi_target().unwrap_or(""), p.raw_text().unwrap_or(""));
            }
            Event::Text | Event::Comment | Event::Cdata => match p.text() {
                Ok(text) => println!("{:?} {:?}", event, text.unwrap_or_default()),
                Err(e) => println!("{:?} <{}>", event, e),
            },
            Event::Error => {
                println!("Error: {}.", p.error_message().unwrap_or_default());
                process::exit(1);
            }
            Event::Eof => break,
        }
    }
}
