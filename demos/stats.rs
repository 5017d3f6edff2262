use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::process;

use xmlpull::{Event, Tokenizer};

fn main() {
    let args: Vec<_> = env::args().collect();

    if args.len() != 2 {
        println!("Usage:\n\tcargo run --example stats -- input.xml");
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
    let mut events = BTreeMap::new();
    let mut attrs_count = 0;
    let mut prefixes = HashSet::new();
    loop {
        let event = p.next();
        match event {
            Event::Eof => break,
            Event::Error => {
                println!("Error: {}.", p.error_message().unwrap_or_default());
                process::exit(1);
            }
            Event::StartTag | Event::SingleTag => {
                if let Some(prefix) = p.prefix() {
                    if !prefix.is_empty() {
                        prefixes.insert(prefix);
                    }
                }

                match p.raw_attributes() {
                    Ok(Some(attrs)) => attrs_count += attrs.len(),
                    Ok(None) => {}
                    Err(e) => println!("Warning: {} at {}.", e, p.text_pos_at(e.pos())),
                }
            }
            _ => {}
        }

        *events.entry(format!("{:?}", event)).or_insert(0) += 1;
    }

    for (event, count) in &events {
        println!("{} count: {}", event, count);
    }

    println!("Attributes count: {}", attrs_count);
    println!("Unique prefixes count: {}", prefixes.len());
    for prefix in prefixes {
        println!("  {}", prefix);
    }
}
