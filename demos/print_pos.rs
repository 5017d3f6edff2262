use xmlpull::{Event, Tokenizer};

fn main() {
    let args: Vec<_> = std::env::args().collect();

    if args.len() != 2 {
        println!("Usage:\n\tcargo run --example print_pos -- input.xml");
        std::process::exit(1);
    }

    let text = match std::fs::read_to_string(&args[1]) {
        Ok(text) => text,
        Err(e) => {
            println!("Error: {}.", e);
            return;
        }
    };

    let mut p = Tokenizer::new(&text);
    loop {
        match p.next() {
            Event::StartTag | Event::SingleTag => {
                let start = p.range().map(|r| r.start).unwrap_or(0);
                println!("{:?} at {}", p.tag_name().unwrap_or(""), p.text_pos_at(start));
            }
            Event::Error => {
                println!("Error: {}.", p.error_message().unwrap_or_default());
                return;
            }
            Event::Eof => return,
            _ => {}
        }
    }
}
