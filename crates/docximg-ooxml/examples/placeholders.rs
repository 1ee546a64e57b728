//! Example: List the image placeholders declared in a DOCX template
//!
//! Usage: cargo run --example placeholders -- path/to/template.docx

use std::env;
use std::process;

use docximg_ooxml::DocxImager;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path/to/template.docx>", args[0]);
        process::exit(1);
    }

    let mut imager = DocxImager::new();
    if let Err(e) = imager.load(&args[1]) {
        eprintln!("Error opening DOCX: {}", e);
        process::exit(1);
    }

    match imager.placeholders() {
        Ok(placeholders) => {
            for p in &placeholders {
                println!("{}\t{}\t{}x{}", p.name, p.declared_type, p.width, p.height);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
