//! Example: list the differences between two XML documents
//!
//! Children are paired by element name so that reordered siblings only show
//! up as a similar CHILD_NODELIST_SEQUENCE difference.
//!
//! Usage: cargo run --example compare <control.xml> <test.xml>

use std::env;

use xmlunit::{selectors, DefaultNodeMatcher, DiffBuilder, FileSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <control.xml> <test.xml>", args[0]);
        std::process::exit(1);
    }

    let diff = DiffBuilder::compare(FileSource::new(&args[1]))
        .with_test(FileSource::new(&args[2]))
        .ignore_whitespace()
        .with_node_matcher(DefaultNodeMatcher::new(selectors::by_name))
        .build()?;

    for difference in diff.differences() {
        println!("{}", difference);
    }
    eprintln!("Overall result: {}", diff.result());

    Ok(())
}
