//! Command-line front end for comparing two XML documents.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xmlunit::legacy::{self, DiffConfiguration};
use xmlunit::xml::WhitespaceHandling;
use xmlunit::{DiffBuilder, FileSource, XmlNodeReader};

/// Compare XML documents and report their differences
#[derive(Parser)]
#[command(name = "xmlcompare")]
#[command(version)]
#[command(about = "Compare XML documents and report their differences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk both documents and list every difference with its XPath
    #[command(visible_alias = "c")]
    Compare {
        /// Control (expected) document
        control: String,
        /// Test (actual) document
        test: String,

        /// Hide differences that only make the documents similar
        #[arg(long)]
        similar: bool,

        /// Trim text and drop whitespace-only text nodes
        #[arg(long)]
        ignore_whitespace: bool,

        /// Drop comments before comparing
        #[arg(long)]
        ignore_comments: bool,

        /// Stop at the first difference that is not similar
        #[arg(long)]
        stop_on_first: bool,
    },

    /// Stream both documents and stop at the first major difference
    #[command(visible_alias = "l")]
    Legacy {
        /// Control (expected) document
        control: String,
        /// Test (actual) document
        test: String,

        /// Report attributes in a different order
        #[arg(long)]
        strict_attribute_order: bool,

        /// Skip whitespace-only text
        #[arg(long)]
        ignore_whitespace: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            control,
            test,
            similar,
            ignore_whitespace,
            ignore_comments,
            stop_on_first,
        } => run_compare(
            &control,
            &test,
            similar,
            ignore_whitespace,
            ignore_comments,
            stop_on_first,
        ),
        Commands::Legacy {
            control,
            test,
            strict_attribute_order,
            ignore_whitespace,
        } => run_legacy(&control, &test, strict_attribute_order, ignore_whitespace),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the documents are free of reported differences.
fn run_compare(
    control: &str,
    test: &str,
    similar: bool,
    ignore_whitespace: bool,
    ignore_comments: bool,
    stop_on_first: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    info!("Comparing {} to {}", control, test);
    let mut builder = DiffBuilder::compare(FileSource::new(control)).with_test(FileSource::new(test));
    if similar {
        builder = builder.check_for_similar();
    }
    if ignore_whitespace {
        builder = builder.ignore_whitespace();
    }
    if ignore_comments {
        builder = builder.ignore_comments();
    }
    if stop_on_first {
        builder = builder.stop_on_first_difference();
    }
    let diff = builder.build()?;

    let mut out = io::stdout().lock();
    writeln!(out, "{}", diff)?;
    info!(
        "{} difference(s), overall result {}",
        diff.differences().len(),
        diff.result()
    );
    Ok(!diff.has_differences())
}

/// Returns whether the documents are equal, i.e. free of major differences.
fn run_legacy(
    control: &str,
    test: &str,
    strict_attribute_order: bool,
    ignore_whitespace: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    info!("Streaming {} against {}", control, test);
    let whitespace = if ignore_whitespace {
        WhitespaceHandling::None
    } else {
        WhitespaceHandling::All
    };
    let configuration = DiffConfiguration::new(
        format!("{} vs {}", control, test),
        whitespace,
        !strict_attribute_order,
    );
    let mut diff = legacy::Diff::with_configuration(
        XmlNodeReader::from_file(control)?,
        XmlNodeReader::from_file(test)?,
        configuration,
    );
    let result = diff.compare()?;

    let mut out = io::stdout().lock();
    writeln!(out, "{}", result)?;
    Ok(result.equal())
}
