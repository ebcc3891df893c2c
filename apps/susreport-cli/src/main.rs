//! susreport
//!
//! Extracts text and key figures from sustainability report PDFs, builds a
//! paragraph vector index over the text, and answers questions from it.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::AskOptions;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "susreport")]
#[command(version, about = "Extract, index and query sustainability report PDFs")]
struct Cli {
    /// Configuration file (defaults to ./susreport.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract page text, layout and key figures into an output directory
    Extract {
        /// PDF to extract (defaults to pdf_path from the config file)
        pdf: Option<PathBuf>,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also write the full report as extraction.json
        #[arg(long)]
        json: bool,
    },

    /// Write the text of every non-empty page to one file
    ExportText { pdf: PathBuf, out: PathBuf },

    /// Build the paragraph vector index from a full-text file
    Index {
        /// Defaults to full_text.txt in the output directory
        full_text: Option<PathBuf>,

        #[arg(long)]
        index: Option<PathBuf>,

        #[arg(long)]
        documents: Option<PathBuf>,
    },

    /// Answer questions from the vector index
    Ask {
        /// Answer a single question instead of reading from stdin
        #[arg(short, long)]
        question: Option<String>,

        #[arg(long)]
        top_k: Option<usize>,

        /// Answer length cap in characters
        #[arg(long)]
        max_chars: Option<usize>,

        #[arg(long)]
        index: Option<PathBuf>,

        #[arg(long)]
        documents: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Extract {
            pdf,
            output_dir,
            json,
        } => commands::extract(&config, pdf, output_dir, json),
        Command::ExportText { pdf, out } => commands::export_text(&config, &pdf, &out),
        Command::Index {
            full_text,
            index,
            documents,
        } => commands::index(&config, full_text, index, documents),
        Command::Ask {
            question,
            top_k,
            max_chars,
            index,
            documents,
        } => commands::ask(
            &config,
            AskOptions {
                question,
                top_k,
                max_chars,
                index_path: index,
                documents_path: documents,
            },
        ),
    }
}
