use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

use commands::Schema;

#[derive(Parser)]
#[command(name = "tablebuf-cmd")]
#[command(about = "Command-line utility for tablebuf buffers")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample settings buffer
    Demo {
        /// Table to write
        #[arg(long, value_enum, default_value_t = Schema::Presentation)]
        schema: Schema,

        /// Value of `is_in_memory` for the presentation table
        #[arg(long)]
        in_memory: bool,

        /// Frame the buffer as a checksummed message
        #[arg(long)]
        message: bool,

        /// Output file
        output: String,
    },

    /// Display the layout of a buffer's root table
    Inspect {
        /// Increase verbosity (-v lists slots, -vv dumps the root table bytes)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Input is a checksummed message
        #[arg(long)]
        message: bool,

        /// Buffer file to inspect
        input: String,
    },

    /// Run the verifier over a buffer
    Verify {
        /// Table the root is checked as
        #[arg(long, value_enum, default_value_t = Schema::Generic)]
        schema: Schema,

        /// JSON file with verifier options
        #[arg(long)]
        config: Option<String>,

        /// Input is a checksummed message
        #[arg(long)]
        message: bool,

        /// Buffer file to verify
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("tablebuf", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Demo {
            schema,
            in_memory,
            message,
            output,
        } => commands::demo::run(schema, in_memory, message, output),
        Commands::Inspect {
            verbose,
            message,
            input,
        } => commands::inspect::run(verbose, message, input),
        Commands::Verify {
            schema,
            config,
            message,
            input,
        } => commands::verify::run(schema, config, message, input),
    }
}
