//! tapr - Run TAP test scripts

use clap::{Parser, Subcommand};
use std::io::Write;
use tap_producer::commands::*;
use tap_producer::runner::FATAL;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tapr")]
#[command(about = "Run test scripts and produce TAP", long_about = None)]
struct Cli {
    /// Base directory holding .taprc and the tests (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    directory: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one test file and write its TAP stream to stdout
    Run {
        /// Test script to run
        file: String,
    },

    /// Run test files and summarise the results
    Prove {
        /// Files or directories to run (defaults to the configured test_dir)
        paths: Vec<String>,

        /// Also run the files listed in the named file (one path per line)
        #[arg(long)]
        load_list: Option<String>,

        /// Always color the status lines
        #[arg(long, conflicts_with = "no_color")]
        color: bool,

        /// Never color the status lines
        #[arg(long)]
        no_color: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TAPR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file } => {
            let cmd = RunCommand::new(cli.directory, file);
            cmd.execute(Streams::console())
        }
        Commands::Prove {
            paths,
            load_list,
            color,
            no_color,
        } => {
            let colored = color || (!no_color && console::colors_enabled());
            let cmd = ProveCommand::new(cli.directory)
                .with_paths(paths)
                .with_load_list(load_list)
                .with_color(colored);
            cmd.execute(Streams::console())
        }
    };

    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Error: {}", e);
            std::process::exit(FATAL);
        }
    }
}
