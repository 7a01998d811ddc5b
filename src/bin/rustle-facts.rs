use anyhow::Result;
use clap::Parser;
use rustle_facts::setup;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "rustle-facts")]
#[command(about = "Gather host facts for rustle execution plans")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct RustleFactsCli {
    /// Argument file containing a JSON object or key=value options
    argument_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

// Collection is a single sequential pass; a current-thread runtime keeps the
// execution model honest.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = RustleFactsCli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("starting rustle-facts v{}", env!("CARGO_PKG_VERSION"));

    match setup::run(cli.argument_file.as_deref()).await {
        Ok(document) => {
            println!("{}", serde_json::to_string(&document)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", setup::failure_document(&e.to_string()));
            std::process::exit(1);
        }
    }
}
