use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "nlqp-inspect")]
#[command(bin_name = "nlqp-inspect")]
#[command(about = "Shows how sentences are parsed against a knowledge store", long_about = None)]
pub struct InspectCli {
    /// Knowledge store fixture (JSON) to resolve words against
    #[arg(short, long)]
    pub store: PathBuf,

    /// Parser configuration (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Treat each line read from stdin as a continuation of the previous one
    #[arg(short, long)]
    pub incremental: bool,

    /// Sentence to parse. Lines are read from stdin when omitted.
    pub sentence: Vec<String>,
}
