use std::fs;
use std::io::{self, BufRead};

use anyhow::Result;
use clap::Parser as _;
use dialog_nlqp::{MemoryStore, Parser, ParserConfig};
use dialog_nlqp_inspect::{InspectCli, report};
use tracing_subscriber::EnvFilter;

pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = InspectCli::parse();
    let store = MemoryStore::from_json(&fs::read_to_string(&cli.store)?)?;
    let config = match &cli.config {
        Some(path) => ParserConfig::from_json(&fs::read_to_string(path)?)?,
        None => ParserConfig::default(),
    };
    tracing::debug!(?config, "starting");
    let parser = Parser::new(&store).with_config(config);

    if !cli.sentence.is_empty() {
        let result = parser.parse(&cli.sentence.join(" "), None);
        print!("{}", report(&result)?);
        return Ok(());
    }

    let mut previous = None;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let session = if cli.incremental { previous.take() } else { None };
        let result = parser.parse(&line, session);
        println!("{}", report(&result)?);
        previous = Some(result);
    }
    Ok(())
}
