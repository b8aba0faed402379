mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use durata_probe::FileType;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "durata=trace,durata_probe=trace".to_string()
        } else {
            "durata=info,durata_probe=info".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let declared = cli
        .format
        .as_deref()
        .map(|s| {
            s.parse::<FileType>()
                .map_err(|_| anyhow::anyhow!("unrecognized format: {s}"))
        })
        .transpose()?;

    for path in &cli.files {
        let seconds = probe(path, declared).with_context(|| format!("{}", path.display()))?;
        println!("{}\t{seconds:.3}", path.display());
    }
    Ok(())
}

fn probe(path: &Path, declared: Option<FileType>) -> Result<f64> {
    let seconds = match declared {
        Some(file_type) => {
            tracing::debug!("probing {} as {}", path.display(), file_type);
            let file = File::open(path)?;
            let mut reader = BufReader::new(file);
            durata_probe::duration(&mut reader, file_type)?
        }
        None => durata_probe::duration_of_file(path)?,
    };
    tracing::debug!("{}: {seconds}s", path.display());
    Ok(seconds)
}
