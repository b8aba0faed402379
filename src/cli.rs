use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "durata")]
#[command(author, version, about = "Print the playback duration of audio files")]
pub struct Cli {
    /// Files to probe
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Declare the format instead of detecting it
    /// (aac, dsf, flac, mkv, mp3, mp4, ogg, wav)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
