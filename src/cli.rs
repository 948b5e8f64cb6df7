//! §6 external interface, exposed as a CLI. The teacher's `Cargo.toml`
//! already carried `clap` with the `derive` feature; this is the first
//! thing in the workspace that actually wires it up.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "resonance", about = "Constellation-map audio fingerprinting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fingerprint a source file and add it to the store.
    Add {
        path: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: Option<String>,
    },
    /// Fingerprint a query clip and identify it against the store.
    Identify { path: PathBuf },
    /// Remove a recording and all of its fingerprints.
    Delete { recording_id: i32 },
    /// Print aggregate store statistics.
    Stats,
}
