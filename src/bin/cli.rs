//! LazyKV CLI
//!
//! Offline inspection of WAL and snapshot files. Never modifies them.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lazykv::codec::Record;
use lazykv::snapshot::SnapshotReader;
use lazykv::wal::{WalReader, WalRecovery};

/// LazyKV CLI
#[derive(Parser, Debug)]
#[command(name = "lazykv-cli")]
#[command(about = "Inspect LazyKV data files")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a WAL file and report record counts
    Verify {
        /// WAL file to check
        wal: PathBuf,
    },

    /// Print the state a server would recover from these files
    Show {
        /// WAL file
        #[arg(short, long, default_value = "./lazykv_data/wal.log")]
        wal: PathBuf,

        /// Snapshot file
        #[arg(short, long, default_value = "./lazykv_data/snapshot.db")]
        snapshot: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let outcome = match args.command {
        Commands::Verify { wal } => verify(wal),
        Commands::Show { wal, snapshot } => show(wal, snapshot),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn verify(wal: PathBuf) -> lazykv::Result<()> {
    let result = WalRecovery::verify(&wal)?;
    println!("records:   {}", result.entries_recovered);
    println!("malformed: {}", result.entries_corrupted);
    println!("torn tail: {}", if result.was_truncated { "yes" } else { "no" });
    Ok(())
}

fn show(wal: PathBuf, snapshot: PathBuf) -> lazykv::Result<()> {
    // Sorted for stable output
    let mut state = BTreeMap::new();

    let mut snapshot_reader = SnapshotReader::open(&snapshot)?;
    for entry in snapshot_reader.by_ref() {
        let (key, value) = entry?;
        state.insert(key, value);
    }

    let mut wal_reader = WalReader::open(&wal)?;
    for record in wal_reader.by_ref() {
        match record? {
            Record::Put { key, value } => {
                state.insert(key, value);
            }
            Record::Delete { key } => {
                state.remove(&key);
            }
        }
    }

    for (key, value) in &state {
        println!("{}:{}", key, value);
    }

    let snapshot_stats = snapshot_reader.stats();
    let wal_stats = wal_reader.stats();
    eprintln!(
        "{} keys (snapshot: {} entries, {} skipped; wal: {} records, {} skipped{})",
        state.len(),
        snapshot_stats.records,
        snapshot_stats.skipped,
        wal_stats.records,
        wal_stats.skipped,
        if wal_stats.torn_tail { ", torn tail" } else { "" },
    );
    Ok(())
}
