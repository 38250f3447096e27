//! cosig CLI - witness co-signing and checkpoint distribution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod error;
mod output;

use commands::{cosign, distribute, forks, get, keygen, logs, sign};

#[derive(Parser)]
#[command(name = "cosig")]
#[command(about = "Witness co-signing and quorum distribution of log checkpoints")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an Ed25519 note key pair
    Keygen {
        /// Key name written into signature lines
        name: String,
    },
    /// Sign a checkpoint body as the log
    SignCheckpoint {
        /// File holding the log's signer key
        #[arg(long)]
        key: PathBuf,
        /// Checkpoint origin line
        #[arg(long)]
        origin: String,
        /// Tree size
        #[arg(long)]
        size: u64,
        /// Root hash, base64
        #[arg(long)]
        root: String,
    },
    /// Co-sign a log checkpoint as a witness (first use initializes the log)
    Cosign {
        /// Config file with logs and witnesses
        #[arg(long)]
        config: PathBuf,
        /// File holding the witness signer key
        #[arg(long)]
        key: PathBuf,
        /// Witness state journal
        #[arg(long)]
        store: PathBuf,
        /// Log identifier
        #[arg(long)]
        log: String,
        /// Consistency proof file, one base64 hash per line
        #[arg(long)]
        proof: Option<PathBuf>,
        /// Log-signed checkpoint envelope
        envelope: PathBuf,
    },
    /// Submit a witness-signed checkpoint to the distributor
    Distribute {
        /// Config file with logs and witnesses
        #[arg(long)]
        config: PathBuf,
        /// Distributor journal
        #[arg(long)]
        store: PathBuf,
        /// Log identifier
        #[arg(long)]
        log: String,
        /// Witness identifier
        #[arg(long)]
        witness: String,
        /// Checkpoint envelope signed by the log and the witness
        envelope: PathBuf,
    },
    /// Print the freshest checkpoint with at least N witness signatures
    Get {
        /// Config file with logs and witnesses
        #[arg(long)]
        config: PathBuf,
        /// Distributor journal
        #[arg(long)]
        store: PathBuf,
        /// Log identifier
        #[arg(long)]
        log: String,
        /// Required number of witness signatures
        #[arg(long, default_value_t = 1)]
        threshold: usize,
    },
    /// Print the latest checkpoint stored for one witness
    GetWitness {
        /// Config file with logs and witnesses
        #[arg(long)]
        config: PathBuf,
        /// Distributor journal
        #[arg(long)]
        store: PathBuf,
        /// Log identifier
        #[arg(long)]
        log: String,
        /// Witness identifier
        #[arg(long)]
        witness: String,
    },
    /// List configured logs
    Logs {
        /// Config file with logs and witnesses
        #[arg(long)]
        config: PathBuf,
    },
    /// Show retained fork evidence for a log
    Forks {
        /// Config file with logs and witnesses
        #[arg(long)]
        config: PathBuf,
        /// Distributor journal
        #[arg(long)]
        store: PathBuf,
        /// Log identifier
        #[arg(long)]
        log: String,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen { name } => keygen::run(name),
        Commands::SignCheckpoint {
            key,
            origin,
            size,
            root,
        } => sign::run(key, origin, size, root),
        Commands::Cosign {
            config,
            key,
            store,
            log,
            proof,
            envelope,
        } => cosign::run(config, key, store, log, proof, envelope),
        Commands::Distribute {
            config,
            store,
            log,
            witness,
            envelope,
        } => distribute::run(config, store, log, witness, envelope),
        Commands::Get {
            config,
            store,
            log,
            threshold,
        } => get::run_quorum(config, store, log, threshold),
        Commands::GetWitness {
            config,
            store,
            log,
            witness,
        } => get::run_witness(config, store, log, witness),
        Commands::Logs { config } => logs::run(config),
        Commands::Forks {
            config,
            store,
            log,
            json,
        } => forks::run(config, store, log, json),
    };

    if let Err(e) = result {
        match e.kind() {
            Some(kind) => eprintln!("Error [{kind:?}]: {e}"),
            None => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}
