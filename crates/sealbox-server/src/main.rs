//! Sealbox CLI.
//!
//! # Usage
//!
//! ```bash
//! # Store a secret, burn after one read
//! sealbox --db vault.redb submit --message "the wifi password is hunter2"
//!
//! # Store a password-protected bundle with files
//! sealbox --db vault.redb submit --message "deploy key" \
//!     --file id_ed25519 --password "spoken out loud" --reads 3
//!
//! # Retrieve with the printed reference
//! sealbox --db vault.redb retrieve <id>#<key> --out ./received
//! ```

#![allow(clippy::print_stdout, reason = "CLI output goes to stdout")]

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use sealbox_core::{
    Config, Lifecycle, ReadBudget, RetrievalService, SecretId, SecretPolicy, SecretReference,
    SubmissionService,
};
use sealbox_proto::{Algorithm, Envelope, FileEntry, Payload};
use sealbox_server::{Reaper, RedbStore, SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sealbox: zero-knowledge one-time secret sharing
#[derive(Parser, Debug)]
#[command(name = "sealbox")]
#[command(about = "Zero-knowledge secret sharing with burn-after-read")]
#[command(version)]
struct Args {
    /// Path to the secret database
    #[arg(long, default_value = "sealbox.redb")]
    db: PathBuf,

    /// Force burn-after-read: cap every new secret at one read
    #[arg(long)]
    require_burn: bool,

    /// Maximum secret size in bytes
    #[arg(long, default_value = "1048576")]
    max_size: u64,

    /// AEAD algorithm for new secrets (xchacha20-poly1305, aes-256-gcm)
    #[arg(long, default_value = "xchacha20-poly1305")]
    algorithm: Algorithm,

    /// Default lifetime in seconds for secrets that do not request one
    #[arg(long, default_value = "259200")]
    default_expiry: u64,

    /// Upper bound on any requested lifetime in seconds
    #[arg(long, default_value = "2592000")]
    max_expiry: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt and store a secret; prints the reference to share
    Submit {
        /// Secret message text
        #[arg(short, long, default_value = "")]
        message: String,

        /// File to attach (may be repeated)
        #[arg(short, long)]
        file: Vec<PathBuf>,

        /// Additional password factor, shared out of band
        #[arg(short, long)]
        password: Option<String>,

        /// Number of reads before the secret burns
        #[arg(long, default_value = "1", conflicts_with = "unlimited_reads")]
        reads: u32,

        /// No read limit; the secret lives until expiry
        #[arg(long)]
        unlimited_reads: bool,

        /// Only consume a read once decryption succeeds
        #[arg(long)]
        slow_burn: bool,

        /// Lifetime in seconds (default three days)
        #[arg(long)]
        expires_in: Option<u64>,
    },

    /// Fetch and decrypt a secret by its reference
    Retrieve {
        /// Reference printed by submit (`<id>#<key>`)
        reference: String,

        /// Password, if the secret has one
        #[arg(short, long)]
        password: Option<String>,

        /// Directory to write attached files into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Show a stored secret's metadata (never its contents)
    Inspect {
        /// Secret id (32 hex characters)
        id: String,
    },

    /// Destroy all expired secrets
    Purge,

    /// Run the expiry reaper until interrupted
    Reap {
        /// Sweep interval in seconds
        #[arg(long, default_value = "60")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let store = RedbStore::open(&args.db)?;
    let lifecycle = Lifecycle::new(store.clone(), SystemEnv::new());
    let config = Config {
        max_secret_size: args.max_size,
        default_expires_in_secs: args.default_expiry,
        max_expires_in_secs: args.max_expiry,
        require_burn: args.require_burn,
        algorithm: args.algorithm,
    };

    match args.command {
        Command::Submit { message, file, password, reads, unlimited_reads, slow_burn, expires_in } => {
            let mut files = Vec::with_capacity(file.len());
            for path in file {
                let name = path
                    .file_name()
                    .ok_or_else(|| format!("not a file: {}", path.display()))?
                    .to_string_lossy()
                    .into_owned();
                files.push(FileEntry::new(name, std::fs::read(&path)?));
            }

            let payload = Payload { message, files };
            let policy = SecretPolicy {
                reads: if unlimited_reads {
                    ReadBudget::Unlimited
                } else {
                    ReadBudget::Limited(reads)
                },
                slow_burn,
                expires_in_secs: expires_in,
            };

            let submission = SubmissionService::new(lifecycle, config);
            let reference = submission.submit(&payload, password.as_deref(), policy)?;

            println!("{reference}");
        },

        Command::Retrieve { reference, password, out } => {
            let reference: SecretReference = reference.parse()?;

            let retrieval = RetrievalService::new(lifecycle);
            let payload = retrieval.retrieve(&reference, password.as_deref())?;

            if !payload.message.is_empty() {
                println!("{}", payload.message);
            }

            for file in &payload.files {
                // Take only the final component; stored names must not
                // steer writes outside the output directory.
                let name = std::path::Path::new(&file.name)
                    .file_name()
                    .ok_or_else(|| format!("unusable file name: {}", file.name))?;

                std::fs::create_dir_all(&out)?;
                let target = out.join(name);
                std::fs::write(&target, &file.content)?;
                println!("wrote {}", target.display());
            }
        },

        Command::Inspect { id } => {
            let id: SecretId = id.parse()?;

            match store.peek(id)? {
                Some(record) => {
                    let algorithm = Envelope::decode(&record.envelope)
                        .map(|envelope| envelope.algorithm.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());

                    println!("id:                 {id}");
                    println!("algorithm:          {algorithm}");
                    println!("password protected: {}", record.password_protected);
                    println!("slow burn:          {}", record.slow_burn);
                    println!("remaining reads:    {}", record.reads);
                    println!("created at:         {} (unix)", record.created_at_secs);
                    println!("expires at:         {} (unix)", record.expires_at_secs);
                },
                None => println!("no secret stored under {id}"),
            }
        },

        Command::Purge => {
            let purged = lifecycle.purge_expired()?;
            println!("purged {purged} expired secret(s)");
        },

        Command::Reap { interval } => {
            let reaper = Reaper::new(lifecycle, Duration::from_secs(interval));
            reaper.run().await;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_flag_selects_aead() {
        let args = Args::try_parse_from(["sealbox", "--algorithm", "aes-256-gcm", "purge"])
            .expect("args should parse");
        assert_eq!(args.algorithm, Algorithm::Aes256Gcm);
    }

    #[test]
    fn algorithm_defaults_to_xchacha() {
        let args = Args::try_parse_from(["sealbox", "purge"]).expect("args should parse");
        assert_eq!(args.algorithm, Algorithm::XChaCha20Poly1305);
        assert_eq!(args.default_expiry, 259_200);
        assert_eq!(args.max_expiry, 2_592_000);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        assert!(Args::try_parse_from(["sealbox", "--algorithm", "rot13", "purge"]).is_err());
    }
}
