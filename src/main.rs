use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};

use zfs_backup_agent::config::AgentConfig;
use zfs_backup_agent::ops::request::{
    CreateSnapshotRequest, DestroySnapshotRequest, ReceiveSnapshotRequest, SendSnapshotRequest,
};
use zfs_backup_agent::ops::ZfsApi;

/// Run ZFS snapshot and transfer operations
#[derive(Parser)]
#[command(name = "zfs-backup-agent")]
#[command(about = "Run ZFS snapshot and transfer operations", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a snapshot
    Create {
        /// Snapshot name, e.g. tank/data@s1
        snapshot: String,

        /// Recurse into descendant datasets
        #[arg(short, long)]
        recursive: bool,
    },
    /// Destroy a snapshot
    Destroy {
        /// Snapshot name
        snapshot: String,
    },
    /// Send a snapshot to a remote host through mbuffer
    Send {
        /// Snapshot name
        snapshot: String,

        /// Destination host
        #[arg(long)]
        host: String,

        /// Destination port
        #[arg(long)]
        port: u16,

        /// Send the difference from a source snapshot
        #[arg(short, long)]
        incremental: bool,

        /// Source snapshot for incremental sends
        #[arg(long)]
        source: Option<String>,

        /// Include dataset properties in the stream
        #[arg(short = 'p', long)]
        properties: bool,

        /// Override the configured mbuffer memory size
        #[arg(long)]
        mbuffer_size: Option<String>,

        /// Override the configured mbuffer rate limit
        #[arg(long)]
        mbuffer_rate: Option<String>,

        /// Job identifier reported in the completion notification
        #[arg(long)]
        job_id: Option<String>,
    },
    /// Receive a snapshot stream on a local port
    Receive {
        /// Receive target, e.g. tank/restore
        target: String,

        /// Port to listen on
        #[arg(long)]
        port: u16,

        /// Roll back the target before receiving
        #[arg(short = 'F', long)]
        force_rollback: bool,

        /// Override the configured mbuffer memory size
        #[arg(long)]
        mbuffer_size: Option<String>,

        /// Override the configured mbuffer rate limit
        #[arg(long)]
        mbuffer_rate: Option<String>,

        /// Job identifier reported in the completion notification
        #[arg(long)]
        job_id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AgentConfig::load(cli.config.as_deref())?;
    debug!("Loaded config: {:?}", config);

    let api = ZfsApi::new(config);

    match cli.command {
        Commands::Create {
            snapshot,
            recursive,
        } => {
            api.create_snapshot(&CreateSnapshotRequest {
                snapshot_name: snapshot,
                recursive,
            })
            .await?;
            println!("Snapshot created.");
        }
        Commands::Destroy { snapshot } => {
            api.destroy_snapshot(&DestroySnapshotRequest {
                snapshot_name: snapshot,
            })
            .await?;
            println!("Snapshot destroyed.");
        }
        Commands::Send {
            snapshot,
            host,
            port,
            incremental,
            source,
            properties,
            mbuffer_size,
            mbuffer_rate,
            job_id,
        } => {
            let job_id = job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let pipeline = api.start_send(
                &job_id,
                SendSnapshotRequest {
                    snapshot_name: snapshot,
                    host,
                    port,
                    incremental,
                    source_snapshot_name: source,
                    include_properties: properties,
                    mbuffer_size,
                    mbuffer_rate,
                },
            )?;
            println!("Send started (job {job_id}).");

            let report = pipeline.await?;
            let code = report.outcome?;
            println!("Send finished with code {code}.");
        }
        Commands::Receive {
            target,
            port,
            force_rollback,
            mbuffer_size,
            mbuffer_rate,
            job_id,
        } => {
            let job_id = job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let pipeline = api.start_receive(
                &job_id,
                ReceiveSnapshotRequest {
                    target,
                    port,
                    force_rollback,
                    mbuffer_size,
                    mbuffer_rate,
                },
            )?;
            println!("Receive started (job {job_id}).");

            let report = pipeline.await?;
            let code = report.outcome?;
            println!("Receive finished with code {code}.");
        }
    }

    Ok(())
}
