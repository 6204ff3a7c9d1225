// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::Context;
use clap::{Parser, Subcommand};
use range_master_core::{Coordinator, CoordinatorConfig};
use range_master_perfect_numbers::PerfectNumbers;
use range_master_tcp_rpc::shutdown::install_shutdown_handler;
use range_master_tcp_rpc::{parse_range, run_worker, MasterClient, MasterServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "range-master-tcp-rpc")]
#[command(version)]
#[command(about = "Distributes perfect-number searches across joining workers")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the master coordinator
    Master {
        #[arg(long, default_value = "127.0.0.1:10000")]
        listen: SocketAddr,

        /// JSON file with coordinator settings (defaults apply if missing)
        #[arg(long, default_value = "config.json")]
        config: PathBuf,

        /// Per-worker call timeout, overrides the config file
        #[arg(long)]
        worker_timeout_ms: Option<u64>,

        /// Concurrent async jobs, overrides the config file
        #[arg(long)]
        max_background_jobs: Option<usize>,
    },

    /// Run a worker and join the master until Ctrl+C
    Worker {
        #[arg(long, default_value = "127.0.0.1:10000")]
        master: SocketAddr,

        #[arg(long, default_value = "127.0.0.1:0")]
        listen: SocketAddr,

        /// Address the master should dial, if different from the bound one
        #[arg(long)]
        advertise: Option<SocketAddr>,
    },

    /// Talk to a running master
    Client {
        #[arg(long, default_value = "127.0.0.1:10000")]
        master: SocketAddr,

        #[command(subcommand)]
        command: ClientCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ClientCommands {
    /// Submit a job and wait until the given number of workers ran it
    Submit {
        #[arg(long, default_value = "1")]
        workers: usize,

        #[arg(allow_hyphen_values = true)]
        min: String,

        #[arg(allow_hyphen_values = true)]
        max: String,
    },

    /// Submit a job over the current workers and wait for the pushed result
    SubmitAsync {
        /// Where the master pushes the result
        #[arg(long, default_value = "127.0.0.1:0")]
        callback: SocketAddr,

        #[arg(allow_hyphen_values = true)]
        min: String,

        #[arg(allow_hyphen_values = true)]
        max: String,
    },

    /// Print the number of registered workers
    Workers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Master {
            listen,
            config,
            worker_timeout_ms,
            max_background_jobs,
        } => {
            let mut config = CoordinatorConfig::load_or_default(&config);
            if let Some(timeout) = worker_timeout_ms {
                config.worker_timeout_ms = timeout;
            }
            if let Some(jobs) = max_background_jobs {
                config.max_background_jobs = jobs;
            }

            let coordinator = Arc::new(Coordinator::new(config));
            let server = MasterServer::bind(listen, coordinator)
                .await
                .with_context(|| format!("binding master on {}", listen))?;
            server.run(install_shutdown_handler()).await;
        }

        Commands::Worker {
            master,
            listen,
            advertise,
        } => {
            run_worker(
                master,
                listen,
                advertise,
                PerfectNumbers,
                install_shutdown_handler(),
            )
            .await
            .with_context(|| format!("running worker against master {}", master))?;
        }

        Commands::Client { master, command } => {
            let client = MasterClient::new(master);
            run_client(&client, command).await?;
        }
    }

    Ok(())
}

async fn run_client(client: &MasterClient, command: ClientCommands) -> anyhow::Result<()> {
    match command {
        ClientCommands::Submit { workers, min, max } => {
            let total = parse_range(&min, &max)?;
            println!("Waiting for {} worker(s) to search {}", workers, total);
            let outcome = client.submit(total, workers).await?;
            println!(
                "{}: {:?} in {} ms",
                outcome.job_id, outcome.numbers, outcome.elapsed_ms
            );
            if outcome.failed_workers > 0 {
                println!(
                    "warning: {} worker(s) failed, their sub-ranges are missing",
                    outcome.failed_workers
                );
            }
        }

        ClientCommands::SubmitAsync { callback, min, max } => {
            let total = parse_range(&min, &max)?;
            let pending = client.submit_async(total, callback).await?;
            println!("{} accepted, waiting for result", pending.job_id());
            let notification = pending.wait().await?;
            println!(
                "{}: {:?} in {} ms",
                notification.job_id, notification.numbers, notification.elapsed_ms
            );
        }

        ClientCommands::Workers => {
            println!("{}", client.worker_count().await?);
        }
    }

    Ok(())
}
