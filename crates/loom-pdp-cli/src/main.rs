// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `loom-pdp`: evaluate Loom access policies from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "loom-pdp", about = "Evaluate Loom access policies", version)]
struct Args {
	/// Config file to load instead of /etc/loom/pdp.toml
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Evaluate a policy against a request context and print the decision
	Evaluate {
		/// Policy document (JSON or TOML); defaults to policy.path from the config
		#[arg(long)]
		policy: Option<PathBuf>,

		/// JSON file holding the request's credentials, or `-` for stdin
		#[arg(long)]
		context: PathBuf,
	},
	/// Parse a policy document and report the first problem found
	Check {
		policy: PathBuf,
	},
}

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_writer(std::io::stderr)
		.init();

	match run(Args::parse()).await {
		Ok(status) => ExitCode::from(status),
		Err(err) => {
			eprintln!("error: {err:#}");
			ExitCode::from(commands::ERROR_STATUS)
		}
	}
}

async fn run(args: Args) -> anyhow::Result<u8> {
	let config = match &args.config {
		Some(path) => loom_pdp_config::load_config_with_file(path)?,
		None => loom_pdp_config::load_config()?,
	};

	match args.command {
		Command::Evaluate { policy, context } => {
			let decision = commands::evaluate(&config, policy.as_deref(), &context).await?;
			println!("{decision}");
			Ok(commands::exit_status(decision))
		}
		Command::Check { policy } => {
			commands::check(&policy)?;
			println!("ok");
			Ok(0)
		}
	}
}
