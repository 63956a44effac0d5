use clap::{Parser, Subcommand};
use rust_dotenv::dotenv::DotEnv;

mod config;
mod credentials;
mod firestore;
mod records;
mod seed;
mod status;
mod token;
mod value;

use config::FirestoreCfg;
use credentials::{DiscoveryPaths, resolve_credential};
use firestore::FirestoreClient;
use seed::SeedOpts;
use status::status;

#[derive(Parser, Debug)]
#[command(version, about = "Firekit CLI")]
pub struct Cli {
	/// Increase output
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	Seed {
		#[arg(long)]
		dry_run: bool,
	},
	Status,
}

fn load_env() -> DotEnv {
	// Load .env in CWD if present, ignore missing
	let env = DotEnv::new("");
	env
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Cli::parse();
	let env = load_env();

	let cfg = FirestoreCfg::from_env(&env)?;
	let paths = DiscoveryPaths::from_env();

	// Credential-chain failure exits before any write is attempted.
	let resolved = match resolve_credential(cfg.emulator(), &paths) {
		Ok(resolved) => resolved,
		Err(e) => {
			eprintln!("Failed to initialize Firestore credentials. {e:#}");
			std::process::exit(1);
		}
	};
	if args.verbose {
		println!("using credentials from {}", resolved.source);
		println!("project {} via {}", cfg.project_id(), cfg.host());
	}

	let mut client = FirestoreClient::new(cfg, resolved.credential, args.verbose)?;

	// No subcommand means a plain seeding run.
	match args.command.unwrap_or(Commands::Seed { dry_run: false }) {
		Commands::Seed { dry_run } => seed::seed(&mut client, SeedOpts { dry_run }).await?,
		Commands::Status => status(&mut client).await?,
	}

	Ok(())
}
