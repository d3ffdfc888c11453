use clap::{Parser, Subcommand};
use seastore::keystore::KEY_FILE;
use seastore::store::{Store, StoreConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sea", about = "Inspect .sea record stores")]
struct Cli {
    /// Data directory holding the collection files and the key file
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decrypt a collection and print its records as JSON lines
    Dump {
        collection: String,
    },
    /// List collection files in the data directory
    List,
    /// Show store metadata and per-collection record counts
    Info,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = Store::open(StoreConfig::new(&cli.data_dir))?;

    match cli.command {

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { collection } => {
            for record in store.load(&collection)? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List => {
            for name in store.list_collections()? {
                println!("{name}");
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info => {
            let key_file = store.data_dir().join(KEY_FILE);
            println!("── .sea store ───────────────────────────────────────────");
            println!("  Data dir   {}", store.data_dir().display());
            println!("  Key file   {}", if key_file.exists() { "present" } else { "absent" });
            for name in store.list_collections()? {
                let count = store.load(&name)?.len();
                println!("  {:<12} {} record(s)", name, count);
            }
        }
    }

    Ok(())
}
