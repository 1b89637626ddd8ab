use clap::{Parser, Subcommand};
use parcel::config::Config;
use parcel::core::ParcelResult;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "parcel")]
#[command(about = "Package migrations for content stores")]
#[command(version)]
struct Cli {
    /// Use this config file instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the core upgrade and every pending package plan
    Migrate {
        /// Only run the plan for this package
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Show installed packages and their migration history
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Install a package from a <namespace>.package.xml or .package.zip file
    Install {
        /// Path of the manifest or archive
        path: PathBuf,
        /// Media archive to pair with the manifest
        #[arg(short, long)]
        archive: Option<PathBuf>,
        /// Package name to record (defaults to the namespace)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Build a distributable package from a package definition
    Pack {
        /// Package definition (YAML)
        definition: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Package author
        #[arg(short, long)]
        author: Option<String>,
    },
    /// Unpack a built package into the resources directory
    Unpack {
        /// Path of the .nupkg file
        package: PathBuf,
        /// Target directory (defaults to the configured resources directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Print the content hash of a namespace's package resources
    Hash {
        namespace: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> ParcelResult<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Migrate { package } => cli::migrate::run(config, package),
        Commands::Status { json } => cli::status::run(config, json),
        Commands::Install {
            path,
            archive,
            name,
        } => cli::install::run(config, path, archive, name),
        Commands::Pack {
            definition,
            out,
            author,
        } => cli::pack::run(definition, out, author),
        Commands::Unpack { package, dir } => cli::unpack::run(config, package, dir),
        Commands::Hash { namespace } => cli::hash::run(config, namespace),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n❌ {}", e);
            if e.is_retryable() {
                eprintln!("   The next run may succeed once the cause is resolved.");
            }
            ExitCode::FAILURE
        }
    }
}
