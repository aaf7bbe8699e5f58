use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gdrive_utils::{DriveConfig, Env, GoogleDrive, ListTarget, RemoteEntry};

#[derive(Debug, Parser)]
#[command(name = "gdrive", about = "Search, upload and download Google Drive files by name")]
struct Cli {
    /// TOML config (base urls, timeout, auth).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dotenv file consulted before the process environment.
    #[arg(long, global = true)]
    dotenv: Option<PathBuf>,
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Scope {
    /// Parent folder id.
    #[arg(long)]
    parent: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every entry with this exact name.
    Search {
        name: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Print the id of the first entry with this name.
    Resolve {
        name: String,
        #[command(flatten)]
        scope: Scope,
    },
    /// Print the children of a folder.
    List {
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        name: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Upload a local file, replacing a same-named entry unless --no-update.
    Upload {
        path: PathBuf,
        #[command(flatten)]
        scope: Scope,
        #[arg(long)]
        no_update: bool,
    },
    /// Download a file by name.
    Download {
        name: String,
        #[command(flatten)]
        scope: Scope,
        /// Destination path (defaults to the remote name).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the id of a folder, creating it when absent.
    Mkdir {
        name: String,
        #[command(flatten)]
        scope: Scope,
    },
}

fn print_entries(entries: &[RemoteEntry]) -> Result<(), Box<dyn std::error::Error>> {
    for entry in entries {
        println!("{}", serde_json::to_string(entry)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    gdrive_utils::logging::init_tracing(cli.json_logs)?;

    let config = match &cli.config {
        Some(path) => DriveConfig::load(path).await?,
        None => DriveConfig::default(),
    };
    let env = match &cli.dotenv {
        Some(path) => Env::load_dotenv(path).await?,
        None => Env::default(),
    };
    let drive = GoogleDrive::from_config(&config, &env).await?;

    match cli.command {
        Command::Search { name, scope } => {
            let entries = drive.search(&name, scope.parent.as_deref()).await?;
            print_entries(&entries)?;
        }
        Command::Resolve { name, scope } => {
            match drive.resolve(&name, scope.parent.as_deref()).await? {
                Some(id) => println!("{id}"),
                None => return Err(format!("{name} not found").into()),
            }
        }
        Command::List { name, id } => {
            let target = match (name.as_deref(), id.as_deref()) {
                (_, Some(id)) => ListTarget::Id(id),
                (Some(name), None) => ListTarget::Name(name),
                (None, None) => return Err("list requires --name or --id".into()),
            };
            match drive.list(target).await? {
                Some(entries) => print_entries(&entries)?,
                None => return Err("folder not found".into()),
            }
        }
        Command::Upload {
            path,
            scope,
            no_update,
        } => {
            let id = drive
                .upload(&path, scope.parent.as_deref(), !no_update)
                .await?;
            println!("{id}");
        }
        Command::Download { name, scope, out } => {
            let dest = out.unwrap_or_else(|| PathBuf::from(&name));
            let report = drive
                .download(&name, scope.parent.as_deref(), &dest, |_| {})
                .await?;
            if report.is_none() {
                return Err(format!("{name} not found").into());
            }
        }
        Command::Mkdir { name, scope } => {
            let id = drive.create_folder(&name, scope.parent.as_deref()).await?;
            println!("{id}");
        }
    }
    Ok(())
}
