use std::fs::File;
use std::sync::Arc;

use chatwire::core::config::{self, CliOverrides, StorageBackend};
use chatwire::core::storage::{FileStorage, LocalStorage, MemoryStorage};
use chatwire::core::types::UuidGenerator;
use chatwire::transport::{HttpHistory, SocketChannel};
use chatwire::{ChatSession, SessionOptions, Storage};
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "chatwire", about = "Real-time chat client")]
struct Args {
    /// Chat server base URL (e.g. http://localhost:3000)
    #[arg(short, long)]
    server: Option<String>,

    /// Where to keep the conversation identity
    #[arg(long, value_enum)]
    storage: Option<Storage>,

    /// Start a fresh conversation instead of resuming the stored one
    #[arg(long)]
    new: bool,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to chatwire.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("chatwire.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("{}, using defaults", e);
        config::ChatwireConfig::default()
    });
    let cli = CliOverrides {
        server_url: args.server,
        storage_backend: args.storage.map(StorageBackend::from),
    };
    let resolved = config::resolve(&file_config, &cli);

    log::info!("Chatwire starting up against {}", resolved.server_url);

    let storage: Arc<dyn LocalStorage> = match (resolved.storage_backend, &resolved.storage_path) {
        (StorageBackend::File, Some(path)) => Arc::new(FileStorage::new(path)),
        (StorageBackend::File, None) => {
            log::warn!("No storage path available, identity won't survive a restart");
            Arc::new(MemoryStorage::new())
        }
        (StorageBackend::Memory, _) => Arc::new(MemoryStorage::new()),
    };

    // One connection for the whole process
    let channel = SocketChannel::open(&resolved.server_url);
    let history = Arc::new(HttpHistory::new(resolved.server_url.clone()));

    let mut session = ChatSession::new(
        channel,
        history,
        storage,
        Arc::new(UuidGenerator),
        SessionOptions::from(&resolved),
    );

    if args.new
        && let Err(e) = session.create_new_chat()
    {
        log::warn!("Could not start a new conversation: {}", e);
    }

    chatwire::tui::run(session, &resolved.server_url)
}
