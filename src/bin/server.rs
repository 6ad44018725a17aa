//! carvault Server Binary
//!
//! Starts the HTTP server for carvault.

use std::sync::Arc;
use std::time::Duration;

use carvault::cache::{Cache, MemoryBackend};
use carvault::config::{CacheMode, Config};
use carvault::repository::FileCarRepository;
use carvault::store::JsonStore;
use carvault::CarService;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// carvault Server
#[derive(Parser, Debug)]
#[command(name = "carvault-server")]
#[command(about = "Vehicle record service with file storage and optional Redis cache")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, env = "CARVAULT_DATA_DIR", default_value = "./data")]
    data_dir: String,

    /// Collection file name inside the data directory
    #[arg(long, env = "CARVAULT_COLLECTION_FILE", default_value = "cars.json")]
    collection_file: String,

    /// Listen address (host:port)
    #[arg(short, long, env = "CARVAULT_LISTEN", default_value = "127.0.0.1:8080")]
    listen: String,

    /// Cache transport
    #[arg(long, env = "CARVAULT_CACHE", value_enum, default_value_t = CacheArg::Redis)]
    cache: CacheArg,

    /// Redis address (host:port)
    #[arg(long, env = "CARVAULT_REDIS_ADDR", default_value = "127.0.0.1:6379")]
    redis_addr: String,

    /// Redis password
    #[arg(long, env = "CARVAULT_REDIS_PASSWORD")]
    redis_password: Option<String>,

    /// Redis database index
    #[arg(long, env = "CARVAULT_REDIS_DB", default_value = "0")]
    redis_db: i64,

    /// Cache key prefix
    #[arg(long, env = "CARVAULT_KEY_PREFIX", default_value = "carvault")]
    key_prefix: String,

    /// Cache TTL in seconds
    #[arg(long, env = "CARVAULT_CACHE_TTL_SECS", default_value = "86400")]
    cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CacheArg {
    Redis,
    Memory,
    Off,
}

impl From<CacheArg> for CacheMode {
    fn from(arg: CacheArg) -> Self {
        match arg {
            CacheArg::Redis => CacheMode::Redis,
            CacheArg::Memory => CacheMode::Memory,
            CacheArg::Off => CacheMode::Off,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,carvault=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("carvault Server v{}", carvault::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .collection_file(&args.collection_file)
        .listen_addr(&args.listen)
        .cache_mode(args.cache.into())
        .redis_addr(&args.redis_addr)
        .redis_password(args.redis_password.clone())
        .redis_db(args.redis_db)
        .key_prefix(&args.key_prefix)
        .cache_ttl(Duration::from_secs(args.cache_ttl_secs))
        .build();

    // Open storage
    let store = match JsonStore::open(&config.data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open data directory: {}", e);
            std::process::exit(1);
        }
    };
    let repo = Arc::new(FileCarRepository::new(store, config.collection_file.clone()));

    let service = Arc::new(CarService::new(repo, open_cache(&config)).with_ttl(config.cache.ttl));

    tracing::info!("Service initialized successfully");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(carvault::http::serve(service, &config.listen_addr)) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Resolve the cache once at startup. An unreachable Redis degrades to no
/// cache; it is not retried later.
fn open_cache(config: &Config) -> Option<Cache> {
    match config.cache.mode {
        CacheMode::Off => None,
        CacheMode::Memory => Some(Cache::new(
            Arc::new(MemoryBackend::new()),
            config.cache.key_prefix.clone(),
        )),
        CacheMode::Redis => match Cache::connect(&config.cache) {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!("Redis unavailable ({}), continuing with file storage only", e);
                None
            }
        },
    }
}
