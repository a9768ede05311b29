use album_layout::adapters::SchemaVariant;
use album_layout::album_store::SqliteAlbumStore;
use album_layout::config::{AppConfig, CliConfig, FileConfig};
use album_layout::editor::EditorSession;
use album_layout::error::AlbumError;
use album_layout::layout::set_title;
use album_layout::realtime::ChangeNotifier;
use album_layout::service::AlbumDataService;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[clap(version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")))]
struct CliArgs {
    /// Path to the SQLite album database file.
    #[clap(long, global = true, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Path to a TOML config file. Its values override command line flags.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Default log directive, overridden by the LOG_LEVEL environment variable.
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    /// Write legacy albums back in the legacy shape instead of migrating them.
    #[clap(long, global = true)]
    pub keep_legacy: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List albums with their cached summaries.
    List,
    /// Print which storage shape holds an album.
    Detect { album_id: String },
    /// Print an album as canonical JSON, followed by conversion warnings.
    Show { album_id: String },
    /// Rewrite one album into the unified shape.
    Migrate { album_id: String },
    /// Migrate every album still stored in the legacy shape.
    MigrateAll,
    /// Change an album's title through an editor session.
    Rename { album_id: String, title: String },
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db.clone(),
            history_capacity: None,
            migrate_on_save: self.keep_legacy.then_some(false),
            log_level: self.log_level.clone(),
        }
    }
}

fn init_logging(default_level: &str) -> Result<()> {
    let directive: Directive = default_level
        .parse()
        .with_context(|| format!("Invalid log level: {}", default_level))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(directive)
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install tracing subscriber")
}

fn open_service(config: &AppConfig, migrate_on_save: bool) -> Result<Arc<AlbumDataService>> {
    info!("Opening album database at {:?}...", config.db_path);
    let store = SqliteAlbumStore::new(&config.db_path)?;
    Ok(Arc::new(AlbumDataService::new(
        Arc::new(store),
        Arc::new(ChangeNotifier::new()),
        migrate_on_save,
    )))
}

/// Saves a legacy album in the unified shape. Returns the new version, or
/// `None` when there was nothing to migrate.
async fn migrate_album(
    service: &AlbumDataService,
    album_id: &str,
) -> Result<Option<i64>, AlbumError> {
    let doc = service.fetch_album(album_id).await?;
    if doc.variant != SchemaVariant::Legacy {
        return Ok(None);
    }
    for warning in &doc.warnings {
        warn!("Album {}: {}", album_id, warning);
    }
    let version = service
        .save_album(album_id, &doc.album, doc.version, None)
        .await?;
    Ok(Some(version))
}

async fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::List => {
            let service = open_service(config, config.migrate_on_save)?;
            for summary in service.list_albums().await? {
                println!(
                    "{}\t{}\t{} pages\tv{}\t{}\t{}",
                    summary.id,
                    summary.title,
                    summary.total_pages,
                    summary.version,
                    summary.variant_hint,
                    summary.cover_url.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Detect { album_id } => {
            let service = open_service(config, config.migrate_on_save)?;
            println!("{}", service.detect(&album_id).await?);
        }
        Command::Show { album_id } => {
            let service = open_service(config, config.migrate_on_save)?;
            let doc = service.fetch_album(&album_id).await?;
            println!("{}", serde_json::to_string_pretty(&doc.album)?);
            println!("# variant: {}, version: {}", doc.variant, doc.version);
            for warning in &doc.warnings {
                println!("# warning: {}", warning);
            }
        }
        Command::Migrate { album_id } => {
            let service = open_service(config, true)?;
            match migrate_album(&service, &album_id).await? {
                Some(version) => println!("{} migrated, now at version {}", album_id, version),
                None => println!("{} is not in the legacy shape, nothing to do", album_id),
            }
        }
        Command::MigrateAll => {
            let service = open_service(config, true)?;
            let legacy: Vec<_> = service
                .list_albums()
                .await?
                .into_iter()
                .filter(|s| s.variant_hint == SchemaVariant::Legacy)
                .collect();
            info!("Migrating {} legacy albums", legacy.len());

            let (mut migrated, mut conflicts, mut failed) = (0, 0, 0);
            for summary in legacy {
                match migrate_album(&service, &summary.id).await {
                    Ok(Some(_)) => migrated += 1,
                    Ok(None) => {}
                    Err(e) if e.is_conflict() => {
                        warn!("Skipping {}: {}", summary.id, e);
                        conflicts += 1;
                    }
                    Err(e) => {
                        error!("Failed to migrate {}: {}", summary.id, e);
                        failed += 1;
                    }
                }
            }
            println!(
                "migrated: {}, conflicts: {}, failed: {}",
                migrated, conflicts, failed
            );
        }
        Command::Rename { album_id, title } => {
            let service = open_service(config, config.migrate_on_save)?;
            let mut session =
                EditorSession::open(service, &album_id, config.history_capacity).await?;
            session.edit(|album| set_title(album, title))?;
            let version = session.save().await?;
            session.close();
            println!("{} renamed, now at version {}", album_id, version);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    init_logging(&config.log_level)?;

    run(cli_args.command, &config).await
}
