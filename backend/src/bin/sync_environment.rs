//! Synchronise GeoJSON environment snapshots into PostgreSQL.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use clap::{Parser, Subcommand, ValueEnum};
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use envsync::domain::ports::{
    EnvironmentQuery, EnvironmentRepository, EnvironmentSyncCommand, PoiRepository, SyncRequest,
    ZoneRepository,
};
use envsync::domain::{
    DelimiterStatus, EnvironmentFilter, EnvironmentId, EnvironmentQueryService,
    EnvironmentSyncService, Error, ErrorCode, Visibility,
};
use envsync::outbound::memory::InMemoryStore;
use envsync::outbound::persistence::{
    DbPool, DieselEnvironmentRepository, DieselPoiRepository, DieselZoneRepository,
};
use envsync::settings::SyncSettings;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde_json::{Value, json};
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// `sync-environment` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sync-environment",
    about = "Reconcile GeoJSON environment snapshots with persistent storage",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `ENVSYNC_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    /// Run against an empty in-memory store instead of PostgreSQL.
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    /// Apply pending schema migrations before running the command.
    #[arg(long, global = true)]
    migrate: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create an environment from a FeatureCollection file.
    Create {
        #[arg(value_name = "path")]
        input: PathBuf,
    },
    /// Replace an environment with the content of a FeatureCollection file.
    Update {
        #[arg(long)]
        id: i64,
        /// Revision last read by the caller; stale submissions are rejected.
        #[arg(long = "expected-revision", value_name = "revision")]
        expected_revision: Option<u32>,
        #[arg(value_name = "path")]
        input: PathBuf,
    },
    /// Finish drawing: store geometry, taking only name and address.
    Finalize {
        #[arg(long)]
        id: i64,
        #[arg(long = "expected-revision", value_name = "revision")]
        expected_revision: Option<u32>,
        #[arg(value_name = "path")]
        input: PathBuf,
    },
    /// Print an environment with its delimiter, zones and POIs.
    Show {
        #[arg(long)]
        id: i64,
    },
    /// List environments.
    List {
        #[arg(long, value_enum, default_value_t = StatusArg::Delimited)]
        status: StatusArg,
        /// Case-insensitive match on name or address.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        visibility: Option<VisibilityArg>,
    },
    /// Delete an environment and everything stored under it.
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusArg {
    Delimited,
    Pending,
    Any,
}

impl From<StatusArg> for DelimiterStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Delimited => Self::Delimited,
            StatusArg::Pending => Self::Pending,
            StatusArg::Any => Self::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VisibilityArg {
    Public,
    Private,
}

impl From<VisibilityArg> for Visibility {
    fn from(value: VisibilityArg) -> Self {
        match value {
            VisibilityArg::Public => Self::Public,
            VisibilityArg::Private => Self::Private,
        }
    }
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        eprintln!("tracing init failed: {error}");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = SyncSettings::load_from_iter([OsString::from("sync-environment")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let output = if args.dry_run {
        if args.migrate {
            warn!("--migrate has no effect on a dry run");
        }
        let store = Arc::new(InMemoryStore::new());
        execute(args.command, store.clone(), store.clone(), store, &settings).await?
    } else {
        let database_url = resolve_database_url(args.database_url, settings.database_url.clone())?;
        if args.migrate {
            run_migrations(database_url.clone()).await?;
        }
        let pool = DbPool::new(settings.pool_config(&database_url))
            .await
            .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
        execute(
            args.command,
            Arc::new(DieselEnvironmentRepository::new(pool.clone())),
            Arc::new(DieselZoneRepository::new(pool.clone())),
            Arc::new(DieselPoiRepository::new(pool)),
            &settings,
        )
        .await?
    };

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|error| io::Error::other(format!("render output: {error}")))?;
    println!("{rendered}");
    Ok(())
}

async fn execute<E, Z, P>(
    command: Command,
    environments: Arc<E>,
    zones: Arc<Z>,
    pois: Arc<P>,
    settings: &SyncSettings,
) -> io::Result<Value>
where
    E: EnvironmentRepository + 'static,
    Z: ZoneRepository + 'static,
    P: PoiRepository + 'static,
{
    let sync = EnvironmentSyncService::new(
        environments.clone(),
        zones.clone(),
        pois.clone(),
        Arc::new(DefaultClock),
    )
    .with_options(settings.sync_options());
    let query = EnvironmentQueryService::new(environments, zones, pois, Arc::new(DefaultClock))
        .with_map_format_id(settings.map_format_id());

    match command {
        Command::Create { input } => {
            let request = SyncRequest::new(read_payload(&input)?);
            let outcome = sync.create(request).await.map_err(|e| domain_error("create", e))?;
            to_json(&outcome)
        }
        Command::Update {
            id,
            expected_revision,
            input,
        } => {
            let request = build_request(&input, expected_revision)?;
            let outcome = sync
                .update(EnvironmentId::new(id), request)
                .await
                .map_err(|e| domain_error("update", e))?;
            to_json(&outcome)
        }
        Command::Finalize {
            id,
            expected_revision,
            input,
        } => {
            let request = build_request(&input, expected_revision)?;
            let outcome = sync
                .finalize(EnvironmentId::new(id), request)
                .await
                .map_err(|e| domain_error("finalize", e))?;
            to_json(&outcome)
        }
        Command::Show { id } => {
            let detail = query
                .get(EnvironmentId::new(id))
                .await
                .map_err(|e| domain_error("show", e))?;
            to_json(&detail)
        }
        Command::List {
            status,
            search,
            visibility,
        } => {
            let filter = EnvironmentFilter {
                status: status.into(),
                search,
                visibility: visibility.map(Visibility::from),
            };
            let environments = query.list(filter).await.map_err(|e| domain_error("list", e))?;
            to_json(&environments)
        }
        Command::Delete { id } => {
            let id = EnvironmentId::new(id);
            query.delete(id).await.map_err(|e| domain_error("delete", e))?;
            info!(%id, "environment deleted");
            Ok(json!({ "deleted": id }))
        }
    }
}

fn build_request(path: &Path, expected_revision: Option<u32>) -> io::Result<SyncRequest> {
    let request = SyncRequest::new(read_payload(path)?);
    Ok(match expected_revision {
        Some(revision) => request.with_expected_revision(revision),
        None => request,
    })
}

fn to_json(value: &impl serde::Serialize) -> io::Result<Value> {
    serde_json::to_value(value).map_err(|error| io::Error::other(format!("encode output: {error}")))
}

fn domain_error(operation: &str, error: Error) -> io::Error {
    let kind = match error.code() {
        ErrorCode::InvalidRequest => io::ErrorKind::InvalidInput,
        ErrorCode::NotFound => io::ErrorKind::NotFound,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, format!("{operation} failed: {error}"))
}

fn read_payload(path: &Path) -> io::Result<Value> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        io::Error::other(format!(
            "open input parent directory '{}': {error}",
            parent.display()
        ))
    })?;
    let mut file = directory.open(Path::new(file_name)).map_err(|error| {
        io::Error::other(format!("open input file '{}': {error}", path.display()))
    })?;
    let mut raw = String::new();
    file.read_to_string(&mut raw).map_err(|error| {
        io::Error::other(format!("read input file '{}': {error}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("input file '{}' is not JSON: {error}", path.display()),
        )
    })
}

fn resolve_database_url(
    explicit: Option<String>,
    configured: Option<String>,
) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    configured
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "database URL missing: set --database-url or ENVSYNC_DATABASE_URL",
            )
        })
}

async fn run_migrations(database_url: String) -> io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|error| io::Error::other(format!("connect for migrations: {error}")))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|error| io::Error::other(format!("run migrations: {error}")))?;
        info!(count = applied.len(), "migrations applied");
        Ok(())
    })
    .await
    .map_err(|error| io::Error::other(format!("migration task: {error}")))?
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use std::io::Write;

    use rstest::rstest;
    use tempfile::NamedTempFile;

    use super::*;

    #[rstest]
    fn explicit_database_url_wins() {
        let url = resolve_database_url(
            Some("postgres://cli/envsync".to_owned()),
            Some("postgres://env/envsync".to_owned()),
        )
        .expect("url resolves");
        assert_eq!(url, "postgres://cli/envsync");
    }

    #[rstest]
    #[case::explicit_blank(Some("  ".to_owned()), None)]
    #[case::nothing(None, None)]
    #[case::configured_blank(None, Some(String::new()))]
    fn missing_database_url_is_rejected(
        #[case] explicit: Option<String>,
        #[case] configured: Option<String>,
    ) {
        let error = resolve_database_url(explicit, configured).expect_err("no usable url");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn payload_is_read_as_json() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"type": "FeatureCollection", "features": []}}"#).expect("write");

        let payload = read_payload(file.path()).expect("payload reads");

        assert_eq!(payload["type"], "FeatureCollection");
    }

    #[rstest]
    fn non_json_input_is_invalid() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write");

        let error = read_payload(file.path()).expect_err("not json");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn update_arguments_parse() {
        let args = CliArgs::try_parse_from([
            "sync-environment",
            "--dry-run",
            "update",
            "--id",
            "7",
            "--expected-revision",
            "3",
            "office.geojson",
        ])
        .expect("arguments parse");

        assert!(args.dry_run);
        let Command::Update {
            id,
            expected_revision,
            input,
        } = args.command
        else {
            panic!("expected the update command");
        };
        assert_eq!((id, expected_revision), (7, Some(3)));
        assert_eq!(input, PathBuf::from("office.geojson"));
    }

    #[rstest]
    fn domain_errors_keep_their_category() {
        let error = domain_error("update", Error::not_found(EnvironmentId::new(4)));
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
        assert!(error.to_string().starts_with("update failed"));
    }
}
