use anyhow::{anyhow, Context as _};
use axum::{routing::get, Router};
use db::Database;
use std::{
    env::args,
    net::{SocketAddr, TcpListener},
    path::Path,
};
use togather::{db, env, seed, AppState, Config, MigrateConfig, Result};
use tokio::signal::unix::SignalKind;
use tower_http::trace::TraceLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, Layer};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = env::load_dotenv() {
        eprintln!(
            "error loading .env.toml (this is expected in production): {}",
            error
        );
    }

    match args().nth(1).as_deref() {
        Some("version") => {
            println!("togather v{VERSION}");
        }
        Some("migrate") => {
            let config = envy::from_env::<MigrateConfig>().context("error loading config")?;
            let db = connect(&config.database_url).await?;

            let migrations_path = config
                .migrations_path
                .as_deref()
                .unwrap_or_else(|| Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")));

            let migrations = db.migrate(migrations_path, false).await?;
            for (migration, duration) in migrations {
                println!(
                    "Ran {} {} {:?}",
                    migration.version, migration.description, duration
                );
            }
        }
        Some("seed") => {
            let config = envy::from_env::<MigrateConfig>().context("error loading config")?;
            let db = connect(&config.database_url).await?;

            let seed_path = config.seed_path.as_deref().unwrap_or_else(|| {
                Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/seed.default.json"))
            });
            let count = seed::seed(&db, seed_path).await?;
            println!("Seeded {count} tech stacks");
        }
        Some("serve") => {
            let config = envy::from_env::<Config>().context("error loading config")?;
            init_tracing(&config);

            let state = AppState::new(config).await?;

            let listener = TcpListener::bind(format!("0.0.0.0:{}", state.config.http_port))
                .context("failed to bind TCP listener")?;
            tracing::info!(
                port = state.config.http_port,
                environment = %state.config.togather_environment,
                "togather v{VERSION} listening"
            );

            let app = togather::api::routes(state.clone())
                .merge(Router::new().route("/", get(handle_root)))
                .layer(TraceLayer::new_for_http());

            axum::Server::from_tcp(listener)
                .map_err(|error| anyhow!(error))?
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(async move {
                    let (Ok(mut sigterm), Ok(mut sigint)) = (
                        tokio::signal::unix::signal(SignalKind::terminate()),
                        tokio::signal::unix::signal(SignalKind::interrupt()),
                    ) else {
                        tracing::error!("failed to listen for interrupt signal");
                        return;
                    };
                    let sigterm = sigterm.recv();
                    let sigint = sigint.recv();
                    futures::pin_mut!(sigterm, sigint);
                    futures::future::select(sigterm, sigint).await;
                    tracing::info!("Received interrupt signal");
                })
                .await
                .map_err(|error| anyhow!(error))?;
        }
        _ => {
            Err(anyhow!("usage: togather <version | migrate | seed | serve>"))?;
        }
    }
    Ok(())
}

async fn connect(database_url: &str) -> Result<Database> {
    let mut db_options = db::ConnectOptions::new(database_url.to_string());
    db_options.max_connections(5);
    Database::new(db_options).await
}

async fn handle_root() -> String {
    format!("togather v{VERSION}")
}

pub fn init_tracing(config: &Config) -> Option<()> {
    use std::str::FromStr;
    use tracing_subscriber::layer::SubscriberExt;
    let rust_log = config.rust_log.clone()?;

    if let Err(error) = LogTracer::init() {
        eprintln!("failed to bridge log records into tracing: {error}");
        return None;
    }

    let filter = match EnvFilter::from_str(rust_log.as_str()) {
        Ok(filter) => filter,
        Err(error) => {
            eprintln!("invalid RUST_LOG {rust_log:?}: {error}");
            return None;
        }
    };

    let subscriber = tracing_subscriber::Registry::default()
        .with(if config.log_json.unwrap_or(false) {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .fmt_fields(JsonFields::default())
                    .event_format(
                        tracing_subscriber::fmt::format()
                            .json()
                            .flatten_event(true)
                            .with_span_list(true),
                    ),
            ) as Box<dyn Layer<_> + Send + Sync>
        } else {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .event_format(tracing_subscriber::fmt::format().pretty()),
            )
        })
        .with(filter);

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {error}");
    }

    None
}
