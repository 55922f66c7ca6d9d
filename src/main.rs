use actix_web::{App, HttpServer, middleware::Logger};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice::{
  adapters::http::{InvoiceRouteDependencies, RequestIdMiddleware, configure_invoice_routes},
  domain::invoice::{InvoiceService, InvoiceServiceDependencies, UuidV4Generator},
  infrastructure::{
    cache::{Cache, NoOpCache, RedisCache},
    config::{Config, RedisConfig},
    persistence::postgres::{
      PostgresCustomerRepository, PostgresInvoiceRepository, PostgresLineItemRepository,
      PostgresSessionProvider,
    },
  },
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  // Initialize tracing subscriber for logging
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "invoice=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting invoice service");

  let config = Config::load().expect("Failed to load configuration");
  tracing::info!("Configuration loaded successfully");

  // Set up database connection pool with timeout
  tracing::info!("Connecting to database");

  let db_pool = tokio::time::timeout(
    Duration::from_secs(config.database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(config.database.max_connections)
      .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
      .connect(&config.database.url),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      config.database.connect_timeout_seconds
    );
    std::io::Error::new(
      std::io::ErrorKind::TimedOut,
      format!(
        "Database connection timed out after {} seconds",
        config.database.connect_timeout_seconds
      ),
    )
  })?
  .map_err(|e| {
    tracing::error!("Failed to connect to database: {}", e);
    match e {
      sqlx::Error::Io(_) => std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "Could not connect to database. Is PostgreSQL running?",
      ),
      _ => std::io::Error::other(format!("Database error: {}", e)),
    }
  })?;

  tracing::info!("Database connection pool created");

  tracing::info!("Running database migrations");
  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .expect("Failed to run database migrations");
  tracing::info!("Database migrations completed");

  let cache: Arc<dyn Cache> = if config.cache.enabled {
    Arc::new(RedisCache::new(connect_redis(&config.redis).await?))
  } else {
    tracing::warn!("Cache disabled, every read goes to PostgreSQL");
    Arc::new(NoOpCache)
  };
  let cache_ttl = Duration::from_secs(config.cache.ttl_seconds);

  // Initialize repositories
  let invoice_repo = Arc::new(PostgresInvoiceRepository::new(
    db_pool.clone(),
    cache.clone(),
    cache_ttl,
  ));
  let customer_repo = Arc::new(PostgresCustomerRepository::new(
    db_pool.clone(),
    cache.clone(),
    cache_ttl,
  ));
  let line_item_repo = Arc::new(PostgresLineItemRepository::new(
    db_pool.clone(),
    cache.clone(),
    cache_ttl,
  ));
  let sessions = Arc::new(PostgresSessionProvider::new(db_pool.clone(), cache));

  // Initialize domain service
  let invoice_service = Arc::new(InvoiceService::new(InvoiceServiceDependencies {
    invoice_repo,
    customer_repo,
    line_item_repo,
    sessions,
    id_generator: Arc::new(UuidV4Generator),
  }));

  let route_deps = InvoiceRouteDependencies::new(invoice_service);

  let server_host = config.server.host.clone();
  let server_port = config.server.port;

  tracing::info!("Starting server at {}:{}", server_host, server_port);

  HttpServer::new(move || {
    let route_deps = route_deps.clone();

    App::new()
      .wrap(RequestIdMiddleware::new())
      .wrap(Logger::default())
      .configure(move |cfg| configure_invoice_routes(cfg, route_deps))
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await
}

/// Opens a Redis connection manager, bounded by the configured timeout.
async fn connect_redis(
  config: &RedisConfig,
) -> std::io::Result<redis::aio::ConnectionManager> {
  tracing::info!("Connecting to Redis");

  let redis_client = redis::Client::open(config.url.clone()).map_err(|e| {
    tracing::error!("Failed to create Redis client: {}", e);
    std::io::Error::new(
      std::io::ErrorKind::InvalidInput,
      format!("Invalid Redis URL: {}", e),
    )
  })?;

  let conn = tokio::time::timeout(
    Duration::from_secs(config.connect_timeout_seconds),
    redis_client.get_connection_manager(),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Redis connection timed out after {} seconds. Is Redis running?",
      config.connect_timeout_seconds
    );
    std::io::Error::new(
      std::io::ErrorKind::TimedOut,
      format!(
        "Redis connection timed out after {} seconds",
        config.connect_timeout_seconds
      ),
    )
  })?
  .map_err(|e| {
    tracing::error!("Failed to connect to Redis: {}", e);
    std::io::Error::new(
      std::io::ErrorKind::ConnectionRefused,
      format!("Could not connect to Redis at {}", config.url),
    )
  })?;

  tracing::info!("Redis connection established");
  Ok(conn)
}
