use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use playmatch::config::Settings;
use playmatch::core::DistrictGraph;
use playmatch::routes::{self, AppState};
use playmatch::services::{
    run_notification_forwarder, AppwriteClient, AppwriteCollections, CacheManager,
    CachedEventStore, EventBus, PostgresClient,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors (e.g. a malformed proposal id)
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn io_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging; LOG_LEVEL / LOG_FORMAT override the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting Playmatch matching service...");
    info!("Configuration loaded successfully");

    // Initialize Appwrite client
    let appwrite_collections = AppwriteCollections {
        events: settings.collection.events.clone(),
        attendance: settings.collection.attendance.clone(),
    };

    let appwrite = Arc::new(
        AppwriteClient::new(
            settings.appwrite.endpoint.clone(),
            settings.appwrite.api_key.clone(),
            settings.appwrite.project_id.clone(),
            settings.appwrite.database_id.clone(),
            appwrite_collections,
        )
        .map_err(|e| io_error("Failed to build Appwrite client", e))?,
    );

    info!("Appwrite client initialized");

    // Initialize cache manager; Redis is optional
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(30);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match settings.cache.redis_url.as_deref().filter(|url| !url.is_empty()) {
        Some(redis_url) => match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::local(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("No Redis configured, using in-process cache only");
            CacheManager::local(l1_cache_size, cache_ttl)
        }
    };

    let events = Arc::new(CachedEventStore::new(appwrite, Arc::new(cache)));

    // Initialize PostgreSQL client
    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
        )
        .await
        .map_err(|e| io_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL client initialized");

    // Domain events feed the notification forwarder
    let bus = EventBus::new();
    tokio::spawn(run_notification_forwarder(bus.subscribe()));

    let graph = Arc::new(DistrictGraph::paris());
    info!("District graph loaded ({} districts)", graph.districts().len());

    // Build application state
    let app_state = AppState::new(
        postgres.clone(),
        postgres.clone(),
        events,
        graph,
        bus,
        settings.matching.clone(),
    )
    .with_postgres(postgres);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
