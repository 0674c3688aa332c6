pub mod admin;
pub mod auth;
pub mod chirps;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod users;
pub mod webhooks;

use std::sync::Arc;
use std::time::Duration;
use actix_files::Files;
use actix_web::{dev::Service, http::header::ContentType, web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthenticatedUser, TokenService};
pub use db::{DbOperations, MemoryStore, Store};
pub use metrics::Metrics;

/// Readiness probe.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body("OK")
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub auth: Arc<AuthService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let store: Arc<dyn Store> = if config.database.url == "memory" {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        } else {
            let db = DbOperations::new_with_options(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(5),
            )
            .await?;
            if config.database.run_migrations {
                db.run_migrations().await?;
            }
            Arc::new(db)
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Settings, store: Arc<dyn Store>) -> Self {
        let tokens = TokenService::new(
            config.auth.jwt_secret.clone(),
            chrono::Duration::seconds(config.auth.access_token_ttl_secs),
        );
        let auth = AuthService::new(
            store.clone(),
            tokens.clone(),
            chrono::Duration::days(config.auth.refresh_token_ttl_days),
        );

        Self {
            config: Arc::new(config),
            store,
            tokens,
            auth: Arc::new(auth),
            metrics: Arc::new(Metrics::new()),
        }
    }
}

/// Registers every route, serving `/app/` from `filepath_root`. Shared by
/// `main` and the integration tests.
pub fn configure(filepath_root: String) -> impl Fn(&mut web::ServiceConfig) {
    move |cfg| routes(cfg, &filepath_root)
}

fn routes(cfg: &mut web::ServiceConfig, filepath_root: &str) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|_err, _req| {
        AppError::NotFound("Not found".into()).into()
    }))
    .service(
        web::scope("/api")
            .route("/healthz", web::get().to(health_check))
            .route("/users", web::post().to(users::create_user))
            .route("/users", web::put().to(users::update_user))
            .route("/login", web::post().to(auth::handlers::login))
            .route("/refresh", web::post().to(auth::handlers::refresh))
            .route("/revoke", web::post().to(auth::handlers::revoke))
            .route("/validate_chirp", web::post().to(chirps::validate))
            .route("/chirps", web::post().to(chirps::create_chirp))
            .route("/chirps", web::get().to(chirps::list_chirps))
            .route("/chirps/{id}", web::get().to(chirps::get_chirp))
            .route("/chirps/{id}", web::delete().to(chirps::delete_chirp))
            .route("/polka/webhooks", web::post().to(webhooks::polka_webhook)),
    )
    .service(
        web::scope("/admin")
            .route("/metrics", web::get().to(admin::metrics))
            .route("/reset", web::post().to(admin::reset)),
    )
    .service(
        web::scope("/app")
            .wrap_fn(|req, srv| {
                if let Some(state) = req.app_data::<web::Data<AppState>>() {
                    state.metrics.record_hit();
                }
                srv.call(req)
            })
            .service(
                Files::new("", filepath_root)
                    .index_file("index.html")
                    .redirect_to_slash_directory(),
            ),
    );
}
