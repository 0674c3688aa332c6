//! Admin endpoints reporting and resetting `/app/` traffic.

use actix_web::{http::header::ContentType, web, HttpResponse};
use tracing::{info, warn};

use crate::error::AppError;
use crate::AppState;

pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let body = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        state.metrics.hits()
    );
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

/// Zeroes the hit counter and deletes every user. Only allowed on the dev
/// platform.
pub async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    if !state.config.is_dev() {
        warn!(platform = %state.config.platform, "Refused reset outside dev");
        return Err(AppError::Forbidden("Reset is only allowed in dev environment".into()));
    }

    state.metrics.reset();
    let deleted = state.store.delete_all_users().await?;

    info!(deleted, "Reset hits and users");
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!("Hits reset to 0 and {} users deleted", deleted)))
}
