use actix_web::{web, HttpResponse};

use crate::middleware::ApiMetrics;

/// GET /admin/metrics
pub async fn metrics(metrics: web::Data<ApiMetrics>) -> HttpResponse {
    let body = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        metrics.hits()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// POST /admin/reset
pub async fn reset(metrics: web::Data<ApiMetrics>) -> HttpResponse {
    metrics.reset();
    tracing::info!("File server hit counter reset");
    HttpResponse::Ok().finish()
}
