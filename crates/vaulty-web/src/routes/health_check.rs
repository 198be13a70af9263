use actix_web::HttpResponse;

/// Liveness check.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
