use actix_web::HttpResponse;
use actix_web::http::header::ContentType;

use crate::templates;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

/// Landing page with the launch list form.
pub async fn index() -> HttpResponse {
    html(templates::index("", &[]))
}

/// Pricing page.
pub async fn pricing() -> HttpResponse {
    html(templates::pricing())
}

/// FAQ page.
pub async fn faq() -> HttpResponse {
    html(templates::faq())
}
