use std::collections::HashMap;

use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use crate::admin::{self, ChangeList, ListQuery};
use crate::config::AdminConfig;
use crate::error::{WebError, WebResult};
use crate::startup::AppState;
use crate::templates;

/// Checks HTTP basic credentials against the configured admin login.
fn authorize(req: &HttpRequest, admin: &AdminConfig) -> WebResult<()> {
    let Some(expected) = admin.password.as_deref() else {
        warn!("admin console requested but no admin password is configured");
        return Err(WebError::Unauthorized);
    };

    let credentials = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded.trim()).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok());

    match credentials.as_deref().and_then(|c| c.split_once(':')) {
        Some((user, pass)) if user == admin.username && pass == expected => Ok(()),
        Some((user, _)) => {
            warn!(user, "admin login rejected");
            Err(WebError::Unauthorized)
        }
        None => Err(WebError::Unauthorized),
    }
}

/// Lists registered models.
pub async fn admin_index(req: HttpRequest, state: web::Data<AppState>) -> WebResult<HttpResponse> {
    authorize(&req, &state.admin)?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(templates::admin_index(admin::REGISTRY)))
}

/// Lists rows of one model, filtered by the query string.
pub async fn change_list(
    req: HttpRequest,
    state: web::Data<AppState>,
    model: web::Path<String>,
    params: web::Query<HashMap<String, String>>,
) -> WebResult<HttpResponse> {
    authorize(&req, &state.admin)?;

    let model = admin::find(&model).ok_or(WebError::NotFound)?;
    let query = ListQuery::parse(model, &params);
    let list = ChangeList::load(&state.db, model, query).await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(templates::admin_change_list(&list)))
}
