use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::{info, warn};
use vaulty_core::{Database, SocialAuth, User, UserId};
use vaulty_oauth::{DropboxAccount, PkceChallenge, random_state};

use crate::error::{WebError, WebResult};
use crate::startup::AppState;

const PROVIDER: &str = "dropbox";
const STATE_COOKIE: &str = "vaulty_oauth_state";
const VERIFIER_COOKIE: &str = "vaulty_oauth_verifier";
const COOKIE_PATH: &str = "/social/";

fn flow_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path(COOKIE_PATH)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(10))
        .finish()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "").path(COOKIE_PATH).finish();
    cookie.make_removal();
    cookie
}

/// Starts the Dropbox authorization code flow.
pub async fn dropbox_login(state: web::Data<AppState>) -> WebResult<HttpResponse> {
    let dropbox = state.dropbox.as_ref().ok_or(WebError::NotFound)?;

    let pkce = PkceChallenge::generate();
    let csrf = random_state();
    let url = dropbox.client.authorization_url(&csrf, Some(&pkce))?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, url.as_str()))
        .cookie(flow_cookie(STATE_COOKIE, csrf, state.secure_cookies))
        .cookie(flow_cookie(
            VERIFIER_COOKIE,
            pkce.verifier().to_string(),
            state.secure_cookies,
        ))
        .finish())
}

/// Query parameters Dropbox appends to the redirect.
#[derive(Debug, Deserialize)]
pub struct Callback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Finishes the flow: links the Dropbox account to a (possibly new) user.
pub async fn dropbox_complete(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<Callback>,
) -> WebResult<HttpResponse> {
    let dropbox = state.dropbox.as_ref().ok_or(WebError::NotFound)?;
    let query = query.into_inner();

    if let Some(error) = query.error {
        warn!(error = %error, description = ?query.error_description, "dropbox authorization denied");
        return Err(WebError::BadRequest(format!("Dropbox authorization failed: {error}")));
    }

    let expected = req.cookie(STATE_COOKIE);
    match (&query.state, &expected) {
        (Some(got), Some(cookie)) if got == cookie.value() => {}
        _ => {
            warn!("oauth state missing or mismatched");
            return Err(WebError::BadRequest("Invalid login state".to_string()));
        }
    }

    let code = query
        .code
        .ok_or_else(|| WebError::BadRequest("Missing authorization code".to_string()))?;
    let verifier = req.cookie(VERIFIER_COOKIE);

    let token = dropbox
        .client
        .exchange_code(&code, verifier.as_ref().map(Cookie::value))
        .await?;
    let account = dropbox.api.current_account(&token).await?;

    let user_id = resolve_user(&state.db, &account).await?;
    let mut auth = SocialAuth::new(user_id, PROVIDER, &account.account_id, &token.access_token)
        .with_refresh_token(token.refresh_token.clone());
    state.db.social_auth().upsert(&mut auth).await?;

    info!(user = %user_id, uid = %account.account_id, "linked dropbox account");

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(expired_cookie(STATE_COOKIE))
        .cookie(expired_cookie(VERIFIER_COOKIE))
        .finish())
}

/// Picks the user a Dropbox login belongs to.
///
/// An existing link always wins, even if the account's email has changed.
/// Otherwise the email decides, and only once Dropbox has verified it.
async fn resolve_user(db: &Database, account: &DropboxAccount) -> WebResult<UserId> {
    if let Some(link) = db.social_auth().find(PROVIDER, &account.account_id).await? {
        return Ok(link.user_id);
    }

    if !account.email_verified {
        warn!(uid = %account.account_id, "refusing login with unverified dropbox email");
        return Err(WebError::BadRequest(
            "Verify your Dropbox email address before signing in".to_string(),
        ));
    }

    let users = db.users();
    if let Some(user) = users.find_by_email(&account.email).await?
        && let Some(id) = user.id
    {
        return Ok(id);
    }

    let mut user = User::with_email(&account.email);
    users.save(&mut user).await?;
    info!(username = %user.username, "created user from social login");
    user.id
        .ok_or_else(|| vaulty_core::Error::not_found("user", &account.email).into())
}
