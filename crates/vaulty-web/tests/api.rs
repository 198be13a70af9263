//! End-to-end request handling against an in-memory database.

#![allow(clippy::unwrap_used)]

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use vaulty_core::{Alias, Database, User, UserFilter};
use vaulty_oauth::{DropboxApi, OAuthClient, Provider};
use vaulty_web::config::{AdminConfig, MailConfig};
use vaulty_web::{AppState, DropboxLogin, Mailer, routes};

async fn state() -> AppState {
    AppState {
        db: Database::in_memory().await.unwrap(),
        mailer: Mailer::from_config(&MailConfig::default()).unwrap(),
        admin: AdminConfig {
            username: "admin".into(),
            password: Some("s3cret".into()),
        },
        dropbox: None,
        secure_cookies: false,
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(routes::configure),
        )
        .await
    };
}

fn basic(user: &str, pass: &str) -> (header::HeaderName, String) {
    (
        header::AUTHORIZATION,
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}"))),
    )
}

#[actix_web::test]
async fn static_pages_render() {
    let state = state().await;
    let app = app!(state);

    for (uri, needle) in [
        ("/", "Join the launch list"),
        ("/pricing", "<h1>Pricing</h1>"),
        ("/faq", "Frequently asked questions"),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains(needle), "{uri}");
    }
}

#[actix_web::test]
async fn health_check_is_empty_ok() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/health_check").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn signup_stores_one_row() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/mailing-list")
        .set_form(&[("email", "user@example.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Thank you!"));

    let rows = state.db.mailing_list().list().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email_address, "user@example.com");
}

#[actix_web::test]
async fn signup_accepts_email_address_field() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/mailing-list")
        .set_form(&[("email_address", "other@example.org")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.db.mailing_list().count().await.unwrap(), 1);
}

#[actix_web::test]
async fn duplicate_signups_are_kept() {
    let state = state().await;
    let app = app!(state);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/mailing-list")
            .set_form(&[("email", "user@example.com")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
    assert_eq!(state.db.mailing_list().count().await.unwrap(), 2);
}

#[actix_web::test]
async fn invalid_signup_is_rejected_without_row() {
    let state = state().await;
    let app = app!(state);
    let too_long = format!("{}@example.com", "a".repeat(95));

    for (value, message) in [
        ("not-an-email", "Enter a valid email address."),
        ("", "This field is required."),
        (too_long.as_str(), "Ensure this value has at most 100 characters (it has 107)."),
    ] {
        let req = test::TestRequest::post()
            .uri("/mailing-list")
            .set_form(&[("email", value)])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{value}");
        let body = test::read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains(message), "{value}");
        assert!(body.contains(r#"action="/mailing-list""#));
    }

    assert_eq!(state.db.mailing_list().count().await.unwrap(), 0);
}

#[actix_web::test]
async fn mailing_list_rejects_other_methods() {
    let state = state().await;
    let app = app!(state);

    for req in [
        test::TestRequest::get().uri("/mailing-list").to_request(),
        test::TestRequest::put().uri("/mailing-list").to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(header::ALLOW).unwrap(), "POST");
    }
    assert_eq!(state.db.mailing_list().count().await.unwrap(), 0);
}

#[actix_web::test]
async fn admin_requires_credentials() {
    let state = state().await;
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/admin/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let req = test::TestRequest::get()
        .uri("/admin/")
        .insert_header(basic("admin", "wrong"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/admin/")
        .insert_header(basic("admin", "s3cret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains(r#"href="/admin/launchmailinglist/""#));
}

#[actix_web::test]
async fn admin_unknown_model_is_not_found() {
    let state = state().await;
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/admin/attachment/")
        .insert_header(basic("admin", "s3cret"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_change_list_filters() {
    let state = state().await;
    let aliases = state.db.aliases();
    let mut active = Alias::new("sales@vaulty.net", "owner@example.com");
    aliases.save(&mut active).await.unwrap();
    let mut retired = Alias::new("retired@vaulty.net", "owner@example.com");
    aliases.save(&mut retired).await.unwrap();
    aliases.set_active(retired.id.unwrap(), false).await.unwrap();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/admin/alias/?is_active=0&ignored=1")
        .insert_header(basic("admin", "s3cret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains("retired@vaulty.net"));
    assert!(!body.contains("sales@vaulty.net"));
    assert!(body.contains("1 alias<"));
}

#[actix_web::test]
async fn social_login_not_configured() {
    let state = state().await;
    let app = app!(state);

    for uri in ["/social/login/dropbox", "/social/complete/dropbox?code=x&state=y"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

fn dropbox(base: &str) -> DropboxLogin {
    let provider = Provider::new(
        "dropbox",
        "https://www.dropbox.com/oauth2/authorize",
        format!("{base}/oauth2/token"),
    )
    .unwrap()
    .with_auth_param("token_access_type", "offline");
    let client = OAuthClient::new("app-key", provider)
        .with_client_secret("app-secret")
        .with_redirect_uri("http://localhost/social/complete/dropbox");
    DropboxLogin::new(client, DropboxApi::with_base_url(format!("{base}/2/")).unwrap())
}

#[actix_web::test]
async fn social_login_redirects_with_flow_cookies() {
    let mut state = state().await;
    state.dropbox = Some(dropbox("http://127.0.0.1:9"));
    let app = app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/social/login/dropbox").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("https://www.dropbox.com/oauth2/authorize?"));
    assert!(location.contains("client_id=app-key"));
    assert!(location.contains("code_challenge_method=S256"));

    let cookies: Vec<_> = resp.response().cookies().collect();
    let state_cookie = cookies
        .iter()
        .find(|c| c.name() == "vaulty_oauth_state")
        .unwrap();
    assert!(state_cookie.http_only().unwrap_or(false));
    assert!(location.contains(&format!("state={}", state_cookie.value())));
    assert!(cookies.iter().any(|c| c.name() == "vaulty_oauth_verifier"));
}

#[actix_web::test]
async fn social_complete_rejects_state_mismatch() {
    let mut state = state().await;
    state.dropbox = Some(dropbox("http://127.0.0.1:9"));
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/social/complete/dropbox?code=abc&state=forged")
        .cookie(Cookie::new("vaulty_oauth_state", "expected"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/social/complete/dropbox?code=abc&state=expected")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

/// Answers each incoming connection with the next canned JSON body.
async fn dropbox_server(bodies: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        for body in bodies {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 2048];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    base
}

#[actix_web::test]
async fn social_complete_links_account() {
    let base = dropbox_server(vec![
        r#"{"access_token":"sl.token","token_type":"bearer","expires_in":14400,"refresh_token":"r.token","account_id":"dbid:abc"}"#,
        r#"{"account_id":"dbid:abc","email":"Owner@Example.com","email_verified":true,"name":{"display_name":"Owner"}}"#,
    ])
    .await;

    let mut state = state().await;
    let mut existing = User::with_email("owner@example.com");
    state.db.users().save(&mut existing).await.unwrap();
    state.dropbox = Some(dropbox(&base));
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/social/complete/dropbox?code=abc&state=st8")
        .cookie(Cookie::new("vaulty_oauth_state", "st8"))
        .cookie(Cookie::new("vaulty_oauth_verifier", "verifier"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

    let auth = state
        .db
        .social_auth()
        .find("dropbox", "dbid:abc")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(auth.user_id, existing.id.unwrap());
    assert_eq!(auth.access_token, "sl.token");
    assert_eq!(auth.refresh_token.as_deref(), Some("r.token"));
}

fn complete_request() -> test::TestRequest {
    test::TestRequest::get()
        .uri("/social/complete/dropbox?code=abc&state=st8")
        .cookie(Cookie::new("vaulty_oauth_state", "st8"))
        .cookie(Cookie::new("vaulty_oauth_verifier", "verifier"))
}

#[actix_web::test]
async fn social_relogin_after_email_change_keeps_user() {
    let base = dropbox_server(vec![
        r#"{"access_token":"sl.first","token_type":"bearer","account_id":"dbid:abc"}"#,
        r#"{"account_id":"dbid:abc","email":"old@example.com","email_verified":true,"name":{"display_name":"Owner"}}"#,
        r#"{"access_token":"sl.second","token_type":"bearer","account_id":"dbid:abc"}"#,
        r#"{"account_id":"dbid:abc","email":"new@example.com","email_verified":true,"name":{"display_name":"Owner"}}"#,
    ])
    .await;

    let mut state = state().await;
    state.dropbox = Some(dropbox(&base));
    let app = app!(state);

    let resp = test::call_service(&app, complete_request().to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let first = state.db.social_auth().find("dropbox", "dbid:abc").await.unwrap().unwrap();

    let resp = test::call_service(&app, complete_request().to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let second = state.db.social_auth().find("dropbox", "dbid:abc").await.unwrap().unwrap();

    assert_eq!(second.user_id, first.user_id);
    assert_eq!(second.access_token, "sl.second");

    let users = state.db.users().list(UserFilter::default()).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email_address, "old@example.com");
}

#[actix_web::test]
async fn social_unverified_email_does_not_claim_user() {
    let base = dropbox_server(vec![
        r#"{"access_token":"sl.token","token_type":"bearer","account_id":"dbid:mallory"}"#,
        r#"{"account_id":"dbid:mallory","email":"owner@example.com","email_verified":false,"name":{"display_name":"Owner"}}"#,
    ])
    .await;

    let mut state = state().await;
    let mut existing = User::with_email("owner@example.com");
    state.db.users().save(&mut existing).await.unwrap();
    state.dropbox = Some(dropbox(&base));
    let app = app!(state);

    let resp = test::call_service(&app, complete_request().to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(
        state
            .db
            .social_auth()
            .find("dropbox", "dbid:mallory")
            .await
            .unwrap()
            .is_none()
    );
    let users = state.db.users().list(UserFilter::default()).await.unwrap();
    assert_eq!(users.len(), 1);
}
