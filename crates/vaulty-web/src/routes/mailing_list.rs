use actix_web::http::header::{self, ContentType};
use actix_web::{HttpResponse, web};
use tracing::{info, warn};
use vaulty_core::SignupForm;

use crate::error::WebResult;
use crate::startup::AppState;
use crate::templates;

/// Adds a launch list signup.
///
/// A valid address is stored (duplicates included) and a confirmation mail
/// is attempted; an invalid one re-renders the form with a 400.
#[tracing::instrument(name = "Adding launch list signup", skip(state, form))]
pub async fn mailing_list(
    state: web::Data<AppState>,
    form: web::Form<SignupForm>,
) -> WebResult<HttpResponse> {
    let form = form.into_inner();

    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => {
            warn!(errors = ?errors, "rejected launch list signup");
            return Ok(HttpResponse::BadRequest()
                .content_type(ContentType::html())
                .body(templates::index(form.raw(), &errors)));
        }
    };

    let signup = state.db.mailing_list().add(&email).await?;
    info!(id = signup.id, "launch list signup stored");

    state.mailer.send_launch_confirmation(&email).await;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(templates::launch_confirm(&email)))
}

/// Any method other than POST.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST"))
        .finish()
}
