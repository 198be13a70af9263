//! Request handlers and URL table.

mod admin;
mod health_check;
mod mailing_list;
mod pages;
mod social;

use actix_web::web;

pub use admin::{admin_index, change_list};
pub use health_check::health_check;
pub use mailing_list::{mailing_list, method_not_allowed};
pub use pages::{faq, index, pricing};
pub use social::{dropbox_complete, dropbox_login};

/// Registers every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/pricing", web::get().to(pricing))
        .route("/faq", web::get().to(faq))
        .route("/health_check", web::get().to(health_check))
        .service(
            web::resource("/mailing-list")
                .route(web::post().to(mailing_list))
                .default_service(web::to(method_not_allowed)),
        )
        .service(web::resource(["/admin", "/admin/"]).route(web::get().to(admin_index)))
        .service(
            web::resource(["/admin/{model}", "/admin/{model}/"]).route(web::get().to(change_list)),
        )
        .route("/social/login/dropbox", web::get().to(dropbox_login))
        .route("/social/complete/dropbox", web::get().to(dropbox_complete));
}
