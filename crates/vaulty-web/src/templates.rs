//! HTML rendering for all pages.
//!
//! Pages are assembled with `format!`; anything user-supplied goes through
//! [`html_escape`] first.

use std::fmt::Write;

use vaulty_core::{EMAIL_MAX_LENGTH, FormError};

use crate::admin::{ChangeList, ModelAdmin};

/// Escapes text for use in element content and quoted attributes.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLES: &str = r"
* { box-sizing: border-box; }
body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; color: #1f2933; line-height: 1.5; }
header, footer { padding: 1rem 2rem; background: #102a43; color: #f0f4f8; }
header a, footer a { color: #f0f4f8; margin-right: 1rem; text-decoration: none; }
main { max-width: 60rem; margin: 0 auto; padding: 2rem; }
.hero { text-align: center; padding: 3rem 0; }
.signup input[type=email] { padding: 0.5rem; width: 20rem; max-width: 100%; }
.signup button { padding: 0.5rem 1rem; }
.errorlist { color: #b42318; list-style: none; padding: 0; }
.plans { display: flex; gap: 1rem; flex-wrap: wrap; }
.plan { flex: 1; border: 1px solid #d9e2ec; border-radius: 6px; padding: 1rem; min-width: 14rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #d9e2ec; padding: 0.4rem; text-align: left; font-size: 0.9rem; }
.filters a { margin-right: 0.75rem; }
.filters .selected { font-weight: bold; }
";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLES}</style>
</head>
<body>
<header><a href="/"><strong>Vaulty</strong></a><a href="/pricing">Pricing</a><a href="/faq">FAQ</a></header>
<main>
{body}
</main>
<footer>&copy; Vaulty</footer>
</body>
</html>
"#,
        title = html_escape(title),
    )
}

/// Signup form, optionally re-rendered with the submitted value and errors.
fn signup_form(value: &str, errors: &[FormError]) -> String {
    let mut error_list = String::new();
    if !errors.is_empty() {
        error_list.push_str(r#"<ul class="errorlist">"#);
        for error in errors {
            let _ = write!(error_list, "<li>{}</li>", html_escape(&error.message()));
        }
        error_list.push_str("</ul>");
    }

    format!(
        r#"<form class="signup" method="post" action="/mailing-list">
{error_list}
<label for="id_email">Email address</label>
<input type="email" name="email" id="id_email" maxlength="{EMAIL_MAX_LENGTH}" required value="{value}">
<button type="submit">Notify me</button>
</form>"#,
        value = html_escape(value),
    )
}

/// Landing page.
#[must_use]
pub fn index(value: &str, errors: &[FormError]) -> String {
    let body = format!(
        r#"<section class="hero">
<h1>Your inbox, archived to your own cloud storage.</h1>
<p>Vaulty gives you an email address that saves every message and attachment
straight to Dropbox, Google Drive or S3.</p>
</section>
<section>
<h2>Join the launch list</h2>
<p>Be the first to know when Vaulty opens for business.</p>
{form}
</section>"#,
        form = signup_form(value, errors),
    );
    layout("Vaulty", &body)
}

/// Shown after a successful signup.
#[must_use]
pub fn launch_confirm(email: &str) -> String {
    let body = format!(
        r#"<section class="hero">
<h1>Thank you!</h1>
<p>We have added <strong>{}</strong> to the launch list and will let you know once Vaulty is ready.</p>
<p><a href="/">Back to the home page</a></p>
</section>"#,
        html_escape(email)
    );
    layout("Vaulty: Launch List Confirmation", &body)
}

/// Pricing page.
#[must_use]
pub fn pricing() -> String {
    let body = r#"<h1>Pricing</h1>
<div class="plans">
<div class="plan"><h2>Free</h2><p>1 address, 100 emails per month, attachments up to 10 MB.</p></div>
<div class="plan"><h2>Personal</h2><p>5 addresses, 2,000 emails per month, attachments up to 25 MB, sender whitelisting.</p></div>
<div class="plan"><h2>Business</h2><p>Unlimited addresses, 20,000 emails per month, attachments up to 50 MB, aliases.</p></div>
</div>"#;
    layout("Vaulty: Pricing", body)
}

/// FAQ page.
#[must_use]
pub fn faq() -> String {
    let body = r"<h1>Frequently asked questions</h1>
<h3>What does Vaulty do?</h3>
<p>Every message sent to your Vaulty address is saved, together with its attachments, to the cloud storage you connect.</p>
<h3>Which storage providers are supported?</h3>
<p>Dropbox, Google Drive and Amazon S3.</p>
<h3>Can I control who may send to my address?</h3>
<p>Yes. Enable the whitelist and only listed senders or domains are accepted.</p>
<h3>What happens when I reach my quota?</h3>
<p>New mail is rejected with a notice until your quota renews at the start of the next period.</p>";
    layout("Vaulty: FAQ", body)
}

/// Generic error page.
#[must_use]
pub fn error_page(status: u16, message: &str) -> String {
    let body = format!("<h1>{status}</h1><p>{}</p>", html_escape(message));
    layout(&format!("Vaulty: {status}"), &body)
}

/// Admin model index.
#[must_use]
pub fn admin_index(models: &[ModelAdmin]) -> String {
    let mut body = String::from("<h1>Administration</h1><ul>");
    for model in models {
        let _ = write!(
            body,
            r#"<li><a href="/admin/{}/">{}</a></li>"#,
            model.slug, model.verbose_name_plural
        );
    }
    body.push_str("</ul>");
    layout("Vaulty admin", &body)
}

/// Admin change list for one model.
#[must_use]
pub fn admin_change_list(list: &ChangeList) -> String {
    let model = list.model;
    let mut body = format!(
        r#"<p><a href="/admin/">Administration</a></p><h1>{}</h1>"#,
        model.verbose_name_plural
    );

    if !model.list_filter.is_empty() || !list.years.is_empty() {
        body.push_str(r#"<div class="filters">"#);
        for field in model.list_filter {
            let current = list.filter_value(field);
            let _ = write!(body, "<p>By {field}: ");
            for (label, value) in [("All", None), ("Yes", Some(true)), ("No", Some(false))] {
                let href = value.map_or_else(
                    || "?".to_string(),
                    |v| format!("?{field}={}", u8::from(v)),
                );
                let class = if current == value { r#" class="selected""# } else { "" };
                let _ = write!(body, r#"<a href="{href}"{class}>{label}</a>"#);
            }
            body.push_str("</p>");
        }
        if let Some(field) = model.date_hierarchy
            && !list.years.is_empty()
        {
            let _ = write!(body, "<p>By {field}: ");
            for year in &list.years {
                let class = if list.year == Some(*year) { r#" class="selected""# } else { "" };
                let _ = write!(body, r#"<a href="?year={year}"{class}>{year}</a>"#);
            }
            body.push_str("</p>");
        }
        body.push_str("</div>");
    }

    body.push_str("<table><thead><tr>");
    for column in model.list_display {
        let _ = write!(body, "<th>{column}</th>");
    }
    body.push_str("</tr></thead><tbody>");
    for row in &list.rows {
        body.push_str("<tr>");
        for cell in &row.cells {
            let _ = write!(body, "<td>{}</td>", html_escape(cell));
        }
        body.push_str("</tr>");
    }
    let _ = write!(
        body,
        "</tbody></table><p>{} {}</p>",
        list.rows.len(),
        if list.rows.len() == 1 { model.verbose_name } else { model.verbose_name_plural }
    );

    layout(&format!("Vaulty admin: {}", model.verbose_name_plural), &body)
}
