//! Read-only admin listings.
//!
//! Each model is registered with the columns it shows, the boolean fields it
//! can be filtered on and an optional date field for year drill-down.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};
use vaulty_core::{
    AddressFilter, Database, MailFilter, MailStatus, Result, UserFilter, UserId,
};

/// List configuration for one model.
#[derive(Debug)]
pub struct ModelAdmin {
    /// URL segment under `/admin/`.
    pub slug: &'static str,
    /// Singular display name.
    pub verbose_name: &'static str,
    /// Plural display name.
    pub verbose_name_plural: &'static str,
    /// Columns, in order.
    pub list_display: &'static [&'static str],
    /// Boolean fields accepted as `?field=1|0`.
    pub list_filter: &'static [&'static str],
    /// Timestamp used for `?year=` drill-down.
    pub date_hierarchy: Option<&'static str>,
}

/// Registered models, in index order.
pub static REGISTRY: &[ModelAdmin] = &[
    ModelAdmin {
        slug: "user",
        verbose_name: "user",
        verbose_name_plural: "users",
        list_display: &["username", "email_address", "is_staff", "is_subscribed", "date_joined"],
        list_filter: &["is_staff", "is_subscribed"],
        date_hierarchy: None,
    },
    ModelAdmin {
        slug: "address",
        verbose_name: "address",
        verbose_name_plural: "addresses",
        list_display: &[
            "user",
            "address",
            "is_active",
            "email_quota",
            "storage_quota",
            "last_renewal_time",
            "storage_backend",
            "storage_path",
            "is_whitelist_enabled",
            "creation_time",
        ],
        list_filter: &["is_active", "is_whitelist_enabled"],
        date_hierarchy: Some("creation_time"),
    },
    ModelAdmin {
        slug: "mail",
        verbose_name: "mail",
        verbose_name_plural: "mails",
        list_display: &[
            "user",
            "address",
            "message_id",
            "num_attachments",
            "total_size",
            "status",
            "creation_time",
        ],
        list_filter: &["status"],
        date_hierarchy: None,
    },
    ModelAdmin {
        slug: "alias",
        verbose_name: "alias",
        verbose_name_plural: "aliases",
        list_display: &["alias", "dest", "is_active"],
        list_filter: &["is_active"],
        date_hierarchy: None,
    },
    ModelAdmin {
        slug: "launchmailinglist",
        verbose_name: "launch mailing list",
        verbose_name_plural: "launch mailing lists",
        list_display: &["email_address", "creation_time"],
        list_filter: &[],
        date_hierarchy: Some("creation_time"),
    },
];

/// Looks up a registered model by slug.
#[must_use]
pub fn find(slug: &str) -> Option<&'static ModelAdmin> {
    REGISTRY.iter().find(|model| model.slug == slug)
}

/// Filters selected through the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Boolean filters, only for fields in `list_filter`.
    pub filters: Vec<(&'static str, bool)>,
    /// Year drill-down, only for models with a date hierarchy.
    pub year: Option<i32>,
}

impl ListQuery {
    /// Extracts the filters `model` understands; anything else is ignored.
    #[must_use]
    pub fn parse(model: &ModelAdmin, params: &HashMap<String, String>) -> Self {
        let filters = model
            .list_filter
            .iter()
            .filter_map(|field| {
                let value = match params.get(*field)?.as_str() {
                    "1" | "true" | "True" => true,
                    "0" | "false" | "False" => false,
                    _ => return None,
                };
                Some((*field, value))
            })
            .collect();

        let year = model
            .date_hierarchy
            .and_then(|_| params.get("year")?.parse().ok());

        Self { filters, year }
    }

    fn get(&self, field: &str) -> Option<bool> {
        self.filters
            .iter()
            .find_map(|(name, value)| (*name == field).then_some(*value))
    }
}

/// One rendered row.
#[derive(Debug, Clone)]
pub struct Row {
    /// Display values in `list_display` order.
    pub cells: Vec<String>,
    date: Option<DateTime<Utc>>,
}

/// A filtered listing ready for rendering.
#[derive(Debug)]
pub struct ChangeList {
    /// Model being listed.
    pub model: &'static ModelAdmin,
    /// Rows after filtering.
    pub rows: Vec<Row>,
    /// Years available for drill-down, newest first.
    pub years: Vec<i32>,
    /// Selected year.
    pub year: Option<i32>,
    query: ListQuery,
}

impl ChangeList {
    /// Value selected for a boolean filter.
    #[must_use]
    pub fn filter_value(&self, field: &str) -> Option<bool> {
        self.query.get(field)
    }

    /// Loads and filters rows for `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn load(db: &Database, model: &'static ModelAdmin, query: ListQuery) -> Result<Self> {
        let rows = match model.slug {
            "user" => user_rows(db, &query).await?,
            "address" => address_rows(db, &query).await?,
            "mail" => mail_rows(db, &query).await?,
            "alias" => alias_rows(db, &query).await?,
            _ => launch_rows(db).await?,
        };

        let years: Vec<i32> = if model.date_hierarchy.is_some() {
            let set: BTreeSet<i32> = rows.iter().filter_map(|row| row.date).map(|d| d.year()).collect();
            set.into_iter().rev().collect()
        } else {
            Vec::new()
        };

        let rows = match query.year {
            Some(year) => rows
                .into_iter()
                .filter(|row| row.date.is_some_and(|d| d.year() == year))
                .collect(),
            None => rows,
        };

        Ok(Self {
            model,
            rows,
            years,
            year: query.year,
            query,
        })
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

async fn usernames(db: &Database) -> Result<HashMap<UserId, String>> {
    Ok(db
        .users()
        .list(UserFilter::default())
        .await?
        .into_iter()
        .filter_map(|user| Some((user.id?, user.username)))
        .collect())
}

async fn user_rows(db: &Database, query: &ListQuery) -> Result<Vec<Row>> {
    let filter = UserFilter {
        is_staff: query.get("is_staff"),
        is_subscribed: query.get("is_subscribed"),
    };
    let users = db.users().list(filter).await?;

    Ok(users
        .into_iter()
        .map(|user| Row {
            cells: vec![
                user.username,
                user.email_address,
                yes_no(user.is_staff),
                yes_no(user.is_subscribed),
                timestamp(user.date_joined),
            ],
            date: None,
        })
        .collect())
}

async fn address_rows(db: &Database, query: &ListQuery) -> Result<Vec<Row>> {
    let filter = AddressFilter {
        is_active: query.get("is_active"),
        is_whitelist_enabled: query.get("is_whitelist_enabled"),
        user_id: None,
    };
    let addresses = db.addresses().list(filter).await?;
    let names = usernames(db).await?;

    Ok(addresses
        .into_iter()
        .map(|address| Row {
            cells: vec![
                address
                    .user_id
                    .and_then(|id| names.get(&id).cloned())
                    .unwrap_or_else(|| "-".to_string()),
                address.address,
                yes_no(address.is_active),
                address.email_quota.to_string(),
                address.storage_quota.to_string(),
                timestamp(address.last_renewal_time),
                address.storage_backend.display_name().to_string(),
                address.storage_path,
                yes_no(address.is_whitelist_enabled),
                timestamp(address.creation_time),
            ],
            date: Some(address.creation_time),
        })
        .collect())
}

async fn mail_rows(db: &Database, query: &ListQuery) -> Result<Vec<Row>> {
    let filter = MailFilter {
        status: query.get("status").map(MailStatus::from_flag),
        ..MailFilter::default()
    };
    let mails = db.mail().list(filter).await?;
    let names = usernames(db).await?;
    let addresses: HashMap<_, _> = db
        .addresses()
        .list(AddressFilter::default())
        .await?
        .into_iter()
        .filter_map(|a| Some((a.id?, a.address)))
        .collect();

    Ok(mails
        .into_iter()
        .map(|mail| Row {
            cells: vec![
                names.get(&mail.user_id).cloned().unwrap_or_else(|| "-".to_string()),
                addresses
                    .get(&mail.address_id)
                    .cloned()
                    .unwrap_or_else(|| "-".to_string()),
                mail.message_id.unwrap_or_else(|| "-".to_string()),
                mail.num_attachments.to_string(),
                mail.total_size.to_string(),
                mail.status.as_str().to_string(),
                timestamp(mail.creation_time),
            ],
            date: None,
        })
        .collect())
}

async fn alias_rows(db: &Database, query: &ListQuery) -> Result<Vec<Row>> {
    let aliases = db.aliases().list(query.get("is_active")).await?;

    Ok(aliases
        .into_iter()
        .map(|alias| Row {
            cells: vec![alias.alias, alias.dest, yes_no(alias.is_active)],
            date: None,
        })
        .collect())
}

async fn launch_rows(db: &Database) -> Result<Vec<Row>> {
    let signups = db.mailing_list().list().await?;

    Ok(signups
        .into_iter()
        .map(|signup| Row {
            cells: vec![signup.email_address, timestamp(signup.creation_time)],
            date: Some(signup.creation_time),
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vaulty_core::{Alias, User};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_registry_columns() {
        let address = find("address").unwrap();
        assert_eq!(address.list_display.len(), 10);
        assert_eq!(address.list_filter, &["is_active", "is_whitelist_enabled"]);
        assert_eq!(find("launchmailinglist").unwrap().date_hierarchy, Some("creation_time"));
        assert!(find("attachment").is_none());
    }

    #[test]
    fn test_query_ignores_unknown_fields() {
        let alias = find("alias").unwrap();
        let query = ListQuery::parse(
            alias,
            &params(&[("is_active", "0"), ("dest", "x"), ("year", "2024")]),
        );
        assert_eq!(query.filters, vec![("is_active", false)]);
        assert_eq!(query.year, None);

        let query = ListQuery::parse(alias, &params(&[("is_active", "maybe")]));
        assert!(query.filters.is_empty());
    }

    #[tokio::test]
    async fn test_alias_listing_filtered() {
        let db = Database::in_memory().await.unwrap();
        let aliases = db.aliases();
        let mut kept = Alias::new("sales@vaulty.net", "owner@example.com");
        aliases.save(&mut kept).await.unwrap();
        let mut dropped = Alias::new("old@vaulty.net", "owner@example.com");
        aliases.save(&mut dropped).await.unwrap();
        aliases.set_active(dropped.id.unwrap(), false).await.unwrap();

        let model = find("alias").unwrap();
        let all = ChangeList::load(&db, model, ListQuery::default()).await.unwrap();
        assert_eq!(all.rows.len(), 2);

        let query = ListQuery::parse(model, &params(&[("is_active", "1")]));
        let active = ChangeList::load(&db, model, query).await.unwrap();
        assert_eq!(active.rows.len(), 1);
        assert_eq!(active.rows[0].cells, vec!["sales@vaulty.net", "owner@example.com", "yes"]);
        assert_eq!(active.filter_value("is_active"), Some(true));
    }

    #[tokio::test]
    async fn test_launch_list_years() {
        let db = Database::in_memory().await.unwrap();
        db.mailing_list().add("a@example.com").await.unwrap();
        let this_year = Utc::now().year();

        let model = find("launchmailinglist").unwrap();
        let list = ChangeList::load(&db, model, ListQuery::default()).await.unwrap();
        assert_eq!(list.years, vec![this_year]);

        let query = ListQuery::parse(model, &params(&[("year", "1999")]));
        let list = ChangeList::load(&db, model, query).await.unwrap();
        assert!(list.rows.is_empty());
    }

    #[tokio::test]
    async fn test_user_listing_filter() {
        let db = Database::in_memory().await.unwrap();
        let mut staff = User::with_email("staff@vaulty.net");
        staff.is_staff = true;
        db.users().save(&mut staff).await.unwrap();
        db.users().save(&mut User::with_email("user@example.com")).await.unwrap();

        let model = find("user").unwrap();
        let query = ListQuery::parse(model, &params(&[("is_staff", "1")]));
        let list = ChangeList::load(&db, model, query).await.unwrap();
        assert_eq!(list.rows.len(), 1);
        assert_eq!(list.rows[0].cells[0], "staff@vaulty.net");
    }
}
