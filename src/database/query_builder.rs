use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::api::PageWindow;
use crate::types::Role;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorySort {
    #[default]
    Name,
    BatchYear,
    Recent,
}

impl DirectorySort {
    fn order_by(&self) -> &'static str {
        match self {
            DirectorySort::Name => "u.name ASC, u.id ASC",
            DirectorySort::BatchYear => "u.batch_year DESC NULLS LAST, u.name ASC, u.id ASC",
            DirectorySort::Recent => "u.created_at DESC, u.id ASC",
        }
    }
}

/// Filters for listing users joined with their profiles.
/// Used by the directory, batchmates and the admin user list.
#[derive(Debug, Clone, Default)]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub field: Option<String>,
    pub batch_year: Option<i32>,
    pub role: Option<Role>,
    pub exclude_user: Option<Uuid>,
    pub verified_only: bool,
    pub include_inactive: bool,
    pub sort: DirectorySort,
}

const DIRECTORY_COLUMNS: &str = "SELECT u.id, u.name, u.role, u.field, u.batch_year, \
     p.headline, p.company, p.job_title, p.location, p.photo_key";

impl DirectoryQuery {
    fn push_from_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" FROM users u LEFT JOIN profiles p ON p.user_id = u.id WHERE TRUE");

        if !self.include_inactive {
            qb.push(" AND u.is_active");
        }
        if self.verified_only {
            qb.push(" AND u.role <> ").push_bind(Role::Unverified);
        }
        if let Some(role) = self.role {
            qb.push(" AND u.role = ").push_bind(role);
        }
        if let Some(field) = &self.field {
            qb.push(" AND u.field = ").push_bind(field.clone());
        }
        if let Some(year) = self.batch_year {
            qb.push(" AND u.batch_year = ").push_bind(year);
        }
        if let Some(user_id) = self.exclude_user {
            qb.push(" AND u.id <> ").push_bind(user_id);
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (u.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.company ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.job_title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.location ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    pub fn select(&self, window: PageWindow) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(DIRECTORY_COLUMNS);
        self.push_from_where(&mut qb);
        qb.push(" ORDER BY ").push(self.sort.order_by());
        qb.push(" LIMIT ").push_bind(window.limit());
        qb.push(" OFFSET ").push_bind(window.offset());
        qb
    }

    pub fn count(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        self.push_from_where(&mut qb);
        qb
    }
}

/// Escape LIKE metacharacters so user input matches literally
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> PageWindow {
        PageWindow { page: 2, per_page: 10 }
    }

    #[test]
    fn empty_query_only_filters_active() {
        let query = DirectoryQuery::default();
        let qb = query.select(window());
        let sql = qb.sql();
        assert!(sql.contains("WHERE TRUE AND u.is_active ORDER BY u.name ASC"));
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn filters_bind_in_order() {
        let query = DirectoryQuery {
            search: Some("acme".into()),
            field: Some("Physics".into()),
            batch_year: Some(2015),
            verified_only: true,
            sort: DirectorySort::BatchYear,
            ..Default::default()
        };
        let qb = query.select(window());
        let sql = qb.sql();
        assert!(sql.contains("u.role <> $1"));
        assert!(sql.contains("u.field = $2"));
        assert!(sql.contains("u.batch_year = $3"));
        assert!(sql.contains("u.name ILIKE $4"));
        assert!(sql.contains("p.location ILIKE $7)"));
        assert!(sql.contains("ORDER BY u.batch_year DESC NULLS LAST"));
        assert!(sql.ends_with("LIMIT $8 OFFSET $9"));
    }

    #[test]
    fn count_has_no_paging() {
        let query = DirectoryQuery {
            exclude_user: Some(Uuid::nil()),
            include_inactive: true,
            ..Default::default()
        };
        let qb = query.count();
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT COUNT(*) FROM users u"));
        assert!(!sql.contains("is_active"));
        assert!(sql.contains("u.id <> $1"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = DirectoryQuery { search: Some("   ".into()), ..Default::default() };
        assert!(!query.count().sql().contains("ILIKE"));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
