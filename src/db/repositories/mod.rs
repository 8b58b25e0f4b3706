pub mod bug;
pub mod comment;
pub mod edit;
pub mod role;
pub mod user;

use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, IntoColumnRef, LikeExpr, SimpleExpr};
use sea_orm::{DbErr, Order, SqlErr};

use crate::domain::{ObjectId, SortOrder};

pub(crate) const fn order(order: SortOrder) -> Order {
    match order {
        SortOrder::Ascending => Order::Asc,
        SortOrder::Descending => Order::Desc,
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Case-folded form stored next to every searchable text column.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// `LIKE` pattern matching `keywords` literally anywhere in a folded column.
pub(crate) fn contains_pattern(keywords: &str) -> String {
    let mut pattern = String::with_capacity(keywords.len() + 2);
    pattern.push('%');
    for ch in fold(keywords).chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Substring match of a [`contains_pattern`] against a folded column.
pub(crate) fn folded_contains(column: impl IntoColumnRef, pattern: &str) -> SimpleExpr {
    Expr::col(column).like(LikeExpr::new(pattern).escape('\\'))
}

pub(crate) fn parse_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).with_context(|| format!("Stored identifier is corrupt: {raw:?}"))
}

pub(crate) fn parse_optional_id(raw: Option<String>) -> Result<Option<ObjectId>> {
    raw.as_deref().map(parse_id).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_patterns_escape_wildcards() {
        assert_eq!(contains_pattern("Crash"), "%crash%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("snake_case"), "%snake\\_case%");
        assert_eq!(contains_pattern("C:\\tmp"), "%c:\\\\tmp%");
    }

    #[test]
    fn folding_handles_non_ascii() {
        assert_eq!(fold("Émile"), "émile");
        assert_eq!(contains_pattern("ÉMILE"), "%émile%");
    }
}
