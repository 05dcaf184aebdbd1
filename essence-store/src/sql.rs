//! Compiles catalog filters into parameterized PostgreSQL.
//!
//! Products live in a JSONB `doc` column; `slug`, `sku` and the timestamps are
//! mirrored into real columns for the unique indexes and for ordering. Every
//! user-supplied value goes through `push_bind`.

use essence_core::search::{CategoryFilter, Pagination, ProductFilter, SortDirection, SortField, SortSpec};
use sqlx::{Postgres, QueryBuilder};

/// Escapes `%`, `_` and `\` so the search text matches literally under ILIKE.
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Appends ` WHERE ...` for `filter`.
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");

    if !filter.include_deleted {
        qb.push(" AND (doc->>'isDeleted')::boolean = FALSE");
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND (doc->>'isActive')::boolean = ").push_bind(active);
    }
    if let Some(exclusive) = filter.is_exclusive {
        qb.push(" AND (doc->>'isExclusive')::boolean = ").push_bind(exclusive);
    }
    if let Some(text) = &filter.text {
        let pattern = like_pattern(text);
        qb.push(" AND (doc->>'name' ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR doc->>'description' ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR doc->>'category' ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    match &filter.category {
        Some(CategoryFilter::Is(category)) => {
            qb.push(" AND doc->>'category' = ").push_bind(category.clone());
        }
        Some(CategoryFilter::IsNot(category)) => {
            qb.push(" AND lower(doc->>'category') <> lower(").push_bind(category.clone()).push(")");
        }
        None => {}
    }
    if let Some(sell_type) = filter.sell_type {
        qb.push(" AND doc->>'sellType' = ").push_bind(sell_type.as_str());
    }
    if let Some(slug) = &filter.slug {
        qb.push(" AND slug = ").push_bind(slug.clone());
    }
}

fn sort_expression(field: SortField) -> &'static str {
    match field {
        SortField::Name => "doc->>'name'",
        SortField::RetailPrice => "(doc->>'retailPrice')::numeric",
        SortField::Stock => "(doc->>'stock')::bigint",
        SortField::Category => "doc->>'category'",
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
    }
}

/// Appends ` ORDER BY ...` and, unless unbounded, ` LIMIT ... OFFSET ...`.
pub fn push_order_and_page(qb: &mut QueryBuilder<'_, Postgres>, sort: &SortSpec, pagination: &Pagination) {
    let direction = match sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    qb.push(format!(" ORDER BY {} {}, id ASC", sort_expression(sort.field), direction));

    if !pagination.is_unbounded() {
        qb.push(" LIMIT ")
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX));
    }
}
