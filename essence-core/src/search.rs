//! Catalog query builder.
//!
//! Turns loosely typed search parameters (query strings, JSON bodies) into a
//! [`CatalogQuery`]: a filter, a sort key and a pagination window that any
//! [`ProductRepository`](crate::repository::ProductRepository) can execute.

use std::cmp::Ordering;

use essence_catalog::{Product, SellType};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// A boolean that may arrive as `true` or as the string `"true"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlagParam {
    Bool(bool),
    Text(String),
}

impl FlagParam {
    pub fn is_set(&self) -> bool {
        match self {
            FlagParam::Bool(value) => *value,
            FlagParam::Text(value) => value == "true",
        }
    }
}

/// An integer that may arrive as a number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NumberParam {
    Int(i64),
    Text(String),
}

impl NumberParam {
    /// `Ok(None)` for blank text, an error for anything that is not an integer.
    fn value(&self, name: &str) -> CoreResult<Option<i64>> {
        match self {
            NumberParam::Int(value) => Ok(Some(*value)),
            NumberParam::Text(text) if text.trim().is_empty() => Ok(None),
            NumberParam::Text(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| CoreError::ValidationError(format!("{name} must be an integer, got '{text}'"))),
        }
    }
}

/// Raw catalog search parameters, as sent by a storefront client.
///
/// Privilege is not a parameter. It comes from the authenticated caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSearchParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub exclude_category: Option<String>,
    pub sell_type: Option<String>,
    pub exclusive: Option<FlagParam>,
    pub sort: Option<String>,
    pub page: Option<NumberParam>,
    pub limit: Option<NumberParam>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Exact, case-sensitive match
    Is(String),
    /// Anything but this category, compared case-insensitively
    IsNot(String),
}

/// Normalized product filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub include_deleted: bool,
    pub is_active: Option<bool>,
    pub is_exclusive: Option<bool>,
    /// Case-insensitive substring over name, description and category
    pub text: Option<String>,
    pub category: Option<CategoryFilter>,
    pub sell_type: Option<SellType>,
    pub slug: Option<String>,
}

impl ProductFilter {
    /// Every record that has not been soft-deleted.
    pub fn live() -> Self {
        Self::default()
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_deleted && product.is_deleted {
            return false;
        }
        if self.is_active.is_some_and(|active| product.is_active != active) {
            return false;
        }
        if self.is_exclusive.is_some_and(|exclusive| product.is_exclusive != exclusive) {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let hit = [&product.name, &product.description, &product.category]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        match &self.category {
            Some(CategoryFilter::Is(category)) if &product.category != category => return false,
            Some(CategoryFilter::IsNot(category))
                if product.category.to_lowercase() == category.to_lowercase() =>
            {
                return false
            }
            _ => {}
        }
        if self.sell_type.is_some() && product.sell_type != self.sell_type {
            return false;
        }
        if let Some(slug) = &self.slug {
            if &product.slug != slug {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    RetailPrice,
    Stock,
    Category,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "retailPrice" | "price" => Some(Self::RetailPrice),
            "stock" => Some(Self::Stock),
            "category" => Some(Self::Category),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Parses `"field:direction"`. A missing direction means ascending; an
    /// unknown field or direction yields the default (newest first).
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        let (field, direction) = match raw.split_once(':') {
            Some((field, direction)) => (field.trim(), Some(direction.trim())),
            None => (raw, None),
        };
        let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Self::default(),
        };
        match SortField::parse(field) {
            Some(field) => Self { field, direction },
            None => Self::default(),
        }
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::RetailPrice => a.retail_price.cmp(&b.retail_price),
            SortField::Stock => a.stock.cmp(&b.stock),
            SortField::Category => a.category.cmp(&b.category),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Page window. `limit == 0` means every matching record on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn unbounded() -> Self {
        Self { page: 1, limit: 0 }
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit == 0
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        if self.is_unbounded() {
            1
        } else {
            total.div_ceil(u64::from(self.limit))
        }
    }
}

/// A fully validated catalog query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filter: ProductFilter,
    pub sort: SortSpec,
    pub pagination: Pagination,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn bounded(name: &str, value: i64, min: i64) -> CoreResult<u32> {
    if value < min {
        return Err(CoreError::ValidationError(format!("{name} must be at least {min}, got {value}")));
    }
    u32::try_from(value).map_err(|_| CoreError::ValidationError(format!("{name} is too large: {value}")))
}

impl CatalogQuery {
    pub fn build(params: &CatalogSearchParams, privileged: bool) -> CoreResult<Self> {
        Self::build_with_page_size(params, privileged, DEFAULT_PAGE_SIZE)
    }

    pub fn build_with_page_size(
        params: &CatalogSearchParams,
        privileged: bool,
        default_limit: u32,
    ) -> CoreResult<Self> {
        let mut filter = ProductFilter::live();

        if !privileged {
            filter.is_active = Some(true);
        }

        if params.exclusive.as_ref().is_some_and(FlagParam::is_set) {
            filter.is_exclusive = Some(true);
        }

        filter.text = non_blank(&params.search);

        filter.category = match (non_blank(&params.category), non_blank(&params.exclude_category)) {
            (Some(category), _) => Some(CategoryFilter::Is(category)),
            (None, Some(excluded)) => Some(CategoryFilter::IsNot(excluded)),
            (None, None) => None,
        };

        filter.sell_type = params.sell_type.as_deref().and_then(SellType::parse);

        let page = match params.page.as_ref().map(|p| p.value("page")).transpose()?.flatten() {
            Some(page) => bounded("page", page, 1)?,
            None => 1,
        };
        let limit = match params.limit.as_ref().map(|l| l.value("limit")).transpose()?.flatten() {
            Some(limit) => bounded("limit", limit, 0)?,
            None => default_limit,
        };

        Ok(Self {
            filter,
            sort: SortSpec::parse(params.sort.as_deref()),
            pagination: Pagination { page, limit },
        })
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total_results: u64,
}
