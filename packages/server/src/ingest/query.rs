use sea_orm::Order;

use crate::entity::upload;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

/// Columns a file listing may be sorted by.
///
/// Sorting only ever goes through this enum, so the `sort` query parameter
/// can never reach the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    OriginalName,
    Size,
    Mime,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "created_at" => Some(Self::CreatedAt),
            "original_name" => Some(Self::OriginalName),
            "size" => Some(Self::Size),
            "mime" => Some(Self::Mime),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::OriginalName => "original_name",
            Self::Size => "size",
            Self::Mime => "mime",
        }
    }

    pub fn column(self) -> upload::Column {
        match self {
            Self::CreatedAt => upload::Column::CreatedAt,
            Self::OriginalName => upload::Column::OriginalName,
            Self::Size => upload::Column::Size,
            Self::Mime => upload::Column::Mime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if raw.trim().eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// Normalized paging, filtering, and sorting for a file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// 1-based page number.
    pub page: u64,
    pub per_page: u64,
    /// Trimmed search term; `None` when absent or blank.
    pub q: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl ListParams {
    /// Build parameters from raw query values. Out-of-range numbers are
    /// clamped and unknown sort fields or orders fall back to the defaults.
    pub fn from_raw(
        page: Option<u64>,
        per_page: Option<u64>,
        q: Option<&str>,
        sort: Option<&str>,
        order: Option<&str>,
    ) -> Self {
        Self {
            page: Ord::max(page.unwrap_or(1), 1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
            q: q.map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            sort: sort.and_then(SortField::parse).unwrap_or_default(),
            order: order.and_then(SortOrder::parse).unwrap_or_default(),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::from_raw(None, None, None, None, None)
    }
}
