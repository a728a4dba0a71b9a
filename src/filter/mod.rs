use serde::Serialize;

use crate::validation::Validator;

/// Client-supplied paging and sorting parameters for a list endpoint,
/// together with the safelist of sort keys the resource permits.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub safelist: &'static [&'static str],
}

impl Filters {
    /// Parse raw query-string values into filters, collecting every problem
    /// (non-numeric values, out-of-range pages, unknown sort keys) into `v`.
    pub fn parse(
        v: &mut Validator,
        page: Option<String>,
        page_size: Option<String>,
        sort: Option<String>,
        default_sort: &str,
        safelist: &'static [&'static str],
    ) -> Self {
        let page = parse_i64(v, "page", page, 1);
        let page_size = parse_i64(v, "page_size", page_size, 20);
        let sort = sort.unwrap_or_else(|| default_sort.to_string());

        let filters = Self {
            page,
            page_size,
            sort,
            safelist,
        };
        filters.validate(v);
        filters
    }

    /// Check page and page_size bounds and that the sort key is safelisted.
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= 10_000, "page", "must be a maximum of 10,000");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(self.page_size <= 100, "page_size", "must be a maximum of 100");
        v.check(
            self.safelist.contains(&self.sort.as_str()),
            "sort",
            "invalid sort value",
        );
    }

    /// The bare column name for the requested sort, with the descending
    /// marker stripped. Must only be called after validation; an
    /// unvalidated key is a programming error and aborts loudly rather
    /// than silently reaching the query layer.
    pub fn sort_column(&self) -> &str {
        for safe in self.safelist {
            if self.sort == *safe {
                return self.sort.trim_start_matches('-');
            }
        }
        panic!("unsafe sort parameter: {}", self.sort);
    }

    /// Sort direction derived from the '-' prefix.
    pub fn sort_direction(&self) -> &'static str {
        if self.sort.starts_with('-') {
            "DESC"
        } else {
            "ASC"
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

fn parse_i64(v: &mut Validator, field: &str, value: Option<String>, default: i64) -> i64 {
    match value {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(n) => n,
            Err(_) => {
                v.add_error(field, "must be an integer value");
                default
            }
        },
    }
}

// --- Pagination metadata ---

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Derived, read-only paging metadata for a list response. Computed fresh
/// from the query's total count; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

impl Metadata {
    /// Calculate metadata for a page of results. When there are no records
    /// at all there is no page to describe, so the zero value is returned.
    pub fn calculate(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 {
            return Metadata::default();
        }
        Metadata {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFELIST: &[&str] = &["id", "title", "-id", "-title"];

    fn filters(page: i64, page_size: i64, sort: &str) -> Filters {
        Filters {
            page,
            page_size,
            sort: sort.to_string(),
            safelist: SAFELIST,
        }
    }

    #[test]
    fn validate_accepts_sane_filters() {
        let mut v = Validator::new();
        filters(1, 20, "id").validate(&mut v);
        assert!(v.is_valid());
    }

    #[test]
    fn validate_collects_every_violation() {
        let mut v = Validator::new();
        filters(0, 101, "rank").validate(&mut v);
        let err = v.into_result().unwrap_err();
        match err {
            crate::error::ApiError::ValidationFailed(errors) => {
                assert!(errors.contains_key("page"));
                assert!(errors.contains_key("page_size"));
                assert!(errors.contains_key("sort"));
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_page_beyond_cap() {
        let mut v = Validator::new();
        filters(10_001, 20, "id").validate(&mut v);
        assert!(!v.is_valid());
    }

    #[test]
    fn sort_column_strips_descending_marker() {
        let f = filters(1, 20, "-title");
        assert_eq!(f.sort_column(), "title");
        assert_eq!(f.sort_direction(), "DESC");

        let f = filters(1, 20, "id");
        assert_eq!(f.sort_column(), "id");
        assert_eq!(f.sort_direction(), "ASC");
    }

    #[test]
    #[should_panic(expected = "unsafe sort parameter")]
    fn sort_column_panics_on_unvalidated_key() {
        filters(1, 20, "rank; DROP TABLE officers").sort_column();
    }

    #[test]
    fn limit_and_offset() {
        let f = filters(3, 25, "id");
        assert_eq!(f.limit(), 25);
        assert_eq!(f.offset(), 50);
    }

    #[test]
    fn parse_collects_non_numeric_values() {
        let mut v = Validator::new();
        Filters::parse(
            &mut v,
            Some("abc".to_string()),
            Some("20".to_string()),
            None,
            "id",
            SAFELIST,
        );
        let err = v.into_result().unwrap_err();
        match err {
            crate::error::ApiError::ValidationFailed(errors) => {
                assert_eq!(errors["page"], "must be an integer value");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn metadata_empty_when_no_records() {
        assert_eq!(Metadata::calculate(0, 1, 20), Metadata::default());
    }

    #[test]
    fn metadata_rounds_last_page_up() {
        let m = Metadata::calculate(3, 2, 2);
        assert_eq!(m.current_page, 2);
        assert_eq!(m.page_size, 2);
        assert_eq!(m.first_page, 1);
        assert_eq!(m.last_page, 2);
        assert_eq!(m.total_records, 3);
    }

    #[test]
    fn metadata_exact_division() {
        let m = Metadata::calculate(40, 1, 20);
        assert_eq!(m.last_page, 2);
    }
}
