use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::filters::SearchFilters;

/// Bytes left readable in a query value. `:` and `,` stay literal so the
/// `interests` list keeps its `key:weight,key:weight` shape.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':')
    .remove(b',');

/// Serializes `filters` into the canonical query string.
///
/// Parameters appear in a fixed order: `interests`, `q`, `start_date`,
/// `end_date`, `sort`, `city`. Only `q` is always present. `city` is written
/// only when `include_city` is set, so the city aggregate endpoint always
/// sees counts across every city.
pub(crate) fn build(filters: &SearchFilters, include_city: bool) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();

    if filters.interests.has_selection() {
        params.push(("interests", filters.interests.serialize().join(",")));
    }

    params.push(("q", filters.free_text.trim().to_string()));

    if let Some(start) = &filters.date_range.start {
        params.push(("start_date", start.clone()));
    }
    if let Some(end) = &filters.date_range.end {
        params.push(("end_date", end.clone()));
    }
    if filters.sort_by_date {
        params.push(("sort", "date".to_string()));
    }
    if include_city {
        if let Some(city) = &filters.selected_city {
            params.push(("city", city.clone()));
        }
    }

    params
        .iter()
        .map(|(name, value)| format!("{name}={}", utf8_percent_encode(value, QUERY_VALUE)))
        .collect::<Vec<_>>()
        .join("&")
}
