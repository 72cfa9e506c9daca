use crate::interest::InterestModel;

/// Optional start and end calendar dates, kept exactly as entered.
///
/// No ordering is enforced here; the backend decides what `start > end` means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DateRange {
    pub(crate) start: Option<String>,
    pub(crate) end: Option<String>,
}

impl DateRange {
    /// Blank bounds are treated as absent.
    pub(crate) fn new(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: present(start),
            end: present(end),
        }
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Snapshot of everything that drives both search endpoints.
///
/// Every transition consumes the current value and returns the next one.
/// Changes to interests, text or dates drop the selected city, since a city
/// picked under the old filters may not match anything under the new ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SearchFilters {
    pub(crate) interests: InterestModel,
    pub(crate) free_text: String,
    pub(crate) date_range: DateRange,
    pub(crate) sort_by_date: bool,
    pub(crate) selected_city: Option<String>,
}

impl SearchFilters {
    pub(crate) fn new(interests: InterestModel) -> Self {
        Self {
            interests,
            ..Self::default()
        }
    }

    pub(crate) fn apply_city_selection(mut self, city: impl Into<String>) -> Self {
        self.selected_city = Some(city.into());
        self
    }

    pub(crate) fn apply_text_change(mut self, text: impl Into<String>) -> Self {
        self.free_text = text.into();
        self.selected_city = None;
        self
    }

    pub(crate) fn apply_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self.selected_city = None;
        self
    }

    /// Returns the filters and whether `label` named a known category.
    pub(crate) fn apply_interest_toggle(mut self, label: &str) -> (Self, bool) {
        let known = self.interests.toggle(label);
        if known {
            self.selected_city = None;
        }
        (self, known)
    }

    /// Returns the filters and whether `label` named a known category.
    pub(crate) fn apply_weight_change(mut self, label: &str, weight: i64) -> (Self, bool) {
        let known = self.interests.set_weight(label, weight);
        if known {
            self.selected_city = None;
        }
        (self, known)
    }

    pub(crate) fn apply_sort_toggle(mut self) -> Self {
        self.sort_by_date = !self.sort_by_date;
        self
    }
}
