use std::fmt;

use crate::normalize::normalize;

pub(crate) const MIN_WEIGHT: u8 = 1;
pub(crate) const MAX_WEIGHT: u8 = 5;
/// Star rating shown for a category the first time it is displayed.
pub(crate) const DEFAULT_WEIGHT: u8 = 3;
/// Weight used by the dropdown variant, which has no per-item rating.
pub(crate) const FIXED_WEIGHT: u8 = 2;

/// Importance of a selected interest, always within `MIN_WEIGHT..=MAX_WEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Weight(u8);

impl Weight {
    /// Builds a weight, clamping out-of-range input instead of rejecting it.
    pub(crate) fn clamped(value: i64) -> Self {
        let value = value.clamp(i64::from(MIN_WEIGHT), i64::from(MAX_WEIGHT));
        Weight(u8::try_from(value).unwrap_or(MAX_WEIGHT))
    }

    pub(crate) fn get(self) -> u8 {
        self.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight(DEFAULT_WEIGHT)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the weight of a selected interest comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum RatingSource {
    /// Each category carries its own rating, set by the user.
    #[default]
    Explicit,
    /// Every selected category is sent with the same constant weight.
    Fixed(Weight),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Interest {
    label: String,
    key: String,
    selected: bool,
    weight: Weight,
}

impl Interest {
    /// Display label, with its original casing and accents.
    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn is_selected(&self) -> bool {
        self.selected
    }

    /// The stored rating. Persists across toggles.
    pub(crate) fn weight(&self) -> Weight {
        self.weight
    }
}

/// The categories offered to the user, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct InterestModel {
    rating: RatingSource,
    default_weight: Weight,
    interests: Vec<Interest>,
}

impl InterestModel {
    pub(crate) fn new(rating: RatingSource, default_weight: Weight) -> Self {
        Self {
            rating,
            default_weight,
            interests: Vec::new(),
        }
    }

    /// Appends categories, skipping blank labels and labels already present.
    ///
    /// Returns the number of categories added.
    pub(crate) fn load<I, S>(&mut self, categories: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.interests.len();
        for label in categories {
            let label = label.into();
            let key = normalize(&label);
            if key.is_empty() || self.position(&label).is_some() {
                continue;
            }
            self.interests.push(Interest {
                label,
                key,
                selected: false,
                weight: self.default_weight,
            });
        }
        self.interests.len() - before
    }

    /// Flips the selection of `label`. Returns `false` if it is unknown.
    pub(crate) fn toggle(&mut self, label: &str) -> bool {
        match self.position(label) {
            Some(idx) => {
                let interest = &mut self.interests[idx];
                interest.selected = !interest.selected;
                true
            }
            None => false,
        }
    }

    /// Sets the rating of `label`, clamped into range. Returns `false` if it
    /// is unknown.
    pub(crate) fn set_weight(&mut self, label: &str, value: i64) -> bool {
        match self.position(label) {
            Some(idx) => {
                self.interests[idx].weight = Weight::clamped(value);
                true
            }
            None => false,
        }
    }

    /// Finds the label matching `input`, either verbatim or by normalized key.
    pub(crate) fn resolve(&self, input: &str) -> Option<&str> {
        if let Some(idx) = self.position(input) {
            return Some(&self.interests[idx].label);
        }
        let key = normalize(input);
        self.interests
            .iter()
            .find(|i| i.key == key)
            .map(|i| i.label.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Interest> {
        self.interests.iter()
    }

    pub(crate) fn rating(&self) -> RatingSource {
        self.rating
    }

    /// The weight that would be sent for `interest` under the rating source.
    pub(crate) fn effective_weight(&self, interest: &Interest) -> Weight {
        match self.rating {
            RatingSource::Explicit => interest.weight,
            RatingSource::Fixed(weight) => weight,
        }
    }

    pub(crate) fn has_selection(&self) -> bool {
        self.interests.iter().any(|i| i.selected)
    }

    /// `key:weight` tokens for the selected categories, in display order.
    pub(crate) fn serialize(&self) -> Vec<String> {
        self.interests
            .iter()
            .filter(|i| i.selected)
            .map(|i| format!("{}:{}", i.key, self.effective_weight(i)))
            .collect()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.interests.iter().position(|i| i.label == label)
    }
}
