use chrono::NaiveDate;

use crate::outbound::{CityAggregate, EventRecord};

pub(crate) const MAX_EVENTS: usize = 60;
pub(crate) const MAX_CITIES: usize = 8;
const DESCRIPTION_LIMIT: usize = 180;
const VIEWPORT_PADDING: f64 = 0.15;

pub(crate) const NOT_AVAILABLE: &str = "N/A";
pub(crate) const UNTITLED: &str = "Untitled";
pub(crate) const NO_DESCRIPTION: &str = "No description.";
const NO_LINK: &str = "#";

/// How many records each panel shows. Applied when rendering, never sent to
/// the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DisplayLimits {
    pub(crate) events: usize,
    pub(crate) cities: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            events: MAX_EVENTS,
            cities: MAX_CITIES,
        }
    }
}

/// Surface for the event list and its map layer.
pub(crate) trait ResultRenderer: Send + 'static {
    fn show_loading(&mut self);
    fn show_events(&mut self, view: &EventView);
    /// The search succeeded but matched nothing.
    fn show_no_events(&mut self);
    /// The search could not be completed.
    fn show_unavailable(&mut self);
}

/// Surface for the city shortlist.
pub(crate) trait CityPanelRenderer: Send + 'static {
    fn show_loading(&mut self);
    fn show_cities(&mut self, chips: &[CityChip]);
    /// Failure and empty result look the same on this panel.
    fn show_no_data(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EventCard {
    pub(crate) date: String,
    pub(crate) city: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) category: Option<String>,
    pub(crate) link: String,
}

impl From<&EventRecord> for EventCard {
    fn from(record: &EventRecord) -> Self {
        Self {
            date: record
                .start_date_time
                .as_deref()
                .and_then(display_date)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            city: record
                .city
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            title: record.name.clone().unwrap_or_else(|| UNTITLED.to_string()),
            description: record
                .description
                .as_deref()
                .map_or_else(|| NO_DESCRIPTION.to_string(), excerpt),
            category: record.category.clone(),
            link: record.link.clone().unwrap_or_else(|| NO_LINK.to_string()),
        }
    }
}

/// `dd/mm/yyyy` for anything starting with an ISO calendar date.
fn display_date(raw: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
    Some(date.format("%d/%m/%Y").to_string())
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_LIMIT {
        let mut short: String = text.chars().take(DESCRIPTION_LIMIT).collect();
        short.push('…');
        short
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapMarker {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
    pub(crate) popup: String,
}

impl MapMarker {
    /// `None` unless the record has both coordinates. A zero coordinate
    /// counts as missing; the backend writes 0 for unknown positions.
    pub(crate) fn from_record(record: &EventRecord) -> Option<Self> {
        let lat = record.lat.filter(|v| *v != 0.0)?;
        let lon = record.lon.filter(|v| *v != 0.0)?;
        let popup = [
            record.name.as_deref(),
            record.city.as_deref(),
            record.category.as_deref(),
        ]
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("\n");
        Some(Self { lat, lon, popup })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) south: f64,
    pub(crate) west: f64,
    pub(crate) north: f64,
    pub(crate) east: f64,
}

impl Bounds {
    pub(crate) fn around(markers: &[MapMarker]) -> Option<Self> {
        let first = markers.first()?;
        let init = Self {
            south: first.lat,
            west: first.lon,
            north: first.lat,
            east: first.lon,
        };
        Some(markers.iter().fold(init, |b, m| Self {
            south: b.south.min(m.lat),
            west: b.west.min(m.lon),
            north: b.north.max(m.lat),
            east: b.east.max(m.lon),
        }))
    }

    /// Grows each side by `ratio` of the span on that axis.
    pub(crate) fn pad(self, ratio: f64) -> Self {
        let lat = (self.north - self.south).abs() * ratio;
        let lon = (self.east - self.west).abs() * ratio;
        Self {
            south: self.south - lat,
            west: self.west - lon,
            north: self.north + lat,
            east: self.east + lon,
        }
    }
}

/// What the event panel and map layer display for one search.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EventView {
    pub(crate) cards: Vec<EventCard>,
    pub(crate) markers: Vec<MapMarker>,
    /// Viewport to fit, absent when no event could be placed on the map.
    pub(crate) viewport: Option<Bounds>,
}

impl EventView {
    pub(crate) fn build(events: &[EventRecord], limit: usize) -> Self {
        let shown = &events[..events.len().min(limit)];
        let cards = shown.iter().map(EventCard::from).collect();
        let markers: Vec<MapMarker> = shown.iter().filter_map(MapMarker::from_record).collect();
        let viewport = Bounds::around(&markers).map(|b| b.pad(VIEWPORT_PADDING));
        Self {
            cards,
            markers,
            viewport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CityChip {
    pub(crate) name: String,
    pub(crate) count: u64,
    /// Set on the chip of the currently selected city.
    pub(crate) active: bool,
}

/// Chips for the first `limit` named cities, in backend order.
pub(crate) fn city_chips(
    cities: &[CityAggregate],
    selected: Option<&str>,
    limit: usize,
) -> Vec<CityChip> {
    cities
        .iter()
        .filter_map(|c| {
            let name = c.city_name.clone()?;
            Some(CityChip {
                active: selected == Some(name.as_str()),
                name,
                count: c.matching_count,
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(i: usize) -> EventRecord {
        EventRecord {
            name: Some(format!("Event {i}")),
            city: Some("Lyon".to_string()),
            lat: Some(45.0 + i as f64 / 100.0),
            lon: Some(4.0 + i as f64 / 100.0),
            ..Default::default()
        }
    }

    fn city(name: &str, count: u64) -> CityAggregate {
        CityAggregate {
            city_name: Some(name.to_string()),
            matching_count: count,
        }
    }

    #[test]
    fn truncates_events() {
        let events: Vec<_> = (0..200).map(event).collect();
        let view = EventView::build(&events, MAX_EVENTS);
        assert_eq!(view.cards.len(), 60);
        assert_eq!(view.markers.len(), 60);
        assert_eq!(view.cards[59].title, "Event 59");
    }

    #[test]
    fn truncates_cities() {
        let cities: Vec<_> = (0..30).map(|i| city(&format!("City {i}"), 30 - i)).collect();
        let chips = city_chips(&cities, None, MAX_CITIES);
        assert_eq!(chips.len(), 8);
        assert_eq!(chips[0].name, "City 0");
        assert_eq!(chips[7].count, 23);
    }

    #[test]
    fn marks_selected_city() {
        let cities = [city("Paris", 5), city("Lyon", 3)];
        let chips = city_chips(&cities, Some("Lyon"), MAX_CITIES);
        assert!(!chips[0].active);
        assert!(chips[1].active);
    }

    #[test]
    fn skips_unnamed_cities() {
        let cities = [CityAggregate::default(), city("Nice", 1)];
        let chips = city_chips(&cities, None, MAX_CITIES);
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].name, "Nice");
    }

    #[test]
    fn card_fallbacks() {
        let card = EventCard::from(&EventRecord::default());
        assert_eq!(card.title, UNTITLED);
        assert_eq!(card.description, NO_DESCRIPTION);
        assert_eq!(card.date, NOT_AVAILABLE);
        assert_eq!(card.city, NOT_AVAILABLE);
        assert_eq!(card.link, "#");
        assert_eq!(card.category, None);
    }

    #[test]
    fn card_dates() {
        let mut record = EventRecord {
            start_date_time: Some("2024-07-14 21:30:00".to_string()),
            ..Default::default()
        };
        assert_eq!(EventCard::from(&record).date, "14/07/2024");
        record.start_date_time = Some("2024-07-14T21:30:00Z".to_string());
        assert_eq!(EventCard::from(&record).date, "14/07/2024");
        record.start_date_time = Some("NaT".to_string());
        assert_eq!(EventCard::from(&record).date, NOT_AVAILABLE);
    }

    #[test]
    fn long_description_is_cut() {
        let record = EventRecord {
            description: Some("é".repeat(200)),
            ..Default::default()
        };
        let card = EventCard::from(&record);
        assert_eq!(card.description.chars().count(), 181);
        assert!(card.description.ends_with('…'));

        let record = EventRecord {
            description: Some("Concert en plein air".to_string()),
            ..Default::default()
        };
        assert_eq!(EventCard::from(&record).description, "Concert en plein air");
    }

    #[test]
    fn events_without_coordinates_stay_off_the_map() {
        let mut no_lat = event(1);
        no_lat.lat = None;
        let mut zero = event(2);
        zero.lon = Some(0.0);
        let view = EventView::build(&[no_lat, zero], MAX_EVENTS);
        assert_eq!(view.cards.len(), 2);
        assert!(view.markers.is_empty());
        assert_eq!(view.viewport, None);
    }

    #[test]
    fn viewport_is_padded() {
        let records = [
            EventRecord {
                lat: Some(44.0),
                lon: Some(2.0),
                ..Default::default()
            },
            EventRecord {
                lat: Some(46.0),
                lon: Some(6.0),
                ..Default::default()
            },
        ];
        let view = EventView::build(&records, MAX_EVENTS);
        let bounds = view.viewport.unwrap();
        assert!((bounds.south - 43.7).abs() < 1e-9);
        assert!((bounds.north - 46.3).abs() < 1e-9);
        assert!((bounds.west - 1.4).abs() < 1e-9);
        assert!((bounds.east - 6.6).abs() < 1e-9);
    }

    #[test]
    fn popup_lists_name_city_category() {
        let mut record = event(0);
        record.category = Some("Jazz".to_string());
        let marker = MapMarker::from_record(&record).unwrap();
        assert_eq!(marker.popup, "Event 0\nLyon\nJazz");
    }
}
