use std::{
    fmt::Write as _,
    io::{self, Write},
};

use tracing::warn;

use crate::{
    interest::{InterestModel, RatingSource, MAX_WEIGHT},
    render::{CityChip, CityPanelRenderer, EventView, ResultRenderer},
};

const LOADING: &str = "Loading…";
const NO_EVENTS: &str = "No events found.";
const UNAVAILABLE: &str = "Events are unavailable right now.";
const NO_DATA: &str = "-";

fn emit<W: Write>(out: &mut W, text: &str) {
    if let Err(error) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        warn!("Problem while writing to the terminal. {}", error);
    }
}

/// Event list and map summary written as plain text.
pub(crate) struct TerminalResults<W> {
    out: W,
}

impl<W> TerminalResults<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send + 'static> ResultRenderer for TerminalResults<W> {
    fn show_loading(&mut self) {
        emit(&mut self.out, &format!("[events] {LOADING}\n"));
    }

    fn show_events(&mut self, view: &EventView) {
        emit(&mut self.out, &format_events(view));
    }

    fn show_no_events(&mut self) {
        emit(&mut self.out, &format!("[events] {NO_EVENTS}\n"));
    }

    fn show_unavailable(&mut self) {
        emit(&mut self.out, &format!("[events] {UNAVAILABLE}\n"));
    }
}

fn format_events(view: &EventView) -> String {
    let mut text = format!("[events] {} shown\n", view.cards.len());
    for card in &view.cards {
        let _ = writeln!(text, "  {} | {} | {}", card.date, card.city, card.title);
        let _ = writeln!(text, "      {}", card.description);
        match &card.category {
            Some(category) => {
                let _ = writeln!(text, "      #{category}  {}", card.link);
            }
            None => {
                let _ = writeln!(text, "      {}", card.link);
            }
        }
    }
    match view.viewport {
        Some(b) => {
            let _ = writeln!(
                text,
                "[map] {} markers, viewport {:.4},{:.4} .. {:.4},{:.4}",
                view.markers.len(),
                b.south,
                b.west,
                b.north,
                b.east
            );
        }
        None => text.push_str("[map] no markers\n"),
    }
    text
}

/// City shortlist written as numbered chips. Remembers the chips last shown
/// so a city can be picked by its number.
pub(crate) struct TerminalCities<W> {
    out: W,
    shown: Vec<CityChip>,
}

impl<W> TerminalCities<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            shown: Vec::new(),
        }
    }

    /// The chip displayed at `number`, counting from 1.
    pub(crate) fn chip(&self, number: usize) -> Option<&CityChip> {
        self.shown.get(number.checked_sub(1)?)
    }
}

impl<W: Write + Send + 'static> CityPanelRenderer for TerminalCities<W> {
    fn show_loading(&mut self) {
        self.shown.clear();
        emit(&mut self.out, &format!("[cities] {LOADING}\n"));
    }

    fn show_cities(&mut self, chips: &[CityChip]) {
        self.shown = chips.to_vec();
        let line = chips
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let marker = if c.active { "*" } else { "" };
                format!("#{} {marker}{} ({})", i + 1, c.name, c.count)
            })
            .collect::<Vec<_>>()
            .join("  ");
        emit(&mut self.out, &format!("[cities] {line}\n"));
    }

    fn show_no_data(&mut self) {
        self.shown.clear();
        emit(&mut self.out, &format!("[cities] {NO_DATA}\n"));
    }
}

/// One line per category: selection box, label and its weight.
pub(crate) fn format_interests(model: &InterestModel) -> String {
    let mut text = String::new();
    for interest in model.iter() {
        let mark = if interest.is_selected() { "x" } else { " " };
        let weight = match model.rating() {
            RatingSource::Explicit => {
                let filled = usize::from(interest.weight().get());
                let empty = usize::from(MAX_WEIGHT) - filled;
                format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
            }
            RatingSource::Fixed(weight) => format!("weight {weight}"),
        };
        let _ = writeln!(text, "[{mark}] {}  {weight}", interest.label());
    }
    if text.is_empty() {
        text.push_str("No categories loaded.\n");
    }
    text
}

pub(crate) fn print(text: &str) {
    emit(&mut io::stdout(), text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interest::Weight,
        outbound::EventRecord,
        render::{EventView, MAX_EVENTS},
    };

    #[test]
    fn events_with_map_summary() {
        let records = [EventRecord {
            name: Some("Nuit du jazz".to_string()),
            city: Some("Lyon".to_string()),
            category: Some("Musique".to_string()),
            start_date_time: Some("2024-07-14 21:00:00".to_string()),
            lat: Some(45.75),
            lon: Some(4.85),
            ..Default::default()
        }];
        let mut panel = TerminalResults::new(Vec::new());
        panel.show_events(&EventView::build(&records, MAX_EVENTS));
        let text = String::from_utf8(panel.out).unwrap();
        assert!(text.contains("14/07/2024 | Lyon | Nuit du jazz"));
        assert!(text.contains("No description."));
        assert!(text.contains("#Musique  #"));
        assert!(text.contains("[map] 1 markers"));
    }

    #[test]
    fn empty_and_failure_messages_differ() {
        let mut panel = TerminalResults::new(Vec::new());
        panel.show_no_events();
        panel.show_unavailable();
        let text = String::from_utf8(panel.out).unwrap();
        assert!(text.contains(NO_EVENTS));
        assert!(text.contains(UNAVAILABLE));
        assert_ne!(NO_EVENTS, UNAVAILABLE);
    }

    #[test]
    fn numbered_city_chips() {
        let mut panel = TerminalCities::new(Vec::new());
        panel.show_cities(&[
            CityChip {
                name: "Paris".to_string(),
                count: 12,
                active: false,
            },
            CityChip {
                name: "Lyon".to_string(),
                count: 4,
                active: true,
            },
        ]);
        assert_eq!(panel.chip(2).map(|c| c.name.as_str()), Some("Lyon"));
        assert_eq!(panel.chip(0), None);
        assert_eq!(panel.chip(3), None);
        let text = String::from_utf8(panel.out.clone()).unwrap();
        assert_eq!(text, "[cities] #1 Paris (12)  #2 *Lyon (4)\n");

        panel.show_no_data();
        assert_eq!(panel.chip(1), None);
    }

    #[test]
    fn interest_lines() {
        let mut model = InterestModel::default();
        model.load(["Danse", "Théâtre"]);
        model.toggle("Théâtre");
        model.set_weight("Théâtre", 5);
        assert_eq!(
            format_interests(&model),
            "[ ] Danse  ★★★☆☆\n[x] Théâtre  ★★★★★\n"
        );

        let mut model =
            InterestModel::new(RatingSource::Fixed(Weight::clamped(2)), Weight::default());
        model.load(["Danse"]);
        assert_eq!(format_interests(&model), "[ ] Danse  weight 2\n");
        assert_eq!(
            format_interests(&InterestModel::default()),
            "No categories loaded.\n"
        );
    }
}
