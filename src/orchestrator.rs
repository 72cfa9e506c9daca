use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::Result;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    filters::{DateRange, SearchFilters},
    outbound::Backend,
    query,
    render::{city_chips, CityPanelRenderer, DisplayLimits, EventView, ResultRenderer},
};

/// Identifies one `search()` call. A fetch commits to its panel only while
/// its ticket is still the latest one issued.
#[derive(Clone)]
struct Ticket {
    latest: Arc<AtomicU64>,
    generation: u64,
}

impl Ticket {
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

/// The two fetches started by one search. Dropping it detaches them.
pub(crate) struct SearchRound {
    generation: u64,
    cities: JoinHandle<()>,
    events: JoinHandle<()>,
}

impl SearchRound {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits until both panels have handled their responses.
    pub(crate) async fn settled(self) {
        let (cities, events) = tokio::join!(self.cities, self.events);
        for result in [cities, events] {
            if let Err(error) = result {
                error!("Search task failed. {}", error);
            }
        }
    }
}

/// Coordinates the event search and the city aggregate for the current
/// filters.
///
/// Each `search()` serializes the filters once in both modes, then starts
/// both fetches. They resolve independently: a slow or failing city fetch
/// never holds back the event panel and vice versa. A response belonging to
/// an older search is discarded, so the latest issued search always wins.
pub(crate) struct SearchOrchestrator<B, R, C> {
    backend: Arc<B>,
    filters: SearchFilters,
    limits: DisplayLimits,
    latest: Arc<AtomicU64>,
    results: Arc<Mutex<R>>,
    cities: Arc<Mutex<C>>,
}

impl<B, R, C> SearchOrchestrator<B, R, C>
where
    B: Backend,
    R: ResultRenderer,
    C: CityPanelRenderer,
{
    pub(crate) fn new(
        backend: Arc<B>,
        filters: SearchFilters,
        limits: DisplayLimits,
        results: R,
        cities: C,
    ) -> Self {
        Self {
            backend,
            filters,
            limits,
            latest: Arc::new(AtomicU64::new(0)),
            results: Arc::new(Mutex::new(results)),
            cities: Arc::new(Mutex::new(cities)),
        }
    }

    pub(crate) fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    #[allow(unused)]
    pub(crate) fn results(&self) -> Arc<Mutex<R>> {
        self.results.clone()
    }

    pub(crate) fn city_panel(&self) -> Arc<Mutex<C>> {
        self.cities.clone()
    }

    /// Fetches the category list and appends it to the interests.
    pub(crate) async fn load_categories(&mut self) -> Result<usize> {
        let categories = self.backend.categories().await?;
        Ok(self.filters.interests.load(categories))
    }

    pub(crate) async fn search(&mut self) -> SearchRound {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = Ticket {
            latest: self.latest.clone(),
            generation,
        };
        let city_query = query::build(&self.filters, false);
        let event_query = query::build(&self.filters, true);
        let selected_city = self.filters.selected_city.clone();
        info!(generation, "Searching with {event_query}");

        self.cities.lock().await.show_loading();
        self.results.lock().await.show_loading();

        let cities = tokio::spawn(refresh_cities(
            self.backend.clone(),
            ticket.clone(),
            city_query,
            selected_city,
            self.cities.clone(),
            self.limits.cities,
        ));
        let events = tokio::spawn(refresh_events(
            self.backend.clone(),
            ticket,
            event_query,
            self.results.clone(),
            self.limits.events,
        ));

        SearchRound {
            generation,
            cities,
            events,
        }
    }

    pub(crate) async fn select_city(&mut self, city: impl Into<String>) -> SearchRound {
        let city = city.into();
        self.transition(|f| (f.apply_city_selection(city), ()));
        self.search().await
    }

    pub(crate) async fn change_text(&mut self, text: impl Into<String>) -> SearchRound {
        let text = text.into();
        self.transition(|f| (f.apply_text_change(text), ()));
        self.search().await
    }

    pub(crate) async fn change_dates(&mut self, range: DateRange) -> SearchRound {
        self.transition(|f| (f.apply_date_range(range), ()));
        self.search().await
    }

    /// `None` when `label` is not a known category; nothing is searched then.
    pub(crate) async fn toggle_interest(&mut self, label: &str) -> Option<SearchRound> {
        if self.transition(|f| f.apply_interest_toggle(label)) {
            Some(self.search().await)
        } else {
            None
        }
    }

    /// `None` when `label` is not a known category; nothing is searched then.
    pub(crate) async fn change_weight(&mut self, label: &str, weight: i64) -> Option<SearchRound> {
        if self.transition(|f| f.apply_weight_change(label, weight)) {
            Some(self.search().await)
        } else {
            None
        }
    }

    pub(crate) async fn toggle_sort(&mut self) -> SearchRound {
        self.transition(|f| (f.apply_sort_toggle(), ()));
        self.search().await
    }

    fn transition<T>(&mut self, apply: impl FnOnce(SearchFilters) -> (SearchFilters, T)) -> T {
        let (filters, out) = apply(std::mem::take(&mut self.filters));
        self.filters = filters;
        out
    }
}

async fn refresh_cities<B, C>(
    backend: Arc<B>,
    ticket: Ticket,
    query: String,
    selected_city: Option<String>,
    panel: Arc<Mutex<C>>,
    limit: usize,
) where
    B: Backend,
    C: CityPanelRenderer,
{
    let outcome = backend.cities(&query).await;
    let mut panel = panel.lock().await;
    if !ticket.is_current() {
        debug!(generation = ticket.generation, "Dropping stale city results");
        return;
    }
    match outcome {
        Ok(cities) => {
            let chips = city_chips(&cities, selected_city.as_deref(), limit);
            if chips.is_empty() {
                panel.show_no_data();
            } else {
                panel.show_cities(&chips);
            }
        }
        Err(error) => {
            warn!("Problem while fetching cities. {:#}", error);
            panel.show_no_data();
        }
    }
}

async fn refresh_events<B, R>(
    backend: Arc<B>,
    ticket: Ticket,
    query: String,
    panel: Arc<Mutex<R>>,
    limit: usize,
) where
    B: Backend,
    R: ResultRenderer,
{
    let outcome = backend.smart_search(&query).await;
    let mut panel = panel.lock().await;
    if !ticket.is_current() {
        debug!(generation = ticket.generation, "Dropping stale event results");
        return;
    }
    match outcome {
        Ok(events) if events.is_empty() => panel.show_no_events(),
        Ok(events) => panel.show_events(&EventView::build(&events, limit)),
        Err(error) => {
            warn!("Problem while fetching events. {:#}", error);
            panel.show_unavailable();
        }
    }
}
