//! Search orchestration: geocode, then attractions, then the weather pair,
//! fanned out to the panels.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::{
    fmt::Debug,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    auth::AuthSession,
    model::{Coordinates, CurrentWeather, Poi, WeatherForecast},
    remote::{DEFAULT_POI_RADIUS_M, ExplorerApi},
    view::{
        AuthPanel, ChatPanel, MapView, Notice, PoiList, SearchBar, SearchEvent, TranslatePanel,
        WeatherPanel, require_text,
    },
};

const SEARCH_FAILED: &str = "Có lỗi xảy ra khi tìm kiếm. Vui lòng thử lại.";

/// Where the front-end shows effects that are not part of a panel.
pub trait Presenter: Send + Sync + Debug {
    /// Show or hide the global loading indicator.
    fn set_loading(&self, loading: bool);

    /// Show a message the user has to acknowledge.
    fn notify(&self, notice: &Notice);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Geocoding,
    FetchingData,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank input; nothing happened.
    Ignored,
    NotFound,
    NoPois,
    Rendered { poi_count: usize },
    /// A newer search started while this one was in flight.
    Superseded,
    Failed,
}

#[derive(Debug, Default)]
struct Progress {
    generation: AtomicU64,
    phase: Mutex<SearchPhase>,
}

impl Progress {
    fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn phase(&self) -> MutexGuard<'_, SearchPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Phase changes of superseded searches are dropped.
    fn enter(&self, generation: u64, phase: SearchPhase) {
        if self.current() == generation {
            debug!("search #{generation}: {phase:?}");
            *self.phase() = phase;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lookup {
    NotFound,
    NoPois,
    Found {
        center: Coordinates,
        pois: Vec<Poi>,
        current: Option<CurrentWeather>,
        forecast: Option<WeatherForecast>,
    },
}

/// Everything one search fetched, waiting to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    generation: u64,
    query: String,
    lookup: Lookup,
}

/// The remote half of a search. Owns what it needs, so the explorer stays
/// free for other input while it runs.
#[derive(Debug)]
pub struct SearchJob {
    generation: u64,
    query: String,
    radius_m: u32,
    api: Arc<dyn ExplorerApi>,
    progress: Arc<Progress>,
}

impl SearchJob {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub async fn run(self) -> SearchResult {
        let lookup = self.lookup().await;
        SearchResult {
            generation: self.generation,
            query: self.query,
            lookup,
        }
    }

    async fn lookup(&self) -> Lookup {
        let Some(center) = self.api.geocode(&self.query).await else {
            return Lookup::NotFound;
        };

        self.progress
            .enter(self.generation, SearchPhase::FetchingData);
        let pois = self.api.fetch_pois(center, self.radius_m).await;
        if pois.is_empty() {
            return Lookup::NoPois;
        }

        let (current, forecast) = tokio::join!(
            self.api.current_weather(center, &self.query),
            self.api.weather_forecast(center)
        );

        Lookup::Found {
            center,
            pois,
            current,
            forecast,
        }
    }
}

/// Owns every panel and sequences the search workflow.
#[derive(Debug)]
pub struct Explorer {
    api: Arc<dyn ExplorerApi>,
    presenter: Arc<dyn Presenter>,
    progress: Arc<Progress>,
    radius_m: u32,
    search_bar: SearchBar,
    map: MapView,
    pois: PoiList,
    weather: WeatherPanel,
    translate: TranslatePanel,
    chat: ChatPanel,
    auth: AuthPanel,
}

impl Explorer {
    pub fn new(
        api: Arc<dyn ExplorerApi>,
        session: Arc<AuthSession>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            translate: TranslatePanel::new(Arc::clone(&api)),
            chat: ChatPanel::new(Arc::clone(&api)),
            auth: AuthPanel::new(session),
            api,
            presenter,
            progress: Arc::default(),
            radius_m: DEFAULT_POI_RADIUS_M,
            search_bar: SearchBar::new(),
            map: MapView::new(),
            pois: PoiList::new(),
            weather: WeatherPanel::new(),
        }
    }

    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn phase(&self) -> SearchPhase {
        *self.progress.phase()
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn poi_list(&self) -> &PoiList {
        &self.pois
    }

    pub fn weather(&self) -> &WeatherPanel {
        &self.weather
    }

    pub fn search_bar(&self) -> &SearchBar {
        &self.search_bar
    }

    pub fn translate(&mut self) -> &mut TranslatePanel {
        &mut self.translate
    }

    pub fn chat(&mut self) -> &mut ChatPanel {
        &mut self.chat
    }

    pub fn auth(&self) -> &AuthPanel {
        &self.auth
    }

    /// Feed a search bar event; a submit starts a search.
    pub fn handle_search_event(&mut self, event: SearchEvent) -> Option<SearchJob> {
        let query = self.search_bar.handle(event)?;
        self.begin_search(&query)
    }

    /// Validate the input and show the indicator. Blank input does nothing.
    pub fn begin_search(&mut self, raw: &str) -> Option<SearchJob> {
        let query = require_text(raw).ok()?.to_string();
        let generation = self.progress.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!("search #{generation} for {query:?}");
        self.progress.enter(generation, SearchPhase::Geocoding);
        self.presenter.set_loading(true);

        Some(SearchJob {
            generation,
            query,
            radius_m: self.radius_m,
            api: Arc::clone(&self.api),
            progress: Arc::clone(&self.progress),
        })
    }

    /// Render a finished search, unless a newer one has started since.
    pub fn apply(&mut self, result: SearchResult) -> SearchOutcome {
        let SearchResult {
            generation,
            query,
            lookup,
        } = result;

        if generation != self.progress.current() {
            debug!("search #{generation} superseded, dropping its result");
            return SearchOutcome::Superseded;
        }

        let outcome = match lookup {
            Lookup::NotFound => {
                self.presenter.notify(&Notice::warning(format!(
                    "Không tìm thấy địa điểm \"{query}\". Vui lòng thử lại với tên khác."
                )));
                SearchOutcome::NotFound
            }
            Lookup::NoPois => {
                self.presenter.notify(&Notice::warning(format!(
                    "Không tìm thấy điểm tham quan nào gần \"{query}\". Vui lòng thử địa điểm khác."
                )));
                SearchOutcome::NoPois
            }
            Lookup::Found {
                center,
                pois,
                current,
                forecast,
            } => {
                self.progress.enter(generation, SearchPhase::Rendering);
                match self.render(center, &pois, current.as_ref(), forecast.as_ref()) {
                    Ok(poi_count) => SearchOutcome::Rendered { poi_count },
                    Err(err) => {
                        error!("search #{generation} for {query:?} failed: {err:#}");
                        self.presenter.notify(&Notice::error(SEARCH_FAILED));
                        SearchOutcome::Failed
                    }
                }
            }
        };

        self.progress.enter(generation, SearchPhase::Idle);
        self.presenter.set_loading(false);
        outcome
    }

    /// `begin_search`, `run` and `apply` in one go.
    pub async fn search(&mut self, raw: &str) -> SearchOutcome {
        match self.begin_search(raw) {
            Some(job) => {
                let result = job.run().await;
                self.apply(result)
            }
            None => SearchOutcome::Ignored,
        }
    }

    fn render(
        &mut self,
        center: Coordinates,
        pois: &[Poi],
        current: Option<&CurrentWeather>,
        forecast: Option<&WeatherForecast>,
    ) -> Result<usize> {
        self.map
            .update(center, pois)
            .context("failed to place search results on the map")?;
        self.pois.update(pois);
        self.weather.update(current, forecast);
        Ok(pois.len())
    }
}
