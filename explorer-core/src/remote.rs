use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    lang,
    model::{
        ChatReply, Coordinates, CurrentWeather, Language, Poi, TranslationResult, WeatherForecast,
    },
};

pub mod backend;

pub use backend::BackendClient;

/// Search radius around the geocoded center, in meters.
pub const DEFAULT_POI_RADIUS_M: u32 = 2000;

/// Upper bound on the attractions returned by a single search.
pub const MAX_POIS: usize = 5;

/// Request/response access to the explorer backend.
///
/// Every method issues at most one request and never fails: a missing,
/// rejected or undecodable response is logged and reported as `None` (or an
/// empty list).
#[async_trait]
pub trait ExplorerApi: Send + Sync + Debug {
    async fn geocode(&self, location: &str) -> Option<Coordinates>;

    /// At most [`MAX_POIS`] attractions within `radius_m` of `center`.
    async fn fetch_pois(&self, center: Coordinates, radius_m: u32) -> Vec<Poi>;

    async fn current_weather(&self, center: Coordinates, city_name: &str)
    -> Option<CurrentWeather>;

    async fn weather_forecast(&self, center: Coordinates) -> Option<WeatherForecast>;

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Option<TranslationResult>;

    async fn chat(&self, message: &str, session_id: &str) -> Option<ChatReply>;
}

/// Translate `text`, picking the direction from its script.
pub async fn auto_translate(api: &dyn ExplorerApi, text: &str) -> Option<TranslationResult> {
    let (source, target) = lang::detect_direction(text);
    api.translate(text, source, target).await
}
