use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    config::Config,
    error::{RemoteError, truncate_body},
    model::{
        ChatReply, Coordinates, CurrentWeather, ForecastItem, Language, Poi, TranslationResult,
        WeatherForecast,
    },
};

use super::{ExplorerApi, MAX_POIS};

const GEOCODE: &str = "/api/geocode";
const POI: &str = "/api/poi";
const WEATHER_CURRENT: &str = "/api/weather/current";
const WEATHER_FORECAST: &str = "/api/weather/forecast";
const TRANSLATE: &str = "/api/translate";
const CHAT: &str = "/api/chat";

/// [`ExplorerApi`] over the explorer's HTTP backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.backend_url(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, route: &'static str, body: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, route);
        debug!("POST {url}");

        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| RemoteError::Transport { route, source })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|source| RemoteError::Transport { route, source })?;

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound { route });
        }

        if !status.is_success() {
            return Err(RemoteError::Status {
                route,
                status,
                body: truncate_body(&text),
            });
        }

        serde_json::from_str(&text).map_err(|source| RemoteError::Decode { route, source })
    }
}

/// Log a failed request and degrade it to `None`.
fn settle<T>(result: Result<T, RemoteError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(RemoteError::NotFound { route }) => {
            debug!("{route}: nothing found");
            None
        }
        Err(err) => {
            warn!("{:#}", anyhow::Error::new(err));
            None
        }
    }
}

#[derive(Debug, Serialize)]
struct GeocodeRequest<'a> {
    location: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct PoiRequest {
    lat: f64,
    lon: f64,
    radius: u32,
}

#[derive(Debug, Deserialize)]
struct PoiResponse {
    #[serde(default)]
    pois: Vec<Poi>,
}

#[derive(Debug, Serialize)]
struct CurrentWeatherRequest<'a> {
    lat: f64,
    lon: f64,
    city_name: &'a str,
}

#[derive(Debug, Serialize)]
struct ForecastRequest {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    time: String,
    temperature: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    wind_speed: f64,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: Vec<ForecastEntry>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'static str,
    target_lang: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// Forecast slots come as `YYYY-MM-DD HH:MM:SS` in UTC; RFC 3339 is accepted too.
fn parse_forecast_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

fn into_forecast(parsed: ForecastResponse) -> Result<WeatherForecast, RemoteError> {
    let items = parsed
        .forecast
        .into_iter()
        .map(|entry| {
            let date = parse_forecast_time(&entry.time).ok_or_else(|| RemoteError::Invalid {
                route: WEATHER_FORECAST,
                reason: format!("unrecognised forecast time '{}'", entry.time),
            })?;

            Ok(ForecastItem {
                date,
                temperature: entry.temperature,
                humidity: entry.humidity,
                wind_speed: entry.wind_speed,
                description: entry.description,
                icon: entry.icon,
            })
        })
        .collect::<Result<Vec<_>, RemoteError>>()?;

    Ok(WeatherForecast::new(items))
}

#[async_trait]
impl ExplorerApi for BackendClient {
    async fn geocode(&self, location: &str) -> Option<Coordinates> {
        let res: Option<GeocodeResponse> =
            settle(self.post(GEOCODE, &GeocodeRequest { location }).await);

        res.map(|r| Coordinates::new(r.lat, r.lon))
    }

    async fn fetch_pois(&self, center: Coordinates, radius_m: u32) -> Vec<Poi> {
        let request = PoiRequest {
            lat: center.lat,
            lon: center.lon,
            radius: radius_m,
        };

        let mut pois = settle(self.post::<_, PoiResponse>(POI, &request).await)
            .map(|r| r.pois)
            .unwrap_or_default();

        pois.truncate(MAX_POIS);
        pois
    }

    async fn current_weather(
        &self,
        center: Coordinates,
        city_name: &str,
    ) -> Option<CurrentWeather> {
        let request = CurrentWeatherRequest {
            lat: center.lat,
            lon: center.lon,
            city_name,
        };

        settle(self.post(WEATHER_CURRENT, &request).await)
    }

    async fn weather_forecast(&self, center: Coordinates) -> Option<WeatherForecast> {
        let request = ForecastRequest {
            lat: center.lat,
            lon: center.lon,
        };

        let res = self
            .post::<_, ForecastResponse>(WEATHER_FORECAST, &request)
            .await
            .and_then(into_forecast);

        settle(res)
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Option<TranslationResult> {
        if text.trim().is_empty() {
            return None;
        }

        let request = TranslateRequest {
            text,
            source_lang: source.code(),
            target_lang: target.code(),
        };

        settle(self.post(TRANSLATE, &request).await)
    }

    async fn chat(&self, message: &str, session_id: &str) -> Option<ChatReply> {
        if message.trim().is_empty() {
            return None;
        }

        settle(
            self.post(CHAT, &ChatRequest {
                message,
                session_id,
            })
            .await,
        )
    }
}
