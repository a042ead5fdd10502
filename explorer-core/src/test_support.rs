//! Fakes and a one-shot HTTP responder shared by the unit tests.

use async_trait::async_trait;
use reqwest::Url;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

use crate::{
    auth::{AuthError, AuthErrorCode, ConsentPrompt, IdentityProvider},
    model::{
        ChatReply, Coordinates, CurrentWeather, ForecastItem, Language, Poi, TranslationResult,
        User, WeatherForecast,
    },
    remote::ExplorerApi,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Answer exactly one HTTP request with `status` and `body`.
///
/// The port stops listening once that request arrives, so later calls are
/// refused. Returns the base URL to call and a handle resolving to the raw
/// request.
pub(crate) async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        drop(listener);
        let request = read_request(&mut socket).await;

        let reason = match status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            _ => "Internal Server Error",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        let _ = socket.shutdown().await;

        request
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// A base URL nothing listens on.
pub(crate) async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Geocode(String),
    Pois(Coordinates, u32),
    CurrentWeather(Coordinates, String),
    Forecast(Coordinates),
    Translate(String, Language, Language),
    Chat(String, String),
}

/// Scripted [`ExplorerApi`] that records every call.
#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    pub coords: Option<Coordinates>,
    pub pois: Vec<Poi>,
    pub current: Option<CurrentWeather>,
    pub forecast: Option<WeatherForecast>,
    pub translated: Option<String>,
    pub reply: Option<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn translations(&self) -> Vec<(Language, Language)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Translate(_, source, target) => Some((source, target)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ExplorerApi for FakeApi {
    async fn geocode(&self, location: &str) -> Option<Coordinates> {
        self.record(Call::Geocode(location.to_string()));
        self.coords
    }

    async fn fetch_pois(&self, center: Coordinates, radius_m: u32) -> Vec<Poi> {
        self.record(Call::Pois(center, radius_m));
        self.pois.clone()
    }

    async fn current_weather(
        &self,
        center: Coordinates,
        city_name: &str,
    ) -> Option<CurrentWeather> {
        self.record(Call::CurrentWeather(center, city_name.to_string()));
        self.current.clone()
    }

    async fn weather_forecast(&self, center: Coordinates) -> Option<WeatherForecast> {
        self.record(Call::Forecast(center));
        self.forecast.clone()
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Option<TranslationResult> {
        self.record(Call::Translate(text.to_string(), source, target));
        self.translated.as_ref().map(|translated| TranslationResult {
            original_text: text.to_string(),
            translated_text: translated.clone(),
            source_language: source.code().to_string(),
            target_language: target.code().to_string(),
        })
    }

    async fn chat(&self, message: &str, session_id: &str) -> Option<ChatReply> {
        self.record(Call::Chat(message.to_string(), session_id.to_string()));
        self.reply.as_ref().map(|reply| ChatReply {
            reply: reply.clone(),
            session_id: session_id.to_string(),
            timestamp: "2024-05-01T10:00:00".to_string(),
        })
    }
}

pub(crate) fn hanoi() -> Coordinates {
    Coordinates::new(21.03, 105.85)
}

pub(crate) fn sample_pois(n: usize) -> Vec<Poi> {
    let kinds = ["museum", "attraction", "place_of_worship", "theatre", "viewpoint"];
    (0..n)
        .map(|i| {
            let mut tags = BTreeMap::new();
            tags.insert("tourism".to_string(), kinds[i % kinds.len()].to_string());
            Poi {
                id: format!("{}", 1000 + i),
                name: format!("Điểm {}", i + 1),
                kind: kinds[i % kinds.len()].to_string(),
                latitude: 21.02 + i as f64 * 0.005,
                longitude: 105.84 + i as f64 * 0.004,
                address: Some("Phố Quốc Tử Giám, Hà Nội".to_string()),
                tags: Some(tags),
            }
        })
        .collect()
}

pub(crate) fn sunny() -> CurrentWeather {
    CurrentWeather {
        temperature: 30.0,
        humidity: 70,
        wind_speed: 3.0,
        description: "nắng".to_string(),
        icon: "01d".to_string(),
        city_name: "Hà Nội".to_string(),
    }
}

pub(crate) fn short_forecast() -> WeatherForecast {
    let at = |h: u32| {
        chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .map(|n| n.and_utc())
            .expect("valid date")
    };
    WeatherForecast::new(vec![
        ForecastItem {
            date: at(12),
            temperature: 33.0,
            humidity: 0,
            wind_speed: 0.0,
            description: "nắng".to_string(),
            icon: "01d".to_string(),
        },
        ForecastItem {
            date: at(15),
            temperature: 31.0,
            humidity: 0,
            wind_speed: 0.0,
            description: "mây rải rác".to_string(),
            icon: "03d".to_string(),
        },
    ])
}

pub(crate) fn sample_user() -> User {
    User {
        uid: "uid-1".to_string(),
        email: Some("lan@example.com".to_string()),
        display_name: Some("Nguyễn Lan".to_string()),
        photo_url: None,
    }
}

/// Identity provider with scripted outcomes.
#[derive(Debug, Default)]
pub(crate) struct FakeIdentity {
    restored: Option<User>,
    sign_in_error: Option<AuthErrorCode>,
    sign_out_error: Option<AuthErrorCode>,
}

impl FakeIdentity {
    pub fn with_restored(user: User) -> Self {
        Self {
            restored: Some(user),
            ..Self::default()
        }
    }

    pub fn failing_sign_in(code: AuthErrorCode) -> Self {
        Self {
            sign_in_error: Some(code),
            ..Self::default()
        }
    }

    pub fn failing_sign_out(code: AuthErrorCode) -> Self {
        Self {
            sign_out_error: Some(code),
            ..Self::default()
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn restore(&self) -> Option<User> {
        self.restored.clone()
    }

    async fn sign_in_with_google(&self) -> Result<User, AuthError> {
        tokio::task::yield_now().await;
        match self.sign_in_error {
            Some(code) => Err(AuthError::new(code, "scripted failure")),
            None => Ok(sample_user()),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        tokio::task::yield_now().await;
        match self.sign_out_error {
            Some(code) => Err(AuthError::new(code, "scripted failure")),
            None => Ok(()),
        }
    }
}

/// Consent prompt that answers immediately.
#[derive(Debug)]
pub(crate) struct StaticPrompt(Result<String, AuthErrorCode>);

impl StaticPrompt {
    pub fn answer(text: &str) -> Self {
        Self(Ok(text.to_string()))
    }

    pub fn fail(code: AuthErrorCode) -> Self {
        Self(Err(code))
    }
}

#[async_trait]
impl ConsentPrompt for StaticPrompt {
    async fn request_consent(&self, _consent_url: &Url) -> Result<String, AuthError> {
        self.0
            .clone()
            .map_err(|code| AuthError::new(code, "scripted prompt failure"))
    }
}
