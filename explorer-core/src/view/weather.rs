use crate::model::{CurrentWeather, ForecastItem, WeatherForecast};

use super::{sanitize, vietnam_time};

pub const TITLE: &str = "🌤️ Thời Tiết";
pub const FORECAST_TITLE: &str = "📅 Dự Báo";
pub const PLACEHOLDER: &str = "Nhập địa điểm để xem thông tin thời tiết";
pub const LOAD_ERROR: &str = "Không thể tải thông tin thời tiết";

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{}@2x.png", icon_code(icon))
}

/// Icon codes look like `01d`; anything else is dropped.
fn icon_code(icon: &str) -> String {
    icon.chars().filter(char::is_ascii_alphanumeric).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentCard {
    pub city: String,
    pub icon_url: String,
    /// Degrees Celsius, without the unit.
    pub temperature: String,
    pub description: String,
    pub humidity: String,
    pub wind: String,
}

impl From<&CurrentWeather> for CurrentCard {
    fn from(w: &CurrentWeather) -> Self {
        Self {
            city: sanitize(&w.city_name),
            icon_url: icon_url(&w.icon),
            temperature: w.temperature.to_string(),
            description: sanitize(&w.description),
            humidity: format!("{}%", w.humidity),
            wind: format!("{} m/s", w.wind_speed),
        }
    }
}

/// One slot of the forecast strip, in Vietnam local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastEntry {
    pub date: String,
    pub time: String,
    pub icon_url: String,
    pub temperature: String,
    pub description: String,
}

impl From<&ForecastItem> for ForecastEntry {
    fn from(item: &ForecastItem) -> Self {
        let local = vietnam_time(item.date);
        Self {
            date: local.format("%d/%m").to_string(),
            time: local.format("%H:%M").to_string(),
            icon_url: icon_url(&item.icon),
            temperature: format!("{}°C", item.temperature),
            description: sanitize(&item.description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WeatherView {
    #[default]
    Placeholder,
    Error,
    Loaded {
        current: CurrentCard,
        forecast: Vec<ForecastEntry>,
    },
}

impl WeatherView {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            WeatherView::Placeholder => Some(PLACEHOLDER),
            WeatherView::Error => Some(LOAD_ERROR),
            WeatherView::Loaded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherPanel {
    view: WeatherView,
}

impl WeatherPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Without current weather the panel shows an error; the forecast strip is optional.
    pub fn update(&mut self, current: Option<&CurrentWeather>, forecast: Option<&WeatherForecast>) {
        self.view = match current {
            None => WeatherView::Error,
            Some(current) => WeatherView::Loaded {
                current: current.into(),
                forecast: forecast
                    .map(|f| f.items.iter().map(ForecastEntry::from).collect())
                    .unwrap_or_default(),
            },
        };
    }

    pub fn clear(&mut self) {
        self.view = WeatherView::Placeholder;
    }

    pub fn view(&self) -> &WeatherView {
        &self.view
    }
}
