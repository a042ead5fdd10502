//! Core library for the `vnexplorer` Vietnam points-of-interest explorer.
//!
//! This crate defines:
//! - Configuration handling (backend URL, identity credentials)
//! - The remote access layer over the explorer backend
//! - The Google identity session
//! - Toolkit-agnostic view panels and the search orchestrator
//!
//! It is used by `explorer-cli`, but any front-end can drive the panels.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod labels;
pub mod lang;
pub mod model;
pub mod remote;
pub mod view;

#[cfg(test)]
mod test_support;

pub use app::{Explorer, Presenter, SearchOutcome, SearchPhase};
pub use auth::{AuthError, AuthErrorCode, AuthSession, ConsentPrompt, IdentityProvider};
pub use config::{Config, IdentityConfig};
pub use error::{MapError, RemoteError, ValidationError};
pub use model::{Coordinates, CurrentWeather, Language, Poi, User, WeatherForecast};
pub use remote::{BackendClient, ExplorerApi};
