use std::f64::consts::PI;

use crate::{
    error::MapError,
    labels::type_label,
    model::{Coordinates, Poi},
};

use super::sanitize;

/// Center of Vietnam, shown before the first search.
pub const VIETNAM_CENTER: Coordinates = Coordinates::new(16.0544, 108.0717);
pub const DEFAULT_ZOOM: u8 = 6;
pub const FOCUS_ZOOM: u8 = 14;
pub const FIT_PADDING_PX: u32 = 50;

pub const TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";

const NO_ADDRESS: &str = "Không có thông tin";

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPopup {
    pub title: String,
    pub type_label: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinates,
    pub popup: MarkerPopup,
}

/// Smallest box containing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = Coordinates>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;

        Some(points.fold(
            Self {
                south_west: first,
                north_east: first,
            },
            |b, p| Self {
                south_west: Coordinates::new(
                    b.south_west.lat.min(p.lat),
                    b.south_west.lon.min(p.lon),
                ),
                north_east: Coordinates::new(
                    b.north_east.lat.max(p.lat),
                    b.north_east.lon.max(p.lon),
                ),
            },
        ))
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lon..=self.north_east.lon).contains(&point.lon)
    }
}

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn containing(point: Coordinates, zoom: u8) -> Self {
        let n = f64::from(1u32 << zoom);
        let lat = point.lat.to_radians();
        let x = ((point.lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n).floor();
        let max = n - 1.0;

        Self {
            z: zoom,
            x: x.clamp(0.0, max) as u32,
            y: y.clamp(0.0, max) as u32,
        }
    }

    pub fn url(&self) -> String {
        TILE_URL_TEMPLATE
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// The map widget state: center, zoom, markers and the fitted viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    center: Coordinates,
    zoom: u8,
    markers: Vec<Marker>,
    viewport: Option<Bounds>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: VIETNAM_CENTER,
            zoom: DEFAULT_ZOOM,
            markers: Vec::new(),
            viewport: None,
        }
    }
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Bounds of all markers; the front-end pads them by [`FIT_PADDING_PX`].
    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    /// Replace the markers and recenter on `center`.
    ///
    /// Leaves the map untouched if any coordinate is unusable.
    pub fn update(&mut self, center: Coordinates, pois: &[Poi]) -> Result<(), MapError> {
        let invalid = std::iter::once(center)
            .chain(pois.iter().map(Poi::position))
            .find(|c| !c.is_valid());
        if let Some(c) = invalid {
            return Err(MapError::InvalidCoordinates {
                lat: c.lat,
                lon: c.lon,
            });
        }

        self.markers = pois
            .iter()
            .enumerate()
            .map(|(i, poi)| Marker {
                position: poi.position(),
                popup: MarkerPopup {
                    title: format!("{}. {}", i + 1, sanitize(&poi.name)),
                    type_label: sanitize(type_label(&poi.kind)),
                    address: poi
                        .address
                        .as_deref()
                        .filter(|a| !a.trim().is_empty())
                        .map(sanitize)
                        .unwrap_or_else(|| NO_ADDRESS.to_string()),
                },
            })
            .collect();

        self.center = center;
        self.zoom = FOCUS_ZOOM;
        self.viewport = Bounds::from_points(self.markers.iter().map(|m| m.position));

        Ok(())
    }

    pub fn center_tile(&self) -> TileId {
        TileId::containing(self.center, self.zoom)
    }

    /// Shareable openstreetmap.org link for the current view.
    pub fn osm_link(&self) -> String {
        let Coordinates { lat, lon } = self.center;
        format!(
            "https://www.openstreetmap.org/?mlat={lat:.5}&mlon={lon:.5}#map={}/{lat:.5}/{lon:.5}",
            self.zoom
        )
    }
}
