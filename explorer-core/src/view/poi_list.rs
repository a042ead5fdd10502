use crate::{labels::type_label, model::Poi};

use super::sanitize;

pub const NO_RESULTS: &str = "Không tìm thấy điểm tham quan nào.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub label: String,
    pub url: String,
}

/// One rendered attraction, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoiCard {
    pub index: usize,
    pub title: String,
    pub type_label: String,
    pub coordinates: String,
    pub address: Option<String>,
    pub link: Option<ExternalLink>,
}

impl PoiCard {
    pub fn new(poi: &Poi, index: usize) -> Self {
        Self {
            index,
            title: format!("{index}. {}", sanitize(&poi.name)),
            type_label: type_label(&poi.kind).to_string(),
            coordinates: format!("{:.6}, {:.6}", poi.latitude, poi.longitude),
            address: poi
                .address
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .map(sanitize),
            link: reference_link(poi),
        }
    }
}

/// Wikipedia article from the `wikipedia` tag (`lang:Title`), else the `website` tag.
fn reference_link(poi: &Poi) -> Option<ExternalLink> {
    if let Some(article) = poi.tag("wikipedia").filter(|v| !v.trim().is_empty()) {
        let (lang, title) = match article.split_once(':') {
            Some((lang, title)) if !lang.is_empty() && !lang.contains(' ') => (lang, title),
            _ => ("vi", article),
        };

        return Some(ExternalLink {
            label: "📖 Wikipedia".to_string(),
            url: format!(
                "https://{lang}.wikipedia.org/wiki/{}",
                title.trim().replace(' ', "_")
            ),
        });
    }

    poi.tag("website")
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
        .map(|url| ExternalLink {
            label: "🌐 Website".to_string(),
            url: url.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiListView<'a> {
    /// Nothing searched yet.
    Blank,
    Empty { message: &'static str },
    Results { header: &'a str, cards: &'a [PoiCard] },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoiList {
    rendered: bool,
    header: String,
    cards: Vec<PoiCard>,
}

impl PoiList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, pois: &[Poi]) {
        self.rendered = true;
        self.cards = pois
            .iter()
            .enumerate()
            .map(|(i, poi)| PoiCard::new(poi, i + 1))
            .collect();
        self.header = format!("Tìm thấy {} điểm tham quan:", self.cards.len());
    }

    pub fn view(&self) -> PoiListView<'_> {
        if !self.rendered {
            PoiListView::Blank
        } else if self.cards.is_empty() {
            PoiListView::Empty {
                message: NO_RESULTS,
            }
        } else {
            PoiListView::Results {
                header: &self.header,
                cards: &self.cards,
            }
        }
    }
}
