//! Plain-text rendering of the panel views.

use explorer_core::{
    Presenter,
    model::ChatRole,
    view::{
        AuthView, ChatView, MapView, Notice, PoiList, PoiListView, WeatherPanel, WeatherView,
        chat, map, translate::TranslateView, weather,
    },
};

/// Loading indicator and notices on stderr, so stdout stays the results.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn set_loading(&self, loading: bool) {
        if loading {
            eprintln!("⏳ Đang tìm kiếm...");
        }
    }

    fn notify(&self, notice: &Notice) {
        print_notice(notice);
    }
}

pub fn print_notice(notice: &Notice) {
    eprintln!("{} {}", notice.level.icon(), notice.message);
}

pub fn print_map(view: &MapView) {
    let center = view.center();
    println!("🗺️  Bản đồ: {center} (zoom {})", view.zoom());
    println!("   Ô bản đồ: {}", view.center_tile().url());
    println!("   Xem trên OpenStreetMap: {}", view.osm_link());

    if let Some(bounds) = view.viewport() {
        println!(
            "   Khung nhìn: {} → {} (lề {} px)",
            bounds.south_west,
            bounds.north_east,
            map::FIT_PADDING_PX
        );
    }
    for marker in view.markers() {
        println!(
            "   📌 {} [{}] {}: {}",
            marker.popup.title, marker.popup.type_label, marker.position, marker.popup.address
        );
    }
    println!("   {}", map::ATTRIBUTION);
}

pub fn print_pois(list: &PoiList) {
    match list.view() {
        PoiListView::Blank => {}
        PoiListView::Empty { message } => println!("{message}"),
        PoiListView::Results { header, cards } => {
            println!("{header}");
            for card in cards {
                println!("\n{}", card.title);
                println!("   {}", card.type_label);
                println!("   📍 {}", card.coordinates);
                if let Some(address) = &card.address {
                    println!("   🏠 {address}");
                }
                if let Some(link) = &card.link {
                    println!("   {}: {}", link.label, link.url);
                }
            }
        }
    }
}

pub fn print_weather(panel: &WeatherPanel) {
    println!("{}", weather::TITLE);

    match panel.view() {
        WeatherView::Loaded { current, forecast } => {
            println!("   {}", current.city);
            println!("   🌡️  {}°C  {}", current.temperature, current.description);
            println!("   💧 Độ ẩm: {}", current.humidity);
            println!("   💨 Gió: {}", current.wind);
            println!("   {}", current.icon_url);

            if !forecast.is_empty() {
                println!("\n{}", weather::FORECAST_TITLE);
                for entry in forecast {
                    println!(
                        "   {} {}  {:>6}  {}",
                        entry.date, entry.time, entry.temperature, entry.description
                    );
                }
            }
        }
        other => {
            if let Some(message) = other.message() {
                println!("   {message}");
            }
        }
    }
}

pub fn print_translation(view: &TranslateView<'_>) {
    println!("🌐 {}", view.mode.label());
    if !view.target_text.is_empty() {
        println!("{}", view.target_text);
    }
    if !view.status.message.is_empty() {
        println!("{}", view.status.message);
    }
}

pub fn print_auth(view: &AuthView) {
    match view {
        AuthView::LoggedOut { label, .. } => {
            println!("Chưa đăng nhập. {label}: `vnexplorer login`");
        }
        AuthView::LoggedIn {
            avatar_url,
            name,
            email,
            ..
        } => {
            println!("👤 {name}");
            if !email.is_empty() {
                println!("   {email}");
            }
            println!("   {avatar_url}");
        }
    }
}

/// Print the chat entries after the first `skip`; returns how many exist.
pub fn print_chat(view: &ChatView, skip: usize) -> usize {
    if view.collapsed {
        println!("{} [{}]", chat::TITLE, view.toggle_label);
        return skip;
    }

    for entry in view.entries.iter().skip(skip) {
        let who = match entry.role {
            ChatRole::User => "🧑",
            ChatRole::Bot => "🤖",
        };
        println!("{who} {}  ({})", entry.content, entry.time);
    }
    view.entries.len()
}
