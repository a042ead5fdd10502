use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use explorer_core::{
    AuthSession, BackendClient, Config, Explorer, ExplorerApi, IdentityConfig, SearchOutcome,
    auth::{FirebaseIdentity, IdentityProvider, Unconfigured},
    config::DEFAULT_REDIRECT_URI,
    remote::DEFAULT_POI_RADIUS_M,
    view::{AuthPanel, ChatPanel, TranslateMode, TranslatePanel, chat::INPUT_PLACEHOLDER},
};
use inquire::{InquireError, Password, Select, Text};
use log::debug;
use std::{fmt, sync::Arc};

use crate::{consent::BrowserConsent, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "vnexplorer",
    version,
    about = "Khám phá điểm tham quan, thời tiết và hơn thế nữa ở Việt Nam"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the backend URL or the identity provider credentials.
    Configure {
        #[arg(value_enum)]
        target: ConfigureTarget,
    },

    /// Find attractions and weather around a place.
    Search {
        /// Place name, e.g. "Hà Nội" or "Hội An".
        location: String,

        /// Search radius in meters.
        #[arg(long, default_value_t = DEFAULT_POI_RADIUS_M)]
        radius: u32,
    },

    /// Translate between English and Vietnamese.
    Translate {
        text: String,

        #[arg(long, value_enum, default_value_t = ModeArg::EnVi)]
        mode: ModeArg,
    },

    /// Talk to the travel chatbot.
    Chat,

    /// Sign in with Google.
    Login,

    /// Sign out.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Interactive menu with every panel.
    Explore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigureTarget {
    Backend,
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    #[value(name = "en-vi")]
    EnVi,
    #[value(name = "vi-en")]
    ViEn,
    /// Pick the direction from the text itself.
    Auto,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure { target } => configure(config, target)?,
            Command::Search { location, radius } => {
                let mut explorer = explorer(&config).await?.with_radius(radius);
                if let SearchOutcome::Rendered { .. } = explorer.search(&location).await {
                    print_search(&explorer);
                }
            }
            Command::Translate { text, mode } => {
                let mut panel = TranslatePanel::new(backend(&config)?);
                translate(&mut panel, &text, mode).await;
            }
            Command::Chat => {
                let mut panel = ChatPanel::new(backend(&config)?);
                chat_loop(&mut panel).await?;
            }
            Command::Login => {
                let panel = AuthPanel::new(session(&config).await?);
                match panel.sign_in().await {
                    Some(notice) => render::print_notice(&notice),
                    None => render::print_auth(&panel.view()),
                }
            }
            Command::Logout => {
                let panel = AuthPanel::new(session(&config).await?);
                match panel.sign_out().await {
                    Some(notice) => render::print_notice(&notice),
                    None => println!("Đã đăng xuất."),
                }
            }
            Command::Whoami => {
                let panel = AuthPanel::new(session(&config).await?);
                render::print_auth(&panel.view());
            }
            Command::Explore => explore(&config).await?,
        }

        Ok(())
    }
}

fn backend(config: &Config) -> Result<Arc<dyn ExplorerApi>> {
    let client = BackendClient::from_config(config)?;
    debug!("using backend {}", client.base_url());
    Ok(Arc::new(client))
}

async fn session(config: &Config) -> Result<Arc<AuthSession>> {
    let provider: Arc<dyn IdentityProvider> = if config.identity.is_some() {
        Arc::new(FirebaseIdentity::from_config(config, Arc::new(BrowserConsent))?)
    } else {
        debug!("no identity configured, sign-in disabled");
        Arc::new(Unconfigured)
    };

    Ok(Arc::new(AuthSession::start(provider).await))
}

async fn explorer(config: &Config) -> Result<Explorer> {
    Ok(Explorer::new(
        backend(config)?,
        session(config).await?,
        Arc::new(render::TerminalPresenter),
    ))
}

fn print_search(explorer: &Explorer) {
    render::print_map(explorer.map());
    println!();
    render::print_pois(explorer.poi_list());
    println!();
    render::print_weather(explorer.weather());
}

async fn translate(panel: &mut TranslatePanel, text: &str, mode: ModeArg) {
    panel.set_source(text);

    match mode {
        ModeArg::EnVi => {
            panel.set_mode(TranslateMode::EnToVi);
            panel.translate().await;
        }
        ModeArg::ViEn => {
            panel.set_mode(TranslateMode::ViToEn);
            panel.translate().await;
        }
        ModeArg::Auto => panel.auto_translate().await,
    }

    render::print_translation(&panel.view());
}

/// Run a blocking inquire prompt off the async runtime.
/// `Ok(None)` means the user dismissed it.
async fn ask<T, F>(prompt: F) -> Result<Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
{
    match tokio::task::spawn_blocking(prompt).await? {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e).context("Prompt failed"),
    }
}

async fn chat_loop(panel: &mut ChatPanel) -> Result<()> {
    println!("💬 /clear xóa lịch sử, /toggle thu gọn, Esc để thoát.\n");
    let mut shown = render::print_chat(&panel.view(), 0);

    loop {
        let line = ask(|| {
            Text::new("Bạn:")
                .with_placeholder(INPUT_PLACEHOLDER)
                .prompt()
        })
        .await?;
        let Some(line) = line else { break };

        match line.trim() {
            "/clear" => {
                panel.clear_history();
                shown = render::print_chat(&panel.view(), 0);
            }
            "/toggle" => {
                panel.toggle();
                shown = render::print_chat(&panel.view(), shown);
            }
            _ => {
                panel.send(&line).await;
                shown = render::print_chat(&panel.view(), shown);
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Search,
    Translate,
    Chat,
    Account,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::Search => "🔍 Tìm kiếm địa điểm",
            MenuItem::Translate => "🌐 Dịch thuật",
            MenuItem::Chat => "💬 AI Chatbot",
            MenuItem::Account => "👤 Tài khoản",
            MenuItem::Quit => "Thoát",
        })
    }
}

async fn explore(config: &Config) -> Result<()> {
    let mut explorer = explorer(config).await?;
    render::print_auth(&explorer.auth().view());

    loop {
        let items = vec![
            MenuItem::Search,
            MenuItem::Translate,
            MenuItem::Chat,
            MenuItem::Account,
            MenuItem::Quit,
        ];
        let Some(choice) = ask(move || Select::new("Bạn muốn làm gì?", items).prompt()).await?
        else {
            break;
        };

        match choice {
            MenuItem::Search => {
                let query = ask(|| {
                    Text::new("Địa điểm:")
                        .with_placeholder(explorer_core::view::search::PLACEHOLDER)
                        .prompt()
                })
                .await?;
                let Some(query) = query else { continue };
                if let SearchOutcome::Rendered { .. } = explorer.search(&query).await {
                    print_search(&explorer);
                }
            }
            MenuItem::Translate => {
                let current = explorer.translate().mode();
                let labels = vec![current.label(), current.toggled().label()];
                let Some(label) = ask(move || Select::new("Chiều dịch:", labels).prompt()).await?
                else {
                    continue;
                };
                let mode = if label == current.label() {
                    current
                } else {
                    current.toggled()
                };
                let Some(text) = ask(|| Text::new("Văn bản gốc:").prompt()).await? else {
                    continue;
                };

                let panel = explorer.translate();
                panel.set_mode(mode);
                panel.set_source(text);
                panel.translate().await;
                render::print_translation(&panel.view());
            }
            MenuItem::Chat => chat_loop(explorer.chat()).await?,
            MenuItem::Account => {
                let panel = explorer.auth();
                let notice = if panel.user().is_some() {
                    panel.sign_out().await
                } else {
                    panel.sign_in().await
                };
                match notice {
                    Some(notice) => render::print_notice(&notice),
                    None => render::print_auth(&panel.view()),
                }
            }
            MenuItem::Quit => break,
        }
    }

    Ok(())
}

fn configure(mut config: Config, target: ConfigureTarget) -> Result<()> {
    match target {
        ConfigureTarget::Backend => {
            let current = config.backend_url();
            let url = Text::new("Backend URL:")
                .with_default(&current)
                .with_help_message("Ví dụ: http://localhost:8000 hoặc https://abc123.ngrok.io")
                .prompt()?;
            config.set_backend_url(&url)?;
        }
        ConfigureTarget::Identity => {
            let existing = config.identity.clone();

            let api_key = Password::new("Firebase API key:")
                .without_confirmation()
                .prompt()?;
            let google_client_id = Text::new("Google OAuth client ID:")
                .with_default(
                    existing
                        .as_ref()
                        .map(|i| i.google_client_id.as_str())
                        .unwrap_or_default(),
                )
                .prompt()?;
            let redirect_uri = Text::new("Redirect URI:")
                .with_default(
                    existing
                        .as_ref()
                        .map(IdentityConfig::redirect_uri)
                        .unwrap_or(DEFAULT_REDIRECT_URI),
                )
                .prompt()?;

            config.set_identity(IdentityConfig {
                api_key: api_key.trim().to_string(),
                google_client_id: google_client_id.trim().to_string(),
                redirect_uri: Some(redirect_uri.trim().to_string())
                    .filter(|uri| !uri.is_empty() && uri != DEFAULT_REDIRECT_URI),
            });
        }
    }

    config.save()?;
    println!("Đã lưu cấu hình vào {}", Config::config_file_path()?.display());
    Ok(())
}
