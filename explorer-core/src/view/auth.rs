use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    auth::{AuthSession, Subscription},
    model::User,
};

use super::{Notice, sanitize};

pub const SIGN_IN_LABEL: &str = "Đăng nhập với Google";
pub const SIGNING_IN_LABEL: &str = "Đang đăng nhập...";
pub const SIGN_OUT_LABEL: &str = "Đăng xuất";
pub const SIGNING_OUT_LABEL: &str = "Đang đăng xuất...";
pub const AVATAR_PLACEHOLDER: &str = "https://via.placeholder.com/40";
pub const DEFAULT_NAME: &str = "Người dùng";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    SignIn,
    SignOut,
}

#[derive(Debug, Default)]
struct PanelState {
    user: Option<User>,
    pending: Option<Pending>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthView {
    LoggedOut {
        label: &'static str,
        enabled: bool,
    },
    LoggedIn {
        avatar_url: String,
        name: String,
        email: String,
        label: &'static str,
        enabled: bool,
    },
}

/// Sign-in control and signed-in user badge.
///
/// Mirrors the session through a subscription taken at construction, so it
/// re-renders on every change no matter who triggered it.
#[derive(Debug)]
pub struct AuthPanel {
    session: Arc<AuthSession>,
    state: Arc<Mutex<PanelState>>,
    subscription: Option<Subscription>,
}

fn lock(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AuthPanel {
    pub fn new(session: Arc<AuthSession>) -> Self {
        let state = Arc::new(Mutex::new(PanelState::default()));
        let sink = Arc::clone(&state);
        let subscription = session.subscribe(move |user| {
            let mut state = lock(&sink);
            state.user = user.cloned();
            state.pending = None;
        });

        Self {
            session,
            state,
            subscription: Some(subscription),
        }
    }

    pub fn user(&self) -> Option<User> {
        lock(&self.state).user.clone()
    }

    /// Returns the notice to show when the sign-in fails.
    pub async fn sign_in(&self) -> Option<Notice> {
        {
            let mut state = lock(&self.state);
            if state.user.is_some() || state.pending.is_some() {
                return None;
            }
            state.pending = Some(Pending::SignIn);
        }

        match self.session.sign_in_with_google().await {
            Ok(_) => None,
            Err(err) => {
                lock(&self.state).pending = None;
                Some(Notice::error(err.to_string()))
            }
        }
    }

    /// Returns the notice to show when the sign-out fails.
    pub async fn sign_out(&self) -> Option<Notice> {
        {
            let mut state = lock(&self.state);
            if state.user.is_none() || state.pending.is_some() {
                return None;
            }
            state.pending = Some(Pending::SignOut);
        }

        match self.session.sign_out().await {
            Ok(()) => None,
            Err(err) => {
                lock(&self.state).pending = None;
                Some(Notice::error(err.to_string()))
            }
        }
    }

    pub fn view(&self) -> AuthView {
        let state = lock(&self.state);
        let pending = state.pending;

        match &state.user {
            None => AuthView::LoggedOut {
                label: if pending == Some(Pending::SignIn) {
                    SIGNING_IN_LABEL
                } else {
                    SIGN_IN_LABEL
                },
                enabled: pending.is_none(),
            },
            Some(user) => AuthView::LoggedIn {
                avatar_url: user
                    .photo_url
                    .clone()
                    .filter(|url| !url.is_empty())
                    .unwrap_or_else(|| AVATAR_PLACEHOLDER.to_string()),
                name: user
                    .display_name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .map(sanitize)
                    .unwrap_or_else(|| DEFAULT_NAME.to_string()),
                email: user.email.as_deref().map(sanitize).unwrap_or_default(),
                label: if pending == Some(Pending::SignOut) {
                    SIGNING_OUT_LABEL
                } else {
                    SIGN_OUT_LABEL
                },
                enabled: pending.is_none(),
            },
        }
    }

    /// Stop following the session. Dropping the panel does the same.
    pub fn dispose(&mut self) {
        self.subscription.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::AuthErrorCode,
        test_support::{FakeIdentity, sample_user},
    };

    fn panel(identity: FakeIdentity) -> (Arc<AuthSession>, AuthPanel) {
        let session = Arc::new(AuthSession::new(Arc::new(identity)));
        let panel = AuthPanel::new(Arc::clone(&session));
        (session, panel)
    }

    #[test]
    fn starts_logged_out() {
        let (_, panel) = panel(FakeIdentity::default());
        assert_eq!(
            panel.view(),
            AuthView::LoggedOut {
                label: "Đăng nhập với Google",
                enabled: true
            }
        );
    }

    #[tokio::test]
    async fn restored_session_renders_logged_in() {
        let identity = Arc::new(FakeIdentity::with_restored(sample_user()));
        let panel = AuthPanel::new(Arc::new(AuthSession::start(identity).await));

        assert_eq!(
            panel.view(),
            AuthView::LoggedIn {
                avatar_url: "https://via.placeholder.com/40".into(),
                name: "Nguyễn Lan".into(),
                email: "lan@example.com".into(),
                label: "Đăng xuất",
                enabled: true,
            }
        );
    }

    #[tokio::test]
    async fn sign_in_disables_control_until_session_changes() {
        let (_, panel) = panel(FakeIdentity::default());

        let (notice, during) = tokio::join!(panel.sign_in(), async { panel.view() });

        assert_eq!(
            during,
            AuthView::LoggedOut {
                label: "Đang đăng nhập...",
                enabled: false
            }
        );
        assert!(notice.is_none());
        assert!(matches!(panel.view(), AuthView::LoggedIn { enabled: true, .. }));
        assert_eq!(panel.user(), Some(sample_user()));
    }

    #[tokio::test]
    async fn failed_sign_in_rolls_back_and_reports() {
        let (_, panel) = panel(FakeIdentity::failing_sign_in(AuthErrorCode::PopupClosedByUser));

        let notice = panel.sign_in().await.expect("failure notice");

        assert_eq!(notice.message, "Đăng nhập bị hủy. Vui lòng thử lại.");
        assert_eq!(
            panel.view(),
            AuthView::LoggedOut {
                label: SIGN_IN_LABEL,
                enabled: true
            }
        );
    }

    #[tokio::test]
    async fn failed_sign_out_keeps_user() {
        let (_, panel) = panel(FakeIdentity::failing_sign_out(AuthErrorCode::SignOutFailed));
        assert!(panel.sign_in().await.is_none());

        let notice = panel.sign_out().await.expect("failure notice");

        assert_eq!(notice.message, "Đăng xuất thất bại. Vui lòng thử lại.");
        assert!(matches!(
            panel.view(),
            AuthView::LoggedIn {
                label: SIGN_OUT_LABEL,
                enabled: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn sign_out_while_logged_out_does_nothing() {
        let (_, panel) = panel(FakeIdentity::default());
        assert!(panel.sign_out().await.is_none());
        assert!(panel.user().is_none());
    }

    #[tokio::test]
    async fn sign_out_returns_to_logged_out_view() {
        let (session, panel) = panel(FakeIdentity::default());
        panel.sign_in().await;

        assert!(panel.sign_out().await.is_none());

        assert!(matches!(panel.view(), AuthView::LoggedOut { enabled: true, .. }));
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn changes_from_elsewhere_are_mirrored() {
        let (session, panel) = panel(FakeIdentity::default());

        session.sign_in_with_google().await.expect("sign in");

        assert_eq!(panel.user().map(|u| u.uid), Some("uid-1".to_string()));
    }

    #[tokio::test]
    async fn dispose_stops_following_the_session() {
        let (session, mut panel) = panel(FakeIdentity::default());
        assert_eq!(session.listener_count(), 1);

        panel.dispose();
        session.sign_in_with_google().await.expect("sign in");

        assert_eq!(session.listener_count(), 0);
        assert!(panel.user().is_none());
    }

    #[test]
    fn dropping_the_panel_unsubscribes() {
        let (session, panel) = panel(FakeIdentity::default());
        drop(panel);
        assert_eq!(session.listener_count(), 0);
    }
}
