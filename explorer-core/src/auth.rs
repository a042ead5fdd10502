//! Identity session shared by every component that needs to know who is signed in.

use async_trait::async_trait;
use log::{info, warn};
pub use reqwest::Url;
use std::{
    fmt::{self, Debug},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicBool, Ordering},
    },
};
use thiserror::Error;

use crate::model::User;

pub mod firebase;

pub use firebase::FirebaseIdentity;

/// Provider failure categories, each with a fixed user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    PopupClosedByUser,
    PopupBlocked,
    CancelledPopupRequest,
    NetworkRequestFailed,
    TooManyRequests,
    UserDisabled,
    SignOutFailed,
    NotConfigured,
    Unknown,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::PopupClosedByUser => "auth/popup-closed-by-user",
            AuthErrorCode::PopupBlocked => "auth/popup-blocked",
            AuthErrorCode::CancelledPopupRequest => "auth/cancelled-popup-request",
            AuthErrorCode::NetworkRequestFailed => "auth/network-request-failed",
            AuthErrorCode::TooManyRequests => "auth/too-many-requests",
            AuthErrorCode::UserDisabled => "auth/user-disabled",
            AuthErrorCode::SignOutFailed => "auth/sign-out-failed",
            AuthErrorCode::NotConfigured => "auth/not-configured",
            AuthErrorCode::Unknown => "auth/unknown",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthErrorCode::PopupClosedByUser => "Đăng nhập bị hủy. Vui lòng thử lại.",
            AuthErrorCode::PopupBlocked => "Popup bị chặn. Vui lòng cho phép popup và thử lại.",
            AuthErrorCode::CancelledPopupRequest => "Yêu cầu đăng nhập bị hủy.",
            AuthErrorCode::NetworkRequestFailed => {
                "Lỗi kết nối mạng. Vui lòng kiểm tra internet và thử lại."
            }
            AuthErrorCode::TooManyRequests => "Quá nhiều yêu cầu. Vui lòng đợi một lát và thử lại.",
            AuthErrorCode::UserDisabled => "Tài khoản đã bị vô hiệu hóa.",
            AuthErrorCode::SignOutFailed => "Đăng xuất thất bại. Vui lòng thử lại.",
            AuthErrorCode::NotConfigured => {
                "Đăng nhập chưa được cấu hình. Chạy `vnexplorer configure identity`."
            }
            AuthErrorCode::Unknown => "Đăng nhập thất bại. Vui lòng thử lại.",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Displays as the user-facing message; `detail` is for the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .code.user_message())]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub detail: String,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug {
    /// Session left over from a previous run, if any.
    async fn restore(&self) -> Option<User>;

    async fn sign_in_with_google(&self) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// The interactive consent step of the Google sign-in.
#[async_trait]
pub trait ConsentPrompt: Send + Sync + Debug {
    /// Show `consent_url` to the user and return what they bring back:
    /// the redirect URL carrying the ID token, or the bare token.
    async fn request_consent(&self, consent_url: &Url) -> Result<String, AuthError>;
}

/// Stand-in provider when no identity credentials are configured.
#[derive(Debug, Default)]
pub struct Unconfigured;

#[async_trait]
impl IdentityProvider for Unconfigured {
    async fn restore(&self) -> Option<User> {
        None
    }

    async fn sign_in_with_google(&self) -> Result<User, AuthError> {
        Err(AuthError::new(
            AuthErrorCode::NotConfigured,
            "no identity credentials in config",
        ))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

type Listener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct Shared {
    user: Mutex<Option<User>>,
    listeners: Mutex<Listeners>,
    /// Held across a user change and its notifications, so listeners see
    /// changes in the order they were made.
    notify: Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The process-wide identity session.
///
/// Constructed once at startup and shared by `Arc`. Holds the current user
/// and notifies subscribers whenever it changes.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    shared: Arc<Shared>,
    signing_in: AtomicBool,
}

impl Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("provider", &self.provider)
            .field("user", &self.current_user())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl AuthSession {
    /// A signed-out session.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            shared: Arc::new(Shared::default()),
            signing_in: AtomicBool::new(false),
        }
    }

    /// A session seeded with whatever the provider kept from the last run.
    pub async fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        let session = Self::new(provider);
        if let Some(user) = session.provider.restore().await {
            info!("restored session for {}", user.uid);
            *lock(&session.shared.user) = Some(user);
        }
        session
    }

    pub fn current_user(&self) -> Option<User> {
        lock(&self.shared.user).clone()
    }

    /// Call `on_change` now with the current user and again on every change,
    /// until the returned token is dropped.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(on_change);
        let id = {
            let mut listeners = lock(&self.shared.listeners);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Arc::clone(&listener)));
            id
        };

        let user = self.current_user();
        listener(user.as_ref());

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.shared.listeners).entries.len()
    }

    /// Only one sign-in may be in flight; a second one is cancelled.
    pub async fn sign_in_with_google(&self) -> Result<User, AuthError> {
        if self.signing_in.swap(true, Ordering::SeqCst) {
            return Err(AuthError::new(
                AuthErrorCode::CancelledPopupRequest,
                "another sign-in is already in progress",
            ));
        }

        let result = {
            let _guard = SignInGuard(&self.signing_in);
            self.provider.sign_in_with_google().await
        };

        match result {
            Ok(user) => {
                info!("signed in as {}", user.uid);
                self.set_user(Some(user.clone()));
                Ok(user)
            }
            Err(err) => {
                warn!("sign-in failed ({}): {}", err.code, err.detail);
                Err(err)
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(err) = self.provider.sign_out().await {
            warn!("sign-out failed ({}): {}", err.code, err.detail);
            return Err(err);
        }

        info!("signed out");
        self.set_user(None);
        Ok(())
    }

    fn set_user(&self, user: Option<User>) {
        let _order = lock(&self.shared.notify);
        *lock(&self.shared.user) = user.clone();

        // Listeners may subscribe or unsubscribe, so call them unlocked.
        let listeners: Vec<Listener> = lock(&self.shared.listeners)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(user.as_ref());
        }
    }
}

/// Clears the sign-in flag even when the sign-in future is dropped.
struct SignInGuard<'a>(&'a AtomicBool);

impl Drop for SignInGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Token for one [`AuthSession::subscribe`] registration.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Stop receiving changes. Dropping the token has the same effect.
    pub fn unsubscribe(self) {}
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.listeners)
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeIdentity, sample_user};

    fn recorder() -> (Arc<Mutex<Vec<Option<String>>>>, impl Fn(Option<&User>) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = move |user: Option<&User>| {
            lock(&sink).push(user.map(|u| u.uid.clone()));
        };
        (seen, listener)
    }

    #[tokio::test]
    async fn subscribe_fires_immediately_and_on_change() {
        let session = AuthSession::new(Arc::new(FakeIdentity::default()));
        let (seen, listener) = recorder();

        let _subscription = session.subscribe(listener);
        session.sign_in_with_google().await.expect("sign in");
        session.sign_out().await.expect("sign out");

        assert_eq!(
            *lock(&seen),
            vec![None, Some("uid-1".to_string()), None]
        );
    }

    #[tokio::test]
    async fn unsubscribe_stops_notifications() {
        let session = AuthSession::new(Arc::new(FakeIdentity::default()));
        let (seen, listener) = recorder();

        let subscription = session.subscribe(listener);
        assert_eq!(session.listener_count(), 1);

        subscription.unsubscribe();
        assert_eq!(session.listener_count(), 0);

        session.sign_in_with_google().await.expect("sign in");
        assert_eq!(*lock(&seen), vec![None]);
    }

    #[tokio::test]
    async fn failed_sign_in_keeps_user_and_skips_listeners() {
        let identity = FakeIdentity::failing_sign_in(AuthErrorCode::PopupClosedByUser);
        let session = AuthSession::new(Arc::new(identity));
        let (seen, listener) = recorder();
        let _subscription = session.subscribe(listener);

        let err = session.sign_in_with_google().await.unwrap_err();

        assert_eq!(err.code, AuthErrorCode::PopupClosedByUser);
        assert_eq!(err.to_string(), "Đăng nhập bị hủy. Vui lòng thử lại.");
        assert!(session.current_user().is_none());
        assert_eq!(*lock(&seen), vec![None]);
    }

    #[tokio::test]
    async fn concurrent_sign_in_is_cancelled() {
        let session = AuthSession::new(Arc::new(FakeIdentity::default()));

        let (first, second) = tokio::join!(
            session.sign_in_with_google(),
            session.sign_in_with_google()
        );

        assert!(first.is_ok());
        assert_eq!(
            second.unwrap_err().code,
            AuthErrorCode::CancelledPopupRequest
        );
    }

    #[tokio::test]
    async fn abandoned_sign_in_does_not_block_the_next_one() {
        let session = AuthSession::new(Arc::new(FakeIdentity::default()));

        tokio::select! {
            biased;
            _ = session.sign_in_with_google() => panic!("sign-in should still be pending"),
            _ = std::future::ready(()) => {}
        }

        let user = session.sign_in_with_google().await.expect("sign in");
        assert_eq!(user, sample_user());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn listeners_end_on_the_current_user() {
        let session = Arc::new(AuthSession::new(Arc::new(FakeIdentity::default())));
        let (seen, listener) = recorder();
        let _subscription = session.subscribe(listener);

        for _ in 0..50 {
            let signing_in = Arc::clone(&session);
            let signing_out = Arc::clone(&session);
            let (a, b) = tokio::join!(
                tokio::spawn(async move { signing_in.sign_in_with_google().await.map(|_| ()) }),
                tokio::spawn(async move { signing_out.sign_out().await }),
            );
            a.expect("sign-in task").expect("sign in");
            b.expect("sign-out task").expect("sign out");

            let last = lock(&seen).last().cloned().flatten();
            assert_eq!(last, session.current_user().map(|u| u.uid));
        }
    }

    #[tokio::test]
    async fn start_restores_previous_session() {
        let identity = FakeIdentity::with_restored(sample_user());
        let session = AuthSession::start(Arc::new(identity)).await;

        assert_eq!(session.current_user(), Some(sample_user()));
    }

    #[tokio::test]
    async fn unconfigured_provider_explains_itself() {
        let session = AuthSession::new(Arc::new(Unconfigured));
        let err = session.sign_in_with_google().await.unwrap_err();

        assert_eq!(err.code, AuthErrorCode::NotConfigured);
        assert!(err.to_string().contains("vnexplorer configure identity"));
    }

    #[test]
    fn subscription_outliving_session_is_harmless() {
        let session = AuthSession::new(Arc::new(Unconfigured));
        let subscription = session.subscribe(|_| {});
        drop(session);
        subscription.unsubscribe();
    }
}
