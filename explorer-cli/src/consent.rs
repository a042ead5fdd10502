use async_trait::async_trait;
use explorer_core::auth::{AuthError, AuthErrorCode, ConsentPrompt, Url};
use inquire::{InquireError, Text};
use log::debug;

/// Google consent in the system browser; the user pastes the redirect back.
#[derive(Debug, Default)]
pub struct BrowserConsent;

#[async_trait]
impl ConsentPrompt for BrowserConsent {
    async fn request_consent(&self, consent_url: &Url) -> Result<String, AuthError> {
        open::that(consent_url.as_str()).map_err(|e| {
            AuthError::new(
                AuthErrorCode::PopupBlocked,
                format!("failed to open browser: {e}"),
            )
        })?;

        println!("Đã mở trình duyệt để đăng nhập với Google.");
        println!("Nếu trình duyệt không hiện trang đăng nhập, hãy mở liên kết sau:\n  {consent_url}\n");

        let answer = tokio::task::spawn_blocking(|| {
            Text::new("Dán URL chuyển hướng (hoặc ID token):")
                .with_help_message("Esc để hủy")
                .prompt()
        })
        .await
        .map_err(|e| AuthError::new(AuthErrorCode::Unknown, format!("prompt task failed: {e}")))?;

        answer.map_err(|e| match e {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => {
                debug!("consent prompt dismissed");
                AuthError::new(AuthErrorCode::PopupClosedByUser, "consent prompt dismissed")
            }
            other => AuthError::new(AuthErrorCode::Unknown, other.to_string()),
        })
    }
}
