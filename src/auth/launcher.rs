//! OAuth redirect-capture capability
//!
//! The identity flow is a host capability: the core builds the authorize
//! URL, the launcher gets the user through the provider's consent screen and
//! hands the redirect parameters back. [`LoopbackLauncher`] is the desktop
//! implementation: a one-shot axum server on the loopback interface.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// How long to wait for the user to finish the consent screen
const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Parameters captured from the provider redirect
#[derive(Debug, Clone)]
pub struct AuthRedirect {
    pub code: String,
    pub state: String,
}

/// Injected identity capability
#[async_trait]
pub trait AuthFlowLauncher: Send + Sync {
    /// The redirect URI registered with the provider
    fn redirect_uri(&self) -> String;

    /// Present `authorize_url` to the user and capture the redirect
    async fn launch(&self, authorize_url: &str) -> Result<AuthRedirect>;
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type CaptureSlot = Arc<Mutex<Option<oneshot::Sender<CallbackQuery>>>>;

/// Loopback redirect-capture server for desktop hosts
pub struct LoopbackLauncher {
    port: u16,
}

impl LoopbackLauncher {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl AuthFlowLauncher for LoopbackLauncher {
    fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.port)
    }

    async fn launch(&self, authorize_url: &str) -> Result<AuthRedirect> {
        let addr: SocketAddr = ([127, 0, 0, 1], self.port).into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        let (capture_tx, capture_rx) = oneshot::channel::<CallbackQuery>();
        let slot: CaptureSlot = Arc::new(Mutex::new(Some(capture_tx)));

        let app = Router::new()
            .route("/callback", get(capture_callback))
            .with_state(slot)
            .layer(TraceLayer::new_for_http());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });

            if let Err(e) = server.await {
                warn!("Redirect capture server error: {}", e);
            }
        });

        info!("Waiting for authorization at {}", self.redirect_uri());
        info!("Open this URL to continue: {}", authorize_url);

        let params = tokio::time::timeout(LOGIN_TIMEOUT, capture_rx).await;

        // Server has served its single redirect (or we gave up); stop it.
        let _ = shutdown_tx.send(());

        let params = match params {
            Ok(Ok(params)) => params,
            Ok(Err(_)) => return Err(AppError::Auth("Authorization flow cancelled".to_string())),
            Err(_) => return Err(AppError::Auth("Authorization flow timed out".to_string())),
        };

        if let Some(error) = params.error {
            return Err(AppError::Auth(format!("Authorization denied: {}", error)));
        }

        match (params.code, params.state) {
            (Some(code), Some(state)) => Ok(AuthRedirect { code, state }),
            _ => Err(AppError::Auth(
                "Redirect missing code or state parameter".to_string(),
            )),
        }
    }
}

async fn capture_callback(
    State(slot): State<CaptureSlot>,
    Query(params): Query<CallbackQuery>,
) -> Html<&'static str> {
    if let Some(tx) = slot.lock().take() {
        let _ = tx.send(params);
    } else {
        warn!("Duplicate redirect ignored");
    }

    Html("<html><body><p>ApexGrid is connected. You can close this tab.</p></body></html>")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticLauncher;

    #[async_trait]
    impl AuthFlowLauncher for StaticLauncher {
        fn redirect_uri(&self) -> String {
            "http://127.0.0.1:1/callback".to_string()
        }

        async fn launch(&self, _authorize_url: &str) -> Result<AuthRedirect> {
            Ok(AuthRedirect {
                code: "c".to_string(),
                state: "s".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_launcher_trait_is_object_safe() {
        let launcher: Box<dyn AuthFlowLauncher> = Box::new(StaticLauncher);
        let redirect = launcher.launch("https://example.test").await.unwrap();
        assert_eq!(redirect.code, "c");
    }

    #[tokio::test]
    async fn test_loopback_captures_redirect() {
        // Port 0 would be ideal but the redirect URI must be known up front;
        // pick a high port unlikely to clash in CI.
        let launcher = LoopbackLauncher::new(18921);
        let authorize_url = "https://accounts.example/authorize".to_string();

        let handle = tokio::spawn(async move { launcher.launch(&authorize_url).await });

        // Give the server a moment to bind, then simulate the redirect.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let body = reqwest::get("http://127.0.0.1:18921/callback?code=abc&state=xyz")
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("close this tab"));

        let redirect = handle.await.unwrap().unwrap();
        assert_eq!(redirect.code, "abc");
        assert_eq!(redirect.state, "xyz");
    }
}
