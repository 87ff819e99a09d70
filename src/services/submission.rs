//! Fallback auto-submission client
//!
//! When a countdown expires without a completion hook, the timer submits the
//! candidate's attempt itself through the portal's REST API.

use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{header, Client};
use tracing::{debug, info, warn};

use crate::error::SubmitError;

/// Supplies the bearer token for the fallback call, read at call time
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Where the access token lives
#[derive(Debug, Clone)]
pub enum CredentialSource {
    None,
    Static(String),
    /// Re-read on every call so a refreshed token is picked up
    File(PathBuf),
}

impl CredentialProvider for CredentialSource {
    fn token(&self) -> Option<String> {
        match self {
            CredentialSource::None => None,
            CredentialSource::Static(token) => Some(token.clone()),
            CredentialSource::File(path) => match fs::read_to_string(path) {
                Ok(contents) => {
                    let token = contents.trim();
                    (!token.is_empty()).then(|| token.to_string())
                }
                Err(e) => {
                    warn!("Failed to read access token from {}: {}", path.display(), e);
                    None
                }
            },
        }
    }
}

/// Submits a submission on the candidate's behalf
pub trait Submitter: Send + Sync {
    fn submit(&self, submission_id: u64) -> BoxFuture<'_, Result<(), SubmitError>>;
}

/// `Submitter` backed by the portal's `POST /api/submissions/{id}/submit`
pub struct HttpSubmitter {
    client: Client,
    api_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpSubmitter {
    /// `timeout` bounds the whole request, so a hung backend cannot hold the
    /// expiry outcome back indefinitely
    pub fn new(
        api_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self, SubmitError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Token providers may touch the filesystem, so they run off the runtime
    async fn token(&self) -> Option<String> {
        let credentials = Arc::clone(&self.credentials);
        match tokio::task::spawn_blocking(move || credentials.token()).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Credential lookup failed: {}", e);
                None
            }
        }
    }

    /// Endpoint that finalizes `submission_id`
    pub fn submit_url(&self, submission_id: u64) -> String {
        format!("{}/api/submissions/{}/submit", self.api_url, submission_id)
    }

    async fn post_submit(&self, submission_id: u64) -> Result<(), SubmitError> {
        let url = self.submit_url(submission_id);
        debug!("Auto-submitting submission {} via {}", submission_id, url);

        let mut request = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json");
        match self.token().await {
            Some(token) => request = request.bearer_auth(token),
            None => warn!("No access token available for auto-submission of {}", submission_id),
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Rejected { status: status.as_u16() });
        }

        info!("Submission {} auto-submitted", submission_id);
        Ok(())
    }
}

impl Submitter for HttpSubmitter {
    fn submit(&self, submission_id: u64) -> BoxFuture<'_, Result<(), SubmitError>> {
        Box::pin(self.post_submit(submission_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Router,
    };
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<(u64, Option<String>)>>>;

    fn submitter(url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> HttpSubmitter {
        HttpSubmitter::new(url, credentials, Duration::from_secs(5)).unwrap()
    }

    async fn stub_backend(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/api/submissions/:id/submit",
                post(
                    move |State(seen): State<Seen>, Path(id): Path<u64>, headers: HeaderMap| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        seen.lock().unwrap().push((id, auth));
                        status
                    },
                ),
            )
            .with_state(Arc::clone(&seen));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    #[test]
    fn submit_url_targets_submission() {
        let submitter = submitter("http://127.0.0.1:8000/", Arc::new(CredentialSource::None));
        assert_eq!(
            submitter.submit_url(123),
            "http://127.0.0.1:8000/api/submissions/123/submit"
        );
    }

    #[test]
    fn file_credentials_are_trimmed_and_reread() {
        let path = std::env::temp_dir().join(format!("assessment-timer-token-{}", std::process::id()));
        fs::write(&path, "first-token\n").unwrap();
        let source = CredentialSource::File(path.clone());
        assert_eq!(source.token().as_deref(), Some("first-token"));

        fs::write(&path, "second-token").unwrap();
        assert_eq!(source.token().as_deref(), Some("second-token"));

        fs::remove_file(&path).unwrap();
        assert_eq!(source.token(), None);
    }

    #[tokio::test]
    async fn posts_with_bearer_token() {
        let (url, seen) = stub_backend(StatusCode::OK).await;
        let submitter = submitter(url, Arc::new(|| Some("test-token".to_string())));

        submitter.submit(123).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (123, Some("Bearer test-token".to_string())));
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (url, seen) = stub_backend(StatusCode::BAD_REQUEST).await;
        let submitter = submitter(url, Arc::new(CredentialSource::None));

        let err = submitter.submit(7).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected { status: 400 }));
        assert_eq!(seen.lock().unwrap()[0], (7, None));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submitter = submitter(format!("http://{}", addr), Arc::new(CredentialSource::None));
        let err = submitter.submit(1).await.unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
    }

    #[tokio::test]
    async fn hung_backend_times_out() {
        let app = Router::new().route(
            "/api/submissions/:id/submit",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let submitter = HttpSubmitter::new(
            format!("http://{}", addr),
            Arc::new(CredentialSource::None),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = submitter.submit(2).await.unwrap_err();
        match err {
            SubmitError::Transport(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn file_token_is_read_for_each_submission() {
        let path = std::env::temp_dir().join(format!("assessment-timer-bearer-{}", std::process::id()));
        fs::write(&path, "rotated-token\n").unwrap();
        let (url, seen) = stub_backend(StatusCode::OK).await;
        let submitter = submitter(url, Arc::new(CredentialSource::File(path.clone())));

        submitter.submit(8).await.unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(seen.lock().unwrap()[0], (8, Some("Bearer rotated-token".to_string())));
    }
}
