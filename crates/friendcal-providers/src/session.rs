//! Cookie-carrying HTTP session.
//!
//! [`HttpSession`] is the seam between the Facebook flows and the network.
//! [`ReqwestSession`] is the real implementation; tests drive the same
//! flows through an in-memory session with canned responses.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use tracing::trace;

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Keeps [`HttpSession`] object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A response with its body already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Fails with an HTTP status error naming `stage` unless the status is 200.
    pub fn require_ok(self, stage: &str) -> ProviderResult<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            tracing::debug!(stage, status = self.status, body = %self.body, "unexpected status");
            Err(ProviderError::http_status(stage, self.status))
        }
    }
}

/// Minimal HTTP surface the birthday flows need.
///
/// Implementations keep cookies between calls. Non-200 responses are
/// returned, not turned into errors, so callers can name the failing stage.
pub trait HttpSession: Send + Sync {
    /// GET `url`.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ProviderResult<HttpResponse>>;

    /// POST `form` as `application/x-www-form-urlencoded`.
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        form: &'a [(String, String)],
    ) -> BoxFuture<'a, ProviderResult<HttpResponse>>;

    /// Stores a cookie for `domain` (e.g. `.facebook.com`).
    fn set_cookie(&self, name: &str, value: &str, domain: &str) -> ProviderResult<()>;

    /// Current value of a cookie sent to `url`.
    fn cookie(&self, url: &str, name: &str) -> Option<String>;
}

/// [`HttpSession`] over a reqwest client with a shared cookie jar.
pub struct ReqwestSession {
    client: Client,
    jar: Arc<Jar>,
}

impl ReqwestSession {
    /// Builds a client with a cookie store, user agent and timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> ProviderResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::network(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client, jar })
    }

    async fn read(response: reqwest::Response) -> ProviderResult<HttpResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read body: {}", e)))?;
        Ok(HttpResponse { status, url, body })
    }
}

impl HttpSession for ReqwestSession {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ProviderResult<HttpResponse>> {
        Box::pin(async move {
            trace!(url, "GET");
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ProviderError::network(format!("Request failed: {}", e)))?;
            Self::read(response).await
        })
    }

    fn post_form<'a>(
        &'a self,
        url: &'a str,
        form: &'a [(String, String)],
    ) -> BoxFuture<'a, ProviderResult<HttpResponse>> {
        Box::pin(async move {
            trace!(url, fields = form.len(), "POST");
            let response = self
                .client
                .post(url)
                .form(form)
                .send()
                .await
                .map_err(|e| ProviderError::network(format!("Request failed: {}", e)))?;
            Self::read(response).await
        })
    }

    fn set_cookie(&self, name: &str, value: &str, domain: &str) -> ProviderResult<()> {
        let host = domain.trim_start_matches('.');
        let url = Url::parse(&format!("https://{host}/"))
            .map_err(|e| ProviderError::internal(format!("invalid cookie domain {domain}: {e}")))?;
        self.jar
            .add_cookie_str(&format!("{name}={value}; Domain={domain}; Path=/"), &url);
        Ok(())
    }

    fn cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, name)
    }
}

/// Finds `name` in a `Cookie:` header value.
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_in_header() {
        let header = "datr=abc; c_user=1234; xs=9%3Aq";
        assert_eq!(find_cookie(header, "c_user").as_deref(), Some("1234"));
        assert_eq!(find_cookie(header, "xs").as_deref(), Some("9%3Aq"));
        assert_eq!(find_cookie(header, "missing"), None);
    }

    #[test]
    fn require_ok_names_stage() {
        let response = HttpResponse {
            status: 302,
            url: String::new(),
            body: String::new(),
        };
        let err = response.require_ok("login page").unwrap_err();
        assert!(err.message().contains("login page"));
        assert!(err.message().contains("302"));
    }

    #[test]
    fn reqwest_session_stores_cookies_for_domain() {
        let session = ReqwestSession::new("test-agent", Duration::from_secs(5)).unwrap();
        session.set_cookie("datr", "xyz", ".facebook.com").unwrap();
        assert_eq!(
            session.cookie("https://www.facebook.com/", "datr").as_deref(),
            Some("xyz")
        );
    }

    #[tokio::test]
    async fn fake_session_serves_queued_responses() {
        let session = fake::FakeSession::new()
            .route("a/", 500, "first")
            .route("a/", 200, "second");
        assert_eq!(session.get("https://x/a/").await.unwrap().status, 500);
        assert_eq!(session.get("https://x/a/").await.unwrap().body, "second");
        assert_eq!(session.get("https://x/a/").await.unwrap().body, "second");
        assert_eq!(session.count("a/"), 3);
    }
}
