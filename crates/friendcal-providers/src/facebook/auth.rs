//! Password login.
//!
//! The flow mirrors a desktop browser:
//!
//! 1. Fetch the login page and copy the `_js_datr` value into the `datr` and
//!    `_js_datr` cookies (required for GDPR regions).
//! 2. Fetch the login page again, fill `form#login_form` and submit it.
//! 3. Check the `c_user` cookie and look for the checkpoint button.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::facebook::config::FacebookConfig;
use crate::session::{HttpResponse, HttpSession};

/// Domain the bootstrap cookies are set on.
pub const COOKIE_DOMAIN: &str = ".facebook.com";

static DATR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""_js_datr","(.*?)""#).expect("Invalid datr regex"));

/// A login form ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoginForm {
    action: String,
    fields: Vec<(String, String)>,
}

/// Logs in and returns the numeric account identifier.
///
/// # Errors
///
/// Returns an authentication error naming the failing stage, or a security
/// checkpoint error when the account must be confirmed in a browser.
pub async fn login<S>(
    session: &S,
    config: &FacebookConfig,
    email: &str,
    password: &str,
) -> ProviderResult<String>
where
    S: HttpSession + ?Sized,
{
    let login_url = config.login_url.as_str();
    info!(email, "logging in");

    let page = fetch_stage(session, login_url, "initial request for datr token").await?;
    let datr = DATR_REGEX
        .captures(&page.body)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            debug!(body = %page.body, "no _js_datr on login page");
            ProviderError::authentication("datr token not found on login page")
        })?;
    session.set_cookie("datr", &datr, COOKIE_DOMAIN)?;
    session.set_cookie("_js_datr", &datr, COOKIE_DOMAIN)?;

    let page = fetch_stage(session, login_url, "main login attempt").await?;
    let form = parse_login_form(&page, email, password)?;
    debug!(action = %form.action, fields = form.fields.len(), "submitting login form");

    let response = session.post_form(&form.action, &form.fields).await?;
    if !response.is_ok() {
        debug!(body = %response.body, "login response");
        return Err(stage_failed("main login response", response.status, email));
    }

    let c_user = session.cookie(config.base_url.as_str(), "c_user");
    let account_id = match c_user {
        Some(id) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => id,
        other => {
            debug!(body = %response.body, c_user = ?other, "login rejected");
            return Err(ProviderError::authentication(format!(
                "failed to authenticate with email {email}, please check provided email/password"
            )));
        }
    };

    if has_checkpoint(&response.body) {
        debug!(body = %response.body, "checkpoint page");
        return Err(ProviderError::checkpoint(
            "hit security checkpoint, log in manually in a browser and authorize this device",
        ));
    }

    info!(account_id = %account_id, "logged in");
    Ok(account_id)
}

async fn fetch_stage<S>(session: &S, url: &str, stage: &str) -> ProviderResult<HttpResponse>
where
    S: HttpSession + ?Sized,
{
    let response = session.get(url).await?;
    if response.is_ok() {
        Ok(response)
    } else {
        debug!(stage, body = %response.body, "login stage failed");
        Err(ProviderError::authentication(format!(
            "login stage `{stage}` returned status {}",
            response.status
        )))
    }
}

fn stage_failed(stage: &str, status: u16, email: &str) -> ProviderError {
    ProviderError::authentication(format!(
        "failed to authenticate with email {email}, stage `{stage}` returned status {status}"
    ))
}

fn selector(css: &str) -> ProviderResult<Selector> {
    Selector::parse(css).map_err(|e| ProviderError::internal(format!("bad selector {css}: {e}")))
}

/// Collects the form inputs, fills credentials and resolves the action URL.
fn parse_login_form(page: &HttpResponse, email: &str, password: &str) -> ProviderResult<LoginForm> {
    let document = Html::parse_document(&page.body);
    let form = document
        .select(&selector("form#login_form")?)
        .next()
        .ok_or_else(|| {
            debug!(body = %page.body, "no login form");
            ProviderError::authentication("login form not found on login page")
        })?;

    let mut fields: Vec<(String, String)> = form
        .select(&selector("input[name]")?)
        .filter_map(|input| {
            let el = input.value();
            let name = el.attr("name")?;
            Some((name.to_string(), el.attr("value").unwrap_or_default().to_string()))
        })
        .collect();
    set_field(&mut fields, "email", email);
    set_field(&mut fields, "pass", password);

    let base = Url::parse(&page.url).map_err(|e| {
        ProviderError::internal(format!("invalid login page URL {}: {e}", page.url))
    })?;
    let action = match form.value().attr("action") {
        Some(action) => base.join(action).map_err(|e| {
            ProviderError::authentication(format!("invalid login form action {action}: {e}"))
        })?,
        None => base,
    };

    Ok(LoginForm {
        action: action.to_string(),
        fields,
    })
}

fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    match fields.iter_mut().find(|(key, _)| key == name) {
        Some((_, slot)) => *slot = value.to_string(),
        None => fields.push((name.to_string(), value.to_string())),
    }
}

fn has_checkpoint(body: &str) -> bool {
    let document = Html::parse_document(body);
    selector("button#checkpointSubmitButton")
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::ProviderErrorCode;
    use crate::session::fake::FakeSession;

    fn config() -> FacebookConfig {
        FacebookConfig::new(FacebookConfig::DEFAULT_BASE_URL).unwrap()
    }

    fn scripted(post_status: u16, post_body: &str) -> FakeSession {
        FakeSession::new()
            .route("login.php", 200, LOGIN_PAGE)
            .route("login/device-based", post_status, post_body)
    }

    mod form {
        use super::*;

        #[test]
        fn fills_credentials_and_keeps_hidden_fields() {
            let page = HttpResponse {
                status: 200,
                url: "https://www.facebook.com/login.php".to_string(),
                body: LOGIN_PAGE.to_string(),
            };
            let form = parse_login_form(&page, "me@example.com", "hunter2").unwrap();

            assert_eq!(
                form.action,
                "https://www.facebook.com/login/device-based/regular/login/?login_attempt=1"
            );
            assert!(form.fields.contains(&("lsd".to_string(), "AVqX".to_string())));
            assert!(form.fields.contains(&("email".to_string(), "me@example.com".to_string())));
            assert!(form.fields.contains(&("pass".to_string(), "hunter2".to_string())));
        }

        #[test]
        fn missing_form_is_auth_error() {
            let page = HttpResponse {
                status: 200,
                url: "https://www.facebook.com/login.php".to_string(),
                body: "<html></html>".to_string(),
            };
            let err = parse_login_form(&page, "a", "b").unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        }

        #[test]
        fn detects_checkpoint_button() {
            assert!(has_checkpoint(CHECKPOINT_PAGE));
            assert!(!has_checkpoint(HOME_PAGE));
        }
    }

    mod flow {
        use super::*;

        #[tokio::test]
        async fn successful_login_returns_account_id() {
            let session = scripted(200, HOME_PAGE).cookie_after_post("c_user", "100004");
            let id = login(&session, &config(), "me@example.com", "pw").await.unwrap();
            assert_eq!(id, "100004");

            assert_eq!(session.cookie("", "datr").as_deref(), Some("dAtR-42"));
            assert_eq!(session.cookie("", "_js_datr").as_deref(), Some("dAtR-42"));
            assert_eq!(session.count("login.php"), 2);

            let post = session
                .requests()
                .into_iter()
                .find(|r| r.method == "POST")
                .unwrap();
            assert!(post.form.contains(&("pass".to_string(), "pw".to_string())));
        }

        #[tokio::test]
        async fn missing_c_user_means_bad_credentials() {
            let session = scripted(200, HOME_PAGE);
            let err = login(&session, &config(), "me@example.com", "pw").await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
            assert!(err.message().contains("check provided email/password"));
        }

        #[tokio::test]
        async fn non_numeric_c_user_is_rejected() {
            let session = scripted(200, HOME_PAGE).cookie_after_post("c_user", "deleted");
            let err = login(&session, &config(), "me@example.com", "pw").await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        }

        #[tokio::test]
        async fn checkpoint_is_reported() {
            let session = scripted(200, CHECKPOINT_PAGE).cookie_after_post("c_user", "100004");
            let err = login(&session, &config(), "me@example.com", "pw").await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::SecurityCheckpoint);
        }

        #[tokio::test]
        async fn first_stage_status_is_named() {
            let session = FakeSession::new().route("login.php", 503, "down");
            let err = login(&session, &config(), "me@example.com", "pw").await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
            assert!(err.message().contains("initial request for datr token"));
            assert!(err.message().contains("503"));
        }

        #[tokio::test]
        async fn rejected_post_is_named() {
            let session = scripted(500, "oops");
            let err = login(&session, &config(), "me@example.com", "pw").await.unwrap_err();
            assert!(err.message().contains("main login response"));
        }

        #[tokio::test]
        async fn missing_datr_is_auth_error() {
            let session = FakeSession::new().route("login.php", 200, "<html></html>");
            let err = login(&session, &config(), "me@example.com", "pw").await.unwrap_err();
            assert!(err.message().contains("datr"));
            assert_eq!(session.count("login.php"), 1);
        }
    }
}
