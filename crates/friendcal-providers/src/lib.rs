//! Birthday sources.
//!
//! ```text
//!            ┌──────────────┐
//!            │ReqwestSession│  (HttpSession)
//!            └──────┬───────┘
//!                   │
//!                   ▼
//!          ┌─────────────────┐   login, tokens, locale, aliases
//!          │ FacebookClient  │
//!          └────────┬────────┘
//!        GraphQL    │    async listing ─▶ DateNormalizer
//!                   ▼
//!          fetch_birthdays() ─▶ BirthdaySet
//! ```
//!
//! # Example
//!
//! ```ignore
//! use friendcal_providers::{FacebookClient, FacebookConfig, ReqwestSession, fetch_birthdays};
//!
//! let config = FacebookConfig::new(FacebookConfig::DEFAULT_BASE_URL)?;
//! let session = ReqwestSession::new(&config.user_agent, config.timeout)?;
//! let mut client = FacebookClient::new(session, config);
//! client.login("me@example.com", "secret").await?;
//! let birthdays = fetch_birthdays(&mut client, today).await?;
//! ```

pub mod error;
pub mod facebook;
pub mod fetch;
pub mod session;

pub use error::{ErrorCategory, ProviderError, ProviderErrorCode, ProviderResult};
pub use facebook::{BirthdaySource, FacebookClient, FacebookConfig};
pub use fetch::fetch_birthdays;
pub use session::{BoxFuture, HttpResponse, HttpSession, ReqwestSession};
