//! Window-by-window birthday collection.

use chrono::NaiveDate;
use friendcal_core::{BirthdaySet, DateNormalizer, month_start_epochs};
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::facebook::{BirthdaySource, FacebookClient, PROVIDER_NAME, graphql};
use crate::session::HttpSession;

/// Months covered by the async source.
pub const ASYNC_WINDOW_MONTHS: u32 = 12;

/// Collects every friend's birthday from the configured source.
///
/// Windows are fetched one after another and merged by identifier. Any
/// failure aborts the whole run.
///
/// # Errors
///
/// Propagates the first window failure, or an empty-result error when all
/// windows succeeded but no birthday was found. Errors are tagged with the
/// provider name.
pub async fn fetch_birthdays<S: HttpSession>(
    client: &mut FacebookClient<S>,
    today: NaiveDate,
) -> ProviderResult<BirthdaySet> {
    let source = client.config().source;
    info!(%source, %today, "fetching birthdays");

    let result = match source {
        BirthdaySource::GraphQl => fetch_graphql(client).await,
        BirthdaySource::Async => fetch_async(client, today).await,
    };

    result
        .and_then(|set| set.ensure_not_empty().map_err(ProviderError::from))
        .map(|set| {
            info!(total = set.len(), "collected birthdays");
            set
        })
        .map_err(|e| e.with_provider(PROVIDER_NAME))
}

async fn fetch_graphql<S: HttpSession>(
    client: &mut FacebookClient<S>,
) -> ProviderResult<BirthdaySet> {
    let mut set = BirthdaySet::new();
    for offset in graphql::WINDOW_OFFSETS {
        let batch = client.fetch_graphql_window(offset).await?;
        let fetched = batch.len();
        let added = set.extend_batch(batch);
        info!(offset, fetched, added, "fetched GraphQL window");
    }
    Ok(set)
}

async fn fetch_async<S: HttpSession>(
    client: &mut FacebookClient<S>,
    today: NaiveDate,
) -> ProviderResult<BirthdaySet> {
    let locale = client.locale().await?;
    let normalizer = DateNormalizer::new(locale, today)?;

    let mut set = BirthdaySet::new();
    for epoch in month_start_epochs(today, ASYNC_WINDOW_MONTHS)? {
        let batch = client.fetch_async_window(epoch, &normalizer).await?;
        let fetched = batch.len();
        let added = set.extend_batch(batch);
        info!(epoch, fetched, added, "fetched async window");
    }
    Ok(set)
}
