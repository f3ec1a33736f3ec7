use apebase_store::models::Record;
use surrealdb::Connection;
use tracing::{debug, error};

use super::{ControlError, TokenControlPlane};
use crate::normalize::normalize;
use crate::query::{Filter, Page};

/// One listing window, with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPage {
    pub filter: Filter,
    pub page: Page,
    pub records: Vec<Record>,
}

impl TokenPage {
    /// Whether a full page came back, so a following page may exist.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.records.len() as u64 >= self.page.limit()
    }
}

impl<C: Connection> TokenControlPlane<C> {
    /// Parses raw filter and page texts, then runs the listing query.
    ///
    /// # Errors
    /// Returns `ControlError::Validation` for malformed input, before the
    /// store is touched, and `ControlError::Query` if the store fails.
    pub async fn list_tokens(
        &self,
        filter: Option<&str>,
        page: Option<&str>,
    ) -> Result<TokenPage, ControlError> {
        let filter = filter.map_or_else(|| Ok(Filter::match_all()), Filter::parse)?;
        let page = Page::parse(page)?;
        let records = self.query(&filter, page).await?;
        Ok(TokenPage {
            filter,
            page,
            records,
        })
    }

    /// Returns one page of matching records, newest first, with images
    /// normalized.
    ///
    /// # Errors
    /// Returns `ControlError::Query` if the store query fails.
    pub async fn query(&self, filter: &Filter, page: Page) -> Result<Vec<Record>, ControlError> {
        debug!(filter = %filter, page = %page, "querying tokens");
        let records = self
            .store
            .find_page(filter.compiled(), page.offset(), page.limit())
            .await
            .map_err(|err| {
                error!(filter = %filter, error = %err, "token query failed");
                ControlError::Query(err)
            })?;
        Ok(records.into_iter().map(normalize).collect())
    }

    /// Fetches a single record by id, normalized. `None` when absent.
    ///
    /// # Errors
    /// Returns `ControlError::Query` if the store query fails.
    pub async fn get_token(&self, id: &str) -> Result<Option<Record>, ControlError> {
        let record = self.store.find_by_id(id).await.map_err(|err| {
            error!(id, error = %err, "token lookup failed");
            ControlError::Query(err)
        })?;
        Ok(record.map(normalize))
    }
}
