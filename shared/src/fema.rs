use crate::error::FetchError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const DISASTER_DECLARATIONS_ENDPOINT: &str =
    "https://www.fema.gov/api/open/v2/DisasterDeclarationsSummaries";

/// Only the first summary is ever used, the rest of the page is ignored.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterDeclarationsResponse {
    #[serde(rename = "DisasterDeclarationsSummaries")]
    pub summaries: Vec<DisasterDeclarationSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterDeclarationSummary {
    pub declaration_title: Option<String>,
    pub declaration_date: Option<String>,
    pub expiration_date: Option<String>,
    pub incident_begin_date: Option<String>,
    pub state: Option<String>,
    pub disaster_number: Option<i64>,
    pub incident_type: Option<String>,
}

/// Declarations for `state` whose individual assistance filing window is still open.
pub fn open_declarations_filter(state: &str) -> String {
    format!("state eq '{state}' and lastIAFilingDate eq null")
}

pub fn open_declarations_query(state: &str) -> [(&'static str, String); 4] {
    [
        ("$filter", open_declarations_filter(state)),
        ("$orderby", "incidentBeginDate desc".to_string()),
        ("$top", PAGE_SIZE.to_string()),
        ("$format", "json".to_string()),
    ]
}

#[derive(Clone)]
pub struct FemaClient {
    client: Client,
    base_url: String,
}

impl FemaClient {
    pub fn new_with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn open_declarations(
        &self,
        state: &str,
    ) -> Result<DisasterDeclarationsResponse, FetchError> {
        let body = self
            .client
            .get(&self.base_url)
            .query(&open_declarations_query(state))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let response: DisasterDeclarationsResponse = serde_json::from_str(&body)?;
        debug!(
            name: "fema.declarations.received",
            count = response.summaries.len(),
            "received disaster declarations"
        );
        Ok(response)
    }
}
