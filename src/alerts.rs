use reqwest::Method;
use tracing::{debug, instrument};

use crate::client::DevoClient;
use crate::errors::Result;
use crate::query::QueryParams;
use crate::types::{
    AlertDefinition, CreateRequest, DeleteRequest, ListRequest, StatusUpdateRequest,
    UpdateRequest,
};

const ALERT_DEFINITIONS_PATH: &str = "v1/alertDefinitions";
const ALERT_DEFINITIONS_STATUS_PATH: &str = "v1/alertDefinitions/status";

/// Alert definition operations of the Devo Alerts API
///
/// Obtained from [`DevoClient::alerts`]. Every call is a single round-trip;
/// requests failing client-side validation are never sent.
#[derive(Clone, Copy)]
pub struct Alerts<'a> {
    client: &'a DevoClient,
}

impl<'a> Alerts<'a> {
    pub(crate) fn new(client: &'a DevoClient) -> Self {
        Self { client }
    }

    /// List alert definitions
    ///
    /// Only one page is fetched; iterate `page`/`size` to walk the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with a
    /// non-success status, or the body is not a list of alert definitions.
    #[instrument(
        name = "Alerts::list",
        skip_all,
        fields(page = ?request.page, size = ?request.size)
    )]
    pub async fn list(&self, request: &ListRequest) -> Result<Vec<AlertDefinition>> {
        let url = self.url(ALERT_DEFINITIONS_PATH, request.query())?;
        debug!(url = %url, "Listing alert definitions");

        let alerts: Vec<AlertDefinition> = self
            .client
            .send_decoded(self.client.build(Method::GET, url))
            .await?;

        debug!(count = alerts.len(), "Listed alert definitions");
        Ok(alerts)
    }

    /// List alert definitions, returning the response body as received
    #[instrument(
        name = "Alerts::list_raw",
        skip_all,
        fields(page = ?request.page, size = ?request.size)
    )]
    pub async fn list_raw(&self, request: &ListRequest) -> Result<Vec<u8>> {
        let url = self.url(ALERT_DEFINITIONS_PATH, request.query())?;
        debug!(url = %url, "Listing alert definitions (raw)");

        self.client
            .send_raw(self.client.build(Method::GET, url))
            .await
    }

    /// Create an alert definition
    ///
    /// Returns the stored definition, including its server-assigned ID.
    ///
    /// # Errors
    ///
    /// Returns [`DevoError::Validation`](crate::DevoError::Validation) without
    /// sending anything if a required field is empty.
    #[instrument(name = "Alerts::create", skip_all, fields(name = %request.name))]
    pub async fn create(&self, request: &CreateRequest) -> Result<AlertDefinition> {
        request.validate()?;

        let url = self.url(ALERT_DEFINITIONS_PATH, QueryParams::new())?;
        debug!(url = %url, "Creating alert definition");

        let created: AlertDefinition = self
            .client
            .send_decoded(self.client.build_with_body(Method::POST, url, request)?)
            .await?;

        debug!(id = %created.id, "Alert definition created");
        Ok(created)
    }

    /// Update an alert definition
    ///
    /// The fields are sent as given; the API decides whether they are valid.
    #[instrument(name = "Alerts::update", skip_all, fields(id = %request.id))]
    pub async fn update(&self, request: &UpdateRequest) -> Result<AlertDefinition> {
        let url = self.url(ALERT_DEFINITIONS_PATH, QueryParams::new())?;
        debug!(url = %url, "Updating alert definition");

        self.client
            .send_decoded(self.client.build_with_body(Method::PUT, url, request)?)
            .await
    }

    /// Delete alert definitions
    ///
    /// # Errors
    ///
    /// Returns [`DevoError::Validation`](crate::DevoError::Validation) without
    /// sending anything if no IDs are given or any ID is blank.
    #[instrument(
        name = "Alerts::delete",
        skip_all,
        fields(alert_count = request.alert_ids.len())
    )]
    pub async fn delete(&self, request: &DeleteRequest) -> Result<()> {
        request.validate()?;

        let url = self.url(ALERT_DEFINITIONS_PATH, request.query())?;
        debug!(url = %url, "Deleting alert definitions");

        self.client
            .send_empty(self.client.build(Method::DELETE, url))
            .await?;

        debug!("Alert definitions deleted");
        Ok(())
    }

    /// Enable or disable alert definitions
    ///
    /// # Errors
    ///
    /// Returns [`DevoError::Validation`](crate::DevoError::Validation) without
    /// sending anything if no IDs are given or any ID is blank.
    #[instrument(
        name = "Alerts::set_status",
        skip_all,
        fields(alert_count = request.alert_ids.len(), enable = request.enable)
    )]
    pub async fn set_status(&self, request: &StatusUpdateRequest) -> Result<()> {
        request.validate()?;

        let url = self.url(ALERT_DEFINITIONS_STATUS_PATH, request.query())?;
        debug!(url = %url, "Updating alert definition status");

        self.client
            .send_empty(self.client.build(Method::PUT, url))
            .await?;

        debug!("Alert definition status updated");
        Ok(())
    }

    fn url(&self, path: &str, query: QueryParams) -> Result<url::Url> {
        let mut url = self.client.resolve(path)?;
        query.apply(&mut url);
        Ok(url)
    }
}
