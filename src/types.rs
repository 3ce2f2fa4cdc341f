use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DevoError, Result};
use crate::query::QueryParams;
use crate::serde_helpers::{
    null_as_default, opt_string_from_number_or_string, string_from_number_or_string,
};

/// Condition that fires an alert
///
/// Only `kind` is mandatory. The remaining parameters depend on the kind
/// (`each`, `several`, `low`, `high`, `rolling`, ...) and are carried as
/// strings, matching the wire contract. `None` means "not set", which is
/// distinct from `Some("0")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationTrigger {
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub external_offset: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub internal_period: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub internal_offset: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub period: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub threshold: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub back_period: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub absolute: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub aggregation_column: Option<String>,
}

impl CorrelationTrigger {
    /// Create a trigger of the given kind with no parameters set
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    /// Set the external offset
    pub fn with_external_offset(mut self, value: &str) -> Self {
        self.external_offset = Some(value.to_string());
        self
    }

    /// Set the internal period
    pub fn with_internal_period(mut self, value: &str) -> Self {
        self.internal_period = Some(value.to_string());
        self
    }

    /// Set the internal offset
    pub fn with_internal_offset(mut self, value: &str) -> Self {
        self.internal_offset = Some(value.to_string());
        self
    }

    /// Set the evaluation period
    pub fn with_period(mut self, value: &str) -> Self {
        self.period = Some(value.to_string());
        self
    }

    /// Set the threshold the trigger fires at
    pub fn with_threshold(mut self, value: &str) -> Self {
        self.threshold = Some(value.to_string());
        self
    }

    /// Set the back period
    pub fn with_back_period(mut self, value: &str) -> Self {
        self.back_period = Some(value.to_string());
        self
    }

    /// Set the absolute flag
    pub fn with_absolute(mut self, value: &str) -> Self {
        self.absolute = Some(value.to_string());
        self
    }

    /// Set the column aggregated by the trigger
    pub fn with_aggregation_column(mut self, value: &str) -> Self {
        self.aggregation_column = Some(value.to_string());
        self
    }
}

/// The query an alert watches and the trigger evaluated against it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationContext {
    /// LINQ query the alert is evaluated on
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_source_code: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: i32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub correlation_trigger: CorrelationTrigger,

    /// Server-assigned
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_from_number_or_string"
    )]
    pub id: Option<String>,

    /// Server-assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_id: Option<String>,

    /// Server-assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

impl CorrelationContext {
    /// Create a context for a query and trigger
    pub fn new(query_source_code: &str, trigger: CorrelationTrigger) -> Self {
        Self {
            query_source_code: query_source_code.to_string(),
            correlation_trigger: trigger,
            ..Self::default()
        }
    }

    /// Set the alert priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Alert definition as stored by Devo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDefinition {
    /// Server-assigned identifier, empty until created
    #[serde(default, deserialize_with = "string_from_number_or_string")]
    pub id: String,

    /// Server-assigned creation time, epoch milliseconds
    #[serde(default, deserialize_with = "string_from_number_or_string")]
    pub creation_date: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategory: String,

    #[serde(default, deserialize_with = "string_from_number_or_string")]
    pub subcategory_id: String,

    #[serde(default, deserialize_with = "string_from_number_or_string")]
    pub category_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_alert_chain: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub alert_correlation_context: CorrelationContext,

    #[serde(
        rename = "actionPolicyId",
        default,
        deserialize_with = "null_as_default"
    )]
    pub action_policy_ids: Vec<Value>,
}

impl AlertDefinition {
    /// Creation time, if `creation_date` holds epoch milliseconds
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.creation_date.trim().parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Kind of the correlation trigger
    pub fn trigger_kind(&self) -> &str {
        &self.alert_correlation_context.correlation_trigger.kind
    }
}

/// Parameters for listing alert definitions
///
/// Page and size both count from 0: `page = 2, size = 5` over 22 alerts
/// returns alerts 10 to 14. Pagination is never performed automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Page to fetch, counting from 0
    pub page: Option<u32>,
    /// Alerts per page
    pub size: Option<u32>,
    /// Case-insensitive substring match on alert names
    pub name_filter: Option<String>,
    /// Return only the alert definition with this ID
    pub id_filter: Option<String>,
}

impl ListRequest {
    /// List everything the API returns by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page to fetch
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Only return alerts whose name contains `filter`
    pub fn with_name_filter(mut self, filter: &str) -> Self {
        self.name_filter = Some(filter.to_string());
        self
    }

    /// Only return the alert with this ID
    pub fn with_id_filter(mut self, id: &str) -> Self {
        self.id_filter = Some(id.to_string());
        self
    }

    pub(crate) fn query(&self) -> QueryParams {
        QueryParams::new()
            .optional("page", self.page)
            .optional("size", self.size)
            .optional("nameFilter", self.name_filter.as_deref())
            .optional("idFilter", self.id_filter.as_deref())
    }
}

/// Payload for creating an alert definition
///
/// # Example
///
/// ```rust
/// use devo_alerts::{CorrelationContext, CorrelationTrigger, CreateRequest};
///
/// let request = CreateRequest::new(
///     "Alert_API_each",
///     "lib.my.testfake.AlertAPI",
///     CorrelationContext::new(
///         "from siem.logtrust.web.activity select *",
///         CorrelationTrigger::new("each"),
///     )
///     .with_priority(5),
/// )
/// .with_message("$eventdate $username")
/// .with_description("Alert created by API");
///
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub name: String,
    pub message: String,
    pub description: String,
    pub subcategory: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    pub is_alert_chain: bool,

    pub alert_correlation_context: CorrelationContext,

    #[serde(rename = "actionPolicyId")]
    pub action_policy_ids: Vec<Value>,
}

impl CreateRequest {
    /// Create a request with the required fields set
    pub fn new(name: &str, subcategory: &str, context: CorrelationContext) -> Self {
        Self {
            name: name.to_string(),
            subcategory: subcategory.to_string(),
            alert_correlation_context: context,
            ..Self::default()
        }
    }

    /// Set the notification message
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Set the category ID
    pub fn with_category_id(mut self, category_id: &str) -> Self {
        self.category_id = Some(category_id.to_string());
        self
    }

    /// Set the subcategory ID
    pub fn with_subcategory_id(mut self, subcategory_id: &str) -> Self {
        self.subcategory_id = Some(subcategory_id.to_string());
        self
    }

    /// Create the alert enabled or disabled
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    /// Mark the alert as an alert chain
    pub fn with_alert_chain(mut self, alert_chain: bool) -> Self {
        self.is_alert_chain = alert_chain;
        self
    }

    /// Attach an action policy
    pub fn with_action_policy(mut self, policy: impl Into<Value>) -> Self {
        self.action_policy_ids.push(policy.into());
        self
    }

    /// Check the fields the API requires on creation
    pub fn validate(&self) -> Result<()> {
        let context = &self.alert_correlation_context;
        let missing = if self.name.trim().is_empty() {
            "name"
        } else if self.subcategory.trim().is_empty() {
            "subcategory"
        } else if context.query_source_code.trim().is_empty() {
            "alertCorrelationContext.querySourceCode"
        } else if context.correlation_trigger.kind.trim().is_empty() {
            "alertCorrelationContext.correlationTrigger.kind"
        } else {
            return Ok(());
        };
        Err(DevoError::Validation(format!(
            "alert definition is missing required field '{missing}'"
        )))
    }
}

/// Payload for updating an existing alert definition
///
/// The server is the authority on what an update needs; no fields are
/// checked client-side. Start from a listed definition to keep the fields
/// you do not intend to change:
///
/// ```rust
/// use devo_alerts::{AlertDefinition, UpdateRequest};
///
/// let existing = AlertDefinition {
///     id: "70736".to_string(),
///     name: "old name".to_string(),
///     ..AlertDefinition::default()
/// };
/// let update = UpdateRequest::from(existing).with_name("new name");
/// assert_eq!(update.id, "70736");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub id: String,
    pub name: String,
    pub message: String,
    pub description: String,
    pub subcategory: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    pub is_alert_chain: bool,

    pub alert_correlation_context: CorrelationContext,

    #[serde(rename = "actionPolicyId")]
    pub action_policy_ids: Vec<Value>,
}

impl UpdateRequest {
    /// Set the name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the notification message
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Replace the correlation context
    pub fn with_correlation_context(mut self, context: CorrelationContext) -> Self {
        self.alert_correlation_context = context;
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl From<AlertDefinition> for UpdateRequest {
    fn from(alert: AlertDefinition) -> Self {
        Self {
            id: alert.id,
            name: alert.name,
            message: alert.message,
            description: alert.description,
            subcategory: alert.subcategory,
            category_id: non_empty(alert.category_id),
            subcategory_id: non_empty(alert.subcategory_id),
            is_active: Some(alert.is_active),
            is_alert_chain: alert.is_alert_chain,
            alert_correlation_context: alert.alert_correlation_context,
            action_policy_ids: alert.action_policy_ids,
        }
    }
}

/// Alert definitions to delete in one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteRequest {
    pub alert_ids: Vec<String>,
}

impl DeleteRequest {
    /// Delete the given alert IDs
    pub fn new<I, S>(alert_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alert_ids: alert_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Check that at least one ID is given and none are blank
    pub fn validate(&self) -> Result<()> {
        validate_ids(&self.alert_ids)
    }

    pub(crate) fn query(&self) -> QueryParams {
        QueryParams::new().repeated("alertIds", &self.alert_ids)
    }
}

/// Enable or disable a set of alert definitions in one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdateRequest {
    pub alert_ids: Vec<String>,
    pub enable: bool,
}

impl StatusUpdateRequest {
    /// Set the status of the given alert IDs
    pub fn new<I, S>(alert_ids: I, enable: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alert_ids: alert_ids.into_iter().map(Into::into).collect(),
            enable,
        }
    }

    /// Enable the given alert IDs
    pub fn enable<I, S>(alert_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(alert_ids, true)
    }

    /// Disable the given alert IDs
    pub fn disable<I, S>(alert_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(alert_ids, false)
    }

    /// Check that at least one ID is given and none are blank
    pub fn validate(&self) -> Result<()> {
        validate_ids(&self.alert_ids)
    }

    pub(crate) fn query(&self) -> QueryParams {
        QueryParams::new()
            .repeated("alertIds", &self.alert_ids)
            .required("enable", self.enable)
    }
}

fn validate_ids(alert_ids: &[String]) -> Result<()> {
    if alert_ids.is_empty() {
        return Err(DevoError::Validation(
            "at least one alert ID is required".to_string(),
        ));
    }
    if alert_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(DevoError::Validation(
            "alert IDs cannot be blank".to_string(),
        ));
    }
    Ok(())
}
