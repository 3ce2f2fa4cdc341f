use std::fmt::{Display, Formatter};

use url::Url;

use crate::errors::{DevoError, Result};

/// Default Alerts API endpoint for the US region
pub const ALERTS_API_US_DEFAULT_ENDPOINT: &str = "https://api-us.devo.com/alerts";

/// Default Alerts API endpoint for the EU region
pub const ALERTS_API_EU_DEFAULT_ENDPOINT: &str = "https://api-eu.devo.com/alerts";

/// Devo region hosting the Alerts API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    /// Default Alerts API endpoint for this region
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Region::Us => ALERTS_API_US_DEFAULT_ENDPOINT,
            Region::Eu => ALERTS_API_EU_DEFAULT_ENDPOINT,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Us => write!(f, "us"),
            Region::Eu => write!(f, "eu"),
        }
    }
}

/// Base URL of the Alerts API that operation paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parse an endpoint override
    ///
    /// The base path always ends with `/` afterwards, so
    /// `https://api-us.devo.com/alerts` resolves `v1/alertDefinitions` to
    /// `https://api-us.devo.com/alerts/v1/alertDefinitions`.
    ///
    /// # Errors
    ///
    /// Returns [`DevoError::Configuration`] if the string is empty, is not a
    /// URL, or cannot serve as a base URL.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(DevoError::Configuration(
                "alerts endpoint cannot be empty".to_string(),
            ));
        }

        let mut base = Url::parse(trimmed).map_err(|err| {
            DevoError::Configuration(format!("invalid alerts endpoint '{trimmed}': {err}"))
        })?;

        if base.cannot_be_a_base() {
            return Err(DevoError::Configuration(format!(
                "alerts endpoint '{trimmed}' cannot be used as a base URL"
            )));
        }

        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { base })
    }

    /// Default endpoint for a region
    pub fn for_region(region: Region) -> Self {
        Self::parse(region.default_endpoint()).expect("Valid region endpoint")
    }

    /// Resolve a relative operation path against the base URL
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|source| DevoError::MalformedUrl {
                url: path.to_string(),
                source,
            })
    }

    /// Get the base URL
    pub fn as_url(&self) -> &Url {
        &self.base
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::for_region(Region::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_defaults_parse() {
        for region in [Region::Us, Region::Eu] {
            let endpoint = Endpoint::for_region(region);
            assert_eq!(
                endpoint.as_url().as_str(),
                format!("{}/", region.default_endpoint())
            );
        }
    }

    #[test]
    fn test_default_is_us() {
        assert_eq!(Region::default(), Region::Us);
        assert_eq!(
            Endpoint::default().as_url().as_str(),
            "https://api-us.devo.com/alerts/"
        );
    }

    #[test]
    fn test_resolve_appends_to_base_path() {
        let endpoint = Endpoint::for_region(Region::Eu);
        let url = endpoint.resolve("v1/alertDefinitions").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api-eu.devo.com/alerts/v1/alertDefinitions"
        );

        let url = endpoint.resolve("/v1/alertDefinitions/status").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api-eu.devo.com/alerts/v1/alertDefinitions/status"
        );
    }

    #[test]
    fn test_parse_override_with_trailing_slash() {
        let endpoint = Endpoint::parse("http://localhost:8080/alerts/").unwrap();
        let url = endpoint.resolve("v1/alertDefinitions").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/alerts/v1/alertDefinitions");
    }

    #[test]
    fn test_parse_drops_query_and_fragment() {
        let endpoint = Endpoint::parse("https://devo.example.com/alerts?x=1#top").unwrap();
        assert_eq!(endpoint.as_url().as_str(), "https://devo.example.com/alerts/");
    }

    #[test]
    fn test_parse_empty_is_configuration_error() {
        for input in ["", "   "] {
            let result = Endpoint::parse(input);
            assert!(matches!(result, Err(DevoError::Configuration(_))));
        }
    }

    #[test]
    fn test_parse_invalid_is_configuration_error() {
        assert!(matches!(
            Endpoint::parse("not a url"),
            Err(DevoError::Configuration(_))
        ));
        assert!(matches!(
            Endpoint::parse("mailto:alerts@devo.com"),
            Err(DevoError::Configuration(_))
        ));
    }

    #[test]
    fn test_region_display() {
        assert_eq!(Region::Us.to_string(), "us");
        assert_eq!(Region::Eu.to_string(), "eu");
    }
}
