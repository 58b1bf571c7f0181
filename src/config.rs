//! Provider configuration.
//!
//! Credentials and routing come from the provider block of the configuration,
//! falling back to the environment variables the Twilio tooling uses:
//!
//! | Attribute     | Environment variable  |
//! |---------------|-----------------------|
//! | `account_sid` | `TWILIO_ACCOUNT_SID`  |
//! | `auth_token`  | `TWILIO_AUTH_TOKEN`   |
//! | `region`      | `TWILIO_REGION`       |
//! | `edge`        | `TWILIO_EDGE`         |

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Environment variable holding the account SID.
pub const ACCOUNT_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
/// Environment variable holding the auth token.
pub const AUTH_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";
/// Environment variable holding the region.
pub const REGION_ENV: &str = "TWILIO_REGION";
/// Environment variable holding the edge location.
pub const EDGE_ENV: &str = "TWILIO_EDGE";

/// Region used when only an edge is given.
const DEFAULT_REGION: &str = "us1";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    account_sid: Option<String>,
    auth_token: Option<String>,
    region: Option<String>,
    edge: Option<String>,
}

/// Resolved provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// The account the credentials belong to.
    pub account_sid: String,
    /// The auth token (never logged).
    pub auth_token: String,
    /// The processing region, if any.
    pub region: Option<String>,
    /// The edge location, if any.
    pub edge: Option<String>,
}

impl ProviderConfig {
    /// The schema of the provider configuration block.
    ///
    /// Every attribute is optional here because each may come from the
    /// environment instead.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Credentials and routing for the Twilio REST API")
            .with_attribute(
                "account_sid",
                Attribute::optional_string().with_description("Account SID (or TWILIO_ACCOUNT_SID)"),
            )
            .with_attribute(
                "auth_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Auth token (or TWILIO_AUTH_TOKEN)"),
            )
            .with_attribute(
                "region",
                Attribute::optional_string().with_description("Processing region (or TWILIO_REGION)"),
            )
            .with_attribute(
                "edge",
                Attribute::optional_string().with_description("Edge location (or TWILIO_EDGE)"),
            )
    }

    /// Resolve the configuration, falling back to the process environment.
    pub fn from_value(config: Value) -> Result<Self, ProviderError> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve the configuration, falling back to `env` for unset attributes.
    pub fn resolve<F>(config: Value, env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = match config {
            Value::Null => RawConfig::default(),
            other => serde_json::from_value(other)
                .map_err(|e| ProviderError::Configuration(format!("Malformed provider config: {}", e)))?,
        };

        let pick = |value: Option<String>, var: &str| {
            value
                .filter(|v| !v.is_empty())
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };

        let account_sid = pick(raw.account_sid, ACCOUNT_SID_ENV).ok_or_else(|| {
            ProviderError::Configuration(format!(
                "account_sid is not set and {} is empty",
                ACCOUNT_SID_ENV
            ))
        })?;
        let auth_token = pick(raw.auth_token, AUTH_TOKEN_ENV).ok_or_else(|| {
            ProviderError::Configuration(format!(
                "auth_token is not set and {} is empty",
                AUTH_TOKEN_ENV
            ))
        })?;

        Ok(Self {
            account_sid,
            auth_token,
            region: pick(raw.region, REGION_ENV),
            edge: pick(raw.edge, EDGE_ENV),
        })
    }

    /// The API host requests should be sent to.
    ///
    /// An edge without a region routes through the default region.
    pub fn api_host(&self) -> String {
        let region = match (&self.region, &self.edge) {
            (Some(region), _) => Some(region.as_str()),
            (None, Some(_)) => Some(DEFAULT_REGION),
            (None, None) => None,
        };
        let mut pieces = vec!["api"];
        if let Some(edge) = &self.edge {
            pieces.push(edge.as_str());
        }
        if let Some(region) = region {
            pieces.push(region);
        }
        pieces.push("twilio.com");
        pieces.join(".")
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("region", &self.region)
            .field("edge", &self.edge)
            .finish()
    }
}
