//! Relay configuration
//!
//! Every setting can come from a flag or from the environment. Values are
//! validated once, at startup, into a [`RelayConfig`] that is then passed by
//! reference to whatever needs it.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Args;
use url::Url;

use crate::error::ConfigError;

/// HubSpot form schema API
pub const DEFAULT_FORMS_API_URL: &str = "https://api.hubapi.com/marketing/v3/forms";
/// HubSpot form submission API
pub const DEFAULT_SUBMIT_API_URL: &str = "https://api.hsforms.com/submissions/v3/integration/submit";
/// Local front-end dev server
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
/// Relay listen port
pub const DEFAULT_PORT: u16 = 8888;

/// Raw settings as given on the command line or in the environment
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Private app token used to read form schemas
    #[arg(long, env = "HUBSPOT_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Account (portal) the form is registered under
    #[arg(long, env = "PORTALID")]
    pub portal_id: Option<String>,

    /// Contact form identifier
    #[arg(long, env = "CONTACTFORMID")]
    pub form_id: Option<String>,

    /// Port the relay listens on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The single browser origin allowed to call the relay
    #[arg(long, env = "CORS_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
    pub allowed_origin: String,

    /// Base URL of the form schema API
    #[arg(long, env = "HUBSPOT_FORMS_API_URL", default_value = DEFAULT_FORMS_API_URL)]
    pub forms_api_url: String,

    /// Base URL of the form submission API
    #[arg(long, env = "HUBSPOT_SUBMIT_API_URL", default_value = DEFAULT_SUBMIT_API_URL)]
    pub submit_api_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "HUBSPOT_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ConfigArgs {
    /// The only value a relay-backed shell needs
    pub fn require_form_id(&self) -> Result<String, ConfigError> {
        path_segment("CONTACTFORMID", self.form_id.as_deref())
    }
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bearer credential for the schema API
    pub api_token: String,
    /// Account id used in submission URLs
    pub portal_id: String,
    /// Default form
    pub form_id: String,
    /// Where the relay listens, on all interfaces
    pub listen_addr: SocketAddr,
    /// Serialized origin, ready for the CORS header
    pub allowed_origin: HeaderValue,
    /// Schema API base, no trailing slash
    pub forms_api_url: String,
    /// Submission API base, no trailing slash
    pub submit_api_url: String,
    /// Per-request upstream timeout
    pub timeout: Duration,
}

impl TryFrom<ConfigArgs> for RelayConfig {
    type Error = ConfigError;

    fn try_from(args: ConfigArgs) -> Result<Self, Self::Error> {
        let api_token = required("HUBSPOT_API_TOKEN", args.api_token.as_deref())?;
        if api_token.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                name: "HUBSPOT_API_TOKEN",
                reason: "must not contain whitespace".into(),
            });
        }

        if args.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "HUBSPOT_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            api_token,
            portal_id: path_segment("PORTALID", args.portal_id.as_deref())?,
            form_id: args.require_form_id()?,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], args.port)),
            allowed_origin: origin("CORS_ORIGIN", &args.allowed_origin)?,
            forms_api_url: base_url("HUBSPOT_FORMS_API_URL", &args.forms_api_url)?,
            submit_api_url: base_url("HUBSPOT_SUBMIT_API_URL", &args.submit_api_url)?,
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}

fn required(name: &'static str, value: Option<&str>) -> Result<String, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Identifiers are spliced into upstream URL paths and must stay one segment
pub(crate) fn check_path_segment(value: &str) -> Result<(), String> {
    if value == "." || value == ".." {
        return Err(format!("{value:?} is not an identifier"));
    }
    match value
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#' | '%'))
    {
        Some(bad) => Err(format!("{bad:?} is not allowed in an identifier")),
        None => Ok(()),
    }
}

fn path_segment(name: &'static str, value: Option<&str>) -> Result<String, ConfigError> {
    let value = required(name, value)?;
    check_path_segment(&value).map_err(|reason| ConfigError::Invalid { name, reason })?;
    Ok(value)
}

fn parse_http_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let url = parse_http_url(name, value)?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn origin(name: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    let url = parse_http_url(name, value)?;
    if url.path() != "/" || url.query().is_some() {
        return Err(ConfigError::Invalid {
            name,
            reason: "an origin has no path or query".into(),
        });
    }

    HeaderValue::from_str(&url.origin().ascii_serialization()).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn complete() -> ConfigArgs {
        ConfigArgs {
            api_token: Some("pat-na1-123".into()),
            portal_id: Some("123456".into()),
            form_id: Some("3b1f0c2e-5d4a-4a8e-9d57-1a2b3c4d5e6f".into()),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.into(),
            forms_api_url: DEFAULT_FORMS_API_URL.into(),
            submit_api_url: DEFAULT_SUBMIT_API_URL.into(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_complete_config() {
        let config = RelayConfig::try_from(complete()).unwrap();
        assert_eq!(config.portal_id, "123456");
        assert_eq!(config.listen_addr.port(), 8888);
        assert_eq!(config.allowed_origin, "http://localhost:3000");
        assert_eq!(config.forms_api_url, DEFAULT_FORMS_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_values_fail() {
        let mut args = complete();
        args.api_token = None;
        assert!(matches!(
            RelayConfig::try_from(args),
            Err(ConfigError::Missing("HUBSPOT_API_TOKEN"))
        ));

        let mut args = complete();
        args.portal_id = Some("   ".into());
        assert!(matches!(RelayConfig::try_from(args), Err(ConfigError::Missing("PORTALID"))));

        let mut args = complete();
        args.form_id = None;
        assert!(matches!(RelayConfig::try_from(args), Err(ConfigError::Missing("CONTACTFORMID"))));
    }

    #[test]
    fn test_identifier_must_be_a_path_segment() {
        let mut args = complete();
        args.form_id = Some("abc/../def".into());
        assert!(matches!(
            RelayConfig::try_from(args),
            Err(ConfigError::Invalid { name: "CONTACTFORMID", .. })
        ));
    }

    #[test]
    fn test_path_segment_rules() {
        assert!(check_path_segment("3b1f0c2e-5d4a-4a8e-9d57-1a2b3c4d5e6f").is_ok());
        assert!(check_path_segment("..").is_err());
        assert!(check_path_segment(".").is_err());
        assert!(check_path_segment("a\\b").is_err());
        assert!(check_path_segment("a?limit=1").is_err());
        assert!(check_path_segment("%2e%2e").is_err());
        assert!(check_path_segment("a\tb").is_err());
    }

    #[test]
    fn test_origin_validation() {
        let mut args = complete();
        args.allowed_origin = "https://example.com/".into();
        let config = RelayConfig::try_from(args).unwrap();
        assert_eq!(config.allowed_origin, "https://example.com");

        let mut args = complete();
        args.allowed_origin = "https://example.com/app".into();
        assert!(RelayConfig::try_from(args).is_err());

        let mut args = complete();
        args.allowed_origin = "ftp://example.com".into();
        assert!(RelayConfig::try_from(args).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut args = complete();
        args.submit_api_url = "http://127.0.0.1:9000/submit/".into();
        let config = RelayConfig::try_from(args).unwrap();
        assert_eq!(config.submit_api_url, "http://127.0.0.1:9000/submit");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut args = complete();
        args.timeout_secs = 0;
        assert!(matches!(
            RelayConfig::try_from(args),
            Err(ConfigError::Invalid { name: "HUBSPOT_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn test_flags_parse() {
        let cli = TestCli::try_parse_from([
            "test",
            "--api-token",
            "tok",
            "--portal-id",
            "42",
            "--form-id",
            "form-1",
            "--port",
            "9000",
        ])
        .unwrap();

        let config = RelayConfig::try_from(cli.config).unwrap();
        assert_eq!(config.api_token, "tok");
        assert_eq!(config.form_id, "form-1");
        assert_eq!(config.listen_addr.port(), 9000);
    }

    #[test]
    fn test_require_form_id_alone() {
        let args = ConfigArgs {
            form_id: Some("form-1".into()),
            ..ConfigArgs::default()
        };
        assert_eq!(args.require_form_id().unwrap(), "form-1");
        assert!(ConfigArgs::default().require_form_id().is_err());
    }
}
