//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// SMTP configuration for notifications and reports.
    #[serde(default)]
    pub email: EmailConfig,
    /// Reporting and planning settings.
    #[serde(default)]
    pub reports: ReportsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// SMTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
    /// Address of the staff mailbox that receives school responses.
    pub staff_email: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "planning@classplan.local".to_string(),
            from_name: "Classplan".to_string(),
            staff_email: "staff@classplan.local".to_string(),
        }
    }
}

/// Reporting and planning settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    /// Hourly rate used when a module has no usable price (decimal string).
    #[serde(default = "default_hourly_rate")]
    pub default_hourly_rate: String,
    /// Time-to-live of cached report results.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Maximum number of cached reports.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Send the weekly activity report.
    #[serde(default = "default_true")]
    pub weekly_enabled: bool,
    /// Send the monthly activity report.
    #[serde(default = "default_true")]
    pub monthly_enabled: bool,
    /// Recipients of scheduled reports.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Reject sessions that violate school constraints instead of warning.
    #[serde(default)]
    pub strict_constraints: bool,
}

fn default_hourly_rate() -> String {
    "50".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_hourly_rate: default_hourly_rate(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            weekly_enabled: true,
            monthly_enabled: true,
            recipients: Vec::new(),
            strict_constraints: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones: `config/default`,
    /// `config/{RUN_MODE}`, then `CLASSPLAN__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CLASSPLAN")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("reports.recipients")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                ("CLASSPLAN__DATABASE__URL", Some("postgres://localhost/classplan")),
                ("CLASSPLAN__JWT__SECRET", Some("secret")),
                ("CLASSPLAN__SERVER__PORT", Some("9090")),
                ("CLASSPLAN__REPORTS__RECIPIENTS", Some("a@x.fr,b@x.fr")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/classplan");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.jwt.access_token_expiry_secs, 3600);
                assert_eq!(config.reports.recipients, vec!["a@x.fr", "b@x.fr"]);
                assert_eq!(config.reports.default_hourly_rate, "50");
                assert_eq!(config.email.smtp_port, 1025);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("CLASSPLAN__DATABASE__URL", None::<&str>),
                ("CLASSPLAN__JWT__SECRET", Some("secret")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_reports_defaults() {
        let reports = ReportsConfig::default();
        assert_eq!(reports.cache_ttl_secs, 300);
        assert!(reports.weekly_enabled);
        assert!(reports.monthly_enabled);
        assert!(!reports.strict_constraints);
    }
}
