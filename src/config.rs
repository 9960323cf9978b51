use crate::error::{AppError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Largest accepted request body (16 MiB)
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Rows shown in a preview table
pub const PREVIEW_ROWS: usize = 50;

const DEFAULT_MAIL_PORT: u16 = 587;

/// Command line options; every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "website", about = "Upload, filter and summarise CSV order exports")]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory uploaded files are written to
    #[arg(long, env = "UPLOAD_FOLDER", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// SMTP settings read from `MAIL_*` variables
#[derive(Clone, Debug, PartialEq)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_tls: bool,
    pub use_ssl: bool,
}

impl MailConfig {
    /// Read mail settings from the process environment
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read mail settings through `get`
    ///
    /// Returns `Ok(None)` unless server, username and password are all set
    /// to non-empty values. A port that is not a number is an error.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let non_empty = |key: &str| get(key).filter(|v| !v.is_empty());

        let port = match non_empty("MAIL_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("MAIL_PORT is not a valid port: {}", raw)))?,
            None => DEFAULT_MAIL_PORT,
        };
        let use_tls = parse_flag(get("MAIL_USE_TLS").as_deref(), true);
        let use_ssl = parse_flag(get("MAIL_USE_SSL").as_deref(), false);

        let (Some(server), Some(username), Some(password)) = (
            non_empty("MAIL_SERVER"),
            non_empty("MAIL_USERNAME"),
            non_empty("MAIL_PASSWORD"),
        ) else {
            return Ok(None);
        };

        Ok(Some(MailConfig {
            server,
            port,
            username,
            password,
            use_tls,
            use_ssl,
        }))
    }
}

/// Runtime configuration for the web server
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub preview_rows: usize,
    pub mail: Option<MailConfig>,
}

impl Config {
    /// Combine command line options with mail settings from the environment
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Config {
            host: cli.host.clone(),
            port: cli.port,
            upload_dir: cli.upload_dir.clone(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            preview_rows: PREVIEW_ROWS,
            mail: MailConfig::from_env()?,
        })
    }

    /// Defaults with a given upload folder and no mail server
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_dir: upload_dir.into(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            preview_rows: PREVIEW_ROWS,
            mail: None,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `true`, `1` and `t` (any case) are true; anything else set is false
fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "t"),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn flags() {
        assert!(parse_flag(Some("TRUE"), false));
        assert!(parse_flag(Some("t"), false));
        assert!(parse_flag(Some("1"), false));
        assert!(!parse_flag(Some("yes"), true));
        assert!(parse_flag(None, true));
        assert!(!parse_flag(None, false));
    }

    #[test]
    fn mail_needs_server_user_and_password() {
        let partial = lookup(&[("MAIL_SERVER", "smtp.example.com"), ("MAIL_USERNAME", "me")]);
        assert_eq!(MailConfig::from_lookup(partial).unwrap(), None);

        let blank = lookup(&[
            ("MAIL_SERVER", "smtp.example.com"),
            ("MAIL_USERNAME", "me"),
            ("MAIL_PASSWORD", ""),
        ]);
        assert_eq!(MailConfig::from_lookup(blank).unwrap(), None);
    }

    #[test]
    fn mail_defaults() {
        let env = lookup(&[
            ("MAIL_SERVER", "smtp.example.com"),
            ("MAIL_USERNAME", "me@example.com"),
            ("MAIL_PASSWORD", "secret"),
        ]);
        let mail = MailConfig::from_lookup(env).unwrap().unwrap();
        assert_eq!(mail.port, 587);
        assert!(mail.use_tls);
        assert!(!mail.use_ssl);
    }

    #[test]
    fn mail_overrides_and_bad_port() {
        let env = lookup(&[
            ("MAIL_SERVER", "smtp.example.com"),
            ("MAIL_USERNAME", "me@example.com"),
            ("MAIL_PASSWORD", "secret"),
            ("MAIL_PORT", "465"),
            ("MAIL_USE_TLS", "False"),
            ("MAIL_USE_SSL", "True"),
        ]);
        let mail = MailConfig::from_lookup(env).unwrap().unwrap();
        assert_eq!(mail.port, 465);
        assert!(!mail.use_tls);
        assert!(mail.use_ssl);

        let bad = lookup(&[("MAIL_PORT", "smtp")]);
        assert!(matches!(MailConfig::from_lookup(bad), Err(AppError::Config(_))));
    }

    #[test]
    fn cli_flags_and_defaults() {
        let cli =
            Cli::try_parse_from(["website", "--port", "8080", "--upload-dir", "data", "-v"]).unwrap();
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.upload_dir, PathBuf::from("data"));
        assert!(cli.verbose);
        let config = Config::with_upload_dir("/tmp/x");
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.preview_rows, 50);
    }
}
