//! Runtime configuration.
//!
//! All options come from `PAYSLIP_`-prefixed environment variables,
//! optionally seeded from a `.env` file.  The resulting [`Settings`]
//! value is read once at start-up and handed to the batch runner and
//! the API explicitly; nothing else looks at the environment.

use crate::layout::{CompanyProfile, Rgb};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PAYSLIP_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("brand colour {0:?} is not a #RRGGBB value")]
    BrandColor(String),
}

/// SMTP options for the outbound mailer.
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub starttls: bool,
    pub timeout: Duration,
    pub from_name: String,
    pub from_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_company_name")]
    pub company_name: String,
    /// Address lines separated by a newline or a literal `\n`.
    #[serde(default = "default_company_address")]
    pub company_address: String,
    #[serde(default = "default_brand_color")]
    pub brand_color: String,
    /// Generate every month since joining instead of only the current one.
    #[serde(default)]
    pub send_all_past: bool,
    #[serde(default = "default_employees_file")]
    pub employees_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_sent_log")]
    pub sent_log: PathBuf,
    #[serde(default = "default_logo_file")]
    pub logo_file: PathBuf,

    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default = "default_true")]
    pub smtp_starttls: bool,
    #[serde(default = "default_smtp_timeout_secs")]
    pub smtp_timeout_secs: u64,
    /// Sender display name; the company name when unset.
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_email: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_company_name() -> String {
    "Arun Arudra".to_string()
}

fn default_company_address() -> String {
    "#19299910, 622nd Floor, 2000th Main, 1998th Phase,\nArudra Nagar, Bengaluru - 560 000."
        .to_string()
}

fn default_brand_color() -> String {
    "#000000".to_string()
}

fn default_employees_file() -> PathBuf {
    PathBuf::from("employees.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("payslips")
}

fn default_sent_log() -> PathBuf {
    PathBuf::from(".payslip_sent_log.json")
}

fn default_logo_file() -> PathBuf {
    PathBuf::from("logo.svg")
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            company_address: default_company_address(),
            brand_color: default_brand_color(),
            send_all_past: false,
            employees_file: default_employees_file(),
            output_dir: default_output_dir(),
            sent_log: default_sent_log(),
            logo_file: default_logo_file(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_starttls: true,
            smtp_timeout_secs: default_smtp_timeout_secs(),
            from_name: None,
            from_email: String::new(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl Settings {
    /// Load settings from the environment, honouring a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::prefixed(ENV_PREFIX).from_env::<Settings>()?)
    }

    /// Load settings from explicit `PAYSLIP_`-prefixed pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Settings>(vars)?)
    }

    pub fn address_lines(&self) -> Vec<String> {
        self.company_address
            .replace("\\n", "\n")
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The company identity used by the layout engine.
    pub fn company_profile(&self) -> Result<CompanyProfile, ConfigError> {
        let brand_color = Rgb::from_hex(&self.brand_color)
            .ok_or_else(|| ConfigError::BrandColor(self.brand_color.clone()))?;
        Ok(CompanyProfile {
            name: self.company_name.clone(),
            address_lines: self.address_lines(),
            brand_color,
        })
    }

    /// SMTP options, or `None` when email is disabled.  Email needs both
    /// credentials and a relay host.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        if self.smtp_username.trim().is_empty()
            || self.smtp_password.is_empty()
            || self.smtp_host.trim().is_empty()
        {
            return None;
        }
        let from_email = if self.from_email.trim().is_empty() {
            self.smtp_username.trim().to_string()
        } else {
            self.from_email.trim().to_string()
        };
        Some(SmtpSettings {
            host: self.smtp_host.trim().to_string(),
            port: self.smtp_port,
            username: self.smtp_username.trim().to_string(),
            password: self.smtp_password.clone(),
            starttls: self.smtp_starttls,
            timeout: Duration::from_secs(self.smtp_timeout_secs),
            from_name: self
                .from_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| self.company_name.clone()),
            from_email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = Settings::from_vars(Vec::new()).unwrap();
        assert_eq!(settings.company_name, "Arun Arudra");
        assert_eq!(settings.employees_file, PathBuf::from("employees.csv"));
        assert_eq!(settings.smtp_port, 587);
        assert!(settings.smtp_starttls);
        assert!(!settings.send_all_past);
        assert_eq!(settings.bind_addr, "127.0.0.1:3000");
        assert!(settings.smtp().is_none());
    }

    #[test]
    fn reads_prefixed_variables() {
        let settings = Settings::from_vars(vars(&[
            ("PAYSLIP_COMPANY_NAME", "Acme"),
            ("PAYSLIP_SEND_ALL_PAST", "true"),
            ("PAYSLIP_SMTP_PORT", "465"),
            ("PAYSLIP_OUTPUT_DIR", "/tmp/out"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();
        assert_eq!(settings.company_name, "Acme");
        assert!(settings.send_all_past);
        assert_eq!(settings.smtp_port, 465);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn malformed_value_is_an_error() {
        let err = Settings::from_vars(vars(&[("PAYSLIP_SMTP_PORT", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env(_)));
    }

    #[test]
    fn address_splits_on_escaped_newlines() {
        let settings = Settings {
            company_address: r"Floor 6\n Bengaluru".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.address_lines(), vec!["Floor 6", "Bengaluru"]);
        assert_eq!(Settings::default().address_lines().len(), 2);
    }

    #[test]
    fn brand_color_must_be_full_hex() {
        let mut settings = Settings {
            brand_color: "#1A2B3C".to_string(),
            ..Settings::default()
        };
        let profile = settings.company_profile().unwrap();
        assert_eq!(profile.brand_color, Rgb::new(0x1A, 0x2B, 0x3C));

        settings.brand_color = "teal".to_string();
        assert!(matches!(
            settings.company_profile(),
            Err(ConfigError::BrandColor(_))
        ));
        settings.brand_color = "#abc".to_string();
        assert!(matches!(
            settings.company_profile(),
            Err(ConfigError::BrandColor(_))
        ));
        settings.brand_color = " #0004E8 ".to_string();
        assert_eq!(
            settings.company_profile().unwrap().brand_color,
            Rgb::new(0, 4, 0xE8)
        );
    }

    #[test]
    fn smtp_needs_both_credentials() {
        let mut settings = Settings {
            smtp_host: "mail.example.com".to_string(),
            smtp_username: "payroll@example.com".to_string(),
            ..Settings::default()
        };
        assert!(settings.smtp().is_none());

        settings.smtp_password = "secret".to_string();
        let smtp = settings.smtp().unwrap();
        assert_eq!(smtp.from_name, "Arun Arudra");
        assert_eq!(smtp.from_email, "payroll@example.com");
        assert_eq!(smtp.timeout, Duration::from_secs(30));

        settings.smtp_host = " ".to_string();
        assert!(settings.smtp().is_none());
    }
}
