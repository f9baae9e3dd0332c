//! Configuration for advance service module

use crate::contract::CompanyProfile;
use crate::domain::ServiceOptions;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Advance service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Currency code printed on receipts
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Company block printed on receipts
    #[serde(default)]
    pub company: CompanyConfig,

    /// Repayment history page size when the request names none
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u64,

    /// Largest accepted `per_page`
    #[serde(default = "default_max_history_page_size")]
    pub max_history_page_size: u64,

    /// Share of basic salary an employee may have committed in advances; unset disables the check
    #[serde(default = "default_max_outstanding_salary_ratio")]
    pub max_outstanding_salary_ratio: Option<Decimal>,

    /// Employee-level repayments must cover the combined monthly deduction
    #[serde(default = "default_true")]
    pub enforce_minimum_repayment: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            company: CompanyConfig::default(),
            history_page_size: default_history_page_size(),
            max_history_page_size: default_max_history_page_size(),
            max_outstanding_salary_ratio: default_max_outstanding_salary_ratio(),
            enforce_minimum_repayment: true,
        }
    }
}

impl Config {
    /// Check values serde cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.currency.len() == 3 && self.currency.chars().all(|c| c.is_ascii_uppercase()),
            "currency must be a three letter ISO code, got '{}'",
            self.currency
        );
        anyhow::ensure!(
            self.history_page_size >= 1 && self.history_page_size <= self.max_history_page_size,
            "history_page_size must be between 1 and max_history_page_size ({})",
            self.max_history_page_size
        );
        if let Some(ratio) = self.max_outstanding_salary_ratio {
            anyhow::ensure!(
                ratio > Decimal::ZERO,
                "max_outstanding_salary_ratio must be positive"
            );
        }
        Ok(())
    }

    pub fn into_options(self) -> ServiceOptions {
        ServiceOptions {
            currency: self.currency,
            company: CompanyProfile {
                name: self.company.name,
                address: self.company.address,
                phone: self.company.phone,
                email: self.company.email,
            },
            history_page_size: self.history_page_size,
            max_history_page_size: self.max_history_page_size,
            max_outstanding_salary_ratio: self.max_outstanding_salary_ratio,
            enforce_minimum_repayment: self.enforce_minimum_repayment,
        }
    }
}

fn default_currency() -> String {
    "SAR".to_string()
}

fn default_history_page_size() -> u64 {
    10
}

fn default_max_history_page_size() -> u64 {
    100
}

fn default_max_outstanding_salary_ratio() -> Option<Decimal> {
    Some(Decimal::new(5, 1))
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_options() {
        let options = Config::default().into_options();
        let expected = ServiceOptions::default();
        assert_eq!(options.currency, expected.currency);
        assert_eq!(options.history_page_size, expected.history_page_size);
        assert_eq!(
            options.max_outstanding_salary_ratio,
            expected.max_outstanding_salary_ratio
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"currency": "USD", "company": {"name": "Acme"}}"#).unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.company.name, "Acme");
        assert_eq!(config.history_page_size, 10);
        assert!(config.enforce_minimum_repayment);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<Config, _> = serde_json::from_str(r#"{"curency": "USD"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            currency: "riyal".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            history_page_size: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
