use std::path::PathBuf;
use std::str::FromStr;

use crate::adapters::kraken_graphql::{AuthHeaderStyle, DEFAULT_GRAPHQL_URL};
use crate::app::AppError;
use crate::domain::meter_selection::MeterSchema;
use crate::domain::models::{Campaign, Credential};
use crate::domain::render::OutputFormat;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credential: Credential,
    pub account_number: Option<String>,
    pub mpan: Option<String>,
    pub output_format: OutputFormat,
    pub campaign: Campaign,
    pub campaign_slug: String,
    pub output_path: PathBuf,
    pub graphql_url: String,
    pub auth_header_style: AuthHeaderStyle,
    pub meter_schema: MeterSchema,
    pub replay_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env(campaign: Option<Campaign>) -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok(), campaign)
    }

    /// `campaign` pins the campaign for dedicated binaries; otherwise `CAMPAIGN` decides.
    pub(crate) fn from_lookup<F>(lookup: F, campaign: Option<Campaign>) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = resolve_credential(&lookup)?;

        let campaign = match campaign {
            Some(campaign) => campaign,
            None => parse_or_default(&lookup, "CAMPAIGN", Campaign::PowerUp)?,
        };

        let campaign_slug = non_empty(&lookup, "CAMPAIGN_SLUG")
            .unwrap_or_else(|| campaign.default_slug().to_string());

        let output_path = match non_empty(&lookup, "OUTPUT_PATH") {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(non_empty(&lookup, "OUTPUT_ROOT").unwrap_or_else(|| ".".into()))
                .join(campaign.output_file_name()),
        };

        Ok(Self {
            credential,
            account_number: non_empty(&lookup, "OCTOPUS_ACCOUNT_NUMBER"),
            mpan: non_empty(&lookup, "OCTOPUS_MPAN"),
            output_format: parse_or_default(&lookup, "OUTPUT_FORMAT", OutputFormat::Human)?,
            campaign,
            campaign_slug,
            output_path,
            graphql_url: non_empty(&lookup, "OCTOPUS_GRAPHQL_URL")
                .unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string()),
            auth_header_style: parse_or_default(&lookup, "AUTH_HEADER_STYLE", AuthHeaderStyle::Raw)?,
            meter_schema: parse_or_default(&lookup, "METER_SCHEMA", MeterSchema::Direction)?,
            replay_file: non_empty(&lookup, "OCTOPUS_REPLAY_FILE").map(PathBuf::from),
        })
    }
}

fn resolve_credential<F>(lookup: &F) -> Result<Credential, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(api_key) = non_empty(lookup, "OCTOPUS_API_KEY") {
        return Ok(Credential::ApiKey(api_key));
    }

    match (
        non_empty(lookup, "OCTOPUS_EMAIL"),
        non_empty(lookup, "OCTOPUS_PASSWORD"),
    ) {
        (Some(email), Some(password)) => Ok(Credential::EmailPassword { email, password }),
        (Some(_), None) => Err(AppError::config(
            "OCTOPUS_PASSWORD is required when OCTOPUS_EMAIL is set",
        )),
        (None, Some(_)) => Err(AppError::config(
            "OCTOPUS_EMAIL is required when OCTOPUS_PASSWORD is set",
        )),
        (None, None) => Err(AppError::config(
            "OCTOPUS_API_KEY (or OCTOPUS_EMAIL and OCTOPUS_PASSWORD) is required",
        )),
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::config(format!("{key}: {err}"))),
        None => Ok(default),
    }
}
