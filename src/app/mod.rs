mod config;
mod error;
mod logging;
mod runtime;

pub use config::AppConfig;
pub use error::AppError;
pub use runtime::{EventFinder, FinderOutcome, PipelineError, SystemClock};

use crate::domain::models::Campaign;

/// Runs the finder for the campaign named by `CAMPAIGN`.
pub fn run() -> Result<(), AppError> {
    start(None)
}

pub fn run_campaign(campaign: Campaign) -> Result<(), AppError> {
    start(Some(campaign))
}

fn start(campaign: Option<Campaign>) -> Result<(), AppError> {
    let dotenv_path = dotenvy::dotenv().ok();

    logging::init()?;

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let config = AppConfig::from_env(campaign)?;
    launch(config)
}

fn launch(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        campaign = %config.campaign,
        campaign_slug = %config.campaign_slug,
        output_path = %config.output_path.display(),
        output_format = ?config.output_format,
        account_configured = config.account_number.is_some(),
        mpan_configured = config.mpan.is_some(),
        graphql_url = %config.graphql_url,
        auth_header_style = ?config.auth_header_style,
        meter_schema = ?config.meter_schema,
        "application bootstrap initialized"
    );

    runtime::run(config)
}
