use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::adapters::kraken_graphql::{
    EVENT_PAGE_SIZE, EventQuery, KrakenClient, KrakenClientError, KrakenGraphqlClient,
};
use crate::adapters::kraken_replay::KrakenReplayClient;
use crate::adapters::output_file::{OutputError, write_output};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::domain::event_window::{Clock, EventWindowError, upcoming_windows};
use crate::domain::meter_selection::{
    ResolveError, SelectionReason, select_account, select_meter_point,
};
use crate::domain::models::{AuthToken, OutputRecord};
use crate::domain::render::render;

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("authentication failed: {0}")]
    Authenticate(#[source] KrakenClientError),
    #[error("failed to fetch accounts: {0}")]
    FetchAccounts(#[source] KrakenClientError),
    #[error("failed to fetch meter points: {0}")]
    FetchMeterPoints(#[source] KrakenClientError),
    #[error("failed to fetch campaign events: {0}")]
    FetchEvents(#[source] KrakenClientError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to prepare event windows: {0}")]
    EventWindow(#[from] EventWindowError),
    #[error("failed to write output file: {0}")]
    Output(#[from] OutputError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinderOutcome {
    pub account_number: String,
    pub mpan: String,
    pub fetched: usize,
    pub records: Vec<OutputRecord>,
}

pub struct EventFinder<C, Cl> {
    client: C,
    clock: Cl,
}

impl<C, Cl> EventFinder<C, Cl>
where
    C: KrakenClient,
    Cl: Clock,
{
    pub fn new(client: C, clock: Cl) -> Self {
        Self { client, clock }
    }

    pub fn run(&self, config: &AppConfig) -> Result<FinderOutcome, PipelineError> {
        let token = self
            .client
            .obtain_token(&config.credential)
            .map_err(PipelineError::Authenticate)?;
        tracing::info!("authenticated against kraken api");

        let account_number = self.resolve_account(&token, config)?;
        let mpan = self.resolve_meter(&token, &account_number, config)?;

        tracing::info!(
            account = %account_number,
            mpan = %mpan,
            campaign_slug = %config.campaign_slug,
            "fetching campaign events"
        );

        let page = self
            .client
            .campaign_events(
                &token,
                &EventQuery {
                    account_number: &account_number,
                    mpan: &mpan,
                    campaign_slug: &config.campaign_slug,
                    shape: config.campaign.output_shape(),
                },
            )
            .map_err(PipelineError::FetchEvents)?;

        if page.has_next_page {
            tracing::debug!(
                page_size = EVENT_PAGE_SIZE,
                "more campaign events exist beyond the first page; they are ignored"
            );
        }

        let records = upcoming_windows(
            &page.events,
            self.clock.now(),
            config.campaign.output_shape(),
        )?;
        let upcoming = records.iter().filter(|r| !r.is_placeholder()).count();

        tracing::info!(
            fetched = page.events.len(),
            upcoming,
            "campaign events filtered"
        );

        write_output(&config.output_path, &records)?;

        tracing::info!(path = %config.output_path.display(), "output file written");

        Ok(FinderOutcome {
            account_number,
            mpan,
            fetched: page.events.len(),
            records,
        })
    }

    fn resolve_account(
        &self,
        token: &AuthToken,
        config: &AppConfig,
    ) -> Result<String, PipelineError> {
        if let Some(number) = &config.account_number {
            tracing::info!(account = %number, "using configured account");
            return Ok(number.clone());
        }

        let accounts = self
            .client
            .viewer_accounts(token)
            .map_err(PipelineError::FetchAccounts)?;
        let selected = select_account(&accounts)?;

        if accounts.len() > 1 {
            let candidates: Vec<&str> = accounts.iter().map(|a| a.number.as_str()).collect();
            tracing::warn!(
                selected = %selected.number,
                ?candidates,
                "multiple accounts found; using the first"
            );
        } else {
            tracing::info!(account = %selected.number, "account discovered");
        }

        Ok(selected.number.clone())
    }

    fn resolve_meter(
        &self,
        token: &AuthToken,
        account_number: &str,
        config: &AppConfig,
    ) -> Result<String, PipelineError> {
        if let Some(mpan) = &config.mpan {
            tracing::info!(mpan = %mpan, "using configured meter point");
            return Ok(mpan.clone());
        }

        let properties = self
            .client
            .account_properties(token, account_number, config.meter_schema)
            .map_err(PipelineError::FetchMeterPoints)?;
        let selection = select_meter_point(&properties, config.meter_schema)?;

        match selection.reason {
            SelectionReason::ImportWithAgreement => {
                tracing::info!(mpan = %selection.mpan, "import meter point discovered");
            }
            SelectionReason::FirstAvailable => {
                tracing::warn!(
                    mpan = %selection.mpan,
                    "no import meter point with an agreement; using the first meter point"
                );
            }
        }

        Ok(selection.mpan)
    }
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("finder_run", %run_id, campaign = %config.campaign);
    let _entered = span.enter();

    let outcome = match &config.replay_file {
        Some(path) => {
            let client = KrakenReplayClient::from_file(path).map_err(AppError::runtime)?;
            tracing::warn!(path = %path.display(), "answering api calls from replay script");
            EventFinder::new(client, SystemClock).run(&config)?
        }
        None => {
            let client = KrakenGraphqlClient::new(&config.graphql_url, config.auth_header_style)
                .map_err(AppError::runtime)?;
            EventFinder::new(client, SystemClock).run(&config)?
        }
    };

    let rendered = render(&outcome.records, config.campaign, config.output_format)
        .map_err(AppError::render)?;
    print!("{rendered}");

    Ok(())
}
