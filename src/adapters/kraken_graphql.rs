use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::meter_selection::MeterSchema;
use crate::domain::models::{
    Account, Agreement, AuthToken, CampaignEvent, Credential, MeterDirection, MeterPoint,
    OutputShape, Property,
};

pub const DEFAULT_GRAPHQL_URL: &str = "https://api.octopus.energy/v1/graphql/";
pub const EVENT_PAGE_SIZE: u32 = 50;

const HTTP_TIMEOUT_SECONDS: u64 = 30;

const OBTAIN_TOKEN_MUTATION: &str = r#"
mutation ObtainKrakenToken($input: ObtainJSONWebTokenInput!) {
  obtainKrakenToken(input: $input) {
    token
  }
}
"#;

const VIEWER_ACCOUNTS_QUERY: &str = r#"
query ViewerAccounts {
  viewer {
    accounts {
      number
    }
  }
}
"#;

const METER_POINTS_BY_DIRECTION_QUERY: &str = r#"
query AccountMeterPoints($accountNumber: String!) {
  account(accountNumber: $accountNumber) {
    properties {
      electricityMeterPoints {
        mpan
        direction
        agreements {
          validFrom
          validTo
        }
      }
    }
  }
}
"#;

const METER_POINTS_BY_METER_TYPE_QUERY: &str = r#"
query AccountMeterPoints($accountNumber: String!) {
  account(accountNumber: $accountNumber) {
    properties {
      electricityMeterPoints {
        mpan
        meters {
          meterType
        }
      }
    }
  }
}
"#;

const CAMPAIGN_EVENTS_QUERY: &str = r#"
query CampaignEvents($accountNumber: String!, $mpan: String!, $campaignSlug: String!, $first: Int!) {
  customerFlexibilityCampaignEvents(
    accountNumber: $accountNumber
    supplyPointIdentifier: $mpan
    campaignSlug: $campaignSlug
    first: $first
  ) {
    pageInfo {
      hasNextPage
    }
    edges {
      node {
        code
        startAt
        endAt
      }
    }
  }
}
"#;

const CAMPAIGN_EVENTS_WITH_SETTLEMENT_QUERY: &str = r#"
query CampaignEvents($accountNumber: String!, $mpan: String!, $campaignSlug: String!, $first: Int!) {
  customerFlexibilityCampaignEvents(
    accountNumber: $accountNumber
    supplyPointIdentifier: $mpan
    campaignSlug: $campaignSlug
    first: $first
  ) {
    pageInfo {
      hasNextPage
    }
    edges {
      node {
        code
        startAt
        endAt
        status
        rewardAmount
      }
    }
  }
}
"#;

/// How the bearer token is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeaderStyle {
    Raw,
    Bearer,
}

impl AuthHeaderStyle {
    pub fn header_value(self, token: &AuthToken) -> String {
        match self {
            AuthHeaderStyle::Raw => token.expose().to_string(),
            AuthHeaderStyle::Bearer => format!("Bearer {}", token.expose()),
        }
    }
}

impl FromStr for AuthHeaderStyle {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "raw" | "jwt" => Ok(AuthHeaderStyle::Raw),
            "bearer" => Ok(AuthHeaderStyle::Bearer),
            other => Err(format!("unknown auth header style '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery<'a> {
    pub account_number: &'a str,
    pub mpan: &'a str,
    pub campaign_slug: &'a str,
    pub shape: OutputShape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    pub events: Vec<CampaignEvent>,
    pub has_next_page: bool,
}

pub trait KrakenClient {
    fn obtain_token(&self, credential: &Credential) -> Result<AuthToken, KrakenClientError>;
    fn viewer_accounts(&self, token: &AuthToken) -> Result<Vec<Account>, KrakenClientError>;
    fn account_properties(
        &self,
        token: &AuthToken,
        account_number: &str,
        schema: MeterSchema,
    ) -> Result<Vec<Property>, KrakenClientError>;
    fn campaign_events(
        &self,
        token: &AuthToken,
        query: &EventQuery<'_>,
    ) -> Result<EventPage, KrakenClientError>;
}

#[derive(Debug, Error)]
pub enum KrakenClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("graphql errors: {0}")]
    Graphql(String),
    #[error("graphql response carried no data")]
    MissingData,
    #[error("failed to decode graphql response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("replay script error: {0}")]
    Replay(String),
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObtainTokenData {
    obtain_kraken_token: TokenPayload,
}

#[derive(Deserialize)]
struct TokenPayload {
    token: String,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: ViewerNode,
}

#[derive(Deserialize)]
struct ViewerNode {
    accounts: Vec<Account>,
}

#[derive(Deserialize)]
struct AccountData {
    account: AccountNode,
}

#[derive(Deserialize)]
struct AccountNode {
    properties: Option<Vec<PropertyNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyNode {
    electricity_meter_points: Option<Vec<MeterPointNode>>,
}

#[derive(Deserialize)]
struct MeterPointNode {
    mpan: String,
    #[serde(default)]
    direction: Option<MeterDirection>,
    #[serde(default)]
    agreements: Option<Vec<Agreement>>,
    #[serde(default)]
    meters: Option<Vec<MeterNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeterNode {
    meter_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CampaignEventsData {
    customer_flexibility_campaign_events: EventConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventConnection {
    #[serde(default)]
    page_info: Option<PageInfo>,
    edges: Vec<EventEdge>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}

#[derive(Deserialize)]
struct EventEdge {
    node: CampaignEvent,
}

impl From<MeterPointNode> for MeterPoint {
    fn from(node: MeterPointNode) -> Self {
        Self {
            mpan: node.mpan,
            direction: node.direction,
            agreements: node.agreements.unwrap_or_default(),
            meter_types: node
                .meters
                .unwrap_or_default()
                .into_iter()
                .filter_map(|meter| meter.meter_type)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KrakenGraphqlClient {
    http: Client,
    endpoint: String,
    header_style: AuthHeaderStyle,
}

impl KrakenGraphqlClient {
    pub fn new(endpoint: &str, header_style: AuthHeaderStyle) -> Result<Self, KrakenClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
            .user_agent(concat!("octopus_flex_events/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(KrakenClientError::Build)?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            header_style,
        })
    }

    fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        token: Option<&AuthToken>,
    ) -> Result<T, KrakenClientError> {
        let mut request = self.http.post(self.endpoint.as_str()).json(&GraphqlRequest {
            query,
            variables,
        });
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, self.header_style.header_value(token));
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(KrakenClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        decode_graphql(&body)
    }
}

/// Decodes a GraphQL envelope. An error list wins over any partial data.
fn decode_graphql<T: DeserializeOwned>(body: &str) -> Result<T, KrakenClientError> {
    let envelope: GraphqlResponse = serde_json::from_str(body)?;

    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|error| error.message).collect();
        return Err(KrakenClientError::Graphql(messages.join("; ")));
    }

    match envelope.data {
        Some(Value::Null) | None => Err(KrakenClientError::MissingData),
        Some(data) => serde_json::from_value(data).map_err(KrakenClientError::from),
    }
}

fn token_input(credential: &Credential) -> Value {
    match credential {
        Credential::ApiKey(key) => json!({ "input": { "APIKey": key } }),
        Credential::EmailPassword { email, password } => {
            json!({ "input": { "email": email, "password": password } })
        }
    }
}

impl KrakenClient for KrakenGraphqlClient {
    fn obtain_token(&self, credential: &Credential) -> Result<AuthToken, KrakenClientError> {
        let data: ObtainTokenData =
            self.execute(OBTAIN_TOKEN_MUTATION, token_input(credential), None)?;
        Ok(AuthToken::new(data.obtain_kraken_token.token))
    }

    fn viewer_accounts(&self, token: &AuthToken) -> Result<Vec<Account>, KrakenClientError> {
        let data: ViewerData = self.execute(VIEWER_ACCOUNTS_QUERY, json!({}), Some(token))?;
        Ok(data.viewer.accounts)
    }

    fn account_properties(
        &self,
        token: &AuthToken,
        account_number: &str,
        schema: MeterSchema,
    ) -> Result<Vec<Property>, KrakenClientError> {
        let query = match schema {
            MeterSchema::Direction => METER_POINTS_BY_DIRECTION_QUERY,
            MeterSchema::MeterType => METER_POINTS_BY_METER_TYPE_QUERY,
        };
        let data: AccountData = self.execute(
            query,
            json!({ "accountNumber": account_number }),
            Some(token),
        )?;

        Ok(data
            .account
            .properties
            .unwrap_or_default()
            .into_iter()
            .map(|property| Property {
                meter_points: property
                    .electricity_meter_points
                    .unwrap_or_default()
                    .into_iter()
                    .map(MeterPoint::from)
                    .collect(),
            })
            .collect())
    }

    fn campaign_events(
        &self,
        token: &AuthToken,
        query: &EventQuery<'_>,
    ) -> Result<EventPage, KrakenClientError> {
        let document = match query.shape {
            OutputShape::Basic => CAMPAIGN_EVENTS_QUERY,
            OutputShape::WithSettlement => CAMPAIGN_EVENTS_WITH_SETTLEMENT_QUERY,
        };
        let data: CampaignEventsData = self.execute(
            document,
            json!({
                "accountNumber": query.account_number,
                "mpan": query.mpan,
                "campaignSlug": query.campaign_slug,
                "first": EVENT_PAGE_SIZE,
            }),
            Some(token),
        )?;

        let connection = data.customer_flexibility_campaign_events;
        Ok(EventPage {
            has_next_page: connection
                .page_info
                .map(|info| info.has_next_page)
                .unwrap_or(false),
            events: connection.edges.into_iter().map(|edge| edge.node).collect(),
        })
    }
}
