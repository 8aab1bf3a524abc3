use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::adapters::kraken_graphql::{EventPage, EventQuery, KrakenClient, KrakenClientError};
use crate::domain::meter_selection::MeterSchema;
use crate::domain::models::{Account, AuthToken, CampaignEvent, Credential, Property};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplayScript {
    #[serde(default = "default_token")]
    token: String,
    #[serde(default)]
    accounts: Vec<String>,
    #[serde(default)]
    properties: Vec<Property>,
    #[serde(default)]
    events: Vec<CampaignEvent>,
    #[serde(default)]
    has_next_page: bool,
}

fn default_token() -> String {
    "replay-token".to_string()
}

/// Serves recorded API answers from a JSON script instead of the network.
#[derive(Debug, Clone)]
pub struct KrakenReplayClient {
    script: ReplayScript,
}

impl KrakenReplayClient {
    pub fn from_file(path: &Path) -> Result<Self, KrakenClientError> {
        let content = fs::read_to_string(path).map_err(|err| {
            KrakenClientError::Replay(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, KrakenClientError> {
        let script: ReplayScript = serde_json::from_str(content)?;

        if script.token.trim().is_empty() {
            return Err(KrakenClientError::Replay(
                "replay script token must not be empty".to_string(),
            ));
        }

        Ok(Self { script })
    }
}

impl KrakenClient for KrakenReplayClient {
    fn obtain_token(&self, _credential: &Credential) -> Result<AuthToken, KrakenClientError> {
        Ok(AuthToken::new(self.script.token.clone()))
    }

    fn viewer_accounts(&self, _token: &AuthToken) -> Result<Vec<Account>, KrakenClientError> {
        Ok(self
            .script
            .accounts
            .iter()
            .map(|number| Account {
                number: number.clone(),
            })
            .collect())
    }

    fn account_properties(
        &self,
        _token: &AuthToken,
        _account_number: &str,
        _schema: MeterSchema,
    ) -> Result<Vec<Property>, KrakenClientError> {
        Ok(self.script.properties.clone())
    }

    fn campaign_events(
        &self,
        _token: &AuthToken,
        _query: &EventQuery<'_>,
    ) -> Result<EventPage, KrakenClientError> {
        Ok(EventPage {
            events: self.script.events.clone(),
            has_next_page: self.script.has_next_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::KrakenReplayClient;
    use crate::adapters::kraken_graphql::{EventQuery, KrakenClient, KrakenClientError};
    use crate::domain::meter_selection::MeterSchema;
    use crate::domain::models::{AuthToken, Credential, MeterDirection, OutputShape};

    #[test]
    fn loads_script_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        write!(
            file,
            r#"{{
                "accounts": ["A-1234ABCD"],
                "properties": [{{"meterPoints": [
                    {{"mpan": "1900000000002", "direction": "IMPORT", "agreements": [{{"validFrom": "2024-01-01"}}]}}
                ]}}],
                "events": [{{"code": "PU-1", "startAt": "2025-06-01T10:00Z", "endAt": "2025-06-01T11:00Z"}}]
            }}"#
        )
        .expect("script should be written");

        let client = KrakenReplayClient::from_file(file.path()).expect("script should load");
        let token = client
            .obtain_token(&Credential::ApiKey("ignored".to_string()))
            .expect("token should be issued");
        let properties = client
            .account_properties(&token, "A-1234ABCD", MeterSchema::Direction)
            .expect("properties should load");
        let page = client
            .campaign_events(
                &token,
                &EventQuery {
                    account_number: "A-1234ABCD",
                    mpan: "1900000000002",
                    campaign_slug: "power_ups_ukpn",
                    shape: OutputShape::Basic,
                },
            )
            .expect("events should load");

        assert_eq!(token.expose(), "replay-token");
        assert_eq!(
            properties[0].meter_points[0].direction,
            Some(MeterDirection::Import)
        );
        assert_eq!(page.events[0].code, "PU-1");
        assert!(!page.has_next_page);
    }

    #[test]
    fn rejects_blank_token() {
        let result = KrakenReplayClient::from_json(r#"{"token": "  "}"#);
        assert!(matches!(result, Err(KrakenClientError::Replay(_))));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let result = KrakenReplayClient::from_file(std::path::Path::new("./does/not/exist.json"));

        match result {
            Err(KrakenClientError::Replay(message)) => {
                assert!(message.contains("does/not/exist.json"));
            }
            other => panic!("expected replay error, got {other:?}"),
        }
    }

    #[test]
    fn empty_script_yields_no_accounts() {
        let client = KrakenReplayClient::from_json("{}").expect("empty script is valid");
        let accounts = client
            .viewer_accounts(&AuthToken::new("t"))
            .expect("accounts call should succeed");
        assert!(accounts.is_empty());
    }
}
