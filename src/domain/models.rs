use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Campaign {
    FreeElectricity,
    PowerUp,
}

impl Campaign {
    pub const fn default_slug(self) -> &'static str {
        match self {
            Campaign::FreeElectricity => "free-electricity",
            Campaign::PowerUp => "power_ups_ukpn",
        }
    }

    pub const fn output_file_name(self) -> &'static str {
        match self {
            Campaign::FreeElectricity => "free_electricity_graphql.json",
            Campaign::PowerUp => "powerup_graphql.json",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Campaign::FreeElectricity => "free electricity",
            Campaign::PowerUp => "power up",
        }
    }

    /// Free electricity sessions carry a settlement status and reward; power ups do not.
    pub const fn output_shape(self) -> OutputShape {
        match self {
            Campaign::FreeElectricity => OutputShape::WithSettlement,
            Campaign::PowerUp => OutputShape::Basic,
        }
    }
}

impl fmt::Display for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Campaign::FreeElectricity => f.write_str("free-electricity"),
            Campaign::PowerUp => f.write_str("power-up"),
        }
    }
}

impl FromStr for Campaign {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free-electricity" | "free_electricity" | "fes" => Ok(Campaign::FreeElectricity),
            "power-up" | "power_up" | "powerup" => Ok(Campaign::PowerUp),
            other => Err(format!("unknown campaign '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Basic,
    WithSettlement,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    EmailPassword { email: String, password: String },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credential::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(default)]
    pub meter_points: Vec<MeterPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeterDirection {
    Import,
    Export,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterPoint {
    pub mpan: String,
    #[serde(default)]
    pub direction: Option<MeterDirection>,
    #[serde(default)]
    pub agreements: Vec<Agreement>,
    #[serde(default)]
    pub meter_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewardAmount {
    Number(f64),
    Text(String),
}

impl fmt::Display for RewardAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardAmount::Number(value) => write!(f, "{value}"),
            RewardAmount::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignEvent {
    pub code: String,
    pub start_at: String,
    pub end_at: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reward_amount: Option<RewardAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub status: Option<String>,
    pub reward: Option<RewardAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub start: Option<String>,
    pub end: Option<String>,
    pub code: Option<String>,
    #[serde(flatten)]
    pub settlement: Option<Settlement>,
}

impl OutputRecord {
    pub fn placeholder() -> Self {
        Self {
            start: None,
            end: None,
            code: None,
            settlement: None,
        }
    }

    pub fn from_event(event: &CampaignEvent, shape: OutputShape) -> Self {
        let settlement = match shape {
            OutputShape::Basic => None,
            OutputShape::WithSettlement => Some(Settlement {
                status: event.status.clone(),
                reward: event.reward_amount.clone(),
            }),
        };

        Self {
            start: Some(event.start_at.clone()),
            end: Some(event.end_at.clone()),
            code: Some(event.code.clone()),
            settlement,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.code.is_none()
    }
}
