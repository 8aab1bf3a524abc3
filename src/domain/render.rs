use std::fmt::Write as _;
use std::str::FromStr;

use crate::domain::event_window::parse_timestamp;
use crate::domain::models::{Campaign, OutputRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

pub fn render(
    records: &[OutputRecord],
    campaign: Campaign,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Human => Ok(render_human(records, campaign)),
        OutputFormat::Json => serde_json::to_string_pretty(records).map(|json| json + "\n"),
    }
}

pub fn render_human(records: &[OutputRecord], campaign: Campaign) -> String {
    let upcoming: Vec<&OutputRecord> = records.iter().filter(|r| !r.is_placeholder()).collect();
    let name = campaign.display_name();

    if upcoming.is_empty() {
        return format!("No upcoming {name} events.\n");
    }

    let mut out = format!("Found {} upcoming {name} event(s):\n\n", upcoming.len());

    for record in upcoming {
        let _ = writeln!(out, "Event: {}", record.code.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "  Start:  {}", display_time(record.start.as_deref()));
        let _ = writeln!(out, "  End:    {}", display_time(record.end.as_deref()));

        if let Some(settlement) = &record.settlement {
            let _ = writeln!(
                out,
                "  Status: {}",
                settlement.status.as_deref().unwrap_or("unknown")
            );
            let _ = writeln!(
                out,
                "  Reward: {}",
                settlement
                    .reward
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "N/A".to_string())
            );
        }

        out.push('\n');
    }

    out
}

fn display_time(raw: Option<&str>) -> String {
    match raw {
        Some(value) => parse_timestamp(value)
            .map(|parsed| parsed.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| value.to_string()),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputFormat, render, render_human};
    use crate::domain::models::{Campaign, OutputRecord, RewardAmount, Settlement};

    fn record(code: &str, start: &str, end: &str, settlement: Option<Settlement>) -> OutputRecord {
        OutputRecord {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            code: Some(code.to_string()),
            settlement,
        }
    }

    #[test]
    fn human_summary_for_placeholder_says_nothing_upcoming() {
        let text = render_human(&[OutputRecord::placeholder()], Campaign::PowerUp);
        assert_eq!(text, "No upcoming power up events.\n");
    }

    #[test]
    fn human_summary_normalizes_times_to_utc() {
        let records = vec![record(
            "PU-1",
            "2025-06-01T11:00:00+01:00",
            "2025-06-01T12:30:00+01:00",
            None,
        )];

        let text = render_human(&records, Campaign::PowerUp);

        assert!(text.starts_with("Found 1 upcoming power up event(s):"));
        assert!(text.contains("Event: PU-1"));
        assert!(text.contains("  Start:  2025-06-01 10:00 UTC"));
        assert!(text.contains("  End:    2025-06-01 11:30 UTC"));
        assert!(!text.contains("Status:"));
    }

    #[test]
    fn human_summary_shows_settlement_for_free_electricity() {
        let records = vec![record(
            "FES-7",
            "2025-06-01T10:00:00Z",
            "2025-06-01T11:00:00Z",
            Some(Settlement {
                status: None,
                reward: Some(RewardAmount::Text("0.00".to_string())),
            }),
        )];

        let text = render_human(&records, Campaign::FreeElectricity);

        assert!(text.contains("  Status: unknown"));
        assert!(text.contains("  Reward: 0.00"));
    }

    #[test]
    fn json_format_matches_output_records() {
        let records = vec![OutputRecord::placeholder()];

        let text = render(&records, Campaign::PowerUp, OutputFormat::Json).expect("serializable");
        let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid json");

        assert_eq!(
            parsed,
            serde_json::json!([{"start": null, "end": null, "code": null}])
        );
    }

    #[test]
    fn output_format_rejects_unknown_values() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
