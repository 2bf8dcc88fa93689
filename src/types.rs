use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// One team's row of the points table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRecord {
    pub position: u32,
    pub team: String,
    pub matches: u32,
    pub won: u32,
    pub lost: u32,
    pub tied: u32,
    /// Not present in the scraped layout; always 0 for live data.
    pub no_result: u32,
    pub points: u32,
    /// Signed decimal kept verbatim, e.g. "+1.428".
    pub net_run_rate: String,
}

impl StandingRecord {
    /// Decided games never exceed games played.
    pub fn is_consistent(&self) -> bool {
        let decided = [self.won, self.lost, self.tied, self.no_result]
            .into_iter()
            .map(u64::from)
            .sum::<u64>();
        decided <= u64::from(self.matches)
    }
}

/// Cell text of every non-empty table row, in document order.
pub type RawTableGrid = Vec<Vec<String>>;

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: String,
    pub date: String,
    pub time: String,
    pub team1: String,
    pub team2: String,
    pub venue: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overs1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overs2: Option<String>,
}

// ---------------------------------------------------------------------------
// Scrape output
// ---------------------------------------------------------------------------

/// Payload served to the dashboard under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_match: Option<MatchSummary>,
    pub upcoming_matches: Vec<MatchSummary>,
    pub points_table: Vec<StandingRecord>,
    pub points_table_raw_data: RawTableGrid,
    pub recent_matches: Vec<MatchSummary>,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub last_updated: String,
}

/// A cached scrape result plus how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeSnapshot {
    pub data: ScrapeResult,
    /// True when `points_table` holds fallback rows rather than scraped ones.
    pub degraded: bool,
    pub method: FetchMethod,
}

// ---------------------------------------------------------------------------
// Fetch method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    /// Rendered through headless Chromium.
    Browser,
    /// Plain HTTP GET of the server-rendered markup.
    Http,
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FetchMethod::Browser => "browser",
            FetchMethod::Http => "http",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FetchMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" | "puppeteer" => Ok(FetchMethod::Browser),
            "http" | "axios" => Ok(FetchMethod::Http),
            other => Err(AppError::Config(format!(
                "FETCH_METHOD must be 'browser' or 'http', got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(matches: u32, won: u32, lost: u32, tied: u32, no_result: u32) -> StandingRecord {
        StandingRecord {
            position: 1,
            team: "Team".to_string(),
            matches,
            won,
            lost,
            tied,
            no_result,
            points: won * 2,
            net_run_rate: "0.000".to_string(),
        }
    }

    #[test]
    fn consistency_allows_unplayed_games() {
        assert!(record(14, 9, 3, 0, 2).is_consistent());
        assert!(record(14, 7, 5, 0, 0).is_consistent());
        assert!(!record(10, 8, 3, 0, 0).is_consistent());
    }

    #[test]
    fn consistency_does_not_overflow_on_huge_counts() {
        let huge = StandingRecord {
            won: u32::MAX,
            lost: 1,
            points: 0,
            ..record(u32::MAX, 0, 0, 0, 0)
        };
        assert!(!huge.is_consistent());

        let all_won = StandingRecord {
            won: u32::MAX,
            points: 0,
            ..record(u32::MAX, 0, 0, 0, 0)
        };
        assert!(all_won.is_consistent());
    }

    #[test]
    fn standing_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(record(14, 9, 3, 0, 2)).unwrap();
        assert_eq!(json["noResult"], 2);
        assert_eq!(json["netRunRate"], "0.000");
        assert!(json.get("no_result").is_none());
    }

    #[test]
    fn match_omits_absent_optionals() {
        let m = MatchSummary {
            id: "m1".to_string(),
            date: "2024-05-26".to_string(),
            time: "19:30".to_string(),
            team1: "A".to_string(),
            team2: "B".to_string(),
            venue: "V".to_string(),
            status: "Upcoming".to_string(),
            result: None,
            is_live: Some(true),
            score1: None,
            score2: None,
            overs1: None,
            overs2: None,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["isLive"], true);
        assert!(json.get("result").is_none());
        assert!(json.get("score1").is_none());
    }

    #[test]
    fn fetch_method_parses_aliases() {
        assert_eq!("Browser".parse::<FetchMethod>().unwrap(), FetchMethod::Browser);
        assert_eq!("axios".parse::<FetchMethod>().unwrap(), FetchMethod::Http);
        assert!("wget".parse::<FetchMethod>().is_err());
        assert_eq!(FetchMethod::Http.to_string(), "http");
    }
}
