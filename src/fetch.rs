use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use serde_json::Value;
use tracing::{info, warn};

use crate::beautify::StatsDir;
use crate::document::{coerce_document, save_document};

const PAPI_BASE: &str = "https://my.callofduty.com/api/papi-client";
const PROFILE_BASE: &str = "https://profile.callofduty.com/cod";
const TITLE: &str = "mw";
const PLATFORM: &str = "uno";
const GAME_MODE: &str = "mp";

/// Present in the stats directory when the account endpoints should be
/// fetched along with `--all`.
pub const USER_INFO_MARKER: &str = "userInfo.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FullData,
    CombatHistory,
    SeasonLoot,
    MapList,
    Identities,
    Info,
    FriendFeed,
    EventFeed,
    CodPoints,
    ConnectedAccounts,
    Settings,
}

impl Endpoint {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::FullData => "stats.json",
            Self::CombatHistory => "match_info.json",
            Self::SeasonLoot => "season_loot.json",
            Self::MapList => "map_list.json",
            Self::Identities => "identities.json",
            Self::Info => "info.json",
            Self::FriendFeed => "friendFeed.json",
            Self::EventFeed => "eventFeed.json",
            Self::CodPoints => "cp.json",
            Self::ConnectedAccounts => "connectedAccounts.json",
            Self::Settings => "settings.json",
        }
    }

    pub fn needs_player(self) -> bool {
        matches!(
            self,
            Self::FullData
                | Self::CombatHistory
                | Self::SeasonLoot
                | Self::FriendFeed
                | Self::CodPoints
                | Self::ConnectedAccounts
                | Self::Settings
        )
    }

    pub fn url(self, player: Option<&str>, sso: &str) -> Result<String> {
        let gamer = match (self.needs_player(), player) {
            (true, Some(name)) if !name.trim().is_empty() => urlencoding::encode(name.trim()).into_owned(),
            (true, _) => return Err(anyhow!("{self:?} needs a player name")),
            (false, _) => String::new(),
        };
        let url = match self {
            Self::FullData => format!(
                "{PAPI_BASE}/stats/cod/v1/title/{TITLE}/platform/{PLATFORM}/gamer/{gamer}/profile/type/{GAME_MODE}"
            ),
            Self::CombatHistory => format!(
                "{PAPI_BASE}/crm/cod/v2/title/{TITLE}/platform/{PLATFORM}/gamer/{gamer}/matches/{GAME_MODE}/start/0/end/0/details"
            ),
            Self::SeasonLoot => format!(
                "{PAPI_BASE}/loot/title/{TITLE}/platform/{PLATFORM}/gamer/{gamer}/status/en"
            ),
            Self::MapList => format!(
                "{PAPI_BASE}/ce/v1/title/{TITLE}/platform/{PLATFORM}/gameType/{GAME_MODE}/communityMapData/availability"
            ),
            Self::Identities => format!("{PAPI_BASE}/crm/cod/v2/identities/{sso}"),
            Self::Info => format!("{PROFILE_BASE}/userInfo/{sso}"),
            Self::FriendFeed => format!(
                "{PAPI_BASE}/userfeed/v1/friendFeed/platform/{PLATFORM}/gamer/{gamer}/friendFeedEvents/en"
            ),
            Self::EventFeed => format!("{PAPI_BASE}/userfeed/v1/friendFeed/rendered/en/{sso}"),
            Self::CodPoints => format!(
                "{PAPI_BASE}/inventory/v1/title/{TITLE}/platform/{PLATFORM}/gamer/{gamer}/currency"
            ),
            Self::ConnectedAccounts => format!(
                "{PAPI_BASE}/crm/cod/v2/accounts/platform/{PLATFORM}/gamer/{gamer}"
            ),
            Self::Settings => format!(
                "{PAPI_BASE}/preferences/v1/platform/{PLATFORM}/gamer/{gamer}/list"
            ),
        };
        Ok(url)
    }
}

const BASIC: &[Endpoint] = &[Endpoint::FullData, Endpoint::CombatHistory];
const ALL_CORE: &[Endpoint] = &[
    Endpoint::FullData,
    Endpoint::CombatHistory,
    Endpoint::SeasonLoot,
    Endpoint::MapList,
    Endpoint::Identities,
];
const ACCOUNT: &[Endpoint] = &[
    Endpoint::Info,
    Endpoint::FriendFeed,
    Endpoint::EventFeed,
    Endpoint::CodPoints,
    Endpoint::ConnectedAccounts,
    Endpoint::Settings,
];

/// Which endpoints one `fetch` run hits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPlan {
    pub all: bool,
    pub selected: Vec<Endpoint>,
}

impl FetchPlan {
    pub fn endpoints(&self, dir: &StatsDir) -> Vec<Endpoint> {
        if self.all {
            let mut out = ALL_CORE.to_vec();
            if dir.file(USER_INFO_MARKER).exists() {
                out.extend_from_slice(ACCOUNT);
            }
            return out;
        }
        if self.selected.is_empty() {
            return BASIC.to_vec();
        }
        let mut out = Vec::new();
        for endpoint in &self.selected {
            if !out.contains(endpoint) {
                out.push(*endpoint);
            }
        }
        out
    }

    pub fn needs_player(&self, dir: &StatsDir) -> bool {
        self.endpoints(dir).into_iter().any(Endpoint::needs_player)
    }
}

pub fn fetch_endpoint(client: &Client, endpoint: Endpoint, player: Option<&str>, sso: &str) -> Result<Value> {
    let url = endpoint.url(player, sso)?;
    let resp = client
        .get(&url)
        .header(COOKIE, format!("ACT_SSO_COOKIE={sso}"))
        .send()
        .with_context(|| format!("request to {endpoint:?} failed"))?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status} from {endpoint:?}: {body}"));
    }
    let doc = coerce_document(&body);
    if doc.is_string() {
        warn!(?endpoint, "response was not json, saved as a string");
    } else if doc.get("status").and_then(Value::as_str) == Some("error") {
        warn!(?endpoint, "api reported an error status");
    }
    Ok(doc)
}

/// Runs every endpoint of the plan and saves each response under its file
/// name. Failures are collected and do not stop the remaining endpoints.
pub fn run_plan(
    client: &Client,
    plan: &FetchPlan,
    dir: &StatsDir,
    player: Option<&str>,
    sso: &str,
) -> FetchSummary {
    let mut summary = FetchSummary::default();
    for endpoint in plan.endpoints(dir) {
        let result = fetch_endpoint(client, endpoint, player, sso).and_then(|doc| {
            let path = dir.file(endpoint.file_name());
            save_document(&path, &doc)?;
            Ok(path)
        });
        match result {
            Ok(path) => {
                info!(path = %path.display(), "saved");
                summary.saved.push(path);
            }
            Err(err) => {
                warn!(?endpoint, "fetch failed: {err:#}");
                summary.errors.push(format!("{endpoint:?}: {err:#}"));
            }
        }
    }
    summary
}

#[derive(Debug, Default)]
pub struct FetchSummary {
    pub saved: Vec<PathBuf>,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_names_are_encoded() {
        let url = Endpoint::FullData.url(Some("Ghost#1234567"), "tok").unwrap();
        assert_eq!(
            url,
            "https://my.callofduty.com/api/papi-client/stats/cod/v1/title/mw/platform/uno/gamer/Ghost%231234567/profile/type/mp"
        );
    }

    #[test]
    fn player_endpoints_require_a_name() {
        assert!(Endpoint::CombatHistory.url(None, "tok").is_err());
        assert!(Endpoint::CombatHistory.url(Some("  "), "tok").is_err());
        assert!(Endpoint::MapList.url(None, "tok").is_ok());
        assert!(Endpoint::Identities.url(None, "tok").unwrap().ends_with("/identities/tok"));
    }

    #[test]
    fn plan_defaults_to_basic_stats() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsDir::new(dir.path());
        assert_eq!(
            FetchPlan::default().endpoints(&stats),
            vec![Endpoint::FullData, Endpoint::CombatHistory]
        );
    }

    #[test]
    fn all_adds_account_endpoints_with_user_info() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsDir::new(dir.path());
        let plan = FetchPlan {
            all: true,
            selected: vec![],
        };
        assert_eq!(plan.endpoints(&stats).len(), 5);
        std::fs::write(stats.file(USER_INFO_MARKER), "{}").unwrap();
        assert_eq!(plan.endpoints(&stats).len(), 11);
    }

    #[test]
    fn selected_endpoints_dedupe() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsDir::new(dir.path());
        let plan = FetchPlan {
            all: false,
            selected: vec![Endpoint::MapList, Endpoint::Identities, Endpoint::MapList],
        };
        assert_eq!(plan.endpoints(&stats), vec![Endpoint::MapList, Endpoint::Identities]);
        assert!(!plan.needs_player(&stats));
    }
}
