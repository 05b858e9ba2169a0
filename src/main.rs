use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mwstats::beautify::{
    Beautifier, EVENT_FEED_FILE, FEED_FILES, FRIEND_FEED_FILE, FileOutcome, SplitOutcome, StatsDir,
};
use mwstats::config::{AppConfig, Overrides};
use mwstats::fetch::{Endpoint, FetchPlan, run_plan};
use mwstats::http_client::http_client;
use mwstats::{SortRules, TimeSettings, TimeZoneCode};

const COOKIE_HELP: &str = "\
Obtaining your ACT_SSO_COOKIE:
  - Log in at https://www.callofduty.com
  - Open the browser developer tools (F12), then Application > Storage > Cookies
    > https://www.callofduty.com and copy the value of ACT_SSO_COOKIE
  - Export it as ACT_SSO_COOKIE, put it in .env, or paste it when prompted";

#[derive(Parser)]
#[command(
    name = "mwstats",
    about = "Modern Warfare (2019) statistics downloader and beautifier",
    after_help = COOKIE_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Timezone for converted timestamps (GMT, EST, CST, PST)
    #[arg(long, short = 't', global = true)]
    timezone: Option<TimeZoneCode>,

    /// Directory holding the fetched documents
    #[arg(long, global = true)]
    stats_dir: Option<PathBuf>,

    /// Rename table to use instead of the bundled one
    #[arg(long, global = true)]
    replacements: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Download documents from the stats API
    Fetch(FetchArgs),
    /// Rename, sort and convert times in place
    Beautify {
        /// Only stats.json
        #[arg(long)]
        stats: bool,
        /// Only match_info.json
        #[arg(long)]
        matches: bool,
        /// Only the friend and event feeds
        #[arg(long)]
        feeds: bool,
    },
    /// Split match_info.json into one file per match
    SplitMatches,
    /// Remove rendered markup from the feed files
    CleanFeeds {
        #[arg(long)]
        friend: bool,
        #[arg(long)]
        event: bool,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// Player name including the #1234567 suffix
    #[arg(long, short = 'p')]
    player: Option<String>,
    /// Fetch every supported document
    #[arg(long, short = 'a')]
    all: bool,
    #[arg(long)]
    season_loot: bool,
    #[arg(long)]
    identities: bool,
    #[arg(long)]
    maps: bool,
    #[arg(long)]
    info: bool,
    #[arg(long)]
    friend_feed: bool,
    #[arg(long)]
    event_feed: bool,
    #[arg(long)]
    cod_points: bool,
    #[arg(long)]
    connected_accounts: bool,
    #[arg(long)]
    settings: bool,
}

impl FetchArgs {
    fn plan(&self) -> FetchPlan {
        let flags = [
            (self.season_loot, Endpoint::SeasonLoot),
            (self.identities, Endpoint::Identities),
            (self.maps, Endpoint::MapList),
            (self.info, Endpoint::Info),
            (self.friend_feed, Endpoint::FriendFeed),
            (self.event_feed, Endpoint::EventFeed),
            (self.cod_points, Endpoint::CodPoints),
            (self.connected_accounts, Endpoint::ConnectedAccounts),
            (self.settings, Endpoint::Settings),
        ];
        FetchPlan {
            all: self.all,
            selected: flags
                .into_iter()
                .filter_map(|(on, endpoint)| on.then_some(endpoint))
                .collect(),
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::from_env(Overrides {
        timezone: cli.timezone,
        stats_dir: cli.stats_dir,
        replacements: cli.replacements,
    })?;

    let dir = StatsDir::new(&config.stats_dir);
    match cli.command {
        Command::Fetch(args) => run_fetch(&config, &dir, &args),
        Command::Beautify {
            stats,
            matches,
            feeds,
        } => {
            let beautifier = build_beautifier(&config, dir)?;
            let outcomes = match (stats, matches, feeds) {
                (false, false, false) => beautifier.beautify_all()?,
                _ => {
                    let mut out = Vec::new();
                    if stats {
                        out.push(beautifier.beautify_stats()?);
                    }
                    if matches {
                        out.push(beautifier.beautify_matches()?);
                    }
                    if feeds {
                        out.extend(beautifier.beautify_feeds()?);
                        out.extend(beautifier.clean_feeds(FEED_FILES)?);
                    }
                    out
                }
            };
            print_outcomes(&outcomes);
            Ok(())
        }
        Command::SplitMatches => {
            let beautifier = build_beautifier(&config, dir)?;
            match beautifier.split_matches()? {
                SplitOutcome::Split { files } => {
                    println!(
                        "Matches split into {} files in {}",
                        files.len(),
                        beautifier.dir().matches_dir().display()
                    );
                }
                SplitOutcome::Skipped(path) => println!("Skipped: {} not found", path.display()),
            }
            Ok(())
        }
        Command::CleanFeeds { friend, event } => {
            let beautifier = build_beautifier(&config, dir)?;
            let names: Vec<&str> = match (friend, event) {
                (false, false) => FEED_FILES.to_vec(),
                _ => [(friend, FRIEND_FEED_FILE), (event, EVENT_FEED_FILE)]
                    .into_iter()
                    .filter_map(|(on, name)| on.then_some(name))
                    .collect(),
            };
            print_outcomes(&beautifier.clean_feeds(&names)?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn build_beautifier(config: &AppConfig, dir: StatsDir) -> Result<Beautifier> {
    let table = config.rename_table()?;
    let time = TimeSettings::new(config.timezone, config.offsets.clone());
    Ok(Beautifier::new(dir, table, SortRules::default(), time))
}

fn run_fetch(config: &AppConfig, dir: &StatsDir, args: &FetchArgs) -> Result<()> {
    let plan = args.plan();
    let sso = sso_token(config)?;
    let player = match &args.player {
        Some(name) => Some(name.clone()),
        None if plan.needs_player(dir) => {
            Some(prompt("Player username (with #1234567): ")?)
        }
        None => None,
    };

    fs::create_dir_all(dir.root())
        .with_context(|| format!("failed to create {}", dir.root().display()))?;
    let client = http_client(config.http_timeout)?;
    let summary = run_plan(client, &plan, dir, player.as_deref(), &sso);

    println!("Fetch complete");
    println!("Saved: {}", summary.saved.len());
    for path in &summary.saved {
        println!(" - {}", path.display());
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in &summary.errors {
            println!(" - {err}");
        }
    }
    Ok(())
}

fn sso_token(config: &AppConfig) -> Result<String> {
    if let Some(token) = &config.sso_token {
        return Ok(token.clone());
    }
    if let Ok(raw) = fs::read_to_string(&config.cookie_file) {
        let token = raw.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }
    eprintln!("{COOKIE_HELP}");
    let token = prompt("ACT_SSO_COOKIE: ")?;
    fs::write(&config.cookie_file, &token)
        .with_context(|| format!("failed to save {}", config.cookie_file.display()))?;
    Ok(token)
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim();
    if value.is_empty() {
        return Err(anyhow!("no input given for `{}`", label.trim_end_matches([':', ' '])));
    }
    Ok(value.to_string())
}

fn print_outcomes(outcomes: &[FileOutcome]) {
    for outcome in outcomes {
        match outcome {
            FileOutcome::Updated(path) => println!("Updated {}", path.display()),
            FileOutcome::Skipped(path) => println!("Skipped {} (not found)", path.display()),
        }
    }
}
