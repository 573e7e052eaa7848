//! ColorWalk CLI
//!
//! Command-line interface for:
//! - Registering members and managing the place catalog
//! - Recording walks point by point and finishing them
//! - Resolving captured oracle text against a candidate list (`resolve`)
//! - Running the full recommendation flow (`recommend`)
//! - Serving the same operations over HTTP (`serve`)

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use colorwalk_recommend::oracle::gemini::GeminiClient;
use colorwalk_recommend::oracle::StaticOracle;
use colorwalk_recommend::{
    Candidate, CandidateSet, Coordinates, DistanceAnnotator, DistanceUnit, Oracle, PlaceCategory,
    RecommendationRequest, RecommendationService, SelectionEngine,
};
use colorwalk_storage::{
    ColorWalkStore, PlaceCreateRequest, RegisterMemberRequest, StartWalkRequest,
    WalkingPointRequest, WalkingPointResponse,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod logging;
mod server;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "colorwalk")]
#[command(author, version, about = "ColorWalk: color-themed walks and place recommendations")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the store snapshot (overrides config and env)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `colorwalk_storage=debug,info` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register members
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },

    /// Manage the place catalog
    Place {
        #[command(subcommand)]
        command: PlaceCommands,
    },

    /// Record and inspect walks
    Walk {
        #[command(subcommand)]
        command: WalkCommands,
    },

    /// Resolve oracle text against a candidate list, without storage or network.
    ///
    /// Reads a JSON array of candidates and the oracle's text (from a file or
    /// stdin) and prints the ranked selection as JSON.
    Resolve {
        /// JSON array of candidates, in the order they were shown to the oracle
        #[arg(long)]
        candidates: PathBuf,

        /// Oracle text file (default: stdin)
        #[arg(long)]
        text: Option<PathBuf>,

        /// Places to select (default: config, then 5)
        #[arg(long)]
        quota: Option<usize>,

        /// Origin latitude for distance annotation
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Origin longitude for distance annotation
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Report distances in meters instead of kilometers
        #[arg(long)]
        meters: bool,
    },

    /// Run the full recommendation flow for a request JSON file
    Recommend {
        /// Recommendation request (camelCase JSON)
        request: PathBuf,

        /// Use this text as the oracle's answer instead of calling Gemini
        #[arg(long)]
        oracle_text: Option<PathBuf>,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to bind (default: config, then COLORWALK_LISTEN, then 127.0.0.1:8080)
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Write `{"addr", "pid"}` here once the listener is bound
        #[arg(long)]
        ready_file: Option<PathBuf>,

        /// Use this text as the oracle's answer instead of calling Gemini
        #[arg(long)]
        oracle_text: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MemberCommands {
    /// Register a new member
    Add {
        username: String,
        email: String,
        #[arg(long)]
        nickname: Option<String>,
    },
}

#[derive(Subcommand)]
enum PlaceCommands {
    /// Add a place to the catalog
    Add {
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// PARK, MUSEUM, RESTAURANT, CAFE, LANDMARK, NATURE, CULTURAL, SHOPPING or OTHER
        #[arg(long, default_value = "OTHER")]
        category: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// List places in id order
    List,
    /// Show one place
    Get { id: u64 },
    /// Remove a place
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum WalkCommands {
    /// Start a walk for a member
    Start {
        #[arg(long)]
        member: u64,
        title: String,
        #[arg(long)]
        content: Option<String>,
        /// Color theme, e.g. `green`
        #[arg(long)]
        color: Option<String>,
    },
    /// Record a GPS point on an open walk
    Point {
        walk: u64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Finish a walk
    Finish { walk: u64 },
    /// Show one walk with its points
    Show { walk: u64 },
    /// List walks (all, or one member's)
    List {
        #[arg(long)]
        member: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.log_level.as_deref());

    let mut config = AppConfig::load(cli.global.config.as_deref())?;
    if let Some(dir) = cli.global.data_dir.clone() {
        config.storage.data_dir = dir;
    }

    match cli.command {
        Commands::Member { command } => match command {
            MemberCommands::Add {
                username,
                email,
                nickname,
            } => {
                let store = open_store(&config)?;
                let member = store.register_member(RegisterMemberRequest {
                    username,
                    email,
                    nickname,
                })?;
                done("registered", &format!("member {}", member.id));
                print_json(&member)?;
            }
        },
        Commands::Place { command } => cmd_place(&config, command)?,
        Commands::Walk { command } => cmd_walk(&config, command)?,
        Commands::Resolve {
            candidates,
            text,
            quota,
            lat,
            lon,
            meters,
        } => {
            let origin = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
            let unit = if meters {
                DistanceUnit::Meters
            } else {
                DistanceUnit::Kilometers
            };
            cmd_resolve(&config, &candidates, text.as_deref(), quota, origin, unit)?;
        }
        Commands::Recommend {
            request,
            oracle_text,
        } => cmd_recommend(&config, &request, oracle_text.as_deref())?,
        Commands::Serve {
            listen,
            ready_file,
            oracle_text,
        } => {
            let store = open_store(&config)?;
            let oracle = build_oracle(oracle_text.as_deref())?;
            let recommender = RecommendationService::with_engine(
                store.clone(),
                oracle,
                SelectionEngine::with_config(config.engine.clone()),
            );
            server::serve(
                server::ServerConfig {
                    listen: listen.unwrap_or(config.listen),
                    ready_file,
                },
                server::ServerState { store, recommender },
            )?;
        }
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn open_store(config: &AppConfig) -> Result<Arc<ColorWalkStore>> {
    let store = ColorWalkStore::open(&config.storage).map_err(|e| {
        anyhow!(
            "failed to open store at {}: {e}",
            config.storage.snapshot_path().display()
        )
    })?;
    Ok(Arc::new(store))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn done(verb: &str, what: &str) {
    eprintln!("{} {}", verb.green().bold(), what.bold());
}

fn read_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| anyhow!("failed to read {}: {e}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Fixed text when given, otherwise Gemini from the environment.
///
/// An unconfigured Gemini is not fatal: every request then falls back to
/// catalog order.
fn build_oracle(oracle_text: Option<&Path>) -> Result<Arc<dyn Oracle>> {
    if let Some(path) = oracle_text {
        return Ok(Arc::new(StaticOracle::new(read_text(Some(path))?)));
    }
    match GeminiClient::from_env() {
        Ok(client) => Ok(Arc::new(client)),
        Err(e) => {
            eprintln!(
                "{} {e}; recommendations will use catalog order",
                "info:".yellow().bold()
            );
            Ok(Arc::new(StaticOracle::failing(e)))
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_place(config: &AppConfig, command: PlaceCommands) -> Result<()> {
    let store = open_store(config)?;
    match command {
        PlaceCommands::Add {
            name,
            lat,
            lon,
            category,
            description,
            address,
            image_url,
        } => {
            let category: PlaceCategory = category.parse().map_err(|e: String| anyhow!(e))?;
            let place = store.create_place(PlaceCreateRequest {
                name,
                description,
                latitude: lat,
                longitude: lon,
                address,
                image_url,
                category,
            })?;
            done("created", &format!("place {} ({})", place.id, place.name));
            print_json(&place)?;
        }
        PlaceCommands::List => {
            let places = store.places();
            if places.is_empty() {
                eprintln!("{} no places yet", "info:".yellow().bold());
            }
            for place in &places {
                println!(
                    "{:>6}  {:<28} {:<10} {:.5}, {:.5}",
                    place.id.to_string().cyan(),
                    place.name,
                    place.category.to_string(),
                    place.latitude,
                    place.longitude
                );
            }
        }
        PlaceCommands::Get { id } => print_json(&store.place(id)?)?,
        PlaceCommands::Delete { id } => {
            store.delete_place(id)?;
            done("deleted", &format!("place {id}"));
        }
    }
    Ok(())
}

fn cmd_walk(config: &AppConfig, command: WalkCommands) -> Result<()> {
    let store = open_store(config)?;
    match command {
        WalkCommands::Start {
            member,
            title,
            content,
            color,
        } => {
            let walk = store.start_walk(StartWalkRequest {
                member_id: member,
                title,
                content,
                color_theme: color,
            })?;
            done("started", &format!("walk {}", walk.walk_id));
            print_json(&walk)?;
        }
        WalkCommands::Point { walk, lat, lon } => {
            let point = store.record_point(WalkingPointRequest {
                walk_id: walk,
                latitude: lat,
                longitude: lon,
                timestamp: None,
            })?;
            let total = store.walk(walk)?.total_distance;
            done(
                "recorded",
                &format!("point #{} on walk {walk} ({total:.1} m so far)", point.sequence),
            );
            print_json(&WalkingPointResponse::from(&point))?;
        }
        WalkCommands::Finish { walk } => {
            let finished = store.finish_walk(walk)?;
            done(
                "finished",
                &format!("walk {walk}: {:.1} m", finished.total_distance),
            );
            print_json(&finished)?;
        }
        WalkCommands::Show { walk } => print_json(&store.walk(walk)?)?,
        WalkCommands::List { member } => {
            let walks = match member {
                Some(member) => store.member_walks(member)?,
                None => store.all_walks(),
            };
            print_json(&walks)?;
        }
    }
    Ok(())
}

fn cmd_resolve(
    config: &AppConfig,
    candidates_path: &Path,
    text_path: Option<&Path>,
    quota: Option<usize>,
    origin: Option<Coordinates>,
    unit: DistanceUnit,
) -> Result<()> {
    let raw = fs::read_to_string(candidates_path)
        .map_err(|e| anyhow!("failed to read {}: {e}", candidates_path.display()))?;
    let candidates: Vec<Candidate> = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid candidates in {}: {e}", candidates_path.display()))?;
    let set = CandidateSet::new(candidates)?;
    let text = read_text(text_path)?;

    let mut engine_config = config.engine.clone();
    if let Some(quota) = quota {
        engine_config.quota = quota;
    }
    let engine = SelectionEngine::with_config(engine_config);
    let annotator = DistanceAnnotator::new(origin, unit);
    let result = engine.resolve_annotated(&text, &set, &annotator);

    done(
        "resolved",
        &format!(
            "{} of {} candidates ({} from oracle text)",
            result.len(),
            set.len(),
            result.oracle_matched()
        ),
    );
    if annotator.origin().is_some() {
        eprintln!(
            "  {} distances in {}",
            "→".cyan(),
            annotator.unit().suffix()
        );
    }
    print_json(&result)
}

fn cmd_recommend(config: &AppConfig, request_path: &Path, oracle_text: Option<&Path>) -> Result<()> {
    let raw = fs::read_to_string(request_path)
        .map_err(|e| anyhow!("failed to read {}: {e}", request_path.display()))?;
    let request: RecommendationRequest = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid request in {}: {e}", request_path.display()))?;

    let store = open_store(config)?;
    let service = RecommendationService::with_engine(
        store,
        build_oracle(oracle_text)?,
        SelectionEngine::with_config(config.engine.clone()),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;
    let recommendation = rt.block_on(service.recommend(&request))?;

    done(
        "recommended",
        &format!("{} places", recommendation.places.len()),
    );
    print_json(&recommendation)
}
