//! Session Simulator CLI Tool
//!
//! Drives a full club night in-process: seeds a roster, runs scheduling
//! rounds with deterministic rating-derived outcomes, and reports the
//! resulting standings and variety numbers.
//!
//! Usage:
//!   cargo run --bin session-sim -- run --players 16 --courts 4 --rounds 6
//!   cargo run --bin session-sim -- run --players 20 --courts 4 --rounds 8 --json
//!   cargo run --bin session-sim -- run --config session.toml
//!   cargo run --bin session-sim -- first-round --players 16 --courts 4

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use clap::{Parser, Subcommand};
use club_night::clock::ManualClock;
use club_night::config::SessionConfig;
use club_night::scheduler::MatchmakingEngine;
use club_night::session::Session;
use club_night::types::{MatchScore, Player};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "session-sim")]
#[command(about = "Deterministic club-night simulator for the matchmaking engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a full session of scheduling rounds
    Run {
        /// Number of players in the roster
        #[arg(short, long, default_value = "16")]
        players: usize,
        /// Number of courts
        #[arg(short, long, default_value = "4")]
        courts: usize,
        /// Rounds of completions to simulate
        #[arg(short, long, default_value = "6")]
        rounds: usize,
        /// Optional TOML file with session config fields
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit the final report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the homogeneous first-round court assignments and exit
    FirstRound {
        /// Number of players in the roster
        #[arg(short, long, default_value = "16")]
        players: usize,
        /// Number of courts
        #[arg(short, long, default_value = "4")]
        courts: usize,
    },
}

#[derive(Debug, Serialize)]
struct StandingRow {
    rank: usize,
    player_id: String,
    rating: f64,
    games: u32,
    wins: u32,
    losses: u32,
    distinct_partners: usize,
    distinct_opponents: usize,
}

#[derive(Debug, Serialize)]
struct SessionReport {
    players: usize,
    courts: usize,
    rounds: usize,
    completed_matches: u32,
    standings: Vec<StandingRow>,
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let config: SessionConfig =
                toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        }
        None => Ok(SessionConfig::default()),
    }
}

fn seeded_session(players: usize, courts: usize, config: SessionConfig) -> Result<Session> {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
    let mut session = Session::new(courts, 2, config, now);
    for i in 1..=players {
        // Spread seeds so the roster has a clear initial ordering
        let seed = 1900.0 - (i as f64) * 30.0;
        session.add_player(
            Player::with_seed_rating(format!("p{i:02}"), format!("Player {i}"), seed),
            now,
        )?;
    }
    Ok(session)
}

/// Deterministic outcome: the higher-rated pairing wins, with a margin that
/// grows with the rating gap. Team order ties go to team A.
fn scripted_score(
    engine: &MatchmakingEngine,
    session: &Session,
    teams: &[Vec<String>; 2],
) -> MatchScore {
    let team_rating = |team: &[String]| -> f64 {
        team.iter()
            .filter_map(|id| engine.get_player_ranking(session, id).map(|(_, r)| r))
            .sum()
    };
    let a = team_rating(&teams[0]);
    let b = team_rating(&teams[1]);
    let gap = (a - b).abs();
    let loser_points = 10u16.saturating_sub((gap / 40.0) as u16);
    if a >= b {
        MatchScore::new(11, loser_points)
    } else {
        MatchScore::new(loser_points, 11)
    }
}

fn run_session(
    players: usize,
    courts: usize,
    rounds: usize,
    config: SessionConfig,
    json: bool,
) -> Result<()> {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap(),
    ));
    let engine = MatchmakingEngine::with_clock(clock.clone());
    let mut session = seeded_session(players, courts, config)?;

    let filled = engine.evaluate_and_populate_courts(&mut session)?;
    println!("🏸 Session started: {players} players, {courts} courts, {filled} courts filled");

    for round in 1..=rounds {
        clock.advance(Duration::minutes(15));
        let open: Vec<_> = session
            .matches()
            .iter()
            .filter(|m| m.is_open())
            .map(|m| (m.id, m.teams.clone()))
            .collect();
        if open.is_empty() {
            println!("⚠️  Round {round}: nothing on court, stopping early");
            break;
        }
        for (match_id, teams) in open {
            let score = scripted_score(&engine, &session, &teams);
            let refilled = engine.complete_match(&mut session, match_id, score)?;
            if !refilled.is_empty() {
                println!("  🔄 Round {round}: courts {refilled:?} refilled");
            }
        }
        println!(
            "✅ Round {round} complete ({} matches played so far)",
            session.completed_matches()
        );
    }

    let report = build_report(&engine, &session, players, courts, rounds);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn build_report(
    engine: &MatchmakingEngine,
    session: &Session,
    players: usize,
    courts: usize,
    rounds: usize,
) -> SessionReport {
    let mut standings: Vec<StandingRow> = session
        .active_ids()
        .into_iter()
        .filter_map(|id| {
            let (rank, rating) = engine.get_player_ranking(session, &id)?;
            let stats = session.stats_for(&id)?;
            Some(StandingRow {
                rank,
                player_id: id,
                rating,
                games: stats.games_played,
                wins: stats.wins,
                losses: stats.losses,
                distinct_partners: stats.partner_counts.len(),
                distinct_opponents: stats.opponent_counts.len(),
            })
        })
        .collect();
    standings.sort_by_key(|row| row.rank);

    SessionReport {
        players,
        courts,
        rounds,
        completed_matches: session.completed_matches(),
        standings,
    }
}

fn print_report(report: &SessionReport) {
    println!("\n📊 Final standings after {} matches:", report.completed_matches);
    println!("  rank  player  rating  g  w-l   partners/opponents");
    for row in &report.standings {
        println!(
            "  {:>4}  {:<6}  {:>6.0}  {}  {}-{}   {}/{}",
            row.rank,
            row.player_id,
            row.rating,
            row.games,
            row.wins,
            row.losses,
            row.distinct_partners,
            row.distinct_opponents
        );
    }
}

fn show_first_round(players: usize, courts: usize) -> Result<()> {
    let engine = MatchmakingEngine::new();
    let mut session = seeded_session(players, courts, SessionConfig::default())?;
    engine.evaluate_and_populate_courts(&mut session)?;

    println!("🏸 First-round assignments ({players} players, {courts} courts):");
    for game in session.matches() {
        println!(
            "  court {}: {:?} vs {:?}",
            game.court, game.teams[0], game.teams[1]
        );
    }
    let waiting = engine.get_waiting_players(&session);
    if !waiting.is_empty() {
        println!("  sitting out: {waiting:?}");
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            players,
            courts,
            rounds,
            config,
            json,
        } => {
            let config = load_config(config.as_ref())?;
            run_session(players, courts, rounds, config, json)
        }
        Commands::FirstRound { players, courts } => show_first_round(players, courts),
    }
}
