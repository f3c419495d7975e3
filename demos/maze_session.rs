// Demonstration: run one headless session on a small maze.
//
// Build/run from this repo root:
//   cargo run --example maze_session -- --policy fusion --attempts 7 --seed 42
//   cargo run --example maze_session -- --artifacts path/to/model_dir

use std::env;

use tilepilot::config::{EpisodeConfig, SessionConfig};
use tilepilot::engine::{Policy, RandomPolicy};
use tilepilot::episode::{EpisodeController, EpisodeOutcome, EventLog, InstantMotion, TickOutcome};
use tilepilot::grid::{Coordinate, TileGrid};
use tilepilot::policy::ArtifactPaths;
use tilepilot::session::Session;

const MAZE: [&str; 6] = [
    "oo#G#o",
    "oo#oTo",
    "o###o#",
    "o#o###",
    "######",
    "#o##o#",
];

fn main() {
    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("fusion");
    let attempts: u32 = arg_value(&args, "--attempts")
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let maze = match TileGrid::from_rows(Coordinate::new(-2, 0), &MAZE) {
        Ok(maze) => maze,
        Err(e) => {
            eprintln!("bad maze: {e}");
            std::process::exit(2);
        }
    };

    let config = SessionConfig {
        artifacts: arg_value(&args, "--artifacts")
            .map(ArtifactPaths::in_dir)
            .unwrap_or_default(),
        seed: Some(seed),
        episode: EpisodeConfig {
            max_attempts: attempts,
            ..EpisodeConfig::default()
        },
        ..SessionConfig::default()
    };

    let mut log = EventLog::new();
    match policy_name {
        "fusion" => {
            let mut session = match Session::load(config) {
                Ok(session) => session,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            };
            print!("{}", session.report());
            let outcome = session.run(&maze, &mut log, 100_000);
            println!("Session {}: {:?}", session.id(), outcome);
        }
        "random" => {
            let mut policy = RandomPolicy::new();
            let mut controller = match EpisodeController::new(config.episode, Some(seed)) {
                Ok(controller) => controller,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            };
            let mut motion = InstantMotion::new();
            while !controller.is_terminated() {
                if let TickOutcome::SessionEnded(outcome) =
                    controller.tick(&maze, &mut policy, &mut motion, &mut log)
                {
                    println!("Policy {}: {}", policy.name(), outcome);
                }
                controller.complete_motion();
            }
        }
        other => {
            eprintln!("Unknown --policy '{}'; expected 'fusion' or 'random'.", other);
            std::process::exit(2);
        }
    }

    for episode in &log.episodes {
        println!(
            "  attempt {:>2}: {:?} after {} steps at {} ({} trap(s))",
            episode.attempt,
            episode.outcome,
            episode.steps,
            episode.final_position,
            episode.trap_triggers
        );
    }
    println!(
        "goals {}, falls {}, timeouts {}",
        log.count(EpisodeOutcome::Goal),
        log.count(EpisodeOutcome::Fallen),
        log.count(EpisodeOutcome::TimedOut)
    );
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
