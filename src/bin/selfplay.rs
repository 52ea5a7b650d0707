use std::error::Error;

use fourchess::board::Board;
use fourchess::config::GameConfig;
use fourchess::piece::Colour;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

const MAX_PLIES: usize = 2000;
/// Chance per ply that the side to play resigns instead of moving.
const RESIGN_CHANCE: f64 = 0.002;

/// Usage: selfplay [config.json] [games]
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };
    let games: usize = args.next().map(|n| n.parse()).transpose()?.unwrap_or(1);

    info!("fourchess selfplay, built {}", env!("BUILD_TIMESTAMP"));
    let mut rng = rand::thread_rng();
    let mut wins = [0u32; 4];
    let mut draws = 0;

    for game in 1..=games {
        let mut board = Board::with_config(config.clone());
        while !board.game_over() && board.move_list.len() < MAX_PLIES {
            if rng.gen_bool(RESIGN_CHANCE) {
                board.resign()?;
                continue;
            }
            let moves = board.legal_moves();
            let Some(&(from, to)) = moves.choose(&mut rng) else {
                break;
            };
            board.try_move(&from.name(), &to.name(), false)?;
        }

        let scores: Vec<String> = Colour::ALL.iter().map(|&c| format!("{c} {}", board.score(c))).collect();
        match board.winner() {
            Some(winner) => wins[winner.index()] += 1,
            None if board.draw() => draws += 1,
            None => {}
        }
        eprintln!(
            "Game {game}: {} plies, winner {}, scores [{}]",
            board.move_list.len(),
            board.winner().map_or("none".to_string(), |c| c.to_string()),
            scores.join(", ")
        );
        eprintln!("  final position: {}", board.to_fen());
    }

    let tally: Vec<String> = Colour::ALL.iter().map(|&c| format!("{c} {}", wins[c.index()])).collect();
    eprintln!("Wins: {}; draws: {draws}", tally.join(", "));
    Ok(())
}
