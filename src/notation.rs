//! Numbered linear move text.
//!
//! One line per round, `N. ` prefix, plies separated by ` .. `:
//!
//! ```text
//! 1. h2-h4 .. b7-d7 .. g13-g11 .. m8-k8
//! 2. Qg1-h2 .. R .. Kh1-i1
//! ```

use tracing::debug;

use crate::board::Board;
use crate::config::GameConfig;
use crate::error::{MoveError, NotationError};
use crate::geometry::Coord;
use crate::piece::CastleSide;

const PLY_SEPARATOR: &str = " .. ";

/// One ply read back from move text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// A resignation without a move.
    Resign,
    Castle { side: CastleSide, resign: bool },
    Step { start: Coord, end: Coord, resign: bool },
}

/// Read a single ply. Check and mate marks are ignored; a trailing `R` marks a
/// resignation.
pub fn parse_token(token: &str) -> Result<Token, NotationError> {
    let bad = || NotationError::Token(token.to_string());
    let mut body = token.trim();
    let mut resign = false;
    while let Some(last) = body.chars().last().filter(|c| matches!(c, '+' | '#' | 'R')) {
        resign |= last == 'R';
        body = &body[..body.len() - 1];
    }

    match body {
        "" if resign => return Ok(Token::Resign),
        "O-O" => return Ok(Token::Castle { side: CastleSide::King, resign }),
        "O-O-O" => return Ok(Token::Castle { side: CastleSide::Queen, resign }),
        _ => {}
    }

    let body = body.strip_suffix("=D").unwrap_or(body);
    // The separator follows the rank digits of the start square.
    let split = body
        .char_indices()
        .skip(1)
        .find(|&(i, c)| {
            matches!(c, '-' | 'x') && body[..i].chars().last().is_some_and(|p| p.is_ascii_digit())
        })
        .map(|(i, _)| i)
        .ok_or_else(bad)?;
    let square = |part: &str| Coord::parse(part.trim_start_matches(|c: char| c.is_ascii_uppercase()));
    let start = square(&body[..split]).ok_or_else(bad)?;
    let end = square(&body[split + 1..]).ok_or_else(bad)?;
    Ok(Token::Step { start, end, resign })
}

impl Board {
    /// The game so far as move text.
    pub fn move_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut round = None;
        for mv in &self.move_list {
            match lines.last_mut() {
                Some(line) if round == Some(mv.number) => {
                    line.push_str(PLY_SEPARATOR);
                    line.push_str(&mv.notation);
                }
                _ => lines.push(format!("{}. {}", mv.number, mv.notation)),
            }
            round = Some(mv.number);
        }
        lines.join("\n")
    }

    /// Replay move text from the standard setup with the default rules.
    pub fn from_move_text(text: &str) -> Result<Board, NotationError> {
        Self::from_move_text_with_config(text, GameConfig::default())
    }

    /// Replay move text through the normal legality path. Recorded forced
    /// walks are replayed as written rather than re-rolled.
    pub fn from_move_text_with_config(text: &str, config: GameConfig) -> Result<Board, NotationError> {
        let mut board = Board::with_config(config);
        let tokens = text.lines().flat_map(|line| {
            let line = line.trim();
            let plies = match line.split_once(". ") {
                Some((number, rest)) if number.chars().all(|c| c.is_ascii_digit()) => rest,
                _ => line,
            };
            plies.split(PLY_SEPARATOR.trim()).map(str::trim).filter(|t| !t.is_empty())
        });

        for (ply, token) in tokens.enumerate() {
            let illegal = |source: MoveError| NotationError::Illegal { ply, token: token.to_string(), source };
            match parse_token(token)? {
                Token::Resign => {
                    board.resign_without_walk().map_err(illegal)?;
                }
                Token::Castle { side, resign } => {
                    let colour = board.to_play();
                    let start = board.position.king_loc(colour).ok_or(MoveError::GameOver).map_err(illegal)?;
                    let king = board.position.piece_at(start).ok_or(MoveError::NoPiece(start)).map_err(illegal)?;
                    let end = king.castle_king_target(start, side);
                    board.play(start, end, resign, false).map_err(illegal)?;
                }
                Token::Step { start, end, resign } => {
                    board.play(start, end, resign, false).map_err(illegal)?;
                }
            }
        }
        board.walk_resigned();
        debug!("replayed {} plies", board.move_list.len());
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Colour, PieceKind};

    fn sq(name: &str) -> Coord {
        Coord::parse(name).unwrap()
    }

    #[test]
    fn tokens() {
        assert_eq!(
            parse_token("Rd5xNk5+").unwrap(),
            Token::Step { start: sq("d5"), end: sq("k5"), resign: false }
        );
        assert_eq!(
            parse_token("e7-e8=D#R").unwrap(),
            Token::Step { start: sq("e7"), end: sq("e8"), resign: true }
        );
        assert_eq!(parse_token("O-O-O+").unwrap(), Token::Castle { side: CastleSide::Queen, resign: false });
        assert_eq!(parse_token("O-OR").unwrap(), Token::Castle { side: CastleSide::King, resign: true });
        assert_eq!(parse_token("R").unwrap(), Token::Resign);
        assert_eq!(parse_token("h2h4"), Err(NotationError::Token("h2h4".to_string())));
        assert!(parse_token("Qg1-").is_err());
    }

    #[test]
    fn text_round_trip() {
        let mut board = Board::new();
        for (from, to) in [("h2", "h4"), ("b7", "d7"), ("g13", "g11"), ("m8", "k8"), ("g1", "h2")] {
            board.try_move(from, to, false).unwrap();
        }
        let text = board.move_text();
        assert_eq!(text, "1. h2-h4 .. b7-d7 .. g13-g11 .. m8-k8\n2. Qg1-h2");

        let loaded = Board::from_move_text(&text).unwrap();
        assert_eq!(loaded.to_fen(), board.to_fen());
        assert_eq!(loaded.move_text(), text);
    }

    #[test]
    fn castling_from_text() {
        let text = "1. Nj1-k3 .. b7-c7 .. g13-g12 .. m8-l8\n\
                    2. h2-h3 .. c7-d7 .. g12-g11 .. l8-k8\n\
                    3. Bi1-h2 .. b8-c8 .. f13-f12 .. m7-l7\n\
                    4. O-O";
        let board = Board::from_move_text(text).unwrap();
        assert_eq!(board.piece_at("j1").unwrap().kind, PieceKind::King);
        assert_eq!(board.piece_at("i1").unwrap().kind, PieceKind::Rook);
        assert_eq!(board.move_list.last().unwrap().castling, Some(CastleSide::King));
        assert_eq!(board.move_text(), text);
    }

    #[test]
    fn resignation_and_forced_walk_replay() {
        let mut board = Board::new();
        board.resign().unwrap();
        for (from, to) in [("b7", "c7"), ("g13", "g12"), ("m8", "l8")] {
            board.try_move(from, to, false).unwrap();
        }
        assert!(board.move_list.last().unwrap().forced);
        let text = board.move_text();
        assert!(text.starts_with("1. R .. b7-c7"));

        let loaded = Board::from_move_text(&text).unwrap();
        assert_eq!(loaded.move_list.len(), 5);
        assert!(loaded.move_list.last().unwrap().forced);
        assert_eq!(loaded.to_fen(), board.to_fen());
        assert_eq!(loaded.to_play(), Colour::Blue);
    }

    #[test]
    fn illegal_ply_is_reported() {
        let err = Board::from_move_text("1. h2-h4 .. b7-c8").unwrap_err();
        match err {
            NotationError::Illegal { ply, token, source } => {
                assert_eq!(ply, 1);
                assert_eq!(token, "b7-c8");
                assert!(matches!(source, MoveError::Geometry { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
