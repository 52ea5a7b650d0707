//! Position string export and import.
//!
//! Seven `-` separated fields: turn, per-colour status (1 active, 2 resigned,
//! 0 eliminated or absent), king-side rights, queen-side rights, scores,
//! half-move counter, and the rows from the top rank down. Rows are `/`
//! separated; cells are comma separated, with a number standing for a run of
//! empty or blocked cells and `rP`, `bN`, `yK`... for pieces.
//!
//! The string describes a position, not a game: it carries no ply or round
//! count, capture lists or promotion markers. A loaded board starts at round 1
//! with an empty move list and treats promoted queens as ordinary queens. Use
//! move text to keep the history.

use tracing::debug;

use crate::board::Board;
use crate::config::GameConfig;
use crate::error::FenError;
use crate::geometry::Coord;
use crate::piece::{Colour, LastMove, PieceKind};

const ACTIVE: u32 = 1;
const RESIGNED: u32 = 2;

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values.into_iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

fn four(field: &'static str, value: &str) -> Result<[u32; 4], FenError> {
    let bad = || FenError::Field { field, value: value.to_string() };
    let parsed: Vec<u32> = value
        .split(',')
        .map(|v| v.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad())?;
    parsed.try_into().map_err(|_| bad())
}

impl Board {
    pub fn to_fen(&self) -> String {
        let pos = &self.position;
        let state = &pos.state;
        let players = Colour::ALL.map(|c| pos.player(c));

        let status = Colour::ALL.map(|c| match (pos.in_rotation(c), pos.player(c).resigned) {
            (false, _) => 0,
            (true, true) => RESIGNED,
            (true, false) => ACTIVE,
        });
        let king_side = players.map(|p| u32::from(p.king_castle));
        let queen_side = players.map(|p| u32::from(p.queen_castle));
        let scores = players.map(|p| p.score);

        let shape = pos.shape;
        let mut rows = Vec::with_capacity(shape.nrows as usize);
        for rank in (0..shape.nrows).rev() {
            let mut cells = Vec::new();
            let mut run = 0;
            for file in 0..shape.ncols {
                match pos.piece_at(Coord::new(file, rank)) {
                    Some(piece) => {
                        if run > 0 {
                            cells.push(run.to_string());
                            run = 0;
                        }
                        cells.push(format!("{}{}", piece.colour.code(), piece.kind.code()));
                    }
                    None => run += 1,
                }
            }
            if run > 0 {
                cells.push(run.to_string());
            }
            rows.push(cells.join(","));
        }

        [
            state.to_play.code().to_ascii_uppercase().to_string(),
            join(status),
            join(king_side),
            join(queen_side),
            join(scores),
            state.halfmove.to_string(),
            rows.join("/"),
        ]
        .join("-")
    }

    /// Load a position string with the default rules.
    pub fn from_fen(text: &str) -> Result<Board, FenError> {
        Self::from_fen_with_config(text, GameConfig::default())
    }

    pub fn from_fen_with_config(text: &str, config: GameConfig) -> Result<Board, FenError> {
        let fields: Vec<&str> = text.trim().split('-').collect();
        let &[turn, status, king_side, queen_side, scores, halfmove, rows] = fields.as_slice() else {
            return Err(FenError::FieldCount(fields.len()));
        };

        let mut turn_chars = turn.chars();
        let to_play = match (turn_chars.next(), turn_chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Colour::from_code(c),
            _ => None,
        }
        .ok_or_else(|| FenError::Field { field: "turn", value: turn.to_string() })?;
        let status = four("status", status)?;
        let king_side = four("king-side castling", king_side)?;
        let queen_side = four("queen-side castling", queen_side)?;
        let scores = four("score", scores)?;
        let halfmove = halfmove
            .parse::<u32>()
            .map_err(|_| FenError::Field { field: "half-move", value: halfmove.to_string() })?;

        let mut board = Board::empty_with_config(config);
        let shape = board.position.shape;
        let rows: Vec<&str> = rows.split('/').collect();
        if rows.len() != shape.nrows as usize {
            return Err(FenError::RowCount { expected: shape.nrows as usize, found: rows.len() });
        }

        for (row, cells) in rows.iter().enumerate() {
            let rank = shape.nrows - 1 - row as i32;
            let mut file: i32 = 0;
            for cell in cells.split(',') {
                if let Ok(run) = cell.parse::<i32>() {
                    file = file
                        .checked_add(run)
                        .filter(|&end| run > 0 && end <= shape.ncols)
                        .ok_or(FenError::RowWidth { row, found: file.saturating_add(run), expected: shape.ncols })?;
                    continue;
                }
                let mut chars = cell.chars();
                let (Some(c), Some(k), None) = (chars.next(), chars.next(), chars.next()) else {
                    return Err(FenError::Cell(cell.to_string()));
                };
                let colour = Colour::from_code(c).ok_or_else(|| FenError::Cell(cell.to_string()))?;
                let kind = PieceKind::from_code(k).ok_or_else(|| FenError::Cell(cell.to_string()))?;
                if file >= shape.ncols {
                    return Err(FenError::RowWidth { row, found: file + 1, expected: shape.ncols });
                }
                let at = Coord::new(file, rank);
                if !shape.is_playable(at) {
                    return Err(FenError::Blocked(at));
                }
                if kind == PieceKind::King && board.position.player(colour).king.is_some() {
                    return Err(FenError::DuplicateKing(colour));
                }
                let id = board.position.place(at, colour, kind);
                let piece = board.position.piece_mut(id);
                if kind == PieceKind::Pawn && piece.direction.depth(&shape, at) != 2 {
                    piece.last_move = Some(LastMove { ply: 0, double_push: false });
                }
                file += 1;
            }
            if file != shape.ncols {
                return Err(FenError::RowWidth { row, found: file, expected: shape.ncols });
            }
        }

        for (i, colour) in Colour::ALL.into_iter().enumerate() {
            let player = board.position.player_mut(colour);
            player.king_castle = king_side[i] == 1;
            player.queen_castle = queen_side[i] == 1;
            player.score = scores[i];
            if player.king.is_none() {
                // A colour whose king was taken keeps its other pieces as dead
                // markers.
                if board.position.pieces().any(|(_, p)| p.colour == colour) {
                    board.position.eliminate(colour);
                }
                continue;
            }
            match status[i] {
                ACTIVE => {}
                RESIGNED => board.position.resign(colour),
                _ => board.position.eliminate(colour),
            }
        }

        let state = &mut board.position.state;
        if !state.colours.contains(&to_play) {
            return Err(FenError::Field { field: "turn", value: turn.to_string() });
        }
        state.to_play = to_play;
        state.halfmove = halfmove;
        let standing: Vec<Colour> = state
            .colours
            .iter()
            .copied()
            .filter(|&c| !state.players[c.index()].resigned)
            .collect();
        if standing.len() <= 1 {
            state.game_over = true;
            state.winner = standing.first().copied();
        }

        debug!("loaded position with {} colours in rotation", board.colours().len());
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveError;

    #[test]
    fn initial_position_string() {
        let fen = Board::new().to_fen();
        assert!(fen.starts_with(
            "R-1,1,1,1-1,1,1,1-1,1,1,1-0,0,0,0-0-3,yR,yN,yB,yK,yQ,yB,yN,yR,3/3,yP,yP,yP,yP,yP,yP,yP,yP,3/"
        ));
        let rows: Vec<&str> = fen.split('-').last().unwrap().split('/').collect();
        assert_eq!(rows.len(), 14);
        assert_eq!(rows[3], "bR,bP,10,gP,gR");
        assert_eq!(rows[6], "bQ,bP,10,gP,gK");
        assert_eq!(rows[7], "bK,bP,10,gP,gQ");
        assert_eq!(rows[13], "3,rR,rN,rB,rQ,rK,rB,rN,rR,3");
    }

    #[test]
    fn round_trip_after_some_play() {
        let mut board = Board::new();
        for (from, to) in [("h2", "h4"), ("b7", "d7"), ("g13", "g11"), ("m8", "k8"), ("g1", "h2")] {
            board.try_move(from, to, false).unwrap();
        }
        board.resign().unwrap();
        let fen = board.to_fen();
        assert!(fen.starts_with("Y-1,2,1,1-"));

        let loaded = Board::from_fen(&fen).unwrap();
        assert_eq!(loaded.to_fen(), fen);
        assert_eq!(loaded.to_play(), Colour::Yellow);
        assert!(loaded.resigned(Colour::Blue));
        assert!(loaded.piece_at("a7").unwrap().dead);
        assert_eq!(loaded.halfmove(), board.halfmove());
    }

    #[test]
    fn moved_pawns_lose_their_double_push() {
        let mut board = Board::new();
        board.try_move("h2", "h4", false).unwrap();
        let fen = board.to_fen().replacen('B', "R", 1);
        let mut loaded = Board::from_fen(&fen).unwrap();
        assert_eq!(loaded.to_play(), Colour::Red);
        assert!(matches!(loaded.try_move("h4", "h6", false), Err(MoveError::Geometry { .. })));
        assert!(loaded.move_piece("i2", "i4", false));
    }

    #[test]
    fn eliminated_colours_stay_as_markers() {
        let fen = Board::new().to_fen().replacen("1,1,1,1", "1,0,1,1", 1);
        let board = Board::from_fen(&fen).unwrap();
        assert_eq!(board.colours(), &[Colour::Red, Colour::Yellow, Colour::Green]);
        assert!(board.eliminated(Colour::Blue));
        assert!(board.piece_at("a7").unwrap().dead);
    }

    #[test]
    fn malformed_strings() {
        assert_eq!(Board::from_fen("R-1,1,1,1").unwrap_err(), FenError::FieldCount(2));
        let good = Board::new().to_fen();

        let bad_turn = good.replacen('R', "X", 1);
        assert!(matches!(Board::from_fen(&bad_turn), Err(FenError::Field { field: "turn", .. })));

        let narrow = good.replacen(",3/", ",2/", 1);
        assert!(matches!(Board::from_fen(&narrow), Err(FenError::RowWidth { row: 0, found: 13, expected: 14 })));

        let cornered = good.replacen("3,yR", "yR,2,yR", 1);
        assert_eq!(Board::from_fen(&cornered).unwrap_err(), FenError::Blocked(Coord::new(0, 13)));

        let bad_cell = good.replacen("yN", "yX", 1);
        assert_eq!(Board::from_fen(&bad_cell).unwrap_err(), FenError::Cell("yX".to_string()));
    }

    #[test]
    fn oversized_runs_are_rejected() {
        let good = Board::new().to_fen();

        let wide = good.replacen("-3,yR", "-15,yR", 1);
        assert_eq!(Board::from_fen(&wide).unwrap_err(), FenError::RowWidth { row: 0, found: 15, expected: 14 });

        let huge = good.replacen("-3,yR", "-2147483647,1,yR", 1);
        assert_eq!(
            Board::from_fen(&huge).unwrap_err(),
            FenError::RowWidth { row: 0, found: i32::MAX, expected: 14 }
        );
    }

    #[test]
    fn captured_king_leaves_dead_pieces_after_reload() {
        let mut board = Board::empty();
        board.place("h1", Colour::Red, PieceKind::King).unwrap();
        board.place("f10", Colour::Red, PieceKind::Knight).unwrap();
        board.place("a7", Colour::Blue, PieceKind::King).unwrap();
        board.place("d10", Colour::Yellow, PieceKind::Rook).unwrap();
        board.place("g14", Colour::Yellow, PieceKind::King).unwrap();
        board.place("j10", Colour::Green, PieceKind::King).unwrap();
        board.place("l5", Colour::Green, PieceKind::Rook).unwrap();

        // Red uncovers the rook; Green never gets a turn before it is taken.
        for (from, to) in [("f10", "e8"), ("a7", "b7"), ("d10", "j10")] {
            board.try_move(from, to, false).unwrap();
        }
        assert_eq!(board.move_list.last().unwrap().mating, vec![Colour::Green]);
        assert!(board.piece_at("l5").unwrap().dead);

        let fen = board.to_fen();
        let loaded = Board::from_fen(&fen).unwrap();
        assert!(loaded.piece_at("l5").unwrap().dead);
        assert!(loaded.eliminated(Colour::Green));
        assert_eq!(loaded.colours(), &[Colour::Red, Colour::Blue, Colour::Yellow]);
        assert!(loaded.checks().is_empty());
        assert_eq!(loaded.to_fen(), fen);
    }

    #[test]
    fn loading_starts_a_fresh_history() {
        let mut board = Board::empty();
        board.place("h1", Colour::Red, PieceKind::King).unwrap();
        board.place("g14", Colour::Yellow, PieceKind::King).unwrap();
        board.place("e7", Colour::Red, PieceKind::Pawn).unwrap();
        board.try_move("e7", "e8", false).unwrap();
        board.try_move("g14", "g13", false).unwrap();
        assert_eq!(board.round(), 2);

        let loaded = Board::from_fen(&board.to_fen()).unwrap();
        assert_eq!(loaded.round(), 1);
        assert_eq!(loaded.ply(), 0);
        assert!(loaded.move_list.is_empty());
        let queen = loaded.piece_at("e8").unwrap();
        assert_eq!(queen.kind, PieceKind::Queen);
        assert!(!queen.promoted);
    }
}
