use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::geometry::{unit_step, Coord};
use crate::piece::{CastleSide, Colour, Piece, PieceId, PieceKind};
use crate::position::{Delta, Position};
use crate::square::Obstruction;

/// How strictly a legality test runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// A real request: the piece must belong to the colour to play.
    Play,
    /// Reachability only. Used for check detection, mate and stalemate
    /// enumeration and castling safety; skips the turn check and nothing else.
    Reach,
}

/// A move that passed its geometric legality test, with everything the
/// board needs to apply it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub piece: PieceId,
    pub kind: PieceKind,
    pub colour: Colour,
    pub start: Coord,
    pub end: Coord,
    pub castling: Option<CastleSide>,
    pub double_push: bool,
    /// Square of the pawn taken en passant.
    pub en_passant: Option<Coord>,
    pub promoting: bool,
}

pub type Verdict = Result<Candidate, MoveError>;

/// Test whether the piece on `start` may move to `end`, ignoring whether the
/// mover's king ends up in check (the position checks that separately).
pub fn legal_check(pos: &Position, start: Coord, end: Coord, probe: Probe) -> Verdict {
    let id = pos.occupant(start).ok_or(MoveError::NoPiece(start))?;
    let piece = pos.piece(id);
    if !piece.can_move() {
        return Err(MoveError::DeadPiece(start));
    }
    if probe == Probe::Play && piece.colour != pos.state.to_play {
        return Err(MoveError::WrongTurn { colour: piece.colour, to_play: pos.state.to_play });
    }
    if start == end {
        return Err(MoveError::NullMove(start));
    }
    if !pos.shape.is_playable(end) {
        return Err(MoveError::BlockedSquare(end));
    }
    if let Some(target) = pos.occupant(end) {
        let target = pos.piece(target);
        if target.is_live() && target.colour == piece.colour {
            return Err(MoveError::OwnPiece(end));
        }
    }

    let mut candidate = Candidate {
        piece: id,
        kind: piece.kind,
        colour: piece.colour,
        start,
        end,
        castling: None,
        double_push: false,
        en_passant: None,
        promoting: false,
    };

    match piece.kind {
        PieceKind::Rook => line_test(pos, start, end)?,
        PieceKind::Bishop => diagonal_test(pos, start, end)?,
        PieceKind::Queen => {
            let (df, dr) = start.delta(end);
            if df == 0 || dr == 0 {
                line_test(pos, start, end)?;
            } else if df.abs() == dr.abs() {
                diagonal_test(pos, start, end)?;
            } else {
                return Err(geometry(PieceKind::Queen, start, end));
            }
        }
        PieceKind::Knight => knight_test(start, end)?,
        PieceKind::King => {
            if king_test(start, end).is_err() {
                candidate.castling = Some(castling_test(pos, piece, start, end)?);
            }
        }
        PieceKind::Pawn => pawn_test(pos, piece, &mut candidate)?,
    }

    Ok(candidate)
}

fn geometry(kind: PieceKind, start: Coord, end: Coord) -> MoveError {
    MoveError::Geometry { kind, start, end }
}

/// Walk from `start` toward `end` one square at a time. The first thing in the
/// way must be the destination itself; blocked corners always stop the scan.
pub fn scan(pos: &Position, start: Coord, end: Coord) -> bool {
    let step = unit_step(start, end);
    let mut cur = start.step(step);
    loop {
        match pos.obstruct(cur) {
            Obstruction::Empty if cur == end => return true,
            Obstruction::Empty => cur = cur.step(step),
            Obstruction::Blocked => return false,
            Obstruction::Occupied(_) => return cur == end,
        }
    }
}

fn line_test(pos: &Position, start: Coord, end: Coord) -> Result<(), MoveError> {
    let (df, dr) = start.delta(end);
    if df != 0 && dr != 0 {
        return Err(geometry(PieceKind::Rook, start, end));
    }
    if !scan(pos, start, end) {
        return Err(MoveError::Obstructed { start, end });
    }
    Ok(())
}

fn diagonal_test(pos: &Position, start: Coord, end: Coord) -> Result<(), MoveError> {
    let (df, dr) = start.delta(end);
    if df.abs() != dr.abs() {
        return Err(geometry(PieceKind::Bishop, start, end));
    }
    if !scan(pos, start, end) {
        return Err(MoveError::Obstructed { start, end });
    }
    Ok(())
}

fn knight_test(start: Coord, end: Coord) -> Result<(), MoveError> {
    let (df, dr) = start.delta(end);
    match (df.abs(), dr.abs()) {
        (1, 2) | (2, 1) => Ok(()),
        _ => Err(geometry(PieceKind::Knight, start, end)),
    }
}

fn king_test(start: Coord, end: Coord) -> Result<(), MoveError> {
    let (df, dr) = start.delta(end);
    if df.abs() <= 1 && dr.abs() <= 1 {
        Ok(())
    } else {
        Err(geometry(PieceKind::King, start, end))
    }
}

/// A king two squares along its seat's rank from its home square, with the
/// matching rights, its own rook in place and an empty path. Attacks on the
/// king's path are checked by the position.
fn castling_test(pos: &Position, king: &Piece, start: Coord, end: Coord) -> Result<CastleSide, MoveError> {
    let side = [CastleSide::King, CastleSide::Queen]
        .into_iter()
        .find(|&side| king.castle_king_target(start, side) == end)
        .ok_or_else(|| geometry(PieceKind::King, start, end))?;
    if start != king.home_king_square(&pos.shape) {
        return Err(geometry(PieceKind::King, start, end));
    }
    if !pos.player(king.colour).castle_right(side) {
        return Err(MoveError::CastlingRights { colour: king.colour, side });
    }

    let rook_square = king.castle_rook_square(&pos.shape, side);
    let rook_ok = pos.occupant(rook_square).map(|id| pos.piece(id)).is_some_and(|rook| {
        rook.kind == PieceKind::Rook && rook.colour == king.colour && rook.is_live()
    });
    if !rook_ok {
        return Err(MoveError::CastlingBlocked { side });
    }

    let step = unit_step(start, rook_square);
    let mut cur = start.step(step);
    while cur != rook_square {
        if pos.obstruct(cur) != Obstruction::Empty {
            return Err(MoveError::CastlingBlocked { side });
        }
        cur = cur.step(step);
    }
    Ok(side)
}

fn pawn_test(pos: &Position, pawn: &Piece, candidate: &mut Candidate) -> Result<(), MoveError> {
    let (start, end) = (candidate.start, candidate.end);
    let (ff, fr) = pawn.direction.forward();
    let (rf, rr) = pawn.direction.right();
    let delta = start.delta(end);
    let occupied = pos.occupant(end).is_some();

    if delta == (ff, fr) {
        if occupied {
            return Err(MoveError::Obstructed { start, end });
        }
    } else if delta == (2 * ff, 2 * fr) {
        if pawn.last_move.is_some() {
            return Err(geometry(PieceKind::Pawn, start, end));
        }
        if pos.obstruct(start.offset(ff, fr)) != Obstruction::Empty || occupied {
            return Err(MoveError::Obstructed { start, end });
        }
        candidate.double_push = true;
    } else if delta == (ff + rf, fr + rr) || delta == (ff - rf, fr - rr) {
        if !occupied {
            candidate.en_passant =
                Some(en_passant_test(pos, pawn, end).ok_or_else(|| geometry(PieceKind::Pawn, start, end))?);
        }
    } else {
        return Err(geometry(PieceKind::Pawn, start, end));
    }

    candidate.promoting = pawn.direction.depth(&pos.shape, end) >= pos.promotion_rank;
    Ok(())
}

/// The square behind an empty diagonal target (from the mover's side) must
/// hold an enemy pawn whose double push came after the mover's previous turn.
fn en_passant_test(pos: &Position, pawn: &Piece, target: Coord) -> Option<Coord> {
    let (ff, fr) = pawn.direction.forward();
    let behind = target.offset(-ff, -fr);
    let victim = pos.piece(pos.occupant(behind)?);
    if victim.kind != PieceKind::Pawn || victim.colour == pawn.colour || !victim.is_live() {
        return None;
    }
    let last = victim.last_move?;
    let window = pos.state.colours.len() as u32;
    if last.double_push && pos.state.ply.saturating_sub(last.ply) < window {
        Some(behind)
    } else {
        None
    }
}

// =============================================================================
// Committed moves
// =============================================================================

/// One committed ply, with the flags a UI needs and the delta the review
/// cursor replays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub start: Coord,
    pub end: Coord,
    pub colour: Colour,
    pub kind: PieceKind,
    /// Display move number (round).
    pub number: u32,
    /// Absolute ply index.
    pub total_number: u32,
    pub castling: Option<CastleSide>,
    pub double_push: bool,
    pub enpassant_cap: Option<Coord>,
    pub promoting: bool,
    pub captured: Option<PieceKind>,
    pub resign: bool,
    /// Played automatically for a resigned king.
    pub forced: bool,
    pub draw: bool,
    pub game_over: bool,
    /// Kings in check after this ply, with the squares of their attackers.
    pub checks: BTreeMap<Colour, Vec<Coord>>,
    pub mating: Vec<Colour>,
    pub stale: Vec<Colour>,
    pub notation: String,
    pub(crate) delta: Delta,
}

impl Move {
    /// Linear notation: `[symbol]start(-|x)[symbol]end[=D][+|#|R]*`.
    pub fn describe(&self) -> String {
        let mut text = if self.resign && self.start == self.end {
            String::new()
        } else if let Some(side) = self.castling {
            side.notation().to_string()
        } else {
            let sep = if self.captured.is_some() { 'x' } else { '-' };
            let taken = self.captured.map(PieceKind::symbol).unwrap_or("");
            let mut body = format!("{}{}{sep}{taken}{}", self.kind.symbol(), self.start, self.end);
            if self.promoting {
                body.push_str("=D");
            }
            body
        };
        for (colour, attackers) in &self.checks {
            if !attackers.is_empty() && !self.mating.contains(colour) {
                text.push('+');
            }
        }
        for _ in &self.mating {
            text.push('#');
        }
        if self.resign {
            text.push('R');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn sq(name: &str) -> Coord {
        Coord::parse(name).unwrap()
    }

    fn position() -> Position {
        let config = GameConfig::default();
        Position::empty(config.shape(), config.promotion_rank)
    }

    /// A rook can take an enemy two squares along its rank but not jump it;
    /// with a friendly piece there it can do neither.
    #[test]
    fn sliding_obstruction() {
        let mut pos = position();
        pos.place(sq("d1"), Colour::Red, PieceKind::Rook);
        let blocker = pos.place(sq("f1"), Colour::Yellow, PieceKind::Pawn);

        assert!(legal_check(&pos, sq("d1"), sq("f1"), Probe::Reach).is_ok());
        assert!(legal_check(&pos, sq("d1"), sq("e1"), Probe::Reach).is_ok());
        assert_eq!(
            legal_check(&pos, sq("d1"), sq("g1"), Probe::Reach),
            Err(MoveError::Obstructed { start: sq("d1"), end: sq("g1") })
        );

        pos.piece_mut(blocker).colour = Colour::Red;
        assert_eq!(legal_check(&pos, sq("d1"), sq("f1"), Probe::Reach), Err(MoveError::OwnPiece(sq("f1"))));
        assert!(legal_check(&pos, sq("d1"), sq("g1"), Probe::Reach).is_err());
    }

    #[test]
    fn blocked_corners_stop_scans() {
        let mut pos = position();
        pos.place(sq("d3"), Colour::Red, PieceKind::Bishop);
        pos.place(sq("d2"), Colour::Red, PieceKind::Queen);
        pos.place(sq("d4"), Colour::Red, PieceKind::Rook);
        assert_eq!(legal_check(&pos, sq("d3"), sq("c2"), Probe::Reach), Err(MoveError::BlockedSquare(sq("c2"))));
        assert!(legal_check(&pos, sq("d4"), sq("n4"), Probe::Reach).is_ok());
        assert!(legal_check(&pos, sq("d3"), sq("a6"), Probe::Reach).is_ok());
        assert!(legal_check(&pos, sq("d3"), sq("f1"), Probe::Reach).is_ok());
        // c3 is a corner cell between d2 and b4.
        assert_eq!(
            legal_check(&pos, sq("d2"), sq("b4"), Probe::Reach),
            Err(MoveError::Obstructed { start: sq("d2"), end: sq("b4") })
        );
    }

    #[test]
    fn knight_and_king_geometry() {
        let mut pos = position();
        pos.place(sq("g7"), Colour::Blue, PieceKind::Knight);
        pos.place(sq("j7"), Colour::Blue, PieceKind::King);
        for to in ["h9", "f9", "e8", "e6", "f5", "h5", "i6", "i8"] {
            assert!(legal_check(&pos, sq("g7"), sq(to), Probe::Reach).is_ok(), "{to}");
        }
        assert!(legal_check(&pos, sq("g7"), sq("g9"), Probe::Reach).is_err());
        assert!(legal_check(&pos, sq("j7"), sq("k8"), Probe::Reach).is_ok());
        assert!(legal_check(&pos, sq("j7"), sq("j9"), Probe::Reach).is_err());
    }

    #[test]
    fn pawns_push_along_their_seat() {
        let mut pos = position();
        pos.place(sq("b6"), Colour::Blue, PieceKind::Pawn);
        pos.place(sq("g13"), Colour::Yellow, PieceKind::Pawn);
        pos.place(sq("f12"), Colour::Red, PieceKind::Knight);

        assert!(legal_check(&pos, sq("b6"), sq("c6"), Probe::Reach).is_ok());
        let double = legal_check(&pos, sq("b6"), sq("d6"), Probe::Reach).unwrap();
        assert!(double.double_push);
        assert!(legal_check(&pos, sq("b6"), sq("b7"), Probe::Reach).is_err());

        // Yellow pushes down the board and captures diagonally forward.
        assert!(legal_check(&pos, sq("g13"), sq("g11"), Probe::Reach).is_ok());
        assert!(legal_check(&pos, sq("g13"), sq("f12"), Probe::Reach).is_ok());
        assert!(legal_check(&pos, sq("g13"), sq("h12"), Probe::Reach).is_err());
        assert!(legal_check(&pos, sq("g13"), sq("g14"), Probe::Reach).is_err());
    }

    #[test]
    fn pawn_promotes_at_configured_depth() {
        let mut pos = position();
        pos.place(sq("e7"), Colour::Red, PieceKind::Pawn);
        pos.place(sq("g7"), Colour::Green, PieceKind::Pawn);
        assert!(legal_check(&pos, sq("e7"), sq("e8"), Probe::Reach).unwrap().promoting);
        // Green's depth is measured from the n-file.
        assert!(legal_check(&pos, sq("g7"), sq("f7"), Probe::Reach).unwrap().promoting);
        assert!(!legal_check(&pos, sq("g7"), sq("f7"), Probe::Reach).unwrap().double_push);
    }

    #[test]
    fn turn_is_only_checked_in_play_mode() {
        let mut pos = position();
        pos.place(sq("e2"), Colour::Blue, PieceKind::Rook);
        pos.state.to_play = Colour::Red;
        assert_eq!(
            legal_check(&pos, sq("e2"), sq("e5"), Probe::Play),
            Err(MoveError::WrongTurn { colour: Colour::Blue, to_play: Colour::Red })
        );
        assert!(legal_check(&pos, sq("e2"), sq("e5"), Probe::Reach).is_ok());
    }
}
