// =============================================================================
// Position: the grid, the piece arena and the per-colour ledger.
//
// Everything that can change during a game lives here, so a clone is a full
// snapshot. Legality probes ("would this leave my king in check?") run on
// clones and are thrown away; committed plies are recorded as a `Delta`
// between the positions before and after, which the review cursor replays in
// either direction.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::geometry::{unit_step, BoardShape, Coord, KNIGHT_OFFSETS, RAYS};
use crate::moves::{legal_check, Candidate, Probe, Verdict};
use crate::piece::{CastleSide, Colour, LastMove, Piece, PieceId, PieceKind};
use crate::square::{Obstruction, Square};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub score: u32,
    /// Kinds this colour has captured, in order.
    pub captures: Vec<PieceKind>,
    pub king: Option<PieceId>,
    pub king_castle: bool,
    pub queen_castle: bool,
    pub resigned: bool,
    pub eliminated: bool,
}

impl PlayerState {
    pub fn castle_right(&self, side: CastleSide) -> bool {
        match side {
            CastleSide::King => self.king_castle,
            CastleSide::Queen => self.queen_castle,
        }
    }

    fn clear_castle(&mut self, side: CastleSide) {
        match side {
            CastleSide::King => self.king_castle = false,
            CastleSide::Queen => self.queen_castle = false,
        }
    }
}

/// Turn order, counters and the per-colour ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: [PlayerState; 4],
    /// Colours still in the turn rotation, in seating order.
    pub colours: Vec<Colour>,
    pub to_play: Colour,
    /// Plies committed so far.
    pub ply: u32,
    /// Display move number.
    pub round: u32,
    /// Plies since the last pawn move or capture.
    pub halfmove: u32,
    pub game_over: bool,
    pub winner: Option<Colour>,
    pub draw: bool,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            players: Default::default(),
            colours: Vec::new(),
            to_play: Colour::Red,
            ply: 0,
            round: 1,
            halfmove: 0,
            game_over: false,
            winner: None,
            draw: false,
        }
    }
}

/// What applying a candidate took off the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    pub captured: Option<PieceId>,
    /// The capture went onto the capturer's list (live victim, active mover).
    pub credited: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub shape: BoardShape,
    pub promotion_rank: i32,
    squares: Vec<Square>,
    pieces: Vec<Piece>,
    pub state: GameState,
}

impl Position {
    /// A board with no pieces and nobody in the rotation.
    pub fn empty(shape: BoardShape, promotion_rank: i32) -> Self {
        let squares = (0..shape.len())
            .map(|i| {
                let c = shape.coord(i);
                Square::new(c, shape.is_blocked(c))
            })
            .collect();
        Position {
            shape,
            promotion_rank,
            squares,
            pieces: Vec::new(),
            state: GameState::default(),
        }
    }

    /// The standard four-colour setup with full castling rights.
    pub fn standard(shape: BoardShape, promotion_rank: i32) -> Self {
        let mut pos = Self::empty(shape, promotion_rank);
        for colour in Colour::ALL {
            let dir = colour.direction();
            for (x, &kind) in PieceKind::BACK_RANK.iter().enumerate() {
                pos.place(dir.seat_square(&shape, x as i32, 0), colour, kind);
            }
            for x in 0..8 {
                pos.place(dir.seat_square(&shape, x, 1), colour, PieceKind::Pawn);
            }
            let player = pos.player_mut(colour);
            player.king_castle = true;
            player.queen_castle = true;
        }
        pos.state.to_play = Colour::Red;
        pos
    }

    /// Put a new piece on `at`, which must be an empty playable square.
    /// Placing a king enrols its colour in the rotation.
    pub fn place(&mut self, at: Coord, colour: Colour, kind: PieceKind) -> PieceId {
        let id = PieceId(self.pieces.len());
        self.pieces.push(Piece::new(kind, colour, at));
        self.set_occupant(at, Some(id));
        if kind == PieceKind::King {
            self.player_mut(colour).king = Some(id);
            if !self.state.colours.contains(&colour) {
                self.state.colours.push(colour);
                self.state.colours.sort();
            }
            if !self.state.colours.contains(&self.state.to_play) {
                self.state.to_play = self.state.colours[0];
            }
        }
        id
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn square(&self, c: Coord) -> Option<&Square> {
        if self.shape.contains(c) {
            Some(&self.squares[self.shape.index(c)])
        } else {
            None
        }
    }

    /// All cells, row-major from a1.
    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Off-board cells obstruct like corners.
    pub fn obstruct(&self, c: Coord) -> Obstruction {
        self.square(c).map_or(Obstruction::Blocked, Square::obstruct)
    }

    pub fn occupant(&self, c: Coord) -> Option<PieceId> {
        self.square(c).and_then(|s| s.piece)
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.0]
    }

    pub fn piece_at(&self, c: Coord) -> Option<&Piece> {
        self.occupant(c).map(|id| self.piece(id))
    }

    pub fn pieces(&self) -> impl Iterator<Item = (PieceId, &Piece)> {
        self.pieces.iter().enumerate().map(|(i, p)| (PieceId(i), p))
    }

    pub fn player(&self, colour: Colour) -> &PlayerState {
        &self.state.players[colour.index()]
    }

    pub fn player_mut(&mut self, colour: Colour) -> &mut PlayerState {
        &mut self.state.players[colour.index()]
    }

    pub fn king_loc(&self, colour: Colour) -> Option<Coord> {
        let id = self.player(colour).king?;
        self.piece(id).loc
    }

    pub fn in_rotation(&self, colour: Colour) -> bool {
        self.state.colours.contains(&colour)
    }

    /// Pieces of `colour` that are allowed to move, with their squares.
    pub fn movable(&self, colour: Colour) -> impl Iterator<Item = (PieceId, Coord)> + '_ {
        self.pieces()
            .filter(move |(_, p)| p.colour == colour && p.can_move())
            .filter_map(|(id, p)| p.loc.map(|loc| (id, loc)))
    }

    fn set_occupant(&mut self, c: Coord, piece: Option<PieceId>) {
        let index = self.shape.index(c);
        self.squares[index].piece = piece;
    }

    fn relocate(&mut self, id: PieceId, from: Coord, to: Coord) {
        self.set_occupant(from, None);
        self.set_occupant(to, Some(id));
        self.piece_mut(id).loc = Some(to);
    }

    // -------------------------------------------------------------------------
    // Applying moves
    // -------------------------------------------------------------------------

    /// Carry out a candidate on the grid: relocation, capture, en passant,
    /// castling rook, promotion, castling rights and the half-move counter.
    /// Turn order and scores are the board's business.
    pub fn apply(&mut self, mv: &Candidate) -> Applied {
        let ply = self.state.ply;
        let mover_resigned = self.piece(mv.piece).resigned;
        let capture_at = mv.en_passant.unwrap_or(mv.end);
        let captured = self.occupant(capture_at);
        let mut credited = false;

        if let Some(victim_id) = captured {
            self.set_occupant(capture_at, None);
            let victim = self.piece_mut(victim_id);
            credited = victim.is_live() && !victim.resigned && !mover_resigned;
            victim.dead = true;
            victim.loc = None;
            let (kind, owner) = (victim.kind, victim.colour);
            if credited {
                self.player_mut(mv.colour).captures.push(kind);
            }
            if kind == PieceKind::Rook {
                self.revoke_rook_rights(owner, capture_at);
            }
        }

        self.relocate(mv.piece, mv.start, mv.end);
        let piece = self.piece_mut(mv.piece);
        piece.last_move = Some(LastMove { ply, double_push: mv.double_push });
        if mv.promoting {
            piece.kind = PieceKind::Queen;
            piece.promoted = true;
        }

        if let Some(side) = mv.castling {
            let (rook_from, rook_to) = {
                let king = self.piece(mv.piece);
                (king.castle_rook_square(&self.shape, side), king.castle_rook_target(mv.start, side))
            };
            if let Some(rook) = self.occupant(rook_from) {
                self.relocate(rook, rook_from, rook_to);
                self.piece_mut(rook).last_move = Some(LastMove { ply, double_push: false });
            }
        }

        match mv.kind {
            PieceKind::King => {
                let player = self.player_mut(mv.colour);
                player.king_castle = false;
                player.queen_castle = false;
            }
            PieceKind::Rook => self.revoke_rook_rights(mv.colour, mv.start),
            _ => {}
        }

        if mv.kind == PieceKind::Pawn || captured.is_some() {
            self.state.halfmove = 0;
        } else {
            self.state.halfmove += 1;
        }

        Applied { captured, credited }
    }

    /// A rook leaving (or taken on) its home square ends castling on that side.
    fn revoke_rook_rights(&mut self, colour: Colour, from: Coord) {
        let dir = colour.direction();
        for side in [CastleSide::King, CastleSide::Queen] {
            if dir.seat_square(&self.shape, side.rook_seat_file(), 0) == from {
                self.player_mut(colour).clear_castle(side);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Check detection
    // -------------------------------------------------------------------------

    /// Enemy pieces attacking `colour`'s king: the first piece along each of the
    /// eight rays plus knights a knight's jump away, each confirmed by its own
    /// reachability test onto the king.
    pub fn attackers(&self, colour: Colour) -> Vec<PieceId> {
        let Some(king_sq) = self.king_loc(colour) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for &ray in &RAYS {
            let mut cur = king_sq.step(ray);
            loop {
                match self.obstruct(cur) {
                    Obstruction::Empty => cur = cur.step(ray),
                    Obstruction::Blocked => break,
                    Obstruction::Occupied(id) => {
                        if self.attacks(id, colour, king_sq) {
                            found.push(id);
                        }
                        break;
                    }
                }
            }
        }
        for &(df, dr) in &KNIGHT_OFFSETS {
            if let Some(id) = self.occupant(king_sq.offset(df, dr)) {
                if self.piece(id).kind == PieceKind::Knight && self.attacks(id, colour, king_sq) {
                    found.push(id);
                }
            }
        }
        found
    }

    fn attacks(&self, id: PieceId, victim: Colour, target: Coord) -> bool {
        let piece = self.piece(id);
        piece.is_live()
            && piece.colour != victim
            && piece
                .loc
                .is_some_and(|from| legal_check(self, from, target, Probe::Reach).is_ok())
    }

    pub fn in_check(&self, colour: Colour) -> bool {
        !self.attackers(colour).is_empty()
    }

    /// Attackers for every king in the rotation that is in check.
    pub fn all_checks(&self) -> BTreeMap<Colour, Vec<PieceId>> {
        self.state
            .colours
            .iter()
            .map(|&c| (c, self.attackers(c)))
            .filter(|(_, attackers)| !attackers.is_empty())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Full legality
    // -------------------------------------------------------------------------

    /// Geometric legality, castling transit safety and the self-check rule.
    /// Never mutates `self`.
    pub fn validate(&self, start: Coord, end: Coord, probe: Probe) -> Verdict {
        let candidate = legal_check(self, start, end, probe)?;
        if candidate.castling.is_some() {
            self.castle_path_safe(&candidate)?;
        }
        if !self.leaves_king_safe(&candidate) {
            return Err(MoveError::KingInCheck);
        }
        Ok(candidate)
    }

    /// The king may not castle out of, through, or into an attacked square.
    fn castle_path_safe(&self, mv: &Candidate) -> Result<(), MoveError> {
        if self.in_check(mv.colour) {
            return Err(MoveError::CastleThroughCheck(mv.start));
        }
        let step = unit_step(mv.start, mv.end);
        let mut transit = mv.start;
        for _ in 0..2 {
            transit = transit.step(step);
            let mut scratch = self.clone();
            scratch.relocate(mv.piece, mv.start, transit);
            if scratch.in_check(mv.colour) {
                return Err(MoveError::CastleThroughCheck(transit));
            }
        }
        Ok(())
    }

    pub fn leaves_king_safe(&self, mv: &Candidate) -> bool {
        let mut scratch = self.clone();
        scratch.apply(mv);
        !scratch.in_check(mv.colour)
    }

    /// Squares worth testing for a piece: knight jumps, king steps and castling
    /// targets, pawn pushes and captures, and whole rays for sliders (including
    /// squares behind obstructions).
    pub fn candidate_squares(&self, id: PieceId) -> Vec<Coord> {
        let piece = self.piece(id);
        let Some(from) = piece.loc else {
            return Vec::new();
        };
        let mut out = Vec::new();
        match piece.kind {
            PieceKind::Knight => {
                out.extend(KNIGHT_OFFSETS.iter().map(|&(df, dr)| from.offset(df, dr)));
            }
            PieceKind::King => {
                out.extend(RAYS.iter().map(|&ray| from.step(ray)));
                if from == piece.home_king_square(&self.shape) {
                    out.push(piece.castle_king_target(from, CastleSide::King));
                    out.push(piece.castle_king_target(from, CastleSide::Queen));
                }
            }
            PieceKind::Pawn => {
                let (ff, fr) = piece.direction.forward();
                let (rf, rr) = piece.direction.right();
                out.push(from.offset(ff, fr));
                out.push(from.offset(2 * ff, 2 * fr));
                out.push(from.offset(ff + rf, fr + rr));
                out.push(from.offset(ff - rf, fr - rr));
            }
            PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
                let rays = match piece.kind {
                    PieceKind::Rook => &RAYS[..4],
                    PieceKind::Bishop => &RAYS[4..],
                    _ => &RAYS[..],
                };
                for &ray in rays {
                    let mut cur = from.step(ray);
                    while self.shape.contains(cur) {
                        out.push(cur);
                        cur = cur.step(ray);
                    }
                }
            }
        }
        out.retain(|&c| self.shape.is_playable(c));
        out
    }

    pub fn legal_destinations(&self, id: PieceId, probe: Probe) -> Vec<Coord> {
        let Some(from) = self.piece(id).loc else {
            return Vec::new();
        };
        self.candidate_squares(id)
            .into_iter()
            .filter(|&to| self.validate(from, to, probe).is_ok())
            .collect()
    }

    pub fn legal_moves(&self, colour: Colour, probe: Probe) -> Vec<(Coord, Coord)> {
        self.movable(colour)
            .flat_map(|(id, from)| {
                self.legal_destinations(id, probe).into_iter().map(move |to| (from, to))
            })
            .collect()
    }

    pub fn has_legal_move(&self, colour: Colour) -> bool {
        self.movable(colour).any(|(id, from)| {
            self.candidate_squares(id)
                .into_iter()
                .any(|to| self.validate(from, to, Probe::Reach).is_ok())
        })
    }

    // -------------------------------------------------------------------------
    // Mate and stalemate
    // -------------------------------------------------------------------------

    /// A king in check is mated when it cannot step anywhere safe, the single
    /// checker (if only one) cannot be captured, and a single sliding checker
    /// cannot be blocked.
    pub fn is_checkmate(&self, colour: Colour, checkers: &[PieceId]) -> bool {
        let Some(king_sq) = self.king_loc(colour) else {
            return false;
        };
        if RAYS
            .iter()
            .any(|&ray| self.validate(king_sq, king_sq.step(ray), Probe::Reach).is_ok())
        {
            return false;
        }
        if checkers.len() != 1 {
            return true;
        }

        let checker = self.piece(checkers[0]);
        let Some(checker_sq) = checker.loc else {
            return false;
        };
        let defenders: Vec<Coord> = self
            .movable(colour)
            .filter(|&(id, _)| self.piece(id).kind != PieceKind::King)
            .map(|(_, loc)| loc)
            .collect();

        if defenders
            .iter()
            .any(|&from| self.validate(from, checker_sq, Probe::Reach).is_ok())
        {
            return false;
        }
        if checker.kind == PieceKind::Pawn && self.en_passant_escape(colour, checker_sq) {
            return false;
        }

        if checker.kind.is_slider() {
            let step = unit_step(king_sq, checker_sq);
            let mut cur = king_sq.step(step);
            while cur != checker_sq {
                if defenders
                    .iter()
                    .any(|&from| self.validate(from, cur, Probe::Reach).is_ok())
                {
                    return false;
                }
                cur = cur.step(step);
            }
        }
        true
    }

    /// A checking pawn that just double-pushed can also be taken en passant,
    /// landing behind it rather than on its square.
    fn en_passant_escape(&self, colour: Colour, checker_sq: Coord) -> bool {
        self.movable(colour)
            .filter(|&(id, _)| self.piece(id).kind == PieceKind::Pawn)
            .any(|(id, from)| {
                self.candidate_squares(id).into_iter().any(|to| {
                    self.validate(from, to, Probe::Reach)
                        .is_ok_and(|mv| mv.en_passant == Some(checker_sq))
                })
            })
    }

    /// Not in check and nothing to play.
    pub fn is_stalemate(&self, colour: Colour) -> bool {
        !self.in_check(colour) && !self.has_legal_move(colour)
    }

    // -------------------------------------------------------------------------
    // Leaving the game
    // -------------------------------------------------------------------------

    /// Drop `colour` from the rotation. Its pieces stay on the board, dead.
    pub fn eliminate(&mut self, colour: Colour) {
        self.state.colours.retain(|&c| c != colour);
        let player = self.player_mut(colour);
        player.eliminated = true;
        player.king_castle = false;
        player.queen_castle = false;
        for piece in self.pieces.iter_mut().filter(|p| p.colour == colour) {
            piece.dead = true;
        }
    }

    /// Every piece of `colour` goes out of play; the colour stays in the
    /// rotation so its king can be walked until it falls.
    pub fn resign(&mut self, colour: Colour) {
        let player = self.player_mut(colour);
        player.resigned = true;
        player.king_castle = false;
        player.queen_castle = false;
        for piece in self.pieces.iter_mut().filter(|p| p.colour == colour) {
            piece.dead = true;
            piece.resigned = true;
        }
    }

    /// Hand the turn to the next colour in seating order that is still in the
    /// rotation.
    pub fn advance_turn(&mut self, mover: Colour) {
        self.state.ply += 1;
        let from = mover.index();
        for step in 1..=Colour::ALL.len() {
            let next = Colour::ALL[(from + step) % Colour::ALL.len()];
            if self.in_rotation(next) {
                if from + step >= Colour::ALL.len() {
                    self.state.round += 1;
                }
                self.state.to_play = next;
                return;
            }
        }
    }

    /// Write one side of a delta back onto the position.
    pub fn replay(&mut self, delta: &Delta, forward: bool) {
        for change in &delta.squares {
            self.squares[change.index].piece = if forward { change.after } else { change.before };
        }
        for change in &delta.pieces {
            self.pieces[change.id.0] = if forward { change.after.clone() } else { change.before.clone() };
        }
        self.state = if forward { delta.state_after.clone() } else { delta.state_before.clone() };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SquareChange {
    index: usize,
    before: Option<PieceId>,
    after: Option<PieceId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PieceChange {
    id: PieceId,
    before: Piece,
    after: Piece,
}

/// Exact difference between two positions of the same game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    squares: Vec<SquareChange>,
    pieces: Vec<PieceChange>,
    state_before: GameState,
    state_after: GameState,
}

impl Delta {
    pub fn between(before: &Position, after: &Position) -> Delta {
        debug_assert_eq!(before.pieces.len(), after.pieces.len());
        let squares = before
            .squares
            .iter()
            .zip(&after.squares)
            .enumerate()
            .filter(|(_, (a, b))| a.piece != b.piece)
            .map(|(index, (a, b))| SquareChange { index, before: a.piece, after: b.piece })
            .collect();
        let pieces = before
            .pieces
            .iter()
            .zip(&after.pieces)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, (a, b))| PieceChange { id: PieceId(i), before: a.clone(), after: b.clone() })
            .collect();
        Delta {
            squares,
            pieces,
            state_before: before.state.clone(),
            state_after: after.state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn sq(name: &str) -> Coord {
        Coord::parse(name).unwrap()
    }

    fn empty() -> Position {
        let config = GameConfig::default();
        Position::empty(config.shape(), config.promotion_rank)
    }

    #[test]
    fn standard_setup() {
        let config = GameConfig::default();
        let pos = Position::standard(config.shape(), config.promotion_rank);
        assert_eq!(pos.pieces().count(), 64);
        assert_eq!(pos.state.colours, Colour::ALL.to_vec());
        assert_eq!(pos.state.to_play, Colour::Red);
        for (colour, king) in [(Colour::Red, "h1"), (Colour::Blue, "a7"), (Colour::Yellow, "g14"), (Colour::Green, "n8")] {
            assert_eq!(pos.king_loc(colour), Some(sq(king)));
            assert!(pos.player(colour).king_castle && pos.player(colour).queen_castle);
        }
        let queen = pos.piece_at(sq("g1")).unwrap();
        assert_eq!((queen.kind, queen.colour), (PieceKind::Queen, Colour::Red));
        assert_eq!(pos.piece_at(sq("m11")).unwrap().kind, PieceKind::Pawn);
        for colour in Colour::ALL {
            assert!(!pos.in_check(colour));
            assert!(pos.has_legal_move(colour));
        }
    }

    #[test]
    fn check_detection_sees_first_obstruction_only() {
        let mut pos = empty();
        pos.place(sq("h1"), Colour::Red, PieceKind::King);
        let rook = pos.place(sq("h9"), Colour::Yellow, PieceKind::Rook);
        pos.place(sq("g14"), Colour::Yellow, PieceKind::King);
        assert_eq!(pos.attackers(Colour::Red), vec![rook]);

        let shield = pos.place(sq("h5"), Colour::Green, PieceKind::Bishop);
        assert!(!pos.in_check(Colour::Red));

        // Dead pieces block but never attack.
        pos.piece_mut(shield).kind = PieceKind::Queen;
        pos.piece_mut(shield).dead = true;
        assert!(!pos.in_check(Colour::Red));
    }

    #[test]
    fn knights_and_pawns_check_by_their_own_geometry() {
        let mut pos = empty();
        pos.place(sq("h4"), Colour::Red, PieceKind::King);
        let knight = pos.place(sq("i6"), Colour::Blue, PieceKind::Knight);
        assert_eq!(pos.attackers(Colour::Red), vec![knight]);

        let mut pos = empty();
        pos.place(sq("h4"), Colour::Red, PieceKind::King);
        // Blue pawns capture toward +file, so g5 hits h4 ...
        let pawn = pos.place(sq("g5"), Colour::Blue, PieceKind::Pawn);
        assert_eq!(pos.attackers(Colour::Red), vec![pawn]);
        // ... but a Yellow pawn on i3 faces away.
        pos.piece_mut(pawn).dead = true;
        pos.place(sq("i3"), Colour::Yellow, PieceKind::Pawn);
        assert!(!pos.in_check(Colour::Red));
    }

    #[test]
    fn back_rank_mate_and_escape() {
        let mut pos = empty();
        pos.place(sq("h1"), Colour::Red, PieceKind::King);
        for name in ["g2", "h2", "i2"] {
            pos.place(sq(name), Colour::Red, PieceKind::Pawn);
        }
        let rook = pos.place(sq("e1"), Colour::Yellow, PieceKind::Rook);
        pos.place(sq("g14"), Colour::Yellow, PieceKind::King);
        let checkers = pos.attackers(Colour::Red);
        assert_eq!(checkers, vec![rook]);
        assert!(pos.is_checkmate(Colour::Red, &checkers));

        // A knight that can interpose on f1 saves it.
        let knight = pos.place(sq("e3"), Colour::Red, PieceKind::Knight);
        assert!(!pos.is_checkmate(Colour::Red, &checkers));

        // So does one that can take the rook.
        pos.piece_mut(knight).dead = true;
        pos.place(sq("d3"), Colour::Red, PieceKind::Knight);
        assert!(!pos.is_checkmate(Colour::Red, &checkers));
    }

    #[test]
    fn stalemated_king_in_the_corner_of_an_arm() {
        let mut pos = empty();
        pos.place(sq("d1"), Colour::Red, PieceKind::King);
        pos.place(sq("e3"), Colour::Yellow, PieceKind::Queen);
        pos.place(sq("g14"), Colour::Yellow, PieceKind::King);
        assert!(!pos.in_check(Colour::Red));
        assert!(pos.is_stalemate(Colour::Red));
        assert!(!pos.is_stalemate(Colour::Yellow));
    }

    #[test]
    fn castling_moves_the_rook_and_clears_rights() {
        let config = GameConfig::default();
        let mut pos = Position::standard(config.shape(), config.promotion_rank);
        for name in ["i1", "j1"] {
            let id = pos.occupant(sq(name)).unwrap();
            pos.set_occupant(sq(name), None);
            pos.piece_mut(id).loc = None;
            pos.piece_mut(id).dead = true;
        }
        let castle = pos.validate(sq("h1"), sq("j1"), Probe::Play).unwrap();
        assert_eq!(castle.castling, Some(CastleSide::King));
        let before = pos.clone();
        pos.apply(&castle);
        assert_eq!(pos.piece_at(sq("j1")).unwrap().kind, PieceKind::King);
        assert_eq!(pos.piece_at(sq("i1")).unwrap().kind, PieceKind::Rook);
        assert!(pos.occupant(sq("k1")).is_none());
        assert!(!pos.player(Colour::Red).king_castle);
        assert!(!pos.player(Colour::Red).queen_castle);

        let delta = Delta::between(&before, &pos);
        let after = pos.clone();
        pos.replay(&delta, false);
        assert_eq!(pos, before);
        pos.replay(&delta, true);
        assert_eq!(pos, after);
    }

    #[test]
    fn elimination_keeps_the_king_as_a_marker() {
        let config = GameConfig::default();
        let mut pos = Position::standard(config.shape(), config.promotion_rank);
        pos.eliminate(Colour::Blue);
        assert_eq!(pos.state.colours, vec![Colour::Red, Colour::Yellow, Colour::Green]);
        let king = pos.piece_at(sq("a7")).unwrap();
        assert!(king.dead && king.kind == PieceKind::King);
        assert!(pos.player(Colour::Blue).eliminated);

        pos.advance_turn(Colour::Red);
        assert_eq!(pos.state.to_play, Colour::Yellow);
        pos.advance_turn(Colour::Green);
        assert_eq!(pos.state.to_play, Colour::Red);
        assert_eq!(pos.state.round, 2);
        assert_eq!(pos.state.ply, 2);
    }
}
