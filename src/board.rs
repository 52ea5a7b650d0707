use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::error::{MoveError, ReviewError};
use crate::geometry::{Coord, RAYS};
use crate::moves::{Candidate, Move, Probe};
use crate::piece::{Colour, Piece, PieceId, PieceKind};
use crate::position::{Delta, Position};
use crate::square::Square;

/// Direction for stepping the review cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Back,
    Forward,
}

/// Platform-appropriate random index in `0..len`.
/// Uses js_sys::Math::random() in WASM builds, rand crate natively.
fn random_index(len: usize) -> usize {
    #[cfg(target_arch = "wasm32")]
    {
        ((js_sys::Math::random() * len as f64) as usize).min(len.saturating_sub(1))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use rand::Rng;
        rand::thread_rng().gen_range(0..len)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Board {
    pub(crate) config: GameConfig,
    pub(crate) position: Position,
    pub move_list: Vec<Move>,
    /// Number of plies currently applied; equals `move_list.len()` unless reviewing.
    pub(crate) cursor: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard setup with the default rules.
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        let position = Position::standard(config.shape(), config.promotion_rank);
        Board { config, position, move_list: Vec::new(), cursor: 0 }
    }

    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Self::empty_with_config(GameConfig::default())
    }

    pub fn empty_with_config(config: GameConfig) -> Self {
        let position = Position::empty(config.shape(), config.promotion_rank);
        Board { config, position, move_list: Vec::new(), cursor: 0 }
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Put a piece on an empty square. Placing a king brings its colour into
    /// the rotation.
    pub fn place(&mut self, name: &str, colour: Colour, kind: PieceKind) -> Result<PieceId, MoveError> {
        let at = self.coord(name)?;
        if self.position.occupant(at).is_some() {
            return Err(MoveError::Occupied(at));
        }
        Ok(self.position.place(at, colour, kind))
    }

    pub fn set_to_play(&mut self, colour: Colour) {
        self.position.state.to_play = colour;
    }

    pub fn set_castling_rights(&mut self, colour: Colour, king_side: bool, queen_side: bool) {
        let player = self.position.player_mut(colour);
        player.king_castle = king_side;
        player.queen_castle = queen_side;
    }

    /// Resolve a square name to a playable coordinate.
    pub fn coord(&self, name: &str) -> Result<Coord, MoveError> {
        let c = Coord::parse(name)
            .filter(|&c| self.position.shape.contains(c))
            .ok_or_else(|| MoveError::InvalidSquare(name.to_string()))?;
        if self.position.shape.is_blocked(c) {
            return Err(MoveError::BlockedSquare(c));
        }
        Ok(c)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn squares(&self) -> &[Square] {
        self.position.squares()
    }

    pub fn piece_at(&self, name: &str) -> Option<&Piece> {
        self.position.piece_at(Coord::parse(name)?)
    }

    pub fn colours(&self) -> &[Colour] {
        &self.position.state.colours
    }

    pub fn to_play(&self) -> Colour {
        self.position.state.to_play
    }

    pub fn score(&self, colour: Colour) -> u32 {
        self.position.player(colour).score
    }

    pub fn captures(&self, colour: Colour) -> &[PieceKind] {
        &self.position.player(colour).captures
    }

    pub fn king_castle(&self, colour: Colour) -> bool {
        self.position.player(colour).king_castle
    }

    pub fn queen_castle(&self, colour: Colour) -> bool {
        self.position.player(colour).queen_castle
    }

    pub fn resigned(&self, colour: Colour) -> bool {
        self.position.player(colour).resigned
    }

    pub fn eliminated(&self, colour: Colour) -> bool {
        self.position.player(colour).eliminated
    }

    pub fn game_over(&self) -> bool {
        self.position.state.game_over
    }

    pub fn winner(&self) -> Option<Colour> {
        self.position.state.winner
    }

    pub fn draw(&self) -> bool {
        self.position.state.draw
    }

    pub fn ply(&self) -> u32 {
        self.position.state.ply
    }

    pub fn round(&self) -> u32 {
        self.position.state.round
    }

    pub fn halfmove(&self) -> u32 {
        self.position.state.halfmove
    }

    /// Kings currently in check, with the squares of their attackers.
    pub fn checks(&self) -> BTreeMap<Colour, Vec<Coord>> {
        self.check_squares(&self.position.all_checks())
    }

    /// Every legal (start, end) pair for the colour to play.
    pub fn legal_moves(&self) -> Vec<(Coord, Coord)> {
        self.position.legal_moves(self.to_play(), Probe::Play)
    }

    /// Legal destinations for the piece on `name`; empty when it is not that
    /// colour's turn.
    pub fn legal_destinations(&self, name: &str) -> Result<Vec<Coord>, MoveError> {
        let at = self.coord(name)?;
        let id = self.position.occupant(at).ok_or(MoveError::NoPiece(at))?;
        Ok(self.position.legal_destinations(id, Probe::Play))
    }

    fn check_squares(&self, checks: &BTreeMap<Colour, Vec<PieceId>>) -> BTreeMap<Colour, Vec<Coord>> {
        checks
            .iter()
            .map(|(&colour, attackers)| {
                let squares = attackers.iter().filter_map(|&id| self.position.piece(id).loc).collect();
                (colour, squares)
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Playing
    // -------------------------------------------------------------------------

    /// Boolean wrapper around `try_move`.
    pub fn move_piece(&mut self, start: &str, end: &str, resign: bool) -> bool {
        self.try_move(start, end, resign).is_ok()
    }

    /// Validate and commit a move for the colour to play, optionally resigning
    /// in the same ply. A rejected request leaves the board untouched.
    pub fn try_move(&mut self, start: &str, end: &str, resign: bool) -> Result<&Move, MoveError> {
        self.ensure_live()?;
        let (start, end) = (self.coord(start)?, self.coord(end)?);
        let index = self.play(start, end, resign, true)?;
        Ok(&self.move_list[index])
    }

    /// Resign the colour to play as a ply of its own.
    pub fn resign(&mut self) -> Result<&Move, MoveError> {
        let index = self.resign_without_walk()?;
        self.walk_resigned();
        Ok(&self.move_list[index])
    }

    pub(crate) fn resign_without_walk(&mut self) -> Result<usize, MoveError> {
        self.ensure_live()?;
        let colour = self.to_play();
        let at = self.position.king_loc(colour).ok_or(MoveError::GameOver)?;
        Ok(self.commit(colour, at, at, None, true))
    }

    fn ensure_live(&self) -> Result<(), MoveError> {
        if self.game_over() {
            return Err(MoveError::GameOver);
        }
        if self.is_reviewing() {
            return Err(MoveError::Reviewing { cursor: self.cursor, len: self.move_list.len() });
        }
        Ok(())
    }

    /// Validate and commit. `walk` runs forced resigned-king walks afterwards;
    /// replaying recorded move text turns it off because the walks are in the
    /// text.
    pub(crate) fn play(&mut self, start: Coord, end: Coord, resign: bool, walk: bool) -> Result<usize, MoveError> {
        self.ensure_live()?;
        let candidate = self.position.validate(start, end, Probe::Play).map_err(|e| {
            debug!("rejected {}-{}: {}", start, end, e);
            e
        })?;
        let index = self.commit(candidate.colour, start, end, Some(&candidate), resign);
        if walk {
            self.walk_resigned();
        }
        Ok(index)
    }

    /// Apply a validated ply and settle everything that follows from it:
    /// resignation, eliminations, scores, turn order, game end. Returns the
    /// index of the recorded move.
    fn commit(
        &mut self,
        mover: Colour,
        start: Coord,
        end: Coord,
        candidate: Option<&Candidate>,
        resign: bool,
    ) -> usize {
        let before = self.position.clone();
        let mover_active = !self.position.player(mover).resigned;

        let applied = match candidate {
            Some(mv) => Some(self.position.apply(mv)),
            None => {
                self.position.state.halfmove += 1;
                None
            }
        };
        let captured = applied
            .and_then(|a| a.captured)
            .map(|id| self.position.piece(id).clone());

        if resign {
            self.position.resign(mover);
            info!("{} resigns", mover);
        }

        // Everything below is decided on the same post-move position.
        let checks = self.position.all_checks();
        let mut mating: Vec<Colour> = Vec::new();
        if let Some(victim) = &captured {
            if victim.kind == PieceKind::King && self.position.in_rotation(victim.colour) {
                mating.push(victim.colour);
            }
        }
        for (&colour, attackers) in &checks {
            if !mating.contains(&colour) && self.position.is_checkmate(colour, attackers) {
                mating.push(colour);
            }
        }
        // The mover is included: a ply can leave its own side without a move.
        let stale: Vec<Colour> = self
            .position
            .state
            .colours
            .iter()
            .copied()
            .filter(|&c| !checks.contains_key(&c) && !mating.contains(&c))
            .filter(|&c| !self.position.has_legal_move(c))
            .collect();

        if mover_active && candidate.is_some() {
            let scoring = &self.config.scoring;
            let counted = |c: Colour| !self.position.player(c).resigned;
            let mut gained = 0;
            if applied.is_some_and(|a| a.credited) {
                gained += captured.as_ref().map_or(0, |v| v.kind.value());
            }
            let checked = checks
                .iter()
                .filter(|&(&c, _)| !mating.contains(&c) && counted(c))
                .filter(|(_, attackers)| attackers.iter().any(|&id| self.position.piece(id).colour == mover))
                .count();
            let by_queen = candidate.is_some_and(|mv| self.position.piece(mv.piece).kind == PieceKind::Queen);
            gained += scoring.check_bonus(checked, by_queen);
            gained += scoring.checkmate * mating.iter().filter(|&&c| counted(c)).count() as u32;
            gained += scoring.stalemate * stale.iter().filter(|&&c| c != mover && counted(c)).count() as u32;
            self.position.player_mut(mover).score += gained;
        }

        for &colour in &mating {
            info!("{} is checkmated", colour);
            self.position.eliminate(colour);
        }
        for &colour in &stale {
            info!("{} is stalemated", colour);
            self.position.eliminate(colour);
        }
        let checks = if mating.is_empty() && stale.is_empty() {
            checks
        } else {
            self.position.all_checks()
        };

        self.position.advance_turn(mover);
        self.settle_game_end();

        let state = &self.position.state;
        let mut record = Move {
            start,
            end,
            colour: mover,
            kind: candidate.map_or(PieceKind::King, |mv| mv.kind),
            number: before.state.round,
            total_number: before.state.ply,
            castling: candidate.and_then(|mv| mv.castling),
            double_push: candidate.is_some_and(|mv| mv.double_push),
            enpassant_cap: candidate.and_then(|mv| mv.en_passant),
            promoting: candidate.is_some_and(|mv| mv.promoting),
            captured: captured.map(|p| p.kind),
            resign,
            forced: candidate.is_some() && !mover_active,
            draw: state.draw,
            game_over: state.game_over,
            checks: self.check_squares(&checks),
            mating,
            stale,
            notation: String::new(),
            delta: Delta::default(),
        };
        record.notation = record.describe();
        record.delta = Delta::between(&before, &self.position);
        debug!("ply {}: {} {}", record.total_number, mover, record.notation);

        self.move_list.push(record);
        self.cursor = self.move_list.len();
        self.cursor - 1
    }

    /// Game over when at most one colour in rotation has not resigned, or
    /// drawn once the inactivity limit is reached.
    fn settle_game_end(&mut self) {
        let standing: Vec<Colour> = self
            .position
            .state
            .colours
            .iter()
            .copied()
            .filter(|&c| !self.position.player(c).resigned)
            .collect();

        if standing.len() <= 1 {
            let winner = standing.first().copied();
            if let Some(winner) = winner {
                let beaten = Colour::ALL
                    .iter()
                    .filter(|&&c| c != winner)
                    .map(|&c| self.position.player(c))
                    .filter(|p| p.king.is_some() && (p.resigned || p.eliminated))
                    .count() as u32;
                self.position.player_mut(winner).score += self.config.scoring.last_standing * beaten;
                info!("game over: {} wins", winner);
            } else {
                info!("game over: nobody left standing");
            }
            let state = &mut self.position.state;
            state.game_over = true;
            state.winner = winner;
            return;
        }

        let limit = self.config.inactivity_rounds * self.position.state.colours.len() as u32;
        if self.position.state.halfmove >= limit {
            info!("game drawn after {} plies without a pawn move or capture", limit);
            let state = &mut self.position.state;
            state.game_over = true;
            state.draw = true;
        }
    }

    /// While the colour to play has resigned, walk its king to a random legal
    /// neighbouring square.
    pub(crate) fn walk_resigned(&mut self) {
        while !self.game_over() {
            let colour = self.to_play();
            if !self.position.player(colour).resigned {
                return;
            }
            let Some(from) = self.position.king_loc(colour) else {
                return;
            };
            let mut options: Vec<Coord> = RAYS.iter().map(|&ray| from.step(ray)).collect();
            let mut chosen = None;
            while !options.is_empty() {
                let to = options.swap_remove(random_index(options.len()));
                if let Ok(candidate) = self.position.validate(from, to, Probe::Play) {
                    chosen = Some(candidate);
                    break;
                }
            }
            let Some(candidate) = chosen else {
                warn!("resigned {} king on {} has no legal square", colour, from);
                return;
            };
            info!("forced walk for {}: {}-{}", colour, from, candidate.end);
            self.commit(colour, from, candidate.end, Some(&candidate), false);
        }
    }

    // -------------------------------------------------------------------------
    // Review
    // -------------------------------------------------------------------------

    /// Revert (`Back`) or reapply (`Forward`) ply `index` exactly as recorded.
    /// The cursor moves one ply at a time, so `index` must sit next to it.
    pub fn temp_move_apply(&mut self, index: usize, step: Step) -> Result<(), ReviewError> {
        let len = self.move_list.len();
        if index >= len {
            return Err(ReviewError::OutOfRange { index, len });
        }
        match step {
            Step::Back if index + 1 == self.cursor => {
                self.position.replay(&self.move_list[index].delta, false);
                self.cursor = index;
            }
            Step::Forward if index == self.cursor => {
                self.position.replay(&self.move_list[index].delta, true);
                self.cursor = index + 1;
            }
            _ => return Err(ReviewError::OutOfOrder { index, cursor: self.cursor }),
        }
        Ok(())
    }

    /// Step one ply back; false at the start of the game.
    pub fn review_back(&mut self) -> bool {
        match self.cursor.checked_sub(1) {
            Some(index) => self.temp_move_apply(index, Step::Back).is_ok(),
            None => false,
        }
    }

    /// Step one ply forward; false at the live position.
    pub fn review_forward(&mut self) -> bool {
        self.temp_move_apply(self.cursor, Step::Forward).is_ok()
    }

    /// Return to the live position.
    pub fn review_live(&mut self) {
        while self.review_forward() {}
    }

    pub fn is_reviewing(&self) -> bool {
        self.cursor < self.move_list.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
