use serde::{Deserialize, Serialize};

use crate::geometry::Coord;
use crate::piece::PieceId;

/// What a scan finds on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Obstruction {
    /// Nothing here, keep going.
    Empty,
    /// A removed corner cell (or off the board). Stops every scan and can
    /// never be captured.
    Blocked,
    /// A piece, friend or foe; the caller decides.
    Occupied(PieceId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    pub coord: Coord,
    pub blocked: bool,
    pub piece: Option<PieceId>,
}

impl Square {
    pub fn new(coord: Coord, blocked: bool) -> Self {
        Square { coord, blocked, piece: None }
    }

    pub fn name(&self) -> String {
        self.coord.name()
    }

    pub fn obstruct(&self) -> Obstruction {
        if self.blocked {
            return Obstruction::Blocked;
        }
        match self.piece {
            Some(id) => Obstruction::Occupied(id),
            None => Obstruction::Empty,
        }
    }
}
