use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{BoardShape, Coord, Direction};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Colour {
    Red,
    Blue,
    Yellow,
    Green,
}

impl Colour {
    /// Seating and turn order.
    pub const ALL: [Colour; 4] = [Colour::Red, Colour::Blue, Colour::Yellow, Colour::Green];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn direction(self) -> Direction {
        Direction::new(self as u8)
    }

    pub fn code(self) -> char {
        match self {
            Colour::Red => 'r',
            Colour::Blue => 'b',
            Colour::Yellow => 'y',
            Colour::Green => 'g',
        }
    }

    pub fn from_code(code: char) -> Option<Colour> {
        match code.to_ascii_lowercase() {
            'r' => Some(Colour::Red),
            'b' => Some(Colour::Blue),
            'y' => Some(Colour::Yellow),
            'g' => Some(Colour::Green),
            _ => None,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colour::Red => "Red",
            Colour::Blue => "Blue",
            Colour::Yellow => "Yellow",
            Colour::Green => "Green",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Back rank from the seat's left: R N B Q K B N R.
    pub const BACK_RANK: [PieceKind; 8] = [
        PieceKind::Rook, PieceKind::Knight, PieceKind::Bishop, PieceKind::Queen,
        PieceKind::King, PieceKind::Bishop, PieceKind::Knight, PieceKind::Rook,
    ];

    /// Points for capturing a piece of this kind. Kings are never scored as
    /// captures; taking a king is scored as a mate.
    pub fn value(self) -> u32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight => 3,
            PieceKind::Bishop => 5,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    /// Move-notation prefix (pawns have none).
    pub fn symbol(self) -> &'static str {
        match self {
            PieceKind::Pawn => "",
            PieceKind::Knight => "N",
            PieceKind::Bishop => "B",
            PieceKind::Rook => "R",
            PieceKind::Queen => "Q",
            PieceKind::King => "K",
        }
    }

    pub fn code(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn from_code(code: char) -> Option<PieceKind> {
        match code {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn is_slider(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Index of a piece in the position's piece arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub usize);

/// The move that last placed a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub ply: u32,
    pub double_push: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastleSide {
    King,
    Queen,
}

/// Seat-local file of the king on its back rank.
pub const KING_SEAT_FILE: i32 = 4;

impl CastleSide {
    /// Seat-local file of this side's rook.
    pub fn rook_seat_file(self) -> i32 {
        match self {
            CastleSide::King => 7,
            CastleSide::Queen => 0,
        }
    }

    /// +1 toward the seat's right for the king side, -1 for the queen side.
    pub fn sign(self) -> i32 {
        match self {
            CastleSide::King => 1,
            CastleSide::Queen => -1,
        }
    }

    pub fn notation(self) -> &'static str {
        match self {
            CastleSide::King => "O-O",
            CastleSide::Queen => "O-O-O",
        }
    }
}

impl fmt::Display for CastleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastleSide::King => f.write_str("king"),
            CastleSide::Queen => f.write_str("queen"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub colour: Colour,
    pub direction: Direction,
    pub loc: Option<Coord>,
    pub last_move: Option<LastMove>,
    /// Out of play: captured, eliminated, or resigned. Dead pieces left on the
    /// board block scans but never attack.
    pub dead: bool,
    pub resigned: bool,
    pub promoted: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, colour: Colour, loc: Coord) -> Self {
        Piece {
            kind,
            colour,
            direction: colour.direction(),
            loc: Some(loc),
            last_move: None,
            dead: false,
            resigned: false,
            promoted: false,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.dead
    }

    /// Dead pieces stay put, except a resigned king which keeps walking.
    pub fn can_move(&self) -> bool {
        self.loc.is_some() && (!self.dead || (self.kind == PieceKind::King && self.resigned))
    }

    pub fn home_king_square(&self, shape: &BoardShape) -> Coord {
        self.direction.seat_square(shape, KING_SEAT_FILE, 0)
    }

    /// Square this colour's rook must stand on to castle on `side`.
    pub fn castle_rook_square(&self, shape: &BoardShape, side: CastleSide) -> Coord {
        self.direction.seat_square(shape, side.rook_seat_file(), 0)
    }

    /// Where the king lands when castling on `side` from `start`.
    pub fn castle_king_target(&self, start: Coord, side: CastleSide) -> Coord {
        let (rf, rr) = self.direction.right();
        start.offset(2 * side.sign() * rf, 2 * side.sign() * rr)
    }

    /// Where the rook lands when castling on `side` from `start`.
    pub fn castle_rook_target(&self, start: Coord, side: CastleSide) -> Coord {
        let (rf, rr) = self.direction.right();
        start.offset(side.sign() * rf, side.sign() * rr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn castling_geometry_follows_the_seat() {
        let shape = BoardShape::default();
        let red = Piece::new(PieceKind::King, Colour::Red, Coord::parse("h1").unwrap());
        assert_eq!(red.home_king_square(&shape).name(), "h1");
        assert_eq!(red.castle_rook_square(&shape, CastleSide::King).name(), "k1");
        assert_eq!(red.castle_rook_square(&shape, CastleSide::Queen).name(), "d1");
        let start = Coord::parse("h1").unwrap();
        assert_eq!(red.castle_king_target(start, CastleSide::King).name(), "j1");
        assert_eq!(red.castle_rook_target(start, CastleSide::Queen).name(), "g1");

        let blue = Piece::new(PieceKind::King, Colour::Blue, Coord::parse("a7").unwrap());
        assert_eq!(blue.castle_rook_square(&shape, CastleSide::King).name(), "a4");
        assert_eq!(blue.castle_rook_square(&shape, CastleSide::Queen).name(), "a11");
        assert_eq!(blue.castle_king_target(Coord::parse("a7").unwrap(), CastleSide::King).name(), "a5");
    }

    #[test]
    fn resigned_king_can_still_move() {
        let mut king = Piece::new(PieceKind::King, Colour::Green, Coord::parse("n8").unwrap());
        king.dead = true;
        king.resigned = true;
        assert!(!king.is_live());
        assert!(king.can_move());

        let mut pawn = Piece::new(PieceKind::Pawn, Colour::Green, Coord::parse("m8").unwrap());
        pawn.dead = true;
        assert!(!pawn.can_move());
    }
}
