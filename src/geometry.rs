// =============================================================================
// Board geometry
//
// Coordinates are zero-based (file, rank) pairs: file 0 = 'a', rank 0 = rank 1.
// The playing area is a square grid with the `corner` x `corner` blocks cut out
// of each corner, leaving an 8-wide core and four 3-deep arms on the default
// 14x14 board.
//
// Each colour sits on one side of the cross. Moves that depend on where a
// player sits (pawn pushes, castling, promotion, setup) are written in
// seat-local offsets (x = to the player's right, y = forward) and rotated onto
// the board with an integer lookup table.
// =============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub file: i32,
    pub rank: i32,
}

impl Coord {
    pub const fn new(file: i32, rank: i32) -> Self {
        Coord { file, rank }
    }

    pub fn offset(self, df: i32, dr: i32) -> Coord {
        Coord::new(self.file + df, self.rank + dr)
    }

    pub fn step(self, (df, dr): (i32, i32)) -> Coord {
        self.offset(df, dr)
    }

    /// Offset from `self` to `to` as (files, ranks).
    pub fn delta(self, to: Coord) -> (i32, i32) {
        (to.file - self.file, to.rank - self.rank)
    }

    /// Parse an algebraic square name such as `"d1"` or `"k14"`.
    pub fn parse(name: &str) -> Option<Coord> {
        let mut chars = name.chars();
        let letter = chars.next()?;
        if !letter.is_ascii_lowercase() {
            return None;
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let rank: i32 = digits.parse().ok()?;
        if rank < 1 {
            return None;
        }
        Some(Coord::new((letter as u8 - b'a') as i32, rank - 1))
    }

    pub fn name(self) -> String {
        format!("{}{}", (b'a' + self.file as u8) as char, self.rank + 1)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file as u8) as char, self.rank + 1)
    }
}

/// The eight unit rays, straights first.
pub const RAYS: [(i32, i32); 8] = [
    (0, 1), (0, -1), (1, 0), (-1, 0),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

/// Dimensions of the cross-shaped board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardShape {
    pub nrows: i32,
    pub ncols: i32,
    pub corner: i32,
}

impl Default for BoardShape {
    fn default() -> Self {
        BoardShape { nrows: 14, ncols: 14, corner: 3 }
    }
}

impl BoardShape {
    pub fn contains(&self, c: Coord) -> bool {
        (0..self.ncols).contains(&c.file) && (0..self.nrows).contains(&c.rank)
    }

    /// True for the removed corner cells.
    pub fn is_blocked(&self, c: Coord) -> bool {
        let file_edge = c.file < self.corner || c.file >= self.ncols - self.corner;
        let rank_edge = c.rank < self.corner || c.rank >= self.nrows - self.corner;
        file_edge && rank_edge
    }

    pub fn is_playable(&self, c: Coord) -> bool {
        self.contains(c) && !self.is_blocked(c)
    }

    pub fn len(&self) -> usize {
        (self.nrows * self.ncols) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major index of an on-board coordinate.
    pub fn index(&self, c: Coord) -> usize {
        (c.rank * self.ncols + c.file) as usize
    }

    pub fn coord(&self, index: usize) -> Coord {
        let index = index as i32;
        Coord::new(index % self.ncols, index / self.ncols)
    }
}

/// Integer rotation matrices taking a seat-local (right, forward) offset onto
/// board (file, rank) axes: `file = m[0][0]*x + m[0][1]*y`,
/// `rank = m[1][0]*x + m[1][1]*y`.
const ROTATIONS: [[[i32; 2]; 2]; 4] = [
    [[1, 0], [0, 1]],
    [[0, 1], [-1, 0]],
    [[-1, 0], [0, -1]],
    [[0, -1], [1, 0]],
];

/// Seat orientation, 0..=3 in turn order. Seat 0 faces +rank, seat 1 +file,
/// seat 2 -rank and seat 3 -file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction(u8);

impl Direction {
    pub const fn new(index: u8) -> Self {
        Direction(index % 4)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn rotate(self, x: i32, y: i32) -> (i32, i32) {
        let m = ROTATIONS[self.index()];
        (m[0][0] * x + m[0][1] * y, m[1][0] * x + m[1][1] * y)
    }

    pub fn forward(self) -> (i32, i32) {
        self.rotate(0, 1)
    }

    pub fn right(self) -> (i32, i32) {
        self.rotate(1, 0)
    }

    /// Board square of the seat-local cell `(x, y)`, where `x` counts from the
    /// seat's left end of its arm and `y = 0` is its back rank.
    pub fn seat_square(self, shape: &BoardShape, x: i32, y: i32) -> Coord {
        let origin = match self.0 {
            0 => Coord::new(shape.corner, 0),
            1 => Coord::new(0, shape.nrows - 1 - shape.corner),
            2 => Coord::new(shape.ncols - 1 - shape.corner, shape.nrows - 1),
            _ => Coord::new(shape.ncols - 1, shape.corner),
        };
        origin.step(self.rotate(x, y))
    }

    /// 1-based distance of `c` from this seat's back edge.
    pub fn depth(self, shape: &BoardShape, c: Coord) -> i32 {
        let y = match self.0 {
            0 => c.rank,
            1 => c.file,
            2 => shape.nrows - 1 - c.rank,
            _ => shape.ncols - 1 - c.file,
        };
        y + 1
    }
}

/// Unit step from `start` toward `end` along a straight or diagonal line.
pub fn unit_step(start: Coord, end: Coord) -> (i32, i32) {
    let (df, dr) = start.delta(end);
    (df.signum(), dr.signum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_names_round_trip_through_coords() {
        let c = Coord::parse("k14").unwrap();
        assert_eq!(c, Coord::new(10, 13));
        assert_eq!(c.name(), "k14");
        assert_eq!(Coord::parse("a1"), Some(Coord::new(0, 0)));
        assert_eq!(Coord::parse("A1"), None);
        assert_eq!(Coord::parse("d0"), None);
        assert_eq!(Coord::parse("d"), None);
        assert_eq!(Coord::parse("d1x"), None);
    }

    #[test]
    fn corners_are_blocked() {
        let shape = BoardShape::default();
        for name in ["a1", "c3", "a14", "c12", "l1", "n3", "l14", "n12"] {
            assert!(shape.is_blocked(Coord::parse(name).unwrap()), "{name}");
        }
        for name in ["d1", "a4", "k14", "n11", "g7", "c4", "l11"] {
            assert!(shape.is_playable(Coord::parse(name).unwrap()), "{name}");
        }
        assert!(!shape.is_playable(Coord::new(14, 5)));
        assert!(!shape.is_playable(Coord::new(5, -1)));
    }

    /// Forward and right vectors must describe each seat facing the centre
    /// with its right hand turning clockwise around the board.
    #[test]
    fn rotation_table_matches_seats() {
        let expected = [
            ((0, 1), (1, 0)),
            ((1, 0), (0, -1)),
            ((0, -1), (-1, 0)),
            ((-1, 0), (0, 1)),
        ];
        for (i, (fwd, right)) in expected.iter().enumerate() {
            let d = Direction::new(i as u8);
            assert_eq!(d.forward(), *fwd);
            assert_eq!(d.right(), *right);
        }
    }

    #[test]
    fn seat_squares_land_on_the_arms() {
        let shape = BoardShape::default();
        let king = |d: u8| Direction::new(d).seat_square(&shape, 4, 0).name();
        assert_eq!(king(0), "h1");
        assert_eq!(king(1), "a7");
        assert_eq!(king(2), "g14");
        assert_eq!(king(3), "n8");

        let d = Direction::new(3);
        let pawn = d.seat_square(&shape, 0, 1);
        assert_eq!(pawn.name(), "m4");
        assert_eq!(d.depth(&shape, pawn), 2);
    }
}
