//! Error types for the rules engine.
//!
//! Rejected moves never change the board; game-structural events (mate,
//! stalemate, draw, resignation) are state transitions and are not errors.

use thiserror::Error;

use crate::geometry::Coord;
use crate::piece::{CastleSide, Colour, PieceKind};

/// Why a move request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("the game is over")]
    GameOver,

    #[error("reviewing ply {cursor} of {len}; return to the live position first")]
    Reviewing { cursor: usize, len: usize },

    #[error("invalid square name: {0:?}")]
    InvalidSquare(String),

    #[error("square {0} is blocked")]
    BlockedSquare(Coord),

    #[error("no piece on {0}")]
    NoPiece(Coord),

    #[error("piece on {0} is out of play")]
    DeadPiece(Coord),

    #[error("it is {to_play}'s turn, not {colour}'s")]
    WrongTurn { colour: Colour, to_play: Colour },

    #[error("piece on {0} must leave its square")]
    NullMove(Coord),

    #[error("square {0} is already occupied")]
    Occupied(Coord),

    #[error("{0} holds a piece of the same colour")]
    OwnPiece(Coord),

    #[error("{kind} cannot move from {start} to {end}")]
    Geometry { kind: PieceKind, start: Coord, end: Coord },

    #[error("path from {start} to {end} is obstructed")]
    Obstructed { start: Coord, end: Coord },

    #[error("{colour} has no {side}-side castling rights")]
    CastlingRights { colour: Colour, side: CastleSide },

    #[error("{side}-side castling path is not clear")]
    CastlingBlocked { side: CastleSide },

    #[error("king would pass through attacked square {0}")]
    CastleThroughCheck(Coord),

    #[error("king in check")]
    KingInCheck,
}

/// Errors reading the position string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 7 fields, found {0}")]
    FieldCount(usize),

    #[error("bad {field} field: {value:?}")]
    Field { field: &'static str, value: String },

    #[error("bad cell token {0:?}")]
    Cell(String),

    #[error("row {row} covers {found} cells, expected {expected}")]
    RowWidth { row: usize, found: i32, expected: i32 },

    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("piece on blocked square {0}")]
    Blocked(Coord),

    #[error("{0} has more than one king")]
    DuplicateKing(Colour),
}

/// Errors reading move text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("cannot read move token {0:?}")]
    Token(String),

    #[error("ply {ply} ({token}) is illegal: {source}")]
    Illegal {
        ply: usize,
        token: String,
        #[source]
        source: MoveError,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported board shape: {0}")]
    Shape(String),

    #[error("promotion rank {0} is outside the board")]
    Promotion(i32),
}

/// Errors stepping through history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("no ply {index}; history has {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("ply {index} is not adjacent to the review cursor at {cursor}")]
    OutOfOrder { index: usize, cursor: usize },
}
