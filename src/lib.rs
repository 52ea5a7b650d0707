pub mod board;
pub mod config;
pub mod error;
pub mod fen;
pub mod geometry;
pub mod moves;
pub mod notation;
pub mod piece;
pub mod position;
pub mod square;

#[cfg(target_arch = "wasm32")]
mod wasm_api;
