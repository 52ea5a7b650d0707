use std::collections::BTreeMap;

use crate::board::Board;
use crate::config::GameConfig;
use crate::piece::Colour;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct SquarePiece {
    kind: String,
    colour: String,
    dead: bool,
}

#[derive(Serialize)]
struct CellJson {
    name: String,
    file: i32,
    rank: i32,
    blocked: bool,
    piece: Option<SquarePiece>,
}

#[derive(Serialize)]
struct PlayerJson {
    colour: String,
    score: u32,
    captures: Vec<String>,
    king_castle: bool,
    queen_castle: bool,
    resigned: bool,
    eliminated: bool,
}

#[derive(Serialize)]
struct BoardState {
    nrows: i32,
    ncols: i32,
    cells: Vec<CellJson>,
    to_play: String,
    colours: Vec<String>,
    players: Vec<PlayerJson>,
    checks: BTreeMap<String, Vec<String>>,
    game_over: bool,
    winner: Option<String>,
    draw: bool,
    round: u32,
    moves: Vec<String>,
    cursor: usize,
    reviewing: bool,
}

#[derive(Serialize)]
struct MoveResult {
    #[serde(flatten)]
    board_state: Option<BoardState>,
    error: Option<String>,
}

fn build_board_state(board: &Board) -> BoardState {
    let shape = board.position().shape;
    let cells = board
        .squares()
        .iter()
        .map(|sq| CellJson {
            name: sq.name(),
            file: sq.coord.file,
            rank: sq.coord.rank,
            blocked: sq.blocked,
            piece: sq.piece.map(|id| {
                let p = board.position().piece(id);
                SquarePiece { kind: p.kind.to_string(), colour: p.colour.to_string(), dead: p.dead }
            }),
        })
        .collect();

    let players = Colour::ALL
        .iter()
        .map(|&c| PlayerJson {
            colour: c.to_string(),
            score: board.score(c),
            captures: board.captures(c).iter().map(|k| k.to_string()).collect(),
            king_castle: board.king_castle(c),
            queen_castle: board.queen_castle(c),
            resigned: board.resigned(c),
            eliminated: board.eliminated(c),
        })
        .collect();

    BoardState {
        nrows: shape.nrows,
        ncols: shape.ncols,
        cells,
        to_play: board.to_play().to_string(),
        colours: board.colours().iter().map(|c| c.to_string()).collect(),
        players,
        checks: board
            .checks()
            .into_iter()
            .map(|(c, squares)| (c.to_string(), squares.iter().map(|s| s.name()).collect()))
            .collect(),
        game_over: board.game_over(),
        winner: board.winner().map(|c| c.to_string()),
        draw: board.draw(),
        round: board.round(),
        moves: board.move_list.iter().map(|m| m.notation.clone()).collect(),
        cursor: board.cursor(),
        reviewing: board.is_reviewing(),
    }
}

fn respond(board: &Board, error: Option<String>) -> JsValue {
    let result = MoveResult { board_state: Some(build_board_state(board)), error };
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

#[wasm_bindgen]
pub struct Game {
    board: Board,
}

#[wasm_bindgen]
impl Game {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Game {
        Game { board: Board::new() }
    }

    /// Start a game with rules read from a JSON config.
    pub fn with_config(json: &str) -> Result<Game, JsValue> {
        let config = GameConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Game { board: Board::with_config(config) })
    }

    pub fn build_timestamp() -> String {
        env!("BUILD_TIMESTAMP").to_string()
    }

    pub fn get_board_state(&self) -> JsValue {
        let state = build_board_state(&self.board);
        serde_wasm_bindgen::to_value(&state).unwrap_or(JsValue::NULL)
    }

    pub fn make_move(&mut self, from: &str, to: &str, resign: bool) -> JsValue {
        let error = self.board.try_move(from, to, resign).err().map(|e| e.to_string());
        respond(&self.board, error)
    }

    pub fn resign(&mut self) -> JsValue {
        let error = self.board.resign().err().map(|e| e.to_string());
        respond(&self.board, error)
    }

    pub fn get_legal_moves_for_square(&self, name: &str) -> JsValue {
        let squares: Vec<String> = self
            .board
            .legal_destinations(name)
            .map(|list| list.iter().map(|c| c.name()).collect())
            .unwrap_or_default();
        serde_wasm_bindgen::to_value(&squares).unwrap_or(JsValue::NULL)
    }

    pub fn review_back(&mut self) -> JsValue {
        self.board.review_back();
        self.get_board_state()
    }

    pub fn review_forward(&mut self) -> JsValue {
        self.board.review_forward();
        self.get_board_state()
    }

    pub fn review_live(&mut self) -> JsValue {
        self.board.review_live();
        self.get_board_state()
    }

    pub fn fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn load_fen(&mut self, text: &str) -> Result<(), JsValue> {
        let config = self.board.config().clone();
        self.board = Board::from_fen_with_config(text, config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    pub fn move_text(&self) -> String {
        self.board.move_text()
    }

    pub fn load_move_text(&mut self, text: &str) -> Result<(), JsValue> {
        let config = self.board.config().clone();
        self.board =
            Board::from_move_text_with_config(text, config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
