use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::BoardShape;

/// Points awarded by the scoring rules. Tuned to the usual free-for-all
/// table; a check "by queen" is one delivered by a queen move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scoring {
    pub single_check: u32,
    pub single_check_queen: u32,
    pub double_check: u32,
    pub double_check_queen: u32,
    pub triple_check: u32,
    pub triple_check_queen: u32,
    pub checkmate: u32,
    pub stalemate: u32,
    /// Paid to the last colour standing per opponent that resigned or was
    /// eliminated.
    pub last_standing: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring {
            single_check: 1,
            single_check_queen: 0,
            double_check: 5,
            double_check_queen: 1,
            triple_check: 20,
            triple_check_queen: 5,
            checkmate: 20,
            stalemate: 10,
            last_standing: 20,
        }
    }
}

impl Scoring {
    /// Bonus for checking `kings` kings at once.
    pub fn check_bonus(&self, kings: usize, by_queen: bool) -> u32 {
        match (kings, by_queen) {
            (0, _) => 0,
            (1, false) => self.single_check,
            (1, true) => self.single_check_queen,
            (2, false) => self.double_check,
            (2, true) => self.double_check_queen,
            (_, false) => self.triple_check,
            (_, true) => self.triple_check_queen,
        }
    }
}

/// Rules and board dimensions for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub nrows: i32,
    pub ncols: i32,
    /// Depth of the removed corner blocks.
    pub corner: i32,
    /// Pawns promote on reaching this depth, counted from their own back edge.
    pub promotion_rank: i32,
    /// Rounds without a pawn move or capture before the game is drawn. The
    /// limit in plies scales with the number of colours still in rotation.
    pub inactivity_rounds: u32,
    pub scoring: Scoring,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            nrows: 14,
            ncols: 14,
            corner: 3,
            promotion_rank: 8,
            inactivity_rounds: 50,
            scoring: Scoring::default(),
        }
    }
}

impl GameConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn shape(&self) -> BoardShape {
        BoardShape { nrows: self.nrows, ncols: self.ncols, corner: self.corner }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nrows != self.ncols {
            return Err(ConfigError::Shape(format!(
                "board must be square, got {}x{}",
                self.nrows, self.ncols
            )));
        }
        if self.ncols > 26 {
            return Err(ConfigError::Shape(format!("at most 26 files, got {}", self.ncols)));
        }
        if self.corner < 0 || self.ncols - 2 * self.corner != 8 {
            return Err(ConfigError::Shape(format!(
                "arms must be 8 squares wide, got {} with corner {}",
                self.ncols - 2 * self.corner,
                self.corner
            )));
        }
        if self.promotion_rank < 3 || self.promotion_rank > self.nrows {
            return Err(ConfigError::Promotion(self.promotion_rank));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{"promotion_rank": 11, "scoring": {"checkmate": 30}}"#).unwrap();
        assert_eq!(config.promotion_rank, 11);
        assert_eq!(config.scoring.checkmate, 30);
        assert_eq!(config.scoring.stalemate, 10);
        assert_eq!(config.nrows, 14);
        assert_eq!(config.inactivity_rounds, 50);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            GameConfig::from_json(r#"{"ncols": 12}"#),
            Err(ConfigError::Shape(_))
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"corner": 2}"#),
            Err(ConfigError::Shape(_))
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"promotion_rank": 20}"#),
            Err(ConfigError::Promotion(20))
        ));
        assert!(matches!(GameConfig::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn check_bonus_escalates() {
        let s = Scoring::default();
        assert_eq!(s.check_bonus(0, false), 0);
        assert!(s.check_bonus(2, false) > s.check_bonus(1, false));
        assert!(s.check_bonus(3, false) > s.check_bonus(2, false));
        assert!(s.check_bonus(3, true) < s.check_bonus(3, false));
        assert_eq!(s.check_bonus(4, false), s.triple_check);
    }
}
