use crate::engine::eval_constants::{
    VAL_BISHOP, VAL_KING, VAL_KNIGHT, VAL_PAWN, VAL_QUEEN, VAL_ROOK,
};
use crate::engine::{Score, INFINITY};
use crate::logic::board::PieceKind;
use log::warn;
use serde::{Deserialize, Serialize};

// Keeps any evaluation of 32 pieces far below the mate and infinity sentinels.
const MAX_WEIGHT: i32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Evaluation Parameters
    pub val_pawn: i32,
    pub val_knight: i32,
    pub val_bishop: i32,
    pub val_rook: i32,
    pub val_queen: i32,
    pub val_king: i32,

    // King Safety
    pub king_shield_bonus: i32,
    pub king_exposure_penalty: i32,
    pub king_back_rank_bonus: i32,
    pub king_center_penalty: i32,

    // Move Ordering
    pub score_checkmate: i32,
    pub score_check: i32,
    pub score_promotion: i32,

    // Search Parameters
    pub mate_score: i32,
    pub default_depth: u8,
    pub tt_capacity: usize, // 0: unbounded

    // Host
    pub reply_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            val_pawn: VAL_PAWN,
            val_knight: VAL_KNIGHT,
            val_bishop: VAL_BISHOP,
            val_rook: VAL_ROOK,
            val_queen: VAL_QUEEN,
            val_king: VAL_KING,

            king_shield_bonus: 10,
            king_exposure_penalty: 5,
            king_back_rank_bonus: 20,
            king_center_penalty: 30,

            score_checkmate: 100_000,
            score_check: 300,
            score_promotion: 500,

            mate_score: 50_000,
            default_depth: 3,
            tt_capacity: 1 << 20,

            reply_delay_ms: 500,
        }
    }
}

#[derive(Deserialize)]
struct EngineConfigJson {
    val_pawn: Option<f32>,
    val_knight: Option<f32>,
    val_bishop: Option<f32>,
    val_rook: Option<f32>,
    val_queen: Option<f32>,
    val_king: Option<f32>,

    king_shield_bonus: Option<f32>,
    king_exposure_penalty: Option<f32>,
    king_back_rank_bonus: Option<f32>,
    king_center_penalty: Option<f32>,

    score_checkmate: Option<f32>,
    score_check: Option<f32>,
    score_promotion: Option<f32>,

    mate_score: Option<i32>,
    default_depth: Option<u8>,
    tt_capacity: Option<usize>,
    reply_delay_ms: Option<u64>,
}

impl EngineConfig {
    /// Reads a tuning file where weights are multipliers of the defaults
    /// (`"val_knight": 1.1`) and search settings are absolute values.
    pub fn load_from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        let json_config: EngineConfigJson = serde_json::from_str(json_str)?;
        let default = Self::default();

        Ok(Self {
            val_pawn: apply_scale(default.val_pawn, json_config.val_pawn),
            val_knight: apply_scale(default.val_knight, json_config.val_knight),
            val_bishop: apply_scale(default.val_bishop, json_config.val_bishop),
            val_rook: apply_scale(default.val_rook, json_config.val_rook),
            val_queen: apply_scale(default.val_queen, json_config.val_queen),
            val_king: apply_scale(default.val_king, json_config.val_king),

            king_shield_bonus: apply_scale(
                default.king_shield_bonus,
                json_config.king_shield_bonus,
            ),
            king_exposure_penalty: apply_scale(
                default.king_exposure_penalty,
                json_config.king_exposure_penalty,
            ),
            king_back_rank_bonus: apply_scale(
                default.king_back_rank_bonus,
                json_config.king_back_rank_bonus,
            ),
            king_center_penalty: apply_scale(
                default.king_center_penalty,
                json_config.king_center_penalty,
            ),

            score_checkmate: apply_scale(default.score_checkmate, json_config.score_checkmate),
            score_check: apply_scale(default.score_check, json_config.score_check),
            score_promotion: apply_scale(default.score_promotion, json_config.score_promotion),

            mate_score: json_config
                .mate_score
                .map_or(default.mate_score, clamp_mate_score),
            default_depth: json_config.default_depth.unwrap_or(default.default_depth),
            tt_capacity: json_config.tt_capacity.unwrap_or(default.tt_capacity),
            reply_delay_ms: json_config.reply_delay_ms.unwrap_or(default.reply_delay_ms),
        })
    }

    pub const fn piece_value(&self, kind: PieceKind) -> Score {
        match kind {
            PieceKind::Pawn => self.val_pawn,
            PieceKind::Knight => self.val_knight,
            PieceKind::Bishop => self.val_bishop,
            PieceKind::Rook => self.val_rook,
            PieceKind::Queen => self.val_queen,
            PieceKind::King => self.val_king,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn apply_scale(default_val: i32, scale: Option<f32>) -> i32 {
    scale.map_or(default_val, |s| {
        ((default_val as f32 * s) as i32).clamp(-MAX_WEIGHT, MAX_WEIGHT)
    })
}

// Mate must stay strictly inside the alpha-beta sentinels.
fn clamp_mate_score(score: Score) -> Score {
    let clamped = score.clamp(1, INFINITY - 1);
    if clamped != score {
        warn!("mate_score {score} out of range, using {clamped}");
    }
    clamped
}
