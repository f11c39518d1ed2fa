//! 5五将棋（ミニ将棋）エンジンのコアライブラリ
//!
//! - `types`: 基本型（升・駒・指し手・評価値など）
//! - `bitboard`: 25升のBitboardと利きテーブル
//! - `position`: 局面とdo/undo、SFEN入出力
//! - `movegen`: 合法手生成
//! - `eval`: 駒割り + KKPEE利き評価
//! - `tt`: 置換表
//! - `search`: 反復深化アルファベータ探索

pub mod bitboard;
pub mod eval;
pub mod movegen;
pub mod position;
pub mod search;
pub mod tt;
pub mod types;

pub use position::{Position, SFEN_STARTPOS};
pub use search::{LimitsType, SearchEngine};
pub use tt::TranspositionTable;
pub use types::{Color, Move, Piece, PieceType, Square, Value};

/// エンジン全体の初期化
///
/// 評価関数テーブルの構築など、時間のかかる初期化をまとめて行う。
/// isreadyの応答前に一度呼んでおくこと。複数回呼んでも安全。
pub fn init() {
    eval::init();
}
