//! 探索モジュール
//!
//! - 反復深化 + アルファベータ探索
//! - 置換表による枝刈りと指し手順序付け
//! - 千日手・詰みスコアの扱い
//! - 時間・ノード数による停止制御

mod engine;
mod limits;
mod root_moves;

pub use engine::SearchEngine;
pub use limits::{LimitsType, TimePoint};
pub use root_moves::{root_move_ordering, RootMove};

use crate::types::{Color, RepetitionState, Value, MAX_PLY};

/// 千日手判定の地平線（手数）
pub const REPETITION_PLY: i32 = 16;

/// 深さ指定がないときの探索深さ
pub const DEFAULT_SEARCH_DEPTH: i32 = 20;

/// 探索深さの上限（置換表のdepthフィールドは6bit）
pub const MAX_SEARCH_DEPTH: i32 = 60;

/// 千日手状態に対応する評価値を返す
///
/// 手番側から見た値。通常の千日手は引き分け、連続王手の千日手は
/// 王手をかけた側の負けとして詰みに準じた値を返す。
pub fn draw_value(state: RepetitionState, _us: Color) -> Value {
    match state {
        RepetitionState::None => Value::NONE,
        RepetitionState::Draw => Value::DRAW,
        RepetitionState::Win => Value::mate_in(MAX_PLY),
        RepetitionState::Lose => Value::mated_in(MAX_PLY),
        RepetitionState::Superior => Value::SUPERIOR,
        RepetitionState::Inferior => -Value::SUPERIOR,
    }
}
