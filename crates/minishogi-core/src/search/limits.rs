//! 探索制限（LimitsType）

use crate::types::Color;

/// 時刻・持ち時間[ms]
pub type TimePoint = i64;

/// goコマンドでの探索時に用いる、持ち時間設定などが入った構造体
#[derive(Debug, Clone)]
pub struct LimitsType {
    /// 残り時間[ms]
    pub time: [TimePoint; Color::NUM],
    /// 1手ごとに増加する時間（フィッシャールール）[ms]
    pub inc: [TimePoint; Color::NUM],
    /// 秒読み[ms]
    pub byoyomi: [TimePoint; Color::NUM],
    /// 思考時間固定[ms]（0以外が指定してあるなら）
    pub movetime: TimePoint,
    /// 探索深さ固定（0以外を指定してあるなら）
    pub depth: i32,
    /// 今回のgoコマンドでの探索ノード数上限（0なら無制限）
    pub nodes: u64,
    /// perft中であるかのフラグ。非0なら、perft時の深さが入る。
    pub perft: i32,
    /// 思考時間無制限かどうかのフラグ
    pub infinite: bool,
}

impl LimitsType {
    /// 時間制御を行うのか。
    /// 思考時間固定、探索深さ指定、ノード数指定、perft、無制限の
    /// いずれかであるときは時間制御に意味がないのでやらない。
    pub fn use_time_management(&self) -> bool {
        self.movetime == 0 && self.depth == 0 && self.nodes == 0 && self.perft == 0 && !self.infinite
    }
}

impl Default for LimitsType {
    fn default() -> Self {
        LimitsType {
            time: [0; Color::NUM],
            inc: [0; Color::NUM],
            byoyomi: [0; Color::NUM],
            movetime: 0,
            depth: 0,
            nodes: 0,
            perft: 0,
            infinite: false,
        }
    }
}
