//! ルート局面の指し手（RootMove）

use crate::types::{Move, Value};

/// root局面での指し手として使われる。それぞれのroot moveに対して、
/// その指し手で進めたときのscore(評価値)とPVを持っている。
/// scoreは-VALUE_INFINITEで初期化される。
#[derive(Debug, Clone)]
pub struct RootMove {
    /// 今回のスコア
    pub score: Value,
    /// 前回のスコア
    pub previous_score: Value,
    /// rootから最大、何手目まで探索したか（選択深さの最大）
    pub sel_depth: i32,
    /// この指し手で進めたときのpv。pv[0]はこの指し手自身。
    pub pv: Vec<Move>,
}

impl RootMove {
    /// 指し手からRootMoveを生成
    pub fn new(m: Move) -> Self {
        RootMove {
            score: -Value::INFINITE,
            previous_score: -Value::INFINITE,
            sel_depth: 0,
            pv: vec![m],
        }
    }
}

/// スコア降順（同点なら前回スコア降順）の比較
///
/// 安定ソートと組み合わせて使う。
pub fn root_move_ordering(a: &RootMove, b: &RootMove) -> std::cmp::Ordering {
    b.score.cmp(&a.score).then(b.previous_score.cmp(&a.previous_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    fn mv(from: u8, to: u8) -> Move {
        Move::new_move(
            Square::from_u8(from).unwrap(),
            Square::from_u8(to).unwrap(),
            false,
        )
    }

    #[test]
    fn test_root_move_new() {
        let m = mv(0, 1);
        let rm = RootMove::new(m);
        assert_eq!(rm.score, -Value::INFINITE);
        assert_eq!(rm.previous_score, -Value::INFINITE);
        assert_eq!(rm.pv, vec![m]);
    }

    #[test]
    fn test_root_move_sort_descending() {
        let mut moves: Vec<RootMove> = (0..3).map(|i| RootMove::new(mv(i, i + 1))).collect();
        moves[0].score = Value::new(10);
        moves[1].score = Value::new(30);
        moves[2].score = Value::new(20);

        moves.sort_by(root_move_ordering);
        assert_eq!(moves[0].score, Value::new(30));
        assert_eq!(moves[1].score, Value::new(20));
        assert_eq!(moves[2].score, Value::new(10));
    }

    #[test]
    fn test_root_move_sort_tiebreak_previous_score() {
        let mut moves: Vec<RootMove> = (0..2).map(|i| RootMove::new(mv(i, i + 1))).collect();
        moves[0].score = Value::new(10);
        moves[0].previous_score = Value::new(5);
        moves[1].score = Value::new(10);
        moves[1].previous_score = Value::new(15);

        moves.sort_by(root_move_ordering);
        assert_eq!(moves[0].previous_score, Value::new(15));
    }
}
