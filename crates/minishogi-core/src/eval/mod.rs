//! 評価関数
//!
//! 駒割りと、両玉からの距離・利き数で重み付けした利き評価（KKPEEテーブル）
//! による静的評価。テーブルは
//! `[先手玉の升][後手玉の升][対象升][先手の利き数(max2)][後手の利き数(max2)][駒]`
//! の6次元で、初回アクセス時に一度だけ構築される。

mod material;

pub use material::*;

use std::sync::LazyLock;

use crate::position::Position;
use crate::types::{Color, Piece, PieceType, Square, Value};

/// 利き数の次元（0/1/2以上で飽和）
const EFFECT_NB: usize = 3;

/// KKPEEテーブルの要素数
const KKPEE_LEN: usize =
    Square::NUM * Square::NUM * Square::NUM * EFFECT_NB * EFFECT_NB * Piece::NB;

/// 距離に応じた利き評価値テーブルを生成（base * 1024 / (distance+1)）
const fn make_effect_values(base: i32) -> [i32; 5] {
    let mut arr = [0; 5];
    let mut d = 0;
    while d < 5 {
        arr[d] = base * 1024 / (d as i32 + 1);
        d += 1;
    }
    arr
}

/// 自玉周辺の味方の利きの価値（距離別）
const OUR_EFFECT_VALUE: [i32; 5] = make_effect_values(68);
/// 自玉周辺の敵の利きの価値（距離別）
const THEIR_EFFECT_VALUE: [i32; 5] = make_effect_values(96);

/// 筋と段で多く離れている方を距離とする（チェビシェフ距離）
#[inline]
fn dist(a: Square, b: Square) -> usize {
    let df = (a.file().index() as i32 - b.file().index() as i32).unsigned_abs() as usize;
    let dr = (a.rank().index() as i32 - b.rank().index() as i32).unsigned_abs() as usize;
    df.max(dr)
}

#[inline]
fn kkpee_index(bk: usize, wk: usize, sq: usize, m1: usize, m2: usize, pc: usize) -> usize {
    ((((bk * Square::NUM + wk) * Square::NUM + sq) * EFFECT_NB + m1) * EFFECT_NB + m2)
        * Piece::NB
        + pc
}

fn build_kkpee() -> Box<[i16]> {
    // 利きが1つの升にm個ある時の倍率。1024を1.0とみなす固定小数で、
    // optimizerの出力 6365 - 0.8525^(m-1) * 5341 を使う。
    let mut multi_effect_value = [0i32; 11];
    for (m, value) in multi_effect_value.iter_mut().enumerate().skip(1) {
        *value = (6365.0 - 0.8525f64.powi(m as i32 - 1) * 5341.0) as i32;
    }

    // 利きを評価するテーブル [玉の位置][対象升][利きの数]
    let mut our_effect_table = vec![[[0f64; EFFECT_NB]; Square::NUM]; Square::NUM];
    let mut their_effect_table = vec![[[0f64; EFFECT_NB]; Square::NUM]; Square::NUM];
    for king_sq in Square::all() {
        for sq in Square::all() {
            let d = dist(sq, king_sq);
            for m in 0..EFFECT_NB {
                our_effect_table[king_sq.index()][sq.index()][m] =
                    (multi_effect_value[m] * OUR_EFFECT_VALUE[d]) as f64 / (1024.0 * 1024.0);
                their_effect_table[king_sq.index()][sq.index()][m] =
                    (multi_effect_value[m] * THEIR_EFFECT_VALUE[d]) as f64 / (1024.0 * 1024.0);
            }
        }
    }

    let mut table = vec![0i16; KKPEE_LEN].into_boxed_slice();
    for bk in 0..Square::NUM {
        for wk in 0..Square::NUM {
            let inv_wk = 24 - wk;
            for sq in 0..Square::NUM {
                let inv_sq = 24 - sq;
                for m1 in 0..EFFECT_NB {
                    for m2 in 0..EFFECT_NB {
                        // 幾何項は倍精度で合算してから1回だけ切り捨てる
                        let geo = our_effect_table[bk][sq][m1] - their_effect_table[bk][sq][m2]
                            - our_effect_table[inv_wk][inv_sq][m2]
                            + their_effect_table[inv_wk][inv_sq][m1];
                        let geo = geo as i32;
                        for pc in 0..Piece::NB {
                            let mut score = geo;
                            if pc != 0 {
                                // 盤上の駒に対しては、その価値を1/10ほど減ずる
                                score -= PIECE_VALUE[pc] * 104 / 1024;
                            }
                            table[kkpee_index(bk, wk, sq, m1, m2, pc)] = score as i16;
                        }
                    }
                }
            }
        }
    }
    table
}

/// 利き評価テーブル（初回アクセス時に構築、以後は読み取り専用）
static KKPEE: LazyLock<Box<[i16]>> = LazyLock::new(build_kkpee);

/// 評価関数の初期化
///
/// KKPEEテーブルの構築を起動時に済ませておくための窓口。
pub fn init() {
    LazyLock::force(&KKPEE);
}

/// KKPEEテーブルの値を取得（テスト用にも公開）
#[inline]
pub fn kkpee(bk: Square, wk: Square, sq: Square, m1: usize, m2: usize, pc: Piece) -> i16 {
    KKPEE[kkpee_index(bk.index(), wk.index(), sq.index(), m1, m2, pc.index())]
}

/// 静的評価
///
/// 先手から見たスコアを組み立て、手番側から見た値を返す。
pub fn evaluate(pos: &Position) -> Value {
    let kkpee_table = &**KKPEE;
    let bk = pos.king_square(Color::Black);
    let wk = pos.king_square(Color::White);

    let mut score: i32 = 0;

    // 盤上の駒と利きの評価
    for sq in Square::all() {
        let pc = pos.piece_on(sq);
        score += PIECE_VALUE[pc.index()];

        let m1 = pos.attackers_to(Color::Black, sq).pop_count().min(2) as usize;
        let m2 = pos.attackers_to(Color::White, sq).pop_count().min(2) as usize;
        score += kkpee_table
            [kkpee_index(bk.index(), wk.index(), sq.index(), m1, m2, pc.index())]
            as i32;
    }

    // 手駒の評価
    for c in Color::ALL {
        let hand = pos.hand_of(c);
        if hand.is_empty() {
            continue;
        }
        for pt in PieceType::HAND_PIECES {
            let cnt = hand.count(pt) as i32;
            score += cnt * HAVING_PIECE_VALUE[Piece::new(c, pt).index()];
        }
    }

    // 手番側から見た評価値を返す
    if pos.side_to_move() == Color::Black {
        Value::new(score)
    } else {
        Value::new(-score)
    }
}
