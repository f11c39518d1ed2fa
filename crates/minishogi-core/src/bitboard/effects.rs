//! 駒の利き
//!
//! 歩・銀・金・玉の利きはコンパイル時にテーブル化する。
//! 角・飛・馬・龍は盤上の駒（occ）に依存するため、方向ごとに走査する。

use super::Bitboard;
use crate::types::{Color, File, Piece, PieceType, Square};

/// (筋方向, 段方向) の差分
type Delta = (i8, i8);

const BLACK_PAWN_DELTAS: [Delta; 1] = [(0, -1)];
const WHITE_PAWN_DELTAS: [Delta; 1] = [(0, 1)];
const BLACK_SILVER_DELTAS: [Delta; 5] = [(0, -1), (-1, -1), (1, -1), (-1, 1), (1, 1)];
const WHITE_SILVER_DELTAS: [Delta; 5] = [(0, 1), (-1, 1), (1, 1), (-1, -1), (1, -1)];
const BLACK_GOLD_DELTAS: [Delta; 6] = [(0, -1), (-1, -1), (1, -1), (-1, 0), (1, 0), (0, 1)];
const WHITE_GOLD_DELTAS: [Delta; 6] = [(0, 1), (-1, 1), (1, 1), (-1, 0), (1, 0), (0, -1)];
const KING_DELTAS: [Delta; 8] =
    [(0, -1), (0, 1), (-1, 0), (1, 0), (-1, -1), (-1, 1), (1, -1), (1, 1)];

const BISHOP_DIRS: [Delta; 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [Delta; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// 差分リストから近接駒の利きテーブルを構築する
const fn build_step_table(deltas: &[Delta]) -> [Bitboard; Square::NUM] {
    let mut table = [Bitboard::EMPTY; Square::NUM];
    let mut sq = 0;
    while sq < Square::NUM {
        let f = (sq / 5) as i8;
        let r = (sq % 5) as i8;
        let mut bits = 0u32;
        let mut i = 0;
        while i < deltas.len() {
            let (df, dr) = deltas[i];
            let nf = f + df;
            let nr = r + dr;
            if 0 <= nf && nf < 5 && 0 <= nr && nr < 5 {
                bits |= 1 << (nf * 5 + nr);
            }
            i += 1;
        }
        table[sq] = Bitboard::from_raw(bits);
        sq += 1;
    }
    table
}

static PAWN_EFFECT: [[Bitboard; Square::NUM]; Color::NUM] =
    [build_step_table(&BLACK_PAWN_DELTAS), build_step_table(&WHITE_PAWN_DELTAS)];
static SILVER_EFFECT: [[Bitboard; Square::NUM]; Color::NUM] =
    [build_step_table(&BLACK_SILVER_DELTAS), build_step_table(&WHITE_SILVER_DELTAS)];
static GOLD_EFFECT: [[Bitboard; Square::NUM]; Color::NUM] =
    [build_step_table(&BLACK_GOLD_DELTAS), build_step_table(&WHITE_GOLD_DELTAS)];
static KING_EFFECT: [Bitboard; Square::NUM] = build_step_table(&KING_DELTAS);

/// 筋ごとのマスク（二歩判定用）
static FILE_BB: [Bitboard; File::NUM] = {
    let mut table = [Bitboard::EMPTY; File::NUM];
    let mut f = 0;
    while f < File::NUM {
        table[f] = Bitboard::from_raw(0x1F << (f * 5));
        f += 1;
    }
    table
};

/// 歩の利き
#[inline]
pub fn pawn_effect(c: Color, sq: Square) -> Bitboard {
    PAWN_EFFECT[c.index()][sq.index()]
}

/// 銀の利き
#[inline]
pub fn silver_effect(c: Color, sq: Square) -> Bitboard {
    SILVER_EFFECT[c.index()][sq.index()]
}

/// 金の利き（と金・成銀も同じ）
#[inline]
pub fn gold_effect(c: Color, sq: Square) -> Bitboard {
    GOLD_EFFECT[c.index()][sq.index()]
}

/// 玉の利き
#[inline]
pub fn king_effect(sq: Square) -> Bitboard {
    KING_EFFECT[sq.index()]
}

/// 指定筋のマスク
#[inline]
pub fn file_bb(f: File) -> Bitboard {
    FILE_BB[f.index()]
}

/// 跳び駒の利きを方向走査で求める
fn slider_effect(sq: Square, occ: Bitboard, dirs: &[Delta]) -> Bitboard {
    let f = (sq.index() / 5) as i8;
    let r = (sq.index() % 5) as i8;
    let mut bits = 0u32;
    for &(df, dr) in dirs {
        let mut nf = f + df;
        let mut nr = r + dr;
        while 0 <= nf && nf < 5 && 0 <= nr && nr < 5 {
            let nsq = (nf * 5 + nr) as u8;
            bits |= 1 << nsq;
            // SAFETY: 0 <= nf,nr < 5 なので nsq < 25
            if occ.contains(unsafe { Square::from_u8_unchecked(nsq) }) {
                break;
            }
            nf += df;
            nr += dr;
        }
    }
    Bitboard::from_raw(bits)
}

/// 角の利き
#[inline]
pub fn bishop_effect(sq: Square, occ: Bitboard) -> Bitboard {
    slider_effect(sq, occ, &BISHOP_DIRS)
}

/// 飛の利き
#[inline]
pub fn rook_effect(sq: Square, occ: Bitboard) -> Bitboard {
    slider_effect(sq, occ, &ROOK_DIRS)
}

/// 馬の利き
#[inline]
pub fn horse_effect(sq: Square, occ: Bitboard) -> Bitboard {
    bishop_effect(sq, occ) | king_effect(sq)
}

/// 龍の利き
#[inline]
pub fn dragon_effect(sq: Square, occ: Bitboard) -> Bitboard {
    rook_effect(sq, occ) | king_effect(sq)
}

/// 駒の利き
pub fn piece_effect(pc: Piece, sq: Square, occ: Bitboard) -> Bitboard {
    let c = pc.color();
    match pc.piece_type() {
        PieceType::Pawn => pawn_effect(c, sq),
        PieceType::Silver => silver_effect(c, sq),
        PieceType::Gold | PieceType::ProPawn | PieceType::ProSilver => gold_effect(c, sq),
        PieceType::King => king_effect(sq),
        PieceType::Bishop => bishop_effect(sq, occ),
        PieceType::Rook => rook_effect(sq, occ),
        PieceType::Horse => horse_effect(sq, occ),
        PieceType::Dragon => dragon_effect(sq, occ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rank;

    fn sq(f: u8, r: u8) -> Square {
        Square::new(File::from_u8(f).unwrap(), Rank::from_u8(r).unwrap())
    }

    #[test]
    fn test_pawn_effect() {
        // 先手の歩は上（段が小さい方）に1升
        let bb = pawn_effect(Color::Black, sq(2, 2));
        assert_eq!(bb.pop_count(), 1);
        assert!(bb.contains(sq(2, 1)));

        // 後手の歩は下に1升
        let bb = pawn_effect(Color::White, sq(2, 2));
        assert!(bb.contains(sq(2, 3)));

        // 最上段の先手歩に利きはない
        assert!(pawn_effect(Color::Black, sq(2, 0)).is_empty());
    }

    #[test]
    fn test_silver_effect() {
        // 中央の銀は5方向
        let bb = silver_effect(Color::Black, sq(2, 2));
        assert_eq!(bb.pop_count(), 5);
        assert!(bb.contains(sq(2, 1)));
        assert!(bb.contains(sq(1, 1)));
        assert!(bb.contains(sq(3, 1)));
        assert!(bb.contains(sq(1, 3)));
        assert!(bb.contains(sq(3, 3)));
        // 真横・真後ろには利かない
        assert!(!bb.contains(sq(1, 2)));
        assert!(!bb.contains(sq(2, 3)));
    }

    #[test]
    fn test_gold_effect() {
        // 中央の金は6方向
        let bb = gold_effect(Color::Black, sq(2, 2));
        assert_eq!(bb.pop_count(), 6);
        assert!(bb.contains(sq(2, 1)));
        assert!(bb.contains(sq(1, 2)));
        assert!(bb.contains(sq(3, 2)));
        assert!(bb.contains(sq(2, 3)));
        // 斜め後ろには利かない
        assert!(!bb.contains(sq(1, 3)));
        assert!(!bb.contains(sq(3, 3)));
    }

    #[test]
    fn test_king_effect() {
        assert_eq!(king_effect(sq(2, 2)).pop_count(), 8);
        // 隅の玉は3方向
        assert_eq!(king_effect(sq(0, 0)).pop_count(), 3);
        assert_eq!(king_effect(sq(4, 4)).pop_count(), 3);
    }

    #[test]
    fn test_bishop_effect() {
        // 空の盤での中央の角は4方向に計8升
        let bb = bishop_effect(sq(2, 2), Bitboard::EMPTY);
        assert_eq!(bb.pop_count(), 8);
        assert!(bb.contains(sq(0, 0)));
        assert!(bb.contains(sq(4, 4)));
        assert!(bb.contains(sq(0, 4)));
        assert!(bb.contains(sq(4, 0)));

        // 遮る駒があればそこで止まる（その升自体は利きに含む）
        let occ = Bitboard::from_square(sq(3, 3));
        let bb = bishop_effect(sq(2, 2), occ);
        assert!(bb.contains(sq(3, 3)));
        assert!(!bb.contains(sq(4, 4)));
    }

    #[test]
    fn test_rook_effect() {
        let bb = rook_effect(sq(2, 2), Bitboard::EMPTY);
        assert_eq!(bb.pop_count(), 8);

        let occ = Bitboard::from_square(sq(2, 1));
        let bb = rook_effect(sq(2, 2), occ);
        assert!(bb.contains(sq(2, 1)));
        assert!(!bb.contains(sq(2, 0)));
    }

    #[test]
    fn test_horse_dragon_effect() {
        // 馬 = 角 + 玉、龍 = 飛 + 玉
        let horse = horse_effect(sq(2, 2), Bitboard::EMPTY);
        assert_eq!(horse.pop_count(), 12);
        let dragon = dragon_effect(sq(2, 2), Bitboard::EMPTY);
        assert_eq!(dragon.pop_count(), 12);
    }

    #[test]
    fn test_file_bb() {
        let bb = file_bb(File::File1);
        assert_eq!(bb.pop_count(), 5);
        assert!(bb.contains(sq(0, 0)));
        assert!(bb.contains(sq(0, 4)));
        assert!(!bb.contains(sq(1, 0)));
    }
}
