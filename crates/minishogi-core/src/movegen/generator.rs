//! 合法手生成

use crate::bitboard::{file_bb, piece_effect};
use crate::position::Position;
use crate::types::{Move, PieceType};

use super::movelist::MoveList;

/// 合法手をすべて生成する
///
/// 王手放置・二歩・行き所のない歩・打ち歩詰めを除外した指し手を返す。
pub fn generate_legal(pos: &mut Position, list: &mut MoveList) {
    list.clear();
    let mut pseudo = MoveList::new();
    generate_pseudo_legal(pos, &mut pseudo);
    for &m in &pseudo {
        if is_legal(pos, m) {
            list.push(m);
        }
    }
}

/// 王手放置と打ち歩詰め以外のルールを満たす指し手を生成する
fn generate_pseudo_legal(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let own = pos.pieces_c(us);
    let occ = pos.occupied();

    // 盤上の駒の移動
    for from in own.iter() {
        let pc = pos.piece_on(from);
        let pt = pc.piece_type();
        let targets = piece_effect(pc, from, occ) & !own;
        for to in targets.iter() {
            let in_zone =
                from.rank().is_promotion_zone(us) || to.rank().is_promotion_zone(us);
            if pt.can_promote() && in_zone {
                list.push(Move::new_move(from, to, true));
            }
            // 行き所のない歩になる不成は生成しない
            let must_promote = pt == PieceType::Pawn && to.rank().is_promotion_zone(us);
            if !must_promote {
                list.push(Move::new_move(from, to, false));
            }
        }
    }

    // 駒打ち
    let hand = pos.hand_of(us);
    if hand.is_empty() {
        return;
    }
    let empties = !occ;
    for pt in PieceType::HAND_PIECES {
        if !hand.has(pt) {
            continue;
        }
        for to in empties.iter() {
            if pt == PieceType::Pawn {
                // 行き所のない歩
                if to.rank().is_promotion_zone(us) {
                    continue;
                }
                // 二歩
                if !(pos.pieces(us, PieceType::Pawn) & file_bb(to.file())).is_empty() {
                    continue;
                }
            }
            list.push(Move::new_drop(pt, to));
        }
    }
}

/// 自玉を王手に晒さず、打ち歩詰めにもならないか
fn is_legal(pos: &mut Position, m: Move) -> bool {
    let us = pos.side_to_move();
    pos.do_move(m);
    let them = pos.side_to_move();
    let mut legal = pos.attackers_to(them, pos.king_square(us)).is_empty();

    // 打ち歩詰め: 歩打ちの王手に相手の応手がなければ反則
    if legal && m.is_drop() && m.drop_piece_type() == PieceType::Pawn && pos.in_check() {
        legal = has_any_legal_move(pos);
    }

    pos.undo_move(m);
    legal
}

/// 王手放置だけを弾いた応手が1手でも存在するか
///
/// 打ち歩詰め判定用。歩打ちの王手は隣接王手なので、応手側の歩打ちが
/// 打ち歩詰めになることはなく、再帰は1段で止まる。
fn has_any_legal_move(pos: &mut Position) -> bool {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal(pos, &mut pseudo);
    let us = pos.side_to_move();
    for &m in &pseudo {
        pos.do_move(m);
        let them = pos.side_to_move();
        let ok = pos.attackers_to(them, pos.king_square(us)).is_empty();
        pos.undo_move(m);
        if ok {
            return true;
        }
    }
    false
}
