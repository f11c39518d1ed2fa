//! 局面（Position）

use crate::bitboard::{
    bishop_effect, gold_effect, king_effect, pawn_effect, rook_effect, silver_effect, Bitboard,
};
use crate::types::{Color, Hand, Key, Move, Piece, PieceType, RepetitionState, Square};

use super::state::StateInfo;
use super::zobrist::{zobrist_hand, zobrist_psq, zobrist_side};

/// 5五将棋の局面
#[derive(Clone)]
pub struct Position {
    /// 各升の駒 [Square]
    pub(super) board: [Piece; Square::NUM],
    /// 駒種別Bitboard（PieceTypeの判別値で索引）
    pub(super) by_type: [Bitboard; 15],
    /// 先後別Bitboard
    pub(super) by_color: [Bitboard; Color::NUM],
    /// 手駒 [Color]
    pub(super) hand: [Hand; Color::NUM],
    /// 玉の位置 [Color]
    pub(super) king_square: [Square; Color::NUM],
    /// 手番
    pub(super) side_to_move: Color,
    /// 手数
    pub(super) game_ply: i32,
    /// 状態スタック
    pub(super) state_stack: Vec<StateInfo>,
    /// 現在の状態インデックス
    pub(super) state_idx: usize,
}

impl Position {
    /// 空の局面を生成
    pub fn new() -> Self {
        Position {
            board: [Piece::NONE; Square::NUM],
            by_type: [Bitboard::EMPTY; 15],
            by_color: [Bitboard::EMPTY; Color::NUM],
            hand: [Hand::EMPTY; Color::NUM],
            king_square: [Square::SQ_11; Color::NUM],
            side_to_move: Color::Black,
            game_ply: 1,
            state_stack: vec![StateInfo::new()],
            state_idx: 0,
        }
    }

    #[inline]
    pub(super) fn cur_state(&self) -> &StateInfo {
        &self.state_stack[self.state_idx]
    }

    // ========== 盤面アクセス ==========

    /// 指定升の駒を取得
    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    /// 全駒のBitboard（占有）
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.by_color[Color::Black.index()] | self.by_color[Color::White.index()]
    }

    /// 指定手番の駒のBitboard
    #[inline]
    pub fn pieces_c(&self, c: Color) -> Bitboard {
        self.by_color[c.index()]
    }

    /// 指定手番・駒種のBitboard
    #[inline]
    pub fn pieces(&self, c: Color, pt: PieceType) -> Bitboard {
        self.by_color[c.index()] & self.by_type[pt.index()]
    }

    /// 手駒を取得
    #[inline]
    pub fn hand_of(&self, c: Color) -> Hand {
        self.hand[c.index()]
    }

    /// 玉の位置を取得
    #[inline]
    pub fn king_square(&self, c: Color) -> Square {
        self.king_square[c.index()]
    }

    /// 手番を取得
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// 手数を取得
    #[inline]
    pub fn game_ply(&self) -> i32 {
        self.game_ply
    }

    /// 局面のハッシュキー
    #[inline]
    pub fn key(&self) -> Key {
        self.cur_state().key()
    }

    /// 手番側の玉に王手がかかっているか
    #[inline]
    pub fn in_check(&self) -> bool {
        !self.cur_state().checkers.is_empty()
    }

    /// 手番側の玉に王手している駒
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        self.cur_state().checkers
    }

    /// 指定升に利きを持つc側の駒の集合
    pub fn attackers_to(&self, c: Color, sq: Square) -> Bitboard {
        let occ = self.occupied();
        let golds = self.pieces(c, PieceType::Gold)
            | self.pieces(c, PieceType::ProPawn)
            | self.pieces(c, PieceType::ProSilver);

        // 近接駒は「sqから逆向きに利かせた集合」との交差で求める
        (pawn_effect(!c, sq) & self.pieces(c, PieceType::Pawn))
            | (silver_effect(!c, sq) & self.pieces(c, PieceType::Silver))
            | (gold_effect(!c, sq) & golds)
            | (king_effect(sq)
                & (self.pieces(c, PieceType::King)
                    | self.pieces(c, PieceType::Horse)
                    | self.pieces(c, PieceType::Dragon)))
            | (bishop_effect(sq, occ)
                & (self.pieces(c, PieceType::Bishop) | self.pieces(c, PieceType::Horse)))
            | (rook_effect(sq, occ)
                & (self.pieces(c, PieceType::Rook) | self.pieces(c, PieceType::Dragon)))
    }

    // ========== 駒の配置 ==========

    pub(super) fn put_piece(&mut self, pc: Piece, sq: Square) {
        debug_assert!(self.board[sq.index()].is_none());
        self.board[sq.index()] = pc;
        self.by_type[pc.piece_type().index()] |= Bitboard::from_square(sq);
        self.by_color[pc.color().index()] |= Bitboard::from_square(sq);
    }

    pub(super) fn remove_piece(&mut self, pc: Piece, sq: Square) {
        debug_assert!(self.board[sq.index()] == pc);
        self.board[sq.index()] = Piece::NONE;
        self.by_type[pc.piece_type().index()] =
            self.by_type[pc.piece_type().index()].without(sq);
        self.by_color[pc.color().index()] = self.by_color[pc.color().index()].without(sq);
    }

    fn push_state(&mut self, st: StateInfo) {
        let next = self.state_idx + 1;
        if self.state_stack.len() > next {
            self.state_stack[next] = st;
        } else {
            self.state_stack.push(st);
        }
        self.state_idx = next;
    }

    // ========== 指し手の実行 ==========

    /// 局面を1手進める
    ///
    /// `m` は合法手でなければならない。`undo_move` と必ず対で呼ぶこと。
    pub fn do_move(&mut self, m: Move) {
        let us = self.side_to_move;
        let them = !us;

        let mut st = StateInfo::new();
        st.board_key = self.cur_state().board_key;
        st.hand_key = self.cur_state().hand_key;
        st.continuous_check = self.cur_state().continuous_check;
        st.previous = Some(self.state_idx);
        st.last_move = m;

        if m.is_drop() {
            let pt = m.drop_piece_type();
            let to = m.to();
            let pc = Piece::new(us, pt);
            self.hand[us.index()] = self.hand[us.index()].sub(pt);
            st.hand_key = st.hand_key.wrapping_sub(zobrist_hand(us, pt));
            self.put_piece(pc, to);
            st.board_key ^= zobrist_psq(pc, to);
        } else {
            let from = m.from();
            let to = m.to();
            let pc = self.board[from.index()];
            debug_assert!(pc.is_some() && pc.color() == us);

            self.remove_piece(pc, from);
            st.board_key ^= zobrist_psq(pc, from);

            let captured = self.board[to.index()];
            if captured.is_some() {
                debug_assert!(captured.color() == them);
                self.remove_piece(captured, to);
                st.board_key ^= zobrist_psq(captured, to);
                let hpt = captured.piece_type().unpromote();
                self.hand[us.index()] = self.hand[us.index()].add(hpt);
                st.hand_key = st.hand_key.wrapping_add(zobrist_hand(us, hpt));
                st.captured_piece = captured;
            }

            let placed = if m.is_promote() {
                debug_assert!(pc.piece_type().can_promote());
                pc.promote().unwrap_or(pc)
            } else {
                pc
            };
            self.put_piece(placed, to);
            st.board_key ^= zobrist_psq(placed, to);

            if placed.piece_type() == PieceType::King {
                self.king_square[us.index()] = to;
            }
        }

        self.side_to_move = them;
        st.board_key ^= zobrist_side();
        self.game_ply += 1;

        st.hand_snapshot = self.hand;
        st.checkers = self.attackers_to(us, self.king_square[them.index()]);
        st.continuous_check[us.index()] = if st.checkers.is_empty() {
            0
        } else {
            st.continuous_check[us.index()] + 2
        };

        self.push_state(st);
    }

    /// 局面を1手戻す
    pub fn undo_move(&mut self, m: Move) {
        debug_assert!(self.cur_state().previous.is_some());
        debug_assert!(self.cur_state().last_move == m);
        let us = !self.side_to_move;
        let captured = self.cur_state().captured_piece;
        let prev = self.cur_state().previous.unwrap_or(0);

        self.side_to_move = us;
        self.game_ply -= 1;

        if m.is_drop() {
            let pt = m.drop_piece_type();
            let to = m.to();
            self.remove_piece(Piece::new(us, pt), to);
            self.hand[us.index()] = self.hand[us.index()].add(pt);
        } else {
            let from = m.from();
            let to = m.to();
            let moved = self.board[to.index()];
            let orig = if m.is_promote() { moved.unpromote() } else { moved };

            self.remove_piece(moved, to);
            self.put_piece(orig, from);
            if orig.piece_type() == PieceType::King {
                self.king_square[us.index()] = from;
            }
            if captured.is_some() {
                self.put_piece(captured, to);
                self.hand[us.index()] =
                    self.hand[us.index()].sub(captured.piece_type().unpromote());
            }
        }

        self.state_idx = prev;
    }

    // ========== 千日手判定 ==========

    /// 千日手/優劣局面の判定
    ///
    /// 現局面から2手ずつ`max_ply`手まで遡り、盤面キーが一致する局面を探す。
    /// 手駒まで一致すれば千日手（連続王手なら勝敗あり）、盤面のみ一致なら
    /// 手駒の優劣で優等/劣等局面を返す。
    pub fn is_repetition(&self, max_ply: i32) -> RepetitionState {
        let cur = self.cur_state();
        let us = self.side_to_move;
        let them = !us;

        let mut dist = 2;
        let mut idx_opt = cur.previous.and_then(|i| self.state_stack[i].previous);
        while dist <= max_ply {
            let Some(idx) = idx_opt else { break };
            let st = &self.state_stack[idx];

            if st.board_key == cur.board_key {
                if st.hand_snapshot == cur.hand_snapshot {
                    // 連続王手の千日手は王手をかけ続けた側の負け
                    if cur.continuous_check[us.index()] >= dist {
                        return RepetitionState::Lose;
                    }
                    if cur.continuous_check[them.index()] >= dist {
                        return RepetitionState::Win;
                    }
                    return RepetitionState::Draw;
                }
                // 盤面が同じで手駒だけが違う
                let ours = cur.hand_snapshot[us.index()];
                let past = st.hand_snapshot[us.index()];
                if ours.is_superior_or_equal(past) {
                    return RepetitionState::Superior;
                }
                if past.is_superior_or_equal(ours) {
                    return RepetitionState::Inferior;
                }
            }

            idx_opt = self.state_stack[idx].previous.and_then(|i| self.state_stack[i].previous);
            dist += 2;
        }

        RepetitionState::None
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SFEN_STARTPOS;

    #[test]
    fn test_position_startpos_board() {
        let pos = Position::startpos();
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.king_square(Color::Black), Square::from_usi("5e").unwrap());
        assert_eq!(pos.king_square(Color::White), Square::from_usi("1a").unwrap());
        assert_eq!(pos.piece_on(Square::from_usi("5e").unwrap()), Piece::B_KING);
        assert_eq!(pos.piece_on(Square::from_usi("5a").unwrap()), Piece::W_ROOK);
        assert_eq!(pos.piece_on(Square::from_usi("5d").unwrap()), Piece::B_PAWN);
        assert_eq!(pos.piece_on(Square::from_usi("1b").unwrap()), Piece::W_PAWN);
        assert_eq!(pos.piece_on(Square::SQ_33), Piece::NONE);
        assert!(pos.hand_of(Color::Black).is_empty());
        assert!(pos.hand_of(Color::White).is_empty());
        assert!(!pos.in_check());
    }

    #[test]
    fn test_position_do_undo_restores_state() {
        let mut pos = Position::startpos();
        let key = pos.key();
        let sfen = pos.sfen();

        let m = Move::from_usi("5d5c").unwrap();
        pos.do_move(m);
        assert_eq!(pos.side_to_move(), Color::White);
        assert_ne!(pos.key(), key);

        pos.undo_move(m);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.key(), key);
        assert_eq!(pos.sfen(), sfen);
    }

    #[test]
    fn test_position_capture_goes_to_hand() {
        // 先手の飛で後手の歩を取る局面を作る
        let mut pos = Position::new();
        pos.set_sfen("4k/5/5/p4/R3K b - 1").unwrap();
        let m = Move::from_usi("5e5d").unwrap();
        assert_eq!(pos.piece_on(Square::from_usi("5d").unwrap()), Piece::W_PAWN);

        pos.do_move(m);
        assert_eq!(pos.hand_of(Color::Black).count(PieceType::Pawn), 1);
        assert_eq!(pos.piece_on(Square::from_usi("5d").unwrap()), Piece::B_ROOK);

        pos.undo_move(m);
        assert!(pos.hand_of(Color::Black).is_empty());
        assert_eq!(pos.piece_on(Square::from_usi("5d").unwrap()), Piece::W_PAWN);
        assert_eq!(pos.piece_on(Square::from_usi("5e").unwrap()), Piece::B_ROOK);
    }

    #[test]
    fn test_position_promotion() {
        let mut pos = Position::new();
        pos.set_sfen("4k/P4/5/5/4K b - 1").unwrap();
        let m = Move::from_usi("5b5a+").unwrap();
        pos.do_move(m);
        assert_eq!(pos.piece_on(Square::from_usi("5a").unwrap()), Piece::B_PRO_PAWN);
        pos.undo_move(m);
        assert_eq!(pos.piece_on(Square::from_usi("5b").unwrap()), Piece::B_PAWN);
    }

    #[test]
    fn test_position_key_includes_hand() {
        // 盤面が同じでも手駒が違えばキーは異なる
        let mut pos1 = Position::new();
        pos1.set_sfen("rbsgk/4p/5/P4/KGSBR b - 1").unwrap();
        let mut pos2 = Position::new();
        pos2.set_sfen("rbsgk/4p/5/P4/KGSBR b P 1").unwrap();
        assert_ne!(pos1.key(), pos2.key());
    }

    #[test]
    fn test_position_attackers_to() {
        let pos = Position::startpos();
        // 5dには玉(5e)と金(4e)が利いている
        let bb = pos.attackers_to(Color::Black, Square::from_usi("5d").unwrap());
        assert!(bb.contains(Square::from_usi("5e").unwrap()));
        assert!(bb.contains(Square::from_usi("4e").unwrap()));
        assert_eq!(bb.pop_count(), 2);

        // 5cに利くのは歩(5d)のみ
        let bb = pos.attackers_to(Color::Black, Square::from_usi("5c").unwrap());
        assert!(bb.contains(Square::from_usi("5d").unwrap()));
        assert_eq!(bb.pop_count(), 1);

        // 角(2e)は3dを経由して4cまで利く
        let bb = pos.attackers_to(Color::Black, Square::from_usi("4c").unwrap());
        assert!(bb.contains(Square::from_usi("2e").unwrap()));
    }

    #[test]
    fn test_position_repetition_draw() {
        let mut pos = Position::startpos();
        assert_eq!(pos.is_repetition(16), RepetitionState::None);

        // 金を往復させて同一局面に戻す（4手で1サイクル）
        for usi in ["4e4d", "2a2b", "4d4e", "2b2a"] {
            pos.do_move(Move::from_usi(usi).unwrap());
        }
        assert_eq!(pos.is_repetition(16), RepetitionState::Draw);
    }

    #[test]
    fn test_position_repetition_horizon() {
        let mut pos = Position::startpos();
        for usi in ["4e4d", "2a2b", "4d4e", "2b2a"] {
            pos.do_move(Move::from_usi(usi).unwrap());
        }
        // 4手前の繰り返しなので、地平線2では検出されない
        assert_eq!(pos.is_repetition(2), RepetitionState::None);
        assert_eq!(pos.is_repetition(4), RepetitionState::Draw);
    }

    #[test]
    fn test_position_sfen_roundtrip() {
        let mut pos = Position::new();
        pos.set_sfen(SFEN_STARTPOS).unwrap();
        assert_eq!(pos.sfen(), SFEN_STARTPOS);
    }
}
