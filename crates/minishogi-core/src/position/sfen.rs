//! SFEN形式の解析・出力

use crate::types::{Color, File, Piece, PieceType, Rank, Square};

use super::pos::Position;
use super::state::StateInfo;
use super::zobrist::{zobrist_hand, zobrist_psq, zobrist_side};

/// 5五将棋の平手初期局面のSFEN
pub const SFEN_STARTPOS: &str = "rbsgk/4p/5/P4/KGSBR b - 1";

/// SFENパースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SfenError {
    /// 盤面の形式が不正
    Board(String),
    /// 手番の形式が不正
    SideToMove(String),
    /// 手駒の形式が不正
    Hand(String),
    /// 手数の形式が不正
    Ply(String),
}

impl std::fmt::Display for SfenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SfenError::Board(s) => write!(f, "Invalid board: {s}"),
            SfenError::SideToMove(s) => write!(f, "Invalid side to move: {s}"),
            SfenError::Hand(s) => write!(f, "Invalid hand: {s}"),
            SfenError::Ply(s) => write!(f, "Invalid ply: {s}"),
        }
    }
}

impl std::error::Error for SfenError {}

fn piece_from_sfen_char(c: char, promoted: bool) -> Option<Piece> {
    let color = if c.is_ascii_uppercase() { Color::Black } else { Color::White };
    let pt = PieceType::from_usi_char(c.to_ascii_uppercase())?;
    let pt = if promoted { pt.promote()? } else { pt };
    Some(Piece::new(color, pt))
}

fn piece_to_sfen_string(pc: Piece) -> String {
    let c = pc.piece_type().to_usi_char();
    let c = if pc.color() == Color::Black { c } else { c.to_ascii_lowercase() };
    if pc.piece_type().is_promoted() {
        format!("+{c}")
    } else {
        c.to_string()
    }
}

impl Position {
    /// 平手初期局面を生成
    pub fn startpos() -> Position {
        let mut pos = Position::new();
        // 定数SFENのパースは必ず成功する
        pos.set_sfen(SFEN_STARTPOS).expect("startpos sfen is valid");
        pos
    }

    /// SFEN文字列から局面を設定
    pub fn set_sfen(&mut self, sfen: &str) -> Result<(), SfenError> {
        *self = Position::new();

        let parts: Vec<&str> = sfen.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(SfenError::Board("SFEN must have at least 3 parts".to_string()));
        }

        // 盤面
        let rows: Vec<&str> = parts[0].split('/').collect();
        if rows.len() != Rank::NUM {
            return Err(SfenError::Board(format!("expected 5 rows: {}", parts[0])));
        }
        let mut kings = [0u32; Color::NUM];
        for (r, row) in rows.iter().enumerate() {
            let rank = Rank::from_u8(r as u8).ok_or_else(|| SfenError::Board(row.to_string()))?;
            // SFENの行は5筋から1筋の順
            let mut f: i32 = File::NUM as i32 - 1;
            let mut promoted = false;
            for c in row.chars() {
                if let Some(n) = c.to_digit(10) {
                    if promoted || n == 0 || n > 5 {
                        return Err(SfenError::Board(row.to_string()));
                    }
                    f -= n as i32;
                    continue;
                }
                if c == '+' {
                    if promoted {
                        return Err(SfenError::Board(row.to_string()));
                    }
                    promoted = true;
                    continue;
                }
                if f < 0 {
                    return Err(SfenError::Board(row.to_string()));
                }
                let file = File::from_u8(f as u8).ok_or_else(|| SfenError::Board(row.to_string()))?;
                let pc = piece_from_sfen_char(c, promoted)
                    .ok_or_else(|| SfenError::Board(format!("bad piece '{c}' in {row}")))?;
                let sq = Square::new(file, rank);
                self.put_piece(pc, sq);
                if pc.piece_type() == PieceType::King {
                    self.king_square[pc.color().index()] = sq;
                    kings[pc.color().index()] += 1;
                }
                promoted = false;
                f -= 1;
            }
            if f != -1 {
                return Err(SfenError::Board(format!("row has wrong width: {row}")));
            }
        }
        if kings != [1, 1] {
            return Err(SfenError::Board("each side must have exactly one king".to_string()));
        }

        // 手番
        self.side_to_move = match parts[1] {
            "b" => Color::Black,
            "w" => Color::White,
            s => return Err(SfenError::SideToMove(s.to_string())),
        };

        // 手駒
        if parts[2] != "-" {
            let mut count = 0u32;
            for c in parts[2].chars() {
                if let Some(n) = c.to_digit(10) {
                    count = count * 10 + n;
                    continue;
                }
                let color = if c.is_ascii_uppercase() { Color::Black } else { Color::White };
                let pt = PieceType::from_usi_char(c.to_ascii_uppercase())
                    .filter(|pt| !matches!(pt, PieceType::King))
                    .ok_or_else(|| SfenError::Hand(parts[2].to_string()))?;
                let n = if count == 0 { 1 } else { count };
                for _ in 0..n {
                    self.hand[color.index()] = self.hand[color.index()].add(pt);
                }
                count = 0;
            }
            if count != 0 {
                return Err(SfenError::Hand(parts[2].to_string()));
            }
        }

        // 手数（省略可）
        self.game_ply = match parts.get(3) {
            Some(s) => s.parse().map_err(|_| SfenError::Ply(s.to_string()))?,
            None => 1,
        };

        // ハッシュキーと王手情報を初期化
        let mut st = StateInfo::new();
        for sq in Square::all() {
            let pc = self.piece_on(sq);
            if pc.is_some() {
                st.board_key ^= zobrist_psq(pc, sq);
            }
        }
        if self.side_to_move == Color::White {
            st.board_key ^= zobrist_side();
        }
        for color in Color::ALL {
            for pt in PieceType::HAND_PIECES {
                let n = self.hand[color.index()].count(pt);
                for _ in 0..n {
                    st.hand_key = st.hand_key.wrapping_add(zobrist_hand(color, pt));
                }
            }
        }
        st.hand_snapshot = self.hand;
        let us = self.side_to_move;
        st.checkers = self.attackers_to(!us, self.king_square[us.index()]);
        self.state_stack = vec![st];
        self.state_idx = 0;

        Ok(())
    }

    /// 現局面のSFEN文字列を生成
    pub fn sfen(&self) -> String {
        let mut out = String::new();

        // 盤面
        for r in 0..Rank::NUM {
            if r > 0 {
                out.push('/');
            }
            let mut empties = 0;
            for f in (0..File::NUM).rev() {
                let sq = Square::new(
                    File::from_u8(f as u8).expect("file in range"),
                    Rank::from_u8(r as u8).expect("rank in range"),
                );
                let pc = self.piece_on(sq);
                if pc.is_none() {
                    empties += 1;
                } else {
                    if empties > 0 {
                        out.push_str(&empties.to_string());
                        empties = 0;
                    }
                    out.push_str(&piece_to_sfen_string(pc));
                }
            }
            if empties > 0 {
                out.push_str(&empties.to_string());
            }
        }

        // 手番
        out.push(' ');
        out.push(if self.side_to_move == Color::Black { 'b' } else { 'w' });

        // 手駒
        out.push(' ');
        if self.hand[0].is_empty() && self.hand[1].is_empty() {
            out.push('-');
        } else {
            // 慣例に従い飛角金銀歩の順、先手が先
            const HAND_ORDER: [PieceType; 5] = [
                PieceType::Rook,
                PieceType::Bishop,
                PieceType::Gold,
                PieceType::Silver,
                PieceType::Pawn,
            ];
            for color in Color::ALL {
                for pt in HAND_ORDER {
                    let n = self.hand[color.index()].count(pt);
                    if n == 0 {
                        continue;
                    }
                    if n > 1 {
                        out.push_str(&n.to_string());
                    }
                    let c = pt.to_usi_char();
                    out.push(if color == Color::Black { c } else { c.to_ascii_lowercase() });
                }
            }
        }

        // 手数
        out.push(' ');
        out.push_str(&self.game_ply.to_string());

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sfen_startpos_parse() {
        let mut pos = Position::new();
        assert!(pos.set_sfen(SFEN_STARTPOS).is_ok());
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.game_ply(), 1);
    }

    #[test]
    fn test_sfen_hand_parse() {
        let mut pos = Position::new();
        pos.set_sfen("4k/5/5/5/4K b 2Pb 1").unwrap();
        assert_eq!(pos.hand_of(Color::Black).count(PieceType::Pawn), 2);
        assert_eq!(pos.hand_of(Color::White).count(PieceType::Bishop), 1);
        assert_eq!(pos.sfen(), "4k/5/5/5/4K b 2Pb 1");
    }

    #[test]
    fn test_sfen_promoted_piece() {
        let mut pos = Position::new();
        pos.set_sfen("4k/+P4/5/5/4K b - 1").unwrap();
        assert_eq!(pos.piece_on(Square::from_usi("5b").unwrap()), Piece::B_PRO_PAWN);
        assert_eq!(pos.sfen(), "4k/+P4/5/5/4K b - 1");
    }

    #[test]
    fn test_sfen_errors() {
        let mut pos = Position::new();
        // 行数不足
        assert!(pos.set_sfen("5/5/5/5 b - 1").is_err());
        // 不正な駒
        assert!(pos.set_sfen("4k/5/5/5/3LK b - 1").is_err());
        // 不正な手番
        assert!(pos.set_sfen("4k/5/5/5/4K x - 1").is_err());
        // 玉がない
        assert!(pos.set_sfen("5/5/5/5/4K b - 1").is_err());
        // 行の幅が不正
        assert!(pos.set_sfen("4k/6/5/5/4K b - 1").is_err());
        // 不正な手数
        assert!(pos.set_sfen("4k/5/5/5/4K b - x").is_err());
    }

    #[test]
    fn test_sfen_white_to_move_changes_key() {
        let mut pos1 = Position::new();
        pos1.set_sfen("4k/5/5/5/4K b - 1").unwrap();
        let mut pos2 = Position::new();
        pos2.set_sfen("4k/5/5/5/4K w - 1").unwrap();
        assert_ne!(pos1.key(), pos2.key());
    }
}
