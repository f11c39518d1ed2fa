//! 千日手状態（RepetitionState）

/// 千日手状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepetitionState {
    /// 千日手ではない
    #[default]
    None,
    /// 通常の千日手（引き分け）
    Draw,
    /// 連続王手の千日手で勝ち
    Win,
    /// 連続王手の千日手で負け
    Lose,
    /// 優等局面
    Superior,
    /// 劣等局面
    Inferior,
}

impl RepetitionState {
    /// 同一局面の繰り返しかどうか（通常の千日手または連続王手）
    #[inline]
    pub const fn is_repetition(self) -> bool {
        matches!(self, RepetitionState::Draw | RepetitionState::Win | RepetitionState::Lose)
    }
}
