//! 探索深さ（Depth）

/// 探索深さ
pub type Depth = i32;

/// 最大探索深度
pub const MAX_PLY: i32 = 128;

/// TT格納用オフセット
///
/// `depth8 = depth - DEPTH_ENTRY_OFFSET` として格納するので、
/// 空エントリ（depth8 == 0）と実際の探索結果が衝突しない。
pub const DEPTH_ENTRY_OFFSET: Depth = -3;

// 定数間の関係をコンパイル時に検証する
const _: () = {
    assert!(MAX_PLY == 128);
    assert!(DEPTH_ENTRY_OFFSET < 0);
};
