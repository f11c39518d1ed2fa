//! 置換表モジュール
//!
//! 探索結果をキャッシュする置換表（Transposition Table）。
//!
//! - `TTEntry`: エントリ（12バイト、32bitキー）
//! - `Cluster`: エントリのグループ（5エントリで64バイト）
//! - `TranspositionTable`: テーブル本体
//! - 世代管理
//!
//! クラスターインデックスは64bitキーの剰余で決定し、クラスター内
//! マッチングに上位32bitを使用する。

mod entry;
mod table;

pub use entry::{TTData, TTEntry};
pub use table::{ProbeResult, TTWriter, TranspositionTable};

/// クラスターサイズ（エントリ数）
/// 12bytes × 5 + 4padding = 64bytes/クラスター
pub const TT_ENTRY_NB: usize = 5;

/// genBound8のbit割り当て:
/// - bit 7:   PVフラグ
/// - bit 5-6: Bound
/// - bit 0-4: 世代（mod 32）
pub const GENERATION_BITS: u32 = 5;
/// 世代の周期
pub const GENERATION_CYCLE: u16 = 1 << GENERATION_BITS;
/// genBound8から世代を取り出すマスク
pub const GENERATION_MASK: u8 = (1 << GENERATION_BITS) - 1;
/// この世代差以上離れたエントリは置換候補とみなす（周期の半分）
pub const GENERATION_STALE: u8 = 1 << (GENERATION_BITS - 1);

/// 置換表の既定サイズ[MB]
pub const DEFAULT_TT_SIZE_MB: usize = 16;
