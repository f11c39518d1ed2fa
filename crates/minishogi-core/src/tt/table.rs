//! TranspositionTable本体
//!
//! - Cluster: エントリのグループ
//! - TranspositionTable: テーブル本体
//! - probe/write操作

use super::entry::{TTData, TTEntry};
use super::{GENERATION_STALE, TT_ENTRY_NB};
use crate::types::{Bound, Depth, Key, Move, Value};

/// クラスター構造
/// 同じハッシュインデックスに対して複数のエントリを持つ。
/// 12bytes × 5 + 4 = 64bytes（キャッシュライン1本に収まる）
#[derive(Clone, Copy)]
#[repr(C, align(64))]
pub struct Cluster {
    entries: [TTEntry; TT_ENTRY_NB],
    _padding: [u8; 4],
}

impl Cluster {
    const fn new() -> Self {
        Self {
            entries: [TTEntry::new(); TT_ENTRY_NB],
            _padding: [0; 4],
        }
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Self::new()
    }
}

// クラスターは64バイトであることを保証（キャッシュラインサイズ）
const _: () = assert!(std::mem::size_of::<Cluster>() == 64);

/// 置換表
pub struct TranspositionTable {
    /// クラスターの配列
    table: Vec<Cluster>,
    /// クラスター数
    cluster_count: usize,
    /// 世代カウンター（mod 128）
    generation8: u8,
}

impl TranspositionTable {
    /// 新しい置換表を作成（サイズはMB単位）
    pub fn new(mb_size: usize) -> Self {
        let mut tt = Self {
            table: Vec::new(),
            cluster_count: 0,
            generation8: 0,
        };
        tt.resize(mb_size);
        tt
    }

    /// サイズを変更
    ///
    /// 同じサイズなら何もしない。確保に失敗した場合はログに残して
    /// cluster_count = 0 とし、以後のprobeはミスとnullライターを返す。
    pub fn resize(&mut self, mb_size: usize) {
        let new_count = mb_size * 1024 * 1024 / std::mem::size_of::<Cluster>();
        if new_count == self.cluster_count {
            return;
        }

        self.table = Vec::new();
        if self.table.try_reserve_exact(new_count).is_err() {
            log::error!("Failed to allocate transposition table: {mb_size} MB");
            self.cluster_count = 0;
            return;
        }
        self.table.resize(new_count, Cluster::new());
        self.cluster_count = new_count;
    }

    /// クリア
    pub fn clear(&mut self) {
        for cluster in self.table.iter_mut() {
            *cluster = Cluster::new();
        }
    }

    /// 新しい探索を開始（世代を進める）
    pub fn new_search(&mut self) {
        self.generation8 = (self.generation8 + 1) & 0x7f;
    }

    /// 現在の世代を取得
    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation8
    }

    /// 置換表の使用率を1000分率で返す
    ///
    /// 先頭1000クラスターのサンプリングによる推計。
    pub fn hashfull(&self) -> i32 {
        if self.cluster_count == 0 {
            return 0;
        }
        let sample = 1000.min(self.cluster_count);
        let mut count = 0;
        for cluster in self.table.iter().take(sample) {
            for entry in &cluster.entries {
                if !entry.is_empty() {
                    count += 1;
                }
            }
        }
        count * 1000 / (sample * TT_ENTRY_NB) as i32
    }

    /// 指定されたkeyで置換表を検索
    ///
    /// ヒットした場合はそのエントリのデータとライターを返す。
    /// ミスした場合は置換候補（空き → 古い世代 → 最小深さの順で選択）への
    /// ライターとダミーデータを返す。
    pub fn probe(&self, key: Key) -> ProbeResult {
        if self.cluster_count == 0 {
            return ProbeResult {
                found: false,
                data: TTData::EMPTY,
                writer: TTWriter::null(),
            };
        }

        let cluster = &self.table[(key % self.cluster_count as u64) as usize];
        let key32 = (key >> 32) as u32;

        // クラスター内を線形検索
        for entry in &cluster.entries {
            if entry.key32() == key32 && !entry.is_empty() {
                return ProbeResult {
                    found: true,
                    data: entry.read(),
                    writer: TTWriter::new(entry as *const TTEntry as *mut TTEntry),
                };
            }
        }

        // 置換するエントリを選択
        let mut replace = &cluster.entries[0];
        for entry in &cluster.entries {
            // 1. 空のエントリを最優先
            if entry.is_empty() {
                replace = entry;
                break;
            }
            // 2. 十分古い世代のエントリを次に優先
            if entry.relative_age(self.generation8) >= GENERATION_STALE {
                replace = entry;
                break;
            }
            // 3. より浅い深さのエントリを選択
            if entry.depth8() < replace.depth8() {
                replace = entry;
            }
        }

        ProbeResult {
            found: false,
            data: TTData::EMPTY,
            writer: TTWriter::new(replace as *const TTEntry as *mut TTEntry),
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(super::DEFAULT_TT_SIZE_MB)
    }
}

/// probe結果
pub struct ProbeResult {
    /// ヒットしたか
    pub found: bool,
    /// 読み取ったデータ
    pub data: TTData,
    /// 書き込み用ライター
    pub writer: TTWriter,
}

/// 置換表への書き込み用ライター
///
/// probe()経由でのみ生成される。エントリがnullの場合（テーブル未確保）、
/// writeは何もしない。
pub struct TTWriter {
    entry: *mut TTEntry,
}

impl TTWriter {
    fn null() -> Self {
        Self {
            entry: std::ptr::null_mut(),
        }
    }

    fn new(entry: *mut TTEntry) -> Self {
        Self { entry }
    }

    /// エントリに書き込む
    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &self,
        key: Key,
        value: Value,
        is_pv: bool,
        bound: Bound,
        depth: Depth,
        mv: Move,
        eval: Value,
        generation8: u8,
    ) {
        if self.entry.is_null() {
            return;
        }
        // SAFETY: probe()が返した有効なエントリを指しており、探索は
        // 単一スレッドで行われるため他からの同時アクセスはない
        unsafe {
            (*self.entry).save((key >> 32) as u32, value, is_pv, bound, depth, mv, eval, generation8);
        }
    }
}
