//! 探索エンジン本体
//!
//! 反復深化のドライバと、置換表付きアルファベータ探索の本体。
//! 探索は単一スレッドで行い、時間制御用のタイマースレッドだけが
//! 停止フラグを立てる。

use std::io::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::eval;
use crate::movegen::{generate_legal, MoveList};
use crate::position::Position;
use crate::tt::{TranspositionTable, DEFAULT_TT_SIZE_MB, GENERATION_CYCLE, GENERATION_MASK};
use crate::types::{Bound, Depth, Move, RepetitionState, Value};

use super::limits::LimitsType;
use super::root_moves::{root_move_ordering, RootMove};
use super::{draw_value, DEFAULT_SEARCH_DEPTH, MAX_SEARCH_DEPTH, REPETITION_PLY};

/// 秒読みに対する安全マージン[ms]
const TIME_MARGIN_MS: i64 = 150;

/// タイマースレッドのポーリング間隔[ms]
const TIMER_POLL_MS: u64 = 10;

/// PV格納用バッファ
type PvLine = SmallVec<[Move; 8]>;

/// 探索エンジン
///
/// 置換表・停止フラグ・ノードカウンタなど探索の状態を1つにまとめた
/// ハンドル。`start_thinking`が探索の入口になる。
pub struct SearchEngine {
    /// 置換表
    tt: TranspositionTable,
    /// 持ち時間設定など
    limits: LimitsType,
    /// 今回のgoコマンドでの探索ノード数
    nodes: AtomicU64,
    /// 探索中にこれがtrueになったら探索を即座に終了すること
    stop: Arc<AtomicBool>,
    /// 探索開始局面で思考対象とする指し手の集合
    root_moves: Vec<RootMove>,
    /// 探索開始時刻
    start_time: Instant,
}

impl SearchEngine {
    /// 新しい探索エンジンを作成（置換表サイズはMB単位）
    pub fn new(tt_mb: usize) -> Self {
        SearchEngine {
            tt: TranspositionTable::new(tt_mb),
            limits: LimitsType::default(),
            nodes: AtomicU64::new(0),
            stop: Arc::new(AtomicBool::new(false)),
            root_moves: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// 既定サイズの置換表で作成
    pub fn with_default_tt() -> Self {
        Self::new(DEFAULT_TT_SIZE_MB)
    }

    /// isreadyの応答で呼ばれる。置換表をクリアする。
    pub fn clear(&mut self) {
        self.tt.clear();
    }

    /// 置換表のサイズを変更[MB]
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt.resize(mb);
    }

    /// 停止フラグの共有ハンドルを取得
    ///
    /// stopコマンドの処理側はこれ経由でフラグを立てる。
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// 探索したノード数
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// ルート指し手（直近の探索結果、スコア降順）
    pub fn root_moves(&self) -> &[RootMove] {
        &self.root_moves
    }

    /// 直近の探索の最善手
    pub fn best_move(&self) -> Move {
        match self.root_moves.first() {
            Some(rm) => rm.pv[0],
            None => Move::RESIGN,
        }
    }

    /// 探索を開始する
    ///
    /// rootの合法手を生成し、反復深化探索を実行して`bestmove`を出力する。
    pub fn start_thinking(&mut self, pos: &mut Position, limits: LimitsType) {
        self.limits = limits;
        self.nodes.store(0, Ordering::Relaxed);
        self.stop.store(false, Ordering::Relaxed);

        self.root_moves.clear();
        let mut list = MoveList::new();
        generate_legal(pos, &mut list);
        for &m in &list {
            self.root_moves.push(RootMove::new(m));
        }

        self.search(pos);
    }

    /// 探索本体
    fn search(&mut self, pos: &mut Position) {
        // 合法手が存在しない
        if self.root_moves.is_empty() {
            self.stop.store(true, Ordering::Relaxed);
            usi_print("bestmove resign");
            return;
        }

        // 置換表の新しい探索セッションを開始
        self.tt.new_search();

        self.start_time = Instant::now();
        let us = pos.side_to_move();

        // タイマースレッドの起動（時間制御が必要な場合のみ）
        // 秒読みから終了時刻を計算し、安全マージンを持たせる
        let timer_thread = if self.limits.use_time_management() {
            let end_time = self.limits.byoyomi[us.index()] - TIME_MARGIN_MS;
            let stop = Arc::clone(&self.stop);
            let start = self.start_time;
            Some(thread::spawn(move || {
                while !stop.load(Ordering::Relaxed)
                    && (start.elapsed().as_millis() as i64) < end_time
                {
                    thread::sleep(Duration::from_millis(TIMER_POLL_MS));
                }
                stop.store(true, Ordering::Relaxed);
            }))
        } else {
            None
        };

        let max_depth = if self.limits.depth > 0 {
            self.limits.depth.min(MAX_SEARCH_DEPTH)
        } else {
            DEFAULT_SEARCH_DEPTH
        };

        // 反復深化探索
        for depth in 1..=max_depth {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            // ノード数制限のチェック
            if self.limits.nodes > 0 && self.nodes() >= self.limits.nodes {
                self.stop.store(true, Ordering::Relaxed);
                break;
            }

            // ルートノードぶんのカウント
            self.nodes.fetch_add(1, Ordering::Relaxed);

            for rm in self.root_moves.iter_mut() {
                rm.previous_score = rm.score;
            }

            let mut current_max = -Value::INFINITE;
            for i in 0..self.root_moves.len() {
                let m = self.root_moves[i].pv[0];
                pos.do_move(m);

                let mut child_pv = PvLine::new();
                let rep = pos.is_repetition(REPETITION_PLY);
                let value = if rep != RepetitionState::None {
                    Some(-draw_value(rep, pos.side_to_move()))
                } else {
                    let v = self.alphabeta(
                        pos,
                        &mut child_pv,
                        -Value::INFINITE,
                        Value::INFINITE,
                        depth - 1,
                        1,
                    );
                    if v == Value::NONE {
                        None
                    } else {
                        Some(-v)
                    }
                };

                pos.undo_move(m);

                // 中断時の値はrootMovesに反映しない
                let Some(value) = value else { continue };
                if self.stop.load(Ordering::Relaxed) {
                    continue;
                }

                let rm = &mut self.root_moves[i];
                rm.score = value;
                rm.sel_depth = depth;
                rm.pv.truncate(1);
                rm.pv.extend_from_slice(&child_pv);

                if value > current_max {
                    current_max = value;
                    self.print_info(depth, i);
                }
            }
        }

        // 評価値順にrootMovesをソートし、先頭を最善手とする
        self.root_moves.sort_by(root_move_ordering);
        let best_move = self.best_move();

        // タイマースレッド終了
        self.stop.store(true, Ordering::Relaxed);
        if let Some(t) = timer_thread {
            let _ = t.join();
        }

        usi_print(&format!("bestmove {}", best_move.to_usi()));
    }

    /// アルファ・ベータ法による探索
    ///
    /// 中断時は`Value::NONE`を返す。呼び出し側はこの値を伝播させ、
    /// rootの結果に反映してはならない。
    fn alphabeta(
        &mut self,
        pos: &mut Position,
        pv: &mut PvLine,
        mut alpha: Value,
        beta: Value,
        depth: Depth,
        ply_from_root: i32,
    ) -> Value {
        // 千日手判定
        let rep = pos.is_repetition(REPETITION_PLY);
        if rep != RepetitionState::None {
            pv.clear();
            return draw_value(rep, pos.side_to_move());
        }

        // 探索ノード数をインクリメント。ノード数制限はここで検知して
        // 停止フラグを立てる。
        let nodes = self.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        if self.limits.nodes > 0 && nodes >= self.limits.nodes {
            self.stop.store(true, Ordering::Relaxed);
        }

        // 探索打ち切り
        if self.stop.load(Ordering::Relaxed) {
            pv.clear();
            return Value::NONE;
        }

        // 置換表を参照
        let key = pos.key();
        let probe = self.tt.probe(key);
        let ttd = probe.data;
        if probe.found {
            // 世代チェック: 現在か前の世代のエントリのみカットに使う
            let age = ((GENERATION_CYCLE + self.tt.generation() as u16 - ttd.generation as u16)
                & GENERATION_MASK as u16) as u8;
            if age <= 1 {
                match ttd.bound {
                    Bound::Exact => {
                        pv.clear();
                        if ttd.mv.is_some() {
                            pv.push(ttd.mv);
                        }
                        return ttd.value;
                    }
                    Bound::Lower if ttd.value >= beta => {
                        pv.clear();
                        if ttd.mv.is_some() {
                            pv.push(ttd.mv);
                        }
                        return ttd.value;
                    }
                    Bound::Upper if ttd.value <= alpha => {
                        pv.clear();
                        return ttd.value;
                    }
                    _ => {}
                }
            } else if ttd.depth >= depth - 1 && ttd.bound == Bound::Exact {
                // 古い世代でも、深さが1手浅い程度までのEXACTは許容する
                pv.clear();
                if ttd.mv.is_some() {
                    pv.push(ttd.mv);
                }
                return ttd.value;
            }
        }

        // 探索深さに達したら評価関数を呼び出して終了
        if depth == 0 {
            pv.clear();
            return eval::evaluate(pos);
        }

        let mut list = MoveList::new();
        generate_legal(pos, &mut list);
        if list.is_empty() {
            // 合法手が存在しない -> 詰み
            pv.clear();
            return Value::mated_in(ply_from_root);
        }

        // 探索順序の最適化: 置換表の最善手を最初に
        let tt_move = if probe.found && list.contains(ttd.mv) {
            ttd.mv
        } else {
            Move::NONE
        };
        let mut ordered: SmallVec<[Move; 64]> = SmallVec::new();
        if tt_move.is_some() {
            ordered.push(tt_move);
        }
        for &m in &list {
            if m != tt_move {
                ordered.push(m);
            }
        }

        let alpha_orig = alpha;
        let mut max_value = -Value::INFINITE;
        let mut best_pv = PvLine::new();
        let mut aborted = false;

        for m in ordered {
            pos.do_move(m);
            let mut child_pv = PvLine::new();
            let v = self.alphabeta(pos, &mut child_pv, -beta, -alpha, depth - 1, ply_from_root + 1);
            pos.undo_move(m);

            // 子ノードが中断された
            if v == Value::NONE {
                aborted = true;
                break;
            }
            let value = -v;

            // ベータカット
            if value >= beta {
                best_pv.clear();
                best_pv.push(m);
                best_pv.extend_from_slice(&child_pv);
                max_value = value;
                break;
            }

            if value > max_value {
                max_value = value;
                best_pv.clear();
                best_pv.push(m);
                best_pv.extend_from_slice(&child_pv);
            }

            if value > alpha {
                alpha = value;
            }

            if self.stop.load(Ordering::Relaxed) {
                aborted = true;
                break;
            }
        }

        // 置換表に探索結果を保存
        if !aborted && !self.stop.load(Ordering::Relaxed) {
            let bound = if max_value >= beta {
                Bound::Lower
            } else if max_value <= alpha_orig {
                Bound::Upper
            } else {
                Bound::Exact
            };
            let best_move = best_pv.first().copied().unwrap_or(Move::NONE);
            let eval_value = eval::evaluate(pos);
            probe.writer.write(
                key,
                max_value,
                true,
                bound,
                depth,
                best_move,
                eval_value,
                self.tt.generation(),
            );
        }

        pv.clear();
        pv.extend_from_slice(&best_pv);
        if max_value == -Value::INFINITE {
            return Value::NONE;
        }
        max_value
    }

    /// USIのinfo行を出力
    fn print_info(&self, depth: Depth, root_index: usize) {
        let rm = &self.root_moves[root_index];
        let elapsed = self.start_time.elapsed().as_millis();
        let pv: Vec<String> = rm.pv.iter().map(|m| m.to_usi()).collect();
        usi_print(&format!(
            "info depth {} seldepth {} score cp {} nodes {} time {} pv {}",
            depth,
            rm.sel_depth,
            rm.score.raw(),
            self.nodes(),
            elapsed,
            pv.join(" ")
        ));
    }
}

/// USIプロトコル行を出力してフラッシュする
///
/// パイプ経由だとstdoutがブロックバッファリングされるので、
/// 1行ごとに明示的にフラッシュする。
fn usi_print(line: &str) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{line}");
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn limits_with_depth(depth: i32) -> LimitsType {
        LimitsType {
            depth,
            ..LimitsType::default()
        }
    }

    #[test]
    fn test_search_depth1_from_startpos() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::startpos();
        engine.start_thinking(&mut pos, limits_with_depth(1));

        // 最善手は合法手のどれかで、PVは1手
        let best = engine.best_move();
        assert!(best.is_normal());
        assert_eq!(engine.root_moves()[0].pv.len(), 1);

        // ノード数 = 合法手の数 + ルートノード
        assert_eq!(engine.nodes(), 14 + 1);
    }

    #[test]
    fn test_search_no_legal_moves_resigns() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::new();
        // 後手番で詰んでいる局面
        pos.set_sfen("4k/2+R1P/5/5/K4 w - 1").unwrap();
        engine.start_thinking(&mut pos, limits_with_depth(3));
        assert_eq!(engine.best_move(), Move::RESIGN);
    }

    #[test]
    fn test_alphabeta_mated_position() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::new();
        pos.set_sfen("4k/2+R1P/5/5/K4 w - 1").unwrap();

        // 合法手がないので即詰みのスコアが返る
        let mut pv = PvLine::new();
        let v = engine.alphabeta(&mut pos, &mut pv, -Value::INFINITE, Value::INFINITE, 3, 0);
        assert_eq!(v, Value::mated_in(0));
        assert!(pv.is_empty());
    }

    #[test]
    fn test_alphabeta_depth0_returns_eval() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::startpos();

        let mut pv = PvLine::new();
        let v = engine.alphabeta(&mut pos, &mut pv, -Value::INFINITE, Value::INFINITE, 0, 0);
        assert_eq!(v, eval::evaluate(&pos));
        assert!(pv.is_empty());
    }

    #[test]
    fn test_search_deterministic_after_tt_clear() {
        let mut engine = SearchEngine::new(1);

        let mut pos = Position::startpos();
        engine.start_thinking(&mut pos, limits_with_depth(4));
        let best1 = engine.best_move();
        let score1 = engine.root_moves()[0].score;

        engine.clear();
        let mut pos = Position::startpos();
        engine.start_thinking(&mut pos, limits_with_depth(4));
        assert_eq!(engine.best_move(), best1);
        assert_eq!(engine.root_moves()[0].score, score1);
    }

    #[test]
    fn test_search_finds_mate_in_one() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::new();
        // 先手番、+R3aまたはG2bで詰み
        pos.set_sfen("4k/5/2+RG1/5/K4 b - 1").unwrap();
        engine.start_thinking(&mut pos, limits_with_depth(3));

        assert_eq!(engine.root_moves()[0].score, Value::mate_in(1));
        let best = engine.best_move().to_usi();
        assert!(best == "3c3a" || best == "2c2b", "unexpected bestmove {best}");
    }

    #[test]
    fn test_search_node_limit() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::startpos();
        let limits = LimitsType {
            nodes: 1000,
            ..LimitsType::default()
        };
        engine.start_thinking(&mut pos, limits);

        // ノード数は上限 + 合法手数を超えない
        assert!(engine.nodes() <= 1000 + 14);
        assert!(engine.best_move().is_normal());
    }

    #[test]
    fn test_search_time_stop() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::startpos();
        let mut limits = LimitsType::default();
        limits.byoyomi = [250, 250];

        let start = Instant::now();
        engine.start_thinking(&mut pos, limits);
        let elapsed = start.elapsed();

        assert!(elapsed < Duration::from_millis(1000), "search took {elapsed:?}");
        assert!(engine.best_move().is_normal());
        assert!(engine.stop_handle().load(Ordering::Relaxed));
    }

    #[test]
    fn test_search_stop_flag_aborts() {
        let mut engine = SearchEngine::new(1);
        let stop = engine.stop_handle();
        let mut pos = Position::startpos();

        // 深い探索を別スレッドから停止する
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            stop.store(true, Ordering::Relaxed);
        });
        let start = Instant::now();
        engine.start_thinking(&mut pos, limits_with_depth(60));
        let _ = handle.join();

        assert!(start.elapsed() < Duration::from_secs(30));
        assert!(engine.best_move().is_normal());
    }

    #[test]
    fn test_search_repetition_draw_value() {
        let mut engine = SearchEngine::new(1);
        let mut pos = Position::startpos();
        // 金の往復で同一局面に戻した直後のノードは千日手の値を返す
        for usi in ["4e4d", "2a2b", "4d4e", "2b2a"] {
            pos.do_move(Move::from_usi(usi).unwrap());
        }
        let mut pv = PvLine::new();
        let v = engine.alphabeta(&mut pos, &mut pv, -Value::INFINITE, Value::INFINITE, 3, 0);
        assert_eq!(v, draw_value(RepetitionState::Draw, pos.side_to_move()));
        assert!(pv.is_empty());
    }
}
