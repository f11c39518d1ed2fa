//! Search worker thread
//!
//! `go` runs the engine on a separate thread so the main loop can keep
//! reading `stop`/`quit` from stdin while the search is in progress.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use minishogi_core::{LimitsType, Position, SearchEngine};

/// Message sent by the worker when the search completes
pub enum WorkerMessage {
    Finished,
}

/// Lock the engine, recovering from a poisoned mutex
///
/// A panic inside the search thread must not take the whole front end
/// down with it.
pub fn lock_engine(engine: &Arc<Mutex<SearchEngine>>) -> MutexGuard<'_, SearchEngine> {
    match engine.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("engine mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Handle to a running search
pub struct SearchWorker {
    handle: Option<JoinHandle<()>>,
    rx: Receiver<WorkerMessage>,
}

impl SearchWorker {
    /// Spawn a search on a worker thread
    ///
    /// The engine prints `info`/`bestmove` lines itself; the channel only
    /// signals completion.
    pub fn spawn(
        engine: Arc<Mutex<SearchEngine>>,
        mut position: Position,
        limits: LimitsType,
    ) -> Self {
        let (tx, rx) = bounded(1);
        let handle = thread::spawn(move || {
            {
                let mut engine = lock_engine(&engine);
                engine.start_thinking(&mut position, limits);
            }
            let _ = tx.send(WorkerMessage::Finished);
        });
        SearchWorker {
            handle: Some(handle),
            rx,
        }
    }

    /// Block until the search has finished
    pub fn wait(mut self) {
        let _ = self.rx.recv();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_completes_search() {
        let engine = Arc::new(Mutex::new(SearchEngine::new(1)));
        let pos = Position::startpos();
        let limits = LimitsType {
            depth: 2,
            ..LimitsType::default()
        };

        let worker = SearchWorker::spawn(Arc::clone(&engine), pos, limits);
        worker.wait();

        let engine = lock_engine(&engine);
        assert!(engine.best_move().is_normal());
    }

    #[test]
    fn test_worker_stop_flag_interrupts() {
        let engine = Arc::new(Mutex::new(SearchEngine::new(1)));
        let stop = lock_engine(&engine).stop_handle();
        let pos = Position::startpos();
        let limits = LimitsType {
            depth: 60,
            ..LimitsType::default()
        };

        let worker = SearchWorker::spawn(Arc::clone(&engine), pos, limits);
        std::thread::sleep(std::time::Duration::from_millis(50));
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        worker.wait();

        assert!(lock_engine(&engine).best_move().is_normal());
    }
}
