//! USI (Universal Shogi Interface) adapter for the minishogi engine

mod usi;
mod worker;

use std::io::{self, BufRead};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use clap::Parser;

use minishogi_core::movegen::{generate_legal, MoveList};
use minishogi_core::tt::DEFAULT_TT_SIZE_MB;
use minishogi_core::{Move, Position, SearchEngine, SFEN_STARTPOS};

use usi::{parse_usi_command, send_response, UsiCommand, UsiResponse};
use worker::{lock_engine, SearchWorker};

const ENGINE_NAME: &str = concat!("RustMinishogi ", env!("CARGO_PKG_VERSION"));
const ENGINE_AUTHOR: &str = "RustMinishogi Team";

#[derive(Parser, Debug)]
#[command(author, version, about = "USI minishogi engine", long_about = None)]
struct Args {
    /// Transposition table size in MB
    #[arg(long, default_value_t = DEFAULT_TT_SIZE_MB)]
    hash: usize,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, default_level),
    );

    log::info!("{ENGINE_NAME} starting");

    let engine = Arc::new(Mutex::new(SearchEngine::new(args.hash)));
    // stopフラグはエンジンと寿命を共にするので起動時に1度だけ取る
    let stop = lock_engine(&engine).stop_handle();
    let mut position = Position::startpos();
    let mut worker: Option<SearchWorker> = None;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_usi_command(line) {
            Ok(command) => command,
            Err(e) => {
                log::warn!("{e}");
                continue;
            }
        };

        match command {
            UsiCommand::Usi => {
                send_response(UsiResponse::Id {
                    name: ENGINE_NAME.to_string(),
                    author: ENGINE_AUTHOR.to_string(),
                })?;
                send_response(UsiResponse::Option(format!(
                    "option name USI_Hash type spin default {DEFAULT_TT_SIZE_MB} min 1 max 1024"
                )))?;
                send_response(UsiResponse::UsiOk)?;
            }

            UsiCommand::IsReady => {
                wait_for_search(&mut worker);
                minishogi_core::init();
                lock_engine(&engine).clear();
                send_response(UsiResponse::ReadyOk)?;
            }

            UsiCommand::SetOption { name, value } => {
                wait_for_search(&mut worker);
                handle_setoption(&engine, &name, value.as_deref());
            }

            UsiCommand::UsiNewGame => {
                wait_for_search(&mut worker);
                lock_engine(&engine).clear();
                log::debug!("new game started");
            }

            UsiCommand::Position {
                startpos,
                sfen,
                moves,
            } => {
                wait_for_search(&mut worker);
                match set_position(startpos, sfen.as_deref(), &moves) {
                    Ok(pos) => position = pos,
                    Err(e) => {
                        log::error!("failed to set position: {e}");
                        send_response(UsiResponse::String(format!(
                            "Error: failed to set position - {e}"
                        )))?;
                    }
                }
            }

            UsiCommand::Go(params) => {
                wait_for_search(&mut worker);
                let limits = params.to_limits();
                log::debug!("go: {limits:?}");
                worker = Some(SearchWorker::spawn(
                    Arc::clone(&engine),
                    position.clone(),
                    limits,
                ));
            }

            UsiCommand::Stop => {
                stop.store(true, Ordering::Relaxed);
            }

            UsiCommand::GameOver => {
                stop.store(true, Ordering::Relaxed);
                wait_for_search(&mut worker);
            }

            UsiCommand::Quit => {
                stop.store(true, Ordering::Relaxed);
                wait_for_search(&mut worker);
                break;
            }
        }
    }

    log::info!("{ENGINE_NAME} exiting");
    Ok(())
}

/// Block until the current search (if any) has emitted its bestmove
fn wait_for_search(worker: &mut Option<SearchWorker>) {
    if let Some(w) = worker.take() {
        w.wait();
    }
}

fn handle_setoption(engine: &Arc<Mutex<SearchEngine>>, name: &str, value: Option<&str>) {
    match name {
        "USI_Hash" => {
            let Some(value) = value else {
                log::warn!("USI_Hash requires a value");
                return;
            };
            match value.parse::<usize>() {
                Ok(mb) if (1..=1024).contains(&mb) => {
                    lock_engine(engine).resize_tt(mb);
                    log::info!("transposition table resized to {mb} MB");
                }
                _ => log::warn!("invalid USI_Hash value: {value}"),
            }
        }
        other => {
            // Unknown options are ignored per the USI convention
            log::debug!("ignoring option {other}");
        }
    }
}

/// Build a position from a USI position command
fn set_position(startpos: bool, sfen: Option<&str>, moves: &[String]) -> Result<Position> {
    let mut position = Position::new();
    let sfen = if startpos {
        SFEN_STARTPOS
    } else {
        sfen.ok_or_else(|| anyhow!("position without sfen"))?
    };
    position
        .set_sfen(sfen)
        .map_err(|e| anyhow!("bad sfen '{sfen}': {e}"))?;

    for s in moves {
        let m = Move::from_usi(s).ok_or_else(|| anyhow!("unparsable move: {s}"))?;
        let mut list = MoveList::new();
        generate_legal(&mut position, &mut list);
        if !list.contains(m) {
            return Err(anyhow!("illegal move: {s}"));
        }
        position.do_move(m);
    }
    Ok(position)
}
