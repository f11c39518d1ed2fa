//! USI protocol command parser

use anyhow::{anyhow, Result};
use log::warn;

use super::commands::{GoParams, UsiCommand};

/// Parse USI command from input line
pub fn parse_usi_command(line: &str) -> Result<UsiCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Err(anyhow!("Empty command"));
    }

    match parts[0] {
        "usi" => Ok(UsiCommand::Usi),
        "isready" => Ok(UsiCommand::IsReady),
        "usinewgame" => Ok(UsiCommand::UsiNewGame),
        "quit" => Ok(UsiCommand::Quit),
        "stop" => Ok(UsiCommand::Stop),
        "gameover" => Ok(UsiCommand::GameOver),

        "setoption" => parse_setoption(&parts[1..]),
        "position" => parse_position(&parts[1..]),
        "go" => parse_go(&parts[1..]),

        _ => Err(anyhow!("Unknown command: {}", parts[0])),
    }
}

/// Parse setoption command: `name <name> [value <value>]`
fn parse_setoption(parts: &[&str]) -> Result<UsiCommand> {
    if parts.len() < 2 || parts[0] != "name" {
        return Err(anyhow!("Invalid setoption format"));
    }

    let value_pos = parts.iter().position(|&p| p == "value");

    let name = if let Some(pos) = value_pos {
        parts[1..pos].join(" ")
    } else {
        parts[1..].join(" ")
    };

    let value = value_pos.and_then(|pos| {
        if pos + 1 < parts.len() {
            Some(parts[pos + 1..].join(" "))
        } else {
            None
        }
    });

    Ok(UsiCommand::SetOption { name, value })
}

/// Parse position command: `startpos|sfen <sfen> [moves ...]`
fn parse_position(parts: &[&str]) -> Result<UsiCommand> {
    if parts.is_empty() {
        return Err(anyhow!("Invalid position format"));
    }

    let (startpos, sfen, moves_start) = if parts[0] == "startpos" {
        (true, None, 1)
    } else if parts[0] == "sfen" {
        let moves_pos = parts.iter().position(|&p| p == "moves");
        let sfen_end = moves_pos.unwrap_or(parts.len());

        if sfen_end <= 1 {
            return Err(anyhow!("Invalid SFEN format"));
        }

        let sfen = parts[1..sfen_end].join(" ");
        (false, Some(sfen), sfen_end)
    } else {
        return Err(anyhow!("Position must start with 'startpos' or 'sfen'"));
    };

    let moves = if moves_start < parts.len() && parts[moves_start] == "moves" {
        parts[moves_start + 1..].iter().map(|&s| s.to_string()).collect()
    } else {
        Vec::new()
    };

    Ok(UsiCommand::Position {
        startpos,
        sfen,
        moves,
    })
}

/// Parse a numeric value following a go keyword
fn parse_value<T: std::str::FromStr>(parts: &[&str], i: usize, keyword: &str) -> Result<T> {
    let s = parts
        .get(i)
        .ok_or_else(|| anyhow!("go {keyword} requires a value"))?;
    s.parse().map_err(|_| anyhow!("Invalid {keyword} value: {s}"))
}

/// Parse go command
fn parse_go(parts: &[&str]) -> Result<UsiCommand> {
    let mut params = GoParams::default();
    let mut i = 0;

    while i < parts.len() {
        match parts[i] {
            "infinite" => params.infinite = true,
            "btime" => {
                i += 1;
                params.btime = Some(parse_value(parts, i, "btime")?);
            }
            "wtime" => {
                i += 1;
                params.wtime = Some(parse_value(parts, i, "wtime")?);
            }
            "binc" => {
                i += 1;
                params.binc = Some(parse_value(parts, i, "binc")?);
            }
            "winc" => {
                i += 1;
                params.winc = Some(parse_value(parts, i, "winc")?);
            }
            "byoyomi" => {
                i += 1;
                params.byoyomi = Some(parse_value(parts, i, "byoyomi")?);
            }
            "movetime" => {
                i += 1;
                params.movetime = Some(parse_value(parts, i, "movetime")?);
            }
            "depth" => {
                i += 1;
                params.depth = Some(parse_value(parts, i, "depth")?);
            }
            "nodes" => {
                i += 1;
                params.nodes = Some(parse_value(parts, i, "nodes")?);
            }
            other => {
                // Unknown parameter, skip
                warn!("Unknown go parameter: {other}");
            }
        }
        i += 1;
    }

    Ok(UsiCommand::Go(params))
}
