//! USI protocol commands

use minishogi_core::types::Color;
use minishogi_core::LimitsType;

/// Parsed USI command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsiCommand {
    Usi,
    IsReady,
    SetOption { name: String, value: Option<String> },
    UsiNewGame,
    Position {
        startpos: bool,
        sfen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoParams),
    Stop,
    GameOver,
    Quit,
}

/// Parameters of the `go` command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoParams {
    pub btime: Option<i64>,
    pub wtime: Option<i64>,
    pub binc: Option<i64>,
    pub winc: Option<i64>,
    pub byoyomi: Option<i64>,
    pub movetime: Option<i64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

impl GoParams {
    /// Convert into the engine's search limits
    pub fn to_limits(&self) -> LimitsType {
        let mut limits = LimitsType::default();
        limits.time[Color::Black.index()] = self.btime.unwrap_or(0);
        limits.time[Color::White.index()] = self.wtime.unwrap_or(0);
        limits.inc[Color::Black.index()] = self.binc.unwrap_or(0);
        limits.inc[Color::White.index()] = self.winc.unwrap_or(0);
        // USI sends a single byoyomi that applies to both sides
        let byoyomi = self.byoyomi.unwrap_or(0);
        limits.byoyomi = [byoyomi, byoyomi];
        limits.movetime = self.movetime.unwrap_or(0);
        limits.depth = self.depth.unwrap_or(0);
        limits.nodes = self.nodes.unwrap_or(0);
        limits.infinite = self.infinite;
        limits
    }
}
