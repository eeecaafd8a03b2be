use serde::{Deserialize, Serialize};

pub const ROWS: usize = 4;
pub const COLS: usize = 6;

/// Number of pieces that completes one board.
pub const BOARD_QUOTA: u32 = 7;

/// Colour class of a puzzle piece as seen by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PieceType {
    Cyan,
    Blue,
    Red,
    Green,
    Yellow,
    Orange,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Cyan,
        PieceType::Blue,
        PieceType::Red,
        PieceType::Green,
        PieceType::Yellow,
        PieceType::Orange,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PieceType::Cyan => "CYAN",
            PieceType::Blue => "BLUE",
            PieceType::Red => "RED",
            PieceType::Green => "GREEN",
            PieceType::Yellow => "YELLOW",
            PieceType::Orange => "ORANGE",
        }
    }

    /// Single-letter tag used in text renderings of the grid.
    pub fn initial(self) -> char {
        self.label().chars().next().unwrap_or('?')
    }

    /// ORANGE never fits anywhere and is always thrown away.
    pub fn is_rejected(self) -> bool {
        self == PieceType::Orange
    }

    /// Reference on-screen colour (RGB) used by the classifier.
    pub fn reference_rgb(self) -> [u8; 3] {
        match self {
            PieceType::Cyan => [0, 200, 220],
            PieceType::Blue => [40, 70, 210],
            PieceType::Red => [210, 40, 40],
            PieceType::Green => [50, 180, 60],
            PieceType::Yellow => [230, 210, 40],
            PieceType::Orange => [240, 140, 20],
        }
    }
}

impl std::fmt::Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Board cell address as (row, col).
pub type Cell = (usize, usize);

/// Occupancy grid: `None` is an empty cell.
pub type Grid = [[Option<PieceType>; COLS]; ROWS];

/// Grid as read back from the screen by a board scanner.
pub type RawGrid = Grid;

pub const EMPTY_GRID: Grid = [[None; COLS]; ROWS];

/// Absolute screen coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Position on the board measured in cells: (0, 0) is the top-left corner
/// of the board, (COLS, ROWS) the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub col: f64,
    pub row: f64,
}

/// Screen rectangle for partial capture (absolute coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRect {
    pub l: i32,
    pub t: i32,
    pub w: i32,
    pub h: i32,
}

impl CaptureRect {
    /// Square of side `2 * radius + 1` centred on `p`.
    pub fn around(p: Point, radius: i32) -> Self {
        Self {
            l: p.x - radius,
            t: p.y - radius,
            w: radius * 2 + 1,
            h: radius * 2 + 1,
        }
    }
}

/// Raw screenshot pixel data (BGRA)
#[derive(Debug)]
pub struct Capture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: u32,
}

/// States of the bot control state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Idle,
    Running,
    Paused,
    Fetching,
    Detecting,
    Placing,
    Discarding,
    Completing,
    Error,
    Stopped,
}

impl BotState {
    pub fn label(self) -> &'static str {
        match self {
            BotState::Idle => "ready",
            BotState::Running => "running...",
            BotState::Paused => "paused",
            BotState::Fetching => "fetching piece...",
            BotState::Detecting => "detecting...",
            BotState::Placing => "placing piece...",
            BotState::Discarding => "discarding...",
            BotState::Completing => "completing board...",
            BotState::Error => "error!",
            BotState::Stopped => "stopped",
        }
    }

    /// Error and Stopped end a session.
    pub fn is_terminal(self) -> bool {
        matches!(self, BotState::Error | BotState::Stopped)
    }

    /// Transition table of the control loop.
    pub fn can_transition_to(self, next: BotState) -> bool {
        use BotState::*;
        match (self, next) {
            (Error | Stopped, _) => false,
            (_, Stopped) => true,
            (Idle, Running | Error) => true,
            (Running | Placing | Discarding | Completing, Fetching | Completing | Paused) => true,
            (Paused, Running) => true,
            (Fetching, Detecting) => true,
            (Detecting, Fetching | Placing | Discarding | Paused) => true,
            (Placing, Discarding) => true,
            _ => false,
        }
    }
}

/// Command from the foreground (TUI, hotkeys) to the bot worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    TogglePause,
    Stop,
    Quit,
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub boards_completed: u64,
    pub pieces_placed: u64,
    pub pieces_discarded: u64,
    pub current_board_placed: u64,
}

/// What the status sink receives on every state transition.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub state: BotState,
    pub message: String,
    pub stats: StatsSnapshot,
    pub board: String,
    pub grid: Grid,
}
