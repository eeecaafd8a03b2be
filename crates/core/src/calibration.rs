use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::rig::CalibrationSource;
use crate::types::*;

/// Screen positions of everything the bot clicks or looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub supply: Option<Point>,
    pub staging: Option<Point>,
    pub discard: Option<Point>,
    pub confirm: Option<Point>,
    pub board_top_left: Option<Point>,
    pub board_bottom_right: Option<Point>,
}

impl Calibration {
    pub fn is_complete(&self) -> bool {
        self.supply.is_some()
            && self.staging.is_some()
            && self.discard.is_some()
            && self.confirm.is_some()
            && self.board_top_left.is_some()
            && self.board_bottom_right.is_some()
    }

    /// Names of the points still missing, for error messages.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("supply", self.supply.is_none()),
            ("staging", self.staging.is_none()),
            ("discard", self.discard.is_none()),
            ("confirm", self.confirm.is_none()),
            ("board_top_left", self.board_top_left.is_none()),
            ("board_bottom_right", self.board_bottom_right.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    /// Where freshly fetched pieces are classified.
    pub fn staging_point(&self) -> Point {
        self.staging.unwrap_or(Point::new(0, 0))
    }

    /// Map a board position in cell units to a screen pixel.
    pub fn board_to_screen(&self, p: GridPoint) -> Point {
        let tl = self.board_top_left.unwrap_or(Point::new(0, 0));
        let br = self.board_bottom_right.unwrap_or(tl);
        let cell_w = (br.x - tl.x) as f64 / COLS as f64;
        let cell_h = (br.y - tl.y) as f64 / ROWS as f64;
        Point::new(
            tl.x + (p.col * cell_w).round() as i32,
            tl.y + (p.row * cell_h).round() as i32,
        )
    }

    /// Screen pixel at the centre of board cell (row, col).
    pub fn cell_center(&self, (row, col): Cell) -> Point {
        self.board_to_screen(GridPoint {
            col: col as f64 + 0.5,
            row: row as f64 + 0.5,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("no calibration at {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid calibration {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }

    /// Write an all-empty calibration for the operator to fill in.
    /// Returns false when the file already exists.
    pub fn write_template(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save(path)?;
        Ok(true)
    }
}

/// Calibration read fresh from a JSON file on every session start.
pub struct FileCalibration {
    path: PathBuf,
}

impl FileCalibration {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CalibrationSource for FileCalibration {
    fn load_calibration(&mut self) -> Result<Calibration> {
        Calibration::load(&self.path)
    }
}
