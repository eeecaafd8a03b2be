use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// One candidate board position for a piece type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPosition {
    pub id: String,
    pub cells: Vec<Cell>,
    pub target: GridPoint,
}

/// Per-type placement rules. `slots` is in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceRules {
    pub quota: u32,
    pub footprint: u32,
    #[serde(default)]
    pub slots: Vec<SlotPosition>,
}

/// Static slot table, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pieces: BTreeMap<PieceType, PieceRules>,
}

fn slot(id: &str, cells: &[Cell], col: f64, row: f64) -> SlotPosition {
    SlotPosition {
        id: id.to_string(),
        cells: cells.to_vec(),
        target: GridPoint { col, row },
    }
}

impl Catalog {
    /// The layout of the puzzle's 4x6 board: seven pieces tiling it exactly.
    pub fn standard() -> Self {
        let mut pieces = BTreeMap::new();
        pieces.insert(PieceType::Red, PieceRules {
            quota: 2,
            footprint: 4,
            slots: vec![
                slot("R1", &[(0, 0), (0, 1), (1, 0), (1, 1)], 1.0, 1.0),
                slot("R2", &[(2, 0), (2, 1), (3, 0), (3, 1)], 1.0, 3.0),
            ],
        });
        pieces.insert(PieceType::Cyan, PieceRules {
            quota: 1,
            footprint: 4,
            slots: vec![slot("C1", &[(0, 2), (0, 3), (0, 4), (0, 5)], 4.0, 0.5)],
        });
        pieces.insert(PieceType::Blue, PieceRules {
            quota: 2,
            footprint: 3,
            slots: vec![
                slot("B1", &[(1, 2), (1, 3), (1, 4)], 3.5, 1.5),
                slot("B2", &[(2, 2), (3, 2), (3, 3)], 2.5, 3.5),
            ],
        });
        pieces.insert(PieceType::Green, PieceRules {
            quota: 1,
            footprint: 3,
            slots: vec![slot("G1", &[(2, 3), (2, 4), (3, 4)], 4.5, 2.5)],
        });
        pieces.insert(PieceType::Yellow, PieceRules {
            quota: 1,
            footprint: 3,
            slots: vec![slot("Y1", &[(1, 5), (2, 5), (3, 5)], 5.5, 2.5)],
        });
        pieces.insert(PieceType::Orange, PieceRules {
            quota: 0,
            footprint: 1,
            slots: Vec::new(),
        });
        Self { pieces }
    }

    /// Load a catalog override from JSON, falling back to the standard table.
    pub fn load_or_standard(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Ok(Self::standard()) };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog: Catalog = serde_json::from_str(&text)
            .with_context(|| format!("parsing catalog {}", path.display()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn rules(&self, piece: PieceType) -> Option<&PieceRules> {
        self.pieces.get(&piece)
    }

    /// Unknown types get quota 0.
    pub fn quota(&self, piece: PieceType) -> u32 {
        self.rules(piece).map_or(0, |r| r.quota)
    }

    pub fn footprint(&self, piece: PieceType) -> u32 {
        self.rules(piece).map_or(1, |r| r.footprint.max(1))
    }

    pub fn slots(&self, piece: PieceType) -> &[SlotPosition] {
        match self.rules(piece) {
            Some(r) => &r.slots,
            None => &[],
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (piece, rules) in &self.pieces {
            if rules.footprint == 0 {
                bail!("{}: footprint must be positive", piece);
            }
            if piece.is_rejected() && rules.quota != 0 {
                bail!("{}: always-rejected type must have quota 0", piece);
            }
            let mut ids = HashSet::new();
            for s in &rules.slots {
                if !ids.insert(s.id.as_str()) {
                    bail!("{}: duplicate slot id {}", piece, s.id);
                }
                if s.cells.len() != rules.footprint as usize {
                    bail!(
                        "{}: slot {} covers {} cells, footprint is {}",
                        piece, s.id, s.cells.len(), rules.footprint
                    );
                }
                if let Some(&(r, c)) = s.cells.iter().find(|&&(r, c)| r >= ROWS || c >= COLS) {
                    bail!("{}: slot {} cell ({}, {}) is off the board", piece, s.id, r, c);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_is_valid() {
        Catalog::standard().validate().unwrap();
    }

    #[test]
    fn test_standard_quotas_fill_one_board() {
        let cat = Catalog::standard();
        let total: u32 = PieceType::ALL.iter().map(|&p| cat.quota(p)).sum();
        assert_eq!(total, BOARD_QUOTA);
        assert_eq!(cat.quota(PieceType::Orange), 0);
        assert_eq!(cat.footprint(PieceType::Blue), 3);
        assert_eq!(cat.footprint(PieceType::Red), 4);
    }

    #[test]
    fn test_standard_slots_tile_the_board() {
        let cat = Catalog::standard();
        let mut seen = HashSet::new();
        for p in PieceType::ALL {
            for s in cat.slots(p) {
                for &cell in &s.cells {
                    assert!(seen.insert(cell), "cell {:?} covered twice", cell);
                }
            }
        }
        assert_eq!(seen.len(), ROWS * COLS);
    }

    #[test]
    fn test_targets_land_on_own_cells() {
        let cat = Catalog::standard();
        for p in PieceType::ALL {
            for s in cat.slots(p) {
                let cell = (s.target.row.floor() as usize, s.target.col.floor() as usize);
                let inside = s.cells.contains(&cell)
                    || s.cells.iter().any(|&(r, c)| {
                        (s.target.row - (r as f64 + 0.5)).abs() <= 0.5
                            && (s.target.col - (c as f64 + 0.5)).abs() <= 0.5
                    });
                assert!(inside, "{} target off piece", s.id);
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_slots() {
        let mut cat = Catalog::standard();
        cat.pieces.get_mut(&PieceType::Red).unwrap().slots[1].id = "R1".into();
        assert!(cat.validate().is_err());

        let mut cat = Catalog::standard();
        cat.pieces.get_mut(&PieceType::Green).unwrap().slots[0].cells[0] = (4, 0);
        assert!(cat.validate().is_err());

        let mut cat = Catalog::standard();
        cat.pieces.get_mut(&PieceType::Orange).unwrap().quota = 1;
        assert!(cat.validate().is_err());
    }

    #[test]
    fn test_load_json_override() {
        let path = std::env::temp_dir().join(format!("tilebot-catalog-{}.json", std::process::id()));
        let json = serde_json::to_string_pretty(&Catalog::standard()).unwrap();
        std::fs::write(&path, json).unwrap();
        let loaded = Catalog::load_or_standard(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, Catalog::standard());
        assert_eq!(Catalog::load_or_standard(None).unwrap(), Catalog::standard());
    }
}
