use std::collections::{HashMap, HashSet};

use crate::catalog::{Catalog, SlotPosition};
use crate::types::*;

/// Board allocation engine: grid occupancy, per-type counts and the set of
/// consumed slots. Only the bot worker mutates it.
#[derive(Debug, Clone)]
pub struct BoardState {
    catalog: Catalog,
    grid: Grid,
    placed: HashMap<PieceType, u32>,
    consumed: HashSet<(PieceType, String)>,
}

impl BoardState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            grid: EMPTY_GRID,
            placed: HashMap::new(),
            consumed: HashSet::new(),
        }
    }

    pub fn reset(&mut self) {
        self.grid = EMPTY_GRID;
        self.placed.clear();
        self.consumed.clear();
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn placed_count(&self, piece: PieceType) -> u32 {
        self.placed.get(&piece).copied().unwrap_or(0)
    }

    pub fn is_consumed(&self, piece: PieceType, slot_id: &str) -> bool {
        self.consumed.contains(&(piece, slot_id.to_string()))
    }

    pub fn can_place(&self, piece: PieceType) -> bool {
        self.placed_count(piece) < self.catalog.quota(piece)
    }

    /// First slot of `piece`'s list that is neither consumed nor touching an
    /// occupied cell. The cell check keeps this correct after `reload`,
    /// which cannot rebuild the consumed set.
    pub fn next_free_slot(&self, piece: PieceType) -> Option<&SlotPosition> {
        self.catalog.slots(piece).iter().find(|slot| {
            !self.is_consumed(piece, &slot.id)
                && slot.cells.iter().all(|&(r, c)| self.grid[r][c].is_none())
        })
    }

    /// Record a placement. The slot must come from `next_free_slot`.
    pub fn commit(&mut self, piece: PieceType, slot: &SlotPosition) {
        debug_assert!(
            !self.is_consumed(piece, &slot.id),
            "slot {} committed twice",
            slot.id
        );
        for &(r, c) in &slot.cells {
            self.grid[r][c] = Some(piece);
        }
        *self.placed.entry(piece).or_insert(0) += 1;
        self.consumed.insert((piece, slot.id.clone()));
    }

    /// Replace the grid with a scan result and re-derive placed counts,
    /// rounding partial pieces up.
    pub fn reload(&mut self, raw: &RawGrid) {
        self.grid = *raw;

        let mut cells: HashMap<PieceType, u32> = HashMap::new();
        for cell in self.grid.iter().flatten().flatten() {
            *cells.entry(*cell).or_insert(0) += 1;
        }

        self.placed.clear();
        for piece in PieceType::ALL {
            let n = cells.get(&piece).copied().unwrap_or(0);
            let size = self.catalog.footprint(piece);
            self.placed.insert(piece, n.div_ceil(size));
        }
    }

    pub fn total_placed(&self) -> u32 {
        self.placed.values().sum()
    }

    pub fn is_complete(&self) -> bool {
        self.total_placed() >= BOARD_QUOTA
    }

    pub fn empty_cell_count(&self) -> usize {
        self.grid.iter().flatten().filter(|c| c.is_none()).count()
    }

    pub fn status_text(&self) -> String {
        format!(
            "pieces {}/{} | empty {}/{}",
            self.total_placed(),
            BOARD_QUOTA,
            self.empty_cell_count(),
            ROWS * COLS
        )
    }

    /// Text grid of type initials, `.` for empty cells.
    pub fn render(&self) -> String {
        let mut out = String::from("   ");
        for c in 0..COLS {
            out.push_str(&format!(" {}", c));
        }
        for (r, row) in self.grid.iter().enumerate() {
            out.push_str(&format!("\n{}: ", r));
            for cell in row {
                out.push(' ');
                out.push(cell.map_or('.', PieceType::initial));
            }
        }
        out
    }
}
