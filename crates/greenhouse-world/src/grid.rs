//! Fixed-size 2D grid of greenhouse cells.

use crate::plant::PlantInstance;
use greenhouse_core::{CellPos, Error, GridConfig, Result, SoilProfile};
use serde::{Deserialize, Serialize};

/// What a cell is holding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupant {
    #[default]
    Empty,
    Occupied(PlantInstance),
}

impl Occupant {
    pub fn plant(&self) -> Option<&PlantInstance> {
        match self {
            Occupant::Empty => None,
            Occupant::Occupied(plant) => Some(plant),
        }
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, Occupant::Occupied(_))
    }
}

/// One cultivable cell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub soil: SoilProfile,
    pub occupant: Occupant,
}

impl Cell {
    pub fn empty(soil: SoilProfile) -> Self {
        Self {
            soil,
            occupant: Occupant::Empty,
        }
    }

    pub fn plant(&self) -> Option<&PlantInstance> {
        self.occupant.plant()
    }
}

/// Row-major grid whose dimensions never change after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, soil: SoilProfile) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::empty(soil); rows * cols],
        }
    }

    /// Create an empty grid from configuration
    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.rows, config.cols, config.default_soil)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Get cell at position, `None` if outside the grid
    pub fn get(&self, pos: CellPos) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    /// Get mutable cell at position, or an out-of-bounds error
    pub fn get_mut(&mut self, pos: CellPos) -> Result<&mut Cell> {
        match self.index(pos) {
            Some(i) => Ok(&mut self.cells[i]),
            None => Err(self.out_of_bounds(pos)),
        }
    }

    /// Number of occupied cells among the 8 surrounding `pos`.
    pub fn neighbor_count(&self, pos: CellPos) -> usize {
        let mut count = 0;

        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }

                let occupied = pos
                    .offset(dr, dc)
                    .and_then(|neighbor| self.get(neighbor))
                    .is_some_and(|cell| cell.occupant.is_occupied());
                if occupied {
                    count += 1;
                }
            }
        }

        count
    }

    /// Lay the same soil in every cell.
    pub fn set_all_soil(&mut self, soil: SoilProfile) {
        for cell in &mut self.cells {
            cell.soil = soil;
        }
    }

    pub fn plant_count(&self) -> usize {
        self.cells.iter().filter(|c| c.occupant.is_occupied()).count()
    }

    /// Check the cell vector matches the declared dimensions and every plant is valid.
    pub fn is_consistent(&self) -> bool {
        self.cells.len() == self.rows * self.cols
            && self.plants().all(|(_, plant)| plant.is_valid())
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    pub(crate) fn out_of_bounds(&self, pos: CellPos) -> Error {
        Error::OutOfBounds {
            row: pos.row,
            col: pos.col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> CellPos {
        CellPos::new(index / self.cols, index % self.cols)
    }

    /// Iterator over all cells with positions, row by row
    pub fn iter(&self) -> impl Iterator<Item = (CellPos, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }

    /// Iterator over occupied cells' plants
    pub fn plants(&self) -> impl Iterator<Item = (CellPos, &PlantInstance)> + '_ {
        self.iter()
            .filter_map(|(pos, cell)| cell.plant().map(|plant| (pos, plant)))
    }

    /// Build a grid of the same shape by mapping every cell.
    pub(crate) fn map_cells(&self, mut f: impl FnMut(CellPos, &Cell) -> Cell) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            cells: self.iter().map(|(pos, cell)| f(pos, cell)).collect(),
        }
    }
}
