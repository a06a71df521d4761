//! Cells, the bodies that live inside a world.

use serde::Serialize;

use super::PlayerId;

/// Identifier of a cell, unique within its world.
pub type CellId = u32;

/// What a cell is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "owner")]
pub enum CellKind {
    /// A cell owned by a player.
    Player(PlayerId),
    /// Food.
    Pellet,
    /// Pops player cells that eat it.
    Virus,
    /// Mass ejected by a player.
    Ejected,
    /// Spawns pellets around itself.
    Mothercell,
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub id: CellId,
    pub kind: CellKind,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Cell {
    /// Create a cell.
    pub fn new(id: CellId, kind: CellKind, x: f64, y: f64, size: f64) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            size,
        }
    }

    /// The owning player, if this is a player cell.
    pub fn owner(&self) -> Option<PlayerId> {
        match self.kind {
            CellKind::Player(owner) => Some(owner),
            _ => None,
        }
    }

    /// Size squared.
    pub fn square_size(&self) -> f64 {
        self.size * self.size
    }

    pub fn set_square_size(&mut self, square_size: f64) {
        self.size = square_size.max(0.0).sqrt();
    }

    /// Mass is a hundredth of the squared size.
    pub fn mass(&self) -> f64 {
        self.square_size() / 100.0
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.set_square_size(mass * 100.0);
    }
}
