//! Worlds: the arenas cells live in.

use std::collections::BTreeMap;

use serde::Serialize;

use super::cell::{Cell, CellId, CellKind};
use super::player::PlayerId;
use crate::config::Settings;

/// Identifier of a world, unique within the server.
pub type WorldId = u32;

const PELLET_SIZE: f64 = 10.0;
const VIRUS_SIZE: f64 = 100.0;
const MOTHERCELL_SIZE: f64 = 149.0;

/// Player population of a world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    /// Player capacity.
    pub limit: u32,
    /// Players driven by bots or minions.
    pub internal: u32,
    /// Players driven by human connections.
    pub external: u32,
    /// Players in the alive state.
    pub playing: u32,
    /// Players spectating.
    pub spectating: u32,
}

/// One simulation arena.
#[derive(Debug, Clone)]
pub struct World {
    pub id: WorldId,
    pub width: f64,
    pub height: f64,
    pub cells: BTreeMap<CellId, Cell>,
    /// Players currently in this world, in join order.
    pub players: Vec<PlayerId>,
    next_cell_id: CellId,
    rng: u64,
}

impl World {
    pub fn new(id: WorldId, settings: &Settings) -> Self {
        Self {
            id,
            width: settings.world_width,
            height: settings.world_height,
            cells: BTreeMap::new(),
            players: Vec::new(),
            next_cell_id: 1,
            rng: 0x9E37_79B9_7F4A_7C15 ^ u64::from(id),
        }
    }

    /// Add a cell and return its id.
    pub fn add_cell(&mut self, kind: CellKind, x: f64, y: f64, size: f64) -> CellId {
        let id = self.next_cell_id;
        self.next_cell_id += 1;
        self.cells.insert(id, Cell::new(id, kind, x, y, size));
        id
    }

    /// Remove a cell from the world. Ownership bookkeeping is the caller's job.
    pub fn remove_cell(&mut self, id: CellId) -> Option<Cell> {
        self.cells.remove(&id)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    fn count(&self, pred: impl Fn(&CellKind) -> bool) -> usize {
        self.cells.values().filter(|c| pred(&c.kind)).count()
    }

    pub fn player_cell_count(&self) -> usize {
        self.count(|k| matches!(k, CellKind::Player(_)))
    }

    pub fn pellet_count(&self) -> usize {
        self.count(|k| *k == CellKind::Pellet)
    }

    pub fn virus_count(&self) -> usize {
        self.count(|k| *k == CellKind::Virus)
    }

    pub fn ejected_count(&self) -> usize {
        self.count(|k| *k == CellKind::Ejected)
    }

    pub fn mothercell_count(&self) -> usize {
        self.count(|k| *k == CellKind::Mothercell)
    }

    /// A pseudo-random position inside the world bounds.
    pub fn random_position(&mut self) -> (f64, f64) {
        let x = (self.next_random() - 0.5) * self.width;
        let y = (self.next_random() - 0.5) * self.height;
        (x, y)
    }

    /// Keep x/y inside the world bounds.
    pub fn clamp_position(&self, x: f64, y: f64) -> (f64, f64) {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        (x.max(-hw).min(hw), y.max(-hh).min(hh))
    }

    /// Top pellets, viruses and mothercells back up to their targets.
    pub fn spawn_food(&mut self, settings: &Settings) {
        let targets = [
            (CellKind::Pellet, settings.pellet_count, PELLET_SIZE),
            (CellKind::Virus, settings.virus_count, VIRUS_SIZE),
            (CellKind::Mothercell, settings.mothercell_count, MOTHERCELL_SIZE),
        ];
        for (kind, target, size) in targets {
            let have = self.count(|k| *k == kind);
            for _ in have..target as usize {
                let (x, y) = self.random_position();
                self.add_cell(kind, x, y, size);
            }
        }
    }

    // xorshift64*, uniform in [0, 1)
    fn next_random(&mut self) -> f64 {
        let mut x = self.rng;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }
}
