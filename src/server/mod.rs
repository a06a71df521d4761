//! The server handle: live state the console operates on.
//!
//! [`ServerHandle`] owns the settings store, lifecycle flags, the tick
//! scheduler's bookkeeping, the player and world registries, and the output
//! sink. Console commands receive it explicitly on every dispatch; nothing
//! here is global.
//!
//! # Example
//!
//! ```
//! use cellhost::config::Settings;
//! use cellhost::output::MockSink;
//! use cellhost::server::ServerHandle;
//!
//! let mut server = ServerHandle::new(Settings::default(), Box::new(MockSink::new()));
//! assert!(server.start());
//! assert!(!server.start());
//! assert_eq!(server.worlds().len(), 1);
//! assert!(server.stop());
//! ```

pub mod cell;
pub mod memory;
pub mod player;
pub mod ticker;
pub mod world;

pub use cell::{Cell, CellId, CellKind};
pub use memory::MemoryUsage;
pub use player::{Connection, Player, PlayerId, PlayerState, Router, RouterKind};
pub use ticker::Ticker;
pub use world::{World, WorldId, WorldStats};

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::config::{save_settings, Settings};
use crate::output::OutputSink;

/// Live server state.
pub struct ServerHandle {
    settings: Settings,
    settings_path: Option<PathBuf>,
    ticker: Ticker,
    running: bool,
    start_time: Option<DateTime<Utc>>,
    players: BTreeMap<PlayerId, Player>,
    worlds: BTreeMap<WorldId, World>,
    next_player_id: PlayerId,
    next_world_id: WorldId,
    output: Box<dyn OutputSink>,
}

impl ServerHandle {
    /// Create a stopped server.
    pub fn new(settings: Settings, output: Box<dyn OutputSink>) -> Self {
        let ticker = Ticker::new(settings.server_frequency);
        Self {
            settings,
            settings_path: None,
            ticker,
            running: false,
            start_time: None,
            players: BTreeMap::new(),
            worlds: BTreeMap::new(),
            next_player_id: 1,
            next_world_id: 1,
            output,
        }
    }

    /// Persist settings to `path` whenever they are applied.
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    /// Write a line to the output sink.
    pub fn print(&mut self, line: &str) {
        self.output.print(line);
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings. Call [`apply_settings`](Self::apply_settings) after
    /// changing them.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Apply the current settings to the running server and persist them.
    ///
    /// Persistence failures are logged, not returned.
    pub fn apply_settings(&mut self) {
        self.ticker.set_frequency(self.settings.server_frequency);
        info!("Settings applied");

        if let Some(path) = &self.settings_path {
            if let Err(e) = save_settings(path, &self.settings) {
                warn!("Failed to save settings to {}: {}", path.display(), e);
            }
        }
    }

    /// Whether the server has been started.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// When the server was last started.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Whole seconds since the server started, zero if stopped.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time
            .map(|t| (Utc::now() - t).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }

    /// The tick scheduler state.
    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Mutable ticker, for pausing and resuming.
    pub fn ticker_mut(&mut self) -> &mut Ticker {
        &mut self.ticker
    }

    /// Start the server: create the initial worlds and start ticking.
    ///
    /// Returns `false` if the server is already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.start_time = Some(Utc::now());
        for _ in 0..self.settings.world_min_count {
            self.create_world();
        }
        self.ticker.start();
        info!(
            "Server '{}' started with {} worlds",
            self.settings.server_name,
            self.worlds.len()
        );
        true
    }

    /// Stop the server, dropping every world and player.
    ///
    /// Returns `false` if the server is not running.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.ticker.stop();
        self.players.clear();
        self.worlds.clear();
        self.next_player_id = 1;
        self.next_world_id = 1;
        self.running = false;
        self.start_time = None;
        info!("Server '{}' stopped", self.settings.server_name);
        true
    }

    /// Advance the simulation by one step, if the ticker is running.
    pub fn tick(&mut self) {
        if !self.running || !self.ticker.is_running() {
            return;
        }
        let started = Instant::now();
        let decay = self.settings.player_decay_mult;
        let floor = self.settings.player_start_size;

        for world in self.worlds.values_mut() {
            for cell in world.cells.values_mut() {
                if matches!(cell.kind, CellKind::Player(_)) && cell.size > floor {
                    cell.size = (cell.size * decay).max(floor);
                }
            }
            world.spawn_food(&self.settings);
        }

        for player in self.players.values_mut() {
            let Some(world) = player.world.and_then(|id| self.worlds.get(&id)) else {
                continue;
            };
            let cells: Vec<&Cell> = player
                .owned_cells
                .iter()
                .filter_map(|id| world.cell(*id))
                .collect();
            if !cells.is_empty() {
                let n = cells.len() as f64;
                let x = cells.iter().map(|c| c.x).sum::<f64>() / n;
                let y = cells.iter().map(|c| c.y).sum::<f64>() / n;
                player.view_center = (x, y);
            }
        }

        self.ticker.record(started.elapsed());
    }

    /// Every player on the server, keyed by id.
    pub fn players(&self) -> &BTreeMap<PlayerId, Player> {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Every world on the server, keyed by id.
    pub fn worlds(&self) -> &BTreeMap<WorldId, World> {
        &self.worlds
    }

    pub fn world(&self, id: WorldId) -> Option<&World> {
        self.worlds.get(&id)
    }

    pub fn world_mut(&mut self, id: WorldId) -> Option<&mut World> {
        self.worlds.get_mut(&id)
    }

    /// Create a world, fill it with food and its share of bots.
    pub fn create_world(&mut self) -> WorldId {
        let id = self.next_world_id;
        self.next_world_id += 1;
        let mut world = World::new(id, &self.settings);
        world.spawn_food(&self.settings);
        self.worlds.insert(id, world);
        for _ in 0..self.settings.world_player_bots_per_world {
            self.add_bot(id);
        }
        id
    }

    /// Register a player in `world`.
    ///
    /// Returns `None` if the world does not exist or already holds
    /// `world_max_players` players.
    fn create_player(&mut self, name: String, router: Router, world: WorldId) -> Option<PlayerId> {
        let limit = self.settings.world_max_players as usize;
        let members = self.worlds.get_mut(&world)?;
        if members.players.len() >= limit {
            return None;
        }
        let id = self.next_player_id;
        self.next_player_id += 1;
        members.players.push(id);

        let mut player = Player::new(id, name, router);
        player.world = Some(world);
        self.players.insert(id, player);
        Some(id)
    }

    /// Give a player a fresh cell at a random spot in its world.
    pub fn spawn_player(&mut self, id: PlayerId) -> Option<CellId> {
        let player = self.players.get_mut(&id)?;
        let world = self.worlds.get_mut(&player.world?)?;
        let size = match player.router.kind() {
            RouterKind::Human => self.settings.player_start_size,
            RouterKind::Bot => self.settings.bot_spawn_size,
            RouterKind::Minion => self.settings.minion_spawn_size,
        };
        let (x, y) = world.random_position();
        let cell = world.add_cell(CellKind::Player(id), x, y, size);
        player.owned_cells.push(cell);
        player.view_center = (x, y);
        player.refresh_state();
        Some(cell)
    }

    /// Join a human connection to a world and spawn it.
    ///
    /// Returns `None` if the world does not exist or is full.
    pub fn connect(&mut self, world: WorldId, name: &str) -> Option<PlayerId> {
        let router = Router::Human(Connection::new(format!("local:{}", name)));
        let id = self.create_player(name.to_string(), router, world)?;
        self.spawn_player(id);
        Some(id)
    }

    /// Spawn an autonomous player bot into a world.
    ///
    /// Returns `None` if the world does not exist or is full.
    pub fn add_bot(&mut self, world: WorldId) -> Option<PlayerId> {
        let name = format!("bot {}", self.next_player_id);
        let id = self.create_player(name, Router::Bot, world)?;
        self.spawn_player(id);
        Some(id)
    }

    /// Spawn a minion bound to `owner`'s connection.
    ///
    /// Returns `None` unless `owner` is a human player inside a world with
    /// room for another player.
    pub fn add_minion(&mut self, owner: PlayerId) -> Option<PlayerId> {
        let player = self.players.get(&owner)?;
        player.router.connection()?;
        let world = player.world?;
        let name = player.name.clone();

        let id = self.create_player(name, Router::Minion { owner }, world)?;
        if let Some(connection) = self
            .players
            .get_mut(&owner)
            .and_then(|p| p.router.connection_mut())
        {
            connection.minions.push(id);
        }
        self.spawn_player(id);
        Some(id)
    }

    /// Remove a player with all of its cells.
    ///
    /// A human's minions are closed with it; a minion is detached from its
    /// owner's connection.
    pub fn close_player(&mut self, id: PlayerId) -> bool {
        let Some(player) = self.players.remove(&id) else {
            return false;
        };
        if let Some(world) = player.world.and_then(|w| self.worlds.get_mut(&w)) {
            for cell in &player.owned_cells {
                world.remove_cell(*cell);
            }
            world.players.retain(|p| *p != id);
        }
        match player.router {
            Router::Minion { owner } => {
                if let Some(connection) = self
                    .players
                    .get_mut(&owner)
                    .and_then(|p| p.router.connection_mut())
                {
                    connection.minions.retain(|m| *m != id);
                }
            }
            Router::Human(connection) => {
                for minion in connection.minions {
                    self.close_player(minion);
                }
            }
            Router::Bot => {}
        }
        true
    }

    /// Remove a cell from its world and from its owner's cell list.
    pub fn remove_cell(&mut self, world: WorldId, cell: CellId) -> Option<Cell> {
        let removed = self.worlds.get_mut(&world)?.remove_cell(cell)?;
        if let Some(player) = removed.owner().and_then(|o| self.players.get_mut(&o)) {
            player.owned_cells.retain(|c| *c != cell);
            player.refresh_state();
        }
        Some(removed)
    }

    /// Pop a player cell into equal pieces, as if it ate a virus.
    ///
    /// The cell splits into as many pieces as its mass allows without going
    /// under the minimum split size or over the owner's cell limit. Returns
    /// the number of new pieces.
    pub fn pop_player_cell(&mut self, world: WorldId, cell: CellId) -> usize {
        let Some(world) = self.worlds.get_mut(&world) else {
            return 0;
        };
        let Some(source) = world.cell(cell).cloned() else {
            return 0;
        };
        let Some(player) = source.owner().and_then(|o| self.players.get_mut(&o)) else {
            return 0;
        };

        let max_cells = self.settings.player_max_cells as usize;
        let cells_left = max_cells.saturating_sub(player.owned_cells.len());
        let min_split = self.settings.player_min_split_size;
        let min_split_mass = min_split * min_split / 100.0;
        let mass = source.mass();
        let amount = if min_split_mass > 0.0 {
            ((mass / min_split_mass).floor() as usize).min(cells_left)
        } else {
            cells_left
        };
        if amount == 0 {
            return 0;
        }

        // Placement is settled before the source cell shrinks.
        let positions: Vec<(f64, f64)> = (0..amount)
            .map(|i| {
                let angle = TAU * i as f64 / amount as f64;
                world.clamp_position(
                    source.x + angle.cos() * source.size,
                    source.y + angle.sin() * source.size,
                )
            })
            .collect();

        let per_piece = mass / (amount + 1) as f64;
        if let Some(c) = world.cell_mut(cell) {
            c.set_mass(per_piece);
        }
        for (x, y) in positions {
            let piece = world.add_cell(source.kind, x, y, (per_piece * 100.0).sqrt());
            player.owned_cells.push(piece);
        }
        amount
    }

    /// Players driven by human connections.
    pub fn connection_count(&self) -> usize {
        self.players
            .values()
            .filter(|p| p.router.kind() == RouterKind::Human)
            .count()
    }

    /// Players driven by bots or minions.
    pub fn bot_count(&self) -> usize {
        self.players.len() - self.connection_count()
    }

    /// Population of a world.
    pub fn world_stats(&self, id: WorldId) -> WorldStats {
        let mut stats = WorldStats {
            limit: self.settings.world_max_players,
            ..Default::default()
        };
        let Some(world) = self.worlds.get(&id) else {
            return stats;
        };
        for player in world.players.iter().filter_map(|p| self.players.get(p)) {
            match player.router.kind() {
                RouterKind::Human => stats.external += 1,
                RouterKind::Bot | RouterKind::Minion => stats.internal += 1,
            }
            match player.state {
                PlayerState::Alive => stats.playing += 1,
                PlayerState::Spectating => stats.spectating += 1,
                PlayerState::Idle => {}
            }
        }
        stats
    }

    /// A read-only JSON view of the server for operator expressions.
    pub fn snapshot(&self) -> Value {
        let players: Map<String, Value> = self
            .players
            .values()
            .map(|p| {
                let mass: f64 = p
                    .world
                    .and_then(|w| self.worlds.get(&w))
                    .map(|w| p.owned_cells.iter().filter_map(|c| w.cell(*c)).map(Cell::mass).sum())
                    .unwrap_or(0.0);
                let value = json!({
                    "id": p.id,
                    "name": p.name,
                    "state": p.state,
                    "router": p.router.kind(),
                    "world": p.world,
                    "cells": p.owned_cells.len(),
                    "mass": mass,
                    "minions": p.router.connection().map(|c| c.minions.len()).unwrap_or(0),
                });
                (p.id.to_string(), value)
            })
            .collect();

        let worlds: Map<String, Value> = self
            .worlds
            .values()
            .map(|w| {
                let value = json!({
                    "id": w.id,
                    "cells": w.cells.len(),
                    "player_cells": w.player_cell_count(),
                    "pellets": w.pellet_count(),
                    "viruses": w.virus_count(),
                    "ejected": w.ejected_count(),
                    "mothercells": w.mothercell_count(),
                    "players": w.players.len(),
                    "stats": self.world_stats(w.id),
                });
                (w.id.to_string(), value)
            })
            .collect();

        json!({
            "running": self.running,
            "start_time": self.start_time.map(|t| t.to_rfc3339()),
            "uptime": self.uptime_seconds(),
            "ticker": {
                "running": self.ticker.is_running(),
                "tick_delay": self.ticker.interval().as_secs_f64() * 1000.0,
                "average_tick_time": self.ticker.average_ms(),
            },
            "settings": self.settings,
            "players": players,
            "worlds": worlds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MockSink;

    fn server() -> ServerHandle {
        let settings = Settings {
            pellet_count: 10,
            virus_count: 2,
            ..Default::default()
        };
        let mut server = ServerHandle::new(settings, Box::new(MockSink::new()));
        server.start();
        server
    }

    #[test]
    fn start_and_stop_report_transitions() {
        let mut server = ServerHandle::new(Settings::default(), Box::new(MockSink::new()));
        assert!(!server.stop());
        assert!(server.start());
        assert!(server.is_running());
        assert!(server.ticker().is_running());
        assert!(server.start_time().is_some());
        assert!(!server.start());
        assert!(server.stop());
        assert!(server.worlds().is_empty());
        assert!(server.start_time().is_none());
    }

    #[test]
    fn start_spawns_configured_bots() {
        let settings = Settings {
            world_min_count: 2,
            world_player_bots_per_world: 3,
            ..Default::default()
        };
        let mut server = ServerHandle::new(settings, Box::new(MockSink::new()));
        server.start();
        assert_eq!(server.worlds().len(), 2);
        assert_eq!(server.bot_count(), 6);
        assert_eq!(server.world_stats(1).internal, 3);
    }

    #[test]
    fn connect_spawns_alive_player() {
        let mut server = server();
        let id = server.connect(1, "alice").unwrap();
        let player = server.player(id).unwrap();
        assert!(player.is_alive());
        assert_eq!(player.owned_cells.len(), 1);
        assert_eq!(server.connection_count(), 1);
        assert!(server.connect(99, "bob").is_none());
    }

    #[test]
    fn remove_cell_updates_owner() {
        let mut server = server();
        let id = server.connect(1, "alice").unwrap();
        let cell = server.player(id).unwrap().owned_cells[0];
        assert!(server.remove_cell(1, cell).is_some());
        let player = server.player(id).unwrap();
        assert!(player.owned_cells.is_empty());
        assert!(!player.is_alive());
    }

    #[test]
    fn minions_follow_their_owner() {
        let mut server = server();
        let owner = server.connect(1, "alice").unwrap();
        let minion = server.add_minion(owner).unwrap();
        assert_eq!(
            server.player(owner).unwrap().router.connection().unwrap().minions,
            vec![minion]
        );

        assert!(server.close_player(owner));
        assert!(server.player(minion).is_none());
        assert_eq!(server.world(1).unwrap().player_cell_count(), 0);
    }

    #[test]
    fn closing_minion_detaches_it() {
        let mut server = server();
        let owner = server.connect(1, "alice").unwrap();
        let minion = server.add_minion(owner).unwrap();
        server.close_player(minion);
        assert!(server
            .player(owner)
            .unwrap()
            .router
            .connection()
            .unwrap()
            .minions
            .is_empty());
    }

    #[test]
    fn bots_cannot_own_minions() {
        let mut server = server();
        let bot = server.add_bot(1).unwrap();
        assert!(server.add_minion(bot).is_none());
    }

    #[test]
    fn pop_splits_into_equal_pieces() {
        let mut server = server();
        let id = server.connect(1, "alice").unwrap();
        let cell = server.player(id).unwrap().owned_cells[0];
        // min split size 60 is 36 mass, so 180 mass pops into 5 new pieces
        server.world_mut(1).unwrap().cell_mut(cell).unwrap().set_mass(180.0);

        let pieces = server.pop_player_cell(1, cell);
        assert_eq!(pieces, 5);
        let player = server.player(id).unwrap();
        assert_eq!(player.owned_cells.len(), 6);
        let world = server.world(1).unwrap();
        let total: f64 = player
            .owned_cells
            .iter()
            .map(|c| world.cell(*c).unwrap().mass())
            .sum();
        assert!((total - 180.0).abs() < 1e-6);
    }

    #[test]
    fn full_world_refuses_players() {
        let mut server = server();
        server.settings_mut().world_max_players = 2;
        let human = server.connect(1, "alice").unwrap();
        assert!(server.add_bot(1).is_some());
        assert!(server.add_bot(1).is_none());
        assert!(server.add_minion(human).is_none());
        assert!(server.connect(1, "bob").is_none());
        assert_eq!(server.players().len(), 2);
        assert_eq!(server.world(1).unwrap().players.len(), 2);
    }

    #[test]
    fn pop_keeps_mass_in_a_degenerate_world() {
        let settings = Settings {
            world_width: -100.0,
            world_height: 0.0,
            pellet_count: 0,
            virus_count: 0,
            ..Default::default()
        };
        let mut server = ServerHandle::new(settings, Box::new(MockSink::new()));
        server.start();
        let id = server.connect(1, "alice").unwrap();
        let cell = server.player(id).unwrap().owned_cells[0];
        server.world_mut(1).unwrap().cell_mut(cell).unwrap().set_mass(1000.0);

        let pieces = server.pop_player_cell(1, cell);
        assert_eq!(pieces, 15);
        let player = server.player(id).unwrap();
        let world = server.world(1).unwrap();
        let total: f64 = player
            .owned_cells
            .iter()
            .map(|c| world.cell(*c).unwrap().mass())
            .sum();
        assert!((total - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn pop_respects_cell_limit() {
        let mut server = server();
        server.settings_mut().player_max_cells = 3;
        let id = server.connect(1, "alice").unwrap();
        let cell = server.player(id).unwrap().owned_cells[0];
        server.world_mut(1).unwrap().cell_mut(cell).unwrap().set_mass(10_000.0);
        assert_eq!(server.pop_player_cell(1, cell), 2);
        assert_eq!(server.player(id).unwrap().owned_cells.len(), 3);
    }

    #[test]
    fn tick_records_and_decays() {
        let mut server = server();
        let id = server.connect(1, "alice").unwrap();
        let cell = server.player(id).unwrap().owned_cells[0];
        server.world_mut(1).unwrap().cell_mut(cell).unwrap().size = 200.0;
        server.tick();
        let size = server.world(1).unwrap().cell(cell).unwrap().size;
        assert!(size < 200.0);
        assert!(server.ticker().average_ms() >= 0.0);
    }

    #[test]
    fn paused_ticker_does_not_tick() {
        let mut server = server();
        let id = server.connect(1, "alice").unwrap();
        let cell = server.player(id).unwrap().owned_cells[0];
        server.world_mut(1).unwrap().cell_mut(cell).unwrap().size = 200.0;
        server.ticker_mut().stop();
        server.tick();
        assert_eq!(server.world(1).unwrap().cell(cell).unwrap().size, 200.0);
    }

    #[test]
    fn snapshot_exposes_paths() {
        let mut server = server();
        server.connect(1, "alice");
        let snap = server.snapshot();
        assert_eq!(snap["running"], json!(true));
        assert_eq!(snap["settings"]["pellet_count"], json!(10));
        assert_eq!(snap["players"]["1"]["name"], json!("alice"));
        assert_eq!(snap["worlds"]["1"]["stats"]["external"], json!(1));
    }
}
