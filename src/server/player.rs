//! Players and the routers that control them.

use serde::Serialize;

use super::cell::CellId;
use super::WorldId;

/// Identifier of a player, unique within the server.
pub type PlayerId = u32;

/// Lifecycle state of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// Not playing and not spectating.
    #[default]
    Idle,
    /// Owns at least one cell.
    Alive,
    /// Watching a world without cells.
    Spectating,
}

/// A human client connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    /// Remote address or label of the client.
    pub remote: String,
    /// Minions bound to this connection, oldest first.
    pub minions: Vec<PlayerId>,
}

impl Connection {
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            minions: Vec::new(),
        }
    }
}

/// The controller of a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Router {
    /// A human connection.
    Human(Connection),
    /// An autonomous player bot.
    Bot,
    /// An auxiliary player driven by another player's connection.
    Minion { owner: PlayerId },
}

/// Discriminant of [`Router`], for display and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterKind {
    Human,
    Bot,
    Minion,
}

impl Router {
    pub fn kind(&self) -> RouterKind {
        match self {
            Router::Human(_) => RouterKind::Human,
            Router::Bot => RouterKind::Bot,
            Router::Minion { .. } => RouterKind::Minion,
        }
    }

    pub fn connection(&self) -> Option<&Connection> {
        match self {
            Router::Human(connection) => Some(connection),
            _ => None,
        }
    }

    pub fn connection_mut(&mut self) -> Option<&mut Connection> {
        match self {
            Router::Human(connection) => Some(connection),
            _ => None,
        }
    }
}

/// A player in the server.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub state: PlayerState,
    /// Cells owned by this player, in spawn order.
    pub owned_cells: Vec<CellId>,
    pub world: Option<WorldId>,
    pub router: Router,
    /// Center of the player's view area.
    pub view_center: (f64, f64),
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, router: Router) -> Self {
        Self {
            id,
            name: name.into(),
            state: PlayerState::Idle,
            owned_cells: Vec::new(),
            world: None,
            router,
            view_center: (0.0, 0.0),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == PlayerState::Alive
    }

    /// Re-derive the state after the owned cell list changed.
    pub fn refresh_state(&mut self) {
        self.state = if self.world.is_none() {
            PlayerState::Idle
        } else if !self.owned_cells.is_empty() {
            PlayerState::Alive
        } else if self.state == PlayerState::Spectating {
            PlayerState::Spectating
        } else {
            PlayerState::Idle
        };
    }
}
