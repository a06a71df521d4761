//! Settings schema.
//!
//! Every field of [`Settings`] is a pre-declared key that the console's
//! `setting` command may read or write by name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConsoleError, Result};

/// Live server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Display name of the server
    pub server_name: String,

    /// Simulation ticks per second
    pub server_frequency: u32,

    /// Player capacity of a single world
    pub world_max_players: u32,

    /// Worlds created when the server starts
    pub world_min_count: u32,

    /// Player bots spawned into every new world
    pub world_player_bots_per_world: u32,

    /// World width in map units
    pub world_width: f64,

    /// World height in map units
    pub world_height: f64,

    /// Pellets kept alive per world
    pub pellet_count: u32,

    /// Viruses kept alive per world
    pub virus_count: u32,

    /// Mothercells kept alive per world
    pub mothercell_count: u32,

    /// Most cells a single player may own
    pub player_max_cells: u32,

    /// Smallest cell size a split or pop may produce
    pub player_min_split_size: f64,

    /// Size of a freshly spawned player cell
    pub player_start_size: f64,

    /// Size of a freshly spawned minion cell
    pub minion_spawn_size: f64,

    /// Size of a freshly spawned bot cell
    pub bot_spawn_size: f64,

    /// Per-tick size multiplier applied to player cells
    pub player_decay_mult: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_name: "cellhost".to_string(),
            server_frequency: 25,
            world_max_players: 50,
            world_min_count: 1,
            world_player_bots_per_world: 0,
            world_width: 7071.0,
            world_height: 7071.0,
            pellet_count: 200,
            virus_count: 20,
            mothercell_count: 0,
            player_max_cells: 16,
            player_min_split_size: 60.0,
            player_start_size: 32.0,
            minion_spawn_size: 32.0,
            bot_spawn_size: 32.0,
            player_decay_mult: 0.9998,
        }
    }
}

impl Settings {
    /// Names of all pre-declared keys, sorted.
    pub fn keys() -> Vec<String> {
        match serde_json::to_value(Settings::default()) {
            Ok(Value::Object(map)) => {
                let mut keys: Vec<String> = map.keys().cloned().collect();
                keys.sort();
                keys
            }
            _ => Vec::new(),
        }
    }

    /// Check whether `key` is a pre-declared setting.
    pub fn has_key(key: &str) -> bool {
        Self::keys().iter().any(|k| k == key)
    }

    /// Read a setting by name.
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }

    /// Write a setting by name.
    ///
    /// The value must deserialize into the field's type; on failure the
    /// settings are left untouched.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut map = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(anyhow::anyhow!("settings did not serialize to a map").into()),
            Err(e) => return Err(anyhow::Error::from(e).into()),
        };

        if !map.contains_key(key) {
            return Err(ConsoleError::NoSuchSetting);
        }
        map.insert(key.to_string(), value);

        let updated: Settings =
            serde_json::from_value(Value::Object(map)).map_err(|e| {
                ConsoleError::InvalidSettingValue {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check the value ranges the simulation relies on.
    ///
    /// Sizes and world dimensions must be finite and positive, the tick
    /// frequency at least 1, and the decay multiplier within `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.server_frequency == 0 {
            return Err(invalid("server_frequency", "must be at least 1"));
        }
        let positive = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("player_min_split_size", self.player_min_split_size),
            ("player_start_size", self.player_start_size),
            ("minion_spawn_size", self.minion_spawn_size),
            ("bot_spawn_size", self.bot_spawn_size),
        ];
        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(key, "must be a positive number"));
            }
        }
        let decay = self.player_decay_mult;
        if !decay.is_finite() || decay <= 0.0 || decay > 1.0 {
            return Err(invalid("player_decay_mult", "must be greater than 0 and at most 1"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConsoleError {
    ConsoleError::InvalidSettingValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
