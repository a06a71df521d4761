//! Live player mutation commands.
//!
//! Every command here runs the same validation chain: arity, number parsing,
//! player lookup, then state preconditions, stopping at the first failure.

use crate::console::args::{parse_count, parse_float, parse_id, required};
use crate::console::command::{Command, Context};
use crate::console::CommandRegistry;
use crate::error::{ConsoleError, Result};
use crate::server::{Cell, CellId, PlayerId, WorldId};

pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command::new(
        "mass",
        "<id> <mass>",
        "set cell mass to all of a player's cells",
        mass,
    ));
    registry.register(Command::new("merge", "<id>", "instantly merge a player", merge));
    registry.register(Command::new("kill", "<id>", "instantly kill a player", kill));
    registry.register(Command::new(
        "pop",
        "<id>",
        "instantly pop a player's first cell",
        pop,
    ));
    registry.register(Command::new(
        "addminion",
        "<id> [count=1]",
        "assign minions to a player",
        add_minion,
    ));
    registry.register(Command::new(
        "killminion",
        "<id> [count=1]",
        "remove assigned minions from a player",
        kill_minion,
    ));
}

/// Parse a player id and check that it resolves.
fn player_id(ctx: &Context<'_>, raw: &str) -> Result<PlayerId> {
    let id = parse_id(raw, "player id")?;
    if ctx.server.player(id).is_none() {
        return Err(ConsoleError::NoSuchEntity { entity: "player" });
    }
    Ok(id)
}

/// World and owned cells of a player that must be alive.
fn alive_cells(ctx: &Context<'_>, id: PlayerId) -> Result<(WorldId, Vec<CellId>)> {
    let player = ctx
        .server
        .player(id)
        .ok_or(ConsoleError::NoSuchEntity { entity: "player" })?;
    if !player.is_alive() || player.owned_cells.is_empty() {
        return Err(ConsoleError::PlayerNotAlive);
    }
    let world = player.world.ok_or(ConsoleError::PlayerNotInWorld)?;
    Ok((world, player.owned_cells.clone()))
}

/// A human player inside a world, for the minion commands.
fn minion_owner(ctx: &Context<'_>, id: PlayerId) -> Result<()> {
    let player = ctx
        .server
        .player(id)
        .ok_or(ConsoleError::NoSuchEntity { entity: "player" })?;
    if player.router.connection().is_none() {
        return Err(ConsoleError::PlayerIsBot);
    }
    if player.world.is_none() {
        return Err(ConsoleError::PlayerNotInWorld);
    }
    if !player.is_alive() {
        return Err(ConsoleError::PlayerNotAlive);
    }
    Ok(())
}

fn mass(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let raw_id = required(args, 0, "player id")?;
    let raw_mass = required(args, 1, "mass input")?;
    let id = player_id(ctx, raw_id)?;
    let mass = parse_float(raw_mass, "mass input")?;
    if mass < 0.0 {
        return Err(ConsoleError::InvalidNumber {
            field: "mass input",
        });
    }
    let (world_id, cells) = alive_cells(ctx, id)?;

    let world = ctx
        .server
        .world_mut(world_id)
        .ok_or(ConsoleError::PlayerNotInWorld)?;
    for cell in &cells {
        if let Some(cell) = world.cell_mut(*cell) {
            cell.set_mass(mass);
        }
    }
    ctx.print(format!("player now has {} mass", mass * cells.len() as f64));
    Ok(())
}

fn merge(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let id = player_id(ctx, required(args, 0, "player id")?)?;
    let (world_id, cells) = alive_cells(ctx, id)?;
    let (x, y) = ctx
        .server
        .player(id)
        .map(|p| p.view_center)
        .unwrap_or_default();

    let world = ctx
        .server
        .world_mut(world_id)
        .ok_or(ConsoleError::PlayerNotInWorld)?;
    let square_size: f64 = cells
        .iter()
        .filter_map(|c| world.cell(*c))
        .map(Cell::square_size)
        .sum();
    if let Some(first) = world.cell_mut(cells[0]) {
        first.set_square_size(square_size);
        first.x = x;
        first.y = y;
    }
    for cell in &cells[1..] {
        ctx.server.remove_cell(world_id, *cell);
    }

    ctx.print(format!(
        "merged player from {} cells and {} mass",
        cells.len(),
        (square_size / 100.0).round()
    ));
    Ok(())
}

fn kill(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let id = player_id(ctx, required(args, 0, "player id")?)?;
    let (world_id, cells) = alive_cells(ctx, id)?;
    for cell in cells {
        ctx.server.remove_cell(world_id, cell);
    }
    ctx.print("killed player");
    Ok(())
}

fn pop(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let id = player_id(ctx, required(args, 0, "player id")?)?;
    let (world_id, cells) = alive_cells(ctx, id)?;
    ctx.server.pop_player_cell(world_id, cells[0]);
    ctx.print("popped player");
    Ok(())
}

fn add_minion(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let id = player_id(ctx, required(args, 0, "player id")?)?;
    let count = parse_count(args, 1)?;
    minion_owner(ctx, id)?;

    let mut added = 0;
    while added < count && ctx.server.add_minion(id).is_some() {
        added += 1;
    }
    ctx.print(format!("added {} minions to player", added));
    Ok(())
}

fn kill_minion(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let id = player_id(ctx, required(args, 0, "player id")?)?;
    let count = parse_count(args, 1)?;
    minion_owner(ctx, id)?;

    let mut removed = 0;
    while removed < count {
        let next = ctx
            .server
            .player(id)
            .and_then(|p| p.router.connection())
            .and_then(|c| c.minions.first().copied());
        let Some(minion) = next else {
            break;
        };
        ctx.server.close_player(minion);
        removed += 1;
    }
    ctx.print(format!("removed {} minions from player", removed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::console::{Console, DispatchOutcome};
    use crate::output::MockSink;
    use crate::server::{PlayerId, ServerHandle};

    fn setup() -> (Console, ServerHandle, MockSink, PlayerId) {
        let sink = MockSink::new();
        let settings = Settings {
            pellet_count: 0,
            virus_count: 0,
            ..Default::default()
        };
        let mut server = ServerHandle::new(settings, Box::new(sink.clone()));
        server.start();
        let id = server.connect(1, "alice").unwrap();
        (Console::with_builtins(), server, sink, id)
    }

    /// Give the player `n` cells of the given size.
    fn with_cells(server: &mut ServerHandle, id: PlayerId, sizes: &[f64]) {
        let first = server.player(id).unwrap().owned_cells[0];
        server.world_mut(1).unwrap().cell_mut(first).unwrap().size = sizes[0];
        for size in &sizes[1..] {
            let cell = server.world_mut(1).unwrap().add_cell(
                crate::server::CellKind::Player(id),
                0.0,
                0.0,
                *size,
            );
            server.player_mut(id).unwrap().owned_cells.push(cell);
        }
    }

    fn cell_sizes(server: &ServerHandle, id: PlayerId) -> Vec<f64> {
        let world = server.world(1).unwrap();
        server
            .player(id)
            .unwrap()
            .owned_cells
            .iter()
            .map(|c| world.cell(*c).unwrap().size)
            .collect()
    }

    #[test]
    fn mass_validation_chain() {
        let (console, mut server, sink, _) = setup();
        for line in ["mass", "mass 1", "mass x 5", "mass 99 5", "mass 1 heavy", "mass 1 -2"] {
            console.dispatch(line, &mut server);
        }
        assert_eq!(
            sink.lines(),
            vec![
                "missing player id",
                "missing mass input",
                "invalid number for player id",
                "no player has this id",
                "invalid number for mass input",
                "invalid number for mass input",
            ]
        );
    }

    #[test]
    fn mass_sets_every_cell() {
        let (console, mut server, sink, id) = setup();
        with_cells(&mut server, id, &[40.0, 50.0, 60.0]);
        console.dispatch(&format!("mass {} 100", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("player now has 300 mass"));
        assert_eq!(cell_sizes(&server, id), vec![100.0, 100.0, 100.0]);
    }

    #[test]
    fn dead_player_is_rejected() {
        let (console, mut server, sink, id) = setup();
        console.dispatch(&format!("kill {}", id), &mut server);
        for cmd in ["mass {} 5", "merge {}", "kill {}", "pop {}"] {
            let line = cmd.replace("{}", &id.to_string());
            assert_eq!(
                console.dispatch(&line, &mut server),
                DispatchOutcome::Failed("player is not alive".to_string())
            );
        }
        assert_eq!(sink.last().as_deref(), Some("player is not alive"));
    }

    #[test]
    fn merge_collapses_into_first_cell() {
        let (console, mut server, sink, id) = setup();
        with_cells(&mut server, id, &[30.0, 40.0]);
        server.player_mut(id).unwrap().view_center = (12.0, -8.0);

        console.dispatch(&format!("merge {}", id), &mut server);
        assert_eq!(
            sink.last().as_deref(),
            Some("merged player from 2 cells and 25 mass")
        );
        let player = server.player(id).unwrap();
        assert_eq!(player.owned_cells.len(), 1);
        let cell = server.world(1).unwrap().cell(player.owned_cells[0]).unwrap();
        assert_eq!(cell.square_size(), 2500.0);
        assert_eq!((cell.x, cell.y), (12.0, -8.0));
        assert_eq!(server.world(1).unwrap().player_cell_count(), 1);
    }

    #[test]
    fn kill_removes_all_cells() {
        let (console, mut server, sink, id) = setup();
        with_cells(&mut server, id, &[30.0, 40.0, 50.0]);
        console.dispatch(&format!("kill {}", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("killed player"));
        assert!(server.player(id).unwrap().owned_cells.is_empty());
        assert_eq!(server.world(1).unwrap().player_cell_count(), 0);
    }

    #[test]
    fn pop_splits_first_cell() {
        let (console, mut server, sink, id) = setup();
        with_cells(&mut server, id, &[300.0]);
        console.dispatch(&format!("pop {}", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("popped player"));
        assert!(server.player(id).unwrap().owned_cells.len() > 1);
    }

    #[test]
    fn minions_require_human_in_world() {
        let (console, mut server, sink, id) = setup();
        let bot = server.add_bot(1).unwrap();
        console.dispatch(&format!("addminion {}", bot), &mut server);
        assert_eq!(sink.last().as_deref(), Some("player is a bot"));
        console.dispatch(&format!("addminion {} many", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("invalid number for count"));
        console.dispatch("addminion", &mut server);
        assert_eq!(sink.last().as_deref(), Some("missing player id"));
    }

    #[test]
    fn add_and_kill_minions() {
        let (console, mut server, sink, id) = setup();
        console.dispatch(&format!("addminion {} 3", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("added 3 minions to player"));
        assert_eq!(server.bot_count(), 3);

        console.dispatch(&format!("killminion {}", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("removed 1 minions from player"));

        console.dispatch(&format!("killminion {} 10", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("removed 2 minions from player"));
        assert_eq!(server.bot_count(), 0);
    }

    #[test]
    fn addminion_stops_at_world_capacity() {
        let (console, mut server, sink, id) = setup();
        server.settings_mut().world_max_players = 3;
        console.dispatch(&format!("addminion {} 100", id), &mut server);
        assert_eq!(sink.last().as_deref(), Some("added 2 minions to player"));
        assert_eq!(server.bot_count(), 2);
    }
}
