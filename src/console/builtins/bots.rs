//! Player bot commands.

use crate::console::args::{parse_count, parse_id, required};
use crate::console::command::{Command, Context};
use crate::console::CommandRegistry;
use crate::error::{ConsoleError, Result};
use crate::server::{PlayerId, RouterKind, WorldId};

pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command::new(
        "addbot",
        "<world id> [count=1]",
        "assign player bots to a world",
        add_bot,
    ));
    registry.register(Command::new(
        "killbot",
        "<world id> [count=1]",
        "remove player bots from a world",
        kill_bot,
    ));
}

fn world_id(ctx: &Context<'_>, args: &[&str]) -> Result<WorldId> {
    let id = parse_id(required(args, 0, "world id")?, "world id")?;
    if ctx.server.world(id).is_none() {
        return Err(ConsoleError::NoSuchEntity { entity: "world" });
    }
    Ok(id)
}

fn add_bot(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let id = world_id(ctx, args)?;
    let count = parse_count(args, 1)?;

    let mut added = 0;
    while added < count && ctx.server.add_bot(id).is_some() {
        added += 1;
    }
    ctx.print(format!("added {} player bots to world", added));
    Ok(())
}

fn kill_bot(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let id = world_id(ctx, args)?;
    let count = parse_count(args, 1)?;

    let server = &*ctx.server;
    let bots: Vec<PlayerId> = server
        .world(id)
        .map(|w| w.players.as_slice())
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|p| {
            server
                .player(*p)
                .is_some_and(|p| p.router.kind() == RouterKind::Bot)
        })
        .take(count as usize)
        .collect();

    for bot in &bots {
        ctx.server.close_player(*bot);
    }
    ctx.print(format!("removed {} player bots from world", bots.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::console::Console;
    use crate::output::MockSink;
    use crate::server::ServerHandle;

    fn setup() -> (Console, ServerHandle, MockSink) {
        let sink = MockSink::new();
        let mut server = ServerHandle::new(Settings::default(), Box::new(sink.clone()));
        server.start();
        (Console::with_builtins(), server, sink)
    }

    #[test]
    fn world_validation_chain() {
        let (console, mut server, sink) = setup();
        for line in ["addbot", "addbot one", "addbot 7", "killbot 1 x"] {
            console.dispatch(line, &mut server);
        }
        assert_eq!(
            sink.lines(),
            vec![
                "missing world id",
                "invalid number for world id",
                "no world has this id",
                "invalid number for count",
            ]
        );
    }

    #[test]
    fn addbot_defaults_to_one() {
        let (console, mut server, sink) = setup();
        console.dispatch("addbot 1", &mut server);
        assert_eq!(sink.last().as_deref(), Some("added 1 player bots to world"));
        assert_eq!(server.world_stats(1).internal, 1);
    }

    #[test]
    fn addbot_stops_at_world_capacity() {
        let (console, mut server, sink) = setup();
        server.settings_mut().world_max_players = 5;
        console.dispatch("addbot 1 1000", &mut server);
        assert_eq!(sink.last().as_deref(), Some("added 5 player bots to world"));
        assert_eq!(server.world(1).unwrap().players.len(), 5);

        console.dispatch("addbot 1 4294967295", &mut server);
        assert_eq!(sink.last().as_deref(), Some("added 0 player bots to world"));
    }

    #[test]
    fn killbot_never_goes_negative() {
        let (console, mut server, sink) = setup();
        console.dispatch("addbot 1 2", &mut server);
        console.dispatch("killbot 1 5", &mut server);
        assert_eq!(sink.last().as_deref(), Some("removed 2 player bots from world"));
        assert_eq!(server.world_stats(1).internal, 0);

        console.dispatch("killbot 1", &mut server);
        assert_eq!(sink.last().as_deref(), Some("removed 0 player bots from world"));
    }

    #[test]
    fn killbot_spares_humans_and_minions() {
        let (console, mut server, _sink) = setup();
        let human = server.connect(1, "alice").unwrap();
        server.add_minion(human).unwrap();
        console.dispatch("addbot 1 1", &mut server);
        console.dispatch("killbot 1 10", &mut server);
        assert!(server.player(human).is_some());
        assert_eq!(server.world_stats(1).internal, 1);
        assert_eq!(server.world_stats(1).external, 1);
    }
}
