//! Server-level commands: help, settings, lifecycle and diagnostics.

use crate::config::Settings;
use crate::console::command::{Command, Context};
use crate::console::duration::pretty_print;
use crate::console::{expr, help};
use crate::error::{ConsoleError, Result};
use crate::server::MemoryUsage;

pub fn register(registry: &mut crate::console::CommandRegistry) {
    registry.register(Command::new(
        "help",
        "",
        "display all registered commands and their relevant information",
        help_cmd,
    ));
    registry.register(Command::new(
        "setting",
        "<name> [value]",
        "change/print the value of a setting",
        setting,
    ));
    registry.register(Command::new("stop", "", "close the server", stop));
    registry.register(Command::new("restart", "", "restart the server", restart));
    registry.register(Command::new("start", "", "start the server", start));
    registry.register(Command::new(
        "eval",
        "<expression>",
        "evaluate an expression against the server state and print the result",
        eval,
    ));
    registry.register(Command::new("test", "", "test command", |ctx, _| {
        ctx.print("success successful");
        Ok(())
    }));
    registry.register(Command::new(
        "stats",
        "",
        "display critical information about the server",
        stats,
    ));
    registry.register(Command::new("pause", "", "pause the server", pause));
    registry.register(Command::new("resume", "", "unpause the server", resume));
}

fn help_cmd(ctx: &mut Context<'_>, _args: &[&str]) -> Result<()> {
    for line in help::render(ctx.commands) {
        ctx.print(line);
    }
    Ok(())
}

fn setting(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let key = *args.first().ok_or(ConsoleError::NoSettingName)?;
    if !Settings::has_key(key) {
        return Err(ConsoleError::NoSuchSetting);
    }

    if args.len() >= 2 {
        let value = expr::evaluate(&args[1..].join(" "), &ctx.server.snapshot())?;
        ctx.server.settings_mut().set(key, value)?;
        ctx.server.apply_settings();
    }

    let current = ctx
        .server
        .settings()
        .get(key)
        .ok_or(ConsoleError::NoSuchSetting)?;
    ctx.print(expr::display(&current));
    Ok(())
}

fn stop(ctx: &mut Context<'_>, _args: &[&str]) -> Result<()> {
    if !ctx.server.stop() {
        return Err(ConsoleError::LifecycleFailed);
    }
    ctx.print("stopped");
    Ok(())
}

fn start(ctx: &mut Context<'_>, _args: &[&str]) -> Result<()> {
    if !ctx.server.start() {
        return Err(ConsoleError::LifecycleFailed);
    }
    ctx.print("started");
    Ok(())
}

fn restart(ctx: &mut Context<'_>, _args: &[&str]) -> Result<()> {
    if !ctx.server.stop() || !ctx.server.start() {
        return Err(ConsoleError::LifecycleFailed);
    }
    ctx.print("restarted");
    Ok(())
}

fn eval(ctx: &mut Context<'_>, args: &[&str]) -> Result<()> {
    let line = match expr::evaluate(&args.join(" "), &ctx.server.snapshot()) {
        Ok(value) => expr::display(&value),
        Err(e) => e.to_string(),
    };
    ctx.print(line);
    Ok(())
}

fn stats(ctx: &mut Context<'_>, _args: &[&str]) -> Result<()> {
    if !ctx.server.is_running() {
        return Err(ConsoleError::NotRunning);
    }

    let server = &*ctx.server;
    let ticker = server.ticker();
    let mut lines = vec![format!(
        "average tick time: {:.2} ms / {} ms",
        ticker.average_ms(),
        ticker.interval().as_millis()
    )];
    lines.push(match MemoryUsage::current() {
        Some(m) => format!(
            "{:.1} MiB resident / {:.1} MiB data / {:.1} MiB virtual",
            m.resident, m.data, m.virtual_size
        ),
        None => "memory usage unavailable".to_string(),
    });
    lines.push(format!("running for {}", pretty_print(server.uptime_seconds())));
    lines.push(format!(
        "{} players, {} connections, {} bots",
        server.players().len(),
        server.connection_count(),
        server.bot_count()
    ));
    lines.push(format!("{} worlds:", server.worlds().len()));
    for (id, world) in server.worlds() {
        let stats = server.world_stats(*id);
        lines.push(format!(
            "world {}: {} cells, ({}/{}/{}/{}/{})",
            id,
            world.cells.len(),
            world.player_cell_count(),
            world.pellet_count(),
            world.virus_count(),
            world.ejected_count(),
            world.mothercell_count()
        ));
        lines.push(format!(
            "    {} / {} players, {} playing, {} spectating, {} bots",
            stats.external, stats.limit, stats.playing, stats.spectating, stats.internal
        ));
    }

    for line in lines {
        ctx.print(line);
    }
    Ok(())
}

fn pause(ctx: &mut Context<'_>, _args: &[&str]) -> Result<()> {
    if !ctx.server.is_running() {
        return Err(ConsoleError::HandleNotStarted);
    }
    if !ctx.server.ticker().is_running() {
        return Err(ConsoleError::NotRunning);
    }
    ctx.server.ticker_mut().stop();
    ctx.print("paused");
    Ok(())
}

fn resume(ctx: &mut Context<'_>, _args: &[&str]) -> Result<()> {
    if !ctx.server.is_running() {
        return Err(ConsoleError::HandleNotStarted);
    }
    if ctx.server.ticker().is_running() {
        return Err(ConsoleError::AlreadyRunning);
    }
    ctx.server.ticker_mut().start();
    ctx.print("resumed");
    Ok(())
}
