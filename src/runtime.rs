//! Single-owner execution of ticks and console commands.
//!
//! The simulation ticker and the console run on separate threads but share
//! one [`SharedServer`] lock. Each tick and each dispatched command holds the
//! lock for its whole duration, so a tick can never observe a command's
//! mutation half-applied.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::debug;

use crate::console::Console;
use crate::error::Result;
use crate::server::ServerHandle;

/// The server behind its single-owner lock.
pub type SharedServer = Arc<Mutex<ServerHandle>>;

/// Wrap a server for sharing between the ticker and the console.
pub fn shared(server: ServerHandle) -> SharedServer {
    Arc::new(Mutex::new(server))
}

fn lock(server: &SharedServer) -> Result<MutexGuard<'_, ServerHandle>> {
    server
        .lock()
        .map_err(|_| anyhow::anyhow!("server state lock poisoned").into())
}

/// Spawn the ticker thread.
///
/// It ticks once per ticker interval until `shutdown` is set.
pub fn spawn_ticker(server: SharedServer, shutdown: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("ticker".to_string())
        .spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                let started = Instant::now();
                let interval = match lock(&server) {
                    Ok(mut guard) => {
                        guard.tick();
                        guard.ticker().interval()
                    }
                    Err(_) => break,
                };
                thread::sleep(interval.saturating_sub(started.elapsed()));
            }
            debug!("Ticker thread exiting");
        })?;
    Ok(handle)
}

/// Dispatch every line from `reader` until it is exhausted.
///
/// Returns the number of lines read.
pub fn run_console<R: BufRead>(console: &Console, server: &SharedServer, reader: R) -> Result<usize> {
    let mut handled = 0;
    for line in reader.lines() {
        let line = line?;
        let mut guard = lock(server)?;
        console.dispatch(&line, &mut guard);
        handled += 1;
    }
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::output::MockSink;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn run_console_dispatches_each_line() {
        let sink = MockSink::new();
        let server = shared(ServerHandle::new(Settings::default(), Box::new(sink.clone())));
        let console = Console::with_builtins();

        let handled = run_console(&console, &server, Cursor::new("test\n\nnope\n")).unwrap();
        assert_eq!(handled, 3);
        assert_eq!(sink.lines(), vec!["success successful", "unknown command"]);
    }

    #[test]
    fn ticker_thread_ticks_and_stops() {
        let settings = Settings {
            server_frequency: 200,
            ..Default::default()
        };
        let server = shared(ServerHandle::new(settings, Box::new(MockSink::new())));
        server.lock().unwrap().start();
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = spawn_ticker(server.clone(), shutdown.clone()).unwrap();

        thread::sleep(Duration::from_millis(100));
        shutdown.store(true, Ordering::Relaxed);
        handle.join().unwrap();

        assert!(server.lock().unwrap().snapshot()["ticker"]["average_tick_time"].is_number());
    }
}
