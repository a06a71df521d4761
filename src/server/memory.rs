//! Process memory figures for the `stats` command.

use std::fs;

/// Memory usage of the current process, in MiB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryUsage {
    pub resident: f64,
    pub data: f64,
    pub virtual_size: f64,
}

impl MemoryUsage {
    /// Read the current figures, where the platform exposes them.
    pub fn current() -> Option<Self> {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        parse_status(&status)
    }
}

/// Parse the `Vm*` lines of a `/proc/<pid>/status` document.
pub fn parse_status(status: &str) -> Option<MemoryUsage> {
    let field = |name: &str| -> Option<f64> {
        let line = status.lines().find(|l| l.starts_with(name))?;
        let kib: f64 = line[name.len()..]
            .trim()
            .trim_end_matches("kB")
            .trim()
            .parse()
            .ok()?;
        Some(kib / 1024.0)
    };

    Some(MemoryUsage {
        resident: field("VmRSS:")?,
        data: field("VmData:")?,
        virtual_size: field("VmSize:")?,
    })
}
