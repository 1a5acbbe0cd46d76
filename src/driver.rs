//! Search / filter / write drivers: compose the region enumerator, memory
//! window, and streaming matcher into the three user-visible modes.

use std::io::{BufRead, Write};
use std::str::FromStr;

use nix::unistd::Pid;

use crate::config::Config;
use crate::error::{Error, UsageError};
use crate::mem::MemoryWindow;
use crate::procfs;
use crate::scan::scan_region;
use crate::value::Needle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    Filter,
    Write,
}

impl FromStr for Mode {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(Mode::Search),
            "filter" => Ok(Mode::Filter),
            "write" => Ok(Mode::Write),
            _ => Err(UsageError::Mode(s.to_string())),
        }
    }
}

/// Enumerates the target's writable regions and streams each through the
/// matcher, writing matching addresses to `out` in ascending order
/// (per-region ascending, regions in enumerator order).
pub fn search(
    pid: Pid,
    needle: &Needle,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), Error> {
    let maps = std::fs::read_to_string(format!("/proc/{}/maps", pid.as_raw()))
        .map_err(|source| crate::mem::IoError::Open {
            path: format!("/proc/{}/maps", pid.as_raw()).into(),
            source,
        })?;
    let regions = procfs::parse(&maps)?;
    log::info!("{} regions in /proc/{}/maps", regions.len(), pid.as_raw());

    let mut window = MemoryWindow::open_read(pid)?;
    for region in regions.iter().filter(|r| r.is_writable()) {
        if crate::signal::interrupted() {
            log::warn!("interrupted, stopping before region {:#x}", region.start);
            break;
        }
        log::debug!(
            "scanning region {:#x}-{:#x} ({} bytes, flags {:?})",
            region.start,
            region.end,
            region.len(),
            region.flags
        );
        window.seek(region.start)?;
        let region_start = region.start;
        let len = region.len();
        let needle_bytes = needle.as_bytes();
        let page_size = config.page_size;
        scan_region(&mut window, region_start, len, needle_bytes, page_size, |addr| {
            let _ = writeln!(out, "{:#x}", addr);
        })?;
    }
    Ok(())
}

/// Reads candidate addresses from `input`, one per line, and re-checks each
/// against the target's current memory; matching addresses are written to
/// `out` in input order.
pub fn filter(
    pid: Pid,
    needle: &Needle,
    config: &Config,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<(), Error> {
    let mut window = MemoryWindow::open_read(pid)?;
    for_each_candidate(config, input, |addr| {
        let bytes = window.read_exact_at(addr, needle.len())?;
        if bytes == needle.as_bytes() {
            let _ = writeln!(out, "{:#x}", addr);
        } else {
            log::debug!("{:#x}: no longer matches", addr);
        }
        Ok(())
    })
}

/// Reads candidate addresses from `input`, one per line, and writes `value`
/// at each in turn. Stops on the first I/O error.
pub fn write(
    pid: Pid,
    value: &Needle,
    config: &Config,
    input: impl BufRead,
) -> Result<(), Error> {
    let mut window = MemoryWindow::open_write(pid)?;
    for_each_candidate(config, input, |addr| {
        window.write_exact_at(addr, value.as_bytes())?;
        Ok(())
    })
}

/// Shared stdin-driving loop for `filter`/`write`: parses one candidate
/// address per line (`strtoul`-style: decimal/hex/octal), skipping lines
/// that don't parse with a warning rather than failing the whole run.
fn for_each_candidate(
    config: &Config,
    input: impl BufRead,
    mut on_addr: impl FnMut(u64) -> Result<(), Error>,
) -> Result<(), Error> {
    for line in input.lines() {
        if crate::signal::interrupted() {
            log::warn!("interrupted, stopping candidate loop");
            break;
        }
        let line = line.map_err(crate::mem::IoError::Stdin)?;
        if line.len() > config.max_candidate_line {
            log::warn!("candidate line too long, skipping: {:?}", line);
            continue;
        }
        let addr = match crate::numeric::parse_c_unsigned(&line) {
            Some(addr) => addr,
            None => {
                if !line.trim().is_empty() {
                    log::warn!("could not parse candidate address {:?}, skipping", line);
                }
                continue;
            }
        };
        on_addr(addr)?;
    }
    Ok(())
}
