//! I/O helpers and the memory window: a seekable byte view onto
//! `/proc/<pid>/mem`, plus the full-read/full-write loops every driver needs
//! because reads and writes against a memory-backed file descriptor are
//! routinely short.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use nix::unistd::Pid;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("seek to {addr:#x}: {source}")]
    Seek {
        addr: u64,
        #[source]
        source: io::Error,
    },
    #[error("read at {addr:#x}: {source}")]
    Read {
        addr: u64,
        #[source]
        source: io::Error,
    },
    #[error("read at {addr:#x}: expected {expected} bytes, got {got} before EOF")]
    ShortRead {
        addr: u64,
        expected: usize,
        got: usize,
    },
    #[error("write at {addr:#x}: {source}")]
    Write {
        addr: u64,
        #[source]
        source: io::Error,
    },
    #[error("reading candidate addresses from stdin: {0}")]
    Stdin(#[source] io::Error),
}

/// A seekable, read-only or write-only handle onto a target's address
/// space, opened against `/proc/<pid>/mem`.
pub struct MemoryWindow {
    file: File,
}

impl MemoryWindow {
    pub fn open_read(pid: Pid) -> Result<Self, IoError> {
        Self::open(pid, false)
    }

    pub fn open_write(pid: Pid) -> Result<Self, IoError> {
        Self::open(pid, true)
    }

    fn open(pid: Pid, write: bool) -> Result<Self, IoError> {
        let path = PathBuf::from(format!("/proc/{}/mem", pid.as_raw()));
        let file = OpenOptions::new()
            .read(!write)
            .write(write)
            .open(&path)
            .map_err(|source| IoError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self { file })
    }

    pub fn seek(&mut self, addr: u64) -> Result<(), IoError> {
        self.file
            .seek(SeekFrom::Start(addr))
            .map(|_| ())
            .map_err(|source| IoError::Seek { addr, source })
    }

    /// Reads exactly `n` bytes starting at the current position. Used by
    /// `filter`/`write`, which always know the needle/value width up
    /// front; unlike the streaming matcher, a short read here is an error,
    /// not a region boundary.
    pub fn read_exact_at(&mut self, addr: u64, n: usize) -> Result<Vec<u8>, IoError> {
        let mut buf = vec![0u8; n];
        read_exact(&mut self.file, &mut buf).map_err(|(got, source)| match source {
            Some(source) => IoError::Read { addr, source },
            None => IoError::ShortRead {
                addr,
                expected: n,
                got,
            },
        })?;
        Ok(buf)
    }

    pub fn write_exact_at(&mut self, addr: u64, bytes: &[u8]) -> Result<(), IoError> {
        write_exact(&mut self.file, bytes).map_err(|source| IoError::Write { addr, source })
    }
}

impl Read for MemoryWindow {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Loops until `buf` is fully populated. On early EOF (a zero-length read
/// before `buf` is full), returns `Err((bytes_read, None))`; on I/O error,
/// `Err((bytes_read, Some(err)))`.
fn read_exact(h: &mut impl Read, buf: &mut [u8]) -> Result<(), (usize, Option<io::Error>)> {
    let mut off = 0;
    while off < buf.len() {
        match h.read(&mut buf[off..]) {
            Ok(0) => return Err((off, None)),
            Ok(n) => off += n,
            Err(e) => return Err((off, Some(e))),
        }
    }
    Ok(())
}

/// Loops until all of `buf` has been written.
fn write_exact(h: &mut impl Write, buf: &[u8]) -> Result<(), io::Error> {
    let mut off = 0;
    while off < buf.len() {
        let n = h.write(&buf[off..])?;
        off += n;
    }
    Ok(())
}
