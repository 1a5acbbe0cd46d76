//! Integration tests that drive the real attach/search/filter/write path
//! against a forked child process, in the style of the ptrace test suites
//! in this space (fork a controlled child rather than depend on a system
//! daemon or a separate "hackme" binary).

use std::io::Cursor;
use std::thread;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::sys::wait::waitpid;
use nix::unistd::{fork, ForkResult, Pid};

use vmpeek::config::Config;
use vmpeek::driver;
use vmpeek::process::Target;
use vmpeek::value::{self, ValueType};

const MAGIC: i32 = 0x1234abcdu32 as i32;

/// Forks a child that parks a known `i32` value inside a writable buffer
/// and then sleeps, giving the parent a window to attach and scan. Returns
/// the child's pid; the caller must `kill`+`waitpid` it when done.
fn spawn_target() -> Pid {
    match unsafe { fork() }.expect("fork") {
        ForkResult::Child => {
            // A page-sized heap buffer lands in one of the child's
            // writable /proc/<pid>/maps regions, same as the original
            // "hackme" target's `volatile T mem[...]`.
            let mut buf: Vec<i32> = vec![0; 4096];
            buf[1234] = MAGIC;
            std::hint::black_box(&buf);
            loop {
                thread::sleep(Duration::from_secs(1));
                std::hint::black_box(&buf);
            }
        }
        ForkResult::Parent { child } => {
            thread::sleep(Duration::from_millis(200));
            child
        }
    }
}

fn kill_target(pid: Pid) {
    let _ = signal::kill(pid, Signal::SIGKILL);
    let _ = waitpid(pid, None);
}

#[test]
fn search_then_filter_then_write_roundtrip() {
    let pid = spawn_target();
    let config = Config::default();
    let ty: ValueType = "i32".parse().unwrap();
    let needle = value::encode(ty, "0x1234abcd").unwrap();

    let target = Target::attach(pid).expect("attach");

    let mut found = Vec::new();
    driver::search(target.pid(), &needle, &config, &mut found).expect("search");
    let found = String::from_utf8(found).unwrap();
    let addresses: Vec<u64> = found
        .lines()
        .map(|line| u64::from_str_radix(line.trim_start_matches("0x"), 16).unwrap())
        .collect();
    assert!(
        !addresses.is_empty(),
        "search should find at least one occurrence of the magic value"
    );

    // filter(search(v)) is idempotent: re-checking the same candidates
    // against the (unchanged) target memory returns the same set.
    let mut refiltered = Vec::new();
    let input = Cursor::new(found.clone());
    driver::filter(target.pid(), &needle, &config, input, &mut refiltered).expect("filter");
    let refiltered = String::from_utf8(refiltered).unwrap();
    assert_eq!(
        refiltered.lines().collect::<Vec<_>>(),
        found.lines().collect::<Vec<_>>()
    );

    // write(v) at every candidate, then searching for the new value finds
    // those same addresses.
    let new_ty: ValueType = "i32".parse().unwrap();
    let new_needle = value::encode(new_ty, "0x41414141").unwrap();
    let input = Cursor::new(found.clone());
    driver::write(target.pid(), &new_needle, &config, input).expect("write");

    let mut refound = Vec::new();
    driver::search(target.pid(), &new_needle, &config, &mut refound).expect("search after write");
    let refound = String::from_utf8(refound).unwrap();
    for addr in &addresses {
        assert!(
            refound.lines().any(|l| l == format!("{:#x}", addr)),
            "address {:#x} written should still be found by a subsequent search",
            addr
        );
    }

    target.detach().expect("detach");
    kill_target(pid);
}

#[test]
fn filter_drops_stale_candidates() {
    let pid = spawn_target();
    let config = Config::default();
    let ty: ValueType = "i32".parse().unwrap();
    let needle = value::encode(ty, "0x1234abcd").unwrap();
    let wrong_needle = value::encode(ty, "0xdeadbeef").unwrap();

    let target = Target::attach(pid).expect("attach");

    let mut found = Vec::new();
    driver::search(target.pid(), &needle, &config, &mut found).expect("search");
    let found = String::from_utf8(found).unwrap();
    assert!(!found.is_empty());

    // The same candidate addresses, filtered against an unrelated needle,
    // should all be dropped.
    let mut refiltered = Vec::new();
    let input = Cursor::new(found);
    driver::filter(target.pid(), &wrong_needle, &config, input, &mut refiltered).expect("filter");
    assert!(String::from_utf8(refiltered).unwrap().is_empty());

    target.detach().expect("detach");
    kill_target(pid);
}
