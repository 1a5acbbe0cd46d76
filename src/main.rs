use std::io::{self, BufWriter, Write};

use argh::FromArgs;
use nix::unistd::Pid;

use vmpeek::config::Config;
use vmpeek::driver::{self, Mode};
use vmpeek::error::{Error, UsageError};
use vmpeek::process::Target;
use vmpeek::value::{self, ValueType};

/// Attach to a process and search/filter/write values in its writable memory.
#[derive(FromArgs, PartialEq, Debug)]
struct Args {
    /// the target process identifier
    #[argh(positional)]
    pid: i32,

    /// value type: {i,u}{8,16,32,64}
    #[argh(positional)]
    ty: ValueType,

    /// one of: search, filter, write
    #[argh(positional)]
    mode: Mode,

    /// textual integer (decimal, 0x hex, or 0-prefixed octal)
    #[argh(positional)]
    value: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    vmpeek::signal::install();

    let args: Args = argh::from_env();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Error> {
    let config = Config::default();

    if args.pid <= 0 {
        return Err(UsageError::Pid(args.pid.to_string()).into());
    }
    let pid = Pid::from_raw(args.pid);

    let needle = value::encode(args.ty, &args.value).map_err(UsageError::from)?;

    let target = Target::attach(pid)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stdin = io::stdin();
    let input = stdin.lock();

    let result = match args.mode {
        Mode::Search => driver::search(target.pid(), &needle, &config, &mut out),
        Mode::Filter => driver::filter(target.pid(), &needle, &config, input, &mut out),
        Mode::Write => driver::write(target.pid(), &needle, &config, input),
    };
    let _ = out.flush();

    // Detach explicitly so a detach failure surfaces with its own exit
    // code; if `result` already failed, `Target::drop` still guarantees
    // detach is attempted, but we don't let a detach failure mask a prior
    // operational failure.
    match result {
        Ok(()) => target.detach().map_err(Error::from),
        Err(e) => {
            drop(target);
            Err(e)
        }
    }
}
