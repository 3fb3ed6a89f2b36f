use std::io::{self, Write};
use std::process;

use canary_stack::{provenance, Canary, Guarded, Protection, Stack, StackError, Unguarded};
use clap::{Parser, ValueEnum};
use stack_dump::{render, Palette};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const GARBAGE: Canary = 0xDEAD_BEEF;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Corruption {
    /// Overwrite the left header canary
    LeftCanary,
    /// Overwrite the right header canary
    RightCanary,
    /// Overwrite the canary in front of the slots
    LeftDataCanary,
    /// Overwrite the canary behind the slots
    RightDataCanary,
    /// Change the bottom slot without resealing the checksum
    Slot,
    /// Set size equal to capacity
    Size,
}

#[derive(Parser, Debug)]
#[command(name = "stack_dump")]
#[command(
    about = "Walk a self-verifying stack through construct, push, pop and destroy, dumping it after each step",
    long_about = None
)]
struct Args {
    /// Initial capacity
    #[arg(short, long, default_value_t = 1)]
    capacity: usize,

    /// Values to push, comma separated
    #[arg(
        short = 'p',
        long = "push",
        value_delimiter = ',',
        allow_negative_numbers = true,
        default_values_t = [13, 13]
    )]
    values: Vec<i32>,

    /// Number of pops after the pushes
    #[arg(long, default_value_t = 1)]
    pops: usize,

    /// Use a stack without canaries and checksums
    #[arg(long, default_value_t = false)]
    unguarded: bool,

    /// Corrupt the stack between the pushes and the pops
    #[arg(long, value_enum)]
    corrupt: Option<Corruption>,

    /// Never emit color codes
    #[arg(long, default_value_t = false)]
    plain: bool,

    /// Log verbosity: -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Stack construction error: {0}")]
    Construct(#[from] StackError),
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// Deliberate corruption, as far as a protection level has anything to corrupt.
trait Inject: Protection {
    /// Returns false if `corruption` does not apply to this protection level.
    fn inject(stack: &mut Stack<Self>, corruption: Corruption) -> bool;
}

fn inject_structural<P: Protection>(stack: &mut Stack<P>, corruption: Corruption) -> bool {
    match corruption {
        Corruption::Slot => {
            let value = stack.get(0).map_or(0, |value| value.wrapping_add(1));
            stack.tamper().slot(0, value);
        }
        Corruption::Size => {
            let capacity = stack.capacity();
            stack.tamper().size(capacity);
        }
        _ => return false,
    }
    true
}

impl Inject for Guarded {
    fn inject(stack: &mut Stack<Self>, corruption: Corruption) -> bool {
        match corruption {
            Corruption::LeftCanary => {
                stack.tamper().left_struct_canary(GARBAGE);
            }
            Corruption::RightCanary => {
                stack.tamper().right_struct_canary(GARBAGE);
            }
            Corruption::LeftDataCanary => {
                stack.tamper().left_data_canary(GARBAGE);
            }
            Corruption::RightDataCanary => {
                stack.tamper().right_data_canary(GARBAGE);
            }
            Corruption::Slot | Corruption::Size => return inject_structural(stack, corruption),
        }
        true
    }
}

impl Inject for Unguarded {
    fn inject(stack: &mut Stack<Self>, corruption: Corruption) -> bool {
        inject_structural(stack, corruption)
    }
}

fn dump<P: Protection, W: Write>(
    out: &mut W,
    label: &str,
    stack: &Stack<P>,
    palette: Palette,
) -> io::Result<()> {
    writeln!(out, "== {label}")?;
    render(out, &stack.snapshot(), palette)?;
    writeln!(out)
}

fn walk<P: Inject, W: Write>(args: &Args, out: &mut W, palette: Palette) -> Result<(), DemoError> {
    let mut stack: Stack<P> = Stack::new(args.capacity, provenance!(stack))?;
    info!(capacity = args.capacity, "constructed demo stack");
    dump(out, &format!("construct({})", args.capacity), &stack, palette)?;

    for &value in &args.values {
        let label = match stack.push(value) {
            Ok(()) => format!("push({value})"),
            Err(err) => format!("push({value}): {err}"),
        };
        dump(out, &label, &stack, palette)?;
    }

    if let Some(corruption) = args.corrupt {
        if P::inject(&mut stack, corruption) {
            let faults = stack.verify();
            dump(out, &format!("corrupt({corruption:?}), verify: {faults}"), &stack, palette)?;
        } else {
            warn!(?corruption, "nothing to corrupt on an unguarded stack");
        }
    }

    for _ in 0..args.pops {
        let label = match stack.pop() {
            Ok(value) => format!("pop() = {value}"),
            Err(err) => format!("pop(): {err}"),
        };
        dump(out, &label, &stack, palette)?;
    }

    let label = match stack.destroy() {
        Ok(found) => format!("destroy(), found before teardown: {found}"),
        Err(err) => format!("destroy(): {err}"),
    };
    dump(out, &label, &stack, palette)?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let palette = if args.plain {
        Palette::Plain
    } else {
        Palette::detect()
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if args.unguarded {
        walk::<Unguarded, _>(&args, &mut out, palette)
    } else {
        walk::<Guarded, _>(&args, &mut out, palette)
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}
