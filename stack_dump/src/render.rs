use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use canary_stack::{Canary, CanaryState, Checksum, HashPair, Slot, Snapshot, StackState};
use crossterm::style::{Color, ContentStyle, StyledContent, Stylize};

/// Whether the dump is styled with terminal escape codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Color,
    Plain,
}

impl Palette {
    /// `Color` when stdout is a terminal, `Plain` otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if io::stdout().is_terminal() {
            Self::Color
        } else {
            Self::Plain
        }
    }

    fn paint<D: Display>(self, content: D, color: Color) -> StyledContent<D> {
        let style = match self {
            Self::Color => ContentStyle::new().with(color).bold(),
            Self::Plain => ContentStyle::new(),
        };
        style.apply(content)
    }
}

/// Writes a human-readable dump of `snapshot` to `out`.
///
/// # Errors
///
/// From the underlying writer.
pub fn render<W: Write>(out: &mut W, snapshot: &Snapshot, palette: Palette) -> io::Result<()> {
    writeln!(out, "Stack {}", palette.paint(snapshot.provenance, Color::Cyan))?;

    let state = match snapshot.state {
        StackState::Live => palette.paint("live", Color::Green),
        StackState::Destroyed => palette.paint("destroyed", Color::Yellow),
    };
    writeln!(out, "{} = {state}", palette.paint("state   ", Color::Magenta))?;
    writeln!(out, "{} = {}", palette.paint("size    ", Color::Magenta), snapshot.size)?;
    writeln!(out, "{} = {}", palette.paint("capacity", Color::Magenta), snapshot.capacity)?;

    render_slots(out, snapshot, palette)?;
    if let Some(guards) = &snapshot.guards {
        render_canaries(out, "struct canaries", guards.struct_canaries, palette)?;
        match guards.data_canaries {
            Some(canaries) => render_canaries(out, "data canaries  ", canaries, palette)?,
            None => writeln!(out, "{} = -", palette.paint("data canaries  ", Color::Magenta))?,
        }
        render_hash(out, "struct hash    ", Some(guards.struct_hash), palette)?;
        render_hash(out, "data hash      ", guards.data_hash, palette)?;
    }

    render_faults(out, snapshot, palette)
}

fn render_slots<W: Write>(out: &mut W, snapshot: &Snapshot, palette: Palette) -> io::Result<()> {
    write!(out, "{}", palette.paint("data", Color::Magenta))?;
    if snapshot.slots.is_empty() {
        return writeln!(out, " [{}]", palette.paint("NULL", Color::Red));
    }
    writeln!(out, " [{} slots]", snapshot.slots.len())?;

    for (index, slot) in snapshot.slots.iter().enumerate() {
        let marker = match index.cmp(&snapshot.size) {
            std::cmp::Ordering::Less => '*',
            std::cmp::Ordering::Equal => '>',
            std::cmp::Ordering::Greater => ' ',
        };
        write!(out, "{}[{index}] = ", palette.paint(marker, Color::Cyan))?;
        match slot {
            Slot::Value(value) => writeln!(out, "{value}")?,
            Slot::Poison => writeln!(out, "{}", palette.paint("POISON", Color::Red))?,
        }
    }
    Ok(())
}

fn render_canaries<W: Write>(
    out: &mut W,
    label: &str,
    [left, right]: [Canary; 2],
    palette: Palette,
) -> io::Result<()> {
    writeln!(
        out,
        "{} = [{left:#018x}, {right:#018x}] ({}, {})",
        palette.paint(label, Color::Magenta),
        canary_status(left, palette),
        canary_status(right, palette),
    )
}

fn canary_status(value: Canary, palette: Palette) -> StyledContent<&'static str> {
    match CanaryState::of(value) {
        CanaryState::Intact => palette.paint("intact", Color::Green),
        CanaryState::Destroyed => palette.paint("DESTROYED", Color::Yellow),
        CanaryState::Clobbered => palette.paint("CLOBBERED", Color::Red),
    }
}

fn render_hash<W: Write>(
    out: &mut W,
    label: &str,
    hash: Option<HashPair>,
    palette: Palette,
) -> io::Result<()> {
    let label = palette.paint(label, Color::Magenta);
    match hash {
        None => writeln!(out, "{label} = -"),
        Some(pair) if pair.is_match() => writeln!(
            out,
            "{label} = {} ({})",
            hex(pair.stored),
            palette.paint("ok", Color::Green)
        ),
        Some(pair) => writeln!(
            out,
            "{label} = stored {} computed {} ({})",
            hex(pair.stored),
            hex(pair.computed),
            palette.paint("MISMATCH", Color::Red)
        ),
    }
}

fn hex(value: Checksum) -> String {
    format!("{value:#018x}")
}

fn render_faults<W: Write>(out: &mut W, snapshot: &Snapshot, palette: Palette) -> io::Result<()> {
    if snapshot.faults.is_empty() {
        return writeln!(out, "{} none", palette.paint("faults:", Color::Magenta));
    }
    for (flag, description) in snapshot.faults.descriptions() {
        writeln!(
            out,
            "{} {flag}: {description}",
            palette.paint("Error:", Color::Red)
        )?;
    }
    Ok(())
}
