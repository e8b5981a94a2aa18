use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vmem_walk::{PhysicalWindow, parse_integer};

#[derive(Parser, Debug)]
#[command(name = "translate")]
#[command(about = "Translate virtual addresses of a stopped x86-64 target by walking its page tables")]
pub struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// No diagnostics at all
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Register holding the PML4 base
    #[arg(long, default_value = "cr3", global = true)]
    pub register: String,

    #[command(subcommand)]
    pub target: TargetCommand,
}

#[derive(Subcommand, Debug)]
pub enum TargetCommand {
    /// Walk the page tables of a paused QEMU guest over QMP
    Qmp {
        /// QMP socket path
        #[arg(long, env = "TRANSLATE_QMP_SOCKET", default_value = "./qmp.sock")]
        socket: PathBuf,

        /// Read page tables through a direct map instead of physical memory
        /// (a hex offset, or `hhdm` for 0xfffffe8000000000)
        #[arg(long, value_parser = parse_window)]
        window: Option<PhysicalWindow>,

        /// Socket read timeout in milliseconds
        #[arg(long, default_value = "2000")]
        timeout_ms: u64,

        #[command(flatten)]
        addresses: Addresses,
    },

    /// Walk the page tables in a raw physical memory image
    Snapshot {
        /// Physical memory image (`pmemsave 0 <size> <file>`)
        #[arg(long)]
        memory: PathBuf,

        /// Saved `info registers` output
        #[arg(long, required_unless_present = "cr3")]
        registers: Option<PathBuf>,

        /// Root table register value (see `--register`), instead of or
        /// overriding the register dump
        #[arg(long, value_parser = parse_value)]
        cr3: Option<u64>,

        #[command(flatten)]
        addresses: Addresses,
    },
}

impl TargetCommand {
    pub fn addresses(&self) -> &[String] {
        match self {
            Self::Qmp { addresses, .. } | Self::Snapshot { addresses, .. } => &addresses.addresses,
        }
    }
}

#[derive(Args, Debug)]
pub struct Addresses {
    /// Addresses to translate; starts an interactive session if none are given
    pub addresses: Vec<String>,
}

fn parse_window(s: &str) -> Result<PhysicalWindow, String> {
    if s.eq_ignore_ascii_case("hhdm") {
        return Ok(PhysicalWindow::DirectMap {
            base: PhysicalWindow::HIGHER_HALF_DIRECT_MAP,
        });
    }
    parse_value(s).map(|base| PhysicalWindow::DirectMap { base })
}

fn parse_value(s: &str) -> Result<u64, String> {
    parse_integer(s).ok_or_else(|| format!("invalid value `{s}`: expected e.g. 0x101000"))
}
