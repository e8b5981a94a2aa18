//! `translate`: virtual-to-physical translation for a stopped x86-64 target.
//!
//! ```text
//! translate qmp --socket ./qmp.sock 0xffffffff80001000
//! translate snapshot --memory mem.bin --registers regs.txt
//! ```
//!
//! With addresses on the command line each one is translated once; without,
//! an interactive session reads `translate_address <va>` commands from stdin.

mod cli;
mod frontend;
mod logger;
mod registers;
mod target;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};
use vmem_walk::PageWalker;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logger::StderrLogger::from_flags(cli.verbose, cli.quiet)
        .init()
        .context("Failed to install logger")?;

    let mut target = target::open(&cli.target, &cli.register)?;
    let walker = PageWalker::with_root_register(target.as_mut(), cli.register.as_str());
    let mut session = frontend::Session::new(walker, io::stdout().lock());

    let addresses = cli.target.addresses();
    if addresses.is_empty() {
        let stdin = io::stdin();
        let prompt = stdin.is_terminal();
        session.run(stdin.lock(), prompt)?;
    } else {
        for address in addresses {
            session.translate(address)?;
        }
    }
    Ok(())
}
