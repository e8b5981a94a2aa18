//! Textual command frontend: a registry of stateless commands, run either
//! once per command-line address or line by line from an interactive prompt.

use std::io::{self, BufRead, Write};
use vmem_walk::{FlagReport, PageWalker, TargetAccess, parse_address};

/// A command handler. Receives the walker, the argument text after the
/// command name (trimmed, possibly empty) and the output sink.
pub type Handler<T> = fn(&mut PageWalker<T>, &str, &mut dyn Write) -> io::Result<()>;

struct Command<T> {
    name: &'static str,
    usage: &'static str,
    summary: &'static str,
    handler: Handler<T>,
}

/// What the session should do after a line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<T, W> {
    walker: PageWalker<T>,
    out: W,
    commands: Vec<Command<T>>,
}

impl<T: TargetAccess, W: Write> Session<T, W> {
    /// A session with `translate_address` registered.
    pub fn new(walker: PageWalker<T>, out: W) -> Self {
        let mut session = Self {
            walker,
            out,
            commands: Vec::new(),
        };
        session.register(
            "translate_address",
            "translate_address <virtual-address>",
            "Walk the page tables and print the physical address",
            translate_address,
        );
        session
    }

    /// Add a command. A later registration under the same name replaces the earlier one.
    pub fn register(
        &mut self,
        name: &'static str,
        usage: &'static str,
        summary: &'static str,
        handler: Handler<T>,
    ) {
        let command = Command {
            name,
            usage,
            summary,
            handler,
        };
        match self.commands.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = command,
            None => self.commands.push(command),
        }
    }

    /// Run `translate_address` for one argument.
    pub fn translate(&mut self, address: &str) -> io::Result<()> {
        translate_address(&mut self.walker, address, &mut self.out)
    }

    /// Execute one input line.
    ///
    /// # Errors
    /// Only if writing to the output fails; command failures are printed.
    pub fn execute(&mut self, line: &str) -> io::Result<Flow> {
        let line = line.trim();
        let (name, argument) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));

        match name {
            "" => {}
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => self.help()?,
            _ => match self.commands.iter().find(|c| c.name == name) {
                Some(command) => (command.handler)(&mut self.walker, argument, &mut self.out)?,
                None => writeln!(self.out, "Undefined command: \"{name}\". Try \"help\".")?,
            },
        }
        Ok(Flow::Continue)
    }

    /// Read and execute lines until end of input or `quit`.
    pub fn run<R: BufRead>(&mut self, input: R, prompt: bool) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            if prompt {
                write!(self.out, "(translate) ")?;
                self.out.flush()?;
            }
            let Some(line) = lines.next().transpose()? else {
                break;
            };
            if self.execute(&line)? == Flow::Quit {
                break;
            }
            self.out.flush()?;
        }
        Ok(())
    }

    fn help(&mut self) -> io::Result<()> {
        let builtin = [("help", "List commands"), ("quit", "Leave the session")];
        let registered = self.commands.iter().map(|c| (c.usage, c.summary));
        for (usage, summary) in registered.chain(builtin) {
            writeln!(self.out, "{usage:<40} {summary}")?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> (PageWalker<T>, W) {
        (self.walker, self.out)
    }
}

/// `translate_address <virtual-address>`: print each visited entry, then the
/// result line or the error.
pub fn translate_address<T: TargetAccess>(
    walker: &mut PageWalker<T>,
    argument: &str,
    out: &mut dyn Write,
) -> io::Result<()> {
    if argument.is_empty() {
        return writeln!(out, "usage: translate_address <virtual-address>");
    }

    let va = match parse_address(argument) {
        Ok(va) => va,
        Err(e) => return writeln!(out, "{e}"),
    };

    let mut reports = Vec::with_capacity(4);
    let result = walker.translate_observed(va, &mut |r: &FlagReport| reports.push(*r));

    for report in &reports {
        writeln!(out, "{report}")?;
    }
    match result {
        Ok(t) => writeln!(
            out,
            "Virtual address {:#x} translates to physical address {:#x}",
            t.virtual_address, t.physical_address
        ),
        Err(e) => {
            log::debug!("translate_address {argument}: {e:?}");
            writeln!(out, "{e}")
        }
    }
}
