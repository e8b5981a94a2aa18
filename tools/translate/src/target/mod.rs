//! Backends that give the walker access to a stopped target.

pub mod qmp;
pub mod snapshot;

use crate::cli::TargetCommand;
use anyhow::Result;
use qmp::{QmpClient, QmpTarget};
use snapshot::SnapshotTarget;
use std::time::Duration;
use vmem_walk::TargetAccess;

/// Open the backend selected on the command line.
///
/// An explicit `--cr3` is stored under `root_register`, the register the
/// walker will ask for.
pub fn open(command: &TargetCommand, root_register: &str) -> Result<Box<dyn TargetAccess>> {
    match command {
        TargetCommand::Qmp {
            socket,
            window,
            timeout_ms,
            ..
        } => {
            let client = QmpClient::connect(socket, Duration::from_millis(*timeout_ms))?;
            let window = window.unwrap_or_default();
            log::info!("connected to {} ({window:?})", socket.display());
            Ok(Box::new(QmpTarget::new(client, window)))
        }
        TargetCommand::Snapshot {
            memory,
            registers,
            cr3,
            ..
        } => {
            let mut target = SnapshotTarget::open(memory, registers.as_deref())?;
            if let Some(cr3) = cr3 {
                target = target.with_register(root_register, *cr3);
            }
            Ok(Box::new(target))
        }
    }
}
