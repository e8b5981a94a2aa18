//! Offline target: a raw physical memory image plus captured registers.
//!
//! The image is a flat dump in which file offset `n` holds physical byte `n`,
//! as written by QEMU's `pmemsave 0 <size> <file>`. Registers come from a saved
//! `info registers` dump and/or explicit values.

use crate::registers::find_register;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use vmem_walk::{PhysicalAddress, TargetAccess, TargetError};

pub struct SnapshotTarget<M> {
    memory: M,
    memory_len: u64,
    dump: String,
    overrides: Vec<(String, u64)>,
}

impl SnapshotTarget<BufReader<File>> {
    /// Open a memory image and an optional register dump.
    pub fn open(memory: &Path, registers: Option<&Path>) -> Result<Self> {
        let file = File::open(memory)
            .with_context(|| format!("Failed to open memory image {}", memory.display()))?;
        let dump = match registers {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read register dump {}", path.display()))?,
            None => String::new(),
        };

        let target = Self::new(BufReader::new(file), dump)
            .with_context(|| format!("Failed to size memory image {}", memory.display()))?;
        log::info!(
            "snapshot {}: {} bytes of physical memory",
            memory.display(),
            target.memory_len()
        );
        Ok(target)
    }
}

impl<M: Read + Seek> SnapshotTarget<M> {
    pub fn new(mut memory: M, dump: String) -> io::Result<Self> {
        let memory_len = memory.seek(SeekFrom::End(0))?;
        Ok(Self {
            memory,
            memory_len,
            dump,
            overrides: Vec::new(),
        })
    }

    /// Set `name` explicitly; takes precedence over the dump.
    #[must_use]
    pub fn with_register(mut self, name: &str, value: u64) -> Self {
        self.overrides.push((name.to_owned(), value));
        self
    }

    #[must_use]
    pub const fn memory_len(&self) -> u64 {
        self.memory_len
    }
}

impl<M: Read + Seek> TargetAccess for SnapshotTarget<M> {
    fn read_register(&mut self, name: &str) -> Result<u64, TargetError> {
        self.overrides
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|&(_, value)| value)
            .or_else(|| find_register(&self.dump, name))
            .ok_or_else(|| TargetError::UnknownRegister(name.to_owned()))
    }

    fn read_physical_u64(&mut self, address: PhysicalAddress) -> Result<u64, TargetError> {
        let start = address.as_u64();
        match start.checked_add(8) {
            Some(end) if end <= self.memory_len => {}
            _ => return Err(TargetError::OutOfRange(start)),
        }

        let mut bytes = [0u8; 8];
        self.memory
            .seek(SeekFrom::Start(start))
            .and_then(|_| self.memory.read_exact(&mut bytes))
            .map_err(|e| TargetError::Backend(format!("image read at {start:#x} failed: {e}")))?;
        Ok(u64::from_le_bytes(bytes))
    }
}
