//! Register values from textual `info registers` dumps.
//!
//! Two layouts are understood:
//!
//! ```text
//! QEMU monitor:  CR0=80010033 CR2=0000000000000000 CR3=0000000000101000 CR4=00000020
//! gdb:           cr3            0x101000            [ PDBR=257 PCID=0 ]
//! ```
//!
//! Register names match case-insensitively; values are hexadecimal.

/// Find `name` in `dump` and return its value.
#[must_use]
pub fn find_register(dump: &str, name: &str) -> Option<u64> {
    dump.lines()
        .find_map(|line| find_assignment(line, name).or_else(|| find_column(line, name)))
}

/// `NAME=hex` tokens, several per line.
fn find_assignment(line: &str, name: &str) -> Option<u64> {
    line.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| parse_hex(value))
}

/// `name  0xhex  ...` with the name in the first column.
fn find_column(line: &str, name: &str) -> Option<u64> {
    let mut columns = line.split_whitespace();
    let key = columns.next()?;
    if !key.eq_ignore_ascii_case(name) {
        return None;
    }
    columns.next().and_then(parse_hex)
}

fn parse_hex(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QEMU_DUMP: &str = "\
RAX=0000000000000000 RBX=0000000000000000 RCX=0000000000000000 RDX=0000000000000663
RIP=ffffffff80001234 RFL=00000002 [-------] CPL=0 II=0 A20=1 SMM=0 HLT=1
ES =0000 0000000000000000 0000ffff 00009300
GDT=     ffffffff80010000 00000037
CR0=80010033 CR2=0000000000000000 CR3=0000000000101000 CR4=00000020
EFER=0000000000000d00
";

    #[test]
    fn reads_qemu_monitor_layout() {
        assert_eq!(find_register(QEMU_DUMP, "cr3"), Some(0x10_1000));
        assert_eq!(find_register(QEMU_DUMP, "CR0"), Some(0x8001_0033));
        assert_eq!(find_register(QEMU_DUMP, "rip"), Some(0xFFFF_FFFF_8000_1234));
        assert_eq!(find_register(QEMU_DUMP, "efer"), Some(0xD00));
    }

    #[test]
    fn reads_gdb_layout() {
        let dump = "cr3            0x101000            [ PDBR=257 PCID=0 ]\n";
        assert_eq!(find_register(dump, "cr3"), Some(0x10_1000));
        assert_eq!(find_register(dump, "cr4"), None);
    }

    #[test]
    fn missing_or_malformed() {
        assert_eq!(find_register(QEMU_DUMP, "cr8"), None);
        assert_eq!(find_register("CR3=zzzz", "cr3"), None);
        assert_eq!(find_register("", "cr3"), None);
    }
}
