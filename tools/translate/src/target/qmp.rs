//! Live target: a paused QEMU guest, reached through its QMP socket.
//!
//! Start QEMU with `-qmp unix:./qmp.sock,server,nowait` and stop the guest
//! (`stop` in the monitor, or a gdb breakpoint) before translating. Registers
//! and memory are read with monitor commands:
//!
//! | Need | Monitor command |
//! |------|-----------------|
//! | run state | `query-status` (QMP) |
//! | `cr3` | `info registers` |
//! | physical read | `xp /1gx <pa>` |
//! | windowed read | `x /1gx <window + pa>` |

use crate::registers::find_register;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;
use vmem_walk::{PhysicalAddress, PhysicalWindow, TargetAccess, TargetError, parse_integer};

#[derive(Serialize)]
struct QmpCommand<'a> {
    execute: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<serde_json::Value>,
    id: u64,
}

#[derive(Deserialize, Debug)]
struct QmpResponse {
    #[serde(rename = "return")]
    return_: Option<serde_json::Value>,
    error: Option<QmpError>,
    event: Option<String>,
    id: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct QmpError {
    class: String,
    desc: String,
}

/// A QMP connection.
///
/// Every command carries a fresh `id` and only the reply echoing that id is
/// accepted. A reply that arrives after its command timed out is dropped when
/// the next command reads past it, so one slow answer fails one command only.
pub struct QmpClient {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
    next_id: u64,
    /// Bytes of a line whose read timed out half-way.
    partial: String,
}

impl QmpClient {
    pub fn connect(path: &Path, timeout: Duration) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Cannot reach QMP socket {}", path.display()))?;
        stream
            .set_read_timeout(Some(timeout))
            .context("Cannot set QMP read timeout")?;
        Self::handshake(stream)
    }

    /// Read the greeting and negotiate capabilities on an open stream.
    pub fn handshake(stream: UnixStream) -> Result<Self> {
        let writer = stream.try_clone()?;
        let mut client = Self {
            reader: BufReader::new(stream),
            writer,
            next_id: 1,
            partial: String::new(),
        };

        let greeting = client.next_message().context("No QMP greeting")?;
        log::debug!("QMP greeting: {greeting:?}");
        client.execute("qmp_capabilities", None)?;
        Ok(client)
    }

    /// Send `command` and wait for the reply carrying its id.
    pub fn execute(
        &mut self,
        command: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let id = self.next_id;
        self.next_id += 1;

        let mut request = serde_json::to_vec(&QmpCommand {
            execute: command,
            arguments,
            id,
        })?;
        request.push(b'\n');
        self.writer
            .write_all(&request)
            .with_context(|| format!("Cannot send QMP {command}"))?;

        loop {
            let message = self
                .next_message()
                .with_context(|| format!("No reply to QMP {command}"))?;
            match message {
                QmpResponse { event: Some(event), .. } => {
                    log::debug!("ignoring QMP event {event}");
                }
                QmpResponse { id: reply_id, .. } if reply_id != Some(id) => {
                    log::debug!("dropping stale QMP reply {reply_id:?} while waiting for {id}");
                }
                QmpResponse { error: Some(err), .. } => {
                    anyhow::bail!("QMP {command} failed: {} ({})", err.desc, err.class);
                }
                QmpResponse { return_: Some(ret), .. } => return Ok(ret),
                other => anyhow::bail!("Malformed reply to QMP {command}: {other:?}"),
            }
        }
    }

    /// Run a human monitor (HMP) command and return its text output.
    pub fn human_monitor_command(&mut self, command_line: &str) -> Result<String> {
        let args = serde_json::json!({ "command-line": command_line });
        let ret = self.execute("human-monitor-command", Some(args))?;
        ret.as_str()
            .map(str::to_owned)
            .with_context(|| format!("Unexpected reply to `{command_line}`: {ret}"))
    }

    /// Whether the guest CPUs are currently running.
    pub fn is_running(&mut self) -> Result<bool> {
        let status = self.execute("query-status", None)?;
        status["running"]
            .as_bool()
            .with_context(|| format!("Unexpected query-status reply: {status}"))
    }

    /// The next complete line from the server, decoded.
    ///
    /// A timed-out read keeps what it got in `partial`; the next call
    /// completes that line instead of starting mid-message.
    fn next_message(&mut self) -> Result<QmpResponse> {
        if self.reader.read_line(&mut self.partial)? == 0 {
            anyhow::bail!("QMP connection closed by peer");
        }
        let line = std::mem::take(&mut self.partial);
        serde_json::from_str(&line).with_context(|| format!("Cannot decode QMP message: {line}"))
    }
}

/// [`TargetAccess`] over a [`QmpClient`].
pub struct QmpTarget {
    client: QmpClient,
    window: PhysicalWindow,
}

impl QmpTarget {
    #[must_use]
    pub const fn new(client: QmpClient, window: PhysicalWindow) -> Self {
        Self { client, window }
    }

    fn monitor(&mut self, command_line: &str) -> Result<String, TargetError> {
        log::trace!("hmp: {command_line}");
        self.client
            .human_monitor_command(command_line)
            .map_err(|e| TargetError::Backend(format!("{e:#}")))
    }

    fn memory_command(&self, address: PhysicalAddress) -> Result<String, TargetError> {
        let at = self
            .window
            .debugger_address(address)
            .ok_or(TargetError::OutOfRange(address.as_u64()))?;
        Ok(if self.window.is_windowed() {
            format!("x /1gx {at:#x}")
        } else {
            format!("xp /1gx {at:#x}")
        })
    }
}

impl TargetAccess for QmpTarget {
    /// Checks the run state first; every walk starts with this call.
    fn read_register(&mut self, name: &str) -> Result<u64, TargetError> {
        let running = self
            .client
            .is_running()
            .map_err(|e| TargetError::Backend(format!("{e:#}")))?;
        if running {
            return Err(TargetError::NotStopped);
        }

        let dump = self.monitor("info registers")?;
        find_register(&dump, name).ok_or_else(|| TargetError::UnknownRegister(name.to_owned()))
    }

    fn read_physical_u64(&mut self, address: PhysicalAddress) -> Result<u64, TargetError> {
        let command = self.memory_command(address)?;
        let output = self.monitor(&command)?;
        parse_memory_line(&output).ok_or_else(|| TargetError::Backend(output.trim().to_owned()))
    }
}

/// Value of a one-quadword `x`/`xp` dump: `"0000000000001000: 0x0000000000002003"`.
fn parse_memory_line(output: &str) -> Option<u64> {
    let line = output.lines().next()?;
    let (_, value) = line.split_once(": ")?;
    parse_integer(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::thread;

    /// Answers each QMP command from `replies`, in order, after sending a greeting.
    ///
    /// An array reply is sent as one line per element. A `"delay_ms"` key
    /// holds the reply back that long. A `return`/`error` line without an id
    /// gets the id of the command it answers.
    fn fake_qemu(replies: Vec<Value>) -> (UnixStream, thread::JoinHandle<Vec<Value>>) {
        let (client, server) = UnixStream::pair().unwrap();
        let handle = thread::spawn(move || {
            let mut writer = server.try_clone().unwrap();
            let mut reader = BufReader::new(server);
            let mut seen = Vec::new();

            writeln!(writer, r#"{{"QMP": {{"version": {{}}, "capabilities": []}}}}"#).unwrap();
            for reply in std::iter::once(json!({"return": {}})).chain(replies) {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                let command: Value = serde_json::from_str(&line).unwrap();
                let lines = match reply {
                    Value::Array(lines) => lines,
                    reply => vec![reply],
                };
                for mut reply in lines {
                    let object = reply.as_object_mut().unwrap();
                    if let Some(delay) = object.remove("delay_ms").and_then(|d| d.as_u64()) {
                        thread::sleep(Duration::from_millis(delay));
                    }
                    let answers = object.contains_key("return") || object.contains_key("error");
                    if answers && !object.contains_key("id") {
                        object.insert("id".into(), command["id"].clone());
                    }
                    if writeln!(writer, "{reply}").is_err() {
                        return seen;
                    }
                }
                seen.push(command);
            }
            seen
        });
        (client, handle)
    }

    #[test]
    fn reads_cr3_from_paused_guest() {
        let (stream, server) = fake_qemu(vec![
            json!({"return": {"running": false, "status": "paused"}}),
            json!({"return": "CR0=80010033 CR2=0000000000000000 CR3=0000000000101000 CR4=00000020\r\n"}),
        ]);
        let mut target = QmpTarget::new(QmpClient::handshake(stream).unwrap(), PhysicalWindow::Identity);

        assert_eq!(target.read_register("cr3"), Ok(0x10_1000));
        drop(target);

        let seen = server.join().unwrap();
        assert_eq!(seen[0]["execute"], "qmp_capabilities");
        assert_eq!(seen[1]["execute"], "query-status");
        assert_eq!(seen[2]["arguments"]["command-line"], "info registers");
    }

    #[test]
    fn running_guest_is_rejected() {
        let (stream, _server) = fake_qemu(vec![json!({"return": {"running": true, "status": "running"}})]);
        let mut target = QmpTarget::new(QmpClient::handshake(stream).unwrap(), PhysicalWindow::Identity);
        assert_eq!(target.read_register("cr3"), Err(TargetError::NotStopped));
    }

    #[test]
    fn physical_reads_use_xp() {
        let (stream, server) = fake_qemu(vec![json!([
            {"event": "STOP", "data": {}},
            {"return": "0000000000001000: 0x0000000000002003\r\n"}
        ])]);
        let mut target = QmpTarget::new(QmpClient::handshake(stream).unwrap(), PhysicalWindow::Identity);

        // The STOP event is skipped; the next line answers the command.
        assert_eq!(target.read_physical_u64(PhysicalAddress::new(0x1000)), Ok(0x2003));
        drop(target);

        let seen = server.join().unwrap();
        assert_eq!(seen[1]["arguments"]["command-line"], "xp /1gx 0x1000");
    }

    #[test]
    fn windowed_reads_use_x_at_offset() {
        let (stream, server) = fake_qemu(vec![json!({"return": "fffffe8000001000: 0x0000000000002003\r\n"})]);
        let window = PhysicalWindow::DirectMap {
            base: PhysicalWindow::HIGHER_HALF_DIRECT_MAP,
        };
        let mut target = QmpTarget::new(QmpClient::handshake(stream).unwrap(), window);

        assert_eq!(target.read_physical_u64(PhysicalAddress::new(0x1000)), Ok(0x2003));
        drop(target);

        let seen = server.join().unwrap();
        assert_eq!(seen[1]["arguments"]["command-line"], "x /1gx 0xfffffe8000001000");
    }

    #[test]
    fn monitor_errors_become_backend_errors() {
        let (stream, _server) = fake_qemu(vec![json!({"return": "Cannot access memory\r\n"})]);
        let mut target = QmpTarget::new(QmpClient::handshake(stream).unwrap(), PhysicalWindow::Identity);
        assert_eq!(
            target.read_physical_u64(PhysicalAddress::new(0x1000)),
            Err(TargetError::Backend("Cannot access memory".into()))
        );
    }

    #[test]
    fn commands_carry_increasing_ids() {
        let (stream, server) = fake_qemu(vec![json!({"return": {"running": true}})]);
        let mut client = QmpClient::handshake(stream).unwrap();
        assert!(client.is_running().unwrap());
        drop(client);

        let seen = server.join().unwrap();
        assert_eq!(seen[0]["id"], 1);
        assert_eq!(seen[1]["id"], 2);
    }

    #[test]
    fn late_reply_fails_only_its_own_command() {
        let paused = json!({"return": {"running": false, "status": "paused"}});
        let registers = json!({"return": "CR0=80010033 CR3=0000000000101000 CR4=00000020\r\n"});
        let mut slow = paused.clone();
        slow["delay_ms"] = json!(600);

        let (stream, _server) = fake_qemu(vec![
            slow,
            paused.clone(),
            registers.clone(),
            paused,
            registers,
        ]);
        stream.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
        let mut target = QmpTarget::new(QmpClient::handshake(stream).unwrap(), PhysicalWindow::Identity);

        assert!(matches!(target.read_register("cr3"), Err(TargetError::Backend(_))));

        // Let the late reply land in the socket before asking again.
        thread::sleep(Duration::from_millis(800));
        assert_eq!(target.read_register("cr3"), Ok(0x10_1000));
        assert_eq!(target.read_register("cr3"), Ok(0x10_1000));
    }

    #[test]
    fn replies_for_other_ids_are_skipped() {
        let (stream, _server) = fake_qemu(vec![json!([
            {"return": {"running": true}, "id": 99},
            {"return": {"running": false}}
        ])]);
        let mut client = QmpClient::handshake(stream).unwrap();
        assert!(!client.is_running().unwrap());
    }

    #[test]
    fn memory_line_parsing() {
        assert_eq!(parse_memory_line("0000000000001000: 0x0000000000002003\r\n"), Some(0x2003));
        assert_eq!(parse_memory_line("0000000000001000: Cannot access memory"), None);
        assert_eq!(parse_memory_line(""), None);
    }
}
