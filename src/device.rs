//! Outbound device channel
//!
//! Best-effort serial link used to signal external hardware from trigger
//! actions. Every failure here is logged and swallowed: the device channel
//! must never take a turn down with it.

use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;

use crate::daemon::DeviceLink;
use crate::{Error, Result};

/// Write timeout so a wedged UART cannot block the loop
const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial device channel
///
/// The port is opened lazily on first send and reopened if found closed.
pub struct SerialLink {
    path: String,
    baud: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Create a serial link; the port is not opened until the first send
    #[must_use]
    pub const fn new(path: String, baud: u32) -> Self {
        Self {
            path,
            baud,
            port: None,
        }
    }

    fn ensure_open(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        if self.port.is_none() {
            let port = serialport::new(&self.path, self.baud)
                .timeout(WRITE_TIMEOUT)
                .open()
                .map_err(|e| Error::Device(format!("failed to open {}: {e}", self.path)))?;

            tracing::info!(port = %self.path, baud = self.baud, "serial port opened");
            self.port = Some(port);
        }

        self.port
            .as_mut()
            .ok_or_else(|| Error::Device("serial port unavailable".to_string()))
    }

    fn try_send(&mut self, command: &str) -> Result<()> {
        let port = self.ensure_open()?;

        if let Err(e) = port.write_all(format!("{command}\n").as_bytes()) {
            // Drop the handle so the next send reopens the port
            self.port = None;
            return Err(Error::Device(format!("write failed: {e}")));
        }

        Ok(())
    }
}

impl DeviceLink for SerialLink {
    fn send(&mut self, command: &str) {
        match self.try_send(command) {
            Ok(()) => tracing::info!(command, "serial command sent"),
            Err(e) => tracing::error!(error = %e, command, "serial send failed"),
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!(port = %self.path, "serial port closed");
        }
    }
}
