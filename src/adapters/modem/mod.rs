//! SIM800L modem adapter.
//!
//! Implements [`MessagingPort`] over a text-mode AT session.  The byte
//! channel is abstracted as [`AtSerial`] so the whole command/response
//! state machine runs against a scripted channel in host tests; on target
//! it is the ESP-IDF UART driver.
//!
//! New-message indications (`+CMTI`) arrive unsolicited, interleaved with
//! command responses.  They are queued wherever they are seen and handed
//! out one per [`poll_inbox`](MessagingPort::poll_inbox).

pub mod at;

use core::fmt::Write;

use log::{debug, error, info, warn};

use crate::app::ports::{InboxItem, MessagingPort};
use crate::error::{InitError, TransportError};
use crate::text::{Identity, MessageBody, push_truncated, is_phone_number};

use at::{AtLine, Final, LineBytes, classify, decode_line, parse_cmgr_header, parse_cmti, parse_imei};

/// Byte channel to the modem.
pub trait AtSerial {
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Next received byte, waiting at most `timeout_ms`.  `None` on timeout.
    fn recv_byte(&mut self, timeout_ms: u32) -> Option<u8>;
}

const PROBE_ATTEMPTS: u32 = 5;
/// `AT+CMGR` tries per slot before the message is given up as unreadable.
const FETCH_ATTEMPTS: u32 = 2;
const COMMAND_TIMEOUT_MS: u32 = 1_000;
const INTER_BYTE_TIMEOUT_MS: u32 = 50;
const PROMPT_TIMEOUT_MS: u32 = 5_000;
const SEND_TIMEOUT_MS: u32 = 60_000;
const DIAL_TIMEOUT_MS: u32 = 20_000;

/// Queued `+CMTI` slots.
const PENDING_SLOTS: usize = 8;
/// Information lines kept per response.
const INFO_LINES: usize = 6;

const CTRL_Z: u8 = 0x1A;
const ESC: u8 = 0x1B;

type Info = heapless::Vec<AtLine, INFO_LINES>;
type CommandLine = heapless::String<64>;

/// A message read ahead by `poll_inbox` so the sender is known up front.
#[derive(Debug)]
struct Fetched {
    slot: u16,
    sender: Identity,
    body: MessageBody,
}

pub struct Sim800l<S: AtSerial> {
    serial: S,
    pending: heapless::Deque<u16, PENDING_SLOTS>,
    imei: Identity,
    fetched: Option<Fetched>,
    /// Slot whose sender could not be read, and why.  Its body is never
    /// handed out, so nothing from it reaches the command path.
    unreadable: Option<(u16, TransportError)>,
}

impl<S: AtSerial> Sim800l<S> {
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            pending: heapless::Deque::new(),
            imei: Identity::new(),
            fetched: None,
            unreadable: None,
        }
    }

    /// Probe the modem and put it in text mode with new-message indications.
    ///
    /// The modem must already be powered and settled.
    pub fn begin(&mut self) -> Result<(), InitError> {
        let found = (0..PROBE_ATTEMPTS).any(|_| self.command("AT", COMMAND_TIMEOUT_MS).is_ok());
        if !found {
            error!("Couldn't find GSM SIM800L");
            return Err(InitError::ModemNotFound);
        }
        info!("GSM SIM800L found");

        self.command("ATE0", COMMAND_TIMEOUT_MS)
            .map_err(|_| InitError::ModemSetupFailed("ATE0"))?;
        self.command("AT+CMGF=1", COMMAND_TIMEOUT_MS)
            .map_err(|_| InitError::ModemSetupFailed("AT+CMGF=1"))?;
        self.command("AT+CNMI=2,1", COMMAND_TIMEOUT_MS)
            .map_err(|_| InitError::ModemSetupFailed("AT+CNMI=2,1"))?;

        match self.command("AT+GSN", COMMAND_TIMEOUT_MS) {
            Ok(lines) => {
                if let Some(imei) = lines.iter().find_map(|l| parse_imei(l)) {
                    self.imei = imei;
                }
            }
            Err(e) => warn!("IMEI query failed: {}", e),
        }
        info!("GSM SIM800L ready, IMEI {}", self.imei);
        Ok(())
    }

    pub fn imei(&self) -> &str {
        &self.imei
    }

    /// Slots announced but not yet handed out.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    // ── Line layer ────────────────────────────────────────────

    /// One non-empty line, `\r\n` stripped and decoded as UTF-8.
    fn read_line(&mut self, timeout_ms: u32) -> Option<AtLine> {
        let mut bytes = LineBytes::new();
        loop {
            let wait = if bytes.is_empty() { timeout_ms } else { INTER_BYTE_TIMEOUT_MS };
            match self.serial.recv_byte(wait)? {
                b'\n' if bytes.is_empty() => {}
                b'\n' => return Some(decode_line(&bytes)),
                b'\r' => {}
                b => {
                    let _ = bytes.push(b);
                }
            }
        }
    }

    /// Next line that is not a `+CMTI` indication.
    fn response_line(&mut self, timeout_ms: u32) -> Option<AtLine> {
        loop {
            let line = self.read_line(timeout_ms)?;
            match parse_cmti(&line) {
                Some(slot) => self.queue(slot),
                None => return Some(line),
            }
        }
    }

    fn queue(&mut self, slot: u16) {
        if self.pending.iter().any(|s| *s == slot) {
            return;
        }
        debug!("SMS waiting in slot {}", slot);
        if self.pending.push_back(slot).is_err() {
            warn!("Inbox queue full, slot {} not queued", slot);
        }
    }

    /// Collect information lines up to the final result code.
    fn await_final(&mut self, timeout_ms: u32) -> Result<Info, TransportError> {
        let mut info = Info::new();
        loop {
            let line = self.response_line(timeout_ms).ok_or(TransportError::Timeout)?;
            match classify(&line) {
                Some(Final::Ok) => return Ok(info),
                Some(Final::Error) => {
                    debug!("AT error: {}", line);
                    return Err(TransportError::Rejected);
                }
                None => {
                    let _ = info.push(line);
                }
            }
        }
    }

    fn command(&mut self, cmd: &str, timeout_ms: u32) -> Result<Info, TransportError> {
        self.serial.send_bytes(cmd.as_bytes())?;
        self.serial.send_bytes(b"\r\n")?;
        self.await_final(timeout_ms)
    }

    fn await_prompt(&mut self) -> Result<(), TransportError> {
        loop {
            match self.serial.recv_byte(PROMPT_TIMEOUT_MS) {
                Some(b'>') => return Ok(()),
                Some(_) => {}
                None => return Err(TransportError::Timeout),
            }
        }
    }

    /// Pick up indications that arrived while idle.
    fn drain_unsolicited(&mut self) {
        while let Some(line) = self.read_line(0) {
            match parse_cmti(&line) {
                Some(slot) => self.queue(slot),
                None => debug!("Unsolicited: {}", line),
            }
        }
    }

    fn fetch(&mut self, slot: u16) -> Result<Fetched, TransportError> {
        let mut cmd = CommandLine::new();
        let _ = write!(cmd, "AT+CMGR={}", slot);
        let lines = self.command(&cmd, COMMAND_TIMEOUT_MS)?;

        let (header, text) = lines.split_first().ok_or(TransportError::Malformed)?;
        let sender = parse_cmgr_header(header).ok_or(TransportError::Malformed)?;

        let mut body = MessageBody::new();
        for (i, l) in text.iter().enumerate() {
            if i > 0 {
                push_truncated(&mut body, "\n");
            }
            push_truncated(&mut body, l);
        }
        Ok(Fetched { slot, sender, body })
    }
}

impl<S: AtSerial> MessagingPort for Sim800l<S> {
    fn send_text(&mut self, destination: &str, body: &str) -> Result<(), TransportError> {
        if !is_phone_number(destination) {
            return Err(TransportError::InvalidDestination);
        }
        let mut cmd = CommandLine::new();
        let _ = write!(cmd, "AT+CMGS=\"{}\"", destination);
        self.serial.send_bytes(cmd.as_bytes())?;
        self.serial.send_bytes(b"\r\n")?;
        self.await_prompt()?;

        // Ctrl-Z ends the message and ESC aborts it; neither may appear inside.
        let mut out: heapless::Vec<u8, { crate::text::MESSAGE_LEN }> = heapless::Vec::new();
        for b in body.bytes().filter(|b| *b != CTRL_Z && *b != ESC) {
            if out.push(b).is_err() {
                break;
            }
        }
        self.serial.send_bytes(&out)?;
        self.serial.send_bytes(&[CTRL_Z])?;
        self.await_final(SEND_TIMEOUT_MS).map(|_| ())
    }

    fn place_call(&mut self, destination: &str) -> Result<(), TransportError> {
        if !is_phone_number(destination) {
            return Err(TransportError::InvalidDestination);
        }
        let mut cmd = CommandLine::new();
        let _ = write!(cmd, "ATD{};", destination);
        self.command(&cmd, DIAL_TIMEOUT_MS).map(|_| ())
    }

    fn poll_inbox(&mut self) -> Option<InboxItem> {
        self.drain_unsolicited();
        let slot = self.pending.pop_front()?;
        let mut last = TransportError::Timeout;
        for attempt in 1..=FETCH_ATTEMPTS {
            match self.fetch(slot) {
                Ok(fetched) => {
                    let sender = fetched.sender.clone();
                    self.fetched = Some(fetched);
                    return Some(InboxItem { sender, slot });
                }
                Err(e) => {
                    debug!("AT+CMGR={} attempt {} failed: {}", slot, attempt, e);
                    last = e;
                }
            }
        }
        // Still handed out so the slot gets freed.
        warn!("Couldn't read sender of slot {}: {}", slot, last);
        self.unreadable = Some((slot, last));
        Some(InboxItem { sender: Identity::new(), slot })
    }

    fn read_message(&mut self, slot: u16) -> Result<MessageBody, TransportError> {
        if let Some(fetched) = self.fetched.take_if(|f| f.slot == slot) {
            return Ok(fetched.body);
        }
        if let Some((_, e)) = self.unreadable.filter(|(s, _)| *s == slot) {
            return Err(e);
        }
        self.fetch(slot).map(|f| f.body)
    }

    fn delete_message(&mut self, slot: u16) -> Result<(), TransportError> {
        if self.fetched.as_ref().is_some_and(|f| f.slot == slot) {
            self.fetched = None;
        }
        if self.unreadable.is_some_and(|(s, _)| s == slot) {
            self.unreadable = None;
        }
        let mut cmd = CommandLine::new();
        let _ = write!(cmd, "AT+CMGD={}", slot);
        self.command(&cmd, COMMAND_TIMEOUT_MS).map(|_| ())
    }

    fn device_id(&mut self) -> Identity {
        self.imei.clone()
    }
}

// ── ESP-IDF UART binding ──────────────────────────────────────

#[cfg(target_os = "espidf")]
impl AtSerial for esp_idf_hal::uart::UartDriver<'_> {
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut rest = bytes;
        while !rest.is_empty() {
            match self.write(rest) {
                Ok(0) | Err(_) => return Err(TransportError::WriteFailed),
                Ok(n) => rest = &rest[n..],
            }
        }
        Ok(())
    }

    fn recv_byte(&mut self, timeout_ms: u32) -> Option<u8> {
        let mut byte = [0u8; 1];
        let ticks = esp_idf_hal::delay::TickType::new_millis(u64::from(timeout_ms)).ticks();
        match self.read(&mut byte, ticks) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}
