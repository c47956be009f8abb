//! AT response line parsers for the SIM800L in text mode.
//!
//! Pure functions over single response lines (without the trailing
//! `\r\n`), so they can be fuzzed and unit tested on the host.

use crate::text::{IDENTITY_LEN, Identity, bounded, push_truncated};

/// Longest response line kept; the rest of a longer line is dropped.
pub const LINE_LEN: usize = 320;

pub type AtLine = heapless::String<LINE_LEN>;

/// Raw bytes of one line as received.
pub type LineBytes = heapless::Vec<u8, LINE_LEN>;

/// Decode a received line as UTF-8.  Invalid sequences become U+FFFD;
/// output that would not fit is dropped.
pub fn decode_line(bytes: &[u8]) -> AtLine {
    let mut line = AtLine::new();
    if let Ok(text) = core::str::from_utf8(bytes) {
        push_truncated(&mut line, text);
        return line;
    }
    for chunk in bytes.utf8_chunks() {
        push_truncated(&mut line, chunk.valid());
        if !chunk.invalid().is_empty() {
            push_truncated(&mut line, "\u{FFFD}");
        }
    }
    line
}

/// Terminal result of an AT command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Final {
    Ok,
    Error,
}

/// `Some` if `line` terminates a command response.
pub fn classify(line: &str) -> Option<Final> {
    match line {
        "OK" => Some(Final::Ok),
        "ERROR" => Some(Final::Error),
        _ if line.starts_with("+CMS ERROR") || line.starts_with("+CME ERROR") => Some(Final::Error),
        _ => None,
    }
}

/// New-message indication: `+CMTI: "SM",3` → `3`.
pub fn parse_cmti(line: &str) -> Option<u16> {
    let rest = line.strip_prefix("+CMTI:")?;
    let (storage, slot) = rest.split_once(',')?;
    let storage = storage.trim();
    if !(storage.starts_with('"') && storage.ends_with('"') && storage.len() >= 2) {
        return None;
    }
    slot.trim().parse().ok()
}

/// Header of a `+CMGR` response; returns the originating address.
///
/// ```text
/// +CMGR: "REC UNREAD","+5561900000001","","24/05/01,10:00:00-12"
/// ```
pub fn parse_cmgr_header(line: &str) -> Option<Identity> {
    let rest = line.strip_prefix("+CMGR:")?;
    // Quoted fields sit at the odd positions of a split on '"'.
    let sender = rest.split('"').nth(3)?;
    if sender.is_empty() || sender.len() > IDENTITY_LEN {
        return None;
    }
    Some(bounded(sender))
}

/// `AT+GSN` information line: 14 to 17 decimal digits.
pub fn parse_imei(line: &str) -> Option<Identity> {
    let line = line.trim();
    if (14..=17).contains(&line.len()) && line.bytes().all(|b| b.is_ascii_digit()) {
        Some(bounded(line))
    } else {
        None
    }
}
