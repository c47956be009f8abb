//! Fuzz target: SIM800L response stream
//!
//! Feeds arbitrary bytes as modem output, both line by line into the pure
//! parsers and through the driver's line layer, which must never panic
//! or hang on garbage, overlong lines or missing terminators.
//!
//! cargo fuzz run fuzz_at_parser

#![no_main]

use std::collections::VecDeque;

use alarmlink::adapters::modem::{AtSerial, Sim800l, at};
use alarmlink::app::ports::MessagingPort;
use alarmlink::error::TransportError;
use libfuzzer_sys::fuzz_target;

struct Replay(VecDeque<u8>);

impl AtSerial for Replay {
    fn send_bytes(&mut self, _bytes: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn recv_byte(&mut self, _timeout_ms: u32) -> Option<u8> {
        self.0.pop_front()
    }
}

fuzz_target!(|data: &[u8]| {
    for raw in data.split(|b| *b == b'\n') {
        let _ = at::decode_line(raw);
    }

    for line in String::from_utf8_lossy(data).split("\r\n") {
        let _ = at::classify(line);
        let _ = at::parse_cmti(line);
        let _ = at::parse_cmgr_header(line);
        let _ = at::parse_imei(line);
    }

    let mut modem = Sim800l::new(Replay(data.iter().copied().collect()));
    while let Some(item) = modem.poll_inbox() {
        let _ = modem.read_message(item.slot);
    }
});
