//! Fuzz target: inbound SMS body → command
//!
//! Any body from any sender must parse or be rejected without panicking,
//! and a parsed non-REG verb must match the whole normalised body.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use alarmlink::app::commands::{self, Verb};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(cmd) = commands::parse(text, "+5561900000001") {
        if cmd.verb == Verb::Register {
            if let Some(reg) = cmd.registration() {
                assert!(reg.index <= 9);
            }
        } else {
            assert_eq!(commands::normalize(text).as_str(), cmd.verb.keyword());
            assert!(cmd.argument.is_none());
        }
    }
});
