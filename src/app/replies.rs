//! Fixed reply and notification texts.

use crate::text::{MessageBody, bounded};

/// Answer to any sender not on the access list.
pub const REJECTED: &str = "This number is not registered to use this system";

/// Answer to a body that matches no verb.
pub const UNKNOWN: &str = "Comando desconhecido, envie AJUDA";

/// `AJUDA`
pub const HELP: &str = "Comandos: STATUS, ARMAR, DESARMAR, IMEI, LISTAR, REG <n> <numero>, AJUDA, RESTART";

/// `RESTART`, sent before the device resets.
pub const RESTARTING: &str = "Reiniciando sistema";

// Notifications to the primary contact.
pub const ALARM_ARMED: &str = "Alarme armado";
pub const ALARM_DISARMED: &str = "Alarme desarmado";
pub const SIREN_OFF: &str = "Sirene desligada";

/// Owned copy of a fixed text, ready to hand to the transport.
pub fn body(text: &str) -> MessageBody {
    bounded(text)
}
