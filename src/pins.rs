//! GPIO / peripheral pin assignments for the TTGO T-Call (ESP32 + SIM800L).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Alarm panel
// ---------------------------------------------------------------------------

/// "Armed" indicator from the panel LED.  Input, pulled down.
/// Also ADC2 channel 8 for analog sampling.
pub const ARMED_GPIO: i32 = 25;
/// ADC2 channel wired to [`ARMED_GPIO`].
pub const ARMED_ADC_CHANNEL: u32 = 8;

/// Siren-sounding indicator.  Input, pulled down.
pub const SIREN_GPIO: i32 = 19;

/// Arm/disarm toggle into the panel ("LIGA").  Active LOW, idles HIGH.
/// GPIO 26 is taken by the modem UART on this board.
pub const ARM_LINE_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// SIM800L modem
// ---------------------------------------------------------------------------

/// ESP32 RX ← modem TX.
pub const MODEM_RX_GPIO: i32 = 27;
/// ESP32 TX → modem RX.
pub const MODEM_TX_GPIO: i32 = 26;
pub const MODEM_PWRKEY_GPIO: i32 = 4;
pub const MODEM_RST_GPIO: i32 = 5;
/// Supply switch for the modem (HIGH = on).
pub const MODEM_POWER_GPIO: i32 = 23;
