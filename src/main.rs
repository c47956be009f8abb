//! AlarmLink Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single cooperative polling loop and one
//! periodic escalation timer.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Sim800l          PanelAdapter    LogEventSink   Esp32Time     │
//! │  (MessagingPort)  (PanelPort)     (EventSink)    (millis)      │
//! │  EscalationTimer (TimerPort, esp_timer → TickGate)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Monitor · ACL · Commands · Actuator · Escalation      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{Gpio0, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;

use alarmlink::adapters::log_sink::LogEventSink;
use alarmlink::adapters::modem::Sim800l;
use alarmlink::adapters::panel::PanelAdapter;
use alarmlink::adapters::time::Esp32TimeAdapter;
use alarmlink::app::ports::MessagingPort;
use alarmlink::app::service::AppService;
use alarmlink::config::SystemConfig;
use alarmlink::drivers::arm_line::ArmLine;
use alarmlink::drivers::hw_timer::EscalationTimer;
use alarmlink::drivers::watchdog::Watchdog;
use alarmlink::drivers::{hw_init, system};
use alarmlink::error::Error;

/// Optional JSON configuration baked in at build time.
const CONFIG_OVERRIDE: Option<&str> = option_env!("ALARMLINK_CONFIG");

fn load_config() -> Result<SystemConfig> {
    let config = match CONFIG_OVERRIDE {
        Some(json) => {
            info!("Config: compiled-in override");
            SystemConfig::from_json(json).map_err(Error::from)?
        }
        None => SystemConfig::default(),
    };
    config.validate().map_err(Error::from)?;
    Ok(config)
}

/// Stop here; the watchdog is not yet armed, so this never resets.
fn halt(what: &str) -> ! {
    error!("{}, halting", what);
    loop {
        FreeRtos::delay_ms(1000);
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AlarmLink v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config()?;

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(config.armed_input) {
        halt(&format!("HAL init failed: {}", e));
    }
    let peripherals = Peripherals::take()?;

    // ── 4. Modem bring-up ─────────────────────────────────────
    hw_init::modem_power_on();
    info!("Turning on SIM modem, this may take up to {}ms", config.modem_boot_ms);
    FreeRtos::delay_ms(config.modem_boot_ms);

    let uart_config = UartConfig::default().baudrate(Hertz(config.modem_baud));
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio26,
        peripherals.pins.gpio27,
        Option::<Gpio0>::None,
        Option::<Gpio0>::None,
        &uart_config,
    )?;
    let mut modem = Sim800l::new(uart);
    if let Err(e) = modem.begin() {
        halt(&format!("Modem init failed: {}", e));
    }
    let device_id = modem.device_id();

    // ── 5. Panel + timer ──────────────────────────────────────
    let arm_pin = PinDriver::output(peripherals.pins.gpio16)?;
    let arm_line = match ArmLine::new(arm_pin, FreeRtos) {
        Ok(line) => line,
        Err(e) => halt(&format!("Arm line init failed: {}", e)),
    };
    let mut panel = PanelAdapter::new(arm_line, config.armed_input);
    let timer = match EscalationTimer::new() {
        Ok(t) => t,
        Err(e) => halt(&format!("Escalation timer init failed: {}", e)),
    };

    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let loop_interval_ms = config.loop_interval_ms;
    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);

    let mut app = AppService::new(config, timer);
    app.start(&mut panel, &device_id, clock.millis(), &mut sink);

    // ── 6. Polling loop ───────────────────────────────────────
    info!("Entering polling loop ({}ms)", loop_interval_ms);
    loop {
        app.poll(clock.millis(), &mut panel, &mut modem, &mut sink);

        if app.take_restart_request() {
            warn!("Restart requested by command");
            FreeRtos::delay_ms(500);
            system::restart();
        }

        watchdog.feed();
        FreeRtos::delay_ms(loop_interval_ms);
    }
}
