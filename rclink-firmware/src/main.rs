//! rclink receiver firmware
//!
//! Runs on an RP2040 in a model vehicle. Stick positions arrive over
//! UART0 from the transmitter and drive two servo outputs; supply voltage
//! and link health go back as autosent telemetry.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rclink_hal::UartConfig;
use rclink_hal_rp2040::uart::{pin_pair_uart, to_rp_config};
use rclink_hal_rp2040::LinkUart;

mod channels;
mod items;
mod tasks;

/// Link UART pins
const LINK_TX_GPIO: u8 = 0;
const LINK_RX_GPIO: u8 = 1;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// UART ring buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("rclink receiver starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Catch a pin change that routes to the wrong peripheral
    if pin_pair_uart(LINK_TX_GPIO, LINK_RX_GPIO).is_none() {
        defmt::panic!("link pins do not share a UART");
    }

    let uart_config = to_rp_config(&UartConfig::default());
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = BufferedUart::new(p.UART0, p.PIN_0, p.PIN_1, Irqs, tx_buf, rx_buf, uart_config);
    let (tx, rx) = uart.split();
    info!("UART0 initialized at {} baud", UartConfig::default().baudrate);

    // Steering on GPIO2 (A), throttle on GPIO3 (B)
    let servos = Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, PwmConfig::default());
    let lights = Output::new(p.PIN_15, Level::Low);
    let armed_led = Output::new(p.PIN_25, Level::Low);

    // VSYS/3 is wired to GPIO29 on Pico-style boards
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let vsys = Channel::new_pin(p.PIN_29, Pull::None);

    info!("Spawning tasks...");
    spawner.spawn(tasks::link_task(LinkUart::new(tx, rx))).unwrap();
    spawner
        .spawn(tasks::outputs_task(servos, lights, armed_led))
        .unwrap();
    spawner.spawn(tasks::telemetry_task(adc, vsys)).unwrap();

    info!("All tasks spawned");
}
