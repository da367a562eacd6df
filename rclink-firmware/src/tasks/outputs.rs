//! Servo and switch outputs
//!
//! Steering and throttle drive standard 50 Hz servo pulses. The armed
//! switch gates throttle; lights follow their switch directly.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::pwm::{Config, Pwm};

use crate::channels::CONTROL;
use crate::items::{ControlInputs, SWITCH_LIGHTS};

/// PWM counter clock after division, in Hz
const PWM_TICK_HZ: u32 = 1_000_000;

/// Servo frame period in microseconds (50 Hz)
const SERVO_PERIOD_US: u16 = 20_000;

/// Pulse width for an axis position in -1000..=1000
fn pulse_us(axis: i16) -> u16 {
    (1500 + i32::from(axis.clamp(-1000, 1000)) / 2) as u16
}

fn servo_config(steering: i16, throttle: i16) -> Config {
    let mut config = Config::default();
    // 125 MHz system clock down to 1 MHz
    config.divider = ((125_000_000 / PWM_TICK_HZ) as u8).into();
    config.top = SERVO_PERIOD_US - 1;
    config.compare_a = pulse_us(steering);
    config.compare_b = pulse_us(throttle);
    config
}

/// Outputs task - applies the latest control inputs
#[embassy_executor::task]
pub async fn outputs_task(
    mut servos: Pwm<'static>,
    mut lights: Output<'static>,
    mut armed_led: Output<'static>,
) {
    info!("Outputs task started");

    servos.set_config(&servo_config(0, 0));

    loop {
        let inputs = CONTROL.wait().await;
        apply(&mut servos, &mut lights, &mut armed_led, &inputs);
    }
}

fn apply(
    servos: &mut Pwm<'static>,
    lights: &mut Output<'static>,
    armed_led: &mut Output<'static>,
    inputs: &ControlInputs,
) {
    let throttle = if inputs.armed() { inputs.throttle } else { 0 };
    servos.set_config(&servo_config(inputs.steering, throttle));

    if inputs.armed() {
        armed_led.set_high();
    } else {
        armed_led.set_low();
    }

    if inputs.switches & SWITCH_LIGHTS != 0 {
        lights.set_high();
    } else {
        lights.set_low();
    }
}
