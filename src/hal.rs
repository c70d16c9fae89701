//! Capabilities the scheduler needs from the target.
//!
//! Only three things are required: a way to drive a pin, a periodic timer
//! that calls [`SoftPwm::irq_handler`](crate::SoftPwm::irq_handler) and a
//! one-shot analog conversion.

use embedded_hal::digital::{OutputPin, PinState};
use fugit::HertzU32;

use crate::{AnalogPinId, OutputPinId};

/// Digital output used for every PWM channel.
pub trait OutputDriver {
    /// Drive `pin` to the given physical level.
    fn write_output(&mut self, pin: OutputPinId, state: PinState);

    /// Whether `pin` can be driven by this output.
    fn supports(&self, _pin: OutputPinId) -> bool {
        true
    }

    /// Return `pin` to its unpowered state once its channel has ended.
    fn release(&mut self, _pin: OutputPinId) {}
}

/// Any array of `embedded-hal` output pins, addressed by index.
impl<P: OutputPin, const K: usize> OutputDriver for [P; K] {
    fn write_output(&mut self, pin: OutputPinId, state: PinState) {
        if let Some(p) = self.get_mut(usize::from(pin)) {
            // errors are ignored, the pin is rewritten every tick
            let _ = p.set_state(state);
        }
    }

    fn supports(&self, pin: OutputPinId) -> bool {
        usize::from(pin) < K
    }
}

/// Hardware timer generating the scheduler tick.
pub trait TickTimer {
    /// (Re)start the timer so that it interrupts at `rate`.
    fn start_periodic(&mut self, rate: HertzU32);
}

/// Analog-to-digital converter used for readback.
pub trait AnalogInput {
    /// Run one conversion on `pin` and return the raw sample.
    fn read_raw(&mut self, pin: AnalogPinId) -> u16;
}

/// Placeholder converter for setups without readback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAnalog;

impl AnalogInput for NoAnalog {
    fn read_raw(&mut self, _pin: AnalogPinId) -> u16 {
        0
    }
}
