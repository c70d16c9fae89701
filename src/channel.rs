use embedded_hal::digital::PinState;

use crate::feedback::SampleWindow;
use crate::{
    ANALOG_SAMPLES, AnalogPinId, DEFAULT_DUTY, Drive, OutputPinId, Polarity, SoftPwmState, fade,
};

/// Analog input sampled at a fixed position within each sampling frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readback {
    /// Analog pin to convert
    pub pin: AnalogPinId,
    /// Counter position at which the sample is taken, so a slow high-side
    /// driver has time to switch on
    pub threshold: u8,
}

/// State of one software PWM output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftPwmChannel {
    pub(crate) pin: OutputPinId,
    pub(crate) duty: u8,
    pub(crate) level: u8,
    pub(crate) polarity: Polarity,
    pub(crate) fade_up: u16,
    pub(crate) fade_down: u16,
    pub(crate) readback: Option<Readback>,
    pub(crate) samples: SampleWindow<ANALOG_SAMPLES>,
    pub(crate) drive: Drive,
}

impl SoftPwmChannel {
    pub(crate) const fn new(pin: OutputPinId, polarity: Polarity) -> Self {
        Self {
            pin,
            duty: DEFAULT_DUTY,
            level: 0,
            polarity,
            fade_up: 0,
            fade_down: 0,
            readback: None,
            samples: SampleWindow::new(),
            drive: Drive::Pwm,
        }
    }

    pub fn pin(&self) -> OutputPinId {
        self.pin
    }

    /// Duty value the channel settles toward.
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Level currently compared against the frame counter.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Fade durations as `(up, down)` in frames.
    pub fn fade_ticks(&self) -> (u16, u16) {
        (self.fade_up, self.fade_down)
    }

    pub fn readback(&self) -> Option<Readback> {
        self.readback
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    /// Mean of the collected readback samples.
    pub fn average(&self) -> Option<u16> {
        self.samples.average()
    }

    pub(crate) fn set_readback(&mut self, readback: Option<Readback>) {
        if self.readback != readback {
            self.readback = readback;
            self.samples.clear();
        }
    }

    pub(crate) fn advance_fade(&mut self) {
        self.level = fade::next_level(self.level, self.duty, self.fade_up, self.fade_down);
    }

    /// Logical state at frame position `counter`.
    pub(crate) fn state_at(&self, counter: u8) -> SoftPwmState {
        match self.drive {
            Drive::Forced(state) => state,
            Drive::Pwm => pwm_state(counter, self.level),
        }
    }

    pub(crate) fn pin_state(&self, state: SoftPwmState) -> PinState {
        self.polarity.pin_state(state)
    }

    /// Whether the readback conversion is due at `counter`.
    pub(crate) fn sample_due(&self, counter: u8) -> Option<AnalogPinId> {
        match (self.drive, self.readback) {
            (Drive::Pwm, Some(readback)) if readback.threshold == counter => Some(readback.pin),
            _ => None,
        }
    }
}

/// Logical output for `level` at frame position `counter`.
///
/// The output is on while `counter < level`; a level of 255 stays on for
/// the whole frame.
#[must_use]
pub fn pwm_state(counter: u8, level: u8) -> SoftPwmState {
    if level == u8::MAX || counter < level {
        SoftPwmState::On
    } else {
        SoftPwmState::Off
    }
}
