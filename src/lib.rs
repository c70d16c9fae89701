//! Software PWM on arbitrary pins from a single periodic timer interrupt.
//!
//! Every tick the shared frame counter advances by one and each registered
//! channel compares it against its level to decide whether its pin is on.
//! 256 ticks form one frame, so the timer has to run at 256 times the
//! desired PWM frequency. Channels can ramp between duty values and sample
//! an analog input at a fixed point in the frame, e.g. part way through the
//! on-phase to measure the current through a high-side driver.
//!
//! ```ignore
//! static PWM: SoftPwm<[Output<'static>; 4], Adc> = SoftPwm::new(pins, adc, SoftPwmConfig::new());
//!
//! PWM.begin(&mut timer, Polarity::Normal)?;
//! PWM.set(PinSelector::Pin(2), None, 128, Drive::Pwm)?;
//!
//! #[interrupt]
//! fn TIMER() {
//!     PWM.irq_handler();
//! }
//! ```
#![no_std]

mod fmt;

mod channel;
pub mod fade;
pub mod feedback;
pub mod hal;
pub mod scheduler;
pub mod table;

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::PinState;
use fugit::{HertzU32, MillisDurationU32};

pub use channel::{Readback, SoftPwmChannel, pwm_state};
pub use hal::{AnalogInput, NoAnalog, OutputDriver, TickTimer};
pub use scheduler::Scheduler;

/// Maximum number of channels driven by one [`SoftPwm`].
pub const MAX_CHANNELS: usize = 20;

/// Duty value of a freshly registered channel.
pub const DEFAULT_DUTY: u8 = 0;

/// Ticks in one PWM frame.
pub const TICKS_PER_FRAME: u32 = 256;

/// Frame rate used by [`SoftPwmConfig::new`].
pub const DEFAULT_FRAME_RATE: HertzU32 = HertzU32::from_raw(200);

/// Frames between two sampling frames (50 ms at 200 Hz).
pub const ANALOG_INTERVAL: u8 = 10;

/// Readback samples averaged per channel.
pub const ANALOG_SAMPLES: usize = 10;

/// Identifier of a digital output pin.
pub type OutputPinId = u8;

/// Identifier of an analog input pin.
pub type AnalogPinId = u8;

/// Logical state of a PWM output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoftPwmState {
    /// Output is in the "on" state
    On,
    /// Output is in the "off" state
    Off,
}

/// Which physical level means "on".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// On drives the pin high
    #[default]
    Normal,
    /// On drives the pin low
    Inverted,
}

impl Polarity {
    /// Physical level for a logical state.
    #[must_use]
    pub const fn pin_state(self, state: SoftPwmState) -> PinState {
        match (self, state) {
            (Polarity::Normal, SoftPwmState::On) | (Polarity::Inverted, SoftPwmState::Off) => {
                PinState::High
            }
            (Polarity::Normal, SoftPwmState::Off) | (Polarity::Inverted, SoftPwmState::On) => {
                PinState::Low
            }
        }
    }
}

/// How a channel's output is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drive {
    /// Switched by the frame counter
    #[default]
    Pwm,
    /// Held in one state, ignoring duty value and fades
    Forced(SoftPwmState),
}

impl Drive {
    /// Decode the numeric `hardset` argument of older callers.
    ///
    /// Values up to 1 keep normal switching. Larger values force the output
    /// on when `value` is at least half scale and off otherwise.
    #[must_use]
    pub const fn from_legacy(hardset: u8, value: u8) -> Self {
        match hardset {
            0 | 1 => Drive::Pwm,
            _ if value >= 128 => Drive::Forced(SoftPwmState::On),
            _ => Drive::Forced(SoftPwmState::Off),
        }
    }
}

/// Channel(s) an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinSelector {
    /// Every registered channel
    All,
    /// The channel driving this pin
    Pin(OutputPinId),
}

impl PinSelector {
    /// Whether `pin` is addressed by this selector.
    #[must_use]
    pub fn matches(self, pin: OutputPinId) -> bool {
        match self {
            PinSelector::All => true,
            PinSelector::Pin(p) => p == pin,
        }
    }
}

impl From<OutputPinId> for PinSelector {
    fn from(pin: OutputPinId) -> Self {
        PinSelector::Pin(pin)
    }
}

/// Errors that can occur during software PWM operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoftPwmError {
    /// No free channel slots available for a new pin
    CapacityExceeded,
    /// The pin is not supported by the output or has no registered channel
    InvalidPin,
    /// The percentage value is greater than 100
    InvalidDutyCycle,
    /// The frame rate is zero or needs a tick rate out of range
    InvalidFrequency,
}

impl core::fmt::Display for SoftPwmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SoftPwmError::CapacityExceeded => write!(f, "no free channel slot"),
            SoftPwmError::InvalidPin => write!(f, "invalid or unregistered pin"),
            SoftPwmError::InvalidDutyCycle => write!(f, "duty cycle above 100 %"),
            SoftPwmError::InvalidFrequency => write!(f, "invalid frame rate"),
        }
    }
}

impl core::error::Error for SoftPwmError {}

/// Timing of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftPwmConfig {
    /// PWM frequency shared by all channels
    pub frame_rate: HertzU32,
    /// Readback samples are taken once every this many frames
    pub analog_interval: u8,
}

impl SoftPwmConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            analog_interval: ANALOG_INTERVAL,
        }
    }

    #[must_use]
    pub const fn frame_rate(mut self, frame_rate: HertzU32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    #[must_use]
    pub const fn analog_interval(mut self, frames: u8) -> Self {
        self.analog_interval = frames;
        self
    }
}

impl Default for SoftPwmConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale a percentage to the 0..=255 duty range, rounding to nearest.
///
/// 50 % maps to 128.
pub fn percent_to_duty(percent: u8) -> Result<u8, SoftPwmError> {
    if percent > 100 {
        return Err(SoftPwmError::InvalidDutyCycle);
    }

    let duty = (u16::from(percent) * 255 + 50) / 100;

    u8::try_from(duty).map_err(|_| SoftPwmError::InvalidDutyCycle)
}

struct Inner<O, A, const N: usize> {
    scheduler: Scheduler<N>,
    output: O,
    analog: A,
}

/// Software PWM driver shared between the application and the timer
/// interrupt.
///
/// Every method runs inside a critical section, so the instance can live in
/// a `static` and be called from both contexts.
pub struct SoftPwm<O, A, const N: usize = MAX_CHANNELS> {
    inner: Mutex<RefCell<Inner<O, A, N>>>,
}

impl<O: OutputDriver, A: AnalogInput, const N: usize> SoftPwm<O, A, N> {
    #[must_use]
    pub const fn new(output: O, analog: A, config: SoftPwmConfig) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                scheduler: Scheduler::new(config),
                output,
                analog,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner<O, A, N>) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.inner.borrow_ref_mut(cs)))
    }

    /// Start the tick timer and clear every channel.
    ///
    /// Calling it again idles all outputs and starts over.
    pub fn begin<T: TickTimer>(
        &self,
        timer: &mut T,
        default_polarity: Polarity,
    ) -> Result<(), SoftPwmError> {
        self.with(|inner| {
            let rate = inner.scheduler.tick_rate()?;

            inner.scheduler.reset(&mut inner.output, default_polarity);
            timer.start_periodic(rate);
            info!("software PWM started at {} Hz tick rate", rate.to_Hz());

            Ok(())
        })
    }

    /// Register `pin` or update its duty value.
    ///
    /// `readback` pairs the channel with an analog input sampled once the
    /// counter reaches its threshold. With [`PinSelector::All`] the value
    /// and drive are applied to every registered channel.
    pub fn set(
        &self,
        pin: impl Into<PinSelector>,
        readback: Option<Readback>,
        value: u8,
        drive: Drive,
    ) -> Result<(), SoftPwmError> {
        let pin = pin.into();

        self.with(|inner| {
            inner
                .scheduler
                .set(&mut inner.output, pin, readback, value, drive)
        })
    }

    /// Like [`set`](Self::set) with the value and readback threshold given
    /// in percent.
    pub fn set_percent(
        &self,
        pin: impl Into<PinSelector>,
        readback: Option<Readback>,
        percent: u8,
        drive: Drive,
    ) -> Result<(), SoftPwmError> {
        let readback = match readback {
            Some(readback) => Some(Readback {
                pin: readback.pin,
                threshold: percent_to_duty(readback.threshold)?,
            }),
            None => None,
        };

        self.set(pin, readback, percent_to_duty(percent)?, drive)
    }

    /// Stop driving `pin`, leave it at its idle level and free its slot.
    pub fn end(&self, pin: impl Into<PinSelector>) -> Result<(), SoftPwmError> {
        let pin = pin.into();

        self.with(|inner| inner.scheduler.end(&mut inner.output, pin))
    }

    pub fn set_fade_time(
        &self,
        pin: impl Into<PinSelector>,
        fade_up: MillisDurationU32,
        fade_down: MillisDurationU32,
    ) -> Result<(), SoftPwmError> {
        let pin = pin.into();

        self.with(|inner| inner.scheduler.set_fade_time(pin, fade_up, fade_down))
    }

    pub fn set_polarity(
        &self,
        pin: impl Into<PinSelector>,
        polarity: Polarity,
    ) -> Result<(), SoftPwmError> {
        let pin = pin.into();

        self.with(|inner| inner.scheduler.set_polarity(pin, polarity))
    }

    /// Mean readback value of the channel sampling analog `pin`.
    ///
    /// Returns `Ok(None)` while no sample has been collected.
    pub fn get_analog(&self, pin: AnalogPinId) -> Result<Option<u16>, SoftPwmError> {
        self.with(|inner| inner.scheduler.analog(pin))
    }

    /// Snapshot of the channel driving `pin`.
    pub fn get_channel(&self, pin: OutputPinId) -> Option<SoftPwmChannel> {
        self.with(|inner| inner.scheduler.channel(pin).copied())
    }

    /// Position within the current frame.
    pub fn counter(&self) -> u8 {
        self.with(|inner| inner.scheduler.counter())
    }

    /// Timer interrupt entry point, call it once per tick.
    pub fn irq_handler(&self) {
        self.with(|inner| inner.scheduler.tick(&mut inner.output, &mut inner.analog));
    }

    /// Give back the output and analog collaborators.
    pub fn release(self) -> (O, A) {
        let inner = self.inner.into_inner().into_inner();

        (inner.output, inner.analog)
    }
}
