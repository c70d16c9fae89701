//! Frame counter and per-channel state machines.
//!
//! [`Scheduler`] holds everything the tick touches and performs the
//! foreground operations without any locking. [`SoftPwm`](crate::SoftPwm)
//! wraps it in a critical section; tests and single-threaded simulations
//! may drive it directly.

use fugit::{HertzU32, MillisDurationU32};

use crate::channel::{Readback, SoftPwmChannel};
use crate::hal::{AnalogInput, OutputDriver};
use crate::table::ChannelTable;
use crate::{
    AnalogPinId, Drive, OutputPinId, PinSelector, Polarity, SoftPwmConfig, SoftPwmError,
    SoftPwmState, TICKS_PER_FRAME, fade,
};

pub struct Scheduler<const N: usize> {
    table: ChannelTable<N>,
    counter: u8,
    frames_since_sample: u8,
    sampling_frame: bool,
    default_polarity: Polarity,
    config: SoftPwmConfig,
}

impl<const N: usize> Scheduler<N> {
    #[must_use]
    pub const fn new(config: SoftPwmConfig) -> Self {
        Self {
            table: ChannelTable::new(),
            // the first tick wraps to zero and opens a frame
            counter: u8::MAX,
            frames_since_sample: 0,
            sampling_frame: false,
            default_polarity: Polarity::Normal,
            config,
        }
    }

    /// Interrupt rate needed for the configured frame rate.
    pub fn tick_rate(&self) -> Result<HertzU32, SoftPwmError> {
        let frame_hz = self.config.frame_rate.to_Hz();

        if frame_hz == 0 {
            return Err(SoftPwmError::InvalidFrequency);
        }

        frame_hz
            .checked_mul(TICKS_PER_FRAME)
            .map(HertzU32::from_raw)
            .ok_or(SoftPwmError::InvalidFrequency)
    }

    /// Position within the current frame.
    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn table(&self) -> &ChannelTable<N> {
        &self.table
    }

    /// Idle every registered output and start over with an empty table.
    pub fn reset<O: OutputDriver>(&mut self, output: &mut O, default_polarity: Polarity) {
        for ch in self.table.iter() {
            output.write_output(ch.pin, ch.pin_state(SoftPwmState::Off));
        }

        self.table.clear();
        self.counter = u8::MAX;
        self.frames_since_sample = 0;
        self.sampling_frame = false;
        self.default_polarity = default_polarity;
    }

    /// Advance one tick: drive every channel and take due readback samples.
    ///
    /// Level changes are latched when the counter wraps, so each frame
    /// carries one clean pulse per channel.
    pub fn tick<O: OutputDriver, A: AnalogInput>(&mut self, output: &mut O, analog: &mut A) {
        self.counter = self.counter.wrapping_add(1);
        let counter = self.counter;

        if counter == 0 {
            self.start_frame();
        }

        let sampling = self.sampling_frame;

        for ch in self.table.iter_mut() {
            let state = ch.state_at(counter);
            output.write_output(ch.pin, ch.pin_state(state));

            if sampling && let Some(pin) = ch.sample_due(counter) {
                ch.samples.push(analog.read_raw(pin));
            }
        }
    }

    fn start_frame(&mut self) {
        self.frames_since_sample = self.frames_since_sample.saturating_add(1);
        self.sampling_frame = self.frames_since_sample >= self.config.analog_interval.max(1);

        if self.sampling_frame {
            self.frames_since_sample = 0;
        }

        for ch in self.table.iter_mut() {
            if ch.drive == Drive::Pwm {
                ch.advance_fade();
            }
        }
    }

    /// Register `pin` or update its duty value, readback and drive.
    ///
    /// With [`PinSelector::All`] only the duty value and drive of the
    /// registered channels change.
    pub fn set<O: OutputDriver>(
        &mut self,
        output: &mut O,
        pin: PinSelector,
        readback: Option<Readback>,
        value: u8,
        drive: Drive,
    ) -> Result<(), SoftPwmError> {
        let pin = match pin {
            PinSelector::All => {
                for ch in self.table.iter_mut() {
                    ch.duty = value;
                    ch.drive = drive;
                }

                return Ok(());
            }
            PinSelector::Pin(pin) => pin,
        };

        if !output.supports(pin) {
            return Err(SoftPwmError::InvalidPin);
        }

        let (index, created) = match self.table.find_or_allocate(pin, self.default_polarity) {
            Ok(slot) => slot,
            Err(e) => {
                warn!("no free slot for pin {}", pin);
                return Err(e);
            }
        };

        let ch = self.table.get_mut(index).ok_or(SoftPwmError::InvalidPin)?;

        ch.duty = value;
        ch.drive = drive;
        ch.set_readback(readback);

        if created {
            output.write_output(pin, ch.pin_state(SoftPwmState::Off));
            debug!("pin {} registered in slot {}", pin, index);
        }

        Ok(())
    }

    /// Idle and release the selected channels.
    pub fn end<O: OutputDriver>(
        &mut self,
        output: &mut O,
        pin: PinSelector,
    ) -> Result<(), SoftPwmError> {
        self.check_registered(pin)?;

        for index in 0..N {
            if self.table.get(index).is_some_and(|ch| pin.matches(ch.pin))
                && let Some(ch) = self.table.free(index)
            {
                output.write_output(ch.pin, ch.pin_state(SoftPwmState::Off));
                output.release(ch.pin);
                debug!("pin {} released from slot {}", ch.pin, index);
            }
        }

        Ok(())
    }

    /// Set the ramp durations used when the duty value rises or falls.
    pub fn set_fade_time(
        &mut self,
        pin: PinSelector,
        fade_up: MillisDurationU32,
        fade_down: MillisDurationU32,
    ) -> Result<(), SoftPwmError> {
        let frame_rate = self.config.frame_rate;
        let up = fade::frames_for(fade_up, frame_rate);
        let down = fade::frames_for(fade_down, frame_rate);

        self.for_each(pin, |ch| {
            ch.fade_up = up;
            ch.fade_down = down;
        })
    }

    /// Change polarity without touching duty value or fade progress.
    pub fn set_polarity(
        &mut self,
        pin: PinSelector,
        polarity: Polarity,
    ) -> Result<(), SoftPwmError> {
        self.for_each(pin, |ch| ch.polarity = polarity)
    }

    /// Readback average of the channel sampling analog `pin`.
    ///
    /// `Ok(None)` means no sample has been taken yet.
    pub fn analog(&self, pin: AnalogPinId) -> Result<Option<u16>, SoftPwmError> {
        self.table
            .by_readback(pin)
            .map(SoftPwmChannel::average)
            .ok_or(SoftPwmError::InvalidPin)
    }

    pub fn channel(&self, pin: OutputPinId) -> Option<&SoftPwmChannel> {
        self.table.get(self.table.lookup(pin)?)
    }

    fn for_each(
        &mut self,
        pin: PinSelector,
        mut f: impl FnMut(&mut SoftPwmChannel),
    ) -> Result<(), SoftPwmError> {
        self.check_registered(pin)?;

        for ch in self.table.iter_mut().filter(|ch| pin.matches(ch.pin)) {
            f(ch);
        }

        Ok(())
    }

    fn check_registered(&self, pin: PinSelector) -> Result<(), SoftPwmError> {
        match pin {
            PinSelector::Pin(pin) if self.table.lookup(pin).is_none() => {
                Err(SoftPwmError::InvalidPin)
            }
            _ => Ok(()),
        }
    }
}
