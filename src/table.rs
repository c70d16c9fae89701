use crate::channel::SoftPwmChannel;
use crate::{AnalogPinId, OutputPinId, Polarity, SoftPwmError};

/// Fixed-capacity table of channels, one slot per output pin.
#[derive(Debug)]
pub struct ChannelTable<const N: usize> {
    slots: [Option<SoftPwmChannel>; N],
}

impl<const N: usize> Default for ChannelTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChannelTable<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
        }
    }

    /// Slot holding `pin`, if registered.
    pub fn lookup(&self, pin: OutputPinId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|ch| ch.pin == pin))
    }

    /// Slot for `pin`, claiming the first free slot for a new pin.
    ///
    /// The flag is `true` when the slot was freshly claimed. A new channel
    /// starts with `polarity` and default settings.
    pub fn find_or_allocate(
        &mut self,
        pin: OutputPinId,
        polarity: Polarity,
    ) -> Result<(usize, bool), SoftPwmError> {
        if let Some(index) = self.lookup(pin) {
            return Ok((index, false));
        }

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(SoftPwmChannel::new(pin, polarity));

                return Ok((i, true));
            }
        }

        Err(SoftPwmError::CapacityExceeded)
    }

    /// Empty slot `index`, returning what it held.
    pub fn free(&mut self, index: usize) -> Option<SoftPwmChannel> {
        self.slots.get_mut(index)?.take()
    }

    pub fn get(&self, index: usize) -> Option<&SoftPwmChannel> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SoftPwmChannel> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Channel sampling analog `pin`.
    pub fn by_readback(&self, pin: AnalogPinId) -> Option<&SoftPwmChannel> {
        self.iter()
            .find(|ch| ch.readback.is_some_and(|readback| readback.pin == pin))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoftPwmChannel> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SoftPwmChannel> {
        self.slots.iter_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn clear(&mut self) {
        self.slots = [None; N];
    }
}
