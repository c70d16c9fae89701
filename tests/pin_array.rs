use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, OutputPin};
use softpwm::{
    Drive, NoAnalog, PinSelector, Polarity, Scheduler, SoftPwm, SoftPwmConfig, SoftPwmError,
};

#[derive(Default)]
struct TestPin {
    high: bool,
    writes: u32,
}

impl ErrorType for TestPin {
    type Error = Infallible;
}

impl OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        self.writes += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        self.writes += 1;
        Ok(())
    }
}

fn test_pins() -> [TestPin; 3] {
    core::array::from_fn(|_| TestPin::default())
}

#[test]
fn pins_addressed_by_array_index() {
    let mut scheduler = Scheduler::<2>::new(SoftPwmConfig::new());
    let mut pins = test_pins();

    assert!(
        scheduler
            .set(&mut pins, PinSelector::Pin(2), None, 128, Drive::Pwm)
            .is_ok()
    );
    assert_eq!(pins[2].writes, 1);
    assert!(!pins[2].high);

    scheduler.tick(&mut pins, &mut NoAnalog);
    assert!(pins[2].high);
    assert_eq!(pins[0].writes, 0);
    assert_eq!(pins[1].writes, 0);

    for _ in 0..128 {
        scheduler.tick(&mut pins, &mut NoAnalog);
    }
    assert!(!pins[2].high);
}

#[test]
fn pins_outside_array_are_invalid() {
    let mut scheduler = Scheduler::<2>::new(SoftPwmConfig::new());
    let mut pins = test_pins();

    let result = scheduler.set(&mut pins, PinSelector::Pin(3), None, 1, Drive::Pwm);
    assert_eq!(result, Err(SoftPwmError::InvalidPin));
}

#[test]
fn softpwm_owns_pin_array() {
    let pwm = SoftPwm::<_, _, 2>::new(test_pins(), NoAnalog, SoftPwmConfig::new());

    assert!(pwm.set(0u8, None, 255, Drive::Pwm).is_ok());
    assert!(pwm.set(1u8, None, 255, Drive::Pwm).is_ok());
    assert!(pwm.set_polarity(1u8, Polarity::Inverted).is_ok());
    pwm.irq_handler();

    let (pins, _) = pwm.release();
    assert!(pins[0].high);
    assert!(!pins[1].high);
}
