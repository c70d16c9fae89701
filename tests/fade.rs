use fugit::{ExtU32, HertzU32};
use softpwm::fade::{frames_for, next_level, step_size};
use softpwm::feedback::SampleWindow;

#[test]
fn step_size_divides_full_range() {
    assert_eq!(step_size(0), 255);
    assert_eq!(step_size(1), 255);
    assert_eq!(step_size(2), 128);
    assert_eq!(step_size(4), 64);
    assert_eq!(step_size(100), 2);
    assert_eq!(step_size(256), 1);
    assert_eq!(step_size(1000), 1);
}

#[test]
fn next_level_clamps_at_target() {
    assert_eq!(next_level(0, 100, 4, 4), 64);
    assert_eq!(next_level(64, 100, 4, 4), 100);
    assert_eq!(next_level(250, 255, 1000, 0), 251);
    assert_eq!(next_level(200, 10, 0, 2), 72);
    assert_eq!(next_level(72, 10, 0, 2), 10);
    assert_eq!(next_level(10, 10, 4, 4), 10);
}

#[test]
fn zero_duration_jumps() {
    assert_eq!(next_level(0, 255, 0, 4), 255);
    assert_eq!(next_level(255, 0, 4, 0), 0);
}

#[test]
fn frames_for_rounds_to_nearest_frame() {
    let rate = HertzU32::from_raw(200);

    assert_eq!(frames_for(0u32.millis(), rate), 0);
    assert_eq!(frames_for(1u32.millis(), rate), 1);
    assert_eq!(frames_for(7u32.millis(), rate), 1);
    assert_eq!(frames_for(8u32.millis(), rate), 2);
    assert_eq!(frames_for(1000u32.millis(), rate), 200);
    assert_eq!(frames_for(u32::MAX.millis(), rate), u16::MAX);
}

#[test]
fn sample_window_is_empty_until_first_sample() {
    let mut window = SampleWindow::<4>::new();

    assert!(window.is_empty());
    assert_eq!(window.average(), None);

    window.push(9);
    assert_eq!(window.len(), 1);
    assert_eq!(window.average(), Some(9));
}

#[test]
fn sample_window_averages_partial_fill() {
    let mut window = SampleWindow::<10>::new();

    for sample in [10, 20, 40] {
        window.push(sample);
    }

    assert_eq!(window.len(), 3);
    assert_eq!(window.average(), Some(23));
}

#[test]
fn sample_window_keeps_most_recent_samples() {
    let mut window = SampleWindow::<4>::new();

    for sample in [1000, 2000, 3000, 1, 2, 3, 4] {
        window.push(sample);
        assert!(window.len() <= 4);
    }

    assert_eq!(window.len(), 4);
    assert_eq!(window.average(), Some(2));

    window.push(u16::MAX);
    window.push(u16::MAX);
    window.push(u16::MAX);
    window.push(u16::MAX);
    assert_eq!(window.average(), Some(u16::MAX));

    window.clear();
    assert_eq!(window.average(), None);
}
