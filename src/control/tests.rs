use super::*;
use crate::config::ScanConfig;

fn pan_limits() -> AxisLimits {
    AxisLimits {
        min: 20.0,
        max: 160.0,
        center: 90.0,
    }
}

fn tilt_limits() -> AxisLimits {
    AxisLimits {
        min: 50.0,
        max: 130.0,
        center: 90.0,
    }
}

fn actuator_at(pan: f64, tilt: f64, max_step: f64) -> ActuatorState {
    let mut state = ActuatorState::new(pan_limits(), tilt_limits(), max_step);
    for _ in 0..200 {
        state = state.step_toward(pan, tilt);
    }
    state
}

fn controller(kp_pan: f64, kp_tilt: f64, dead_zone: f64) -> ProportionalController {
    ProportionalController::new(
        AxisGain {
            kp: kp_pan,
            invert: false,
        },
        AxisGain {
            kp: kp_tilt,
            invert: false,
        },
        dead_zone,
    )
}

fn scan_pattern(step: f64) -> ScanPattern {
    ScanPattern::new(
        pan_limits(),
        tilt_limits(),
        &ScanConfig {
            step_degrees: step,
            tilt_amplitude: 30.0,
            tilt_waves: 4.0,
        },
    )
}

#[test]
fn test_actuator_starts_centered() {
    let state = ActuatorState::new(pan_limits(), tilt_limits(), 4.0);
    assert_eq!(state.angles(), (90.0, 90.0));
}

#[test]
fn test_step_toward_is_clamped_and_rate_limited() {
    let mut state = ActuatorState::new(pan_limits(), tilt_limits(), 4.0);
    let requests = [
        (500.0, -500.0),
        (91.0, 89.5),
        (-10.0, 300.0),
        (f64::NAN, 120.0),
        (160.0, 130.0),
        (0.0, 0.0),
    ];

    for _ in 0..60 {
        for &(pan, tilt) in &requests {
            let next = state.step_toward(pan, tilt);
            assert!((next.pan() - state.pan()).abs() <= 4.0 + 1e-9);
            assert!((next.tilt() - state.tilt()).abs() <= 4.0 + 1e-9);
            assert!((20.0..=160.0).contains(&next.pan()));
            assert!((50.0..=130.0).contains(&next.tilt()));
            state = next;
        }
    }
}

#[test]
fn test_non_finite_request_holds() {
    let state = ActuatorState::new(pan_limits(), tilt_limits(), 4.0);
    let next = state.step_toward(f64::INFINITY, f64::NAN);
    assert_eq!(next.angles(), state.angles());
}

#[test]
fn test_centered_ignores_rate_limit() {
    let state = actuator_at(150.0, 60.0, 2.0);
    assert_eq!(state.angles(), (150.0, 60.0));
    assert_eq!(state.centered().angles(), (90.0, 90.0));
}

#[test]
fn test_centered_target_holds_position() {
    let ctl = controller(10.0, 10.0, 0.05);
    let current = actuator_at(90.0, 90.0, 4.0);
    let next = ctl.compute_command((0.0, 0.0), &current);
    assert_eq!(next.angles(), (90.0, 90.0));
}

#[test]
fn test_offset_target_moves_pan_only() {
    let ctl = controller(10.0, 10.0, 0.05);
    assert_eq!(ctl.compute_delta((0.5, 0.0)), (5.0, 0.0));

    // Delta of 5 degrees capped to a 4 degree step
    let current = actuator_at(90.0, 90.0, 4.0);
    let next = ctl.compute_command((0.5, 0.0), &current);
    assert_eq!(next.angles(), (86.0, 90.0));

    let roomy = actuator_at(90.0, 90.0, 10.0);
    assert_eq!(ctl.compute_command((0.5, 0.0), &roomy).angles(), (85.0, 90.0));
}

#[test]
fn test_dead_zone_suppresses_small_errors() {
    let ctl = controller(10.0, 6.0, 0.05);
    assert_eq!(ctl.compute_delta((0.049, -0.049)), (0.0, 0.0));
    assert_eq!(ctl.compute_delta((0.049, 0.5)), (0.0, 3.0));
    assert_eq!(ctl.compute_delta((-0.2, 0.0)), (-2.0, 0.0));
}

#[test]
fn test_inverted_axis_flips_correction() {
    let ctl = ProportionalController::new(
        AxisGain {
            kp: 10.0,
            invert: false,
        },
        AxisGain {
            kp: 10.0,
            invert: true,
        },
        0.0,
    );
    let current = actuator_at(90.0, 90.0, 10.0);
    let next = ctl.compute_command((0.2, 0.2), &current);
    assert_eq!(next.angles(), (88.0, 92.0));
}

#[test]
fn test_command_clamps_at_limits() {
    let ctl = controller(50.0, 50.0, 0.0);
    let mut state = actuator_at(25.0, 55.0, 4.0);
    for _ in 0..10 {
        state = ctl.compute_command((1.0, 1.0), &state);
    }
    assert_eq!(state.angles(), (20.0, 50.0));
}

#[test]
fn test_scan_is_deterministic() {
    let scan = scan_pattern(1.0);
    for cycle in [0u64, 1, 17, 139, 140, 281, 10_000] {
        assert_eq!(scan.next_scan_angles(cycle), scan.next_scan_angles(cycle));
    }
    let copy = scan.clone();
    assert_eq!(copy.next_scan_angles(42), scan.next_scan_angles(42));
}

#[test]
fn test_scan_pan_ping_pongs_within_limits() {
    let scan = scan_pattern(2.0);
    let mut saw_max = false;
    let mut saw_min = false;
    let mut previous = scan.next_scan_angles(0);

    for cycle in 1..400 {
        let (pan, tilt) = scan.next_scan_angles(cycle);
        assert!((20.0..=160.0).contains(&pan));
        assert!((50.0..=130.0).contains(&tilt));
        assert!((pan - previous.0).abs() <= 2.0 + 1e-9);
        saw_max |= (pan - 160.0).abs() < 1e-9;
        saw_min |= (pan - 20.0).abs() < 1e-9;
        previous = (pan, tilt);
    }

    assert!(saw_max && saw_min);
}

#[test]
fn test_scan_changes_direction_at_limits() {
    let scan = scan_pattern(1.0);
    // Starts at center heading up: reaches max after 70 cycles
    assert_eq!(scan.direction_at(10), ScanDirection::Ascending);
    assert_eq!(scan.next_scan_angles(70).0, 160.0);
    assert_eq!(scan.direction_at(75), ScanDirection::Descending);
    assert_eq!(scan.next_scan_angles(75).0, 155.0);
}

#[test]
fn test_scan_resumes_near_current_angle() {
    let mut scan = scan_pattern(1.0);
    scan.resume_from((57.0, 100.0), 500);

    let (pan, _) = scan.next_scan_angles(500);
    assert!((pan - 57.0).abs() <= 1.0 + 1e-9);
    // Farther limit is max, so the sweep ascends
    assert_eq!(scan.direction_at(500), ScanDirection::Ascending);
    assert!(scan.next_scan_angles(501).0 > pan);

    scan.resume_from((150.0, 90.0), 900);
    assert_eq!(scan.direction_at(900), ScanDirection::Descending);
    assert!((scan.next_scan_angles(900).0 - 149.0).abs() < 1e-9);
}

#[test]
fn test_scan_tilt_is_centered_at_pan_center() {
    let scan = scan_pattern(1.0);
    let (pan, tilt) = scan.next_scan_angles(0);
    assert_eq!(pan, 90.0);
    assert!((tilt - 90.0).abs() < 1e-9);
}
