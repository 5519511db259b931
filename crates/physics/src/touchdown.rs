//! Ground-contact classification: does a touchdown land or crash?

use thiserror::Error;

/// Highest total speed (m/s) at which a touchdown still counts as a landing.
pub const LANDED_MAX_SPEED: f32 = 60.0;
/// Highest sink rate (m/s, positive down) at which a touchdown still counts as a landing.
pub const LANDING_MAX_VSPEED: f32 = 4.0;
/// Largest bank (radians, either side) tolerated at touchdown.
pub const LANDING_MAX_ROLL: f32 = 10.0 * std::f32::consts::PI / 180.0;
/// Lowest nose attitude (radians) tolerated at touchdown; slightly nose-down is allowed.
pub const LANDING_MIN_PITCH: f32 = -3.0 * std::f32::consts::PI / 180.0;

/// Snapshot of the craft at the instant it crosses the ground-contact height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touchdown {
    pub speed: f32,
    pub vertical_speed: f32,
    pub pitch: f32,
    pub roll: f32,
    pub gear_deployed: bool,
}

/// Why a touchdown became a crash.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CrashCause {
    #[error("landing gear not deployed")]
    GearUp,
    #[error("touchdown speed {0:.1} m/s above {max} m/s", max = LANDED_MAX_SPEED)]
    Overspeed(f32),
    #[error("sink rate {0:.1} m/s beyond {max} m/s", max = LANDING_MAX_VSPEED)]
    HardLanding(f32),
    #[error("bank of {0:.1} degrees at touchdown")]
    ExcessiveRoll(f32),
    #[error("nose-down attitude of {0:.1} degrees at touchdown")]
    NoseDown(f32),
}

/// Apply the touchdown limits. Values exactly at a limit land; only values strictly past a
/// limit crash.
pub fn classify_touchdown(touchdown: &Touchdown) -> Result<(), CrashCause> {
    if !touchdown.gear_deployed {
        return Err(CrashCause::GearUp);
    }
    if touchdown.speed > LANDED_MAX_SPEED {
        return Err(CrashCause::Overspeed(touchdown.speed));
    }
    if touchdown.vertical_speed < -LANDING_MAX_VSPEED {
        return Err(CrashCause::HardLanding(-touchdown.vertical_speed));
    }
    if touchdown.roll.abs() > LANDING_MAX_ROLL {
        return Err(CrashCause::ExcessiveRoll(touchdown.roll.to_degrees()));
    }
    if touchdown.pitch < LANDING_MIN_PITCH {
        return Err(CrashCause::NoseDown(touchdown.pitch.to_degrees()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gentle() -> Touchdown {
        Touchdown {
            speed: 30.0,
            vertical_speed: -1.0,
            pitch: 0.05,
            roll: 0.0,
            gear_deployed: true,
        }
    }

    #[test]
    fn gentle_touchdown_lands() {
        assert_eq!(classify_touchdown(&gentle()), Ok(()));
    }

    #[test]
    fn gear_up_always_crashes() {
        let t = Touchdown { gear_deployed: false, ..gentle() };
        assert_eq!(classify_touchdown(&t), Err(CrashCause::GearUp));
    }

    #[test]
    fn speed_boundary_lands() {
        let t = Touchdown { speed: LANDED_MAX_SPEED, ..gentle() };
        assert!(classify_touchdown(&t).is_ok());
        let t = Touchdown { speed: LANDED_MAX_SPEED + 0.01, ..gentle() };
        assert!(matches!(classify_touchdown(&t), Err(CrashCause::Overspeed(_))));
    }

    #[test]
    fn vertical_speed_boundary_lands() {
        let t = Touchdown { vertical_speed: -LANDING_MAX_VSPEED, ..gentle() };
        assert!(classify_touchdown(&t).is_ok());
        let t = Touchdown { vertical_speed: -LANDING_MAX_VSPEED - 0.01, ..gentle() };
        assert!(matches!(classify_touchdown(&t), Err(CrashCause::HardLanding(_))));
    }

    #[test]
    fn roll_boundary_lands_both_sides() {
        for roll in [LANDING_MAX_ROLL, -LANDING_MAX_ROLL] {
            let t = Touchdown { roll, ..gentle() };
            assert!(classify_touchdown(&t).is_ok(), "roll {roll} should land");
        }
        let t = Touchdown { roll: -(LANDING_MAX_ROLL + 0.001), ..gentle() };
        assert!(matches!(classify_touchdown(&t), Err(CrashCause::ExcessiveRoll(_))));
    }

    #[test]
    fn pitch_boundary_lands() {
        let t = Touchdown { pitch: LANDING_MIN_PITCH, ..gentle() };
        assert!(classify_touchdown(&t).is_ok());
        let t = Touchdown { pitch: LANDING_MIN_PITCH - 0.001, ..gentle() };
        assert!(matches!(classify_touchdown(&t), Err(CrashCause::NoseDown(_))));
    }

    #[test]
    fn all_boundaries_together_land() {
        let t = Touchdown {
            speed: LANDED_MAX_SPEED,
            vertical_speed: -LANDING_MAX_VSPEED,
            pitch: LANDING_MIN_PITCH,
            roll: LANDING_MAX_ROLL,
            gear_deployed: true,
        };
        assert_eq!(classify_touchdown(&t), Ok(()));
    }
}
