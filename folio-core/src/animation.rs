//! Per-frame animation of a scene model.
//!
//! [`SceneAnimator::update`] is the whole animation: it takes the time
//! since the previous frame and the current inputs and returns the pose to
//! draw. All smoothing rates are expressed per 60 Hz frame and converted
//! with [`smoothing`], so the motion looks the same at any refresh rate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::FRAC_PI_2;

use crate::section::Section;
use crate::transform::{wrap_angle, Orientation};

/// Yaw per scroll pixel in scroll-follow mode
pub const SCROLL_SENSITIVITY: f32 = 0.002;
/// Canonical display yaw in showcase mode (facing right)
pub const SHOWCASE_YAW: f32 = FRAC_PI_2;
/// Turntable speed while playing, rad/s
pub const SPIN_VELOCITY: f32 = 3.0;

pub const SCROLL_EASE: f32 = 0.05;
pub const SHOWCASE_EASE: f32 = 0.08;
pub const SPIN_ACCELERATION: f32 = 0.05;
pub const SPIN_DECELERATION: f32 = 0.12;
/// Largest jitter, as a fraction of the playing velocity
pub const SPIN_JITTER: f32 = 0.01;

const SETTLE_EPSILON: f32 = 1e-3;
/// Frames longer than this (backgrounded tab, debugger) are clamped
const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationMode {
    ScrollFollow,
    ShowcaseLock,
    SpinLinked { is_playing: bool },
}

impl AnimationMode {
    pub fn for_section(section: Section, is_playing: bool) -> Self {
        match section {
            Section::Portfolio => AnimationMode::ShowcaseLock,
            Section::Music => AnimationMode::SpinLinked { is_playing },
            _ => AnimationMode::ScrollFollow,
        }
    }

    fn is_spin(self) -> bool {
        matches!(self, AnimationMode::SpinLinked { .. })
    }
}

/// Idle float parameters of one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    pub float_amplitude: f32,
    /// Angular frequency of the float, rad/s
    pub float_frequency: f32,
}

impl MotionProfile {
    pub const BACKDROP: MotionProfile = MotionProfile {
        float_amplitude: 0.1,
        float_frequency: 0.5,
    };
    pub const TURNTABLE: MotionProfile = MotionProfile {
        float_amplitude: 0.2,
        float_frequency: 0.8,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub scroll_offset: f64,
    pub mode: AnimationMode,
}

/// What to draw this frame: orientation plus vertical float offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub orientation: Orientation,
    pub lift: f32,
}

/// Fraction of the remaining distance to cover in `dt` seconds, for a rate
/// given per 60 Hz frame.
pub fn smoothing(rate_per_frame: f32, dt: f32) -> f32 {
    1.0 - (1.0 - rate_per_frame).powf(dt * 60.0)
}

#[derive(Debug, Clone)]
pub struct SceneAnimator {
    profile: MotionProfile,
    elapsed: f32,
    orientation: Orientation,
    spin_velocity: f32,
    mode: Option<AnimationMode>,
    rng: StdRng,
}

impl SceneAnimator {
    pub fn new(profile: MotionProfile) -> Self {
        Self::with_seed(profile, 0x5eed)
    }

    pub fn with_seed(profile: MotionProfile, seed: u64) -> Self {
        Self {
            profile,
            elapsed: 0.0,
            orientation: Orientation::zero(),
            spin_velocity: 0.0,
            mode: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn spin_velocity(&self) -> f32 {
        self.spin_velocity
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn update(&mut self, dt: f32, input: &FrameInput) -> Pose {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.elapsed += dt;

        let leaving_spin = self.mode.is_some_and(AnimationMode::is_spin) && !input.mode.is_spin();
        self.mode = Some(input.mode);

        match input.mode {
            AnimationMode::ScrollFollow => {
                let target = input.scroll_offset as f32 * SCROLL_SENSITIVITY;
                self.ease_toward(target, SCROLL_EASE, dt, leaving_spin);
            }
            AnimationMode::ShowcaseLock => {
                self.ease_toward(SHOWCASE_YAW, SHOWCASE_EASE, dt, leaving_spin);
            }
            AnimationMode::SpinLinked { is_playing } => self.spin(is_playing, dt),
        }

        Pose {
            orientation: self.orientation,
            lift: self.profile.float_amplitude * (self.elapsed * self.profile.float_frequency).sin(),
        }
    }

    fn ease_toward(&mut self, target: f32, rate: f32, dt: f32, leaving_spin: bool) {
        if leaving_spin {
            // Spinning accumulates whole turns; start from the equivalent
            // angle nearest the target so easing does not unwind them.
            self.orientation.yaw = target + wrap_angle(self.orientation.yaw - target);
            self.spin_velocity = 0.0;
        }
        let alpha = smoothing(rate, dt);
        self.orientation.yaw += (target - self.orientation.yaw) * alpha;
        self.orientation.pitch -= self.orientation.pitch * alpha;
        self.orientation.roll -= self.orientation.roll * alpha;
    }

    fn spin(&mut self, is_playing: bool, dt: f32) {
        let target = if is_playing { SPIN_VELOCITY } else { 0.0 };
        let rate = if target > self.spin_velocity {
            SPIN_ACCELERATION
        } else {
            SPIN_DECELERATION
        };
        self.spin_velocity += (target - self.spin_velocity) * smoothing(rate, dt);

        let settled = (target - self.spin_velocity).abs() < SETTLE_EPSILON;
        if settled {
            self.spin_velocity = target;
        }

        let mut step = self.spin_velocity * dt;
        if settled && is_playing {
            step *= 1.0 + self.rng.gen_range(-SPIN_JITTER..=SPIN_JITTER);
        }
        self.orientation.yaw += step;
        self.orientation.pitch = 0.0;
        self.orientation.roll = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const FRAME: f32 = 1.0 / 60.0;

    fn run(animator: &mut SceneAnimator, frames: usize, dt: f32, input: FrameInput) -> Pose {
        let mut pose = animator.update(0.0, &input);
        for _ in 0..frames {
            pose = animator.update(dt, &input);
        }
        pose
    }

    fn scroll(offset: f64) -> FrameInput {
        FrameInput {
            scroll_offset: offset,
            mode: AnimationMode::ScrollFollow,
        }
    }

    fn spin(is_playing: bool) -> FrameInput {
        FrameInput {
            scroll_offset: 0.0,
            mode: AnimationMode::SpinLinked { is_playing },
        }
    }

    #[test]
    fn test_mode_for_section() {
        assert_eq!(AnimationMode::for_section(Section::Portfolio, true), AnimationMode::ShowcaseLock);
        assert_eq!(
            AnimationMode::for_section(Section::Music, true),
            AnimationMode::SpinLinked { is_playing: true }
        );
        assert_eq!(AnimationMode::for_section(Section::About, true), AnimationMode::ScrollFollow);
    }

    #[test]
    fn test_float_follows_sine() {
        let mut animator = SceneAnimator::new(MotionProfile::BACKDROP);
        let pose = run(&mut animator, 90, FRAME, scroll(0.0));
        let expected = 0.1 * (animator.elapsed() * 0.5).sin();
        assert!((pose.lift - expected).abs() < 1e-6);
        assert!((animator.elapsed() - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_scroll_follow_eases_without_snapping() {
        let mut animator = SceneAnimator::new(MotionProfile::BACKDROP);
        let target = 1000.0 * SCROLL_SENSITIVITY;
        let first = run(&mut animator, 1, FRAME, scroll(1000.0)).orientation.yaw;
        assert!(first > 0.0 && first < target);
        let later = run(&mut animator, 600, FRAME, scroll(1000.0)).orientation.yaw;
        assert!(later <= target);
        assert!((later - target).abs() < 1e-3);
    }

    #[test]
    fn test_easing_is_refresh_rate_independent() {
        let mut at_60 = SceneAnimator::new(MotionProfile::BACKDROP);
        let mut at_144 = SceneAnimator::new(MotionProfile::BACKDROP);
        let a = run(&mut at_60, 60, 1.0 / 60.0, scroll(800.0));
        let b = run(&mut at_144, 144, 1.0 / 144.0, scroll(800.0));
        assert!((a.orientation.yaw - b.orientation.yaw).abs() < 1e-4);
    }

    #[test]
    fn test_showcase_locks_to_display_yaw() {
        let mut animator = SceneAnimator::new(MotionProfile::BACKDROP);
        let input = FrameInput {
            scroll_offset: 5000.0,
            mode: AnimationMode::ShowcaseLock,
        };
        let pose = run(&mut animator, 600, FRAME, input);
        assert!((pose.orientation.yaw - SHOWCASE_YAW).abs() < 1e-3);
    }

    #[test]
    fn test_spin_stops_faster_than_it_starts() {
        let mut animator = SceneAnimator::new(MotionProfile::TURNTABLE);
        run(&mut animator, 30, FRAME, spin(true));
        let gained = animator.spin_velocity() / SPIN_VELOCITY;

        run(&mut animator, 1200, FRAME, spin(true));
        assert_eq!(animator.spin_velocity(), SPIN_VELOCITY);

        run(&mut animator, 30, FRAME, spin(false));
        let lost = 1.0 - animator.spin_velocity() / SPIN_VELOCITY;
        assert!(lost > gained, "lost {lost} gained {gained}");

        run(&mut animator, 1200, FRAME, spin(false));
        assert_eq!(animator.spin_velocity(), 0.0);
    }

    #[test]
    fn test_spin_jitter_is_imperceptible() {
        let mut animator = SceneAnimator::new(MotionProfile::TURNTABLE);
        run(&mut animator, 1200, FRAME, spin(true));
        let nominal = SPIN_VELOCITY * FRAME;
        for _ in 0..200 {
            let before = animator.orientation().yaw;
            let after = animator.update(FRAME, &spin(true)).orientation.yaw;
            let ratio = (after - before) / nominal;
            assert!((ratio - 1.0).abs() <= SPIN_JITTER + 1e-3);
        }
    }

    #[test]
    fn test_spin_pins_pitch_and_roll() {
        let mut animator = SceneAnimator::new(MotionProfile::TURNTABLE);
        animator.orientation = Orientation::new(0.4, 0.0, -0.2);
        let pose = animator.update(FRAME, &spin(true));
        assert_eq!(pose.orientation.pitch, 0.0);
        assert_eq!(pose.orientation.roll, 0.0);
    }

    #[test]
    fn test_leaving_spin_does_not_unwind_turns() {
        let mut animator = SceneAnimator::new(MotionProfile::TURNTABLE);
        run(&mut animator, 600, FRAME, spin(true));
        assert!(animator.orientation().yaw > 4.0 * PI);

        let pose = animator.update(FRAME, &scroll(0.0));
        assert!(pose.orientation.yaw.abs() <= PI);
        assert_eq!(animator.spin_velocity(), 0.0);
    }

    #[test]
    fn test_degenerate_frame_times() {
        let mut animator = SceneAnimator::new(MotionProfile::BACKDROP);
        let before = animator.orientation();
        animator.update(f32::NAN, &scroll(1000.0));
        animator.update(-1.0, &scroll(1000.0));
        assert_eq!(animator.orientation(), before);
        assert_eq!(animator.elapsed(), 0.0);
    }
}
