//! Moves handed to the (external) motion collaborator.

use crate::grid::{Action, Coordinate};

/// What caused a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// A decided one-tile move.
    Step(Action),
    /// An uncontrolled trap displacement.
    TrapDisplacement { direction: Action, distance: i32 },
}

/// One outstanding move from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub from: Coordinate,
    pub to: Coordinate,
    pub kind: MotionKind,
}

impl Motion {
    pub fn step(from: Coordinate, action: Action) -> Self {
        Self {
            from,
            to: from.step(action),
            kind: MotionKind::Step(action),
        }
    }

    pub fn displacement(from: Coordinate, direction: Action, distance: i32) -> Self {
        Self {
            from,
            to: from.offset(direction, distance),
            kind: MotionKind::TrapDisplacement {
                direction,
                distance,
            },
        }
    }
}

/// Animates or otherwise carries out a motion.
///
/// The controller stays busy from [`start`](MotionDriver::start) until the
/// driver's owner calls
/// [`EpisodeController::complete_motion`](super::EpisodeController::complete_motion).
pub trait MotionDriver {
    fn start(&mut self, motion: &Motion);
}

/// Headless driver with no animation; completion is up to the caller.
#[derive(Debug, Default, Clone)]
pub struct InstantMotion {
    started: u64,
}

impl InstantMotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of motions started so far.
    pub fn started(&self) -> u64 {
        self.started
    }
}

impl MotionDriver for InstantMotion {
    fn start(&mut self, motion: &Motion) {
        self.started += 1;
        log::trace!("motion {:?} {} -> {}", motion.kind, motion.from, motion.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displacement_target() {
        let m = Motion::displacement(Coordinate::new(1, 1), Action::Left, 3);
        assert_eq!(m.to, Coordinate::new(-2, 1));
        let s = Motion::step(Coordinate::new(0, 0), Action::Up);
        assert_eq!(s.to, Coordinate::new(0, 1));
        assert_eq!(s.kind, MotionKind::Step(Action::Up));
    }
}
