//! Declarative property animation for scene objects
//!
//! A sequence is an ordered list of steps; the changes inside one step run in
//! parallel. The effect code only describes steps, [`TweenPlayer::advance`] does
//! the interpolation each frame.

use crate::scene::{ObjectHandle, SceneGraph, SceneObject};
use std::collections::VecDeque;
use std::time::Duration;

/// Easing curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    /// Overshoots slightly before settling
    BackOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::BackOut => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                let u = t - 1.0;
                1.0 + C3 * u * u * u + C1 * u * u
            }
        }
    }
}

/// Animatable properties of a placed object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenProperty {
    Scale,
    Opacity,
    /// Popup marker height
    MarkerLevel,
    /// Popup marker split
    Split,
}

impl TweenProperty {
    fn read(self, scene: &SceneGraph, target: ObjectHandle) -> Option<f32> {
        let placed = scene.get(target)?;
        match self {
            TweenProperty::Scale => Some(placed.scale),
            TweenProperty::Opacity => Some(placed.opacity),
            TweenProperty::MarkerLevel => match &placed.object {
                SceneObject::EnergyPopup(popup) => Some(popup.marker_level),
                _ => None,
            },
            TweenProperty::Split => match &placed.object {
                SceneObject::EnergyPopup(popup) => Some(popup.split),
                _ => None,
            },
        }
    }

    fn write(self, scene: &mut SceneGraph, target: ObjectHandle, value: f32) {
        let Some(placed) = scene.get_mut(target) else {
            return;
        };
        match self {
            TweenProperty::Scale => placed.scale = value,
            TweenProperty::Opacity => placed.opacity = value,
            TweenProperty::MarkerLevel => {
                if let SceneObject::EnergyPopup(popup) = &mut placed.object {
                    popup.marker_level = value;
                }
            }
            TweenProperty::Split => {
                if let SceneObject::EnergyPopup(popup) = &mut placed.object {
                    popup.split = value;
                }
            }
        }
    }
}

/// One step of a sequence: parallel property changes over a shared duration
#[derive(Debug, Clone, PartialEq)]
pub struct TweenStep {
    pub changes: Vec<(TweenProperty, f32)>,
    pub duration: Duration,
    pub easing: Easing,
}

impl TweenStep {
    pub fn new(changes: Vec<(TweenProperty, f32)>, duration: Duration, easing: Easing) -> Self {
        Self {
            changes,
            duration,
            easing,
        }
    }

    /// A step that changes nothing
    pub fn hold(duration: Duration) -> Self {
        Self::new(Vec::new(), duration, Easing::Linear)
    }
}

/// Total running time of a step list
pub fn sequence_duration(steps: &[TweenStep]) -> Duration {
    steps.iter().map(|s| s.duration).sum()
}

struct ActiveSequence {
    target: ObjectHandle,
    steps: VecDeque<TweenStep>,
    elapsed: Duration,
    start_values: Option<Vec<f32>>,
}

impl ActiveSequence {
    /// Returns false once the sequence is finished or its target is gone
    fn advance(&mut self, mut dt: Duration, scene: &mut SceneGraph) -> bool {
        while let Some(step) = self.steps.front() {
            let start_values = match &self.start_values {
                Some(values) => values.clone(),
                None => {
                    let mut values = Vec::with_capacity(step.changes.len());
                    for (property, _) in &step.changes {
                        match property.read(scene, self.target) {
                            Some(v) => values.push(v),
                            None => return false,
                        }
                    }
                    self.start_values = Some(values.clone());
                    values
                }
            };

            self.elapsed += dt;
            let t = if step.duration.is_zero() {
                1.0
            } else {
                (self.elapsed.as_secs_f32() / step.duration.as_secs_f32()).min(1.0)
            };
            let eased = step.easing.apply(t);

            for ((property, end), start) in step.changes.iter().zip(&start_values) {
                property.write(scene, self.target, start + (end - start) * eased);
            }

            if self.elapsed < step.duration {
                return true;
            }

            // Carry the overshoot into the next step
            dt = self.elapsed - step.duration;
            self.elapsed = Duration::ZERO;
            self.start_values = None;
            self.steps.pop_front();
        }
        false
    }
}

#[derive(Default)]
pub struct TweenPlayer {
    sequences: Vec<ActiveSequence>,
}

impl TweenPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start running `steps` against `target`
    pub fn animate(&mut self, target: ObjectHandle, steps: Vec<TweenStep>) {
        if steps.is_empty() {
            return;
        }
        self.sequences.push(ActiveSequence {
            target,
            steps: steps.into(),
            elapsed: Duration::ZERO,
            start_values: None,
        });
    }

    pub fn advance(&mut self, dt: Duration, scene: &mut SceneGraph) {
        self.sequences.retain_mut(|seq| seq.advance(dt, scene));
    }

    pub fn active(&self) -> usize {
        self.sequences.len()
    }
}
