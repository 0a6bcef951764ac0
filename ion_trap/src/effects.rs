//! Fire-and-forget visual effects
//!
//! Each effect places its objects on the [`Stage`], queues the animation steps it
//! needs and schedules its own removal. Nothing is reported back to the caller.

use crate::config::{Palette, Timings};
use crate::constants::{LASER_SOURCE_HEIGHT, POPUP_HEIGHT};
use crate::ion::{EnergyLevel, Ion, IonId};
use crate::operations::{PulseKind, TrapEvent};
use crate::scene::{EnergyPopup, ObjectHandle, SceneGraph, SceneObject};
use crate::scheduler::Scheduler;
use crate::tween::{sequence_duration, Easing, TweenPlayer, TweenProperty, TweenStep};
use glam::Vec3;
use std::f32::consts::TAU;
use std::time::Duration;

/// Presentation collaborators the effects draw into
#[derive(Default)]
pub struct Stage {
    pub scene: SceneGraph,
    pub tweens: TweenPlayer,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run tweens for one frame
    pub fn advance(&mut self, dt: Duration) {
        self.tweens.advance(dt, &mut self.scene);
    }
}

pub struct EffectPlayer {
    timings: Timings,
    palette: Palette,
}

impl EffectPlayer {
    pub fn new(timings: Timings, palette: Palette) -> Self {
        Self { timings, palette }
    }

    pub fn laser_color(&self, kind: PulseKind) -> [f32; 4] {
        match kind {
            PulseKind::Pi => self.palette.pi_laser,
            PulseKind::HalfPi => self.palette.half_pi_laser,
        }
    }

    /// Beam from above the chain onto a single ion
    pub fn targeted_laser(
        &self,
        stage: &mut Stage,
        timers: &mut Scheduler<TrapEvent>,
        ion: &Ion,
        kind: PulseKind,
    ) -> ObjectHandle {
        let source = ion.base_position + Vec3::new(0.0, LASER_SOURCE_HEIGHT, 0.0);
        let handle = stage.scene.place(
            SceneObject::LaserBeam {
                target: ion.base_position,
                width: 0.0,
                color: self.laser_color(kind),
            },
            source,
        );
        self.fade_out_and_remove(stage, timers, handle, self.timings.targeted_laser);
        log::debug!("Targeted {} laser on ion {}", kind.label(), ion.id);
        handle
    }

    /// Sheet of light sweeping the whole chain between `from` and `to`
    pub fn global_laser(
        &self,
        stage: &mut Stage,
        timers: &mut Scheduler<TrapEvent>,
        from: Vec3,
        to: Vec3,
    ) -> ObjectHandle {
        let handle = stage.scene.place(
            SceneObject::LaserBeam {
                target: to,
                width: 0.6,
                color: self.palette.cooling_laser,
            },
            from,
        );
        self.fade_out_and_remove(stage, timers, handle, self.timings.global_laser);
        log::debug!("Global cooling laser");
        handle
    }

    /// Wavy link between two ions, removed after the entangling window
    pub fn entanglement_link(
        &self,
        stage: &mut Stage,
        timers: &mut Scheduler<TrapEvent>,
        a: IonId,
        b: IonId,
    ) -> ObjectHandle {
        let handle = stage.scene.place(
            SceneObject::EntanglementLink {
                a,
                b,
                color: self.palette.entanglement_link,
            },
            Vec3::ZERO,
        );
        timers.schedule(self.timings.entangle_duration, TrapEvent::RemoveObject(handle));
        log::debug!("Entanglement link between ions {} and {}", a, b);
        handle
    }

    /// Level diagram above `ion` animating the transition out of `from`
    pub fn energy_popup(
        &self,
        stage: &mut Stage,
        timers: &mut Scheduler<TrapEvent>,
        ion: &Ion,
        from: EnergyLevel,
        kind: PulseKind,
    ) -> ObjectHandle {
        let handle = stage.scene.place(
            SceneObject::EnergyPopup(EnergyPopup {
                ion: ion.id,
                marker_level: from.value(),
                split: 0.0,
                color: self.laser_color(kind),
            }),
            ion.base_position + Vec3::new(0.0, POPUP_HEIGHT, 0.0),
        );
        if let Some(placed) = stage.scene.get_mut(handle) {
            placed.scale = 0.0;
        }

        let steps = self.popup_steps(from, kind);
        timers.schedule(sequence_duration(&steps), TrapEvent::RemoveObject(handle));
        stage.tweens.animate(handle, steps);
        handle
    }

    /// Pop in, move the marker to the new level, split for superposition, fade out
    pub fn popup_steps(&self, from: EnergyLevel, kind: PulseKind) -> Vec<TweenStep> {
        let t = &self.timings;
        let to = kind.transition(from);

        let mut steps = vec![
            TweenStep::new(vec![(TweenProperty::Scale, 1.0)], t.popup_pop_in, Easing::BackOut),
            TweenStep::new(
                vec![(TweenProperty::MarkerLevel, to.value())],
                t.popup_transition,
                Easing::QuadInOut,
            ),
        ];
        if to == EnergyLevel::Superposition {
            steps.push(TweenStep::new(
                vec![(TweenProperty::Split, 1.0)],
                t.popup_split,
                Easing::QuadOut,
            ));
        }
        steps.push(TweenStep::hold(t.popup_hold));
        steps.push(TweenStep::new(
            vec![(TweenProperty::Opacity, 0.0)],
            t.popup_fade,
            Easing::QuadIn,
        ));
        steps
    }

    // Beams stay solid for two thirds of their life, then fade
    fn fade_out_and_remove(
        &self,
        stage: &mut Stage,
        timers: &mut Scheduler<TrapEvent>,
        handle: ObjectHandle,
        lifetime: Duration,
    ) {
        let fade = lifetime / 3;
        stage.tweens.animate(
            handle,
            vec![
                TweenStep::hold(lifetime - fade),
                TweenStep::new(vec![(TweenProperty::Opacity, 0.0)], fade, Easing::QuadIn),
            ],
        );
        timers.schedule(lifetime, TrapEvent::RemoveObject(handle));
    }
}

/// Points along a sine-modulated segment between `a` and `b`
///
/// The wave is displaced vertically and travels along the link with `time`.
pub fn wavy_curve(a: Vec3, b: Vec3, time: f32, segments: usize) -> Vec<Vec3> {
    const WAVES: f32 = 3.0;
    const AMPLITUDE: f32 = 0.25;
    const SPEED: f32 = 4.0;

    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let s = i as f32 / segments as f32;
            // Envelope pins both ends to the ions
            let envelope = (s * std::f32::consts::PI).sin();
            let offset = (s * WAVES * TAU - time * SPEED).sin() * AMPLITUDE * envelope;
            a.lerp(b, s) + Vec3::Y * offset
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ion() -> Ion {
        Ion {
            id: IonId(2),
            energy_level: EnergyLevel::Ground,
            base_position: Vec3::new(1.0, 0.0, 0.0),
            is_selected: false,
            color: [0.0; 4],
        }
    }

    fn player() -> EffectPlayer {
        EffectPlayer::new(Timings::default(), Palette::default())
    }

    #[test]
    fn laser_color_follows_pulse_kind() {
        let fx = player();
        let palette = Palette::default();
        assert_eq!(fx.laser_color(PulseKind::Pi), palette.pi_laser);
        assert_eq!(fx.laser_color(PulseKind::HalfPi), palette.half_pi_laser);
    }

    #[test]
    fn targeted_laser_removes_itself() {
        let fx = player();
        let mut stage = Stage::new();
        let mut timers = Scheduler::new();
        let handle = fx.targeted_laser(&mut stage, &mut timers, &ion(), PulseKind::Pi);

        let placed = stage.scene.get(handle).unwrap();
        assert_eq!(placed.position, Vec3::new(1.0, LASER_SOURCE_HEIGHT, 0.0));

        let fired = timers.advance(Timings::default().targeted_laser);
        assert_eq!(fired, vec![TrapEvent::RemoveObject(handle)]);
    }

    #[test]
    fn superposition_popup_includes_split() {
        let fx = player();
        let half_pi = fx.popup_steps(EnergyLevel::Ground, PulseKind::HalfPi);
        let pi = fx.popup_steps(EnergyLevel::Ground, PulseKind::Pi);
        assert_eq!(half_pi.len(), pi.len() + 1);
        assert!(half_pi
            .iter()
            .any(|s| s.changes.contains(&(TweenProperty::Split, 1.0))));
        assert!(!pi.iter().any(|s| s.changes.iter().any(|(p, _)| *p == TweenProperty::Split)));
    }

    #[test]
    fn popup_marker_moves_to_new_level() {
        let fx = player();
        let steps = fx.popup_steps(EnergyLevel::Excited, PulseKind::Pi);
        assert_eq!(steps[1].changes, vec![(TweenProperty::MarkerLevel, 0.0)]);
        assert_eq!(steps.last().unwrap().changes, vec![(TweenProperty::Opacity, 0.0)]);
    }

    #[test]
    fn popup_starts_hidden_and_is_removed_after_sequence() {
        let fx = player();
        let mut stage = Stage::new();
        let mut timers = Scheduler::new();
        let handle = fx.energy_popup(&mut stage, &mut timers, &ion(), EnergyLevel::Ground, PulseKind::Pi);
        assert_eq!(stage.scene.get(handle).unwrap().scale, 0.0);

        let total = sequence_duration(&fx.popup_steps(EnergyLevel::Ground, PulseKind::Pi));
        assert!(timers.advance(total - Duration::from_millis(1)).is_empty());
        assert_eq!(timers.advance(Duration::from_millis(1)), vec![TrapEvent::RemoveObject(handle)]);
    }

    #[test]
    fn wavy_curve_is_pinned_to_endpoints() {
        let a = Vec3::new(-1.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        let points = wavy_curve(a, b, 0.37, 32);
        assert_eq!(points.len(), 33);
        assert!((points[0] - a).length() < 1e-5);
        assert!((points[32] - b).length() < 1e-4);
        assert!(points.iter().any(|p| p.y.abs() > 0.05));
    }
}
