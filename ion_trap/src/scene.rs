//! Transient scene objects
//!
//! Effects place objects here and remove them again when their timers fire. The
//! renderer reads the graph once per frame; ions themselves are not scene objects,
//! they are drawn straight from the registry.

use crate::ion::IonId;
use glam::Vec3;
use std::collections::BTreeMap;

/// Handle returned by [`SceneGraph::place`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(u64);

/// Energy-level diagram shown above a pulsed ion
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyPopup {
    pub ion: IonId,
    /// Height of the population marker between the ground (0) and excited (1) bars
    pub marker_level: f32,
    /// 0 = single marker, 1 = marker fully split onto both bars
    pub split: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    /// Beam from the object's position to `target`; `width` > 0 spreads it into a sheet
    LaserBeam {
        target: Vec3,
        width: f32,
        color: [f32; 4],
    },
    /// Wavy link drawn between the current positions of two ions
    EntanglementLink {
        a: IonId,
        b: IonId,
        color: [f32; 4],
    },
    EnergyPopup(EnergyPopup),
}

/// A placed object with the properties tweens can animate
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub object: SceneObject,
    pub position: Vec3,
    pub scale: f32,
    pub opacity: f32,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    next_handle: u64,
    objects: BTreeMap<ObjectHandle, Placed>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, object: SceneObject, position: Vec3) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(
            handle,
            Placed {
                object,
                position,
                scale: 1.0,
                opacity: 1.0,
            },
        );
        handle
    }

    /// Remove an object; returns false if it was already gone
    pub fn remove(&mut self, handle: ObjectHandle) -> bool {
        self.objects.remove(&handle).is_some()
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&Placed> {
        self.objects.get(&handle)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut Placed> {
        self.objects.get_mut(&handle)
    }

    /// Objects in placement order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &Placed)> {
        self.objects.iter().map(|(h, p)| (*h, p))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
