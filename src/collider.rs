//! Pass-through attachment points for a physics engine.
//!
//! The crate does not simulate anything. A [`ColliderBinder`] is injected when
//! an armature is built and translates the few operations the armature
//! needs (owner stamping, shape enumeration) to the physics backend linked
//! by the application. Armatures built without one use [`NoPhysics`].
//!
//! [`ColliderBinder`]: trait.ColliderBinder.html
//! [`NoPhysics`]: struct.NoPhysics.html

use mint;

use armature::ArmatureId;
use data::ContourData;
use geometry;
use Matrix;

/// Opaque handle of a rigid body owned by the physics backend.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BodyHandle(pub u64);

/// Opaque handle of a collision shape owned by the physics backend.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ShapeHandle(pub u64);

/// Capability interface of the physics backend.
pub trait ColliderBinder {
    /// Records `owner` in the body's user data so that collision callbacks
    /// can find the armature back.
    fn attach_owner(
        &mut self,
        body: BodyHandle,
        owner: ArmatureId,
    );

    /// Shapes (fixtures) attached to the body.
    fn shape_list(
        &self,
        body: BodyHandle,
    ) -> Vec<ShapeHandle>;
}

/// Binder used when no physics backend is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPhysics;

impl ColliderBinder for NoPhysics {
    fn attach_owner(
        &mut self,
        _body: BodyHandle,
        _owner: ArmatureId,
    ) {
    }

    fn shape_list(
        &self,
        _body: BodyHandle,
    ) -> Vec<ShapeHandle> {
        Vec::new()
    }
}

/// Collision filtering data forwarded to the backend.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ColliderFilter {
    /// Category the shapes belong to.
    pub category_bits: u16,
    /// Categories the shapes collide with.
    pub mask_bits: u16,
    /// Shapes of the same non-zero group always (positive) or never
    /// (negative) collide.
    pub group_index: i16,
}

impl Default for ColliderFilter {
    fn default() -> Self {
        ColliderFilter {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

/// One collision outline of a display.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderBody {
    contour: ContourData,
    calculated: Vec<mint::Point2<f32>>,
}

impl ColliderBody {
    /// Outline in display-local coordinates.
    pub fn contour(&self) -> &ContourData {
        &self.contour
    }

    /// Outline in armature coordinates, as of the last bone update.
    pub fn calculated_vertices(&self) -> &[mint::Point2<f32>] {
        &self.calculated
    }
}

/// Collision outlines of a display, moved along with the bone.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderDetector {
    bodies: Vec<ColliderBody>,
    body: Option<BodyHandle>,
    filter: ColliderFilter,
    active: bool,
}

impl ColliderDetector {
    /// Create an active detector for the given outlines.
    pub fn new(contours: &[ContourData]) -> Self {
        ColliderDetector {
            bodies: contours
                .iter()
                .map(|c| ColliderBody {
                    contour: c.clone(),
                    calculated: c.vertices.clone(),
                })
                .collect(),
            body: None,
            filter: ColliderFilter::default(),
            active: true,
        }
    }

    /// Outlines of the display.
    pub fn bodies(&self) -> &[ColliderBody] {
        &self.bodies
    }

    /// Rigid body the outlines are attached to.
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Attaches the outlines to a rigid body.
    pub fn set_body(
        &mut self,
        body: Option<BodyHandle>,
    ) {
        self.body = body;
    }

    /// Collision filter of the outlines.
    pub fn filter(&self) -> ColliderFilter {
        self.filter
    }

    /// Set collision filter of the outlines.
    pub fn set_filter(
        &mut self,
        filter: ColliderFilter,
    ) {
        self.filter = filter;
    }

    /// Inactive detectors keep their last outlines.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable outline tracking.
    pub fn set_active(
        &mut self,
        active: bool,
    ) {
        self.active = active;
    }

    /// Maps every outline through the display's armature-space transform.
    pub fn update_transform(
        &mut self,
        transform: &Matrix,
    ) {
        if !self.active {
            return;
        }
        for body in &mut self.bodies {
            body.calculated = body.contour
                .vertices
                .iter()
                .map(|v| geometry::transform_point(transform, *v))
                .collect();
        }
    }
}
