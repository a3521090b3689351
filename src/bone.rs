//! Rigid bones of an armature.
//!
//! Bones live in a [`froggy::Storage`] owned by their [`Armature`]. Links
//! between bones are [`BonePointer`]s downwards and weak pointers upwards, so
//! the hierarchy never keeps a removed parent alive.
//!
//! [`froggy::Storage`]: https://docs.rs/froggy/0.4/froggy/struct.Storage.html
//! [`Armature`]: ../armature/struct.Armature.html
//! [`BonePointer`]: type.BonePointer.html

use cgmath::Matrix4;
use froggy;

use std::sync::Arc;

use animation::BonePose;
use armature::ArmatureId;
use color::Color;
use data::{BaseData, BoneData};
use display::{Display, DisplayManager};
use node::SceneNode;
use render::{BlendFunc, Renderer};
use Matrix;

/// Strong reference to a bone inside its armature's storage.
pub type BonePointer = froggy::Pointer<Bone>;

/// Builds the 2D affine matrix of a pose.
///
/// Equal `skew_x` and `-skew_y` take the rotation shortcut.
pub(crate) fn pose_to_matrix(pose: &BaseData) -> Matrix {
    let (a, b, c, d);
    if pose.skew_x == -pose.skew_y {
        let (sin, cos) = pose.skew_x.sin_cos();
        a = pose.scale_x * cos;
        b = pose.scale_x * -sin;
        c = pose.scale_y * sin;
        d = pose.scale_y * cos;
    } else {
        a = pose.scale_x * pose.skew_y.cos();
        b = pose.scale_x * pose.skew_y.sin();
        c = pose.scale_y * pose.skew_x.sin();
        d = pose.scale_y * pose.skew_x.cos();
    }
    Matrix4::new(
        a, b, 0.0, 0.0,
        c, d, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        pose.x, pose.y, 0.0, 1.0,
    )
}

/// A named rigid transform inside an armature.
///
/// The pose of a bone is its bind pose from [`BoneData`] combined with the
/// tween pose written by the animation. Its world transform maps bone space
/// to armature space.
///
/// [`BoneData`]: ../data/struct.BoneData.html
pub struct Bone {
    name: String,
    pub(crate) parent: Option<froggy::WeakPointer<Bone>>,
    pub(crate) children: Vec<BonePointer>,
    pub(crate) armature: Option<ArmatureId>,
    bone_data: Option<Arc<BoneData>>,
    tween: BaseData,
    tween_z_order: i32,
    world: Matrix,
    display_manager: DisplayManager,
    blend: BlendFunc,
    blend_dirty: bool,
}

impl Bone {
    /// Create a detached bone without data or displays.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Bone {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            armature: None,
            bone_data: None,
            tween: BaseData::default(),
            tween_z_order: 0,
            world: Matrix4::from_scale(1.0),
            display_manager: DisplayManager::new(),
            blend: BlendFunc::default(),
            blend_dirty: false,
        }
    }

    /// Name, unique within the armature.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent bone, if the bone is not top-level.
    pub fn parent(&self) -> Option<BonePointer> {
        self.parent.as_ref().and_then(|weak| weak.upgrade().ok())
    }

    /// Direct children, in attachment order.
    pub fn children(&self) -> &[BonePointer] {
        &self.children
    }

    /// Armature the bone currently belongs to.
    pub fn armature(&self) -> Option<ArmatureId> {
        self.armature
    }

    /// Static description of the bone.
    pub fn bone_data(&self) -> Option<&Arc<BoneData>> {
        self.bone_data.as_ref()
    }

    /// Attaches static data. The blend function of the data becomes the
    /// blend function of the bone.
    pub fn set_bone_data(
        &mut self,
        data: Arc<BoneData>,
    ) {
        self.set_blend_func(data.blend);
        self.bone_data = Some(data);
    }

    /// Pose written by the animation, relative to the bind pose.
    pub fn tween(&self) -> &BaseData {
        &self.tween
    }

    /// Overrides the tween pose until the next animation sample.
    pub fn set_tween(
        &mut self,
        tween: BaseData,
    ) {
        self.tween = tween;
    }

    /// Bind pose combined with the tween pose.
    pub fn local_pose(&self) -> BaseData {
        match self.bone_data {
            Some(ref data) => data.bind.combine(&self.tween),
            None => self.tween,
        }
    }

    /// Drawing order: the data's base order plus the animated offset.
    pub fn z_order(&self) -> i32 {
        self.bone_data.as_ref().map_or(0, |d| d.z_order) + self.tween_z_order
    }

    /// Blend function the displays are drawn with.
    pub fn blend_func(&self) -> BlendFunc {
        self.blend
    }

    /// Set blend function; the current skin picks it up on the next draw.
    pub fn set_blend_func(
        &mut self,
        blend: BlendFunc,
    ) {
        if self.blend != blend {
            self.blend = blend;
            self.blend_dirty = true;
        }
    }

    /// Is a blend change waiting to be pushed to the current skin?
    pub fn is_blend_dirty(&self) -> bool {
        self.blend_dirty
    }

    /// Bone-to-armature transform as of the last update.
    pub fn world_transform(&self) -> Matrix {
        self.world
    }

    /// Displays of the bone.
    pub fn display_manager(&self) -> &DisplayManager {
        &self.display_manager
    }

    /// Displays of the bone, mutable.
    pub fn display_manager_mut(&mut self) -> &mut DisplayManager {
        &mut self.display_manager
    }

    /// Selects the display at `index`; `-1` hides the bone.
    ///
    /// Returns `true` if the selection changed.
    pub fn change_display_by_index(
        &mut self,
        index: i32,
        force: bool,
    ) -> bool {
        let changed = self.display_manager.change_display_by_index(index, force);
        if changed {
            self.blend_dirty = true;
        }
        changed
    }

    /// Applies a sampled animation pose. Returns `true` if the displayed
    /// content changed.
    pub(crate) fn apply_pose(
        &mut self,
        pose: &BonePose,
    ) -> bool {
        self.tween = pose.pose;
        self.tween_z_order = pose.z_order;
        self.set_blend_func(pose.blend);
        self.change_display_by_index(pose.display_index, false)
    }

    /// Recomputes the world transform and moves the current display along.
    pub(crate) fn update(
        &mut self,
        parent_world: Option<&Matrix>,
        dt: f32,
    ) {
        let local = pose_to_matrix(&self.local_pose());
        self.world = match parent_world {
            Some(parent) => parent * local,
            None => local,
        };

        let world = self.world;
        if let Some(decorative) = self.display_manager.current_display_mut() {
            let display_transform = match decorative.display {
                Display::Sprite(ref mut skin) => {
                    skin.update_transform(&world);
                    skin.node_to_armature_transform()
                }
                Display::Armature(ref mut armature) => {
                    armature.node_mut().set_additional_transform(Some(world));
                    armature.update(dt);
                    world
                }
                Display::Node(ref mut node) => {
                    node.node_mut().set_additional_transform(Some(world));
                    world
                }
            };
            if let Some(ref mut detector) = decorative.collider {
                detector.update_transform(&display_transform);
            }
        }
    }

    /// Emits the current display under the armature's model-view matrix.
    ///
    /// Skins are placed at the world transform of the last
    /// [`Armature::update`](../armature/struct.Armature.html#method.update).
    pub(crate) fn draw(
        &mut self,
        renderer: &mut dyn Renderer,
        tint: Color,
        opacity: u8,
    ) {
        if !self.display_manager.is_visible() {
            return;
        }
        let blend = self.blend;
        let world = self.world;
        let mut blend_pushed = false;
        if let Some(decorative) = self.display_manager.current_display_mut() {
            match decorative.display {
                Display::Sprite(ref mut skin) => {
                    skin.update_transform(&world);
                    if self.blend_dirty {
                        skin.set_blend_func(blend);
                        blend_pushed = true;
                    }
                    skin.draw(renderer, tint, opacity);
                }
                Display::Armature(ref mut armature) => {
                    armature.node_mut().update_displayed_color(tint);
                    armature.node_mut().update_displayed_opacity(opacity);
                    let transform = armature.node_to_parent_transform();
                    renderer.push_matrix();
                    renderer.multiply_matrix(&transform);
                    armature.draw(renderer);
                    renderer.pop_matrix();
                }
                Display::Node(ref mut node) => {
                    node.visit(renderer);
                    renderer.setup_draw_state();
                }
            }
        }
        if blend_pushed {
            self.blend_dirty = false;
        }
    }
}
