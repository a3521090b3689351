//! Descriptions of skeletons and their animations.
//!
//! These structures are produced by a data reader (out of scope for this
//! crate), registered in a [`DataManager`] and shared read-only between
//! every [`Armature`] built from the same name.
//!
//! ## Skeleton
//!
//! [`ArmatureData`] lists [`BoneData`] entries in authoring order. Each entry
//! names its parent bone, so the hierarchy is implied by the data; an empty
//! parent name makes a top-level bone. The bind pose of a bone is a
//! [`BaseData`] relative to its parent.
//!
//! ## Animation
//!
//! [`AnimationData`] holds named [`MovementData`] (an "animation clip" in other
//! engines). A movement has one [`MovementBoneData`] track per animated bone,
//! made of [`FrameData`] keyframes positioned in frames, not seconds.
//!
//! [`DataManager`]: ../manager/struct.DataManager.html
//! [`Armature`]: ../armature/struct.Armature.html
//! [`ArmatureData`]: struct.ArmatureData.html
//! [`BoneData`]: struct.BoneData.html
//! [`BaseData`]: struct.BaseData.html
//! [`AnimationData`]: struct.AnimationData.html
//! [`MovementData`]: struct.MovementData.html
//! [`MovementBoneData`]: struct.MovementBoneData.html
//! [`FrameData`]: struct.FrameData.html

use mint;

use std::collections::HashMap;
use std::sync::Arc;

use animation::TweenEasing;
use render::BlendFunc;

/// A local pose: translation, per-axis skew and scale.
///
/// Skews are in radians. Equal `skew_x` and `-skew_y` describe a plain
/// rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseData {
    /// Translation along X.
    pub x: f32,
    /// Translation along Y.
    pub y: f32,
    /// Skew of the Y axis, in radians.
    pub skew_x: f32,
    /// Skew of the X axis, in radians.
    pub skew_y: f32,
    /// Scale along X.
    pub scale_x: f32,
    /// Scale along Y.
    pub scale_y: f32,
}

impl Default for BaseData {
    fn default() -> Self {
        BaseData {
            x: 0.0,
            y: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl BaseData {
    /// Pose at the given translation.
    pub fn at(x: f32, y: f32) -> Self {
        BaseData { x, y, ..BaseData::default() }
    }

    /// Pose rotated clockwise by `radians`.
    pub fn rotated(
        mut self,
        radians: f32,
    ) -> Self {
        self.skew_x = radians;
        self.skew_y = -radians;
        self
    }

    /// Applies `delta` on top of `self`: translations and skews add up,
    /// scales multiply.
    pub fn combine(
        &self,
        delta: &BaseData,
    ) -> BaseData {
        BaseData {
            x: self.x + delta.x,
            y: self.y + delta.y,
            skew_x: self.skew_x + delta.skew_x,
            skew_y: self.skew_y + delta.skew_y,
            scale_x: self.scale_x * delta.scale_x,
            scale_y: self.scale_y * delta.scale_y,
        }
    }

    /// Linear blend between two poses, `s` in `[0, 1]`.
    pub fn lerp(
        &self,
        to: &BaseData,
        s: f32,
    ) -> BaseData {
        let f = |a: f32, b: f32| a + (b - a) * s;
        BaseData {
            x: f(self.x, to.x),
            y: f(self.y, to.y),
            skew_x: f(self.skew_x, to.skew_x),
            skew_y: f(self.skew_y, to.skew_y),
            scale_x: f(self.scale_x, to.scale_x),
            scale_y: f(self.scale_y, to.scale_y),
        }
    }
}

/// A collision outline in display-local coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContourData {
    /// Outline vertices.
    pub vertices: Vec<mint::Point2<f32>>,
}

/// Textured quad display.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDisplayData {
    /// Texture name as known to the backend.
    pub texture: String,
    /// Quad size.
    pub size: mint::Vector2<f32>,
    /// Normalized anchor of the quad.
    pub anchor: mint::Point2<f32>,
    /// Pose of the quad relative to the bone.
    pub skin: BaseData,
    /// Collision outlines attached to this display.
    pub contours: Vec<ContourData>,
}

/// A display a bone can switch to.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayData {
    /// Textured quad.
    Sprite(SpriteDisplayData),
    /// Nested armature registered under the given name.
    Armature {
        /// Name of the nested skeleton.
        name: String,
    },
}

impl DisplayData {
    /// Centered sprite display without contours.
    pub fn sprite<S: Into<String>>(
        texture: S,
        width: f32,
        height: f32,
    ) -> Self {
        DisplayData::Sprite(SpriteDisplayData {
            texture: texture.into(),
            size: [width, height].into(),
            anchor: [0.5, 0.5].into(),
            skin: BaseData::default(),
            contours: Vec::new(),
        })
    }

    /// Nested armature display.
    pub fn armature<S: Into<String>>(name: S) -> Self {
        DisplayData::Armature { name: name.into() }
    }
}

/// Static description of one bone.
#[derive(Clone, Debug, PartialEq)]
pub struct BoneData {
    /// Name, unique within the skeleton.
    pub name: String,
    /// Name of the parent bone, empty for top-level bones.
    pub parent_name: String,
    /// Bind pose relative to the parent bone.
    pub bind: BaseData,
    /// Base drawing order.
    pub z_order: i32,
    /// Blend function the displays are drawn with.
    pub blend: BlendFunc,
    /// Displays the bone can switch between.
    pub displays: Vec<DisplayData>,
}

impl BoneData {
    /// Bone at the bind pose `bind`, with no displays.
    pub fn new<S: Into<String>, P: Into<String>>(
        name: S,
        parent_name: P,
        bind: BaseData,
    ) -> Self {
        BoneData {
            name: name.into(),
            parent_name: parent_name.into(),
            bind,
            z_order: 0,
            blend: BlendFunc::default(),
            displays: Vec::new(),
        }
    }

    /// Adds a display to the bone.
    pub fn with_display(
        mut self,
        display: DisplayData,
    ) -> Self {
        self.displays.push(display);
        self
    }

    /// Sets the base drawing order.
    pub fn with_z_order(
        mut self,
        z_order: i32,
    ) -> Self {
        self.z_order = z_order;
        self
    }
}

/// Static description of a skeleton.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArmatureData {
    /// Skeleton name.
    pub name: String,
    bones: Vec<Arc<BoneData>>,
}

impl ArmatureData {
    /// Empty skeleton.
    pub fn new<S: Into<String>>(name: S) -> Self {
        ArmatureData {
            name: name.into(),
            bones: Vec::new(),
        }
    }

    /// Registers a bone. A later entry with the same name replaces the
    /// earlier one in place.
    pub fn add_bone_data(
        &mut self,
        data: BoneData,
    ) {
        match self.bones.iter().position(|b| b.name == data.name) {
            Some(i) => self.bones[i] = Arc::new(data),
            None => self.bones.push(Arc::new(data)),
        }
    }

    /// Builder flavor of [`add_bone_data`](#method.add_bone_data).
    pub fn with_bone(
        mut self,
        data: BoneData,
    ) -> Self {
        self.add_bone_data(data);
        self
    }

    /// Looks a bone up by name.
    pub fn bone_data(
        &self,
        name: &str,
    ) -> Option<&Arc<BoneData>> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Bones in registration order.
    pub fn bones(&self) -> &[Arc<BoneData>] {
        &self.bones
    }
}

/// One keyframe of a bone track.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameData {
    /// Frame at which this keyframe starts.
    pub frame_id: u32,
    /// Pose offset from the bind pose.
    pub pose: BaseData,
    /// Easing applied while blending towards the next keyframe.
    pub easing: TweenEasing,
    /// Display to show, `-1` hides the bone.
    pub display_index: i32,
    /// Drawing order offset added to the bone's base z-order.
    pub z_order: i32,
    /// Blend function for the bone's displays.
    pub blend: BlendFunc,
    /// Named event fired when playback reaches this keyframe.
    pub event: Option<String>,
}

impl FrameData {
    /// Keyframe at `frame_id` with the given pose, showing display 0.
    pub fn new(
        frame_id: u32,
        pose: BaseData,
    ) -> Self {
        FrameData {
            frame_id,
            pose,
            easing: TweenEasing::Linear,
            display_index: 0,
            z_order: 0,
            blend: BlendFunc::default(),
            event: None,
        }
    }
}

/// Keyframe track of one bone inside a movement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovementBoneData {
    /// Name of the animated bone.
    pub name: String,
    /// Keyframes sorted by `frame_id`.
    pub frames: Vec<FrameData>,
}

impl MovementBoneData {
    /// Track with the given keyframes, sorted by `frame_id`.
    pub fn new<S: Into<String>>(
        name: S,
        mut frames: Vec<FrameData>,
    ) -> Self {
        frames.sort_by_key(|f| f.frame_id);
        MovementBoneData {
            name: name.into(),
            frames,
        }
    }

    /// Keyframe by position in the track.
    pub fn frame_data(
        &self,
        index: usize,
    ) -> Option<&FrameData> {
        self.frames.get(index)
    }
}

/// A named animation clip.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementData {
    /// Movement name.
    pub name: String,
    /// Length in frames.
    pub duration: u32,
    /// Playback speed multiplier.
    pub scale: f32,
    /// Does the movement loop by default?
    pub looped: bool,
    bones: HashMap<String, MovementBoneData>,
}

impl MovementData {
    /// Empty looping movement of the given length in frames.
    pub fn new<S: Into<String>>(
        name: S,
        duration: u32,
    ) -> Self {
        MovementData {
            name: name.into(),
            duration,
            scale: 1.0,
            looped: true,
            bones: HashMap::new(),
        }
    }

    /// Adds a bone track, replacing any track for the same bone.
    pub fn add_movement_bone_data(
        &mut self,
        data: MovementBoneData,
    ) {
        self.bones.insert(data.name.clone(), data);
    }

    /// Builder flavor of
    /// [`add_movement_bone_data`](#method.add_movement_bone_data).
    pub fn with_bone(
        mut self,
        data: MovementBoneData,
    ) -> Self {
        self.add_movement_bone_data(data);
        self
    }

    /// Track of the named bone.
    pub fn movement_bone_data(
        &self,
        name: &str,
    ) -> Option<&MovementBoneData> {
        self.bones.get(name)
    }

    /// All bone tracks, in no particular order.
    pub fn movement_bones(&self) -> impl Iterator<Item = &MovementBoneData> {
        self.bones.values()
    }
}

/// Every movement of a skeleton.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationData {
    /// Name of the skeleton the movements animate.
    pub name: String,
    /// Movement names in registration order.
    pub movement_names: Vec<String>,
    movements: HashMap<String, MovementData>,
}

impl AnimationData {
    /// Animation data without movements.
    pub fn new<S: Into<String>>(name: S) -> Self {
        AnimationData {
            name: name.into(),
            movement_names: Vec::new(),
            movements: HashMap::new(),
        }
    }

    /// Registers a movement. Re-registering a name replaces the movement but
    /// keeps its original position in `movement_names`.
    pub fn add_movement(
        &mut self,
        data: MovementData,
    ) {
        if !self.movements.contains_key(&data.name) {
            self.movement_names.push(data.name.clone());
        }
        self.movements.insert(data.name.clone(), data);
    }

    /// Builder flavor of [`add_movement`](#method.add_movement).
    pub fn with_movement(
        mut self,
        data: MovementData,
    ) -> Self {
        self.add_movement(data);
        self
    }

    /// Looks a movement up by name.
    pub fn movement(
        &self,
        name: &str,
    ) -> Option<&MovementData> {
        self.movements.get(name)
    }

    /// Number of registered movements.
    pub fn movement_count(&self) -> usize {
        self.movement_names.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bones_keep_registration_order() {
        let data = ArmatureData::new("hero")
            .with_bone(BoneData::new("root", "", BaseData::default()))
            .with_bone(BoneData::new("arm", "root", BaseData::at(10.0, 0.0)))
            .with_bone(BoneData::new("root", "", BaseData::at(1.0, 1.0)));
        let names = data.bones().iter().map(|b| b.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["root", "arm"]);
        assert_eq!(data.bone_data("root").map(|b| b.bind.x), Some(1.0));
    }

    #[test]
    fn tracks_are_sorted() {
        let track = MovementBoneData::new(
            "arm",
            vec![FrameData::new(10, BaseData::default()), FrameData::new(0, BaseData::default())],
        );
        assert_eq!(track.frame_data(0).map(|f| f.frame_id), Some(0));
    }

    #[test]
    fn combine_adds_offsets_and_multiplies_scale() {
        let bind = BaseData { scale_x: 2.0, ..BaseData::at(1.0, 2.0) };
        let tween = BaseData { scale_x: 0.5, ..BaseData::at(3.0, 4.0).rotated(0.5) };
        let pose = bind.combine(&tween);
        assert_eq!((pose.x, pose.y, pose.scale_x), (4.0, 6.0, 1.0));
        assert_eq!((pose.skew_x, pose.skew_y), (0.5, -0.5));
    }
}
