//! The skeletal root node.
//!
//! ## Building
//!
//! Armatures are built from data registered in a [`DataManager`], either with
//! one of the `create*` shortcuts or with a [`Builder`]:
//!
//! ```rust
//! # extern crate armature;
//! # use std::sync::Arc;
//! # use armature::{ArmatureData, AnimationData, BaseData, BoneData, DataManager};
//! use armature::Armature;
//!
//! # let repo = Arc::new(DataManager::new());
//! # repo.add(
//! #     ArmatureData::new("hero").with_bone(BoneData::new("root", "", BaseData::default())),
//! #     AnimationData::new("hero"),
//! # );
//! let hero = Armature::builder()
//!     .name("hero")
//!     .frame_rate(30.0)
//!     .build(&repo)
//!     .unwrap();
//! assert!(hero.bone("root").is_some());
//! ```
//!
//! ## Frame cycle
//!
//! [`update`] advances the animation, writes the sampled poses onto the bones
//! and recomputes every bone's world transform. [`visit`] then applies the
//! armature's own transform, sorts its children and [`draw`]s them.
//!
//! [`DataManager`]: ../manager/struct.DataManager.html
//! [`Builder`]: struct.Builder.html
//! [`update`]: struct.Armature.html#method.update
//! [`visit`]: struct.Armature.html#method.visit
//! [`draw`]: struct.Armature.html#method.draw

use froggy;
use mint;

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::ops;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use animation::{ArmatureAnimation, DEFAULT_FRAME_INTERVAL};
use bone::{Bone, BonePointer};
use collider::{BodyHandle, ColliderBinder, ColliderDetector, ColliderFilter, NoPhysics, ShapeHandle};
use color;
use data::{AnimationData, ArmatureData, DisplayData};
use display::{DecorativeDisplay, Display};
use geometry::{self, Rect};
use manager::DataManager;
use node::{Node, SceneNode};
use render::{BlendFunc, DrawCommand, Renderer};
use sprite::Skin;
use Matrix;

/// Name given to armatures built without skeleton data.
pub const DEFAULT_NAME: &str = "new_armature";

quick_error! {
    #[doc = "Error encountered when building or driving an armature."]
    #[derive(Debug)]
    pub enum Error {
        #[doc = "No skeleton is registered under the name."]
        MissingArmatureData(name: String) {
            display("armature data `{}` is not registered", name)
        }

        #[doc = "No animation is registered under the name."]
        MissingAnimationData(name: String) {
            display("animation data `{}` is not registered", name)
        }

        #[doc = "The skeleton does not describe the bone."]
        MissingBoneData(name: String) {
            display("bone data `{}` is missing from the skeleton", name)
        }

        #[doc = "The skeleton declares a parent loop through the bone."]
        CyclicBoneData(name: String) {
            display("bone `{}` is its own ancestor", name)
        }

        #[doc = "No bone of the armature has the name."]
        UnknownBone(name: String) {
            display("bone `{}` is not part of the armature", name)
        }

        #[doc = "The animation has no movement with the name."]
        UnknownMovement(name: String) {
            display("movement `{}` not found", name)
        }

        #[doc = "The bone has no display at the index."]
        DisplayIndexOutOfRange(bone: String, index: i32) {
            display("bone `{}` has no display #{}", bone, index)
        }
    }
}

static NEXT_ARMATURE_ID: AtomicUsize = AtomicUsize::new(0);

/// Process-unique identity of an armature, stamped into its bones and
/// into physics bodies.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ArmatureId(usize);

impl ArmatureId {
    fn next() -> Self {
        ArmatureId(NEXT_ARMATURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Link from a nested armature to the bone of the outer armature that
/// displays it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ParentBone {
    /// Outer armature.
    pub armature: ArmatureId,
    /// Name of the carrying bone in the outer armature.
    pub bone: String,
}

/// Builder for creating new [`Armature`](struct.Armature.html)s with desired
/// parameters.
pub struct Builder {
    name: String,
    parent_bone: Option<ParentBone>,
    batched: bool,
    frame_interval: f32,
    binder: Option<Box<dyn ColliderBinder>>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            name: String::new(),
            parent_bone: None,
            batched: false,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            binder: None,
        }
    }
}

impl Builder {
    /// Skeleton name to look up in the repository. Empty by default, which
    /// builds an armature with fresh empty data.
    pub fn name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Bone of an outer armature this armature is displayed by.
    pub fn parent_bone(&mut self, parent: ParentBone) -> &mut Self {
        self.parent_bone = Some(parent);
        self
    }

    /// Whether a batch owns the draw state. Defaults to `false`.
    pub fn batched(&mut self, option: bool) -> &mut Self {
        self.batched = option;
        self
    }

    /// Frames per second of the authored animation. Defaults to 60.
    pub fn frame_rate(&mut self, fps: f32) -> &mut Self {
        self.frame_interval = 1.0 / fps;
        self
    }

    /// Physics backend receiving bodies set with
    /// [`Armature::set_body`](struct.Armature.html#method.set_body).
    /// Defaults to [`NoPhysics`](../collider/struct.NoPhysics.html).
    pub fn collider_binder<B: ColliderBinder + 'static>(&mut self, binder: B) -> &mut Self {
        self.binder = Some(Box::new(binder));
        self
    }

    /// Create a new `Armature` with desired parameters.
    ///
    /// The collider binder is moved into the armature, so a builder reused
    /// afterwards falls back to `NoPhysics`.
    pub fn build(&mut self, repo: &Arc<DataManager>) -> Result<Armature, Error> {
        let binder = self.binder.take().unwrap_or_else(|| Box::new(NoPhysics));
        let mut armature = Armature::empty(repo.clone(), binder);
        armature.batched = self.batched;
        armature.animation.set_frame_interval(self.frame_interval);
        armature.parent_bone = self.parent_bone.clone();
        armature.init(&self.name)?;
        info!("Built armature {} ({:?})", armature.name, armature.id);
        Ok(armature)
    }
}

enum Child {
    Bone(BonePointer),
    Node(Box<dyn SceneNode>),
}

struct ChildEntry {
    child: Child,
    arrival: u32,
}

/// A scene node owning a hierarchy of bones and the animation driving them.
pub struct Armature {
    node: Node,
    id: ArmatureId,
    name: String,
    repo: Arc<DataManager>,
    armature_data: Arc<ArmatureData>,
    animation: ArmatureAnimation,
    bones: froggy::Storage<Bone>,
    bone_dic: HashMap<String, BonePointer>,
    bone_order: Vec<String>,
    top_bones: Vec<BonePointer>,
    children: Vec<ChildEntry>,
    next_arrival: u32,
    parent_bone: Option<ParentBone>,
    batched: bool,
    blend: BlendFunc,
    offset_point: mint::Point2<f32>,
    transform_dirty: Cell<bool>,
    binder: Box<dyn ColliderBinder>,
    body: Option<BodyHandle>,
    collider_filter: Option<ColliderFilter>,
}
node_wrapper!(Armature);

impl fmt::Debug for Armature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Armature")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("bones", &self.bone_order)
            .field("node", &self.node)
            .finish()
    }
}

impl Armature {
    fn empty(
        repo: Arc<DataManager>,
        binder: Box<dyn ColliderBinder>,
    ) -> Self {
        Armature {
            node: Node::new(),
            id: ArmatureId::next(),
            name: String::new(),
            repo,
            armature_data: Arc::new(ArmatureData::default()),
            animation: ArmatureAnimation::new(Arc::new(AnimationData::default())),
            bones: froggy::Storage::new(),
            bone_dic: HashMap::new(),
            bone_order: Vec::new(),
            top_bones: Vec::new(),
            children: Vec::new(),
            next_arrival: 0,
            parent_bone: None,
            batched: false,
            blend: BlendFunc::ALPHA_NON_PREMULTIPLIED,
            offset_point: [0.0, 0.0].into(),
            transform_dirty: Cell::new(true),
            binder,
            body: None,
            collider_filter: None,
        }
    }

    /// Create a [`Builder`](struct.Builder.html).
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Anonymous armature over fresh empty data named
    /// [`DEFAULT_NAME`](constant.DEFAULT_NAME.html).
    pub fn create(repo: &Arc<DataManager>) -> Result<Self, Error> {
        Armature::builder().build(repo)
    }

    /// Armature over the skeleton registered as `name`.
    pub fn create_named(
        name: &str,
        repo: &Arc<DataManager>,
    ) -> Result<Self, Error> {
        Armature::builder().name(name).build(repo)
    }

    /// Armature displayed by a bone of an outer armature.
    pub fn create_with_parent(
        name: &str,
        parent_bone: ParentBone,
        repo: &Arc<DataManager>,
    ) -> Result<Self, Error> {
        Armature::builder().name(name).parent_bone(parent_bone).build(repo)
    }

    /// Rebuilds the armature from the skeleton registered as `name`.
    ///
    /// All bones and children are dropped first. An empty name registers
    /// fresh empty data under [`DEFAULT_NAME`](constant.DEFAULT_NAME.html).
    pub fn init(
        &mut self,
        name: &str,
    ) -> Result<(), Error> {
        self.remove_all_children();
        self.blend = BlendFunc::ALPHA_NON_PREMULTIPLIED;
        self.offset_point = [0.0, 0.0].into();
        self.node.set_transform_offset(self.offset_point);

        if name.is_empty() {
            self.name = DEFAULT_NAME.to_string();
            let armature_data = self.repo.add_armature_data(DEFAULT_NAME, ArmatureData::new(DEFAULT_NAME));
            let animation_data = self.repo.add_animation_data(DEFAULT_NAME, AnimationData::new(DEFAULT_NAME));
            self.armature_data = armature_data;
            self.animation.set_animation_data(animation_data);
        } else {
            let animation_data = self.repo
                .animation_data(name)
                .ok_or_else(|| Error::MissingAnimationData(name.to_string()))?;
            let armature_data = self.repo
                .armature_data(name)
                .ok_or_else(|| Error::MissingArmatureData(name.to_string()))?;
            self.name = name.to_string();
            self.armature_data = armature_data.clone();
            self.animation.set_animation_data(animation_data);

            for data in armature_data.bones() {
                let ptr = self.create_bone(&data.name)?;
                match self.animation.first_frame(&data.name).cloned() {
                    Some(frame) => {
                        let bone = &mut self.bones[&ptr];
                        bone.set_tween(frame.pose);
                        bone.change_display_by_index(frame.display_index, false);
                    }
                    None => debug!("No initial pose for bone {} of {}", data.name, name),
                }
            }
            self.update(0.0);
            self.update_offset_point();
        }

        self.node.set_cascade_opacity_enabled(true);
        self.node.set_cascade_color_enabled(true);
        self.node.schedule_update();
        Ok(())
    }

    /// Process-unique identity.
    pub fn id(&self) -> ArmatureId {
        self.id
    }

    /// Skeleton name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared skeleton description.
    pub fn armature_data(&self) -> &Arc<ArmatureData> {
        &self.armature_data
    }

    /// Animation driver.
    pub fn animation(&self) -> &ArmatureAnimation {
        &self.animation
    }

    /// Animation driver, mutable.
    pub fn animation_mut(&mut self) -> &mut ArmatureAnimation {
        &mut self.animation
    }

    /// Replaces the animation driver wholesale.
    pub fn set_animation(
        &mut self,
        animation: ArmatureAnimation,
    ) {
        self.animation = animation;
    }

    /// Is a batch responsible for the draw state?
    pub fn is_batched(&self) -> bool {
        self.batched
    }

    /// Set whether a batch is responsible for the draw state.
    pub fn set_batched(
        &mut self,
        batched: bool,
    ) {
        self.batched = batched;
    }

    /// Blend function of the armature.
    pub fn blend_func(&self) -> BlendFunc {
        self.blend
    }

    /// Set blend function of the armature.
    pub fn set_blend_func(
        &mut self,
        blend: BlendFunc,
    ) {
        self.blend = blend;
    }

    fn next_arrival(&mut self) -> u32 {
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        arrival
    }

    fn create_bone_checked(
        &mut self,
        name: &str,
        pending: &mut Vec<String>,
    ) -> Result<BonePointer, Error> {
        if let Some(ptr) = self.bone_dic.get(name) {
            return Ok(ptr.clone());
        }
        if pending.iter().any(|p| p == name) {
            return Err(Error::CyclicBoneData(name.to_string()));
        }
        let data = self.armature_data
            .bone_data(name)
            .cloned()
            .ok_or_else(|| Error::MissingBoneData(name.to_string()))?;

        if !data.parent_name.is_empty() {
            pending.push(name.to_string());
            let parent = self.create_bone_checked(&data.parent_name, pending);
            pending.pop();
            parent?;
        }

        let mut displays = Vec::with_capacity(data.displays.len());
        for display in &data.displays {
            displays.push(self.build_display(name, display)?);
        }

        let mut bone = Bone::new(name);
        bone.set_bone_data(data.clone());
        for display in displays {
            bone.display_manager_mut().add_display(display, -1);
        }
        let ptr = self.add_bone(bone, &data.parent_name);
        self.bones[&ptr].change_display_by_index(-1, false);
        Ok(ptr)
    }

    /// Creates the named bone from the skeleton data, creating its missing
    /// ancestors first. Existing bones are returned as they are.
    pub fn create_bone(
        &mut self,
        name: &str,
    ) -> Result<BonePointer, Error> {
        self.create_bone_checked(name, &mut Vec::new())
    }

    fn build_display(
        &self,
        bone: &str,
        data: &DisplayData,
    ) -> Result<DecorativeDisplay, Error> {
        Ok(match *data {
            DisplayData::Sprite(ref sprite) => DecorativeDisplay {
                display: Display::Sprite(Skin::new(sprite)),
                collider: if sprite.contours.is_empty() {
                    None
                } else {
                    let mut detector = ColliderDetector::new(&sprite.contours);
                    detector.set_body(self.body);
                    if let Some(filter) = self.collider_filter {
                        detector.set_filter(filter);
                    }
                    Some(detector)
                },
            },
            DisplayData::Armature { ref name } => {
                let parent = ParentBone {
                    armature: self.id,
                    bone: bone.to_string(),
                };
                let nested = Armature::builder()
                    .name(name.as_str())
                    .parent_bone(parent)
                    .batched(self.batched)
                    .frame_rate(1.0 / self.animation.frame_interval())
                    .build(&self.repo)?;
                DecorativeDisplay::new(Display::Armature(Box::new(nested)))
            }
        })
    }

    /// Adds a bone under the named parent, or at the top level when the
    /// parent does not resolve.
    ///
    /// # Panics
    ///
    /// Panics if a bone with the same name is already part of the armature.
    pub fn add_bone(
        &mut self,
        mut bone: Bone,
        parent_name: &str,
    ) -> BonePointer {
        assert!(
            !self.bone_dic.contains_key(bone.name()),
            "Bone {} already added to armature {}. It can't be added again",
            bone.name(),
            self.name,
        );
        let name = bone.name().to_string();
        bone.armature = Some(self.id);
        let ptr = self.bones.create(bone);

        match self.bone_dic.get(parent_name).cloned() {
            Some(parent) => self.attach(&parent, &ptr),
            None => self.top_bones.push(ptr.clone()),
        }
        self.bone_dic.insert(name.clone(), ptr.clone());
        self.bone_order.push(name);
        let arrival = self.next_arrival();
        self.children.push(ChildEntry {
            child: Child::Bone(ptr.clone()),
            arrival,
        });
        self.transform_dirty.set(true);
        self.refresh_bounds();
        ptr
    }

    fn attach(
        &mut self,
        parent: &BonePointer,
        child: &BonePointer,
    ) {
        self.bones[parent].children.push(child.clone());
        self.bones[child].parent = Some(parent.downgrade());
    }

    fn detach_from_parent(
        &mut self,
        ptr: &BonePointer,
    ) {
        let parent = self.bones[ptr]
            .parent
            .take()
            .and_then(|weak| weak.upgrade().ok());
        if let Some(parent) = parent {
            self.bones[&parent].children.retain(|c| c != ptr);
        }
    }

    fn descendants(
        &self,
        ptr: &BonePointer,
    ) -> Vec<BonePointer> {
        let mut result = Vec::new();
        let mut stack = self.bones[ptr].children.clone();
        while let Some(next) = stack.pop() {
            stack.extend(self.bones[&next].children.iter().cloned());
            result.push(next);
        }
        result
    }

    /// Removes the named bone. With `recursion` its whole subtree goes
    /// along; otherwise its children become top-level bones.
    ///
    /// # Panics
    ///
    /// Panics if no bone has the name.
    pub fn remove_bone(
        &mut self,
        name: &str,
        recursion: bool,
    ) {
        let ptr = match self.bone_dic.get(name) {
            Some(ptr) => ptr.clone(),
            None => panic!("Bone {} is not part of armature {}", name, self.name),
        };
        self.detach_from_parent(&ptr);

        let mut removed = vec![ptr.clone()];
        if recursion {
            removed.extend(self.descendants(&ptr));
        } else {
            let children = ::std::mem::replace(&mut self.bones[&ptr].children, Vec::new());
            for child in children {
                self.bones[&child].parent = None;
                self.top_bones.push(child);
            }
        }

        for ptr in &removed {
            let bone_name = {
                let bone = &mut self.bones[ptr];
                bone.armature = None;
                bone.parent = None;
                bone.children.clear();
                bone.name().to_string()
            };
            debug!("Removing bone {} from {}", bone_name, self.name);
            self.top_bones.retain(|p| p != ptr);
            self.bone_dic.remove(&bone_name);
            self.bone_order.retain(|n| *n != bone_name);
            self.children.retain(|entry| match entry.child {
                Child::Bone(ref p) => p != ptr,
                Child::Node(_) => true,
            });
        }
        drop(removed);
        drop(ptr);
        self.bones.sync_pending();
        self.transform_dirty.set(true);
        self.refresh_bounds();
    }

    /// Moves the named bone under another parent. A parent name that does
    /// not resolve moves the bone to the top level.
    ///
    /// # Panics
    ///
    /// Panics if no bone has the name, or if the new parent is the bone
    /// itself or one of its descendants.
    pub fn change_bone_parent(
        &mut self,
        name: &str,
        parent_name: &str,
    ) {
        let ptr = match self.bone_dic.get(name) {
            Some(ptr) => ptr.clone(),
            None => panic!("Bone {} is not part of armature {}", name, self.name),
        };
        let parent = self.bone_dic.get(parent_name).cloned();
        if let Some(ref parent) = parent {
            assert!(
                *parent != ptr && !self.descendants(&ptr).contains(parent),
                "Bone {} can't become a child of its own descendant {}",
                name,
                parent_name,
            );
        }

        self.detach_from_parent(&ptr);
        match parent {
            Some(parent) => {
                self.attach(&parent, &ptr);
                self.top_bones.retain(|p| *p != ptr);
            }
            None => {
                if !parent_name.is_empty() {
                    warn!("Parent bone {} not found, {} becomes top-level", parent_name, name);
                }
                if !self.top_bones.contains(&ptr) {
                    self.top_bones.push(ptr);
                }
            }
        }
        self.transform_dirty.set(true);
        self.refresh_bounds();
    }

    /// Looks a bone up by name.
    pub fn bone(
        &self,
        name: &str,
    ) -> Option<&Bone> {
        self.bone_dic.get(name).map(|ptr| &self.bones[ptr])
    }

    /// Looks a bone up by name, mutable.
    pub fn bone_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut Bone> {
        match self.bone_dic.get(name) {
            Some(ptr) => Some(&mut self.bones[ptr]),
            None => None,
        }
    }

    /// Handle of the named bone.
    pub fn bone_pointer(
        &self,
        name: &str,
    ) -> Option<&BonePointer> {
        self.bone_dic.get(name)
    }

    /// Every bone by name.
    pub fn bone_dic(&self) -> &HashMap<String, BonePointer> {
        &self.bone_dic
    }

    /// Bone names in insertion order.
    pub fn bone_names(&self) -> &[String] {
        &self.bone_order
    }

    /// Bones without a parent bone, in insertion order.
    pub fn top_bones(&self) -> Vec<&Bone> {
        self.top_bones.iter().map(|ptr| &self.bones[ptr]).collect()
    }

    /// Is the named bone at the top level?
    pub fn is_top_bone(
        &self,
        name: &str,
    ) -> bool {
        match self.bone_dic.get(name) {
            Some(ptr) => self.top_bones.contains(ptr),
            None => false,
        }
    }

    /// Parent of the named bone.
    pub fn parent_of(
        &self,
        name: &str,
    ) -> Option<&Bone> {
        let parent = self.bone(name)?.parent()?;
        Some(&self.bones[&parent])
    }

    /// Names of the direct children of the named bone.
    pub fn children_of(
        &self,
        name: &str,
    ) -> Vec<&str> {
        match self.bone(name) {
            Some(bone) => bone.children().iter().map(|c| self.bones[c].name()).collect(),
            None => Vec::new(),
        }
    }

    /// Attaches a plain scene node drawn among the bones.
    pub fn add_child(
        &mut self,
        child: Box<dyn SceneNode>,
    ) {
        let arrival = self.next_arrival();
        self.children.push(ChildEntry {
            child: Child::Node(child),
            arrival,
        });
    }

    /// Drops every bone and plain child.
    pub fn remove_all_children(&mut self) {
        for ptr in self.bone_dic.values() {
            let bone = &mut self.bones[ptr];
            bone.armature = None;
            bone.parent = None;
            bone.children.clear();
        }
        self.children.clear();
        self.top_bones.clear();
        self.bone_dic.clear();
        self.bone_order.clear();
        self.next_arrival = 0;
        self.bones.sync_pending();
        self.transform_dirty.set(true);
        self.update_offset_point();
    }

    /// Adds a display to the named bone, replacing the one at `index` if
    /// there is one.
    pub fn add_display(
        &mut self,
        bone: &str,
        data: &DisplayData,
        index: i32,
    ) -> Result<(), Error> {
        let ptr = self.bone_dic
            .get(bone)
            .cloned()
            .ok_or_else(|| Error::UnknownBone(bone.to_string()))?;
        let display = self.build_display(bone, data)?;
        let replaces_current = {
            let bone = &mut self.bones[&ptr];
            bone.display_manager_mut().add_display(display, index);
            index >= 0 && index == bone.display_manager().current_index()
        };
        if replaces_current {
            self.refresh_bounds();
        }
        Ok(())
    }

    /// Switches the named bone to the display at `index`; `-1` hides it.
    pub fn change_display(
        &mut self,
        bone: &str,
        index: i32,
        force: bool,
    ) -> Result<(), Error> {
        let ptr = self.bone_dic
            .get(bone)
            .cloned()
            .ok_or_else(|| Error::UnknownBone(bone.to_string()))?;
        let changed = {
            let bone = &mut self.bones[&ptr];
            if index < -1 || index >= bone.display_manager().len() as i32 {
                return Err(Error::DisplayIndexOutOfRange(bone.name().to_string(), index));
            }
            bone.change_display_by_index(index, force)
        };
        if changed {
            self.refresh_bounds();
        }
        Ok(())
    }

    /// Offset of the skeleton origin inside the content rectangle.
    pub fn offset_point(&self) -> mint::Point2<f32> {
        self.offset_point
    }

    /// Recomputes content size, offset point and anchor from the bounds of
    /// the current bone displays.
    pub fn update_offset_point(&mut self) {
        let rect = self.local_bounding_box();
        self.node.set_content_size([rect.width, rect.height]);
        self.offset_point = [-rect.x, -rect.y].into();
        if rect.width != 0.0 && rect.height != 0.0 {
            self.node.set_anchor_point([self.offset_point.x / rect.width, self.offset_point.y / rect.height]);
        }
        self.node.set_transform_offset(self.offset_point);
    }

    /// Matrix mapping armature coordinates to parent coordinates.
    ///
    /// The matrix is cached until a node setter invalidates it.
    pub fn node_to_parent_transform(&self) -> Matrix {
        let (transform, recomputed) = self.node.cached_transform();
        if recomputed {
            self.transform_dirty.set(true);
        }
        transform
    }

    /// Did the armature transform or the skeleton change since the last
    /// update?
    pub fn is_armature_transform_dirty(&self) -> bool {
        self.transform_dirty.get()
    }

    /// Advances the animation by `dt` seconds and recomputes every bone.
    pub fn update(
        &mut self,
        dt: f32,
    ) {
        let poses = self.animation.update(dt);
        let mut display_changed = false;
        for pose in &poses {
            if let Some(ptr) = self.bone_dic.get(&pose.bone) {
                display_changed |= self.bones[ptr].apply_pose(pose);
            }
        }
        self.update_bones(dt);
        if display_changed {
            self.update_offset_point();
        }
        self.transform_dirty.set(false);
    }

    // World transforms and the offset point after the skeleton or a display
    // selection changed outside of `update`.
    fn refresh_bounds(&mut self) {
        self.update_bones(0.0);
        self.update_offset_point();
    }

    fn update_bones(
        &mut self,
        dt: f32,
    ) {
        let mut stack: Vec<(BonePointer, Option<Matrix>)> =
            self.top_bones.iter().rev().map(|ptr| (ptr.clone(), None)).collect();
        while let Some((ptr, parent_world)) = stack.pop() {
            let bone = &mut self.bones[&ptr];
            bone.update(parent_world.as_ref(), dt);
            let world = bone.world_transform();
            stack.extend(bone.children.iter().rev().map(|c| (c.clone(), Some(world))));
        }
    }

    fn sort_all_children(&mut self) {
        let bones = &self.bones;
        self.children.sort_by_key(|entry| {
            let z_order = match entry.child {
                Child::Bone(ref ptr) => bones[ptr].z_order(),
                Child::Node(ref node) => node.node().local_z_order(),
            };
            (z_order, entry.arrival)
        });
    }

    fn reset_arrival_order(&mut self) {
        for (i, entry) in self.children.iter_mut().enumerate() {
            entry.arrival = i as u32;
        }
        self.next_arrival = self.children.len() as u32;
        self.node.order_of_arrival = 0;
    }

    /// Render traversal entry point.
    pub fn visit(
        &mut self,
        renderer: &mut dyn Renderer,
    ) {
        if !self.node.is_visible() {
            return;
        }
        renderer.push_matrix();
        self.node.grid_before_draw(renderer);
        let transform = self.node_to_parent_transform();
        renderer.multiply_matrix(&transform);
        self.sort_all_children();
        self.draw(renderer);
        self.reset_arrival_order();
        self.node.grid_after_draw(renderer);
        renderer.pop_matrix();
    }

    /// Emits every child in scene-graph order under the current
    /// model-view matrix.
    pub fn draw(
        &mut self,
        renderer: &mut dyn Renderer,
    ) {
        if self.parent_bone.is_none() && !self.batched {
            renderer.setup_draw_state();
        }
        let tint = if self.node.is_cascade_color_enabled() {
            self.node.displayed_color()
        } else {
            color::WHITE
        };
        let opacity = if self.node.is_cascade_opacity_enabled() {
            self.node.displayed_opacity()
        } else {
            255
        };

        let bones = &mut self.bones;
        for entry in &mut self.children {
            match entry.child {
                Child::Bone(ref ptr) => bones[ptr].draw(renderer, tint, opacity),
                Child::Node(ref mut node) => {
                    node.visit(renderer);
                    renderer.setup_draw_state();
                }
            }
        }
    }

    fn local_bounding_box(&self) -> Rect {
        let mut result: Option<Rect> = None;
        for entry in &self.children {
            if let Child::Bone(ref ptr) = entry.child {
                if let Some(rect) = self.bones[ptr].display_manager().bounding_box() {
                    result = Some(match result {
                        Some(acc) => acc.union(&rect),
                        None => rect,
                    });
                }
            }
        }
        result.unwrap_or(Rect::ZERO)
    }

    /// Union of the bone display bounds, in parent coordinates.
    pub fn bounding_box(&self) -> Rect {
        self.local_bounding_box().apply_transform(&self.node_to_parent_transform())
    }

    /// Front-most bone whose display covers the armature-space point.
    pub fn bone_at_point(
        &self,
        x: f32,
        y: f32,
    ) -> Option<&Bone> {
        let bones = &self.bones;
        self.children
            .iter()
            .rev()
            .filter_map(move |entry| match entry.child {
                Child::Bone(ref ptr) => Some(&bones[ptr]),
                Child::Node(_) => None,
            })
            .find(|bone| bone.display_manager().contains_point(x, y))
    }

    /// Draws the collision outlines of the current displays, for debugging.
    pub fn draw_contour(
        &self,
        renderer: &mut dyn Renderer,
    ) {
        let mv = renderer.current_matrix();
        for name in &self.bone_order {
            let bone = &self.bones[&self.bone_dic[name]];
            let detector = match bone.display_manager().current_display() {
                Some(&DecorativeDisplay { collider: Some(ref detector), .. }) => detector,
                _ => continue,
            };
            for body in detector.bodies() {
                let points = body.calculated_vertices()
                    .iter()
                    .map(|v| geometry::transform_point(&mv, *v))
                    .collect();
                renderer.submit(DrawCommand::Polygon {
                    points,
                    closed: true,
                });
            }
        }
    }

    /// Bone of the outer armature displaying this one.
    pub fn parent_bone(&self) -> Option<&ParentBone> {
        self.parent_bone.as_ref()
    }

    /// Links the armature to the bone of an outer armature displaying it.
    pub fn set_parent_bone(
        &mut self,
        parent_bone: Option<ParentBone>,
    ) {
        self.parent_bone = parent_bone;
        let id = self.id;
        for ptr in self.bone_dic.values() {
            self.bones[ptr].armature = Some(id);
        }
    }

    fn for_each_detector<F>(
        &mut self,
        mut f: F,
    ) where
        F: FnMut(&mut ColliderDetector),
    {
        for name in &self.bone_order {
            let ptr = &self.bone_dic[name];
            let manager = self.bones[ptr].display_manager_mut();
            for decorative in manager.decorative_displays_mut() {
                if let Some(ref mut detector) = decorative.collider {
                    f(detector);
                }
            }
        }
    }

    /// Rigid body the collision outlines are attached to.
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Attaches the armature to a rigid body of the physics backend, or
    /// detaches it with `None`. Every collider detector of every bone follows,
    /// as do detectors of displays added later.
    pub fn set_body(
        &mut self,
        body: Option<BodyHandle>,
    ) {
        if self.body == body {
            return;
        }
        self.body = body;
        if let Some(handle) = body {
            self.binder.attach_owner(handle, self.id);
        }
        self.for_each_detector(|detector| detector.set_body(body));
    }

    /// Shapes of the attached body, `None` without a body.
    pub fn shape_list(&self) -> Option<Vec<ShapeHandle>> {
        self.body.map(|body| self.binder.shape_list(body))
    }

    /// Applies a collision filter to every collider detector, including those
    /// of displays added later.
    pub fn set_collider_filter(
        &mut self,
        filter: ColliderFilter,
    ) {
        self.collider_filter = Some(filter);
        self.for_each_detector(|detector| detector.set_filter(filter));
    }
}

impl<'a> ops::Index<&'a BonePointer> for Armature {
    type Output = Bone;
    fn index(
        &self,
        ptr: &'a BonePointer,
    ) -> &Bone {
        &self.bones[ptr]
    }
}

impl<'a> ops::Index<&'a str> for Armature {
    type Output = Bone;
    fn index(
        &self,
        name: &'a str,
    ) -> &Bone {
        match self.bone(name) {
            Some(bone) => bone,
            None => panic!("Bone {} is not part of armature {}", name, self.name),
        }
    }
}

impl SceneNode for Armature {
    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    fn draw(
        &mut self,
        renderer: &mut dyn Renderer,
    ) {
        Armature::draw(self, renderer)
    }

    fn visit(
        &mut self,
        renderer: &mut dyn Renderer,
    ) {
        Armature::visit(self, renderer)
    }

    fn bounding_box(&self) -> Rect {
        Armature::bounding_box(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use data::{BaseData, BoneData};

    fn repo() -> Arc<DataManager> {
        let repo = Arc::new(DataManager::new());
        repo.add(
            ArmatureData::new("chain")
                .with_bone(BoneData::new("c", "b", BaseData::at(1.0, 0.0)))
                .with_bone(BoneData::new("b", "a", BaseData::at(1.0, 0.0)))
                .with_bone(BoneData::new("a", "", BaseData::default())),
            AnimationData::new("chain"),
        );
        repo.add(
            ArmatureData::new("loop")
                .with_bone(BoneData::new("x", "y", BaseData::default()))
                .with_bone(BoneData::new("y", "x", BaseData::default())),
            AnimationData::new("loop"),
        );
        repo
    }

    #[test]
    fn ids_are_unique() {
        let repo = repo();
        let a = Armature::create(&repo).unwrap();
        let b = Armature::create(&repo).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn parents_are_created_first() {
        let armature = Armature::create_named("chain", &repo()).unwrap();
        assert_eq!(armature.bone_names().to_vec(), vec!["a", "b", "c"]);
        assert_eq!(armature.children_of("a"), ["b"]);
        assert_eq!(armature.parent_of("c").map(|b| b.name()), Some("b"));
    }

    #[test]
    fn cyclic_data_is_an_error() {
        match Armature::create_named("loop", &repo()) {
            Err(Error::CyclicBoneData(_)) => (),
            other => panic!("unexpected {:?}", other.map(|a| a.name().to_string())),
        }
    }

    #[test]
    fn builder_carries_settings() {
        let armature = Armature::builder()
            .name("chain")
            .batched(true)
            .frame_rate(30.0)
            .build(&repo())
            .unwrap();
        assert!(armature.is_batched());
        assert!((armature.animation().frame_interval() - 1.0 / 30.0).abs() < 1e-6);
        assert!(armature.node().is_update_scheduled());
        assert!(armature.node().is_cascade_color_enabled());
    }

    #[test]
    #[should_panic]
    fn reparenting_into_descendant_panics() {
        let mut armature = Armature::create_named("chain", &repo()).unwrap();
        armature.change_bone_parent("a", "c");
    }

    #[test]
    fn remove_without_recursion_promotes_children() {
        let mut armature = Armature::create_named("chain", &repo()).unwrap();
        armature.remove_bone("b", false);
        assert!(armature.bone("b").is_none());
        assert!(armature.is_top_bone("c"));
        assert!(armature.parent_of("c").is_none());
        assert!(armature.children_of("a").is_empty());
    }
}
