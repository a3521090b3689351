#![warn(missing_docs)]
//! Skeletal animation for 2D scene graphs.
//!
//! An [`Armature`] is a scene node that owns a hierarchy of rigid [`Bone`]s.
//! Every bone may carry a display (a textured [`Skin`], a nested armature,
//! or any other [`SceneNode`]) and is driven by keyframed animation data
//! described by [`AnimationData`].
//!
//! Skeleton and animation descriptions are shared between armature instances
//! through an explicitly injected [`DataManager`]:
//!
//! ```rust
//! # extern crate armature;
//! use std::sync::Arc;
//! use armature::{Armature, DataManager, CommandQueue};
//!
//! let repo = Arc::new(DataManager::new());
//! let mut hero = Armature::create(&repo).unwrap();
//! let mut queue = CommandQueue::new();
//!
//! hero.update(1.0 / 60.0);
//! hero.visit(&mut queue);
//! ```
//!
//! [`Armature`]: armature/struct.Armature.html
//! [`Bone`]: bone/struct.Bone.html
//! [`Skin`]: sprite/struct.Skin.html
//! [`SceneNode`]: node/trait.SceneNode.html
//! [`AnimationData`]: data/struct.AnimationData.html
//! [`DataManager`]: manager/struct.DataManager.html

#[macro_use]
extern crate bitflags;
extern crate cgmath;
extern crate froggy;
#[macro_use]
extern crate log;
extern crate mint;
#[macro_use]
extern crate quick_error;

#[macro_use]
mod macros;

pub mod animation;
pub mod armature;
pub mod bone;
pub mod collider;
pub mod color;
pub mod data;
pub mod display;
pub mod geometry;
pub mod manager;
pub mod node;
pub mod render;
pub mod sprite;

#[doc(inline)]
pub use animation::{ArmatureAnimation, LoopMode, MovementEvent, TweenEasing};
#[doc(inline)]
pub use armature::{Armature, ArmatureId, Builder, Error, ParentBone, DEFAULT_NAME};
#[doc(inline)]
pub use bone::{Bone, BonePointer};
#[doc(inline)]
pub use collider::{BodyHandle, ColliderBinder, ColliderDetector, ColliderFilter, NoPhysics, ShapeHandle};
#[doc(inline)]
pub use color::Color;
#[doc(inline)]
pub use data::{AnimationData, ArmatureData, BaseData, BoneData, DisplayData, FrameData,
               MovementBoneData, MovementData};
#[doc(inline)]
pub use display::{DecorativeDisplay, Display, DisplayKind, DisplayManager};
#[doc(inline)]
pub use geometry::Rect;
#[doc(inline)]
pub use manager::DataManager;
#[doc(inline)]
pub use node::{Node, SceneNode};
#[doc(inline)]
pub use render::{BlendFunc, CommandQueue, DrawCommand, GridEffect, Renderer};
#[doc(inline)]
pub use sprite::{Skin, Sprite};

/// Column-major 4x4 matrix used for every node and bone transform.
pub type Matrix = cgmath::Matrix4<f32>;
