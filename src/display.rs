//! What a bone shows.
//!
//! Each bone owns a [`DisplayManager`] holding any number of
//! [`DecorativeDisplay`]s, of which at most one is current. Animation frames
//! switch between them by index.
//!
//! [`DisplayManager`]: struct.DisplayManager.html
//! [`DecorativeDisplay`]: struct.DecorativeDisplay.html

use cgmath::SquareMatrix;

use armature::Armature;
use collider::ColliderDetector;
use geometry::{self, Rect};
use node::SceneNode;
use sprite::Skin;

/// Kind of a display, see [`Display`](enum.Display.html).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DisplayKind {
    /// Textured quad.
    Sprite,
    /// Nested armature.
    Armature,
    /// Any other scene node.
    Node,
}

/// Renderable content carried by a bone.
pub enum Display {
    /// Textured quad positioned by the bone.
    Sprite(Skin),
    /// Nested armature, driven by its own animation.
    Armature(Box<Armature>),
    /// Arbitrary scene node placed at the bone.
    Node(Box<dyn SceneNode>),
}

impl Display {
    /// Kind of the display.
    pub fn kind(&self) -> DisplayKind {
        match *self {
            Display::Sprite(_) => DisplayKind::Sprite,
            Display::Armature(_) => DisplayKind::Armature,
            Display::Node(_) => DisplayKind::Node,
        }
    }

    /// Bounds in armature coordinates, as of the last bone update.
    pub fn bounding_box(&self) -> Rect {
        match *self {
            Display::Sprite(ref skin) => skin.bounding_box(),
            Display::Armature(ref armature) => armature.bounding_box(),
            Display::Node(ref node) => node.bounding_box(),
        }
    }

    /// Does the display cover the armature-space point?
    ///
    /// Skins test against their actual quad, other displays against their
    /// bounding box.
    pub fn contains_point(
        &self,
        x: f32,
        y: f32,
    ) -> bool {
        match *self {
            Display::Sprite(ref skin) => match skin.node_to_armature_transform().invert() {
                Some(inverse) => {
                    let local = geometry::transform_point(&inverse, [x, y].into());
                    skin.local_rect().contains_point(local.x, local.y)
                }
                None => false,
            },
            _ => self.bounding_box().contains_point(x, y),
        }
    }
}

/// A display together with its optional collision outlines.
pub struct DecorativeDisplay {
    /// Renderable content.
    pub display: Display,
    /// Collision outlines following the display.
    pub collider: Option<ColliderDetector>,
}

impl DecorativeDisplay {
    /// Wraps a display without collision outlines.
    pub fn new(display: Display) -> Self {
        DecorativeDisplay {
            display,
            collider: None,
        }
    }
}

/// Displays of one bone and the index of the current one.
pub struct DisplayManager {
    displays: Vec<DecorativeDisplay>,
    current: i32,
    visible: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        DisplayManager::new()
    }
}

impl DisplayManager {
    /// Create a visible manager with no displays.
    pub fn new() -> Self {
        DisplayManager {
            displays: Vec::new(),
            current: -1,
            visible: true,
        }
    }

    /// Number of displays.
    pub fn len(&self) -> usize {
        self.displays.len()
    }

    /// Are there no displays at all?
    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    /// Stores `display` at `index`, replacing the display there. Indices
    /// outside the list append.
    ///
    /// Replacing the current display keeps it current.
    pub fn add_display(
        &mut self,
        display: DecorativeDisplay,
        index: i32,
    ) {
        if index >= 0 && (index as usize) < self.displays.len() {
            self.displays[index as usize] = display;
        } else {
            self.displays.push(display);
        }
    }

    /// Removes the display at `index`. Removing the current display hides
    /// the bone.
    pub fn remove_display(
        &mut self,
        index: i32,
    ) -> Option<DecorativeDisplay> {
        if index < 0 || index as usize >= self.displays.len() {
            return None;
        }
        if index == self.current {
            self.current = -1;
        } else if index < self.current {
            self.current -= 1;
        }
        Some(self.displays.remove(index as usize))
    }

    /// Index of the current display, `-1` if none.
    pub fn current_index(&self) -> i32 {
        self.current
    }

    /// Makes the display at `index` current; `-1` hides the bone. Unless
    /// `force` is set, selecting the current index again is a no-op.
    ///
    /// Returns `true` if the selection changed. Indices past the end hide
    /// the bone.
    pub fn change_display_by_index(
        &mut self,
        index: i32,
        force: bool,
    ) -> bool {
        let index = if index >= 0 && index as usize >= self.displays.len() {
            warn!("Display index {} out of range, hiding the bone", index);
            -1
        } else {
            index.max(-1)
        };
        if index == self.current && !force {
            return false;
        }
        self.current = index;
        true
    }

    /// The current display.
    pub fn current_display(&self) -> Option<&DecorativeDisplay> {
        if self.current < 0 {
            return None;
        }
        self.displays.get(self.current as usize)
    }

    /// The current display, mutable.
    pub fn current_display_mut(&mut self) -> Option<&mut DecorativeDisplay> {
        if self.current < 0 {
            return None;
        }
        self.displays.get_mut(self.current as usize)
    }

    /// Kind of the current display.
    pub fn display_kind(&self) -> Option<DisplayKind> {
        self.current_display().map(|d| d.display.kind())
    }

    /// Every display, current or not.
    pub fn decorative_displays(&self) -> &[DecorativeDisplay] {
        &self.displays
    }

    /// Every display, mutable.
    pub fn decorative_displays_mut(&mut self) -> &mut [DecorativeDisplay] {
        &mut self.displays
    }

    /// Is the bone drawn at all?
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the bone without changing the selection.
    pub fn set_visible(
        &mut self,
        visible: bool,
    ) {
        self.visible = visible;
    }

    /// Bounds of the current display in armature coordinates, `None` when
    /// nothing is shown.
    pub fn bounding_box(&self) -> Option<Rect> {
        if !self.visible {
            return None;
        }
        self.current_display().map(|d| d.display.bounding_box())
    }

    /// Does the current display cover the armature-space point?
    pub fn contains_point(
        &self,
        x: f32,
        y: f32,
    ) -> bool {
        self.visible && self.current_display().map_or(false, |d| d.display.contains_point(x, y))
    }
}
