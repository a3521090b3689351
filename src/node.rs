use cgmath::{Matrix4, Vector3};
use mint;

use std::cell::Cell;
use std::fmt;

use color::{self, Color};
use geometry::Rect;
use render::{GridEffect, Renderer};
use Matrix;

bitflags! {
    struct Dirty: u8 {
        const TRANSFORM = 0x1;
        const ADDITIONAL_TRANSFORM = 0x2;
    }
}

/// State shared by every scene-graph node: placement, visibility, ordering
/// and color.
///
/// Rotations and skews are in degrees. The node-to-parent matrix is computed
/// lazily and cached until one of the setters invalidates it.
pub struct Node {
    position: mint::Point2<f32>,
    rotation_x: f32,
    rotation_y: f32,
    scale_x: f32,
    scale_y: f32,
    skew_x: f32,
    skew_y: f32,
    anchor_point: mint::Point2<f32>,
    anchor_point_in_points: mint::Point2<f32>,
    content_size: mint::Vector2<f32>,
    ignore_anchor_point_for_position: bool,
    visible: bool,
    local_z_order: i32,
    pub(crate) order_of_arrival: u32,
    color: Color,
    displayed_color: Color,
    opacity: u8,
    displayed_opacity: u8,
    cascade_color_enabled: bool,
    cascade_opacity_enabled: bool,
    update_scheduled: bool,
    additional_transform: Option<Matrix>,
    offset: mint::Point2<f32>,
    dirty: Cell<Dirty>,
    transform: Cell<Matrix>,
    pub(crate) grid: Option<Box<dyn GridEffect>>,
}

impl Default for Node {
    fn default() -> Self {
        Node::new()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("position", &self.position)
            .field("rotation", &(self.rotation_x, self.rotation_y))
            .field("scale", &(self.scale_x, self.scale_y))
            .field("skew", &(self.skew_x, self.skew_y))
            .field("anchor_point", &self.anchor_point)
            .field("content_size", &self.content_size)
            .field("visible", &self.visible)
            .field("local_z_order", &self.local_z_order)
            .finish()
    }
}

impl Node {
    /// Create a visible node at the origin with identity transform.
    pub fn new() -> Self {
        Node {
            position: [0.0, 0.0].into(),
            rotation_x: 0.0,
            rotation_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            anchor_point: [0.0, 0.0].into(),
            anchor_point_in_points: [0.0, 0.0].into(),
            content_size: [0.0, 0.0].into(),
            ignore_anchor_point_for_position: false,
            visible: true,
            local_z_order: 0,
            order_of_arrival: 0,
            color: color::WHITE,
            displayed_color: color::WHITE,
            opacity: 255,
            displayed_opacity: 255,
            cascade_color_enabled: false,
            cascade_opacity_enabled: false,
            update_scheduled: false,
            additional_transform: None,
            offset: [0.0, 0.0].into(),
            dirty: Cell::new(Dirty::TRANSFORM),
            transform: Cell::new(Matrix4::from_scale(1.0)),
            grid: None,
        }
    }

    pub(crate) fn invalidate_transform(&mut self) {
        self.dirty.set(self.dirty.get() | Dirty::TRANSFORM);
    }

    /// Extra translation expressed in content coordinates that rotates and
    /// scales together with the node.
    pub(crate) fn set_transform_offset(
        &mut self,
        offset: mint::Point2<f32>,
    ) {
        self.offset = offset;
        self.invalidate_transform();
    }

    /// Position in parent space.
    pub fn position(&self) -> mint::Point2<f32> {
        self.position
    }

    /// Set position in parent space.
    pub fn set_position<P>(
        &mut self,
        pos: P,
    ) where
        P: Into<mint::Point2<f32>>,
    {
        self.position = pos.into();
        self.invalidate_transform();
    }

    /// Rotation around the X axis, in degrees.
    pub fn rotation_x(&self) -> f32 {
        self.rotation_x
    }

    /// Rotation around the Y axis, in degrees.
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    /// Set a plain rotation, in degrees clockwise.
    pub fn set_rotation(
        &mut self,
        degrees: f32,
    ) {
        self.rotation_x = degrees;
        self.rotation_y = degrees;
        self.invalidate_transform();
    }

    /// Set the rotation of the X axis alone, which skews the node when it
    /// differs from the Y rotation.
    pub fn set_rotation_x(
        &mut self,
        degrees: f32,
    ) {
        self.rotation_x = degrees;
        self.invalidate_transform();
    }

    /// Set the rotation of the Y axis alone.
    pub fn set_rotation_y(
        &mut self,
        degrees: f32,
    ) {
        self.rotation_y = degrees;
        self.invalidate_transform();
    }

    /// Scale factors along X and Y.
    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Set uniform scale.
    pub fn set_scale(
        &mut self,
        scale: f32,
    ) {
        self.set_scale_xy(scale, scale);
    }

    /// Set per-axis scale.
    pub fn set_scale_xy(
        &mut self,
        scale_x: f32,
        scale_y: f32,
    ) {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self.invalidate_transform();
    }

    /// Skew angles along X and Y, in degrees.
    pub fn skew(&self) -> (f32, f32) {
        (self.skew_x, self.skew_y)
    }

    /// Set the skew along X, in degrees.
    pub fn set_skew_x(
        &mut self,
        degrees: f32,
    ) {
        self.skew_x = degrees;
        self.invalidate_transform();
    }

    /// Set the skew along Y, in degrees.
    pub fn set_skew_y(
        &mut self,
        degrees: f32,
    ) {
        self.skew_y = degrees;
        self.invalidate_transform();
    }

    /// Normalized anchor point, `(0, 0)` is bottom-left, `(1, 1)` top-right.
    pub fn anchor_point(&self) -> mint::Point2<f32> {
        self.anchor_point
    }

    /// Anchor point in content coordinates.
    pub fn anchor_point_in_points(&self) -> mint::Point2<f32> {
        self.anchor_point_in_points
    }

    /// Set normalized anchor point.
    pub fn set_anchor_point<P>(
        &mut self,
        anchor: P,
    ) where
        P: Into<mint::Point2<f32>>,
    {
        self.anchor_point = anchor.into();
        self.update_anchor_in_points();
    }

    /// Untransformed size of the node's content.
    pub fn content_size(&self) -> mint::Vector2<f32> {
        self.content_size
    }

    /// Set untransformed size of the node's content.
    pub fn set_content_size<V>(
        &mut self,
        size: V,
    ) where
        V: Into<mint::Vector2<f32>>,
    {
        self.content_size = size.into();
        self.update_anchor_in_points();
    }

    fn update_anchor_in_points(&mut self) {
        self.anchor_point_in_points = [
            self.content_size.x * self.anchor_point.x,
            self.content_size.y * self.anchor_point.y,
        ].into();
        self.invalidate_transform();
    }

    /// When set, the position refers to the bottom-left corner instead of the
    /// anchor point.
    pub fn set_ignore_anchor_point_for_position(
        &mut self,
        ignore: bool,
    ) {
        self.ignore_anchor_point_for_position = ignore;
        self.invalidate_transform();
    }

    /// Is the node drawn at all?
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Invisible nodes and their children are skipped by `visit`.
    pub fn set_visible(
        &mut self,
        visible: bool,
    ) {
        self.visible = visible;
    }

    /// Drawing order among siblings, lower first.
    pub fn local_z_order(&self) -> i32 {
        self.local_z_order
    }

    /// Set drawing order among siblings.
    pub fn set_local_z_order(
        &mut self,
        z: i32,
    ) {
        self.local_z_order = z;
    }

    /// Insertion counter breaking ties between equal z-orders.
    pub fn order_of_arrival(&self) -> u32 {
        self.order_of_arrival
    }

    /// Own tint.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Set own tint.
    pub fn set_color(
        &mut self,
        color: Color,
    ) {
        self.color = color;
        self.displayed_color = color;
    }

    /// Tint after cascading the parent color.
    pub fn displayed_color(&self) -> Color {
        self.displayed_color
    }

    /// Own opacity.
    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Set own opacity.
    pub fn set_opacity(
        &mut self,
        opacity: u8,
    ) {
        self.opacity = opacity;
        self.displayed_opacity = opacity;
    }

    /// Opacity after cascading the parent opacity.
    pub fn displayed_opacity(&self) -> u8 {
        self.displayed_opacity
    }

    /// Children multiply their color by this node's displayed color.
    pub fn set_cascade_color_enabled(
        &mut self,
        enabled: bool,
    ) {
        self.cascade_color_enabled = enabled;
    }

    /// See [`set_cascade_color_enabled`](#method.set_cascade_color_enabled).
    pub fn is_cascade_color_enabled(&self) -> bool {
        self.cascade_color_enabled
    }

    /// Children multiply their opacity by this node's displayed opacity.
    pub fn set_cascade_opacity_enabled(
        &mut self,
        enabled: bool,
    ) {
        self.cascade_opacity_enabled = enabled;
    }

    /// See [`set_cascade_opacity_enabled`](#method.set_cascade_opacity_enabled).
    pub fn is_cascade_opacity_enabled(&self) -> bool {
        self.cascade_opacity_enabled
    }

    /// Recomputes the displayed color from the parent's displayed color.
    pub fn update_displayed_color(
        &mut self,
        parent: Color,
    ) {
        self.displayed_color = color::modulate(parent, self.color);
    }

    /// Recomputes the displayed opacity from the parent's displayed opacity.
    pub fn update_displayed_opacity(
        &mut self,
        parent: u8,
    ) {
        self.displayed_opacity = color::modulate_opacity(parent, self.opacity);
    }

    /// Registers the node for per-frame updates by the scene driver.
    pub fn schedule_update(&mut self) {
        self.update_scheduled = true;
    }

    /// Removes the node from per-frame updates.
    pub fn unschedule_update(&mut self) {
        self.update_scheduled = false;
    }

    /// Should the scene driver call `update` on this node every frame?
    pub fn is_update_scheduled(&self) -> bool {
        self.update_scheduled
    }

    /// Imposes an external matrix concatenated after the local transform,
    /// e.g. the world transform of the bone carrying this node.
    pub fn set_additional_transform(
        &mut self,
        transform: Option<Matrix>,
    ) {
        self.additional_transform = transform;
        self.dirty.set(self.dirty.get() | Dirty::TRANSFORM | Dirty::ADDITIONAL_TRANSFORM);
    }

    /// Is an additional transform waiting to be folded into the cache?
    pub fn is_additional_transform_pending(&self) -> bool {
        self.dirty.get().contains(Dirty::ADDITIONAL_TRANSFORM)
    }

    /// Is the cached node-to-parent matrix stale?
    pub fn is_transform_dirty(&self) -> bool {
        !self.dirty.get().is_empty()
    }

    /// Attach a grid effect wrapped around this node's drawing.
    pub fn set_grid(
        &mut self,
        grid: Option<Box<dyn GridEffect>>,
    ) {
        self.grid = grid;
    }

    pub(crate) fn grid_before_draw(
        &mut self,
        renderer: &mut dyn Renderer,
    ) {
        if let Some(ref mut grid) = self.grid {
            if grid.is_active() {
                grid.before_draw(renderer);
            }
        }
    }

    pub(crate) fn grid_after_draw(
        &mut self,
        renderer: &mut dyn Renderer,
    ) {
        if let Some(ref mut grid) = self.grid {
            if grid.is_active() {
                grid.after_draw(renderer);
            }
        }
    }

    /// Matrix mapping node coordinates to parent coordinates.
    pub fn node_to_parent_transform(&self) -> Matrix {
        self.cached_transform().0
    }

    /// Returns the cached matrix, recomputing it first if it is stale. The
    /// flag tells whether a recomputation took place.
    pub(crate) fn cached_transform(&self) -> (Matrix, bool) {
        if self.dirty.get().is_empty() {
            return (self.transform.get(), false);
        }
        let transform = self.compute_transform();
        self.transform.set(transform);
        self.dirty.set(Dirty::empty());
        (transform, true)
    }

    fn compute_transform(&self) -> Matrix {
        let offset = self.offset;
        let anchor = self.anchor_point_in_points;
        let anchor_is_zero = anchor.x == 0.0 && anchor.y == 0.0;

        let mut x = self.position.x;
        let mut y = self.position.y;
        if self.ignore_anchor_point_for_position {
            x += anchor.x;
            y += anchor.y;
        }

        // Separate X and Y rotations: equal angles are a plain rotation,
        // different angles skew the basis.
        let (mut cx, mut sx, mut cy, mut sy) = (1.0, 0.0, 1.0, 0.0);
        if self.rotation_x != 0.0 || self.rotation_y != 0.0 {
            let radians_x = -self.rotation_x.to_radians();
            let radians_y = -self.rotation_y.to_radians();
            cx = radians_x.cos();
            sx = radians_x.sin();
            cy = radians_y.cos();
            sy = radians_y.sin();
        }

        x += cy * offset.x * self.scale_x + -sx * offset.y * self.scale_y;
        y += sy * offset.x * self.scale_x + cx * offset.y * self.scale_y;

        let needs_skew = self.skew_x != 0.0 || self.skew_y != 0.0;
        if !needs_skew && !anchor_is_zero {
            x += cy * -anchor.x * self.scale_x + -sx * -anchor.y * self.scale_y;
            y += sy * -anchor.x * self.scale_x + cx * -anchor.y * self.scale_y;
        }

        let mut transform = Matrix4::new(
            cy * self.scale_x, sy * self.scale_x, 0.0, 0.0,
            -sx * self.scale_y, cx * self.scale_y, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            x, y, 0.0, 1.0,
        );

        if needs_skew {
            let skew = Matrix4::new(
                1.0, self.skew_y.to_radians().tan(), 0.0, 0.0,
                self.skew_x.to_radians().tan(), 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            );
            transform = transform * skew;
            if !anchor_is_zero {
                transform = transform * Matrix4::from_translation(Vector3::new(-anchor.x, -anchor.y, 0.0));
            }
        }

        if let Some(additional) = self.additional_transform {
            transform = additional * transform;
        }

        transform
    }
}

/// Anything that can be placed into the scene graph and visited by a
/// [`Renderer`](../render/trait.Renderer.html).
pub trait SceneNode {
    /// Shared node state.
    fn node(&self) -> &Node;

    /// Shared node state, mutable.
    fn node_mut(&mut self) -> &mut Node;

    /// Emits the node's own content. The model-view matrix is already set up.
    fn draw(
        &mut self,
        _renderer: &mut dyn Renderer,
    ) {
    }

    /// Full render traversal: transform, grid, draw.
    fn visit(
        &mut self,
        renderer: &mut dyn Renderer,
    ) {
        if !self.node().is_visible() {
            return;
        }
        renderer.push_matrix();
        self.node_mut().grid_before_draw(renderer);
        let transform = self.node().node_to_parent_transform();
        renderer.multiply_matrix(&transform);
        self.draw(renderer);
        self.node_mut().grid_after_draw(renderer);
        renderer.pop_matrix();
    }

    /// Content rectangle mapped to parent space.
    fn bounding_box(&self) -> Rect {
        let size = self.node().content_size();
        Rect::new(0.0, 0.0, size.x, size.y).apply_transform(&self.node().node_to_parent_transform())
    }
}

impl SceneNode for Node {
    fn node(&self) -> &Node {
        self
    }

    fn node_mut(&mut self) -> &mut Node {
        self
    }
}
