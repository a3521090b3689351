use mint;

use bone;
use color::{self, Color};
use data::SpriteDisplayData;
use geometry::{self, Rect};
use node::{Node, SceneNode};
use render::{BlendFunc, DrawCommand, Renderer};
use Matrix;

/// Two-dimensional bitmap carried by a bone.
///
/// A skin has no node of its own: its placement is the world transform of
/// the bone combined with the skin pose of the display data, refreshed by
/// [`update_transform`](#method.update_transform) once per bone update.
#[derive(Clone, Debug, PartialEq)]
pub struct Skin {
    texture: String,
    size: mint::Vector2<f32>,
    anchor: mint::Point2<f32>,
    skin_transform: Matrix,
    transform: Matrix,
    vertices: [mint::Point2<f32>; 4],
    blend: BlendFunc,
    color: Color,
}

impl Skin {
    /// Create a skin from display data.
    pub fn new(data: &SpriteDisplayData) -> Self {
        let skin_transform = bone::pose_to_matrix(&data.skin);
        let mut skin = Skin {
            texture: data.texture.clone(),
            size: data.size,
            anchor: data.anchor,
            skin_transform,
            transform: skin_transform,
            vertices: Rect::ZERO.corners(),
            blend: BlendFunc::default(),
            color: color::WHITE,
        };
        skin.vertices = skin.local_rect().corners();
        skin.update_transform(&Matrix::from_scale(1.0));
        skin
    }

    /// Texture name as known to the backend.
    pub fn texture(&self) -> &str {
        &self.texture
    }

    /// Quad in skin coordinates, centered on the anchor.
    pub fn local_rect(&self) -> Rect {
        Rect::new(
            -self.size.x * self.anchor.x,
            -self.size.y * self.anchor.y,
            self.size.x,
            self.size.y,
        )
    }

    /// Blend function used when drawing.
    pub fn blend_func(&self) -> BlendFunc {
        self.blend
    }

    /// Set blend function used when drawing.
    pub fn set_blend_func(
        &mut self,
        blend: BlendFunc,
    ) {
        self.blend = blend;
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
    }

    /// Refreshes the render-ready quad from the bone's armature-space
    /// transform.
    pub fn update_transform(
        &mut self,
        bone_world: &Matrix,
    ) {
        self.transform = bone_world * self.skin_transform;
        let corners = self.local_rect().corners();
        for (v, c) in self.vertices.iter_mut().zip(corners.iter()) {
            *v = geometry::transform_point(&self.transform, *c);
        }
    }

    /// Skin-to-armature transform as of the last update.
    pub fn node_to_armature_transform(&self) -> Matrix {
        self.transform
    }

    /// Quad corners in armature coordinates.
    pub fn vertices(&self) -> &[mint::Point2<f32>; 4] {
        &self.vertices
    }

    /// Bounds of the quad in armature coordinates.
    pub fn bounding_box(&self) -> Rect {
        Rect::from_points(self.vertices.iter().cloned()).unwrap_or(Rect::ZERO)
    }

    /// Submits the quad under the current model-view matrix.
    pub fn draw(
        &self,
        renderer: &mut dyn Renderer,
        tint: Color,
        opacity: u8,
    ) {
        let mv = renderer.current_matrix();
        let mut vertices = self.vertices;
        for v in vertices.iter_mut() {
            *v = geometry::transform_point(&mv, *v);
        }
        renderer.submit(DrawCommand::Quad {
            texture: self.texture.clone(),
            vertices,
            color: color::modulate(tint, self.color),
            opacity,
            blend: self.blend,
        });
    }
}

/// Two-dimensional bitmap placed directly into the scene graph.
#[derive(Debug)]
pub struct Sprite {
    node: Node,
    texture: String,
    blend: BlendFunc,
}
node_wrapper!(Sprite);

impl Sprite {
    /// Create a sprite covering `width` by `height`, anchored at its center.
    pub fn new<S: Into<String>>(
        texture: S,
        width: f32,
        height: f32,
    ) -> Self {
        let mut node = Node::new();
        node.set_content_size([width, height]);
        node.set_anchor_point([0.5, 0.5]);
        Sprite {
            node,
            texture: texture.into(),
            blend: BlendFunc::default(),
        }
    }

    /// Texture name as known to the backend.
    pub fn texture(&self) -> &str {
        &self.texture
    }

    /// Set blend function used when drawing.
    pub fn set_blend_func(
        &mut self,
        blend: BlendFunc,
    ) {
        self.blend = blend;
    }
}

impl SceneNode for Sprite {
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
        let size = self.node.content_size();
        let mv = renderer.current_matrix();
        let corners = Rect::new(0.0, 0.0, size.x, size.y).corners();
        let mut vertices = corners;
        for (v, c) in vertices.iter_mut().zip(corners.iter()) {
            *v = geometry::transform_point(&mv, *c);
        }
        renderer.submit(DrawCommand::Quad {
            texture: self.texture.clone(),
            vertices,
            color: self.node.displayed_color(),
            opacity: self.node.displayed_opacity(),
            blend: self.blend,
        });
    }
}
