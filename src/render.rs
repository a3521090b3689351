//! Bridge between the scene graph and a draw command queue.
//!
//! Nodes never talk to a GPU directly. During [`Armature::visit`] they use
//! a [`Renderer`]: a matrix stack plus a sink for [`DrawCommand`]s. The
//! crate ships [`CommandQueue`], a renderer that simply records everything,
//! which is enough to drive a real backend or to inspect a frame in tests.
//!
//! [`Armature::visit`]: ../armature/struct.Armature.html#method.visit
//! [`Renderer`]: trait.Renderer.html
//! [`DrawCommand`]: enum.DrawCommand.html
//! [`CommandQueue`]: struct.CommandQueue.html

use cgmath::SquareMatrix;
use mint;

use color::Color;
use Matrix;

/// Source or destination factor of a blend equation.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend function applied when a display is drawn on top of the frame.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BlendFunc {
    /// Source factor.
    pub src: BlendFactor,
    /// Destination factor.
    pub dst: BlendFactor,
}

impl BlendFunc {
    /// Blending disabled.
    pub const DISABLE: BlendFunc = BlendFunc { src: BlendFactor::One, dst: BlendFactor::Zero };
    /// For textures with premultiplied alpha.
    pub const ALPHA_PREMULTIPLIED: BlendFunc = BlendFunc {
        src: BlendFactor::One,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
    /// For textures with straight alpha.
    pub const ALPHA_NON_PREMULTIPLIED: BlendFunc = BlendFunc {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
    /// Additive blending.
    pub const ADDITIVE: BlendFunc = BlendFunc { src: BlendFactor::SrcAlpha, dst: BlendFactor::One };
}

impl Default for BlendFunc {
    fn default() -> Self {
        BlendFunc::ALPHA_PREMULTIPLIED
    }
}

/// A single unit of work for the backend.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Textured quad, vertices already mapped to world space.
    Quad {
        /// Texture name as known to the backend.
        texture: String,
        /// Corners in counter-clockwise order.
        vertices: [mint::Point2<f32>; 4],
        /// Tint.
        color: Color,
        /// Opacity in `[0, 255]`.
        opacity: u8,
        /// Blend function to draw with.
        blend: BlendFunc,
    },
    /// Debug outline, vertices already mapped to world space.
    Polygon {
        /// Outline vertices.
        points: Vec<mint::Point2<f32>>,
        /// Connect the last point back to the first one.
        closed: bool,
    },
}

/// Matrix stack and command sink used while visiting the scene graph.
pub trait Renderer {
    /// Saves the current model-view matrix.
    fn push_matrix(&mut self);

    /// Restores the last saved model-view matrix.
    fn pop_matrix(&mut self);

    /// Post-multiplies the current model-view matrix.
    fn multiply_matrix(&mut self, matrix: &Matrix);

    /// The current model-view matrix.
    fn current_matrix(&self) -> Matrix;

    /// Re-establishes the baseline draw state (shader, blending, ...).
    fn setup_draw_state(&mut self);

    /// Queues a draw command.
    fn submit(&mut self, command: DrawCommand);
}

/// Full screen effect wrapped around a node's drawing, like a ripple grid.
pub trait GridEffect {
    /// Inactive effects are skipped entirely.
    fn is_active(&self) -> bool;

    /// Called before the node draws anything.
    fn before_draw(&mut self, renderer: &mut dyn Renderer);

    /// Called after the node and its children have been drawn.
    fn after_draw(&mut self, renderer: &mut dyn Renderer);
}

/// Renderer that records every command in submission order.
#[derive(Clone, Debug)]
pub struct CommandQueue {
    stack: Vec<Matrix>,
    current: Matrix,
    commands: Vec<DrawCommand>,
    draw_state_setups: usize,
}

impl CommandQueue {
    /// Create an empty queue with the identity model-view matrix.
    pub fn new() -> Self {
        CommandQueue {
            stack: Vec::new(),
            current: Matrix::identity(),
            commands: Vec::new(),
            draw_state_setups: 0,
        }
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Takes the recorded commands, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<DrawCommand> {
        self.draw_state_setups = 0;
        self.commands.drain(..).collect()
    }

    /// Number of times the baseline draw state has been set up.
    pub fn draw_state_setups(&self) -> usize {
        self.draw_state_setups
    }

    /// Number of saved matrices, zero once every push has been popped.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        CommandQueue::new()
    }
}

impl Renderer for CommandQueue {
    fn push_matrix(&mut self) {
        self.stack.push(self.current);
    }

    fn pop_matrix(&mut self) {
        match self.stack.pop() {
            Some(m) => self.current = m,
            None => error!("Matrix stack underflow"),
        }
    }

    fn multiply_matrix(&mut self, matrix: &Matrix) {
        self.current = self.current * matrix;
    }

    fn current_matrix(&self) -> Matrix {
        self.current
    }

    fn setup_draw_state(&mut self) {
        self.draw_state_setups += 1;
    }

    fn submit(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}
