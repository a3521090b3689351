//! Keyframe playback.
//!
//! An [`ArmatureAnimation`] is owned by its [`Armature`] and plays one
//! [`MovementData`] at a time. Every call to [`Armature::update`] advances the
//! playhead and applies the sampled [`BonePose`]s onto the bones.
//!
//! Time is measured in frames of the authoring tool. The playhead advances by
//! `dt / frame_interval * speed_scale * movement.scale` frames per update,
//! where `frame_interval` defaults to 1/60 of a second.
//!
//! Completed loops and movements, as well as keyframes carrying an event
//! name, are reported as [`MovementEvent`]s and collected until
//! [`take_events`] is called.
//!
//! [`ArmatureAnimation`]: struct.ArmatureAnimation.html
//! [`Armature`]: ../armature/struct.Armature.html
//! [`Armature::update`]: ../armature/struct.Armature.html#method.update
//! [`MovementData`]: ../data/struct.MovementData.html
//! [`BonePose`]: struct.BonePose.html
//! [`MovementEvent`]: enum.MovementEvent.html
//! [`take_events`]: struct.ArmatureAnimation.html#method.take_events

use std::collections::HashMap;
use std::f32::consts::PI;
use std::mem;
use std::sync::Arc;

use armature::Error;
use data::{AnimationData, BaseData, FrameData, MovementData};
use render::BlendFunc;

/// Default length of one frame, in seconds.
pub const DEFAULT_FRAME_INTERVAL: f32 = 1.0 / 60.0;

/// Describes the interpolation behaviour between keyframes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TweenEasing {
    /// Immediate change between keyframe values.
    Discrete,

    /// Linear interpolation between keyframe values.
    Linear,

    /// Quadratic, starting slowly.
    QuadIn,

    /// Quadratic, ending slowly.
    QuadOut,

    /// Quadratic, slow at both ends.
    QuadInOut,

    /// Half a cosine period, slow at both ends.
    SineInOut,
}

impl TweenEasing {
    /// Maps linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(
        self,
        t: f32,
    ) -> f32 {
        match self {
            TweenEasing::Discrete => 0.0,
            TweenEasing::Linear => t,
            TweenEasing::QuadIn => t * t,
            TweenEasing::QuadOut => -t * (t - 2.0),
            TweenEasing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -2.0 * t * t + 4.0 * t - 1.0
                }
            }
            TweenEasing::SineInOut => -0.5 * ((PI * t).cos() - 1.0),
        }
    }
}

/// Describes the looping behaviour of a movement.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LoopMode {
    /// Play the movement exactly once and hold the last frame.
    Once,

    /// Play the movement, repeating from the start.
    Repeat {
        /// The maximum number of repetitions.
        ///
        /// When set to `None`, the loop will repeat indefinitely.
        limit: Option<u32>,
    },
}

/// Playback notifications.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MovementEvent {
    /// A movement started playing.
    Start {
        /// Movement name.
        movement: String,
    },
    /// A non-looping movement reached its end.
    Complete {
        /// Movement name.
        movement: String,
    },
    /// A looping movement wrapped around.
    LoopComplete {
        /// Movement name.
        movement: String,
    },
    /// Playback entered a keyframe carrying an event name.
    Frame {
        /// Movement name.
        movement: String,
        /// Bone the keyframe belongs to.
        bone: String,
        /// Event name.
        event: String,
    },
}

/// Sampled pose of a single bone.
#[derive(Clone, Debug, PartialEq)]
pub struct BonePose {
    /// Bone name.
    pub bone: String,
    /// Pose offset from the bind pose.
    pub pose: BaseData,
    /// Display to show, `-1` hides the bone.
    pub display_index: i32,
    /// Drawing order offset.
    pub z_order: i32,
    /// Blend function for the bone's displays.
    pub blend: BlendFunc,
}

impl BonePose {
    /// Pose of the keyframe itself.
    pub fn from_frame<S: Into<String>>(
        bone: S,
        frame: &FrameData,
    ) -> Self {
        BonePose {
            bone: bone.into(),
            pose: frame.pose,
            display_index: frame.display_index,
            z_order: frame.z_order,
            blend: frame.blend,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Stopped,
    Playing,
    Paused,
    Complete,
}

/// Plays the movements of one armature.
#[derive(Debug)]
pub struct ArmatureAnimation {
    data: Arc<AnimationData>,
    movement: Option<String>,
    current_frame: f32,
    frame_interval: f32,
    speed_scale: f32,
    loop_mode: LoopMode,
    state: State,
    last_keyframes: HashMap<String, usize>,
    events: Vec<MovementEvent>,
}

impl ArmatureAnimation {
    /// Create a stopped animation over `data`.
    pub fn new(data: Arc<AnimationData>) -> Self {
        ArmatureAnimation {
            data,
            movement: None,
            current_frame: 0.0,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            speed_scale: 1.0,
            loop_mode: LoopMode::Repeat { limit: None },
            state: State::Stopped,
            last_keyframes: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Movements this animation plays.
    pub fn animation_data(&self) -> &Arc<AnimationData> {
        &self.data
    }

    /// Replaces the movements and stops playback.
    pub fn set_animation_data(
        &mut self,
        data: Arc<AnimationData>,
    ) {
        self.data = data;
        self.stop();
        self.movement = None;
    }

    /// Length of one frame in seconds.
    pub fn frame_interval(&self) -> f32 {
        self.frame_interval
    }

    /// Set length of one frame in seconds.
    pub fn set_frame_interval(
        &mut self,
        interval: f32,
    ) {
        self.frame_interval = interval;
    }

    /// Playback speed multiplier.
    pub fn speed_scale(&self) -> f32 {
        self.speed_scale
    }

    /// Set playback speed multiplier.
    pub fn set_speed_scale(
        &mut self,
        scale: f32,
    ) {
        self.speed_scale = scale;
    }

    /// Number of movements in the animation data.
    pub fn movement_count(&self) -> usize {
        self.data.movement_count()
    }

    /// Name of the movement being played, if any.
    pub fn current_movement(&self) -> Option<&str> {
        self.movement.as_ref().map(|s| s.as_str())
    }

    /// Playhead position in frames.
    pub fn current_frame(&self) -> f32 {
        self.current_frame
    }

    /// Is the playhead advancing?
    pub fn is_playing(&self) -> bool {
        self.state == State::Playing
    }

    /// Is playback paused?
    pub fn is_paused(&self) -> bool {
        self.state == State::Paused
    }

    /// Did a non-looping movement reach its end?
    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// Plays the named movement with its authored looping behaviour.
    pub fn play(
        &mut self,
        name: &str,
    ) -> Result<(), Error> {
        let loop_mode = match self.data.movement(name) {
            Some(movement) if movement.looped => LoopMode::Repeat { limit: None },
            Some(_) => LoopMode::Once,
            None => {
                warn!("Movement {} not found in {}", name, self.data.name);
                return Err(Error::UnknownMovement(name.to_string()));
            }
        };
        self.play_with(name, loop_mode)
    }

    /// Plays the named movement with an explicit looping behaviour.
    pub fn play_with(
        &mut self,
        name: &str,
        loop_mode: LoopMode,
    ) -> Result<(), Error> {
        if self.data.movement(name).is_none() {
            warn!("Movement {} not found in {}", name, self.data.name);
            return Err(Error::UnknownMovement(name.to_string()));
        }
        debug!("Playing movement {} of {}", name, self.data.name);
        self.movement = Some(name.to_string());
        self.loop_mode = loop_mode;
        self.current_frame = 0.0;
        self.state = State::Playing;
        self.last_keyframes.clear();
        self.events.push(MovementEvent::Start { movement: name.to_string() });
        Ok(())
    }

    /// Plays the movement at position `index` of `movement_names`.
    pub fn play_by_index(
        &mut self,
        index: usize,
    ) -> Result<(), Error> {
        let name = match self.data.movement_names.get(index) {
            Some(name) => name.clone(),
            None => return Err(Error::UnknownMovement(format!("#{}", index))),
        };
        self.play(&name)
    }

    /// Moves the playhead of the current movement and keeps playing.
    pub fn goto_and_play(
        &mut self,
        frame: u32,
    ) {
        if self.movement.is_some() {
            self.current_frame = frame as f32;
            self.state = State::Playing;
        }
    }

    /// Moves the playhead of the current movement and pauses.
    pub fn goto_and_pause(
        &mut self,
        frame: u32,
    ) {
        if self.movement.is_some() {
            self.current_frame = frame as f32;
            self.state = State::Paused;
        }
    }

    /// Freezes the playhead.
    pub fn pause(&mut self) {
        if self.state == State::Playing {
            self.state = State::Paused;
        }
    }

    /// Resumes a paused playhead.
    pub fn resume(&mut self) {
        if self.state == State::Paused {
            self.state = State::Playing;
        }
    }

    /// Stops playback. Bones keep their last pose.
    pub fn stop(&mut self) {
        self.state = State::Stopped;
        self.current_frame = 0.0;
    }

    /// Takes the notifications collected since the last call.
    pub fn take_events(&mut self) -> Vec<MovementEvent> {
        mem::replace(&mut self.events, Vec::new())
    }

    /// First keyframe of `bone` in the first registered movement, used to
    /// give freshly built bones their initial pose.
    pub fn first_frame(
        &self,
        bone: &str,
    ) -> Option<&FrameData> {
        let name = self.data.movement_names.first()?;
        let movement = self.data.movement(name)?;
        movement.movement_bone_data(bone)?.frame_data(0)
    }

    /// Advances the playhead by `dt` seconds and samples every animated bone.
    ///
    /// Returns no poses unless a movement is playing or paused, so bones keep
    /// whatever pose they had.
    pub fn update(
        &mut self,
        dt: f32,
    ) -> Vec<BonePose> {
        let data = self.data.clone();
        let movement = match self.movement.as_ref().and_then(|name| data.movement(name)) {
            Some(movement) => movement,
            None => return Vec::new(),
        };
        match self.state {
            State::Playing => self.advance(movement, dt),
            State::Paused => (),
            State::Stopped | State::Complete => return Vec::new(),
        }
        self.sample(movement)
    }

    fn advance(
        &mut self,
        movement: &MovementData,
        dt: f32,
    ) {
        let duration = movement.duration as f32;
        if duration <= 0.0 {
            self.current_frame = 0.0;
            if self.loop_mode == LoopMode::Once {
                self.finish(movement);
            }
            return;
        }

        self.current_frame += dt / self.frame_interval * self.speed_scale * movement.scale;
        // a long step may cover several loops, each one is reported
        while self.current_frame >= duration {
            match self.loop_mode {
                LoopMode::Once | LoopMode::Repeat { limit: Some(0) } => {
                    self.current_frame = duration;
                    self.finish(movement);
                    return;
                }
                LoopMode::Repeat { limit } => {
                    self.current_frame -= duration;
                    self.loop_mode = LoopMode::Repeat { limit: limit.map(|n| n - 1) };
                    self.last_keyframes.clear();
                    self.events.push(MovementEvent::LoopComplete { movement: movement.name.clone() });
                }
            }
        }
    }

    fn finish(
        &mut self,
        movement: &MovementData,
    ) {
        self.state = State::Complete;
        self.events.push(MovementEvent::Complete { movement: movement.name.clone() });
    }

    fn sample(
        &mut self,
        movement: &MovementData,
    ) -> Vec<BonePose> {
        let frame = self.current_frame;
        let mut poses = Vec::new();
        for track in movement.movement_bones() {
            let index = match track.frames.iter().rposition(|f| f.frame_id as f32 <= frame) {
                Some(i) => i,
                None => match track.frames.first() {
                    Some(_) => 0,
                    None => continue,
                },
            };
            let from = &track.frames[index];
            let mut pose = BonePose::from_frame(track.name.as_str(), from);
            if let Some(to) = track.frames.get(index + 1) {
                let span = to.frame_id.saturating_sub(from.frame_id) as f32;
                if span > 0.0 && from.easing != TweenEasing::Discrete {
                    let t = ((frame - from.frame_id as f32) / span).max(0.0).min(1.0);
                    pose.pose = from.pose.lerp(&to.pose, from.easing.apply(t));
                }
            }

            if self.last_keyframes.insert(track.name.clone(), index) != Some(index) {
                if let Some(ref event) = from.event {
                    self.events.push(MovementEvent::Frame {
                        movement: movement.name.clone(),
                        bone: track.name.clone(),
                        event: event.clone(),
                    });
                }
            }
            poses.push(pose);
        }
        poses
    }
}
