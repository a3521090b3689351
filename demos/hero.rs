extern crate armature;
extern crate env_logger;
#[macro_use]
extern crate log;

use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;

use armature::{AnimationData, Armature, ArmatureData, BaseData, BoneData, CommandQueue, DataManager,
               DisplayData, DrawCommand, FrameData, MovementBoneData, MovementData, MovementEvent,
               TweenEasing};

fn register_hero(repo: &DataManager) {
    let skeleton = ArmatureData::new("hero")
        .with_bone(BoneData::new("body", "", BaseData::default()).with_display(DisplayData::sprite("body.png", 40.0, 80.0)))
        .with_bone(
            BoneData::new("arm", "body", BaseData::at(20.0, 30.0))
                .with_z_order(1)
                .with_display(DisplayData::sprite("arm.png", 36.0, 10.0)),
        )
        .with_bone(BoneData::new("hand", "arm", BaseData::at(36.0, 0.0)).with_display(DisplayData::sprite("hand.png", 12.0, 12.0)));

    let mut swing_start = FrameData::new(0, BaseData::default());
    swing_start.easing = TweenEasing::SineInOut;
    let mut swing_mid = FrameData::new(15, BaseData::default().rotated(FRAC_PI_4));
    swing_mid.easing = TweenEasing::SineInOut;
    swing_mid.event = Some("whoosh".to_string());
    let swing_end = FrameData::new(30, BaseData::default());

    let idle = MovementData::new("idle", 30)
        .with_bone(MovementBoneData::new("body", vec![FrameData::new(0, BaseData::default())]))
        .with_bone(MovementBoneData::new("arm", vec![swing_start, swing_mid, swing_end]))
        .with_bone(MovementBoneData::new("hand", vec![FrameData::new(0, BaseData::default())]));

    repo.add(skeleton, AnimationData::new("hero").with_movement(idle));
}

fn main() {
    env_logger::init();

    let repo = Arc::new(DataManager::new());
    register_hero(&repo);

    let mut hero = Armature::builder()
        .name("hero")
        .frame_rate(30.0)
        .build(&repo)
        .expect("hero data is registered");
    hero.set_position([160.0, 120.0]);
    hero.animation_mut().play("idle").expect("idle movement exists");

    let mut queue = CommandQueue::new();
    for frame in 0 .. 60 {
        hero.update(1.0 / 60.0);
        hero.visit(&mut queue);

        for event in hero.animation_mut().take_events() {
            match event {
                MovementEvent::Frame { bone, event, .. } => info!("frame {}: {} fired {}", frame, bone, event),
                other => info!("frame {}: {:?}", frame, other),
            }
        }
        for command in queue.drain() {
            if let DrawCommand::Quad { texture, vertices, .. } = command {
                debug!("{} at ({:.1}, {:.1})", texture, vertices[0].x, vertices[0].y);
            }
        }
    }

    let bounds = hero.bounding_box();
    println!(
        "hero covers {:.1}x{:.1} at ({:.1}, {:.1})",
        bounds.width, bounds.height, bounds.x, bounds.y
    );
    if let Some(bone) = hero.bone_at_point(0.0, 0.0) {
        println!("bone under the skeleton origin: {}", bone.name());
    }
}
