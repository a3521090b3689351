extern crate armature;
extern crate env_logger;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use armature::data::{ContourData, SpriteDisplayData};
use armature::{AnimationData, Armature, ArmatureData, ArmatureId, BaseData, BlendFunc, BodyHandle,
               Bone, BoneData, ColliderBinder, ColliderFilter, CommandQueue, DataManager,
               DecorativeDisplay, Display, DisplayData, DrawCommand, Error, FrameData, GridEffect,
               Matrix, MovementBoneData, MovementData, ParentBone, Rect, Renderer, SceneNode,
               ShapeHandle, Sprite};

fn init_logger() {
    let _ = env_logger::try_init();
}

fn hero_data() -> (ArmatureData, AnimationData) {
    let armature = ArmatureData::new("hero")
        .with_bone(BoneData::new("root", "", BaseData::default()).with_display(DisplayData::sprite("body", 20.0, 40.0)))
        .with_bone(BoneData::new("arm", "root", BaseData::at(10.0, 0.0)).with_display(DisplayData::sprite("arm", 10.0, 4.0)));
    let walk = MovementData::new("walk", 10)
        .with_bone(MovementBoneData::new("root", vec![FrameData::new(0, BaseData::default())]))
        .with_bone(MovementBoneData::new(
            "arm",
            vec![FrameData::new(0, BaseData::default()), FrameData::new(10, BaseData::at(0.0, 10.0))],
        ));
    (armature, AnimationData::new("hero").with_movement(walk))
}

fn repo() -> Arc<DataManager> {
    init_logger();
    let repo = Arc::new(DataManager::new());
    let (armature, animation) = hero_data();
    repo.add(armature, animation);
    repo
}

fn single_sprite(name: &str, bone: BoneData, repo: &Arc<DataManager>) -> Armature {
    repo.add(ArmatureData::new(name).with_bone(bone), AnimationData::new(name));
    let mut armature = Armature::create_named(name, repo).unwrap();
    let bone = armature.bone_names()[0].clone();
    armature.change_display(&bone, 0, false).unwrap();
    armature
}

fn approx(a: &Matrix, b: &Matrix) -> bool {
    let a: &[f32; 16] = a.as_ref();
    let b: &[f32; 16] = b.as_ref();
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
}

fn quads(queue: &CommandQueue) -> Vec<&str> {
    queue
        .commands()
        .iter()
        .filter_map(|c| match *c {
            DrawCommand::Quad { ref texture, .. } => Some(texture.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn hero_hierarchy() {
    let repo = repo();
    let mut hero = Armature::create_named("hero", &repo).unwrap();
    hero.update(0.0);

    assert!(hero["arm"].parent() == hero.bone_pointer("root").cloned());
    assert_eq!(hero.parent_of("arm").map(|b| b.name()), Some("root"));
    assert!(hero.is_top_bone("root"));
    assert!(!hero.is_top_bone("arm"));
    assert_eq!(hero.top_bones().len(), 1);
    assert_eq!(hero["arm"].armature(), Some(hero.id()));
}

#[test]
fn initial_pose_shows_first_frame() {
    let hero = Armature::create_named("hero", &repo()).unwrap();
    assert_eq!(hero["arm"].display_manager().current_index(), 0);
    // arm sits at the end of root
    let world = hero["arm"].world_transform();
    assert_eq!((world.w.x, world.w.y), (10.0, 0.0));
}

#[test]
fn bone_creation_is_order_independent() {
    init_logger();
    let repo = Arc::new(DataManager::new());
    let bones = vec![
        BoneData::new("root", "", BaseData::default()),
        BoneData::new("spine", "root", BaseData::default()),
        BoneData::new("head", "spine", BaseData::default()),
        BoneData::new("tail", "root", BaseData::default()),
    ];
    let mut forward = ArmatureData::new("forward");
    let mut backward = ArmatureData::new("backward");
    for bone in &bones {
        forward.add_bone_data(bone.clone());
    }
    for bone in bones.iter().rev() {
        backward.add_bone_data(bone.clone());
    }
    repo.add(forward, AnimationData::new("forward"));
    repo.add(backward, AnimationData::new("backward"));

    let topology = |name: &str| {
        let mut armature = Armature::create_named(name, &repo).unwrap();
        // already present bones come back as they are
        let before = armature.bone_pointer("head").cloned();
        assert!(armature.create_bone("head").ok() == before);
        let mut links = armature
            .bone_names()
            .iter()
            .map(|n| (n.clone(), armature.parent_of(n).map(|p| p.name().to_string())))
            .collect::<Vec<_>>();
        links.sort();
        links
    };
    assert_eq!(topology("forward"), topology("backward"));
}

#[test]
fn added_bone_is_found() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    let ptr = hero.add_bone(Bone::new("hand"), "arm");
    assert!(hero.bone_pointer("hand") == Some(&ptr));
    assert_eq!(hero.children_of("arm"), vec!["hand"]);

    hero.add_bone(Bone::new("flag"), "no such bone");
    assert!(hero.is_top_bone("flag"));
}

#[test]
#[should_panic]
fn duplicate_bone_is_rejected() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    hero.add_bone(Bone::new("arm"), "root");
}

#[test]
fn recursive_removal_drops_subtree() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    hero.add_bone(Bone::new("hand"), "arm");
    hero.remove_bone("arm", true);

    assert!(hero.bone("arm").is_none());
    assert!(hero.bone("hand").is_none());
    assert!(hero.bone_dic().keys().all(|k| k == "root"));
    assert!(hero.top_bones().iter().all(|b| b.name() == "root"));
    assert!(hero.children_of("root").is_empty());
}

#[test]
fn reparenting() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    hero.add_bone(Bone::new("hand"), "");
    hero.change_bone_parent("hand", "arm");
    assert!(!hero.is_top_bone("hand"));
    assert_eq!(hero.parent_of("hand").map(|b| b.name()), Some("arm"));

    hero.change_bone_parent("hand", "nowhere");
    assert!(hero.is_top_bone("hand"));
    assert!(hero.parent_of("hand").is_none());
    assert!(hero.children_of("arm").is_empty());
}

#[test]
fn transform_cache_coherence() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    let first = hero.node_to_parent_transform();
    let second = hero.node_to_parent_transform();
    assert_eq!(first, second);

    hero.set_position([3.0, 4.0]);
    let moved = hero.node_to_parent_transform();
    assert!((moved.w.x - first.w.x - 3.0).abs() < 1e-4);
    assert!((moved.w.y - first.w.y - 4.0).abs() < 1e-4);

    hero.set_rotation(30.0);
    assert!(!approx(&moved, &hero.node_to_parent_transform()));
    assert!(hero.is_armature_transform_dirty());
    hero.update(0.0);
    assert!(!hero.is_armature_transform_dirty());
}

#[test]
fn skew_path_is_continuous() {
    let repo = repo();
    let transform = |skew: f32| {
        let mut hero = Armature::create_named("hero", &repo).unwrap();
        hero.set_position([12.0, -8.0]);
        hero.set_rotation_x(30.0);
        hero.set_rotation_y(45.0);
        hero.set_scale_xy(2.0, 0.5);
        hero.set_skew_y(skew);
        hero.node_to_parent_transform()
    };
    assert!(approx(&transform(0.0), &transform(1e-5)));
}

#[test]
fn bounding_box_follows_transform() {
    init_logger();
    let repo = Arc::new(DataManager::new());
    let bone = BoneData::new("solo", "", BaseData::default()).with_display(DisplayData::sprite("solo", 4.0, 2.0));
    let mut armature = single_sprite("solo", bone, &repo);

    let local = Rect::new(-2.0, -1.0, 4.0, 2.0);
    assert_eq!(armature.bounding_box(), local);
    let offset = armature.offset_point();
    assert_eq!((offset.x, offset.y), (2.0, 1.0));

    armature.set_position([10.0, 5.0]);
    assert_eq!(armature.bounding_box(), Rect::new(8.0, 4.0, 4.0, 2.0));
}

#[test]
fn bounding_box_of_negative_extents() {
    init_logger();
    let repo = Arc::new(DataManager::new());
    repo.add(
        ArmatureData::new("low")
            .with_bone(BoneData::new("a", "", BaseData::at(0.0, -10.0)).with_display(DisplayData::sprite("a", 2.0, 2.0)))
            .with_bone(BoneData::new("b", "", BaseData::at(4.0, -20.0)).with_display(DisplayData::sprite("b", 2.0, 2.0))),
        AnimationData::new("low"),
    );
    let mut armature = Armature::create_named("low", &repo).unwrap();
    armature.change_display("a", 0, false).unwrap();
    armature.change_display("b", 0, false).unwrap();

    let rect = armature.bounding_box();
    let expected = Rect::new(-1.0, -21.0, 6.0, 12.0);
    for &(a, b) in &[
        (rect.min_x(), expected.min_x()),
        (rect.min_y(), expected.min_y()),
        (rect.max_x(), expected.max_x()),
        (rect.max_y(), expected.max_y()),
    ] {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }
}

#[test]
fn topology_changes_refresh_the_content_size() {
    init_logger();
    let repo = Arc::new(DataManager::new());
    repo.add(
        ArmatureData::new("two")
            .with_bone(BoneData::new("a", "", BaseData::default()).with_display(DisplayData::sprite("a", 2.0, 2.0)))
            .with_bone(BoneData::new("b", "", BaseData::at(10.0, 0.0)).with_display(DisplayData::sprite("b", 2.0, 2.0)))
            .with_bone(BoneData::new("lift", "", BaseData::at(0.0, 10.0))),
        AnimationData::new("two"),
    );
    let mut armature = Armature::create_named("two", &repo).unwrap();
    armature.change_display("a", 0, false).unwrap();
    armature.change_display("b", 0, false).unwrap();
    assert_eq!((armature.content_size().x, armature.content_size().y), (12.0, 2.0));

    armature.change_bone_parent("b", "lift");
    assert_eq!((armature.content_size().x, armature.content_size().y), (12.0, 12.0));

    armature.remove_bone("b", true);
    let size = armature.content_size();
    let bounds = armature.bounding_box();
    assert_eq!((size.x, size.y), (bounds.width, bounds.height));
    assert_eq!((size.x, size.y), (2.0, 2.0));
    let offset = armature.offset_point();
    assert_eq!((offset.x, offset.y), (1.0, 1.0));
}

#[test]
fn top_most_bone_is_hit() {
    init_logger();
    let repo = Arc::new(DataManager::new());
    repo.add(
        ArmatureData::new("stack")
            .with_bone(BoneData::new("back", "", BaseData::default()).with_display(DisplayData::sprite("back", 10.0, 10.0)))
            .with_bone(BoneData::new("front", "", BaseData::default()).with_display(DisplayData::sprite("front", 10.0, 10.0))),
        AnimationData::new("stack"),
    );
    let mut armature = Armature::create_named("stack", &repo).unwrap();
    armature.change_display("back", 0, false).unwrap();
    armature.change_display("front", 0, false).unwrap();

    assert_eq!(armature.bone_at_point(0.0, 0.0).map(|b| b.name()), Some("front"));
    assert!(armature.bone_at_point(50.0, 50.0).is_none());

    armature.change_display("front", -1, false).unwrap();
    assert_eq!(armature.bone_at_point(0.0, 0.0).map(|b| b.name()), Some("back"));
}

#[test]
fn children_draw_by_z_order_then_arrival() {
    init_logger();
    let repo = Arc::new(DataManager::new());
    repo.add(
        ArmatureData::new("layers")
            .with_bone(
                BoneData::new("top", "", BaseData::default())
                    .with_z_order(1)
                    .with_display(DisplayData::sprite("top", 1.0, 1.0)),
            )
            .with_bone(BoneData::new("first", "", BaseData::default()).with_display(DisplayData::sprite("first", 1.0, 1.0)))
            .with_bone(BoneData::new("second", "", BaseData::default()).with_display(DisplayData::sprite("second", 1.0, 1.0))),
        AnimationData::new("layers"),
    );
    let mut armature = Armature::create_named("layers", &repo).unwrap();
    for name in &["top", "first", "second"] {
        armature.change_display(name, 0, false).unwrap();
    }

    let mut queue = CommandQueue::new();
    armature.visit(&mut queue);
    assert_eq!(quads(&queue), vec!["first", "second", "top"]);
    assert_eq!(queue.draw_state_setups(), 1);
    assert_eq!(queue.depth(), 0);

    // the hit test follows the drawing order
    assert_eq!(armature.bone_at_point(0.0, 0.0).map(|b| b.name()), Some("top"));

    let mut queue = CommandQueue::new();
    armature.set_visible(false);
    armature.visit(&mut queue);
    assert!(queue.commands().is_empty());
}

#[test]
fn batched_armature_leaves_draw_state_alone() {
    let repo = repo();
    let mut hero = Armature::builder().name("hero").batched(true).build(&repo).unwrap();
    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    assert_eq!(queue.draw_state_setups(), 0);
    assert_eq!(quads(&queue), vec!["body", "arm"]);
}

#[test]
fn plain_children_are_visited() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    let mut hud = Sprite::new("hud", 2.0, 2.0);
    hud.set_local_z_order(-1);
    hero.add_child(Box::new(hud));

    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    assert_eq!(quads(&queue), vec!["hud", "body", "arm"]);
    assert_eq!(queue.draw_state_setups(), 2);
}

#[test]
fn anonymous_armature() {
    let repo = repo();
    let armature = Armature::create(&repo).unwrap();
    assert_eq!(armature.name(), "new_armature");
    assert!(armature.bone_names().is_empty());
    assert!(repo.armature_data("new_armature").is_some());
    assert!(repo.animation_data("new_armature").is_some());
    assert_eq!(armature.bounding_box(), Rect::ZERO);
}

#[test]
fn missing_data_is_reported() {
    let repo = repo();
    match Armature::create_named("ghost", &repo) {
        Err(Error::MissingAnimationData(ref name)) => assert_eq!(name, "ghost"),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("ghost armature built"),
    }

    repo.add_animation_data("half", AnimationData::new("half"));
    match Armature::create_named("half", &repo) {
        Err(Error::MissingArmatureData(_)) => (),
        _ => panic!("expected missing armature data"),
    }

    repo.add(
        ArmatureData::new("orphan").with_bone(BoneData::new("child", "lost", BaseData::default())),
        AnimationData::new("orphan"),
    );
    match Armature::create_named("orphan", &repo) {
        Err(Error::MissingBoneData(ref name)) => assert_eq!(name, "lost"),
        _ => panic!("expected missing bone data"),
    }
}

#[test]
fn animation_moves_bones() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    hero.animation_mut().play("walk").unwrap();
    hero.update(5.0 / 60.0);

    let world = hero["arm"].world_transform();
    assert!((world.w.x - 10.0).abs() < 1e-3);
    assert!((world.w.y - 5.0).abs() < 1e-3);
    assert!(hero.animation_mut().play("fly").is_err());
}

#[test]
fn display_changes_are_checked() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    match hero.change_display("arm", 3, false) {
        Err(Error::DisplayIndexOutOfRange(ref bone, 3)) => assert_eq!(bone, "arm"),
        _ => panic!("expected an out of range error"),
    }
    assert!(hero.change_display("leg", 0, false).is_err());

    hero.add_display("arm", &DisplayData::sprite("claw", 2.0, 2.0), -1).unwrap();
    hero.change_display("arm", 1, false).unwrap();
    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    assert_eq!(quads(&queue), vec!["body", "claw"]);
}

#[test]
fn bone_blend_reaches_the_skin() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    hero.bone_mut("arm").unwrap().set_blend_func(BlendFunc::ADDITIVE);
    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    let blends = queue
        .commands()
        .iter()
        .filter_map(|c| match *c {
            DrawCommand::Quad { ref texture, blend, .. } if texture == "arm" => Some(blend),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(blends, vec![BlendFunc::ADDITIVE]);
    assert!(!hero["arm"].is_blend_dirty());
}

#[test]
fn nested_armature_is_drawn_at_its_bone() {
    let repo = repo();
    repo.add(
        ArmatureData::new("weapon").with_bone(
            BoneData::new("blade", "", BaseData::default()).with_display(DisplayData::sprite("blade", 2.0, 2.0)),
        ),
        AnimationData::new("weapon"),
    );
    repo.add(
        ArmatureData::new("knight")
            .with_bone(BoneData::new("hand", "", BaseData::at(100.0, 0.0)).with_display(DisplayData::armature("weapon"))),
        AnimationData::new("knight"),
    );
    let mut knight = Armature::create_named("knight", &repo).unwrap();
    knight.change_display("hand", 0, false).unwrap();
    if let Some(&mut armature::DecorativeDisplay { display: armature::Display::Armature(ref mut weapon), .. }) =
        knight.bone_mut("hand").unwrap().display_manager_mut().current_display_mut()
    {
        weapon.change_display("blade", 0, false).unwrap();
        assert_eq!(weapon.parent_bone().map(|p| p.bone.as_str()), Some("hand"));
    }
    knight.update(0.0);
    knight.update_offset_point();

    let mut queue = CommandQueue::new();
    knight.visit(&mut queue);
    assert_eq!(quads(&queue), vec!["blade"]);
    assert_eq!(queue.draw_state_setups(), 1);
    assert_eq!(queue.depth(), 0);
    match queue.commands()[0] {
        DrawCommand::Quad { ref vertices, .. } => {
            let xs = vertices.iter().map(|v| v.x).fold(0.0, |a, x| a + x) / 4.0;
            assert!((xs - 100.0).abs() < 1e-3);
        }
        _ => unreachable!(),
    }
}

#[derive(Clone, Default)]
struct RecordingBinder {
    owners: Rc<RefCell<Vec<(BodyHandle, ArmatureId)>>>,
}

impl ColliderBinder for RecordingBinder {
    fn attach_owner(
        &mut self,
        body: BodyHandle,
        owner: ArmatureId,
    ) {
        self.owners.borrow_mut().push((body, owner));
    }

    fn shape_list(
        &self,
        body: BodyHandle,
    ) -> Vec<ShapeHandle> {
        vec![ShapeHandle(body.0 * 10)]
    }
}

fn shield() -> DisplayData {
    let square = ContourData {
        vertices: vec![[0.0, 0.0].into(), [1.0, 0.0].into(), [1.0, 1.0].into(), [0.0, 1.0].into()],
    };
    DisplayData::Sprite(SpriteDisplayData {
        contours: vec![square],
        ..match DisplayData::sprite("shield", 2.0, 2.0) {
            DisplayData::Sprite(data) => data,
            _ => unreachable!(),
        }
    })
}

fn guard_repo() -> Arc<DataManager> {
    init_logger();
    let repo = Arc::new(DataManager::new());
    repo.add(
        ArmatureData::new("guard")
            .with_bone(BoneData::new("left", "", BaseData::at(5.0, 0.0)).with_display(shield()))
            .with_bone(BoneData::new("right", "", BaseData::default()).with_display(shield())),
        AnimationData::new("guard"),
    );
    repo
}

fn detector_bodies(armature: &Armature) -> Vec<Option<BodyHandle>> {
    armature
        .bone_names()
        .iter()
        .flat_map(move |name| armature[name.as_str()].display_manager().decorative_displays())
        .filter_map(|d| d.collider.as_ref().map(|c| c.body()))
        .collect()
}

#[test]
fn body_reaches_every_collider() {
    let repo = guard_repo();
    let binder = RecordingBinder::default();
    let mut guard = Armature::builder()
        .name("guard")
        .collider_binder(binder.clone())
        .build(&repo)
        .unwrap();
    assert!(guard.shape_list().is_none());

    guard.set_body(Some(BodyHandle(7)));
    guard.set_body(Some(BodyHandle(7)));
    guard.set_collider_filter(ColliderFilter { group_index: -1, ..ColliderFilter::default() });
    assert_eq!(*binder.owners.borrow(), vec![(BodyHandle(7), guard.id())]);
    assert_eq!(guard.shape_list(), Some(vec![ShapeHandle(70)]));
    for name in &["left", "right"] {
        let detector = guard.bone(name).unwrap().display_manager().decorative_displays()[0]
            .collider
            .as_ref()
            .unwrap();
        assert_eq!(detector.body(), Some(BodyHandle(7)));
        assert_eq!(detector.filter().group_index, -1);
    }

    guard.change_display("left", 0, false).unwrap();
    let mut queue = CommandQueue::new();
    guard.draw_contour(&mut queue);
    match queue.commands() {
        [DrawCommand::Polygon { points, closed: true }] => assert_eq!((points[0].x, points[0].y), (5.0, 0.0)),
        other => panic!("unexpected commands {:?}", other),
    }
}

#[test]
fn body_detaches_and_reaches_new_displays() {
    let repo = guard_repo();
    let binder = RecordingBinder::default();
    let mut guard = Armature::builder()
        .name("guard")
        .collider_binder(binder.clone())
        .build(&repo)
        .unwrap();
    guard.set_body(Some(BodyHandle(3)));
    guard.set_collider_filter(ColliderFilter { mask_bits: 0x0F, ..ColliderFilter::default() });

    guard.add_display("right", &shield(), -1).unwrap();
    {
        let added = guard["right"].display_manager().decorative_displays()[1]
            .collider
            .as_ref()
            .unwrap();
        assert_eq!(added.body(), Some(BodyHandle(3)));
        assert_eq!(added.filter().mask_bits, 0x0F);
    }
    assert_eq!(detector_bodies(&guard), vec![Some(BodyHandle(3)); 3]);

    guard.set_body(None);
    assert!(guard.body().is_none());
    assert!(guard.shape_list().is_none());
    assert_eq!(detector_bodies(&guard), vec![None; 3]);
    assert_eq!(binder.owners.borrow().len(), 1);

    guard.set_body(Some(BodyHandle(4)));
    assert_eq!(*binder.owners.borrow().last().unwrap(), (BodyHandle(4), guard.id()));
}

#[test]
fn nested_visit_through_scene_node() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    let node: &mut dyn SceneNode = &mut hero;
    let mut queue = CommandQueue::new();
    node.visit(&mut queue);
    assert_eq!(quads(&queue).len(), 2);
}

struct Markers;

impl GridEffect for Markers {
    fn is_active(&self) -> bool {
        true
    }

    fn before_draw(&mut self, renderer: &mut dyn Renderer) {
        renderer.submit(DrawCommand::Polygon { points: Vec::new(), closed: false });
    }

    fn after_draw(&mut self, renderer: &mut dyn Renderer) {
        renderer.submit(DrawCommand::Polygon { points: Vec::new(), closed: true });
    }
}

#[test]
fn grid_wraps_the_drawing() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    hero.set_grid(Some(Box::new(Markers)));
    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    let order = queue
        .commands()
        .iter()
        .map(|c| match *c {
            DrawCommand::Polygon { closed: false, .. } => "before",
            DrawCommand::Polygon { closed: true, .. } => "after",
            DrawCommand::Quad { ref texture, .. } => texture.as_str(),
        })
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["before", "body", "arm", "after"]);
}

#[test]
fn node_display_is_placed_at_its_bone() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    let flag = Sprite::new("flag", 2.0, 2.0);
    hero.bone_mut("arm")
        .unwrap()
        .display_manager_mut()
        .add_display(DecorativeDisplay::new(Display::Node(Box::new(flag))), -1);
    hero.change_display("arm", 1, false).unwrap();
    hero.update(0.0);

    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    assert_eq!(quads(&queue), vec!["body", "flag"]);
    // the armature sets the state up, the node display restores it
    assert_eq!(queue.draw_state_setups(), 2);
    match queue.commands()[1] {
        DrawCommand::Quad { ref vertices, .. } => {
            let cx = vertices.iter().map(|v| v.x).sum::<f32>() / 4.0;
            let cy = vertices.iter().map(|v| v.y).sum::<f32>() / 4.0;
            assert!((cx - 10.0).abs() < 1e-3 && cy.abs() < 1e-3, "flag at ({}, {})", cx, cy);
        }
        ref other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn parent_bone_link_claims_the_bones() {
    let repo = repo();
    let outer = Armature::create(&repo).unwrap();
    let mut hero = Armature::create_named("hero", &repo).unwrap();
    let link = ParentBone {
        armature: outer.id(),
        bone: "hand".to_string(),
    };
    hero.set_parent_bone(Some(link.clone()));
    assert_eq!(hero.parent_bone(), Some(&link));
    for name in hero.bone_names() {
        assert_eq!(hero[name.as_str()].armature(), Some(hero.id()));
    }

    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    assert_eq!(queue.draw_state_setups(), 0);

    hero.set_parent_bone(None);
    let mut queue = CommandQueue::new();
    hero.visit(&mut queue);
    assert_eq!(queue.draw_state_setups(), 1);
}

#[test]
fn ignored_anchor_places_the_content_corner() {
    let mut hero = Armature::create_named("hero", &repo()).unwrap();
    hero.set_position([30.0, 40.0]);
    let anchored = hero.bounding_box();
    assert!((anchored.min_x() - 20.0).abs() < 1e-3);
    assert!((anchored.min_y() - 20.0).abs() < 1e-3);

    hero.set_ignore_anchor_point_for_position(true);
    let cornered = hero.bounding_box();
    assert!((cornered.min_x() - 30.0).abs() < 1e-3);
    assert!((cornered.min_y() - 40.0).abs() < 1e-3);
    assert!((cornered.width - anchored.width).abs() < 1e-3);
}
