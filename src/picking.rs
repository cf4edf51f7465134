use crate::camera::TableCamera;
use crate::config::TabletopConfig;
use crate::controls::InteractEvent;
use crate::drag::{DragSelect, PickHit, PointerScene};
use crate::scene_loading::SceneActivated;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

pub struct DragPlugin;
impl Plugin for DragPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<InteractEvent>()
            .add_event::<SceneActivated>()
            .init_resource::<PieceDragger>()
            .add_systems(
                Update,
                (reset_on_scene_change, drag_pieces, coast_thrown_pieces).chain(),
            );
    }
}

/// Eligible for pointer selection.
#[derive(Component)]
pub struct Interactable;

/// Axis-aligned pick box centred on the entity's translation.
#[derive(Component, Clone, Copy, Debug)]
pub struct Pickable {
    pub half_extents: Vec3,
}

/// Hover highlight written to the emissive channel of the entity's own material.
#[derive(Component, Clone, Copy, Debug)]
pub struct Highlightable {
    pub rim: LinearRgba,
}

/// Body that keeps moving after a throw.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Throwable {
    pub velocity: Vec3,
}

/// Owns the drag settings for the session, coasting included.
#[derive(Resource, Deref, DerefMut)]
pub struct PieceDragger(pub DragSelect<Entity>);

impl FromWorld for PieceDragger {
    fn from_world(world: &mut World) -> Self {
        let settings = world
            .get_resource::<TabletopConfig>()
            .map(|config| config.drag.clone())
            .unwrap_or_default();
        Self(DragSelect::new(settings))
    }
}

/// Distance along the ray to the box, zero if the ray starts inside it.
pub fn ray_aabb(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut near = f32::NEG_INFINITY;
    let mut far = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let a = (min[axis] - o) / d;
        let b = (max[axis] - o) / d;
        near = near.max(a.min(b));
        far = far.min(a.max(b));
    }

    if far < near.max(0.0) {
        return None;
    }
    Some(near.max(0.0))
}

const REST_SPEED: f32 = 0.05;

/// One step of a thrown piece: displacement over `dt` and the damped velocity.
pub fn coast(velocity: Vec3, drag: f32, dt: f32) -> (Vec3, Vec3) {
    let displacement = velocity * dt;
    let damped = velocity * (1.0 - drag * dt).max(0.0);
    if damped.length_squared() < REST_SPEED * REST_SPEED {
        return (displacement, Vec3::ZERO);
    }
    (displacement, damped)
}

type PieceQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Transform,
        &'static Pickable,
        Has<Interactable>,
        Option<&'static Highlightable>,
        Option<&'static Handle<StandardMaterial>>,
        Option<&'static mut Throwable>,
    ),
    Without<TableCamera>,
>;

/// Pieces as seen through the table camera.
struct TableScene<'a, 'w, 's> {
    camera: &'a Camera,
    camera_transform: &'a GlobalTransform,
    pieces: &'a mut PieceQuery<'w, 's>,
    materials: &'a mut Assets<StandardMaterial>,
}

impl PointerScene for TableScene<'_, '_, '_> {
    type Handle = Entity;

    fn pick(&self, pointer: Vec2) -> Option<PickHit<Entity>> {
        let ray = self.camera.viewport_to_world(self.camera_transform, pointer)?;
        self.pieces
            .iter()
            .filter_map(|(entity, transform, pickable, interactable, ..)| {
                let center = transform.translation;
                let distance = ray_aabb(
                    ray.origin,
                    *ray.direction,
                    center - pickable.half_extents,
                    center + pickable.half_extents,
                )?;
                Some((distance, entity, interactable))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, handle, interactable)| PickHit {
                handle,
                interactable,
            })
    }

    fn world_to_screen(&self, world: Vec3) -> Option<Vec3> {
        let viewport = self.camera.world_to_viewport(self.camera_transform, world)?;
        let depth = (world - self.camera_transform.translation())
            .dot(*self.camera_transform.forward());
        Some(viewport.extend(depth))
    }

    fn screen_to_world(&self, screen: Vec3) -> Option<Vec3> {
        let ray = self
            .camera
            .viewport_to_world(self.camera_transform, screen.truncate())?;
        let eye = self.camera_transform.translation();
        let forward = *self.camera_transform.forward();
        let along = ray.direction.dot(forward);
        if along <= f32::EPSILON {
            return None;
        }
        let t = (screen.z - (ray.origin - eye).dot(forward)) / along;
        Some(ray.origin + *ray.direction * t)
    }

    fn position(&self, handle: Entity) -> Option<Vec3> {
        self.pieces
            .get(handle)
            .ok()
            .map(|(_, transform, ..)| transform.translation)
    }

    fn set_position(&mut self, handle: Entity, position: Vec3) {
        if let Ok((_, mut transform, ..)) = self.pieces.get_mut(handle) {
            transform.translation = position;
        }
    }

    fn has_highlight(&self, handle: Entity) -> bool {
        matches!(
            self.pieces.get(handle),
            Ok((_, _, _, _, Some(_), Some(_), _))
        )
    }

    fn set_highlight(&mut self, handle: Entity, on: bool) {
        let Ok((_, _, _, _, Some(highlight), Some(material), _)) = self.pieces.get(handle) else {
            return;
        };
        let emissive = if on { highlight.rim } else { LinearRgba::BLACK };
        if let Some(material) = self.materials.get_mut(material) {
            material.emissive = emissive;
        }
    }

    fn throw(&mut self, handle: Entity, velocity: Vec3) -> bool {
        match self.pieces.get_mut(handle) {
            Ok((_, _, _, _, _, _, Some(mut body))) => {
                body.velocity = velocity;
                true
            }
            _ => false,
        }
    }
}

fn drag_pieces(
    mut dragger: ResMut<PieceDragger>,
    mut interactions: EventReader<InteractEvent>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<TableCamera>>,
    mut pieces: PieceQuery,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut egui: EguiContexts,
    time: Res<Time>,
) {
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        interactions.clear();
        return;
    };

    let pointer = if egui.ctx_mut().wants_pointer_input() {
        None
    } else {
        windows.get_single().ok().and_then(Window::cursor_position)
    };

    let mut scene = TableScene {
        camera,
        camera_transform,
        pieces: &mut pieces,
        materials: &mut materials,
    };

    for interaction in interactions.read() {
        match interaction {
            InteractEvent::Pressed => {
                if let Some(pointer) = pointer {
                    dragger.press(&scene, pointer);
                }
            }
            InteractEvent::Released => {
                if let Some(velocity) = dragger.release(&mut scene) {
                    info!(?velocity, "Piece thrown");
                }
            }
        }
    }

    dragger.tick(&mut scene, pointer, time.delta_seconds());
}

fn coast_thrown_pieces(
    mut bodies: Query<(Entity, &mut Transform, &mut Throwable)>,
    dragger: Res<PieceDragger>,
    time: Res<Time>,
) {
    let held = dragger.state().selected;
    let drag = dragger.settings.throw_drag;
    let dt = time.delta_seconds();
    for (entity, mut transform, mut body) in &mut bodies {
        if Some(entity) == held {
            body.velocity = Vec3::ZERO;
            continue;
        }
        if body.velocity == Vec3::ZERO {
            continue;
        }
        let (displacement, velocity) = coast(body.velocity, drag, dt);
        transform.translation += displacement;
        body.velocity = velocity;
    }
}

fn reset_on_scene_change(
    mut activated: EventReader<SceneActivated>,
    mut dragger: ResMut<PieceDragger>,
) {
    if activated.read().last().is_some() {
        dragger.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::DragSettings;
    use crate::orbit::{OrbitRig, OrbitSettings};
    use bevy::asset::AssetEvent;
    use bevy::ecs::event::Events;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::render::camera::{ManualTextureViews, camera_system};
    use bevy::window::{WindowCreated, WindowResized, WindowScaleFactorChanged};
    use std::time::Duration;

    #[test]
    fn ray_hits_box_in_front() {
        let hit = ray_aabb(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::NEG_Z,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert_eq!(hit, Some(9.0));
    }

    #[test]
    fn ray_misses_box_beside_or_behind() {
        let beside = ray_aabb(
            Vec3::new(3.0, 0.0, 10.0),
            Vec3::NEG_Z,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        let behind = ray_aabb(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::Z,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert_eq!(beside, None);
        assert_eq!(behind, None);
    }

    #[test]
    fn ray_starting_inside_box_hits_at_zero() {
        let hit = ray_aabb(Vec3::ZERO, Vec3::X, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(hit, Some(0.0));
    }

    #[test]
    fn diagonal_ray_enters_through_nearest_face() {
        let direction = Vec3::new(1.0, 1.0, 0.0).normalize();
        let hit = ray_aabb(
            Vec3::new(-3.0, -2.0, 0.0),
            direction,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )
        .expect("hit");
        let entry = Vec3::new(-3.0, -2.0, 0.0) + direction * hit;
        assert!((entry.x + 1.0).abs() < 1e-5, "{entry:?}");
    }

    #[test]
    fn coasting_slows_and_comes_to_rest() {
        let mut velocity = Vec3::new(2.0, 0.0, 0.0);
        let mut travelled = Vec3::ZERO;
        for _ in 0..600 {
            let (step, next) = coast(velocity, 4.0, 1.0 / 60.0);
            travelled += step;
            assert!(next.length() <= velocity.length());
            velocity = next;
        }
        assert_eq!(velocity, Vec3::ZERO);
        assert!(travelled.x > 0.0 && travelled.x < 1.0, "{travelled:?}");
    }

    #[test]
    fn excessive_drag_stops_immediately() {
        let (step, velocity) = coast(Vec3::X, 100.0, 0.1);
        assert_eq!(step, Vec3::X * 0.1);
        assert_eq!(velocity, Vec3::ZERO);
    }

    fn headless_camera(angle_degrees: f32) -> World {
        let mut world = World::new();
        world.init_resource::<Events<WindowResized>>();
        world.init_resource::<Events<WindowCreated>>();
        world.init_resource::<Events<WindowScaleFactorChanged>>();
        world.init_resource::<Events<AssetEvent<Image>>>();
        world.init_resource::<Assets<Image>>();
        world.init_resource::<ManualTextureViews>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.spawn((Window::default(), PrimaryWindow));

        let rig = OrbitRig::new(OrbitSettings {
            start_angle_degrees: angle_degrees,
            ..default()
        });
        let transform = rig.camera_transform();
        world.spawn((
            Camera3dBundle {
                transform,
                global_transform: GlobalTransform::from(transform),
                ..default()
            },
            TableCamera,
        ));
        world.run_system_once(camera_system::<Projection>);
        world
    }

    #[derive(Resource)]
    struct Subject(Vec3);

    fn project_and_back(
        subject: Res<Subject>,
        cameras: Query<(&Camera, &GlobalTransform), With<TableCamera>>,
        mut pieces: PieceQuery,
        mut materials: ResMut<Assets<StandardMaterial>>,
    ) -> Option<(Vec3, Vec3)> {
        let (camera, camera_transform) = cameras.get_single().ok()?;
        let scene = TableScene {
            camera,
            camera_transform,
            pieces: &mut pieces,
            materials: &mut materials,
        };
        let screen = scene.world_to_screen(subject.0)?;
        Some((screen, scene.screen_to_world(screen)?))
    }

    fn drag_first_piece_right(
        cameras: Query<(&Camera, &GlobalTransform), With<TableCamera>>,
        mut pieces: PieceQuery,
        mut materials: ResMut<Assets<StandardMaterial>>,
    ) -> Option<(Vec3, Vec3)> {
        let (camera, camera_transform) = cameras.get_single().ok()?;
        let piece = pieces.iter().next()?.0;
        let mut scene = TableScene {
            camera,
            camera_transform,
            pieces: &mut pieces,
            materials: &mut materials,
        };

        let before = scene.position(piece)?;
        let start = scene.world_to_screen(before)?.truncate();
        let mut drag = DragSelect::new(DragSettings::default());
        drag.press(&scene, start);
        drag.tick(&mut scene, Some(start + Vec2::new(100.0, 0.0)), 0.1);
        Some((before, scene.position(piece)?))
    }

    fn view_depth(world: &mut World, point: Vec3) -> f32 {
        let mut cameras = world.query_filtered::<&GlobalTransform, With<TableCamera>>();
        let camera = cameras.single(world);
        (point - camera.translation()).dot(*camera.forward())
    }

    #[test]
    fn screen_round_trip_at_orbit_stops() {
        for angle in [0.0, 90.0] {
            let mut world = headless_camera(angle);
            for point in [Vec3::ZERO, Vec3::new(0.8, 0.25, -0.6), Vec3::new(-1.5, 0.0, 1.2)] {
                world.insert_resource(Subject(point));
                let (screen, back) = world
                    .run_system_once(project_and_back)
                    .expect("projectable");

                assert!(back.distance(point) < 1e-3, "{angle}: {point:?} -> {back:?}");
                assert!((screen.z - view_depth(&mut world, point)).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn horizontal_drag_slides_piece_along_the_table() {
        for (angle, across) in [(0.0, Vec3::NEG_Z), (90.0, Vec3::X)] {
            let mut world = headless_camera(angle);
            world.spawn((
                Transform::default(),
                Pickable {
                    half_extents: Vec3::splat(0.25),
                },
                Interactable,
            ));

            let (before, after) = world
                .run_system_once(drag_first_piece_right)
                .expect("dragged");

            let moved = after - before;
            assert!(moved.dot(across) > 0.1, "{angle}: {moved:?}");
            assert!(moved.y.abs() < 1e-3, "{angle}: {moved:?}");
            assert!(moved.cross(across).length() < 1e-3, "{angle}: {moved:?}");
            let depth_change = view_depth(&mut world, after) - view_depth(&mut world, before);
            assert!(depth_change.abs() < 1e-3);
        }
    }

    #[test]
    fn coasting_uses_the_dragger_settings() {
        let mut world = World::new();
        world.init_resource::<Time>();
        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(100));
        world.insert_resource(PieceDragger(DragSelect::new(DragSettings {
            throw_drag: 100.0,
            ..default()
        })));
        let piece = world
            .spawn((Transform::default(), Throwable { velocity: Vec3::X }))
            .id();

        world.run_system_once(coast_thrown_pieces);

        assert_eq!(world.get::<Throwable>(piece).expect("body").velocity, Vec3::ZERO);
        let x = world.get::<Transform>(piece).expect("transform").translation.x;
        assert!((x - 0.1).abs() < 1e-6, "{x}");
    }
}
