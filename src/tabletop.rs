use crate::picking::{Highlightable, Interactable, Pickable, Throwable};
use bevy::prelude::*;

/// Owned by the active scene and despawned when another one activates.
#[derive(Component)]
pub struct SceneMember;

const TABLE_SIZE: Vec3 = Vec3::new(6.0, 0.2, 4.0);
const PIECE_SIZE: f32 = 0.5;
const RIM: LinearRgba = LinearRgba::rgb(0.6, 0.45, 0.1);

const PIECES: [(Vec2, Color); 4] = [
    (Vec2::new(-1.5, -0.8), Color::srgb(0.8, 0.2, 0.2)),
    (Vec2::new(0.0, 0.6), Color::srgb(0.2, 0.5, 0.8)),
    (Vec2::new(1.4, -0.4), Color::srgb(0.9, 0.8, 0.3)),
    (Vec2::new(-0.4, -1.2), Color::srgb(0.3, 0.7, 0.35)),
];

/// Spawns the table top and its pieces. Every piece gets its own material so
/// highlighting one leaves the others alone.
pub fn spawn_tabletop(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let table_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.45, 0.3, 0.18),
        perceptual_roughness: 0.8,
        metallic: 0.0,
        ..default()
    });

    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Cuboid::from_size(TABLE_SIZE)),
            material: table_material,
            transform: Transform::from_xyz(0.0, -TABLE_SIZE.y / 2.0, 0.0),
            ..default()
        },
        Pickable {
            half_extents: TABLE_SIZE / 2.0,
        },
        SceneMember,
        Name::new("Table"),
    ));

    let piece_mesh = meshes.add(Cuboid::from_size(Vec3::splat(PIECE_SIZE)));
    for (index, (spot, color)) in PIECES.into_iter().enumerate() {
        let material = materials.add(StandardMaterial {
            base_color: color,
            perceptual_roughness: 0.6,
            ..default()
        });
        commands.spawn((
            PbrBundle {
                mesh: piece_mesh.clone(),
                material,
                transform: Transform::from_xyz(spot.x, PIECE_SIZE / 2.0, spot.y),
                ..default()
            },
            Interactable,
            Pickable {
                half_extents: Vec3::splat(PIECE_SIZE / 2.0),
            },
            Highlightable { rim: RIM },
            Throwable::default(),
            SceneMember,
            Name::new(format!("Piece{index}")),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn spawn(
        mut commands: Commands,
        mut meshes: ResMut<Assets<Mesh>>,
        mut materials: ResMut<Assets<StandardMaterial>>,
    ) {
        spawn_tabletop(&mut commands, &mut meshes, &mut materials);
    }

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.run_system_once(spawn);
        world
    }

    #[test]
    fn only_pieces_are_interactable() {
        let mut world = world();

        let members = world.query::<&SceneMember>().iter(&world).count();
        let pieces = world
            .query_filtered::<&Pickable, With<Interactable>>()
            .iter(&world)
            .count();

        assert_eq!(members, PIECES.len() + 1);
        assert_eq!(pieces, PIECES.len());
    }

    #[test]
    fn pieces_rest_on_the_table_with_their_own_material() {
        let mut world = world();

        let mut materials = Vec::new();
        for (transform, material) in world
            .query_filtered::<(&Transform, &Handle<StandardMaterial>), With<Interactable>>()
            .iter(&world)
        {
            assert_eq!(transform.translation.y, PIECE_SIZE / 2.0);
            assert!(!materials.contains(&material.id()));
            materials.push(material.id());
        }
        assert_eq!(materials.len(), PIECES.len());
    }
}
