//! Procedural low-poly models. Aircraft noses point down -Z, everything stands on y = 0
//! unless noted.

use std::sync::Arc;

use glam::Vec3;
use physics::PLANE_DISTANCE_TO_GROUND;
use renderer::{LodLevel, Material, Mesh, Model, ModelObject, TimeOfDay};

/// Runway half width and extent along Z.
pub const RUNWAY_HALF_WIDTH: f32 = 15.0;
pub const RUNWAY_START_Z: f32 = 100.0;
pub const RUNWAY_END_Z: f32 = -1100.0;

const CENTRELINE_DASH: f32 = 20.0;
const CENTRELINE_GAP: f32 = 20.0;
const EDGE_LIGHT_SPACING: f32 = 60.0;

/// The player aircraft, origin at its reference point (gear contact is
/// `PLANE_DISTANCE_TO_GROUND` below).
pub fn aircraft() -> Arc<Model> {
    let fuselage = Mesh::cuboid(Vec3::ZERO, Vec3::new(1.2, 1.2, 7.0), Material::Fuselage);
    let wing = Mesh::cuboid(Vec3::new(0.0, 0.1, -0.6), Vec3::new(10.0, 0.2, 1.6), Material::Wing);
    let tailplane = Mesh::cuboid(Vec3::new(0.0, 0.2, 3.1), Vec3::new(3.6, 0.15, 0.9), Material::Wing);
    let fin = Mesh::cuboid(Vec3::new(0.0, 1.1, 3.1), Vec3::new(0.2, 1.6, 1.0), Material::Wing);
    let canopy = Mesh::cuboid(Vec3::new(0.0, 0.8, -1.0), Vec3::new(0.9, 0.5, 1.4), Material::Canopy);

    let leg_height = PLANE_DISTANCE_TO_GROUND - 0.6;
    let leg = |x: f32, z: f32| {
        Mesh::cuboid(
            Vec3::new(x, -0.6 - leg_height * 0.5, z),
            Vec3::new(0.25, leg_height, 0.35),
            Material::Trunk,
        )
    };
    let gear = leg(-1.1, -1.2).with(leg(1.1, -1.2)).with(leg(0.0, 3.0));

    let full = fuselage.clone().with(wing.clone()).with(tailplane).with(fin.clone()).with(gear);
    let medium = fuselage.with(wing).with(fin);
    let blob = Mesh::cuboid(Vec3::ZERO, Vec3::new(10.0, 1.2, 7.0), Material::Fuselage);

    Arc::new(Model::new(vec![
        LodLevel::volumes(vec![ModelObject::new(full), ModelObject::new(canopy)]),
        LodLevel::volumes(vec![ModelObject::new(medium)]),
        LodLevel::volumes(vec![ModelObject::new(blob)]),
    ]))
}

/// Asphalt strip with centreline and threshold markings, plus night-only edge lights.
pub fn runway() -> Arc<Model> {
    let asphalt = Mesh::flat_rect(
        -RUNWAY_HALF_WIDTH,
        RUNWAY_END_Z,
        RUNWAY_HALF_WIDTH,
        RUNWAY_START_Z,
        0.0,
        Material::Runway,
    );

    let mut markings = Mesh::new();
    let mut z = RUNWAY_START_Z - 40.0;
    while z - CENTRELINE_DASH > RUNWAY_END_Z + 40.0 {
        markings.append(&Mesh::flat_rect(-0.5, z - CENTRELINE_DASH, 0.5, z, 0.0, Material::Marking));
        z -= CENTRELINE_DASH + CENTRELINE_GAP;
    }
    for end in [RUNWAY_START_Z - 12.0, RUNWAY_END_Z + 4.0] {
        for k in 0..6 {
            let x = -RUNWAY_HALF_WIDTH + 2.0 + k as f32 * 2.2;
            markings.append(&Mesh::flat_rect(x, end, x + 1.2, end + 8.0, 0.0, Material::Marking));
            markings.append(&Mesh::flat_rect(-x - 1.2, end, -x, end + 8.0, 0.0, Material::Marking));
        }
    }

    let mut lights = Mesh::new();
    let mut z = RUNWAY_START_Z;
    while z >= RUNWAY_END_Z {
        for x in [-RUNWAY_HALF_WIDTH - 1.0, RUNWAY_HALF_WIDTH + 1.0] {
            lights.append(&Mesh::cuboid(Vec3::new(x, 0.3, z), Vec3::splat(0.6), Material::Light));
        }
        z -= EDGE_LIGHT_SPACING;
    }

    Arc::new(Model::new(vec![
        LodLevel::new(
            vec![ModelObject::new(asphalt.clone()), ModelObject::new(markings)],
            vec![ModelObject::at(lights, TimeOfDay::Night)],
        ),
        LodLevel::new(vec![ModelObject::new(asphalt)], Vec::new()),
    ]))
}

/// Hangar with a gable roof and a lamp over the door at night. The door faces +X.
pub fn hangar() -> Arc<Model> {
    let body = Mesh::cuboid(Vec3::new(0.0, 4.0, 0.0), Vec3::new(20.0, 8.0, 24.0), Material::Hangar);
    let roof = Mesh::gable(Vec3::new(0.0, 8.0, 0.0), 20.0, 24.0, 5.0, Material::Roof);
    let door = Mesh::cuboid(Vec3::new(10.05, 3.0, 0.0), Vec3::new(0.1, 6.0, 14.0), Material::Roof);
    let lamp = Mesh::cuboid(Vec3::new(10.4, 7.0, 0.0), Vec3::new(0.6, 0.6, 1.2), Material::Light);
    let block = Mesh::cuboid(Vec3::new(0.0, 5.0, 0.0), Vec3::new(20.0, 10.0, 24.0), Material::Hangar);

    Arc::new(Model::new(vec![
        LodLevel::volumes(vec![
            ModelObject::new(body.clone().with(door)),
            ModelObject::new(roof.clone()),
            ModelObject::at(lamp, TimeOfDay::Night),
        ]),
        LodLevel::volumes(vec![ModelObject::new(body.with(roof))]),
        LodLevel::volumes(vec![ModelObject::new(block)]),
    ]))
}

/// Conifer of the given height.
pub fn tree(height: f32) -> Arc<Model> {
    let trunk_height = height * 0.25;
    let trunk = Mesh::cuboid(
        Vec3::new(0.0, trunk_height * 0.5, 0.0),
        Vec3::new(height * 0.08, trunk_height, height * 0.08),
        Material::Trunk,
    );
    let crown = Mesh::pyramid(Vec3::Y * trunk_height, height * 0.45, height * 0.75, Material::Foliage);
    let far_crown = Mesh::pyramid(Vec3::ZERO, height * 0.45, height, Material::Foliage);

    Arc::new(Model::new(vec![
        LodLevel::volumes(vec![ModelObject::new(trunk.with(crown))]),
        LodLevel::volumes(vec![ModelObject::new(far_crown)]),
    ]))
}

/// Square of grass `half_extent` each way around the origin.
pub fn ground(half_extent: f32) -> Mesh {
    Mesh::flat_rect(-half_extent, -half_extent, half_extent, half_extent, 0.0, Material::Grass)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aircraft_gear_reaches_the_ground() {
        let model = aircraft();
        let lowest = model.lod[0].volumes[0].mesh.bounds().min.y;
        assert!((lowest + PLANE_DISTANCE_TO_GROUND).abs() < 1e-4);
        // Nose forward: the fuselage extends further ahead of the wing than the fin does.
        assert!(model.lod[0].volumes[0].mesh.bounds().min.z < -3.0);
    }

    #[test]
    fn levels_get_simpler() {
        for model in [aircraft(), hangar(), tree(12.0)] {
            let counts: Vec<usize> = model
                .lod
                .iter()
                .map(|l| l.volumes.iter().map(|o| o.mesh.triangles.len()).sum())
                .collect();
            assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{counts:?}");
            assert!(model.max_size > 0.0);
        }
    }

    #[test]
    fn runway_lights_only_at_night() {
        let model = runway();
        let level = &model.lod[0];
        assert!(level.volumes.iter().all(|o| !o.visible_at(TimeOfDay::Day)));
        assert!(level.volumes.iter().all(|o| o.visible_at(TimeOfDay::Night)));
        assert!(level.flats.iter().all(|o| o.visible_at(TimeOfDay::Day)));
        assert!(model.max_size >= RUNWAY_START_Z - RUNWAY_END_Z);
    }
}
