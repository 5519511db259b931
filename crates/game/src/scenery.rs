//! Static world: the grass plane and the airfield props around the runway.

use std::any::Any;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use engine_core::Transform;
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use renderer::{DrawItem, Entity, LodHelper, Mesh, RenderContext, RenderLists, Shading, LIST_FLATS};

use crate::models::{self, RUNWAY_END_Z, RUNWAY_HALF_WIDTH, RUNWAY_START_Z};

const GROUND_HALF_EXTENT: f32 = 10_000.0;
/// The ground follows the camera in steps of this size.
const GROUND_SNAP: f32 = 500.0;

const TREE_COUNT: usize = 160;
const TREE_MIN_RADIUS: f32 = 120.0;
const TREE_MAX_RADIUS: f32 = 2500.0;
/// Keep trees this far from the runway centreline.
const TREE_RUNWAY_CLEARANCE: f32 = 80.0;

/// Endless grass: one big flat re-centred under the camera.
pub struct Ground {
    mesh: Arc<Mesh>,
}

impl Ground {
    pub fn new() -> Self {
        Self {
            mesh: Arc::new(models::ground(GROUND_HALF_EXTENT)),
        }
    }
}

impl Default for Ground {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Ground {
    fn render_3d(&self, ctx: &RenderContext, lists: &mut RenderLists) {
        let Some(camera) = ctx.camera else {
            return;
        };
        let eye = camera.position();
        let offset = Vec3::new(
            (eye.x / GROUND_SNAP).round() * GROUND_SNAP,
            0.0,
            (eye.z / GROUND_SNAP).round() * GROUND_SNAP,
        );
        lists.push(
            LIST_FLATS,
            DrawItem::Mesh {
                mesh: Arc::clone(&self.mesh),
                matrix: Transform::from_position(offset).to_matrix(),
                shading: Shading::Flat,
            },
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Prop {
    lod: LodHelper,
    transform: Transform,
}

/// Runway, hangars and a seeded scatter of trees.
pub struct Scenery {
    props: Vec<Prop>,
}

impl Scenery {
    pub fn new(seed: u64, lod_bias: i32) -> Self {
        let mut props = Vec::new();
        props.push(Prop {
            lod: LodHelper::new(models::runway(), lod_bias),
            transform: Transform::default(),
        });

        let hangar = models::hangar();
        for (k, z) in [-60.0, -95.0, -130.0].into_iter().enumerate() {
            // Doors face the runway.
            let x = -(RUNWAY_HALF_WIDTH + 45.0 + k as f32 * 2.0);
            props.push(Prop {
                lod: LodHelper::new(Arc::clone(&hangar), lod_bias),
                transform: Transform::from_position(Vec3::new(x, 0.0, z)),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let heights = [8.0, 11.0, 15.0];
        let trees: Vec<_> = heights.iter().map(|h| models::tree(*h)).collect();
        while props.len() < TREE_COUNT + 4 {
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let radius = TREE_MIN_RADIUS + rng.gen::<f32>() * (TREE_MAX_RADIUS - TREE_MIN_RADIUS);
            let position = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
            let beside_runway = position.x.abs() < TREE_RUNWAY_CLEARANCE
                && position.z < RUNWAY_START_Z + TREE_RUNWAY_CLEARANCE
                && position.z > RUNWAY_END_Z - TREE_RUNWAY_CLEARANCE;
            if beside_runway {
                continue;
            }
            let model = &trees[rng.gen_range(0..trees.len())];
            let rotation = Quat::from_rotation_y(rng.gen::<f32>() * FRAC_PI_2);
            props.push(Prop {
                lod: LodHelper::new(Arc::clone(model), lod_bias),
                transform: Transform::from_position_rotation(position, rotation),
            });
        }

        log::info!("Scenery built: {} props (seed {:#x})", props.len(), seed);
        Self { props }
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.props.iter().map(|p| p.transform.position)
    }
}

impl Entity for Scenery {
    fn render_3d(&self, ctx: &RenderContext, lists: &mut RenderLists) {
        for prop in &self.props {
            prop.lod.add_to_render_lists(ctx, &prop.transform, lists);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
