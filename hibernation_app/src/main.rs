//! Hibernation Demo
//!
//! Scatters bodies over a large field and sweeps a player-driven active area
//! across it:
//! - Bodies the area leaves behind are moved into the dormant world
//! - Bodies the area reaches are moved back and simulated again
//! - Moving bodies that drift out of the area get a short-lived escort
//!
//! Pass a `.toml` or `.ron` settings file as the first argument to override
//! the default physics configuration.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_physics::prelude::*;
use thiserror::Error;

// Scene settings
const FIELD_HALF_SIZE: f32 = 200.0;
const NUM_CRATES: usize = 120;
const NUM_ROCKS: usize = 60;
const DRIFTING_FRACTION: f64 = 0.25;

// Player area
const PLAYER_HALF_EXTENTS: f32 = 40.0;
const PLAYER_SPEED: f32 = 30.0;

// Loop
const STEP_DT: f32 = 1.0 / 60.0;
const STEPS_PER_TICK: usize = 30;
const TICKS: usize = 60;

#[derive(Error, Debug)]
enum DemoError {
    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("hibernation error: {0}")]
    Hibernation(#[from] HibernationError),

    #[error("config error: {0}")]
    Config(#[from] rust_physics::config::ConfigError),

    #[error("shape error: {0}")]
    Shape(#[from] rust_physics::collision::shape::ShapeError),
}

struct HibernationDemoApp {
    world: World,
    hibernation: HibernationManager,
    player: AreaId,
    player_position: Vec2,
    tick: usize,
}

impl HibernationDemoApp {
    fn new(config: PhysicsConfig) -> Result<Self, DemoError> {
        let mut world = World::new("active", config);
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..NUM_CRATES {
            let body = world.create_body(random_def(&mut rng))?;
            let half = rng.gen_range(0.5..2.0);
            world.create_fixture(body, Shape::rect(half, half, Vec2::zeros(), 1.0)?)?;
        }
        for _ in 0..NUM_ROCKS {
            let body = world.create_body(random_def(&mut rng))?;
            world.create_fixture(body, Shape::circle(rng.gen_range(0.5..3.0), Vec2::zeros(), 2.5)?)?;
        }
        log::info!("Scene created with {} bodies", world.body_count());

        let mut hibernation = HibernationManager::new(&world);
        let player_position = Vec2::new(-FIELD_HALF_SIZE, 0.0);
        let player = hibernation.add_area(player_position, Vec2::new(PLAYER_HALF_EXTENTS, PLAYER_HALF_EXTENTS));

        Ok(Self {
            world,
            hibernation,
            player,
            player_position,
            tick: 0,
        })
    }

    fn run(mut self) -> Result<(), DemoError> {
        log::info!("Starting hibernation demo...");
        for _ in 0..TICKS {
            self.advance()?;
        }
        log::info!(
            "Finished after {} ticks: {} bodies active, {} hibernated",
            self.tick,
            self.world.body_count(),
            self.hibernation.hibernated_world().body_count()
        );
        Ok(())
    }

    fn advance(&mut self) -> Result<(), DemoError> {
        for _ in 0..STEPS_PER_TICK {
            self.world.step(STEP_DT)?;
        }

        #[allow(clippy::cast_precision_loss)]
        let elapsed = STEP_DT * STEPS_PER_TICK as f32;
        self.player_position.x += PLAYER_SPEED * elapsed;
        if self.player_position.x > FIELD_HALF_SIZE {
            self.player_position.x = -FIELD_HALF_SIZE;
        }
        self.hibernation.set_area_position(self.player, self.player_position)?;

        let report = self.hibernation.update(&mut self.world)?;
        self.tick += 1;
        if !report.is_empty() {
            log::info!(
                "tick {:>3}: player at x={:>7.1}, woke {:>3}, hibernated {:>3}, escorts +{} -{} ({} active / {} dormant)",
                self.tick,
                self.player_position.x,
                report.woken.len(),
                report.hibernated.len(),
                report.areas_created,
                report.areas_removed,
                self.world.body_count(),
                self.hibernation.hibernated_world().body_count()
            );
        }
        Ok(())
    }
}

fn random_def(rng: &mut StdRng) -> BodyDef {
    let position = Vec2::new(
        rng.gen_range(-FIELD_HALF_SIZE..FIELD_HALF_SIZE),
        rng.gen_range(-FIELD_HALF_SIZE..FIELD_HALF_SIZE),
    );
    let def = BodyDef::at(position);
    if rng.gen_bool(DRIFTING_FRACTION) {
        def.with_linear_velocity(Vec2::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0)))
            .with_angular_velocity(rng.gen_range(-1.0..1.0))
    } else {
        def
    }
}

fn load_config() -> Result<PhysicsConfig, DemoError> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(PhysicsConfig::default());
    };
    let config = PhysicsConfig::load_from_file(&path)?;
    config.validate()?;
    log::info!("Loaded physics configuration from {}", path);
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    rust_physics::foundation::logging::init_with_default("info");

    let config = load_config()?;
    let app = HibernationDemoApp::new(config)?;
    app.run()?;
    Ok(())
}
