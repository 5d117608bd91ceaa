//! End-to-end tests for the hibernation pipeline
//!
//! Worlds use exact broad-phase bounds so area containment can be reasoned
//! about with plain box coordinates.

use approx::assert_relative_eq;

use crate::collision::{Shape, AABB};
use crate::config::{BroadPhaseConfig, PhysicsConfig};
use crate::dynamics::{BodyDef, BodyId, World};
use crate::foundation::math::{Transform2, Vec2};
use crate::foundation::time::ManualClock;
use crate::hibernation::{ActiveArea, AreaBody, AreaBodyStatus, HibernationError, HibernationManager};

fn exact_config() -> PhysicsConfig {
    PhysicsConfig {
        broad_phase: BroadPhaseConfig::exact(),
        ..PhysicsConfig::default()
    }
}

fn square(world: &mut World, center: Vec2, half: f32) -> BodyId {
    let body = world.create_body(BodyDef::at(center)).unwrap();
    world
        .create_fixture(body, Shape::rect(half, half, Vec2::zeros(), 1.0).unwrap())
        .unwrap();
    body
}

fn teleport(world: &mut World, body: BodyId, center: Vec2) {
    world.set_transform(body, Transform2::from_position(center)).unwrap();
}

fn manager(world: &World) -> (HibernationManager, ManualClock) {
    let clock = ManualClock::new();
    let manager = HibernationManager::with_clock(world, Box::new(clock.clone()));
    (manager, clock)
}

/// Bodies must live in exactly one of the two worlds
fn assert_single_store(active: &World, manager: &HibernationManager, body: BodyId) {
    let hot = active.contains_body(body);
    let cold = manager.hibernated_world().contains_body(body);
    assert!(hot ^ cold, "body {body} hot={hot} cold={cold}");
}

fn status_in(manager: &HibernationManager, area: crate::hibernation::AreaId, body: BodyId) -> Option<AreaBodyStatus> {
    manager
        .area(area)?
        .bodies()
        .iter()
        .find(|record| record.body == body)
        .map(|record| record.position_status)
}

#[test]
fn test_bodies_outside_every_area_hibernate_on_first_tick() {
    let mut active = World::new("active", exact_config());
    let inside = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let outside = square(&mut active, Vec2::new(50.0, 50.0), 1.0);
    let (mut manager, _clock) = manager(&active);
    manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));

    let report = manager.update(&mut active).unwrap();

    assert_eq!(report.hibernated, vec![outside]);
    assert!(active.contains_body(inside));
    assert!(manager.hibernated_world().contains_body(outside));
    assert_single_store(&active, &manager, inside);
    assert_single_store(&active, &manager, outside);
    assert!(manager.pending_hibernation().is_empty());
}

#[test]
fn test_body_created_later_hibernates_when_uncovered() {
    let mut active = World::new("active", exact_config());
    let (mut manager, _clock) = manager(&active);
    manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
    manager.update(&mut active).unwrap();

    let late = square(&mut active, Vec2::new(100.0, 100.0), 1.0);
    let covered = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let report = manager.update(&mut active).unwrap();

    assert_eq!(report.hibernated, vec![late]);
    assert!(!manager.is_in_any_area(late));
    assert!(manager.hibernated_world().contains_body(late));
    assert!(active.contains_body(covered));
    assert_single_store(&active, &manager, late);
    assert_single_store(&active, &manager, covered);
}

#[test]
fn test_straddling_then_leaving_without_velocity() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 3.5);
    let (mut manager, _clock) = manager(&active);
    let area = manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));

    manager.update(&mut active).unwrap();
    assert_eq!(status_in(&manager, area, body), Some(AreaBodyStatus::TotallyIn));
    assert!(manager.tracking_area_for(body).is_none());

    // Bounds become [(8,8),(15,15)].
    teleport(&mut active, body, Vec2::new(11.5, 11.5));
    let report = manager.update(&mut active).unwrap();
    assert_eq!(status_in(&manager, area, body), Some(AreaBodyStatus::PartiallyIn));
    assert_eq!(report.areas_created, 0);

    teleport(&mut active, body, Vec2::new(30.0, 30.0));
    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.hibernated, vec![body]);
    assert!(status_in(&manager, area, body).is_none());
    assert!(manager.hibernated_world().contains_body(body));
    assert_single_store(&active, &manager, body);
}

#[test]
fn test_moving_body_gets_escort_until_it_expires() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 3.5);
    let (mut manager, clock) = manager(&active);
    let area = manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
    manager.update(&mut active).unwrap();

    active.set_linear_velocity(body, Vec2::new(1.0, 1.0)).unwrap();
    teleport(&mut active, body, Vec2::new(11.5, 11.5));
    let report = manager.update(&mut active).unwrap();
    assert_eq!(status_in(&manager, area, body), Some(AreaBodyStatus::PartiallyIn));
    assert_eq!(report.areas_created, 1);
    let escort = manager.tracking_area_for(body).unwrap();
    assert_eq!(manager.area(escort).unwrap().aabb(), AABB::from_coords(8.0, 8.0, 15.0, 15.0));

    // Fully out of the free area, but the escort keeps it simulated.
    clock.advance(1.0);
    teleport(&mut active, body, Vec2::new(30.0, 30.0));
    let report = manager.update(&mut active).unwrap();
    assert!(report.hibernated.is_empty());
    assert!(status_in(&manager, area, body).is_none());
    assert_eq!(status_in(&manager, escort, body), Some(AreaBodyStatus::TotallyIn));
    assert_eq!(manager.area(escort).unwrap().aabb(), AABB::from_coords(26.5, 26.5, 33.5, 33.5));
    assert!(active.contains_body(body));

    // Past the escort's lifetime the body hibernates and the escort goes.
    clock.advance(2.5);
    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.hibernated, vec![body]);
    assert_eq!(report.areas_removed, 1);
    assert!(manager.area(escort).is_none());
    assert!(manager.tracking_area_for(body).is_none());
    assert_single_store(&active, &manager, body);

    let cold = manager.hibernated_world().body(body).unwrap();
    assert_relative_eq!(cold.position().x, 30.0);
    assert_relative_eq!(cold.linear_velocity().y, 1.0);
}

#[test]
fn test_escort_retired_when_body_is_covered_again() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let (mut manager, _clock) = manager(&active);
    let area = manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
    manager.update(&mut active).unwrap();

    active.set_angular_velocity(body, 0.5).unwrap();
    teleport(&mut active, body, Vec2::new(20.0, 5.0));
    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.areas_created, 1);
    assert!(manager.tracking_area_for(body).is_some());

    teleport(&mut active, body, Vec2::new(5.0, 5.0));
    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.areas_removed, 1);
    assert!(manager.tracking_area_for(body).is_none());
    assert_eq!(status_in(&manager, area, body), Some(AreaBodyStatus::TotallyIn));
    assert_eq!(manager.area_count(), 1);
}

#[test]
fn test_area_reaching_cold_body_wakes_it_same_tick() {
    let mut active = World::new("active", exact_config());
    let (mut manager, _clock) = manager(&active);
    let sleeper = square(manager.hibernated_world_mut(), Vec2::new(40.0, 5.0), 1.0);
    let fixture = manager.hibernated_world().body(sleeper).unwrap().fixtures()[0].id();
    let area = manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));

    let report = manager.update(&mut active).unwrap();
    assert!(report.woken.is_empty());
    assert!(manager.hibernated_world().contains_body(sleeper));

    manager.set_area_position(area, Vec2::new(38.0, 5.0)).unwrap();
    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.woken, vec![sleeper]);
    assert!(report.hibernated.is_empty());
    assert_eq!(status_in(&manager, area, sleeper), Some(AreaBodyStatus::TotallyIn));
    assert!(active.fixture(sleeper, fixture).is_ok());
    assert_single_store(&active, &manager, sleeper);
}

#[test]
fn test_removed_area_releases_its_members() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let (mut manager, _clock) = manager(&active);
    let area = manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
    manager.update(&mut active).unwrap();

    let removed = manager.remove_area(area).unwrap();
    assert!(removed.contains_body(body));
    assert_eq!(manager.pending_hibernation(), &[body]);

    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.hibernated, vec![body]);
    assert_eq!(manager.remove_area(area).unwrap_err(), HibernationError::AreaNotFound(area));
}

#[test]
fn test_locked_worlds_skip_the_tick() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(50.0, 50.0), 1.0);
    let (mut manager, _clock) = manager(&active);

    active.lock();
    assert_eq!(manager.update(&mut active), Err(HibernationError::ActiveWorldLocked));
    active.unlock();

    manager.hibernated_world_mut().lock();
    assert_eq!(manager.update(&mut active), Err(HibernationError::HibernatedWorldLocked));
    assert!(active.contains_body(body));
    assert_eq!(manager.pending_hibernation(), &[body]);

    manager.hibernated_world_mut().unlock();
    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.hibernated, vec![body]);
}

#[test]
fn test_track_body_rejects_second_escort() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let (mut manager, _clock) = manager(&active);

    let escort = manager.track_body(&active, body).unwrap();
    assert_eq!(manager.area(escort).unwrap().tracked_body(), Some(body));
    assert_eq!(manager.track_body(&active, body), Err(HibernationError::AlreadyTracked(body)));
    assert_eq!(
        manager.set_area_position(escort, Vec2::zeros()),
        Err(HibernationError::NotFreeFloating(escort))
    );

    let missing = BodyId::from_raw(u32::MAX);
    assert!(matches!(
        manager.track_body(&active, missing),
        Err(HibernationError::Physics(_))
    ));
}

#[test]
fn test_empty_expired_escort_is_pruned() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let (mut manager, clock) = manager(&active);
    let escort = manager.track_body(&active, body).unwrap();

    // The escort keeps its body hot until it expires.
    let report = manager.update(&mut active).unwrap();
    assert!(report.hibernated.is_empty());

    clock.advance(3.0);
    manager.update(&mut active).unwrap();
    assert!(manager.area(escort).is_some());

    clock.advance(0.5);
    let report = manager.update(&mut active).unwrap();
    assert_eq!(report.hibernated, vec![body]);
    assert_eq!(manager.area_count(), 0);
}

#[test]
#[should_panic(expected = "tracking areas")]
fn test_duplicate_escorts_abort_the_tick() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let (mut manager, _clock) = manager(&active);
    manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
    let bounds = active.body_fat_aabb(body).unwrap();
    manager.insert_area_for_test(ActiveArea::body_tracking(body, bounds, 0.0));
    manager.insert_area_for_test(ActiveArea::body_tracking(body, bounds, 0.0));

    let _ = manager.update(&mut active);
}

#[test]
#[should_panic(expected = "expired tracking area")]
fn test_expired_area_keeping_members_aborts_the_tick() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let (mut manager, clock) = manager(&active);
    let bounds = active.body_fat_aabb(body).unwrap();

    // An unchanged TotallyOut record is never removed by the transition pass.
    let mut escort = ActiveArea::body_tracking(body, bounds, 0.0);
    escort.bodies.push(AreaBody {
        body: BodyId::from_raw(u32::MAX),
        position_status: AreaBodyStatus::TotallyOut,
        prior_status: AreaBodyStatus::TotallyOut,
    });
    manager.insert_area_for_test(escort);
    clock.advance(10.0);

    let _ = manager.update(&mut active);
}

#[test]
#[should_panic(expected = "could not wake")]
fn test_body_in_both_worlds_aborts_the_tick() {
    let mut active = World::new("active", exact_config());
    let body = square(&mut active, Vec2::new(5.0, 5.0), 1.0);
    let (mut manager, _clock) = manager(&active);
    active.deep_clone_body_into(body, manager.hibernated_world_mut()).unwrap();
    manager.add_area(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));

    let _ = manager.update(&mut active);
}
