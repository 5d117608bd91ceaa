//! Physics settings consumed by the broad phase, fixtures and the
//! hibernation engine.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::dynamics::Category;

/// # Broad-phase Configuration
///
/// Controls how proxy bounds are fattened so small motions do not force the
/// index to re-insert a proxy every step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadPhaseConfig {
    /// Distance every fat AABB extends beyond the tight bounds
    pub aabb_margin: f32,
    /// Scale applied to a proxy's displacement when predicting motion
    pub aabb_multiplier: f32,
}

impl Default for BroadPhaseConfig {
    fn default() -> Self {
        Self {
            aabb_margin: 0.1,
            aabb_multiplier: 2.0,
        }
    }
}

impl BroadPhaseConfig {
    /// Tight bounds with no fattening or prediction
    pub fn exact() -> Self {
        Self {
            aabb_margin: 0.0,
            aabb_multiplier: 1.0,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aabb_margin.is_nan() || self.aabb_margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "aabb_margin must be non-negative, got {}",
                self.aabb_margin
            )));
        }
        if self.aabb_multiplier.is_nan() || self.aabb_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "aabb_multiplier must be at least 1, got {}",
                self.aabb_multiplier
            )));
        }
        Ok(())
    }
}

/// # Fixture Defaults
///
/// Values a freshly created fixture starts with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureDefaults {
    /// Category bits a new fixture belongs to
    pub collision_categories: u32,
    /// Category bits a new fixture accepts collisions from
    pub collides_with: u32,
    /// Category bits excluded from continuous collision
    pub ignore_ccd_with: u32,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Restitution (bounciness)
    pub restitution: f32,
}

impl Default for FixtureDefaults {
    fn default() -> Self {
        Self {
            collision_categories: Category::CAT1.bits(),
            collides_with: Category::ALL.bits(),
            ignore_ccd_with: Category::NONE.bits(),
            friction: 0.2,
            restitution: 0.0,
        }
    }
}

impl FixtureDefaults {
    /// Default categories as typed flags
    pub fn categories(&self) -> Category {
        Category::from_bits_retain(self.collision_categories)
    }

    /// Default collides-with mask as typed flags
    pub fn collides_with(&self) -> Category {
        Category::from_bits_retain(self.collides_with)
    }

    /// Default CCD exclusion mask as typed flags
    pub fn ignore_ccd_with(&self) -> Category {
        Category::from_bits_retain(self.ignore_ccd_with)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.friction.is_nan() {
            return Err(ConfigError::Invalid("default friction is NaN".to_string()));
        }
        if self.restitution.is_nan() {
            return Err(ConfigError::Invalid("default restitution is NaN".to_string()));
        }
        Ok(())
    }
}

/// # Hibernation Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HibernationConfig {
    /// Seconds a body-tracking active area lives before it expires
    pub tracking_area_lifetime_secs: f64,
}

impl Default for HibernationConfig {
    fn default() -> Self {
        Self {
            tracking_area_lifetime_secs: 3.0,
        }
    }
}

impl HibernationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracking_area_lifetime_secs.is_nan() || self.tracking_area_lifetime_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tracking_area_lifetime_secs must be positive, got {}",
                self.tracking_area_lifetime_secs
            )));
        }
        Ok(())
    }
}

/// # Complete Physics Configuration
///
/// Top-level configuration shared by both body stores and the hibernation
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Broad-phase tuning
    pub broad_phase: BroadPhaseConfig,
    /// Fixture creation defaults
    pub fixture: FixtureDefaults,
    /// Hibernation engine tuning
    pub hibernation: HibernationConfig,
}

impl PhysicsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broad_phase.validate()?;
        self.fixture.validate()?;
        self.hibernation.validate()?;
        Ok(())
    }
}

impl Config for PhysicsConfig {}
