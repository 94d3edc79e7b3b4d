//! Built-in effect presets.
//!
//! Palettes, timelines and hull layers are `static` data so spawning an
//! effect never allocates. Functions below assemble them into the spawn
//! parameters each effect of [`EffectsSystem`](crate::EffectsSystem) uses.

use cinder_core::{
    AppearanceRules, ColorLifespan, ColorTimelineNode, ContentFlags, LightRules, MaterialId,
    ParticleKind, Rgba8,
};
use cinder_hulls::{ConcentricHullParams, LayerParams, RegularHullParams};
use cinder_particles::FillParams;
use cinder_trails::{BeamParams, ParticleTrailParams, PolyTrailParams};
use glam::Vec3;

use crate::sprites::SpriteParams;

/// Material ids the host renderer registers effect shaders under.
pub mod materials {
    use cinder_core::MaterialId;

    /// Additive explosion flash.
    pub const FLASH: MaterialId = MaterialId(1);
    /// Outer fireball layers.
    pub const FIRE: MaterialId = MaterialId(2);
    /// Hot fireball core.
    pub const FIRE_CORE: MaterialId = MaterialId(3);
    /// Smoke hulls and smoke particles.
    pub const SMOKE: MaterialId = MaterialId(4);
    /// Shockwave hulls.
    pub const WAVE: MaterialId = MaterialId(5);
    /// Sparks.
    pub const SPARK: MaterialId = MaterialId(6);
    /// Debris chunks.
    pub const DEBRIS: MaterialId = MaterialId(7);
    /// Dust puffs.
    pub const DUST: MaterialId = MaterialId(8);
    /// Plasma impacts and blaster trails.
    pub const PLASMA: MaterialId = MaterialId(9);
    /// Electro bolt ribbon.
    pub const ELECTRO: MaterialId = MaterialId(10);
    /// Laser and railgun beams.
    pub const BEAM: MaterialId = MaterialId(11);
}

// ── Palettes ───────────────────────────────────────────────────────

/// Fresh fire.
pub static FIRE_PALETTE: [Rgba8; 4] = [
    [255, 240, 190, 255],
    [255, 200, 100, 255],
    [255, 160, 60, 255],
    [255, 110, 40, 255],
];

/// Fire that has started to cool; always less opaque than fresh fire.
pub static FIRE_COOLING_PALETTE: [Rgba8; 3] = [
    [230, 90, 30, 96],
    [200, 70, 30, 88],
    [160, 60, 30, 80],
];

/// Smoke left behind by fire.
pub static SMOKE_PALETTE: [Rgba8; 3] = [[90, 90, 90, 56], [70, 70, 70, 52], [50, 50, 50, 48]];

/// Thin smoke about to vanish.
pub static SMOKE_FADED_PALETTE: [Rgba8; 2] = [[80, 80, 80, 32], [60, 60, 60, 24]];

/// Sparks.
pub static SPARK_PALETTE: [Rgba8; 3] = [[255, 240, 180, 255], [255, 210, 120, 255], [255, 180, 80, 255]];

/// Debris chunks.
pub static DEBRIS_PALETTE: [Rgba8; 3] = [[60, 50, 40, 255], [80, 70, 60, 255], [40, 35, 30, 255]];

/// Dust.
pub static DUST_PALETTE: [Rgba8; 2] = [[150, 130, 100, 160], [120, 105, 80, 160]];

/// Plasma.
pub static PLASMA_PALETTE: [Rgba8; 2] = [[140, 200, 255, 255], [200, 230, 255, 255]];

// ── Timelines ──────────────────────────────────────────────────────

/// Fireball layers cool, turn to smoke, then break up.
pub static FIRE_TIMELINE: [ColorTimelineNode; 3] = [
    ColorTimelineNode {
        activate_at_lifetime_fraction: 0.35,
        replacement_palette: &FIRE_COOLING_PALETTE,
        drop_chance: 0.0,
        replacement_chance: 0.3,
        color_change_interval_ms: 60,
    },
    ColorTimelineNode {
        activate_at_lifetime_fraction: 0.6,
        replacement_palette: &SMOKE_PALETTE,
        drop_chance: 0.05,
        replacement_chance: 0.5,
        color_change_interval_ms: 80,
    },
    ColorTimelineNode {
        activate_at_lifetime_fraction: 0.85,
        replacement_palette: &SMOKE_FADED_PALETTE,
        drop_chance: 0.35,
        replacement_chance: 0.5,
        color_change_interval_ms: 60,
    },
];

/// Smoke thins out, then breaks up.
pub static SMOKE_TIMELINE: [ColorTimelineNode; 2] = [
    ColorTimelineNode {
        activate_at_lifetime_fraction: 0.4,
        replacement_palette: &SMOKE_FADED_PALETTE,
        drop_chance: 0.02,
        replacement_chance: 0.2,
        color_change_interval_ms: 100,
    },
    ColorTimelineNode {
        activate_at_lifetime_fraction: 0.75,
        replacement_palette: &[],
        drop_chance: 0.25,
        replacement_chance: 0.0,
        color_change_interval_ms: 100,
    },
];

/// Shockwaves break up in their second half.
pub static WAVE_TIMELINE: [ColorTimelineNode; 1] = [ColorTimelineNode {
    activate_at_lifetime_fraction: 0.5,
    replacement_palette: &[],
    drop_chance: 0.4,
    replacement_chance: 0.0,
    color_change_interval_ms: 30,
}];

/// Sparks flicker out near the end.
pub static SPARK_TIMELINE: [ColorTimelineNode; 1] = [ColorTimelineNode {
    activate_at_lifetime_fraction: 0.7,
    replacement_palette: &[],
    drop_chance: 0.2,
    replacement_chance: 0.0,
    color_change_interval_ms: 40,
}];

// ── Fireball layers ────────────────────────────────────────────────

const fn layer(
    speed: f32,
    max_speed_spike: f32,
    bias_along_dir: f32,
    final_offset: f32,
    initial_color: Rgba8,
    material: MaterialId,
    timeline: &'static [ColorTimelineNode],
) -> LayerParams {
    LayerParams {
        speed,
        max_speed_spike,
        bias_along_dir,
        final_offset,
        initial_color,
        timeline,
        material,
    }
}

/// Rocket fireball, outermost layer first. Inner layers stop further
/// short of obstacles so they stay inside the outer ones.
pub static ROCKET_FIRE_LAYERS: [LayerParams; 5] = [
    layer(120.0, 20.0, 30.0, 0.5, [255, 110, 40, 96], materials::FIRE, &FIRE_TIMELINE),
    layer(100.0, 16.0, 24.0, 2.5, [255, 160, 60, 128], materials::FIRE, &FIRE_TIMELINE),
    layer(85.0, 12.0, 20.0, 4.5, [255, 200, 100, 160], materials::FIRE, &FIRE_TIMELINE),
    layer(70.0, 10.0, 16.0, 6.5, [255, 220, 150, 192], materials::FIRE_CORE, &FIRE_TIMELINE),
    layer(55.0, 8.0, 12.0, 8.5, [255, 240, 190, 224], materials::FIRE_CORE, &FIRE_TIMELINE),
];

/// Grenade fireball: wider, rounder and less directional than a rocket's.
pub static GRENADE_FIRE_LAYERS: [LayerParams; 5] = [
    layer(140.0, 30.0, 10.0, 0.5, [255, 100, 40, 96], materials::FIRE, &FIRE_TIMELINE),
    layer(120.0, 24.0, 8.0, 2.5, [255, 150, 60, 128], materials::FIRE, &FIRE_TIMELINE),
    layer(100.0, 18.0, 6.0, 4.5, [255, 190, 90, 160], materials::FIRE, &FIRE_TIMELINE),
    layer(80.0, 14.0, 4.0, 6.5, [255, 215, 140, 192], materials::FIRE_CORE, &FIRE_TIMELINE),
    layer(60.0, 10.0, 2.0, 8.5, [255, 235, 180, 224], materials::FIRE_CORE, &FIRE_TIMELINE),
];

// ── Particle emitters ──────────────────────────────────────────────

/// One flock's worth of particles emitted by a one-shot effect.
///
/// The origin of `fill` and the cone axis are set at spawn time.
#[derive(Clone, Copy, Debug)]
pub struct ParticleEmitter {
    /// Particles wanted; also picks the flock bin.
    pub count: usize,
    /// Speeds, lifetimes, bounces and acceleration.
    pub fill: FillParams,
    /// How the flock is drawn.
    pub appearance: AppearanceRules,
    /// Contents the particles collide with.
    pub collision_mask: ContentFlags,
    /// Half-angle of the emission cone around the effect's direction;
    /// `None` emits in every direction.
    pub cone_angle_degrees: Option<f32>,
}

/// Everything an explosion spawns.
#[derive(Clone, Copy, Debug)]
pub struct ExplosionPreset {
    /// Concentric fireball.
    pub fire_hull: ConcentricHullParams,
    /// Rising smoke blob.
    pub smoke_hull: RegularHullParams,
    /// Fast shockwave blob.
    pub wave_hull: RegularHullParams,
    /// Glowing sparks along the impact direction.
    pub sparks: ParticleEmitter,
    /// Bouncing debris.
    pub debris: ParticleEmitter,
    /// Flash sprite.
    pub flash: SpriteParams,
    /// How far along the impact direction particles and smoke start.
    pub lift: f32,
}

fn fill(min_speed: f32, max_speed: f32, timeout_ms: (u32, u32), bounces: (u8, u8), accel: Vec3) -> FillParams {
    FillParams {
        accel,
        min_speed,
        max_speed,
        min_timeout_ms: timeout_ms.0,
        max_timeout_ms: timeout_ms.1,
        min_bounces: bounces.0,
        max_bounces: bounces.1,
        ..Default::default()
    }
}

fn spark_appearance(length: f32, light: Option<LightRules>) -> AppearanceRules {
    AppearanceRules {
        material: materials::SPARK,
        colors: &SPARK_PALETTE,
        color_lifespan: Some(ColorLifespan::fade_out(SPARK_PALETTE[0])),
        timeline: Some(&SPARK_TIMELINE),
        kind: ParticleKind::Spark { length },
        radius: 0.75,
        radius_spread: 0.5,
        light,
    }
}

fn debris_emitter(count: usize) -> ParticleEmitter {
    ParticleEmitter {
        count,
        fill: fill(150.0, 320.0, (1200, 2000), (2, 3), Vec3::new(0.0, 0.0, -800.0)),
        appearance: AppearanceRules {
            material: materials::DEBRIS,
            colors: &DEBRIS_PALETTE,
            radius: 1.5,
            radius_spread: 1.0,
            ..Default::default()
        },
        collision_mask: ContentFlags::MASK_SOLID,
        cone_angle_degrees: None,
    }
}

fn smoke_hull(speed: f32, lifetime_ms: u32) -> RegularHullParams {
    RegularHullParams {
        speed,
        speed_spike_chance: 0.1,
        max_speed_spike: 25.0,
        lifetime_ms,
        initial_color: [70, 70, 70, 140],
        timeline: &SMOKE_TIMELINE,
        archimedes_bottom_accel: 40.0,
        archimedes_top_accel: 80.0,
        xy_expansion_bottom_accel: 20.0,
        xy_expansion_top_accel: 5.0,
        material: materials::SMOKE,
        collision_mask: ContentFlags::MASK_SOLID,
    }
}

fn wave_hull(speed: f32) -> RegularHullParams {
    RegularHullParams {
        speed,
        lifetime_ms: 250,
        initial_color: [255, 255, 255, 64],
        timeline: &WAVE_TIMELINE,
        material: materials::WAVE,
        ..Default::default()
    }
}

fn explosion_light() -> Option<LightRules> {
    Some(LightRules {
        radius: 200.0,
        color: Vec3::new(1.0, 0.7, 0.3),
    })
}

/// Rocket explosion.
pub fn rocket_explosion() -> ExplosionPreset {
    ExplosionPreset {
        fire_hull: ConcentricHullParams {
            lifetime_ms: 600,
            bias_direction: Vec3::ZERO,
            layers: &ROCKET_FIRE_LAYERS,
            collision_mask: ContentFlags::MASK_SOLID,
        },
        smoke_hull: smoke_hull(45.0, 2200),
        wave_hull: wave_hull(500.0),
        sparks: ParticleEmitter {
            count: 48,
            fill: fill(250.0, 550.0, (250, 600), (0, 1), Vec3::new(0.0, 0.0, -600.0)),
            appearance: spark_appearance(6.0, explosion_light()),
            collision_mask: ContentFlags::MASK_SOLID,
            cone_angle_degrees: Some(75.0),
        },
        debris: debris_emitter(12),
        flash: SpriteParams {
            radius: 64.0,
            material: materials::FLASH,
            color: [255, 220, 160, 255],
            lifetime_ms: 120,
        },
        lift: 4.0,
    }
}

/// Grenade explosion.
pub fn grenade_explosion() -> ExplosionPreset {
    let mut preset = rocket_explosion();
    preset.fire_hull.lifetime_ms = 700;
    preset.fire_hull.layers = &GRENADE_FIRE_LAYERS;
    preset.smoke_hull = smoke_hull(55.0, 2600);
    preset.wave_hull = wave_hull(600.0);
    preset.sparks.count = 64;
    preset.sparks.cone_angle_degrees = Some(110.0);
    preset.debris = debris_emitter(24);
    preset.flash.radius = 80.0;
    preset.lift = 8.0;
    preset
}

/// Plasma bolt impact.
pub fn plasma_impact() -> ParticleEmitter {
    ParticleEmitter {
        count: 20,
        fill: fill(80.0, 180.0, (150, 350), (0, 0), Vec3::ZERO),
        appearance: AppearanceRules {
            material: materials::PLASMA,
            colors: &PLASMA_PALETTE,
            color_lifespan: Some(ColorLifespan::fade_out(PLASMA_PALETTE[0])),
            radius: 1.5,
            radius_spread: 0.5,
            light: Some(LightRules {
                radius: 96.0,
                color: Vec3::new(0.3, 0.6, 1.0),
            }),
            ..Default::default()
        },
        collision_mask: ContentFlags::MASK_SOLID,
        cone_angle_degrees: Some(60.0),
    }
}

/// Bullet impact sparks.
pub fn bullet_sparks() -> ParticleEmitter {
    ParticleEmitter {
        count: 10,
        fill: fill(200.0, 400.0, (200, 400), (1, 2), Vec3::new(0.0, 0.0, -800.0)),
        appearance: spark_appearance(3.0, None),
        collision_mask: ContentFlags::MASK_SOLID,
        cone_angle_degrees: Some(50.0),
    }
}

fn dust_appearance() -> AppearanceRules {
    AppearanceRules {
        material: materials::DUST,
        colors: &DUST_PALETTE,
        color_lifespan: Some(ColorLifespan::fade_out(DUST_PALETTE[0])),
        radius: 3.0,
        radius_spread: 1.5,
        ..Default::default()
    }
}

/// Dust kicked up by a bullet hitting a dusty surface.
pub fn bullet_dust() -> ParticleEmitter {
    ParticleEmitter {
        count: 8,
        fill: fill(10.0, 30.0, (500, 900), (0, 0), Vec3::new(0.0, 0.0, 20.0)),
        appearance: dust_appearance(),
        collision_mask: ContentFlags::empty(),
        cone_angle_degrees: Some(60.0),
    }
}

/// Dust raised by a player landing.
pub fn landing_dust() -> ParticleEmitter {
    ParticleEmitter {
        count: 16,
        fill: fill(20.0, 60.0, (400, 800), (0, 0), Vec3::new(0.0, 0.0, -20.0)),
        appearance: dust_appearance(),
        collision_mask: ContentFlags::empty(),
        cone_angle_degrees: Some(80.0),
    }
}

// ── Trails ─────────────────────────────────────────────────────────

/// Rocket and grenade smoke trail.
pub fn smoke_trail() -> ParticleTrailParams {
    ParticleTrailParams {
        appearance: AppearanceRules {
            material: materials::SMOKE,
            colors: &SMOKE_PALETTE,
            color_lifespan: Some(ColorLifespan::fade_out([90, 90, 90, 96])),
            radius: 4.0,
            radius_spread: 1.0,
            ..Default::default()
        },
        drop_distance: 12.0,
        max_particles_per_drop: 6,
        particle_lifetime_ms: 900,
        speed: 8.0,
        accel: Vec3::new(0.0, 0.0, 15.0),
        bounces: 0,
        collision_mask: ContentFlags::empty(),
    }
}

/// Rocket fire trail.
pub fn fire_trail() -> ParticleTrailParams {
    ParticleTrailParams {
        appearance: AppearanceRules {
            material: materials::FIRE,
            colors: &FIRE_PALETTE,
            color_lifespan: Some(ColorLifespan::fade_out(FIRE_PALETTE[1])),
            radius: 2.5,
            radius_spread: 0.5,
            light: Some(LightRules {
                radius: 64.0,
                color: Vec3::new(1.0, 0.6, 0.2),
            }),
            ..Default::default()
        },
        drop_distance: 8.0,
        max_particles_per_drop: 8,
        particle_lifetime_ms: 250,
        speed: 20.0,
        accel: Vec3::ZERO,
        bounces: 0,
        collision_mask: ContentFlags::empty(),
    }
}

/// Blaster bolt trail.
pub fn blast_trail() -> ParticleTrailParams {
    ParticleTrailParams {
        appearance: AppearanceRules {
            material: materials::PLASMA,
            colors: &PLASMA_PALETTE,
            color_lifespan: Some(ColorLifespan::fade_out(PLASMA_PALETTE[0])),
            radius: 1.5,
            ..Default::default()
        },
        drop_distance: 6.0,
        max_particles_per_drop: 8,
        particle_lifetime_ms: 200,
        speed: 5.0,
        ..Default::default()
    }
}

/// Footstep dust, dropped while a player runs on a dusty surface.
pub fn footstep_dust() -> ParticleTrailParams {
    ParticleTrailParams {
        appearance: dust_appearance(),
        drop_distance: 24.0,
        max_particles_per_drop: 3,
        particle_lifetime_ms: 600,
        speed: 15.0,
        accel: Vec3::new(0.0, 0.0, 10.0),
        bounces: 0,
        collision_mask: ContentFlags::empty(),
    }
}

/// Electro bolt ribbon.
pub fn electro_trail() -> PolyTrailParams {
    PolyTrailParams {
        min_point_distance: 6.0,
        max_points: 24,
        point_lifetime_ms: 250,
        width: 8.0,
        tile_length: 48.0,
        material: materials::ELECTRO,
        color: [160, 200, 255, 255],
    }
}

/// Continuous laser.
pub fn laser_beam() -> BeamParams {
    BeamParams {
        width: 3.0,
        tile_length: 0.0,
        material: materials::BEAM,
        color: [255, 60, 60, 255],
        fade_out_ms: 150,
    }
}

/// Railgun shot, colored per player.
pub fn railgun_beam(color: Rgba8) -> BeamParams {
    BeamParams {
        width: 5.0,
        tile_length: 0.0,
        material: materials::BEAM,
        color,
        fade_out_ms: 600,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::color::ALPHA;
    use cinder_hulls::MAX_LAYERS;

    #[test]
    fn cooling_palettes_are_less_opaque() {
        let fresh = FIRE_PALETTE.iter().map(|c| c[ALPHA]).min().unwrap();
        let cooling = FIRE_COOLING_PALETTE.iter().map(|c| c[ALPHA]).max().unwrap();
        let smoke = SMOKE_PALETTE.iter().map(|c| c[ALPHA]).max().unwrap();
        let faded = SMOKE_FADED_PALETTE.iter().map(|c| c[ALPHA]).max().unwrap();
        assert!(fresh > cooling && cooling > smoke && smoke > faded);
    }

    #[test]
    fn timelines_are_ordered() {
        for timeline in [&FIRE_TIMELINE[..], &SMOKE_TIMELINE[..], &WAVE_TIMELINE[..]] {
            assert!(timeline
                .windows(2)
                .all(|w| w[0].activate_at_lifetime_fraction < w[1].activate_at_lifetime_fraction));
        }
    }

    #[test]
    fn inner_layers_stop_further_from_walls() {
        for layers in [&ROCKET_FIRE_LAYERS, &GRENADE_FIRE_LAYERS] {
            assert!(layers.len() <= MAX_LAYERS);
            assert!(layers.windows(2).all(|w| w[0].final_offset < w[1].final_offset));
            assert!(layers.windows(2).all(|w| w[0].speed > w[1].speed));
        }
    }

    #[test]
    fn grenade_reuses_rocket_family() {
        let rocket = rocket_explosion();
        let grenade = grenade_explosion();
        assert_eq!(grenade.flash.material, rocket.flash.material);
        assert!(grenade.debris.count > rocket.debris.count);
        assert_eq!(grenade.fire_hull.layers.len(), 5);
    }
}
