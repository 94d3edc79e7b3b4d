//! Short-lived camera-facing sprites such as explosion flashes.
//!
//! Sprites do not move or collide. They sit in a fixed pool, fade out
//! linearly, and are submitted as scene entities.

use cinder_arena::{ArenaError, FreelistAllocator};
use cinder_core::color::ALPHA;
use cinder_core::{EntitySubmission, MaterialId, Rgba8, SceneSink};
use glam::Vec3;

/// What a sprite looks like and how long it stays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteParams {
    /// Sprite radius.
    pub radius: f32,
    /// Sprite material.
    pub material: MaterialId,
    /// Color at spawn.
    pub color: Rgba8,
    /// Lifetime in milliseconds.
    pub lifetime_ms: u32,
}

#[derive(Clone, Copy, Debug)]
struct Sprite {
    origin: Vec3,
    rotation: f32,
    params: SpriteParams,
    spawn_time: i64,
    expires_at: i64,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            rotation: 0.0,
            params: SpriteParams {
                radius: 0.0,
                material: MaterialId::default(),
                color: [0; 4],
                lifetime_ms: 0,
            },
            spawn_time: 0,
            expires_at: 0,
        }
    }
}

/// Per-frame sprite counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SpriteFrameStats {
    pub live: usize,
    pub submitted: usize,
}

/// Fixed pool of transient sprites; full pools evict the soonest-to-expire.
pub(crate) struct SpritePool {
    sprites: FreelistAllocator<Sprite>,
    total_evictions: u64,
}

impl SpritePool {
    pub(crate) fn new(capacity: usize) -> Result<Self, ArenaError> {
        let sprites = FreelistAllocator::try_new(capacity, Sprite::default)?;
        log::info!("sprite pool: {capacity} sprites");
        Ok(Self {
            sprites,
            total_evictions: 0,
        })
    }

    pub(crate) fn spawn(&mut self, origin: Vec3, rotation: f32, params: &SpriteParams, current_time: i64) {
        let (slot, evicted) = self.sprites.alloc_or_evict(|s| s.expires_at, |_| {});
        if evicted {
            self.total_evictions += 1;
        }
        if let Some(sprite) = self.sprites.get_mut(slot) {
            *sprite = Sprite {
                origin,
                rotation,
                params: *params,
                spawn_time: current_time,
                expires_at: current_time + i64::from(params.lifetime_ms),
            };
        }
    }

    pub(crate) fn total_evictions(&self) -> u64 {
        self.total_evictions
    }

    pub(crate) fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Free expired sprites, then submit the rest.
    pub(crate) fn simulate_and_submit(&mut self, scene: &mut dyn SceneSink, current_time: i64) -> SpriteFrameStats {
        let mut cursor = self.sprites.first_live();
        while let Some(slot) = cursor {
            cursor = self.sprites.next_live(slot);
            if self.sprites.get(slot).is_some_and(|s| s.expires_at <= current_time) {
                self.sprites.free(slot);
            }
        }

        let mut submitted = 0;
        for (_, sprite) in self.sprites.iter() {
            let lifetime = (sprite.expires_at - sprite.spawn_time).max(1) as f32;
            let remaining = 1.0 - (current_time - sprite.spawn_time) as f32 / lifetime;
            let mut color = sprite.params.color;
            color[ALPHA] = (f32::from(color[ALPHA]) * remaining.clamp(0.0, 1.0)).round() as u8;
            if color[ALPHA] == 0 {
                continue;
            }
            scene.add_entity(&EntitySubmission {
                material: sprite.params.material,
                origin: sprite.origin,
                radius: sprite.params.radius,
                rotation: sprite.rotation,
                color,
            });
            submitted += 1;
        }
        SpriteFrameStats {
            live: self.sprites.len(),
            submitted,
        }
    }
}
