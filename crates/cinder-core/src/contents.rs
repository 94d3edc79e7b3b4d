//! Content and surface flag sets reported by collision traces.

use bitflags::bitflags;

bitflags! {
    /// What a volume of the world is made of.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ContentFlags: u32 {
        /// Opaque solid geometry.
        const SOLID = 1 << 0;
        /// Lava volume.
        const LAVA = 1 << 3;
        /// Slime volume.
        const SLIME = 1 << 4;
        /// Water volume.
        const WATER = 1 << 5;
        /// Clip brushes that only block players.
        const PLAYER_CLIP = 1 << 16;
        /// Clip brushes that only block monsters.
        const MONSTER_CLIP = 1 << 17;

        /// Everything effects collide with.
        const MASK_SOLID = Self::SOLID.bits();
        /// All liquid volumes.
        const MASK_WATER = Self::WATER.bits() | Self::LAVA.bits() | Self::SLIME.bits();
    }
}

impl ContentFlags {
    /// Whether any liquid bit is set.
    pub fn is_liquid(self) -> bool {
        self.intersects(Self::MASK_WATER)
    }
}

bitflags! {
    /// Surface attributes of the plane hit by a trace.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: u32 {
        /// Sky portal; effects vanish into it.
        const SKY = 1 << 2;
        /// Surface refuses decals.
        const NO_MARKS = 1 << 5;
        /// Dusty surface; impacts kick up a puff.
        const DUST = 1 << 8;
        /// Metallic surface.
        const METAL = 1 << 9;
        /// Flesh.
        const FLESH = 1 << 10;
    }
}
