//! 参考 CPU 粒子模拟

pub mod engine;
pub mod prototype;

pub use engine::{CpuEngineStats, CpuParticleEngine, RenderRun};
pub use prototype::{
    EmitterPrototype, ParticleFxPrototype, ParticleShape, SizeOverLifetime, TileAnimationSource,
};
