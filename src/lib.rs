//! # ParticleFX
//!
//! Per-frame particle effect component: owns a fixed-capacity pool of effect
//! instances attached to scene objects, drives a particle simulation engine,
//! streams the generated vertices to the GPU and hands draw batches to the
//! renderer.
//!
//! ## Features
//!
//! - **Emitter Pool**: Fixed-capacity instance storage with generation-checked handles
//! - **Frame Orchestration**: Transform sync, simulation, single vertex upload per frame
//! - **Render Batching**: Blend mode translation into render object descriptors
//! - **Tile Animation**: Flipbook lookup from tile sources with flip support
//! - **Message Routing**: `start` / `restart` / `stop` control messages
//! - **Reference Engine**: CPU particle simulation with a shared particle budget
//!
//! ## Architecture Design
//!
//! The component follows the same split as the rest of the engine:
//! - **State**: [`particlefx::EmitterPool`] and per-world buffers are plain data
//! - **Service**: the simulation sits behind the [`particlefx::ParticleEngine`] trait
//! - **Orchestration**: [`particlefx::EmitterWorld::update`] runs once per frame
//!
//! ### Example
//!
//! ```ignore
//! use particlefx::particlefx::{CpuParticleEngine, EmitterWorld, ParticleFxPrototype};
//!
//! let mut engine = CpuParticleEngine::from_config(&config);
//! let smoke = engine.register_prototype(ParticleFxPrototype::new(vec![emitter]));
//! let mut world = EmitterWorld::new(config, engine, &mut graphics)?;
//! let handle = world.create(entity, smoke)?;
//! world.on_message(handle, "start")?;
//! world.update(dt, &bevy_world, &mut graphics, &mut renderer)?;
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Errors, logging and shared macros
//! - [`config`]: World configuration
//! - [`scene`]: Scene graph transform lookup
//! - [`render`]: Graphics device and render object abstractions
//! - [`particlefx`]: Pool, frame orchestration, batching, animation, messages

/// Errors, logging and shared macros
#[macro_use]
pub mod core;
/// Configuration system
pub mod config;
/// Scene graph transform lookup
pub mod scene;
/// Graphics device and render object abstractions
pub mod render;
/// Particle effect component
pub mod particlefx;

pub use crate::config::ParticleFxConfig;
pub use crate::core::error::{ParticleFxError, ParticleFxResult};
