//! 粒子特效组件
//!
//! - `pool` - 固定容量的实例池
//! - `world` - 每帧驱动（变换同步、模拟、上传、批次转发）
//! - `batch` - 渲染批次收集与混合因子映射
//! - `animation` - 瓦片动画查询
//! - `message` - 控制消息路由
//! - `engine` - 模拟引擎接口
//! - `sim` - 参考 CPU 模拟引擎

pub mod animation;
pub mod batch;
pub mod engine;
pub mod message;
pub mod pool;
pub mod sim;
pub mod vertex;
pub mod world;

pub use animation::{
    resolve_animation, AnimationData, AnimationId, Playback, TileAnimation,
    TileSetAnimationResolver, TileSource,
};
pub use batch::{blend_factors, set_blend_factors, BatchEmitter};
pub use engine::{
    AnimationFetcher, BlendMode, EngineInstanceId, ParticleEngine, PrototypeId,
    RenderInstanceSink,
};
pub use message::{route_message, route_named, MessageOutcome, ParticleFxMessage};
pub use pool::{EmitterComponent, EmitterPool, ParticleFxHandle, WorldId};
pub use sim::{CpuParticleEngine, EmitterPrototype, ParticleFxPrototype, ParticleShape};
pub use vertex::{ParticleVertex, PARTICLE_VERTEX_ELEMENTS, PARTICLE_VERTEX_SIZE, VERTICES_PER_PARTICLE};
pub use world::{EmitterWorld, FrameStats};

#[cfg(test)]
mod property_tests;
