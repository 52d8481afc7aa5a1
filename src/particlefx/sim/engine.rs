//! CPU 粒子模拟引擎
//!
//! 实例表容量固定；所有粒子共享一个全局粒子预算。
//! 粒子在世界空间模拟，每个粒子输出两个三角形。

use glam::{Quat, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::prototype::{quad_corners, sample_range, EmitterPrototype, ParticleFxPrototype};
use crate::config::ParticleFxConfig;
use crate::core::error::AnimationError;
use crate::particlefx::engine::{
    AnimationFetcher, BlendMode, EngineInstanceId, ParticleEngine, PrototypeId,
    RenderInstanceSink,
};
use crate::particlefx::vertex::{ParticleVertex, PARTICLE_VERTEX_SIZE, VERTICES_PER_PARTICLE};
use crate::render::render_object::{MaterialHandle, TextureHandle};

const FULL_UV: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const PARTICLE_BYTES: usize = PARTICLE_VERTEX_SIZE * VERTICES_PER_PARTICLE;

#[derive(Debug, Clone, Copy)]
struct Particle {
    position: Vec3,
    velocity: Vec3,
    age: f32,
    lifetime: f32,
    size: f32,
}

#[derive(Debug, Clone, Default)]
struct EmitterState {
    particles: Vec<Particle>,
    emission_accumulator: f32,
    elapsed: f32,
    spawning: bool,
}

impl EmitterState {
    fn reset(&mut self) {
        self.particles.clear();
        self.emission_accumulator = 0.0;
        self.elapsed = 0.0;
    }
}

#[derive(Debug, Clone)]
struct InstanceState {
    prototype: PrototypeId,
    position: Vec3,
    rotation: Quat,
    playing: bool,
    emitters: Vec<EmitterState>,
}

/// 一段共享渲染状态的连续顶点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRun {
    pub material: MaterialHandle,
    pub texture: TextureHandle,
    pub blend_mode: BlendMode,
    pub vertex_index: u32,
    pub vertex_count: u32,
}

/// 引擎统计
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuEngineStats {
    /// 当前存活粒子数
    pub alive_count: usize,
    /// 总发射数
    pub total_emitted: u64,
    /// 本帧写入顶点缓冲区的粒子数
    pub rendered_count: usize,
    /// 本帧动画查询次数
    pub animation_fetches: u32,
}

/// CPU 粒子模拟引擎
pub struct CpuParticleEngine {
    prototypes: Vec<Option<ParticleFxPrototype>>,
    instances: Vec<Option<InstanceState>>,
    max_particles: usize,
    rng: StdRng,
    runs: Vec<RenderRun>,
    stats: CpuEngineStats,
}

impl CpuParticleEngine {
    /// 创建引擎
    ///
    /// * `max_instances` - 实例表容量
    /// * `max_particles` - 所有实例共享的粒子预算
    pub fn new(max_instances: usize, max_particles: usize) -> Self {
        Self {
            prototypes: Vec::new(),
            instances: vec![None; max_instances],
            max_particles,
            rng: StdRng::from_entropy(),
            runs: Vec::new(),
            stats: CpuEngineStats::default(),
        }
    }

    /// 按世界配置创建
    pub fn from_config(config: &ParticleFxConfig) -> Self {
        Self::new(config.instance_capacity(), config.max_particle_count)
    }

    /// 使用固定随机种子（可复现的模拟）
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 注册原型
    pub fn register_prototype(&mut self, prototype: ParticleFxPrototype) -> PrototypeId {
        let id = PrototypeId(self.prototypes.len() as u32);
        self.prototypes.push(Some(prototype));
        id
    }

    /// 替换原型数据（资源热重载）；之后需要对实例调用 reload
    pub fn replace_prototype(&mut self, id: PrototypeId, prototype: ParticleFxPrototype) -> bool {
        match self.prototypes.get_mut(id.0 as usize) {
            Some(slot) if slot.is_some() => {
                *slot = Some(prototype);
                true
            }
            _ => false,
        }
    }

    pub fn prototype(&self, id: PrototypeId) -> Option<&ParticleFxPrototype> {
        self.prototypes.get(id.0 as usize).and_then(|p| p.as_ref())
    }

    /// 存活实例数
    pub fn instance_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_some()).count()
    }

    /// 实例当前是否在发射
    pub fn is_emitting(&self, instance: EngineInstanceId) -> bool {
        self.instance(instance)
            .map(|i| i.emitters.iter().any(|e| e.spawning))
            .unwrap_or(false)
    }

    /// 实例当前的存活粒子数
    pub fn particle_count(&self, instance: EngineInstanceId) -> usize {
        self.instance(instance)
            .map(|i| i.emitters.iter().map(|e| e.particles.len()).sum())
            .unwrap_or(0)
    }

    /// 实例的世界位置
    pub fn instance_position(&self, instance: EngineInstanceId) -> Option<Vec3> {
        self.instance(instance).map(|i| i.position)
    }

    pub fn instance_rotation(&self, instance: EngineInstanceId) -> Option<Quat> {
        self.instance(instance).map(|i| i.rotation)
    }

    pub fn stats(&self) -> CpuEngineStats {
        self.stats
    }

    /// 上一次更新生成的渲染段
    pub fn runs(&self) -> &[RenderRun] {
        &self.runs
    }

    fn instance(&self, id: EngineInstanceId) -> Option<&InstanceState> {
        self.instances.get(id.0 as usize).and_then(|i| i.as_ref())
    }

    fn instance_mut(&mut self, id: EngineInstanceId) -> Option<&mut InstanceState> {
        self.instances.get_mut(id.0 as usize).and_then(|i| i.as_mut())
    }

    fn emitter_states(prototype: &ParticleFxPrototype, spawning: bool) -> Vec<EmitterState> {
        prototype
            .emitters
            .iter()
            .map(|_| EmitterState {
                spawning,
                ..Default::default()
            })
            .collect()
    }

    /// 推进模拟：发射、老化、积分
    fn simulate(&mut self, dt: f32) {
        let mut alive: usize = self
            .instances
            .iter()
            .flatten()
            .flat_map(|i| i.emitters.iter())
            .map(|e| e.particles.len())
            .sum();

        for instance in self.instances.iter_mut().flatten() {
            let prototype = match self.prototypes.get(instance.prototype.0 as usize) {
                Some(Some(prototype)) => prototype,
                _ => continue,
            };

            for (emitter, state) in prototype.emitters.iter().zip(instance.emitters.iter_mut()) {
                let before = state.particles.len();
                state.particles.retain_mut(|p| {
                    p.age += dt;
                    p.age < p.lifetime
                });
                alive -= before - state.particles.len();

                let damping = (1.0 - emitter.drag * dt).max(0.0);
                for p in &mut state.particles {
                    p.velocity = (p.velocity + emitter.gravity * dt) * damping;
                    p.position += p.velocity * dt;
                }

                if !state.spawning {
                    continue;
                }

                state.elapsed += dt;
                state.emission_accumulator += emitter.emission_rate * dt;
                let mut count = state.emission_accumulator.floor().max(0.0) as usize;
                state.emission_accumulator -= count as f32;

                let emitter_room = (emitter.max_particles as usize).saturating_sub(state.particles.len());
                let global_room = self.max_particles.saturating_sub(alive);
                count = count.min(emitter_room).min(global_room);

                for _ in 0..count {
                    let (position, velocity) =
                        emitter.spawn(&mut self.rng, instance.position, instance.rotation);
                    state.particles.push(Particle {
                        position,
                        velocity,
                        age: 0.0,
                        lifetime: sample_range(&mut self.rng, &emitter.lifetime),
                        size: sample_range(&mut self.rng, &emitter.start_size),
                    });
                }
                alive += count;
                self.stats.total_emitted += count as u64;

                if let Some(duration) = emitter.duration {
                    if state.elapsed >= duration {
                        if emitter.looping {
                            state.elapsed -= duration;
                        } else {
                            state.spawning = false;
                        }
                    }
                }
            }
        }

        self.stats.alive_count = alive;
    }

    fn push_run(
        runs: &mut Vec<RenderRun>,
        emitter: &EmitterPrototype,
        texture: TextureHandle,
        vertex_index: u32,
        vertex_count: u32,
    ) {
        if vertex_count == 0 {
            return;
        }
        if let Some(last) = runs.last_mut() {
            if last.material == emitter.material
                && last.texture == texture
                && last.blend_mode == emitter.blend_mode
                && last.vertex_index + last.vertex_count == vertex_index
            {
                last.vertex_count += vertex_count;
                return;
            }
        }
        runs.push(RenderRun {
            material: emitter.material,
            texture,
            blend_mode: emitter.blend_mode,
            vertex_index,
            vertex_count,
        });
    }

    /// 写入顶点并生成渲染段
    fn write_vertices(&mut self, vertex_buffer: &mut [u8], fetch: &dyn AnimationFetcher) -> usize {
        self.runs.clear();
        self.stats.rendered_count = 0;
        self.stats.animation_fetches = 0;

        let mut offset = 0;
        'instances: for instance in self.instances.iter().flatten() {
            let prototype = match self.prototypes.get(instance.prototype.0 as usize) {
                Some(Some(prototype)) => prototype,
                _ => continue,
            };

            for (emitter, state) in prototype.emitters.iter().zip(instance.emitters.iter()) {
                if state.particles.is_empty() {
                    continue;
                }

                let animation = match &emitter.tile_animation {
                    Some(source) => {
                        self.stats.animation_fetches += 1;
                        match fetch.fetch_animation(&source.tile_source, source.animation) {
                            Ok(data) => Some(data),
                            Err(AnimationError::NotFound) => {
                                tracing::trace!(
                                    target: "particlefx",
                                    "Animation {:?} not found, using full texture",
                                    source.animation
                                );
                                None
                            }
                            Err(AnimationError::UnknownError) => {
                                tracing::warn!(
                                    target: "particlefx",
                                    "Tile source for animation {:?} is not ready, emitter skipped",
                                    source.animation
                                );
                                continue;
                            }
                        }
                    }
                    None => None,
                };
                let texture = animation.map(|a| a.texture).unwrap_or(emitter.texture);

                let first_vertex = (offset / PARTICLE_VERTEX_SIZE) as u32;
                let mut written_particles = 0u32;
                let mut out_of_space = false;

                for particle in &state.particles {
                    if offset + PARTICLE_BYTES > vertex_buffer.len() {
                        out_of_space = true;
                        break;
                    }

                    let t = if particle.lifetime > 0.0 {
                        particle.age / particle.lifetime
                    } else {
                        1.0
                    };
                    let alpha = emitter.alpha_at(t);
                    let size = emitter.size_at(particle.size, t);
                    let [u0, v0, u1, v1] = animation
                        .and_then(|a| a.tile_uv(a.tile_at(particle.age)))
                        .unwrap_or(FULL_UV);

                    let c = quad_corners(size, instance.rotation).map(|c| particle.position + c);
                    let vertex = |p: Vec3, u: f32, v: f32| ParticleVertex {
                        position: p.to_array(),
                        uv: [u, v],
                        alpha,
                    };
                    let quad = [
                        vertex(c[0], u0, v1),
                        vertex(c[1], u1, v1),
                        vertex(c[2], u1, v0),
                        vertex(c[0], u0, v1),
                        vertex(c[2], u1, v0),
                        vertex(c[3], u0, v0),
                    ];
                    vertex_buffer[offset..offset + PARTICLE_BYTES]
                        .copy_from_slice(bytemuck::cast_slice(&quad));
                    offset += PARTICLE_BYTES;
                    written_particles += 1;
                }

                Self::push_run(
                    &mut self.runs,
                    emitter,
                    texture,
                    first_vertex,
                    written_particles * VERTICES_PER_PARTICLE as u32,
                );
                self.stats.rendered_count += written_particles as usize;

                if out_of_space {
                    tracing::warn!(
                        target: "particlefx",
                        "Particle vertex buffer is full, remaining particles dropped this frame"
                    );
                    break 'instances;
                }
            }
        }

        offset
    }
}

impl ParticleEngine for CpuParticleEngine {
    fn create_instance(&mut self, prototype: PrototypeId) -> Option<EngineInstanceId> {
        let emitters = Self::emitter_states(self.prototype(prototype)?, false);
        let slot = self.instances.iter().position(|i| i.is_none())?;
        self.instances[slot] = Some(InstanceState {
            prototype,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            playing: false,
            emitters,
        });
        Some(EngineInstanceId(slot as u32))
    }

    fn destroy_instance(&mut self, instance: EngineInstanceId) {
        if let Some(slot) = self.instances.get_mut(instance.0 as usize) {
            *slot = None;
        }
    }

    fn start_instance(&mut self, instance: EngineInstanceId) {
        if let Some(state) = self.instance_mut(instance) {
            state.playing = true;
            for emitter in &mut state.emitters {
                if !emitter.spawning {
                    emitter.spawning = true;
                    emitter.elapsed = 0.0;
                }
            }
        }
    }

    fn restart_instance(&mut self, instance: EngineInstanceId) {
        if let Some(state) = self.instance_mut(instance) {
            state.playing = true;
            for emitter in &mut state.emitters {
                emitter.reset();
                emitter.spawning = true;
            }
        }
    }

    fn stop_instance(&mut self, instance: EngineInstanceId) {
        if let Some(state) = self.instance_mut(instance) {
            state.playing = false;
            for emitter in &mut state.emitters {
                emitter.spawning = false;
            }
        }
    }

    fn reload_instance(&mut self, instance: EngineInstanceId) {
        let prototype_id = match self.instance(instance) {
            Some(state) => state.prototype,
            None => return,
        };
        let emitters = match self.prototypes.get(prototype_id.0 as usize) {
            Some(Some(prototype)) => prototype.emitters.len(),
            _ => return,
        };
        if let Some(state) = self.instance_mut(instance) {
            let spawning = state.playing;
            state.emitters = (0..emitters)
                .map(|_| EmitterState {
                    spawning,
                    ..Default::default()
                })
                .collect();
        }
    }

    fn set_position(&mut self, instance: EngineInstanceId, position: Vec3) {
        if let Some(state) = self.instance_mut(instance) {
            state.position = position;
        }
    }

    fn set_rotation(&mut self, instance: EngineInstanceId, rotation: Quat) {
        if let Some(state) = self.instance_mut(instance) {
            state.rotation = rotation;
        }
    }

    fn update(
        &mut self,
        dt: f32,
        vertex_buffer: &mut [u8],
        fetch_animation: &dyn AnimationFetcher,
    ) -> usize {
        self.simulate(dt);
        self.write_vertices(vertex_buffer, fetch_animation)
    }

    fn render(&mut self, sink: &mut dyn RenderInstanceSink) {
        for run in &self.runs {
            sink.render_instance(
                run.material,
                run.texture,
                run.blend_mode,
                run.vertex_index,
                run.vertex_count,
            );
        }
    }

    fn debug_render(&self, draw_line: &mut dyn FnMut(Vec3, Vec3, Vec4)) {
        for instance in self.instances.iter().flatten() {
            let color = if instance.playing {
                Vec4::new(0.0, 1.0, 0.0, 1.0)
            } else {
                Vec4::new(1.0, 0.0, 0.0, 1.0)
            };
            let p = instance.position;
            for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                let arm = instance.rotation * axis * 0.5;
                draw_line(p - arm, p + arm, color);
            }
        }
    }
}
