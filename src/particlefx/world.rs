//! 粒子特效世界与每帧驱动
//!
//! 每帧流程：
//!
//! ```text
//! 场景图变换 ──► 引擎 set_position/set_rotation
//!                     │
//!            engine.update(dt, 暂存缓冲区)  ──► 动画查询（按需）
//!                     │
//!            engine.render(BatchEmitter)    ──► RenderObject 列表
//!                     │
//!            一次性上传暂存缓冲区 ──► 转发批次 ──► (可选) 调试线
//! ```
//!
//! 所有操作在一次调用内同步完成，调度器保证帧之间不重叠。

use bevy_ecs::entity::Entity;

use super::animation::TileSetAnimationResolver;
use super::batch::BatchEmitter;
use super::engine::{AnimationFetcher, ParticleEngine, PrototypeId};
use super::message::{route_message, route_named, MessageOutcome, ParticleFxMessage};
use super::pool::{EmitterComponent, EmitterPool, ParticleFxHandle, WorldId};
use super::vertex::{vertex_buffer_size, PARTICLE_VERTEX_ELEMENTS, PARTICLE_VERTEX_SIZE};
use crate::config::ParticleFxConfig;
use crate::core::error::{ParticleFxError, ParticleFxResult};
use crate::render::graphics::{
    BufferUsage, GraphicsDevice, VertexBufferHandle, VertexDeclarationHandle,
};
use crate::render::render_object::{RenderObject, RenderSink};
use crate::scene::SceneGraph;

/// 单帧统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// 本帧更新的实例数
    pub instance_count: usize,
    /// 引擎写入的字节数
    pub bytes_written: usize,
    pub vertex_count: usize,
    pub batch_count: usize,
    /// 混合模式无法识别的批次数
    pub unknown_blend_modes: u32,
}

/// 粒子特效世界
///
/// 拥有实例池、引擎上下文、顶点暂存缓冲区及其 GPU 对应物。
/// GPU 资源需要通过 [`EmitterWorld::delete`] 释放。
pub struct EmitterWorld<E: ParticleEngine> {
    id: WorldId,
    config: ParticleFxConfig,
    pool: EmitterPool,
    engine: E,
    animation_fetcher: Box<dyn AnimationFetcher>,
    client_buffer: Vec<u8>,
    vertex_buffer: VertexBufferHandle,
    vertex_declaration: VertexDeclarationHandle,
    render_objects: Vec<RenderObject>,
    stats: FrameStats,
}

impl<E: ParticleEngine> EmitterWorld<E> {
    /// 创建世界并分配图形资源
    pub fn new(
        config: ParticleFxConfig,
        engine: E,
        graphics: &mut dyn GraphicsDevice,
    ) -> ParticleFxResult<Self> {
        config.validate()?;

        let capacity = config.instance_capacity();
        if capacity < config.max_instance_count {
            tracing::warn!(
                target: "particlefx",
                "max_instance_count {} clamped to {}",
                config.max_instance_count,
                capacity
            );
        }

        let buffer_size = vertex_buffer_size(config.max_particle_count);
        let vertex_buffer = graphics.new_vertex_buffer(buffer_size, None, BufferUsage::StreamDraw)?;
        let vertex_declaration = match graphics.new_vertex_declaration(&PARTICLE_VERTEX_ELEMENTS) {
            Ok(declaration) => declaration,
            Err(e) => {
                graphics.delete_vertex_buffer(vertex_buffer);
                return Err(e.into());
            }
        };

        let id = WorldId::next();
        tracing::debug!(
            target: "particlefx",
            "Created particle world {:?} ({} instances, {} byte vertex buffer)",
            id,
            capacity,
            buffer_size
        );

        Ok(Self {
            id,
            config,
            pool: EmitterPool::new(id, capacity),
            engine,
            animation_fetcher: Box::new(TileSetAnimationResolver),
            client_buffer: vec![0; buffer_size],
            vertex_buffer,
            vertex_declaration,
            render_objects: Vec::with_capacity(capacity),
            stats: FrameStats::default(),
        })
    }

    /// 替换动画查询实现
    pub fn with_animation_fetcher(mut self, fetcher: Box<dyn AnimationFetcher>) -> Self {
        self.animation_fetcher = fetcher;
        self
    }

    /// 销毁世界：释放所有引擎实例和图形资源
    pub fn delete(mut self, graphics: &mut dyn GraphicsDevice) -> E {
        for component in self.pool.iter() {
            self.engine.destroy_instance(component.instance);
        }
        graphics.delete_vertex_buffer(self.vertex_buffer);
        graphics.delete_vertex_declaration(self.vertex_declaration);
        tracing::debug!(target: "particlefx", "Deleted particle world {:?}", self.id);
        self.engine
    }

    /// 为宿主对象创建特效实例
    ///
    /// 池满、对象已挂载或引擎拒绝时返回错误，池和引擎都不发生变化。
    pub fn create(
        &mut self,
        owner: Entity,
        prototype: PrototypeId,
    ) -> ParticleFxResult<ParticleFxHandle> {
        if self.pool.is_full() {
            tracing::error!(
                target: "particlefx",
                "Particle component buffer is full ({}), component disregarded.",
                self.pool.capacity()
            );
            return Err(ParticleFxError::CapacityExceeded {
                capacity: self.pool.capacity(),
            });
        }
        if self.pool.contains_owner(owner) {
            tracing::error!(
                target: "particlefx",
                "Object {:?} already hosts a particle effect, component disregarded.",
                owner
            );
            return Err(ParticleFxError::AlreadyAttached(owner));
        }

        let instance = self
            .engine
            .create_instance(prototype)
            .ok_or(ParticleFxError::EngineRejected)?;
        match self.pool.insert(owner, instance) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                self.engine.destroy_instance(instance);
                Err(e)
            }
        }
    }

    /// 按宿主对象销毁实例
    ///
    /// 找不到时说明场景图与池不同步；记录错误但不影响其他实例。
    pub fn destroy(&mut self, owner: Entity) -> ParticleFxResult<()> {
        match self.pool.remove_owner(owner) {
            Some(component) => {
                self.engine.destroy_instance(component.instance);
                Ok(())
            }
            None => {
                tracing::error!(
                    target: "particlefx",
                    "Destroyed emitter could not be found, something is fishy."
                );
                Err(ParticleFxError::NotFoundOnDestroy(owner))
            }
        }
    }

    /// 按句柄销毁实例
    pub fn destroy_handle(&mut self, handle: ParticleFxHandle) -> ParticleFxResult<()> {
        let component = self.pool.remove(handle)?;
        self.engine.destroy_instance(component.instance);
        Ok(())
    }

    /// 每帧更新
    pub fn update(
        &mut self,
        dt: f32,
        scene: &dyn SceneGraph,
        graphics: &mut dyn GraphicsDevice,
        renderer: &mut dyn RenderSink,
    ) -> ParticleFxResult<()> {
        if self.pool.is_empty() {
            self.render_objects.clear();
            self.stats = FrameStats::default();
            return Ok(());
        }

        for component in self.pool.iter() {
            let position = scene.world_position(component.owner);
            self.engine.set_position(component.instance, position);
            self.engine
                .set_rotation(component.instance, scene.world_rotation(component.owner));
        }

        // 批次在 render 回调中重新填充
        self.render_objects.clear();

        let bytes_written = self
            .engine
            .update(dt, &mut self.client_buffer, self.animation_fetcher.as_ref())
            .min(self.client_buffer.len());

        let unknown_blend_modes = {
            let mut emitter = BatchEmitter::new(
                &mut self.render_objects,
                self.vertex_buffer,
                self.vertex_declaration,
            );
            self.engine.render(&mut emitter);
            emitter.unknown_blend_modes()
        };

        let upload = graphics
            .set_vertex_buffer_data(self.vertex_buffer, &[], BufferUsage::StreamDraw)
            .and_then(|()| {
                graphics.set_vertex_buffer_data(
                    self.vertex_buffer,
                    &self.client_buffer[..bytes_written],
                    BufferUsage::StreamDraw,
                )
            });
        if let Err(e) = upload {
            // 本帧没有可提交的批次
            self.render_objects.clear();
            self.stats = FrameStats::default();
            return Err(e.into());
        }

        for ro in &self.render_objects {
            renderer.add_to_render(ro);
        }

        if self.config.debug {
            self.engine
                .debug_render(&mut |start, end, color| renderer.draw_line(start, end, color));
        }

        self.stats = FrameStats {
            instance_count: self.pool.len(),
            bytes_written,
            vertex_count: bytes_written / PARTICLE_VERTEX_SIZE,
            batch_count: self.render_objects.len(),
            unknown_blend_modes,
        };
        Ok(())
    }

    /// 处理发给实例的命名消息，未知名称被忽略
    pub fn on_message(
        &mut self,
        handle: ParticleFxHandle,
        message_id: &str,
    ) -> ParticleFxResult<MessageOutcome> {
        let instance = self.pool.get(handle)?.instance;
        Ok(route_named(&mut self.engine, instance, message_id))
    }

    /// 发送已解析的消息
    pub fn post_message(
        &mut self,
        handle: ParticleFxHandle,
        message: ParticleFxMessage,
    ) -> ParticleFxResult<()> {
        let instance = self.pool.get(handle)?.instance;
        route_message(&mut self.engine, instance, message);
        Ok(())
    }

    /// 资源热重载后重新初始化实例
    pub fn on_reload(&mut self, handle: ParticleFxHandle) -> ParticleFxResult<()> {
        let instance = self.pool.get(handle)?.instance;
        self.engine.reload_instance(instance);
        Ok(())
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn config(&self) -> &ParticleFxConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn instance(&self, handle: ParticleFxHandle) -> ParticleFxResult<&EmitterComponent> {
        self.pool.get(handle)
    }

    /// 按池顺序遍历存活实例
    pub fn instances(&self) -> impl Iterator<Item = &EmitterComponent> {
        self.pool.iter()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// 最近一帧生成的批次，上传失败时为空
    pub fn render_objects(&self) -> &[RenderObject] {
        &self.render_objects
    }

    /// 最近一帧的统计；上传失败的帧记为默认值
    pub fn last_frame_stats(&self) -> FrameStats {
        self.stats
    }

    pub fn vertex_buffer(&self) -> VertexBufferHandle {
        self.vertex_buffer
    }

    pub fn vertex_declaration(&self) -> VertexDeclarationHandle {
        self.vertex_declaration
    }

    /// 暂存缓冲区容量（字节）
    pub fn vertex_buffer_capacity(&self) -> usize {
        self.client_buffer.len()
    }
}
