//! 粒子模拟引擎接口
//!
//! 模拟数学（发射形状、物理、曲线）由引擎负责；本组件只驱动引擎：
//! 推送变换、调用更新/渲染入口，并接收引擎决定的批次边界。

use glam::{Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::animation::{AnimationData, AnimationId, TileSource};
use crate::core::error::AnimationResult;
use crate::render::render_object::{MaterialHandle, TextureHandle};

/// 引擎中已注册的特效原型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrototypeId(pub u32);

/// 引擎内部实例表中的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineInstanceId(pub u32);

/// 粒子混合模式（引擎原生值）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Alpha,
    Add,
    AddAlpha,
    Mult,
    /// 数据中出现的未知取值
    Unknown(u32),
}

impl BlendMode {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => BlendMode::Alpha,
            1 => BlendMode::Add,
            2 => BlendMode::AddAlpha,
            3 => BlendMode::Mult,
            other => BlendMode::Unknown(other),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            BlendMode::Alpha => 0,
            BlendMode::Add => 1,
            BlendMode::AddAlpha => 2,
            BlendMode::Mult => 3,
            BlendMode::Unknown(other) => other,
        }
    }
}

/// 瓦片动画查询回调
///
/// 引擎在更新过程中遇到瓦片纹理源时同步调用。
pub trait AnimationFetcher {
    fn fetch_animation<'a>(
        &self,
        tile_source: &'a TileSource,
        animation: AnimationId,
    ) -> AnimationResult<AnimationData<'a>>;
}

/// 渲染回调：每段共享材质、纹理、混合模式的连续粒子调用一次
pub trait RenderInstanceSink {
    fn render_instance(
        &mut self,
        material: MaterialHandle,
        texture: TextureHandle,
        blend_mode: BlendMode,
        vertex_index: u32,
        vertex_count: u32,
    );
}

/// 模拟引擎上下文
pub trait ParticleEngine {
    /// 创建绑定到原型的实例；引擎无法容纳时返回 `None`
    fn create_instance(&mut self, prototype: PrototypeId) -> Option<EngineInstanceId>;
    fn destroy_instance(&mut self, instance: EngineInstanceId);

    fn start_instance(&mut self, instance: EngineInstanceId);
    /// 重置模拟状态并开始发射
    fn restart_instance(&mut self, instance: EngineInstanceId);
    /// 停止发射新粒子，已有粒子按各自生命周期继续
    fn stop_instance(&mut self, instance: EngineInstanceId);
    /// 按更新后的原型数据重新初始化
    fn reload_instance(&mut self, instance: EngineInstanceId);

    fn set_position(&mut self, instance: EngineInstanceId, position: Vec3);
    fn set_rotation(&mut self, instance: EngineInstanceId, rotation: Quat);

    /// 推进模拟并把所有存活粒子的顶点写入 `vertex_buffer`，返回实际写入的字节数
    fn update(
        &mut self,
        dt: f32,
        vertex_buffer: &mut [u8],
        fetch_animation: &dyn AnimationFetcher,
    ) -> usize;

    /// 报告上一次更新写入的批次
    fn render(&mut self, sink: &mut dyn RenderInstanceSink);

    /// 绘制引擎内部的调试几何
    fn debug_render(&self, draw_line: &mut dyn FnMut(Vec3, Vec3, Vec4));
}
