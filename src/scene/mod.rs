//! 场景图协作接口
//!
//! 粒子特效只需要从场景图读取宿主对象的世界位置和世界旋转。
//! 宿主对象用 `bevy_ecs` 的 `Entity` 标识，不持有所有权。

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};

/// 场景图查询接口
pub trait SceneGraph {
    /// 宿主对象的世界位置
    fn world_position(&self, object: Entity) -> Vec3;
    /// 宿主对象的世界旋转
    fn world_rotation(&self, object: Entity) -> Quat;
}

/// 已解算的世界变换组件
///
/// 由场景层级系统写入；粒子特效每帧只读。
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl WorldTransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

impl SceneGraph for World {
    fn world_position(&self, object: Entity) -> Vec3 {
        match self.get::<WorldTransform>(object) {
            Some(transform) => transform.position,
            None => {
                tracing::trace!(target: "particlefx", "Object {:?} has no world transform", object);
                Vec3::ZERO
            }
        }
    }

    fn world_rotation(&self, object: Entity) -> Quat {
        self.get::<WorldTransform>(object)
            .map(|transform| transform.rotation)
            .unwrap_or(Quat::IDENTITY)
    }
}
