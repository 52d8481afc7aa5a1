//! 发射器池
//!
//! 固定容量的槽位数组加一个紧凑索引表：
//!
//! ```text
//! slots:  [ gen=3 -> dense 1 ][ gen=1 -> free ][ gen=2 -> dense 0 ] ...
//! dense:  [ slot 2 | owner A | instance 7 ][ slot 0 | owner B | instance 4 ]
//! ```
//!
//! - 句柄指向槽位，带代数校验，结构变化后依然有效或被明确拒绝
//! - 紧凑表决定遍历顺序，删除时与末尾交换，因此顺序不稳定
//! - 位置索引不对外暴露；跨帧只能保存 [`ParticleFxHandle`]

use std::sync::atomic::{AtomicU32, Ordering};

use bevy_ecs::entity::Entity;

use super::engine::EngineInstanceId;
use crate::core::error::{ParticleFxError, ParticleFxResult};

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

/// 粒子特效世界标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(u32);

impl WorldId {
    /// 分配一个进程内唯一的标识
    pub fn next() -> Self {
        WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 特效实例句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleFxHandle {
    world: WorldId,
    slot: u32,
    generation: u32,
}

impl ParticleFxHandle {
    /// 所属世界
    pub fn world(&self) -> WorldId {
        self.world
    }
}

/// 一个存活的特效实例
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterComponent {
    /// 宿主对象（仅用于变换查询和销毁匹配）
    pub owner: Entity,
    /// 引擎实例
    pub instance: EngineInstanceId,
    /// 所属世界，创建时设置，之后不变
    pub world: WorldId,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    dense_index: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct DenseEntry {
    slot: u32,
    component: EmitterComponent,
}

/// 固定容量发射器池
#[derive(Debug)]
pub struct EmitterPool {
    world: WorldId,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    dense: Vec<DenseEntry>,
}

impl EmitterPool {
    /// 创建容量固定的池，所有存储在此一次性分配
    pub fn new(world: WorldId, capacity: usize) -> Self {
        let slots = vec![
            Slot {
                generation: 0,
                dense_index: None,
            };
            capacity
        ];
        // 反序压栈，使槽位按 0,1,2... 的顺序被取用
        let free_slots = (0..capacity as u32).rev().collect();
        Self {
            world,
            slots,
            free_slots,
            dense: Vec::with_capacity(capacity),
        }
    }

    pub fn world(&self) -> WorldId {
        self.world
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.free_slots.is_empty()
    }

    /// 插入实例；池满时不做任何修改
    pub fn insert(
        &mut self,
        owner: Entity,
        instance: EngineInstanceId,
    ) -> ParticleFxResult<ParticleFxHandle> {
        let slot = self
            .free_slots
            .pop()
            .ok_or(ParticleFxError::CapacityExceeded {
                capacity: self.capacity(),
            })?;

        let dense_index = self.dense.len();
        self.dense.push(DenseEntry {
            slot,
            component: EmitterComponent {
                owner,
                instance,
                world: self.world,
            },
        });
        let entry = &mut self.slots[slot as usize];
        entry.dense_index = Some(dense_index);

        Ok(ParticleFxHandle {
            world: self.world,
            slot,
            generation: entry.generation,
        })
    }

    fn dense_index(&self, handle: ParticleFxHandle) -> ParticleFxResult<usize> {
        if handle.world != self.world {
            return Err(ParticleFxError::ForeignHandle);
        }
        let slot = self
            .slots
            .get(handle.slot as usize)
            .ok_or(ParticleFxError::InvalidHandle)?;
        if slot.generation != handle.generation {
            return Err(ParticleFxError::InvalidHandle);
        }
        slot.dense_index.ok_or(ParticleFxError::InvalidHandle)
    }

    /// O(1) 句柄查找
    pub fn get(&self, handle: ParticleFxHandle) -> ParticleFxResult<&EmitterComponent> {
        let index = self.dense_index(handle)?;
        Ok(&self.dense[index].component)
    }

    /// 查找宿主对象对应的实例
    pub fn find_owner(&self, owner: Entity) -> Option<&EmitterComponent> {
        self.dense
            .iter()
            .find(|entry| entry.component.owner == owner)
            .map(|entry| &entry.component)
    }

    pub fn contains_owner(&self, owner: Entity) -> bool {
        self.find_owner(owner).is_some()
    }

    /// 按池顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &EmitterComponent> {
        self.dense.iter().map(|entry| &entry.component)
    }

    /// 按宿主对象删除（线性查找，与末尾交换）
    pub fn remove_owner(&mut self, owner: Entity) -> Option<EmitterComponent> {
        let index = self
            .dense
            .iter()
            .position(|entry| entry.component.owner == owner)?;
        Some(self.remove_at(index))
    }

    /// 按句柄删除
    pub fn remove(&mut self, handle: ParticleFxHandle) -> ParticleFxResult<EmitterComponent> {
        let index = self.dense_index(handle)?;
        Ok(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> EmitterComponent {
        let removed = self.dense.swap_remove(index);
        if let Some(moved) = self.dense.get(index) {
            self.slots[moved.slot as usize].dense_index = Some(index);
        }

        let slot = &mut self.slots[removed.slot as usize];
        slot.dense_index = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(removed.slot);

        removed.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(n: u32) -> Entity {
        Entity::from_raw(n)
    }

    #[test]
    fn test_insert_until_full() {
        let mut pool = EmitterPool::new(WorldId::next(), 2);
        assert!(pool.insert(entity(1), EngineInstanceId(1)).is_ok());
        assert!(pool.insert(entity(2), EngineInstanceId(2)).is_ok());
        assert!(pool.is_full());

        let err = pool.insert(entity(3), EngineInstanceId(3)).unwrap_err();
        assert!(matches!(err, ParticleFxError::CapacityExceeded { capacity: 2 }));
        assert_eq!(pool.len(), 2);
        assert!(!pool.contains_owner(entity(3)));
    }

    #[test]
    fn test_swap_remove_keeps_handles_valid() {
        let mut pool = EmitterPool::new(WorldId::next(), 4);
        let a = pool.insert(entity(1), EngineInstanceId(10)).unwrap();
        let _b = pool.insert(entity(2), EngineInstanceId(20)).unwrap();
        let c = pool.insert(entity(3), EngineInstanceId(30)).unwrap();

        let removed = pool.remove_owner(entity(1)).unwrap();
        assert_eq!(removed.instance, EngineInstanceId(10));

        // 最后一个元素被换到了位置 0，句柄仍然指向它
        let owners: Vec<Entity> = pool.iter().map(|c| c.owner).collect();
        assert_eq!(owners, vec![entity(3), entity(2)]);
        assert_eq!(pool.get(c).unwrap().instance, EngineInstanceId(30));
        assert!(matches!(pool.get(a), Err(ParticleFxError::InvalidHandle)));
    }

    #[test]
    fn test_reused_slot_rejects_old_handle() {
        let mut pool = EmitterPool::new(WorldId::next(), 1);
        let old = pool.insert(entity(1), EngineInstanceId(1)).unwrap();
        pool.remove(old).unwrap();
        let new = pool.insert(entity(2), EngineInstanceId(2)).unwrap();

        assert_ne!(old, new);
        assert!(pool.get(old).is_err());
        assert_eq!(pool.get(new).unwrap().owner, entity(2));
    }

    #[test]
    fn test_foreign_handle() {
        let mut first = EmitterPool::new(WorldId::next(), 1);
        let second = EmitterPool::new(WorldId::next(), 1);
        let handle = first.insert(entity(1), EngineInstanceId(1)).unwrap();
        assert!(matches!(
            second.get(handle),
            Err(ParticleFxError::ForeignHandle)
        ));
    }

    #[test]
    fn test_remove_missing_owner() {
        let mut pool = EmitterPool::new(WorldId::next(), 2);
        pool.insert(entity(1), EngineInstanceId(1)).unwrap();
        assert!(pool.remove_owner(entity(9)).is_none());
        assert_eq!(pool.len(), 1);
    }
}
