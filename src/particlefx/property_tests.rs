//! 粒子特效属性测试
//!
//! 使用proptest验证实例池、批次划分和动画帧选择的不变量

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bevy_ecs::entity::Entity;
    use proptest::prelude::*;

    use crate::core::error::ParticleFxError;
    use crate::particlefx::animation::{AnimationData, Playback, TileSetAnimationResolver};
    use crate::particlefx::batch::BatchEmitter;
    use crate::particlefx::engine::{
        BlendMode, EngineInstanceId, ParticleEngine, RenderInstanceSink,
    };
    use crate::particlefx::pool::{EmitterPool, ParticleFxHandle, WorldId};
    use crate::particlefx::sim::{CpuParticleEngine, EmitterPrototype, ParticleFxPrototype};
    use crate::particlefx::vertex::{PARTICLE_VERTEX_SIZE, VERTICES_PER_PARTICLE};
    use crate::render::graphics::{VertexBufferHandle, VertexDeclarationHandle};
    use crate::render::render_object::{MaterialHandle, TextureHandle};

    #[derive(Debug, Clone)]
    enum PoolOp {
        Insert(u32),
        RemoveOwner(u32),
        RemoveHandle(usize),
    }

    fn pool_op() -> impl Strategy<Value = PoolOp> {
        prop_oneof![
            (0u32..24).prop_map(PoolOp::Insert),
            (0u32..24).prop_map(PoolOp::RemoveOwner),
            (0usize..32).prop_map(PoolOp::RemoveHandle),
        ]
    }

    fn blend_mode() -> impl Strategy<Value = BlendMode> {
        (0u32..6).prop_map(BlendMode::from_raw)
    }

    fn playback() -> impl Strategy<Value = Playback> {
        prop_oneof![
            Just(Playback::None),
            Just(Playback::OnceForward),
            Just(Playback::OnceBackward),
            Just(Playback::LoopForward),
            Just(Playback::LoopBackward),
            Just(Playback::LoopPingpong),
        ]
    }

    // 实例池属性测试
    proptest! {
        #[test]
        fn pool_matches_model(
            capacity in 1usize..16,
            ops in prop::collection::vec(pool_op(), 0..64)
        ) {
            let mut pool = EmitterPool::new(WorldId::next(), capacity);
            let mut model: HashMap<Entity, (ParticleFxHandle, EngineInstanceId)> = HashMap::new();
            let mut issued: Vec<ParticleFxHandle> = Vec::new();
            let mut next_instance = 0u32;

            for op in ops {
                match op {
                    PoolOp::Insert(raw) => {
                        let owner = Entity::from_raw(raw);
                        // 同一宿主只挂载一次，由世界在插入前检查
                        if pool.contains_owner(owner) {
                            continue;
                        }
                        let instance = EngineInstanceId(next_instance);
                        next_instance += 1;
                        let was_full = pool.is_full();
                        match pool.insert(owner, instance) {
                            Ok(handle) => {
                                prop_assert!(!was_full);
                                model.insert(owner, (handle, instance));
                                issued.push(handle);
                            }
                            Err(ParticleFxError::CapacityExceeded { capacity: c }) => {
                                prop_assert!(was_full);
                                prop_assert_eq!(c, capacity);
                            }
                            Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                        }
                    }
                    PoolOp::RemoveOwner(raw) => {
                        let owner = Entity::from_raw(raw);
                        let removed = pool.remove_owner(owner);
                        prop_assert_eq!(removed.is_some(), model.remove(&owner).is_some());
                    }
                    PoolOp::RemoveHandle(i) => {
                        if let Some(&handle) = issued.get(i) {
                            let live = model.values().any(|(h, _)| *h == handle);
                            let result = pool.remove(handle);
                            prop_assert_eq!(result.is_ok(), live);
                            if let Ok(component) = result {
                                model.remove(&component.owner);
                            }
                        }
                    }
                }

                prop_assert!(pool.len() <= pool.capacity());
                prop_assert_eq!(pool.is_full(), pool.len() == pool.capacity());
                for (owner, (handle, instance)) in &model {
                    let component = pool.get(*handle);
                    prop_assert!(component.is_ok());
                    if let Ok(component) = component {
                        prop_assert_eq!(component.owner, *owner);
                        prop_assert_eq!(component.instance, *instance);
                    }
                }
            }
        }

        #[test]
        fn pool_handles_go_stale(capacity in 1usize..8, rounds in 1usize..20) {
            let mut pool = EmitterPool::new(WorldId::next(), capacity);
            let owner = Entity::from_raw(1);
            let mut previous: Vec<ParticleFxHandle> = Vec::new();

            for i in 0..rounds {
                let handle = pool.insert(owner, EngineInstanceId(i as u32)).unwrap();
                for stale in &previous {
                    prop_assert!(matches!(pool.get(*stale), Err(ParticleFxError::InvalidHandle)));
                }
                pool.remove(handle).unwrap();
                previous.push(handle);
            }
            prop_assert!(pool.is_empty());
        }
    }

    // 批次划分属性测试
    proptest! {
        #[test]
        fn batches_preserve_runs(
            runs in prop::collection::vec((0u64..3, 0u64..3, blend_mode(), 1u32..64), 0..32)
        ) {
            let mut batches = Vec::new();
            let mut emitter =
                BatchEmitter::new(&mut batches, VertexBufferHandle(1), VertexDeclarationHandle(2));
            let mut next = 0u32;
            for &(material, texture, mode, particles) in &runs {
                let count = particles * VERTICES_PER_PARTICLE as u32;
                emitter.render_instance(MaterialHandle(material), TextureHandle(texture), mode, next, count);
                next += count;
            }
            let unknown = emitter.unknown_blend_modes();

            prop_assert_eq!(batches.len(), runs.len());
            prop_assert_eq!(
                unknown as usize,
                runs.iter().filter(|r| matches!(r.2, BlendMode::Unknown(_))).count()
            );
            let mut expected_start = 0;
            for ro in &batches {
                prop_assert_eq!(ro.vertex_start, expected_start);
                expected_start += ro.vertex_count;
            }
            prop_assert_eq!(expected_start, next);
        }

        #[test]
        fn cpu_engine_stays_within_buffer(
            emitters in prop::collection::vec((0u64..2, 0u64..2, 1.0f32..200.0), 1..4),
            particles_room in 0usize..64,
            dt in 0.01f32..1.0
        ) {
            let mut engine = CpuParticleEngine::new(2, 256).with_seed(3);
            let prototype = ParticleFxPrototype::new(
                emitters
                    .iter()
                    .map(|&(m, t, rate)| {
                        EmitterPrototype::new(MaterialHandle(m), TextureHandle(t))
                            .with_emission_rate(rate)
                            .with_lifetime(2.0, 2.0)
                    })
                    .collect(),
            );
            let id = engine.register_prototype(prototype);
            let instance = engine.create_instance(id).unwrap();
            engine.start_instance(instance);

            let particle_bytes = PARTICLE_VERTEX_SIZE * VERTICES_PER_PARTICLE;
            let mut buffer = vec![0u8; particles_room * particle_bytes + 7];
            let written = engine.update(dt, &mut buffer, &TileSetAnimationResolver);

            prop_assert!(written <= buffer.len());
            prop_assert_eq!(written % particle_bytes, 0);

            let mut expected_start = 0;
            for run in engine.runs() {
                prop_assert_eq!(run.vertex_index, expected_start);
                expected_start += run.vertex_count;
            }
            prop_assert_eq!(expected_start as usize * PARTICLE_VERTEX_SIZE, written);
            // 相邻段的渲染状态必然不同
            for pair in engine.runs().windows(2) {
                prop_assert!(
                    (pair[0].material, pair[0].texture, pair[0].blend_mode)
                        != (pair[1].material, pair[1].texture, pair[1].blend_mode)
                );
            }
        }
    }

    // 动画帧选择属性测试
    proptest! {
        #[test]
        fn tile_stays_in_range(
            start in 0u32..16,
            len in 0u32..16,
            fps in 0u32..60,
            playback in playback(),
            elapsed in 0.0f32..100.0
        ) {
            let data = AnimationData {
                texture: TextureHandle(1),
                tex_coords: &[],
                fps,
                start_tile: start,
                end_tile: start + len,
                hflip: false,
                vflip: false,
                playback,
            };
            let tile = data.tile_at(elapsed);
            prop_assert!(tile >= start && tile <= start + len);
        }

        #[test]
        fn tile_stays_in_range_for_any_bounds(
            start in any::<u32>(),
            end in prop_oneof![any::<u32>(), Just(u32::MAX), (1u32 << 31)..=u32::MAX],
            fps in 0u32..240,
            playback in playback(),
            elapsed in 0.0f32..1.0e6
        ) {
            let data = AnimationData {
                texture: TextureHandle(1),
                tex_coords: &[],
                fps,
                start_tile: start,
                end_tile: end,
                hflip: false,
                vflip: false,
                playback,
            };
            let tile = data.tile_at(elapsed);
            prop_assert!(tile >= start && tile <= end.max(start));
            prop_assert!(data.frame_count() >= 1);
        }
    }
}
