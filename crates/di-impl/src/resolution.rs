//! 解析栈
//!
//! 每次顶层调用创建一个解析栈，栈帧记录正在构造的提供者及代其获取的持有边。
//! 工厂拿到的 [`DependencyResolver`] 就是绑定到同一个栈的 [`Resolution`]。

use crate::provider::HeldEdge;
use crate::state::GraphState;
use di_abstractions::{DependencyResolver, Injectable, InjectionPoint, Instance};
use di_common::{DependencyError, DependencyResult, ProviderKey};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 解析栈帧
#[derive(Debug, Default)]
struct Frame {
    /// 正在构造的提供者，根帧为 `None`
    owner: Option<ProviderKey>,
    acquired: Vec<HeldEdge>,
}

/// 单次顶层调用的解析过程
pub(crate) struct Resolution<'g> {
    state: &'g mut GraphState,
    frames: Vec<Frame>,
}

impl<'g> Resolution<'g> {
    pub fn new(state: &'g mut GraphState) -> Self {
        Self {
            state,
            frames: vec![Frame::default()],
        }
    }

    /// 获取一个提供者的实例，并记录为当前栈帧的持有边
    pub fn acquire(&mut self, key: &ProviderKey) -> DependencyResult<Instance> {
        if self.is_constructing(key) {
            let chain = self.chain_to(key);
            error!("检测到循环依赖: {}", chain);
            return Err(DependencyError::CircularDependency {
                key: key.clone(),
                chain,
            });
        }

        let instance = match self.state.live_instance(key)? {
            Some(instance) => {
                self.state.retain(key)?;
                instance
            }
            None => self.construct(key)?,
        };

        self.record(HeldEdge {
            key: key.clone(),
            instance: Arc::clone(&instance),
        });
        Ok(instance)
    }

    /// 0→1 构造：入栈、调用工厂、出栈、提交
    fn construct(&mut self, key: &ProviderKey) -> DependencyResult<Instance> {
        let max_depth = self.state.config.max_resolution_depth;
        if self.depth() >= max_depth {
            return Err(DependencyError::ResolutionTooDeep {
                key: key.clone(),
                max_depth,
            });
        }

        let factory = self.state.registry.lookup(key)?.factory();
        debug!("构造实例: {} (深度 {})", key, self.depth());

        self.frames.push(Frame {
            owner: Some(key.clone()),
            acquired: Vec::new(),
        });
        let created = factory.create(self);
        let acquired = self
            .frames
            .pop()
            .map(|frame| frame.acquired)
            .unwrap_or_default();

        match created {
            Ok(instance) => {
                self.state.commit(key, Arc::clone(&instance), acquired)?;
                Ok(instance)
            }
            Err(err) => {
                error!("构造实例失败: {}: {}", key, err);
                self.rollback(acquired);
                Err(err)
            }
        }
    }

    /// 注入目标的全部注入点
    ///
    /// 已持有实例的槽位被替换，全部注入点成功后再各释放一次原实例。
    /// 失败时释放本次调用获取的引用，已赋值的槽位恢复为调用前的值。
    pub fn inject_points(&mut self, target: &mut dyn Injectable) -> DependencyResult<()> {
        let mark = self.frames.last().map_or(0, |frame| frame.acquired.len());
        let mut points = target.injection_points();
        let mut replaced: Vec<Option<Instance>> = Vec::with_capacity(points.len());

        for index in 0..points.len() {
            let key = points[index].key();
            let result = self
                .acquire(&key)
                .and_then(|instance| replace_slot(&mut *points[index], &instance));

            match result {
                Ok(previous) => replaced.push(previous),
                Err(err) => {
                    let acquired = self
                        .frames
                        .last_mut()
                        .map(|frame| frame.acquired.split_off(mark))
                        .unwrap_or_default();
                    self.rollback(acquired);
                    for (point, previous) in points.iter_mut().zip(replaced) {
                        point.take();
                        if let Some(previous) = previous {
                            restore_slot(&mut **point, &previous);
                        }
                    }
                    return Err(err);
                }
            }
        }

        for (point, previous) in points.iter().zip(replaced) {
            let Some(previous) = previous else {
                continue;
            };
            let key = point.key();
            debug!("释放被替换的注入实例: {}", key);
            if let Err(err) = self.state.release(&key, Some(&previous)) {
                warn!("释放被替换的注入实例失败: {}: {}", key, err);
            }
        }
        Ok(())
    }

    /// 按获取的逆序释放引用
    fn rollback(&mut self, acquired: Vec<HeldEdge>) {
        for edge in acquired.into_iter().rev() {
            debug!("回滚引用: {}", edge.key);
            if let Err(err) = self.state.release(&edge.key, Some(&edge.instance)) {
                warn!("回滚引用失败: {}: {}", edge.key, err);
            }
        }
    }

    fn record(&mut self, edge: HeldEdge) {
        if let Some(frame) = self.frames.last_mut() {
            frame.acquired.push(edge);
        }
    }

    fn is_constructing(&self, key: &ProviderKey) -> bool {
        self.frames
            .iter()
            .any(|frame| frame.owner.as_ref() == Some(key))
    }

    fn chain_to(&self, key: &ProviderKey) -> String {
        self.frames
            .iter()
            .filter_map(|frame| frame.owner.as_ref())
            .chain(std::iter::once(key))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// 赋值槽位并返回其原先持有的实例；赋值失败时槽位保持原值
fn replace_slot(
    point: &mut dyn InjectionPoint,
    instance: &Instance,
) -> DependencyResult<Option<Instance>> {
    let previous = point.take();
    match point.assign(instance) {
        Ok(()) => Ok(previous),
        Err(err) => {
            if let Some(previous) = previous {
                restore_slot(point, &previous);
            }
            Err(err)
        }
    }
}

fn restore_slot(point: &mut dyn InjectionPoint, previous: &Instance) {
    if let Err(err) = point.assign(previous) {
        warn!("恢复注入点失败: {}: {}", point.key(), err);
    }
}

impl DependencyResolver for Resolution<'_> {
    fn resolve_instance(&mut self, key: &ProviderKey) -> DependencyResult<Instance> {
        self.acquire(key)
    }

    fn inject(&mut self, target: &mut dyn Injectable) -> DependencyResult<()> {
        self.inject_points(target)
    }

    fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }
}
