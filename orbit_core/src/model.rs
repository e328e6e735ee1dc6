//! 模型槽位与切换协调
//!
//! 同一时间场景中最多只有一个模型，最多只有一次加载在进行。
//! 加载本身由外部加载器异步完成：`request` 领取票据，`complete` 交回结果。

use crate::config::{InitialState, ViewerConfig};
use crate::error::ViewerError;
use crate::scene::Transform;
use std::future::Future;

/// 场景中可替换的模型资源
pub trait SceneModel {
    fn transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);
    /// 释放几何体与材质缓冲
    fn release(&mut self);
}

/// 模型加载器
pub trait ModelLoader {
    type Model: SceneModel;
    type Error: std::fmt::Display;

    /// 异步加载 `path`，`on_progress` 接收 `[0, 1]` 的进度
    fn load(
        &self,
        path: &str,
        on_progress: &mut dyn FnMut(f32),
    ) -> impl Future<Output = Result<Self::Model, Self::Error>>;
}

/// 一次加载请求的票据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: u64,
    pub key: String,
    pub path: String,
}

/// 模型槽位
#[derive(Debug)]
pub struct ModelSlot<M> {
    current: Option<M>,
    current_key: Option<String>,
    in_flight: Option<LoadTicket>,
}

impl<M> Default for ModelSlot<M> {
    fn default() -> Self {
        Self {
            current: None,
            current_key: None,
            in_flight: None,
        }
    }
}

impl<M> ModelSlot<M> {
    pub fn current(&self) -> Option<&M> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut M> {
        self.current.as_mut()
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&LoadTicket> {
        self.in_flight.as_ref()
    }
}

/// 模型切换协调器
#[derive(Debug)]
pub struct ModelSwitchCoordinator<M> {
    slot: ModelSlot<M>,
    next_ticket: u64,
}

impl<M> Default for ModelSwitchCoordinator<M> {
    fn default() -> Self {
        Self {
            slot: ModelSlot::default(),
            next_ticket: 1,
        }
    }
}

impl<M: SceneModel> ModelSwitchCoordinator<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self) -> &ModelSlot<M> {
        &self.slot
    }

    pub fn model_mut(&mut self) -> Option<&mut M> {
        self.slot.current_mut()
    }

    /// 申请加载 `key` 对应的模型
    pub fn request(&mut self, key: &str, config: &ViewerConfig) -> Result<LoadTicket, ViewerError> {
        if self.slot.is_loading() {
            tracing::warn!("模型正在加载中，忽略切换到【{}】", key);
            return Err(ViewerError::AlreadyLoading);
        }
        let path = config.model_path(key).ok_or_else(|| {
            tracing::warn!("未配置【{}】对应的模型路径", key);
            ViewerError::UnknownModel(key.to_string())
        })?;

        let ticket = LoadTicket {
            id: self.next_ticket,
            key: key.to_string(),
            path: path.to_string(),
        };
        self.next_ticket += 1;
        self.slot.in_flight = Some(ticket.clone());
        tracing::info!("开始加载模型【{}】: {}", key, path);
        Ok(ticket)
    }

    /// 转发加载进度，只做记录
    pub fn progress(&self, ticket: &LoadTicket, fraction: f32) -> f32 {
        let fraction = fraction.clamp(0.0, 1.0);
        tracing::debug!("【{}】{:.1}% 加载完成", ticket.key, fraction * 100.0);
        fraction
    }

    /// 交回加载结果
    ///
    /// 成功时先释放旧模型，再挂上新模型并套用初始变换。
    /// 失败时保留旧模型。两种情况都会清除进行中标记。
    pub fn complete<E: std::fmt::Display>(
        &mut self,
        ticket: &LoadTicket,
        result: Result<M, E>,
        initial: &InitialState,
    ) -> Result<(), ViewerError> {
        match self.slot.in_flight.as_ref() {
            Some(pending) if pending.id == ticket.id => {}
            other => {
                debug_assert!(false, "加载票据不匹配: {:?} vs {:?}", other, ticket);
                tracing::error!("忽略过期的加载结果【{}】", ticket.key);
                return Ok(());
            }
        }
        self.slot.in_flight = None;

        match result {
            Ok(mut model) => {
                if let Some(mut old) = self.slot.current.take() {
                    old.release();
                    tracing::debug!("已释放模型【{}】", self.slot.current_key.as_deref().unwrap_or("?"));
                }
                model.set_transform(initial.model_transform());
                self.slot.current = Some(model);
                self.slot.current_key = Some(ticket.key.clone());
                tracing::info!("模型【{}】已加载", ticket.key);
                Ok(())
            }
            Err(err) => {
                tracing::error!("模型加载失败: {}", err);
                Err(ViewerError::load_failure(err))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use glam::Vec3;
    use std::cell::Cell;
    use std::rc::Rc;

    /// 记录释放次数的测试模型
    #[derive(Debug)]
    pub struct TestModel {
        pub name: &'static str,
        pub transform: Transform,
        pub released: Rc<Cell<u32>>,
    }

    impl TestModel {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                transform: Transform::from(Vec3::new(1.0, 2.0, 3.0), Default::default(), Vec3::ONE),
                released: Rc::new(Cell::new(0)),
            }
        }
    }

    impl SceneModel for TestModel {
        fn transform(&self) -> Transform {
            self.transform
        }

        fn set_transform(&mut self, transform: Transform) {
            self.transform = transform;
        }

        fn release(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    #[test]
    fn request_rejects_while_loading() {
        let config = ViewerConfig::default();
        let mut coord = ModelSwitchCoordinator::<TestModel>::new();
        let ticket = coord.request("model1", &config).unwrap();
        assert_eq!(ticket.path, "static/red.glb");
        assert_eq!(coord.request("model2", &config), Err(ViewerError::AlreadyLoading));
    }

    #[test]
    fn unknown_key_leaves_slot_unchanged() {
        let config = ViewerConfig::default();
        let mut coord = ModelSwitchCoordinator::<TestModel>::new();
        assert_eq!(
            coord.request("model9", &config),
            Err(ViewerError::UnknownModel("model9".into()))
        );
        assert!(!coord.slot().is_loading());
        assert!(coord.slot().current().is_none());
    }

    #[test]
    fn success_releases_old_and_applies_initial_transform() {
        let config = ViewerConfig::default();
        let mut coord = ModelSwitchCoordinator::new();

        let first = TestModel::new("red");
        let first_released = first.released.clone();
        let t = coord.request("model1", &config).unwrap();
        coord.complete::<String>(&t, Ok(first), &config.initial).unwrap();

        let t = coord.request("model3", &config).unwrap();
        coord.complete::<String>(&t, Ok(TestModel::new("black")), &config.initial).unwrap();

        assert_eq!(first_released.get(), 1);
        let current = coord.slot().current().unwrap();
        assert_eq!(current.name, "black");
        assert_eq!(current.transform(), config.initial.model_transform());
        assert_eq!(coord.slot().current_key(), Some("model3"));
        assert!(!coord.slot().is_loading());
    }

    #[test]
    fn failure_keeps_previous_model() {
        let config = ViewerConfig::default();
        let mut coord = ModelSwitchCoordinator::new();
        let t = coord.request("model1", &config).unwrap();
        coord.complete::<String>(&t, Ok(TestModel::new("red")), &config.initial).unwrap();

        let t = coord.request("model2", &config).unwrap();
        let err = coord
            .complete(&t, Err::<TestModel, _>("网络错误"), &config.initial)
            .unwrap_err();
        assert_eq!(err, ViewerError::LoadFailure("网络错误".into()));
        assert!(!coord.slot().is_loading());
        assert_eq!(coord.slot().current().unwrap().name, "red");
        assert_eq!(coord.slot().current().unwrap().released.get(), 0);
    }

    #[test]
    fn progress_is_clamped() {
        let config = ViewerConfig::default();
        let mut coord = ModelSwitchCoordinator::<TestModel>::new();
        let t = coord.request("model1", &config).unwrap();
        assert_eq!(coord.progress(&t, 0.5), 0.5);
        assert_eq!(coord.progress(&t, 1.7), 1.0);
    }
}
