//! 查看器上下文
//!
//! 所有状态集中在 `ViewerContext` 中，由宿主在单线程上驱动：
//! 指针事件、按钮请求、加载结果以及每帧的 `frame` 调用。
//! 同一时刻只有一个写者能修改球面坐标，由状态机保证：
//! 拖拽开始先暂停自动旋转，复位期间关闭拖拽输入并停止自动旋转。

use crate::auto_rotate::{AutoRotateController, RotationMode};
use crate::config::{ConfigError, ViewerConfig};
use crate::controls::{ControlEvent, OrbitControls};
use crate::error::ViewerError;
use crate::indicator::{CubeIndicator, CubeRotation};
use crate::input::OrbitInputTracker;
use crate::model::{LoadTicket, ModelLoader, ModelSlot, ModelSwitchCoordinator, SceneModel};
use crate::reset::{ResetParts, ResetSequencer, ResetStep};
use crate::scene::CameraPose;
use crate::spherical::SphericalState;
use crate::timer::CancellableTimer;
use glam::Vec2;
use std::cell::RefCell;

/// 竖屏判定阈值 (宽 / 高)
const PORTRAIT_ASPECT: f32 = 0.6;

/// 每帧最后调用一次的渲染器
pub trait FrameRenderer<M> {
    fn render(&mut self, pose: &CameraPose, model: Option<&M>);
}

/// 一帧的结果摘要
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub mode: RotationMode,
    pub reset: ResetStep,
    /// 本帧更新了方块指示器
    pub cube: Option<CubeRotation>,
}

/// 查看器上下文
pub struct ViewerContext<M> {
    config: ViewerConfig,
    now_ms: f64,
    spherical: SphericalState,
    controls: OrbitControls,
    tracker: OrbitInputTracker,
    auto_rotate: AutoRotateController,
    /// 启动 / 加载完成 / 复位完成后的延迟启动
    arm_timer: CancellableTimer,
    reset: ResetSequencer,
    models: ModelSwitchCoordinator<M>,
    indicator: CubeIndicator,
    viewport: Vec2,
    last_pointer: Option<Vec2>,
}

impl<M: SceneModel> ViewerContext<M> {
    pub fn new(config: ViewerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let initial = config.initial;
        let controls = OrbitControls::new(initial.camera_position, initial.controls_target, config.controls);
        let mut spherical = SphericalState::default();
        spherical.sync_from_offset(controls.offset(), config.controls.min_distance);

        Ok(Self {
            now_ms: 0.0,
            spherical,
            tracker: OrbitInputTracker::new(config.controls.min_distance),
            auto_rotate: AutoRotateController::new(config.pause_duration_ms),
            arm_timer: CancellableTimer::new(),
            reset: ResetSequencer::new(config.reset_tween),
            models: ModelSwitchCoordinator::new(),
            indicator: CubeIndicator::new(config.indicator_throttle_ms, config.indicator_ratio),
            viewport: Vec2::new(1280.0, 720.0),
            last_pointer: None,
            controls,
            config,
        })
    }

    /// 放好初始相机、记录复位基准、安排延迟启动，并申请默认模型
    pub fn start(&mut self, now_ms: f64) -> Result<Option<LoadTicket>, ViewerError> {
        self.advance_clock(now_ms);
        let initial = self.config.initial;
        self.controls.position = initial.camera_position;
        self.controls.target = initial.controls_target;
        self.controls.save_state();
        self.resync_spherical();
        self.arm_timer.schedule(self.now_ms, self.config.arm_delay_ms);
        tracing::info!("查看器已启动，{} ms 后开始自动旋转", self.config.arm_delay_ms);

        match self.config.default_model.clone() {
            Some(key) => self.request_model(now_ms, &key).map(Some),
            None => Ok(None),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn spherical(&self) -> SphericalState {
        self.spherical
    }

    pub fn mode(&self) -> RotationMode {
        self.auto_rotate.mode()
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn model_slot(&self) -> &ModelSlot<M> {
        self.models.slot()
    }

    pub fn model(&self) -> Option<&M> {
        self.models.slot().current()
    }

    pub fn is_loading(&self) -> bool {
        self.models.slot().is_loading()
    }

    pub fn is_resetting(&self) -> bool {
        self.reset.is_running()
    }

    pub fn cube_rotation(&self) -> CubeRotation {
        self.indicator.current()
    }

    /// 视口尺寸变化
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    /// 当前相机姿态
    pub fn camera_pose(&self) -> CameraPose {
        let aspect = self.viewport.x / self.viewport.y;
        CameraPose {
            position: self.controls.position,
            target: self.controls.target,
            orientation: self.controls.orientation(),
            fov_y_degrees: if aspect < PORTRAIT_ASPECT { 85.0 } else { 75.0 },
            aspect,
        }
    }

    // --- 指针输入 ---

    pub fn pointer_down(&mut self, now_ms: f64, position: Vec2) {
        self.advance_clock(now_ms);
        if let Some(event) = self.controls.pointer_down() {
            self.last_pointer = Some(position);
            self.dispatch(event);
        }
    }

    pub fn pointer_move(&mut self, now_ms: f64, position: Vec2) {
        self.advance_clock(now_ms);
        let Some(last) = self.last_pointer else {
            return;
        };
        self.last_pointer = Some(position);
        if let Some(event) = self.controls.pointer_move(position - last, self.viewport.y) {
            self.dispatch(event);
        }
    }

    pub fn pointer_up(&mut self, now_ms: f64) {
        self.advance_clock(now_ms);
        self.last_pointer = None;
        if let Some(event) = self.controls.pointer_up() {
            self.dispatch(event);
        }
    }

    pub fn wheel(&mut self, now_ms: f64, delta_y: f32) {
        self.advance_clock(now_ms);
        for event in self.controls.wheel(delta_y) {
            self.dispatch(event);
        }
    }

    // --- 模型切换 ---

    /// 按钮请求切换模型；复位期间返回 `Busy`
    pub fn request_model(&mut self, now_ms: f64, key: &str) -> Result<LoadTicket, ViewerError> {
        self.advance_clock(now_ms);
        if self.reset.is_running() {
            tracing::warn!("视角复位进行中，忽略切换到【{}】", key);
            return Err(ViewerError::Busy);
        }
        self.models.request(key, &self.config)
    }

    /// 转发加载进度
    pub fn model_progress(&self, ticket: &LoadTicket, fraction: f32) -> f32 {
        self.models.progress(ticket, fraction)
    }

    /// 交回加载结果；成功后重新同步球面坐标并安排延迟启动
    pub fn complete_model<E: std::fmt::Display>(
        &mut self,
        now_ms: f64,
        ticket: &LoadTicket,
        result: Result<M, E>,
    ) -> Result<(), ViewerError> {
        self.advance_clock(now_ms);
        self.models.complete(ticket, result, &self.config.initial)?;
        self.resync_spherical();
        self.arm_timer.schedule(self.now_ms, self.config.arm_delay_ms);
        Ok(())
    }

    // --- 复位 ---

    /// 方块按钮请求复位视角
    pub fn request_reset(&mut self, now_ms: f64) -> Result<(), ViewerError> {
        self.advance_clock(now_ms);
        self.reset.begin(
            self.now_ms,
            self.models.slot().is_loading(),
            &mut self.controls,
            &mut self.tracker,
            &mut self.auto_rotate,
            &self.config.initial,
        )?;
        // 复位结束时会重新安排
        self.arm_timer.cancel();
        self.last_pointer = None;
        Ok(())
    }

    // --- 帧循环 ---

    /// 推进自动旋转一帧；返回相机是否移动
    ///
    /// 复位进行中或场景中没有模型时不做任何事。
    pub fn tick(&mut self) -> bool {
        if self.reset.is_running() || self.models.slot().current().is_none() {
            return false;
        }
        let Some(offset) = self
            .auto_rotate
            .tick(&mut self.spherical, self.config.auto_rotate_speed)
        else {
            return false;
        };
        self.controls.position = self.controls.target + offset;
        self.indicator.request_update(self.now_ms);
        true
    }

    /// 一帧：定时器 → 拖拽控制器 → 复位补间 → 自动旋转 → 指示器 → 渲染
    pub fn frame<R: FrameRenderer<M>>(&mut self, now_ms: f64, renderer: &mut R) -> FrameReport {
        self.advance_clock(now_ms);
        self.fire_timers();

        if self.controls.update() {
            self.dispatch(ControlEvent::Change);
        }

        let reset = self.reset.step(
            self.now_ms,
            ResetParts {
                controls: &mut self.controls,
                tracker: &mut self.tracker,
                spherical: &mut self.spherical,
                model: self.models.model_mut(),
                initial: &self.config.initial,
            },
        );
        match reset {
            ResetStep::Running => self.indicator.request_update(self.now_ms),
            ResetStep::Finished => {
                self.indicator.reset();
                self.arm_timer.schedule(self.now_ms, self.config.reset_settle_ms);
            }
            ResetStep::Idle => {}
        }

        self.tick();

        let cube = self.indicator.poll(self.now_ms, self.controls.orientation());
        renderer.render(&self.camera_pose(), self.models.slot().current());

        FrameReport {
            mode: self.auto_rotate.mode(),
            reset,
            cube,
        }
    }

    fn fire_timers(&mut self) {
        self.auto_rotate.poll(self.now_ms);
        if self.arm_timer.fire_if_due(self.now_ms) {
            debug_assert!(!self.reset.is_running(), "复位期间不应有待启动的定时");
            self.auto_rotate.arm();
        }
    }

    fn dispatch(&mut self, event: ControlEvent) {
        let synced = self.tracker.handle(
            event,
            self.now_ms,
            &self.controls,
            &mut self.auto_rotate,
            &mut self.spherical,
        );
        if synced && event == ControlEvent::Change {
            self.indicator.request_update(self.now_ms);
        }
    }

    fn resync_spherical(&mut self) {
        self.spherical
            .sync_from_offset(self.controls.offset(), self.config.controls.min_distance);
    }

    fn advance_clock(&mut self, now_ms: f64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
    }
}

/// 完整执行一次模型切换：申请、异步加载、交回结果
///
/// `viewer` 只在同步段内借用，加载等待期间帧循环和拖拽事件照常运行。
pub async fn switch_model<L>(
    viewer: &RefCell<ViewerContext<L::Model>>,
    loader: &L,
    key: &str,
    now: impl Fn() -> f64,
    on_progress: &mut dyn FnMut(f32),
) -> Result<(), ViewerError>
where
    L: ModelLoader,
{
    let ticket = viewer.borrow_mut().request_model(now(), key)?;
    load_ticket(viewer, loader, ticket, now, on_progress).await
}

/// 按已领取的票据加载并交回结果，用于 `start` 返回的默认模型
pub async fn load_ticket<L>(
    viewer: &RefCell<ViewerContext<L::Model>>,
    loader: &L,
    ticket: LoadTicket,
    now: impl Fn() -> f64,
    on_progress: &mut dyn FnMut(f32),
) -> Result<(), ViewerError>
where
    L: ModelLoader,
{
    let result = {
        let mut forward = |fraction: f32| {
            let fraction = viewer.borrow().model_progress(&ticket, fraction);
            on_progress(fraction);
        };
        loader.load(&ticket.path, &mut forward).await
    };
    viewer.borrow_mut().complete_model(now(), &ticket, result)
}
