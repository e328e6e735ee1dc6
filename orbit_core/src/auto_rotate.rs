//! 自动旋转状态机
//!
//! ```text
//! Idle --arm--> Rotating --pause--> Paused --(恢复定时到期)--> Rotating
//! ```
//!
//! `pause` 总是取消并重新开始恢复定时；`arm` 只在 Idle 时生效，
//! 在 Paused 中调用不会提前恢复，也不会产生第二个定时。

use crate::spherical::SphericalState;
use crate::timer::CancellableTimer;
use glam::Vec3;

/// 自动旋转模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum RotationMode {
    /// 尚未启动 (或被复位序列停下)
    #[default]
    Idle,
    /// 每帧推进方位角
    Rotating,
    /// 等待恢复定时到期
    Paused,
}

/// 自动旋转控制器
#[derive(Debug, Clone)]
pub struct AutoRotateController {
    mode: RotationMode,
    resume_timer: CancellableTimer,
    pause_duration_ms: f64,
}

impl AutoRotateController {
    pub fn new(pause_duration_ms: f64) -> Self {
        Self {
            mode: RotationMode::Idle,
            resume_timer: CancellableTimer::new(),
            pause_duration_ms,
        }
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn is_rotating(&self) -> bool {
        self.mode == RotationMode::Rotating
    }

    /// 恢复定时是否挂起
    pub fn resume_pending(&self) -> bool {
        self.resume_timer.is_pending()
    }

    pub fn resume_deadline(&self) -> Option<f64> {
        self.resume_timer.deadline()
    }

    /// 启动自动旋转；只有 Idle 会切换到 Rotating
    pub fn arm(&mut self) -> bool {
        match self.mode {
            RotationMode::Idle => {
                self.mode = RotationMode::Rotating;
                tracing::info!("自动旋转已启动");
                true
            }
            RotationMode::Rotating => false,
            RotationMode::Paused => {
                tracing::debug!("自动旋转暂停中，等待原恢复定时");
                false
            }
        }
    }

    /// 暂停并在固定时长后恢复；旧的恢复定时被作废
    pub fn pause(&mut self, now_ms: f64) {
        if self.resume_timer.cancel() {
            tracing::debug!("重置自动旋转恢复定时");
        }
        self.mode = RotationMode::Paused;
        self.resume_timer.schedule(now_ms, self.pause_duration_ms);
    }

    /// 停到中性状态，不再自动恢复
    pub fn stop(&mut self) {
        self.resume_timer.cancel();
        if self.mode != RotationMode::Idle {
            tracing::debug!("自动旋转已停止");
        }
        self.mode = RotationMode::Idle;
    }

    /// 处理到期的恢复定时；恢复时返回 `true`
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if !self.resume_timer.fire_if_due(now_ms) {
            return false;
        }
        debug_assert_eq!(self.mode, RotationMode::Paused, "恢复定时只应在暂停时挂起");
        if self.mode == RotationMode::Paused {
            self.mode = RotationMode::Rotating;
            tracing::debug!("暂停结束，恢复自动旋转");
            return true;
        }
        false
    }

    /// 推进一帧：只改变方位角，返回新的相机偏移
    ///
    /// 非 Rotating 状态不做任何事。
    pub fn tick(&self, spherical: &mut SphericalState, delta_angle: f32) -> Option<Vec3> {
        if self.mode != RotationMode::Rotating {
            return None;
        }
        spherical.azimuth_angle = SphericalState::wrap_azimuth(spherical.azimuth_angle + delta_angle);
        Some(spherical.to_offset())
    }
}
