//! 拖拽输入跟踪
//!
//! 拖拽控制器已经移动了相机，这里只负责把结果写回规范的球面坐标，
//! 让自动旋转从用户最后停留的位置继续。

use crate::auto_rotate::AutoRotateController;
use crate::controls::{ControlEvent, OrbitControls};
use crate::spherical::SphericalState;

/// 拖拽输入跟踪器
#[derive(Debug, Clone)]
pub struct OrbitInputTracker {
    enabled: bool,
    /// 相机与目标点重合时回退的距离
    min_radius: f32,
}

impl OrbitInputTracker {
    pub fn new(min_radius: f32) -> Self {
        Self {
            enabled: true,
            min_radius,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 复位序列期间关闭输入通路
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// 分发拖拽控制器事件；返回是否同步了球面坐标
    pub fn handle(
        &self,
        event: ControlEvent,
        now_ms: f64,
        controls: &OrbitControls,
        auto_rotate: &mut AutoRotateController,
        spherical: &mut SphericalState,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        match event {
            ControlEvent::Start => {
                self.on_drag_start(now_ms, controls, auto_rotate, spherical);
                true
            }
            ControlEvent::Change => {
                self.on_drag_change(controls, spherical);
                true
            }
            // 结束由暂停恢复定时处理
            ControlEvent::End => false,
        }
    }

    /// 拖拽开始：立即暂停自动旋转并记录拖拽起点
    pub fn on_drag_start(
        &self,
        now_ms: f64,
        controls: &OrbitControls,
        auto_rotate: &mut AutoRotateController,
        spherical: &mut SphericalState,
    ) {
        auto_rotate.pause(now_ms);
        spherical.sync_from_offset(controls.offset(), self.min_radius);
        tracing::debug!(?spherical, "拖拽开始，暂停自动旋转");
    }

    /// 拖拽过程：覆盖写入最新的球面坐标
    pub fn on_drag_change(&self, controls: &OrbitControls, spherical: &mut SphericalState) {
        spherical.sync_from_offset(controls.offset(), self.min_radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_rotate::RotationMode;
    use crate::config::ControlsConfig;
    use glam::{Vec2, Vec3};

    fn setup() -> (OrbitInputTracker, OrbitControls, AutoRotateController, SphericalState) {
        let controls = OrbitControls::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, ControlsConfig::default());
        let spherical = SphericalState::from_offset(controls.offset()).unwrap();
        (OrbitInputTracker::new(2.0), controls, AutoRotateController::new(3000.0), spherical)
    }

    #[test]
    fn drag_start_pauses_rotation() {
        let (tracker, mut controls, mut auto, mut spherical) = setup();
        auto.arm();
        let event = controls.pointer_down().unwrap();
        assert!(tracker.handle(event, 100.0, &controls, &mut auto, &mut spherical));
        assert_eq!(auto.mode(), RotationMode::Paused);
        assert_eq!(auto.resume_deadline(), Some(3100.0));
    }

    #[test]
    fn drag_change_mirrors_camera() {
        let (tracker, mut controls, mut auto, mut spherical) = setup();
        controls.config.enable_damping = false;
        controls.pointer_down();
        let event = controls.pointer_move(Vec2::new(200.0, -60.0), 800.0).unwrap();
        tracker.handle(event, 0.0, &controls, &mut auto, &mut spherical);
        assert!((spherical.to_offset() - controls.offset()).length() < 1e-4);
    }

    #[test]
    fn drag_end_has_no_effect() {
        let (tracker, _controls, mut auto, mut spherical) = setup();
        let controls = OrbitControls::new(Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO, ControlsConfig::default());
        let before = spherical;
        assert!(!tracker.handle(ControlEvent::End, 0.0, &controls, &mut auto, &mut spherical));
        assert_eq!(spherical, before);
        assert_eq!(auto.mode(), RotationMode::Idle);
    }

    #[test]
    fn disabled_tracker_ignores_events() {
        let (mut tracker, mut controls, mut auto, mut spherical) = setup();
        tracker.set_enabled(false);
        controls.position = Vec3::new(3.0, 0.0, 0.0);
        let before = spherical;
        assert!(!tracker.handle(ControlEvent::Start, 0.0, &controls, &mut auto, &mut spherical));
        assert!(!tracker.handle(ControlEvent::Change, 0.0, &controls, &mut auto, &mut spherical));
        assert_eq!(spherical, before);
        assert_eq!(auto.mode(), RotationMode::Idle);
    }
}
