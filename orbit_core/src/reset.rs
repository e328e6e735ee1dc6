//! 视角复位序列
//!
//! 复位一旦开始必须完整执行：期间关闭拖拽输入、停止自动旋转，
//! 相机补间回初始位置，结束时才重写球面坐标。

use crate::auto_rotate::AutoRotateController;
use crate::config::{InitialState, TweenConfig};
use crate::controls::OrbitControls;
use crate::error::ViewerError;
use crate::input::OrbitInputTracker;
use crate::model::SceneModel;
use crate::spherical::SphericalState;
use crate::tween::Vec3Tween;

/// 复位过程中需要改写的部件
pub struct ResetParts<'a, M> {
    pub controls: &'a mut OrbitControls,
    pub tracker: &'a mut OrbitInputTracker,
    pub spherical: &'a mut SphericalState,
    pub model: Option<&'a mut M>,
    pub initial: &'a InitialState,
}

/// 每帧推进的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    /// 没有进行中的复位
    Idle,
    /// 补间进行中，只改变了画面
    Running,
    /// 本帧完成，球面坐标已重新建立
    Finished,
}

/// 复位序列
#[derive(Debug, Clone)]
pub struct ResetSequencer {
    tween: Option<Vec3Tween>,
    config: TweenConfig,
}

impl ResetSequencer {
    pub fn new(config: TweenConfig) -> Self {
        Self { tween: None, config }
    }

    pub fn is_running(&self) -> bool {
        self.tween.is_some()
    }

    /// 开始复位
    ///
    /// 已在复位中返回 `Busy`，有模型在加载返回 `AlreadyLoading`，两者都不产生任何影响。
    pub fn begin(
        &mut self,
        now_ms: f64,
        model_loading: bool,
        controls: &mut OrbitControls,
        tracker: &mut OrbitInputTracker,
        auto_rotate: &mut AutoRotateController,
        initial: &InitialState,
    ) -> Result<(), ViewerError> {
        if self.is_running() {
            tracing::warn!("视角复位进行中，忽略重复请求");
            return Err(ViewerError::Busy);
        }
        if model_loading {
            tracing::warn!("模型正在加载中，暂不复位");
            return Err(ViewerError::AlreadyLoading);
        }

        auto_rotate.stop();
        tracker.set_enabled(false);
        controls.enabled = false;
        controls.stop_motion();

        self.tween = Some(Vec3Tween::new(
            controls.position,
            initial.camera_position,
            now_ms,
            self.config.duration_s,
            self.config.easing,
        ));
        tracing::info!("开始复位视角");
        Ok(())
    }

    /// 推进补间；完成时恢复模型变换与拖拽输入并重建球面坐标
    pub fn step<M: SceneModel>(&mut self, now_ms: f64, parts: ResetParts<'_, M>) -> ResetStep {
        let Some(tween) = &self.tween else {
            return ResetStep::Idle;
        };
        let sample = tween.sample(now_ms);

        let ResetParts {
            controls,
            tracker,
            spherical,
            model,
            initial,
        } = parts;

        controls.position = sample.value;
        controls.target = initial.controls_target;
        if !sample.finished {
            return ResetStep::Running;
        }

        self.tween = None;
        if let Some(model) = model {
            model.set_transform(initial.model_transform());
        }
        controls.reset();
        controls.enabled = true;
        tracker.set_enabled(true);
        spherical.sync_from_offset(controls.offset(), controls.config.min_distance);
        tracing::info!(?spherical, "视角复位完成");
        ResetStep::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_rotate::RotationMode;
    use crate::config::ViewerConfig;
    use crate::model::tests::TestModel;
    use glam::Vec3;

    struct Rig {
        controls: OrbitControls,
        tracker: OrbitInputTracker,
        auto: AutoRotateController,
        spherical: SphericalState,
        model: TestModel,
        initial: InitialState,
        seq: ResetSequencer,
    }

    fn rig() -> Rig {
        let config = ViewerConfig::default();
        let mut controls = OrbitControls::new(config.initial.camera_position, Vec3::ZERO, config.controls);
        controls.save_state();
        controls.position = Vec3::new(3.0, 2.0, 3.0);
        Rig {
            spherical: SphericalState::from_offset(controls.offset()).unwrap(),
            controls,
            tracker: OrbitInputTracker::new(2.0),
            auto: AutoRotateController::new(3000.0),
            model: TestModel::new("red"),
            initial: config.initial,
            seq: ResetSequencer::new(config.reset_tween),
        }
    }

    fn step(r: &mut Rig, now: f64) -> ResetStep {
        r.seq.step(
            now,
            ResetParts {
                controls: &mut r.controls,
                tracker: &mut r.tracker,
                spherical: &mut r.spherical,
                model: Some(&mut r.model),
                initial: &r.initial,
            },
        )
    }

    #[test]
    fn begin_disables_input_and_stops_rotation() {
        let mut r = rig();
        r.auto.arm();
        r.seq
            .begin(0.0, false, &mut r.controls, &mut r.tracker, &mut r.auto, &r.initial)
            .unwrap();
        assert!(r.seq.is_running());
        assert!(!r.controls.enabled);
        assert!(!r.tracker.is_enabled());
        assert_eq!(r.auto.mode(), RotationMode::Idle);
    }

    #[test]
    fn rejects_second_request_and_loading() {
        let mut r = rig();
        assert_eq!(
            r.seq.begin(0.0, true, &mut r.controls, &mut r.tracker, &mut r.auto, &r.initial),
            Err(ViewerError::AlreadyLoading)
        );
        assert!(r.controls.enabled);
        r.seq
            .begin(0.0, false, &mut r.controls, &mut r.tracker, &mut r.auto, &r.initial)
            .unwrap();
        assert_eq!(
            r.seq.begin(10.0, false, &mut r.controls, &mut r.tracker, &mut r.auto, &r.initial),
            Err(ViewerError::Busy)
        );
    }

    #[test]
    fn spherical_untouched_until_completion() {
        let mut r = rig();
        let before = r.spherical;
        r.seq
            .begin(0.0, false, &mut r.controls, &mut r.tracker, &mut r.auto, &r.initial)
            .unwrap();
        assert_eq!(step(&mut r, 250.0), ResetStep::Running);
        assert_eq!(r.spherical, before);
        assert_ne!(r.controls.position, Vec3::new(3.0, 2.0, 3.0));

        assert_eq!(step(&mut r, 500.0), ResetStep::Finished);
        assert_eq!(r.controls.position, Vec3::new(0.0, 0.0, 5.0));
        assert!((r.spherical.radius - 5.0).abs() < 1e-4);
        assert!(r.spherical.azimuth_angle.abs() < 1e-4);
        assert_eq!(r.model.transform, r.initial.model_transform());
        assert!(r.controls.enabled);
        assert!(r.tracker.is_enabled());
        assert_eq!(step(&mut r, 600.0), ResetStep::Idle);
    }
}
