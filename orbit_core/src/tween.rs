//! 相机位置补间

use glam::Vec3;
use serde::Deserialize;

/// 缓动曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Easing {
    Linear,
    /// 二次缓出 (power2.out)
    #[default]
    Power2Out,
    /// 二次缓入缓出
    Power2InOut,
}

impl Easing {
    /// 将 `[0, 1]` 的线性进度映射为缓动进度
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power2Out => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::Power2InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// 补间的一步采样
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenStep {
    pub value: Vec3,
    pub finished: bool,
}

/// 从 `from` 到 `to` 的定时插值
#[derive(Debug, Clone, PartialEq)]
pub struct Vec3Tween {
    from: Vec3,
    to: Vec3,
    start_ms: f64,
    duration_ms: f64,
    easing: Easing,
}

impl Vec3Tween {
    pub fn new(from: Vec3, to: Vec3, start_ms: f64, duration_s: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: f64::from(duration_s.max(0.0)) * 1000.0,
            easing,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.to
    }

    /// 在 `now_ms` 采样；到达时长后精确返回终点
    pub fn sample(&self, now_ms: f64) -> TweenStep {
        let elapsed = now_ms - self.start_ms;
        if self.duration_ms <= 0.0 || elapsed >= self.duration_ms {
            return TweenStep {
                value: self.to,
                finished: true,
            };
        }
        let progress = (elapsed.max(0.0) / self.duration_ms) as f32;
        TweenStep {
            value: self.from.lerp(self.to, self.easing.apply(progress)),
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for easing in [Easing::Linear, Easing::Power2Out, Easing::Power2InOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert!((Easing::Power2Out.apply(0.5) - 0.75).abs() < 1e-6);
        assert!((Easing::Power2InOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tween_reaches_target_exactly() {
        let tween = Vec3Tween::new(Vec3::new(3.0, 1.0, 2.0), Vec3::new(0.0, 0.0, 5.0), 1000.0, 0.5, Easing::Power2Out);
        let mid = tween.sample(1250.0);
        assert!(!mid.finished);
        assert!((mid.value - Vec3::new(0.75, 0.25, 4.25)).length() < 1e-4);
        let end = tween.sample(1500.0);
        assert!(end.finished);
        assert_eq!(end.value, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let tween = Vec3Tween::new(Vec3::ONE, Vec3::ZERO, 0.0, 0.0, Easing::Linear);
        assert!(tween.sample(0.0).finished);
    }
}
