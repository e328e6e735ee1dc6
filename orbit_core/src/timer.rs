//! 可取消定时器与节流门
//!
//! 查看器运行在单线程帧循环上，定时器不持有回调，只记录截止时间；
//! 由 `ViewerContext` 每帧用当前时间轮询并执行到期动作。

/// 可取消的单次定时器
///
/// 重新调度前总是先作废旧的截止时间，不会出现叠加的定时器。
#[derive(Debug, Clone, Default)]
pub struct CancellableTimer {
    deadline_ms: Option<f64>,
    generation: u64,
}

impl CancellableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消旧定时并在 `now_ms + delay_ms` 重新调度，返回新的代号
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64) -> u64 {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.deadline_ms = Some(now_ms + delay_ms.max(0.0));
        self.generation
    }

    /// 取消挂起的定时；返回之前是否有挂起
    pub fn cancel(&mut self) -> bool {
        self.deadline_ms.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// 当前代号，每次调度递增
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn deadline(&self) -> Option<f64> {
        self.deadline_ms
    }

    /// 距离到期的剩余时间
    pub fn remaining(&self, now_ms: f64) -> Option<f64> {
        self.deadline_ms.map(|d| (d - now_ms).max(0.0))
    }

    /// 到期则清除并返回 `true`，每次调度最多触发一次
    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

/// 节流门：触发后在间隔结束时执行一次，期间的触发全部忽略
#[derive(Debug, Clone)]
pub struct Throttle {
    interval_ms: f64,
    timer: CancellableTimer,
}

impl Throttle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            timer: CancellableTimer::new(),
        }
    }

    /// 请求一次执行；门已关闭时返回 `false`
    pub fn trigger(&mut self, now_ms: f64) -> bool {
        if self.timer.is_pending() {
            return false;
        }
        self.timer.schedule(now_ms, self.interval_ms);
        true
    }

    /// 间隔结束时返回 `true` 并重新打开门
    pub fn poll(&mut self, now_ms: f64) -> bool {
        self.timer.fire_if_due(now_ms)
    }

    pub fn is_waiting(&self) -> bool {
        self.timer.is_pending()
    }

    /// 放弃挂起的执行
    pub fn clear(&mut self) {
        self.timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let mut timer = CancellableTimer::new();
        timer.schedule(100.0, 3000.0);
        assert!(!timer.fire_if_due(3099.0));
        assert!(timer.fire_if_due(3100.0));
        assert!(!timer.fire_if_due(5000.0));
        assert!(!timer.is_pending());
    }

    #[test]
    fn reschedule_replaces_previous_deadline() {
        let mut timer = CancellableTimer::new();
        let first = timer.schedule(0.0, 3000.0);
        let second = timer.schedule(1000.0, 3000.0);
        assert_ne!(first, second);
        assert!(!timer.fire_if_due(3000.0));
        assert!(timer.fire_if_due(4000.0));
    }

    #[test]
    fn cancel_reports_pending_state() {
        let mut timer = CancellableTimer::new();
        assert!(!timer.cancel());
        timer.schedule(0.0, 10.0);
        assert_eq!(timer.remaining(4.0), Some(6.0));
        assert!(timer.cancel());
        assert_eq!(timer.remaining(4.0), None);
    }

    #[test]
    fn throttle_ignores_triggers_until_interval_elapses() {
        let mut gate = Throttle::new(50.0);
        assert!(gate.trigger(0.0));
        assert!(!gate.trigger(10.0));
        assert!(!gate.trigger(49.0));
        assert!(!gate.poll(49.0));
        assert!(gate.poll(50.0));
        assert!(gate.trigger(51.0));
        assert!(gate.is_waiting());
    }
}
