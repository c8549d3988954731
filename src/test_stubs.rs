//! 参考策略与 delegate 桩：不代表推荐的生产实现，只是让
//! [`crate::make_stream`] 在没有外部协作者、或者在测试里，也能直接用起来。

use alloc::vec::Vec;

use crate::delegate::Delegate;
use crate::strategy::BackPressureStrategy;

/// 永远允许生产者继续生产；适合消费者明显快于生产者的场景，或者单纯作为
/// 测试里的"无背压"基线。
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysProduceMore;

impl BackPressureStrategy for AlwaysProduceMore {
    fn on_yield(&mut self, _depth: usize) -> bool {
        true
    }
    fn on_consume(&mut self, _depth: usize) -> bool {
        true
    }
}

/// 高低水位策略：深度达到 `high` 时要求暂停，回落到 `low` 及以下才恢复生产。
///
/// `low` 与 `high` 之间是滞回区：深度落在区间内部时维持上一次的决定，避免在
/// 临界值附近来回抖动。
#[derive(Debug, Clone, Copy)]
pub struct HighLowWatermark {
    high: usize,
    low: usize,
    producing: bool,
}

impl HighLowWatermark {
    /// `low` 应当严格小于 `high`；否则策略退化为在单一阈值上开关。
    pub const fn new(low: usize, high: usize) -> Self {
        Self {
            high,
            low,
            producing: true,
        }
    }

    fn update(&mut self, depth: usize) -> bool {
        if depth >= self.high {
            self.producing = false;
        } else if depth <= self.low {
            self.producing = true;
        }
        self.producing
    }
}

impl BackPressureStrategy for HighLowWatermark {
    fn on_yield(&mut self, depth: usize) -> bool {
        self.update(depth)
    }
    fn on_consume(&mut self, depth: usize) -> bool {
        self.update(depth)
    }
}

/// 什么都不做的 delegate：生产者自行轮询、不关心回调时使用。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelegate;

impl Delegate for NoopDelegate {
    fn produce_more(&self) {}
    fn did_terminate(&self) {}
}

/// [`RecordingDelegate`] 记录下的单条回调事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedEvent {
    ProduceMore,
    DidTerminate,
}

/// 记录每次回调的 delegate，便于在测试里断言调用顺序与次数。
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    events: spin::Mutex<Vec<RecordedEvent>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回到目前为止记录到的事件快照。
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }
}

impl Delegate for RecordingDelegate {
    fn produce_more(&self) {
        self.events.lock().push(RecordedEvent::ProduceMore);
    }

    fn did_terminate(&self) {
        self.events.lock().push(RecordedEvent::DidTerminate);
    }
}
