//! 轻量诊断门面：本 crate 热路径（yield/consume）不产生任何日志调用，
//! 仅在中止路径（违反 I5 等不可恢复的程序员错误）记录一条结构化诊断。
//!
//! # 设计背景（Why）
//! - 完整的可观测性门面（Span、Trace、指标）超出本 crate 的职责范围；
//!   但"中止前先留痕"是这个谱系里的惯例，否则进程中止后排障只能靠核心转储。
//! - 保持 `no_std + alloc` 可用，因此不直接依赖 `tracing`/`log` 这类需要全局注册表的 crate。
//!
//! # 契约说明（What）
//! - [`Logger::log`] 必须是同步、非阻塞、且不会重新进入本 crate 任何锁的调用；
//! - 默认实现 [`NoopLogger`] 在非 `std` 构建下依旧可用。

use core::fmt;

/// 单条结构化诊断记录。
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    /// 静态诊断信息，说明触发中止的不变量。
    pub message: &'a str,
    /// 触发中止的组件名，便于跨多个流实例区分日志来源。
    pub component: &'a str,
}

impl<'a> LogRecord<'a> {
    pub const fn new(component: &'a str, message: &'a str) -> Self {
        Self { component, message }
    }
}

impl<'a> fmt::Display for LogRecord<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.message)
    }
}

/// 诊断门面，调用方可以注入自己的日志后端。
///
/// # 契约说明（What）
/// - `log` 仅在中止路径调用，允许分配与阻塞 I/O（例如刷盘），因为调用之后进程即将终止；
/// - 实现必须是 `Send + Sync`，因为中止可能发生在生产者线程或消费者任务上。
pub trait Logger: Send + Sync {
    fn log(&self, record: LogRecord<'_>);
}

/// 默认门面：丢弃所有诊断记录。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    #[inline]
    fn log(&self, _record: LogRecord<'_>) {}
}

/// `std` 环境下的参考实现：把诊断记录写到标准错误。
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

#[cfg(feature = "std")]
impl Logger for StderrLogger {
    fn log(&self, record: LogRecord<'_>) {
        eprintln!("{record}");
    }
}

/// 程序员错误中止路径：记录诊断后 panic。
///
/// # 设计背景（Why）
/// - I5（单一消费者）等不变量一旦被打破，意味着调用方代码本身有缺陷，继续运行只会扩大损害；
///   规范要求"中止进程"而非返回错误，因为这类条件不可恢复也不应被 `catch_unwind` 吞掉。
///
/// # 契约说明（What）
/// - 记录一条 [`LogRecord`]，随后 panic；在 `panic = "abort"` 构建下等价于立即中止进程。
#[track_caller]
pub fn programmer_error(logger: &dyn Logger, component: &'static str, message: &'static str) -> ! {
    logger.log(LogRecord::new(component, message));
    panic!("spark-stream programmer error in {component}: {message}");
}
