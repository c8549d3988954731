//! 常用类型的一站式导入：`use spark_stream::prelude::*;`

pub use crate::config::StreamOptions;
pub use crate::delegate::Delegate;
#[cfg(feature = "std")]
pub use crate::diagnostics::StderrLogger;
pub use crate::diagnostics::{LogRecord, Logger, NoopLogger};
pub use crate::source::{Source, YieldResult};
pub use crate::storage::make_stream;
pub use crate::strategy::BackPressureStrategy;
pub use crate::stream::Stream;
pub use crate::stream_iterator::StreamIterator;
