use crate::strategy::NotificationStrategy;
use serde::{Deserialize, Serialize};

/// 管道配置
///
/// 可直接构造，也可从宿主应用的配置文件反序列化（缺省字段取默认值）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 同一通知的多个监听器如何执行，默认 `StopOnError`（快速失败）
    pub notification_strategy: NotificationStrategy,
}
