//! mapdesc-relay: map snapshot description relay for a local vision-language model
//! mapdesc-relay：面向本地视觉语言模型的地图快照描述中继

// Shared modules / 共享模块
pub mod config;

// Service-specific modules / 服务特定模块
pub mod relay;

// Re-exports / 重新导出
pub use config::*;
