//! 基础设施层 - 用户目录和订阅存储

pub mod directory;
pub mod store;

pub use directory::{StaticUserDirectory, UserDirectory};
pub use store::{normalize_namespaced_project, StaticSubscriptionStore, SubscriptionStore};
