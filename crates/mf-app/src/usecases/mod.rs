//! Business logic use cases
//! 导航相关的用例都在 `navigation` 下。

pub mod navigation;
