//! Shim module to abstract over std and loom primitives.
//!
//! The ring only touches atomics, `Arc` and the spin hint through this module, so the
//! whole algorithm can be model checked by building with `--features loom`.
//!
//! 环形缓冲区只通过此模块访问原子类型、`Arc` 和自旋提示，
//! 因此使用 `--features loom` 构建即可对整个算法进行模型检查。

#[cfg(not(feature = "loom"))]
pub mod atomic {
    pub use std::sync::atomic::{AtomicUsize, Ordering};
}

#[cfg(feature = "loom")]
pub mod atomic {
    pub use loom::sync::atomic::{AtomicUsize, Ordering};
}

#[cfg(not(feature = "loom"))]
pub mod sync {
    pub use std::sync::Arc;
}

#[cfg(feature = "loom")]
pub mod sync {
    pub use loom::sync::Arc;
}

#[cfg(not(feature = "loom"))]
pub use std::hint::spin_loop;

#[cfg(feature = "loom")]
pub use loom::hint::spin_loop;
