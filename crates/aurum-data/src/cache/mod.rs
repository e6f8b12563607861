//! 갭 조정 캐시.

mod reconciler;

pub use reconciler::{CachedCandleProvider, CoverageGap, ReconcilerConfig};
