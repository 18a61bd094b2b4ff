pub mod steering;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log a message every 100 steering ticks when the `perf_stats` feature is enabled.
///
/// `$tick` is anything with a `.0: u64` field, normally `Res<SteerTick>`.
/// Without the feature this expands to an empty block and the arguments are
/// never evaluated.
///
/// # Example
/// ```ignore
/// profile_log!(tick, "[STEERING] Agents: {}", query.iter().len());
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick.0 % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
