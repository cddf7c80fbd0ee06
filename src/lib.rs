pub mod math;
pub mod nav;
pub mod terrain;

// ============================================================================
// Generation Progress Macros
// ============================================================================

/// Conditionally log per-block progress while the navigation mesh is built.
///
/// This macro logs a message every 64 processed blocks. When the gen_stats
/// feature is disabled, this macro compiles to nothing - zero runtime cost.
///
/// # Example
/// ```ignore
/// gen_progress_log!(block_index, "compressed {} leaves", leaf_count);
/// ```
///
/// # Zero-Cost Abstraction
/// When compiled without the `gen_stats` feature, this expands to an empty
/// block. Even the arguments (e.g., `leaf_count`) are not evaluated.
#[macro_export]
#[cfg(feature = "gen_stats")]
macro_rules! gen_progress_log {
    ($block:expr, $($arg:tt)*) => {
        if $block % 64 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "gen_stats"))]
macro_rules! gen_progress_log {
    ($block:expr, $($arg:tt)*) => {};
}
