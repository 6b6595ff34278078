//! Constants shared by the site builder and the CLI.

/// Multiplier applied to the CPU core count for the default number of
/// pages rendered at once.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Core count used when `std::thread::available_parallelism()` fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default number of pages rendered concurrently by `sitegen build`.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(FALLBACK_CORE_COUNT, std::num::NonZero::get)
        * PARALLELISM_CORE_MULTIPLIER
}
