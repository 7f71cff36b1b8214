mod maths_utils;
mod perf;
mod time_utils;

pub type AppInstant = std::time::Instant;

pub use time_utils::{
    TimeUtils, date_to_epoch_ms, epoch_ms_to_date, epoch_ms_to_utc, now_utc, parse_timestamp_ms,
};

pub use maths_utils::{mean_and_stddev, round_dp};
pub(crate) use maths_utils::{centered_window, get_max, get_min, normalize_max, trailing_mean};
