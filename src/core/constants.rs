//! Shared constants used across the application

use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost:9000";
pub const WS_PATH: &str = "/ws";

/// Fixed delay between a transport close and the next connect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Space reserved for streaming indicator + margin in input areas
pub const INDICATOR_SPACE: u16 = 4;
