//! Constants for the download module (timeouts, backoff ranges).

use std::time::Duration;

/// Total timeout for a single GET request, body included (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ordinary failures (non-429 status, transport errors) tolerated before a task gives up.
pub const MAX_FAILED_ATTEMPTS: u32 = 10;

/// Base delay range for a 429 response.
pub const RATE_LIMIT_BASE: (Duration, Duration) = (Duration::from_secs(10), Duration::from_secs(30));

/// Per-attempt growth range added to the 429 base delay.
pub const RATE_LIMIT_STEP: (Duration, Duration) = (Duration::from_secs(5), Duration::from_secs(15));

/// Delay range after a non-200, non-429 status.
pub const STATUS_RETRY_DELAY: (Duration, Duration) = (Duration::from_secs(2), Duration::from_secs(8));

/// Delay range after a transport error.
pub const TRANSPORT_RETRY_DELAY: (Duration, Duration) =
    (Duration::from_secs(3), Duration::from_secs(10));
