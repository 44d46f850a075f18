// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

//! Injectable time source. `now` is read exactly once per verification,
//! not once per check, so that `created`/`expires`/max-age/max-skew are
//! evaluated against a single consistent instant.

use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock {
    fn now_unix_seconds(&self) -> i64;
}

/// The default collaborator, backed by the OS clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_seconds(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A test double returning a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix_seconds(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_constant() {
        let clock = FixedClock(1_700_000_000);
        assert_eq!(clock.now_unix_seconds(), 1_700_000_000);
        assert_eq!(clock.now_unix_seconds(), 1_700_000_000);
    }
}
