//! QR-code validity countdown.
//!
//! The countdown is cosmetic: reaching zero never invalidates or re-requests
//! the QR code. The web crate drives it with a one-second interval.

use std::fmt;

/// How long a bank-transfer QR code is shown as valid (15 minutes).
pub const QR_VALIDITY_SECS: u32 = 15 * 60;

/// Seconds remaining on a QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrCountdown {
    remaining: u32,
}

impl QrCountdown {
    /// Start a countdown at [`QR_VALIDITY_SECS`].
    #[must_use]
    pub const fn start() -> Self {
        Self::from_secs(QR_VALIDITY_SECS)
    }

    /// Start a countdown at an arbitrary number of seconds.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self { remaining: secs }
    }

    /// Advance by one second. Saturates at zero.
    ///
    /// Returns the new remaining value.
    pub const fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

impl Default for QrCountdown {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for QrCountdown {
    /// `MM:SS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_fifteen_minutes() {
        let countdown = QrCountdown::start();
        assert_eq!(countdown.remaining(), 900);
        assert_eq!(countdown.to_string(), "15:00");
    }

    #[test]
    fn test_decreases_by_one_until_zero() {
        let mut countdown = QrCountdown::start();
        let mut previous = countdown.remaining();
        while !countdown.is_expired() {
            let next = countdown.tick();
            assert_eq!(next, previous - 1);
            previous = next;
        }
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(countdown.to_string(), "00:00");
    }

    #[test]
    fn test_never_goes_negative() {
        let mut countdown = QrCountdown::from_secs(1);
        assert_eq!(countdown.tick(), 0);
        assert_eq!(countdown.tick(), 0);
        assert!(countdown.is_expired());
    }

    #[test]
    fn test_display_pads_seconds() {
        assert_eq!(QrCountdown::from_secs(65).to_string(), "01:05");
    }
}
