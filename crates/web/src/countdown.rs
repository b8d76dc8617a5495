//! Time-driven QR countdown stream.
//!
//! Yields the starting value immediately, then one decremented value per
//! period until zero, then ends. The stream owns its interval: dropping it
//! (the client disconnecting from the event stream) stops the timer.

use std::time::Duration;

use futures::Stream;
use pedalhub_core::QrCountdown;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Tick period used for the bank-transfer page.
pub const TICK: Duration = Duration::from_secs(1);

struct Ticking {
    countdown: QrCountdown,
    interval: Interval,
    started: bool,
}

/// Stream of remaining seconds: `start, start - 1, ..., 0`.
pub fn countdown_stream(countdown: QrCountdown, period: Duration) -> impl Stream<Item = u32> {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let initial = Ticking {
        countdown,
        interval,
        started: false,
    };

    futures::stream::unfold(Some(initial), |state| async move {
        let mut ticking = state?;
        if ticking.started {
            ticking.interval.tick().await;
            ticking.countdown.tick();
        }
        ticking.started = true;

        let remaining = ticking.countdown.remaining();
        let next = (!ticking.countdown.is_expired()).then_some(ticking);
        Some((remaining, next))
    })
}
