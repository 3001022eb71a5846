use crate::Category;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{Instant, sleep_until};

/// Requests-per-second budget for each [`Category`]. Zero means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimits {
    pub download: u32,
    pub list: u32,
    pub search: u32,
}

impl RateLimits {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Download => self.download,
            Category::List => self.list,
            Category::Search => self.search,
        }
    }
}

/// Pacing clock for a single category.
#[derive(Debug)]
struct Clock {
    limit: u32,
    next_available: Instant,
}

impl Clock {
    /// Minimum spacing between two admitted requests.
    fn interval(&self) -> Duration {
        Duration::from_millis((1000 / u64::from(self.limit)).max(1))
    }
}

/// One independent queue per category.
///
/// `turn` is the tail of the queue: whoever holds it is the only caller of
/// this category allowed to reserve a slot and wait for it. The clock sits
/// behind a plain mutex that is never held across an `.await`, so
/// [`Throttle::set_limit`] can stay synchronous.
#[derive(Debug)]
struct Lane {
    turn: AsyncMutex<()>,
    clock: Mutex<Clock>,
}

impl Lane {
    fn new(now: Instant) -> Self {
        Self {
            turn: AsyncMutex::new(()),
            clock: Mutex::new(Clock { limit: 0, next_available: now }),
        }
    }

    // A caller that panicked while holding the clock can't leave it in a
    // half-written state (every write is a single assignment), so carry on.
    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve the next slot, returning when the caller may proceed, or
    /// `None` if the category is unlimited.
    fn reserve(&self, now: Instant) -> Option<Instant> {
        let mut clock = self.clock();
        if clock.limit == 0 {
            return None;
        }
        if clock.next_available < now {
            clock.next_available = now;
        }
        let slot = clock.next_available;
        clock.next_available = slot + clock.interval();
        Some(slot)
    }
}

/// Per-category request pacer.
///
/// Every category starts out unlimited. Once a limit is set, callers of
/// [`acquire`](Self::acquire) for that category are admitted strictly in
/// arrival order and at least `max(1ms, 1000ms / limit)` apart, no matter
/// how many of them are queued. Categories never block each other.
///
/// Dropping an `acquire` future (because the request it guards was
/// abandoned, or the caller errored) releases its place in the queue; the
/// slot it reserved stays consumed, and the category remains usable.
///
/// # Examples
///
/// ```
/// use parcel_throttle::{Category, Throttle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let throttle = Throttle::new();
/// throttle.set_limit(Category::List, 5);
/// throttle.acquire(Category::List).await; // admitted immediately
/// throttle.acquire(Category::List).await; // admitted ~200ms later
/// throttle.acquire(Category::Download).await; // unlimited, no wait
/// # }
/// ```
#[derive(Debug)]
pub struct Throttle {
    lanes: [Lane; 3],
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new()
    }
}

impl Throttle {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            lanes: [Lane::new(now), Lane::new(now), Lane::new(now)],
        }
    }

    /// Create a throttle with limits already applied.
    pub fn with_limits(limits: RateLimits) -> Self {
        let throttle = Self::new();
        throttle.set_limits(limits);
        throttle
    }

    fn lane(&self, category: Category) -> &Lane {
        &self.lanes[category.index()]
    }

    /// Current requests-per-second limit of a category (zero is unlimited).
    pub fn limit(&self, category: Category) -> u32 {
        self.lane(category).clock().limit
    }

    /// Change a category's limit and restart its pacing clock from now.
    ///
    /// Callers already waiting keep the slot they reserved; the next caller
    /// to arrive is paced from the new clock.
    pub fn set_limit(&self, category: Category, requests_per_second: u32) {
        let mut clock = self.lane(category).clock();
        clock.limit = requests_per_second;
        clock.next_available = Instant::now();
        tracing::debug!(%category, limit = requests_per_second, "Request limit updated");
    }

    /// Apply limits to all categories at once, e.g. after the effective user
    /// permissions changed.
    pub fn set_limits(&self, limits: RateLimits) {
        for category in Category::ALL {
            self.set_limit(category, limits.get(category));
        }
    }

    /// Wait until a request of `category` may be sent.
    pub async fn acquire(&self, category: Category) {
        let lane = self.lane(category);
        if lane.clock().limit == 0 {
            return;
        }
        let _turn = lane.turn.lock().await;
        // Re-read under our turn: the limit may have been lifted while queued.
        let now = Instant::now();
        let Some(slot) = lane.reserve(now) else {
            return;
        };
        if slot > now {
            tracing::debug!(%category, wait_ms = (slot - now).as_millis() as u64, "Waiting for request slot");
            sleep_until(slot).await;
        }
    }
}
