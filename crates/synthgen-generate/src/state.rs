//! Run-wide mutable state shared by every record and every worker.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use chrono_tz::Tz;

use crate::calendar::TimeUnit;
use crate::errors::GenerationError;

/// Value returned by the first `seq` call when no seed is given.
pub const SEQUENCE_INITIAL: i64 = 1;

/// Sequence and date-time cursor state for one run.
#[derive(Debug, Default)]
pub struct GeneratorState {
    sequence: SequenceCounter,
    cursor: DateTimeCursor,
}

impl GeneratorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(&self) -> &SequenceCounter {
        &self.sequence
    }

    pub fn cursor(&self) -> &DateTimeCursor {
        &self.cursor
    }

    pub fn reset(&self) {
        self.sequence.reset();
        self.cursor.reset();
    }
}

#[derive(Debug)]
struct SequenceInner {
    next: i64,
    started: bool,
}

/// Monotonic counter behind `seq`.
///
/// The first call may seed the counter; later calls ignore their argument
/// and post-increment.
#[derive(Debug)]
pub struct SequenceCounter {
    inner: Mutex<SequenceInner>,
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self {
            inner: Mutex::new(SequenceInner {
                next: SEQUENCE_INITIAL,
                started: false,
            }),
        }
    }
}

impl SequenceCounter {
    pub fn next(&self, seed: Option<i64>) -> i64 {
        let mut inner = lock(&self.inner);
        if !inner.started {
            inner.started = true;
            if let Some(seed) = seed {
                inner.next = seed;
            }
        }
        let value = inner.next;
        inner.next = inner.next.saturating_add(1);
        value
    }

    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        inner.next = SEQUENCE_INITIAL;
        inner.started = false;
    }
}

#[derive(Debug, Clone, Copy)]
struct CursorInner {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    emitted: bool,
}

/// Persisted `(start, end)` pair behind `datetime_seq`.
///
/// Both ends start at "now" on first use. `end` then tracks the last emitted
/// value so that every call moves strictly forward: a re-derived start
/// (`now-N`) is taken as-is before the first emission and afterwards only
/// when it lies ahead of the cursor.
#[derive(Debug, Default)]
pub struct DateTimeCursor {
    inner: Mutex<Option<CursorInner>>,
}

impl DateTimeCursor {
    pub fn advance(
        &self,
        now: DateTime<Tz>,
        rederived: Option<DateTime<Tz>>,
        unit: TimeUnit,
        step: i64,
    ) -> Result<DateTime<Tz>, GenerationError> {
        let zone = now.timezone();
        let mut guard = lock(&self.inner);
        let state = guard.get_or_insert(CursorInner {
            start: now,
            end: now,
            emitted: false,
        });

        let mut start = state.start.with_timezone(&zone);
        let end = state.end.with_timezone(&zone);
        if let Some(candidate) = rederived
            && (!state.emitted || candidate > start)
        {
            start = candidate;
        }
        if start <= end {
            start = unit.shift(start, step).ok_or_else(|| {
                GenerationError::argument("datetime_seq", "cursor moved out of range")
            })?;
        }

        state.start = start;
        state.end = start;
        state.emitted = true;
        Ok(start)
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.inner).is_some()
    }

    pub fn reset(&self) {
        *lock(&self.inner) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn first_seq_argument_seeds_counter() {
        let counter = SequenceCounter::default();
        assert_eq!(counter.next(Some(100)), 100);
        assert_eq!(counter.next(Some(7)), 101);
        assert_eq!(counter.next(None), 102);
        counter.reset();
        assert_eq!(counter.next(None), SEQUENCE_INITIAL);
    }

    #[test]
    fn cursor_never_moves_backward() {
        let cursor = DateTimeCursor::default();
        let now = Tz::UTC
            .with_ymd_and_hms(2024, 3, 10, 12, 0, 0)
            .single()
            .expect("now");
        let past = now - chrono::TimeDelta::days(5);

        let first = cursor
            .advance(now, Some(past), TimeUnit::Day, 1)
            .expect("first");
        assert_eq!(first, past + chrono::TimeDelta::days(1));

        let second = cursor
            .advance(now, Some(past), TimeUnit::Day, 1)
            .expect("second");
        assert_eq!(second, first + chrono::TimeDelta::days(1));
    }
}
