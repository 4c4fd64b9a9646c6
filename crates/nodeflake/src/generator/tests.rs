use core::time::Duration;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, mpsc},
    thread::{self, scope},
};

use portable_atomic::{AtomicU64, Ordering};

use crate::{
    Error, Generator, Granularity, IdGenStatus, ManualClock, MonotonicClock, Result,
    SequenceCounter, SequenceStatus, SnowflakeId, StepClock, TimeSource,
};

struct FailingClock;

impl TimeSource for FailingClock {
    fn current_ticks(&self) -> Result<u64> {
        Err(Error::ClockUnavailable {
            reason: "rtc offline".into(),
        })
    }
}

trait IdGenStatusExt {
    fn unwrap_ready(self) -> SnowflakeId;
    fn unwrap_pending(self) -> Duration;
}

impl IdGenStatusExt for IdGenStatus {
    fn unwrap_ready(self) -> SnowflakeId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => panic!("unexpected pending (yield for: {yield_for:?})"),
        }
    }

    fn unwrap_pending(self) -> Duration {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn manual_generator(start: u64, node_id: u8, max_sequence: u16) -> (Generator<ManualClock>, ManualClock) {
    let clock = ManualClock::new(start);
    let generator = Generator::builder()
        .clock(clock.clone())
        .node_id(node_id)
        .max_sequence(max_sequence)
        .backoff(Duration::from_micros(200))
        .build()
        .unwrap();
    (generator, clock)
}

#[test]
fn golden_vector() {
    let (generator, _) = manual_generator(1_626_786_340_918, 128, SnowflakeId::MAX_ITERATION);
    let id = generator.next_id().unwrap();

    assert_eq!(id.iteration(), 1);
    assert_eq!(id.node_id(), 128);
    assert_eq!(id.timestamp(), 1_626_786_340_918);
    assert_eq!(id.seconds(generator.granularity()), 1_626_786_340);
    assert_eq!(id.to_string(), "6823236456859828225");
    assert_eq!(SnowflakeId::from_value(6_823_236_456_859_828_225), id);
}

#[test]
fn iteration_increments_within_same_tick() {
    let (generator, _) = manual_generator(42, 1, SnowflakeId::MAX_ITERATION);
    let id1 = generator.next_id().unwrap();
    let id2 = generator.next_id().unwrap();
    let id3 = generator.next_id().unwrap();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.iteration(), 1);
    assert_eq!(id2.iteration(), 2);
    assert_eq!(id3.iteration(), 3);
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn iteration_resets_when_tick_advances() {
    let (generator, clock) = manual_generator(42, 1, SnowflakeId::MAX_ITERATION);
    generator.next_id().unwrap();
    generator.next_id().unwrap();

    clock.advance(5);
    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), 47);
    assert_eq!(id.iteration(), 1);
}

#[test]
fn strictly_increasing_on_step_clock() {
    let generator = Generator::new(9, StepClock::new(1_000));
    let mut last = generator.next_id().unwrap();
    for _ in 0..10_000 {
        let id = generator.next_id().unwrap();
        assert!(id > last, "{id:?} <= {last:?}");
        assert_eq!(id.iteration(), 1);
        last = id;
    }
}

#[test]
fn strictly_increasing_on_monotonic_clock() {
    let generator = Generator::new(1, MonotonicClock::new());
    let mut last = generator.next_id().unwrap();
    for _ in 0..50_000 {
        let id = generator.next_id().unwrap();
        assert!(id > last);
        assert_eq!(id.node_id(), 1);
        last = id;
    }
}

#[test]
fn unique_under_contention() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 20_000;

    let generator = Generator::new(1, MonotonicClock::default());
    let seen = Arc::new(Mutex::new(HashSet::with_capacity(THREADS * IDS_PER_THREAD)));

    scope(|s| {
        for _ in 0..THREADS {
            let generator = generator.clone();
            let seen = Arc::clone(&seen);
            s.spawn(move || {
                let mut local = Vec::with_capacity(IDS_PER_THREAD);
                for _ in 0..IDS_PER_THREAD {
                    local.push(generator.next_id().unwrap());
                }
                // Each thread sees its own IDs in increasing order.
                assert!(local.windows(2).all(|w| w[0] < w[1]));
                seen.lock().unwrap().extend(local);
            });
        }
    });

    assert_eq!(seen.lock().unwrap().len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn distinct_nodes_never_collide_on_a_shared_tick() {
    let clock = ManualClock::new(1_337);
    let node1 = Generator::builder().clock(clock.clone()).node_id(1).build().unwrap();
    let node2 = Generator::builder().clock(clock).node_id(2).build().unwrap();

    let a = node1.next_id().unwrap();
    let b = node2.next_id().unwrap();
    assert_ne!(a, b);
    assert_eq!(a.timestamp(), b.timestamp());
    assert_eq!(a.iteration(), b.iteration());
    assert!(b > a);
}

#[test]
fn max_sequence_is_validated_at_build() {
    let err = Generator::builder().max_sequence(16_384).build().unwrap_err();
    assert_eq!(
        err,
        Error::SequenceRange {
            requested: 16_384,
            max: 16_383
        }
    );
    assert!(err.is_construction());

    let err = Generator::builder().max_sequence(0).build().unwrap_err();
    assert!(matches!(err, Error::SequenceRange { requested: 0, .. }));

    let generator = Generator::builder().max_sequence(16_383).build().unwrap();
    assert_eq!(generator.max_sequence(), 16_383);
}

#[test]
fn defaults() {
    let generator = Generator::builder().build().unwrap();
    assert_eq!(generator.node_id(), 1);
    assert_eq!(generator.max_sequence(), SnowflakeId::MAX_ITERATION);
    assert_eq!(generator.backoff(), crate::DEFAULT_BACKOFF);
    assert_eq!(generator.granularity(), Granularity::Milliseconds);
}

#[test]
fn node_identity_is_resolved_once() {
    let calls = Arc::new(Mutex::new(0));
    let counted = Arc::clone(&calls);
    let generator = Generator::builder()
        .clock(StepClock::new(1))
        .node_identity(move || -> Result<u8> {
            *counted.lock().unwrap() += 1;
            Ok(200)
        })
        .build()
        .unwrap();

    for _ in 0..10 {
        assert_eq!(generator.next_id().unwrap().node_id(), 200);
    }
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn node_identity_failure_fails_build() {
    let err = Generator::builder()
        .node_identity(|| -> Result<u8> {
            Err(Error::NodeIdentity {
                reason: "no MAC address".into(),
            })
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::NodeIdentity { .. }));
    assert!(err.is_construction());
}

#[test]
fn clock_regression_preserves_state() {
    let (generator, clock) = manual_generator(10, 1, SnowflakeId::MAX_ITERATION);
    let first = generator.next_id().unwrap();
    assert_eq!((first.timestamp(), first.iteration()), (10, 1));

    clock.set(6);
    let err = generator.next_id().unwrap_err();
    assert_eq!(err, Error::ClockRegression { now: 6, last: 10 });
    assert!(err.is_clock_regression());
    assert!(!err.is_construction());
    assert_eq!(generator.counter().last_issued().unwrap(), (10, 1));

    clock.set(10);
    let id = generator.next_id().unwrap();
    assert_eq!((id.timestamp(), id.iteration()), (10, 2));
    assert!(id > first);
}

#[test]
fn tick_beyond_timestamp_field_is_rejected() {
    let (generator, clock) = manual_generator(SnowflakeId::MAX_TIMESTAMP, 255, 16_383);
    let id = generator.next_id().unwrap();
    assert_eq!(id.timestamp(), SnowflakeId::MAX_TIMESTAMP);

    clock.advance(1);
    let err = generator.next_id().unwrap_err();
    assert!(matches!(err, Error::TimestampOverflow { tick, .. } if tick == SnowflakeId::MAX_TIMESTAMP + 1));
    assert_eq!(
        generator.counter().last_issued().unwrap(),
        (SnowflakeId::MAX_TIMESTAMP, 1)
    );
}

#[test]
fn clock_errors_propagate() {
    let generator = Generator::new(1, FailingClock);
    let err = generator.next_id().unwrap_err();
    assert!(matches!(err, Error::ClockUnavailable { .. }));
}

#[test]
fn try_next_id_reports_pending_when_exhausted() {
    let (generator, clock) = manual_generator(5, 3, 2);
    assert_eq!(generator.try_next_id().unwrap().unwrap_ready().iteration(), 1);
    assert_eq!(generator.try_next_id().unwrap().unwrap_ready().iteration(), 2);
    assert_eq!(
        generator.try_next_id().unwrap().unwrap_pending(),
        Duration::from_micros(200)
    );

    clock.advance(1);
    let id = generator.try_next_id().unwrap().unwrap_ready();
    assert_eq!((id.timestamp(), id.iteration()), (6, 1));
}

#[test]
fn exhausted_tick_blocks_until_clock_advances() {
    let (generator, clock) = manual_generator(100, 1, 2);
    assert_eq!(generator.next_id().unwrap().iteration(), 1);
    assert_eq!(generator.next_id().unwrap().iteration(), 2);

    let (done_tx, done_rx) = mpsc::channel();
    let blocked = generator.clone();
    let handle = thread::spawn(move || {
        let id = blocked.next_id();
        let _ = done_tx.send(());
        id
    });

    assert!(
        done_rx.recv_timeout(Duration::from_millis(100)).is_err(),
        "third call returned without the clock advancing"
    );

    clock.advance(1);
    let id = handle.join().unwrap().unwrap();
    assert_eq!(id.timestamp(), 101);
    assert_eq!(id.iteration(), 1);
}

/// Signals `tx` on the `signal_at`-th reading.
struct SignalingClock {
    inner: ManualClock,
    reads: AtomicU64,
    signal_at: u64,
    tx: mpsc::Sender<()>,
}

impl TimeSource for SignalingClock {
    fn current_ticks(&self) -> Result<u64> {
        if self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.signal_at {
            let _ = self.tx.send(());
        }
        self.inner.current_ticks()
    }
}

#[test]
fn backoff_sleeps_without_holding_the_lock() {
    let clock = ManualClock::new(7);
    let (read_tx, read_rx) = mpsc::channel();
    let generator = Generator::builder()
        .clock(SignalingClock {
            inner: clock.clone(),
            reads: AtomicU64::new(0),
            // The first reading issues (7, 1); the second finds the tick
            // exhausted.
            signal_at: 2,
            tx: read_tx,
        })
        .max_sequence(1)
        .backoff(Duration::from_secs(2))
        .build()
        .unwrap();
    generator.next_id().unwrap();

    let blocked = generator.clone();
    let handle = thread::spawn(move || blocked.next_id());
    read_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("blocked caller never reached the exhausted tick");
    // Let the blocked caller get into its back-off sleep.
    thread::sleep(Duration::from_millis(50));

    let (done_tx, done_rx) = mpsc::channel();
    let reader = generator.clone();
    thread::spawn(move || {
        let _ = done_tx.send(reader.counter().last_issued());
    });
    let last = done_rx
        .recv_timeout(Duration::from_millis(500))
        .expect("counter lock held during back-off");
    assert_eq!(last.unwrap(), (7, 1));

    clock.advance(1);
    let id = handle.join().unwrap().unwrap();
    assert_eq!((id.timestamp(), id.iteration()), (8, 1));
}

#[test]
fn counter_can_be_used_directly() {
    let counter = SequenceCounter::new(ManualClock::new(3), 1).unwrap();
    assert_eq!(
        counter.try_next().unwrap(),
        SequenceStatus::Ready {
            timestamp: 3,
            iteration: 1
        }
    );
    assert_eq!(
        counter.try_next().unwrap(),
        SequenceStatus::Pending { timestamp: 3 }
    );

    counter.clock().advance(1);
    assert_eq!(counter.next().unwrap(), (4, 1));
}

#[test]
fn seconds_granularity_flows_through() {
    let clock = ManualClock::new(90_061).with_granularity(Granularity::Seconds);
    let generator = Generator::builder().clock(clock).build().unwrap();
    let id = generator.next_id().unwrap();

    assert_eq!(generator.granularity(), Granularity::Seconds);
    assert_eq!(id.hours(generator.granularity()), 25);
    assert_eq!(id.elapsed(generator.granularity()), Duration::from_secs(90_061));
}

#[cfg(not(feature = "parking-lot"))]
#[test]
fn poisoned_lock_is_reported() {
    use portable_atomic::{AtomicBool, Ordering};

    struct PanickingClock {
        armed: AtomicBool,
    }

    impl TimeSource for PanickingClock {
        fn current_ticks(&self) -> Result<u64> {
            assert!(!self.armed.load(Ordering::SeqCst), "clock exploded");
            Ok(1)
        }
    }

    let generator = Generator::new(
        1,
        PanickingClock {
            armed: AtomicBool::new(true),
        },
    );
    let poisoner = generator.clone();
    assert!(thread::spawn(move || poisoner.next_id()).join().is_err());

    generator.clock().armed.store(false, Ordering::SeqCst);
    assert_eq!(generator.next_id().unwrap_err(), Error::LockPoisoned);
}
