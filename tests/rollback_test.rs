use contiguous::alloc::SourceEvent;
use contiguous::init::{self, TryFromFn};
use contiguous::{destroy_contiguous_objects, make_contiguous_objects, AllocError, MemorySource, PackError, SystemSource, TrackingSource};
use core::alloc::Layout;
use core::ptr::NonNull;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Built(usize, usize),
    Dropped(usize, usize),
}

type Log = Rc<RefCell<Vec<Event>>>;

/// Element that records its own construction and destruction.
struct Probe {
    sequence: usize,
    element: usize,
    log: Log,
}

impl Probe {
    fn new(sequence: usize, element: usize, log: &Log) -> Self {
        log.borrow_mut().push(Event::Built(sequence, element));
        Self {
            sequence,
            element,
            log: Rc::clone(log),
        }
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Event::Dropped(self.sequence, self.element));
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Fail {
    sequence: usize,
    element: usize,
}

fn probes(
    sequence: usize,
    count: usize,
    fail_at: Option<usize>,
    log: &Log,
) -> TryFromFn<impl FnMut() -> Result<Probe, Fail>> {
    let log = Rc::clone(log);
    let mut element = 0;
    init::try_from_fn(count, move || {
        let current = element;
        element += 1;
        if fail_at == Some(current) {
            return Err(Fail {
                sequence,
                element: current,
            });
        }
        Ok(Probe::new(sequence, current, &log))
    })
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn assert_single_round_trip<S: MemorySource>(source: &TrackingSource<S>) {
    let metrics = source.metrics();
    assert_eq!(metrics.allocated_count, 1);
    assert_eq!(metrics.deallocated_count, 1);
    assert_eq!(metrics.live_bytes(), 0);
}

#[test]
fn test_failure_rolls_back_in_exact_reverse_order() {
    // Sequence 1 fails on its third element; sequence 2 is never touched.
    let log = new_log();
    let source = TrackingSource::new(SystemSource);

    let result = make_contiguous_objects::<(Probe, Probe, Probe), Fail>(
        &source,
        (probes(0, 2, None, &log), probes(1, 4, Some(2), &log), probes(2, 3, None, &log)),
    );

    match result.err() {
        Some(PackError::Construction {
            sequence,
            element,
            source: cause,
        }) => {
            assert_eq!((sequence, element), (1, 2));
            assert_eq!(cause, Fail { sequence: 1, element: 2 });
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(
        *log.borrow(),
        vec![
            Event::Built(0, 0),
            Event::Built(0, 1),
            Event::Built(1, 0),
            Event::Built(1, 1),
            Event::Dropped(1, 1),
            Event::Dropped(1, 0),
            Event::Dropped(0, 1),
            Event::Dropped(0, 0),
        ]
    );
    assert_single_round_trip(&source);
}

#[test]
fn test_failure_at_every_position() {
    let counts = [3usize, 2, 4];

    for k in 0..counts.len() {
        for m in 0..counts[k] {
            let log = new_log();
            let source = TrackingSource::new(SystemSource);
            let fail = |sequence: usize| (sequence == k).then_some(m);

            let result = make_contiguous_objects::<(Probe, Probe, Probe), Fail>(
                &source,
                (
                    probes(0, counts[0], fail(0), &log),
                    probes(1, counts[1], fail(1), &log),
                    probes(2, counts[2], fail(2), &log),
                ),
            );
            let err = result.err().expect("construction should fail");
            assert_eq!(err.into_construction(), Some(Fail { sequence: k, element: m }));

            let built: Vec<(usize, usize)> = (0..k)
                .flat_map(|s| (0..counts[s]).map(move |i| (s, i)))
                .chain((0..m).map(|i| (k, i)))
                .collect();
            let expected: Vec<Event> = built
                .iter()
                .map(|&(s, i)| Event::Built(s, i))
                .chain(built.iter().rev().map(|&(s, i)| Event::Dropped(s, i)))
                .collect();

            assert_eq!(*log.borrow(), expected, "failure at sequence {k}, element {m}");
            assert_single_round_trip(&source);
        }
    }
}

#[test]
fn test_failure_on_first_element_destroys_nothing() {
    let log = new_log();
    let source = TrackingSource::new(SystemSource);

    let result =
        make_contiguous_objects::<(Probe, Probe), Fail>(&source, (probes(0, 5, Some(0), &log), probes(1, 5, None, &log)));

    assert!(matches!(
        result.err(),
        Some(PackError::Construction {
            sequence: 0,
            element: 0,
            ..
        })
    ));
    assert!(log.borrow().is_empty());
    assert_single_round_trip(&source);
}

#[test]
fn test_panicking_constructor_rolls_back() {
    let log = new_log();
    let source = TrackingSource::new(SystemSource);

    let panicking = {
        let log = Rc::clone(&log);
        let mut element = 0;
        init::from_fn(3, move || {
            if element == 1 {
                panic!("element constructor panicked");
            }
            element += 1;
            Probe::new(1, element - 1, &log)
        })
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        make_contiguous_objects::<(Probe, Probe), Fail>(&source, (probes(0, 2, None, &log), panicking))
    }));
    assert!(outcome.is_err());

    assert_eq!(
        *log.borrow(),
        vec![
            Event::Built(0, 0),
            Event::Built(0, 1),
            Event::Built(1, 0),
            Event::Dropped(1, 0),
            Event::Dropped(0, 1),
            Event::Dropped(0, 0),
        ]
    );
    assert_single_round_trip(&source);
}

/// A source that never has memory to give.
struct Exhausted;

impl MemorySource for Exhausted {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<u8>, AllocError> {
        Err(AllocError)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        panic!("nothing was ever allocated");
    }
}

#[test]
fn test_refused_allocation_constructs_nothing() {
    let calls = Cell::new(0);
    let source = TrackingSource::new(Exhausted);

    let result = make_contiguous_objects::<(u16, u64), ()>(
        &source,
        (
            init::from_fn(4, || {
                calls.set(calls.get() + 1);
                1u16
            }),
            init::default(2),
        ),
    );

    let err = result.err().expect("allocation should be refused");
    assert!(err.is_out_of_memory());
    assert!(matches!(err, PackError::OutOfMemory { bytes: 24, align: 8 }));
    assert_eq!(calls.get(), 0);

    let expected = Layout::from_size_align(24, 8).unwrap();
    assert_eq!(source.events(), vec![SourceEvent::Refused { layout: expected }]);
    assert_eq!(source.metrics().deallocated_count, 0);
}

#[test]
fn test_short_iterator_reports_exhaustion_and_rolls_back() {
    let log = new_log();
    let source = TrackingSource::new(SystemSource);

    let short = {
        let log = Rc::clone(&log);
        (0..2).map(move |i| Probe::new(1, i, &log))
    };

    let result = make_contiguous_objects::<(Probe, Probe), Fail>(
        &source,
        (probes(0, 1, None, &log), init::from_iter(3, short)),
    );

    match result.err() {
        Some(PackError::InputExhausted {
            sequence,
            expected,
            produced,
        }) => assert_eq!((sequence, expected, produced), (1, 3, 2)),
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(
        *log.borrow(),
        vec![
            Event::Built(0, 0),
            Event::Built(1, 0),
            Event::Built(1, 1),
            Event::Dropped(1, 1),
            Event::Dropped(1, 0),
            Event::Dropped(0, 0),
        ]
    );
    assert_single_round_trip(&source);
}

#[test]
fn test_destroy_runs_sequences_in_order_elements_in_reverse() {
    let log = new_log();
    let source = TrackingSource::new(SystemSource);

    let objects = make_contiguous_objects::<(Probe, Probe), Fail>(
        &source,
        (probes(0, 3, None, &log), probes(1, 2, None, &log)),
    )
    .unwrap_or_else(|err| panic!("construction failed: {err:?}"));
    log.borrow_mut().clear();

    unsafe { destroy_contiguous_objects(&source, objects) };

    assert_eq!(
        *log.borrow(),
        vec![
            Event::Dropped(0, 2),
            Event::Dropped(0, 1),
            Event::Dropped(0, 0),
            Event::Dropped(1, 1),
            Event::Dropped(1, 0),
        ]
    );
    assert_single_round_trip(&source);
}
