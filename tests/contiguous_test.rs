use contiguous::alloc::SourceEvent;
use contiguous::init::{self, Construct};
use contiguous::{
    destroy_contiguous_objects, make_contiguous_objects, Packed, PageSource, SystemSource, TrackingSource,
};
use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

#[test]
fn test_fill_ctor_clones_value() {
    let value = String::from("packed");
    let packed = Packed::<(String,), _>::new::<Infallible>(SystemSource, (init::fill(5, value.clone()),)).unwrap();

    let (strings,) = packed.as_slices();
    assert_eq!(strings.len(), 5);
    assert!(strings.iter().all(|s| *s == value));
}

#[test]
fn test_from_iterator_keeps_order() {
    let packed =
        Packed::<(char,), _>::new::<Infallible>(SystemSource, (init::from_iter(4, ['w', 'x', 'y', 'z']),)).unwrap();
    assert_eq!(packed.as_slices().0, &['w', 'x', 'y', 'z']);
}

#[test]
fn test_from_iterator_takes_only_count_items() {
    let pulled = Cell::new(0);
    let source = (0u32..).inspect(|_| pulled.set(pulled.get() + 1));
    let packed = Packed::<(u32,), _>::new::<Infallible>(SystemSource, (init::from_iter(3, source),)).unwrap();
    assert_eq!(packed.as_slices().0, &[0, 1, 2]);
    assert_eq!(pulled.get(), 3);
}

#[test]
fn test_from_functor_calls_once_per_element() {
    let mut next = 1u64;
    let packed = Packed::<(u64,), _>::new::<Infallible>(
        SystemSource,
        (init::from_fn(5, || {
            next *= 2;
            next
        }),),
    )
    .unwrap();
    assert_eq!(packed.as_slices().0, &[2, 4, 8, 16, 32]);
}

#[test]
fn test_value_ctor_zeroes_multidimensional_elements() {
    let mut packed =
        Packed::<([[f32; 4]; 4], u8), _>::new::<Infallible>(SystemSource, (init::value(3), init::value(2))).unwrap();

    let (matrices, flags) = packed.as_slices();
    assert!(matrices.iter().flatten().flatten().all(|&x| x == 0.0));
    assert_eq!(flags, &[0, 0]);

    packed.as_mut_slices().0[1][2][3] = 9.0;
    assert_eq!(packed.as_slices().0[1][2][3], 9.0);
}

#[derive(Debug, PartialEq)]
struct Particle {
    mass: f32,
    charge: i8,
}

impl<E> Construct<(f32, i8), E> for Particle {
    fn construct(&(mass, charge): &(f32, i8)) -> Result<Self, E> {
        Ok(Particle { mass, charge })
    }
}

#[test]
fn test_ctor_forwards_arguments_to_every_element() {
    let packed = Packed::<(Particle, u16), _>::new::<Infallible>(
        SystemSource,
        (init::ctor(3, (1.5f32, -1i8)), 2usize),
    )
    .unwrap();

    let (particles, tags) = packed.as_slices();
    assert_eq!(particles.len(), 3);
    assert!(particles.iter().all(|p| *p == Particle { mass: 1.5, charge: -1 }));
    assert_eq!(tags, &[0, 0]);
}

#[test]
fn test_round_trip_uses_one_allocate_and_one_deallocate() {
    let source = TrackingSource::new(SystemSource);
    let objects = make_contiguous_objects::<(u8, u32, u64), Infallible>(
        &source,
        (init::fill(3, 7u8), init::default(5), init::from_fn(2, || 11u64)),
    )
    .unwrap();

    let (a, b, c) = *objects.views();
    assert_eq!(unsafe { a.as_slice() }, &[7, 7, 7]);
    assert_eq!(unsafe { b.as_slice() }, &[0; 5]);
    assert_eq!(unsafe { c.as_slice() }, &[11, 11]);

    unsafe { destroy_contiguous_objects(&source, objects) };

    let events = source.events();
    assert_eq!(events.len(), 2);
    match (events[0], events[1]) {
        (
            SourceEvent::Allocate { addr, layout },
            SourceEvent::Deallocate {
                addr: freed,
                layout: freed_layout,
            },
        ) => {
            assert_eq!(addr, freed);
            assert_eq!(layout, freed_layout);
            assert_eq!(layout.align(), core::mem::align_of::<u64>());
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_packed_drop_destroys_and_releases() {
    let drops = Rc::new(Cell::new(0));
    let source = TrackingSource::new(SystemSource);
    {
        let counter = Rc::clone(&drops);
        let _packed = Packed::<(DropCounter, u64), _>::new::<Infallible>(
            &source,
            (init::from_fn(4, move || DropCounter(Rc::clone(&counter))), 1usize),
        )
        .unwrap();
        assert_eq!(drops.get(), 0);
        assert_eq!(source.metrics().live_count(), 1);
    }
    assert_eq!(drops.get(), 4);
    assert_eq!(source.metrics().live_count(), 0);
}

#[test]
fn test_page_source_backs_large_regions() {
    let packed = Packed::<(u64, u8), _>::new::<Infallible>(
        PageSource,
        (init::from_iter(10_000, 0..), init::fill(5000, 0xFF)),
    )
    .unwrap();

    let region = packed.region();
    assert!(region.byte_len() >= 10_000 * 8 + 5000);
    assert_eq!(region.as_ptr().as_ptr() as usize % contiguous::alloc::PAGE_SIZE, 0);

    let (words, bytes) = packed.as_slices();
    assert_eq!(words[9_999], 9_999);
    assert!(bytes.iter().all(|&b| b == 0xFF));
}

#[test]
fn test_packed_is_send_when_elements_are() {
    fn assert_send<T: Send>(_: &T) {}

    let packed = Packed::<(u32, String), _>::new::<Infallible>(
        SystemSource,
        (init::fill(2, 9), init::fill(1, String::from("moved"))),
    )
    .unwrap();
    assert_send(&packed);

    let handle = std::thread::spawn(move || {
        let (_, names) = packed.as_slices();
        let first = names[0].clone();
        first
    });
    assert_eq!(handle.join().unwrap(), "moved");
}

#[test]
fn test_errors_compose_with_anyhow() -> anyhow::Result<()> {
    let packed = Packed::<(i32,), _>::new::<std::io::Error>(
        SystemSource,
        (init::try_from_fn(3, || Ok::<_, std::io::Error>(-1)),),
    )?;
    assert_eq!(packed.as_slices().0, &[-1, -1, -1]);
    Ok(())
}
