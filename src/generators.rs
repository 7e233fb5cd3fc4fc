//! Stream-producing constructs with no stream input (or one, consumed once).

use std::ops::Add;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::error::StreamError;
use crate::stream::{Stream, StreamCell, Tail};

/// Infinite arithmetic sequence: `start`, `start + step`, ... Each cell
/// defers construction of the next.
pub fn count<T>(start: T, step: T) -> Stream<T>
where
    T: Add<Output = T> + Clone + 'static,
{
    let head = start.clone();
    Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(count(start.clone() + step.clone(), step.clone())))
    }))
}

/// `value` repeated `times` times, or forever when `times` is `None`.
///
/// The unbounded stream is a single cell whose tail resolves to the cell
/// itself — a true cycle in O(1) memory.
pub fn repeat<T: Clone + 'static>(value: T, times: Option<usize>) -> Stream<T> {
    match times {
        None => Some(StreamCell::new_cyclic(value, |cell| Ok(Tail::Cell(cell)))),
        Some(0) => None,
        Some(n) => {
            let head = value.clone();
            Some(StreamCell::deferred(head, move || {
                Ok(Tail::from(repeat(value.clone(), Some(n - 1))))
            }))
        }
    }
}

/// Cycles through `stream` forever (empty in, empty out).
///
/// The source is traversed and copied lazily exactly once; the first copied
/// cell is remembered in a write-once slot, and when the source runs out the
/// next tail resolves to that first cell. The resulting loop never touches
/// the source again.
pub fn cycle<T: Clone + 'static>(stream: &Stream<T>) -> Stream<T> {
    let first: Rc<OnceCell<Rc<StreamCell<T>>>> = Rc::new(OnceCell::new());
    match cycle_copy(stream.clone(), first) {
        Tail::Cell(cell) => Some(cell),
        _ => None,
    }
}

fn cycle_copy<T: Clone + 'static>(
    source: Stream<T>,
    first: Rc<OnceCell<Rc<StreamCell<T>>>>,
) -> Tail<T> {
    match source {
        None => match first.get() {
            None => Tail::Empty,
            Some(cell) => Tail::Cell(cell.clone()),
        },
        Some(src) => {
            let head = src.head().clone();
            let slot = first.clone();
            let copy = StreamCell::deferred(head, move || Ok(cycle_copy(src.tail()?, slot.clone())));
            // Only the very first copied cell sticks.
            let _ = first.set(copy.clone());
            Tail::Cell(copy)
        }
    }
}

/// Running left fold. Without a seed the first output is the stream's head
/// and folding starts there; with a seed the seed is emitted first. An empty
/// stream yields the seed alone, or nothing if there is none.
pub fn accumulate<T, F>(stream: &Stream<T>, func: F, initial: Option<T>) -> Stream<T>
where
    T: Clone + 'static,
    F: Fn(&T, &T) -> T + 'static,
{
    let func: Rc<dyn Fn(&T, &T) -> T> = Rc::new(func);
    match (stream.clone(), initial) {
        (None, None) => None,
        (None, Some(seed)) => Some(StreamCell::new(seed)),
        (Some(cell), None) => {
            let acc = cell.head().clone();
            let head = acc.clone();
            Some(StreamCell::deferred(head, move || {
                fold_past(cell.clone(), acc.clone(), func.clone())
            }))
        }
        (Some(cell), Some(seed)) => {
            let head = seed.clone();
            Some(StreamCell::deferred(head, move || {
                fold_at(cell.clone(), seed.clone(), func.clone())
            }))
        }
    }
}

// Emit func(acc, cell.head), then continue past cell.
fn fold_at<T: Clone + 'static>(
    cell: Rc<StreamCell<T>>,
    acc: T,
    func: Rc<dyn Fn(&T, &T) -> T>,
) -> Result<Tail<T>, StreamError> {
    let next = func(&acc, cell.head());
    let head = next.clone();
    Ok(Tail::Cell(StreamCell::deferred(head, move || {
        fold_past(cell.clone(), next.clone(), func.clone())
    })))
}

// Advance beyond cell, carrying the running value.
fn fold_past<T: Clone + 'static>(
    cell: Rc<StreamCell<T>>,
    acc: T,
    func: Rc<dyn Fn(&T, &T) -> T>,
) -> Result<Tail<T>, StreamError> {
    match cell.tail()? {
        None => Ok(Tail::Empty),
        Some(next) => fold_at(next, acc, func),
    }
}
