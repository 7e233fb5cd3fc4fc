//! Core stream-to-stream transforms.
//!
//! Everything here is a structural wrapper over [`StreamCell`]: no combinator
//! forces more of its input than it needs to produce the next demanded
//! element, tails are forced strictly left to right, and upstream failures
//! pass through untouched to whoever forced them. Combinators that must skip
//! a prefix eagerly (filtering, slicing, flattening past empty inners) return
//! `Result`, since that skipping can already hit a failing tail; the purely
//! lazy ones return the stream directly.

use std::rc::Rc;

use crate::error::StreamError;
use crate::stream::{Stream, StreamCell, Tail};

// ============================================================================
// Mapping and zipping
// ============================================================================

/// Elementwise `f` over a stream. `f` is applied to the current head as each
/// cell is built; the rest is deferred.
pub fn map<T, U, F>(f: F, stream: &Stream<T>) -> Stream<U>
where
    T: 'static,
    U: 'static,
    F: Fn(&T) -> U + 'static,
{
    map_cell(stream.clone(), Rc::new(f))
}

fn map_cell<T, U>(stream: Stream<T>, f: Rc<dyn Fn(&T) -> U>) -> Stream<U>
where
    T: 'static,
    U: 'static,
{
    let cell = stream?;
    let head = f(cell.head());
    Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(map_cell(cell.tail()?, f.clone())))
    }))
}

/// Elementwise `f` over two aligned streams; ends when either input ends.
pub fn map2<A, B, U, F>(f: F, a: &Stream<A>, b: &Stream<B>) -> Stream<U>
where
    A: 'static,
    B: 'static,
    U: 'static,
    F: Fn(&A, &B) -> U + 'static,
{
    map2_cell(a.clone(), b.clone(), Rc::new(f))
}

fn map2_cell<A, B, U>(a: Stream<A>, b: Stream<B>, f: Rc<dyn Fn(&A, &B) -> U>) -> Stream<U>
where
    A: 'static,
    B: 'static,
    U: 'static,
{
    let left = a?;
    let right = b?;
    let head = f(left.head(), right.head());
    Some(StreamCell::deferred(head, move || {
        let next_left = left.tail()?;
        let next_right = right.tail()?;
        Ok(Tail::from(map2_cell(next_left, next_right, f.clone())))
    }))
}

/// Elementwise `f` over any number of same-typed aligned streams; ends when
/// any input ends.
pub fn map_many<T, U, F>(f: F, streams: &[Stream<T>]) -> Stream<U>
where
    T: Clone + 'static,
    U: 'static,
    F: Fn(&[T]) -> U + 'static,
{
    if streams.is_empty() {
        return None;
    }
    let cells: Vec<Rc<StreamCell<T>>> = streams
        .iter()
        .map(|s| s.clone())
        .collect::<Option<Vec<_>>>()?;
    map_many_cells(cells, Rc::new(f))
}

fn map_many_cells<T, U>(cells: Vec<Rc<StreamCell<T>>>, f: Rc<dyn Fn(&[T]) -> U>) -> Stream<U>
where
    T: Clone + 'static,
    U: 'static,
{
    let heads: Vec<T> = cells.iter().map(|c| c.head().clone()).collect();
    let head = f(&heads);
    Some(StreamCell::deferred(head, move || {
        let mut tails = Vec::with_capacity(cells.len());
        for cell in &cells {
            match cell.tail()? {
                Some(next) => tails.push(next),
                None => return Ok(Tail::Empty),
            }
        }
        Ok(Tail::from(map_many_cells(tails, f.clone())))
    }))
}

/// Pairs of current heads, recursing on tails; the last complete pair is
/// emitted, then the stream ends.
pub fn zip<A, B>(a: &Stream<A>, b: &Stream<B>) -> Stream<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    map2(|x: &A, y: &B| (x.clone(), y.clone()), a, b)
}

/// N-ary zip over same-typed streams, each element the vector of current
/// heads.
pub fn zip_many<T: Clone + 'static>(streams: &[Stream<T>]) -> Stream<Vec<T>> {
    map_many(|heads: &[T]| heads.to_vec(), streams)
}

/// Like [`zip_many`] but continues until *all* inputs end, substituting
/// `fill` for exhausted ones.
pub fn zip_longest<T: Clone + 'static>(streams: &[Stream<T>], fill: T) -> Stream<Vec<T>> {
    if streams.iter().all(|s| s.is_none()) {
        return None;
    }
    zip_longest_slots(streams.to_vec(), fill)
}

fn zip_longest_slots<T: Clone + 'static>(slots: Vec<Stream<T>>, fill: T) -> Stream<Vec<T>> {
    let heads: Vec<T> = slots
        .iter()
        .map(|slot| match slot {
            None => fill.clone(),
            Some(cell) => cell.head().clone(),
        })
        .collect();
    Some(StreamCell::deferred(heads, move || {
        let mut next = Vec::with_capacity(slots.len());
        for slot in &slots {
            next.push(match slot {
                None => None,
                Some(cell) => cell.tail()?,
            });
        }
        if next.iter().all(|s| s.is_none()) {
            Ok(Tail::Empty)
        } else {
            Ok(Tail::from(zip_longest_slots(next, fill.clone())))
        }
    }))
}

/// Applies `f` to each element unpacked as arguments (elements are the
/// argument vectors, as produced by the combinatorial generators).
pub fn starmap<T, U, F>(f: F, stream: &Stream<Vec<T>>) -> Stream<U>
where
    T: 'static,
    U: 'static,
    F: Fn(&[T]) -> U + 'static,
{
    starmap_cell(stream.clone(), Rc::new(f))
}

fn starmap_cell<T, U>(stream: Stream<Vec<T>>, f: Rc<dyn Fn(&[T]) -> U>) -> Stream<U>
where
    T: 'static,
    U: 'static,
{
    let cell = stream?;
    let head = f(cell.head());
    Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(starmap_cell(cell.tail()?, f.clone())))
    }))
}

// ============================================================================
// Filtering
// ============================================================================

/// Elements satisfying `pred`. Leading non-matching elements are skipped
/// eagerly per step (which may force failing tails); the rest is lazy.
pub fn filter<T, F>(pred: F, stream: &Stream<T>) -> Result<Stream<T>, StreamError>
where
    T: Clone + 'static,
    F: Fn(&T) -> bool + 'static,
{
    filter_matching(Rc::new(pred), stream.clone(), true)
}

/// Elements *not* satisfying `pred`; the dual of [`filter`].
pub fn filterfalse<T, F>(pred: F, stream: &Stream<T>) -> Result<Stream<T>, StreamError>
where
    T: Clone + 'static,
    F: Fn(&T) -> bool + 'static,
{
    filter_matching(Rc::new(pred), stream.clone(), false)
}

fn filter_matching<T: Clone + 'static>(
    pred: Rc<dyn Fn(&T) -> bool>,
    stream: Stream<T>,
    keep: bool,
) -> Result<Stream<T>, StreamError> {
    let mut cursor = stream;
    let cell = loop {
        match cursor {
            None => return Ok(None),
            Some(cell) => {
                if pred(cell.head()) == keep {
                    break cell;
                }
                cursor = cell.tail()?;
            }
        }
    };
    let head = cell.head().clone();
    Ok(Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(filter_matching(
            pred.clone(),
            cell.tail()?,
            keep,
        )?))
    })))
}

/// Data elements whose aligned selector is true. The unselected prefix is
/// skipped eagerly; ends when either input ends.
pub fn compress<T: Clone + 'static>(
    data: &Stream<T>,
    selectors: &Stream<bool>,
) -> Result<Stream<T>, StreamError> {
    compress_from(data.clone(), selectors.clone())
}

fn compress_from<T: Clone + 'static>(
    data: Stream<T>,
    selectors: Stream<bool>,
) -> Result<Stream<T>, StreamError> {
    let mut data = data;
    let mut selectors = selectors;
    loop {
        let (Some(d), Some(s)) = (&data, &selectors) else {
            return Ok(None);
        };
        if *s.head() {
            let d = d.clone();
            let s = s.clone();
            let head = d.head().clone();
            return Ok(Some(StreamCell::deferred(head, move || {
                Ok(Tail::from(compress_from(d.tail()?, s.tail()?)?))
            })));
        }
        let next_data = d.tail()?;
        let next_selectors = s.tail()?;
        data = next_data;
        selectors = next_selectors;
    }
}

/// Eagerly skips the prefix satisfying `pred`, then returns the remaining
/// stream itself — identity with the original is preserved.
pub fn dropwhile<T, F>(pred: F, stream: &Stream<T>) -> Result<Stream<T>, StreamError>
where
    F: Fn(&T) -> bool,
{
    let mut cursor = stream.clone();
    loop {
        let Some(cell) = cursor.clone() else {
            return Ok(None);
        };
        if !pred(cell.head()) {
            return Ok(cursor);
        }
        cursor = cell.tail()?;
    }
}

/// Elements up to (excluding) the first one that fails `pred`.
pub fn takewhile<T, F>(pred: F, stream: &Stream<T>) -> Stream<T>
where
    T: Clone + 'static,
    F: Fn(&T) -> bool + 'static,
{
    takewhile_cell(stream.clone(), Rc::new(pred))
}

fn takewhile_cell<T: Clone + 'static>(
    stream: Stream<T>,
    pred: Rc<dyn Fn(&T) -> bool>,
) -> Stream<T> {
    let cell = stream?;
    if !pred(cell.head()) {
        return None;
    }
    let head = cell.head().clone();
    Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(takewhile_cell(cell.tail()?, pred.clone())))
    }))
}

// ============================================================================
// Slicing and concatenation
// ============================================================================

/// Generalized slice: every `step`-th element of `stream[start..stop]`,
/// unbounded when `stop` is `None`. Never forces past the `stop` bound.
/// `step == 0` is a usage error.
pub fn slice<T: Clone + 'static>(
    stream: &Stream<T>,
    start: usize,
    stop: Option<usize>,
    step: usize,
) -> Result<Stream<T>, StreamError> {
    if step == 0 {
        return Err(StreamError::usage("slice step must be positive"));
    }
    slice_from(stream.clone(), start, stop, step)
}

fn slice_from<T: Clone + 'static>(
    stream: Stream<T>,
    start: usize,
    stop: Option<usize>,
    step: usize,
) -> Result<Stream<T>, StreamError> {
    if let Some(stop) = stop {
        if stop <= start {
            return Ok(None);
        }
    }
    let mut cursor = stream;
    let mut skip = start;
    let mut stop = stop;
    while skip > 0 {
        let Some(cell) = cursor else {
            return Ok(None);
        };
        cursor = cell.tail()?;
        skip -= 1;
        stop = stop.map(|n| n - 1);
    }
    let Some(cell) = cursor else {
        return Ok(None);
    };
    let head = cell.head().clone();
    Ok(Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(slice_from(
            Some(cell.clone()),
            step,
            stop,
            step,
        )?))
    })))
}

/// Concatenates streams in order. Empty inputs are dropped without forcing
/// anything; when exactly one non-empty stream remains it is returned by
/// reference, preserving sharing with the original.
pub fn chain<T: Clone + 'static>(streams: &[Stream<T>]) -> Stream<T> {
    let live: Vec<Rc<StreamCell<T>>> = streams.iter().filter_map(|s| s.clone()).collect();
    chain_cells(live)
}

fn chain_cells<T: Clone + 'static>(mut cells: Vec<Rc<StreamCell<T>>>) -> Stream<T> {
    if cells.len() <= 1 {
        return cells.pop();
    }
    let rest = cells.split_off(1);
    let first = cells.pop()?;
    let head = first.head().clone();
    Some(StreamCell::deferred(head, move || {
        let mut next = Vec::with_capacity(rest.len() + 1);
        if let Some(cell) = first.tail()? {
            next.push(cell);
        }
        next.extend(rest.iter().cloned());
        Ok(Tail::from(chain_cells(next)))
    }))
}

/// Like [`chain`], but the list of sub-streams is itself a stream: a lazy
/// flat-map. Skipping empty inner streams forces outer tails; everything
/// else is forced only on demand.
pub fn chain_from_streams<T: Clone + 'static>(
    streams: &Stream<Stream<T>>,
) -> Result<Stream<T>, StreamError> {
    let mut outer = streams.clone();
    loop {
        let Some(outer_cell) = outer else {
            return Ok(None);
        };
        match outer_cell.head().clone() {
            None => outer = outer_cell.tail()?,
            Some(inner) => {
                let head = inner.head().clone();
                return Ok(Some(StreamCell::deferred(head, move || {
                    // The rest of this inner stream becomes the head of a new
                    // outer stream whose tail is the untouched remainder.
                    let rest_inner = inner.tail()?;
                    let after = outer_cell.clone();
                    let rest_outer: Stream<Stream<T>> =
                        Some(StreamCell::deferred(rest_inner, move || {
                            Ok(Tail::from(after.tail()?))
                        }));
                    Ok(Tail::from(chain_from_streams(&rest_outer)?))
                })));
            }
        }
    }
}

/// Maximal runs of consecutive elements sharing a key: a stream of
/// `(key, run)` pairs, each run independently lazy. Advancing the outer
/// stream re-walks the (memoized) run to find where it ends.
pub fn group_by<T, K, F>(stream: &Stream<T>, key: F) -> Stream<(K, Stream<T>)>
where
    T: Clone + 'static,
    K: Clone + PartialEq + 'static,
    F: Fn(&T) -> K + 'static,
{
    group_cell(stream.clone(), Rc::new(key))
}

fn group_cell<T, K>(stream: Stream<T>, key: Rc<dyn Fn(&T) -> K>) -> Stream<(K, Stream<T>)>
where
    T: Clone + 'static,
    K: Clone + PartialEq + 'static,
{
    let cell = stream?;
    let current = key(cell.head());
    let run = run_cell(cell.clone(), current.clone(), key.clone());
    Some(StreamCell::deferred((current.clone(), run), move || {
        let mut cursor = Some(cell.clone());
        loop {
            match cursor {
                Some(c) if key(c.head()) == current => cursor = c.tail()?,
                rest => return Ok(Tail::from(group_cell(rest, key.clone()))),
            }
        }
    }))
}

fn run_cell<T, K>(cell: Rc<StreamCell<T>>, target: K, key: Rc<dyn Fn(&T) -> K>) -> Stream<T>
where
    T: Clone + 'static,
    K: Clone + PartialEq + 'static,
{
    let head = cell.head().clone();
    Some(StreamCell::deferred(head, move || {
        match cell.tail()? {
            Some(next) if key(next.head()) == target => {
                Ok(Tail::from(run_cell(next, target.clone(), key.clone())))
            }
            _ => Ok(Tail::Empty),
        }
    }))
}

/// n handles to the same stream. Streams are immutable once observed, so
/// sharing is always safe; kept for parity with eager-sequence APIs.
pub fn tee<T>(stream: &Stream<T>, n: usize) -> Vec<Stream<T>> {
    vec![stream.clone(); n]
}
