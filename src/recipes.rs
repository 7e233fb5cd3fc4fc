//! Utility layer: terminal and near-terminal operations built on the
//! combinators and generators, the analog of the classic itertools recipes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::hash::Hash;
use std::ops::Mul;
use std::rc::Rc;

use num_traits::Zero;
use rustc_hash::FxHashSet;

use crate::combinators::{chain, chain_from_streams, filter, filterfalse, map, map2};
use crate::combinatorics::combinations;
use crate::error::{StreamError, StreamErrorKind};
use crate::generators::{count, repeat};
use crate::stream::{Stream, StreamCell, Tail, from_values, iter, to_vec};

// ============================================================================
// Bounded views
// ============================================================================

/// Up to `n` leading elements, materialized.
pub fn take<T: Clone + 'static>(n: usize, stream: &Stream<T>) -> Result<Vec<T>, StreamError> {
    iter(stream).take(n).collect()
}

/// A new stream with `value` in front of `stream`.
pub fn prepend<T: Clone + 'static>(value: T, stream: &Stream<T>) -> Stream<T> {
    Some(StreamCell::with_tail(value, Tail::from(stream.clone())))
}

/// Infinite stream of `f(start)`, `f(start + 1)`, ...
pub fn tabulate<U, F>(f: F, start: i64) -> Stream<U>
where
    U: 'static,
    F: Fn(i64) -> U + 'static,
{
    map(move |i: &i64| f(*i), &count(start, 1))
}

/// The last `n` elements as a stream (`n == 0` yields the empty stream).
/// Scans the whole source while buffering a sliding window of size n.
pub fn tail_n<T: Clone + 'static>(n: usize, stream: &Stream<T>) -> Result<Stream<T>, StreamError> {
    if n == 0 {
        return Ok(None);
    }
    let mut window: VecDeque<T> = VecDeque::with_capacity(n + 1);
    for item in iter(stream) {
        window.push_back(item?);
        if window.len() > n {
            window.pop_front();
        }
    }
    Ok(from_values(window.into_iter().collect()))
}

// ============================================================================
// Terminal predicates and counts
// ============================================================================

/// True iff every element compares equal; vacuously true for the empty
/// stream.
pub fn all_equal<T>(stream: &Stream<T>) -> Result<bool, StreamError>
where
    T: Clone + PartialEq + 'static,
{
    let mut items = iter(stream);
    let Some(first) = items.next() else {
        return Ok(true);
    };
    let first = first?;
    for item in items {
        if item? != first {
            return Ok(false);
        }
    }
    Ok(true)
}

/// How many elements satisfy `pred`. Forces the entire stream.
pub fn quantify<T, F>(stream: &Stream<T>, pred: F) -> Result<usize, StreamError>
where
    T: Clone + 'static,
    F: Fn(&T) -> bool,
{
    let mut total = 0;
    for item in iter(stream) {
        if pred(&item?) {
            total += 1;
        }
    }
    Ok(total)
}

/// First element satisfying `pred`, or `default` when none does. Forces only
/// the necessary prefix.
pub fn first_true<T, F>(
    stream: &Stream<T>,
    default: Option<T>,
    pred: F,
) -> Result<Option<T>, StreamError>
where
    T: Clone + 'static,
    F: Fn(&T) -> bool,
{
    for item in iter(stream) {
        let item = item?;
        if pred(&item) {
            return Ok(Some(item));
        }
    }
    Ok(default)
}

// ============================================================================
// Padding and repetition
// ============================================================================

/// The stream's elements wrapped in `Some`, followed by an infinite filler
/// of `None` — the designated missing-value marker.
pub fn pad_none<T: Clone + 'static>(stream: &Stream<T>) -> Stream<Option<T>> {
    let values = map(|x: &T| Some(x.clone()), stream);
    chain(&[values, repeat(None, None)])
}

/// The stream repeated exactly `n` times.
pub fn ncycles<T: Clone + 'static>(stream: &Stream<T>, n: usize) -> Stream<T> {
    chain(&vec![stream.clone(); n])
}

/// Stream of successive calls to `f`, unbounded unless `times` is given.
/// Each position's call happens exactly once and is memoized thereafter.
pub fn repeat_func<T, F>(f: F, times: Option<usize>) -> Stream<T>
where
    T: 'static,
    F: Fn() -> T + 'static,
{
    repeat_func_cell(Rc::new(f), times)
}

fn repeat_func_cell<T: 'static>(f: Rc<dyn Fn() -> T>, times: Option<usize>) -> Stream<T> {
    let remaining = match times {
        Some(0) => return None,
        Some(n) => Some(n - 1),
        None => None,
    };
    let head = f();
    Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(repeat_func_cell(f.clone(), remaining)))
    }))
}

// ============================================================================
// Numeric reductions
// ============================================================================

/// Sum of elementwise products; stops at the shorter input.
pub fn dotproduct<T>(a: &Stream<T>, b: &Stream<T>) -> Result<T, StreamError>
where
    T: Zero + Mul<Output = T> + Clone + 'static,
{
    let mut total = T::zero();
    let products = map2(|x: &T, y: &T| x.clone() * y.clone(), a, b);
    for item in iter(&products) {
        total = total + item?;
    }
    Ok(total)
}

/// Full discrete convolution of the signal with the kernel; output length is
/// `len(signal) + len(kernel) - 1`. Terminal: the signal is materialized.
pub fn convolve<T>(signal: &Stream<T>, kernel: &[T]) -> Result<Stream<T>, StreamError>
where
    T: Zero + Mul<Output = T> + Clone + 'static,
{
    if kernel.is_empty() {
        return Err(StreamError::usage("convolution kernel must be non-empty"));
    }
    let signal = to_vec(signal)?;
    let n = signal.len();
    let k = kernel.len();
    let mut out = Vec::with_capacity(n + k - 1);
    for i in 0..n + k - 1 {
        let mut sum = T::zero();
        for (j, weight) in kernel.iter().enumerate() {
            if i >= j && i - j < n {
                sum = sum + weight.clone() * signal[i - j].clone();
            }
        }
        out.push(sum);
    }
    Ok(from_values(out))
}

// ============================================================================
// Reshaping
// ============================================================================

/// Lazy concatenation of a stream of streams, skipping empty entries.
pub fn flatten<T: Clone + 'static>(
    streams: &Stream<Stream<T>>,
) -> Result<Stream<T>, StreamError> {
    chain_from_streams(streams)
}

/// Consecutive overlapping pairs.
pub fn pairwise<T: Clone + 'static>(stream: &Stream<T>) -> Result<Stream<(T, T)>, StreamError> {
    pairwise_cell(stream.clone())
}

fn pairwise_cell<T: Clone + 'static>(stream: Stream<T>) -> Result<Stream<(T, T)>, StreamError> {
    let Some(cell) = stream else {
        return Ok(None);
    };
    let Some(next) = cell.tail()? else {
        return Ok(None);
    };
    let head = (cell.head().clone(), next.head().clone());
    Ok(Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(pairwise_cell(Some(next.clone()))?))
    })))
}

/// Fixed-size chunks of length `n`, the final chunk padded with `fill`.
/// `n == 0` is a usage error.
pub fn grouper<T: Clone + 'static>(
    stream: &Stream<T>,
    n: usize,
    fill: T,
) -> Result<Stream<Vec<T>>, StreamError> {
    if n == 0 {
        return Err(StreamError::usage("chunk size must be positive"));
    }
    grouper_cell(stream.clone(), n, fill)
}

fn grouper_cell<T: Clone + 'static>(
    stream: Stream<T>,
    n: usize,
    fill: T,
) -> Result<Stream<Vec<T>>, StreamError> {
    let Some(cell) = stream else {
        return Ok(None);
    };
    let mut chunk = Vec::with_capacity(n);
    chunk.push(cell.head().clone());
    let mut current = cell;
    while chunk.len() < n {
        match current.tail()? {
            Some(next) => {
                chunk.push(next.head().clone());
                current = next;
            }
            None => {
                while chunk.len() < n {
                    chunk.push(fill.clone());
                }
                return Ok(Some(StreamCell::new(chunk)));
            }
        }
    }
    Ok(Some(StreamCell::deferred(chunk, move || {
        Ok(Tail::from(grouper_cell(current.tail()?, n, fill.clone())?))
    })))
}

/// Interleaves the streams, dropping each input as it ends and continuing
/// with the rest in their original relative order.
pub fn roundrobin<T: Clone + 'static>(streams: &[Stream<T>]) -> Stream<T> {
    let queue: VecDeque<Rc<StreamCell<T>>> = streams.iter().filter_map(|s| s.clone()).collect();
    roundrobin_queue(queue)
}

fn roundrobin_queue<T: Clone + 'static>(mut queue: VecDeque<Rc<StreamCell<T>>>) -> Stream<T> {
    let cell = queue.pop_front()?;
    let head = cell.head().clone();
    Some(StreamCell::deferred(head, move || {
        let mut next = queue.clone();
        if let Some(tail) = cell.tail()? {
            next.push_back(tail);
        }
        Ok(Tail::from(roundrobin_queue(next)))
    }))
}

/// Two independently traversable streams over the same source: the elements
/// failing `pred`, and the elements passing it.
pub fn partition<T, F>(pred: F, stream: &Stream<T>) -> Result<(Stream<T>, Stream<T>), StreamError>
where
    T: Clone + 'static,
    F: Fn(&T) -> bool + 'static,
{
    let pred = Rc::new(pred);
    let failing = {
        let pred = pred.clone();
        filterfalse(move |x: &T| pred(x), stream)?
    };
    let passing = filter(move |x: &T| pred(x), stream)?;
    Ok((failing, passing))
}

/// All subsets of the materialized source, ordered by increasing size and
/// then by combinatorial index order within each size.
pub fn powerset<T: Clone + 'static>(stream: &Stream<T>) -> Result<Stream<Vec<T>>, StreamError> {
    let pool = to_vec(stream)?;
    let n = pool.len();
    let source = from_values(pool);
    let mut tiers = Vec::with_capacity(n + 1);
    for r in 0..=n {
        tiers.push(combinations(&source, r)?);
    }
    Ok(chain(&tiers))
}

// ============================================================================
// Deduplication
// ============================================================================

/// First occurrence of each element over the entire history seen so far.
pub fn unique_everseen<T>(stream: &Stream<T>) -> Stream<T>
where
    T: Clone + Eq + Hash + 'static,
{
    unique_everseen_by(stream, |x: &T| x.clone())
}

/// First occurrence per computed key over the entire history. The seen-set
/// lives as long as the traversal and grows without bound.
pub fn unique_everseen_by<T, K, F>(stream: &Stream<T>, key: F) -> Stream<T>
where
    T: Clone + 'static,
    K: Eq + Hash + 'static,
    F: Fn(&T) -> K + 'static,
{
    let cell = stream.clone()?;
    let seen: Rc<RefCell<FxHashSet<K>>> = Rc::new(RefCell::new(FxHashSet::default()));
    seen.borrow_mut().insert(key(cell.head()));
    emit_unseen(cell, seen, Rc::new(key))
}

// cell's key has already been recorded by the caller.
fn emit_unseen<T, K>(
    cell: Rc<StreamCell<T>>,
    seen: Rc<RefCell<FxHashSet<K>>>,
    key: Rc<dyn Fn(&T) -> K>,
) -> Stream<T>
where
    T: Clone + 'static,
    K: Eq + Hash + 'static,
{
    let head = cell.head().clone();
    Some(StreamCell::deferred(head, move || {
        let mut cursor = cell.tail()?;
        loop {
            let Some(next) = cursor else {
                return Ok(Tail::Empty);
            };
            let k = key(next.head());
            if !seen.borrow().contains(&k) {
                seen.borrow_mut().insert(k);
                return Ok(Tail::from(emit_unseen(next, seen.clone(), key.clone())));
            }
            cursor = next.tail()?;
        }
    }))
}

/// Collapses runs of consecutive equal elements to their first element.
pub fn unique_justseen<T>(stream: &Stream<T>) -> Stream<T>
where
    T: Clone + PartialEq + 'static,
{
    unique_justseen_by(stream, |x: &T| x.clone())
}

/// Collapses only *consecutive* duplicate keys; O(1) extra state.
pub fn unique_justseen_by<T, K, F>(stream: &Stream<T>, key: F) -> Stream<T>
where
    T: Clone + 'static,
    K: PartialEq + 'static,
    F: Fn(&T) -> K + 'static,
{
    let cell = stream.clone()?;
    emit_changed(cell, Rc::new(key))
}

fn emit_changed<T, K>(cell: Rc<StreamCell<T>>, key: Rc<dyn Fn(&T) -> K>) -> Stream<T>
where
    T: Clone + 'static,
    K: PartialEq + 'static,
{
    let current = key(cell.head());
    let head = cell.head().clone();
    Some(StreamCell::deferred(head, move || {
        let mut cursor = cell.tail()?;
        loop {
            let Some(next) = cursor else {
                return Ok(Tail::Empty);
            };
            if key(next.head()) != current {
                return Ok(Tail::from(emit_changed(next, key.clone())));
            }
            cursor = next.tail()?;
        }
    }))
}

// ============================================================================
// Exception-bounded production
// ============================================================================

/// Calls `first` once if given, then `f` repeatedly, one stream element per
/// successful call. An error whose kind matches `signal` is consumed and
/// ends the stream; any other error propagates to the caller that forced it.
pub fn iter_except<T, F>(
    f: F,
    signal: StreamErrorKind,
    first: Option<Box<dyn Fn() -> Result<T, StreamError>>>,
) -> Result<Stream<T>, StreamError>
where
    T: Clone + 'static,
    F: Fn() -> Result<T, StreamError> + 'static,
{
    let f: Rc<dyn Fn() -> Result<T, StreamError>> = Rc::new(f);
    let lead = match &first {
        Some(g) => g(),
        None => f(),
    };
    match lead {
        Err(err) if err.kind == signal => Ok(None),
        Err(err) => Err(err),
        Ok(value) => Ok(Some(StreamCell::deferred(value, move || {
            next_until(f.clone(), signal)
        }))),
    }
}

fn next_until<T: Clone + 'static>(
    f: Rc<dyn Fn() -> Result<T, StreamError>>,
    signal: StreamErrorKind,
) -> Result<Tail<T>, StreamError> {
    match f() {
        Err(err) if err.kind == signal => Ok(Tail::Empty),
        Err(err) => Err(err),
        Ok(value) => {
            let g = f.clone();
            Ok(Tail::Cell(StreamCell::deferred(value, move || {
                next_until(g.clone(), signal)
            })))
        }
    }
}
