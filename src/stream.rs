//! The lazy cons-cell primitive.
//!
//! A stream is a head value plus a deferred computation of the remainder.
//! `Stream<T>` is `Option<Rc<StreamCell<T>>>`: `None` is the terminal marker,
//! so the zero-length stream is a first-class value accepted everywhere a
//! stream is. Cells are shared with `Rc` and are immutable once observed; the
//! tail slot is the single exception, a write-once memoization slot that
//! resolves a deferred tail at most once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::error::StreamError;

/// Maximum number of cell pairs [`stream_eq`] will force before giving up
/// with an undecidable result. A policy constant, pinned by tests.
pub const EQ_DEPTH_LIMIT: usize = 256;

/// A possibly-empty stream. `None` is the terminal marker.
pub type Stream<T> = Option<Rc<StreamCell<T>>>;

/// What a deferred tail computation may resolve to.
///
/// A bare `Value` is promoted to a single-element resolved cell when the
/// tail is forced.
pub enum Tail<T> {
    Empty,
    Cell(Rc<StreamCell<T>>),
    Value(T),
}

impl<T> From<Stream<T>> for Tail<T> {
    fn from(stream: Stream<T>) -> Self {
        match stream {
            None => Tail::Empty,
            Some(cell) => Tail::Cell(cell),
        }
    }
}

type Thunk<T> = Rc<dyn Fn() -> Result<Tail<T>, StreamError>>;

/// The memoization slot. `Deferred` holds a thunk that has not yet produced
/// a result; a successful forcing replaces it with `Empty` or `Cell`. A
/// failed forcing leaves the thunk in place, so re-forcing re-invokes it.
enum TailSlot<T> {
    Empty,
    Cell(Rc<StreamCell<T>>),
    Deferred(Thunk<T>),
}

/// One cell of a lazy stream: a head value and a memoized tail.
pub struct StreamCell<T> {
    head: T,
    tail: RefCell<TailSlot<T>>,
}

impl<T> StreamCell<T> {
    /// A single-element stream cell.
    pub fn new(head: T) -> Rc<Self> {
        Rc::new(StreamCell {
            head,
            tail: RefCell::new(TailSlot::Empty),
        })
    }

    /// An eagerly linked cell: `head` followed by `tail`.
    pub fn cons(head: T, tail: Rc<StreamCell<T>>) -> Rc<Self> {
        Rc::new(StreamCell {
            head,
            tail: RefCell::new(TailSlot::Cell(tail)),
        })
    }

    /// A cell with an explicit tail variant. A bare `Tail::Value` is
    /// promoted to a single-element cell immediately.
    pub fn with_tail(head: T, tail: Tail<T>) -> Rc<Self> {
        let slot = match tail {
            Tail::Empty => TailSlot::Empty,
            Tail::Cell(cell) => TailSlot::Cell(cell),
            Tail::Value(value) => TailSlot::Cell(StreamCell::new(value)),
        };
        Rc::new(StreamCell {
            head,
            tail: RefCell::new(slot),
        })
    }

    /// A cell whose tail is computed on first demand.
    ///
    /// The thunk runs at most once on the success path; its result is cached
    /// in place and every later observer sees the same resolved tail. An
    /// `Err` is propagated to the caller that forced the tail and is *not*
    /// cached: the next force re-invokes the thunk.
    pub fn deferred<F>(head: T, thunk: F) -> Rc<Self>
    where
        T: 'static,
        F: Fn() -> Result<Tail<T>, StreamError> + 'static,
    {
        Rc::new(StreamCell {
            head,
            tail: RefCell::new(TailSlot::Deferred(Rc::new(thunk))),
        })
    }

    /// A cell whose deferred computation receives a handle to the cell
    /// itself, for streams that loop back on themselves (eternal repetition
    /// in O(1) memory). Such cells form strong `Rc` cycles once resolved and
    /// are never reclaimed.
    pub fn new_cyclic<F>(head: T, thunk: F) -> Rc<Self>
    where
        T: 'static,
        F: Fn(Rc<StreamCell<T>>) -> Result<Tail<T>, StreamError> + 'static,
    {
        Rc::new_cyclic(|weak| {
            let weak = weak.clone();
            let thunk: Thunk<T> = Rc::new(move || {
                let cell = weak
                    .upgrade()
                    .expect("cell is alive while its own thunk runs");
                thunk(cell)
            });
            StreamCell {
                head,
                tail: RefCell::new(TailSlot::Deferred(thunk)),
            }
        })
    }

    /// The head value. Never forces anything.
    pub fn head(&self) -> &T {
        &self.head
    }

    /// The rest of the stream, forcing the deferred tail if it has not been
    /// resolved yet.
    ///
    /// Forcing may run arbitrary caller-supplied logic; its side effects
    /// happen exactly once per cell no matter how many times `tail` is
    /// called afterwards. Errors propagate unchanged and leave the slot
    /// unresolved.
    pub fn tail(&self) -> Result<Stream<T>, StreamError> {
        let thunk = match &*self.tail.borrow() {
            TailSlot::Empty => return Ok(None),
            TailSlot::Cell(cell) => return Ok(Some(cell.clone())),
            TailSlot::Deferred(thunk) => thunk.clone(),
        };
        // The borrow is released before the thunk runs, so resolving code may
        // itself walk this stream.
        let resolved = match thunk()? {
            Tail::Empty => None,
            Tail::Cell(cell) => Some(cell),
            Tail::Value(value) => Some(StreamCell::new(value)),
        };
        let mut slot = self.tail.borrow_mut();
        match &*slot {
            // A reentrant force beat us to the slot; keep its result.
            TailSlot::Empty => return Ok(None),
            TailSlot::Cell(cell) => return Ok(Some(cell.clone())),
            TailSlot::Deferred(_) => {}
        }
        *slot = match &resolved {
            None => TailSlot::Empty,
            Some(cell) => TailSlot::Cell(cell.clone()),
        };
        Ok(resolved)
    }
}

// ============================================================================
// Construction
// ============================================================================

/// Build a fully resolved stream from a vector of values, first value first.
pub fn from_values<T>(values: Vec<T>) -> Stream<T> {
    let mut stream: Stream<T> = None;
    for value in values.into_iter().rev() {
        stream = Some(match stream {
            None => StreamCell::new(value),
            Some(cell) => StreamCell::cons(value, cell),
        });
    }
    stream
}

/// Build a fully resolved stream from the given values.
///
/// `stream![]` is the empty stream (the element type must be inferable).
#[macro_export]
macro_rules! stream {
    () => {
        ::core::option::Option::None
    };
    ($($value:expr),+ $(,)?) => {
        $crate::stream::from_values(::std::vec![$($value),+])
    };
}

/// Adapt an external pull-based sequence into a stream.
///
/// Returns the empty stream immediately if the source is already exhausted;
/// otherwise one element is pulled per demand and the rest stays in the
/// source. The source is consumed incrementally, never copied eagerly.
pub fn from_iterator<I>(iterable: I) -> Stream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: 'static,
    I::Item: 'static,
{
    pull_next(Rc::new(RefCell::new(iterable.into_iter())))
}

fn pull_next<T, I>(source: Rc<RefCell<I>>) -> Stream<T>
where
    T: 'static,
    I: Iterator<Item = T> + 'static,
{
    let head = source.borrow_mut().next()?;
    Some(StreamCell::deferred(head, move || {
        Ok(Tail::from(pull_next(source.clone())))
    }))
}

/// Adapt a suspend/resume producer: each call yields one value, `None`
/// signals completion. One resumption per demanded cell.
pub fn from_producer<T, F>(produce: F) -> Stream<T>
where
    T: 'static,
    F: FnMut() -> Option<T> + 'static,
{
    from_iterator(std::iter::from_fn(produce))
}

// ============================================================================
// Access
// ============================================================================

/// The element at `index`, resolving the tail chain as needed.
///
/// A negative index is a usage error; an index past the end of a finite
/// stream is a range error.
pub fn nth<T: Clone>(stream: &Stream<T>, index: isize) -> Result<T, StreamError> {
    if index < 0 {
        return Err(StreamError::usage(format!("negative stream index: {index}")));
    }
    let mut cursor = stream.clone();
    let mut remaining = index;
    loop {
        let Some(cell) = cursor else {
            return Err(StreamError::range(format!(
                "stream index {index} out of range"
            )));
        };
        if remaining == 0 {
            return Ok(cell.head().clone());
        }
        cursor = cell.tail()?;
        remaining -= 1;
    }
}

enum IterState<T> {
    Start(Stream<T>),
    At(Rc<StreamCell<T>>),
    Done,
}

/// Pull-based view of a stream. Yields each head before forcing the tail
/// that follows it, so consuming n elements forces only n - 1 tails. A
/// forcing error is yielded once, then the iterator ends.
pub struct StreamIter<T> {
    state: IterState<T>,
}

impl<T: Clone> Iterator for StreamIter<T> {
    type Item = Result<T, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, IterState::Done) {
            IterState::Start(None) | IterState::Done => None,
            IterState::Start(Some(cell)) => {
                let head = cell.head().clone();
                self.state = IterState::At(cell);
                Some(Ok(head))
            }
            IterState::At(cell) => match cell.tail() {
                Ok(None) => None,
                Ok(Some(next)) => {
                    let head = next.head().clone();
                    self.state = IterState::At(next);
                    Some(Ok(head))
                }
                Err(err) => Some(Err(err)),
            },
        }
    }
}

/// Iterate over a stream's elements.
pub fn iter<T: Clone>(stream: &Stream<T>) -> StreamIter<T> {
    StreamIter {
        state: IterState::Start(stream.clone()),
    }
}

/// Materialize the whole stream. Diverges on an infinite stream.
pub fn to_vec<T: Clone>(stream: &Stream<T>) -> Result<Vec<T>, StreamError> {
    iter(stream).collect()
}

// ============================================================================
// Structural equality
// ============================================================================

/// Structural equality over two streams.
///
/// Terminal equals terminal; terminal never equals a cell; two cells are
/// equal iff their heads are equal and their tails are equal. Pointer-equal
/// cells and cell pairs that have already been visited (a cycle reached by
/// both sides) short-circuit to equal, so self-referential streams with the
/// same eventual pattern compare equal without being drained. After
/// [`EQ_DEPTH_LIMIT`] forced pairs the comparison gives up with an
/// `Undecidable` error — which callers must not read as "not equal".
pub fn stream_eq<T: PartialEq>(a: &Stream<T>, b: &Stream<T>) -> Result<bool, StreamError> {
    let mut visited: FxHashSet<(*const StreamCell<T>, *const StreamCell<T>)> =
        FxHashSet::default();
    let mut left = a.clone();
    let mut right = b.clone();
    let mut depth = 0usize;
    loop {
        let (x, y) = match (&left, &right) {
            (None, None) => return Ok(true),
            (None, _) | (_, None) => return Ok(false),
            (Some(x), Some(y)) => (x.clone(), y.clone()),
        };
        if Rc::ptr_eq(&x, &y) {
            return Ok(true);
        }
        if !visited.insert((Rc::as_ptr(&x), Rc::as_ptr(&y))) {
            return Ok(true);
        }
        if x.head() != y.head() {
            return Ok(false);
        }
        depth += 1;
        if depth > EQ_DEPTH_LIMIT {
            return Err(StreamError::undecidable(format!(
                "equality recursion exceeded {EQ_DEPTH_LIMIT} cells"
            )));
        }
        left = x.tail()?;
        right = y.tail()?;
    }
}

// ============================================================================
// Debug rendering
// ============================================================================

// Renders only what has already been resolved: the chain of resolved heads,
// then `<thunk>` if a deferred tail is pending, or `...` if the resolved
// chain loops back on itself. Printing never forces a tail.
impl<T: fmt::Debug> fmt::Debug for StreamCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seen: FxHashSet<*const StreamCell<T>> = FxHashSet::default();
        seen.insert(self as *const _);
        write!(f, "Stream({:?}", self.head)?;
        let mut cursor = match &*self.tail.borrow() {
            TailSlot::Empty => None,
            TailSlot::Cell(cell) => Some(cell.clone()),
            TailSlot::Deferred(_) => return write!(f, ", <thunk>)"),
        };
        while let Some(cell) = cursor {
            if !seen.insert(Rc::as_ptr(&cell)) {
                return write!(f, ", ...)");
            }
            write!(f, ", {:?}", cell.head)?;
            cursor = match &*cell.tail.borrow() {
                TailSlot::Empty => None,
                TailSlot::Cell(next) => Some(next.clone()),
                TailSlot::Deferred(_) => return write!(f, ", <thunk>)"),
            };
        }
        write!(f, ")")
    }
}
