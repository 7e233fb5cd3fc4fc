//! Lazy, memoized, singly-linked streams.
//!
//! A stream is a cons cell holding a head value and a deferred computation of
//! the rest; forcing a tail happens at most once and the result is cached in
//! the cell, so repeated traversals pay for the deferred work a single time.
//! On top of the cell primitive sit lazy combinators, infinite generators,
//! combinatorial enumerators, and a recipe layer of terminal utilities.
//!
//! ```
//! use sicp_streams::combinators::map;
//! use sicp_streams::generators::count;
//! use sicp_streams::recipes::take;
//!
//! let evens = map(|n: &i64| n * 2, &count(0, 1));
//! assert_eq!(take(4, &evens).unwrap(), vec![0, 2, 4, 6]);
//! ```

pub mod combinators;
pub mod combinatorics;
pub mod error;
pub mod generators;
pub mod recipes;
pub mod stream;

pub use error::{StreamError, StreamErrorKind};
pub use stream::{
    EQ_DEPTH_LIMIT, Stream, StreamCell, StreamIter, Tail, from_iterator, from_producer,
    from_values, iter, nth, stream_eq, to_vec,
};
