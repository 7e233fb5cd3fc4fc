//! Combinatorial generators: cartesian product, permutations, combinations.
//!
//! `product` is built compositionally from [`map`] and [`chain_from_streams`]
//! rather than by index arithmetic. The selection generators deliberately use
//! the simple generate-then-filter strategy over `product`'s index space
//! (O(n^r) candidates); the enumeration order that strategy produces is part
//! of the contract.

use rustc_hash::FxHashSet;

use crate::combinators::{chain_from_streams, filter, map};
use crate::error::StreamError;
use crate::stream::{Stream, StreamCell, from_iterator, to_vec};

/// Lazy cartesian product of the given streams, the whole list repeated
/// `repeat` times. The last stream varies fastest (row-major order); no
/// streams at all yields the single empty tuple.
pub fn product<T: Clone + 'static>(
    streams: &[Stream<T>],
    repeat: usize,
) -> Result<Stream<Vec<T>>, StreamError> {
    let mut pools: Vec<Stream<T>> = Vec::with_capacity(streams.len() * repeat);
    for _ in 0..repeat {
        pools.extend(streams.iter().cloned());
    }
    product_of(&pools)
}

fn product_of<T: Clone + 'static>(streams: &[Stream<T>]) -> Result<Stream<Vec<T>>, StreamError> {
    let Some((first, rest)) = streams.split_first() else {
        return Ok(Some(StreamCell::new(Vec::new())));
    };
    let rest_product = product_of(rest)?;
    // first >>= \x -> rest_product >>= \suffix -> [x : suffix]
    let nested = map(
        move |x: &T| {
            let x = x.clone();
            map(
                move |suffix: &Vec<T>| {
                    let mut tuple = Vec::with_capacity(suffix.len() + 1);
                    tuple.push(x.clone());
                    tuple.extend(suffix.iter().cloned());
                    tuple
                },
                &rest_product,
            )
        },
        first,
    );
    chain_from_streams(&nested)
}

fn index_stream(n: usize) -> Stream<usize> {
    from_iterator(0..n)
}

/// All length-r orderings of the materialized stream: index tuples from
/// `product` filtered to those with no repeated index, mapped back into the
/// pool. `r` defaults to the stream's length.
pub fn permutations<T: Clone + 'static>(
    stream: &Stream<T>,
    r: Option<usize>,
) -> Result<Stream<Vec<T>>, StreamError> {
    let pool = to_vec(stream)?;
    let n = pool.len();
    let r = r.unwrap_or(n);
    let tuples = product(&[index_stream(n)], r)?;
    let distinct = filter(
        |indices: &Vec<usize>| {
            let mut seen = FxHashSet::default();
            indices.iter().all(|&i| seen.insert(i))
        },
        &tuples,
    )?;
    Ok(map(
        move |indices: &Vec<usize>| indices.iter().map(|&i| pool[i].clone()).collect(),
        &distinct,
    ))
}

/// All length-r selections without replacement, in lexicographic index
/// order: permutations of the index space filtered to increasing tuples.
pub fn combinations<T: Clone + 'static>(
    stream: &Stream<T>,
    r: usize,
) -> Result<Stream<Vec<T>>, StreamError> {
    let pool = to_vec(stream)?;
    let n = pool.len();
    let perms = permutations(&index_stream(n), Some(r))?;
    let increasing = filter(
        |indices: &Vec<usize>| indices.windows(2).all(|w| w[0] <= w[1]),
        &perms,
    )?;
    Ok(map(
        move |indices: &Vec<usize>| indices.iter().map(|&i| pool[i].clone()).collect(),
        &increasing,
    ))
}

/// All length-r selections with replacement: the full product index space
/// filtered to non-decreasing tuples.
pub fn combinations_with_replacement<T: Clone + 'static>(
    stream: &Stream<T>,
    r: usize,
) -> Result<Stream<Vec<T>>, StreamError> {
    let pool = to_vec(stream)?;
    let n = pool.len();
    let tuples = product(&[index_stream(n)], r)?;
    let non_decreasing = filter(
        |indices: &Vec<usize>| indices.windows(2).all(|w| w[0] <= w[1]),
        &tuples,
    )?;
    Ok(map(
        move |indices: &Vec<usize>| indices.iter().map(|&i| pool[i].clone()).collect(),
        &non_decreasing,
    ))
}
