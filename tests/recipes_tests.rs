use std::cell::RefCell;
use std::rc::Rc;

use sicp_streams::error::StreamErrorKind;
use sicp_streams::generators::count;
use sicp_streams::recipes::{
    all_equal, convolve, dotproduct, first_true, flatten, grouper, iter_except, ncycles,
    pad_none, pairwise, partition, powerset, prepend, quantify, repeat_func, roundrobin,
    tabulate, tail_n, take, unique_everseen, unique_everseen_by, unique_justseen,
    unique_justseen_by,
};
use sicp_streams::stream::{Stream, from_values, to_vec};
use sicp_streams::{StreamError, stream};

fn chars(s: &str) -> Stream<char> {
    from_values(s.chars().collect())
}

fn string(s: &Stream<char>) -> String {
    to_vec(s).unwrap().into_iter().collect()
}

// ============================================================================
// Bounded views
// ============================================================================

#[test]
fn test_take() {
    assert_eq!(take(3, &count(0, 1)).unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_take_more_than_available() {
    assert_eq!(take(10, &stream![1, 2]).unwrap(), vec![1, 2]);
}

#[test]
fn test_take_zero() {
    assert!(take(0, &stream![1, 2, 3]).unwrap().is_empty());
}

#[test]
fn test_prepend() {
    let s = prepend(1, &stream![2, 3, 4]);
    assert_eq!(to_vec(&s).unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_prepend_to_empty() {
    let empty: Stream<i64> = None;
    assert_eq!(to_vec(&prepend(1, &empty)).unwrap(), vec![1]);
}

#[test]
fn test_tabulate() {
    let squares = tabulate(|x| x * x, 0);
    assert_eq!(take(5, &squares).unwrap(), vec![0, 1, 4, 9, 16]);
}

#[test]
fn test_tail_n() {
    let s = tail_n(3, &chars("ABCDEFG")).unwrap();
    assert_eq!(string(&s), "EFG");
}

#[test]
fn test_tail_n_larger_than_stream() {
    let s = tail_n(10, &stream![1, 2]).unwrap();
    assert_eq!(to_vec(&s).unwrap(), vec![1, 2]);
}

#[test]
fn test_tail_n_zero_is_empty() {
    assert!(tail_n(0, &stream![1, 2, 3]).unwrap().is_none());
}

// ============================================================================
// Predicates and counts
// ============================================================================

#[test]
fn test_all_equal() {
    assert!(all_equal(&chars("AAAA")).unwrap());
    assert!(!all_equal(&chars("AAAB")).unwrap());
    let empty: Stream<char> = None;
    assert!(all_equal(&empty).unwrap());
}

#[test]
fn test_quantify() {
    let n = quantify(&stream![1, 2, 3, 4, 5, 6], |n| n % 2 == 0).unwrap();
    assert_eq!(n, 3);
}

#[test]
fn test_first_true() {
    let found = first_true(&stream![1, 3, 4, 5], None, |n| n % 2 == 0).unwrap();
    assert_eq!(found, Some(4));
}

#[test]
fn test_first_true_falls_back_to_default() {
    let found = first_true(&stream![1, 3, 5], Some(-1), |n| n % 2 == 0).unwrap();
    assert_eq!(found, Some(-1));
}

#[test]
fn test_first_true_stops_forcing_at_the_match() {
    // An infinite stream is fine as long as a match exists.
    let found = first_true(&count(0, 1), None, |n| *n > 100).unwrap();
    assert_eq!(found, Some(101));
}

// ============================================================================
// Padding and repetition
// ============================================================================

#[test]
fn test_pad_none() {
    let s = pad_none(&stream![1, 2, 3]);
    assert_eq!(
        take(5, &s).unwrap(),
        vec![Some(1), Some(2), Some(3), None, None]
    );
}

#[test]
fn test_ncycles() {
    let s = ncycles(&stream![1, 2], 3);
    assert_eq!(to_vec(&s).unwrap(), vec![1, 2, 1, 2, 1, 2]);
}

#[test]
fn test_ncycles_zero_is_empty() {
    assert!(ncycles(&stream![1, 2], 0).is_none());
}

#[test]
fn test_repeat_func() {
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    let s = repeat_func(
        move || {
            *counter.borrow_mut() += 1;
            *counter.borrow()
        },
        Some(3),
    );
    assert_eq!(to_vec(&s).unwrap(), vec![1, 2, 3]);
    // Memoized: traversing again re-reads cached cells.
    assert_eq!(to_vec(&s).unwrap(), vec![1, 2, 3]);
    assert_eq!(*calls.borrow(), 3);
}

#[test]
fn test_repeat_func_unbounded() {
    let s = repeat_func(|| 7, None);
    assert_eq!(take(4, &s).unwrap(), vec![7, 7, 7, 7]);
}

// ============================================================================
// Numeric reductions
// ============================================================================

#[test]
fn test_dotproduct() {
    let d = dotproduct(&stream![1, 2, 3], &stream![4, 5, 6]).unwrap();
    assert_eq!(d, 32);
}

#[test]
fn test_dotproduct_stops_at_the_shorter_input() {
    let d = dotproduct(&stream![1, 2, 3, 100], &stream![4, 5, 6]).unwrap();
    assert_eq!(d, 32);
}

#[test]
fn test_convolve() {
    let signal = stream![1.0, 2.0, 3.0, 4.0, 5.0];
    let smoothed = convolve(&signal, &[0.25, 0.25, 0.25, 0.25]).unwrap();
    assert_eq!(
        to_vec(&smoothed).unwrap(),
        vec![0.25, 0.75, 1.5, 2.5, 3.5, 3.0, 2.25, 1.25]
    );
}

#[test]
fn test_convolve_identity_kernel() {
    let s = convolve(&stream![1, 2, 3], &[1]).unwrap();
    assert_eq!(to_vec(&s).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_convolve_empty_kernel_is_a_usage_error() {
    let err = convolve(&stream![1, 2, 3], &[]).unwrap_err();
    assert_eq!(err.kind, StreamErrorKind::Usage);
}

// ============================================================================
// Reshaping
// ============================================================================

#[test]
fn test_flatten() {
    let nested = stream![stream![1, 2], stream![], stream![3]];
    let s = flatten(&nested).unwrap();
    assert_eq!(to_vec(&s).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_pairwise() {
    let s = pairwise(&stream![1, 2, 3, 4]).unwrap();
    assert_eq!(to_vec(&s).unwrap(), vec![(1, 2), (2, 3), (3, 4)]);
}

#[test]
fn test_pairwise_needs_two_elements() {
    assert!(pairwise(&stream![1]).unwrap().is_none());
    let empty: Stream<i64> = None;
    assert!(pairwise(&empty).unwrap().is_none());
}

#[test]
fn test_grouper_pads_the_final_chunk() {
    let s = grouper(&chars("ABCDEFG"), 3, 'x').unwrap();
    let chunks: Vec<String> = to_vec(&s)
        .unwrap()
        .into_iter()
        .map(|chunk| chunk.into_iter().collect())
        .collect();
    assert_eq!(chunks, vec!["ABC", "DEF", "Gxx"]);
}

#[test]
fn test_grouper_zero_chunk_size_is_a_usage_error() {
    let err = grouper(&stream![1, 2], 0, 0).unwrap_err();
    assert_eq!(err.kind, StreamErrorKind::Usage);
}

#[test]
fn test_roundrobin() {
    let s = roundrobin(&[chars("ABC"), chars("D"), chars("EF")]);
    assert_eq!(string(&s), "ADEBFC");
}

#[test]
fn test_partition() {
    let (evens, odds) = partition(|n: &i64| n % 2 == 1, &from_values((0..10).collect())).unwrap();
    assert_eq!(to_vec(&evens).unwrap(), vec![0, 2, 4, 6, 8]);
    assert_eq!(to_vec(&odds).unwrap(), vec![1, 3, 5, 7, 9]);
}

#[test]
fn test_powerset() {
    let s = powerset(&stream![1, 2, 3]).unwrap();
    assert_eq!(
        to_vec(&s).unwrap(),
        vec![
            vec![],
            vec![1],
            vec![2],
            vec![3],
            vec![1, 2],
            vec![1, 3],
            vec![2, 3],
            vec![1, 2, 3],
        ]
    );
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn test_unique_everseen() {
    let s = unique_everseen(&chars("AAAABBBCCDAABBB"));
    assert_eq!(string(&s), "ABCD");
}

#[test]
fn test_unique_everseen_with_key() {
    let s = unique_everseen_by(&chars("ABBCcAD"), |c: &char| c.to_ascii_lowercase());
    assert_eq!(string(&s), "ABCD");
}

#[test]
fn test_unique_justseen() {
    let s = unique_justseen(&chars("AAAABBBCCDAABBB"));
    assert_eq!(string(&s), "ABCDAB");
}

#[test]
fn test_unique_justseen_with_key() {
    let s = unique_justseen_by(&chars("ABBCcAD"), |c: &char| c.to_ascii_lowercase());
    assert_eq!(string(&s), "ABCAD");
}

#[test]
fn test_unique_everseen_of_empty_stream() {
    let empty: Stream<char> = None;
    assert!(unique_everseen(&empty).is_none());
    assert!(unique_justseen(&empty).is_none());
}

// ============================================================================
// Exception-bounded production
// ============================================================================

fn popping(values: Vec<i64>) -> impl Fn() -> Result<i64, StreamError> + 'static {
    let stack = Rc::new(RefCell::new(values));
    move || {
        stack
            .borrow_mut()
            .pop()
            .ok_or_else(|| StreamError::range("pop from empty list"))
    }
}

#[test]
fn test_iter_except_consumes_the_signal_error() {
    let s = iter_except(popping(vec![1, 2, 3, 4]), StreamErrorKind::Range, None).unwrap();
    assert_eq!(to_vec(&s).unwrap(), vec![4, 3, 2, 1]);
}

#[test]
fn test_iter_except_with_a_first_call() {
    let stack = Rc::new(RefCell::new(vec![1i64, 2, 3, 4]));
    let measure = stack.clone();
    let first: Box<dyn Fn() -> Result<i64, StreamError>> =
        Box::new(move || Ok(measure.borrow().len() as i64));
    let pop_stack = stack.clone();
    let f = move || {
        pop_stack
            .borrow_mut()
            .pop()
            .ok_or_else(|| StreamError::range("pop from empty list"))
    };
    let s = iter_except(f, StreamErrorKind::Range, Some(first)).unwrap();
    assert_eq!(to_vec(&s).unwrap(), vec![4, 4, 3, 2, 1]);
}

#[test]
fn test_iter_except_on_an_immediately_exhausted_source() {
    let s = iter_except(popping(vec![]), StreamErrorKind::Range, None).unwrap();
    assert!(s.is_none());
}

#[test]
fn test_iter_except_propagates_unexpected_errors() {
    let f = || Err(StreamError::upstream("broken source"));
    let err = iter_except::<i64, _>(f, StreamErrorKind::Range, None).unwrap_err();
    assert_eq!(err.kind, StreamErrorKind::Upstream);
}
