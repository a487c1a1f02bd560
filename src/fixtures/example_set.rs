//! Synchronous set tests
//!
//! Plain tests that never arm a deadline; they resolve while the suite is
//! being dispatched.

use std::collections::HashSet;

use crate::error::StepResult;
use crate::executor::AsyncGuard;
use crate::models::Suite;

pub const SUITE_NAME: &str = "ExampleSetTest";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Element {
    Number(i64),
    Symbol(&'static str),
}

/// An empty set and a set holding `5` and `#abc`
fn fixture() -> (HashSet<Element>, HashSet<Element>) {
    let empty = HashSet::new();
    let full = HashSet::from([Element::Number(5), Element::Symbol("abc")]);
    (empty, full)
}

/// Sets are unordered; positional access always fails
fn element_at(set: &HashSet<Element>, index: usize) -> Result<&Element, String> {
    Err(format!(
        "sets do not support positional access (index {index}, size {})",
        set.len()
    ))
}

fn occurrences_of(set: &HashSet<Element>, element: &Element) -> usize {
    usize::from(set.contains(element))
}

pub fn suite() -> Suite {
    Suite::new(SUITE_NAME)
        .with_test("testAdd", test_add)
        .with_test("testGrow", test_grow)
        .with_test("testIllegal", test_illegal)
        .with_test("testIncludes", test_includes)
        .with_test("testOccurrences", test_occurrences)
        .with_test("testRemove", test_remove)
}

fn test_add(t: &AsyncGuard) -> StepResult {
    let (mut empty, _) = fixture();
    empty.insert(Element::Number(5));
    t.assert(empty.contains(&Element::Number(5)))
}

fn test_grow(t: &AsyncGuard) -> StepResult {
    let (mut empty, _) = fixture();
    empty.extend((1..=100).map(Element::Number));
    t.assert_equals(100, empty.len())
}

fn test_illegal(t: &AsyncGuard) -> StepResult {
    let (empty, full) = fixture();
    t.should_raise(|| element_at(&empty, 5))?;
    t.should_raise(|| element_at(&full, 1))
}

fn test_includes(t: &AsyncGuard) -> StepResult {
    let (_, full) = fixture();
    t.assert(full.contains(&Element::Number(5)))?;
    t.assert(full.contains(&Element::Symbol("abc")))
}

fn test_occurrences(t: &AsyncGuard) -> StepResult {
    let (empty, mut full) = fixture();
    t.assert_equals(0, occurrences_of(&empty, &Element::Number(0)))?;
    t.assert_equals(1, occurrences_of(&full, &Element::Number(5)))?;
    full.insert(Element::Number(5));
    t.assert_equals(1, occurrences_of(&full, &Element::Number(5)))
}

fn test_remove(t: &AsyncGuard) -> StepResult {
    let (_, mut full) = fixture();
    full.remove(&Element::Number(5));
    t.assert(full.contains(&Element::Symbol("abc")))?;
    t.deny(full.contains(&Element::Number(5)))
}
