//! A probabilistic skiplist specialized for aggregation: splicing a batch of
//! new, internally time-ordered elements into a list of existing elements,
//! merging wherever the new batch's time span overlaps an existing element.
//!
//! Ported from the skip list used by MobilityDB/MEOS to hold per-group
//! temporal aggregation state, adapted to own its storage as a plain `Vec`
//! (no `repalloc`/freelist-as-raw-ints) and to take its merge function and
//! random source as parameters rather than globals.

use rand::RngCore;
use tempo_time::{Period, RelativePosition};
use tempo_value::{TemporalError, TemporalResult};

/// Number of forward-pointer levels an element can have. `ffsl` over a
/// 32-bit mask below never produces a height greater than this.
pub const MAX_LEVEL: usize = 32;

/// Hard ceiling on the number of elements a single skiplist may hold, past
/// which `splice` reports `ResourceExhausted` instead of growing forever.
pub const MAX_CAPACITY: usize = 1 << 24;

const NIL: usize = usize::MAX;

/// Anything a skiplist can store must expose the time span it covers, so
/// the splice walk can decide whether an existing element lies before,
/// during, or after the span of an incoming batch.
pub trait Spliceable: Clone {
    fn time_span(&self) -> Period;
}

#[derive(Clone)]
struct Elem<T> {
    value: Option<T>,
    height: usize,
    next: [usize; MAX_LEVEL],
}

impl<T> Elem<T> {
    fn sentinel() -> Self {
        Elem { value: None, height: 1, next: [NIL; MAX_LEVEL] }
    }
}

/// A skiplist over head/tail sentinels at index 0 and `tail`, in ascending
/// time order.
pub struct SkipList<T> {
    elems: Vec<Elem<T>>,
    tail: usize,
    freed: Vec<usize>,
    length: usize,
}

impl<T: Spliceable> SkipList<T> {
    /// Builds a balanced initial list from values already sorted in
    /// ascending, non-overlapping time order.
    pub fn new(values: Vec<T>) -> TemporalResult<Self> {
        if values.is_empty() {
            return Err(TemporalError::InvalidArgument("skiplist must be seeded with at least one value"));
        }
        let count = values.len();
        let mut elems = Vec::with_capacity(count + 2);
        elems.push(Elem::sentinel()); // head, index 0
        for v in values {
            elems.push(Elem { value: Some(v), height: 1, next: [NIL; MAX_LEVEL] });
        }
        elems.push(Elem::sentinel()); // tail, index count + 1
        let tail = count + 1;

        let height = (64 - (count as u64).leading_zeros()).max(1) as usize; // ceil(log2(count+1)), at least 1
        for level in 0..height {
            let step = 1usize << level;
            let mut i = 0;
            while i < tail {
                let next = if i + step < tail { i + step } else { tail };
                elems[i].next[level] = next;
                elems[i].height = level + 1;
                i += step;
            }
            elems[tail].next[level] = NIL;
            elems[tail].height = height;
        }

        Ok(SkipList { elems, tail, freed: Vec::new(), length: count })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn head_value(&self) -> Option<&T> {
        let first = self.elems[0].next[0];
        if first == self.tail { None } else { self.elems[first].value.as_ref() }
    }

    /// All values in ascending order, left to right along level 0.
    pub fn values(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.length);
        let mut cur = self.elems[0].next[0];
        while cur != self.tail {
            out.push(self.elems[cur].value.clone().expect("live element"));
            cur = self.elems[cur].next[0];
        }
        out
    }

    /// Position of element `cur`'s time span relative to `probe`: `Before`
    /// if `cur` lies entirely before `probe`, `After` if entirely after,
    /// `During` if they overlap.
    fn position(&self, probe: &Period, cur: usize) -> RelativePosition {
        if cur == 0 {
            return RelativePosition::Before; // head is -inf, always before the probe
        }
        if cur == NIL || cur == self.tail {
            return RelativePosition::After; // tail is +inf, always after the probe
        }
        probe.position_of_period(&self.elems[cur].value.as_ref().expect("live element").time_span())
    }

    fn alloc(&mut self) -> TemporalResult<usize> {
        self.length += 1;
        if let Some(idx) = self.freed.pop() {
            return Ok(idx);
        }
        if self.elems.len() >= MAX_CAPACITY {
            self.length -= 1;
            return Err(TemporalError::ResourceExhausted);
        }
        self.elems.push(Elem { value: None, height: 1, next: [NIL; MAX_LEVEL] });
        Ok(self.elems.len() - 1)
    }

    fn free(&mut self, idx: usize) {
        self.elems[idx].value = None;
        self.freed.push(idx);
        self.length -= 1;
    }

    /// Splices `incoming` (sorted ascending, internally non-overlapping)
    /// into the list. Any existing elements whose span is covered by
    /// `incoming`'s overall span are removed and handed to `combine`
    /// together with `incoming`, and `combine`'s result is inserted in their
    /// place; if nothing was covered, `incoming` is inserted as-is.
    pub fn splice(
        &mut self,
        incoming: Vec<T>,
        combine: impl FnOnce(Vec<T>, Vec<T>) -> TemporalResult<Vec<T>>,
        rng: &mut impl RngCore,
    ) -> TemporalResult<()> {
        if incoming.is_empty() {
            return Ok(());
        }
        let probe = incoming[0].time_span().super_union(&incoming.last().unwrap().time_span());

        let mut update = [0usize; MAX_LEVEL];
        let mut height = self.elems[0].height;
        let mut cur = 0usize;
        for level in (0..height).rev() {
            while self.elems[cur].next[level] != NIL && self.position(&probe, self.elems[cur].next[level]) == RelativePosition::Before {
                cur = self.elems[cur].next[level];
            }
            update[level] = cur;
        }

        let lower = self.elems[cur].next[0];
        let mut walker = lower;
        let mut spliced_count = 0usize;
        while walker != NIL && self.position(&probe, walker) == RelativePosition::During {
            walker = self.elems[walker].next[0];
            spliced_count += 1;
        }
        let upper = walker;

        let mut spliced = Vec::with_capacity(spliced_count);
        if spliced_count > 0 {
            let mut c = lower;
            while c != upper && c != NIL {
                for level in 0..height {
                    if self.elems[update[level]].next[level] != c {
                        break;
                    }
                    self.elems[update[level]].next[level] = self.elems[c].next[level];
                }
                spliced.push(self.elems[c].value.clone().expect("live element"));
                let next = self.elems[c].next[0];
                self.free(c);
                c = next;
            }
        }

        // Shrink head/tail height while the top level is a direct head->tail link.
        while self.elems[0].height > 1 && self.elems[0].next[self.elems[0].height - 1] == self.tail {
            let h = self.elems[0].height - 1;
            self.elems[0].height = h;
            self.elems[self.tail].height = h;
            height = h;
        }

        let to_insert = if spliced_count > 0 { combine(spliced, incoming)? } else { incoming };

        for value in to_insert.into_iter().rev() {
            let rheight = random_level(rng);
            if rheight > height {
                for level in height..rheight {
                    update[level] = 0;
                    self.elems[0].next[level] = self.tail;
                }
                self.elems[0].height = rheight;
                self.elems[self.tail].height = rheight;
            }
            let new = self.alloc()?;
            self.elems[new].value = Some(value);
            self.elems[new].height = rheight;
            // Note: `update[level]` is deliberately *not* advanced to `new`
            // here. Values are inserted back-to-front (highest first), and
            // each insert rewrites `update[level]`'s own `next` pointer, so
            // the next (earlier) value's read of `elems[update[level]].next`
            // picks up the previously inserted element automatically.
            for level in 0..rheight {
                self.elems[new].next[level] = self.elems[update[level]].next[level];
                self.elems[update[level]].next[level] = new;
            }
            if rheight > height {
                height = rheight;
            }
        }

        Ok(())
    }
}

/// Simulates up to `MAX_LEVEL` repeated coin flips without redrawing the RNG
/// per flip: the height is one plus the number of leading 1-bits of a random
/// word, which is geometric — mass `1/2` at height 1, `1/4` at height 2, etc.
fn random_level(rng: &mut impl RngCore) -> usize {
    let mask = (1u64 << MAX_LEVEL) - 1;
    let bits = rng.next_u64() & mask;
    let inverted = (!bits) & mask;
    if inverted == 0 { MAX_LEVEL } else { (inverted.trailing_zeros() as usize) + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[derive(Clone, Debug, PartialEq)]
    struct Mark(i64, i64, i32);

    impl Spliceable for Mark {
        fn time_span(&self) -> Period {
            Period::new(self.0, self.1, true, false).unwrap()
        }
    }

    fn sum_combine(spliced: Vec<Mark>, incoming: Vec<Mark>) -> TemporalResult<Vec<Mark>> {
        let lower = spliced.iter().map(|m| m.0).chain(incoming.iter().map(|m| m.0)).min().unwrap();
        let upper = spliced.iter().map(|m| m.1).chain(incoming.iter().map(|m| m.1)).max().unwrap();
        let total: i32 = spliced.iter().chain(incoming.iter()).map(|m| m.2).sum();
        Ok(vec![Mark(lower, upper, total)])
    }

    #[test]
    fn builds_balanced_initial_list() {
        let list = SkipList::new(vec![Mark(0, 10, 1), Mark(10, 20, 2), Mark(20, 30, 3)]).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.values(), vec![Mark(0, 10, 1), Mark(10, 20, 2), Mark(20, 30, 3)]);
    }

    #[test]
    fn splice_into_a_gap_just_inserts() {
        let mut list = SkipList::new(vec![Mark(0, 10, 1), Mark(20, 30, 2)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        list.splice(vec![Mark(10, 20, 9)], sum_combine, &mut rng).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.values(), vec![Mark(0, 10, 1), Mark(10, 20, 9), Mark(20, 30, 2)]);
    }

    #[test]
    fn splice_overlapping_triggers_combine() {
        let mut list = SkipList::new(vec![Mark(0, 10, 1), Mark(10, 20, 2), Mark(20, 30, 3)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        list.splice(vec![Mark(5, 25, 100)], sum_combine, &mut rng).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.values(), vec![Mark(0, 30, 106)]);
    }

    #[test]
    fn repeated_splices_preserve_order_and_count() {
        let mut list = SkipList::new(vec![Mark(0, 2000, 0)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for i in 0..200i64 {
            let t = i * 5;
            list.splice(vec![Mark(t, t + 1, 1)], |spliced, incoming| Ok(spliced.into_iter().chain(incoming).collect()), &mut rng).unwrap();
        }
        let values = list.values();
        for w in values.windows(2) {
            assert!(w[0].time_span().cmp_bounds(&w[1].time_span()) != std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn resource_exhausted_when_capacity_ceiling_hit() {
        // A tiny synthetic check that alloc() respects MAX_CAPACITY without
        // actually allocating 16M elements in a test.
        let mut list = SkipList::new(vec![Mark(0, 1, 0)]).unwrap();
        list.elems.truncate(1);
        list.elems.resize(MAX_CAPACITY, Elem { value: None, height: 1, next: [NIL; MAX_LEVEL] });
        let err = list.alloc().unwrap_err();
        assert_eq!(err, TemporalError::ResourceExhausted);
    }
}
