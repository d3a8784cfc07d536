use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Cells visited by the random walk before it heads for the target, start included.
pub const DEFAULT_WALK_LENGTH: usize = 5;

pub type HighlightSteps = SmallVec<[CellIndex; 16]>;

/// Ordered cells lit up during the highlight animation.
///
/// Always ends with the target. The first [`walk_len`](Self::walk_len) steps
/// come from the random walk and never repeat a cell; the rest is the
/// completion towards the target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighlightSequence {
    steps: HighlightSteps,
    walk_len: usize,
    jumps: SmallVec<[usize; 4]>,
}

impl HighlightSequence {
    pub fn steps(&self) -> &[CellIndex] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, step: usize) -> Option<CellIndex> {
        self.steps.get(step).copied()
    }

    pub fn target(&self) -> Option<CellIndex> {
        self.steps.last().copied()
    }

    pub fn walk_len(&self) -> usize {
        self.walk_len
    }

    pub fn walk(&self) -> &[CellIndex] {
        &self.steps[..self.walk_len]
    }

    pub fn completion(&self) -> &[CellIndex] {
        &self.steps[self.walk_len..]
    }

    /// True when the walk reached `step` by jumping out of a dead end instead of moving to a neighbor.
    pub fn is_jump(&self, step: usize) -> bool {
        self.jumps.contains(&step)
    }
}

pub trait HighlightPathGenerator {
    fn generate(self, target: CellIndex) -> HighlightSequence;
}

/// Random walk over neighboring cells followed by a shortest-path completion onto the target.
#[derive(Debug)]
pub struct RandomWalkPath<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
    walk_length: usize,
}

impl<'a, R: Rng + ?Sized> RandomWalkPath<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self {
            rng,
            walk_length: DEFAULT_WALK_LENGTH,
        }
    }

    pub fn with_walk_length(mut self, walk_length: usize) -> Self {
        self.walk_length = walk_length.max(1);
        self
    }
}

impl<R: Rng + ?Sized> HighlightPathGenerator for RandomWalkPath<'_, R> {
    fn generate(self, target: CellIndex) -> HighlightSequence {
        let Self { rng, walk_length } = self;

        let mut steps = HighlightSteps::new();
        let mut jumps = SmallVec::new();
        let mut visited = CellSet::empty();

        let mut current = pick_cell_outside(rng, visited.with(target))
            .unwrap_or_else(|| CellIndex::new_unchecked((target.get() + 1) % GRID_CELLS as u8));
        steps.push(current);
        visited.insert(current);

        while steps.len() < walk_length {
            let candidates: SmallVec<[CellIndex; 4]> = current
                .iter_neighbors()
                .filter(|&next| next != target && !visited.contains(next))
                .collect();

            current = match candidates.choose(rng) {
                Some(&next) => next,
                None => match pick_cell_outside(rng, visited.with(target)) {
                    Some(next) => {
                        log::trace!("walk stuck at {current}, jumping to {next}");
                        jumps.push(steps.len());
                        next
                    }
                    None => {
                        log::warn!("walk ran out of cells after {} steps", steps.len());
                        break;
                    }
                },
            };
            steps.push(current);
            visited.insert(current);
        }

        let walk_len = steps.len();

        if current != target {
            match shortest_path(current, target, visited) {
                Some(path) => steps.extend(path),
                None => log::trace!("walk cells block every route from {current} to {target}"),
            }
        }

        if steps.last() != Some(&target) {
            steps.push(target);
        }

        HighlightSequence {
            steps,
            walk_len,
            jumps,
        }
    }
}

/// Generates a highlight sequence with the default walk length.
pub fn generate_highlight<R: Rng + ?Sized>(rng: &mut R, target: CellIndex) -> HighlightSequence {
    RandomWalkPath::new(rng).generate(target)
}

fn pick_cell_outside<R: Rng + ?Sized>(rng: &mut R, excluded: CellSet) -> Option<CellIndex> {
    let candidates: SmallVec<[CellIndex; GRID_CELLS]> = CellIndex::all()
        .filter(|&index| !excluded.contains(index))
        .collect();
    candidates.choose(rng).copied()
}

/// Breadth-first search from `from` to `to` that never enters `blocked` cells.
///
/// The returned path excludes `from` and ends with `to`. `from` itself may be
/// blocked; `to` never is.
pub fn shortest_path(
    from: CellIndex,
    to: CellIndex,
    blocked: CellSet,
) -> Option<SmallVec<[CellIndex; GRID_CELLS]>> {
    if from == to {
        return Some(SmallVec::new());
    }

    let mut seen = blocked.with(from);
    let mut parents: [Option<CellIndex>; GRID_CELLS] = [None; GRID_CELLS];
    let mut queue: SmallVec<[CellIndex; GRID_CELLS]> = SmallVec::new();
    queue.push(from);

    let mut head = 0;
    'search: while let Some(&pos) = queue.get(head) {
        head += 1;
        for next in pos.iter_neighbors() {
            if next == to {
                parents[to.as_usize()] = Some(pos);
                break 'search;
            }
            if seen.insert(next) {
                parents[next.as_usize()] = Some(pos);
                queue.push(next);
            }
        }
    }

    parents[to.as_usize()]?;

    let mut path: SmallVec<[CellIndex; GRID_CELLS]> = SmallVec::new();
    let mut pos = to;
    while pos != from {
        path.push(pos);
        pos = parents[pos.as_usize()]?;
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn idx(index: u8) -> CellIndex {
        CellIndex::new(index).unwrap()
    }

    fn assert_connected_walk(sequence: &HighlightSequence) {
        for (step, pair) in sequence.walk().windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            assert!(
                a.is_adjacent(b) || sequence.is_jump(step + 1),
                "{a} -> {b} is neither adjacent nor a jump in {:?}",
                sequence.steps()
            );
        }
    }

    #[test]
    fn always_ends_on_the_target() {
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for target in CellIndex::all() {
                let sequence = generate_highlight(&mut rng, target);
                assert!(!sequence.is_empty());
                assert_eq!(sequence.target(), Some(target));
            }
        }
    }

    #[test]
    fn walk_moves_between_neighbors_unless_it_jumps() {
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for target in CellIndex::all() {
                assert_connected_walk(&generate_highlight(&mut rng, target));
            }
        }
    }

    #[test]
    fn walk_never_repeats_or_touches_the_target() {
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for target in CellIndex::all() {
                let sequence = generate_highlight(&mut rng, target);
                let walk = sequence.walk();
                let distinct: CellSet = walk.iter().copied().collect();

                assert_eq!(walk.len(), DEFAULT_WALK_LENGTH);
                assert_eq!(distinct.len(), walk.len());
                assert!(!distinct.contains(target));
            }
        }
    }

    #[test]
    fn completion_is_a_connected_route_when_not_forced() {
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for target in CellIndex::all() {
                let sequence = generate_highlight(&mut rng, target);
                let tail = &sequence.steps()[sequence.walk_len() - 1..];
                let connected = tail.windows(2).all(|pair| pair[0].is_adjacent(pair[1]));
                if !connected {
                    // blocked by the walk, the target was appended directly
                    assert_eq!(sequence.completion(), [target]);
                }
            }
        }
    }

    #[test]
    fn walk_length_can_be_tuned() {
        let mut rng = SmallRng::seed_from_u64(7);
        let sequence = RandomWalkPath::new(&mut rng)
            .with_walk_length(8)
            .generate(idx(0));

        assert_eq!(sequence.walk_len(), 8);
        assert_eq!(sequence.target(), Some(idx(0)));
        assert_connected_walk(&sequence);
    }

    #[test]
    fn oversized_walk_stops_when_cells_run_out() {
        let mut rng = SmallRng::seed_from_u64(3);
        let sequence = RandomWalkPath::new(&mut rng)
            .with_walk_length(20)
            .generate(idx(4));

        assert_eq!(sequence.walk_len(), GRID_CELLS - 1);
        assert_eq!(sequence.len(), GRID_CELLS);
        assert_eq!(sequence.target(), Some(idx(4)));
    }

    #[test]
    fn shortest_path_crosses_the_grid() {
        let path = shortest_path(idx(0), idx(8), CellSet::empty()).unwrap();

        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&idx(8)));
        assert!(idx(0).is_adjacent(path[0]));
        assert!(path.windows(2).all(|pair| pair[0].is_adjacent(pair[1])));
    }

    #[test]
    fn shortest_path_routes_around_blocked_cells() {
        let blocked: CellSet = [idx(1), idx(4)].into_iter().collect();
        let path = shortest_path(idx(0), idx(2), blocked).unwrap();

        assert_eq!(path.as_slice(), [idx(3), idx(6), idx(7), idx(8), idx(5), idx(2)]);
    }

    #[test]
    fn shortest_path_fails_when_the_target_is_walled_off() {
        let blocked: CellSet = [idx(1), idx(3)].into_iter().collect();
        assert_eq!(shortest_path(idx(8), idx(0), blocked), None);
    }

    #[test]
    fn shortest_path_to_self_is_empty() {
        assert_eq!(shortest_path(idx(4), idx(4), CellSet::empty()).map(|p| p.len()), Some(0));
    }
}
