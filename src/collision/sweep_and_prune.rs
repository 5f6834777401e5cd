//! Persistent sweep-and-prune broadphase.
//!
//! Every body contributes a begin and an end point per axis. The three point
//! lists stay sorted across passes; because bodies move little between
//! frames, an insertion sort is close to linear. Each time a begin point
//! passes an end point (or the reverse) during the sort, the axis-overlap
//! counter of that pair changes, so overlap tracking falls out of keeping
//! the lists sorted. A pair whose counter reaches 3 overlaps on every axis
//! and is kept in the full-overlap set, which is what the narrowphase sees.
//!
//! When many bodies were added since the last pass the lists are sorted from
//! scratch and all counters rebuilt with an active-list sweep instead.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use hecs::Entity;

use super::arbiter::ArbiterKey;
use super::bit_matrix::{TriangularBitMatrix, FULL_OVERLAP};
use super::body::CollisionBody;
use super::dispatcher::CollisionDispatcher;
use super::{capture_bodies, CollisionConfig, CollisionSystem};
use crate::task::TaskPool;
use crate::CollisionError;

/// One end of a body's projection on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SweepPoint {
    /// Body slot.
    body: usize,
    begin: bool,
}

impl SweepPoint {
    #[inline]
    fn value(&self, axis: usize, bodies: &[CollisionBody]) -> f32 {
        let aabb = &bodies[self.body].bounding_box;
        if self.begin {
            aabb.min[axis]
        } else {
            aabb.max[axis]
        }
    }
}

/// Sort order of sweep points: by value, begin points before end points at
/// equal values so touching boxes count as overlapping.
#[inline]
fn compare_points(a_value: f32, a_begin: bool, b_value: f32, b_begin: bool) -> Ordering {
    a_value
        .partial_cmp(&b_value)
        .unwrap_or(Ordering::Equal)
        .then(b_begin.cmp(&a_begin))
}

struct OverlapState {
    matrix: TriangularBitMatrix,
    full_overlaps: HashSet<ArbiterKey>,
}

impl OverlapState {
    fn add_axis_overlap(&mut self, a: usize, b: usize, bodies: &[CollisionBody]) {
        if self.matrix.increment(a, b) == FULL_OVERLAP {
            self.full_overlaps
                .insert(ArbiterKey::new(bodies[a].entity, bodies[b].entity));
        }
    }

    fn remove_axis_overlap(&mut self, a: usize, b: usize, bodies: &[CollisionBody]) {
        if self.matrix.decrement(a, b) == FULL_OVERLAP - 1 {
            self.full_overlaps
                .remove(&ArbiterKey::new(bodies[a].entity, bodies[b].entity));
        }
    }
}

fn lock(state: &Mutex<OverlapState>) -> std::sync::MutexGuard<'_, OverlapState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

struct SweepAxis {
    axis: usize,
    points: Vec<SweepPoint>,
}

impl SweepAxis {
    fn new(axis: usize) -> Self {
        Self {
            axis,
            points: Vec::new(),
        }
    }

    /// Insertion sort that updates overlap counters for every begin/end
    /// crossing. Locks the shared state only around each counter update.
    fn sort_incremental(&mut self, bodies: &[CollisionBody], overlaps: &Mutex<OverlapState>) {
        let axis = self.axis;
        let points = &mut self.points;
        for j in 1..points.len() {
            let key = points[j];
            let key_value = key.value(axis, bodies);
            let mut i = j;
            while i > 0 {
                let swapper = points[i - 1];
                let swapper_value = swapper.value(axis, bodies);
                if compare_points(swapper_value, swapper.begin, key_value, key.begin)
                    != Ordering::Greater
                {
                    break;
                }
                if swapper.body != key.body {
                    if key.begin && !swapper.begin {
                        lock(overlaps).add_axis_overlap(key.body, swapper.body, bodies);
                    } else if !key.begin && swapper.begin {
                        lock(overlaps).remove_axis_overlap(key.body, swapper.body, bodies);
                    }
                }
                points[i] = swapper;
                i -= 1;
            }
            points[i] = key;
        }
    }

    /// Sort from scratch and count overlaps with an active-list sweep.
    /// Expects the counters to be zeroed.
    fn sort_full(&mut self, bodies: &[CollisionBody], state: &mut OverlapState, active: &mut Vec<usize>) {
        let axis = self.axis;
        self.points.sort_unstable_by(|a, b| {
            compare_points(a.value(axis, bodies), a.begin, b.value(axis, bodies), b.begin)
        });

        active.clear();
        for point in &self.points {
            if point.begin {
                for &other in active.iter() {
                    state.add_axis_overlap(point.body, other, bodies);
                }
                active.push(point.body);
            } else if let Some(pos) = active.iter().position(|&b| b == point.body) {
                active.swap_remove(pos);
            }
        }
    }
}

/// Persistent sweep-and-prune broadphase with a triangular matrix of
/// per-pair axis-overlap counters.
pub struct SweepAndPrune {
    dispatcher: CollisionDispatcher,
    pool: Arc<TaskPool>,
    /// Registered bodies; the position is the body's slot.
    bodies: Vec<Entity>,
    slots: HashMap<Entity, usize>,
    axes: [SweepAxis; 3],
    overlaps: Mutex<OverlapState>,
    active: Vec<usize>,
    add_counter: usize,
    swap_order: bool,
    pairs: Vec<(usize, usize)>,
    snapshot: Vec<CollisionBody>,
}

impl SweepAndPrune {
    pub fn new(config: CollisionConfig, pool: Arc<TaskPool>) -> Self {
        Self {
            dispatcher: CollisionDispatcher::new(config),
            pool,
            bodies: Vec::new(),
            slots: HashMap::new(),
            axes: [SweepAxis::new(0), SweepAxis::new(1), SweepAxis::new(2)],
            overlaps: Mutex::new(OverlapState {
                matrix: TriangularBitMatrix::default(),
                full_overlaps: HashSet::new(),
            }),
            active: Vec::new(),
            add_counter: 0,
            swap_order: false,
            pairs: Vec::new(),
            snapshot: Vec::new(),
        }
    }

    /// Pairs whose boxes overlapped on all three axes at the last pass.
    pub fn full_overlaps(&self) -> HashSet<ArbiterKey> {
        lock(&self.overlaps).full_overlaps.clone()
    }

    /// Number of body slots the overlap matrix currently holds.
    pub fn matrix_capacity(&self) -> usize {
        lock(&self.overlaps).matrix.capacity()
    }

    /// Slot of a registered body.
    pub fn slot(&self, entity: Entity) -> Option<usize> {
        self.slots.get(&entity).copied()
    }

    /// Grow or shrink the matrix in steps of the configured grow factor.
    fn resize_matrix(&mut self) {
        let count = self.bodies.len();
        let grow = self.dispatcher.config.matrix_grow_factor.max(1);
        let matrix = &mut self
            .overlaps
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .matrix;
        let capacity = matrix.capacity();
        if count > capacity {
            matrix.set_capacity(capacity + grow);
        } else if capacity - count > grow {
            matrix.set_capacity(capacity - grow);
        }
    }

    fn update_overlaps(&mut self, multithreaded: bool) {
        let bodies = &self.snapshot;
        if self.add_counter > self.dispatcher.config.full_rebuild_threshold {
            let state = self
                .overlaps
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner);
            state.matrix.zero_all();
            state.full_overlaps.clear();
            for axis in &mut self.axes {
                axis.sort_full(bodies, state, &mut self.active);
            }
            tracing::debug!(
                bodies = bodies.len(),
                added = self.add_counter,
                "sweep-and-prune full rebuild"
            );
        } else if multithreaded {
            let overlaps = &self.overlaps;
            self.pool
                .for_each_mut(&mut self.axes, |axis| axis.sort_incremental(bodies, overlaps));
        } else {
            for axis in &mut self.axes {
                axis.sort_incremental(bodies, &self.overlaps);
            }
        }
        self.add_counter = 0;
    }
}

impl CollisionSystem for SweepAndPrune {
    fn add_body(&mut self, entity: Entity) -> Result<(), CollisionError> {
        if self.slots.contains_key(&entity) {
            tracing::warn!(?entity, "body already in sweep-and-prune broadphase, ignored");
            return Ok(());
        }

        let slot = self.bodies.len();
        self.bodies.push(entity);
        self.slots.insert(entity, slot);
        for axis in &mut self.axes {
            axis.points.push(SweepPoint {
                body: slot,
                begin: true,
            });
            axis.points.push(SweepPoint {
                body: slot,
                begin: false,
            });
        }
        self.add_counter += 1;
        self.resize_matrix();

        tracing::debug!(?entity, slot, "body added to sweep-and-prune broadphase");
        Ok(())
    }

    fn remove_body(&mut self, entity: Entity) -> bool {
        let Some(index) = self.slots.remove(&entity) else {
            return false;
        };
        let last = self.bodies.len() - 1;

        for axis in &mut self.axes {
            axis.points.retain(|p| p.body != index);
            if index != last {
                for point in &mut axis.points {
                    if point.body == last {
                        point.body = index;
                    }
                }
            }
        }

        let state = self
            .overlaps
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        state.full_overlaps.retain(|key| !key.contains(entity));
        // Move the last body's counters into the freed slot, then clear the
        // vacated row.
        if index != last {
            for other in (0..last).filter(|&other| other != index) {
                let count = state.matrix.get(last, other);
                state.matrix.set(index, other, count);
            }
        }
        for other in 0..last {
            state.matrix.set(last, other, 0);
        }

        self.bodies.swap_remove(index);
        if index != last {
            self.slots.insert(self.bodies[index], index);
        }
        self.resize_matrix();

        tracing::debug!(?entity, "body removed from sweep-and-prune broadphase");
        true
    }

    fn detect(&mut self, world: &hecs::World, multithreaded: bool) -> Result<(), CollisionError> {
        capture_bodies(world, &self.bodies, &mut self.snapshot)?;
        self.update_overlaps(multithreaded);

        self.pairs.clear();
        {
            let state = self
                .overlaps
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner);
            for key in &state.full_overlaps {
                if let (Some(&a), Some(&b)) = (self.slots.get(&key.body1()), self.slots.get(&key.body2())) {
                    self.pairs.push((a.min(b), a.max(b)));
                }
            }
        }
        // Set iteration order is arbitrary; keep dispatch order reproducible.
        self.pairs.sort_unstable();

        let snapshot = &self.snapshot;
        let dispatcher = &self.dispatcher;
        let mut accepted = 0;
        for k in 0..self.pairs.len() {
            let (i, j) = self.pairs[k];
            let (a, b) = (&snapshot[i], &snapshot[j]);
            if CollisionDispatcher::check_both_static_or_inactive(a, b) {
                continue;
            }
            if !dispatcher.hooks.raise_passed_broadphase(a.entity, b.entity) {
                continue;
            }

            let (first, second) = if self.swap_order { (i, j) } else { (j, i) };
            self.swap_order = !self.swap_order;

            if multithreaded {
                self.pairs[accepted] = (first, second);
            } else {
                dispatcher.detect(&snapshot[first], &snapshot[second]);
            }
            accepted += 1;
        }

        if multithreaded {
            self.pairs.truncate(accepted);
            self.pool.for_each(&self.pairs, |&(first, second)| {
                dispatcher.detect(&snapshot[first], &snapshot[second]);
            });
        }

        tracing::trace!(bodies = snapshot.len(), pairs = accepted, multithreaded, "sweep-and-prune pass");
        Ok(())
    }

    fn bodies(&self) -> &[Entity] {
        &self.bodies
    }

    fn contains(&self, entity: Entity) -> bool {
        self.slots.contains_key(&entity)
    }

    fn dispatcher(&self) -> &CollisionDispatcher {
        &self.dispatcher
    }

    fn dispatcher_mut(&mut self) -> &mut CollisionDispatcher {
        &mut self.dispatcher
    }
}
