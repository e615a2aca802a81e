//! Segment ring
//!
//! A fixed set of tiles, one per slot in `lo..=hi`, laid out along the flow
//! axis at `footprint * slot`. Together they form a periodic window over an
//! endless river. Each cycle:
//!
//! 1. [`SegmentRing::flow`] moves every segment one footprint towards
//!    negative x. Segments at or past the seam (`slot <= 0`) keep going for
//!    another [`FADE_FOOTPRINT_MULTIPLIER`] footprints while fading out.
//! 2. [`SegmentRing::advance`] shifts every slot index down by one.
//! 3. [`SegmentRing::recycle`] moves each faded segment (now at a negative
//!    slot) into a vacant slot and fades it back in.
//!
//! After step 3 the ring is back in its canonical layout.

use crate::error::{Result, SceneError};
use crate::geometry::SegmentGeometry;
use river_animation::{Interpolate, JoinBarrier, Tween, TweenGroup};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Extra footprints a seam segment travels while fading out
pub const FADE_FOOTPRINT_MULTIPLIER: f32 = 1.0;

/// Fade duration relative to the base flow duration
pub const FADE_DURATION_SCALE: f32 = 1.0;

/// Recycle duration relative to the base flow duration
pub const RECYCLE_DURATION_FRACTION: f32 = 0.25;

const CANONICAL_EPSILON: f32 = 1e-3;

/// Flow-axis offset and opacity of a segment, tweened together
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentTransform {
    pub offset: f32,
    pub opacity: f32,
}

impl SegmentTransform {
    pub fn new(offset: f32, opacity: f32) -> Self {
        Self { offset, opacity }
    }
}

impl Interpolate for SegmentTransform {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            offset: Interpolate::lerp(&self.offset, &other.offset, t),
            opacity: Interpolate::lerp(&self.opacity, &other.opacity, t),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.offset - other.offset).abs() < epsilon
            && (self.opacity - other.opacity).abs() < epsilon
    }
}

/// One tile of the ring
#[derive(Clone, Debug)]
pub struct Segment {
    id: usize,
    slot: i32,
    transform: SegmentTransform,
    geometry: Arc<SegmentGeometry>,
}

impl Segment {
    /// Stable index of this segment, also its index in [`SegmentRing::segments`]
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn slot(&self) -> i32 {
        self.slot
    }

    /// Position along the flow axis
    pub fn offset(&self) -> f32 {
        self.transform.offset
    }

    pub fn opacity(&self) -> f32 {
        self.transform.opacity
    }

    pub fn transform(&self) -> SegmentTransform {
        self.transform
    }

    pub fn geometry(&self) -> &Arc<SegmentGeometry> {
        &self.geometry
    }
}

struct RingState {
    footprint: f32,
    lo: i32,
    hi: i32,
    segments: Vec<Segment>,
}

impl RingState {
    fn set_offset(&mut self, id: usize, offset: f32) {
        if let Some(segment) = self.segments.get_mut(id) {
            segment.transform.offset = offset;
        }
    }

    fn set_transform(&mut self, id: usize, transform: SegmentTransform) {
        if let Some(segment) = self.segments.get_mut(id) {
            segment.transform = transform;
        }
    }
}

/// Ring of segments over slots `lo..=hi`
///
/// Clones share the same segments.
#[derive(Clone)]
pub struct SegmentRing {
    state: Rc<RefCell<RingState>>,
    group: TweenGroup,
}

impl SegmentRing {
    /// Lay out one segment per slot at its canonical position
    ///
    /// The seam (slot 0) must lie inside the ring with at least one slot
    /// after it, and the footprint must be positive.
    pub fn new(
        geometry: Arc<SegmentGeometry>,
        lo: i32,
        hi: i32,
        group: TweenGroup,
    ) -> Result<Self> {
        let footprint = geometry.footprint();
        if !(footprint.is_finite() && footprint > 0.0) {
            return Err(SceneError::InvalidRing(format!(
                "footprint must be positive, got {footprint}"
            )));
        }
        if lo > 0 || hi < 1 {
            return Err(SceneError::InvalidRing(format!(
                "slots {lo}..={hi} must satisfy lo <= 0 < hi"
            )));
        }

        let segments = (lo..=hi)
            .enumerate()
            .map(|(id, slot)| Segment {
                id,
                slot,
                transform: SegmentTransform::new(footprint * slot as f32, 1.0),
                geometry: Arc::clone(&geometry),
            })
            .collect();

        tracing::debug!(
            "SegmentRing: {} segments over slots {}..={}, footprint {}",
            hi - lo + 1,
            lo,
            hi,
            footprint
        );

        Ok(Self {
            state: Rc::new(RefCell::new(RingState {
                footprint,
                lo,
                hi,
                segments,
            })),
            group,
        })
    }

    /// Start the flow of every segment
    ///
    /// Each segment announces one participant on `barrier` and arrives when
    /// its last tween finishes: the fade for seam segments, the base flow for
    /// the others.
    pub fn flow(
        &self,
        duration_ms: u32,
        repeat_count: u32,
        barrier: &JoinBarrier,
    ) -> river_animation::Result<()> {
        let (footprint, entries) = {
            let state = self.state.borrow();
            let entries: Vec<(usize, i32, f32)> = state
                .segments
                .iter()
                .map(|s| (s.id, s.slot, s.transform.offset))
                .collect();
            (state.footprint, entries)
        };

        barrier.expect(entries.len())?;

        for (id, slot, start) in entries {
            let end = start - footprint;
            let weak = Rc::downgrade(&self.state);
            let barrier = barrier.clone();

            let on_complete: Box<dyn FnOnce() -> river_animation::Result<()>> = if slot <= 0 {
                let weak = weak.clone();
                let group = self.group.clone();
                Box::new(move || {
                    let fade = fade_tween(&weak, id, slot, end, footprint, duration_ms, barrier);
                    group.try_schedule(fade).map(|_| ())
                })
            } else {
                Box::new(move || barrier.arrive().map(|_| ()))
            };

            let tween = Tween::new(start, end, duration_ms)
                .label(format!("flow[{slot}]"))
                .repeat(repeat_count)
                .on_update(move |offset: &f32| {
                    if let Some(state) = weak.upgrade() {
                        state.borrow_mut().set_offset(id, *offset);
                    }
                })
                .try_on_complete(on_complete);
            self.group.try_schedule(tween)?;
        }
        Ok(())
    }

    /// Shift every slot index down by one after a completed flow
    pub fn advance(&self) {
        let mut state = self.state.borrow_mut();
        for segment in &mut state.segments {
            segment.slot -= 1;
        }
    }

    /// Move every faded segment into a vacant slot and fade it back in
    ///
    /// Only segments past the seam (negative slot) whose fade has finished
    /// are moved; a segment still visible keeps its slot.
    ///
    /// Vacancies are filled far end first, then the near vacancies in
    /// ascending order. Returns the number of recycled segments; each one
    /// arrives on `barrier` when its tween completes.
    pub fn recycle(
        &self,
        duration_ms: u32,
        barrier: &JoinBarrier,
    ) -> river_animation::Result<usize> {
        let recycle_ms = scaled_duration(duration_ms, RECYCLE_DURATION_FRACTION);

        let moves: Vec<(usize, i32, SegmentTransform, SegmentTransform)> = {
            let mut state = self.state.borrow_mut();
            let (lo, hi, footprint) = (state.lo, state.hi, state.footprint);

            let mut retired: SmallVec<[usize; 8]> = state
                .segments
                .iter()
                .filter(|s| s.slot < 0 && s.transform.opacity <= CANONICAL_EPSILON)
                .map(|s| s.id)
                .collect();
            retired.sort_by_key(|id| state.segments[*id].slot);

            let mut vacancies: SmallVec<[i32; 8]> = (lo..=hi)
                .filter(|slot| {
                    !state
                        .segments
                        .iter()
                        .any(|s| s.slot == *slot && !retired.contains(&s.id))
                })
                .collect();
            vacancies.sort_by_key(|slot| (*slot != hi, *slot));

            if retired.len() != vacancies.len() {
                tracing::warn!(
                    "SegmentRing: {} faded segments for {} vacant slots",
                    retired.len(),
                    vacancies.len()
                );
            }

            retired
                .into_iter()
                .zip(vacancies)
                .map(|(id, slot)| {
                    let segment = &mut state.segments[id];
                    segment.slot = slot;
                    let from = segment.transform;
                    let to = SegmentTransform::new(footprint * slot as f32, 1.0);
                    (id, slot, from, to)
                })
                .collect()
        };

        barrier.expect(moves.len())?;

        for (id, slot, from, to) in &moves {
            let (id, slot) = (*id, *slot);
            let weak = Rc::downgrade(&self.state);
            let barrier = barrier.clone();
            let tween = Tween::new(*from, *to, recycle_ms)
                .label(format!("recycle[{slot}]"))
                .on_update(move |transform: &SegmentTransform| {
                    if let Some(state) = weak.upgrade() {
                        state.borrow_mut().set_transform(id, *transform);
                    }
                })
                .try_on_complete(move || barrier.arrive().map(|_| ()));
            self.group.try_schedule(tween)?;
        }

        Ok(moves.len())
    }

    /// Slot and transform of every segment, ordered by slot
    pub fn snapshot(&self) -> Vec<(i32, SegmentTransform)> {
        let mut snapshot: Vec<(i32, SegmentTransform)> = self
            .state
            .borrow()
            .segments
            .iter()
            .map(|s| (s.slot, s.transform))
            .collect();
        snapshot.sort_by_key(|(slot, _)| *slot);
        snapshot
    }

    /// All segments, indexed by id
    pub fn segments(&self) -> Vec<Segment> {
        self.state.borrow().segments.clone()
    }

    pub fn segment(&self, id: usize) -> Option<Segment> {
        self.state.borrow().segments.get(id).cloned()
    }

    /// Segment currently holding `slot`
    pub fn segment_at(&self, slot: i32) -> Option<Segment> {
        self.state
            .borrow()
            .segments
            .iter()
            .find(|s| s.slot == slot)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().segments.is_empty()
    }

    pub fn footprint(&self) -> f32 {
        self.state.borrow().footprint
    }

    /// Slot range `(lo, hi)`
    pub fn bounds(&self) -> (i32, i32) {
        let state = self.state.borrow();
        (state.lo, state.hi)
    }

    /// Check for exactly one opaque segment per slot at its canonical position
    pub fn is_canonical(&self) -> bool {
        let state = self.state.borrow();
        let expected = (state.hi - state.lo + 1) as usize;
        if state.segments.len() != expected {
            return false;
        }
        (state.lo..=state.hi).all(|slot| {
            let holders: SmallVec<[&Segment; 2]> =
                state.segments.iter().filter(|s| s.slot == slot).collect();
            holders.len() == 1
                && holders[0].transform.approx_eq(
                    &SegmentTransform::new(state.footprint * slot as f32, 1.0),
                    CANONICAL_EPSILON,
                )
        })
    }

    /// Tween group the ring schedules into
    pub fn group(&self) -> &TweenGroup {
        &self.group
    }
}

/// Fade chained after a seam segment's base flow
fn fade_tween(
    state: &Weak<RefCell<RingState>>,
    id: usize,
    slot: i32,
    start: f32,
    footprint: f32,
    duration_ms: u32,
    barrier: JoinBarrier,
) -> Tween<SegmentTransform> {
    let from = SegmentTransform::new(start, 1.0);
    let to = SegmentTransform::new(start - footprint * FADE_FOOTPRINT_MULTIPLIER, 0.0);
    let state = state.clone();

    Tween::new(from, to, scaled_duration(duration_ms, FADE_DURATION_SCALE))
        .label(format!("fade[{slot}]"))
        .on_update(move |transform: &SegmentTransform| {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().set_transform(id, *transform);
            }
        })
        .try_on_complete(move || barrier.arrive().map(|_| ()))
}

fn scaled_duration(duration_ms: u32, factor: f32) -> u32 {
    (duration_ms as f32 * factor).round() as u32
}
