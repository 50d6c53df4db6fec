use tracing::{debug, info, warn};

use crate::cross_section::{self, CrossSectionPreset};
use crate::error::{EditError, EditResult};
use crate::geometry::{Float3, Frame, Quaternion};
use crate::model::{
    ranges_overlap, remap_range_after_insert, remap_range_after_remove, segment_count,
    validate_range, BridgeProfile, CircuitCurveData, CircuitData, CircuitPointData,
    CrossSectionData, CurveData, CurveId, PointData, RailingData, RoadData, RoadId, Settings,
};
use crate::rebuild::RebuildQueue;
use crate::track::{self, MeshBuffer, RoadBuild, Waypoint};

use super::events::{EditEvent, EventFilter, Notifier, SubscriptionId};
use super::handles::{PointRef, SectionPointRef};
use super::live::{LiveCurve, LiveGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handle {
    Forward,
    Backward,
}

/// An open editing session over a circuit.
///
/// The session owns the persistent data for its lifetime together with the
/// live mirror (frames, cross-section arc tables) derived from it. Every
/// mutation validates first and writes second, so a rejected edit leaves
/// nothing behind. Geometry is never rebuilt synchronously: edits mark the
/// affected roads on the injected [`RebuildQueue`] and the host drains it.
#[derive(Debug)]
pub struct EditSession {
    data: CircuitData,
    settings: Settings,
    queue: RebuildQueue,
    live: LiveGraph,
    notifier: Notifier,
}

impl EditSession {
    /// Starts a session. Loaded data is repaired first: cross-sections are
    /// forced open and zero up vectors replaced.
    pub fn begin(mut data: CircuitData, settings: Settings, queue: RebuildQueue) -> Self {
        data.enforce_invariants();
        let settings = settings.sanitized();
        let live = LiveGraph::build(&data, settings.arc_length_subdivisions);
        info!(
            curves = data.curves.len(),
            roads = data.roads.len(),
            "edit session started"
        );
        Self {
            data,
            settings,
            queue,
            live,
            notifier: Notifier::default(),
        }
    }

    /// Ends the session, discarding the live mirror and handing the data back.
    pub fn end(self) -> CircuitData {
        info!(
            curves = self.data.curves.len(),
            roads = self.data.roads.len(),
            "edit session ended"
        );
        self.data
    }

    pub fn data(&self) -> &CircuitData {
        &self.data
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn queue(&self) -> &RebuildQueue {
        &self.queue
    }

    /// Replaces the settings, rebuilds every mirror and marks every road dirty.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.live = LiveGraph::build(&self.data, self.settings.arc_length_subdivisions);
        self.queue.mark_all(self.data.roads.iter().map(|r| r.id));
    }

    // --- Events ---

    pub fn subscribe<F>(&mut self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: FnMut(&EditEvent) + 'static,
    {
        self.notifier.subscribe(filter, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Removes and returns queued events, oldest first.
    pub fn poll_events(&mut self) -> Vec<EditEvent> {
        self.notifier.drain()
    }

    // --- Lookup ---

    fn curve_slot(&self, curve: CurveId) -> EditResult<usize> {
        self.live
            .curve_index(curve)
            .ok_or(EditError::UnknownCurve(curve))
    }

    fn road_slot(&self, road: RoadId) -> EditResult<usize> {
        self.live.road_index(road).ok_or(EditError::UnknownRoad(road))
    }

    fn point_slot(&self, point: PointRef) -> EditResult<usize> {
        let slot = self.curve_slot(point.curve)?;
        let len = self.data.curves[slot].curve.len();
        if point.index >= len {
            return Err(EditError::PointOutOfRange {
                curve: point.curve,
                index: point.index,
                len,
            });
        }
        Ok(slot)
    }

    fn section_slot(&self, point: SectionPointRef) -> EditResult<usize> {
        let slot = self.point_slot(point.point)?;
        let len = self.section(slot, point.point.index).len();
        if point.index >= len {
            return Err(EditError::SectionPointOutOfRange {
                index: point.index,
                len,
            });
        }
        Ok(slot)
    }

    fn record(&self, slot: usize, index: usize) -> &CircuitPointData {
        &self.data.curves[slot].curve.points[index]
    }

    fn record_mut(&mut self, slot: usize, index: usize) -> &mut CircuitPointData {
        &mut self.data.curves[slot].curve.points[index]
    }

    fn section(&self, slot: usize, index: usize) -> &CrossSectionData {
        &self.record(slot, index).cross_section
    }

    fn section_mut(&mut self, slot: usize, index: usize) -> &mut CrossSectionData {
        &mut self.record_mut(slot, index).cross_section
    }

    pub fn curve_ids(&self) -> Vec<CurveId> {
        self.data.curves.iter().map(|c| c.id).collect()
    }

    pub fn road_ids(&self) -> Vec<RoadId> {
        self.data.roads.iter().map(|r| r.id).collect()
    }

    pub fn curve(&self, curve: CurveId) -> EditResult<&CircuitCurveData> {
        Ok(&self.data.curves[self.curve_slot(curve)?])
    }

    pub fn road(&self, road: RoadId) -> EditResult<&RoadData> {
        Ok(&self.data.roads[self.road_slot(road)?])
    }

    pub fn point(&self, point: PointRef) -> EditResult<&PointData> {
        let slot = self.point_slot(point)?;
        Ok(&self.record(slot, point.index).point)
    }

    // --- Geometry queries ---

    pub fn point_position(&self, point: PointRef) -> EditResult<Float3> {
        Ok(self.point(point)?.position)
    }

    /// Orthonormal frame of a point, in world space.
    pub fn point_frame(&self, point: PointRef) -> EditResult<Frame> {
        let slot = self.point_slot(point)?;
        Ok(self.live.curves[slot].points[point.index].frame)
    }

    pub fn point_tangent(&self, point: PointRef) -> EditResult<Float3> {
        Ok(self.point_frame(point)?.forward)
    }

    pub fn point_up(&self, point: PointRef) -> EditResult<Float3> {
        Ok(self.point_frame(point)?.up)
    }

    pub fn point_right(&self, point: PointRef) -> EditResult<Float3> {
        Ok(self.point_frame(point)?.right)
    }

    pub fn cross_section(&self, point: PointRef) -> EditResult<&CrossSectionData> {
        let slot = self.point_slot(point)?;
        Ok(self.section(slot, point.index))
    }

    /// Always false: cross-sections never wrap.
    pub fn cross_section_is_closed(&self, point: PointRef) -> EditResult<bool> {
        let slot = self.point_slot(point)?;
        Ok(self.live.curves[slot].points[point.index].section.is_closed())
    }

    /// Normalized arc position of each cross-section point.
    pub fn cross_section_normalized(&self, point: PointRef) -> EditResult<&[f32]> {
        let slot = self.point_slot(point)?;
        Ok(&self.live.curves[slot].points[point.index].section.arc.normalized)
    }

    pub fn cross_section_width(&self, point: PointRef) -> EditResult<f32> {
        Ok(cross_section::width(self.cross_section(point)?))
    }

    /// World position of a cross-section point, projected through its parent
    /// point's right/up basis.
    pub fn cross_section_world_position(&self, point: SectionPointRef) -> EditResult<Float3> {
        let slot = self.section_slot(point)?;
        let parent = point.point.index;
        let origin = self.record(slot, parent).point.position;
        let frame = &self.live.curves[slot].points[parent].frame;
        let local = self.section(slot, parent).points[point.index].position;
        Ok(cross_section::to_world(Some((origin, frame)), local))
    }

    // --- Change propagation ---

    fn mark_roads_touching(&self, point: PointRef) {
        let Some(slot) = self.live.curve_index(point.curve) else {
            return;
        };
        let curve = &self.data.curves[slot].curve;
        for road in self.data.roads_on_curve(point.curve) {
            if road.points(curve.len(), curve.is_closed).contains(&point.index) {
                self.queue.mark_dirty(road.id);
            }
        }
    }

    fn mark_roads_on_curve(&self, curve: CurveId) {
        self.queue
            .mark_all(self.data.roads_on_curve(curve).map(|r| r.id));
    }

    fn point_edited(&mut self, slot: usize, point: PointRef) {
        self.live.curves[slot].refresh_around(&self.data.curves[slot], point.index);
        self.notifier.emit(EditEvent::PointChanged(point));
        self.mark_roads_touching(point);
    }

    fn section_edited(&mut self, slot: usize, point: PointRef) {
        let subdivisions = self.settings.arc_length_subdivisions;
        self.live.curves[slot].refresh_section(&self.data.curves[slot], point.index, subdivisions);
        self.notifier.emit(EditEvent::CrossSectionChanged(point));
        self.notifier.emit(EditEvent::PointChanged(point));
        self.mark_roads_touching(point);
    }

    fn curve_edited(&mut self, slot: usize) {
        let data = &self.data.curves[slot];
        self.live.curves[slot] = LiveCurve::build(data, self.settings.arc_length_subdivisions);
        self.notifier.emit(EditEvent::CurveChanged(data.id));
        self.mark_roads_on_curve(data.id);
    }

    fn road_edited(&mut self, road: RoadId) {
        self.queue.mark_dirty(road);
        self.notifier.emit(EditEvent::RoadChanged(road));
    }

    // --- Point edits ---

    /// Moves the anchor; both handles follow rigidly.
    pub fn move_point(&mut self, point: PointRef, position: Float3) -> EditResult<()> {
        let slot = self.point_slot(point)?;
        let record = &mut self.record_mut(slot, point.index).point;
        let delta = position - record.position;
        record.translate(delta);
        self.point_edited(slot, point);
        Ok(())
    }

    pub fn move_forward_control(&mut self, point: PointRef, position: Float3) -> EditResult<()> {
        self.move_control(point, position, Handle::Forward)
    }

    pub fn move_backward_control(&mut self, point: PointRef, position: Float3) -> EditResult<()> {
        self.move_control(point, position, Handle::Backward)
    }

    /// Moves one handle. Unless the point's handles are independent, the
    /// opposite handle keeps its length and flips to the mirrored direction.
    fn move_control(&mut self, point: PointRef, position: Float3, handle: Handle) -> EditResult<()> {
        let slot = self.point_slot(point)?;
        let global = self.settings.independent_control_points;
        let record = &mut self.record_mut(slot, point.index).point;
        let independent = record.independent(global);
        let anchor = record.position;

        let (moved, opposite) = match handle {
            Handle::Forward => (&mut record.forward_control, &mut record.backward_control),
            Handle::Backward => (&mut record.backward_control, &mut record.forward_control),
        };
        *moved = position;
        if !independent {
            match (position - anchor).try_normalize() {
                Some(direction) => {
                    let length = opposite.distance(anchor);
                    *opposite = anchor - direction * length;
                }
                None => debug!(%point, "handle moved onto anchor, opposite left as is"),
            }
        }
        reorthonormalize_up(record);
        self.point_edited(slot, point);
        Ok(())
    }

    /// Rotates the handles and up vector about the anchor by yaw/pitch/roll
    /// Euler angles in degrees.
    pub fn rotate_point(&mut self, point: PointRef, euler_degrees: Float3) -> EditResult<()> {
        let slot = self.point_slot(point)?;
        let rotation = Quaternion::from_euler_degrees(euler_degrees);
        let record = &mut self.record_mut(slot, point.index).point;
        let anchor = record.position;
        let forward = rotation.mul_vec(record.forward_offset());
        let backward = rotation.mul_vec(record.backward_offset());
        record.forward_control = anchor + forward;
        record.backward_control = anchor + backward;
        record.up = rotation.mul_vec(record.up);
        record.sanitize();
        reorthonormalize_up(record);
        self.point_edited(slot, point);
        Ok(())
    }

    /// Sets or clears the per-point override of independent handle editing.
    pub fn set_point_independent(
        &mut self,
        point: PointRef,
        independent: Option<bool>,
    ) -> EditResult<()> {
        let slot = self.point_slot(point)?;
        self.record_mut(slot, point.index).point.independent_controls = independent;
        self.notifier.emit(EditEvent::PointChanged(point));
        Ok(())
    }

    // --- Curve edits ---

    /// Inserts a point with collapsed handles at `index`, then gives it
    /// automatic handles. Roads on the curve keep covering the same
    /// geometry; a road whose segment was split grows by one segment.
    pub fn insert_point_at(
        &mut self,
        curve: CurveId,
        index: usize,
        position: Float3,
    ) -> EditResult<PointRef> {
        let slot = self.curve_slot(curve)?;
        let len = self.data.curves[slot].curve.len();
        if index > len {
            return Err(EditError::PointOutOfRange { curve, index, len });
        }

        let fraction = self.settings.tangent_fraction;
        let data = &mut self.data.curves[slot].curve;
        let closed = data.is_closed;
        data.points
            .insert(index, CircuitPointData::from(PointData::new(position)));
        data.apply_auto_tangent(index, fraction);
        let segments = data.segment_count();

        for road in self.data.roads.iter_mut().filter(|r| r.curve == curve) {
            let (start, end) =
                remap_range_after_insert(road.start_segment, road.end_segment, index, len, closed);
            let max = segments.saturating_sub(1);
            road.start_segment = start.min(max);
            road.end_segment = end.min(max);
        }

        info!(%curve, index, "point inserted");
        self.curve_edited(slot);
        Ok(PointRef::new(curve, index))
    }

    /// Inserts a point after the start of the anchor-polyline segment
    /// closest to `position`. A curve without segments gets it appended.
    pub fn insert_point_on_segment(
        &mut self,
        curve: CurveId,
        position: Float3,
    ) -> EditResult<PointRef> {
        let slot = self.curve_slot(curve)?;
        let data = &self.data.curves[slot].curve;
        let index = data
            .closest_segment(position)
            .map_or(data.len(), |(segment, _)| segment + 1);
        self.insert_point_at(curve, index, position)
    }

    /// Removes a point and remaps the roads on its curve. Rejected when two
    /// roads would end up sharing the merged segment.
    pub fn remove_point(&mut self, point: PointRef) -> EditResult<CircuitPointData> {
        let slot = self.point_slot(point)?;
        let data = &self.data.curves[slot].curve;
        let remaining = data.len() - 1;
        let closed = data.is_closed;

        let remapped: Vec<(usize, RoadId, (usize, usize))> = self
            .data
            .roads
            .iter()
            .enumerate()
            .filter(|(_, r)| r.curve == point.curve)
            .map(|(i, r)| {
                let range = remap_range_after_remove(
                    r.start_segment,
                    r.end_segment,
                    point.index,
                    remaining,
                    closed,
                );
                (i, r.id, range)
            })
            .collect();
        for (k, (_, road, range)) in remapped.iter().enumerate() {
            for (_, other, other_range) in &remapped[k + 1..] {
                if ranges_overlap(*range, *other_range, remaining, closed) {
                    warn!(%point, %road, %other, "point removal would merge two roads");
                    return Err(EditError::RangeOverlap {
                        road: *road,
                        other: *other,
                    });
                }
            }
        }

        let removed = self.data.curves[slot].curve.points.remove(point.index);
        for (i, _, (start, end)) in remapped {
            self.data.roads[i].start_segment = start;
            self.data.roads[i].end_segment = end;
        }
        info!(%point, "point removed");
        self.curve_edited(slot);
        Ok(removed)
    }

    /// Opens or closes a curve. Returns false when nothing changed. Opening
    /// is rejected while a road uses the wrap segment.
    pub fn set_closed(&mut self, curve: CurveId, closed: bool) -> EditResult<bool> {
        let slot = self.curve_slot(curve)?;
        let data = &self.data.curves[slot].curve;
        if data.is_closed == closed {
            return Ok(false);
        }
        let len = data.len();
        if !closed && segment_count(len, false) > 0 {
            for road in self.data.roads_on_curve(curve) {
                if let Err(err) = validate_range(road.start_segment, road.end_segment, len, false) {
                    warn!(%curve, road = %road.id, "cannot open curve: {err}");
                    return Err(err);
                }
            }
        }

        self.data.curves[slot].curve.is_closed = closed;
        info!(%curve, closed, "curve closure changed");
        self.curve_edited(slot);
        Ok(true)
    }

    /// Adds a curve through `positions` with automatic handles and flat
    /// cross-sections.
    pub fn add_curve(&mut self, positions: &[Float3], closed: bool) -> CurveId {
        let id = CurveId(self.data.allocate_id());
        let points = positions
            .iter()
            .map(|&p| CircuitPointData::from(PointData::new(p)))
            .collect();
        let mut curve = CurveData::new(points, closed);
        curve.apply_auto_tangents(self.settings.tangent_fraction);

        let record = CircuitCurveData { id, curve };
        self.live.curves.push(LiveCurve::build(
            &record,
            self.settings.arc_length_subdivisions,
        ));
        self.data.curves.push(record);
        self.live.reindex(&self.data);
        info!(curve = %id, points = positions.len(), closed, "curve added");
        self.notifier.emit(EditEvent::CurveChanged(id));
        id
    }

    /// Removes a curve together with every road on it.
    pub fn remove_curve(&mut self, curve: CurveId) -> EditResult<CircuitCurveData> {
        let slot = self.curve_slot(curve)?;
        let roads: Vec<RoadId> = self.data.roads_on_curve(curve).map(|r| r.id).collect();
        self.data.roads.retain(|r| r.curve != curve);
        for road in &roads {
            self.queue.forget(*road);
        }
        let removed = self.data.curves.remove(slot);
        self.live.curves.remove(slot);
        self.live.reindex(&self.data);
        info!(%curve, roads = roads.len(), "curve removed");
        self.notifier.emit(EditEvent::CurveChanged(curve));
        Ok(removed)
    }

    /// Recomputes automatic handles for every point of a curve.
    pub fn auto_tangent_curve(&mut self, curve: CurveId) -> EditResult<()> {
        let slot = self.curve_slot(curve)?;
        let fraction = self.settings.tangent_fraction;
        let data = &mut self.data.curves[slot].curve;
        data.apply_auto_tangents(fraction);
        for point in &mut data.points {
            reorthonormalize_up(&mut point.point);
        }
        self.curve_edited(slot);
        Ok(())
    }

    // --- Cross-section edits ---

    /// Resamples a cross-section to `count` points. Returns false (no
    /// change) for counts below two.
    pub fn change_cross_section_point_count(
        &mut self,
        point: PointRef,
        count: usize,
    ) -> EditResult<bool> {
        let slot = self.point_slot(point)?;
        let fraction = self.settings.tangent_fraction;
        let subdivisions = self.settings.arc_length_subdivisions;
        let section = self.section_mut(slot, point.index);
        let changed = cross_section::change_point_count(section, count, fraction, subdivisions);
        if changed {
            self.section_edited(slot, point);
        }
        Ok(changed)
    }

    pub fn apply_cross_section_preset(
        &mut self,
        point: PointRef,
        preset: CrossSectionPreset,
    ) -> EditResult<()> {
        self.apply_cross_section_points(point, &preset.points())
    }

    /// Applies a custom preset shape; fewer than two points falls back to
    /// the flat preset.
    pub fn apply_cross_section_points(
        &mut self,
        point: PointRef,
        points: &[Float3],
    ) -> EditResult<()> {
        let slot = self.point_slot(point)?;
        let fraction = self.settings.tangent_fraction;
        cross_section::apply_preset(self.section_mut(slot, point.index), points, fraction);
        self.section_edited(slot, point);
        Ok(())
    }

    /// Replaces every cross-section point from local positions.
    pub fn set_cross_section_points(
        &mut self,
        point: PointRef,
        positions: &[Float3],
    ) -> EditResult<()> {
        let slot = self.point_slot(point)?;
        if positions.len() < 2 {
            return Err(EditError::TooFewPoints {
                min: 2,
                actual: positions.len(),
            });
        }
        let fraction = self.settings.tangent_fraction;
        let section = self.section_mut(slot, point.index);
        cross_section::set_points_from_local_positions(section, positions, fraction);
        self.section_edited(slot, point);
        Ok(())
    }

    /// Moves one cross-section point (local across/up coordinates) and
    /// recomputes the profile's handles.
    pub fn move_cross_section_point(
        &mut self,
        point: SectionPointRef,
        local: Float3,
    ) -> EditResult<()> {
        let slot = self.section_slot(point)?;
        let fraction = self.settings.tangent_fraction;
        let section = self.section_mut(slot, point.point.index);
        cross_section::move_point(section, point.index, local, fraction);
        self.section_edited(slot, point.point);
        Ok(())
    }

    /// Cross-sections cannot be closed; a request to close one is ignored.
    pub fn set_cross_section_closed(&mut self, point: PointRef, closed: bool) -> EditResult<()> {
        self.point_slot(point)?;
        if closed {
            warn!(%point, "ignoring request to close a cross-section");
        }
        Ok(())
    }

    // --- Road edits ---

    fn check_range(
        &self,
        slot: usize,
        road: RoadId,
        start: usize,
        end: usize,
    ) -> EditResult<()> {
        let data = &self.data.curves[slot];
        let len = data.curve.len();
        let closed = data.curve.is_closed;
        if let Err(err) = validate_range(start, end, len, closed) {
            warn!(%road, curve = %data.id, "rejected road range: {err}");
            return Err(err);
        }
        let sibling = self
            .data
            .roads_on_curve(data.id)
            .filter(|r| r.id != road)
            .find(|r| ranges_overlap((start, end), (r.start_segment, r.end_segment), len, closed));
        if let Some(other) = sibling {
            warn!(%road, other = %other.id, start, end, "rejected overlapping road range");
            return Err(EditError::RangeOverlap {
                road,
                other: other.id,
            });
        }
        Ok(())
    }

    /// Adds a road over segments `start..=end` of a curve.
    pub fn add_road(&mut self, curve: CurveId, start: usize, end: usize) -> EditResult<RoadId> {
        let slot = self.curve_slot(curve)?;
        let id = RoadId(self.data.peek_id());
        self.check_range(slot, id, start, end)?;

        self.data.allocate_id();
        self.data.roads.push(RoadData::new(id, curve, start, end));
        self.live.reindex(&self.data);
        info!(road = %id, %curve, start, end, "road added");
        self.road_edited(id);
        Ok(id)
    }

    pub fn remove_road(&mut self, road: RoadId) -> EditResult<RoadData> {
        let slot = self.road_slot(road)?;
        let removed = self.data.roads.remove(slot);
        self.live.reindex(&self.data);
        self.queue.forget(road);
        info!(%road, "road removed");
        self.notifier.emit(EditEvent::RoadChanged(road));
        Ok(removed)
    }

    /// Changes a road's segment range. Rejected without changes when the
    /// range does not fit the curve or overlaps a sibling road.
    pub fn set_road_range(&mut self, road: RoadId, start: usize, end: usize) -> EditResult<()> {
        let road_slot = self.road_slot(road)?;
        let curve = self.data.roads[road_slot].curve;
        let slot = self.curve_slot(curve)?;
        self.check_range(slot, road, start, end)?;

        let record = &mut self.data.roads[road_slot];
        record.start_segment = start;
        record.end_segment = end;
        info!(%road, start, end, "road range changed");
        self.road_edited(road);
        Ok(())
    }

    /// Sets the mesh resolution: vertices across and rings per unit length.
    pub fn set_road_resolution(
        &mut self,
        road: RoadId,
        width_vertex_count: usize,
        length_density: f32,
    ) -> EditResult<()> {
        let slot = self.road_slot(road)?;
        let record = &mut self.data.roads[slot];
        record.width_vertex_count = width_vertex_count;
        record.length_density = length_density.max(0.0);
        self.road_edited(road);
        Ok(())
    }

    pub fn set_bridge_enabled(&mut self, road: RoadId, enabled: bool) -> EditResult<()> {
        let slot = self.road_slot(road)?;
        self.data.roads[slot].bridge.enabled = enabled;
        self.road_edited(road);
        Ok(())
    }

    pub fn set_bridge_profile(&mut self, road: RoadId, profile: BridgeProfile) -> EditResult<()> {
        let slot = self.road_slot(road)?;
        self.data.roads[slot].bridge.profile = profile;
        self.road_edited(road);
        Ok(())
    }

    /// Appends a railing and returns its index.
    pub fn add_railing(&mut self, road: RoadId, railing: RailingData) -> EditResult<usize> {
        let slot = self.road_slot(road)?;
        let railings = &mut self.data.roads[slot].railings;
        railings.push(railing);
        let index = railings.len() - 1;
        self.road_edited(road);
        Ok(index)
    }

    pub fn remove_railing(&mut self, road: RoadId, index: usize) -> EditResult<RailingData> {
        let slot = self.road_slot(road)?;
        let railings = &mut self.data.roads[slot].railings;
        if index >= railings.len() {
            return Err(EditError::RailingOutOfRange {
                road,
                index,
                len: railings.len(),
            });
        }
        let removed = railings.remove(index);
        self.road_edited(road);
        Ok(removed)
    }

    // --- Rebuild ---

    pub fn mark_dirty(&self, road: RoadId) -> EditResult<()> {
        self.road_slot(road)?;
        self.queue.mark_dirty(road);
        Ok(())
    }

    /// Drains the rebuild queue, dropping roads that no longer exist.
    pub fn drain_dirty(&self) -> Vec<RoadId> {
        self.queue
            .get_and_clear()
            .into_iter()
            .filter(|r| self.live.road_index(*r).is_some())
            .collect()
    }

    fn road_and_curve(&self, road: RoadId) -> EditResult<(&RoadData, &CircuitCurveData)> {
        let record = &self.data.roads[self.road_slot(road)?];
        let curve = &self.data.curves[self.curve_slot(record.curve)?];
        Ok((record, curve))
    }

    pub fn build_road(&self, road: RoadId) -> EditResult<RoadBuild> {
        let (record, curve) = self.road_and_curve(road)?;
        Ok(track::build_road(&curve.curve, record, &self.settings))
    }

    fn sweep(&self, road: RoadId) -> EditResult<(&RoadData, track::Sweep)> {
        let (record, curve) = self.road_and_curve(road)?;
        let sweep = track::sweep_road(&curve.curve, record, self.settings.arc_length_subdivisions);
        Ok((record, sweep))
    }

    pub fn build_road_mesh(&self, road: RoadId) -> EditResult<MeshBuffer> {
        let (record, sweep) = self.sweep(road)?;
        Ok(track::build_road_mesh(&sweep, &record.uv))
    }

    pub fn build_bridge_mesh(&self, road: RoadId) -> EditResult<MeshBuffer> {
        let (record, sweep) = self.sweep(road)?;
        Ok(track::build_bridge_mesh(&sweep, &record.bridge))
    }

    pub fn build_railing_mesh(&self, road: RoadId, index: usize) -> EditResult<MeshBuffer> {
        let (record, sweep) = self.sweep(road)?;
        let railing = record
            .railings
            .get(index)
            .ok_or(EditError::RailingOutOfRange {
                road,
                index,
                len: record.railings.len(),
            })?;
        Ok(track::build_railing_mesh(&sweep, railing))
    }

    pub fn build_waypoints(&self, road: RoadId) -> EditResult<Vec<Waypoint>> {
        let (record, curve) = self.road_and_curve(road)?;
        Ok(track::build_waypoints(
            &curve.curve,
            record,
            &self.settings.waypoints,
            self.settings.arc_length_subdivisions,
        ))
    }

    /// Drains the queue, rebuilds every dirty road and raises a built event
    /// per mesh.
    pub fn rebuild_dirty(&mut self) -> Vec<RoadBuild> {
        let dirty = self.drain_dirty();
        let mut builds = Vec::with_capacity(dirty.len());
        for road in dirty {
            let Ok(build) = self.build_road(road) else {
                continue;
            };
            self.notifier.emit(EditEvent::RoadBuilt {
                road,
                mesh: build.surface.clone(),
            });
            if let Some(mesh) = &build.bridge {
                self.notifier.emit(EditEvent::BridgeBuilt {
                    road,
                    mesh: mesh.clone(),
                });
            }
            for (index, mesh) in build.railings.iter().enumerate() {
                self.notifier.emit(EditEvent::RailingBuilt {
                    road,
                    index,
                    mesh: mesh.clone(),
                });
            }
            builds.push(build);
        }
        builds
    }
}

/// Re-derives a point's up vector against its handle tangent.
fn reorthonormalize_up(point: &mut PointData) {
    if let Some(tangent) = point.handle_tangent() {
        point.up = Frame::from_forward_up(tangent, point.up).up;
    }
}
