use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    /// Values are stored as `[in_tangent, value, out_tangent]` triples per key.
    CubicSpline,
}

/// How many keys the cursor scans locally before falling back to binary search.
const LOCAL_SCAN: usize = 3;

/// Remembers the last sampled segment so sequential playback is O(1).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    last_index: usize,
}

impl KeyframeCursor {
    #[must_use]
    pub fn index(&self) -> usize {
        self.last_index
    }
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track without checking its shape; see
    /// [`is_well_formed`](Self::is_well_formed).
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Value count required by the key count and interpolation mode.
    #[must_use]
    pub fn expected_value_count(&self) -> usize {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.times.len() * 3,
            _ => self.times.len(),
        }
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.values.len() == self.expected_value_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last key, or `0` for an empty track.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Stateless sample. Returns `None` for an empty or malformed track.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() || !self.is_well_formed() {
            return None;
        }
        Some(self.interpolate(self.segment_index(time), time))
    }

    /// Samples using `cursor` as a starting hint and updates it.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        if self.times.is_empty() || !self.is_well_formed() {
            return None;
        }
        let index = self.locate_from(time, cursor.last_index);
        cursor.last_index = index;
        Some(self.interpolate(index, time))
    }

    /// Segment `[times[i], times[i + 1])` containing `time`, via binary search.
    fn segment_index(&self, time: f32) -> usize {
        self.times.partition_point(|&t| t <= time).saturating_sub(1)
    }

    fn locate_from(&self, time: f32, hint: usize) -> usize {
        let last = self.times.len() - 1;
        let hint = hint.min(last);

        if time >= self.times[hint] {
            let end = (hint + LOCAL_SCAN).min(last);
            for idx in hint..end {
                if time < self.times[idx + 1] {
                    return idx;
                }
            }
            if end == last {
                return last;
            }
        } else {
            let start = hint.saturating_sub(LOCAL_SCAN);
            for idx in (start..hint).rev() {
                if time >= self.times[idx] {
                    return idx;
                }
            }
            if start == 0 {
                return 0;
            }
        }

        self.segment_index(time)
    }

    fn value_at(&self, index: usize) -> &T {
        match self.interpolation {
            InterpolationMode::CubicSpline => &self.values[index * 3 + 1],
            _ => &self.values[index],
        }
    }

    fn interpolate(&self, index: usize, time: f32) -> T {
        let last = self.times.len() - 1;
        if index >= last {
            return *self.value_at(last);
        }

        let next = index + 1;
        let (t0, t1) = (self.times[index], self.times[next]);
        let span = t1 - t0;
        let t = if span > 1e-6 {
            ((time - t0) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        match self.interpolation {
            InterpolationMode::Step => *self.value_at(index),
            InterpolationMode::Linear => {
                T::interpolate_linear(self.value_at(index), self.value_at(next), t)
            }
            InterpolationMode::CubicSpline => T::interpolate_cubic(
                &self.values[index * 3 + 1],
                &self.values[index * 3 + 2],
                &self.values[next * 3],
                &self.values[next * 3 + 1],
                t,
                span,
            ),
        }
    }
}
