//! Direction keys for filter selection
//!
//! A [`Pose`] identifies one entry in the filter index. The first two
//! fields — azimuth and elevation — select the direction; the remaining
//! fields are opaque forward-compatibility slots (source/listener position,
//! custom indices) that participate in the key but not in spatial lookup.

/// Number of integer fields in a pose tuple.
pub const POSE_FIELDS: usize = 9;

/// Immutable direction key for a filter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pose {
    fields: [i32; POSE_FIELDS],
}

impl Pose {
    /// Create a pose from all nine fields.
    #[inline]
    pub const fn from_fields(fields: [i32; POSE_FIELDS]) -> Self {
        Self { fields }
    }

    /// Create a pose from a direction, zero-filling the auxiliary fields.
    #[inline]
    pub const fn from_direction(azimuth: i32, elevation: i32) -> Self {
        let mut fields = [0; POSE_FIELDS];
        fields[0] = azimuth;
        fields[1] = elevation;
        Self { fields }
    }

    /// Canonical string key, distinct for distinct field tuples.
    pub fn key(&self) -> String {
        let parts: Vec<String> = self.fields.iter().map(|f| f.to_string()).collect();
        parts.join("/")
    }

    /// The 2-D lookup coordinate (azimuth, elevation).
    #[inline]
    pub const fn coord(&self) -> (i32, i32) {
        (self.fields[0], self.fields[1])
    }

    #[inline]
    pub const fn azimuth(&self) -> i32 {
        self.fields[0]
    }

    #[inline]
    pub const fn elevation(&self) -> i32 {
        self.fields[1]
    }

    /// All nine fields, in index order.
    #[inline]
    pub const fn fields(&self) -> &[i32; POSE_FIELDS] {
        &self.fields
    }
}
