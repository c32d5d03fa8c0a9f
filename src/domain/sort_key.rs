use crate::domain::EarthquakeRecord;

/// Column the result table is ordered by. Magnitude sorts strongest first,
/// every other column ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Magnitude,
    Time,
    Place,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Magnitude, SortKey::Time, SortKey::Place];

    pub fn parse(s: &str) -> Result<SortKey, String> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("{} is not a column the results can be sorted by.", s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Magnitude => "Magnitude",
            SortKey::Time => "Time",
            SortKey::Place => "Place",
        }
    }

    /// Stable sort, so records that compare equal keep their catalog order.
    pub fn sort(&self, records: &mut [EarthquakeRecord]) {
        match self {
            SortKey::Magnitude => records.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude)),
            SortKey::Time => records.sort_by_key(|r| r.occurred_at),
            SortKey::Place => records.sort_by(|a, b| a.place.cmp(&b.place)),
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Magnitude
    }
}
