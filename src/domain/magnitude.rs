/// Lower bound of the magnitude slider and of stored subscription filters.
pub const MIN_MAGNITUDE: f32 = 1.0;
pub const MAX_MAGNITUDE: f32 = 10.0;

/// A magnitude floor on the Richter scale, always within
/// [`MIN_MAGNITUDE`, `MAX_MAGNITUDE`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Magnitude(f32);

impl Magnitude {
    pub fn parse(value: f32) -> Result<Magnitude, String> {
        if (MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "{} is not a valid minimum magnitude. Pick a value between {} and {}.",
                value, MIN_MAGNITUDE, MAX_MAGNITUDE
            ))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Magnitude {
    fn default() -> Self {
        Self(2.5)
    }
}

impl std::fmt::Display for Magnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
