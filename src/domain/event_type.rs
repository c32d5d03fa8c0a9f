/// Event types offered by the catalog. The catalog spelling is what gets
/// stored and sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Earthquake,
    Explosion,
    QuarryBlast,
    Landslide,
    IceQuake,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Earthquake,
        EventType::Explosion,
        EventType::QuarryBlast,
        EventType::Landslide,
        EventType::IceQuake,
    ];

    pub fn parse(s: &str) -> Result<EventType, String> {
        Self::ALL
            .iter()
            .copied()
            .find(|event_type| event_type.as_str() == s)
            .ok_or_else(|| format!("{} is not a supported event type.", s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Earthquake => "earthquake",
            EventType::Explosion => "explosion",
            EventType::QuarryBlast => "quarry blast",
            EventType::Landslide => "landslide",
            EventType::IceQuake => "ice quake",
        }
    }

    /// Sentence-cased label for display, e.g. "Quarry blast".
    pub fn label(&self) -> String {
        let mut chars = self.as_str().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl Default for EventType {
    fn default() -> Self {
        EventType::Earthquake
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
