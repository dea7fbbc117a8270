//! Position-category grouping for trade validation.

/// Category a roster position belongs to. Trades may only swap slots
/// within the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionGroup {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
    Other,
}

impl PositionGroup {
    /// Classify a position name. The sets are closed; anything the
    /// clients invent beyond them falls into `Other` (tradable only
    /// against `Other`).
    pub fn of(position: &str) -> Self {
        match position {
            "Portero" => Self::Goalkeeper,
            "Lateral Izquierdo" | "Central Izquierdo" | "Central Derecho" | "Lateral Derecho" => {
                Self::Defender
            }
            "Mediocentro Defensivo" | "Mediocentro" | "Mediocentro Ofensivo" => Self::Midfielder,
            "Extremo Izquierdo" | "Delantero Centro" | "Extremo Derecho" => Self::Attacker,
            _ => Self::Other,
        }
    }
}
