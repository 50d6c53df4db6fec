use crate::geometry::Float3;
use crate::model::FLAT_HALF_WIDTH;

/// Built-in cross-section shapes, as local (across, up) positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossSectionPreset {
    /// Two points at x = -2 and x = +2.
    Flat,
    /// Flat with the centre line raised for drainage.
    Crowned,
    /// Right edge raised, for a cambered corner.
    Banked,
    /// Flat surface with a lowered drain channel at each edge.
    Gutter,
}

impl CrossSectionPreset {
    pub const ALL: [Self; 4] = [Self::Flat, Self::Crowned, Self::Banked, Self::Gutter];

    pub fn points(self) -> Vec<Float3> {
        let w = FLAT_HALF_WIDTH;
        match self {
            Self::Flat => vec![Float3::new(-w, 0.0, 0.0), Float3::new(w, 0.0, 0.0)],
            Self::Crowned => vec![
                Float3::new(-w, 0.0, 0.0),
                Float3::new(0.0, 0.15, 0.0),
                Float3::new(w, 0.0, 0.0),
            ],
            Self::Banked => vec![Float3::new(-w, 0.0, 0.0), Float3::new(w, 0.5, 0.0)],
            Self::Gutter => vec![
                Float3::new(-w - 0.5, 0.1, 0.0),
                Float3::new(-w, -0.1, 0.0),
                Float3::new(w, -0.1, 0.0),
                Float3::new(w + 0.5, 0.1, 0.0),
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Crowned => "crowned",
            Self::Banked => "banked",
            Self::Gutter => "gutter",
        }
    }
}
