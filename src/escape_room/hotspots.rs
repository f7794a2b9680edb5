use crate::escape_room::models::STAGE_COUNT;

/// Position of a clickable overlay, as percentages of the stage image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotspot {
    pub top: &'static str,
    pub left: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseHotspots {
    pub hints: [Hotspot; 3],
    /// Opens the question/answer panel.
    pub lock: Hotspot,
}

const fn at(top: &'static str, left: &'static str) -> Hotspot {
    Hotspot { top, left }
}

pub const PHASE_HOTSPOTS: [PhaseHotspots; STAGE_COUNT] = [
    PhaseHotspots {
        hints: [at("75%", "72%"), at("66%", "20%"), at("66%", "82%")],
        lock: at("50%", "28%"),
    },
    PhaseHotspots {
        hints: [at("70%", "70%"), at("65%", "40%"), at("90%", "20%")],
        lock: at("45%", "50%"),
    },
    PhaseHotspots {
        hints: [at("75%", "60%"), at("47%", "25%"), at("64%", "80%")],
        lock: at("50%", "46%"),
    },
    PhaseHotspots {
        hints: [at("80%", "70%"), at("75%", "13%"), at("66%", "40%")],
        lock: at("53%", "51%"),
    },
];

pub fn phase_hotspots(stage: usize) -> Option<&'static PhaseHotspots> {
    PHASE_HOTSPOTS.get(stage)
}
