use serde::Serialize;

/// Song archetypes produced by the segmentation model, indexed by cluster id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Mainstream,
    AcousticIndie,
    SpokenNiche,
}

/// Display data for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentInfo {
    pub name: &'static str,
    pub popularity: &'static str,
    pub description: &'static str,
}

/// A segment with its cluster id, as listed by the `segments` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentEntry {
    pub id: usize,
    pub segment: Segment,
    #[serde(flatten)]
    pub info: SegmentInfo,
}

impl Segment {
    /// Every segment in cluster-id order. The centroid model must have exactly this many centroids.
    pub const ALL: [Segment; 3] = [
        Segment::Mainstream,
        Segment::AcousticIndie,
        Segment::SpokenNiche,
    ];

    pub fn from_id(id: usize) -> Option<Segment> {
        Self::ALL.get(id).copied()
    }

    pub fn id(&self) -> usize {
        match self {
            Self::Mainstream => 0,
            Self::AcousticIndie => 1,
            Self::SpokenNiche => 2,
        }
    }

    /// Every segment with its id and display data, in cluster-id order.
    pub fn catalog() -> Vec<SegmentEntry> {
        Self::ALL
            .iter()
            .map(|seg| SegmentEntry {
                id: seg.id(),
                segment: *seg,
                info: seg.info(),
            })
            .collect()
    }

    pub fn info(&self) -> SegmentInfo {
        match self {
            Self::Mainstream => SegmentInfo {
                name: "Commercial / High Energy Mainstream",
                popularity: "Highest Avg Popularity",
                description: "High energy, danceable, loud tracks. Strong commercial appeal.",
            },
            Self::AcousticIndie => SegmentInfo {
                name: "Acoustic / Emotional / Indie",
                popularity: "Medium Popularity",
                description: "More acoustic, softer, emotional or instrumental tracks.",
            },
            Self::SpokenNiche => SegmentInfo {
                name: "Speech / Spoken / Niche",
                popularity: "Very Low Popularity",
                description: "High speech content, niche/spoken-word style. High flop risk segment.",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_table() {
        for (i, seg) in Segment::ALL.iter().enumerate() {
            assert_eq!(seg.id(), i);
            assert_eq!(Segment::from_id(i), Some(*seg));
        }
    }

    #[test]
    fn catalog_serializes_flat() {
        let json = serde_json::to_value(Segment::catalog()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), Segment::ALL.len());
        assert_eq!(entries[2]["id"], 2);
        assert_eq!(entries[2]["segment"], "spoken_niche");
        assert_eq!(entries[2]["name"], "Speech / Spoken / Niche");
        assert_eq!(entries[0]["popularity"], "Highest Avg Popularity");
    }

    #[test]
    fn unknown_id_has_no_segment() {
        assert_eq!(Segment::from_id(3), None);
    }

    #[test]
    fn every_segment_has_descriptor() {
        for seg in Segment::ALL {
            let info = seg.info();
            assert!(!info.name.is_empty());
            assert!(!info.popularity.is_empty());
            assert!(!info.description.is_empty());
        }
        assert_eq!(
            Segment::from_id(2).map(|s| s.info().name),
            Some("Speech / Spoken / Niche")
        );
    }
}
