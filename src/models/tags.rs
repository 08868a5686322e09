// src/models/tags.rs

//! Primary topic taxonomy and the sentinel labels.

/// Label for entries that were never sent to the classifier.
pub const UNCLASSIFIED: &str = "unclassified";

/// Label for entries whose classification was attempted and gave up.
pub const CLASSIFICATION_FAILED: &str = "classification-failed";

/// Upper bound on secondary tags kept per announcement.
pub const MAX_SECONDARY_TAGS: usize = 5;

/// The closed set of primary topics, as the portal's audience names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryTag {
    /// Competitions and scholarships
    CompetitionScholarship,
    /// Campus facility operations
    FacilityOperations,
    /// Public examinations and fees
    ExamsAndFees,
    /// Lectures, clubs, campus events and programmes
    EventsAndActivities,
    /// Research information
    Research,
    /// Everything else (hiring, finance disclosures, party affairs, speeches)
    Other,
}

impl PrimaryTag {
    pub const ALL: [PrimaryTag; 6] = [
        PrimaryTag::CompetitionScholarship,
        PrimaryTag::FacilityOperations,
        PrimaryTag::ExamsAndFees,
        PrimaryTag::EventsAndActivities,
        PrimaryTag::Research,
        PrimaryTag::Other,
    ];

    /// The label stored on records and shown to readers.
    pub fn label(self) -> &'static str {
        match self {
            PrimaryTag::CompetitionScholarship => "竞赛/奖学金",
            PrimaryTag::FacilityOperations => "学校公共设施运营",
            PrimaryTag::ExamsAndFees => "学校公共考试与缴费",
            PrimaryTag::EventsAndActivities => "讲座/社团活动/学校活动/项目",
            PrimaryTag::Research => "科研信息",
            PrimaryTag::Other => "其它信息",
        }
    }

    /// Look up a taxonomy value by its label, tolerating surrounding spaces.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|tag| tag.label() == label)
    }
}

/// Whether a stored primary tag is one of the two sentinels.
pub fn is_sentinel(tag: &str) -> bool {
    tag == UNCLASSIFIED || tag == CLASSIFICATION_FAILED
}
