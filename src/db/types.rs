use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Account role. Stored as free-form names in `roles`; legacy Tagalog names are aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Admin,
    Teacher,
    Parent,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Parent => "parent",
        }
    }

    /// Every stored spelling of this role, lower-cased.
    pub(crate) fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Admin => &["admin", "administrator"],
            Self::Teacher => &["teacher", "guro"],
            Self::Parent => &["parent", "magulang"],
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Some(Self::Admin),
            "teacher" | "guro" => Some(Self::Teacher),
            "parent" | "magulang" => Some(Self::Parent),
            _ => None,
        }
    }

    /// Normalizes a list of stored or claimed role names, dropping unknown ones and duplicates.
    pub(crate) fn normalize_all<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        let mut roles = Vec::new();
        for role in names.into_iter().filter_map(Self::parse) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        roles
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "reading_category")]
pub(crate) enum ReadingCategory {
    #[serde(rename = "Alphabet Knowledge", alias = "alphabet_knowledge")]
    #[sqlx(rename = "Alphabet Knowledge")]
    AlphabetKnowledge,
    #[serde(rename = "Phonological Awareness", alias = "phonological_awareness")]
    #[sqlx(rename = "Phonological Awareness")]
    PhonologicalAwareness,
    #[serde(rename = "Decoding", alias = "decoding")]
    #[sqlx(rename = "Decoding")]
    Decoding,
    #[serde(rename = "Word Recognition", alias = "word_recognition")]
    #[sqlx(rename = "Word Recognition")]
    WordRecognition,
    #[serde(rename = "Reading Comprehension", alias = "reading_comprehension")]
    #[sqlx(rename = "Reading Comprehension")]
    ReadingComprehension,
}

impl ReadingCategory {
    pub(crate) fn display_name(self) -> &'static str {
        match self {
            Self::AlphabetKnowledge => "Alphabet Knowledge",
            Self::PhonologicalAwareness => "Phonological Awareness",
            Self::Decoding => "Decoding",
            Self::WordRecognition => "Word Recognition",
            Self::ReadingComprehension => "Reading Comprehension",
        }
    }

    /// Accepts the display name or its snake_case form, case-insensitively.
    pub(crate) fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "alphabet_knowledge" => Some(Self::AlphabetKnowledge),
            "phonological_awareness" => Some(Self::PhonologicalAwareness),
            "decoding" => Some(Self::Decoding),
            "word_recognition" => Some(Self::WordRecognition),
            "reading_comprehension" => Some(Self::ReadingComprehension),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "objective_status", rename_all = "snake_case")]
pub(crate) enum ObjectiveStatus {
    Mastered,
    InProgress,
    NotStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "support_level", rename_all = "lowercase")]
pub(crate) enum SupportLevel {
    Minimal,
    Moderate,
    Extensive,
}

impl SupportLevel {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "minimal" => Some(Self::Minimal),
            "moderate" => Some(Self::Moderate),
            "extensive" => Some(Self::Extensive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "intervention_status", rename_all = "lowercase")]
pub(crate) enum InterventionStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl InterventionStatus {
    /// Statuses that link an intervention to IEP objectives.
    pub(crate) const LINKABLE: [Self; 2] = [Self::Active, Self::Completed];

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}
