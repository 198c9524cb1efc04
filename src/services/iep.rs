use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{CategoryResult, CategoryScore, IepObjective, IepReport, Intervention, Student};
use crate::db::types::{ObjectiveStatus, ReadingCategory, SupportLevel};

#[derive(Debug, Error, PartialEq)]
pub(crate) enum IepError {
    #[error("Invalid support level. Must be one of: minimal, moderate, extensive, or null")]
    InvalidSupportLevel,
    #[error("Remarks must be a string")]
    InvalidRemarks,
}

pub(crate) fn derive_status(score: f64, is_passed: bool) -> ObjectiveStatus {
    if score == 0.0 {
        ObjectiveStatus::NotStarted
    } else if is_passed {
        ObjectiveStatus::Mastered
    } else {
        ObjectiveStatus::InProgress
    }
}

pub(crate) fn generate_objectives(
    report_id: &str,
    categories: &[CategoryScore],
    default_threshold: f64,
    now: PrimitiveDateTime,
) -> Vec<IepObjective> {
    categories
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let status = derive_status(entry.score, entry.is_passed);
            IepObjective {
                id: Uuid::new_v4().to_string(),
                report_id: report_id.to_string(),
                position: position as i32,
                category: entry.category_name,
                lesson: entry.category_name.display_name().to_string(),
                status,
                completed: status == ObjectiveStatus::Mastered,
                support_level: None,
                remarks: String::new(),
                score: entry.score,
                passing_threshold: entry.passing_threshold.unwrap_or(default_threshold),
                has_intervention: false,
                intervention_id: None,
                intervention_name: None,
                intervention_status: None,
                intervention_created_at: None,
                updated_at: now,
            }
        })
        .collect()
}

#[derive(Debug)]
pub(crate) struct GeneratedReport {
    pub(crate) report: IepReport,
    pub(crate) objectives: Vec<IepObjective>,
}

/// Builds a fresh active report for `student` from one category result.
pub(crate) fn generate_report(
    student: &Student,
    source: &CategoryResult,
    academic_year: &str,
    default_threshold: f64,
    now: PrimitiveDateTime,
) -> GeneratedReport {
    let report_id = Uuid::new_v4().to_string();
    let objectives = generate_objectives(&report_id, &source.categories, default_threshold, now);

    let report = IepReport {
        id: report_id,
        student_id: student.id.clone(),
        student_number: student.id_number.clone(),
        reading_level: source.reading_level.clone().or_else(|| student.reading_level.clone()),
        overall_score: source.overall_score,
        source_result_id: Some(source.id.clone()),
        last_modified_by: None,
        is_active: true,
        academic_year: academic_year.to_string(),
        created_at: now,
        updated_at: now,
    };

    GeneratedReport { report, objectives }
}

/// Reads a `supportLevel` JSON value. Absent and `null` both mean "no level".
pub(crate) fn parse_support_level(value: Option<&Value>) -> Result<Option<SupportLevel>, IepError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => {
            SupportLevel::parse(raw).map(Some).ok_or(IepError::InvalidSupportLevel)
        }
        Some(_) => Err(IepError::InvalidSupportLevel),
    }
}

/// Selecting the level that is already stored clears it.
pub(crate) fn toggle_support_level(
    current: Option<SupportLevel>,
    requested: Option<SupportLevel>,
) -> Option<SupportLevel> {
    if current == requested {
        None
    } else {
        requested
    }
}

pub(crate) fn set_support_level(
    objective: &mut IepObjective,
    requested: Option<SupportLevel>,
    now: PrimitiveDateTime,
) {
    objective.support_level = toggle_support_level(objective.support_level, requested);
    objective.updated_at = now;
}

pub(crate) fn set_remarks(objective: &mut IepObjective, remarks: Option<String>, now: PrimitiveDateTime) {
    objective.remarks = remarks.unwrap_or_default();
    objective.updated_at = now;
}

/// One validated bulk-update entry. `support_level` is `Some(None)` when the field was sent as
/// `null`, `None` when it was omitted.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ObjectivePatch {
    pub(crate) objective_id: String,
    pub(crate) support_level: Option<Option<SupportLevel>>,
    pub(crate) remarks: Option<String>,
}

impl ObjectivePatch {
    pub(crate) fn from_json(
        objective_id: String,
        support_level: Option<&Value>,
        remarks: Option<&Value>,
    ) -> Result<Self, IepError> {
        let support_level = match support_level {
            None => None,
            Some(value) => Some(parse_support_level(Some(value))?),
        };
        let remarks = match remarks {
            None => None,
            Some(Value::Null) => Some(String::new()),
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => return Err(IepError::InvalidRemarks),
        };

        Ok(Self { objective_id, support_level, remarks })
    }
}

/// Applies every patch whose objective exists. Returns the indices of objectives whose values
/// changed; unknown ids are skipped.
pub(crate) fn apply_bulk(
    objectives: &mut [IepObjective],
    patches: &[ObjectivePatch],
    now: PrimitiveDateTime,
) -> Vec<usize> {
    let mut changed = Vec::new();

    for patch in patches {
        let Some(index) = objectives.iter().position(|item| item.id == patch.objective_id) else {
            continue;
        };
        let objective = &mut objectives[index];
        let mut dirty = false;

        if let Some(level) = patch.support_level {
            if objective.support_level != level {
                objective.support_level = level;
                dirty = true;
            }
        }

        if let Some(remarks) = &patch.remarks {
            if &objective.remarks != remarks {
                objective.remarks = remarks.clone();
                dirty = true;
            }
        }

        if dirty {
            objective.updated_at = now;
            if !changed.contains(&index) {
                changed.push(index);
            }
        }
    }

    changed
}

/// Overwrites the intervention linkage of every objective from `interventions`, which must be
/// ordered oldest first. The newest intervention per category wins. Returns how many objectives
/// changed.
pub(crate) fn resync_interventions(
    objectives: &mut [IepObjective],
    interventions: &[Intervention],
    now: PrimitiveDateTime,
) -> usize {
    let mut by_category: HashMap<ReadingCategory, &Intervention> = HashMap::new();
    for intervention in interventions {
        by_category.insert(intervention.category, intervention);
    }

    let mut changed = 0;
    for objective in objectives.iter_mut() {
        let before = (
            objective.has_intervention,
            objective.intervention_id.clone(),
            objective.intervention_name.clone(),
            objective.intervention_status,
            objective.intervention_created_at,
        );

        match by_category.get(&objective.category) {
            Some(intervention) => {
                objective.has_intervention = true;
                objective.intervention_id = Some(intervention.id.clone());
                objective.intervention_name = Some(intervention_label(intervention));
                objective.intervention_status = Some(intervention.status);
                objective.intervention_created_at = Some(intervention.created_at);
            }
            None => {
                objective.has_intervention = false;
                objective.intervention_id = None;
                objective.intervention_name = None;
                objective.intervention_status = None;
                objective.intervention_created_at = None;
            }
        }

        let after = (
            objective.has_intervention,
            objective.intervention_id.clone(),
            objective.intervention_name.clone(),
            objective.intervention_status,
            objective.intervention_created_at,
        );
        if before != after {
            objective.updated_at = now;
            changed += 1;
        }
    }

    changed
}

/// Column width of `iep_objectives.intervention_name`.
const INTERVENTION_LABEL_MAX_CHARS: usize = 200;

fn intervention_label(intervention: &Intervention) -> String {
    let name = intervention.name.trim();
    let label = if name.is_empty() {
        intervention.description.as_deref().unwrap_or_default().trim()
    } else {
        name
    };
    label.chars().take(INTERVENTION_LABEL_MAX_CHARS).collect()
}

/// Rounded mean of the category scores, used when a result arrives without an overall score.
pub(crate) fn overall_score(categories: &[CategoryScore]) -> f64 {
    if categories.is_empty() {
        return 0.0;
    }
    let total: f64 = categories.iter().map(|entry| entry.score).sum();
    (total / categories.len() as f64).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::InterventionStatus;
    use serde_json::json;
    use sqlx::types::Json;
    use time::macros::datetime;

    const NOW: PrimitiveDateTime = datetime!(2025-09-01 08:00:00);
    const LATER: PrimitiveDateTime = datetime!(2025-09-02 08:00:00);

    fn entry(category: ReadingCategory, score: f64, is_passed: bool) -> CategoryScore {
        CategoryScore {
            category_name: category,
            total_questions: 10,
            correct_answers: (score / 10.0) as i32,
            score,
            is_passed,
            passing_threshold: None,
        }
    }

    fn objectives(categories: &[ReadingCategory]) -> Vec<IepObjective> {
        let entries: Vec<_> = categories.iter().map(|c| entry(*c, 50.0, false)).collect();
        generate_objectives("report-1", &entries, 75.0, NOW)
    }

    fn intervention(
        id: &str,
        category: ReadingCategory,
        name: &str,
        status: InterventionStatus,
        created_at: PrimitiveDateTime,
    ) -> Intervention {
        Intervention {
            id: id.to_string(),
            student_id: "student-1".to_string(),
            category,
            name: name.to_string(),
            description: Some(format!("{name} description")),
            status,
            created_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn status_is_fully_determined_by_score_and_pass_flag() {
        assert_eq!(derive_status(0.0, true), ObjectiveStatus::NotStarted);
        assert_eq!(derive_status(0.0, false), ObjectiveStatus::NotStarted);
        assert_eq!(derive_status(0.5, true), ObjectiveStatus::Mastered);
        assert_eq!(derive_status(100.0, true), ObjectiveStatus::Mastered);
        assert_eq!(derive_status(74.9, false), ObjectiveStatus::InProgress);
        assert_eq!(derive_status(100.0, false), ObjectiveStatus::InProgress);
    }

    #[test]
    fn generation_follows_source_order_and_defaults() {
        let entries = vec![
            entry(ReadingCategory::Decoding, 0.0, false),
            entry(ReadingCategory::WordRecognition, 80.0, true),
            CategoryScore {
                passing_threshold: Some(60.0),
                ..entry(ReadingCategory::ReadingComprehension, 60.0, false)
            },
        ];

        let generated = generate_objectives("report-1", &entries, 75.0, NOW);

        let statuses: Vec<_> = generated.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![ObjectiveStatus::NotStarted, ObjectiveStatus::Mastered, ObjectiveStatus::InProgress]
        );
        assert_eq!(generated.iter().map(|o| o.position).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(generated[1].lesson, "Word Recognition");
        assert!(generated[1].completed);
        assert!(!generated[2].completed);
        assert_eq!(generated[0].passing_threshold, 75.0);
        assert_eq!(generated[2].passing_threshold, 60.0);
        assert!(generated.iter().all(|o| o.support_level.is_none()
            && o.remarks.is_empty()
            && !o.has_intervention
            && o.intervention_id.is_none()
            && o.report_id == "report-1"));
    }

    #[test]
    fn report_copies_source_fields() {
        let student = Student {
            id: "student-1".to_string(),
            id_number: "2025001".to_string(),
            first_name: "Juan".to_string(),
            last_name: "Dela Cruz".to_string(),
            grade_level: "Grade 1".to_string(),
            section: None,
            reading_level: Some("Low Emerging".to_string()),
            parent_id: None,
            created_at: NOW,
            updated_at: NOW,
        };
        let source = CategoryResult {
            id: "result-1".to_string(),
            student_id: Some("student-1".to_string()),
            assessment_id: None,
            assessment_type: "main-assessment".to_string(),
            reading_level: None,
            overall_score: 47.0,
            categories: Json(vec![entry(ReadingCategory::Decoding, 47.0, false)]),
            created_at: NOW,
        };

        let generated = generate_report(&student, &source, "2025-2026", 75.0, NOW);

        assert_eq!(generated.report.overall_score, 47.0);
        assert_eq!(generated.report.source_result_id.as_deref(), Some("result-1"));
        assert_eq!(generated.report.reading_level.as_deref(), Some("Low Emerging"));
        assert_eq!(generated.report.student_number, "2025001");
        assert_eq!(generated.report.academic_year, "2025-2026");
        assert_eq!(generated.objectives.len(), 1);
        assert_eq!(generated.objectives[0].report_id, generated.report.id);
    }

    #[test]
    fn support_level_parsing_accepts_only_known_values() {
        assert_eq!(parse_support_level(None), Ok(None));
        assert_eq!(parse_support_level(Some(&json!(null))), Ok(None));
        assert_eq!(parse_support_level(Some(&json!("extensive"))), Ok(Some(SupportLevel::Extensive)));
        assert_eq!(parse_support_level(Some(&json!(""))), Err(IepError::InvalidSupportLevel));
        assert_eq!(parse_support_level(Some(&json!("high"))), Err(IepError::InvalidSupportLevel));
        assert_eq!(parse_support_level(Some(&json!(2))), Err(IepError::InvalidSupportLevel));
    }

    #[test]
    fn repeating_a_support_level_toggles_it_off() {
        let mut objective = objectives(&[ReadingCategory::Decoding]).remove(0);

        set_support_level(&mut objective, Some(SupportLevel::Minimal), LATER);
        assert_eq!(objective.support_level, Some(SupportLevel::Minimal));
        assert_eq!(objective.updated_at, LATER);

        set_support_level(&mut objective, Some(SupportLevel::Minimal), LATER);
        assert_eq!(objective.support_level, None);

        set_support_level(&mut objective, Some(SupportLevel::Moderate), LATER);
        set_support_level(&mut objective, Some(SupportLevel::Extensive), LATER);
        assert_eq!(objective.support_level, Some(SupportLevel::Extensive));

        set_support_level(&mut objective, None, LATER);
        assert_eq!(objective.support_level, None);
    }

    #[test]
    fn remarks_default_to_empty() {
        let mut objective = objectives(&[ReadingCategory::Decoding]).remove(0);
        set_remarks(&mut objective, Some("Needs practice".to_string()), LATER);
        assert_eq!(objective.remarks, "Needs practice");
        set_remarks(&mut objective, None, LATER);
        assert_eq!(objective.remarks, "");
    }

    #[test]
    fn bulk_update_returns_only_changed_objectives() {
        let mut items = objectives(&[
            ReadingCategory::AlphabetKnowledge,
            ReadingCategory::Decoding,
            ReadingCategory::WordRecognition,
        ]);
        items[1].support_level = Some(SupportLevel::Moderate);
        let snapshot = items.clone();

        let patches = vec![
            ObjectivePatch::from_json(items[0].id.clone(), Some(&json!("minimal")), None).unwrap(),
            ObjectivePatch::from_json(items[1].id.clone(), Some(&json!("moderate")), None).unwrap(),
            ObjectivePatch::from_json(items[2].id.clone(), None, Some(&json!("Read daily")))
                .unwrap(),
            ObjectivePatch::from_json("missing".to_string(), Some(&json!(null)), None).unwrap(),
        ];

        let changed = apply_bulk(&mut items, &patches, LATER);

        assert_eq!(changed, vec![0, 2]);
        assert_eq!(items[0].support_level, Some(SupportLevel::Minimal));
        assert_eq!(items[1], snapshot[1]);
        assert_eq!(items[2].remarks, "Read daily");
        assert_eq!(items[2].support_level, None);
        assert_eq!(items[2].updated_at, LATER);
    }

    #[test]
    fn bulk_update_null_clears_and_absent_keeps() {
        let mut items = objectives(&[ReadingCategory::Decoding]);
        items[0].support_level = Some(SupportLevel::Extensive);
        items[0].remarks = "keep".to_string();

        let keep = ObjectivePatch::from_json(items[0].id.clone(), None, None).unwrap();
        assert!(apply_bulk(&mut items, &[keep], LATER).is_empty());
        assert_eq!(items[0].support_level, Some(SupportLevel::Extensive));

        let clear =
            ObjectivePatch::from_json(items[0].id.clone(), Some(&json!(null)), Some(&json!(null)))
                .unwrap();
        assert_eq!(apply_bulk(&mut items, &[clear], LATER), vec![0]);
        assert_eq!(items[0].support_level, None);
        assert_eq!(items[0].remarks, "");
    }

    #[test]
    fn bulk_update_with_unknown_id_changes_nothing() {
        let mut items = objectives(&[ReadingCategory::Decoding, ReadingCategory::WordRecognition]);
        let snapshot = items.clone();
        let patch =
            ObjectivePatch::from_json("not-there".to_string(), Some(&json!("minimal")), None)
                .unwrap();

        assert!(apply_bulk(&mut items, &[patch], LATER).is_empty());
        assert_eq!(items, snapshot);
    }

    #[test]
    fn patch_rejects_invalid_values() {
        assert_eq!(
            ObjectivePatch::from_json("a".to_string(), Some(&json!("MINIMAL")), None),
            Err(IepError::InvalidSupportLevel)
        );
        assert_eq!(
            ObjectivePatch::from_json("a".to_string(), None, Some(&json!(5))),
            Err(IepError::InvalidRemarks)
        );
    }

    #[test]
    fn resync_links_latest_intervention_per_category() {
        let mut items = objectives(&[
            ReadingCategory::Decoding,
            ReadingCategory::WordRecognition,
            ReadingCategory::ReadingComprehension,
        ]);
        let interventions = vec![
            intervention(
                "int-1",
                ReadingCategory::Decoding,
                "Phonics drills",
                InterventionStatus::Completed,
                NOW,
            ),
            intervention(
                "int-2",
                ReadingCategory::Decoding,
                "Blending games",
                InterventionStatus::Active,
                LATER,
            ),
            intervention(
                "int-3",
                ReadingCategory::WordRecognition,
                "",
                InterventionStatus::Active,
                NOW,
            ),
        ];

        let changed = resync_interventions(&mut items, &interventions, LATER);

        assert_eq!(changed, 2);
        assert!(items[0].has_intervention);
        assert_eq!(items[0].intervention_id.as_deref(), Some("int-2"));
        assert_eq!(items[0].intervention_name.as_deref(), Some("Blending games"));
        assert_eq!(items[0].intervention_status, Some(InterventionStatus::Active));
        assert_eq!(items[0].intervention_created_at, Some(LATER));
        assert_eq!(items[1].intervention_name.as_deref(), Some("description"));
        assert!(!items[2].has_intervention);
        assert_eq!(items[2].updated_at, NOW);
    }

    #[test]
    fn resync_is_idempotent_and_clears_stale_links() {
        let mut items = objectives(&[ReadingCategory::Decoding]);
        let interventions = vec![intervention(
            "int-1",
            ReadingCategory::Decoding,
            "Phonics drills",
            InterventionStatus::Active,
            NOW,
        )];

        resync_interventions(&mut items, &interventions, LATER);
        let first = items.clone();
        assert_eq!(resync_interventions(&mut items, &interventions, LATER), 0);
        assert_eq!(items, first);

        assert_eq!(resync_interventions(&mut items, &[], LATER), 1);
        assert!(!items[0].has_intervention);
        assert!(items[0].intervention_id.is_none());
        assert!(items[0].intervention_name.is_none());
        assert!(items[0].intervention_status.is_none());
        assert!(items[0].intervention_created_at.is_none());
    }

    #[test]
    fn blank_intervention_name_falls_back_to_capped_description() {
        let mut items = objectives(&[ReadingCategory::Decoding]);
        let mut blank = intervention(
            "int-1",
            ReadingCategory::Decoding,
            "   ",
            InterventionStatus::Active,
            NOW,
        );
        blank.description = Some("x".repeat(300));

        assert_eq!(resync_interventions(&mut items, &[blank], LATER), 1);
        let label = items[0].intervention_name.as_deref().expect("label");
        assert_eq!(label.chars().count(), INTERVENTION_LABEL_MAX_CHARS);
        assert!(label.chars().all(|c| c == 'x'));
    }

    #[test]
    fn overall_score_is_rounded_mean() {
        let entries = vec![
            entry(ReadingCategory::Decoding, 0.0, false),
            entry(ReadingCategory::WordRecognition, 80.0, true),
            entry(ReadingCategory::ReadingComprehension, 61.0, false),
        ];
        assert_eq!(overall_score(&entries), 47.0);
        assert_eq!(overall_score(&[]), 0.0);
    }
}
