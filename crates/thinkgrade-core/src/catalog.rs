//! The fixed exercise catalog and the rubric used to grade each exercise.

use crate::model::Exercise;

/// Grading rubric for one exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rubric {
    pub exercise_id: &'static str,
    pub scenario: &'static str,
    pub framework: &'static str,
    pub criteria: [&'static str; 4],
}

struct CatalogEntry {
    id: &'static str,
    title: &'static str,
    scenario: &'static str,
    question: &'static str,
    rubric: Rubric,
}

static CATALOG: [CatalogEntry; 3] = [
    CatalogEntry {
        id: "problem-1",
        title: "Preparing a pre-discharge conference",
        scenario: "A patient in their eighties is about to be discharged from hospital to home care. \
                   You have been asked to prepare the agenda for the pre-discharge conference with \
                   the hospital ward, the care manager and the family.",
        question: "List the topics the conference must cover, grouped into categories that neither \
                   overlap nor leave anything out.",
        rubric: Rubric {
            exercise_id: "problem-1",
            scenario: "Preparing a pre-discharge conference",
            framework: "MECE (mutually exclusive, collectively exhaustive)",
            criteria: [
                "Are the topics sorted into clearly defined categories?",
                "Do the categories avoid overlapping one another (mutually exclusive)?",
                "Are any important topics missing (collectively exhaustive)?",
                "Are concrete items to discuss listed under each category?",
            ],
        },
    },
    CatalogEntry {
        id: "problem-2",
        title: "Why is the clinic always so busy?",
        scenario: "Staff keep saying the clinic feels \"constantly rushed\", overtime is rising and \
                   small mistakes are becoming more frequent.",
        question: "Break the problem down to find its root causes.",
        rubric: Rubric {
            exercise_id: "problem-2",
            scenario: "Analysing why the clinic is \"constantly rushed\"",
            framework: "Logic tree",
            criteria: [
                "Is the problem decomposed logically?",
                "Are cause-and-effect relationships clear?",
                "Does the analysis move toward identifying root causes?",
                "Is the analysis an appropriate three to four levels deep?",
            ],
        },
    },
    CatalogEntry {
        id: "problem-3",
        title: "Briefing a new partner organisation",
        scenario: "A visiting-nurse station has just agreed to work with the clinic. You will brief \
                   their staff on why the partnership matters and how referrals will work.",
        question: "Structure the briefing so the key message is clear and well supported.",
        rubric: Rubric {
            exercise_id: "problem-3",
            scenario: "Preparing a briefing for a new partner organisation",
            framework: "Pyramid structure",
            criteria: [
                "Is the single most important message clear?",
                "Do the supporting arguments back up the main message?",
                "Are concrete facts or examples given?",
                "Is the overall structure persuasive?",
            ],
        },
    },
];

/// All exercises, in presentation order.
pub fn exercises() -> Vec<Exercise> {
    CATALOG
        .iter()
        .map(|e| Exercise {
            id: e.id.to_string(),
            title: e.title.to_string(),
            scenario: e.scenario.to_string(),
            question: e.question.to_string(),
        })
        .collect()
}

/// Look up the rubric for an exercise.
///
/// Unknown ids get the first rubric rather than an error.
pub fn rubric_for(exercise_id: &str) -> &'static Rubric {
    CATALOG
        .iter()
        .find(|e| e.id == exercise_id)
        .map(|e| &e.rubric)
        .unwrap_or(&CATALOG[0].rubric)
}

/// Display title for an exercise, or the raw id when it is not in the catalog.
pub fn exercise_title(exercise_id: &str) -> &str {
    CATALOG
        .iter()
        .find(|e| e.id == exercise_id)
        .map(|e| e.title)
        .unwrap_or(exercise_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_exercises_in_order() {
        let ids: Vec<String> = exercises().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["problem-1", "problem-2", "problem-3"]);
    }

    #[test]
    fn rubric_lookup() {
        assert_eq!(rubric_for("problem-2").framework, "Logic tree");
        assert_eq!(rubric_for("problem-3").framework, "Pyramid structure");
    }

    #[test]
    fn unknown_id_uses_first_rubric() {
        assert_eq!(rubric_for("problem-99"), rubric_for("problem-1"));
        assert_eq!(rubric_for(""), rubric_for("problem-1"));
    }

    #[test]
    fn title_falls_back_to_id() {
        assert_eq!(exercise_title("problem-2"), "Why is the clinic always so busy?");
        assert_eq!(exercise_title("bonus-round"), "bonus-round");
    }
}
