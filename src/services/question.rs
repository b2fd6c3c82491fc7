use std::collections::BTreeSet;

use thiserror::Error;

use crate::db::models::QuestionRow;
use crate::db::types::QuestionKind;

/// A validated assessment item. Correctness data is a tagged union keyed by
/// the question kind, so the scorer can match exhaustively instead of probing
/// nullable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) image_url: Option<String>,
    pub(crate) options: Vec<String>,
    pub(crate) correctness: Correctness,
    pub(crate) points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Correctness {
    SingleChoice { correct_index: usize },
    MultiChoice { correct_indices: BTreeSet<usize> },
    /// One expected TRUE/FALSE verdict per option, keyed by option position.
    TrueFalseSequence { correct_sequence: Vec<bool> },
    Essay,
}

/// A participant's answer to one question. The variant must match the
/// question kind; `record_answer` rejects mismatches before they reach the
/// scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Answer {
    SingleChoice(usize),
    MultiChoice(BTreeSet<usize>),
    TrueFalseSequence(Vec<bool>),
    Essay(String),
}

#[derive(Debug, Error)]
pub(crate) enum QuestionError {
    #[error("question {id}: missing correctness data for its kind")]
    MissingCorrectness { id: String },
    #[error("question {id}: correct index {index} is outside the {count} options")]
    IndexOutOfRange { id: String, index: i64, count: usize },
    #[error("question {id}: {expected} correctness slots for {count} options")]
    SlotCountMismatch { id: String, expected: usize, count: usize },
    #[error("question {id}: choice kinds require at least two options")]
    TooFewOptions { id: String },
}

impl Question {
    pub(crate) fn kind(&self) -> QuestionKind {
        match self.correctness {
            Correctness::SingleChoice { .. } => QuestionKind::SingleChoice,
            Correctness::MultiChoice { .. } => QuestionKind::MultiChoice,
            Correctness::TrueFalseSequence { .. } => QuestionKind::TrueFalseSequence,
            Correctness::Essay => QuestionKind::Essay,
        }
    }

    pub(crate) fn from_row(row: QuestionRow) -> Result<Self, QuestionError> {
        let QuestionRow {
            id,
            kind,
            text,
            image_url,
            options,
            correct_index,
            correct_indices,
            correct_sequence,
            points,
            ..
        } = row;
        let options = options.0;

        let correctness = match kind {
            QuestionKind::SingleChoice => {
                require_options(&id, &options)?;
                let index = correct_index
                    .ok_or_else(|| QuestionError::MissingCorrectness { id: id.clone() })?;
                let correct_index = checked_index(&id, index as i64, options.len())?;
                Correctness::SingleChoice { correct_index }
            }
            QuestionKind::MultiChoice => {
                require_options(&id, &options)?;
                let indices = correct_indices
                    .ok_or_else(|| QuestionError::MissingCorrectness { id: id.clone() })?
                    .0;
                if indices.is_empty() {
                    return Err(QuestionError::MissingCorrectness { id });
                }
                let mut correct_indices = BTreeSet::new();
                for index in indices {
                    correct_indices.insert(checked_index(&id, index as i64, options.len())?);
                }
                Correctness::MultiChoice { correct_indices }
            }
            QuestionKind::TrueFalseSequence => {
                require_options(&id, &options)?;
                let sequence = correct_sequence
                    .ok_or_else(|| QuestionError::MissingCorrectness { id: id.clone() })?
                    .0;
                if sequence.len() != options.len() {
                    return Err(QuestionError::SlotCountMismatch {
                        id,
                        expected: sequence.len(),
                        count: options.len(),
                    });
                }
                Correctness::TrueFalseSequence { correct_sequence: sequence }
            }
            QuestionKind::Essay => Correctness::Essay,
        };

        Ok(Self { id, text, image_url, options, correctness, points: points.max(0) })
    }
}

impl Answer {
    /// Whether every referenced index or verdict slot names an option the
    /// question actually has.
    pub(crate) fn fits_options(&self, option_count: usize) -> bool {
        match self {
            Answer::SingleChoice(picked) => *picked < option_count,
            Answer::MultiChoice(indices) => indices.iter().all(|&index| index < option_count),
            Answer::TrueFalseSequence(verdicts) => verdicts.len() == option_count,
            Answer::Essay(_) => true,
        }
    }

    pub(crate) fn matches_kind(&self, kind: QuestionKind) -> bool {
        matches!(
            (self, kind),
            (Answer::SingleChoice(_), QuestionKind::SingleChoice)
                | (Answer::MultiChoice(_), QuestionKind::MultiChoice)
                | (Answer::TrueFalseSequence(_), QuestionKind::TrueFalseSequence)
                | (Answer::Essay(_), QuestionKind::Essay)
        )
    }
}

fn require_options(id: &str, options: &[String]) -> Result<(), QuestionError> {
    if options.len() < 2 {
        return Err(QuestionError::TooFewOptions { id: id.to_string() });
    }
    Ok(())
}

fn checked_index(id: &str, index: i64, count: usize) -> Result<usize, QuestionError> {
    if index < 0 || index as usize >= count {
        return Err(QuestionError::IndexOutOfRange { id: id.to_string(), index, count });
    }
    Ok(index as usize)
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub(crate) fn single_choice(id: &str, correct_index: usize, points: i32) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            image_url: None,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correctness: Correctness::SingleChoice { correct_index },
            points,
        }
    }

    pub(crate) fn multi_choice(id: &str, correct: &[usize], points: i32) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            image_url: None,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correctness: Correctness::MultiChoice {
                correct_indices: correct.iter().copied().collect(),
            },
            points,
        }
    }

    pub(crate) fn true_false(id: &str, sequence: &[bool], points: i32) -> Question {
        let options =
            (0..sequence.len()).map(|index| format!("statement {index}")).collect::<Vec<_>>();
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            image_url: None,
            options,
            correctness: Correctness::TrueFalseSequence { correct_sequence: sequence.to_vec() },
            points,
        }
    }

    pub(crate) fn essay(id: &str, points: i32) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            image_url: None,
            options: Vec::new(),
            correctness: Correctness::Essay,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn base_row(kind: QuestionKind) -> QuestionRow {
        QuestionRow {
            id: "q1".to_string(),
            exam_id: "e1".to_string(),
            position: 0,
            kind,
            text: "2 + 2 = ?".to_string(),
            image_url: None,
            options: Json(vec!["1".into(), "2".into(), "3".into(), "4".into()]),
            correct_index: None,
            correct_indices: None,
            correct_sequence: None,
            points: 10,
        }
    }

    #[test]
    fn single_choice_row_converts() {
        let mut row = base_row(QuestionKind::SingleChoice);
        row.correct_index = Some(3);

        let question = Question::from_row(row).expect("valid row");
        assert_eq!(question.correctness, Correctness::SingleChoice { correct_index: 3 });
        assert_eq!(question.kind(), QuestionKind::SingleChoice);
    }

    #[test]
    fn single_choice_rejects_out_of_range_key() {
        let mut row = base_row(QuestionKind::SingleChoice);
        row.correct_index = Some(4);

        assert!(matches!(
            Question::from_row(row),
            Err(QuestionError::IndexOutOfRange { index: 4, count: 4, .. })
        ));
    }

    #[test]
    fn multi_choice_requires_at_least_one_key() {
        let mut row = base_row(QuestionKind::MultiChoice);
        row.correct_indices = Some(Json(Vec::new()));

        assert!(matches!(Question::from_row(row), Err(QuestionError::MissingCorrectness { .. })));
    }

    #[test]
    fn true_false_sequence_must_cover_every_option() {
        let mut row = base_row(QuestionKind::TrueFalseSequence);
        row.correct_sequence = Some(Json(vec![true, false]));

        assert!(matches!(
            Question::from_row(row),
            Err(QuestionError::SlotCountMismatch { expected: 2, count: 4, .. })
        ));
    }

    #[test]
    fn essay_ignores_missing_correctness() {
        let mut row = base_row(QuestionKind::Essay);
        row.options = Json(Vec::new());

        let question = Question::from_row(row).expect("essay row");
        assert_eq!(question.correctness, Correctness::Essay);
    }

    #[test]
    fn answer_option_bounds() {
        assert!(Answer::SingleChoice(3).fits_options(4));
        assert!(!Answer::SingleChoice(4).fits_options(4));
        assert!(Answer::MultiChoice([0, 3].into_iter().collect()).fits_options(4));
        assert!(!Answer::MultiChoice([0, 7].into_iter().collect()).fits_options(4));
        assert!(Answer::TrueFalseSequence(vec![true, false]).fits_options(2));
        assert!(!Answer::TrueFalseSequence(vec![true]).fits_options(2));
        assert!(Answer::Essay("text".into()).fits_options(0));
    }

    #[test]
    fn answer_kind_matching() {
        assert!(Answer::SingleChoice(1).matches_kind(QuestionKind::SingleChoice));
        assert!(!Answer::SingleChoice(1).matches_kind(QuestionKind::MultiChoice));
        assert!(Answer::Essay("text".into()).matches_kind(QuestionKind::Essay));
    }
}
