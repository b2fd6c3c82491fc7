use crate::services::question::{Answer, Correctness, Question};

/// Awards each question all of its points or none. Choice answers must match
/// the key exactly, sequences must match verdict for verdict, essays always
/// score zero pending manual review. Unanswered or mismatched slots score
/// zero.
pub(crate) fn score(questions: &[Question], answers: &[Option<Answer>]) -> i32 {
    questions
        .iter()
        .zip(answers.iter())
        .map(|(question, answer)| match answer {
            Some(answer) if is_correct(question, answer) => question.points,
            _ => 0,
        })
        .sum()
}

pub(crate) fn max_score(questions: &[Question]) -> i32 {
    questions.iter().map(|question| question.points).sum()
}

fn is_correct(question: &Question, answer: &Answer) -> bool {
    match (&question.correctness, answer) {
        (Correctness::SingleChoice { correct_index }, Answer::SingleChoice(picked)) => {
            picked == correct_index
        }
        (Correctness::MultiChoice { correct_indices }, Answer::MultiChoice(picked)) => {
            picked == correct_indices
        }
        (
            Correctness::TrueFalseSequence { correct_sequence },
            Answer::TrueFalseSequence(verdicts),
        ) => verdicts == correct_sequence,
        (Correctness::Essay, Answer::Essay(_)) => false,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::question::test_fixtures::{
        essay, multi_choice, single_choice, true_false,
    };

    #[test]
    fn single_choice_requires_exact_index() {
        let questions = vec![single_choice("q1", 2, 10)];

        assert_eq!(score(&questions, &[Some(Answer::SingleChoice(2))]), 10);
        assert_eq!(score(&questions, &[Some(Answer::SingleChoice(1))]), 0);
        assert_eq!(score(&questions, &[None]), 0);
    }

    #[test]
    fn multi_choice_requires_exact_set() {
        let questions = vec![multi_choice("q1", &[0, 2], 10)];

        let exact = Answer::MultiChoice([0, 2].into_iter().collect());
        let subset = Answer::MultiChoice([0].into_iter().collect());
        let superset = Answer::MultiChoice([0, 1, 2].into_iter().collect());

        assert_eq!(score(&questions, &[Some(exact)]), 10);
        assert_eq!(score(&questions, &[Some(subset)]), 0);
        assert_eq!(score(&questions, &[Some(superset)]), 0);
    }

    #[test]
    fn true_false_requires_every_verdict() {
        let questions = vec![true_false("q1", &[true, false, true], 6)];

        assert_eq!(
            score(&questions, &[Some(Answer::TrueFalseSequence(vec![true, false, true]))]),
            6
        );
        assert_eq!(
            score(&questions, &[Some(Answer::TrueFalseSequence(vec![true, true, true]))]),
            0
        );
        assert_eq!(score(&questions, &[Some(Answer::TrueFalseSequence(vec![true, false]))]), 0);
    }

    #[test]
    fn essays_never_score_automatically() {
        let questions = vec![essay("q1", 20)];

        assert_eq!(score(&questions, &[Some(Answer::Essay("a thorough answer".into()))]), 0);
        assert_eq!(max_score(&questions), 20);
    }

    #[test]
    fn mismatched_answer_kind_scores_zero() {
        let questions = vec![single_choice("q1", 0, 10)];

        assert_eq!(score(&questions, &[Some(Answer::Essay("0".into()))]), 0);
    }

    #[test]
    fn mixed_exam_totals() {
        let questions = vec![
            single_choice("q1", 1, 10),
            multi_choice("q2", &[1, 3], 15),
            essay("q3", 25),
        ];
        let answers = vec![
            Some(Answer::SingleChoice(1)),
            Some(Answer::MultiChoice([1, 3].into_iter().collect())),
            None,
        ];

        assert_eq!(score(&questions, &answers), 25);
        assert_eq!(max_score(&questions), 50);
    }

    #[test]
    fn scoring_is_idempotent() {
        let questions = vec![single_choice("q1", 0, 10), multi_choice("q2", &[2], 5)];
        let answers = vec![
            Some(Answer::SingleChoice(0)),
            Some(Answer::MultiChoice([2].into_iter().collect())),
        ];

        let first = score(&questions, &answers);
        assert_eq!(first, score(&questions, &answers));
        assert_eq!(first, 15);
    }
}
