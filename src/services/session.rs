use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::config::AntiCheatSettings;
use crate::services::countdown::{Countdown, TimerEvent};
use crate::services::motivation::motivation_message;
use crate::services::penalty::{PenaltyMachine, PenaltyState};
use crate::services::question::{Answer, Question};
use crate::services::scoring;
use crate::services::shuffle::shuffle_questions;

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("session is already finished")]
    AlreadyFinished,
    #[error("session is frozen for {remaining_seconds} more seconds")]
    Frozen { remaining_seconds: u64 },
    #[error("question index {index} is outside the {count} questions")]
    QuestionOutOfRange { index: usize, count: usize },
    #[error("answer kind does not match the question kind")]
    AnswerKindMismatch,
    #[error("answer to question {index} references options it does not have")]
    AnswerOutOfRange { index: usize },
}

/// Final result of a session, computed exactly once.
#[derive(Debug, Clone)]
pub(crate) struct SessionOutcome {
    pub(crate) score: i32,
    pub(crate) max_score: i32,
    pub(crate) total_questions: usize,
    pub(crate) violation_count: u32,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) motivation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FocusLossOutcome {
    /// Anti-cheat is disabled or the session already finished.
    Ignored,
    /// A freeze was already running; freezes never stack.
    AlreadyFrozen { remaining_seconds: u64 },
    Frozen { freeze_seconds: u64, violation_count: u32 },
}

pub(crate) struct NewSession {
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) questions: Vec<Question>,
    pub(crate) duration_seconds: u64,
    pub(crate) anti_cheat: AntiCheatSettings,
    pub(crate) started_at: PrimitiveDateTime,
}

/// One participant's run through one exam. Owns the shuffled question order,
/// the answer sheet, and both per-second state machines. All mutation goes
/// through methods that enforce the frozen and finished gates.
pub(crate) struct ExamSession {
    id: String,
    exam_id: String,
    exam_title: String,
    student_id: String,
    student_name: String,
    questions: Vec<Question>,
    answers: Vec<Option<Answer>>,
    doubts: Vec<bool>,
    current_index: usize,
    countdown: Countdown,
    penalty: PenaltyMachine,
    anti_cheat: AntiCheatSettings,
    started_at: PrimitiveDateTime,
    outcome: Option<SessionOutcome>,
}

impl ExamSession {
    /// Shuffling happens here and only here. Resuming an existing session
    /// keeps the order the participant already saw.
    pub(crate) fn new<R: rand::Rng>(params: NewSession, rng: &mut R) -> Self {
        let questions = shuffle_questions(rng, params.questions);
        let count = questions.len();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            exam_id: params.exam_id,
            exam_title: params.exam_title,
            student_id: params.student_id,
            student_name: params.student_name,
            questions,
            answers: vec![None; count],
            doubts: vec![false; count],
            current_index: 0,
            countdown: Countdown::new(params.duration_seconds),
            penalty: PenaltyMachine::new(),
            anti_cheat: params.anti_cheat,
            started_at: params.started_at,
            outcome: None,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn exam_id(&self) -> &str {
        &self.exam_id
    }

    pub(crate) fn exam_title(&self) -> &str {
        &self.exam_title
    }

    pub(crate) fn student_id(&self) -> &str {
        &self.student_id
    }

    pub(crate) fn student_name(&self) -> &str {
        &self.student_name
    }

    pub(crate) fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub(crate) fn answers(&self) -> &[Option<Answer>] {
        &self.answers
    }

    pub(crate) fn doubts(&self) -> &[bool] {
        &self.doubts
    }

    pub(crate) fn current_index(&self) -> usize {
        self.current_index
    }

    pub(crate) fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub(crate) fn penalty_state(&self) -> PenaltyState {
        self.penalty.state()
    }

    pub(crate) fn violation_count(&self) -> u32 {
        self.penalty.violation_count()
    }

    pub(crate) fn anti_cheat(&self) -> &AntiCheatSettings {
        &self.anti_cheat
    }

    pub(crate) fn started_at(&self) -> PrimitiveDateTime {
        self.started_at
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub(crate) fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub(crate) fn answered_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.is_some()).count()
    }

    /// Restores the saved position, clamped to the question range.
    pub(crate) fn resume_at(&mut self, index: usize) {
        if self.questions.is_empty() {
            return;
        }
        self.current_index = index.min(self.questions.len() - 1);
    }

    pub(crate) fn go_next(&mut self) -> Result<usize, SessionError> {
        self.check_mutable()?;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
        Ok(self.current_index)
    }

    pub(crate) fn go_previous(&mut self) -> Result<usize, SessionError> {
        self.check_mutable()?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.current_index)
    }

    pub(crate) fn jump_to(&mut self, index: usize) -> Result<usize, SessionError> {
        self.check_mutable()?;
        self.check_index(index)?;
        self.current_index = index;
        Ok(self.current_index)
    }

    pub(crate) fn toggle_doubt(&mut self, index: usize) -> Result<bool, SessionError> {
        self.check_mutable()?;
        self.check_index(index)?;
        self.doubts[index] = !self.doubts[index];
        Ok(self.doubts[index])
    }

    pub(crate) fn record_answer(
        &mut self,
        index: usize,
        answer: Answer,
    ) -> Result<(), SessionError> {
        self.check_mutable()?;
        self.check_index(index)?;
        let question = &self.questions[index];
        if !answer.matches_kind(question.kind()) {
            return Err(SessionError::AnswerKindMismatch);
        }
        if !answer.fits_options(question.options.len()) {
            return Err(SessionError::AnswerOutOfRange { index });
        }
        self.answers[index] = Some(answer);
        Ok(())
    }

    pub(crate) fn clear_answer(&mut self, index: usize) -> Result<(), SessionError> {
        self.check_mutable()?;
        self.check_index(index)?;
        self.answers[index] = None;
        Ok(())
    }

    pub(crate) fn report_focus_loss(&mut self) -> FocusLossOutcome {
        if !self.anti_cheat.is_active || self.is_finished() {
            return FocusLossOutcome::Ignored;
        }
        if let PenaltyState::Frozen { remaining_seconds } = self.penalty.state() {
            return FocusLossOutcome::AlreadyFrozen { remaining_seconds };
        }

        match self.penalty.record_violation(self.anti_cheat.freeze_duration_seconds) {
            Some(freeze_seconds) => FocusLossOutcome::Frozen {
                freeze_seconds,
                violation_count: self.penalty.violation_count(),
            },
            None => FocusLossOutcome::AlreadyFrozen { remaining_seconds: 0 },
        }
    }

    /// One second of wall time. The countdown keeps running while the screen
    /// is frozen, so a freeze costs the participant exam time.
    pub(crate) fn tick_second(&mut self) -> Option<TimerEvent> {
        if self.is_finished() {
            return None;
        }
        self.penalty.tick();
        self.countdown.tick()
    }

    /// Scores the answer sheet and seals the session. Idempotent: repeated
    /// calls return the outcome computed by the first.
    pub(crate) fn finish(&mut self, now: PrimitiveDateTime) -> &SessionOutcome {
        if self.outcome.is_none() {
            let score = scoring::score(&self.questions, &self.answers);
            let max_score = scoring::max_score(&self.questions);
            self.outcome = Some(SessionOutcome {
                score,
                max_score,
                total_questions: self.questions.len(),
                violation_count: self.penalty.violation_count(),
                submitted_at: now,
                motivation: motivation_message(&self.student_name, score, max_score),
            });
        }
        match &self.outcome {
            Some(outcome) => outcome,
            None => unreachable!("outcome was just computed"),
        }
    }

    fn check_mutable(&self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::AlreadyFinished);
        }
        if let PenaltyState::Frozen { remaining_seconds } = self.penalty.state() {
            return Err(SessionError::Frozen { remaining_seconds });
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index >= self.questions.len() {
            return Err(SessionError::QuestionOutOfRange { index, count: self.questions.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;

    use super::*;
    use crate::services::countdown::TimerEvent;
    use crate::services::question::test_fixtures::{essay, multi_choice, single_choice, true_false};
    use crate::services::question::Correctness;

    fn anti_cheat(active: bool) -> AntiCheatSettings {
        AntiCheatSettings {
            is_active: active,
            freeze_duration_seconds: 15,
            alert_text: "alert".to_string(),
            enable_sound: true,
        }
    }

    fn session(active_anti_cheat: bool) -> ExamSession {
        let params = NewSession {
            exam_id: "e-1".to_string(),
            exam_title: "Matematika".to_string(),
            student_id: "s-1".to_string(),
            student_name: "Siti".to_string(),
            questions: vec![
                single_choice("q1", 1, 10),
                multi_choice("q2", &[0, 2], 10),
                essay("q3", 10),
            ],
            duration_seconds: 3600,
            anti_cheat: anti_cheat(active_anti_cheat),
            started_at: datetime!(2026-03-02 08:00:00),
        };
        ExamSession::new(params, &mut StdRng::seed_from_u64(5))
    }

    fn correct_answer(question: &Question) -> Answer {
        match &question.correctness {
            Correctness::SingleChoice { correct_index } => Answer::SingleChoice(*correct_index),
            Correctness::MultiChoice { correct_indices } => {
                Answer::MultiChoice(correct_indices.clone())
            }
            Correctness::TrueFalseSequence { correct_sequence } => {
                Answer::TrueFalseSequence(correct_sequence.clone())
            }
            Correctness::Essay => Answer::Essay("uraian".to_string()),
        }
    }

    #[test]
    fn navigation_stops_at_the_boundaries() {
        let mut session = session(true);

        assert_eq!(session.go_previous().expect("unfrozen"), 0);
        assert_eq!(session.go_next().expect("unfrozen"), 1);
        assert_eq!(session.go_next().expect("unfrozen"), 2);
        assert_eq!(session.go_next().expect("unfrozen"), 2);
        assert_eq!(session.jump_to(0).expect("in range"), 0);
        assert!(matches!(
            session.jump_to(3),
            Err(SessionError::QuestionOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn resume_clamps_to_the_last_question() {
        let mut session = session(true);
        session.resume_at(99);
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn answer_kind_must_match_question_kind() {
        let mut session = session(true);
        let wrong_kind = match session.questions()[0].kind() {
            crate::db::types::QuestionKind::Essay => Answer::SingleChoice(0),
            _ => Answer::Essay("text".to_string()),
        };

        assert!(matches!(
            session.record_answer(0, wrong_kind),
            Err(SessionError::AnswerKindMismatch)
        ));
    }

    #[test]
    fn answers_referencing_missing_options_are_rejected() {
        let mut session = session(true);
        let single_index = session
            .questions()
            .iter()
            .position(|q| q.kind() == crate::db::types::QuestionKind::SingleChoice)
            .expect("single choice present");
        let multi_index = session
            .questions()
            .iter()
            .position(|q| q.kind() == crate::db::types::QuestionKind::MultiChoice)
            .expect("multi choice present");

        assert!(matches!(
            session.record_answer(single_index, Answer::SingleChoice(99)),
            Err(SessionError::AnswerOutOfRange { .. })
        ));
        assert!(matches!(
            session.record_answer(multi_index, Answer::MultiChoice([0, 7].into_iter().collect())),
            Err(SessionError::AnswerOutOfRange { .. })
        ));
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn verdict_vector_must_cover_every_statement() {
        let params = NewSession {
            exam_id: "e-1".to_string(),
            exam_title: "PPKn".to_string(),
            student_id: "s-1".to_string(),
            student_name: "Andi".to_string(),
            questions: vec![true_false("q1", &[true, false, true], 6)],
            duration_seconds: 600,
            anti_cheat: anti_cheat(true),
            started_at: datetime!(2026-03-02 08:00:00),
        };
        let mut session = ExamSession::new(params, &mut StdRng::seed_from_u64(2));

        assert!(matches!(
            session.record_answer(0, Answer::TrueFalseSequence(vec![true])),
            Err(SessionError::AnswerOutOfRange { .. })
        ));
        session
            .record_answer(0, Answer::TrueFalseSequence(vec![true, false, true]))
            .expect("exact length");
    }

    #[test]
    fn freeze_blocks_answering_until_it_lifts() {
        let mut session = session(true);

        let outcome = session.report_focus_loss();
        assert_eq!(outcome, FocusLossOutcome::Frozen { freeze_seconds: 15, violation_count: 1 });
        assert!(matches!(
            session.record_answer(0, correct_answer(&session.questions()[0].clone())),
            Err(SessionError::Frozen { .. })
        ));
        assert!(matches!(session.go_next(), Err(SessionError::Frozen { .. })));

        for _ in 0..15 {
            session.tick_second();
        }
        let answer = correct_answer(&session.questions()[0].clone());
        session.record_answer(0, answer).expect("freeze lifted");
    }

    #[test]
    fn focus_loss_while_frozen_does_not_stack() {
        let mut session = session(true);
        session.report_focus_loss();

        assert!(matches!(
            session.report_focus_loss(),
            FocusLossOutcome::AlreadyFrozen { remaining_seconds: 15 }
        ));
        assert_eq!(session.violation_count(), 1);
    }

    #[test]
    fn focus_loss_is_ignored_when_anti_cheat_is_off() {
        let mut session = session(false);

        assert_eq!(session.report_focus_loss(), FocusLossOutcome::Ignored);
        assert_eq!(session.violation_count(), 0);
    }

    #[test]
    fn focus_loss_after_finish_is_ignored() {
        let mut session = session(true);
        session.finish(datetime!(2026-03-02 09:00:00));

        assert_eq!(session.report_focus_loss(), FocusLossOutcome::Ignored);
    }

    #[test]
    fn finish_is_computed_exactly_once() {
        let mut session = session(true);
        session.report_focus_loss();

        let first_submitted = session.finish(datetime!(2026-03-02 09:00:00)).submitted_at;
        let second = session.finish(datetime!(2026-03-02 10:00:00));

        assert_eq!(second.submitted_at, first_submitted);
        assert_eq!(second.violation_count, 1);
        assert!(matches!(session.go_next(), Err(SessionError::AlreadyFinished)));
    }

    #[test]
    fn correct_answers_score_through_the_shuffled_order() {
        let mut session = session(true);
        for index in 0..session.questions().len() {
            let answer = correct_answer(&session.questions()[index].clone());
            session.record_answer(index, answer).expect("unfrozen session");
        }

        let outcome = session.finish(datetime!(2026-03-02 09:00:00));
        // The essay stays at zero until a teacher reviews it.
        assert_eq!(outcome.score, 20);
        assert_eq!(outcome.max_score, 30);
        assert_eq!(outcome.total_questions, 3);
        assert!(outcome.motivation.contains("Siti"));
    }

    #[test]
    fn timer_expires_through_tick_second() {
        let params = NewSession {
            exam_id: "e-1".to_string(),
            exam_title: "Fisika".to_string(),
            student_id: "s-1".to_string(),
            student_name: "Budi".to_string(),
            questions: vec![single_choice("q1", 0, 10)],
            duration_seconds: 2,
            anti_cheat: anti_cheat(true),
            started_at: datetime!(2026-03-02 08:00:00),
        };
        let mut session = ExamSession::new(params, &mut StdRng::seed_from_u64(1));

        assert_eq!(session.tick_second(), None);
        assert_eq!(session.tick_second(), Some(TimerEvent::Expired));
        assert_eq!(session.tick_second(), None);

        session.finish(datetime!(2026-03-02 08:00:02));
        assert_eq!(session.tick_second(), None);
    }

    #[test]
    fn expiry_scores_whatever_answers_exist() {
        let params = NewSession {
            exam_id: "e-1".to_string(),
            exam_title: "Biologi".to_string(),
            student_id: "s-1".to_string(),
            student_name: "Siti".to_string(),
            questions: vec![single_choice("q1", 0, 10), single_choice("q2", 1, 10)],
            duration_seconds: 3,
            anti_cheat: anti_cheat(true),
            started_at: datetime!(2026-03-02 08:00:00),
        };
        let mut session = ExamSession::new(params, &mut StdRng::seed_from_u64(9));

        let correct = correct_answer(&session.questions()[0].clone());
        session.record_answer(0, correct).expect("unfrozen session");
        let wrong = match &session.questions()[1].correctness {
            Correctness::SingleChoice { correct_index } => {
                Answer::SingleChoice((correct_index + 1) % session.questions()[1].options.len())
            }
            other => panic!("unexpected correctness: {other:?}"),
        };
        session.record_answer(1, wrong).expect("unfrozen session");

        while session.tick_second() != Some(TimerEvent::Expired) {}
        let outcome = session.finish(datetime!(2026-03-02 08:00:03));
        assert_eq!(outcome.score, 10);
        assert_eq!(outcome.max_score, 20);
    }

    #[test]
    fn clear_answer_empties_the_slot() {
        let mut session = session(true);
        let answer = correct_answer(&session.questions()[0].clone());
        session.record_answer(0, answer).expect("unfrozen session");
        assert_eq!(session.answered_count(), 1);

        session.clear_answer(0).expect("unfrozen session");
        assert_eq!(session.answered_count(), 0);
    }
}
