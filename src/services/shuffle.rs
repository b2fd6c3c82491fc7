use rand::seq::SliceRandom;
use rand::Rng;

use crate::services::question::{Correctness, Question};

/// Shuffles question order and, for choice questions, option order. Each
/// shuffled question keeps a remapped correctness key so the scorer works on
/// displayed positions. Called once per session, never on resume.
pub(crate) fn shuffle_questions<R: Rng>(rng: &mut R, mut questions: Vec<Question>) -> Vec<Question> {
    questions.shuffle(rng);
    for question in &mut questions {
        shuffle_options(rng, question);
    }
    questions
}

/// TRUE/FALSE sequences keep their option order: each statement is bound to
/// its position in the correctness vector. Essays carry no options.
fn shuffle_options<R: Rng>(rng: &mut R, question: &mut Question) {
    match &mut question.correctness {
        Correctness::SingleChoice { correct_index } => {
            let order = shuffled_order(rng, question.options.len());
            question.options = reorder(&question.options, &order);
            *correct_index = order
                .iter()
                .position(|&original| original == *correct_index)
                .unwrap_or(*correct_index);
        }
        Correctness::MultiChoice { correct_indices } => {
            let order = shuffled_order(rng, question.options.len());
            question.options = reorder(&question.options, &order);
            *correct_indices = order
                .iter()
                .enumerate()
                .filter(|(_, original)| correct_indices.contains(original))
                .map(|(displayed, _)| displayed)
                .collect();
        }
        Correctness::TrueFalseSequence { .. } | Correctness::Essay => {}
    }
}

fn shuffled_order<R: Rng>(rng: &mut R, len: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

fn reorder(options: &[String], order: &[usize]) -> Vec<String> {
    order.iter().map(|&original| options[original].clone()).collect()
}
