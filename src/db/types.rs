use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Assessment item kinds. Source data labels these PG, PG_KOMPLEKS/CHECKLIST,
/// BENAR_SALAH and URAIAN; the importer normalizes them to these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questionkind", rename_all = "snake_case")]
pub(crate) enum QuestionKind {
    SingleChoice,
    MultiChoice,
    TrueFalseSequence,
    Essay,
}
