pub(crate) mod exams;
pub(crate) mod results;
