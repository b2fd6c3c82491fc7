pub(crate) mod countdown;
pub(crate) mod motivation;
pub(crate) mod penalty;
pub(crate) mod progress;
pub(crate) mod question;
pub(crate) mod runtime;
pub(crate) mod scoring;
pub(crate) mod session;
pub(crate) mod shuffle;
