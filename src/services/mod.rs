pub(crate) mod iep;
pub(crate) mod mailer;
pub(crate) mod storage;
pub(crate) mod student_refs;
