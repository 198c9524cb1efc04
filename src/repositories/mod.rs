pub(crate) mod category_results;
pub(crate) mod health;
pub(crate) mod iep_reports;
pub(crate) mod interventions;
pub(crate) mod sent_reports;
pub(crate) mod students;
pub(crate) mod users;
