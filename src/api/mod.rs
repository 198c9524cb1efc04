pub(crate) mod admin;
pub(crate) mod assessments;
pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod extract;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod iep;
pub(crate) mod interventions;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod students;
pub(crate) mod validation;
