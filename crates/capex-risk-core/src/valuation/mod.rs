pub mod appraisal;
pub mod decision;
