//! Derived facts over stored records, and the vote operation.

pub mod queries;
pub mod voting;

pub use queries::{
    ChoiceTally, EvaluationResults, choice_percentage, load_results, percentage, total_votes,
};
pub use voting::vote;
