//! Review submission and helpfulness voting.
//!
//! [`ReviewPipeline`] gates a new review behind tier, content, and proximity
//! checks. [`VoteEngine`] records helpfulness votes and recomputes the
//! review's counts and its author's trust score from the vote rows.

pub mod submission;
pub mod votes;

pub use submission::{ReviewPipeline, ReviewSubmission, SubmissionOutcome, SubmissionStage};
pub use votes::{VoteEngine, VoteOutcome};
