pub mod compare;
pub mod executor;
pub mod feedback;
pub mod grader;
pub mod queue;
