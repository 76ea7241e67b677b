pub mod draft;
pub mod evidence;
pub mod guardrails;
pub mod retrieve;
pub mod workflow;
