mod capacity;
mod common;
mod eligibility;
