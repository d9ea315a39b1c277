pub mod advisor;
pub mod normalizer;
pub mod pipeline;
pub mod proposal;

mod prompts;

pub use advisor::{
    CrisisCategory, InMemorySolutionCache, Recommendation, SolutionAdvisor, SolutionCache,
};
pub use normalizer::{AllocationPackage, NormalizedSolution};
pub use pipeline::{PlanError, Report, ReportPlanner};
pub use proposal::SolutionDraft;
