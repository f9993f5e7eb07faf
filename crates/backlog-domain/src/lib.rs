pub mod collaborators;
pub mod issue;
pub mod link;
pub mod remote;
pub mod sprint;
pub mod view;

pub use collaborators::{BacklogSource, Summarizer, SummaryRequest};
pub use issue::{Issue, IssueId, NewIssue};
pub use link::SprintIssueLink;
pub use remote::{IssueFields, IssueRecord, IssueTypeRef, ParentRef, SprintRecord};
pub use sprint::{Sprint, SprintId, SprintIssues, PLACEHOLDER_STATE};
pub use view::{IssueView, SprintSummaryView, SprintView, SprintWithIssues};

#[cfg(any(test, feature = "mocks"))]
pub use collaborators::{MockBacklogSource, MockSummarizer};
