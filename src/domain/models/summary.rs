use crate::domain::models::item::Item;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    #[serde(rename = "profilePicture")]
    pub profile_picture: String,
    #[serde(rename = "totalCommits")]
    pub total_commits: u64,
    #[serde(rename = "openPullRequests")]
    pub open_pull_requests: Vec<Item>,
    #[serde(rename = "closedPullRequests")]
    pub closed_pull_requests: Vec<Item>,
    #[serde(rename = "openIssues")]
    pub open_issues: Vec<Item>,
    #[serde(rename = "closedIssues")]
    pub closed_issues: Vec<Item>,
}
