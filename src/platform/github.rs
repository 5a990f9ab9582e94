//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CheckRun, GitCommit, NewCommit, PlatformConfig, PrComment, PrCommit, PullRequest,
    PullRequestDetails, Reaction, RequiredChecks, Signature,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use octocrab::models::repos::Object;
use octocrab::params::repos::Reference;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Message GitHub returns with a 404 when a branch has no protection rules
const BRANCH_NOT_PROTECTED: &str = "Branch not protected";

/// Upper bound GitHub accepts for `per_page`
const PAGE_SIZE: u8 = 100;

// Raw REST response shapes for endpoints where we only need a few fields

#[derive(Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Deserialize)]
struct RawBranchRef {
    #[serde(rename = "ref")]
    ref_field: String,
    #[serde(default)]
    sha: String,
}

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    title: String,
    body: Option<String>,
    base: RawBranchRef,
    head: RawBranchRef,
    #[serde(default)]
    commits: u64,
    mergeable_state: Option<String>,
    user: Option<RawUser>,
}

#[derive(Deserialize)]
struct RawIdentity {
    name: Option<String>,
    email: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawPrCommitInner {
    author: Option<RawIdentity>,
}

#[derive(Deserialize)]
struct RawPrCommit {
    sha: String,
    commit: RawPrCommitInner,
}

#[derive(Deserialize)]
struct RawGitCommit {
    sha: String,
    tree: ShaOnly,
    message: String,
    author: Option<Signature>,
    committer: Option<Signature>,
    #[serde(default)]
    parents: Vec<ShaOnly>,
}

impl From<RawGitCommit> for GitCommit {
    fn from(c: RawGitCommit) -> Self {
        Self {
            sha: c.sha,
            tree_sha: c.tree.sha,
            message: c.message,
            author: c.author,
            committer: c.committer,
            parents: c.parents.into_iter().map(|p| p.sha).collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawComparison {
    #[serde(default)]
    commits: Vec<ShaOnly>,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (status checks)
    token: String,
    /// HTTP client for raw requests (status checks)
    http_client: Client,
    /// API base URL for raw requests, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );

        let config = PlatformConfig { owner, repo, host };
        Self::with_api_base(token, config, &api_base)
    }

    /// Create a service talking to an explicit API base URL
    pub fn with_api_base(token: &str, config: PlatformConfig, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("pr-stacker")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            token: token.to_string(),
            http_client,
            api_base,
        })
    }

    /// Route prefix for repository-scoped REST endpoints
    fn repo_route(&self) -> String {
        format!("/repos/{}/{}", self.config.owner, self.config.repo)
    }

    async fn raw_get(&self, url: &str) -> Result<reqwest::Response> {
        self.http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Request to {url} failed: {e}")))
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn default_branch(&self) -> Result<String> {
        let repo = self
            .client
            .repos(&self.config.owner, &self.config.repo)
            .get()
            .await?;

        repo.default_branch.ok_or_else(|| {
            Error::GitHubApi(format!(
                "no default branch reported for {}/{}",
                self.config.owner, self.config.repo
            ))
        })
    }

    async fn get_file_content(&self, path: &str) -> Result<Option<String>> {
        debug!(path, "reading file content");
        let result = self
            .client
            .repos(&self.config.owner, &self.config.repo)
            .get_content()
            .path(path)
            .send()
            .await;

        match result {
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code == StatusCode::NOT_FOUND =>
            {
                debug!(path, "no file found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
            Ok(mut data) => {
                let items = data.take_items();
                let Some(item) = items.first() else {
                    return Ok(None);
                };
                item.decoded_content().map(Some).ok_or_else(|| {
                    Error::GitHubApi(format!("failed to decode file content for {path}"))
                })
            }
        }
    }

    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        debug!("listing open PRs");
        let page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PAGE_SIZE)
            .send()
            .await?;

        let prs = self.client.all_pages(page).await?;

        let result: Vec<PullRequest> = prs
            .into_iter()
            .map(|pr| PullRequest {
                number: pr.number,
                base_ref: pr.base.ref_field,
                head_ref: pr.head.ref_field,
                title: pr.title.unwrap_or_default(),
                body: pr.body,
            })
            .collect();
        debug!(count = result.len(), "listed open PRs");
        Ok(result)
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequestDetails> {
        debug!(pr_number, "getting PR details");
        let pr: RawPullRequest = self
            .client
            .get(
                format!("{}/pulls/{pr_number}", self.repo_route()),
                None::<&()>,
            )
            .await?;

        let details = PullRequestDetails {
            number: pr.number,
            title: pr.title,
            body: pr.body,
            base_ref: pr.base.ref_field,
            head_ref: pr.head.ref_field,
            head_sha: pr.head.sha,
            commit_count: pr.commits,
            mergeable_state: pr.mergeable_state,
            author_login: pr.user.map(|u| u.login).unwrap_or_default(),
        };
        debug!(pr_number, state = ?details.mergeable_state, "got PR details");
        Ok(details)
    }

    async fn list_pr_commits(&self, pr_number: u64) -> Result<Vec<PrCommit>> {
        debug!(pr_number, "listing PR commits");
        let commits: Vec<RawPrCommit> = self
            .client
            .get(
                format!(
                    "{}/pulls/{pr_number}/commits?per_page={PAGE_SIZE}",
                    self.repo_route()
                ),
                None::<&()>,
            )
            .await?;

        let result: Vec<PrCommit> = commits
            .into_iter()
            .map(|c| {
                let author = c.commit.author.and_then(|a| {
                    Some(Signature {
                        name: a.name?,
                        email: a.email?,
                        date: a.date.unwrap_or_else(Utc::now),
                    })
                });
                PrCommit { sha: c.sha, author }
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed PR commits");
        Ok(result)
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<PullRequest> {
        debug!(pr_number, new_base, "updating PR base");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .update(pr_number)
            .base(new_base)
            .send()
            .await?;

        debug!(pr_number, "updated PR base");
        Ok(PullRequest {
            number: pr.number,
            base_ref: pr.base.ref_field,
            head_ref: pr.head.ref_field,
            title: pr.title.unwrap_or_default(),
            body: pr.body,
        })
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<String> {
        let reference = self
            .client
            .repos(&self.config.owner, &self.config.repo)
            .get_ref(&Reference::Branch(branch.to_string()))
            .await?;

        match reference.object {
            Object::Commit { sha, .. } => {
                debug!(branch, %sha, "read branch");
                Ok(sha)
            }
            _ => Err(Error::GitHubApi(format!(
                "branch {branch} does not point at a commit"
            ))),
        }
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
        debug!(branch, sha, "creating branch");
        self.client
            .repos(&self.config.owner, &self.config.repo)
            .create_ref(&Reference::Branch(branch.to_string()), sha)
            .await?;
        Ok(())
    }

    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> Result<()> {
        debug!(branch, sha, force, "updating branch");
        let _: serde_json::Value = self
            .client
            .patch(
                format!("{}/git/refs/heads/{branch}", self.repo_route()),
                Some(&serde_json::json!({
                    "sha": sha,
                    "force": force,
                })),
            )
            .await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        debug!(branch, "deleting branch");
        self.client
            .repos(&self.config.owner, &self.config.repo)
            .delete_ref(&Reference::Branch(branch.to_string()))
            .await?;
        Ok(())
    }

    async fn get_commit(&self, sha: &str) -> Result<GitCommit> {
        let commit: RawGitCommit = self
            .client
            .get(
                format!("{}/git/commits/{sha}", self.repo_route()),
                None::<&()>,
            )
            .await?;
        Ok(commit.into())
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String> {
        let mut body = serde_json::json!({
            "message": commit.message,
            "tree": commit.tree_sha,
            "parents": commit.parents,
        });
        if let Some(ref author) = commit.author {
            body["author"] = serde_json::json!(author);
        }
        if let Some(ref committer) = commit.committer {
            body["committer"] = serde_json::json!(committer);
        }

        let created: ShaOnly = self
            .client
            .post(format!("{}/git/commits", self.repo_route()), Some(&body))
            .await?;

        debug!(sha = %created.sha, tree = %commit.tree_sha, "created commit");
        Ok(created.sha)
    }

    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<String>> {
        let comparison: RawComparison = self
            .client
            .get(
                format!("{}/compare/{base}...{head}", self.repo_route()),
                None::<&()>,
            )
            .await?;
        Ok(comparison.commits.into_iter().map(|c| c.sha).collect())
    }

    async fn required_status_checks(&self, branch: &str) -> Result<RequiredChecks> {
        #[derive(Deserialize)]
        struct StatusChecks {
            #[serde(default)]
            contexts: Vec<String>,
        }

        let url = format!(
            "{}/repos/{}/{}/branches/{}/protection/required_status_checks",
            self.api_base,
            self.config.owner,
            self.config.repo,
            urlencoding::encode(branch)
        );
        let response = self.raw_get(&url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            let body: ApiMessage = response
                .json()
                .await
                .unwrap_or(ApiMessage { message: String::new() });
            if body.message.contains(BRANCH_NOT_PROTECTED) {
                debug!(branch, "branch not protected, no checks required");
                return Ok(RequiredChecks::NotProtected);
            }
            return Err(Error::GitHubApi(format!(
                "Failed to fetch required status checks for {branch} ({status}): {}",
                body.message
            )));
        }

        if !status.is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to fetch required status checks for {branch}: {status}"
            )));
        }

        let checks: StatusChecks = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse status checks: {e}")))?;

        debug!(branch, count = checks.contexts.len(), "required status checks");
        Ok(RequiredChecks::Contexts(checks.contexts))
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            total_count: usize,
            check_runs: Vec<CheckRun>,
        }

        let mut all_runs = Vec::new();
        for page in 1.. {
            let url = format!(
                "{}/repos/{}/{}/commits/{sha}/check-runs?per_page={PAGE_SIZE}&page={page}",
                self.api_base, self.config.owner, self.config.repo
            );
            let response = self.raw_get(&url).await?;

            if !response.status().is_success() {
                return Err(Error::GitHubApi(format!(
                    "Failed to fetch check runs for {sha}: {}",
                    response.status()
                )));
            }

            let runs: CheckRunsResponse = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

            let fetched = runs.check_runs.len();
            all_runs.extend(runs.check_runs);
            if fetched < usize::from(PAGE_SIZE) || all_runs.len() >= runs.total_count {
                break;
            }
        }

        debug!(sha, count = all_runs.len(), "listed check runs");
        Ok(all_runs)
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        debug!(pr_number, "listing PR comments");
        let comments = self
            .client
            .issues(&self.config.owner, &self.config.repo)
            .list_comments(pr_number)
            .per_page(PAGE_SIZE)
            .send()
            .await?;
        let comments = self.client.all_pages(comments).await?;

        let result: Vec<PrComment> = comments
            .into_iter()
            .map(|c| PrComment {
                id: c.id.0,
                body: c.body.unwrap_or_default(),
                author: c.user.login,
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed PR comments");
        Ok(result)
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(pr_number, body)
            .await?;
        debug!(pr_number, "created PR comment");
        Ok(())
    }

    async fn update_pr_comment(&self, _pr_number: u64, comment_id: u64, body: &str) -> Result<()> {
        debug!(comment_id, "updating PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .update_comment(octocrab::models::CommentId(comment_id), body)
            .await?;
        debug!(comment_id, "updated PR comment");
        Ok(())
    }

    async fn add_comment_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()> {
        debug!(comment_id, %reaction, "reacting to comment");
        let _: serde_json::Value = self
            .client
            .post(
                format!("{}/issues/comments/{comment_id}/reactions", self.repo_route()),
                Some(&serde_json::json!({ "content": reaction.to_string() })),
            )
            .await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<String> {
        let user = self.client.current().user().await?;
        Ok(user.login)
    }
}
