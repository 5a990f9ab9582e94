//! Mock platform service for testing
//!
//! An in-memory repository: branches, commit objects, open PRs, checks and
//! comments. Commands run against it end to end and tests inspect the
//! resulting refs and recorded calls.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pr_stacker::error::{Error, Result};
use pr_stacker::platform::PlatformService;
use pr_stacker::types::{
    CheckRun, GitCommit, NewCommit, PlatformConfig, PrComment, PrCommit, PullRequest,
    PullRequestDetails, Reaction, RequiredChecks,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// Call record for `update_pr_base`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBaseCall {
    pub pr_number: u64,
    pub new_base: String,
}

/// Call record for `create_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `update_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCommentCall {
    pub pr_number: u64,
    pub comment_id: u64,
    pub body: String,
}

#[derive(Debug, Clone)]
struct MockPr {
    pr: PullRequest,
    author: String,
    mergeable_state: Option<String>,
}

/// Pending branch movement triggered by reads
#[derive(Debug, Clone)]
struct ReadTrigger {
    reads_left: usize,
    new_sha: String,
}

/// Stale reads served after an update
#[derive(Debug, Clone)]
struct StaleRead {
    old_sha: String,
    reads_left: usize,
}

#[derive(Debug, Default)]
struct RepoState {
    default_branch: String,
    files: HashMap<String, String>,
    branches: HashMap<String, String>,
    commits: HashMap<String, GitCommit>,
    next_sha: u64,
    prs: BTreeMap<u64, MockPr>,
    protection: HashMap<String, Vec<String>>,
    check_runs: HashMap<String, Vec<CheckRun>>,
    comments: BTreeMap<u64, Vec<PrComment>>,
    next_comment_id: u64,
    read_triggers: HashMap<String, ReadTrigger>,
    read_lag: HashMap<String, usize>,
    stale_reads: HashMap<String, StaleRead>,
}

/// In-memory repository implementing `PlatformService`
///
/// Features:
/// - Real ancestry: PR commit lists and comparisons walk parent links
/// - Call tracking for verification
/// - Error injection per method
/// - Race injection: move a branch after it has been read N times
/// - Read lag: serve stale SHAs for a few reads after an update
pub struct MockPlatformService {
    config: PlatformConfig,
    bot_login: String,
    state: Mutex<RepoState>,
    // Call tracking
    update_base_calls: Mutex<Vec<UpdateBaseCall>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    update_comment_calls: Mutex<Vec<UpdateCommentCall>>,
    reactions: Mutex<Vec<(u64, Reaction)>>,
    created_branches: Mutex<Vec<String>>,
    deleted_branches: Mutex<Vec<String>>,
    created_commits: Mutex<Vec<NewCommit>>,
    // Error injection
    failures: Mutex<HashMap<String, (usize, String)>>,
}

impl MockPlatformService {
    /// Repository `test/repo` whose trunk `main` holds one root commit
    pub fn new() -> Self {
        Self::with_config(github_config())
    }

    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        let mock = Self {
            config,
            bot_login: "stackbot[bot]".to_string(),
            state: Mutex::new(RepoState {
                default_branch: "main".to_string(),
                next_comment_id: 1000,
                ..RepoState::default()
            }),
            update_base_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            update_comment_calls: Mutex::new(Vec::new()),
            reactions: Mutex::new(Vec::new()),
            created_branches: Mutex::new(Vec::new()),
            deleted_branches: Mutex::new(Vec::new()),
            created_commits: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        };
        let root = mock.seed_commit(&[], "tree-root", "Initial commit");
        mock.set_branch("main", &root);
        mock
    }

    // === Repository setup ===

    /// Store a commit object directly, returning its SHA
    pub fn seed_commit(&self, parents: &[&str], tree: &str, message: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let sha = next_sha(&mut state);
        state.commits.insert(
            sha.clone(),
            GitCommit {
                sha: sha.clone(),
                tree_sha: tree.to_string(),
                message: message.to_string(),
                author: Some(signature("Alice", "alice@example.com")),
                committer: Some(signature("Alice", "alice@example.com")),
                parents: parents.iter().map(ToString::to_string).collect(),
            },
        );
        sha
    }

    /// Store a commit object with no author metadata
    pub fn seed_anonymous_commit(&self, parent: &str, tree: &str, message: &str) -> String {
        let sha = self.seed_commit(&[parent], tree, message);
        let mut state = self.state.lock().unwrap();
        if let Some(commit) = state.commits.get_mut(&sha) {
            commit.author = None;
        }
        sha
    }

    /// Point a branch at `sha`, creating it if needed
    pub fn set_branch(&self, branch: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(branch.to_string(), sha.to_string());
    }

    /// Add a commit on top of a branch and advance it
    pub fn push_commit(&self, branch: &str, tree: &str, message: &str) -> String {
        let tip = self.branch_sha(branch);
        let sha = self.seed_commit(&[&tip], tree, message);
        self.set_branch(branch, &sha);
        sha
    }

    /// Open a PR from a new `head` branch on top of `base`, with one commit
    /// per entry of `trees`
    pub fn add_pr(&self, number: u64, base: &str, head: &str, trees: &[&str]) -> PullRequest {
        let base_tip = self.branch_sha(base);
        self.set_branch(head, &base_tip);
        for (i, tree) in trees.iter().enumerate() {
            self.push_commit(head, tree, &format!("{head} commit {}", i + 1));
        }

        let pr = PullRequest {
            number,
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: format!("Add {head}"),
            body: Some(format!("Implements {head}.")),
        };
        self.state.lock().unwrap().prs.insert(
            number,
            MockPr {
                pr: pr.clone(),
                author: "alice".to_string(),
                mergeable_state: Some("clean".to_string()),
            },
        );
        pr
    }

    /// Linear stack on `main`: PR n+1 is based on PR n, two commits each
    pub fn add_linear_stack(&self, heads: &[&str]) -> Vec<PullRequest> {
        let mut base = "main".to_string();
        let mut prs = Vec::new();
        for (i, head) in heads.iter().enumerate() {
            let t1 = format!("tree-{head}-1");
            let t2 = format!("tree-{head}-2");
            prs.push(self.add_pr(i as u64 + 1, &base, head, &[&t1, &t2]));
            base = head.to_string();
        }
        prs
    }

    /// Set the PR's title and description
    pub fn set_pr_text(&self, pr_number: u64, title: &str, body: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        if let Some(pr) = state.prs.get_mut(&pr_number) {
            pr.pr.title = title.to_string();
            pr.pr.body = body.map(ToString::to_string);
        }
    }

    /// Set the PR author's login
    pub fn set_pr_author(&self, pr_number: u64, login: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(pr) = state.prs.get_mut(&pr_number) {
            pr.author = login.to_string();
        }
    }

    /// Set the host-computed mergeable state of a PR
    pub fn set_mergeable_state(&self, pr_number: u64, mergeable_state: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        if let Some(pr) = state.prs.get_mut(&pr_number) {
            pr.mergeable_state = mergeable_state.map(ToString::to_string);
        }
    }

    /// Require `contexts` to pass on PRs based on `branch`
    pub fn protect_branch(&self, branch: &str, contexts: &[&str]) {
        self.state.lock().unwrap().protection.insert(
            branch.to_string(),
            contexts.iter().map(ToString::to_string).collect(),
        );
    }

    /// Set check runs reported for a commit
    pub fn set_check_runs(&self, sha: &str, runs: Vec<CheckRun>) {
        self.state
            .lock()
            .unwrap()
            .check_runs
            .insert(sha.to_string(), runs);
    }

    /// Add a file to the default branch
    pub fn set_file(&self, path: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), content.to_string());
    }

    /// Add a comment to a PR, returning its ID
    pub fn add_comment(&self, pr_number: u64, author: &str, body: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_comment_id;
        state.next_comment_id += 1;
        state.comments.entry(pr_number).or_default().push(PrComment {
            id,
            body: body.to_string(),
            author: author.to_string(),
        });
        id
    }

    // === Race and lag injection ===

    /// After `branch` has been read `reads` more times, point it at a new
    /// commit on top of its tip; returns that commit's SHA
    pub fn advance_branch_after_reads(&self, branch: &str, reads: usize, tree: &str) -> String {
        let tip = self.branch_sha(branch);
        let sha = self.seed_commit(&[&tip], tree, "Concurrent change");
        self.state.lock().unwrap().read_triggers.insert(
            branch.to_string(),
            ReadTrigger {
                reads_left: reads,
                new_sha: sha.clone(),
            },
        );
        sha
    }

    /// After each update of `branch`, serve the old SHA for `reads` reads
    pub fn lag_branch_reads(&self, branch: &str, reads: usize) {
        self.state
            .lock()
            .unwrap()
            .read_lag
            .insert(branch.to_string(), reads);
    }

    // === Error injection methods ===

    /// Make `method` return an error
    pub fn fail_on(&self, method: &str, msg: &str) {
        self.fail_on_after(method, 0, msg);
    }

    /// Let `method` succeed `successes` times, then return an error
    pub fn fail_on_after(&self, method: &str, successes: usize, msg: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method.to_string(), (successes, msg.to_string()));
    }

    fn check_failure(&self, method: &str) -> Result<()> {
        match self.failures.lock().unwrap().get_mut(method) {
            Some((0, msg)) => Err(Error::Platform(msg.clone())),
            Some((remaining, _)) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    // === Inspection ===

    /// Current SHA of a branch, bypassing lag and triggers
    pub fn branch_sha(&self, branch: &str) -> String {
        self.state
            .lock()
            .unwrap()
            .branches
            .get(branch)
            .cloned()
            .unwrap_or_else(|| panic!("no branch {branch}"))
    }

    /// Whether a branch exists
    pub fn has_branch(&self, branch: &str) -> bool {
        self.state.lock().unwrap().branches.contains_key(branch)
    }

    /// Stored commit object
    pub fn commit(&self, sha: &str) -> GitCommit {
        self.state
            .lock()
            .unwrap()
            .commits
            .get(sha)
            .cloned()
            .unwrap_or_else(|| panic!("no commit {sha}"))
    }

    /// First-parent history of a branch, tip first
    pub fn first_parent_log(&self, branch: &str) -> Vec<GitCommit> {
        let state = self.state.lock().unwrap();
        let mut log = Vec::new();
        let mut next = state.branches.get(branch).cloned();
        while let Some(sha) = next {
            let Some(commit) = state.commits.get(&sha) else {
                break;
            };
            next = commit.parents.first().cloned();
            log.push(commit.clone());
        }
        log
    }

    /// Current base branch of a PR
    pub fn pr_base(&self, pr_number: u64) -> String {
        self.state.lock().unwrap().prs[&pr_number].pr.base_ref.clone()
    }

    /// Comments currently on a PR
    pub fn comments(&self, pr_number: u64) -> Vec<PrComment> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&pr_number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_update_base_calls(&self) -> Vec<UpdateBaseCall> {
        self.update_base_calls.lock().unwrap().clone()
    }

    pub fn get_create_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    pub fn get_update_comment_calls(&self) -> Vec<UpdateCommentCall> {
        self.update_comment_calls.lock().unwrap().clone()
    }

    pub fn get_reactions(&self) -> Vec<(u64, Reaction)> {
        self.reactions.lock().unwrap().clone()
    }

    pub fn get_created_branches(&self) -> Vec<String> {
        self.created_branches.lock().unwrap().clone()
    }

    pub fn get_deleted_branches(&self) -> Vec<String> {
        self.deleted_branches.lock().unwrap().clone()
    }

    pub fn get_created_commits(&self) -> Vec<NewCommit> {
        self.created_commits.lock().unwrap().clone()
    }

    /// Login the mock posts comments as
    pub fn bot_login(&self) -> &str {
        &self.bot_login
    }
}

impl Default for MockPlatformService {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard GitHub config for tests
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "test".to_string(),
        repo: "repo".to_string(),
        host: None,
    }
}

fn signature(name: &str, email: &str) -> pr_stacker::types::Signature {
    pr_stacker::types::Signature {
        name: name.to_string(),
        email: email.to_string(),
        date: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    }
}

fn next_sha(state: &mut RepoState) -> String {
    state.next_sha += 1;
    format!("{:040x}", state.next_sha)
}

fn ancestors(state: &RepoState, sha: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut pending = vec![sha.to_string()];
    while let Some(sha) = pending.pop() {
        if !seen.insert(sha.clone()) {
            continue;
        }
        if let Some(commit) = state.commits.get(&sha) {
            pending.extend(commit.parents.iter().cloned());
        }
    }
    seen
}

/// Commits on `head`'s first-parent line not reachable from `base`, oldest
/// first
fn range(state: &RepoState, base: &str, head: &str) -> Vec<String> {
    let excluded = ancestors(state, base);
    let mut commits = Vec::new();
    let mut next = Some(head.to_string());
    while let Some(sha) = next {
        if excluded.contains(&sha) {
            break;
        }
        next = state
            .commits
            .get(&sha)
            .and_then(|c| c.parents.first().cloned());
        commits.push(sha);
    }
    commits.reverse();
    commits
}

fn missing_branch(branch: &str) -> Error {
    Error::GitHubApi(format!("Reference does not exist: refs/heads/{branch}"))
}

#[async_trait]
impl PlatformService for MockPlatformService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn default_branch(&self) -> Result<String> {
        self.check_failure("default_branch")?;
        Ok(self.state.lock().unwrap().default_branch.clone())
    }

    async fn get_file_content(&self, path: &str) -> Result<Option<String>> {
        self.check_failure("get_file_content")?;
        Ok(self.state.lock().unwrap().files.get(path).cloned())
    }

    async fn list_open_prs(&self) -> Result<Vec<PullRequest>> {
        self.check_failure("list_open_prs")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .prs
            .values()
            .map(|p| p.pr.clone())
            .collect())
    }

    async fn get_pr_details(&self, pr_number: u64) -> Result<PullRequestDetails> {
        self.check_failure("get_pr_details")?;
        let state = self.state.lock().unwrap();
        let mock = state
            .prs
            .get(&pr_number)
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))?;
        let head_sha = state
            .branches
            .get(&mock.pr.head_ref)
            .cloned()
            .ok_or_else(|| missing_branch(&mock.pr.head_ref))?;
        let base_sha = state
            .branches
            .get(&mock.pr.base_ref)
            .cloned()
            .ok_or_else(|| missing_branch(&mock.pr.base_ref))?;
        let commit_count = range(&state, &base_sha, &head_sha).len() as u64;

        Ok(PullRequestDetails {
            number: pr_number,
            title: mock.pr.title.clone(),
            body: mock.pr.body.clone(),
            base_ref: mock.pr.base_ref.clone(),
            head_ref: mock.pr.head_ref.clone(),
            head_sha,
            commit_count,
            mergeable_state: mock.mergeable_state.clone(),
            author_login: mock.author.clone(),
        })
    }

    async fn list_pr_commits(&self, pr_number: u64) -> Result<Vec<PrCommit>> {
        self.check_failure("list_pr_commits")?;
        let state = self.state.lock().unwrap();
        let mock = state
            .prs
            .get(&pr_number)
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))?;
        let head = &state.branches[&mock.pr.head_ref];
        let base = &state.branches[&mock.pr.base_ref];
        Ok(range(&state, base, head)
            .into_iter()
            .map(|sha| PrCommit {
                author: state.commits.get(&sha).and_then(|c| c.author.clone()),
                sha,
            })
            .collect())
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<PullRequest> {
        self.update_base_calls.lock().unwrap().push(UpdateBaseCall {
            pr_number,
            new_base: new_base.to_string(),
        });
        self.check_failure("update_pr_base")?;

        let mut state = self.state.lock().unwrap();
        if !state.branches.contains_key(new_base) {
            return Err(missing_branch(new_base));
        }
        let mock = state
            .prs
            .get_mut(&pr_number)
            .ok_or_else(|| Error::Platform(format!("PR #{pr_number} not found")))?;
        mock.pr.base_ref = new_base.to_string();
        Ok(mock.pr.clone())
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<String> {
        self.check_failure("get_branch_sha")?;
        let mut state = self.state.lock().unwrap();

        if let Some(stale) = state.stale_reads.get_mut(branch) {
            if stale.reads_left > 0 {
                stale.reads_left -= 1;
                return Ok(stale.old_sha.clone());
            }
        }

        let sha = state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| missing_branch(branch))?;

        let fire = match state.read_triggers.get_mut(branch) {
            Some(trigger) if trigger.reads_left <= 1 => Some(trigger.new_sha.clone()),
            Some(trigger) => {
                trigger.reads_left -= 1;
                None
            }
            None => None,
        };
        if let Some(new_sha) = fire {
            state.read_triggers.remove(branch);
            state.branches.insert(branch.to_string(), new_sha);
        }

        Ok(sha)
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
        self.created_branches.lock().unwrap().push(branch.to_string());
        self.check_failure("create_branch")?;
        let mut state = self.state.lock().unwrap();
        if state.branches.contains_key(branch) {
            return Err(Error::GitHubApi("Reference already exists".to_string()));
        }
        state.branches.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> Result<()> {
        self.check_failure("update_branch")?;
        let mut state = self.state.lock().unwrap();
        let old = state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| missing_branch(branch))?;
        if !force && !ancestors(&state, sha).contains(&old) {
            return Err(Error::GitHubApi("Update is not a fast forward".to_string()));
        }

        let lag = state.read_lag.get(branch).copied();
        if let Some(reads_left) = lag {
            state.stale_reads.insert(
                branch.to_string(),
                StaleRead {
                    old_sha: old,
                    reads_left,
                },
            );
        }
        state.branches.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.deleted_branches.lock().unwrap().push(branch.to_string());
        self.check_failure("delete_branch")?;
        self.state
            .lock()
            .unwrap()
            .branches
            .remove(branch)
            .map(|_| ())
            .ok_or_else(|| missing_branch(branch))
    }

    async fn get_commit(&self, sha: &str) -> Result<GitCommit> {
        self.check_failure("get_commit")?;
        self.state
            .lock()
            .unwrap()
            .commits
            .get(sha)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("No commit found for SHA: {sha}")))
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String> {
        self.created_commits.lock().unwrap().push(commit.clone());
        self.check_failure("create_commit")?;
        let mut state = self.state.lock().unwrap();
        let sha = next_sha(&mut state);
        state.commits.insert(
            sha.clone(),
            GitCommit {
                sha: sha.clone(),
                tree_sha: commit.tree_sha.clone(),
                message: commit.message.clone(),
                author: commit.author.clone(),
                committer: commit.committer.clone(),
                parents: commit.parents.clone(),
            },
        );
        Ok(sha)
    }

    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<String>> {
        self.check_failure("compare_commits")?;
        Ok(range(&self.state.lock().unwrap(), base, head))
    }

    async fn required_status_checks(&self, branch: &str) -> Result<RequiredChecks> {
        self.check_failure("required_status_checks")?;
        Ok(match self.state.lock().unwrap().protection.get(branch) {
            Some(contexts) => RequiredChecks::Contexts(contexts.clone()),
            None => RequiredChecks::NotProtected,
        })
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        self.check_failure("list_check_runs")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .check_runs
            .get(sha)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        self.check_failure("list_pr_comments")?;
        Ok(self.comments(pr_number))
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.create_comment_calls
            .lock()
            .unwrap()
            .push(CreateCommentCall {
                pr_number,
                body: body.to_string(),
            });
        self.check_failure("create_pr_comment")?;
        self.add_comment(pr_number, &self.bot_login, body);
        Ok(())
    }

    async fn update_pr_comment(&self, pr_number: u64, comment_id: u64, body: &str) -> Result<()> {
        self.update_comment_calls
            .lock()
            .unwrap()
            .push(UpdateCommentCall {
                pr_number,
                comment_id,
                body: body.to_string(),
            });
        self.check_failure("update_pr_comment")?;
        let mut state = self.state.lock().unwrap();
        let comment = state
            .comments
            .get_mut(&pr_number)
            .and_then(|comments| comments.iter_mut().find(|c| c.id == comment_id))
            .ok_or_else(|| Error::GitHubApi(format!("comment {comment_id} not found")))?;
        comment.body = body.to_string();
        Ok(())
    }

    async fn add_comment_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()> {
        self.check_failure("add_comment_reaction")?;
        self.reactions.lock().unwrap().push((comment_id, reaction));
        Ok(())
    }

    async fn current_user(&self) -> Result<String> {
        self.check_failure("current_user")?;
        Ok(self.bot_login.clone())
    }
}
