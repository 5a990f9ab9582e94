//! Stack graph resolution
//!
//! Nodes live in an arena keyed by a stable string identifier: the branch
//! name for trunk, the PR number for pull requests. An edge A -> B means
//! B is based on A's head branch (or on trunk).

use crate::error::{Error, Result};
use crate::types::PullRequest;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A node of the stack graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackNode {
    /// The trunk branch
    Perennial {
        /// Branch name
        name: String,
    },
    /// An open pull request
    PullRequest(PullRequest),
}

impl StackNode {
    /// Arena key for this node
    pub fn key(&self) -> String {
        match self {
            Self::Perennial { name } => name.clone(),
            Self::PullRequest(pr) => pr.number.to_string(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Perennial { name } => format!("`{name}`"),
            Self::PullRequest(pr) => format!("#{}", pr.number),
        }
    }
}

/// Directed graph over trunk and the open PRs
#[derive(Debug, Clone)]
pub struct StackGraph {
    nodes: Vec<StackNode>,
    index: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    trunk: usize,
}

impl StackGraph {
    /// Build the graph from trunk and the repository's open PRs
    ///
    /// Node and edge order follows `open_prs`, so traversal is
    /// deterministic for a given listing.
    pub fn build(trunk: &str, open_prs: &[PullRequest]) -> Self {
        let mut nodes = vec![StackNode::Perennial {
            name: trunk.to_string(),
        }];
        nodes.extend(open_prs.iter().cloned().map(StackNode::PullRequest));

        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.key(), i))
            .collect();

        let mut graph = Self {
            outgoing: vec![Vec::new(); nodes.len()],
            incoming: vec![Vec::new(); nodes.len()],
            nodes,
            index,
            trunk: 0,
        };

        for (i, pr) in open_prs.iter().enumerate() {
            let node = i + 1;
            if pr.base_ref == trunk {
                graph.add_edge(graph.trunk, node);
                continue;
            }
            for (j, base_pr) in open_prs.iter().enumerate() {
                if j != i && base_pr.head_ref == pr.base_ref {
                    graph.add_edge(j + 1, node);
                }
            }
        }

        graph
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        self.outgoing[from].push(to);
        self.incoming[to].push(from);
    }

    /// Look up a node by key
    pub fn node(&self, key: &str) -> Option<&StackNode> {
        self.index.get(key).map(|&i| &self.nodes[i])
    }

    /// Nodes directly based on the given node
    pub fn children(&self, key: &str) -> Vec<&StackNode> {
        self.index.get(key).map_or_else(Vec::new, |&i| {
            self.outgoing[i].iter().map(|&c| &self.nodes[c]).collect()
        })
    }

    /// Nodes the given node is based on
    pub fn parents(&self, key: &str) -> Vec<&StackNode> {
        self.index.get(key).map_or_else(Vec::new, |&i| {
            self.incoming[i].iter().map(|&p| &self.nodes[p]).collect()
        })
    }

    /// Ordered chain containing `pr_number`, root first, trunk excluded
    ///
    /// Fails with [`Error::UnsupportedTopology`] when the chain forks or
    /// loops, since only linear stacks can be rewritten.
    pub fn stack_for(&self, pr_number: u64) -> Result<Vec<PullRequest>> {
        let start = *self
            .index
            .get(&pr_number.to_string())
            .filter(|&&i| i != self.trunk)
            .ok_or(Error::PrNotFound(pr_number))?;

        // Walk down to the root
        let mut seen = HashSet::from([start]);
        let mut root = start;
        loop {
            let parents = &self.incoming[root];
            if parents.len() > 1 {
                return Err(self.fork_error(root, parents, "is based on"));
            }
            match parents.first() {
                None => break,
                Some(&parent) if parent == self.trunk => break,
                Some(&parent) => {
                    if !seen.insert(parent) {
                        return Err(self.cycle_error(parent));
                    }
                    root = parent;
                }
            }
        }

        // Walk up to the tip
        let mut chain = vec![root];
        let mut seen = HashSet::from([root]);
        let mut current = root;
        loop {
            let children = &self.outgoing[current];
            if children.len() > 1 {
                return Err(self.fork_error(current, children, "has several PRs based on it:"));
            }
            let Some(&child) = children.first() else {
                break;
            };
            if !seen.insert(child) {
                return Err(self.cycle_error(child));
            }
            chain.push(child);
            current = child;
        }

        let stack: Vec<PullRequest> = chain
            .into_iter()
            .filter_map(|i| match &self.nodes[i] {
                StackNode::PullRequest(pr) => Some(pr.clone()),
                StackNode::Perennial { .. } => None,
            })
            .collect();

        debug!(
            pr_number,
            stack = ?stack.iter().map(|pr| pr.number).collect::<Vec<_>>(),
            "resolved stack"
        );
        Ok(stack)
    }

    fn fork_error(&self, node: usize, neighbours: &[usize], relation: &str) -> Error {
        let names: Vec<String> = neighbours
            .iter()
            .map(|&n| self.nodes[n].describe())
            .collect();
        Error::UnsupportedTopology(format!(
            "{} {relation} {}; only linear stacks are supported",
            self.nodes[node].describe(),
            names.join(", ")
        ))
    }

    fn cycle_error(&self, node: usize) -> Error {
        Error::UnsupportedTopology(format!(
            "{} is part of a cycle of PR bases",
            self.nodes[node].describe()
        ))
    }
}

/// Resolve the stack containing `pr_number` from the open PR listing
pub fn resolve_stack(
    pr_number: u64,
    trunk: &str,
    open_prs: &[PullRequest],
) -> Result<Vec<PullRequest>> {
    StackGraph::build(trunk, open_prs).stack_for(pr_number)
}
