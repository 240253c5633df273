//! Search tree vertex.
//!
//! A node owns its end state, the action that produced it (none for the
//! root), the actions not yet tried from it and the running visit/value
//! statistics. Parent and children are arena indices.

use std::collections::BTreeSet;

use crate::common::{ActionId, ActionSet, PlannerResult};

/// Index of a node inside a [`SearchTree`](crate::mcts::SearchTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Node<S, A> {
    parent: Option<NodeId>,
    state: S,
    action: Option<(ActionId, A)>,
    /// Reward collected on the edge from the parent
    reward: f64,
    potential_children: ActionSet<A>,
    children: Vec<NodeId>,
    visits: u32,
    value_sum: f64,
    depth: usize,
}

impl<S, A> Node<S, A> {
    pub fn new_root(state: S, potential_children: ActionSet<A>) -> Self {
        Self {
            parent: None,
            state,
            action: None,
            reward: 0.0,
            potential_children,
            children: Vec::new(),
            visits: 0,
            value_sum: 0.0,
            depth: 0,
        }
    }

    pub fn new_child(
        parent: NodeId,
        depth: usize,
        state: S,
        action_id: ActionId,
        action: A,
        reward: f64,
        potential_children: ActionSet<A>,
    ) -> Self {
        Self {
            parent: Some(parent),
            state,
            action: Some((action_id, action)),
            reward,
            potential_children,
            children: Vec::new(),
            visits: 0,
            value_sum: 0.0,
            depth,
        }
    }

    /// Record one backpropagation pass.
    pub fn add_visit(&mut self, value: f64) {
        self.visits += 1;
        self.value_sum += value;
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_expandable(&self) -> bool {
        !self.potential_children.is_empty()
    }

    /// Dead end: nothing left to try and nothing expanded.
    pub fn is_terminal(&self) -> bool {
        self.potential_children.is_empty() && self.children.is_empty()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn action(&self) -> Option<&A> {
        self.action.as_ref().map(|(_, a)| a)
    }

    pub fn action_id(&self) -> Option<ActionId> {
        self.action.as_ref().map(|(id, _)| *id)
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn potential_children(&self) -> &ActionSet<A> {
        &self.potential_children
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn value_sum(&self) -> f64 {
        self.value_sum
    }

    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Drop every untried action for which `feasible` no longer holds.
    /// Returns the number of actions removed.
    pub fn prune_infeasible<F>(&mut self, mut feasible: F) -> PlannerResult<usize>
    where
        F: FnMut(&S, &A) -> PlannerResult<bool>,
    {
        let mut keep = BTreeSet::new();
        for (id, action) in &self.potential_children {
            if feasible(&self.state, action)? {
                keep.insert(*id);
            }
        }

        let before = self.potential_children.len();
        self.potential_children = std::mem::take(&mut self.potential_children)
            .into_iter()
            .filter(|(id, _)| keep.contains(id))
            .collect();
        Ok(before - self.potential_children.len())
    }

    /// Remove the first untried action in generation order.
    pub(crate) fn take_untried(&mut self) -> Option<(ActionId, A)> {
        self.potential_children.pop_first()
    }

    pub(crate) fn attach_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Rewire structural links after the arena is compacted.
    pub(crate) fn relink(&mut self, parent: Option<NodeId>, children: Vec<NodeId>, depth: usize) {
        self.parent = parent;
        self.children = children;
        self.depth = depth;
    }

    /// Turn this node into a tree root: the incoming edge is forgotten.
    pub(crate) fn detach_edge(&mut self) {
        self.action = None;
        self.reward = 0.0;
    }
}
