//! Arena-allocated search tree.
//!
//! Nodes live in one `Vec` and refer to each other through [`NodeId`]
//! indices, so there are no owning back-references and discarding a
//! subtree is a single compaction pass.

use std::cmp::Reverse;
use std::collections::VecDeque;

use ordered_float::OrderedFloat;

use crate::common::{ActionId, ActionSet, PlannerError, PlannerResult};
use crate::config::FinalSelection;
use crate::mcts::node::{Node, NodeId};
use crate::mcts::value::ValueFunction;

/// Statistics of one expanded child, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildStats {
    pub action_id: ActionId,
    pub visits: u32,
    pub mean_value: f64,
}

#[derive(Debug, Clone)]
pub struct SearchTree<S, A> {
    nodes: Vec<Node<S, A>>,
    root: NodeId,
}

impl<S, A> SearchTree<S, A> {
    pub fn new(root_state: S, root_actions: ActionSet<A>) -> Self {
        Self {
            nodes: vec![Node::new_root(root_state, root_actions)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// # Panics
    /// Panics if the NodeId does not belong to this tree.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<S, A> {
        &self.nodes[id.0]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<S, A> {
        &mut self.nodes[id.0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node<S, A>] {
        &self.nodes
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth()).max().unwrap_or(0)
    }

    /// Attach a freshly simulated child. The action must already have been
    /// removed from the parent's untried set.
    pub(crate) fn add_child(
        &mut self,
        parent: NodeId,
        action_id: ActionId,
        action: A,
        state: S,
        reward: f64,
        potential_children: ActionSet<A>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.get(parent).depth() + 1;
        self.nodes.push(Node::new_child(
            parent,
            depth,
            state,
            action_id,
            action,
            reward,
            potential_children,
        ));
        self.get_mut(parent).attach_child(id);
        id
    }

    /// Value of `id` under `value_fn`, using the parent's visits when there is one.
    pub fn value<V: ValueFunction + ?Sized>(&self, id: NodeId, value_fn: &V) -> f64 {
        let node = self.get(id);
        let parent_visits = node.parent().map(|p| self.get(p).visits());
        value_fn.value(node.visits(), node.value_sum(), parent_visits)
    }

    /// Highest-valued expanded child; the earliest expanded child wins ties.
    pub fn select_child<V: ValueFunction + ?Sized>(&self, id: NodeId, value_fn: &V) -> Option<NodeId> {
        self.get(id)
            .children()
            .iter()
            .copied()
            .min_by_key(|&child| Reverse(OrderedFloat(self.value(child, value_fn))))
    }

    /// Add `value` to `leaf` and every ancestor up to the root.
    pub fn backpropagate(&mut self, leaf: NodeId, value: f64) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.add_visit(value);
            current = node.parent();
        }
    }

    /// Node ids from `id` up to and including the root.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.get(id).parent();
        while let Some(parent) = current {
            path.push(parent);
            current = self.get(parent).parent();
        }
        path
    }

    pub fn child_for_action(&self, parent: NodeId, action_id: ActionId) -> Option<NodeId> {
        self.get(parent)
            .children()
            .iter()
            .copied()
            .find(|&c| self.get(c).action_id() == Some(action_id))
    }

    /// Action ids already materialised as children of `parent`.
    pub fn child_action_ids(&self, parent: NodeId) -> Vec<ActionId> {
        self.get(parent)
            .children()
            .iter()
            .filter_map(|&c| self.get(c).action_id())
            .collect()
    }

    pub fn child_stats(&self, parent: NodeId) -> Vec<ChildStats> {
        self.get(parent)
            .children()
            .iter()
            .filter_map(|&c| {
                let node = self.get(c);
                node.action_id().map(|action_id| ChildStats {
                    action_id,
                    visits: node.visits(),
                    mean_value: node.mean_value(),
                })
            })
            .collect()
    }

    /// Child to recommend after search; the earliest expanded child wins ties.
    pub fn best_child(&self, parent: NodeId, selection: FinalSelection) -> Option<NodeId> {
        let children = self.get(parent).children().iter().copied();
        match selection {
            FinalSelection::RobustChild => children.min_by_key(|&c| {
                let node = self.get(c);
                Reverse((node.visits(), OrderedFloat(node.mean_value())))
            }),
            FinalSelection::MaxMean => children.min_by_key(|&c| {
                let node = self.get(c);
                Reverse((OrderedFloat(node.mean_value()), node.visits()))
            }),
        }
    }

    /// Keep only the subtree rooted at `new_root` and make it the root.
    ///
    /// Statistics and untried actions of the kept nodes are preserved; the
    /// new root forgets the edge that led to it.
    pub fn reroot(&mut self, new_root: NodeId) -> PlannerResult<()> {
        if new_root.0 >= self.nodes.len() {
            return Err(PlannerError::StateError(format!(
                "node {} is not part of the tree",
                new_root.0
            )));
        }

        // Breadth-first order of the kept subtree
        let mut order = Vec::new();
        let mut queue = VecDeque::from(vec![new_root]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.get(id).children().iter().copied());
        }

        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (new_index, old) in order.iter().enumerate() {
            remap[old.0] = Some(NodeId(new_index));
        }

        let base_depth = self.get(new_root).depth();
        let mut slots: Vec<Option<Node<S, A>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();

        let mut kept = Vec::with_capacity(order.len());
        for old in order {
            let Some(mut node) = slots[old.0].take() else {
                continue;
            };
            let parent = if old == new_root {
                None
            } else {
                node.parent().and_then(|p| remap[p.0])
            };
            let children = node.children().iter().filter_map(|c| remap[c.0]).collect();
            let depth = node.depth() - base_depth;
            node.relink(parent, children, depth);
            if old == new_root {
                node.detach_edge();
            }
            kept.push(node);
        }

        self.nodes = kept;
        self.root = NodeId(0);
        Ok(())
    }
}
