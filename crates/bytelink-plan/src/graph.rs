//! Step dependency graph
//!
//! Nodes are step indices in declaration order; an edge `a -> b` means `b`
//! consumes something `a` produces. Ordering uses Kahn's algorithm and
//! always picks the earliest-declared ready step, so the same plan yields
//! the same order on every run.

use crate::error::PlanError;
use petgraph::algo::kosaraju_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    inner: DiGraphMap<usize, ()>,
}

impl DependencyGraph {
    /// Graph with `count` unconnected steps
    #[must_use]
    pub fn with_steps(count: usize) -> Self {
        let mut inner = DiGraphMap::with_capacity(count, 0);
        for index in 0..count {
            inner.add_node(index);
        }
        Self { inner }
    }

    /// Record that `to` depends on `from`
    pub fn add_dependency(&mut self, from: usize, to: usize) {
        self.inner.add_edge(from, to, ());
    }

    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.inner.node_count()
    }

    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Direct dependencies of `index`, ascending
    #[must_use]
    pub fn dependencies(&self, index: usize) -> Vec<usize> {
        let mut deps: Vec<usize> = self
            .inner
            .neighbors_directed(index, Direction::Incoming)
            .collect();
        deps.sort_unstable();
        deps
    }

    /// Topological order with declaration-order tie-break
    ///
    /// # Errors
    /// Returns the indices of one cycle's members if the graph is cyclic.
    pub fn order(&self) -> Result<Vec<usize>, Vec<usize>> {
        let count = self.inner.node_count();
        let mut indegree: Vec<usize> = (0..count)
            .map(|n| self.inner.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeSet<usize> = (0..count).filter(|&n| indegree[n] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for succ in self.inner.neighbors_directed(next, Direction::Outgoing) {
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    ready.insert(succ);
                }
            }
        }

        if order.len() == count {
            Ok(order)
        } else {
            Err(self.first_cycle())
        }
    }

    /// Steps grouped by depth: every step in a level depends only on
    /// earlier levels, so steps within one level are independent
    ///
    /// # Errors
    /// Same as [`DependencyGraph::order`]
    pub fn levels(&self) -> Result<Vec<Vec<usize>>, Vec<usize>> {
        let order = self.order()?;
        let mut depth = vec![0usize; self.step_count()];
        for &n in &order {
            let d = self
                .inner
                .neighbors_directed(n, Direction::Incoming)
                .map(|dep| depth[dep] + 1)
                .max()
                .unwrap_or(0);
            depth[n] = d;
        }

        let mut levels: Vec<Vec<usize>> = Vec::new();
        for n in 0..self.step_count() {
            let d = depth[n];
            if levels.len() <= d {
                levels.resize_with(d + 1, Vec::new);
            }
            levels[d].push(n);
        }
        Ok(levels)
    }

    fn first_cycle(&self) -> Vec<usize> {
        let mut cycles: Vec<Vec<usize>> = kosaraju_scc(&self.inner)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.inner.contains_edge(scc[0], scc[0]))
            .map(|mut scc| {
                scc.sort_unstable();
                scc
            })
            .collect();
        cycles.sort();
        cycles.into_iter().next().unwrap_or_default()
    }
}

/// Map a cycle of indices to step names
pub(crate) fn cycle_error(names: &[&str], cycle: &[usize]) -> PlanError {
    PlanError::CycleDetected {
        steps: cycle.iter().map(|&i| names[i].to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn independent_steps_keep_declaration_order() {
        let graph = DependencyGraph::with_steps(4);
        assert_eq!(graph.order().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn dependency_moves_step_later() {
        let mut graph = DependencyGraph::with_steps(3);
        graph.add_dependency(2, 0);
        assert_eq!(graph.order().unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn tie_break_prefers_earliest_declared() {
        // 0 -> 3, 1 and 2 free: 1 and 2 must not jump ahead of 0.
        let mut graph = DependencyGraph::with_steps(4);
        graph.add_dependency(0, 3);
        assert_eq!(graph.order().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn cycle_is_reported() {
        let mut graph = DependencyGraph::with_steps(4);
        graph.add_dependency(0, 1);
        graph.add_dependency(1, 2);
        graph.add_dependency(2, 1);
        assert_eq!(graph.order(), Err(vec![1, 2]));
    }

    #[test]
    fn levels_group_independent_steps() {
        // weth9(0), factory(1), router(2) <- 0,1
        let mut graph = DependencyGraph::with_steps(3);
        graph.add_dependency(0, 2);
        graph.add_dependency(1, 2);
        assert_eq!(graph.levels().unwrap(), vec![vec![0, 1], vec![2]]);
        assert_eq!(graph.dependencies(2), vec![0, 1]);
    }

    proptest! {
        #[test]
        fn prop_order_respects_edges(
            count in 1..20usize,
            edges in proptest::collection::vec((0..20usize, 0..20usize), 0..50)
        ) {
            // Only forward edges, so the graph is acyclic by construction.
            let mut graph = DependencyGraph::with_steps(count);
            let mut kept = Vec::new();
            for (a, b) in edges {
                if a < b && b < count {
                    graph.add_dependency(a, b);
                    kept.push((a, b));
                }
            }

            let order = graph.order().unwrap();
            prop_assert_eq!(order.len(), count);
            let position = |n: usize| order.iter().position(|&x| x == n).unwrap();
            for (a, b) in kept {
                prop_assert!(position(a) < position(b));
            }
            prop_assert_eq!(graph.order().unwrap(), order);
        }
    }
}
