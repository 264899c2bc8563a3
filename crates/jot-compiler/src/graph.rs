//! Dependency graph and topological scheduler.
//!
//! Discovery walks breadth-first from the entry points with an explicit
//! work queue, recording edges `A -> B` ("A depends on B; B must be
//! initialized before A"). Sorting returns the reachable subgraph of one
//! entry in reverse-topological order: leaves first, entry last.
//!
//! Cycles confined to one package are tolerated — the strongly-connected
//! component is emitted as a unit with members ordered by ID. Cycles
//! crossing package boundaries are errors.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use jot_common::{CycleError, UnresolvedError};
use jot_ir::{Def, DefId, Index};

#[derive(Debug)]
pub struct DepGraph {
    /// Dependency edges, keyed by the dependent definition.
    edges: FxHashMap<DefId, Vec<DefId>>,
}

impl DepGraph {
    /// BFS from `mains()`, recording every edge of the reachable closure.
    /// Each dependency is marked visited when first enqueued, so nothing is
    /// processed twice; entries are marked before processing, so duplicate
    /// seeds cannot re-enqueue them.
    pub fn discover(index: &Index<'_>) -> Result<Self, UnresolvedError> {
        let mut edges: FxHashMap<DefId, Vec<DefId>> = FxHashMap::default();
        let mut visited: FxHashSet<DefId> = FxHashSet::default();
        let mut queue: VecDeque<&Def> = VecDeque::new();

        for main in index.mains() {
            if visited.insert(main.id().clone()) {
                queue.push_back(main);
            }
        }

        while let Some(def) = queue.pop_front() {
            let entry = edges.entry(def.id().clone()).or_default();
            for dep in def.deps() {
                if !entry.contains(dep) {
                    entry.push(dep.clone());
                }
            }

            for dep in def.deps() {
                let target = index.lookup(dep).ok_or_else(|| UnresolvedError {
                    from: def.id().to_string(),
                    missing: dep.to_string(),
                })?;
                if visited.insert(dep.clone()) {
                    queue.push_back(target);
                }
            }
        }

        Ok(Self { edges })
    }

    fn deps_of(&self, id: &DefId) -> &[DefId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The reachable subgraph of `entry` in reverse-topological order:
    /// every dependency precedes its dependents, ties broken by ID.
    pub fn sort<'a>(
        &self,
        index: &Index<'a>,
        entry: &'a Def,
    ) -> Result<Vec<&'a Def>, CycleError> {
        // Reachable set for this entry.
        let mut reachable: FxHashSet<DefId> = FxHashSet::default();
        let mut queue: VecDeque<DefId> = VecDeque::new();
        reachable.insert(entry.id().clone());
        queue.push_back(entry.id().clone());
        while let Some(id) = queue.pop_front() {
            for dep in self.deps_of(&id) {
                if reachable.insert(dep.clone()) {
                    queue.push_back(dep.clone());
                }
            }
        }

        // Emission-order edges: the recorded dependencies, plus an edge
        // from each reachable method to its receiver type when the
        // receiver is itself reachable. That pins methods after their
        // type without making receivers reachable through methods (which
        // would defeat pruning).
        let mut nodes: Vec<DefId> = reachable.iter().cloned().collect();
        nodes.sort();
        let node_pos: FxHashMap<&DefId, usize> =
            nodes.iter().enumerate().map(|(i, id)| (id, i)).collect();

        let mut succ: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, id) in nodes.iter().enumerate() {
            for dep in self.deps_of(id) {
                if let Some(&j) = node_pos.get(dep) {
                    if !succ[i].contains(&j) {
                        succ[i].push(j);
                    }
                }
            }
            if let Some(def) = index.lookup(id) {
                if let Some(recv) = def.recv() {
                    if let Some(&j) = node_pos.get(recv) {
                        if !succ[i].contains(&j) {
                            succ[i].push(j);
                        }
                    }
                }
            }
        }

        let components = tarjan_scc(&succ);

        // Cross-package cycle check: every non-trivial component must be
        // confined to one package path.
        for component in &components {
            if component.len() < 2 {
                continue;
            }
            let mut paths: Vec<&str> = component
                .iter()
                .filter_map(|&i| index.lookup(&nodes[i]).map(Def::path))
                .collect();
            paths.sort_unstable();
            paths.dedup();
            if paths.len() > 1 {
                let mut ids: Vec<String> =
                    component.iter().map(|&i| nodes[i].to_string()).collect();
                ids.sort();
                return Err(CycleError { ids });
            }
        }

        // Condense and order the component DAG with Kahn's algorithm.
        // A component is ready once every component it depends on has been
        // emitted; ties are broken by the smallest member ID so output is
        // reproducible byte for byte.
        let mut comp_of: Vec<usize> = vec![0; nodes.len()];
        for (c, component) in components.iter().enumerate() {
            for &i in component {
                comp_of[i] = c;
            }
        }

        let mut pending: Vec<usize> = vec![0; components.len()];
        let mut rdeps: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
        for (i, succs) in succ.iter().enumerate() {
            for &j in succs {
                let (ci, cj) = (comp_of[i], comp_of[j]);
                if ci != cj && !rdeps[cj].contains(&ci) {
                    rdeps[cj].push(ci);
                    pending[ci] += 1;
                }
            }
        }

        let mut heap: BinaryHeap<Reverse<(DefId, usize)>> = BinaryHeap::new();
        for (c, component) in components.iter().enumerate() {
            if pending[c] == 0 {
                heap.push(Reverse((component_key(component, &nodes), c)));
            }
        }

        let mut order: Vec<&Def> = Vec::with_capacity(nodes.len());
        while let Some(Reverse((_, c))) = heap.pop() {
            let mut members: Vec<&DefId> = components[c].iter().map(|&i| &nodes[i]).collect();
            members.sort();
            for id in members {
                if let Some(def) = index.lookup(id) {
                    order.push(def);
                }
            }
            for &dependent in &rdeps[c] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    heap.push(Reverse((
                        component_key(&components[dependent], &nodes),
                        dependent,
                    )));
                }
            }
        }

        Ok(order)
    }
}

fn component_key(component: &[usize], nodes: &[DefId]) -> DefId {
    component
        .iter()
        .map(|&i| nodes[i].clone())
        .min()
        .unwrap_or_else(|| DefId::new(""))
}

/// Iterative Tarjan over an adjacency list. Components come out in reverse
/// topological order of the condensation, but the caller re-orders them
/// anyway.
fn tarjan_scc(succ: &[Vec<usize>]) -> Vec<Vec<usize>> {
    #[derive(Clone, Copy)]
    struct NodeState {
        index: usize,
        lowlink: usize,
        on_stack: bool,
        visited: bool,
    }

    let n = succ.len();
    let mut state = vec![
        NodeState {
            index: 0,
            lowlink: 0,
            on_stack: false,
            visited: false,
        };
        n
    ];
    let mut counter = 0usize;
    let mut stack: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<usize>> = Vec::new();

    for start in 0..n {
        if state[start].visited {
            continue;
        }
        // Explicit work stack of (node, next child index to visit).
        let mut work: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(&(v, child)) = work.last() {
            if child == 0 {
                state[v].visited = true;
                state[v].index = counter;
                state[v].lowlink = counter;
                counter += 1;
                stack.push(v);
                state[v].on_stack = true;
            }
            if child < succ[v].len() {
                if let Some(top) = work.last_mut() {
                    top.1 += 1;
                }
                let w = succ[v][child];
                if !state[w].visited {
                    work.push((w, 0));
                } else if state[w].on_stack {
                    state[v].lowlink = state[v].lowlink.min(state[w].index);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                let lowlink = state[v].lowlink;
                state[parent].lowlink = state[parent].lowlink.min(lowlink);
            }
            if state[v].lowlink == state[v].index {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    state[w].on_stack = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }

    components
}

/// Drop any method whose receiver definition is absent from the sorted
/// list — its type is unreachable in this entry, so the method can never
/// be invoked. A receiver missing from the index entirely is a loader
/// invariant violation and propagates as an error.
pub fn prune<'a>(
    index: &Index<'a>,
    sorted: Vec<&'a Def>,
) -> Result<Vec<&'a Def>, UnresolvedError> {
    let present: FxHashSet<&DefId> = sorted.iter().map(|d| d.id()).collect();
    let mut out = Vec::with_capacity(sorted.len());
    for def in &sorted {
        if let Some(recv) = def.recv() {
            if index.lookup(recv).is_none() {
                return Err(UnresolvedError {
                    from: def.id().to_string(),
                    missing: recv.to_string(),
                });
            }
            if !present.contains(recv) {
                tracing::debug!(id = %def.id(), "pruned: receiver unreachable");
                continue;
            }
        }
        out.push(*def);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jot_ir::{DefMeta, FuncDef, FuncSig, Program};

    fn func_with_deps(id: &str, name: &str, path: &str, deps: &[&str]) -> Def {
        let mut meta = DefMeta::new(id, name, path);
        meta.deps = deps.iter().map(|d| DefId::new(*d)).collect();
        Def::Func(FuncDef {
            meta,
            sig: FuncSig::default(),
            body: Some(vec![]),
        })
    }

    fn ids(defs: &[&Def]) -> Vec<String> {
        defs.iter().map(|d| d.id().to_string()).collect()
    }

    #[test]
    fn sort_is_leaves_first() {
        let mut program = Program::new();
        program.insert(func_with_deps("app.main", "main", "app", &["b.F", "c.G"]));
        program.insert(func_with_deps("b.F", "F", "b", &["c.G"]));
        program.insert(func_with_deps("c.G", "G", "c", &[]));
        program.entries = vec!["app".into()];

        let index = Index::new(&program).unwrap();
        let graph = DepGraph::discover(&index).unwrap();
        let sorted = graph.sort(&index, index.mains()[0]).unwrap();
        assert_eq!(ids(&sorted), vec!["c.G", "b.F", "app.main"]);
    }

    #[test]
    fn intra_package_cycle_is_ordered_by_id() {
        let mut program = Program::new();
        program.insert(func_with_deps("app.main", "main", "app", &["p.B"]));
        program.insert(func_with_deps("p.B", "B", "p", &["p.A"]));
        program.insert(func_with_deps("p.A", "A", "p", &["p.B"]));
        program.entries = vec!["app".into()];

        let index = Index::new(&program).unwrap();
        let graph = DepGraph::discover(&index).unwrap();
        let sorted = graph.sort(&index, index.mains()[0]).unwrap();
        assert_eq!(ids(&sorted), vec!["p.A", "p.B", "app.main"]);
    }

    #[test]
    fn cross_package_cycle_is_an_error() {
        let mut program = Program::new();
        program.insert(func_with_deps("app.main", "main", "app", &["a.F"]));
        program.insert(func_with_deps("a.F", "F", "a", &["b.G"]));
        program.insert(func_with_deps("b.G", "G", "b", &["a.F"]));
        program.entries = vec!["app".into()];

        let index = Index::new(&program).unwrap();
        let graph = DepGraph::discover(&index).unwrap();
        let err = graph.sort(&index, index.mains()[0]).unwrap_err();
        assert_eq!(err.ids, vec!["a.F".to_string(), "b.G".to_string()]);
    }

    #[test]
    fn missing_dependency_is_unresolved() {
        let mut program = Program::new();
        program.insert(func_with_deps("app.main", "main", "app", &["gone.F"]));
        program.entries = vec!["app".into()];

        let index = Index::new(&program).unwrap();
        let err = DepGraph::discover(&index).unwrap_err();
        assert_eq!(err.missing, "gone.F");
    }

    #[test]
    fn unreachable_defs_are_not_sorted() {
        let mut program = Program::new();
        program.insert(func_with_deps("app.main", "main", "app", &["b.F"]));
        program.insert(func_with_deps("b.F", "F", "b", &[]));
        program.insert(func_with_deps("b.Unused", "Unused", "b", &[]));
        program.entries = vec!["app".into()];

        let index = Index::new(&program).unwrap();
        let graph = DepGraph::discover(&index).unwrap();
        let sorted = graph.sort(&index, index.mains()[0]).unwrap();
        assert_eq!(ids(&sorted), vec!["b.F", "app.main"]);
    }
}
