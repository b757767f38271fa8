//! Inverted call adjacency and bounded caller search.

use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Default hop bound for [`ReverseDependencyGraph::find_callers`]
pub const DEFAULT_CALLER_DEPTH: usize = 10;

/// Callee id → callers, each caller listed once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseDependencyGraph {
    callers: IndexMap<String, IndexSet<String>>,
}

/// Options for [`ReverseDependencyGraph::find_callers`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindCallersOptions {
    pub max_depth: usize,
}

impl Default for FindCallersOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_CALLER_DEPTH,
        }
    }
}

impl FindCallersOptions {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

/// A caller reached by the backward search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerHit {
    pub id: String,
    /// Shortest hop count from the target (1 = direct caller)
    pub depth: usize,
    /// Ids from the target to this caller, both ends included
    pub path: Vec<String>,
}

/// Inverts `(from, to)` pairs into `to → [from, ...]`, dropping repeated pairs
pub fn build_reverse_dependency_graph<'a, I>(edges: I) -> ReverseDependencyGraph
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut graph = ReverseDependencyGraph::default();
    for (from, to) in edges {
        graph.add_edge(from, to);
    }
    graph
}

impl ReverseDependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds directly from `callee → callers` lists
    pub fn from_callers<'a, I, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, C)>,
        C: IntoIterator<Item = &'a str>,
    {
        let mut graph = Self::default();
        for (callee, callers) in entries {
            for caller in callers {
                graph.add_edge(caller, callee);
            }
        }
        graph
    }

    /// Records that `from` calls `to`
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.callers
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }

    /// Direct callers of `id` in first-seen order
    pub fn callers(&self, id: &str) -> impl Iterator<Item = &str> {
        self.callers
            .get(id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn callers_of(&self, id: &str) -> Vec<String> {
        self.callers(id).map(str::to_string).collect()
    }

    /// Number of callees with at least one caller
    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }

    /// Breadth-first search backward from `target`.
    ///
    /// The target is seeded as visited and nodes are marked when enqueued, so
    /// cycles terminate and every caller appears once with its shortest depth.
    /// Callers exactly `max_depth` hops away are included. Unknown targets and
    /// targets without callers give an empty result.
    pub fn find_callers(&self, target: &str, options: FindCallersOptions) -> Vec<CallerHit> {
        let mut visited: IndexSet<&str> = IndexSet::new();
        let mut queue: VecDeque<(&str, usize, Vec<String>)> = VecDeque::new();
        let mut hits = Vec::new();

        visited.insert(target);
        queue.push_back((target, 0, vec![target.to_string()]));

        while let Some((current, depth, path)) = queue.pop_front() {
            if depth >= options.max_depth {
                continue;
            }
            for caller in self.callers(current) {
                if !visited.insert(caller) {
                    continue;
                }
                let mut caller_path = path.clone();
                caller_path.push(caller.to_string());
                hits.push(CallerHit {
                    id: caller.to_string(),
                    depth: depth + 1,
                    path: caller_path.clone(),
                });
                queue.push_back((caller, depth + 1, caller_path));
            }
        }

        hits
    }

    /// Callers paired with the id chain leading back to `target`
    pub fn find_callers_with_paths(&self, target: &str, max_depth: usize) -> Vec<(String, Vec<String>)> {
        self.find_callers(target, FindCallersOptions::with_max_depth(max_depth))
            .into_iter()
            .map(|hit| (hit.id, hit.path))
            .collect()
    }

    /// Caller ids only, in discovery order
    pub fn find_caller_ids(&self, target: &str, options: FindCallersOptions) -> Vec<String> {
        self.find_callers(target, options)
            .into_iter()
            .map(|hit| hit.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn auth_graph() -> ReverseDependencyGraph {
        ReverseDependencyGraph::from_callers([
            ("useAuth", vec!["LoginPage", "SignupPage", "ProfilePage"]),
            ("LoginPage", vec!["App"]),
            ("ProfilePage", vec!["App", "SettingsPage"]),
        ])
    }

    fn ids(hits: &[CallerHit]) -> BTreeSet<String> {
        hits.iter().map(|h| h.id.clone()).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn finds_all_transitive_callers() {
        let hits = auth_graph().find_callers("useAuth", FindCallersOptions::default());
        assert_eq!(
            ids(&hits),
            set(&["LoginPage", "SignupPage", "ProfilePage", "App", "SettingsPage"])
        );
        assert_eq!(hits.len(), 5, "each caller reported once");
    }

    #[test]
    fn max_depth_one_returns_direct_callers() {
        let hits = auth_graph().find_callers("useAuth", FindCallersOptions::with_max_depth(1));
        assert_eq!(ids(&hits), set(&["LoginPage", "SignupPage", "ProfilePage"]));
        assert!(hits.iter().all(|h| h.depth == 1));
    }

    #[test]
    fn records_depth_and_path() {
        let hits = auth_graph().find_callers("useAuth", FindCallersOptions::default());
        let app = hits.iter().find(|h| h.id == "App").unwrap();
        assert_eq!(app.depth, 2);
        assert_eq!(app.path, vec!["useAuth", "LoginPage", "App"]);
    }

    #[test]
    fn zero_depth_finds_nothing() {
        let hits = auth_graph().find_callers("useAuth", FindCallersOptions::with_max_depth(0));
        assert!(hits.is_empty());
    }

    #[test]
    fn terminates_on_cycles() {
        let graph = build_reverse_dependency_graph([("A", "B"), ("B", "C"), ("C", "A")]);
        let hits = graph.find_callers("A", FindCallersOptions::default());
        assert_eq!(ids(&hits), set(&["B", "C"]));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn self_loop_is_not_reported() {
        let graph = build_reverse_dependency_graph([("A", "A"), ("B", "A")]);
        assert_eq!(graph.find_caller_ids("A", FindCallersOptions::default()), vec!["B"]);
    }

    #[test]
    fn unknown_target_and_roots_have_no_callers() {
        let graph = auth_graph();
        assert!(graph.find_callers("nonexistent", FindCallersOptions::default()).is_empty());
        assert!(graph.find_callers("App", FindCallersOptions::default()).is_empty());
    }

    #[test]
    fn repeated_edges_are_deduplicated() {
        let graph = build_reverse_dependency_graph([("A", "B"), ("A", "B"), ("A", "B"), ("C", "B")]);
        assert_eq!(graph.callers_of("B"), vec!["A", "C"]);
    }

    #[test]
    fn deeper_search_is_a_superset() {
        let graph = build_reverse_dependency_graph([
            ("b", "a"),
            ("c", "b"),
            ("d", "c"),
            ("e", "d"),
            ("c", "a"),
            ("a", "e"),
        ]);
        for depth in 0..6 {
            let shallow = ids(&graph.find_callers("a", FindCallersOptions::with_max_depth(depth)));
            let deep = ids(&graph.find_callers("a", FindCallersOptions::with_max_depth(depth + 1)));
            assert!(shallow.is_subset(&deep), "depth {depth} not contained in {}", depth + 1);
        }
    }

    #[test]
    fn matches_forward_reachability() {
        // Forward edges with a cycle and a diamond
        let edges = [
            ("p", "q"),
            ("q", "r"),
            ("r", "p"),
            ("s", "q"),
            ("t", "s"),
            ("t", "r"),
            ("u", "v"),
        ];
        let graph = build_reverse_dependency_graph(edges);

        for target in ["p", "q", "r", "s", "t", "u", "v"] {
            // Nodes with a forward path to target, computed by fixpoint
            let mut reach: BTreeSet<&str> = BTreeSet::new();
            loop {
                let before = reach.len();
                for (from, to) in edges {
                    if from != target && (to == target || reach.contains(to)) {
                        reach.insert(from);
                    }
                }
                if reach.len() == before {
                    break;
                }
            }
            let expected: BTreeSet<String> = reach.into_iter().map(str::to_string).collect();
            let found = ids(&graph.find_callers(target, FindCallersOptions::default()));
            assert_eq!(found, expected, "callers of {target}");
        }
    }
}
