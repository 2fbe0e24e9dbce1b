// Site graph: weighted edges, complete-graph construction, Prim's minimum
// spanning forest and Dijkstra shortest paths.
//
// Vertices are indices into a caller-owned list of land `Site`s. Edge
// weights are planar (XZ) Euclidean distances in `f64`. Adjacency lists hold
// every edge at both endpoints, in insertion order, so iteration order (and
// therefore tie-breaking inside the priority queue) is fully determined by
// the order the edges were added.
//
// `PrimMst::edges()` returns tree edges in *vertex* order (the edge that
// connected vertex 0, then vertex 1, ...). The city's bridge layout depends
// on that order, see `city.rs`.
//
// See also: `pq.rs` for the indexed heap both algorithms drive.
//
// **Critical constraint: determinism.** No hash maps; all state is in `Vec`s
// indexed by vertex.

use crate::pq::IndexMinPq;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteKind {
    Land,
    Water,
}

/// A lattice cell classified by the noise threshold test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub x: i32,
    pub z: i32,
    pub kind: SiteKind,
    /// Raw noise sample that decided `kind`; also drives island height.
    pub elevation: f64,
}

impl Site {
    pub fn is_land(&self) -> bool {
        self.kind == SiteKind::Land
    }

    pub fn planar(&self) -> [f64; 2] {
        [self.x as f64, self.z as f64]
    }
}

// ---------------------------------------------------------------------------
// Edges and graph
// ---------------------------------------------------------------------------

/// Undirected weighted edge. Equality ignores weight and endpoint order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WeightedEdge {
    v: usize,
    w: usize,
    weight: f64,
}

impl PartialEq for WeightedEdge {
    fn eq(&self, other: &Self) -> bool {
        (self.v == other.v && self.w == other.w) || (self.v == other.w && self.w == other.v)
    }
}

impl Eq for WeightedEdge {}

impl WeightedEdge {
    /// Panics on a negative or NaN weight.
    pub fn new(v: usize, w: usize, weight: f64) -> Self {
        assert!(weight >= 0.0, "edge {v}-{w}: weight must be non-negative, got {weight}");
        Self { v, w, weight }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// One endpoint (the one given first at construction).
    pub fn either(&self) -> usize {
        self.v
    }

    /// The endpoint that is not `vertex`. Panics if `vertex` is not on the
    /// edge.
    pub fn other(&self, vertex: usize) -> usize {
        if vertex == self.v {
            self.w
        } else if vertex == self.w {
            self.v
        } else {
            panic!("vertex {vertex} is not an endpoint of edge {}-{}", self.v, self.w)
        }
    }
}

fn planar_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dz = a[1] - b[1];
    (dx * dx + dz * dz).sqrt()
}

#[derive(Clone, Debug, Default)]
pub struct EdgeWeightedGraph {
    adj: Vec<Vec<WeightedEdge>>,
    edge_count: usize,
}

impl EdgeWeightedGraph {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            adj: vec![Vec::new(); vertex_count],
            edge_count: 0,
        }
    }

    /// Complete graph over `points`, weighted by planar distance. Edges are
    /// added for every `v < w` in lexicographic order.
    pub fn complete(points: &[[f64; 2]]) -> Self {
        let mut graph = Self::new(points.len());
        for v in 0..points.len() {
            for w in v + 1..points.len() {
                graph.add_edge(WeightedEdge::new(v, w, planar_distance(points[v], points[w])));
            }
        }
        graph
    }

    pub fn vertex_count(&self) -> usize {
        self.adj.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn add_edge(&mut self, e: WeightedEdge) {
        let v = e.either();
        let w = e.other(v);
        self.validate(v);
        self.validate(w);
        self.adj[v].push(e);
        self.adj[w].push(e);
        self.edge_count += 1;
    }

    pub fn adj(&self, v: usize) -> &[WeightedEdge] {
        self.validate(v);
        &self.adj[v]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adj(v).len()
    }

    /// Every edge once, listed from its lower endpoint. Self-loops appear
    /// twice in an adjacency list and are reported once.
    pub fn edges(&self) -> Vec<WeightedEdge> {
        let mut out = Vec::with_capacity(self.edge_count);
        for (v, list) in self.adj.iter().enumerate() {
            let mut self_loops = 0;
            for e in list {
                let w = e.other(v);
                if w > v {
                    out.push(*e);
                } else if w == v {
                    if self_loops % 2 == 0 {
                        out.push(*e);
                    }
                    self_loops += 1;
                }
            }
        }
        out
    }

    fn validate(&self, v: usize) {
        assert!(
            v < self.adj.len(),
            "vertex {v} out of range for graph with {} vertices",
            self.adj.len()
        );
    }
}

// ---------------------------------------------------------------------------
// Prim
// ---------------------------------------------------------------------------

/// Minimum spanning forest by eager Prim, restarted from every unvisited
/// vertex in index order.
#[derive(Clone, Debug)]
pub struct PrimMst {
    edge_to: Vec<Option<WeightedEdge>>,
    dist_to: Vec<f64>,
}

impl PrimMst {
    pub fn new(graph: &EdgeWeightedGraph) -> Self {
        let n = graph.vertex_count();
        let mut mst = Self {
            edge_to: vec![None; n],
            dist_to: vec![f64::INFINITY; n],
        };
        let mut marked = vec![false; n];
        let mut pq = IndexMinPq::new(n);

        for root in 0..n {
            if marked[root] {
                continue;
            }
            mst.dist_to[root] = 0.0;
            pq.insert(root, 0.0);
            while !pq.is_empty() {
                let v = pq.extract_min();
                marked[v] = true;
                for e in graph.adj(v) {
                    let w = e.other(v);
                    if marked[w] || e.weight() >= mst.dist_to[w] {
                        continue;
                    }
                    mst.dist_to[w] = e.weight();
                    mst.edge_to[w] = Some(*e);
                    if pq.contains(w) {
                        pq.decrease_key(w, e.weight());
                    } else {
                        pq.insert(w, e.weight());
                    }
                }
            }
        }
        mst
    }

    /// Tree edges in vertex order.
    pub fn edges(&self) -> Vec<WeightedEdge> {
        self.edge_to.iter().flatten().copied().collect()
    }

    pub fn weight(&self) -> f64 {
        self.edge_to.iter().flatten().map(WeightedEdge::weight).sum()
    }
}

// ---------------------------------------------------------------------------
// Dijkstra
// ---------------------------------------------------------------------------

/// Single-source shortest paths over the undirected graph.
#[derive(Clone, Debug)]
pub struct ShortestPaths {
    source: usize,
    dist_to: Vec<f64>,
    edge_to: Vec<Option<WeightedEdge>>,
}

impl ShortestPaths {
    /// Panics if `source` is out of range or any edge weight is negative.
    pub fn new(graph: &EdgeWeightedGraph, source: usize) -> Self {
        let n = graph.vertex_count();
        assert!(source < n, "source vertex {source} out of range for graph with {n} vertices");
        for e in graph.edges() {
            assert!(e.weight() >= 0.0, "edge {} has negative weight", e.either());
        }

        let mut sp = Self {
            source,
            dist_to: vec![f64::INFINITY; n],
            edge_to: vec![None; n],
        };
        sp.dist_to[source] = 0.0;

        let mut pq = IndexMinPq::new(n);
        pq.insert(source, 0.0);
        while !pq.is_empty() {
            let v = pq.extract_min();
            for e in graph.adj(v) {
                let w = e.other(v);
                let candidate = sp.dist_to[v] + e.weight();
                if sp.dist_to[w] <= candidate {
                    continue;
                }
                sp.dist_to[w] = candidate;
                sp.edge_to[w] = Some(*e);
                if pq.contains(w) {
                    pq.decrease_key(w, candidate);
                } else {
                    pq.insert(w, candidate);
                }
            }
        }
        sp
    }

    pub fn source(&self) -> usize {
        self.source
    }

    /// Length of the shortest path to `v`; infinite when unreachable.
    pub fn dist_to(&self, v: usize) -> f64 {
        self.dist_to[v]
    }

    pub fn has_path_to(&self, v: usize) -> bool {
        self.dist_to[v] < f64::INFINITY
    }

    /// Edges of the shortest path, walked from `v` back toward the source.
    /// `None` when `v` is unreachable; empty for the source itself.
    pub fn path_to(&self, v: usize) -> Option<Vec<WeightedEdge>> {
        if !self.has_path_to(v) {
            return None;
        }
        let mut path = Vec::new();
        let mut x = v;
        while let Some(e) = self.edge_to[x] {
            path.push(e);
            x = e.other(x);
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_graph_edge_counts() {
        let pts: Vec<[f64; 2]> = (0..6).map(|i| [i as f64, (i * i) as f64]).collect();
        let g = EdgeWeightedGraph::complete(&pts);
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(g.edge_count(), 15);
        assert_eq!(g.edges().len(), 15);
        for v in 0..6 {
            assert_eq!(g.degree(v), 5);
        }
    }

    #[test]
    fn weights_ignore_height() {
        let g = EdgeWeightedGraph::complete(&[[0.0, 0.0], [3.0, 4.0]]);
        assert_eq!(g.edges()[0].weight(), 5.0);
    }

    #[test]
    fn mst_on_colinear_points() {
        let g = EdgeWeightedGraph::complete(&[[0.0, 0.0], [2.0, 0.0], [5.0, 0.0]]);
        let mst = PrimMst::new(&g);
        let edges = mst.edges();
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&WeightedEdge::new(0, 1, 2.0)));
        assert!(edges.contains(&WeightedEdge::new(1, 2, 3.0)));
        assert!(!edges.contains(&WeightedEdge::new(0, 2, 5.0)));
        assert_eq!(mst.weight(), 5.0);
    }

    #[test]
    fn mst_edges_come_out_in_vertex_order() {
        let g = EdgeWeightedGraph::complete(&[[0.0, 0.0], [2.0, 0.0], [5.0, 0.0]]);
        let edges = PrimMst::new(&g).edges();
        // Vertex 1 was reached by 0-1, vertex 2 by 1-2.
        assert_eq!((edges[0].either(), edges[0].other(edges[0].either())), (0, 1));
        assert_eq!((edges[1].either(), edges[1].other(edges[1].either())), (1, 2));
    }

    #[test]
    fn prim_spans_a_forest() {
        let mut g = EdgeWeightedGraph::new(4);
        g.add_edge(WeightedEdge::new(0, 1, 1.0));
        g.add_edge(WeightedEdge::new(2, 3, 2.0));
        let mst = PrimMst::new(&g);
        assert_eq!(mst.edges().len(), 2);
        assert_eq!(mst.weight(), 3.0);
    }

    #[test]
    fn single_and_empty_graphs() {
        assert!(PrimMst::new(&EdgeWeightedGraph::complete(&[])).edges().is_empty());
        assert!(PrimMst::new(&EdgeWeightedGraph::complete(&[[1.0, 1.0]])).edges().is_empty());
    }

    #[test]
    fn dijkstra_takes_direct_edge_when_shorter() {
        let g = EdgeWeightedGraph::complete(&[[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]);
        let sp = ShortestPaths::new(&g, 0);
        assert_eq!(sp.source(), 0);
        assert_eq!(sp.dist_to(2), 2.0);
        assert!(sp.has_path_to(1));
        let path = sp.path_to(2).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(sp.path_to(0).unwrap().len(), 0);
    }

    #[test]
    fn dijkstra_walks_path_back_to_source() {
        let mut g = EdgeWeightedGraph::new(4);
        g.add_edge(WeightedEdge::new(0, 1, 1.0));
        g.add_edge(WeightedEdge::new(1, 2, 1.0));
        g.add_edge(WeightedEdge::new(0, 2, 5.0));
        let sp = ShortestPaths::new(&g, 0);
        let path = sp.path_to(2).unwrap();
        assert_eq!(path, vec![WeightedEdge::new(1, 2, 1.0), WeightedEdge::new(0, 1, 1.0)]);
        assert!(!sp.has_path_to(3));
        assert!(sp.path_to(3).is_none());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn dijkstra_rejects_bad_source() {
        ShortestPaths::new(&EdgeWeightedGraph::new(2), 2);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn negative_weights_are_rejected() {
        WeightedEdge::new(0, 1, -1.0);
    }

    #[test]
    fn edge_equality_ignores_orientation() {
        assert_eq!(WeightedEdge::new(3, 7, 1.0), WeightedEdge::new(7, 3, 2.0));
        assert_eq!(WeightedEdge::new(3, 7, 1.0).other(7), 3);
    }
}
