use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::convert::TryFrom;

use bit_set::BitSet;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/** Vertex Id */
pub type VertexId = usize;

/// errors raised when building or editing a graph
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// an edge from a vertex to itself
    #[error("self-loop on vertex {0}")]
    SelfLoop(VertexId),
    /// an edge refers to a vertex that is not in the graph
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),
}

/** models a simple undirected graph.

Vertex labels are arbitrary integers (they may become non-contiguous after
deletions). There are no self-loops and no multi-edges.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphEncoding", into = "GraphEncoding")]
pub struct Graph {
    /// adj[v]: vertices adjacent to v
    adj: BTreeMap<VertexId, BTreeSet<VertexId>>,
}

/// lossless serialized form of a graph (vertex set + edge set)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphEncoding {
    vertices: Vec<VertexId>,
    edges: Vec<(VertexId, VertexId)>,
}

impl From<Graph> for GraphEncoding {
    fn from(g:Graph) -> Self {
        Self { vertices: g.vertices().collect(), edges: g.edges() }
    }
}

impl TryFrom<GraphEncoding> for Graph {
    type Error = GraphError;

    fn try_from(enc:GraphEncoding) -> Result<Self, Self::Error> {
        let mut res = Graph::new();
        for v in enc.vertices { res.add_vertex(v); }
        for (u,v) in enc.edges { res.add_edge(u, v)?; }
        Ok(res)
    }
}


impl Graph {

    /// empty graph
    pub fn new() -> Self { Self::default() }

    /// graph with vertices 0..n and no edges
    pub fn with_vertices(n:usize) -> Self {
        Self { adj: (0..n).map(|v| (v, BTreeSet::new())).collect() }
    }

    /// graph with vertices 0..n and the given edges
    pub fn from_edges(n:usize, edges:&[(VertexId,VertexId)]) -> Result<Self, GraphError> {
        let mut res = Self::with_vertices(n);
        for (u,v) in edges { res.add_edge(*u, *v)?; }
        Ok(res)
    }

    /// path 0 - 1 - ... - (n-1)
    pub fn path(n:usize) -> Self {
        let mut res = Self::with_vertices(n);
        for v in 1..n { res.link(v-1, v); }
        res
    }

    /// cycle on n >= 3 vertices (a path otherwise)
    pub fn cycle(n:usize) -> Self {
        let mut res = Self::path(n);
        if n >= 3 { res.link(n-1, 0); }
        res
    }

    /// number of vertices
    pub fn nb_vertices(&self) -> usize { self.adj.len() }

    /// number of edges
    pub fn nb_edges(&self) -> usize {
        self.adj.values().map(|l| l.len()).sum::<usize>() / 2
    }

    /// vertex labels in increasing order
    pub fn vertices(&self) -> impl Iterator<Item=VertexId> + '_ {
        self.adj.keys().copied()
    }

    /// edge list, each edge (u,v) with u < v
    pub fn edges(&self) -> Vec<(VertexId,VertexId)> {
        let mut res = Vec::with_capacity(self.nb_edges());
        for (u,l) in self.adj.iter() {
            for v in l.range(u+1..) {
                res.push((*u,*v));
            }
        }
        res
    }

    /// true iff v is a vertex of the graph
    pub fn has_vertex(&self, v:VertexId) -> bool { self.adj.contains_key(&v) }

    /// true iff u and v are adjacent
    pub fn has_edge(&self, u:VertexId, v:VertexId) -> bool {
        self.adj.get(&u).map_or(false, |l| l.contains(&v))
    }

    /// vertices adjacent to v (empty if v does not exist)
    pub fn neighbors(&self, v:VertexId) -> impl Iterator<Item=VertexId> + '_ {
        self.adj.get(&v).into_iter().flat_map(|l| l.iter().copied())
    }

    /// degree of v (0 if v does not exist)
    pub fn degree(&self, v:VertexId) -> usize {
        self.adj.get(&v).map_or(0, |l| l.len())
    }

    /// maximum degree (0 for the empty graph)
    pub fn max_degree(&self) -> usize {
        self.adj.values().map(|l| l.len()).max().unwrap_or(0)
    }

    /// every vertex has degree at most 3
    pub fn is_subcubic(&self) -> bool { self.max_degree() <= 3 }

    /// smallest label larger than every existing label
    pub fn next_label(&self) -> VertexId {
        self.adj.keys().next_back().map_or(0, |v| v+1)
    }

    /// adds an isolated vertex. returns false if it already existed
    pub fn add_vertex(&mut self, v:VertexId) -> bool {
        if self.adj.contains_key(&v) { return false; }
        self.adj.insert(v, BTreeSet::new());
        true
    }

    /// adds an isolated vertex with a fresh label and returns the label
    pub fn add_fresh_vertex(&mut self) -> VertexId {
        let v = self.next_label();
        self.adj.insert(v, BTreeSet::new());
        v
    }

    /// removes v and its incident edges. returns false if v did not exist
    pub fn remove_vertex(&mut self, v:VertexId) -> bool {
        match self.adj.remove(&v) {
            None => false,
            Some(l) => {
                for u in l {
                    if let Some(lu) = self.adj.get_mut(&u) { lu.remove(&v); }
                }
                true
            }
        }
    }

    /** adds the edge (u,v). returns Ok(false) if it was already present.

    fails if u == v or if one endpoint is not a vertex of the graph.
    */
    pub fn add_edge(&mut self, u:VertexId, v:VertexId) -> Result<bool, GraphError> {
        if u == v { return Err(GraphError::SelfLoop(u)); }
        for w in [u,v] {
            if !self.has_vertex(w) { return Err(GraphError::UnknownVertex(w)); }
        }
        Ok(self.link(u, v))
    }

    /// inserts an edge between two existing distinct vertices
    fn link(&mut self, u:VertexId, v:VertexId) -> bool {
        let added = self.adj.entry(u).or_default().insert(v);
        self.adj.entry(v).or_default().insert(u);
        added
    }

    /// removes the edge (u,v). returns false if it was not present
    pub fn remove_edge(&mut self, u:VertexId, v:VertexId) -> bool {
        let removed = self.adj.get_mut(&u).map_or(false, |l| l.remove(&v));
        if let Some(l) = self.adj.get_mut(&v) { l.remove(&u); }
        removed
    }

    /** dense view of the graph: (labels, adjacency) where labels[i] is the
    label of the ith vertex (increasing order) and adjacency[i] lists the
    indices adjacent to i.
    */
    pub fn adjacency_lists(&self) -> (Vec<VertexId>, Vec<Vec<usize>>) {
        let labels:Vec<VertexId> = self.vertices().collect();
        let index:BTreeMap<VertexId,usize> = labels.iter().enumerate()
            .map(|(i,v)| (*v,i)).collect();
        let adjacency = self.adj.values()
            .map(|l| l.iter().map(|v| index[v]).collect())
            .collect();
        (labels, adjacency)
    }

    /// BFS hop counts from `source` to every reachable vertex
    pub fn distances_from(&self, source:VertexId) -> BTreeMap<VertexId,usize> {
        let mut res = BTreeMap::new();
        if !self.has_vertex(source) { return res; }
        let mut queue = VecDeque::new();
        res.insert(source, 0);
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            let du = res[&u];
            for v in self.neighbors(u) {
                if !res.contains_key(&v) {
                    res.insert(v, du+1);
                    queue.push_back(v);
                }
            }
        }
        res
    }

    /// shortest path length between u and v (None if not connected)
    pub fn distance(&self, u:VertexId, v:VertexId) -> Option<usize> {
        self.distances_from(u).get(&v).copied()
    }

    /** all-pairs distances on the dense indexing of `adjacency_lists`.
    dist[i][j] is None if j is not reachable from i.
    */
    pub fn distance_matrix(&self) -> Vec<Vec<Option<usize>>> {
        let (_, adjacency) = self.adjacency_lists();
        let n = adjacency.len();
        (0..n).map(|s| {
            let mut dist = vec![None ; n];
            let mut queue = VecDeque::new();
            dist[s] = Some(0);
            queue.push_back(s);
            while let Some(u) = queue.pop_front() {
                let du = dist[u].unwrap_or(0);
                for v in &adjacency[u] {
                    if dist[*v].is_none() {
                        dist[*v] = Some(du+1);
                        queue.push_back(*v);
                    }
                }
            }
            dist
        }).collect()
    }

    /// largest distance between two vertices (None if empty or disconnected)
    pub fn diameter(&self) -> Option<usize> {
        if self.nb_vertices() == 0 { return None; }
        let mut res = 0;
        for row in self.distance_matrix() {
            for d in row {
                res = res.max(d?);
            }
        }
        Some(res)
    }

    /// true iff the graph is connected (graphs with at most one vertex are)
    pub fn is_connected(&self) -> bool { self.is_connected_without(None) }

    /// true iff the graph minus `removed` (if any) is connected
    fn is_connected_without(&self, removed:Option<VertexId>) -> bool {
        let (labels, adjacency) = self.adjacency_lists();
        let skipped = removed.and_then(|r| labels.iter().position(|v| *v == r));
        let expected = labels.len() - skipped.map_or(0, |_| 1);
        let start = match (0..labels.len()).find(|i| Some(*i) != skipped) {
            None => return true,
            Some(i) => i,
        };
        let mut visited = BitSet::with_capacity(labels.len());
        let mut stack = vec![start];
        visited.insert(start);
        while let Some(u) = stack.pop() {
            for v in &adjacency[u] {
                if Some(*v) != skipped && visited.insert(*v) {
                    stack.push(*v);
                }
            }
        }
        visited.len() == expected
    }

    /** vertices whose deletion leaves the rest of the graph connected
    (the removable set), `excluded` is never part of the result.
    */
    pub fn removable_vertices(&self, excluded:Option<VertexId>) -> Vec<VertexId> {
        self.vertices()
            .filter(|v| Some(*v) != excluded)
            .filter(|v| self.is_connected_without(Some(*v)))
            .collect()
    }

    /// copy of the graph with labels 0..n (the relative order is kept)
    pub fn relabeled(&self) -> Graph {
        let (_, adjacency) = self.adjacency_lists();
        Graph {
            adj: adjacency.into_iter().enumerate()
                .map(|(i,l)| (i, l.into_iter().collect()))
                .collect()
        }
    }

    /// print statistics of the graph
    pub fn display_statistics(&self) {
        println!("\t{} \t vertices", self.nb_vertices());
        println!("\t{} \t edges", self.nb_edges());
        let degrees:Vec<usize> = self.vertices().map(|v| self.degree(v)).collect();
        if let (Some(min), Some(max)) = (degrees.iter().min(), degrees.iter().max()) {
            println!("\t{} \t min degree", min);
            println!("\t{} \t max degree", max);
        }
        match self.diameter() {
            None => println!("\tdisconnected"),
            Some(d) => println!("\t{} \t diameter", d),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle() {
        let g = Graph::cycle(5);
        assert_eq!(g.nb_vertices(), 5);
        assert_eq!(g.nb_edges(), 5);
        assert_eq!(g.max_degree(), 2);
        assert_eq!(g.diameter(), Some(2));
        assert_eq!(g.distance(0, 2), Some(2));
        assert_eq!(g.distance(0, 4), Some(1));
    }

    #[test]
    fn test_invalid_edges() {
        let mut g = Graph::with_vertices(2);
        assert_eq!(g.add_edge(0, 0), Err(GraphError::SelfLoop(0)));
        assert_eq!(g.add_edge(0, 7), Err(GraphError::UnknownVertex(7)));
        assert_eq!(g.add_edge(0, 1), Ok(true));
        assert_eq!(g.add_edge(1, 0), Ok(false)); // no multi-edges
        assert_eq!(g.nb_edges(), 1);
    }

    #[test]
    fn test_remove_vertex_keeps_labels() {
        let mut g = Graph::path(4);
        assert!(g.remove_vertex(1));
        assert_eq!(g.vertices().collect::<Vec<_>>(), vec![0,2,3]);
        assert_eq!(g.edges(), vec![(2,3)]);
        assert!(!g.is_connected());
        assert_eq!(g.diameter(), None);
        assert_eq!(g.next_label(), 4);
        let h = g.relabeled();
        assert_eq!(h.vertices().collect::<Vec<_>>(), vec![0,1,2]);
        assert_eq!(h.edges(), vec![(1,2)]);
    }

    #[test]
    fn test_removable_vertices() {
        // removing an inner vertex of a path disconnects it
        let g = Graph::path(4);
        assert_eq!(g.removable_vertices(None), vec![0,3]);
        assert_eq!(g.removable_vertices(Some(0)), vec![3]);
        // every vertex of a cycle is removable
        assert_eq!(Graph::cycle(4).removable_vertices(None).len(), 4);
    }

    #[test]
    fn test_serialization() {
        let mut g = Graph::cycle(4);
        g.remove_vertex(2);
        g.add_vertex(9);
        g.add_edge(9, 3).unwrap();
        let s = serde_json::to_string(&g).unwrap();
        assert_eq!(s, r#"{"vertices":[0,1,3,9],"edges":[[0,1],[0,3],[3,9]]}"#);
        let h:Graph = serde_json::from_str(&s).unwrap();
        assert_eq!(g, h);
    }

    #[test]
    fn test_deserialization_rejects_loops() {
        let s = r#"{"vertices":[0,1],"edges":[[1,1]]}"#;
        assert!(serde_json::from_str::<Graph>(s).is_err());
    }
}
