/*
Planar embeddings of small graphs.

An embedding is a rotation system (cyclic order of the neighbors around each vertex). Faces are
the orbits of darts under "arrive at v from u, leave towards the successor of u around v". A
rotation system is planar iff Euler's formula holds for every component: V - E + F = 2.
The search enumerates the rotations of vertices of degree >= 3, which is (d-1)! per vertex. This
is fast for subcubic graphs (at most 2 rotations per vertex) but not meant for large dense graphs.
*/
use std::collections::BTreeSet;

use bit_set::BitSet;

use crate::graph::{Graph, VertexId};

/** a face of a planar embedding, given by its closed boundary walk.
walk[i] - walk[i+1] are edges, and so is the last vertex - first vertex.
A vertex may appear several times in the walk (cut vertices, bridges).
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    walk: Vec<VertexId>,
}

impl Face {
    /// closed boundary walk
    pub fn walk(&self) -> &[VertexId] { &self.walk }

    /// number of darts in the boundary walk
    pub fn len(&self) -> usize { self.walk.len() }

    /// true iff the walk is empty (never the case for traced faces)
    pub fn is_empty(&self) -> bool { self.walk.is_empty() }

    /// vertices on the boundary
    pub fn vertices(&self) -> BTreeSet<VertexId> {
        self.walk.iter().copied().collect()
    }

    /// edges on the boundary, each edge (u,v) with u < v
    pub fn edges(&self) -> BTreeSet<(VertexId,VertexId)> {
        let k = self.walk.len();
        (0..k).map(|i| {
            let (u,v) = (self.walk[i], self.walk[(i+1) % k]);
            (u.min(v), u.max(v))
        }).collect()
    }
}

/** planar rotation system of a graph */
#[derive(Debug, Clone)]
pub struct Embedding {
    /// labels[i]: label of the ith vertex
    labels: Vec<VertexId>,
    /// rotation[i]: neighbors (indices) of i in cyclic order
    rotation: Vec<Vec<usize>>,
}

impl Embedding {
    /// cyclic order of the neighbors of v (empty if v does not exist)
    pub fn rotation(&self, v:VertexId) -> Vec<VertexId> {
        match self.labels.binary_search(&v) {
            Err(_) => Vec::new(),
            Ok(i) => self.rotation[i].iter().map(|j| self.labels[*j]).collect(),
        }
    }

    /// faces of the embedding (isolated vertices do not bound any face)
    pub fn faces(&self) -> Vec<Face> {
        trace_faces(&self.rotation).into_iter()
            .map(|walk| Face { walk: walk.into_iter().map(|i| self.labels[i]).collect() })
            .collect()
    }
}

/// darts of the rotation system: offsets[u] + p is the dart leaving u towards rotation[u][p]
fn dart_offsets(rotation:&[Vec<usize>]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(rotation.len()+1);
    let mut total = 0;
    for l in rotation {
        offsets.push(total);
        total += l.len();
    }
    offsets.push(total);
    offsets
}

/// position[u][k]: index of rotation[u][k]'s reverse dart inside rotation[rotation[u][k]]
fn reverse_positions(rotation:&[Vec<usize>]) -> Vec<Vec<usize>> {
    rotation.iter().enumerate().map(|(u,l)| {
        l.iter().map(|v| {
            rotation[*v].iter().position(|w| *w == u).unwrap_or(0)
        }).collect()
    }).collect()
}

/// follows every dart orbit. returns the tail vertices of each face walk
fn trace_faces(rotation:&[Vec<usize>]) -> Vec<Vec<usize>> {
    let offsets = dart_offsets(rotation);
    let reverse = reverse_positions(rotation);
    let mut visited = BitSet::with_capacity(offsets[rotation.len()]);
    let mut res = Vec::new();
    for (u0,l) in rotation.iter().enumerate() {
        for p0 in 0..l.len() {
            if visited.contains(offsets[u0]+p0) { continue; }
            let mut walk = Vec::new();
            let (mut u, mut p) = (u0, p0);
            while visited.insert(offsets[u]+p) {
                walk.push(u);
                // arrive at v through (u,v), leave after u in v's rotation
                let v = rotation[u][p];
                let q = (reverse[u][p] + 1) % rotation[v].len();
                u = v;
                p = q;
            }
            res.push(walk);
        }
    }
    res
}

/// number of faces of a rotation system
fn count_faces(rotation:&[Vec<usize>]) -> usize {
    trace_faces(rotation).len()
}

/// number of connected components having at least one edge
fn nb_nontrivial_components(adj:&[Vec<usize>]) -> usize {
    let mut visited = BitSet::with_capacity(adj.len());
    let mut res = 0;
    for s in 0..adj.len() {
        if adj[s].is_empty() || visited.contains(s) { continue; }
        res += 1;
        let mut stack = vec![s];
        visited.insert(s);
        while let Some(u) = stack.pop() {
            for v in &adj[u] {
                if visited.insert(*v) { stack.push(*v); }
            }
        }
    }
    res
}

/// cyclic orders of a neighbor list (the first neighbor stays first)
fn rotations(neighbors:&[usize]) -> Vec<Vec<usize>> {
    fn permute(prefix:&mut Vec<usize>, rest:&mut Vec<usize>, res:&mut Vec<Vec<usize>>) {
        if rest.is_empty() {
            res.push(prefix.clone());
            return;
        }
        for i in 0..rest.len() {
            let x = rest.remove(i);
            prefix.push(x);
            permute(prefix, rest, res);
            prefix.pop();
            rest.insert(i, x);
        }
    }
    match neighbors.split_first() {
        None => vec![vec![]],
        Some((first, others)) => {
            let mut res = Vec::new();
            permute(&mut vec![*first], &mut others.to_vec(), &mut res);
            res
        }
    }
}

/** searches for a planar embedding of g. returns None iff g is not planar. */
pub fn planar_embedding(g:&Graph) -> Option<Embedding> {
    let (labels, adj) = g.adjacency_lists();
    let nb_edges = adj.iter().map(|l| l.len()).sum::<usize>() / 2;
    let nb_active = adj.iter().filter(|l| !l.is_empty()).count();
    if nb_active >= 3 && nb_edges > 3*nb_active - 6 { return None; }
    // Euler: F = E - V + 2C on the vertices having some edge
    let target_faces = nb_edges + 2*nb_nontrivial_components(&adj) - nb_active;
    let branching:Vec<usize> = (0..adj.len()).filter(|v| adj[*v].len() >= 3).collect();
    let choices:Vec<Vec<Vec<usize>>> = branching.iter().enumerate().map(|(k,v)| {
        let mut rots = rotations(&adj[*v]);
        // the mirror of a planar embedding is planar: fix the first cubic vertex
        if k == 0 && adj[*v].len() == 3 { rots.truncate(1); }
        rots
    }).collect();
    let mut rotation = adj;
    let mut counter = vec![0 ; branching.len()];
    loop {
        for (k,v) in branching.iter().enumerate() {
            rotation[*v].clone_from(&choices[k][counter[k]]);
        }
        if count_faces(&rotation) == target_faces {
            return Some(Embedding { labels, rotation });
        }
        // next rotation system (mixed radix counter)
        let mut k = 0;
        loop {
            if k == counter.len() { return None; }
            counter[k] += 1;
            if counter[k] < choices[k].len() { break; }
            counter[k] = 0;
            k += 1;
        }
    }
}

/// true iff g is planar
pub fn is_planar(g:&Graph) -> bool {
    planar_embedding(g).is_some()
}

/// faces of some planar embedding of g (empty if g is not planar)
pub fn faces(g:&Graph) -> Vec<Face> {
    planar_embedding(g).map_or_else(Vec::new, |e| e.faces())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn k4() -> Graph {
        Graph::from_edges(4, &[(0,1),(0,2),(0,3),(1,2),(1,3),(2,3)]).unwrap()
    }

    fn k33() -> Graph {
        Graph::from_edges(6, &[(0,3),(0,4),(0,5),(1,3),(1,4),(1,5),(2,3),(2,4),(2,5)]).unwrap()
    }

    fn petersen() -> Graph {
        Graph::from_edges(10, &[
            (0,1),(1,2),(2,3),(3,4),(4,0),
            (0,5),(1,6),(2,7),(3,8),(4,9),
            (5,7),(7,9),(9,6),(6,8),(8,5),
        ]).unwrap()
    }

    #[test]
    fn test_rotations() {
        assert_eq!(rotations(&[1,2,3]), vec![vec![1,2,3], vec![1,3,2]]);
        assert_eq!(rotations(&[1,2,3,4]).len(), 6);
        assert_eq!(rotations(&[]), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_small_planar_graphs() {
        assert!(is_planar(&Graph::new()));
        assert!(is_planar(&Graph::with_vertices(1)));
        assert!(is_planar(&Graph::cycle(3)));
        assert!(is_planar(&k4()));
        assert_eq!(faces(&k4()).len(), 4);
        assert_eq!(faces(&Graph::cycle(5)).len(), 2);
    }

    #[test]
    fn test_non_planar_graphs() {
        assert!(!is_planar(&k33()));
        assert!(!is_planar(&petersen()));
        let k5 = Graph::from_edges(5, &[
            (0,1),(0,2),(0,3),(0,4),(1,2),(1,3),(1,4),(2,3),(2,4),(3,4)
        ]).unwrap();
        assert!(!is_planar(&k5));
        assert!(faces(&k33()).is_empty());
    }

    #[test]
    fn test_tree_has_one_face() {
        let star = Graph::from_edges(4, &[(0,1),(0,2),(0,3)]).unwrap();
        let f = faces(&star);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].len(), 6); // every edge is walked twice
        assert_eq!(f[0].vertices().len(), 4);
        assert_eq!(f[0].edges().len(), 3);
    }

    #[test]
    fn test_cube_faces() {
        let cube = Graph::from_edges(8, &[
            (0,1),(1,3),(3,2),(2,0),(4,5),(5,7),(7,6),(6,4),(0,4),(1,5),(2,6),(3,7)
        ]).unwrap();
        let f = faces(&cube);
        assert_eq!(f.len(), 6);
        assert!(f.iter().all(|face| face.len() == 4 && face.vertices().len() == 4));
    }

    #[test]
    fn test_face_edges_belong_to_graph() {
        let mut g = Graph::cycle(6);
        g.add_edge(0, 3).unwrap();
        g.add_vertex(10);
        g.add_edge(10, 1).unwrap();
        let embedding = planar_embedding(&g).unwrap();
        let f = embedding.faces();
        assert_eq!(f.len(), 3);
        for face in &f {
            for (u,v) in face.edges() {
                assert!(g.has_edge(u, v));
            }
        }
        assert_eq!(embedding.rotation(10), vec![1]);
        assert_eq!(embedding.rotation(42), Vec::<VertexId>::new());
    }

    #[test]
    fn test_disconnected_planar() {
        let g = Graph::from_edges(6, &[(0,1),(1,2),(2,0),(3,4),(4,5),(5,3)]).unwrap();
        assert!(is_planar(&g));
        assert_eq!(faces(&g).len(), 4);
    }
}
