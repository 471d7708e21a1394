/*
Isomorphism-invariant keys. The graph is copied into a petgraph graph (vertices relabeled 0..n in
increasing label order) and labeled canonically by nauty through graph_canon.
*/
use std::fmt;

use graph_canon::canon::CanonLabeling;
use petgraph::{Graph as PetGraph, Undirected};

use crate::graph::Graph;

/** key shared by exactly the graphs of an isomorphism class. */
#[derive(PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// number of vertices
    nb_vertices: usize,
    /// canonical labeling (None for the empty graph)
    labeling: Option<CanonLabeling>,
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f:&mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({} vertices)", self.nb_vertices)
    }
}

/** returns a key that is equal for two graphs iff they are isomorphic. */
pub fn canonical_fingerprint(g:&Graph) -> Fingerprint {
    let (_, adj) = g.adjacency_lists();
    let nb_vertices = adj.len();
    if nb_vertices == 0 {
        return Fingerprint { nb_vertices, labeling: None };
    }
    let mut pg:PetGraph<(), (), Undirected> = PetGraph::with_capacity(nb_vertices, g.nb_edges());
    let nodes:Vec<_> = (0..nb_vertices).map(|_| pg.add_node(())).collect();
    for (u,l) in adj.iter().enumerate() {
        for v in l.iter().filter(|v| u < **v) {
            pg.add_edge(nodes[u], nodes[*v], ());
        }
    }
    Fingerprint { nb_vertices, labeling: Some(CanonLabeling::new(&pg)) }
}
