use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::trace;

use crate::graph::{Graph, VertexId};
use crate::planarity::planar_embedding;

/// structural property that a graph given to the mutation engine lacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    /// the graph is not planar
    #[error("the graph is not planar")]
    NotPlanar,
    /// some vertex has degree > 3
    #[error("the graph is not subcubic")]
    NotSubcubic,
    /// the graph is not connected
    #[error("the graph is not connected")]
    Disconnected,
}

/// errors of the mutation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MutationError {
    /// the input graph is not planar, subcubic and connected
    #[error("precondition violation: {0}")]
    PreconditionViolation(Violation),
}

/// degree bound and connectivity (planarity is checked while embedding)
fn check_degree_and_connectivity(g:&Graph) -> Result<(), MutationError> {
    if !g.is_subcubic() {
        return Err(MutationError::PreconditionViolation(Violation::NotSubcubic));
    }
    if !g.is_connected() {
        return Err(MutationError::PreconditionViolation(Violation::Disconnected));
    }
    Ok(())
}

/// edge (u,v) with u < v
fn normalized(u:VertexId, v:VertexId) -> (VertexId,VertexId) { (u.min(v), u.max(v)) }

/** vertices and boundary edges of the face being edited.
Every tracked vertex stays on a common face of the (implicit) embedding: subdividing a
boundary edge keeps the new vertex on the face, and deleting a vertex only merges faces.
*/
#[derive(Debug)]
struct FaceTracker {
    vertices: BTreeSet<VertexId>,
    edges: BTreeSet<(VertexId,VertexId)>,
}

impl FaceTracker {
    /// boundary edges still present in g with both endpoints tracked
    fn subdividable_edges(&self, g:&Graph) -> Vec<(VertexId,VertexId)> {
        self.edges.iter()
            .filter(|(a,b)| g.has_edge(*a, *b))
            .filter(|(a,b)| self.vertices.contains(a) && self.vertices.contains(b))
            .copied()
            .collect()
    }

    /// (a,b) became a - s - b
    fn split(&mut self, a:VertexId, b:VertexId, s:VertexId) {
        self.edges.remove(&normalized(a, b));
        self.edges.insert(normalized(a, s));
        self.edges.insert(normalized(s, b));
        self.vertices.insert(s);
    }

    /// a - s - b became (a,b) again
    fn unsplit(&mut self, a:VertexId, b:VertexId, s:VertexId) {
        self.forget(s);
        self.edges.insert(normalized(a, b));
    }

    /// v was deleted from the graph
    fn forget(&mut self, v:VertexId) {
        self.vertices.remove(&v);
        self.edges.retain(|(x,y)| *x != v && *y != v);
    }
}

/** randomized face-local edit of planar, subcubic, connected graphs.

Each mutation keeps the number of vertices, planarity, the degree bound and connectivity:
 1. choose a face of a planar embedding uniformly at random
 2. 1 to 3 times: subdivide a boundary edge of the face, then delete a random removable
    vertex (one whose deletion keeps the graph connected). Undo the subdivision if no such vertex exists
 3. add a vertex in the face, linked to 1 to 3 face vertices of degree <= 2, then delete a
    random removable vertex (or the new vertex if no other vertex is removable)
The result is relabeled 0..n.
*/
#[derive(Debug)]
pub struct MutationEngine<R:Rng = StdRng> {
    /// random number generator
    rng: R,
}

impl MutationEngine<StdRng> {
    /// engine with a reproducible random number generator
    pub fn seeded(seed:u64) -> Self { Self::new(StdRng::seed_from_u64(seed)) }
}

impl<R:Rng> MutationEngine<R> {
    /// engine using the given random number generator
    pub fn new(rng:R) -> Self { Self { rng } }

    /** returns a mutated copy of g (same number of vertices, planar, subcubic, connected).
    fails if g is not planar, subcubic and connected. A graph without any face (at most one
    vertex) is returned unchanged.
    */
    pub fn mutate(&mut self, input:&Graph) -> Result<Graph, MutationError> {
        check_degree_and_connectivity(input)?;
        let embedding = planar_embedding(input)
            .ok_or(MutationError::PreconditionViolation(Violation::NotPlanar))?;
        let faces = embedding.faces();
        let mut g = input.clone();
        let face = match faces.choose(&mut self.rng) {
            None => return Ok(g),
            Some(f) => f,
        };
        let mut tracker = FaceTracker { vertices: face.vertices(), edges: face.edges() };
        // 1. subdivide-then-rebalance rounds
        let nb_rounds = self.rng.gen_range(1..=3);
        for _ in 0..nb_rounds {
            let (a,b) = match tracker.subdividable_edges(&g).choose(&mut self.rng) {
                None => continue,
                Some(e) => *e,
            };
            let s = g.add_fresh_vertex();
            g.remove_edge(a, b);
            g.add_edge(a, s).expect("a and s are distinct vertices");
            g.add_edge(s, b).expect("s and b are distinct vertices");
            tracker.split(a, b, s);
            match g.removable_vertices(Some(s)).choose(&mut self.rng) {
                Some(w) => {
                    trace!("subdivided ({},{}) with {}, deleted {}", a, b, s, w);
                    g.remove_vertex(*w);
                    tracker.forget(*w);
                },
                None => {
                    g.remove_vertex(s);
                    g.add_edge(a, b).expect("a and b are distinct vertices");
                    tracker.unsplit(a, b, s);
                }
            }
        }
        // 2. new vertex inside the face
        let eligible:Vec<VertexId> = tracker.vertices.iter()
            .filter(|v| g.degree(**v) <= 2)
            .copied()
            .collect();
        if !eligible.is_empty() {
            let nb_new_edges = self.rng.gen_range(1..=3).min(eligible.len());
            let targets:Vec<VertexId> = eligible
                .choose_multiple(&mut self.rng, nb_new_edges)
                .copied()
                .collect();
            let fresh = g.add_fresh_vertex();
            for t in &targets {
                g.add_edge(fresh, *t).expect("fresh is a new vertex");
            }
            match g.removable_vertices(Some(fresh)).choose(&mut self.rng) {
                Some(w) => {
                    trace!("linked {} to {:?}, deleted {}", fresh, targets, w);
                    g.remove_vertex(*w);
                },
                None => { g.remove_vertex(fresh); }
            }
        }
        Ok(g.relabeled())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::planarity::is_planar;

    fn cube() -> Graph {
        Graph::from_edges(8, &[
            (0,1),(1,3),(3,2),(2,0),(4,5),(5,7),(7,6),(6,4),(0,4),(1,5),(2,6),(3,7)
        ]).unwrap()
    }

    fn assert_invariants(before:&Graph, after:&Graph) {
        assert_eq!(after.nb_vertices(), before.nb_vertices());
        assert!(is_planar(after), "{:?}", after);
        assert!(after.max_degree() <= 3, "{:?}", after);
        assert!(after.is_connected(), "{:?}", after);
    }

    #[test]
    fn test_random_walks_keep_invariants() {
        let starts = vec![
            Graph::path(2), Graph::path(5), Graph::cycle(3), Graph::cycle(7), cube(),
            Graph::from_edges(4, &[(0,1),(0,2),(0,3)]).unwrap(),
            Graph::from_edges(4, &[(0,1),(0,2),(0,3),(1,2),(1,3),(2,3)]).unwrap(),
        ];
        for (seed, start) in starts.into_iter().enumerate() {
            let mut engine = MutationEngine::seeded(seed as u64);
            let mut g = start.clone();
            for _ in 0..200 {
                let next = engine.mutate(&g).unwrap();
                assert_invariants(&g, &next);
                g = next;
            }
        }
    }

    #[test]
    fn test_mutation_does_not_touch_input() {
        let g = cube();
        let copy = g.clone();
        let mut engine = MutationEngine::seeded(7);
        let _ = engine.mutate(&g).unwrap();
        assert_eq!(g, copy);
    }

    #[test]
    fn test_reproducible() {
        let mut e1 = MutationEngine::seeded(42);
        let mut e2 = MutationEngine::seeded(42);
        let (mut g1, mut g2) = (Graph::cycle(9), Graph::cycle(9));
        for _ in 0..20 {
            g1 = e1.mutate(&g1).unwrap();
            g2 = e2.mutate(&g2).unwrap();
        }
        assert_eq!(g1, g2);
    }

    #[test]
    fn test_walk_leaves_the_start_graph() {
        let mut engine = MutationEngine::seeded(3);
        let start = Graph::cycle(8);
        let mut g = start.clone();
        let mut changed = false;
        for _ in 0..50 {
            g = engine.mutate(&g).unwrap();
            changed |= g != start;
        }
        assert!(changed);
    }

    #[test]
    fn test_faceless_graph_unchanged() {
        let mut engine = MutationEngine::seeded(0);
        let g = Graph::with_vertices(1);
        assert_eq!(engine.mutate(&g), Ok(g));
    }

    #[test]
    fn test_preconditions() {
        let mut engine = MutationEngine::seeded(0);
        let k33 = Graph::from_edges(6, &[(0,3),(0,4),(0,5),(1,3),(1,4),(1,5),(2,3),(2,4),(2,5)]).unwrap();
        assert_eq!(
            engine.mutate(&k33),
            Err(MutationError::PreconditionViolation(Violation::NotPlanar))
        );
        let claw4 = Graph::from_edges(5, &[(0,1),(0,2),(0,3),(0,4)]).unwrap();
        assert_eq!(
            engine.mutate(&claw4),
            Err(MutationError::PreconditionViolation(Violation::NotSubcubic))
        );
        assert_eq!(
            engine.mutate(&Graph::with_vertices(2)),
            Err(MutationError::PreconditionViolation(Violation::Disconnected))
        );
    }
}
