use std::cmp::{Ordering, Ord};

use priority_queue::PriorityQueue;
use bit_set::BitSet;

use crate::graph::{Graph, VertexId};

/// priority of a candidate: the fewer candidates it blocks, the earlier it is taken
#[derive(PartialEq, Eq)]
struct Crowding {
    nb_close: usize,
    vertex: usize,
}

impl Ord for Crowding {
    fn cmp(&self, other: &Self) -> Ordering {
        other.nb_close.cmp(&self.nb_close)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Crowding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/** implements a greedy packing coloring, one class at a time. For i = 1, 2, ...:
    1. the candidates are the uncolored vertices
    2. choose the candidate with the fewest candidates at distance <= i (break ties by the smallest index)
    3. put it in class i, discard the candidates at distance <= i from it (they are blocked for class i)
    4. update the priorities and repeat until no candidate remains

The result is a partition: res[i-1] is the class of label i. Every class is non-empty, so the
number of classes is at most n and is a valid upper bound on the packing coloring number.
Vertices in different components never block each other.
*/
pub fn greedy_packing_coloring(g:&Graph) -> Vec<Vec<VertexId>> {
    let (labels, _) = g.adjacency_lists();
    let n = labels.len();
    let dist = g.distance_matrix();
    let close = |u:usize, v:usize, i:usize| -> bool {
        u != v && matches!(dist[u][v], Some(d) if d <= i)
    };
    let mut colored = BitSet::with_capacity(n);
    let mut res:Vec<Vec<VertexId>> = Vec::new();
    while colored.len() < n {
        let i = res.len() + 1;
        let mut candidates:PriorityQueue<usize, Crowding> = PriorityQueue::new();
        for u in (0..n).filter(|u| !colored.contains(*u)) {
            let nb_close = (0..n).filter(|v| !colored.contains(*v) && close(u, *v, i)).count();
            candidates.push(u, Crowding { nb_close, vertex:u });
        }
        let mut class = Vec::new();
        while let Some((current_vertex,_)) = candidates.pop() {
            class.push(labels[current_vertex]);
            colored.insert(current_vertex);
            let blocked:Vec<usize> = candidates.iter()
                .map(|(v,_)| *v)
                .filter(|v| close(current_vertex, *v, i))
                .collect();
            for w in blocked {
                candidates.remove(&w);
                // w is not a candidate anymore: its close candidates gain some room
                let affected:Vec<usize> = candidates.iter()
                    .map(|(v,_)| *v)
                    .filter(|v| close(w, *v, i))
                    .collect();
                for v in affected {
                    candidates.change_priority_by(&v, |p| { p.nb_close -= 1; });
                }
            }
        }
        class.sort_unstable();
        res.push(class);
    }
    res
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{checker, CheckerResult};

    #[test]
    fn test_greedy_is_valid() {
        for g in [Graph::path(7), Graph::cycle(5), Graph::cycle(8), Graph::with_vertices(1)] {
            let classes = greedy_packing_coloring(&g);
            assert_eq!(checker(&g, &classes), CheckerResult::Ok(classes.len()));
        }
    }

    #[test]
    fn test_greedy_star() {
        // leaves get label 1, the center label 2
        let star = Graph::from_edges(4, &[(0,1),(0,2),(0,3)]).unwrap();
        let classes = greedy_packing_coloring(&star);
        assert_eq!(classes, vec![vec![1,2,3], vec![0]]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(greedy_packing_coloring(&Graph::new()).is_empty());
    }
}
