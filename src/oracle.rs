use std::str::FromStr;
use std::time::{Duration, Instant};

use bit_set::BitSet;
use good_lp::{Expression, ProblemVariables, SolverModel, variable, Solution, ResolutionError};
use good_lp::solvers::highs::highs;
use thiserror::Error;
use tracing::debug;

use crate::graph::{Graph, VertexId};
use crate::greedy::greedy_packing_coloring;

/// reasons why the oracle could not produce a packing coloring number
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// the graph has no vertex
    #[error("the graph has no vertex")]
    Empty,
    /// distances are undefined between components
    #[error("the graph is disconnected")]
    Disconnected,
    /// no packing coloring fits in the modeled label range
    #[error("no packing coloring with at most {0} labels")]
    Infeasible(usize),
    /// the solver failed on the formulation
    #[error("solver failure: {0}")]
    Solver(String),
    /// the solver did not answer within the time limit
    #[error("solver did not finish within {0:?}")]
    Timeout(Duration),
}

/** computes the packing coloring number of a graph. */
pub trait PackingOracle {
    /// packing coloring number of a connected graph
    fn packing_number(&self, g:&Graph) -> Result<usize, OracleError>;
}

/** how many labels the integer program may use.

 - Diameter: diameter + 1 (small program, may be infeasible)
 - VertexCount: n (always feasible, large program)
 - Greedy: number of classes of a greedy packing coloring (always feasible)
 - DiameterThenGreedy: min(diameter + 1, greedy). If infeasible, solves again with the greedy bound
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelBound {
    /// diameter + 1
    Diameter,
    /// number of vertices
    VertexCount,
    /// number of classes used by the greedy packing coloring
    Greedy,
    /// diameter + 1 first, greedy bound if that fails
    #[default]
    DiameterThenGreedy,
}

impl FromStr for LabelBound {
    type Err = String;

    fn from_str(s:&str) -> Result<Self, Self::Err> {
        match s {
            "diameter" => Ok(Self::Diameter),
            "vertex-count" => Ok(Self::VertexCount),
            "greedy" => Ok(Self::Greedy),
            "diameter-then-greedy" => Ok(Self::DiameterThenGreedy),
            _ => Err(format!(
                "unknown label bound {} (valid: diameter, vertex-count, greedy, diameter-then-greedy)", s
            )),
        }
    }
}

/// packing coloring number together with a witness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingColoring {
    /// packing coloring number
    pub number: usize,
    /// classes[i-1]: vertices with label i (some classes may be empty)
    pub classes: Vec<Vec<VertexId>>,
}

/** integer programming oracle.

For a label bound D, x[v,i] (binary) tells if v has label i ∈ 1..=D and k is continuous:
 - ∑_i x[v,i] = 1                                   ∀ v
 - x[u,i] + x[v,i] <= 1                             ∀ i, ∀ u≠v with d(u,v) <= i
 - i.x[v,i] <= k                                    ∀ v, i
minimizing k.
*/
#[derive(Debug, Clone, Default)]
pub struct IlpOracle {
    /// label range policy
    bound: LabelBound,
    /// if set, the solver stops after this time and the solve fails with OracleError::Timeout
    time_limit: Option<Duration>,
}

impl PackingOracle for IlpOracle {
    fn packing_number(&self, g:&Graph) -> Result<usize, OracleError> {
        self.compute(g)
    }
}

impl IlpOracle {
    /// oracle with the default label bound and no time limit
    pub fn new() -> Self { Self::default() }

    /// sets the label bound policy
    pub fn with_bound(mut self, bound:LabelBound) -> Self {
        self.bound = bound;
        self
    }

    /// sets (or removes) the time limit of each solve
    pub fn with_time_limit(mut self, time_limit:Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// label bound policy
    pub fn bound(&self) -> LabelBound { self.bound }

    /// packing coloring number of a connected graph
    pub fn compute(&self, g:&Graph) -> Result<usize, OracleError> {
        self.solve(g).map(|c| c.number)
    }

    /// packing coloring number and an optimal coloring of a connected graph
    pub fn solve(&self, g:&Graph) -> Result<PackingColoring, OracleError> {
        if g.nb_vertices() == 0 { return Err(OracleError::Empty); }
        let diameter = g.diameter().ok_or(OracleError::Disconnected)?;
        match self.bound {
            LabelBound::Diameter => self.solve_with(g, diameter+1),
            LabelBound::VertexCount => self.solve_with(g, g.nb_vertices()),
            LabelBound::Greedy => self.solve_with(g, greedy_packing_coloring(g).len()),
            LabelBound::DiameterThenGreedy => {
                let safe = greedy_packing_coloring(g).len();
                if diameter+1 >= safe {
                    return self.solve_with(g, safe);
                }
                match self.solve_with(g, diameter+1) {
                    Err(OracleError::Infeasible(_)) => {
                        debug!("diameter bound {} too small, retrying with {} labels", diameter+1, safe);
                        self.solve_with(g, safe)
                    },
                    res => res,
                }
            },
        }
    }

    /// solves the program with nb_labels labels
    fn solve_with(&self, g:&Graph, nb_labels:usize) -> Result<PackingColoring, OracleError> {
        let time_start = Instant::now();
        let res = solve_program(g, nb_labels, self.time_limit);
        debug!(
            "solved packing program: {} vertices, {} labels, {:?} ({:.3} seconds)",
            g.nb_vertices(), nb_labels, res.as_ref().map(|c| c.number),
            time_start.elapsed().as_secs_f32()
        );
        res
    }
}

/** builds and solves the integer program with labels 1..=nb_labels.
The time limit is enforced by the solver: a solve that reaches it fails with OracleError::Timeout,
even if an incumbent was found.
*/
fn solve_program(g:&Graph, nb_labels:usize, time_limit:Option<Duration>) -> Result<PackingColoring, OracleError> {
    let time_start = Instant::now();
    let (labels, _) = g.adjacency_lists();
    let n = labels.len();
    let dist = g.distance_matrix();
    let mut model = ProblemVariables::new();
    // x[v][i-1]: vertex v has label i
    let x:Vec<Vec<_>> = (0..n).map(|_| {
        (0..nb_labels).map(|_| model.add(variable().binary())).collect()
    }).collect();
    let k = model.add(variable().min(0));
    let mut csts = Vec::new();
    // ∑_i x[v,i] = 1      ∀ v
    for xv in x.iter() {
        let mut cst = Expression::with_capacity(nb_labels);
        for xvi in xv { cst.add_mul(1., *xvi); }
        csts.push(cst.eq(1));
    }
    // x[u,i] + x[v,i] <= 1      ∀ u<v, d(u,v) <= i
    for u in 0..n {
        for v in u+1..n {
            let d = dist[u][v].ok_or(OracleError::Disconnected)?;
            for i in d.max(1)..=nb_labels {
                let mut cst = Expression::with_capacity(2);
                cst.add_mul(1., x[u][i-1]);
                cst.add_mul(1., x[v][i-1]);
                csts.push(cst.leq(1));
            }
        }
    }
    // k - i.x[v,i] >= 0      ∀ v, i
    for xv in x.iter() {
        for (i,xvi) in xv.iter().enumerate() {
            let mut cst = Expression::from(k);
            cst.add_mul(-((i+1) as f64), *xvi);
            csts.push(cst.geq(0));
        }
    }
    let mut problem = model.minimise(k).using(highs);
    if let Some(limit) = time_limit {
        problem = problem.set_time_limit(limit.as_secs_f64());
    }
    for cst in csts {
        problem.add_constraint(cst);
    }
    let res = problem.solve();
    if let Some(limit) = time_limit.filter(|l| time_start.elapsed() >= *l) {
        return Err(OracleError::Timeout(limit));
    }
    let sol = match res {
        Ok(sol) => sol,
        Err(ResolutionError::Infeasible) => return Err(OracleError::Infeasible(nb_labels)),
        Err(e) => return Err(OracleError::Solver(e.to_string())),
    };
    // extract the coloring
    let number = sol.value(k).round() as usize;
    let mut classes = vec![Vec::new() ; number];
    for (v,xv) in x.iter().enumerate() {
        let label = xv.iter().position(|xvi| sol.value(*xvi) >= 0.5)
            .ok_or_else(|| OracleError::Solver(format!("vertex {} has no label", labels[v])))?;
        if label >= number {
            return Err(OracleError::Solver(format!(
                "vertex {} has label {} above the objective {}", labels[v], label+1, number
            )));
        }
        classes[label].push(labels[v]);
    }
    Ok(PackingColoring { number, classes })
}

/// result of the packing coloring checker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerResult {
    /// the coloring is valid and uses labels up to the given value
    Ok(usize),
    /// a vertex of the graph has no label
    MissingVertex(VertexId),
    /// a vertex has several labels
    DuplicateVertex(VertexId),
    /// a colored vertex is not in the graph
    UnknownVertex(VertexId),
    /// two vertices of class `label` are at distance <= label
    TooClose {
        /// label of the class
        label: usize,
        /// first vertex
        u: VertexId,
        /// second vertex
        v: VertexId,
    },
}

/**
checks a packing coloring given as classes (classes[i-1]: vertices with label i).
returns the largest label of a non-empty class if the coloring is valid.
*/
pub fn checker(g:&Graph, classes:&[Vec<VertexId>]) -> CheckerResult {
    // check that all vertices are added exactly once
    let mut visited = BitSet::new();
    for c in classes {
        for v in c {
            if !g.has_vertex(*v) { return CheckerResult::UnknownVertex(*v); }
            if !visited.insert(*v) { return CheckerResult::DuplicateVertex(*v); }
        }
    }
    if let Some(v) = g.vertices().find(|v| !visited.contains(*v)) {
        return CheckerResult::MissingVertex(v);
    }
    // check distances inside each class
    for (i,c) in classes.iter().enumerate() {
        let label = i+1;
        for (a,u) in c.iter().enumerate() {
            let around = g.distances_from(*u);
            for v in &c[a+1..] {
                if matches!(around.get(v), Some(d) if *d <= label) {
                    return CheckerResult::TooClose { label, u:*u, v:*v };
                }
            }
        }
    }
    // if ok: return the largest label used
    CheckerResult::Ok(classes.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i+1))
}
