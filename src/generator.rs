/*
Exhaustive graph sources.

A source enumerates every graph of a given order, in a fixed order: resuming a search replays the
enumeration and skips the graphs already processed, so two enumerations with the same parameters
must produce the same sequence.
*/
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::graph::Graph;
use crate::graph6::{from_graph6, Graph6Error};
use crate::planarity::is_planar;

/// errors of graph sources
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// the generator process could not be started or read
    #[error("unable to run {program}: {source}")]
    Io {
        /// generator program
        program: String,
        /// underlying error
        source: std::io::Error,
    },
    /// the generator exited with a failure status (its output is incomplete)
    #[error("{program} failed ({status}): {stderr}")]
    Exit {
        /// generator program
        program: String,
        /// exit status of the process
        status: ExitStatus,
        /// what the process wrote on its error output
        stderr: String,
    },
    /// the generator produced an invalid graph6 line
    #[error(transparent)]
    Graph6(#[from] Graph6Error),
    /// the source has no admissible graph of the requested order
    #[error("no planar subcubic connected graph with {0} vertices")]
    NoAdmissibleGraph(usize),
}

/// lazy, finite sequence of graphs
pub type GraphStream = Box<dyn Iterator<Item=Result<Graph, GeneratorError>>>;

/** enumerates all graphs of a given order, in a stable order. */
pub trait GraphSource {
    /// every graph with n vertices (a new enumeration from the start at each call)
    fn enumerate(&self, n:usize) -> Result<GraphStream, GeneratorError>;
}

/** runs nauty's `geng` and reads its graph6 output.

The default parameters ask for connected graphs of maximum degree 3 (`geng -q -c -D3 n`).
*/
#[derive(Debug, Clone)]
pub struct Geng {
    /// path to the geng executable
    program: PathBuf,
    /// only connected graphs (-c)
    connected: bool,
    /// maximum degree (-D)
    max_degree: Option<usize>,
}

impl Default for Geng {
    fn default() -> Self {
        Self { program: PathBuf::from("geng"), connected: true, max_degree: Some(3) }
    }
}

impl Geng {
    /// geng found at the given path, connected graphs of max degree 3
    pub fn new(program:impl Into<PathBuf>) -> Self {
        Self { program: program.into(), ..Self::default() }
    }

    /// restricts (or not) the enumeration to connected graphs
    pub fn connected(mut self, connected:bool) -> Self {
        self.connected = connected;
        self
    }

    /// restricts (or not) the enumeration to a maximum degree
    pub fn max_degree(mut self, max_degree:Option<usize>) -> Self {
        self.max_degree = max_degree;
        self
    }

    /// command line arguments for n vertices
    pub fn arguments(&self, n:usize) -> Vec<String> {
        let mut res = vec![String::from("-q")];
        if self.connected { res.push(String::from("-c")); }
        if let Some(d) = self.max_degree { res.push(format!("-D{}", d)); }
        res.push(n.to_string());
        res
    }
}

impl GraphSource for Geng {
    fn enumerate(&self, n:usize) -> Result<GraphStream, GeneratorError> {
        let program = self.program.display().to_string();
        let args = self.arguments(n);
        debug!("running {} {}", program, args.join(" "));
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GeneratorError::Io { program: program.clone(), source })?;
        let stdout = child.stdout.take().ok_or_else(|| GeneratorError::Io {
            program: program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "no standard output"),
        })?;
        Ok(Box::new(GengStream { program, child, lines: BufReader::new(stdout).lines(), finished: false }))
    }
}

/** graphs read from a running geng process.
Once the output is exhausted, a failing exit status is reported as a last item.
*/
struct GengStream {
    program: String,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    /// the exit status was checked
    finished: bool,
}

impl GengStream {
    /// waits for the process after its output ended
    fn check_exit(&mut self) -> Result<(), GeneratorError> {
        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = self.child.wait()
            .map_err(|source| GeneratorError::Io { program: self.program.clone(), source })?;
        if status.success() { return Ok(()); }
        Err(GeneratorError::Exit { program: self.program.clone(), status, stderr: stderr.trim().to_string() })
    }
}

impl Iterator for GengStream {
    type Item = Result<Graph, GeneratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished { return None; }
        loop {
            return match self.lines.next() {
                None => {
                    self.finished = true;
                    self.check_exit().err().map(Err)
                },
                Some(Err(source)) => Some(Err(GeneratorError::Io { program: self.program.clone(), source })),
                Some(Ok(line)) if line.trim().is_empty() => continue,
                Some(Ok(line)) => Some(from_graph6(&line).map_err(GeneratorError::from)),
            };
        }
    }
}

impl Drop for GengStream {
    fn drop(&mut self) {
        // the enumeration may be abandoned early (cancellation)
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/** in-memory source: a fixed list of graphs per order. */
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    /// graphs[n]: graphs with n vertices, in enumeration order
    graphs: BTreeMap<usize, Vec<Graph>>,
}

impl FixedSource {
    /// empty source
    pub fn new() -> Self { Self::default() }

    /// appends a graph to the enumeration of its order
    pub fn push(&mut self, g:Graph) {
        self.graphs.entry(g.nb_vertices()).or_default().push(g);
    }

    /// builds a source from graphs
    pub fn from_graphs(graphs:impl IntoIterator<Item=Graph>) -> Self {
        let mut res = Self::new();
        for g in graphs { res.push(g); }
        res
    }
}

impl GraphSource for FixedSource {
    fn enumerate(&self, n:usize) -> Result<GraphStream, GeneratorError> {
        let graphs = self.graphs.get(&n).cloned().unwrap_or_default();
        Ok(Box::new(graphs.into_iter().map(Ok)))
    }
}

/// true iff g can be a search candidate (connected, subcubic and planar)
pub fn is_admissible(g:&Graph) -> bool {
    g.is_connected() && g.is_subcubic() && is_planar(g)
}

/** first connected, subcubic, planar graph with n vertices of a source */
pub fn first_admissible(source:&dyn GraphSource, n:usize) -> Result<Graph, GeneratorError> {
    for g in source.enumerate(n)? {
        let g = g?;
        if is_admissible(&g) { return Ok(g); }
    }
    Err(GeneratorError::NoAdmissibleGraph(n))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geng_arguments() {
        assert_eq!(Geng::default().arguments(7), vec!["-q", "-c", "-D3", "7"]);
        let all = Geng::new("/opt/nauty/geng").connected(false).max_degree(None);
        assert_eq!(all.arguments(4), vec!["-q", "4"]);
    }

    #[test]
    fn test_missing_geng() {
        let geng = Geng::new("/nonexistent/geng");
        assert!(matches!(geng.enumerate(3), Err(GeneratorError::Io { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_failing_geng() {
        let items:Vec<_> = Geng::new("/bin/false").enumerate(5).unwrap().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(GeneratorError::Exit { status, .. }) if !status.success()));
        // an empty but successful enumeration is not an error
        assert_eq!(Geng::new("/bin/true").enumerate(5).unwrap().count(), 0);
    }

    #[test]
    fn test_fixed_source() {
        let source = FixedSource::from_graphs(vec![Graph::path(3), Graph::cycle(4), Graph::cycle(3)]);
        let three:Vec<Graph> = source.enumerate(3).unwrap().map(|g| g.unwrap()).collect();
        assert_eq!(three, vec![Graph::path(3), Graph::cycle(3)]);
        assert_eq!(source.enumerate(5).unwrap().count(), 0);
    }

    #[test]
    fn test_first_admissible() {
        let k33 = Graph::from_edges(6, &[(0,3),(0,4),(0,5),(1,3),(1,4),(1,5),(2,3),(2,4),(2,5)]).unwrap();
        let disconnected = Graph::with_vertices(6);
        let source = FixedSource::from_graphs(vec![disconnected, k33, Graph::cycle(6)]);
        assert_eq!(first_admissible(&source, 6).unwrap(), Graph::cycle(6));
        assert!(matches!(first_admissible(&source, 4), Err(GeneratorError::NoAdmissibleGraph(4))));
    }
}
