//! Search for planar subcubic graphs with a large packing coloring number

// #![warn(clippy::all, clippy::pedantic)]
// useful additional warnings if docs are missing, or crates imported but unused, etc.
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unsafe_code)]
#![warn(unused_extern_crates)]
#![warn(variant_size_differences)]

// not sure if already by default in clippy
#![warn(clippy::similar_names)]
#![warn(clippy::shadow_unrelated)]
#![warn(clippy::shadow_same)]
#![warn(clippy::shadow_reuse)]


/// undirected simple graphs, distances and connectivity
pub mod graph;

/// read/write graph6 strings
pub mod graph6;

/// planarity test and faces of a planar embedding
pub mod planarity;

/// isomorphism-invariant fingerprint of a graph
pub mod canonical;

/// exhaustive graph sources (nauty's geng, in-memory lists)
pub mod generator;

/// greedy packing coloring (upper bound on the packing coloring number)
pub mod greedy;

/// exact packing coloring number (integer programming) and checker
pub mod oracle;

/// face-local random mutations of planar subcubic connected graphs
pub mod mutation;

/// persistence of the search state
pub mod checkpoint;

/// exhaustive search and random walk
pub mod search;

/// helper and utility methods for executables
pub mod util;
