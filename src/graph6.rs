use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while_m_n};
use nom::combinator::{map, opt};
use nom::sequence::preceded;
use thiserror::Error;

use crate::graph::Graph;

/// errors while decoding graph6 strings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Graph6Error {
    /// the string does not follow the graph6 grammar
    #[error("invalid graph6 string {0:?}")]
    Syntax(String),
    /// the adjacency part does not match the announced order
    #[error("graph6 adjacency of length {actual} (expected {expected} for the given order)")]
    Length {
        /// number of adjacency characters required by the order
        expected: usize,
        /// number of adjacency characters read
        actual: usize,
    },
}

/// graph6 printable characters (63..=126)
fn is_graph6_char(c:char) -> bool { ('?'..='~').contains(&c) }

/// value of a 6-bit group
fn sixbits(c:char) -> usize { c as usize - 63 }

/// optional ">>graph6<<" header
fn read_header(s:&str) -> IResult<&str, Option<&str>> {
    opt(tag(">>graph6<<"))(s)
}

/// reads the order n (only the 1 and 4 bytes forms, that is n <= 258047)
fn read_order(s:&str) -> IResult<&str, usize> {
    alt((
        map(
            preceded(tag("~"), take_while_m_n(3, 3, is_graph6_char)),
            |d:&str| d.chars().fold(0, |acc,c| (acc << 6) | sixbits(c))
        ),
        map(
            take_while_m_n(1, 1, |c:char| ('?'..='}').contains(&c)),
            |d:&str| d.chars().map(sixbits).sum()
        ),
    ))(s)
}

/// reads the packed upper triangle of the adjacency matrix
fn read_adjacency(s:&str) -> IResult<&str, &str> {
    take_while(is_graph6_char)(s)
}

/// number of characters needed to store the upper triangle of an n×n matrix
fn adjacency_len(n:usize) -> usize {
    let nb_bits = n * n.saturating_sub(1) / 2;
    (nb_bits + 5) / 6
}

/** decodes a single graph6 line (vertices are labeled 0..n) */
pub fn from_graph6(line:&str) -> Result<Graph, Graph6Error> {
    let syntax = || Graph6Error::Syntax(line.to_string());
    let trimmed = line.trim();
    let (s1,_) = read_header(trimmed).map_err(|_| syntax())?;
    let (s2,n) = read_order(s1).map_err(|_| syntax())?;
    let (s3,bytes) = read_adjacency(s2).map_err(|_| syntax())?;
    if !s3.is_empty() { return Err(syntax()); }
    let expected = adjacency_len(n);
    if bytes.len() != expected {
        return Err(Graph6Error::Length { expected, actual: bytes.len() });
    }
    let bits:Vec<bool> = bytes.chars()
        .flat_map(|c| {
            let x = sixbits(c);
            (0..6).rev().map(move |k| (x >> k) & 1 == 1)
        })
        .collect();
    let mut edges = Vec::new();
    let mut k = 0;
    for j in 1..n {
        for i in 0..j {
            if bits[k] { edges.push((i,j)); }
            k += 1;
        }
    }
    Graph::from_edges(n, &edges).map_err(|_| syntax())
}

/** encodes a graph in graph6. Vertices are taken in increasing label order. */
pub fn to_graph6(g:&Graph) -> String {
    let (_, adjacency) = g.adjacency_lists();
    let n = adjacency.len();
    let mut res = String::with_capacity(4 + adjacency_len(n));
    if n <= 62 {
        res.push((n as u8 + 63) as char);
    } else {
        res.push('~');
        for k in (0..3).rev() {
            res.push((((n >> (6*k)) & 63) as u8 + 63) as char);
        }
    }
    let mut bits = Vec::with_capacity(n*n/2);
    for j in 1..n {
        for i in 0..j {
            bits.push(adjacency[j].contains(&i));
        }
    }
    for chunk in bits.chunks(6) {
        let mut x = 0u8;
        for k in 0..6 {
            x <<= 1;
            if chunk.get(k).copied().unwrap_or(false) { x |= 1; }
        }
        res.push((x + 63) as char);
    }
    res
}

/// reads every non-empty line of a graph6 text
pub fn read_graph6_lines(content:&str) -> Result<Vec<Graph>, Graph6Error> {
    content.lines()
        .filter(|l| !l.trim().is_empty())
        .map(from_graph6)
        .collect()
}
