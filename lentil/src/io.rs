//! Cascade input and query log artifacts.
//!
//! A query log is stored as two gzip-aware text files next to each other:
//!
//! * `{prefix}.queries.gz` - one queried node id per line
//! * `{prefix}.probas.gz` - one line per round: the round index followed
//!   by the probability of every node, tab-separated
//!
//! Floats are written with their shortest exact representation, so
//! reading a log back gives the same values.

use crate::common::*;
use crate::observation::Cascade;
use crate::simulator::QueryLog;
use graph_util::common_io::{mkdir, open_buf_writer, parse_word, read_lines_of_words, write_types};
use std::io::Write;

pub fn queries_file(prefix: &str) -> String {
    format!("{}.queries.gz", prefix)
}

pub fn probas_file(prefix: &str) -> String {
    format!("{}.probas.gz", prefix)
}

///
/// Write both halves of a query log.
///
/// * `log` - queries and per-round probabilities
/// * `prefix` - output path without extension
///
pub fn write_query_log(log: &QueryLog, prefix: &str) -> anyhow::Result<()> {
    mkdir(prefix)?;

    write_types(&log.queries, &queries_file(prefix))?;

    let mut buf = open_buf_writer(&probas_file(prefix))?;
    for (round, probas) in log.probas.iter().enumerate() {
        write!(buf, "{}", round)?;
        for p in probas {
            write!(buf, "\t{}", p)?;
        }
        writeln!(buf)?;
    }
    buf.flush()?;

    info!(
        "wrote {} queries and {} probability vectors to {}.*",
        log.queries.len(),
        log.probas.len(),
        prefix
    );
    Ok(())
}

/// Read a query log written by `write_query_log`
pub fn read_query_log(prefix: &str) -> anyhow::Result<QueryLog> {
    let queries = read_lines_of_words(&queries_file(prefix))?
        .iter()
        .map(|words| parse_word::<Node>(&words[0]))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut probas = vec![];
    for (expected, words) in read_lines_of_words(&probas_file(prefix))?.iter().enumerate() {
        let round: usize = parse_word(&words[0])?;
        if round != expected {
            return Err(anyhow::anyhow!(
                "round {} found where {} was expected",
                round,
                expected
            ));
        }
        let row = words[1..]
            .iter()
            .map(|w| parse_word::<f64>(w))
            .collect::<anyhow::Result<Vec<_>>>()?;
        probas.push(row);
    }

    Ok(QueryLog { queries, probas })
}

///
/// Read a cascade: `node time observed` per line.
///
/// `time >= 0` marks an infected node, `-1` an uninfected one; `observed`
/// is `1` for nodes whose label is known before any query. Nodes not
/// listed are uninfected. The result is padded to `n_nodes` if given.
///
pub fn read_cascade(input_file: &str, n_nodes: Option<usize>) -> anyhow::Result<Cascade> {
    let lines = read_lines_of_words(input_file)?;

    let mut rows = Vec::with_capacity(lines.len());
    let mut max_id = 0;
    for words in lines.iter() {
        if words.len() < 3 {
            return Err(anyhow::anyhow!(
                "{}: expected `node time observed`, found: {}",
                input_file,
                words.join(" ")
            ));
        }
        let v: Node = parse_word(&words[0])?;
        let t: i64 = parse_word(&words[1])?;
        let observed = parse_word::<u8>(&words[2])? != 0;
        max_id = max_id.max(v);
        rows.push((v, t, observed));
    }

    let n = n_nodes.unwrap_or(0).max(if rows.is_empty() { 0 } else { max_id + 1 });
    let mut times = vec![-1_i64; n];
    let mut observed = vec![];
    for (v, t, obs) in rows {
        times[v] = if t >= 0 { t } else { -1 };
        if obs {
            observed.push(v);
        }
    }

    let cascade = Cascade::new(times, observed);
    info!(
        "{}: {} nodes, {} infected, {} observed",
        input_file,
        cascade.n_nodes(),
        cascade.infected_nodes().len(),
        cascade.observed().len()
    );
    Ok(cascade)
}
