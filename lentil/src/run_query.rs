use clap::{Args, ValueEnum};
use fnv::FnvHashSet as HashSet;
use graph_util::common_io::basename;
use graph_util::pagerank::PagerankOptions;
use graph_util::CascadeGraph;
use lentil::batch::{run_cascades, BatchConfig};
use lentil::io::{read_cascade, write_query_log};
use lentil::query_selection::{GeneratorConfig, PredictionErrorOptions, QueryMethod};
use lentil::root_sampler::RootSamplerKind;
use lentil::sample_pool::{PoolOptions, SamplingMethod};
use lentil::simulator::SimulatorOptions;
use log::info;
use rayon::ThreadPoolBuilder;
use std::time::Duration;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootArg {
    Uniform,
    Pagerank,
    TrueRoot,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[arg(
        short = 'g',
        long,
        required = true,
        help = "Graph edge list file",
        long_help = "Undirected edge list, one `u v [w]` per line. \n\
		     Lines starting with `#` are skipped; gzipped files are fine."
    )]
    graph: Box<str>,

    #[arg(
        short = 'c',
        long,
        value_delimiter = ',',
        required = true,
        num_args = 1..,
        help = "Cascade files",
        long_help = "One file per cascade, `node time observed` per line. \n\
		     time >= 0 marks an infected node and -1 an uninfected one; \n\
		     observed = 1 marks nodes known before any query. \n\
		     Example: c1.txt.gz,c2.txt.gz"
    )]
    cascades: Vec<Box<str>>,

    #[arg(
        short = 'm',
        long,
        value_enum,
        default_value = "prediction-error",
        help = "Query selection strategy"
    )]
    method: QueryMethod,

    #[arg(
        short = 'o',
        long,
        required = true,
        help = "Output directory",
        long_help = "Output directory. Each cascade writes \n\
		     `{out}/{method}/{cascade}.queries.gz` and `.probas.gz`."
    )]
    out: Box<str>,

    #[arg(short = 's', long, default_value_t = 100, help = "Number of tree samples")]
    n_samples: usize,

    #[arg(long, value_enum, default_value = "loop-erased", help = "How each tree is drawn")]
    sampling: SamplingMethod,

    #[arg(long, value_enum, default_value = "uniform", help = "Root sampler")]
    root: RootArg,

    #[arg(
        long,
        default_value_t = 1e-6,
        help = "Smoothing added to pagerank root weights"
    )]
    root_eps: f64,

    #[arg(
        long,
        default_value_t = 100,
        help = "Draws per tree sample before giving up"
    )]
    max_retries: usize,

    #[arg(
        short = 'q',
        long,
        help = "Number of queries per cascade",
        long_help = "Number of queries per cascade. \n\
		     Without it, querying goes on until every node is observed."
    )]
    n_queries: Option<usize>,

    #[arg(long, default_value_t = 0.05, help = "Pruning threshold for prediction error")]
    min_proba: f64,

    #[arg(long, default_value_t = false, help = "Score every candidate, even resolved ones")]
    no_pruning: bool,

    #[arg(
        long,
        default_value_t = 100,
        help = "Hidden nodes to evaluate prediction error against"
    )]
    n_node_samples: usize,

    #[arg(
        long,
        help = "Per-round time limit (seconds)",
        long_help = "Wall-clock limit for one query round in seconds. \n\
		     Checked before every tree redraw; a cascade \n\
		     that runs over is aborted and reported."
    )]
    round_budget: Option<f64>,

    #[arg(long, default_value_t = false, help = "Do not record infection probabilities")]
    skip_probas: bool,

    #[arg(long, default_value_t = 16, help = "Maximum number of threads")]
    max_threads: usize,

    #[arg(long, default_value_t = 42, help = "Random seed")]
    rseed: u64,
}

impl QueryArgs {
    fn batch_config(&self) -> anyhow::Result<BatchConfig> {
        let root = match self.root {
            RootArg::Uniform => RootSamplerKind::Uniform,
            RootArg::Pagerank => RootSamplerKind::Pagerank { eps: self.root_eps },
            RootArg::TrueRoot => RootSamplerKind::TrueRoot,
        };

        let round_budget = match self.round_budget {
            Some(secs) if secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => return Err(anyhow::anyhow!("invalid round budget: {}", secs)),
            None => None,
        };

        if self.n_samples == 0 {
            return Err(anyhow::anyhow!("need at least one tree sample"));
        }

        Ok(BatchConfig {
            generator: GeneratorConfig {
                method: self.method,
                pool: PoolOptions {
                    n_samples: self.n_samples,
                    method: self.sampling,
                    max_retries: self.max_retries,
                },
                root,
                prediction_error: PredictionErrorOptions {
                    prune_nodes: !self.no_pruning,
                    min_proba: self.min_proba,
                    n_node_samples: Some(self.n_node_samples),
                },
                pagerank: PagerankOptions::default(),
            },
            simulator: SimulatorOptions {
                n_queries: self.n_queries,
                record_probas: !self.skip_probas,
                round_budget,
            },
            seed: self.rseed,
        })
    }
}

/// Output names per cascade, made unique if file stems collide
fn uniq_cascade_names(files: &[Box<str>]) -> anyhow::Result<Vec<Box<str>>> {
    let names = files
        .iter()
        .map(|f| basename(f))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let n_uniq = names.iter().collect::<HashSet<_>>().len();
    Ok(if n_uniq == names.len() {
        names
    } else {
        info!("cascade file names are not unique");
        names
            .iter()
            .enumerate()
            .map(|(i, x)| format!("{}_{}", x, i).into_boxed_str())
            .collect()
    })
}

/// Run query sessions over every cascade file and write their logs
pub fn run_query(args: &QueryArgs) -> anyhow::Result<()> {
    let config = args.batch_config()?;

    let max_threads = num_cpus::get().min(args.max_threads).max(1);
    ThreadPoolBuilder::new()
        .num_threads(max_threads)
        .build_global()?;

    let graph = CascadeGraph::from_edge_list_file(&args.graph)?;

    let cascades = args
        .cascades
        .iter()
        .map(|f| read_cascade(f, Some(graph.num_nodes())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    for (file, c) in args.cascades.iter().zip(cascades.iter()) {
        if c.n_nodes() > graph.num_nodes() {
            return Err(anyhow::anyhow!(
                "{} mentions node {} but the graph has {} nodes",
                file,
                c.n_nodes() - 1,
                graph.num_nodes()
            ));
        }
    }

    let names = uniq_cascade_names(&args.cascades)?;
    let method_name = args
        .method
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_else(|| format!("{:?}", args.method));

    let outcomes = run_cascades(&graph, &cascades, &config);

    let mut n_written = 0;
    for outcome in outcomes {
        match outcome.result {
            Ok(log) => {
                let prefix = format!("{}/{}/{}", args.out, method_name, names[outcome.index]);
                write_query_log(&log, &prefix)?;
                n_written += 1;
            }
            Err(e) if e.is_round_abort() => {}
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        "wrote {} of {} query logs under {}/{}",
        n_written,
        cascades.len(),
        args.out,
        method_name
    );
    Ok(())
}
