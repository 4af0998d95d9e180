pub use crate::errors::{QueryError, QueryResult};
pub use crate::observation::{Label, Observations};

pub use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};
pub use graph_util::CascadeGraph;
pub use log::{debug, info, warn};
pub use rand::rngs::SmallRng;
pub use rand::{Rng, SeedableRng};

/// Node id in `0..graph.num_nodes()`
pub type Node = usize;
