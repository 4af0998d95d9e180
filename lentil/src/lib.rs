pub mod batch; // parallel query sessions over many cascades
pub mod common;
pub mod errors;
pub mod inference; // tree inference for one cascade
pub mod io; // cascade files and query log artifacts
pub mod observation;
pub mod query_selection; // query strategies
pub mod root_sampler;
pub mod sample_pool; // incrementally updated tree samples
pub mod simulator;
pub mod tree_stat; // membership matrix and query scores
