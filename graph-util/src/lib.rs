pub mod cascade_graph; // graph with isolatable nodes
pub mod common_io; // gzip-aware line IO
pub mod pagerank; // personalized pagerank by power iteration
pub mod spanning_tree; // Wilson's loop-erased random walks
pub mod traversal; // BFS helpers and Steiner tree extraction

pub use cascade_graph::CascadeGraph;
