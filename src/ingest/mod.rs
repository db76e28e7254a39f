mod accumulator;
mod inserter;
mod pipeline;

pub use pipeline::{ImportStats, Importer};
