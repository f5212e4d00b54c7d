pub mod blocks;
pub mod fact_relationships;
pub mod facts;
pub mod lexicon;
pub mod synapses;
