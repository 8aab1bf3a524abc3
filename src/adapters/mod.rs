pub mod kraken_graphql;
pub mod kraken_replay;
pub mod output_file;
