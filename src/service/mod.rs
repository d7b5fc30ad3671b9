pub mod affiliate_graph;
pub mod error;
pub mod events;
pub mod fee_split;
pub mod payment_gateway;
pub mod settlement;
pub mod stats_aggregator;
