use crate::parser::SettlementParser;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Reconcile processor settlement files against internal records
#[derive(Parser, Debug)]
#[command(name = "settlement-recon")]
#[command(about = "Reconcile processor settlement files against internal records", long_about = None)]
pub struct CliArgs {
    /// Local root directory holding the feed directories
    #[arg(value_name = "ROOT", help = "Directory containing the per-feed settlement folders")]
    pub root: PathBuf,

    /// Which settlement feed to sweep
    #[arg(
        long = "feed",
        value_name = "FEED",
        default_value = "all",
        help = "Feed to sweep: 'all' or one of the configured feeds"
    )]
    pub feed: FeedArg,

    /// Concurrent dedup lookups during file selection
    #[arg(
        long = "fan-out",
        value_name = "COUNT",
        default_value_t = 4,
        help = "Concurrent registry lookups during file selection (minimum 1)"
    )]
    pub fan_out: usize,
}

/// Feed selection for one run
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeedArg {
    All,
    LegacyChargebacks,
    Chargebacks,
    Transactions,
    Risepay,
}

impl CliArgs {
    /// Feeds this run should sweep, in sweep order
    pub fn feeds(&self) -> Vec<SettlementParser> {
        match self.feed {
            FeedArg::All => SettlementParser::all().to_vec(),
            FeedArg::LegacyChargebacks => vec![SettlementParser::LegacyChargebacks],
            FeedArg::Chargebacks => vec![SettlementParser::Chargebacks],
            FeedArg::Transactions => vec![SettlementParser::Transactions],
            FeedArg::Risepay => vec![SettlementParser::Risepay],
        }
    }
}
