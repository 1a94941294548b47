pub mod binance;
pub mod lifecycle;
pub mod orchestrator;

pub use binance::BinanceClient;
pub use lifecycle::{Scanner, ScannerHandle};
pub use orchestrator::{evaluate_series, Orchestrator};
