pub mod candle;
pub mod config;
pub mod indicators;
pub mod regime;
pub mod series;
pub mod signals;

pub use candle::{classify, close_position};
pub use config::ScannerFileConfig;
pub use indicators::Overlay;
pub use regime::detect_regime;
pub use signals::{
    evaluate, support_resistance, BuySignal, Levels, SignalInputs, SignalParams, Signals,
};
