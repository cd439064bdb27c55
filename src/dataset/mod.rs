//! Time-ordered dataset preparation: train/test splitting by trailing day
//! count and sliding-window sequence construction for the recurrent model.

pub mod sequence;
pub mod split;

pub use sequence::{boundary_sequences, create_sequences};
pub use split::{periods_per_day, time_train_test_split};
