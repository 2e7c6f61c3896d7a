//! the test_utils folder here will share utils or test components between unit
//! tests of the sampler, probe and config modules
mod manual_clock;

pub use common::*;
pub use manual_clock::*;
