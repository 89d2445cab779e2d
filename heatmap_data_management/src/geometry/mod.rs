mod projection;
mod resample;

pub use projection::*;
pub use resample::*;
