mod controller;
mod driver;
mod loop_worker;
mod sampler;

pub use controller::SensingController;
pub use driver::PollingDriver;
pub use loop_worker::polling_loop;
pub use sampler::{AppleScriptSampler, FrontmostSampler, FrontmostWindow};
