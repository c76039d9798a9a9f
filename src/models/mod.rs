pub mod cev;
pub mod gbm;
pub mod model;

pub use cev::Cev;
pub use gbm::Gbm;
pub use model::{Process, ProcessParams, SDEModel};
