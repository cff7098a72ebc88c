pub mod config;
pub mod descriptor;
pub mod error;
pub mod job;
pub mod schedule;

pub use config::{load_dotenv, JobSet};
pub use descriptor::{Descriptor, DescriptorTrigger};
pub use error::*;
pub use job::{JobDescriptor, TriggerSource};
pub use schedule::ScheduleExpression;
