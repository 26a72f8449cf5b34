mod alert;
mod sentiment;
mod transcript;
mod trend;

pub use alert::*;
pub use sentiment::*;
pub use transcript::*;
pub use trend::*;
