mod domain;
pub use domain::LABEL_NETWORK_ID;
pub use domain::{Comparator, LabelMatcher, Labels, MatchOp};

mod duration;
pub use duration::{Duration, MostSignificantTime, TimeUnit, format_duration};

mod error;
pub use error::{ModelError, ModelResult};

mod threshold;
pub use threshold::{DEFAULT_THRESHOLD, ThresholdExpression};
