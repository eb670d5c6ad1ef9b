mod comparator;
pub use comparator::Comparator;

mod labels;
pub use labels::{LabelMatcher, Labels, MatchOp};

mod constants;
pub use constants::LABEL_NETWORK_ID;
