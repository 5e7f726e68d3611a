//! Evaluation of generated extractions against ground truth

pub mod batch;
pub mod matcher;
pub mod normalize;

pub use batch::{BatchEvaluator, EvalError};
pub use matcher::{find_matches, MatchPair};
pub use normalize::{
    normalize_code, normalize_numeric, normalize_unit, FieldError, NormalizedRecord, NumericField,
};
