pub mod decay;
pub mod forgiveness;
pub mod recalc;

pub use decay::DecayPolicy;
pub use forgiveness::select_forgivable;
pub use recalc::{RecalcOutcome, ScoreRecalculator};
