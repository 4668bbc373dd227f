pub mod context;
pub mod eval;
pub mod limits;
pub mod ordering;
pub mod params;
pub mod pesto;
pub mod search;
pub mod see;
pub mod tt;
