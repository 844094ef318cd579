//! Contains logic for mapping between the authored tree and the flat record list.

pub mod flat_to_nested;
pub mod groups;
pub mod nested_to_flat;
pub mod normalize;
pub mod sitplan;
