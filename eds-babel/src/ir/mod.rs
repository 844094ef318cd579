//! Data model shared by every conversion direction.
//!
//! Two representations of the same installation live here:
//!
//! - the authored side ([`authoring`], [`nodes`]): a nested tree of elements as
//!   people write it, with shorthand forms collapsed into [`nodes::CanonicalNode`]
//! - the persisted side ([`flat`], [`sitplan`]): the id-indexed record list and
//!   site-plan overlay stored inside an EDS container

pub mod authoring;
pub mod flat;
pub mod nodes;
pub mod sitplan;
