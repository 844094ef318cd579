//! Site-plan layer transforms.
//!
//! The authored form lists layers as `{ref: A.1, pos: [x, y]}` markers or
//! `{image: plan.png, pos, size}` pictures. The container form stores each as
//! a fully populated [`SitePlanElement`](crate::ir::sitplan::SitePlanElement)
//! with pictures embedded as base64 inside a tiny SVG wrapper.
//!
//! - [`forward`]: authored layers → container elements
//! - [`inverse`]: container elements → authored layers
//! - [`media`]: embedding and extracting the raster payload

pub mod forward;
pub mod inverse;
pub mod media;
