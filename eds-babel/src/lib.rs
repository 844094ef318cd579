//! Conversion between authored installation trees and EDS containers
//!
//!     This crate translates between two representations of an electrical installation: the
//!     nested element tree people write (YAML, with shorthand forms) and the flat, id-indexed
//!     record list stored inside an EDS container.
//!
//!     TLDR: For format authors:
//!         - Every format meets in the flat model (./ir/flat.rs). A format parses into a
//!           FlatDocument and serializes from one, nothing else.
//!         - The tree <-> flat mapping lives in ./common and is shared; formats never walk trees
//!           on their own.
//!         - Unit tests go next to the code, cross-module behaviour goes in tests/.
//!
//! Architecture
//!
//!     The authored side is normalized first: every shorthand collapses into a CanonicalNode
//!     (./common/normalize.rs). The flattener then walks the canonical tree in pre-order and
//!     emits records; the unflattener rebuilds the tree from parent links. Both derive the same
//!     group letters and cross-references, so a site-plan layer can name an element as `A.1`
//!     in YAML and as a record id in the container.
//!
//!     This is a pure lib, that is, it powers eds-cli but is shell agnostic: no code here
//!     prints, reads environment variables or exits. Recoverable problems are logged through
//!     the `log` facade; everything else is an EdsError.
//!
//!     The file structure :
//!     .
//!     ├── codec.rs                # EDS container bytes <-> JSON payload
//!     ├── error.rs
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── publish.rs              # file loading and writing around the registry
//!     ├── schema.rs               # per-type default properties
//!     ├── transforms.rs           # inspect views
//!     ├── formats
//!     │   ├── <format>
//!     │   │   ├── parser.rs
//!     │   │   ├── serializer.rs
//!     │   │   └── mod.rs
//!     ├── ir                      # authored and flat data model
//!     ├── common                  # tree <-> flat mapping, site-plan layers
//!
//! Testing
//!     tests
//!     ├── lib.rs                  # pulls in the modules below
//!     ├── <area>.rs
//!     └── fixtures
//!
//! Core Algorithms
//!
//!     The most involved part is keeping the two directions consistent: ids are assigned in
//!     pre-order, children of a grouping node are numbered in order, and property values equal
//!     to a type default are dropped on the way out and re-applied on the way in. See
//!     ./common/nested_to_flat.rs and ./common/flat_to_nested.rs.
//!
//!     The invariant both sides keep is that a second round trip changes nothing:
//!     flatten(unflatten(flatten(tree))) == flatten(tree).
//!
pub mod codec;
pub mod error;
pub mod format;
pub mod formats;
pub mod publish;
pub mod registry;
pub mod schema;
pub mod transforms;

pub mod common;
pub mod ir;

pub use error::EdsError;
pub use format::Format;
pub use ir::flat::{FlatDocument, FlatRecord};
pub use registry::FormatRegistry;
pub use schema::TypeDefaults;
