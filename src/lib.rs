//! # SemPipe
//!
//! A declarative publishing pipeline. Resources, their representations and
//! the hosted spaces they are served from are described in a graph
//! configuration written in Turtle; the build turns every resource into one
//! file per representation in a build directory, together with the
//! content-negotiation files a web server needs to choose between them.
//! Publishing hands each hosted space to a configured external command.
//!
//! # Pipeline
//!
//! ```text
//! 1. Load      sempipeconf.n3 + imports  →  ConfGraph, data Dataset
//! 2. Build     ConfGraph                 →  build/ (representations, type-maps, .htaccess)
//! 3. Publish   hosted spaces             →  external upload commands
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`graph`] | Terms, triples, named graphs, union queries, Turtle parser and serializers |
//! | [`vocab`] | IRIs of the `semp:` vocabulary and the RDF terms used |
//! | [`update`] | `INSERT DATA` / `DELETE DATA` instructions against the data graph |
//! | [`loader`] | Configuration import traversal and data loading |
//! | [`store`] | Optional JSON snapshot of loaded documents |
//! | [`project`] | A loaded project: configuration, data, build directory, spaces |
//! | [`space`] | Hosted spaces: URI ↔ build path mapping |
//! | [`content_type`] | File extensions from configured content types |
//! | [`resource`] | Typed view of resources and representations |
//! | [`render`] | Rendering subjects to XML, transformation steps |
//! | [`builder`] | Per-resource build dispatch, parallel builds |
//! | [`plan`] | Shell-level build instructions attached to resources |
//! | [`negotiation`] | Type-maps and access-control files |
//! | [`publish`] | Publish methods, variable prompting, command invocation |
//! | [`exec`] | External command builder |
//! | [`config`] | `sempipe.toml` tool settings |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Configuration As A Union Of Documents
//!
//! Every loaded configuration document stays a separate immutable graph; the
//! configuration is queried as their union. Loading follows `semp:confGraph`
//! links with a worklist and the set of loaded documents, so cycles and
//! repeated imports are harmless and loading twice changes nothing.
//!
//! ## Collaborators Behind Traits
//!
//! Fetching documents ([`loader::Fetcher`]), rendering
//! ([`render::Renderer`]), transformation steps ([`render::Transformer`]),
//! prompting ([`publish::Prompter`]) and running publish commands
//! ([`publish::CommandRunner`]) are traits. The CLI wires in the file
//! system, `xsltproc` and the terminal; tests use in-memory mocks.
//!
//! ## Extensions From The Graph Only
//!
//! There is no built-in content-type table. Each content type used by a
//! representation needs exactly one `semp:defaultExtension`; none or several
//! is a configuration error.
//!
//! ## Parallel Builds
//!
//! Resources are built in parallel on a rayon pool. Every resource's
//! destinations are laid out before any file is written; resources that
//! would write the same path fail together, so the remaining builds never
//! contend for a file. Access-control files span resources and are written
//! once all builds are done. A failing representation fails its resource,
//! and the build carries on with the others.

pub mod builder;
pub mod config;
pub mod content_type;
pub mod exec;
pub mod graph;
pub mod loader;
pub mod negotiation;
pub mod output;
pub mod plan;
pub mod project;
pub mod publish;
pub mod render;
pub mod resource;
pub mod space;
pub mod store;
pub mod update;
pub mod vocab;

#[cfg(test)]
pub(crate) mod test_helpers;
