//! Resource builds.
//!
//! Building a resource writes one file per representation into the build
//! directory, then its type-map. Each representation is dispatched on its
//! build command:
//!
//! | Command | Output |
//! |---------|--------|
//! | `semp:Raw` | the source file's bytes, unchanged |
//! | `semp:Render` | the rendered subject, passed through each transformation step |
//! | `semp:Serialize` | the data graph named by the resource (Turtle or N-Triples) |
//!
//! A failing representation aborts its resource. [`Builder::build_all`]
//! lays out every resource's destinations first and fails the resources
//! that would write the same file, so the parallel builds that follow never
//! share a path. Failures are reported and the remaining resources carry
//! on; access-control files are written once all resource builds are done.

use crate::content_type::{self, ExtensionError};
use crate::graph::{Dataset, Graph, GraphUnion, serialize};
use crate::loader::ConfGraph;
use crate::negotiation::{self, TypeMapEntry};
use crate::render::{RenderError, Renderer, Transformer};
use crate::resource::{self, BuildCommand, Representation, Resource, ResourceError};
use crate::space::{ResolutionError, SpaceTable};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("{resource}: representation {representation}: {source}")]
    Extension {
        resource: String,
        representation: String,
        source: ExtensionError,
    },
    #[error("{resource}: representation {representation} has no content type")]
    Negotiation {
        resource: String,
        representation: String,
    },
    #[error("{resource}: representation {representation}: {message}")]
    Source {
        resource: String,
        representation: String,
        message: String,
    },
    #[error("{resource}: representation {representation}: {source}")]
    Render {
        resource: String,
        representation: String,
        source: RenderError,
    },
    #[error("{resource}: {path} is also written by {other}")]
    Collision {
        path: String,
        resource: String,
        other: String,
    },
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Progress of a build run, streamed to the caller.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    ResourceStarted {
        uri: String,
        representations: usize,
    },
    RepresentationBuilt {
        resource: String,
        path: String,
        command: BuildCommand,
    },
    TypeMapWritten {
        resource: String,
        path: String,
    },
    ResourceFailed {
        uri: String,
        error: String,
    },
    AccessControlWritten {
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltFile {
    pub path: String,
    pub command: BuildCommand,
}

/// Outcome of one successful resource build.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceReport {
    pub uri: String,
    pub files: Vec<BuiltFile>,
    pub typemap: Option<String>,
}

/// Outcome of a whole build run.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub built: Vec<ResourceReport>,
    pub failed: Vec<(String, BuildError)>,
    pub access_control: Vec<String>,
}

impl BuildSummary {
    pub fn file_count(&self) -> usize {
        self.built.iter().map(|r| r.files.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Everything a build needs from the project, borrowed for the duration of
/// the build.
pub struct Builder<'a> {
    pub conf: &'a ConfGraph,
    pub data: &'a Dataset,
    pub spaces: &'a SpaceTable,
    pub renderer: &'a dyn Renderer,
    pub transformer: &'a dyn Transformer,
}

/// Where each file of a resource goes, settled before anything is written.
struct Layout {
    resource: Resource,
    /// One per representation, in the same order.
    destinations: Vec<Destination>,
    typemap: Option<String>,
}

struct Destination {
    content_type: String,
    location: String,
}

impl Layout {
    fn locations(&self) -> impl Iterator<Item = &str> {
        self.destinations
            .iter()
            .map(|d| d.location.as_str())
            .chain(self.typemap.as_deref())
    }
}

impl Builder<'_> {
    /// Build every `semp:Resource` in parallel on the current rayon pool.
    ///
    /// All destinations are laid out first. Resources that would write the
    /// same file fail with [`BuildError::Collision`] and write nothing.
    pub fn build_all(&self, events: Option<Sender<BuildEvent>>) -> BuildSummary {
        let emit = |event: BuildEvent| {
            if let Some(tx) = &events {
                let _ = tx.send(event);
            }
        };

        let mut layouts: Vec<(String, Result<Layout, BuildError>)> =
            resource::resources(self.conf)
                .into_par_iter()
                .map(|uri| {
                    let layout = self.layout(&uri);
                    (uri, layout)
                })
                .collect();
        reject_collisions(&mut layouts);

        let results: Vec<(String, Result<ResourceReport, BuildError>)> = layouts
            .into_par_iter()
            .map(|(uri, layout)| {
                let result = layout.and_then(|layout| self.build_layout(layout, &emit));
                if let Err(e) = &result {
                    emit(BuildEvent::ResourceFailed {
                        uri: uri.clone(),
                        error: e.to_string(),
                    });
                }
                (uri, result)
            })
            .collect();

        let mut summary = BuildSummary::default();
        for (uri, result) in results {
            match result {
                Ok(report) => summary.built.push(report),
                Err(e) => summary.failed.push((uri, e)),
            }
        }

        let typemaps: Vec<String> = summary
            .built
            .iter()
            .filter_map(|r| r.typemap.clone())
            .collect();
        match negotiation::write_access_control(self.spaces, &typemaps) {
            Ok(written) => {
                for path in &written {
                    emit(BuildEvent::AccessControlWritten { path: path.clone() });
                }
                summary.access_control = written;
            }
            Err(source) => summary.failed.push((
                self.spaces.build_dir().to_string(),
                BuildError::Io {
                    path: self.spaces.build_dir().to_string(),
                    source,
                },
            )),
        }
        summary
    }

    /// Build a single resource: all representations, then its type-map.
    pub fn build_resource(&self, uri: &str) -> Result<ResourceReport, BuildError> {
        let layout = self.layout(uri)?;
        self.build_layout(layout, &|_| {})
    }

    fn layout(&self, uri: &str) -> Result<Layout, BuildError> {
        let resource = Resource::read(self.conf, uri)?;
        let space = self.spaces.resolve(uri)?;
        let base = self.spaces.build_location(uri)?;

        let destinations = resource
            .representations
            .iter()
            .map(|rep| {
                let content_type =
                    rep.content_type.clone().ok_or_else(|| BuildError::Negotiation {
                        resource: uri.to_string(),
                        representation: rep.label(),
                    })?;
                let ext = content_type::extension_for(
                    self.conf,
                    Some(&content_type),
                    rep.language.as_deref(),
                )
                .map_err(|source| BuildError::Extension {
                    resource: uri.to_string(),
                    representation: rep.label(),
                    source,
                })?;
                Ok(Destination {
                    location: space.content_location(&base, &ext),
                    content_type,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        let typemap = resource
            .has_quality()
            .then(|| space.content_location(&base, ""));

        Ok(Layout {
            resource,
            destinations,
            typemap,
        })
    }

    fn build_layout(
        &self,
        layout: Layout,
        emit: &(dyn Fn(BuildEvent) + Sync),
    ) -> Result<ResourceReport, BuildError> {
        let Layout {
            resource,
            destinations,
            typemap,
        } = layout;
        let uri = resource.uri.as_str();
        emit(BuildEvent::ResourceStarted {
            uri: uri.to_string(),
            representations: resource.representations.len(),
        });

        let mut files = Vec::new();
        let mut entries = Vec::new();
        for (rep, Destination { content_type, location }) in
            resource.representations.iter().zip(destinations)
        {
            let command = resource.build_command(rep)?;
            let bytes = match command {
                BuildCommand::Raw => self.raw(&resource, rep)?,
                BuildCommand::Render => self.render(&resource, rep)?,
                BuildCommand::Serialize => self.serialize(&resource, &content_type),
            };
            write_file(&location, &bytes)?;

            emit(BuildEvent::RepresentationBuilt {
                resource: uri.to_string(),
                path: location.clone(),
                command,
            });
            entries.push(TypeMapEntry {
                path: location.clone(),
                content_type,
                language: rep.language.clone(),
                quality: rep.quality,
            });
            files.push(BuiltFile {
                path: location,
                command,
            });
        }

        if let Some(location) = &typemap {
            write_file(location, negotiation::typemap(location, &entries).as_bytes())?;
            emit(BuildEvent::TypeMapWritten {
                resource: uri.to_string(),
                path: location.clone(),
            });
        }

        Ok(ResourceReport {
            uri: uri.to_string(),
            files,
            typemap,
        })
    }

    fn raw(&self, resource: &Resource, rep: &Representation) -> Result<Vec<u8>, BuildError> {
        let source_error = |message: String| BuildError::Source {
            resource: resource.uri.clone(),
            representation: rep.label(),
            message,
        };
        let source = resource
            .source_for(rep)
            .ok_or_else(|| source_error("raw representation without semp:source".into()))?;
        let path = source
            .as_iri()
            .and_then(|iri| Url::parse(iri).ok())
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .ok_or_else(|| source_error(format!("source {source} is not a local file")))?;
        std::fs::read(&path)
            .map_err(|e| source_error(format!("cannot read source {}: {e}", path.display())))
    }

    fn render(&self, resource: &Resource, rep: &Representation) -> Result<Vec<u8>, BuildError> {
        let render_error = |source: RenderError| BuildError::Render {
            resource: resource.uri.clone(),
            representation: rep.label(),
            source,
        };
        let graph = GraphUnion::new(self.conf.graphs().chain(self.data.graphs()).collect());
        let mut document = self
            .renderer
            .render(&resource.render_subject(), &graph)
            .map_err(render_error)?;
        for step in &rep.transformations {
            document = self
                .transformer
                .transform(&document, step)
                .map_err(render_error)?;
        }
        Ok(document.into_bytes())
    }

    /// The graph named by the resource, from data graphs and configuration
    /// documents alike; empty when neither has one.
    fn serialize(&self, resource: &Resource, content_type: &str) -> Vec<u8> {
        let mut graph = Graph::new(resource.uri.as_str());
        for named in self
            .conf
            .graphs()
            .chain(self.data.graph(&resource.uri))
            .filter(|g| g.name() == resource.uri)
        {
            graph.extend(named);
        }
        let text = match content_type {
            "text/turtle" | "text/n3" => serialize::to_turtle(&graph),
            _ => serialize::to_ntriples(&graph),
        };
        text.into_bytes()
    }
}

/// Fail every laid-out resource that shares a destination with another one.
fn reject_collisions(layouts: &mut [(String, Result<Layout, BuildError>)]) {
    let mut owners: HashMap<String, BTreeSet<String>> = HashMap::new();
    for (uri, layout) in layouts.iter() {
        if let Ok(layout) = layout {
            for location in layout.locations() {
                owners
                    .entry(location.to_string())
                    .or_default()
                    .insert(uri.clone());
            }
        }
    }

    for (uri, layout) in layouts.iter_mut() {
        let Ok(planned) = &*layout else { continue };
        let clash = planned.locations().find_map(|location| {
            owners[location]
                .iter()
                .find(|other| other.as_str() != uri.as_str())
                .map(|other| (location.to_string(), other.clone()))
        });
        if let Some((path, other)) = clash {
            *layout = Err(BuildError::Collision {
                path,
                resource: uri.clone(),
                other,
            });
        }
    }
}

fn write_file(location: &str, bytes: &[u8]) -> Result<(), BuildError> {
    let io_error = |source| BuildError::Io {
        path: location.to_string(),
        source,
    };
    let path = Path::new(location);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, bytes).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Term, turtle};
    use crate::render::DescriptionRenderer;
    use crate::render::tests::MockTransformer;
    use crate::space::HostedSpace;
    use std::fs;
    use tempfile::TempDir;

    const SITE: &str = "http://example.org/";

    struct Fixture {
        tmp: TempDir,
        conf: ConfGraph,
        data: Dataset,
        spaces: SpaceTable,
    }

    impl Fixture {
        fn new(body: &str) -> Self {
            let tmp = TempDir::new().unwrap();
            let project = Url::from_directory_path(tmp.path()).unwrap().to_string();
            let doc = format!(
                "@prefix semp: <http://www.andonyar.com/rec/2012/sempipe/voc#> .\n\
                 [] semp:content-type \"text/plain\" ; semp:defaultExtension \"txt\" .\n\
                 [] semp:content-type \"text/html\" ; semp:defaultExtension \"html\" .\n\
                 [] semp:content-type \"text/turtle\" ; semp:defaultExtension \"ttl\" .\n\
                 {body}"
            );
            let mut conf = ConfGraph::new();
            conf.add_fragment(turtle::parse_document(&doc, &format!("{project}conf.n3")).unwrap());
            let build = format!("{}/build/", tmp.path().display());
            let spaces = SpaceTable::new(build, vec![HostedSpace::new(SITE, "")]);
            Self {
                tmp,
                conf,
                data: Dataset::new(),
                spaces,
            }
        }

        fn write_source(&self, name: &str, bytes: &[u8]) {
            fs::write(self.tmp.path().join(name), bytes).unwrap();
        }

        fn built(&self, rel: &str) -> Vec<u8> {
            fs::read(self.tmp.path().join("build").join(rel)).unwrap()
        }

        fn exists(&self, rel: &str) -> bool {
            self.tmp.path().join("build").join(rel).exists()
        }
    }

    fn build(f: &Fixture, transformer: &dyn Transformer, uri: &str) -> Result<ResourceReport, BuildError> {
        Builder {
            conf: &f.conf,
            data: &f.data,
            spaces: &f.spaces,
            renderer: &DescriptionRenderer,
            transformer,
        }
        .build_resource(uri)
    }

    #[test]
    fn raw_copies_source_bytes_without_typemap() {
        let f = Fixture::new(
            r#"<http://example.org/R> a semp:Resource ; semp:source <hello.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Raw ] ."#,
        );
        f.write_source("hello.txt", b"hello\x00\xff");
        let report = build(&f, &MockTransformer::default(), "http://example.org/R").unwrap();
        assert_eq!(f.built("R.txt"), b"hello\x00\xff");
        assert!(report.typemap.is_none());
        assert!(!f.exists("R"));
    }

    #[test]
    fn qualities_produce_typemap() {
        let f = Fixture::new(
            r#"<http://example.org/docs/> a semp:Resource ; semp:source <p.html> ;
                 semp:representation <#en>, <#de> .
               <#en> semp:content-type "text/html" ; semp:language "en" ; semp:quality 0.8 ;
                 semp:buildCommand semp:Raw .
               <#de> semp:content-type "text/html" ; semp:language "de" ; semp:quality 0.2 ;
                 semp:buildCommand semp:Raw ."#,
        );
        f.write_source("p.html", b"<p/>");
        let report = build(&f, &MockTransformer::default(), "http://example.org/docs/").unwrap();
        assert!(f.exists("docs/index.en.html"));
        assert!(f.exists("docs/index.de.html"));
        let typemap = String::from_utf8(f.built("docs/index")).unwrap();
        assert!(typemap.starts_with("URI: index\n\nURI: index.de.html\nContent-type: text/html; q=0.2\n"));
        assert!(report.typemap.unwrap().ends_with("build/docs/index"));
    }

    #[test]
    fn render_applies_transformations_in_order() {
        let f = Fixture::new(
            r#"<http://example.org/page> a semp:Resource ; semp:subject <http://example.org/thing> ;
                 semp:representation [ semp:content-type "text/html" ; semp:buildCommand semp:Render ;
                   semp:transformation ( <a.xsl> <b.xsl> ) ] .
               <http://example.org/thing> <http://example.org/name> "Thing" ."#,
        );
        let transformer = MockTransformer::default();
        build(&f, &transformer, "http://example.org/page").unwrap();
        let html = String::from_utf8(f.built("page.html")).unwrap();
        assert!(html.contains("about=\"http://example.org/thing\""));
        assert!(html.contains(">Thing</literal>"));
        let steps = transformer.steps.lock().unwrap().clone();
        assert_eq!(steps.len(), 2);
        assert!(steps[0].ends_with("/a.xsl") && steps[1].ends_with("/b.xsl"));
        assert!(html.find("a.xsl").unwrap() < html.find("b.xsl").unwrap());
    }

    #[test]
    fn serialize_writes_resource_data_graph() {
        let mut f = Fixture::new(
            r#"<http://example.org/data> a semp:Resource ;
                 semp:representation [ semp:content-type "text/turtle" ; semp:buildCommand semp:Serialize ] ."#,
        );
        f.data.graph_mut("http://example.org/data").add(
            Term::iri("http://example.org/s"),
            Term::iri("http://example.org/p"),
            Term::literal("o"),
        );
        build(&f, &MockTransformer::default(), "http://example.org/data").unwrap();
        let text = String::from_utf8(f.built("data.ttl")).unwrap();
        assert_eq!(text, "<http://example.org/s> <http://example.org/p> \"o\" .\n");
    }

    #[test]
    fn serialize_of_missing_graph_is_empty() {
        let f = Fixture::new(
            r#"<http://example.org/none> a semp:Resource ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Serialize ] ."#,
        );
        build(&f, &MockTransformer::default(), "http://example.org/none").unwrap();
        assert!(f.built("none.txt").is_empty());
    }

    #[test]
    fn serialize_finds_graph_among_configuration_documents() {
        let mut f = Fixture::new(
            r#"<http://example.org/vocab> a semp:Resource ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Serialize ] ."#,
        );
        f.conf.add_fragment(
            turtle::parse_document(
                "<http://example.org/s> <http://example.org/p> \"o\" .",
                "http://example.org/vocab",
            )
            .unwrap(),
        );
        build(&f, &MockTransformer::default(), "http://example.org/vocab").unwrap();
        let text = String::from_utf8(f.built("vocab.txt")).unwrap();
        assert_eq!(text, "<http://example.org/s> <http://example.org/p> \"o\" .\n");
    }

    #[test]
    fn missing_content_type_is_negotiation_error() {
        let f = Fixture::new(
            r#"<http://example.org/R> a semp:Resource ;
                 semp:representation [ semp:buildCommand semp:Raw ] ."#,
        );
        let err = build(&f, &MockTransformer::default(), "http://example.org/R").unwrap_err();
        assert!(matches!(err, BuildError::Negotiation { resource, .. } if resource == "http://example.org/R"));
    }

    #[test]
    fn unknown_command_and_missing_source_are_configuration_errors() {
        let f = Fixture::new(
            r#"<http://example.org/A> a semp:Resource ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Compile ] .
               <http://example.org/B> a semp:Resource ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Raw ] .
               <http://example.org/C> a semp:Resource ; semp:source <missing.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Raw ] ."#,
        );
        let t = MockTransformer::default();
        assert!(matches!(
            build(&f, &t, "http://example.org/A"),
            Err(BuildError::Resource(ResourceError::UnknownCommand { .. }))
        ));
        assert!(matches!(build(&f, &t, "http://example.org/B"), Err(BuildError::Source { .. })));
        assert!(matches!(build(&f, &t, "http://example.org/C"), Err(BuildError::Source { .. })));
    }

    #[test]
    fn unresolvable_resource_fails() {
        let f = Fixture::new(r#"<http://elsewhere.org/R> a semp:Resource ."#);
        assert!(matches!(
            build(&f, &MockTransformer::default(), "http://elsewhere.org/R"),
            Err(BuildError::Resolution(_))
        ));
    }

    #[test]
    fn build_all_continues_after_failure_and_writes_access_control() {
        let f = Fixture::new(
            r#"<http://example.org/bad> a semp:Resource ;
                 semp:representation [ semp:content-type "image/png" ; semp:buildCommand semp:Raw ] .
               <http://example.org/good> a semp:Resource ; semp:source <g.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:quality 1 ;
                   semp:buildCommand semp:Raw ] ."#,
        );
        f.write_source("g.txt", b"g");
        let transformer = MockTransformer::default();
        let builder = Builder {
            conf: &f.conf,
            data: &f.data,
            spaces: &f.spaces,
            renderer: &DescriptionRenderer,
            transformer: &transformer,
        };
        let (tx, rx) = std::sync::mpsc::channel();
        let summary = builder.build_all(Some(tx));
        let events: Vec<BuildEvent> = rx.iter().collect();

        assert_eq!(summary.built.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "http://example.org/bad");
        assert!(matches!(summary.failed[0].1, BuildError::Extension { .. }));
        assert_eq!(f.built(".htaccess"), b"<Files \"good\">\n    SetHandler type-map\n</Files>\n");
        assert!(events.iter().any(|e| matches!(e, BuildEvent::ResourceFailed { uri, .. } if uri.ends_with("bad"))));
        assert!(events.iter().any(|e| matches!(e, BuildEvent::TypeMapWritten { .. })));
    }

    fn build_all_of(f: &Fixture) -> BuildSummary {
        Builder {
            conf: &f.conf,
            data: &f.data,
            spaces: &f.spaces,
            renderer: &DescriptionRenderer,
            transformer: &MockTransformer::default(),
        }
        .build_all(None)
    }

    #[test]
    fn resources_sharing_a_destination_both_fail() {
        let f = Fixture::new(
            r#"<http://example.org/d/> a semp:Resource ; semp:source <a.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Raw ] .
               <http://example.org/d/index> a semp:Resource ; semp:source <b.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Raw ] .
               <http://example.org/other> a semp:Resource ; semp:source <a.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Raw ] ."#,
        );
        f.write_source("a.txt", b"AAAA");
        f.write_source("b.txt", b"BBBB");
        let summary = build_all_of(&f);

        assert_eq!(summary.built.len(), 1);
        assert_eq!(summary.built[0].uri, "http://example.org/other");
        let failed: Vec<&str> = summary.failed.iter().map(|(uri, _)| uri.as_str()).collect();
        assert_eq!(failed, vec!["http://example.org/d/", "http://example.org/d/index"]);
        match &summary.failed[0].1 {
            BuildError::Collision {
                path,
                resource,
                other,
            } => {
                assert!(path.ends_with("build/d/index.txt"));
                assert_eq!(resource, "http://example.org/d/");
                assert_eq!(other, "http://example.org/d/index");
            }
            e => panic!("expected a collision, got {e:?}"),
        }
        assert!(!f.exists("d/index.txt"));
    }

    #[test]
    fn representation_colliding_with_typemap_fails() {
        let f = Fixture::new(
            r#"<http://example.org/a> a semp:Resource ; semp:source <s.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:buildCommand semp:Raw ] .
               <http://example.org/a.txt> a semp:Resource ; semp:source <s.txt> ;
                 semp:representation [ semp:content-type "text/plain" ; semp:quality 1 ;
                   semp:buildCommand semp:Raw ] ."#,
        );
        f.write_source("s.txt", b"s");
        let summary = build_all_of(&f);

        assert!(summary.built.is_empty());
        assert_eq!(summary.failed.len(), 2);
        assert!(
            summary
                .failed
                .iter()
                .all(|(_, e)| matches!(e, BuildError::Collision { path, .. } if path.ends_with("build/a.txt")))
        );
        assert!(summary.access_control.is_empty());
    }
}
