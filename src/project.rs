//! A loaded project.
//!
//! The project URI is the `file:` URI of the project directory and must end
//! with `/`. Opening a project loads the root configuration document (and
//! everything it imports), the declared data documents and update
//! instructions, then reads the build directory and hosted spaces:
//!
//! ```turtle
//! <./> semp:buildDir <build/> ;
//!      semp:dataGraph <data.n3> .
//! <http://example.org/> a semp:HostedSpace ; semp:mapTo "" .
//! ```
//!
//! With a store directory, documents are taken from the snapshot when
//! present and the snapshot is written back by [`Project::close`].

use crate::builder::{BuildEvent, BuildSummary, Builder};
use crate::config::PipelineConfig;
use crate::graph::{Dataset, Term, TripleSource, serialize};
use crate::loader::{ConfGraph, Fetcher, LoadError, LoadReport, Loader};
use crate::plan::{self, PlanError, ResourcePlan};
use crate::publish::{self, CommandRunner, PublishOutcome, Prompter};
use crate::render::{Renderer, Transformer};
use crate::space::{HostedSpace, SpaceTable};
use crate::store::{Snapshot, SnapshotError};
use crate::vocab;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("malformed URI {uri}: {message}")]
    InvalidUri { uri: String, message: String },
    #[error("cannot open project directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub struct Project {
    pub uri: String,
    pub conf: ConfGraph,
    pub data: Dataset,
    pub spaces: SpaceTable,
    pub report: LoadReport,
    snapshot: Snapshot,
    store: Option<PathBuf>,
}

impl Project {
    /// Open the project in directory `dir`.
    pub fn open(
        dir: &Path,
        settings: &PipelineConfig,
        store: Option<&Path>,
        fetcher: &dyn Fetcher,
    ) -> Result<Self, ProjectError> {
        let absolute = dir.canonicalize().map_err(|source| ProjectError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let uri = Url::from_directory_path(&absolute)
            .map_err(|_| ProjectError::InvalidUri {
                uri: absolute.display().to_string(),
                message: "not an absolute directory path".into(),
            })?
            .to_string();
        Self::open_uri(&uri, &settings.conf_file, store, fetcher)
    }

    /// Open the project with base URI `uri`, whose root configuration
    /// document is `conf_file` relative to it.
    pub fn open_uri(
        uri: &str,
        conf_file: &str,
        store: Option<&Path>,
        fetcher: &dyn Fetcher,
    ) -> Result<Self, ProjectError> {
        if !uri.ends_with('/') {
            return Err(ProjectError::Configuration(format!(
                "project URI {uri} must end with '/'"
            )));
        }
        let base = parse_uri(uri)?;
        let root = join(&base, conf_file)?;

        let mut snapshot = store.map(Snapshot::load).unwrap_or_else(Snapshot::empty);
        let mut conf = ConfGraph::new();
        let mut data = Dataset::new();
        let mut loader = Loader::new(fetcher, &mut snapshot);
        loader.load_config(&mut conf, &root, uri)?;
        loader.load_data(&mut data, &conf, uri)?;
        let report = loader.report;

        let build_dir = build_dir(&conf, &base)?;
        let spaces = SpaceTable::new(build_dir, HostedSpace::all_from(&conf));

        Ok(Self {
            uri: uri.to_string(),
            conf,
            data,
            spaces,
            report,
            snapshot,
            store: store.map(Path::to_path_buf),
        })
    }

    /// Build every resource; see [`Builder::build_all`].
    pub fn build(
        &self,
        renderer: &dyn Renderer,
        transformer: &dyn Transformer,
        events: Option<Sender<BuildEvent>>,
    ) -> BuildSummary {
        Builder {
            conf: &self.conf,
            data: &self.data,
            spaces: &self.spaces,
            renderer,
            transformer,
        }
        .build_all(events)
    }

    /// Publish every hosted space with a publish method.
    pub fn publish(
        &self,
        prompter: &mut dyn Prompter,
        runner: &mut dyn CommandRunner,
        variables: &mut HashMap<String, String>,
    ) -> Vec<PublishOutcome> {
        publish::publish(&self.conf, &self.spaces, prompter, runner, variables)
    }

    /// Build instructions of every resource that declares some.
    pub fn plan(&self) -> Result<Vec<ResourcePlan>, PlanError> {
        plan::plan(&self.conf)
    }

    /// N-Quads of every configuration and data graph.
    pub fn dump(&self) -> String {
        serialize::to_nquads(self.conf.graphs().chain(self.data.graphs()))
    }

    /// Write the snapshot back to the store, if there is one.
    pub fn close(self) -> Result<(), ProjectError> {
        if let Some(dir) = &self.store {
            self.snapshot.save(dir)?;
        }
        Ok(())
    }
}

fn parse_uri(uri: &str) -> Result<Url, ProjectError> {
    Url::parse(uri).map_err(|e| ProjectError::InvalidUri {
        uri: uri.to_string(),
        message: e.to_string(),
    })
}

fn join(base: &Url, reference: &str) -> Result<String, ProjectError> {
    base.join(reference)
        .map(String::from)
        .map_err(|e| ProjectError::InvalidUri {
            uri: reference.to_string(),
            message: e.to_string(),
        })
}

/// Local path of `<project> semp:buildDir`, ending with `/`.
fn build_dir(conf: &ConfGraph, base: &Url) -> Result<String, ProjectError> {
    let declared = conf
        .value(&Term::iri(base.as_str()), vocab::BUILD_DIR)
        .ok_or_else(|| {
            ProjectError::Configuration(format!("no semp:buildDir declared for {base}"))
        })?;
    let uri = join(base, declared.value())?;
    let path = Url::parse(&uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| {
            ProjectError::Configuration(format!("build directory {uri} is not a local path"))
        })?;
    let mut dir = path.to_string_lossy().into_owned();
    if !dir.ends_with('/') {
        dir.push('/');
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FileFetcher;
    use crate::test_helpers::{MockFetcher, conf_doc, project_uri, write_project};

    const P: &str = "file:///site/";

    #[test]
    fn opens_project_with_spaces_and_build_dir() {
        let fetcher = MockFetcher::new(&[(
            "file:///site/sempipeconf.n3",
            &conf_doc(
                "<./> semp:buildDir <out> .\n\
                 <http://example.org/> a semp:HostedSpace ; semp:mapTo \"www/\" .",
            ),
        )]);
        let project = Project::open_uri(P, "sempipeconf.n3", None, &fetcher).unwrap();
        assert_eq!(project.spaces.build_dir(), "/site/out/");
        assert_eq!(project.spaces.spaces().len(), 1);
        assert_eq!(
            project.spaces.build_location("http://example.org/a").unwrap(),
            "/site/out/www/a"
        );
    }

    #[test]
    fn project_uri_needs_trailing_slash() {
        let fetcher = MockFetcher::new(&[]);
        assert!(matches!(
            Project::open_uri("file:///site", "sempipeconf.n3", None, &fetcher),
            Err(ProjectError::Configuration(message)) if message.contains("must end with")
        ));
        assert!(fetcher.fetched().is_empty());
    }

    #[test]
    fn missing_build_dir_is_configuration_error() {
        let fetcher = MockFetcher::new(&[("file:///site/sempipeconf.n3", "")]);
        assert!(matches!(
            Project::open_uri(P, "sempipeconf.n3", None, &fetcher),
            Err(ProjectError::Configuration(message)) if message.contains("buildDir")
        ));
    }

    #[test]
    fn load_errors_propagate() {
        let fetcher = MockFetcher::new(&[]);
        assert!(matches!(
            Project::open_uri(P, "sempipeconf.n3", None, &fetcher),
            Err(ProjectError::Load(LoadError::Fetch { .. }))
        ));
    }

    #[test]
    fn dump_lists_configuration_and_data_quads() {
        let fetcher = MockFetcher::new(&[
            (
                "file:///site/sempipeconf.n3",
                &conf_doc("<./> semp:buildDir <build/> ; semp:dataGraph <d.n3> ."),
            ),
            ("file:///site/d.n3", "<http://x/s> <http://x/p> \"v\" ."),
        ]);
        let dump = Project::open_uri(P, "sempipeconf.n3", None, &fetcher)
            .unwrap()
            .dump();
        assert!(dump.contains(
            "<file:///site/> <http://www.andonyar.com/rec/2012/sempipe/voc#buildDir> <file:///site/build/> <file:///site/sempipeconf.n3> .\n"
        ));
        assert!(dump.contains("<http://x/s> <http://x/p> \"v\" <file:///site/d.n3> .\n"));
    }

    #[test]
    fn plan_reads_instructions_from_imported_documents() {
        let fetcher = MockFetcher::new(&[
            (
                "file:///site/sempipeconf.n3",
                &conf_doc(
                    "<./> semp:buildDir <build/> .\n\
                     <> semp:confGraph <plan.n3> .\n\
                     <http://example.org/paper> a semp:Resource .",
                ),
            ),
            (
                "file:///site/plan.n3",
                &conf_doc(
                    "<http://example.org/paper> semp:buildVar [ semp:name \"OUT\" ; semp:value \"p.pdf\" ] ;\n\
                     semp:build ( \"make $OUT\" ) .",
                ),
            ),
        ]);
        let project = Project::open_uri(P, "sempipeconf.n3", None, &fetcher).unwrap();
        let plans = project.plan().unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].lines(), vec!["OUT=p.pdf", "make $OUT"]);
    }

    #[test]
    fn snapshot_round_trip_avoids_refetching() {
        let tmp = write_project(&[(
            "sempipeconf.n3",
            &conf_doc("<./> semp:buildDir <build/> ."),
        )]);
        let store = tmp.path().join("store");
        let settings = PipelineConfig::default();

        let first = Project::open(tmp.path(), &settings, Some(&store), &FileFetcher).unwrap();
        first.close().unwrap();
        assert!(crate::store::snapshot_path(&store).exists());

        let uri = project_uri(&tmp.path().canonicalize().unwrap());
        let offline = MockFetcher::new(&[]);
        let second = Project::open_uri(&uri, "sempipeconf.n3", Some(&store), &offline).unwrap();
        assert!(offline.fetched().is_empty());
        assert_eq!(second.conf.len(), 1);
    }

    #[test]
    fn missing_project_directory_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let gone = tmp.path().join("nope");
        assert!(matches!(
            Project::open(&gone, &PipelineConfig::default(), None, &FileFetcher),
            Err(ProjectError::Io { .. })
        ));
    }
}
