//! CLI output formatting for all commands.
//!
//! # Output Format
//!
//! ## Load
//!
//! ```text
//! Project file:///home/me/site/
//!     Configuration
//!         sempipeconf.n3 (fetched)
//!         spaces.n3 (stored)
//!     Data
//!         data.n3 (fetched)
//!     Update 001: +2 -1
//! Loaded 2 configuration documents (14 triples), 1 data graph, 1 hosted space
//! ```
//!
//! ## Build
//!
//! ```text
//! http://example.org/hello (2 representations)
//!     render: hello.en.html
//!     raw: hello.de.html
//!     type-map: hello
//! Access control: .htaccess
//! Built 1 resource (2 files, 1 type-map)
//! ```
//!
//! Build paths are shown relative to the build directory.
//!
//! ## Publish
//!
//! ```text
//! http://example.org/ published
//! http://example.org/docs/ FAILED
//!     `rsync` exited with status 23
//! Published 1 of 2 hosted spaces
//! ```
//!
//! ## Plan
//!
//! ```text
//! # http://example.org/paper
//! SRC=paper.tex
//! pdflatex $SRC
//! ```
//!
//! Plans are meant to be read by a shell, so the resource header is a
//! comment.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::builder::{BuildEvent, BuildSummary};
use crate::loader::{DocumentKind, Origin};
use crate::plan::ResourcePlan;
use crate::project::Project;
use crate::publish::PublishOutcome;
use crate::resource::BuildCommand;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `count noun`, with an `s` unless the count is one.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Path relative to `base` when it lies below it.
fn relative<'a>(path: &'a str, base: &str) -> &'a str {
    path.strip_prefix(base).unwrap_or(path)
}

/// Document URI relative to the project, or the URI itself.
fn document_label<'a>(uri: &'a str, project: &str) -> &'a str {
    uri.strip_prefix(project).unwrap_or(uri)
}

fn command_label(command: BuildCommand) -> &'static str {
    match command {
        BuildCommand::Raw => "raw",
        BuildCommand::Render => "render",
        BuildCommand::Serialize => "serialize",
    }
}

/// Error text indented below its header, one output line per error line.
fn error_lines(error: &str, depth: usize) -> impl Iterator<Item = String> + '_ {
    let pad = indent(depth);
    error.lines().map(move |line| format!("{pad}{line}"))
}

// ============================================================================
// Load output
// ============================================================================

/// Documents loaded for the project, grouped by kind, and update results.
pub fn format_load_report(project: &Project) -> Vec<String> {
    let mut lines = vec![format!("Project {}", project.uri)];
    let report = &project.report;

    for (kind, heading) in [
        (DocumentKind::Conf, "Configuration"),
        (DocumentKind::Data, "Data"),
    ] {
        let steps: Vec<_> = report.steps.iter().filter(|s| s.kind == kind).collect();
        if steps.is_empty() {
            continue;
        }
        lines.push(format!("{}{heading}", indent(1)));
        for step in steps {
            let origin = match step.origin {
                Origin::Fetched => "fetched",
                Origin::Stored => "stored",
            };
            lines.push(format!(
                "{}{} ({origin})",
                indent(2),
                document_label(&step.uri, &project.uri)
            ));
        }
    }
    for (i, update) in report.updates.iter().enumerate() {
        lines.push(format!(
            "{}Update {:0>3}: +{} -{}",
            indent(1),
            i + 1,
            update.inserted,
            update.deleted
        ));
    }

    lines.push(format!(
        "Loaded {} ({}), {}, {}",
        plural(project.conf.documents().count(), "configuration document"),
        plural(project.conf.len(), "triple"),
        plural(project.data.graphs().count(), "data graph"),
        plural(project.spaces.spaces().len(), "hosted space"),
    ));
    lines
}

pub fn print_load_report(project: &Project) {
    for line in format_load_report(project) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent, build_dir: &str) -> Vec<String> {
    match event {
        BuildEvent::ResourceStarted {
            uri,
            representations,
        } => vec![format!("{uri} ({})", plural(*representations, "representation"))],
        BuildEvent::RepresentationBuilt { path, command, .. } => vec![format!(
            "{}{}: {}",
            indent(1),
            command_label(*command),
            relative(path, build_dir)
        )],
        BuildEvent::TypeMapWritten { path, .. } => {
            vec![format!("{}type-map: {}", indent(1), relative(path, build_dir))]
        }
        BuildEvent::ResourceFailed { uri, error } => {
            let mut lines = vec![format!("{uri} FAILED")];
            lines.extend(error_lines(error, 1));
            lines
        }
        BuildEvent::AccessControlWritten { path } => {
            vec![format!("Access control: {}", relative(path, build_dir))]
        }
    }
}

/// Totals line, followed by the failed resources if any.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let typemaps = summary.built.iter().filter(|r| r.typemap.is_some()).count();
    let mut lines = vec![format!(
        "Built {} ({}, {})",
        plural(summary.built.len(), "resource"),
        plural(summary.file_count(), "file"),
        plural(typemaps, "type-map"),
    )];
    if !summary.failed.is_empty() {
        lines.push(format!("Failed {}:", plural(summary.failed.len(), "resource")));
        for (uri, _) in &summary.failed {
            lines.push(format!("{}{uri}", indent(1)));
        }
    }
    lines
}

pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Publish output
// ============================================================================

pub fn format_publish_outcomes(outcomes: &[PublishOutcome]) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => lines.push(format!("{} published", outcome.space)),
            Err(e) => {
                lines.push(format!("{} FAILED", outcome.space));
                lines.extend(error_lines(&e.to_string(), 1));
            }
        }
    }
    if outcomes.is_empty() {
        lines.push("No hosted space declares a publish method".to_string());
    } else {
        let ok = outcomes.iter().filter(|o| o.result.is_ok()).count();
        lines.push(format!(
            "Published {ok} of {}",
            plural(outcomes.len(), "hosted space")
        ));
    }
    lines
}

pub fn print_publish_outcomes(outcomes: &[PublishOutcome]) {
    for line in format_publish_outcomes(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan output
// ============================================================================

pub fn format_plan(plans: &[ResourcePlan]) -> Vec<String> {
    let mut lines = Vec::new();
    for plan in plans {
        lines.push(format!("# {}", plan.uri));
        lines.extend(plan.lines());
    }
    lines
}

pub fn print_plan(plans: &[ResourcePlan]) {
    for line in format_plan(plans) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildError, BuiltFile, ResourceReport};
    use crate::publish::PublishError;
    use crate::space::ResolutionError;
    use crate::test_helpers::{MockFetcher, conf_doc};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn plural_handles_one() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
        assert_eq!(plural(3, "file"), "3 files");
    }

    #[test]
    fn relative_strips_build_dir_only_when_prefixed() {
        assert_eq!(relative("/out/a/b.html", "/out/"), "a/b.html");
        assert_eq!(relative("/elsewhere/x", "/out/"), "/elsewhere/x");
    }

    // =========================================================================
    // Load
    // =========================================================================

    #[test]
    fn load_report_groups_documents() {
        let fetcher = MockFetcher::new(&[
            (
                "file:///site/sempipeconf.n3",
                &conf_doc(
                    "<./> semp:buildDir <build/> ; semp:dataGraph <d.n3> ;\n\
                     semp:update \"INSERT DATA { <http://x/a> <http://x/b> <http://x/c> }\" .\n\
                     <http://example.org/> a semp:HostedSpace .",
                ),
            ),
            ("file:///site/d.n3", ""),
        ]);
        let project =
            Project::open_uri("file:///site/", "sempipeconf.n3", None, &fetcher).unwrap();
        let lines = format_load_report(&project);
        assert_eq!(
            lines,
            vec![
                "Project file:///site/",
                "    Configuration",
                "        sempipeconf.n3 (fetched)",
                "    Data",
                "        d.n3 (fetched)",
                "    Update 001: +1 -0",
                "Loaded 1 configuration document (4 triples), 2 data graphs, 1 hosted space",
            ]
        );
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_events_show_relative_paths() {
        let built = BuildEvent::RepresentationBuilt {
            resource: "http://example.org/a".into(),
            path: "/out/a.en.html".into(),
            command: BuildCommand::Render,
        };
        assert_eq!(format_build_event(&built, "/out/"), vec!["    render: a.en.html"]);

        let started = BuildEvent::ResourceStarted {
            uri: "http://example.org/a".into(),
            representations: 1,
        };
        assert_eq!(
            format_build_event(&started, "/out/"),
            vec!["http://example.org/a (1 representation)"]
        );
    }

    #[test]
    fn failed_resource_indents_error_lines() {
        let event = BuildEvent::ResourceFailed {
            uri: "http://example.org/a".into(),
            error: "first\nsecond".into(),
        };
        assert_eq!(
            format_build_event(&event, "/out/"),
            vec!["http://example.org/a FAILED", "    first", "    second"]
        );
    }

    #[test]
    fn build_summary_counts_and_lists_failures() {
        let summary = BuildSummary {
            built: vec![ResourceReport {
                uri: "http://example.org/a".into(),
                files: vec![
                    BuiltFile {
                        path: "/out/a.en.html".into(),
                        command: BuildCommand::Raw,
                    },
                    BuiltFile {
                        path: "/out/a.de.html".into(),
                        command: BuildCommand::Raw,
                    },
                ],
                typemap: Some("/out/a".into()),
            }],
            failed: vec![(
                "http://other.org/b".into(),
                BuildError::Resolution(ResolutionError::NoSpaceForUri("http://other.org/b".into())),
            )],
            access_control: vec!["/out/.htaccess".into()],
        };
        assert_eq!(
            format_build_summary(&summary),
            vec![
                "Built 1 resource (2 files, 1 type-map)",
                "Failed 1 resource:",
                "    http://other.org/b",
            ]
        );
    }

    // =========================================================================
    // Publish
    // =========================================================================

    #[test]
    fn publish_outcomes_report_failures() {
        let outcomes = vec![
            PublishOutcome {
                space: "http://a.org/".into(),
                result: Ok(()),
            },
            PublishOutcome {
                space: "http://b.org/".into(),
                result: Err(PublishError::CommandFailed {
                    program: "rsync".into(),
                    code: Some(23),
                }),
            },
        ];
        assert_eq!(
            format_publish_outcomes(&outcomes),
            vec![
                "http://a.org/ published",
                "http://b.org/ FAILED",
                "    `rsync` exited with status 23",
                "Published 1 of 2 hosted spaces",
            ]
        );
    }

    #[test]
    fn no_publish_methods() {
        assert_eq!(
            format_publish_outcomes(&[]),
            vec!["No hosted space declares a publish method"]
        );
    }

    // =========================================================================
    // Plan
    // =========================================================================

    #[test]
    fn plan_headers_each_resource() {
        let plans = vec![
            ResourcePlan {
                uri: "http://example.org/a".into(),
                variables: vec![("X".into(), "1".into())],
                steps: vec!["make a".into()],
            },
            ResourcePlan {
                uri: "http://example.org/b".into(),
                variables: vec![],
                steps: vec!["make b".into()],
            },
        ];
        assert_eq!(
            format_plan(&plans),
            vec![
                "# http://example.org/a",
                "X=1",
                "make a",
                "# http://example.org/b",
                "make b",
            ]
        );
    }
}
