//! The fixed configuration vocabulary.
//!
//! Every term lives in the `semp:` namespace except the handful of RDF and
//! XSD terms the graph layer needs for `a`, collections and typed literals.

pub const SEMP: &str = "http://www.andonyar.com/rec/2012/sempipe/voc#";

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
}

macro_rules! semp_terms {
    ($($name:ident => $local:literal),* $(,)?) => {
        $(pub const $name: &str = concat!("http://www.andonyar.com/rec/2012/sempipe/voc#", $local);)*
    };
}

semp_terms! {
    // Resources and their representations
    RESOURCE => "Resource",
    REPRESENTATION => "representation",
    SUBJECT => "subject",
    SOURCE => "source",
    CONTENT_TYPE => "content-type",
    LANGUAGE => "language",
    QUALITY => "quality",
    BUILD_COMMAND => "buildCommand",
    RAW => "Raw",
    RENDER => "Render",
    SERIALIZE => "Serialize",
    TRANSFORMATION => "transformation",
    DEFAULT_EXTENSION => "defaultExtension",
    // Project layout
    BUILD_DIR => "buildDir",
    HOSTED_SPACE => "HostedSpace",
    MAP_TO => "mapTo",
    MAP_INDEX_TO => "mapIndexTo",
    MAP_HTACCESS_TO => "mapHTAccessTo",
    // Publishing
    PUBLISH_METHOD => "publishMethod",
    PUBLISH_METHOD_CLASS => "PublishMethod",
    COMMAND => "command",
    INVOCATION => "invocation",
    ASK_FOR => "askFor",
    ASK_FOR_HIDDEN => "askForHidden",
    // Build plans
    BUILD => "build",
    BUILD_VAR => "buildVar",
    NAME => "name",
    VALUE => "value",
    // Loading
    DATA_GRAPH => "dataGraph",
    UPDATE => "update",
    CONF_GRAPH => "confGraph",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_live_in_the_semp_namespace() {
        for term in [RESOURCE, CONTENT_TYPE, MAP_HTACCESS_TO, ASK_FOR_HIDDEN, CONF_GRAPH] {
            assert!(term.starts_with(SEMP), "{term}");
        }
        assert_eq!(CONTENT_TYPE, format!("{SEMP}content-type"));
    }
}
