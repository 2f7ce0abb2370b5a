//! Well-known RDF namespaces and the default predicate preference lists.

pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const DCT: &str = "http://purl.org/dc/terms/";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const SDO: &str = "https://schema.org/";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";

/// The fixed identifier the reserved `@type` token always resolves to.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

fn ns(namespace: &str, local: &str) -> String {
    format!("{namespace}{local}")
}

/// Predicates tried in order when picking a display label for a resource.
pub fn default_label_predicates() -> Vec<String> {
    vec![
        ns(SKOS, "prefLabel"),
        ns(DCT, "title"),
        ns(DC, "title"),
        ns(SDO, "name"),
        ns(FOAF, "name"),
        ns(RDFS, "label"),
    ]
}

/// Predicates tried in order when picking a description for a resource.
pub fn default_description_predicates() -> Vec<String> {
    vec![
        ns(SKOS, "definition"),
        ns(DCT, "description"),
        ns(DC, "description"),
        ns(RDFS, "comment"),
    ]
}
