//! Spring MVC endpoint classifier
//!
//! A method of a `@RestController` class carrying a request-mapping annotation
//! serves one route per HTTP verb. Its paths are the product of the class-level
//! `@RequestMapping` paths and the method-level paths.

use super::{enum_constant, MethodClassifier, MethodContext};
use crate::adapter::Annotation;
use crate::entity::{Route, RouteKind};
use std::collections::BTreeSet;

const SPRING: &str = "org.springframework.web.bind.annotation";
const PATH_KEYS: &[&str] = &["value", "path"];

const VERB_MAPPINGS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];

fn spring(name: &str) -> String {
    format!("{}.{}", SPRING, name)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpringEndpointClassifier;

impl SpringEndpointClassifier {
    /// Method-level paths and verbs of the first mapping annotation
    fn method_mapping(&self, annotations: &[Annotation]) -> Option<(Vec<String>, BTreeSet<String>)> {
        annotations.iter().find_map(|annotation| {
            if annotation.is(&spring("RequestMapping")) {
                let verbs = annotation
                    .values(&["method"])
                    .iter()
                    .map(|v| enum_constant(v).to_uppercase())
                    .collect();
                return Some((annotation.values(PATH_KEYS).to_vec(), verbs));
            }
            VERB_MAPPINGS
                .iter()
                .find(|(name, _)| annotation.is(&spring(name)))
                .map(|(_, verb)| {
                    (
                        annotation.values(PATH_KEYS).to_vec(),
                        BTreeSet::from([verb.to_string()]),
                    )
                })
        })
    }
}

impl MethodClassifier for SpringEndpointClassifier {
    fn classify(&self, method: &MethodContext<'_>) -> Vec<Route> {
        if method.class_annotation(&spring("RestController")).is_none() {
            return Vec::new();
        }
        let Some((method_paths, verbs)) = self.method_mapping(method.method_annotations) else {
            return Vec::new();
        };
        let class_paths = method
            .class_annotation(&spring("RequestMapping"))
            .map(|a| a.values(PATH_KEYS).to_vec())
            .unwrap_or_default();

        let paths = path_product(&class_paths, &method_paths);
        verbs
            .into_iter()
            .map(|verb| Route::new(RouteKind::Endpoint, verb, paths.clone()))
            .collect()
    }
}

/// Every class-level path joined with every method-level path
pub fn path_product(class_paths: &[String], method_paths: &[String]) -> BTreeSet<String> {
    if class_paths.is_empty() {
        return method_paths.iter().cloned().collect();
    }
    if method_paths.is_empty() {
        return class_paths.iter().cloned().collect();
    }
    class_paths
        .iter()
        .flat_map(|c| method_paths.iter().map(move |m| format!("{}{}", c, m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(name: &str) -> Annotation {
        let mut annotation = Annotation::new(name);
        annotation.resolved = vec![spring(name)];
        annotation
    }

    fn controller(paths: &[&str]) -> Vec<Annotation> {
        let mut mapping = resolved("RequestMapping");
        if !paths.is_empty() {
            mapping = mapping.with_argument("value", paths.iter().map(|p| p.to_string()).collect());
        }
        vec![resolved("RestController"), mapping]
    }

    #[test]
    fn test_get_mapping_under_class_prefix() {
        let class = controller(&["/v1"]);
        let method = [resolved("GetMapping").with_argument("value", vec!["/x".into()])];

        let routes = SpringEndpointClassifier.classify(&MethodContext::new(&class, &method));
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].kind, RouteKind::Endpoint);
        assert_eq!(routes[0].to_string(), "GET /v1/x");
    }

    #[test]
    fn test_request_mapping_with_methods_and_alternative_paths() {
        let class = controller(&["/v1", "/alternativePath"]);
        let method = [resolved("RequestMapping")
            .with_argument("path", vec!["/x".into()])
            .with_argument("method", vec!["RequestMethod.GET".into(), "RequestMethod.HEAD".into()])];

        let routes = SpringEndpointClassifier.classify(&MethodContext::new(&class, &method));
        let verbs: Vec<_> = routes.iter().map(|r| r.http_method.as_str()).collect();
        assert_eq!(verbs, vec!["GET", "HEAD"]);
        assert_eq!(
            routes[0].paths,
            BTreeSet::from(["/alternativePath/x".to_string(), "/v1/x".to_string()])
        );
    }

    #[test]
    fn test_request_mapping_without_method_is_not_an_endpoint() {
        let class = controller(&[]);
        let method = [resolved("RequestMapping").with_argument("value", vec!["/x".into()])];
        assert!(SpringEndpointClassifier.classify(&MethodContext::new(&class, &method)).is_empty());
    }

    #[test]
    fn test_requires_rest_controller() {
        let class = [resolved("Controller")];
        let method = [resolved("PostMapping")];
        assert!(SpringEndpointClassifier.classify(&MethodContext::new(&class, &method)).is_empty());
    }

    #[test]
    fn test_unmapped_route_has_no_path() {
        let class = controller(&[]);
        let method = [resolved("DeleteMapping")];
        let routes = SpringEndpointClassifier.classify(&MethodContext::new(&class, &method));
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].http_method, "DELETE");
        assert!(routes[0].paths.is_empty());
    }

    #[test]
    fn test_unresolved_annotation_names_do_not_match() {
        let class = vec![Annotation::new("RestController")];
        let method = [Annotation::new("GetMapping")];
        assert!(SpringEndpointClassifier.classify(&MethodContext::new(&class, &method)).is_empty());
    }
}
