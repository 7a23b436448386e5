//! Retrofit client classifier
//!
//! A method annotated with a `retrofit2.http` verb calls that route on a remote
//! service. The annotation value is the relative URL.

use super::{MethodClassifier, MethodContext};
use crate::entity::{Route, RouteKind};

const VERBS: &[&str] = &["GET", "PUT", "POST", "DELETE", "HEAD", "PATCH"];

#[derive(Debug, Clone, Copy, Default)]
pub struct RetrofitClientClassifier;

impl MethodClassifier for RetrofitClientClassifier {
    fn classify(&self, method: &MethodContext<'_>) -> Vec<Route> {
        method
            .method_annotations
            .iter()
            .find_map(|annotation| {
                VERBS
                    .iter()
                    .find(|verb| annotation.is(&format!("retrofit2.http.{}", verb)))
                    .map(|verb| {
                        let paths = annotation.values(&["value"]).iter().cloned().collect();
                        Route::new(RouteKind::RetrofitClient, *verb, paths)
                    })
            })
            .into_iter()
            .collect()
    }
}
