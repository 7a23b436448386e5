//! SQS event processor configuration classifiers
//!
//! A `@Bean` factory method returning an `EventProcessorConfiguration` produces one
//! configuration per bean name, with the queue URL taken from the `queueUrl`
//! argument of the returned construction. An `EventProcessor` constructed with
//! `configuration = x`, where `x` is a member of the enclosing class annotated
//! `@Qualifier("name")`, consumes the configuration of that name.

use super::{BeanFactoryClassifier, ConstructionClassifier, ConstructionContext, MethodContext, BEAN};
use crate::adapter::ArgumentValue;
use crate::entity::EventConfig;

pub const EVENT_PROCESSOR_CONFIGURATION: &str =
    "com.borrowbox.gearbox.sqs.eventprocessor.domain.EventProcessorConfiguration";
pub const EVENT_PROCESSOR: &str = "com.borrowbox.gearbox.sqs.eventprocessor.processor.EventProcessor";

const QUALIFIER: &str = "org.springframework.beans.factory.annotation.Qualifier";
const VALUE: &str = "org.springframework.beans.factory.annotation.Value";

#[derive(Debug, Clone, Copy, Default)]
pub struct EventProcessorConfigClassifier;

impl EventProcessorConfigClassifier {
    /// Literal URL, or the `@Value` placeholder of the parameter passed through
    fn queue_url(&self, method: &MethodContext<'_>) -> Option<String> {
        match method.returned?.argument("queueUrl")? {
            ArgumentValue::Text(url) => Some(url.clone()),
            ArgumentValue::Name(name) => method
                .parameter(name)?
                .annotation(VALUE)?
                .values(&["value"])
                .first()
                .cloned(),
            ArgumentValue::Expression => None,
        }
    }
}

impl BeanFactoryClassifier for EventProcessorConfigClassifier {
    fn classify(&self, method: &MethodContext<'_>) -> Vec<EventConfig> {
        if !method.returns(EVENT_PROCESSOR_CONFIGURATION) {
            return Vec::new();
        }
        let Some(bean) = method.method_annotation(BEAN) else {
            return Vec::new();
        };
        let mut names = bean.values(&["value", "name"]).to_vec();
        // Spring names an unnamed bean after its factory method
        if names.is_empty() && !method.name.is_empty() {
            names.push(method.name.to_string());
        }
        let queue_url = self.queue_url(method);
        names
            .into_iter()
            .map(|name| EventConfig::new(name, queue_url.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventProcessorConstructionClassifier;

impl ConstructionClassifier for EventProcessorConstructionClassifier {
    fn classify(&self, site: &ConstructionContext<'_>) -> Option<EventConfig> {
        if !site.constructs(EVENT_PROCESSOR) {
            return None;
        }
        let ArgumentValue::Name(name) = site.site.argument("configuration")? else {
            return None;
        };
        let qualifier = site
            .member(name)?
            .annotation(QUALIFIER)?
            .values(&["value"])
            .first()?;
        Some(EventConfig::new(qualifier.as_str(), None))
    }
}
