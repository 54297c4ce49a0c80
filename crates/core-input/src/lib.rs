//! Terminal input decoding: escape classification and the streaming key reader.

pub mod escape;
pub mod reader;

pub use escape::{Decoded, decode, is_printable};
pub use reader::{KeyReader, KeySource, TtySource};

#[cfg(test)]
mod tests {

    use core_events::{EditCommand, SemanticKey};
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing::dispatcher::Dispatch;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::layer::Layer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::registry::Registry;

    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    #[derive(Clone, Debug)]
    struct CapturedEvent {
        target: String,
        fields: Vec<(String, String)>,
    }

    #[derive(Default)]
    struct FieldCollector {
        fields: Vec<(String, String)>,
    }

    impl Visit for FieldCollector {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S> Layer<S> for Capture
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut collector = FieldCollector::default();
            event.record(&mut collector);
            let meta = event.metadata();
            self.events.lock().unwrap().push(CapturedEvent {
                target: meta.target().to_string(),
                fields: collector.fields,
            });
        }
    }

    #[test]
    fn key_log_redacts_typed_text() {
        let capture = Capture::default();
        let events = capture.events.clone();
        let subscriber = Registry::default().with(capture);
        let dispatch = Dispatch::new(subscriber);

        tracing::dispatcher::with_default(&dispatch, || {
            super::reader::log_key(&SemanticKey::Char('⚙'));
            super::reader::log_key(&SemanticKey::Command(EditCommand::WordBackward));
        });

        let events = events.lock().unwrap();
        let keys: Vec<_> = events.iter().filter(|e| e.target == "input.key").collect();
        assert_eq!(keys.len(), 2, "expected one input.key event per key");
        assert!(
            keys.iter()
                .all(|e| e.fields.iter().any(|(name, _)| name == "kind")),
            "kind field missing from event"
        );
        for event in &keys {
            for (_, value) in &event.fields {
                assert!(!value.contains('⚙'), "event leaked typed char: {value}");
            }
        }
        assert!(
            keys[1]
                .fields
                .iter()
                .any(|(_, v)| v.contains("word_backward"))
        );
    }
}
