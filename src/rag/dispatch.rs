//! Event dispatcher: one `match` from [`StreamEvent`] to handler methods.

use super::types::{Source, StreamEvent};

/// Receiver of decoded stream events.
///
/// `on_token`, `on_sources` and `on_done` must be implemented. `on_no_context`
/// and `on_error` default to doing nothing.
pub trait StreamHandler {
    fn on_token(&mut self, text: String);
    fn on_sources(&mut self, sources: Vec<Source>);
    fn on_done(&mut self);
    fn on_no_context(&mut self) {}
    fn on_error(&mut self, _message: String) {}
}

/// Invoke exactly one handler method for `event`, synchronously.
pub fn dispatch<H: StreamHandler + ?Sized>(event: StreamEvent, handler: &mut H) {
    match event {
        StreamEvent::Token(text) => handler.on_token(text),
        StreamEvent::Sources(sources) => handler.on_sources(sources),
        StreamEvent::Done => handler.on_done(),
        StreamEvent::NoContext => handler.on_no_context(),
        StreamEvent::Error(message) => handler.on_error(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl StreamHandler for Recorder {
        fn on_token(&mut self, text: String) {
            self.calls.push(format!("token:{text}"));
        }
        fn on_sources(&mut self, sources: Vec<Source>) {
            self.calls.push(format!("sources:{}", sources.len()));
        }
        fn on_done(&mut self) {
            self.calls.push("done".into());
        }
        fn on_no_context(&mut self) {
            self.calls.push("no_context".into());
        }
        fn on_error(&mut self, message: String) {
            self.calls.push(format!("error:{message}"));
        }
    }

    /// Implements only the required methods.
    #[derive(Default)]
    struct Minimal {
        tokens: usize,
        done: bool,
    }

    impl StreamHandler for Minimal {
        fn on_token(&mut self, _text: String) {
            self.tokens += 1;
        }
        fn on_sources(&mut self, _sources: Vec<Source>) {}
        fn on_done(&mut self) {
            self.done = true;
        }
    }

    #[test]
    fn dispatches_in_order_one_call_per_event() {
        let mut recorder = Recorder::default();
        for event in [
            StreamEvent::Token("a".into()),
            StreamEvent::Sources(vec![]),
            StreamEvent::Token("b".into()),
            StreamEvent::NoContext,
            StreamEvent::Error("x".into()),
            StreamEvent::Done,
        ] {
            dispatch(event, &mut recorder);
        }
        assert_eq!(
            recorder.calls,
            ["token:a", "sources:0", "token:b", "no_context", "error:x", "done"]
        );
    }

    #[test]
    fn optional_methods_default_to_no_op() {
        let mut handler = Minimal::default();
        dispatch(StreamEvent::Token("a".into()), &mut handler);
        dispatch(StreamEvent::NoContext, &mut handler);
        dispatch(StreamEvent::Error("ignored".into()), &mut handler);
        assert_eq!(handler.tokens, 1);
        assert!(!handler.done);
    }

    #[test]
    fn works_through_trait_object() {
        let mut recorder = Recorder::default();
        let handler: &mut dyn StreamHandler = &mut recorder;
        dispatch(StreamEvent::Done, handler);
        assert_eq!(recorder.calls, ["done"]);
    }
}
