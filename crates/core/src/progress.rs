use std::cell::RefCell;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Start { node: &'static str },
    Advance { node: &'static str, fraction: f32 },
    Finish { node: &'static str },
}

pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[derive(Default)]
struct ProgressContext {
    sink: Option<ProgressSink>,
    node: Option<&'static str>,
}

thread_local! {
    static CONTEXT: RefCell<ProgressContext> = RefCell::new(ProgressContext::default());
}

pub struct ProgressGuard {
    prev: ProgressContext,
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        let prev = std::mem::take(&mut self.prev);
        CONTEXT.with(|ctx| {
            let finished = std::mem::replace(&mut *ctx.borrow_mut(), prev);
            if let (Some(node), Some(sink)) = (finished.node, finished.sink) {
                (sink)(ProgressEvent::Finish { node });
            }
        });
    }
}

/// Routes `report_progress` calls on this thread to `sink` until the guard drops.
pub fn set_progress_context(node: &'static str, sink: Option<ProgressSink>) -> ProgressGuard {
    if let Some(sink) = sink.as_ref() {
        (sink)(ProgressEvent::Start { node });
    }
    let prev = CONTEXT.with(|ctx| {
        std::mem::replace(
            &mut *ctx.borrow_mut(),
            ProgressContext {
                sink,
                node: Some(node),
            },
        )
    });
    ProgressGuard { prev }
}

pub fn report_progress(fraction: f32) {
    let fraction = fraction.clamp(0.0, 1.0);
    CONTEXT.with(|ctx| {
        let ctx = ctx.borrow();
        if let (Some(node), Some(sink)) = (ctx.node, ctx.sink.as_ref()) {
            (sink)(ProgressEvent::Advance { node, fraction });
        }
    });
}
