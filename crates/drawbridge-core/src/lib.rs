//! Drawbridge Core Library
//!
//! Headless scene model for a diagram canvas: elements, groups, scene
//! state, the persisted document format and the command dispatcher that
//! mutates them.

pub mod command;
pub mod converter;
pub mod dispatcher;
pub mod document;
pub mod element;
pub mod error;
pub mod geometry;
pub mod groups;
pub mod response;
pub mod scene;
pub mod storage;
pub mod store;

pub use command::{CommandName, CommandRequest};
pub use converter::{BoxFuture, ConvertedDiagram, ConverterError, DiagramConverter, UnavailableConverter};
pub use dispatcher::Dispatcher;
pub use element::{Element, ElementId, ElementKind};
pub use error::{CommandError, CommandResult};
pub use groups::GroupRegistry;
pub use response::{Content, Response};
pub use scene::{SceneState, Theme, Viewport};
pub use storage::ScratchDir;
pub use store::ElementStore;

#[cfg(test)]
pub(crate) mod test_support {
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    /// Drive a future that never actually waits.
    pub fn block_on<F: Future>(future: F) -> F::Output {
        let mut future = pin!(future);
        let mut cx = Context::from_waker(Waker::noop());
        loop {
            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                return output;
            }
        }
    }
}
