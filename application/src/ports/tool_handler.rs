//! Tool handler port
//!
//! A handler is the executable half of a tool: an async function from a
//! flat argument object to a JSON value or a failure. The core treats it
//! as opaque and only cares when it settles and whether it succeeded.

use async_trait::async_trait;
use relay_domain::tool::{entities::ToolCall, value_objects::ToolError};
use std::future::Future;

/// Executable behind a registered tool.
///
/// Handlers must validate their own arguments: the registry forwards
/// them unchecked.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError>;
}

/// Adapter turning an async closure into a [`ToolHandler`].
///
/// ```ignore
/// let handler = FnToolHandler::new(|call: ToolCall| async move {
///     let symbol = call.require_string("symbol").map_err(ToolError::invalid_argument)?;
///     Ok(serde_json::json!({ "symbol": symbol, "price": 101.5 }))
/// });
/// ```
pub struct FnToolHandler<F> {
    f: F,
}

impl<F> FnToolHandler<F> {
    pub fn new<Fut>(f: F) -> Self
    where
        F: Fn(ToolCall) -> Fut + Send + Sync,
        Fut: Future<Output = Result<serde_json::Value, ToolError>> + Send,
    {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(ToolCall) -> Fut + Send + Sync,
    Fut: Future<Output = Result<serde_json::Value, ToolError>> + Send,
{
    async fn call(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        (self.f)(call.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fn_handler_forwards_arguments() {
        let handler = FnToolHandler::new(|call: ToolCall| async move {
            let symbol = call
                .require_string("symbol")
                .map_err(ToolError::invalid_argument)?
                .to_string();
            Ok::<_, ToolError>(serde_json::json!({ "symbol": symbol }))
        });

        let ok = handler
            .call(&ToolCall::new("quote").with_arg("symbol", "ETHUSD"))
            .await
            .unwrap();
        assert_eq!(ok["symbol"], "ETHUSD");

        let err = handler.call(&ToolCall::new("quote")).await.unwrap_err();
        assert!(err.message.contains("symbol"));
    }
}
