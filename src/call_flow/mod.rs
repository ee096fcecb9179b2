mod render;
mod state;
mod step;

use std::time::Duration;

pub use render::Renderer;
pub use state::{CallFlow, CallState, Decision};
pub use step::{CallInput, Step};

use crate::error::IvrError;
use crate::store::TicketStore;

/// Compute the step for `input` posted to `state`, performing the ticket
/// lookup when the flow asks for one.
///
/// The lookup is attempted once and bounded by `timeout`; a slow or failing
/// store becomes `IvrError::StoreUnavailable`.
pub async fn respond<S: TicketStore>(
    state: CallState,
    input: &CallInput,
    store: &S,
    timeout: Duration,
) -> Result<Step, IvrError> {
    match CallFlow::next(state, input) {
        Decision::Respond(step) => Ok(step),
        Decision::Lookup(ticket_id) => {
            let status = tokio::time::timeout(timeout, store.lookup(&ticket_id))
                .await
                .map_err(|_| {
                    IvrError::StoreUnavailable(format!(
                        "lookup of {ticket_id} timed out after {}ms",
                        timeout.as_millis()
                    ))
                })??;
            tracing::info!(ticket_id = %ticket_id, found = status.is_some(), "ticket lookup finished");
            Ok(CallFlow::ticket_result(&ticket_id, status.as_deref()))
        }
    }
}
