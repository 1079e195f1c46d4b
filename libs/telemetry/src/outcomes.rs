use tracing::Span;

const OUTCOME_COUNTER: &str = "order_webhook_outcomes_total";
const WEBHOOK_SPAN_NAME: &str = "webhook.order_updated";

/// Counts one webhook delivery by its final outcome label.
pub fn record_outcome(outcome: &'static str) {
    metrics::counter!(OUTCOME_COUNTER, "outcome" => outcome).increment(1);
}

/// Span wrapping one webhook delivery. Order fields are recorded once parsed.
pub fn start_webhook_span() -> Span {
    tracing::info_span!(
        WEBHOOK_SPAN_NAME,
        order_number = tracing::field::Empty,
        order_id = tracing::field::Empty,
        outcome = tracing::field::Empty,
    )
}

pub fn record_order_fields(span: &Span, order_number: &str, order_id: &str) {
    span.record("order_number", tracing::field::display(order_number));
    span.record("order_id", tracing::field::display(order_id));
}
