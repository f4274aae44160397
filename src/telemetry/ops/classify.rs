use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Classify;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, SelectItems, CallLlm, WriteTopic }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::SelectItems => "select_items",
        Phase::CallLlm => "call_llm",
        Phase::WriteTopic => "write_topic",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::SelectItems => info_span!("select_items"),
        Phase::CallLlm => info_span!("call_llm"),
        Phase::WriteTopic => info_span!("write_topic"),
    }}
}

impl OpMarker for Classify {
    const NAME: &'static str = "classify";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("classify") }
}
