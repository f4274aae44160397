use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Compose;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, SelectTopic, BuildPool, Enrich, Render, Deliver, Record }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::SelectTopic => "select_topic",
        Phase::BuildPool => "build_pool",
        Phase::Enrich => "enrich",
        Phase::Render => "render",
        Phase::Deliver => "deliver",
        Phase::Record => "record",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::SelectTopic => info_span!("select_topic"),
        Phase::BuildPool => info_span!("build_pool"),
        Phase::Enrich => info_span!("enrich"),
        Phase::Render => info_span!("render"),
        Phase::Deliver => info_span!("deliver"),
        Phase::Record => info_span!("record"),
    }}
}

impl OpMarker for Compose {
    const NAME: &'static str = "compose";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("compose") }
}
