use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Subscriber;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Add, Confirm, Remove, List }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Add => "add",
        Phase::Confirm => "confirm",
        Phase::Remove => "remove",
        Phase::List => "list",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Add => info_span!("add"),
        Phase::Confirm => info_span!("confirm"),
        Phase::Remove => info_span!("remove"),
        Phase::List => info_span!("list"),
    }}
}

impl OpMarker for Subscriber {
    const NAME: &'static str = "subscriber";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("subscriber") }
}
