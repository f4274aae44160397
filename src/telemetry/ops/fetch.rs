use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Fetch;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Feed, FetchRss, ParseRss, WriteItem }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Feed => "feed",
        Phase::FetchRss => "fetch_rss",
        Phase::ParseRss => "parse_rss",
        Phase::WriteItem => "write_item",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Feed => info_span!("feed"),
        Phase::FetchRss => info_span!("fetch_rss"),
        Phase::ParseRss => info_span!("parse_rss"),
        Phase::WriteItem => info_span!("write_item"),
    }}
}

impl OpMarker for Fetch {
    const NAME: &'static str = "fetch";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("fetch") }
}
