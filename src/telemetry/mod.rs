pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one typed context per operation
pub fn init() -> LogCtx<ops::init::Init> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn feed() -> LogCtx<ops::feed::Feed> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn fetch() -> LogCtx<ops::fetch::Fetch> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn classify() -> LogCtx<ops::classify::Classify> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn compose() -> LogCtx<ops::compose::Compose> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn subscriber() -> LogCtx<ops::subscriber::Subscriber> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn gc() -> LogCtx<ops::gc::Gc> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn stats() -> LogCtx<ops::stats::Stats> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
